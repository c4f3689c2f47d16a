pub mod loader;
pub mod manager;
pub mod tutorial;

pub use loader::{load_contents, parse_contents};
pub use manager::ContentsManager;
pub use tutorial::tutorial;

/// A named, ordered block of dialogue lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contents {
    name: String,
    lines: Vec<String>,
}

impl Contents {
    pub fn new(name: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            name: name.into(),
            lines,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    /// Number of lines; valid indices are `0..max_index()`
    pub fn max_index(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub(crate) fn push(&mut self, line: String) {
        self.lines.push(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_by_index() {
        let contents = Contents::new("intro", vec!["a".into(), "b".into()]);
        assert_eq!(contents.text(1), Some("b"));
        assert_eq!(contents.text(2), None);
        assert_eq!(contents.max_index(), 2);
    }
}
