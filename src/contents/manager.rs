use anyhow::{bail, Result};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::tutorial::tutorial;
use super::Contents;
use crate::traits::{Button, Controller};

/// Pages through content blocks one line at a time
///
/// The tutorial is always block 0 and opens the session. Paging past the last
/// line of a block picks the next block at random and starts it from its
/// first line.
pub struct ContentsManager {
    blocks: Vec<Contents>,
    active: usize,
    index: usize,
    rng: StdRng,
}

impl ContentsManager {
    /// Tutorial followed by `extra`; `seed` makes block selection repeatable
    pub fn new(extra: Vec<Contents>, seed: Option<u64>) -> Result<Self> {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut blocks = vec![tutorial()];
        blocks.extend(extra);

        if let Some(empty) = blocks.iter().find(|block| block.is_empty()) {
            bail!("content block {:?} has no lines", empty.name());
        }

        info!("Contents ready: {} blocks", blocks.len());
        Ok(Self {
            blocks,
            active: 0,
            index: 0,
            rng,
        })
    }

    /// Apply this frame's input; returns true when the shown line changed
    pub fn update(&mut self, controller: &dyn Controller) -> bool {
        if controller.went_down(Button::Next) {
            self.next();
            true
        } else if controller.went_down(Button::Back) {
            self.back()
        } else {
            false
        }
    }

    /// Advance one line, or move to a randomly selected block when exhausted
    pub fn next(&mut self) {
        if self.index + 1 < self.active().max_index() {
            self.index += 1;
        } else {
            self.active = self.select();
            self.index = 0;
            debug!("Switched to block {:?}", self.active().name());
        }
    }

    /// Step back one line; returns false at the first line
    pub fn back(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    /// Uniformly pick a block index
    pub fn select(&mut self) -> usize {
        self.rng.gen_range(0..self.blocks.len())
    }

    pub fn current_text(&self) -> &str {
        self.active().text(self.index).unwrap_or_default()
    }

    pub fn active(&self) -> &Contents {
        &self.blocks[self.active]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn blocks(&self) -> &[Contents] {
        &self.blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contents::tutorial::TUTORIAL_LINES;

    struct Pressed(Option<Button>);

    impl Controller for Pressed {
        fn went_down(&self, button: Button) -> bool {
            self.0 == Some(button)
        }
    }

    fn manager() -> ContentsManager {
        let story = Contents::new("story", vec!["one".into(), "two".into()]);
        ContentsManager::new(vec![story], Some(7)).unwrap()
    }

    #[test]
    fn test_opens_on_tutorial() {
        let manager = manager();
        assert_eq!(manager.active().name(), "tutorial");
        assert_eq!(manager.current_text(), TUTORIAL_LINES[0]);
    }

    #[test]
    fn test_next_and_back_page_lines() {
        let mut manager = manager();
        assert!(manager.update(&Pressed(Some(Button::Next))));
        assert_eq!(manager.current_text(), TUTORIAL_LINES[1]);

        assert!(manager.update(&Pressed(Some(Button::Back))));
        assert_eq!(manager.current_text(), TUTORIAL_LINES[0]);
    }

    #[test]
    fn test_back_stops_at_first_line() {
        let mut manager = manager();
        assert!(!manager.update(&Pressed(Some(Button::Back))));
        assert_eq!(manager.index(), 0);
    }

    #[test]
    fn test_no_input_changes_nothing() {
        let mut manager = manager();
        assert!(!manager.update(&Pressed(None)));
        assert_eq!(manager.index(), 0);
    }

    #[test]
    fn test_exhausted_block_selects_next_from_start() {
        let mut manager = manager();
        for _ in 0..TUTORIAL_LINES.len() {
            manager.next();
        }
        assert_eq!(manager.index(), 0);
        let name = manager.active().name();
        assert!(name == "tutorial" || name == "story");
    }

    #[test]
    fn test_seeded_selection_repeats() {
        let mut a = manager();
        let mut b = manager();
        let picks_a: Vec<usize> = (0..16).map(|_| a.select()).collect();
        let picks_b: Vec<usize> = (0..16).map(|_| b.select()).collect();
        assert_eq!(picks_a, picks_b);
        assert!(picks_a.iter().all(|&pick| pick < 2));
    }

    #[test]
    fn test_rejects_empty_block() {
        let empty = Contents::new("empty", Vec::new());
        assert!(ContentsManager::new(vec![empty], None).is_err());
    }
}
