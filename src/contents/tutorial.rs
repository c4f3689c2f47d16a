use super::Contents;

pub const TUTORIAL_NAME: &str = "tutorial";

pub const TUTORIAL_LINES: [&str; 3] = [
    "다음 지문을 보려면 N키를 누르세요.",
    "이전 지문을 보려면 B키를 누르세요.",
    "게임을 시작하려면 다음으로 진행하세요.",
];

/// The block every session opens with: how to page forward and back
pub fn tutorial() -> Contents {
    Contents::new(
        TUTORIAL_NAME,
        TUTORIAL_LINES.iter().map(|line| line.to_string()).collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tutorial_has_three_lines() {
        let tutorial = tutorial();
        assert_eq!(tutorial.max_index(), 3);
        assert!(tutorial.text(0).unwrap().contains('N'));
        assert!(tutorial.text(1).unwrap().contains('B'));
    }
}
