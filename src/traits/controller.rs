/// Input button identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    /// `N`: show the next line
    Next,
    /// `B`: show the previous line
    Back,
    /// Quit the game
    Escape,
}

/// Controller - handles button input states
pub trait Controller {
    /// Check if button went down since the last frame
    fn went_down(&self, button: Button) -> bool;
}
