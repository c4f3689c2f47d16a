use std::collections::HashSet;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::traits::{Button, Controller};

/// Adapter that bridges Winit events to the Controller trait
#[derive(Debug, Clone, Default)]
pub struct WinitController {
    /// Currently held buttons
    held: HashSet<Button>,
    /// Buttons that went down since the last `end_frame`
    pressed: HashSet<Button>,
}

impl WinitController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a Winit WindowEvent and update internal state
    pub fn process_event(&mut self, event: &WindowEvent) {
        if let WindowEvent::KeyboardInput { event, .. } = event {
            if let PhysicalKey::Code(keycode) = event.physical_key {
                if let Some(button) = Self::keycode_to_button(keycode) {
                    self.set_state(button, event.state, event.repeat);
                }
            }
        }
    }

    /// Record a press or release; key repeats never count as a new press
    pub fn set_state(&mut self, button: Button, state: ElementState, repeat: bool) {
        match state {
            ElementState::Pressed => {
                if self.held.insert(button) && !repeat {
                    self.pressed.insert(button);
                }
            }
            ElementState::Released => {
                self.held.remove(&button);
            }
        }
    }

    /// Forget this frame's presses; call after the frame has consumed input
    pub fn end_frame(&mut self) {
        self.pressed.clear();
    }

    /// Map Winit KeyCode to Button
    fn keycode_to_button(keycode: KeyCode) -> Option<Button> {
        match keycode {
            KeyCode::KeyN => Some(Button::Next),
            KeyCode::KeyB => Some(Button::Back),
            KeyCode::Escape => Some(Button::Escape),
            _ => None,
        }
    }
}

impl Controller for WinitController {
    fn went_down(&self, button: Button) -> bool {
        self.pressed.contains(&button)
    }
}
