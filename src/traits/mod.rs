pub mod backend;
pub mod controller;
pub mod game;

pub use backend::*;
pub use controller::*;
pub use game::*;
