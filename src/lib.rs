pub mod backend;
pub mod cli;
pub mod config;
pub mod contents;
pub mod core;
pub mod error;
pub mod game;
pub mod traits;
pub mod types;

pub use crate::config::GameConfig;
pub use crate::core::{FailurePolicy, Pipeline, PipelineState, Renderer, WindowMessage};
pub use crate::error::{GpuError, GpuResult, Severity};
pub use crate::game::TextAdventure;
