//! Graphics-API implementations of `GraphicsBackend`.

#[cfg(windows)]
pub mod d3d11;
pub mod headless;

#[cfg(windows)]
pub use d3d11::{D3d11Backend, D3d11Factory};
pub use headless::{Call, HeadlessBackend, HeadlessFactory, ObjectKind, Operation, Recording};
