use super::backend::GraphicsBackend;
use super::controller::Controller;
use crate::core::Renderer;
use crate::error::GpuResult;

/// Game abstraction - handles game lifecycle and logic
///
/// The host calls `start` once the renderer is ready, `update` once per frame
/// before the frame is presented, and `end` before the renderer is destroyed.
pub trait Game<B: GraphicsBackend> {
    fn start(&mut self, renderer: &mut Renderer<B>) -> GpuResult<()>;

    fn update(&mut self, controller: &dyn Controller, renderer: &mut Renderer<B>) -> GpuResult<()>;

    fn end(&mut self, renderer: &mut Renderer<B>);
}
