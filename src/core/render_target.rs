use log::{debug, info};

use super::failure::FailurePolicy;
use crate::error::GpuResult;
use crate::traits::{GdiContext, GraphicsBackend};
use crate::types::{Extent, Viewport};

/// The swap chain's back-buffer view, rebuilt on every size change
pub struct RenderTarget<B: GraphicsBackend> {
    view: Option<B::TargetView>,
    size: Extent,
}

impl<B: GraphicsBackend> RenderTarget<B> {
    pub fn new() -> Self {
        Self {
            view: None,
            size: Extent::new(0, 0),
        }
    }

    /// Rebuild the view for a new client size
    ///
    /// The old view is unbound and released before the swap chain resizes, and the back
    /// buffer is fetched again only after the resize; the graphics API leaves
    /// any other order undefined. Zero-sized requests (minimised windows) keep
    /// the current target.
    pub fn resize(&mut self, backend: &mut B, size: Extent, policy: FailurePolicy) -> GpuResult<()> {
        if size.is_empty() {
            debug!("Ignoring resize to {}x{}", size.width, size.height);
            return Ok(());
        }

        if let Some(view) = self.view.take() {
            backend.unbind_render_target();
            drop(view);
        }

        backend.resize_buffers(size)?;

        let back_buffer = backend.back_buffer()?;
        let status = backend.with_gdi(&back_buffer, |dc| dc.set_transparent_background());
        policy.check("back buffer background mode", status)?;

        let view = backend.create_target_view(&back_buffer)?;
        drop(back_buffer);

        backend.set_render_target(&view);
        backend.set_viewport(Viewport::covering(size));

        self.view = Some(view);
        self.size = size;

        info!("Render target resized to {}x{}", size.width, size.height);
        Ok(())
    }

    /// Bind the view as the sole output target again
    pub fn bind(&self, backend: &mut B) {
        if let Some(view) = &self.view {
            backend.set_render_target(view);
        }
    }

    pub fn clear(&self, backend: &mut B, rgba: [f32; 4]) {
        if let Some(view) = &self.view {
            backend.clear_render_target(view, rgba);
        }
    }

    pub fn is_live(&self) -> bool {
        self.view.is_some()
    }

    pub fn size(&self) -> Extent {
        self.size
    }

    pub fn release(self) {
        drop(self.view);
    }
}

impl<B: GraphicsBackend> Default for RenderTarget<B> {
    fn default() -> Self {
        Self::new()
    }
}
