use super::failure::FailurePolicy;
use super::render_target::RenderTarget;
use crate::error::GpuResult;
use crate::traits::{GdiContext, GraphicsBackend};
use crate::types::{Extent, FontDesc, Point, Rect, Rgb, TextFormat};

/// A GDI font created for the device's back buffer
pub struct Font<B: GraphicsBackend> {
    handle: B::Font,
    desc: FontDesc,
}

impl<B: GraphicsBackend> Font<B> {
    pub fn create(backend: &mut B, desc: FontDesc) -> GpuResult<Self> {
        let handle = backend.create_font(&desc)?;
        Ok(Self { handle, desc })
    }

    pub fn desc(&self) -> &FontDesc {
        &self.desc
    }
}

/// Draw `text` with GDI straight into the back buffer
///
/// Bypasses the shader pipeline. The surface is locked for GDI from acquire
/// to release, so nothing else may draw in between; acquiring the device
/// context detaches the render target, which is bound again afterwards even
/// when the draw failed.
#[allow(clippy::too_many_arguments)]
pub(crate) fn render<B: GraphicsBackend>(
    backend: &mut B,
    target: &RenderTarget<B>,
    font: &Font<B>,
    text: &str,
    color: Rgb,
    size: Extent,
    center: Point,
    policy: FailurePolicy,
) -> GpuResult<()> {
    let area = Rect::centered(center, size);

    let status = match backend.back_buffer() {
        Ok(surface) => {
            let status = backend.with_gdi(&surface, |dc| {
                dc.set_transparent_background();
                dc.select_font(&font.handle);
                dc.set_text_color(color);
                dc.draw_text(text, area, TextFormat::DIALOGUE);
            });
            drop(surface);
            status
        }
        Err(err) => Err(err),
    };

    target.bind(backend);
    policy.check("text draw", status)
}
