use log::debug;

use super::buffers::ResourceBuffers;
use super::failure::FailurePolicy;
use crate::error::{GpuError, GpuResult};
use crate::traits::GraphicsBackend;
use crate::types::{Extent, QuadCorners, Rect, TextureDesc};

/// Pixel-shader slot textures are read from
pub const TEXTURE_SLOT: u32 = 0;

/// A GPU texture paired with the view the pixel shader reads it through
///
/// Owned by whoever created it. `delete` consumes the handle, so a released
/// texture can be neither drawn nor released again.
pub struct TextureHandle<B: GraphicsBackend> {
    texture: B::Texture,
    view: B::ShaderView,
    size: Extent,
}

impl<B: GraphicsBackend> TextureHandle<B> {
    /// Upload a tightly packed BGRA8 image
    pub fn create(backend: &mut B, size: Extent, pixels: &[u8]) -> GpuResult<Self> {
        let expected = size.bgra8_len();
        if pixels.len() != expected {
            return Err(GpuError::InvalidTexture {
                width: size.width,
                height: size.height,
                expected,
                actual: pixels.len(),
            });
        }

        let texture = backend.create_texture(&TextureDesc { size }, pixels)?;
        let view = backend.create_shader_view(&texture)?;

        debug!("Created {}x{} texture", size.width, size.height);
        Ok(Self {
            texture,
            view,
            size,
        })
    }

    /// Draw `area` of this texture as one four-vertex strip
    ///
    /// `area` is in texels; the corner stream carries it to the shader while
    /// the world transform places the quad on screen.
    pub(crate) fn draw(
        &self,
        backend: &mut B,
        buffers: &ResourceBuffers<B>,
        area: Rect,
        policy: FailurePolicy,
    ) -> GpuResult<()> {
        backend.set_shader_view(TEXTURE_SLOT, &self.view);
        let status = buffers.write_corners(backend, &QuadCorners::from_rect(area));
        policy.check("corner buffer map", status)?;
        backend.draw(4, 0);
        Ok(())
    }

    pub fn size(&self) -> Extent {
        self.size
    }

    /// Release the view, then the texture
    pub fn delete(self) {
        let Self {
            texture,
            view,
            size,
        } = self;

        drop(view);
        drop(texture);
        debug!("Deleted {}x{} texture", size.width, size.height);
    }
}
