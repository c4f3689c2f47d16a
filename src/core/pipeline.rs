//! Window-message-driven pipeline controller.
//!
//! `Pipeline` moves Uninitialized -> Ready -> Destroyed. While Ready it owns a
//! `Renderer`, the single context object every draw goes through, so nothing
//! can draw before creation has finished or after destruction has begun.

use glam::Mat4;
use log::{debug, info, warn};
use raw_window_handle::RawWindowHandle;

use super::buffers::{ResourceBuffers, TransformRole};
use super::device::DeviceContext;
use super::failure::FailurePolicy;
use super::render_target::RenderTarget;
use super::shader::{ShaderStage, ShaderState};
use super::text::{self, Font};
use super::texture::TextureHandle;
use crate::error::{GpuError, GpuResult};
use crate::traits::{BackendFactory, GraphicsBackend};
use crate::types::{Extent, FontDesc, Point, Rect, Rgb};

pub const WM_CREATE: u32 = 0x0001;
pub const WM_DESTROY: u32 = 0x0002;
pub const WM_SIZE: u32 = 0x0005;
/// First application-private message; used as "present this frame"
pub const WM_APP: u32 = 0x8000;

/// Opaque black the back buffer is cleared to after every present
pub const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// The four window messages the pipeline reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMessage {
    Create,
    Size(Extent),
    Present,
    Destroy,
}

impl WindowMessage {
    /// Decode a native message; `None` for anything the pipeline ignores
    pub fn decode(message: u32, _wparam: usize, lparam: isize) -> Option<Self> {
        match message {
            WM_CREATE => Some(Self::Create),
            WM_SIZE => {
                let packed = lparam as usize;
                let width = (packed & 0xFFFF) as u32;
                let height = ((packed >> 16) & 0xFFFF) as u32;
                Some(Self::Size(Extent::new(width, height)))
            }
            WM_APP => Some(Self::Present),
            WM_DESTROY => Some(Self::Destroy),
            _ => None,
        }
    }
}

/// Observable lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Uninitialized,
    Ready,
    Destroyed,
}

impl PipelineState {
    fn name(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Ready => "ready",
            Self::Destroyed => "destroyed",
        }
    }
}

/// Everything the device owns while the pipeline is Ready
pub struct Renderer<B: GraphicsBackend> {
    device: DeviceContext<B>,
    shaders: ShaderState<B>,
    buffers: ResourceBuffers<B>,
    target: RenderTarget<B>,
    policy: FailurePolicy,
}

impl<B: GraphicsBackend> Renderer<B> {
    /// Device, then shader state, then buffers; the render target waits for
    /// the first size event
    pub fn create<F>(factory: &F, window: RawWindowHandle, policy: FailurePolicy) -> GpuResult<Self>
    where
        F: BackendFactory<Backend = B>,
    {
        let vertex = factory.shader(ShaderStage::Vertex)?;
        let pixel = factory.shader(ShaderStage::Pixel)?;

        let mut device = DeviceContext::initialize(factory, window)?;
        let shaders = ShaderState::configure(device.backend(), &vertex, &pixel)?;
        let buffers = ResourceBuffers::create(device.backend())?;

        Ok(Self {
            device,
            shaders,
            buffers,
            target: RenderTarget::new(),
            policy,
        })
    }

    pub fn resize(&mut self, size: Extent) -> GpuResult<()> {
        self.target.resize(self.device.backend(), size, self.policy)
    }

    /// Present without waiting for vertical sync, then clear for the next frame
    pub fn present(&mut self) -> GpuResult<()> {
        let backend = self.device.backend();
        let status = backend.present(0);
        self.policy.check("present", status)?;
        self.target.clear(backend, CLEAR_COLOR);
        Ok(())
    }

    /// Release in reverse dependency order once every binding is cleared
    pub fn destroy(self) {
        let Self {
            mut device,
            shaders,
            buffers,
            target,
            ..
        } = self;

        device.clear_bindings();
        target.release();
        buffers.release();
        shaders.release();
        device.release();
    }

    pub fn update_transform(&mut self, role: TransformRole, matrix: Mat4) -> GpuResult<()> {
        let status = self
            .buffers
            .update_transform(self.device.backend(), role, matrix);
        self.policy.check("transform update", status)
    }

    pub fn update_world(&mut self, matrix: Mat4) -> GpuResult<()> {
        self.update_transform(TransformRole::World, matrix)
    }

    pub fn update_view(&mut self, matrix: Mat4) -> GpuResult<()> {
        self.update_transform(TransformRole::View, matrix)
    }

    pub fn update_projection(&mut self, matrix: Mat4) -> GpuResult<()> {
        self.update_transform(TransformRole::Projection, matrix)
    }

    pub fn create_texture(&mut self, size: Extent, pixels: &[u8]) -> GpuResult<TextureHandle<B>> {
        TextureHandle::create(self.device.backend(), size, pixels)
    }

    pub fn render_texture(&mut self, handle: &TextureHandle<B>, area: Rect) -> GpuResult<()> {
        handle.draw(self.device.backend(), &self.buffers, area, self.policy)
    }

    pub fn delete_texture(&mut self, handle: TextureHandle<B>) {
        handle.delete();
    }

    pub fn create_font(&mut self, desc: FontDesc) -> GpuResult<Font<B>> {
        Font::create(self.device.backend(), desc)
    }

    pub fn render_text(
        &mut self,
        font: &Font<B>,
        text: &str,
        color: Rgb,
        size: Extent,
        center: Point,
    ) -> GpuResult<()> {
        text::render(
            self.device.backend(),
            &self.target,
            font,
            text,
            color,
            size,
            center,
            self.policy,
        )
    }

    /// Current client size of the render target
    pub fn size(&self) -> Extent {
        self.target.size()
    }

    pub fn has_target(&self) -> bool {
        self.target.is_live()
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }
}

enum Stage<B: GraphicsBackend> {
    Uninitialized,
    Ready(Renderer<B>),
    Destroyed,
}

/// Dispatches window lifecycle messages into renderer operations
pub struct Pipeline<F: BackendFactory> {
    factory: F,
    policy: FailurePolicy,
    stage: Stage<F::Backend>,
}

impl<F: BackendFactory> Pipeline<F> {
    pub fn new(factory: F, policy: FailurePolicy) -> Self {
        Self {
            factory,
            policy,
            stage: Stage::Uninitialized,
        }
    }

    /// Native entry point: returns `Ok(false)` when the message is not one of
    /// ours and should go to default window processing
    pub fn procedure(
        &mut self,
        window: RawWindowHandle,
        message: u32,
        wparam: usize,
        lparam: isize,
    ) -> GpuResult<bool> {
        match WindowMessage::decode(message, wparam, lparam) {
            Some(message) => {
                self.dispatch(window, message)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn dispatch(&mut self, window: RawWindowHandle, message: WindowMessage) -> GpuResult<()> {
        debug!("Dispatching {:?} while {}", message, self.state().name());

        match message {
            WindowMessage::Create => self.create(window),
            WindowMessage::Size(size) => self.renderer_for("resize")?.resize(size),
            WindowMessage::Present => self.renderer_for("present")?.present(),
            WindowMessage::Destroy => self.destroy(),
        }
    }

    fn create(&mut self, window: RawWindowHandle) -> GpuResult<()> {
        if !matches!(self.stage, Stage::Uninitialized) {
            return Err(self.lifecycle_error("create"));
        }

        let renderer = Renderer::create(&self.factory, window, self.policy)?;
        self.stage = Stage::Ready(renderer);
        info!("Pipeline ready ({:?} failure policy)", self.policy);
        Ok(())
    }

    fn destroy(&mut self) -> GpuResult<()> {
        match std::mem::replace(&mut self.stage, Stage::Destroyed) {
            Stage::Ready(renderer) => {
                renderer.destroy();
                info!("Pipeline destroyed");
                Ok(())
            }
            Stage::Uninitialized => {
                warn!("Destroy before create; nothing to release");
                Ok(())
            }
            Stage::Destroyed => Err(self.lifecycle_error("destroy")),
        }
    }

    fn lifecycle_error(&self, operation: &'static str) -> GpuError {
        GpuError::Lifecycle {
            operation,
            state: self.state().name(),
        }
    }

    fn renderer_for(&mut self, operation: &'static str) -> GpuResult<&mut Renderer<F::Backend>> {
        let state = self.state().name();
        match &mut self.stage {
            Stage::Ready(renderer) => Ok(renderer),
            _ => Err(GpuError::Lifecycle { operation, state }),
        }
    }

    /// The live renderer; an error before create or after destroy
    pub fn renderer(&mut self) -> GpuResult<&mut Renderer<F::Backend>> {
        self.renderer_for("draw")
    }

    pub fn state(&self) -> PipelineState {
        match self.stage {
            Stage::Uninitialized => PipelineState::Uninitialized,
            Stage::Ready(_) => PipelineState::Ready,
            Stage::Destroyed => PipelineState::Destroyed,
        }
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size_lparam(width: u32, height: u32) -> isize {
        ((height << 16) | width) as isize
    }

    #[test]
    fn test_decode_lifecycle_messages() {
        assert_eq!(WindowMessage::decode(WM_CREATE, 0, 0), Some(WindowMessage::Create));
        assert_eq!(WindowMessage::decode(WM_APP, 0, 0), Some(WindowMessage::Present));
        assert_eq!(WindowMessage::decode(WM_DESTROY, 0, 0), Some(WindowMessage::Destroy));
    }

    #[test]
    fn test_decode_size_unpacks_low_and_high_words() {
        let message = WindowMessage::decode(WM_SIZE, 0, size_lparam(1024, 768));
        assert_eq!(message, Some(WindowMessage::Size(Extent::new(1024, 768))));
    }

    #[test]
    fn test_decode_size_ignores_upper_bits() {
        let lparam = (0x7_0000_0000_i64 as isize) | size_lparam(640, 480);
        let message = WindowMessage::decode(WM_SIZE, 0, lparam);
        assert_eq!(message, Some(WindowMessage::Size(Extent::new(640, 480))));
    }

    #[test]
    fn test_decode_ignores_other_messages() {
        // WM_PAINT, WM_KEYDOWN, WM_APP + 1
        for message in [0x000F, 0x0100, WM_APP + 1] {
            assert_eq!(WindowMessage::decode(message, 0, 0), None);
        }
    }

    #[test]
    fn test_state_names() {
        assert_eq!(PipelineState::Ready.name(), "ready");
        assert_eq!(PipelineState::Destroyed.name(), "destroyed");
    }
}
