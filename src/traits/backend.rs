use raw_window_handle::RawWindowHandle;

use crate::core::shader::{ShaderBytecode, ShaderStage};
use crate::error::GpuResult;
use crate::types::{
    BlendDesc, BufferDesc, Extent, FontDesc, InputElement, Rect, Rgb, TextFormat, TextureDesc,
    Topology, Viewport,
};

/// GDI drawing calls available while a back-buffer device context is held
pub trait GdiContext {
    type Font;

    /// Stop text draws from painting an opaque background rectangle
    fn set_transparent_background(&mut self);

    fn select_font(&mut self, font: &Self::Font);

    fn set_text_color(&mut self, color: Rgb);

    fn draw_text(&mut self, text: &str, area: Rect, format: TextFormat);
}

/// Primitive graphics-API calls, one per underlying device call
///
/// The rendering core owns the order in which these are issued. Every object
/// type is released when dropped, so the core expresses release order by
/// dropping values explicitly.
pub trait GraphicsBackend: Sized {
    type Buffer;
    type Texture;
    type ShaderView;
    type TargetView;
    type BackBuffer;
    type InputLayout;
    type VertexShader;
    type PixelShader;
    type BlendState;
    type Font;
    type Gdi: GdiContext<Font = Self::Font>;

    fn create_input_layout(
        &mut self,
        elements: &[InputElement],
        vertex_shader: &ShaderBytecode,
    ) -> GpuResult<Self::InputLayout>;

    fn create_vertex_shader(&mut self, bytecode: &ShaderBytecode) -> GpuResult<Self::VertexShader>;

    fn create_pixel_shader(&mut self, bytecode: &ShaderBytecode) -> GpuResult<Self::PixelShader>;

    fn create_blend_state(&mut self, desc: &BlendDesc) -> GpuResult<Self::BlendState>;

    /// `contents` is required for immutable buffers
    fn create_buffer(&mut self, desc: &BufferDesc, contents: Option<&[u8]>)
        -> GpuResult<Self::Buffer>;

    fn create_texture(&mut self, desc: &TextureDesc, pixels: &[u8]) -> GpuResult<Self::Texture>;

    fn create_shader_view(&mut self, texture: &Self::Texture) -> GpuResult<Self::ShaderView>;

    fn create_target_view(&mut self, back_buffer: &Self::BackBuffer)
        -> GpuResult<Self::TargetView>;

    fn create_font(&mut self, desc: &FontDesc) -> GpuResult<Self::Font>;

    fn set_input_layout(&mut self, layout: &Self::InputLayout);

    fn set_vertex_shader(&mut self, shader: &Self::VertexShader);

    fn set_pixel_shader(&mut self, shader: &Self::PixelShader);

    fn set_topology(&mut self, topology: Topology);

    fn set_blend_state(&mut self, state: &Self::BlendState);

    fn set_vertex_buffer(&mut self, stream: u32, buffer: &Self::Buffer, stride: u32);

    fn set_constant_buffers(&mut self, first_slot: u32, buffers: &[&Self::Buffer]);

    fn set_shader_view(&mut self, slot: u32, view: &Self::ShaderView);

    fn set_render_target(&mut self, view: &Self::TargetView);

    /// Detach every render target from the output merger
    fn unbind_render_target(&mut self);

    fn set_viewport(&mut self, viewport: Viewport);

    /// Map with discard, copy `bytes`, unmap
    fn write_discard(&mut self, buffer: &Self::Buffer, bytes: &[u8]) -> GpuResult<()>;

    fn draw(&mut self, vertex_count: u32, first_vertex: u32);

    fn clear_render_target(&mut self, view: &Self::TargetView, rgba: [f32; 4]);

    /// Every reference to the current back buffer must be released first
    fn resize_buffers(&mut self, size: Extent) -> GpuResult<()>;

    fn back_buffer(&mut self) -> GpuResult<Self::BackBuffer>;

    /// Acquire a GDI device context on `back_buffer`, run `draw`, release it
    fn with_gdi(
        &mut self,
        back_buffer: &Self::BackBuffer,
        draw: impl FnOnce(&mut Self::Gdi),
    ) -> GpuResult<()>;

    fn present(&mut self, sync_interval: u32) -> GpuResult<()>;

    /// Unbind every pipeline stage
    fn clear_state(&mut self);

    /// Release the swap chain, the immediate context and the device, in that order
    fn shutdown(self);
}

/// Creates a backend for a window and supplies its shader stages
pub trait BackendFactory {
    type Backend: GraphicsBackend;

    fn create(&self, window: RawWindowHandle) -> GpuResult<Self::Backend>;

    fn shader(&self, stage: ShaderStage) -> GpuResult<ShaderBytecode>;
}
