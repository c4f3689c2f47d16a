pub mod buffers;
pub mod device;
pub mod failure;
pub mod input_adapter;
pub mod pipeline;
pub mod render_target;
pub mod shader;
pub mod text;
pub mod texture;

pub use buffers::{ResourceBuffers, TransformRole};
pub use device::DeviceContext;
pub use failure::FailurePolicy;
pub use input_adapter::WinitController;
pub use pipeline::{Pipeline, PipelineState, Renderer, WindowMessage};
pub use render_target::RenderTarget;
pub use shader::{ShaderBytecode, ShaderStage, ShaderState};
pub use text::Font;
pub use texture::TextureHandle;
