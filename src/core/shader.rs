//! Fixed shader pair and the pipeline state built from it.
//!
//! Bytecode reaches the core either compiled at startup from
//! `shaders/quad.hlsl` or loaded from precompiled `.cso` files; in both cases
//! it is checked as a DXBC container before any device object is built from it.

use std::path::Path;

use log::debug;

use crate::error::{GpuError, GpuResult};
use crate::traits::GraphicsBackend;
use crate::types::{BlendDesc, InputElement, Topology};

/// HLSL source of the quad shaders
pub const QUAD_HLSL: &str = include_str!("../../shaders/quad.hlsl");

const DXBC_MAGIC: &[u8; 4] = b"DXBC";
const HEADER_LEN: usize = 32;
const CHUNK_HEADER_LEN: usize = 8;

/// Position from stream 0, texture coordinate from stream 1
pub const INPUT_LAYOUT: [InputElement; 2] = [
    InputElement {
        semantic: "POSITION",
        stream: 0,
    },
    InputElement {
        semantic: "TEXCOORD",
        stream: 1,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Pixel,
}

impl ShaderStage {
    pub fn entry_point(self) -> &'static str {
        match self {
            Self::Vertex => "vs_main",
            Self::Pixel => "ps_main",
        }
    }

    pub fn target(self) -> &'static str {
        match self {
            Self::Vertex => "vs_4_0",
            Self::Pixel => "ps_4_0",
        }
    }

    /// File name of the precompiled object in a shader directory
    pub fn object_file(self) -> &'static str {
        match self {
            Self::Vertex => "quad_vs.cso",
            Self::Pixel => "quad_ps.cso",
        }
    }
}

/// Validated DXBC shader container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderBytecode {
    bytes: Vec<u8>,
}

impl ShaderBytecode {
    pub fn from_bytes(bytes: Vec<u8>) -> GpuResult<Self> {
        validate_container(&bytes)?;
        Ok(Self { bytes })
    }

    /// Load a precompiled object for `stage` from `dir`
    pub fn load(dir: &Path, stage: ShaderStage) -> GpuResult<Self> {
        let path = dir.join(stage.object_file());
        let bytes = std::fs::read(&path)
            .map_err(|e| GpuError::InvalidShader(format!("{}: {}", path.display(), e)))?;
        debug!("Loaded {} ({} bytes)", path.display(), bytes.len());
        Self::from_bytes(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(word)
}

fn validate_container(bytes: &[u8]) -> GpuResult<()> {
    if bytes.len() < HEADER_LEN {
        return Err(GpuError::InvalidShader(format!(
            "{} bytes is shorter than the {}-byte container header",
            bytes.len(),
            HEADER_LEN
        )));
    }

    if &bytes[0..4] != DXBC_MAGIC {
        return Err(GpuError::InvalidShader("missing DXBC signature".to_string()));
    }

    let version = read_u32(bytes, 20);
    if version != 1 {
        return Err(GpuError::InvalidShader(format!(
            "unsupported container version {}",
            version
        )));
    }

    let declared = read_u32(bytes, 24) as usize;
    if declared != bytes.len() {
        return Err(GpuError::InvalidShader(format!(
            "container declares {} bytes but holds {}",
            declared,
            bytes.len()
        )));
    }

    let chunk_count = read_u32(bytes, 28) as usize;
    let table_end = HEADER_LEN + chunk_count * 4;
    if table_end > bytes.len() {
        return Err(GpuError::InvalidShader(format!(
            "chunk table for {} chunks overruns the container",
            chunk_count
        )));
    }

    for index in 0..chunk_count {
        let offset = read_u32(bytes, HEADER_LEN + index * 4) as usize;
        if offset < table_end || offset + CHUNK_HEADER_LEN > bytes.len() {
            return Err(GpuError::InvalidShader(format!(
                "chunk {} offset {} is out of bounds",
                index, offset
            )));
        }

        let size = read_u32(bytes, offset + 4) as usize;
        if offset + CHUNK_HEADER_LEN + size > bytes.len() {
            return Err(GpuError::InvalidShader(format!(
                "chunk {} of {} bytes overruns the container",
                index, size
            )));
        }
    }

    Ok(())
}

/// Build a DXBC container around `chunks`, leaving the checksum zeroed
pub fn assemble_container(chunks: &[([u8; 4], &[u8])]) -> Vec<u8> {
    let table_end = HEADER_LEN + chunks.len() * 4;
    let total = table_end
        + chunks
            .iter()
            .map(|(_, data)| CHUNK_HEADER_LEN + data.len())
            .sum::<usize>();

    let mut bytes = Vec::with_capacity(total);
    bytes.extend_from_slice(DXBC_MAGIC);
    bytes.extend_from_slice(&[0u8; 16]);
    bytes.extend_from_slice(&1u32.to_le_bytes());
    bytes.extend_from_slice(&(total as u32).to_le_bytes());
    bytes.extend_from_slice(&(chunks.len() as u32).to_le_bytes());

    let mut offset = table_end;
    for (_, data) in chunks {
        bytes.extend_from_slice(&(offset as u32).to_le_bytes());
        offset += CHUNK_HEADER_LEN + data.len();
    }

    for (fourcc, data) in chunks {
        bytes.extend_from_slice(fourcc);
        bytes.extend_from_slice(&(data.len() as u32).to_le_bytes());
        bytes.extend_from_slice(data);
    }

    bytes
}

/// Shader stages, input layout and blend state bound once at creation
///
/// Nothing rebinds these afterwards; they are held for the device lifetime
/// and released during teardown after the pipeline state has been cleared.
pub struct ShaderState<B: GraphicsBackend> {
    input_layout: B::InputLayout,
    vertex_shader: B::VertexShader,
    pixel_shader: B::PixelShader,
    blend_state: B::BlendState,
}

impl<B: GraphicsBackend> ShaderState<B> {
    pub fn configure(
        backend: &mut B,
        vertex: &ShaderBytecode,
        pixel: &ShaderBytecode,
    ) -> GpuResult<Self> {
        let input_layout = backend.create_input_layout(&INPUT_LAYOUT, vertex)?;
        backend.set_input_layout(&input_layout);

        let vertex_shader = backend.create_vertex_shader(vertex)?;
        backend.set_vertex_shader(&vertex_shader);

        let pixel_shader = backend.create_pixel_shader(pixel)?;
        backend.set_pixel_shader(&pixel_shader);

        backend.set_topology(Topology::TriangleStrip);

        let blend_state = backend.create_blend_state(&BlendDesc::ALPHA)?;
        backend.set_blend_state(&blend_state);

        debug!(
            "Pipeline state configured (vs {} bytes, ps {} bytes)",
            vertex.len(),
            pixel.len()
        );

        Ok(Self {
            input_layout,
            vertex_shader,
            pixel_shader,
            blend_state,
        })
    }

    pub fn release(self) {
        let Self {
            input_layout,
            vertex_shader,
            pixel_shader,
            blend_state,
        } = self;

        drop(blend_state);
        drop(pixel_shader);
        drop(vertex_shader);
        drop(input_layout);
    }
}
