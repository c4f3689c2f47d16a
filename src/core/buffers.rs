use std::mem::size_of;

use glam::Mat4;
use log::debug;

use crate::error::GpuResult;
use crate::traits::GraphicsBackend;
use crate::types::{BufferDesc, BufferKind, BufferUsage, Float2, QuadCorners, TransformUniform};

/// Constant-buffer slot each transform is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformRole {
    World,
    View,
    Projection,
}

impl TransformRole {
    pub const ALL: [TransformRole; 3] = [Self::World, Self::View, Self::Projection];

    pub fn slot(self) -> usize {
        match self {
            Self::World => 0,
            Self::View => 1,
            Self::Projection => 2,
        }
    }
}

const QUAD_BYTES: u32 = size_of::<QuadCorners>() as u32;
const VERTEX_STRIDE: u32 = size_of::<Float2>() as u32;
const TRANSFORM_BYTES: u32 = size_of::<TransformUniform>() as u32;

/// Geometry streams and transform constants, alive as long as the device
pub struct ResourceBuffers<B: GraphicsBackend> {
    quad: B::Buffer,
    corners: B::Buffer,
    transforms: [B::Buffer; 3],
}

impl<B: GraphicsBackend> ResourceBuffers<B> {
    /// Stream slot of the immutable unit quad
    pub const QUAD_STREAM: u32 = 0;
    /// Stream slot of the per-draw corner buffer
    pub const CORNER_STREAM: u32 = 1;

    pub fn create(backend: &mut B) -> GpuResult<Self> {
        let quad = Self::create_static_quad_buffer(backend, &QuadCorners::UNIT)?;
        let corners = Self::create_dynamic_vertex_buffer(backend)?;

        let transform_desc = BufferDesc {
            size: TRANSFORM_BYTES,
            usage: BufferUsage::Dynamic,
            kind: BufferKind::Constant,
        };
        let world = backend.create_buffer(&transform_desc, None)?;
        let view = backend.create_buffer(&transform_desc, None)?;
        let projection = backend.create_buffer(&transform_desc, None)?;
        backend.set_constant_buffers(0, &[&world, &view, &projection]);

        debug!("Created quad, corner and transform buffers");

        Ok(Self {
            quad,
            corners,
            transforms: [world, view, projection],
        })
    }

    /// Immutable base geometry, bound to stream 0
    pub fn create_static_quad_buffer(backend: &mut B, quad: &QuadCorners) -> GpuResult<B::Buffer> {
        let desc = BufferDesc {
            size: QUAD_BYTES,
            usage: BufferUsage::Immutable,
            kind: BufferKind::Vertex,
        };
        let buffer = backend.create_buffer(&desc, Some(bytemuck::bytes_of(quad)))?;
        backend.set_vertex_buffer(Self::QUAD_STREAM, &buffer, VERTEX_STRIDE);
        Ok(buffer)
    }

    /// CPU-written corner buffer, bound to stream 1
    pub fn create_dynamic_vertex_buffer(backend: &mut B) -> GpuResult<B::Buffer> {
        let desc = BufferDesc {
            size: QUAD_BYTES,
            usage: BufferUsage::Dynamic,
            kind: BufferKind::Vertex,
        };
        let buffer = backend.create_buffer(&desc, None)?;
        backend.set_vertex_buffer(Self::CORNER_STREAM, &buffer, VERTEX_STRIDE);
        Ok(buffer)
    }

    /// Overwrite the corner stream; prior GPU reads are discarded, not awaited
    pub fn write_corners(&self, backend: &mut B, corners: &QuadCorners) -> GpuResult<()> {
        backend.write_discard(&self.corners, bytemuck::bytes_of(corners))
    }

    pub fn update_transform(
        &self,
        backend: &mut B,
        role: TransformRole,
        matrix: Mat4,
    ) -> GpuResult<()> {
        let uniform = TransformUniform::from(matrix);
        backend.write_discard(&self.transforms[role.slot()], bytemuck::bytes_of(&uniform))
    }

    /// Release transforms, then the corner stream, then the base quad
    pub fn release(self) {
        let Self {
            quad,
            corners,
            transforms,
        } = self;

        for buffer in transforms {
            drop(buffer);
        }
        drop(corners);
        drop(quad);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_slots_are_distinct() {
        let slots: Vec<usize> = TransformRole::ALL.iter().map(|r| r.slot()).collect();
        assert_eq!(slots, vec![0, 1, 2]);
    }

    #[test]
    fn test_buffer_sizes() {
        assert_eq!(QUAD_BYTES, 32);
        assert_eq!(VERTEX_STRIDE, 8);
        assert_eq!(TRANSFORM_BYTES, 64);
    }
}
