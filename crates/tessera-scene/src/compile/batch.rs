// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Draw-call batching over compatible closed shapes.

use crate::compile::shape::ClosedShape;
use crate::error::SceneError;
use crate::geometry::{FlatBuffer, FragmentedBuffer};
use crate::render::gpu_object::GpuObject;
use crate::render::program::Program;
use crate::render::{ATTR_COLOR, ATTR_NORMAL, ATTR_POSITION, ATTR_UV};
use tessera_core::gpu::{DrawMode, GpuDevice, PrimitiveTopology};

/// The vertex count past which a batch is split so its indices stay inside
/// 16-bit element range.
pub const INDEX_CEILING: usize = 65536;

/// Accumulates compatible shapes into one indexed draw call.
///
/// Shapes merge when topology, draw mode, lit flag, and normal presence
/// all match and the combined vertex count stays under [`INDEX_CEILING`];
/// anything else forces a new batch. Normal presence is part of the
/// signature because the normal attribute must cover every vertex of the
/// batch or none of them. Absorbed indices are re-based onto the batch's
/// running vertex count, so each shape stays locally zero-based until it
/// lands here.
#[derive(Debug)]
pub struct DrawBatch {
    topology: PrimitiveTopology,
    draw_mode: DrawMode,
    lit: bool,
    has_normals: bool,
    vertex_count: usize,
    vertices: FragmentedBuffer<f32>,
    normals: FragmentedBuffer<f32>,
    colors: FragmentedBuffer<u8>,
    uvs: FragmentedBuffer<f32>,
    indices: FlatBuffer<u32>,
    object: Option<GpuObject>,
}

impl DrawBatch {
    /// Opens an empty batch keyed to a shape's compatibility signature.
    pub fn for_shape(shape: &ClosedShape) -> Self {
        Self {
            topology: shape.topology,
            draw_mode: shape.draw_mode,
            lit: shape.lit,
            has_normals: !shape.normals.is_empty(),
            vertex_count: 0,
            vertices: FragmentedBuffer::new(),
            normals: FragmentedBuffer::new(),
            colors: FragmentedBuffer::new(),
            uvs: FragmentedBuffer::new(),
            indices: FlatBuffer::new(),
            object: None,
        }
    }

    /// Whether a shape shares this batch's compatibility signature.
    pub fn can_merge(&self, shape: &ClosedShape) -> bool {
        self.topology == shape.topology
            && self.draw_mode == shape.draw_mode
            && self.lit == shape.lit
            && self.has_normals == !shape.normals.is_empty()
    }

    /// Whether absorbing a shape would push indices past the 16-bit range.
    pub fn would_overflow(&self, shape: &ClosedShape) -> bool {
        self.vertex_count + shape.vertex_count > INDEX_CEILING
    }

    /// Absorbs a closed shape, re-basing its local indices.
    pub fn absorb(&mut self, shape: ClosedShape) {
        let base = self.vertex_count as u32;
        let mut indices = shape.indices;
        indices.offset(base);
        self.indices.append(&indices);
        self.vertex_count += shape.vertex_count;
        self.vertices.push_slice(shape.vertices.combine());
        self.normals.push_slice(shape.normals.combine());
        self.colors.push_slice(shape.colors.combine());
        self.uvs.push_slice(shape.uvs.combine());
    }

    /// The running vertex count.
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// The accumulated index list.
    pub fn indices(&self) -> &FlatBuffer<u32> {
        &self.indices
    }

    /// The accumulated flat positions.
    pub fn vertices(&self) -> Vec<f32> {
        self.vertices.combine()
    }

    /// Builds and uploads the batch's drawable, consuming the CPU-side
    /// accumulation buffers. Idempotent through the drawable itself.
    pub fn post_upload(&mut self, device: &dyn GpuDevice) -> Result<(), SceneError> {
        if self.object.is_some() {
            return Ok(());
        }
        let mut object = GpuObject::new(self.topology);
        object.set_attribute_f32(
            device,
            ATTR_POSITION,
            3,
            FlatBuffer::from(self.vertices.combine()),
        )?;
        if !self.normals.is_empty() {
            object.set_attribute_f32(
                device,
                ATTR_NORMAL,
                3,
                FlatBuffer::from(self.normals.combine()),
            )?;
        }
        match self.draw_mode {
            DrawMode::Color => {
                object.set_attribute_u8(
                    device,
                    ATTR_COLOR,
                    4,
                    FlatBuffer::from(self.colors.combine()),
                )?;
            }
            DrawMode::Texture => {
                object.set_attribute_f32(
                    device,
                    ATTR_UV,
                    2,
                    FlatBuffer::from(self.uvs.combine()),
                )?;
            }
        }
        object.set_indices(device, std::mem::take(&mut self.indices))?;
        object.upload(device)?;

        self.vertices = FragmentedBuffer::new();
        self.normals = FragmentedBuffer::new();
        self.colors = FragmentedBuffer::new();
        self.uvs = FragmentedBuffer::new();
        self.object = Some(object);
        Ok(())
    }

    /// Issues the batch's draw call. A batch that was never uploaded (for
    /// example one absorbed into a never-finished model) is a no-op.
    pub fn render(&self, device: &dyn GpuDevice, program: &Program) -> Result<(), SceneError> {
        match &self.object {
            Some(object) => object.render(device, program),
            None => Ok(()),
        }
    }

    /// Releases the batch's GPU buffers.
    pub fn dispose(&mut self, device: &dyn GpuDevice) -> Result<(), SceneError> {
        if let Some(object) = &mut self.object {
            object.dispose(device)?;
        }
        Ok(())
    }

    /// The uploaded drawable, once [`post_upload`](Self::post_upload) ran.
    pub fn object(&self) -> Option<&GpuObject> {
        self.object.as_ref()
    }
}
