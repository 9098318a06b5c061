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

//! Ownership of one drawable primitive's uploaded state and its draw call.

use crate::error::SceneError;
use crate::geometry::FlatBuffer;
use crate::render::program::Program;
use log::trace;
use std::borrow::Cow;
use tessera_core::gpu::{
    AttributeLayout, BufferDescriptor, BufferId, BufferUsage, DataType, GpuDevice, IndexFormat,
    PrimitiveTopology,
};
use tessera_core::ResourceError;

/// The CPU- or GPU-resident backing of one vertex attribute.
#[derive(Debug)]
pub enum AttributeSource {
    /// Float data awaiting upload.
    F32(FlatBuffer<f32>),
    /// Byte data awaiting upload (normalized on fetch).
    U8(FlatBuffer<u8>),
    /// Uploaded; the CPU copy has been released.
    Gpu(BufferId),
}

impl AttributeSource {
    fn scalar_len(&self) -> usize {
        match self {
            AttributeSource::F32(buffer) => buffer.len(),
            AttributeSource::U8(buffer) => buffer.len(),
            AttributeSource::Gpu(_) => 0,
        }
    }
}

/// One registered vertex attribute.
#[derive(Debug)]
pub struct Attribute {
    name: Cow<'static, str>,
    components: u32,
    data_type: DataType,
    normalized: bool,
    source: AttributeSource,
    /// Vertex count captured at registration, kept after the CPU data is
    /// released so draw counts survive the upload.
    vertex_count: u32,
}

impl Attribute {
    /// The attribute's shader-facing name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The CPU float data, if not yet uploaded.
    pub fn cpu_f32(&self) -> Option<&[f32]> {
        match &self.source {
            AttributeSource::F32(buffer) => Some(buffer.combine()),
            _ => None,
        }
    }

    /// The CPU byte data, if not yet uploaded.
    pub fn cpu_u8(&self) -> Option<&[u8]> {
        match &self.source {
            AttributeSource::U8(buffer) => Some(buffer.combine()),
            _ => None,
        }
    }

    /// The GPU buffer handle, once uploaded.
    pub fn buffer_id(&self) -> Option<BufferId> {
        match &self.source {
            AttributeSource::Gpu(id) => Some(*id),
            _ => None,
        }
    }
}

#[derive(Debug)]
enum IndexStore {
    Cpu(FlatBuffer<u32>),
    Gpu { buffer: BufferId, count: u32 },
}

/// Owns one drawable primitive's attributes, index buffer, and draw call.
///
/// Life cycle: attributes and indices are registered from CPU buffers,
/// [`upload`](Self::upload) moves them to the GPU (idempotently), and
/// [`dispose`](Self::dispose) releases every handle exactly once.
#[derive(Debug)]
pub struct GpuObject {
    topology: PrimitiveTopology,
    attributes: Vec<Attribute>,
    indices: Option<IndexStore>,
    index_format: IndexFormat,
    item_count: u32,
    uploaded: bool,
    disposed: bool,
}

impl GpuObject {
    /// Creates an empty drawable with the given primitive topology.
    pub fn new(topology: PrimitiveTopology) -> Self {
        Self {
            topology,
            attributes: Vec::new(),
            indices: None,
            index_format: IndexFormat::Uint16,
            item_count: 0,
            uploaded: false,
            disposed: false,
        }
    }

    /// The primitive topology this object draws.
    pub fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    /// The number of items (indices, or vertices when non-indexed) drawn.
    pub fn item_count(&self) -> u32 {
        self.item_count
    }

    /// The element width chosen for the index buffer.
    pub fn index_format(&self) -> IndexFormat {
        self.index_format
    }

    /// Whether [`upload`](Self::upload) has run.
    pub fn is_uploaded(&self) -> bool {
        self.uploaded
    }

    /// Looks up a registered attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// The CPU index data, if not yet uploaded.
    pub fn cpu_indices(&self) -> Option<&[u32]> {
        match &self.indices {
            Some(IndexStore::Cpu(buffer)) => Some(buffer.combine()),
            _ => None,
        }
    }

    /// Registers a float vertex attribute.
    ///
    /// Exceeding the device's attribute ceiling fails here, before any GPU
    /// call is made for the attribute.
    pub fn set_attribute_f32(
        &mut self,
        device: &dyn GpuDevice,
        name: impl Into<Cow<'static, str>>,
        components: u32,
        data: FlatBuffer<f32>,
    ) -> Result<(), SceneError> {
        self.register(
            device,
            name.into(),
            components,
            DataType::Float32,
            false,
            AttributeSource::F32(data),
        )
    }

    /// Registers a normalized byte vertex attribute.
    pub fn set_attribute_u8(
        &mut self,
        device: &dyn GpuDevice,
        name: impl Into<Cow<'static, str>>,
        components: u32,
        data: FlatBuffer<u8>,
    ) -> Result<(), SceneError> {
        self.register(
            device,
            name.into(),
            components,
            DataType::Uint8,
            true,
            AttributeSource::U8(data),
        )
    }

    fn register(
        &mut self,
        device: &dyn GpuDevice,
        name: Cow<'static, str>,
        components: u32,
        data_type: DataType,
        normalized: bool,
        source: AttributeSource,
    ) -> Result<(), SceneError> {
        if self.uploaded {
            return Err(SceneError::Sealed);
        }
        let max = device.limits().max_vertex_attributes as usize;
        if self.attributes.len() + 1 > max {
            return Err(ResourceError::LimitExceeded {
                resource: "vertex attributes",
                requested: self.attributes.len() + 1,
                max,
            }
            .into());
        }
        let scalar_len = source.scalar_len();
        if components > 0 && scalar_len % components as usize != 0 {
            return Err(SceneError::AttributeArity {
                len: scalar_len,
                components: components as usize,
            });
        }
        let vertex_count = (scalar_len / components.max(1) as usize) as u32;
        self.attributes.push(Attribute {
            name,
            components,
            data_type,
            normalized,
            source,
            vertex_count,
        });
        Ok(())
    }

    /// Registers the element index buffer, choosing the element width from
    /// the largest index value.
    ///
    /// Needing 32-bit indices on a device without that capability is fatal
    /// here, not at draw time, so the caller gets the earliest diagnostic.
    pub fn set_indices(
        &mut self,
        device: &dyn GpuDevice,
        data: FlatBuffer<u32>,
    ) -> Result<(), SceneError> {
        if self.uploaded {
            return Err(SceneError::Sealed);
        }
        let widest = data.iter().max().unwrap_or(0);
        self.index_format = if widest <= u16::MAX as u32 {
            IndexFormat::Uint16
        } else if device.limits().supports_u32_indices {
            IndexFormat::Uint32
        } else {
            return Err(ResourceError::Unsupported("32-bit element indices").into());
        };
        self.indices = Some(IndexStore::Cpu(data));
        Ok(())
    }

    /// Uploads every registered attribute and the index buffer. Idempotent:
    /// a second call is a no-op and allocates nothing.
    pub fn upload(&mut self, device: &dyn GpuDevice) -> Result<(), SceneError> {
        if self.uploaded {
            return Ok(());
        }

        for attribute in &mut self.attributes {
            let bytes: Vec<u8> = match &attribute.source {
                AttributeSource::F32(buffer) if !buffer.is_empty() => buffer.as_bytes().to_vec(),
                AttributeSource::U8(buffer) if !buffer.is_empty() => buffer.as_bytes().to_vec(),
                _ => continue,
            };
            let id = device.create_buffer_with_data(
                &BufferDescriptor {
                    label: Some(attribute.name.clone()),
                    usage: BufferUsage::Vertex,
                },
                &bytes,
            )?;
            attribute.source = AttributeSource::Gpu(id);
        }

        // Item count comes from the indices when any were registered,
        // otherwise from the first attribute's vertex count.
        match self.indices.take() {
            Some(IndexStore::Cpu(data)) => {
                let count = data.len() as u32;
                let bytes: Vec<u8> = match self.index_format {
                    IndexFormat::Uint16 => {
                        let narrowed: Vec<u16> = data.iter().map(|i| i as u16).collect();
                        bytemuck::cast_slice(&narrowed).to_vec()
                    }
                    IndexFormat::Uint32 => data.as_bytes().to_vec(),
                };
                let buffer = device.create_buffer_with_data(
                    &BufferDescriptor {
                        label: Some("indices".into()),
                        usage: BufferUsage::Index,
                    },
                    &bytes,
                )?;
                self.indices = Some(IndexStore::Gpu { buffer, count });
                self.item_count = count;
            }
            Some(gpu @ IndexStore::Gpu { .. }) => {
                if let IndexStore::Gpu { count, .. } = gpu {
                    self.item_count = count;
                }
                self.indices = Some(gpu);
            }
            None => {
                self.item_count = self
                    .attributes
                    .first()
                    .map(|attribute| attribute.vertex_count)
                    .unwrap_or(0);
            }
        }

        self.uploaded = true;
        trace!(
            "uploaded drawable: {} attribute(s), {} item(s)",
            self.attributes.len(),
            self.item_count
        );
        Ok(())
    }

    /// Binds the attributes the active program declares, binds the index
    /// buffer if present, and issues the draw. A zero-item object returns
    /// immediately. Attribute locations enabled for this draw are disabled
    /// again before returning.
    pub fn render(&self, device: &dyn GpuDevice, program: &Program) -> Result<(), SceneError> {
        if self.item_count == 0 || self.disposed {
            return Ok(());
        }

        let mut enabled = Vec::with_capacity(self.attributes.len());
        for attribute in &self.attributes {
            let Some(buffer) = attribute.buffer_id() else {
                continue;
            };
            // Attributes the program does not declare are skipped.
            let Some(location) = program.attribute_location(&attribute.name) else {
                continue;
            };
            device.bind_attribute(
                location,
                buffer,
                &AttributeLayout {
                    components: attribute.components,
                    data_type: attribute.data_type,
                    normalized: attribute.normalized,
                    stride: 0,
                    offset: 0,
                },
            );
            enabled.push(location);
        }

        match &self.indices {
            Some(IndexStore::Gpu { buffer, count }) => {
                device.bind_index_buffer(*buffer);
                device.draw_elements(self.topology, *count, self.index_format, 0);
            }
            _ => device.draw_arrays(self.topology, 0, self.item_count),
        }

        for location in enabled {
            device.disable_attribute(location);
        }
        Ok(())
    }

    /// Releases every GPU buffer exactly once. Safe to call repeatedly.
    pub fn dispose(&mut self, device: &dyn GpuDevice) -> Result<(), SceneError> {
        if self.disposed {
            return Ok(());
        }
        self.disposed = true;
        for attribute in &mut self.attributes {
            if let AttributeSource::Gpu(id) = attribute.source {
                device.destroy_buffer(id)?;
            }
            attribute.source = AttributeSource::F32(FlatBuffer::new());
        }
        if let Some(IndexStore::Gpu { buffer, .. }) = self.indices.take() {
            device.destroy_buffer(buffer)?;
        }
        self.item_count = 0;
        Ok(())
    }
}
