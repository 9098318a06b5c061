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

//! The introspected program contract and texture-unit bookkeeping.

use crate::error::SceneError;
use crate::render::matrix::UniformValue;
use ahash::AHashMap;
use log::{trace, warn};
use tessera_core::gpu::{GpuDevice, ProgramId, UniformInfo, UniformKind, UniformStage};
use tessera_core::ResourceError;

/// Hands out texture units in registration order within one unify pass.
///
/// The counter is reset at the start of every pass, so a unit number is only
/// meaningful until the next [`reset`](Self::reset).
#[derive(Debug)]
pub struct TextureUnitAllocator {
    next: u32,
    max: u32,
}

impl TextureUnitAllocator {
    /// Creates an allocator with the device's unit ceiling.
    pub fn new(max: u32) -> Self {
        Self { next: 0, max }
    }

    /// Rewinds the counter for a new unify pass.
    pub fn reset(&mut self) {
        self.next = 0;
    }

    /// Claims the next unit.
    pub fn allocate(&mut self) -> Result<u32, ResourceError> {
        if self.next >= self.max {
            return Err(ResourceError::LimitExceeded {
                resource: "texture units",
                requested: self.next as usize + 1,
                max: self.max as usize,
            });
        }
        let unit = self.next;
        self.next += 1;
        Ok(unit)
    }
}

/// The introspected contract of one linked shader program.
///
/// Built once per program by enumerating the linker's active attributes and
/// uniforms; every later upload resolves names through these tables instead
/// of asking the device again.
#[derive(Debug)]
pub struct Program {
    id: ProgramId,
    attributes: AHashMap<String, u32>,
    uniforms: AHashMap<String, UniformInfo>,
}

impl Program {
    /// Introspects a linked program into its name-resolution tables.
    pub fn new(device: &dyn GpuDevice, id: ProgramId) -> Self {
        let attributes = device
            .program_attributes(id)
            .into_iter()
            .map(|info| (info.name, info.location))
            .collect();
        let uniforms = device
            .program_uniforms(id)
            .into_iter()
            .map(|info| (info.name.clone(), info))
            .collect();
        Self {
            id,
            attributes,
            uniforms,
        }
    }

    /// The underlying program handle.
    pub fn id(&self) -> ProgramId {
        self.id
    }

    /// Resolves an attribute name to its bind location, or `None` when the
    /// program does not declare it.
    pub fn attribute_location(&self, name: &str) -> Option<u32> {
        self.attributes.get(name).copied()
    }

    /// The introspected record of one uniform, if declared.
    pub fn uniform(&self, name: &str) -> Option<&UniformInfo> {
        self.uniforms.get(name)
    }

    /// Uploads one value to the named uniform using the upload strategy the
    /// introspected kind dictates.
    ///
    /// Names the program does not declare are skipped silently: a model may
    /// carry state for richer programs than the one currently bound. A kind
    /// mismatch is logged and skipped rather than failing the frame. Both
    /// count as settled (`Ok(true)`). A texture that reports itself not
    /// ready returns `Ok(false)`: deferred, to be retried while the key
    /// stays marked.
    ///
    /// ## Errors
    /// * `SceneError::Resource` - when a sampler needs a texture unit and
    ///   none is left.
    pub fn upload(
        &self,
        device: &dyn GpuDevice,
        name: &str,
        value: &UniformValue,
        units: &mut TextureUnitAllocator,
    ) -> Result<bool, SceneError> {
        let Some(info) = self.uniforms.get(name) else {
            return Ok(true);
        };
        let stage = match (info.kind, value) {
            (UniformKind::Float, UniformValue::Float(v)) => UniformStage::Float(*v),
            (UniformKind::Int, UniformValue::Int(v)) => UniformStage::Int(*v),
            (UniformKind::Vec2, UniformValue::Vec2(v)) => UniformStage::Vec2(v.to_array()),
            (UniformKind::Vec3, UniformValue::Vec3(v)) => UniformStage::Vec3(v.to_array()),
            (UniformKind::Vec4, UniformValue::Vec4(v)) => UniformStage::Vec4(v.to_array()),
            (UniformKind::Mat2, UniformValue::Mat2(m)) => UniformStage::Mat2(m.to_cols_array()),
            (UniformKind::Mat3, UniformValue::Mat3(m)) => UniformStage::Mat3(m.to_cols_array()),
            (UniformKind::Mat4, UniformValue::Mat4(m)) => UniformStage::Mat4(m.to_cols_array()),
            (UniformKind::Float | UniformKind::Vec3 | UniformKind::Vec4, UniformValue::FloatArray(data)) => {
                UniformStage::FloatArray(&data[..])
            }
            (UniformKind::Sampler2d | UniformKind::SamplerCube, UniformValue::Texture(texture)) => {
                if !texture.is_ready() {
                    trace!("texture for '{name}' not ready, deferred");
                    return Ok(false);
                }
                let unit = units.allocate()?;
                texture.configure(device);
                device.bind_texture(unit, texture.id());
                UniformStage::Sampler(unit)
            }
            (kind, value) => {
                warn!("uniform '{name}' declared as {kind:?} but staged as {value:?}, skipped");
                return Ok(true);
            }
        };
        device.set_uniform(info.location, stage);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocator_resets_per_pass() {
        let mut units = TextureUnitAllocator::new(2);
        assert_eq!(units.allocate().unwrap(), 0);
        assert_eq!(units.allocate().unwrap(), 1);
        assert!(units.allocate().is_err());
        units.reset();
        assert_eq!(units.allocate().unwrap(), 0);
    }
}
