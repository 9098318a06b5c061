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

//! A recording `GpuDevice` used across the integration suites.

use std::cell::RefCell;
use std::collections::HashMap;
use tessera_core::gpu::{
    AttributeInfo, AttributeLayout, BlendFactor, BufferDescriptor, BufferId, BufferUsage,
    Capability, CompareFunction, DeviceLimits, GpuDevice, IndexFormat,
    PrimitiveTopology, ProgramDescriptor, ProgramId, ScissorRect, TextureId, UniformInfo,
    UniformKind, UniformLocation, UniformStage,
};
use tessera_core::math::LinearRgba;
use tessera_core::{ResourceError, ShaderDiagnostic, ShaderError};

/// An owned mirror of [`UniformStage`], recorded per upload.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedStage {
    Float(f32),
    Int(i32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat2([f32; 4]),
    Mat3([f32; 9]),
    Mat4([f32; 16]),
    FloatArray(Vec<f32>),
    Sampler(u32),
}

impl From<UniformStage<'_>> for RecordedStage {
    fn from(stage: UniformStage<'_>) -> Self {
        match stage {
            UniformStage::Float(v) => RecordedStage::Float(v),
            UniformStage::Int(v) => RecordedStage::Int(v),
            UniformStage::Vec2(v) => RecordedStage::Vec2(v),
            UniformStage::Vec3(v) => RecordedStage::Vec3(v),
            UniformStage::Vec4(v) => RecordedStage::Vec4(v),
            UniformStage::Mat2(v) => RecordedStage::Mat2(v),
            UniformStage::Mat3(v) => RecordedStage::Mat3(v),
            UniformStage::Mat4(v) => RecordedStage::Mat4(v),
            UniformStage::FloatArray(v) => RecordedStage::FloatArray(v.to_vec()),
            UniformStage::Sampler(v) => RecordedStage::Sampler(v),
        }
    }
}

/// One recorded device call, in issue order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateBuffer(BufferId, BufferUsage),
    DestroyBuffer(BufferId),
    BindAttribute(u32, BufferId),
    DisableAttribute(u32),
    BindIndexBuffer(BufferId),
    DrawArrays(PrimitiveTopology, u32, u32),
    DrawElements(PrimitiveTopology, u32, IndexFormat),
    CreateProgram(ProgramId),
    UseProgram(ProgramId),
    SetUniform(UniformLocation, RecordedStage),
    BindTexture(u32, TextureId),
    SetBlendFunc(BlendFactor, BlendFactor),
    SetDepthMask(bool),
    SetDepthFunc(CompareFunction),
    SetLineWidth(f32),
    SetCapability(Capability, bool),
    SetScissor(Option<ScissorRect>),
    Clear(Option<LinearRgba>, bool),
}

#[derive(Debug, Default)]
struct Inner {
    next_buffer: usize,
    next_program: usize,
    buffers: HashMap<BufferId, Vec<u8>>,
    created: usize,
    destroyed: usize,
    calls: Vec<Call>,
}

/// A `GpuDevice` that records every call and retains uploaded payloads for
/// readback by assertions.
#[derive(Debug)]
pub struct RecordingDevice {
    limits: DeviceLimits,
    attributes: Vec<AttributeInfo>,
    uniforms: Vec<UniformInfo>,
    shader_failure: Option<Vec<ShaderDiagnostic>>,
    inner: RefCell<Inner>,
}

impl Default for RecordingDevice {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
impl RecordingDevice {
    pub fn new() -> Self {
        Self {
            limits: DeviceLimits::default(),
            attributes: Vec::new(),
            uniforms: Vec::new(),
            shader_failure: None,
            inner: RefCell::new(Inner::default()),
        }
    }

    pub fn with_limits(mut self, limits: DeviceLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Makes every `create_program` call fail with the given diagnostics.
    pub fn with_shader_failure(mut self, diagnostics: Vec<ShaderDiagnostic>) -> Self {
        self.shader_failure = Some(diagnostics);
        self
    }

    /// Declares the attributes every introspected program reports, with
    /// locations assigned in declaration order.
    pub fn with_attributes(mut self, names: &[&str]) -> Self {
        self.attributes = names
            .iter()
            .enumerate()
            .map(|(location, name)| AttributeInfo {
                name: (*name).to_string(),
                location: location as u32,
            })
            .collect();
        self
    }

    /// Declares the uniforms every introspected program reports, with
    /// locations assigned in declaration order.
    pub fn with_uniforms(mut self, decls: &[(&str, UniformKind)]) -> Self {
        self.uniforms = decls
            .iter()
            .enumerate()
            .map(|(location, (name, kind))| UniformInfo {
                name: (*name).to_string(),
                location: UniformLocation(location),
                kind: *kind,
                array_size: 1,
            })
            .collect();
        self
    }

    /// The standard program contract most suites render against.
    pub fn with_default_program(self) -> Self {
        self.with_attributes(&["position", "color", "uv", "normal"])
            .with_uniforms(&[
                ("mvMatrix", UniformKind::Mat4),
                ("pMatrix", UniformKind::Mat4),
                ("colorMask", UniformKind::Vec4),
                ("sampler", UniformKind::Sampler2d),
                ("lights", UniformKind::Float),
                ("lightCount", UniformKind::Int),
                ("ambient", UniformKind::Vec4),
            ])
    }

    /// The location assigned to a declared uniform.
    pub fn uniform_location(&self, name: &str) -> UniformLocation {
        self.uniforms
            .iter()
            .find(|u| u.name == name)
            .map(|u| u.location)
            .unwrap_or_else(|| panic!("uniform {name} not declared on this device"))
    }

    /// The retained payload of a live buffer.
    pub fn buffer_bytes(&self, id: BufferId) -> Vec<u8> {
        self.inner.borrow().buffers[&id].clone()
    }

    pub fn created_buffers(&self) -> usize {
        self.inner.borrow().created
    }

    pub fn destroyed_buffers(&self) -> usize {
        self.inner.borrow().destroyed
    }

    pub fn live_buffers(&self) -> usize {
        self.inner.borrow().buffers.len()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.borrow().calls.clone()
    }

    /// Recorded uploads to one uniform location, in order.
    pub fn uploads_to(&self, location: UniformLocation) -> Vec<RecordedStage> {
        self.inner
            .borrow()
            .calls
            .iter()
            .filter_map(|call| match call {
                Call::SetUniform(at, stage) if *at == location => Some(stage.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn draw_count(&self) -> usize {
        self.inner
            .borrow()
            .calls
            .iter()
            .filter(|call| matches!(call, Call::DrawArrays(..) | Call::DrawElements(..)))
            .count()
    }

    /// Index payloads decoded per indexed draw, pairing the bound buffer
    /// with the element format of the draw that consumed it.
    pub fn drawn_indices(&self) -> Vec<Vec<u32>> {
        let inner = self.inner.borrow();
        let mut out = Vec::new();
        let mut bound = None;
        for call in &inner.calls {
            match call {
                Call::BindIndexBuffer(id) => bound = Some(*id),
                Call::DrawElements(_, _, format) => {
                    let id = bound.expect("an index buffer is bound before drawing");
                    let bytes = &inner.buffers[&id];
                    let decoded = match format {
                        IndexFormat::Uint16 => bytes
                            .chunks_exact(2)
                            .map(|b| u16::from_le_bytes([b[0], b[1]]) as u32)
                            .collect(),
                        IndexFormat::Uint32 => bytes
                            .chunks_exact(4)
                            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                            .collect(),
                    };
                    out.push(decoded);
                }
                _ => {}
            }
        }
        out
    }

    fn record(&self, call: Call) {
        self.inner.borrow_mut().calls.push(call);
    }
}

impl GpuDevice for RecordingDevice {
    fn limits(&self) -> DeviceLimits {
        self.limits
    }

    fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError> {
        let mut inner = self.inner.borrow_mut();
        let id = BufferId(inner.next_buffer);
        inner.next_buffer += 1;
        inner.created += 1;
        inner.buffers.insert(id, data.to_vec());
        inner.calls.push(Call::CreateBuffer(id, descriptor.usage));
        Ok(id)
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        let mut inner = self.inner.borrow_mut();
        if inner.buffers.remove(&id).is_none() {
            return Err(ResourceError::InvalidHandle("buffer"));
        }
        inner.destroyed += 1;
        inner.calls.push(Call::DestroyBuffer(id));
        Ok(())
    }

    fn bind_attribute(&self, location: u32, buffer: BufferId, _layout: &AttributeLayout) {
        self.record(Call::BindAttribute(location, buffer));
    }

    fn disable_attribute(&self, location: u32) {
        self.record(Call::DisableAttribute(location));
    }

    fn bind_index_buffer(&self, buffer: BufferId) {
        self.record(Call::BindIndexBuffer(buffer));
    }

    fn draw_arrays(&self, topology: PrimitiveTopology, first: u32, count: u32) {
        self.record(Call::DrawArrays(topology, first, count));
    }

    fn draw_elements(
        &self,
        topology: PrimitiveTopology,
        count: u32,
        format: IndexFormat,
        _offset: u32,
    ) {
        self.record(Call::DrawElements(topology, count, format));
    }

    fn create_program(&self, descriptor: &ProgramDescriptor) -> Result<ProgramId, ShaderError> {
        if let Some(diagnostics) = &self.shader_failure {
            return Err(ShaderError::CompilationError {
                label: descriptor
                    .label
                    .as_deref()
                    .unwrap_or("unlabeled")
                    .to_string(),
                diagnostics: diagnostics.clone(),
            });
        }
        let mut inner = self.inner.borrow_mut();
        let id = ProgramId(inner.next_program);
        inner.next_program += 1;
        inner.calls.push(Call::CreateProgram(id));
        Ok(id)
    }

    fn use_program(&self, program: ProgramId) {
        self.record(Call::UseProgram(program));
    }

    fn program_attributes(&self, _program: ProgramId) -> Vec<AttributeInfo> {
        self.attributes.clone()
    }

    fn program_uniforms(&self, _program: ProgramId) -> Vec<UniformInfo> {
        self.uniforms.clone()
    }

    fn set_uniform(&self, location: UniformLocation, value: UniformStage<'_>) {
        self.record(Call::SetUniform(location, value.into()));
    }

    fn bind_texture(&self, unit: u32, texture: TextureId) {
        self.record(Call::BindTexture(unit, texture));
    }

    fn set_blend_func(&self, src: BlendFactor, dst: BlendFactor) {
        self.record(Call::SetBlendFunc(src, dst));
    }

    fn set_depth_mask(&self, enabled: bool) {
        self.record(Call::SetDepthMask(enabled));
    }

    fn set_depth_func(&self, func: CompareFunction) {
        self.record(Call::SetDepthFunc(func));
    }

    fn set_line_width(&self, width: f32) {
        self.record(Call::SetLineWidth(width));
    }

    fn set_capability(&self, capability: Capability, enabled: bool) {
        self.record(Call::SetCapability(capability, enabled));
    }

    fn set_scissor(&self, rect: Option<ScissorRect>) {
        self.record(Call::SetScissor(rect));
    }

    fn clear(&self, color: Option<LinearRgba>, depth: bool) {
        self.record(Call::Clear(color, depth));
    }
}

/// A texture stub with controllable readiness.
#[derive(Debug)]
#[allow(dead_code)]
pub struct FakeTexture {
    id: TextureId,
    ready: std::cell::Cell<bool>,
}

#[allow(dead_code)]
impl FakeTexture {
    pub fn new(id: usize) -> Self {
        Self {
            id: TextureId(id),
            ready: std::cell::Cell::new(true),
        }
    }

    pub fn pending(id: usize) -> Self {
        Self {
            id: TextureId(id),
            ready: std::cell::Cell::new(false),
        }
    }

    pub fn make_ready(&self) {
        self.ready.set(true);
    }
}

impl tessera_core::gpu::TextureLike for FakeTexture {
    fn id(&self) -> TextureId {
        self.id
    }

    fn is_ready(&self) -> bool {
        self.ready.get()
    }
}
