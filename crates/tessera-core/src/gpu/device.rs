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

//! The `GpuDevice` trait and its descriptor types.

use super::enums::{
    BlendFactor, Capability, CompareFunction, DataType, IndexFormat, PrimitiveTopology, UniformKind,
};
use super::texture::TextureId;
use crate::error::{ResourceError, ShaderError};
use crate::math::LinearRgba;
use std::borrow::Cow;
use std::fmt::Debug;

/// An opaque handle to a GPU buffer resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub usize);

/// An opaque handle to a compiled and linked shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub usize);

/// An opaque handle to one active uniform of a linked program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub usize);

/// The allowed usage of a buffer, used by the backend to pick memory and
/// bind points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// The buffer feeds vertex attributes.
    Vertex,
    /// The buffer feeds element indices.
    Index,
}

/// A descriptor used to create a GPU buffer.
#[derive(Debug, Clone)]
pub struct BufferDescriptor<'a> {
    /// An optional debug label for the buffer.
    pub label: Option<Cow<'a, str>>,
    /// How the buffer will be bound.
    pub usage: BufferUsage,
}

/// A descriptor used to compile and link a shader program.
#[derive(Debug, Clone)]
pub struct ProgramDescriptor<'a> {
    /// An optional debug label, echoed in shader diagnostics.
    pub label: Option<Cow<'a, str>>,
    /// The vertex stage source.
    pub vertex_source: Cow<'a, str>,
    /// The fragment stage source.
    pub fragment_source: Cow<'a, str>,
}

/// The layout of one vertex attribute within its buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttributeLayout {
    /// Components per vertex (1 to 4).
    pub components: u32,
    /// The scalar element type of the buffer.
    pub data_type: DataType,
    /// Whether integer data is normalized to `[0.0, 1.0]` on fetch.
    pub normalized: bool,
    /// Byte stride between consecutive vertices; `0` means tightly packed.
    pub stride: u32,
    /// Byte offset of the first element.
    pub offset: u32,
}

/// One active vertex attribute reported by program introspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeInfo {
    /// The attribute name as declared in the shader.
    pub name: String,
    /// The bind location assigned by the linker.
    pub location: u32,
}

/// One active uniform reported by program introspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformInfo {
    /// The uniform name as declared in the shader.
    pub name: String,
    /// The location used for upload.
    pub location: UniformLocation,
    /// The upload strategy inferred from the reported type.
    pub kind: UniformKind,
    /// The declared array length (`1` for non-arrays).
    pub array_size: u32,
}

/// The resolved payload of one uniform upload.
///
/// This is what reaches the device after the render-state layer has picked
/// an upload strategy: matrices are already flattened column-major and
/// samplers are already resolved to a texture unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformStage<'a> {
    /// A scalar `float`.
    Float(f32),
    /// A scalar `int`.
    Int(i32),
    /// A `vec2`.
    Vec2([f32; 2]),
    /// A `vec3`.
    Vec3([f32; 3]),
    /// A `vec4`.
    Vec4([f32; 4]),
    /// A column-major `mat2`.
    Mat2([f32; 4]),
    /// A column-major `mat3`.
    Mat3([f32; 9]),
    /// A column-major `mat4`.
    Mat4([f32; 16]),
    /// A `float[]` payload, e.g. the packed light table.
    FloatArray(&'a [f32]),
    /// A sampler bound to the given texture unit.
    Sampler(u32),
}

/// The resource ceilings of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceLimits {
    /// Maximum number of vertex attributes one drawable may register.
    pub max_vertex_attributes: u32,
    /// Number of texture units available to one unify pass.
    pub max_texture_units: u32,
    /// Whether 32-bit element indices are supported.
    pub supports_u32_indices: bool,
}

impl Default for DeviceLimits {
    fn default() -> Self {
        Self {
            max_vertex_attributes: 16,
            max_texture_units: 8,
            supports_u32_indices: true,
        }
    }
}

/// A scissor rectangle in framebuffer pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScissorRect {
    /// Left edge.
    pub x: u32,
    /// Bottom edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// The capability object wrapping an immediate-mode graphics context.
///
/// The scene core is single-threaded and synchronous, so implementations
/// are free to use interior mutability and are not required to be `Send`.
/// Resource-producing methods return [`ResourceError`] on failure; state
/// setters are infallible because a malformed argument is a programming
/// error caught before this layer.
pub trait GpuDevice: Debug {
    /// Reports the device's resource ceilings.
    fn limits(&self) -> DeviceLimits;

    /// Creates a GPU buffer initialized with the provided data.
    ///
    /// ## Errors
    /// * `ResourceError` - if the allocation fails.
    fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError>;

    /// Destroys a GPU buffer.
    ///
    /// ## Errors
    /// * `ResourceError` - if the handle is unknown.
    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError>;

    /// Binds a vertex buffer to an attribute location with the given layout
    /// and enables the location.
    fn bind_attribute(&self, location: u32, buffer: BufferId, layout: &AttributeLayout);

    /// Disables a previously enabled attribute location.
    fn disable_attribute(&self, location: u32);

    /// Binds an element index buffer for subsequent indexed draws.
    fn bind_index_buffer(&self, buffer: BufferId);

    /// Issues a non-indexed draw.
    fn draw_arrays(&self, topology: PrimitiveTopology, first: u32, count: u32);

    /// Issues an indexed draw from the currently bound index buffer.
    fn draw_elements(
        &self,
        topology: PrimitiveTopology,
        count: u32,
        format: IndexFormat,
        offset: u32,
    );

    /// Compiles and links a shader program from source.
    ///
    /// ## Errors
    /// * `ShaderError` - carrying the compiler's structured diagnostics
    ///   when a stage fails to compile, or the linker's message when the
    ///   stages fail to link.
    fn create_program(&self, descriptor: &ProgramDescriptor) -> Result<ProgramId, ShaderError>;

    /// Makes a program the active one for subsequent draws and uploads.
    fn use_program(&self, program: ProgramId);

    /// Enumerates the active vertex attributes of a linked program.
    fn program_attributes(&self, program: ProgramId) -> Vec<AttributeInfo>;

    /// Enumerates the active uniforms of a linked program.
    fn program_uniforms(&self, program: ProgramId) -> Vec<UniformInfo>;

    /// Uploads one resolved uniform payload to the active program.
    fn set_uniform(&self, location: UniformLocation, value: UniformStage<'_>);

    /// Binds a texture to a texture unit.
    fn bind_texture(&self, unit: u32, texture: TextureId);

    /// Sets the blend function pair.
    fn set_blend_func(&self, src: BlendFactor, dst: BlendFactor);

    /// Enables or disables depth writes.
    fn set_depth_mask(&self, enabled: bool);

    /// Sets the depth comparison function.
    fn set_depth_func(&self, func: CompareFunction);

    /// Sets the rasterized line width in pixels.
    fn set_line_width(&self, width: f32);

    /// Enables or disables a fixed-function capability.
    fn set_capability(&self, capability: Capability, enabled: bool);

    /// Sets or clears the scissor rectangle.
    fn set_scissor(&self, rect: Option<ScissorRect>);

    /// Clears the color target (when a color is given) and optionally the
    /// depth buffer.
    fn clear(&self, color: Option<LinearRgba>, depth: bool);
}
