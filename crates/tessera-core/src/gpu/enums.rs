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

//! Closed enumerations for the GPU-facing state vocabulary.

/// The authoring-time shape types accepted by `start()`.
///
/// Shape types describe connectivity as the client thinks of it; the scene
/// compiler lowers each one to an indexed [`PrimitiveTopology`] when the
/// shape is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeType {
    /// Isolated points, no index generation.
    Point,
    /// Isolated line segments (every two vertices form a segment).
    Line,
    /// Isolated triangles (every three vertices form a triangle).
    Triangle,
    /// A connected triangle strip, lowered to an explicit triangle list.
    TriangleStrip,
    /// A triangle fan with clockwise winding, lowered to a triangle list.
    TriangleFanCw,
    /// A triangle fan with counter-clockwise winding, lowered to a triangle list.
    TriangleFanCcw,
    /// Quadrilaterals (every four vertices), lowered to two triangles each.
    Quad,
}

impl ShapeType {
    /// The vertex-count multiple this shape type requires, or `None` for
    /// strip/fan connectivity where only a minimum of three applies.
    pub const fn grouping(&self) -> Option<usize> {
        match self {
            ShapeType::Point => Some(1),
            ShapeType::Line => Some(2),
            ShapeType::Triangle => Some(3),
            ShapeType::Quad => Some(4),
            ShapeType::TriangleStrip | ShapeType::TriangleFanCw | ShapeType::TriangleFanCcw => None,
        }
    }

    /// The GPU primitive this shape type is drawn as after lowering.
    pub const fn topology(&self) -> PrimitiveTopology {
        match self {
            ShapeType::Point => PrimitiveTopology::PointList,
            ShapeType::Line => PrimitiveTopology::LineList,
            _ => PrimitiveTopology::TriangleList,
        }
    }
}

/// Defines how vertices are connected to form a geometric primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveTopology {
    /// Vertices are rendered as a list of isolated points.
    PointList,
    /// Vertices are rendered as a list of isolated lines.
    LineList,
    /// Vertices are rendered as a list of isolated triangles.
    TriangleList,
}

/// A factor in a blend equation, determining how much a source or destination color contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    /// The factor is `0.0`.
    Zero,
    /// The factor is `1.0`.
    One,
    /// The factor is the source color.
    SrcColor,
    /// The factor is `1.0 - src` per channel.
    OneMinusSrcColor,
    /// The factor is the source alpha component (`src.a`).
    SrcAlpha,
    /// The factor is `1.0 - src.a`.
    OneMinusSrcAlpha,
    /// The factor is the destination alpha component.
    DstAlpha,
    /// The factor is `1.0 - dst.a`.
    OneMinusDstAlpha,
}

/// The comparison function used for depth testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompareFunction {
    /// The test never passes.
    Never,
    /// The test passes if the new value is less than the existing value.
    #[default]
    Less,
    /// The test passes if the new value is equal to the existing value.
    Equal,
    /// The test passes if the new value is less than or equal to the existing value.
    LessEqual,
    /// The test passes if the new value is greater than the existing value.
    Greater,
    /// The test passes if the new value is not equal to the existing value.
    NotEqual,
    /// The test passes if the new value is greater than or equal to the existing value.
    GreaterEqual,
    /// The test always passes.
    Always,
}

/// A toggleable fixed-function capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Alpha blending.
    Blend,
    /// Depth testing.
    DepthTest,
    /// Back/front-face culling.
    CullFace,
    /// Scissor (clip-rectangle) testing.
    ScissorTest,
}

impl Capability {
    /// The number of distinct capabilities.
    pub const COUNT: usize = 4;

    /// All capabilities, in index order.
    pub const ALL: [Capability; Self::COUNT] = [
        Capability::Blend,
        Capability::DepthTest,
        Capability::CullFace,
        Capability::ScissorTest,
    ];

    /// A stable dense index for table storage.
    pub const fn index(&self) -> usize {
        match self {
            Capability::Blend => 0,
            Capability::DepthTest => 1,
            Capability::CullFace => 2,
            Capability::ScissorTest => 3,
        }
    }
}

/// The element width of an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    /// 16-bit unsigned indices.
    Uint16,
    /// 32-bit unsigned indices. Requires [`DeviceLimits::supports_u32_indices`].
    ///
    /// [`DeviceLimits::supports_u32_indices`]: super::device::DeviceLimits::supports_u32_indices
    Uint32,
}

/// The scalar element type of a vertex attribute buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// 32-bit floating point.
    Float32,
    /// 8-bit unsigned integer, typically normalized to `[0.0, 1.0]`.
    Uint8,
}

/// Whether geometry carries per-vertex colors or texture coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DrawMode {
    /// Per-vertex byte colors derived from the current fill color.
    #[default]
    Color,
    /// Per-vertex texture coordinates sampling the bound texture.
    Texture,
}

/// The upload strategy for a program uniform, inferred from the type the
/// backend reports during introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformKind {
    /// A scalar `float`.
    Float,
    /// A scalar `int` or `bool`.
    Int,
    /// A `vec2`.
    Vec2,
    /// A `vec3`.
    Vec3,
    /// A `vec4`.
    Vec4,
    /// A `mat2`.
    Mat2,
    /// A `mat3`.
    Mat3,
    /// A `mat4`.
    Mat4,
    /// A 2D texture sampler; consumes one texture unit per unify pass.
    Sampler2d,
    /// A cube-map sampler; consumes one texture unit per unify pass.
    SamplerCube,
}
