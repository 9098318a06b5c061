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

//! Shape accumulation, triangulation, and attribute derivation.

use crate::error::SceneError;
use crate::geometry::FlatBuffer;
use tessera_core::gpu::{DrawMode, PrimitiveTopology, ShapeType};
use tessera_core::math::{Vec2, Vec3};

/// The compiler context a shape is closed against.
///
/// Captured at close time, so state mutated between shapes (color, draw
/// mode, lighting) applies to the next shape without touching earlier ones.
#[derive(Debug, Clone, Copy)]
pub struct ShapeContext {
    /// Whether vertices carry colors or texture coordinates.
    pub draw_mode: DrawMode,
    /// The color stamped on every vertex in color mode.
    pub color_bytes: [u8; 4],
    /// Whether normals are required (generated when not authored).
    pub lighting: bool,
    /// Multiplier over the generated quad texture coordinates.
    pub texture_scale: Vec2,
}

impl Default for ShapeContext {
    fn default() -> Self {
        Self {
            draw_mode: DrawMode::Color,
            color_bytes: [255, 255, 255, 255],
            lighting: false,
            texture_scale: Vec2::new(1.0, 1.0),
        }
    }
}

/// A closed shape's derived attribute set, ready for batching.
///
/// Indices are local (zero-based); the batch re-bases them when absorbing.
#[derive(Debug)]
pub struct ClosedShape {
    /// The lowered primitive topology.
    pub topology: PrimitiveTopology,
    /// The draw mode the shape was closed under.
    pub draw_mode: DrawMode,
    /// Whether the shape participates in lighting.
    pub lit: bool,
    /// Number of vertices.
    pub vertex_count: usize,
    /// Flat `x, y, z` positions.
    pub vertices: FlatBuffer<f32>,
    /// Flat `x, y, z` normals; empty when unlit.
    pub normals: FlatBuffer<f32>,
    /// Packed `r, g, b, a` bytes; empty in texture mode.
    pub colors: FlatBuffer<u8>,
    /// Flat `u, v` coordinates; empty in color mode.
    pub uvs: FlatBuffer<f32>,
    /// Local element indices.
    pub indices: FlatBuffer<u32>,
}

/// Accumulates one open shape's raw vertex data until it is closed.
#[derive(Debug)]
pub struct ShapeBuilder {
    shape_type: ShapeType,
    vertices: FlatBuffer<f32>,
    normals: FlatBuffer<f32>,
    uvs: FlatBuffer<f32>,
}

impl ShapeBuilder {
    /// Opens a shape of the given type.
    pub fn new(shape_type: ShapeType) -> Self {
        Self {
            shape_type,
            vertices: FlatBuffer::new(),
            normals: FlatBuffer::new(),
            uvs: FlatBuffer::new(),
        }
    }

    /// The type this shape was opened with.
    pub fn shape_type(&self) -> ShapeType {
        self.shape_type
    }

    /// Appends flat position data.
    pub fn push_vertices(&mut self, data: &[f32]) -> Result<(), SceneError> {
        if data.len() % 3 != 0 {
            return Err(SceneError::AttributeArity {
                len: data.len(),
                components: 3,
            });
        }
        self.vertices.extend_from_slice(data);
        Ok(())
    }

    /// Appends flat normal data.
    pub fn push_normals(&mut self, data: &[f32]) -> Result<(), SceneError> {
        if data.len() % 3 != 0 {
            return Err(SceneError::AttributeArity {
                len: data.len(),
                components: 3,
            });
        }
        self.normals.extend_from_slice(data);
        Ok(())
    }

    /// Appends flat texture coordinates.
    pub fn push_uvs(&mut self, data: &[f32]) -> Result<(), SceneError> {
        if data.len() % 2 != 0 {
            return Err(SceneError::AttributeArity {
                len: data.len(),
                components: 2,
            });
        }
        self.uvs.extend_from_slice(data);
        Ok(())
    }

    /// Closes the shape, deriving indices from the shape type.
    pub fn close(self, ctx: &ShapeContext) -> Result<ClosedShape, SceneError> {
        let indices = self.derive_indices()?;
        self.close_with(ctx, indices)
    }

    /// Closes the shape with explicit local indices, bypassing derivation.
    pub fn close_indexed(
        self,
        ctx: &ShapeContext,
        indices: Vec<u32>,
    ) -> Result<ClosedShape, SceneError> {
        self.close_with(ctx, FlatBuffer::from(indices))
    }

    fn close_with(
        self,
        ctx: &ShapeContext,
        indices: FlatBuffer<u32>,
    ) -> Result<ClosedShape, SceneError> {
        let vertex_count = self.vertices.len() / 3;
        let topology = self.shape_type.topology();

        let normals = if ctx.lighting && self.normals.is_empty() {
            derive_normals(topology, &self.vertices, &indices)
        } else {
            self.normals
        };

        let mut colors = FlatBuffer::new();
        let mut uvs = self.uvs;
        match ctx.draw_mode {
            DrawMode::Color => {
                for _ in 0..vertex_count {
                    colors.extend_from_slice(&ctx.color_bytes);
                }
                uvs = FlatBuffer::new();
            }
            DrawMode::Texture => {
                if uvs.is_empty() && self.shape_type == ShapeType::Quad {
                    uvs = default_quad_uvs(vertex_count, ctx.texture_scale);
                }
            }
        }

        Ok(ClosedShape {
            topology,
            draw_mode: ctx.draw_mode,
            lit: ctx.lighting,
            vertex_count,
            vertices: self.vertices,
            normals,
            colors,
            uvs,
            indices,
        })
    }

    /// Derives local indices from the shape type: grouped types get a fixed
    /// pattern per group, strips and fans are lowered to triangle lists via
    /// a sliding window.
    fn derive_indices(&self) -> Result<FlatBuffer<u32>, SceneError> {
        let count = self.vertices.len() / 3;
        let mut indices = FlatBuffer::new();

        if let Some(group) = self.shape_type.grouping() {
            if count % group != 0 {
                return Err(SceneError::VertexArity {
                    shape: self.shape_type,
                    count,
                    required: group,
                });
            }
            if self.shape_type == ShapeType::Quad {
                for base in (0..count as u32).step_by(4) {
                    indices.extend_from_slice(&[
                        base,
                        base + 1,
                        base + 2,
                        base,
                        base + 2,
                        base + 3,
                    ]);
                }
            } else {
                for i in 0..count as u32 {
                    indices.push(i);
                }
            }
            return Ok(indices);
        }

        // Strip and fan lowering.
        if count < 3 {
            return Err(SceneError::TooFewVertices {
                shape: self.shape_type,
                count,
                required: 3,
            });
        }
        match self.shape_type {
            ShapeType::TriangleStrip => {
                for i in 2..count as u32 {
                    if i % 2 == 0 {
                        indices.extend_from_slice(&[i - 2, i - 1, i]);
                    } else {
                        indices.extend_from_slice(&[i - 1, i - 2, i]);
                    }
                }
            }
            ShapeType::TriangleFanCcw => {
                for i in 2..count as u32 {
                    indices.extend_from_slice(&[0, i - 1, i]);
                }
            }
            ShapeType::TriangleFanCw => {
                for i in 2..count as u32 {
                    indices.extend_from_slice(&[0, i, i - 1]);
                }
            }
            _ => unreachable!("grouped shape types are handled above"),
        }
        Ok(indices)
    }
}

/// Generates flat normals from the final index list.
///
/// Triangles get the unnormalized face cross product stamped on all three
/// corners; a vertex shared between faces keeps the last face's normal.
/// Line segments get the segment direction on both endpoints, which lit
/// line shaders use as a tangent.
fn derive_normals(
    topology: PrimitiveTopology,
    vertices: &FlatBuffer<f32>,
    indices: &FlatBuffer<u32>,
) -> FlatBuffer<f32> {
    let mut normals = vec![0.0f32; vertices.len()];
    let read = |i: u32| -> Vec3 {
        let base = i as usize * 3;
        Vec3::new(
            vertices.get(base).unwrap_or(0.0),
            vertices.get(base + 1).unwrap_or(0.0),
            vertices.get(base + 2).unwrap_or(0.0),
        )
    };
    let mut write = |i: u32, n: Vec3| {
        let base = i as usize * 3;
        if base + 2 < normals.len() {
            normals[base] = n.x;
            normals[base + 1] = n.y;
            normals[base + 2] = n.z;
        }
    };

    let flat: Vec<u32> = indices.iter().collect();
    match topology {
        PrimitiveTopology::TriangleList => {
            for tri in flat.chunks_exact(3) {
                let (a, b, c) = (read(tri[0]), read(tri[1]), read(tri[2]));
                let n = (b - a).cross(c - a);
                write(tri[0], n);
                write(tri[1], n);
                write(tri[2], n);
            }
        }
        PrimitiveTopology::LineList => {
            for seg in flat.chunks_exact(2) {
                let d = read(seg[1]) - read(seg[0]);
                write(seg[0], d);
                write(seg[1], d);
            }
        }
        PrimitiveTopology::PointList => {}
    }
    FlatBuffer::from(normals)
}

/// The default texture coordinates of axis-aligned quads, one full tile per
/// group, scaled by the context's texture scale.
fn default_quad_uvs(vertex_count: usize, scale: Vec2) -> FlatBuffer<f32> {
    let mut uvs = FlatBuffer::with_capacity(vertex_count * 2);
    let tile = [
        0.0,
        0.0,
        scale.x,
        0.0,
        scale.x,
        scale.y,
        0.0,
        scale.y,
    ];
    for _ in 0..vertex_count / 4 {
        uvs.extend_from_slice(&tile);
    }
    uvs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ShapeContext {
        ShapeContext::default()
    }

    #[test]
    fn quad_groups_split_into_two_triangles() {
        let mut shape = ShapeBuilder::new(ShapeType::Quad);
        shape
            .push_vertices(&[
                0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0, // group 0
                2.0, 0.0, 0.0, 3.0, 0.0, 0.0, 3.0, 1.0, 0.0, 2.0, 1.0, 0.0, // group 1
            ])
            .unwrap();
        let closed = shape.close(&ctx()).unwrap();
        assert_eq!(closed.topology, PrimitiveTopology::TriangleList);
        assert_eq!(
            closed.indices.combine(),
            &[0, 1, 2, 0, 2, 3, 4, 5, 6, 4, 6, 7]
        );
    }

    #[test]
    fn quad_arity_is_enforced() {
        let mut shape = ShapeBuilder::new(ShapeType::Quad);
        shape.push_vertices(&[0.0; 9]).unwrap();
        match shape.close(&ctx()) {
            Err(SceneError::VertexArity {
                count, required, ..
            }) => {
                assert_eq!(count, 3);
                assert_eq!(required, 4);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn fan_windings_differ() {
        let verts = [
            0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0,
        ];
        let mut ccw = ShapeBuilder::new(ShapeType::TriangleFanCcw);
        ccw.push_vertices(&verts).unwrap();
        assert_eq!(
            ccw.close(&ctx()).unwrap().indices.combine(),
            &[0, 1, 2, 0, 2, 3]
        );
        let mut cw = ShapeBuilder::new(ShapeType::TriangleFanCw);
        cw.push_vertices(&verts).unwrap();
        assert_eq!(
            cw.close(&ctx()).unwrap().indices.combine(),
            &[0, 2, 1, 0, 3, 2]
        );
    }

    #[test]
    fn strip_alternates_winding() {
        let mut strip = ShapeBuilder::new(ShapeType::TriangleStrip);
        strip
            .push_vertices(&[
                0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 2.0, 0.0,
            ])
            .unwrap();
        assert_eq!(
            strip.close(&ctx()).unwrap().indices.combine(),
            &[0, 1, 2, 2, 1, 3, 2, 3, 4]
        );
    }

    #[test]
    fn strip_needs_three_vertices() {
        let mut strip = ShapeBuilder::new(ShapeType::TriangleStrip);
        strip.push_vertices(&[0.0; 6]).unwrap();
        assert!(matches!(
            strip.close(&ctx()),
            Err(SceneError::TooFewVertices { required: 3, .. })
        ));
    }

    #[test]
    fn lit_triangle_gets_unnormalized_face_normal() {
        let mut shape = ShapeBuilder::new(ShapeType::Triangle);
        shape
            .push_vertices(&[0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 2.0, 0.0])
            .unwrap();
        let lit = ShapeContext {
            lighting: true,
            ..ShapeContext::default()
        };
        let closed = shape.close(&lit).unwrap();
        // cross((2,0,0), (0,2,0)) = (0,0,4), stamped on every corner.
        assert_eq!(
            closed.normals.combine(),
            &[0.0, 0.0, 4.0, 0.0, 0.0, 4.0, 0.0, 0.0, 4.0]
        );
    }

    #[test]
    fn authored_normals_win_over_derivation() {
        let mut shape = ShapeBuilder::new(ShapeType::Triangle);
        shape
            .push_vertices(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0])
            .unwrap();
        shape
            .push_normals(&[0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0])
            .unwrap();
        let lit = ShapeContext {
            lighting: true,
            ..ShapeContext::default()
        };
        let closed = shape.close(&lit).unwrap();
        assert_eq!(closed.normals.get(1), Some(1.0));
    }

    #[test]
    fn color_mode_stamps_the_context_color() {
        let mut shape = ShapeBuilder::new(ShapeType::Triangle);
        shape
            .push_vertices(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0])
            .unwrap();
        let red = ShapeContext {
            color_bytes: [255, 0, 0, 255],
            ..ShapeContext::default()
        };
        let closed = shape.close(&red).unwrap();
        assert_eq!(closed.colors.len(), 12);
        assert_eq!(closed.colors.combine()[..4], [255, 0, 0, 255]);
        assert!(closed.uvs.is_empty());
    }

    #[test]
    fn textured_quads_default_their_uvs() {
        let mut shape = ShapeBuilder::new(ShapeType::Quad);
        shape
            .push_vertices(&[
                0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0,
            ])
            .unwrap();
        let textured = ShapeContext {
            draw_mode: DrawMode::Texture,
            texture_scale: Vec2::new(2.0, 3.0),
            ..ShapeContext::default()
        };
        let closed = shape.close(&textured).unwrap();
        assert_eq!(
            closed.uvs.combine(),
            &[0.0, 0.0, 2.0, 0.0, 2.0, 3.0, 0.0, 3.0]
        );
        assert!(closed.colors.is_empty());
    }
}
