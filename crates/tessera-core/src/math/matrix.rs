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

//! Provides column-major 2x2, 3x3, and 4x4 matrix types.
//!
//! Matrices are stored as arrays of column vectors, matching the layout the
//! GPU expects for uniform upload, so `to_cols_array` is a plain flatten
//! with no transposition.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use super::vector::{Vec2, Vec3, Vec4};
use std::ops::Mul;

// --- Mat2 ---

/// A 2x2 column-major matrix with `f32` components.
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    bytemuck::Pod,
    bytemuck::Zeroable,
    Serialize,
    Deserialize,
    Encode,
    Decode,
)]
#[repr(C)]
pub struct Mat2 {
    /// The columns of the matrix.
    pub cols: [Vec2; 2],
}

impl Mat2 {
    /// The identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [Vec2 { x: 1.0, y: 0.0 }, Vec2 { x: 0.0, y: 1.0 }],
    };

    /// Creates a matrix from two column vectors.
    #[inline]
    pub const fn from_cols(c0: Vec2, c1: Vec2) -> Self {
        Self { cols: [c0, c1] }
    }

    /// Returns the components as a flat column-major `[f32; 4]` array.
    #[inline]
    pub const fn to_cols_array(&self) -> [f32; 4] {
        [self.cols[0].x, self.cols[0].y, self.cols[1].x, self.cols[1].y]
    }
}

impl Default for Mat2 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

// --- Mat3 ---

/// A 3x3 column-major matrix with `f32` components.
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    bytemuck::Pod,
    bytemuck::Zeroable,
    Serialize,
    Deserialize,
    Encode,
    Decode,
)]
#[repr(C)]
pub struct Mat3 {
    /// The columns of the matrix.
    pub cols: [Vec3; 3],
}

impl Mat3 {
    /// The identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [
            Vec3 {
                x: 1.0,
                y: 0.0,
                z: 0.0,
            },
            Vec3 {
                x: 0.0,
                y: 1.0,
                z: 0.0,
            },
            Vec3 {
                x: 0.0,
                y: 0.0,
                z: 1.0,
            },
        ],
    };

    /// Creates a matrix from three column vectors.
    #[inline]
    pub const fn from_cols(c0: Vec3, c1: Vec3, c2: Vec3) -> Self {
        Self { cols: [c0, c1, c2] }
    }

    /// Extracts the upper-left 3x3 block of a [`Mat4`].
    #[inline]
    pub fn from_mat4(m: &Mat4) -> Self {
        Self::from_cols(
            m.cols[0].truncate(),
            m.cols[1].truncate(),
            m.cols[2].truncate(),
        )
    }

    /// Returns the transpose of this matrix.
    pub fn transpose(&self) -> Self {
        Self::from_cols(
            Vec3::new(self.cols[0].x, self.cols[1].x, self.cols[2].x),
            Vec3::new(self.cols[0].y, self.cols[1].y, self.cols[2].y),
            Vec3::new(self.cols[0].z, self.cols[1].z, self.cols[2].z),
        )
    }

    /// Returns the components as a flat column-major `[f32; 9]` array.
    pub fn to_cols_array(&self) -> [f32; 9] {
        let mut out = [0.0; 9];
        for (i, col) in self.cols.iter().enumerate() {
            out[i * 3] = col.x;
            out[i * 3 + 1] = col.y;
            out[i * 3 + 2] = col.z;
        }
        out
    }
}

impl Default for Mat3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Mat3 {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        let rows = self.transpose();
        let col = |c: Vec3| Vec3::new(rows.cols[0].dot(c), rows.cols[1].dot(c), rows.cols[2].dot(c));
        Self::from_cols(col(rhs.cols[0]), col(rhs.cols[1]), col(rhs.cols[2]))
    }
}

impl Mul<Vec3> for Mat3 {
    type Output = Vec3;
    fn mul(self, v: Vec3) -> Vec3 {
        self.cols[0] * v.x + self.cols[1] * v.y + self.cols[2] * v.z
    }
}

// --- Mat4 ---

/// A 4x4 column-major matrix with `f32` components.
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    bytemuck::Pod,
    bytemuck::Zeroable,
    Serialize,
    Deserialize,
    Encode,
    Decode,
)]
#[repr(C)]
pub struct Mat4 {
    /// The columns of the matrix.
    pub cols: [Vec4; 4],
}

impl Mat4 {
    /// The identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [
            Vec4 {
                x: 1.0,
                y: 0.0,
                z: 0.0,
                w: 0.0,
            },
            Vec4 {
                x: 0.0,
                y: 1.0,
                z: 0.0,
                w: 0.0,
            },
            Vec4 {
                x: 0.0,
                y: 0.0,
                z: 1.0,
                w: 0.0,
            },
            Vec4 {
                x: 0.0,
                y: 0.0,
                z: 0.0,
                w: 1.0,
            },
        ],
    };

    /// Creates a matrix from four column vectors.
    #[inline]
    pub const fn from_cols(c0: Vec4, c1: Vec4, c2: Vec4, c3: Vec4) -> Self {
        Self {
            cols: [c0, c1, c2, c3],
        }
    }

    /// Creates a translation matrix.
    pub fn from_translation(v: Vec3) -> Self {
        let mut m = Self::IDENTITY;
        m.cols[3] = Vec4::new(v.x, v.y, v.z, 1.0);
        m
    }

    /// Creates a non-uniform scale matrix.
    pub fn from_scale(scale: Vec3) -> Self {
        let mut m = Self::IDENTITY;
        m.cols[0].x = scale.x;
        m.cols[1].y = scale.y;
        m.cols[2].z = scale.z;
        m
    }

    /// Creates a rotation matrix around the X-axis.
    pub fn from_rotation_x(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Self::IDENTITY;
        m.cols[1] = Vec4::new(0.0, c, s, 0.0);
        m.cols[2] = Vec4::new(0.0, -s, c, 0.0);
        m
    }

    /// Creates a rotation matrix around the Y-axis.
    pub fn from_rotation_y(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Self::IDENTITY;
        m.cols[0] = Vec4::new(c, 0.0, -s, 0.0);
        m.cols[2] = Vec4::new(s, 0.0, c, 0.0);
        m
    }

    /// Creates a rotation matrix around the Z-axis.
    pub fn from_rotation_z(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Self::IDENTITY;
        m.cols[0] = Vec4::new(c, s, 0.0, 0.0);
        m.cols[1] = Vec4::new(-s, c, 0.0, 0.0);
        m
    }

    /// Creates a rotation matrix around an arbitrary axis.
    ///
    /// The axis is normalized internally; a near-zero axis yields the
    /// identity matrix.
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let axis = axis.normalize();
        if axis == Vec3::ZERO {
            return Self::IDENTITY;
        }
        let (s, c) = angle.sin_cos();
        let t = 1.0 - c;
        let (x, y, z) = (axis.x, axis.y, axis.z);
        Self::from_cols(
            Vec4::new(t * x * x + c, t * x * y + s * z, t * x * z - s * y, 0.0),
            Vec4::new(t * x * y - s * z, t * y * y + c, t * y * z + s * x, 0.0),
            Vec4::new(t * x * z + s * y, t * y * z - s * x, t * z * z + c, 0.0),
            Vec4::new(0.0, 0.0, 0.0, 1.0),
        )
    }

    /// Creates a right-handed perspective projection matrix.
    ///
    /// `fov_y` is the vertical field of view in radians; `near` and `far`
    /// are the positive clip-plane distances.
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        let f = 1.0 / (fov_y * 0.5).tan();
        let range = 1.0 / (near - far);
        Self::from_cols(
            Vec4::new(f / aspect, 0.0, 0.0, 0.0),
            Vec4::new(0.0, f, 0.0, 0.0),
            Vec4::new(0.0, 0.0, (near + far) * range, -1.0),
            Vec4::new(0.0, 0.0, 2.0 * near * far * range, 0.0),
        )
    }

    /// Creates a right-handed orthographic projection matrix.
    pub fn orthographic(
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let rw = 1.0 / (right - left);
        let rh = 1.0 / (top - bottom);
        let rd = 1.0 / (far - near);
        Self::from_cols(
            Vec4::new(2.0 * rw, 0.0, 0.0, 0.0),
            Vec4::new(0.0, 2.0 * rh, 0.0, 0.0),
            Vec4::new(0.0, 0.0, -2.0 * rd, 0.0),
            Vec4::new(
                -(right + left) * rw,
                -(top + bottom) * rh,
                -(far + near) * rd,
                1.0,
            ),
        )
    }

    /// Returns a row of the matrix as a [`Vec4`].
    ///
    /// # Panics
    /// Panics if `index` is not in `0..4`.
    pub fn row(&self, index: usize) -> Vec4 {
        Vec4::new(
            self.cols[0][index],
            self.cols[1][index],
            self.cols[2][index],
            self.cols[3][index],
        )
    }

    /// Returns the transpose of this matrix.
    pub fn transpose(&self) -> Self {
        Self::from_cols(self.row(0), self.row(1), self.row(2), self.row(3))
    }

    /// Returns the components as a flat column-major `[f32; 16]` array.
    pub fn to_cols_array(&self) -> [f32; 16] {
        let mut out = [0.0; 16];
        for (i, col) in self.cols.iter().enumerate() {
            out[i * 4..i * 4 + 4].copy_from_slice(&col.to_array());
        }
        out
    }

    /// Transforms a point, treating it as having `w = 1.0` and dropping the
    /// resulting `w` component without a perspective divide.
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        (*self * p.extend(1.0)).truncate()
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Mat4 {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        let col = |c: Vec4| {
            self.cols[0] * c.x + self.cols[1] * c.y + self.cols[2] * c.z + self.cols[3] * c.w
        };
        Self::from_cols(
            col(rhs.cols[0]),
            col(rhs.cols[1]),
            col(rhs.cols[2]),
            col(rhs.cols[3]),
        )
    }
}

impl Mul<Vec4> for Mat4 {
    type Output = Vec4;
    fn mul(self, v: Vec4) -> Vec4 {
        self.cols[0] * v.x + self.cols[1] * v.y + self.cols[2] * v.z + self.cols[3] * v.w
    }
}
