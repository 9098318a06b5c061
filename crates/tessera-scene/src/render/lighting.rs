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

//! Scene-light accumulation and packing.

use crate::render::matrix::RenderMatrix;
use crate::render::{AMBIENT, LIGHTS, LIGHT_COUNT};
use log::warn;
use std::rc::Rc;
use tessera_core::math::{LinearRgba, Vec3};

/// The ceiling on packed lights per frame; extras are dropped with a log.
pub const MAX_LIGHTS: usize = 32;

/// Floats per packed light: four vec4 rows.
pub const FLOATS_PER_LIGHT: usize = 16;

const KIND_DIRECTIONAL: f32 = 1.0;
const KIND_POINT: f32 = 2.0;
const KIND_SPOT: f32 = 3.0;

/// One positional or directional light gathered during the lighting
/// pre-pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SceneLight {
    /// Light from one direction with no falloff.
    Directional {
        /// Direction the light travels, not necessarily normalized.
        direction: Vec3,
        /// Light color.
        color: LinearRgba,
        /// Scalar intensity multiplier.
        intensity: f32,
    },
    /// Light radiating from a point with distance falloff.
    Point {
        /// World-space position.
        position: Vec3,
        /// Light color.
        color: LinearRgba,
        /// Scalar intensity multiplier.
        intensity: f32,
        /// Falloff range.
        range: f32,
    },
    /// A point light restricted to a cone.
    Spot {
        /// World-space position.
        position: Vec3,
        /// Cone axis.
        direction: Vec3,
        /// Light color.
        color: LinearRgba,
        /// Scalar intensity multiplier.
        intensity: f32,
        /// Falloff range.
        range: f32,
        /// Cosine of the cone half-angle.
        cutoff: f32,
    },
}

/// Accumulates the lights of one frame and packs them into the shader's
/// flat `float[]` layout.
///
/// Each light occupies four vec4 rows: `[kind, intensity, range, cutoff]`,
/// `[r, g, b, 0]`, `[x, y, z, 0]`, `[dx, dy, dz, 0]`. Ambient contributions
/// are summed separately and never consume a table slot.
#[derive(Debug, Default)]
pub struct LightTable {
    lights: Vec<SceneLight>,
    ambient: LinearRgba,
    dropped: usize,
}

impl LightTable {
    /// Creates an empty table with black ambient.
    pub fn new() -> Self {
        Self {
            lights: Vec::new(),
            ambient: LinearRgba::new(0.0, 0.0, 0.0, 1.0),
            dropped: 0,
        }
    }

    /// Adds an ambient contribution. Channels are summed.
    pub fn add_ambient(&mut self, color: LinearRgba) {
        self.ambient.r += color.r;
        self.ambient.g += color.g;
        self.ambient.b += color.b;
    }

    /// Adds one light, dropping it past [`MAX_LIGHTS`].
    pub fn add(&mut self, light: SceneLight) {
        if self.lights.len() >= MAX_LIGHTS {
            self.dropped += 1;
            return;
        }
        self.lights.push(light);
    }

    /// The number of packed lights.
    pub fn len(&self) -> usize {
        self.lights.len()
    }

    /// Whether no light was gathered.
    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    /// The accumulated ambient color.
    pub fn ambient(&self) -> LinearRgba {
        self.ambient
    }

    /// Packs the table into its flat layout.
    pub fn pack(&self) -> Vec<f32> {
        let mut out = vec![0.0; self.lights.len() * FLOATS_PER_LIGHT];
        for (slot, light) in self.lights.iter().enumerate() {
            let row = &mut out[slot * FLOATS_PER_LIGHT..(slot + 1) * FLOATS_PER_LIGHT];
            let (kind, intensity, range, cutoff, color, position, direction) = match *light {
                SceneLight::Directional {
                    direction,
                    color,
                    intensity,
                } => (
                    KIND_DIRECTIONAL,
                    intensity,
                    0.0,
                    0.0,
                    color,
                    Vec3::ZERO,
                    direction,
                ),
                SceneLight::Point {
                    position,
                    color,
                    intensity,
                    range,
                } => (KIND_POINT, intensity, range, 0.0, color, position, Vec3::ZERO),
                SceneLight::Spot {
                    position,
                    direction,
                    color,
                    intensity,
                    range,
                    cutoff,
                } => (KIND_SPOT, intensity, range, cutoff, color, position, direction),
            };
            row[0] = kind;
            row[1] = intensity;
            row[2] = range;
            row[3] = cutoff;
            row[4] = color.r;
            row[5] = color.g;
            row[6] = color.b;
            row[8] = position.x;
            row[9] = position.y;
            row[10] = position.z;
            row[12] = direction.x;
            row[13] = direction.y;
            row[14] = direction.z;
        }
        out
    }

    /// Writes the packed table, light count, and ambient color into a
    /// render-state node. Done once per frame before replay starts.
    pub fn seed(&self, matrix: &mut RenderMatrix) {
        if self.dropped > 0 {
            warn!(
                "{} light(s) past the {MAX_LIGHTS}-light ceiling were dropped",
                self.dropped
            );
        }
        let packed: Rc<[f32]> = self.pack().into();
        matrix.set(LIGHTS, packed);
        matrix.set(LIGHT_COUNT, self.lights.len() as i32);
        matrix.set(AMBIENT, self.ambient);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambient_channels_accumulate() {
        let mut table = LightTable::new();
        table.add_ambient(LinearRgba::new(0.1, 0.2, 0.3, 1.0));
        table.add_ambient(LinearRgba::new(0.1, 0.1, 0.1, 1.0));
        let ambient = table.ambient();
        assert!((ambient.r - 0.2).abs() < 1e-6);
        assert!((ambient.g - 0.3).abs() < 1e-6);
        assert!((ambient.b - 0.4).abs() < 1e-6);
    }

    #[test]
    fn pack_lays_out_four_rows_per_light() {
        let mut table = LightTable::new();
        table.add(SceneLight::Point {
            position: Vec3::new(1.0, 2.0, 3.0),
            color: LinearRgba::new(0.5, 0.6, 0.7, 1.0),
            intensity: 2.0,
            range: 10.0,
        });
        let packed = table.pack();
        assert_eq!(packed.len(), FLOATS_PER_LIGHT);
        assert_eq!(packed[0], KIND_POINT);
        assert_eq!(packed[1], 2.0);
        assert_eq!(packed[2], 10.0);
        assert_eq!(&packed[4..7], &[0.5, 0.6, 0.7]);
        assert_eq!(&packed[8..11], &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn lights_past_the_ceiling_are_dropped() {
        let mut table = LightTable::new();
        for i in 0..(MAX_LIGHTS + 3) {
            table.add(SceneLight::Directional {
                direction: Vec3::new(0.0, -1.0, 0.0),
                color: LinearRgba::WHITE,
                intensity: i as f32,
            });
        }
        assert_eq!(table.len(), MAX_LIGHTS);
    }
}
