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

//! The authoring command stream consumed by the scene compiler.

use crate::model::Model;
use crate::render::lighting::SceneLight;
use crate::render::GpuObject;
use std::cell::RefCell;
use std::rc::Rc;
use tessera_core::gpu::{BlendFactor, Capability, ScissorRect, ShapeType, TextureLike};
use tessera_core::math::{LinearRgba, Mat4, Vec2, Vec3};

/// One step of a model's authoring stream.
///
/// Commands are interpreted immediately by the compiler; they are not
/// retained. Shape-data commands feed the open shape, everything else
/// either mutates compiler context or emits a replay action.
#[derive(Debug)]
pub enum Command {
    /// Opens a shape of the given type.
    Start(ShapeType),
    /// Closes the open shape, deriving its indices from the shape type.
    End,
    /// Closes the open shape with explicit local indices.
    EndIndexed(Vec<u32>),
    /// Appends flat `x, y, z` position data to the open shape.
    Vertices(Vec<f32>),
    /// Appends flat `x, y, z` normal data to the open shape.
    Normals(Vec<f32>),
    /// Appends flat `u, v` texture coordinates to the open shape.
    TexCoords(Vec<f32>),
    /// Sets the context color applied to vertices at shape close.
    Color(LinearRgba),
    /// Emits a color-mask change.
    Mask(LinearRgba),
    /// Emits a texture bind and switches the context to textured drawing.
    Texture(Rc<dyn TextureLike>),
    /// Scales the default texture coordinates generated for quads.
    TextureScale(Vec2),
    /// Emits a model-view translation.
    Translate(Vec3),
    /// Emits a model-view rotation about an axis.
    Rotate {
        /// Rotation axis, not necessarily normalized.
        axis: Vec3,
        /// Angle in radians.
        angle: f32,
    },
    /// Emits a model-view scale.
    Scale(Vec3),
    /// Emits a capability enable.
    Enable(Capability),
    /// Emits a capability disable.
    Disable(Capability),
    /// Emits a depth-write toggle.
    DepthMask(bool),
    /// Emits a blend-function change.
    BlendFunc(BlendFactor, BlendFactor),
    /// Emits a line-width change.
    LineWidth(f32),
    /// Toggles normal generation and the lit flag for following shapes.
    Lighting(bool),
    /// Contributes ambient light to the frame.
    AmbientLight(LinearRgba),
    /// Contributes a directional, point, or spot light to the frame.
    Light(SceneLight),
    /// Replaces the model-view matrix, typically with a camera transform.
    View(Mat4),
    /// Emits an immediate clear of the color and/or depth targets.
    Clear {
        /// Clear color, or `None` to leave the color target.
        color: Option<LinearRgba>,
        /// Whether to clear the depth buffer.
        depth: bool,
    },
    /// Sets or removes the scissor rectangle.
    Clip(Option<ScissorRect>),
    /// Emits a pre-built drawable.
    Object(GpuObject),
    /// Emits an owned sub-model sealed by a scope pop.
    Sub(Model),
    /// Emits a shared, separately compiled model.
    Fragment(Rc<RefCell<Model>>),
}
