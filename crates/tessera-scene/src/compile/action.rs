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

//! The compiled replay stream.

use crate::compile::batch::DrawBatch;
use crate::error::SceneError;
use crate::model::Model;
use crate::render::gpu_object::GpuObject;
use crate::render::lighting::{LightTable, SceneLight};
use std::cell::RefCell;
use std::rc::Rc;
use tessera_core::gpu::{BlendFactor, Capability, GpuDevice, ScissorRect, TextureLike};
use tessera_core::math::{LinearRgba, Mat4, Vec3};

/// One compiled step of a model's replay stream.
///
/// This is what survives compilation: raw authoring commands are gone,
/// merged geometry sits in [`DrawBatch`]es, and everything else is a state
/// change or recursion point the renderer interprets per frame.
#[derive(Debug)]
pub enum Action {
    /// Draws one merged geometry batch.
    Draw(DrawBatch),
    /// Draws a pre-built drawable.
    Object(GpuObject),
    /// Multiplies a translation onto the model-view matrix.
    Translate(Vec3),
    /// Multiplies an axis-angle rotation onto the model-view matrix.
    Rotate {
        /// Rotation axis.
        axis: Vec3,
        /// Angle in radians.
        angle: f32,
    },
    /// Multiplies a scale onto the model-view matrix.
    Scale(Vec3),
    /// Replaces the model-view matrix.
    View(Mat4),
    /// Sets the global color mask.
    Mask(LinearRgba),
    /// Binds a texture through the sampler uniform.
    Texture(Rc<dyn TextureLike>),
    /// Enables a fixed-function capability.
    Enable(Capability),
    /// Disables a fixed-function capability.
    Disable(Capability),
    /// Toggles depth writes.
    DepthMask(bool),
    /// Sets the blend function pair.
    BlendFunc(BlendFactor, BlendFactor),
    /// Sets the rasterized line width.
    LineWidth(f32),
    /// Contributes ambient light, gathered in the pre-pass.
    Ambient(LinearRgba),
    /// Contributes a scene light, gathered in the pre-pass.
    Light(SceneLight),
    /// Clears the color and/or depth targets immediately.
    Clear {
        /// Clear color, or `None` to leave the color target.
        color: Option<LinearRgba>,
        /// Whether to clear the depth buffer.
        depth: bool,
    },
    /// Sets or removes the scissor rectangle.
    Clip(Option<ScissorRect>),
    /// Replays an owned sub-model under a branched state node.
    Sub(Model),
    /// Replays a shared, separately compiled model.
    Fragment(Rc<RefCell<Model>>),
}

impl Action {
    /// Uploads any geometry this action owns, recursing into sub-models.
    /// Fragments are skipped: they are finished independently.
    pub fn post_upload(&mut self, device: &dyn GpuDevice) -> Result<(), SceneError> {
        match self {
            Action::Draw(batch) => batch.post_upload(device),
            Action::Object(object) => object.upload(device),
            Action::Sub(model) => model.post_upload(device),
            _ => Ok(()),
        }
    }

    /// Releases GPU resources this action owns. With `deep`, shared
    /// fragments are disposed too; drawables tolerate the double dispose a
    /// shared fragment can see.
    pub fn dispose(&mut self, device: &dyn GpuDevice, deep: bool) -> Result<(), SceneError> {
        match self {
            Action::Draw(batch) => batch.dispose(device),
            Action::Object(object) => object.dispose(device),
            Action::Sub(model) => model.dispose_with(device, deep),
            Action::Fragment(model) if deep => model.borrow_mut().dispose_with(device, deep),
            _ => Ok(()),
        }
    }

    /// Adds this action's light contribution, recursing into sub-models and
    /// fragments.
    pub fn collect_lights(&self, table: &mut LightTable) {
        match self {
            Action::Ambient(color) => table.add_ambient(*color),
            Action::Light(light) => table.add(*light),
            Action::Sub(model) => model.collect_lights(table),
            Action::Fragment(model) => model.borrow().collect_lights(table),
            _ => {}
        }
    }
}
