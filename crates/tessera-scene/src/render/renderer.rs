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

//! Per-frame replay of a compiled model.

use crate::compile::Action;
use crate::error::SceneError;
use crate::model::Model;
use crate::render::lighting::LightTable;
use crate::render::matrix::{ChangeLedger, RenderMatrix};
use crate::render::program::{Program, TextureUnitAllocator};
use crate::render::{COLOR_MASK, MV_MATRIX, P_MATRIX, SAMPLER};
use log::trace;
use std::cell::RefCell;
use std::rc::Rc;
use tessera_core::gpu::{GpuDevice, ProgramDescriptor, ProgramId};
use tessera_core::math::{LinearRgba, Mat4};

/// Replays a finished [`Model`] against one shader program, frame after
/// frame.
///
/// The renderer owns the program's introspected contract and the change
/// ledger. The ledger outlives each frame, so a uniform whose value did
/// not change since its last upload is not re-sent, even across frames.
#[derive(Debug)]
pub struct ModelRenderer {
    program: Program,
    units: TextureUnitAllocator,
    ledger: Rc<RefCell<ChangeLedger>>,
    projection: Mat4,
    projection_dirty: bool,
    frame: u64,
}

impl ModelRenderer {
    /// Introspects the program and prepares a renderer around it.
    pub fn new(device: &dyn GpuDevice, program: ProgramId) -> Self {
        let limits = device.limits();
        Self {
            program: Program::new(device, program),
            units: TextureUnitAllocator::new(limits.max_texture_units),
            ledger: Rc::new(RefCell::new(ChangeLedger::default())),
            projection: Mat4::IDENTITY,
            projection_dirty: true,
            frame: 0,
        }
    }

    /// Compiles and links a program from source, then prepares a renderer
    /// around it.
    ///
    /// ## Errors
    /// * `SceneError::Shader` - carrying the compiler's structured
    ///   diagnostics when a stage fails to compile or link.
    pub fn from_source(
        device: &dyn GpuDevice,
        descriptor: &ProgramDescriptor<'_>,
    ) -> Result<Self, SceneError> {
        let program = device.create_program(descriptor)?;
        Ok(Self::new(device, program))
    }

    /// The program this renderer replays through.
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// The program handle, for rebinding after a nested pass.
    pub fn program_id(&self) -> ProgramId {
        self.program.id()
    }

    /// Sets the projection matrix uploaded on the next frame.
    pub fn set_projection(&mut self, projection: Mat4) {
        self.projection = projection;
        self.projection_dirty = true;
    }

    /// Replays one frame of a finished model.
    ///
    /// The pass seeds the root state node (identity model-view, white
    /// mask, the current projection), gathers the model's lights, then
    /// interprets the action list top to bottom.
    ///
    /// ## Errors
    /// * `SceneError::NotCompiled` - if the model was never finished.
    /// * `SceneError::Resource` - if an upload hits a device limit.
    pub fn render(&mut self, model: &Model, device: &dyn GpuDevice) -> Result<(), SceneError> {
        let mut matrix = RenderMatrix::root_with_ledger(Rc::clone(&self.ledger));
        matrix.set(MV_MATRIX, Mat4::IDENTITY);
        matrix.set(COLOR_MASK, LinearRgba::WHITE);
        self.render_with(model, &mut matrix, device)
    }

    /// Replays one frame of a finished model under an existing state node.
    ///
    /// Used by a dedicated-renderer sub-pass: the node is a deep copy of
    /// the caller's branch, so the inherited model-view and mask survive
    /// the program switch while the detached ledger forces every value to
    /// re-upload under this renderer's program.
    pub fn render_with(
        &mut self,
        model: &Model,
        matrix: &mut RenderMatrix,
        device: &dyn GpuDevice,
    ) -> Result<(), SceneError> {
        let actions = model.actions()?;
        device.use_program(self.program.id());

        if self.projection_dirty {
            matrix.set(P_MATRIX, self.projection);
            self.projection_dirty = false;
        } else {
            matrix.seed(P_MATRIX, self.projection);
        }

        let mut lights = LightTable::new();
        model.collect_lights(&mut lights);
        if !lights.is_empty() || lights.ambient() != LinearRgba::new(0.0, 0.0, 0.0, 1.0) {
            lights.seed(matrix);
        }

        self.frame += 1;
        trace!("frame {}: replaying {} action(s)", self.frame, actions.len());
        self.replay(actions, matrix, device)
    }

    /// Interprets one action list under the given state node. Sub-models
    /// recurse with a branched node; their writes never leak back into
    /// `matrix`'s value snapshot.
    pub(crate) fn replay(
        &mut self,
        actions: &[Action],
        matrix: &mut RenderMatrix,
        device: &dyn GpuDevice,
    ) -> Result<(), SceneError> {
        for action in actions {
            match action {
                Action::Draw(batch) => {
                    matrix.unify(&self.program, &mut self.units, device)?;
                    batch.render(device, &self.program)?;
                }
                Action::Object(object) => {
                    matrix.unify(&self.program, &mut self.units, device)?;
                    object.render(device, &self.program)?;
                }
                Action::Translate(v) => {
                    compose_mv(matrix, Mat4::from_translation(*v));
                }
                Action::Rotate { axis, angle } => {
                    compose_mv(matrix, Mat4::from_axis_angle(*axis, *angle));
                }
                Action::Scale(v) => {
                    compose_mv(matrix, Mat4::from_scale(*v));
                }
                Action::View(view) => matrix.set(MV_MATRIX, *view),
                Action::Mask(color) => matrix.set(COLOR_MASK, *color),
                Action::Texture(texture) => matrix.set(SAMPLER, Rc::clone(texture)),
                Action::Enable(capability) => matrix.set_capability(*capability, true),
                Action::Disable(capability) => matrix.set_capability(*capability, false),
                Action::DepthMask(enabled) => matrix.set_depth_mask(*enabled),
                Action::BlendFunc(src, dst) => matrix.set_blend_func(*src, *dst),
                Action::LineWidth(width) => matrix.set_line_width(*width),
                Action::Clip(rect) => matrix.set_scissor(*rect),
                Action::Clear { color, depth } => device.clear(*color, *depth),
                // Lights were gathered before replay started.
                Action::Ambient(_) | Action::Light(_) => {}
                Action::Sub(model) => model.apply(matrix, self, device)?,
                Action::Fragment(model) => model.borrow().apply(matrix, self, device)?,
            }
        }
        Ok(())
    }
}

/// Multiplies a transform onto the model-view matrix, installing it over
/// an absent one.
fn compose_mv(matrix: &mut RenderMatrix, transform: Mat4) {
    if !matrix.mutate_mat4(MV_MATRIX, |mv| *mv = *mv * transform) {
        matrix.set(MV_MATRIX, transform);
    }
}
