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

//! The single-pass scene compiler.

use crate::compile::action::Action;
use crate::compile::batch::DrawBatch;
use crate::compile::command::Command;
use crate::compile::shape::{ClosedShape, ShapeBuilder, ShapeContext};
use crate::error::SceneError;
use log::debug;
use tessera_core::gpu::DrawMode;

/// Interprets one authoring scope's command stream into an action list.
///
/// The compiler is a state machine: idle between shapes, accumulating
/// while one is open. Closed shapes merge into the pending batch until a
/// state change, an incompatible shape, or the index ceiling forces a
/// flush; the pending batch always flushes before any action that could
/// change what the batched geometry would have rendered with.
#[derive(Debug, Default)]
pub struct Initializer {
    ctx: ShapeContext,
    shape: Option<ShapeBuilder>,
    batch: Option<DrawBatch>,
    actions: Vec<Action>,
}

impl Initializer {
    /// Creates an idle compiler with default context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an idle compiler inheriting an enclosing scope's context.
    pub fn with_context(ctx: ShapeContext) -> Self {
        Self {
            ctx,
            ..Self::default()
        }
    }

    /// The current attribute context.
    pub fn context(&self) -> &ShapeContext {
        &self.ctx
    }

    /// Interprets one command.
    ///
    /// ## Errors
    /// * `SceneError` - on any authoring-sequence violation; the compiler
    ///   is left unchanged and unusable guarantees are not given past the
    ///   first error.
    pub fn push(&mut self, command: Command) -> Result<(), SceneError> {
        match command {
            Command::Start(shape_type) => {
                if self.shape.is_some() {
                    return Err(SceneError::ShapeAlreadyOpen);
                }
                self.shape = Some(ShapeBuilder::new(shape_type));
            }
            Command::Vertices(data) => self.open_shape()?.push_vertices(&data)?,
            Command::Normals(data) => self.open_shape()?.push_normals(&data)?,
            Command::TexCoords(data) => self.open_shape()?.push_uvs(&data)?,
            Command::End => {
                let shape = self.shape.take().ok_or(SceneError::NoOpenShape)?;
                let closed = shape.close(&self.ctx)?;
                self.merge(closed);
            }
            Command::EndIndexed(indices) => {
                let shape = self.shape.take().ok_or(SceneError::NoOpenShape)?;
                let closed = shape.close_indexed(&self.ctx, indices)?;
                self.merge(closed);
            }
            Command::Color(color) => {
                self.guard_idle("color")?;
                self.flush();
                self.ctx.color_bytes = color.to_u8_array();
            }
            Command::Mask(color) => {
                self.guard_idle("color mask")?;
                self.flush();
                self.actions.push(Action::Mask(color));
            }
            Command::Texture(texture) => {
                self.guard_idle("texture")?;
                self.flush();
                self.ctx.draw_mode = DrawMode::Texture;
                self.actions.push(Action::Texture(texture));
            }
            Command::TextureScale(scale) => {
                self.guard_idle("texture scale")?;
                self.ctx.texture_scale = scale;
            }
            Command::Lighting(enabled) => {
                self.guard_idle("lighting")?;
                self.flush();
                self.ctx.lighting = enabled;
            }
            Command::Translate(v) => self.state_action("transform", Action::Translate(v))?,
            Command::Rotate { axis, angle } => {
                self.state_action("transform", Action::Rotate { axis, angle })?
            }
            Command::Scale(v) => self.state_action("transform", Action::Scale(v))?,
            Command::View(m) => self.state_action("view", Action::View(m))?,
            Command::Enable(cap) => self.state_action("capability", Action::Enable(cap))?,
            Command::Disable(cap) => self.state_action("capability", Action::Disable(cap))?,
            Command::DepthMask(on) => self.state_action("depth mask", Action::DepthMask(on))?,
            Command::BlendFunc(src, dst) => {
                self.state_action("blend function", Action::BlendFunc(src, dst))?
            }
            Command::LineWidth(width) => {
                self.state_action("line width", Action::LineWidth(width))?
            }
            Command::Clear { color, depth } => {
                self.state_action("clear", Action::Clear { color, depth })?
            }
            Command::Clip(rect) => self.state_action("scissor", Action::Clip(rect))?,
            // Lights are gathered in a pre-pass, so they neither split the
            // pending batch nor depend on stream position.
            Command::AmbientLight(color) => {
                self.guard_idle("lighting")?;
                self.actions.push(Action::Ambient(color));
            }
            Command::Light(light) => {
                self.guard_idle("lighting")?;
                self.actions.push(Action::Light(light));
            }
            Command::Object(object) => self.state_action("drawable", Action::Object(object))?,
            Command::Sub(model) => self.state_action("sub-model", Action::Sub(model))?,
            Command::Fragment(model) => {
                self.state_action("fragment", Action::Fragment(model))?
            }
        }
        Ok(())
    }

    /// Closes the scope: flushes the pending batch and yields the action
    /// list. Fails if a shape is still open.
    pub fn seal(&mut self) -> Result<Vec<Action>, SceneError> {
        if self.shape.is_some() {
            return Err(SceneError::UnfinishedShape);
        }
        self.flush();
        debug!("scope sealed into {} action(s)", self.actions.len());
        Ok(std::mem::take(&mut self.actions))
    }

    fn open_shape(&mut self) -> Result<&mut ShapeBuilder, SceneError> {
        self.shape.as_mut().ok_or(SceneError::NoOpenShape)
    }

    fn guard_idle(&self, what: &'static str) -> Result<(), SceneError> {
        if self.shape.is_some() {
            return Err(SceneError::MutationWhileShapeOpen(what));
        }
        Ok(())
    }

    fn state_action(&mut self, what: &'static str, action: Action) -> Result<(), SceneError> {
        self.guard_idle(what)?;
        self.flush();
        self.actions.push(action);
        Ok(())
    }

    /// Merges a closed shape into the pending batch, splitting on
    /// incompatibility or on the index ceiling.
    fn merge(&mut self, shape: ClosedShape) {
        let reusable = self
            .batch
            .as_ref()
            .is_some_and(|batch| batch.can_merge(&shape) && !batch.would_overflow(&shape));
        if !reusable {
            self.flush();
            self.batch = Some(DrawBatch::for_shape(&shape));
        }
        self.batch
            .as_mut()
            .expect("a pending batch exists here")
            .absorb(shape);
    }

    fn flush(&mut self) {
        if let Some(batch) = self.batch.take() {
            if batch.vertex_count() > 0 {
                self.actions.push(Action::Draw(batch));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::gpu::ShapeType;
    use tessera_core::math::{LinearRgba, Vec3};

    fn triangle_commands() -> Vec<Command> {
        vec![
            Command::Start(ShapeType::Triangle),
            Command::Vertices(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]),
            Command::End,
        ]
    }

    fn draw_count(actions: &[Action]) -> usize {
        actions
            .iter()
            .filter(|a| matches!(a, Action::Draw(_)))
            .count()
    }

    #[test]
    fn compatible_shapes_share_one_batch() {
        let mut compiler = Initializer::new();
        for _ in 0..3 {
            for command in triangle_commands() {
                compiler.push(command).unwrap();
            }
        }
        let actions = compiler.seal().unwrap();
        assert_eq!(draw_count(&actions), 1);
        match &actions[0] {
            Action::Draw(batch) => assert_eq!(batch.vertex_count(), 9),
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn color_change_splits_the_batch() {
        let mut compiler = Initializer::new();
        for command in triangle_commands() {
            compiler.push(command).unwrap();
        }
        compiler.push(Command::Color(LinearRgba::RED)).unwrap();
        for command in triangle_commands() {
            compiler.push(command).unwrap();
        }
        let actions = compiler.seal().unwrap();
        assert_eq!(draw_count(&actions), 2);
    }

    #[test]
    fn transform_splits_and_interleaves() {
        let mut compiler = Initializer::new();
        for command in triangle_commands() {
            compiler.push(command).unwrap();
        }
        compiler
            .push(Command::Translate(Vec3::new(1.0, 0.0, 0.0)))
            .unwrap();
        for command in triangle_commands() {
            compiler.push(command).unwrap();
        }
        let actions = compiler.seal().unwrap();
        assert!(matches!(actions[0], Action::Draw(_)));
        assert!(matches!(actions[1], Action::Translate(_)));
        assert!(matches!(actions[2], Action::Draw(_)));
    }

    #[test]
    fn lights_do_not_split_the_batch() {
        let mut compiler = Initializer::new();
        for command in triangle_commands() {
            compiler.push(command).unwrap();
        }
        compiler
            .push(Command::AmbientLight(LinearRgba::WHITE))
            .unwrap();
        for command in triangle_commands() {
            compiler.push(command).unwrap();
        }
        let actions = compiler.seal().unwrap();
        assert_eq!(draw_count(&actions), 1);
    }

    #[test]
    fn double_start_is_fatal() {
        let mut compiler = Initializer::new();
        compiler.push(Command::Start(ShapeType::Triangle)).unwrap();
        assert!(matches!(
            compiler.push(Command::Start(ShapeType::Quad)),
            Err(SceneError::ShapeAlreadyOpen)
        ));
    }

    #[test]
    fn end_without_start_is_fatal() {
        let mut compiler = Initializer::new();
        assert!(matches!(
            compiler.push(Command::End),
            Err(SceneError::NoOpenShape)
        ));
    }

    #[test]
    fn color_change_inside_a_shape_is_fatal() {
        let mut compiler = Initializer::new();
        compiler.push(Command::Start(ShapeType::Triangle)).unwrap();
        assert!(matches!(
            compiler.push(Command::Color(LinearRgba::RED)),
            Err(SceneError::MutationWhileShapeOpen("color"))
        ));
    }

    #[test]
    fn seal_with_open_shape_is_fatal() {
        let mut compiler = Initializer::new();
        compiler.push(Command::Start(ShapeType::Triangle)).unwrap();
        assert!(matches!(compiler.seal(), Err(SceneError::UnfinishedShape)));
    }
}
