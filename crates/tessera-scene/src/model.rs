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

//! The retained scene model and its authoring surface.

use crate::compile::{Action, Command, Initializer, ShapeContext};
use crate::error::SceneError;
use crate::render::lighting::{LightTable, SceneLight};
use crate::render::renderer::ModelRenderer;
use crate::render::{GpuObject, RenderMatrix};
use std::cell::RefCell;
use std::rc::Rc;
use tessera_core::gpu::{
    BlendFactor, Capability, GpuDevice, ScissorRect, ShapeType, TextureLike,
};
use tessera_core::math::{LinearRgba, Mat4, Vec2, Vec3};

/// A retained scene description.
///
/// Authoring methods feed the scene compiler immediately; nothing raw is
/// retained. [`finish`](Self::finish) seals the model and uploads its
/// geometry, after which it can be replayed every frame by a
/// [`ModelRenderer`].
///
/// Authoring after a `finish` reopens the model with the attribute
/// context the seal left behind: the next `finish` swaps the new
/// compiled list in place of the old one. Call
/// [`dispose_shallow`](Self::dispose_shallow) first, or the replaced
/// list's GPU buffers leak.
///
/// Authoring methods chain: each returns `&mut Self` on success.
#[derive(Debug)]
pub struct Model {
    levels: Vec<Initializer>,
    // One slot per nested scope: the renderer the sub-model sealed at the
    // matching pop will replay through.
    scope_renderers: Vec<Option<Rc<RefCell<ModelRenderer>>>>,
    actions: Option<Vec<Action>>,
    // The root scope's attribute context at the last seal; re-authoring
    // resumes from it instead of the defaults.
    sealed_ctx: ShapeContext,
    renderable: bool,
    renderer: Option<Rc<RefCell<ModelRenderer>>>,
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Model {
    /// Creates an empty model ready for authoring.
    pub fn new() -> Self {
        Self {
            levels: vec![Initializer::new()],
            scope_renderers: Vec::new(),
            actions: None,
            sealed_ctx: ShapeContext::default(),
            renderable: true,
            renderer: None,
        }
    }

    fn from_actions(actions: Vec<Action>) -> Self {
        Self {
            levels: Vec::new(),
            scope_renderers: Vec::new(),
            actions: Some(actions),
            sealed_ctx: ShapeContext::default(),
            renderable: true,
            renderer: None,
        }
    }

    /// Binds a dedicated renderer replayed with its own program whenever
    /// this model is reached as a sub-model or fragment.
    ///
    /// A model must not be nested under its own dedicated renderer.
    pub fn set_renderer(&mut self, renderer: Rc<RefCell<ModelRenderer>>) {
        self.renderer = Some(renderer);
    }

    /// The dedicated renderer, if any.
    pub fn renderer(&self) -> Option<&Rc<RefCell<ModelRenderer>>> {
        self.renderer.as_ref()
    }

    /// Whether replay includes this model.
    pub fn is_renderable(&self) -> bool {
        self.renderable
    }

    /// Includes or excludes this model from replay without recompiling.
    pub fn set_renderable(&mut self, renderable: bool) {
        self.renderable = renderable;
    }

    /// The compiled action list.
    ///
    /// ## Errors
    /// * `SceneError::NotCompiled` - before [`finish`](Self::finish).
    pub fn actions(&self) -> Result<&[Action], SceneError> {
        self.actions.as_deref().ok_or(SceneError::NotCompiled)
    }

    /// Feeds one command to the innermost open scope, reopening a sealed
    /// model with a fresh root scope first.
    pub fn command(&mut self, command: Command) -> Result<&mut Self, SceneError> {
        self.reopen().push(command)?;
        Ok(self)
    }

    /// Opens a nested scope; everything authored until the matching
    /// [`pop`](Self::pop) becomes an owned sub-model replayed under a
    /// branched state node. The child scope inherits the enclosing scope's
    /// attribute context.
    pub fn push(&mut self) -> Result<&mut Self, SceneError> {
        let ctx = *self.reopen().context();
        self.levels.push(Initializer::with_context(ctx));
        self.scope_renderers.push(None);
        Ok(self)
    }

    /// Like [`push`](Self::push), but the sealed sub-model replays through
    /// the given renderer (and its program) instead of the parent's.
    pub fn push_with_renderer(
        &mut self,
        renderer: Rc<RefCell<ModelRenderer>>,
    ) -> Result<&mut Self, SceneError> {
        self.push()?;
        *self
            .scope_renderers
            .last_mut()
            .expect("push added a slot above") = Some(renderer);
        Ok(self)
    }

    /// The innermost live scope, lazily recreated after a `finish` with
    /// the attribute context the last seal left behind.
    fn reopen(&mut self) -> &mut Initializer {
        if self.levels.is_empty() {
            self.levels.push(Initializer::with_context(self.sealed_ctx));
        }
        self.levels.last_mut().expect("a root scope exists here")
    }

    /// Closes the innermost nested scope, sealing it into a sub-model.
    pub fn pop(&mut self) -> Result<&mut Self, SceneError> {
        if self.levels.len() <= 1 {
            return Err(SceneError::PopRootScope);
        }
        let mut child = self.levels.pop().expect("len checked above");
        let mut sealed = Model::from_actions(child.seal()?);
        if let Some(renderer) = self.scope_renderers.pop().flatten() {
            sealed.set_renderer(renderer);
        }
        self.command(Command::Sub(sealed))
    }

    /// Seals the model and uploads its geometry. A no-op when nothing was
    /// authored since the last `finish`; otherwise the freshly compiled
    /// list replaces the previous one.
    ///
    /// ## Errors
    /// * `SceneError::UnclosedScopes` - if a nested scope is still open.
    /// * `SceneError::UnfinishedShape` - if a shape is still open.
    /// * `SceneError::Resource` - if a GPU upload fails.
    pub fn finish(&mut self, device: &dyn GpuDevice) -> Result<(), SceneError> {
        if self.levels.is_empty() {
            return Ok(());
        }
        if self.levels.len() > 1 {
            return Err(SceneError::UnclosedScopes(self.levels.len() - 1));
        }
        let root = self.levels.last_mut().expect("a root scope exists here");
        let ctx = *root.context();
        let mut actions = root.seal()?;
        for action in &mut actions {
            action.post_upload(device)?;
        }
        self.sealed_ctx = ctx;
        self.renderable = !actions.is_empty();
        self.actions = Some(actions);
        self.levels.clear();
        Ok(())
    }

    /// Uploads any geometry still CPU-resident, recursing into sub-models.
    /// Used on models sealed by a scope pop inside a larger `finish`.
    pub(crate) fn post_upload(&mut self, device: &dyn GpuDevice) -> Result<(), SceneError> {
        if let Some(actions) = &mut self.actions {
            for action in actions {
                action.post_upload(device)?;
            }
        }
        Ok(())
    }

    /// Adds this model's light contributions, recursing into nested
    /// models. A non-renderable model contributes nothing.
    pub fn collect_lights(&self, table: &mut LightTable) {
        if !self.renderable {
            return;
        }
        if let Some(actions) = &self.actions {
            for action in actions {
                action.collect_lights(table);
            }
        }
    }

    /// Replays this model under a branch of the caller's state node, or
    /// through its own dedicated renderer when one is bound.
    pub fn apply(
        &self,
        matrix: &mut RenderMatrix,
        renderer: &mut ModelRenderer,
        device: &dyn GpuDevice,
    ) -> Result<(), SceneError> {
        if !self.renderable {
            return Ok(());
        }
        match &self.renderer {
            Some(own) => {
                // A deep copy keeps the caller's model-view and mask while
                // the detached ledger re-uploads under the other program.
                let mut branch = matrix.copy_for_renderer();
                own.borrow_mut().render_with(self, &mut branch, device)?;
                // The nested pass left both the program binding and the GPU
                // state unknown to the caller's ledger.
                device.use_program(renderer.program_id());
                matrix.dirty_all();
                Ok(())
            }
            None => {
                let mut branch = matrix.copy();
                renderer.replay(self.actions()?, &mut branch, device)
            }
        }
    }

    /// Releases all GPU resources, including shared fragments. Fragment
    /// drawables tolerate being disposed from several owners.
    pub fn dispose(&mut self, device: &dyn GpuDevice) -> Result<(), SceneError> {
        self.dispose_with(device, true)
    }

    /// Releases owned GPU resources but leaves shared fragments alive.
    pub fn dispose_shallow(&mut self, device: &dyn GpuDevice) -> Result<(), SceneError> {
        self.dispose_with(device, false)
    }

    pub(crate) fn dispose_with(
        &mut self,
        device: &dyn GpuDevice,
        deep: bool,
    ) -> Result<(), SceneError> {
        if let Some(actions) = &mut self.actions {
            for action in actions {
                action.dispose(device, deep)?;
            }
        }
        Ok(())
    }

    // --- shape authoring ---

    /// Opens a shape of the given type.
    pub fn start(&mut self, shape: ShapeType) -> Result<&mut Self, SceneError> {
        self.command(Command::Start(shape))
    }

    /// Closes the open shape.
    pub fn end(&mut self) -> Result<&mut Self, SceneError> {
        self.command(Command::End)
    }

    /// Closes the open shape with explicit local indices.
    pub fn end_indexed(&mut self, indices: Vec<u32>) -> Result<&mut Self, SceneError> {
        self.command(Command::EndIndexed(indices))
    }

    /// Appends one vertex to the open shape.
    pub fn vertex(&mut self, v: Vec3) -> Result<&mut Self, SceneError> {
        self.command(Command::Vertices(vec![v.x, v.y, v.z]))
    }

    /// Appends vertices to the open shape.
    pub fn vertices(&mut self, vs: &[Vec3]) -> Result<&mut Self, SceneError> {
        self.command(Command::Vertices(flatten3(vs)))
    }

    /// Appends raw `x, y, z` position data to the open shape.
    pub fn vertices_flat(&mut self, data: Vec<f32>) -> Result<&mut Self, SceneError> {
        self.command(Command::Vertices(data))
    }

    /// Appends one normal to the open shape.
    pub fn normal(&mut self, n: Vec3) -> Result<&mut Self, SceneError> {
        self.command(Command::Normals(vec![n.x, n.y, n.z]))
    }

    /// Appends normals to the open shape.
    pub fn normals(&mut self, ns: &[Vec3]) -> Result<&mut Self, SceneError> {
        self.command(Command::Normals(flatten3(ns)))
    }

    /// Appends one texture coordinate to the open shape.
    pub fn uv(&mut self, uv: Vec2) -> Result<&mut Self, SceneError> {
        self.command(Command::TexCoords(vec![uv.x, uv.y]))
    }

    /// Appends texture coordinates to the open shape.
    pub fn uvs(&mut self, uvs: &[Vec2]) -> Result<&mut Self, SceneError> {
        let mut flat = Vec::with_capacity(uvs.len() * 2);
        for uv in uvs {
            flat.push(uv.x);
            flat.push(uv.y);
        }
        self.command(Command::TexCoords(flat))
    }

    /// A filled axis-aligned rectangle in the `z = 0` plane.
    pub fn fill_rect(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> Result<&mut Self, SceneError> {
        self.start(ShapeType::Quad)?
            .vertices_flat(vec![
                x,
                y,
                0.0,
                x + width,
                y,
                0.0,
                x + width,
                y + height,
                0.0,
                x,
                y + height,
                0.0,
            ])?
            .end()
    }

    // --- state authoring ---

    /// Sets the fill color stamped on following shapes.
    pub fn color(&mut self, color: LinearRgba) -> Result<&mut Self, SceneError> {
        self.command(Command::Color(color))
    }

    /// Sets the global color mask at this point of the replay.
    pub fn mask(&mut self, color: LinearRgba) -> Result<&mut Self, SceneError> {
        self.command(Command::Mask(color))
    }

    /// Binds a texture and switches following shapes to textured drawing.
    pub fn texture(&mut self, texture: Rc<dyn TextureLike>) -> Result<&mut Self, SceneError> {
        self.command(Command::Texture(texture))
    }

    /// Scales the default texture coordinates generated for quads.
    pub fn texture_scale(&mut self, scale: Vec2) -> Result<&mut Self, SceneError> {
        self.command(Command::TextureScale(scale))
    }

    /// Translates everything replayed after this point.
    pub fn translate(&mut self, v: Vec3) -> Result<&mut Self, SceneError> {
        self.command(Command::Translate(v))
    }

    /// Component form of [`translate`](Self::translate).
    pub fn translate_xyz(&mut self, x: f32, y: f32, z: f32) -> Result<&mut Self, SceneError> {
        self.translate(Vec3::new(x, y, z))
    }

    /// Rotates everything replayed after this point about an axis.
    pub fn rotate(&mut self, axis: Vec3, angle: f32) -> Result<&mut Self, SceneError> {
        self.command(Command::Rotate { axis, angle })
    }

    /// Rotation about the x axis.
    pub fn rotate_x(&mut self, angle: f32) -> Result<&mut Self, SceneError> {
        self.rotate(Vec3::new(1.0, 0.0, 0.0), angle)
    }

    /// Rotation about the y axis.
    pub fn rotate_y(&mut self, angle: f32) -> Result<&mut Self, SceneError> {
        self.rotate(Vec3::new(0.0, 1.0, 0.0), angle)
    }

    /// Rotation about the z axis.
    pub fn rotate_z(&mut self, angle: f32) -> Result<&mut Self, SceneError> {
        self.rotate(Vec3::new(0.0, 0.0, 1.0), angle)
    }

    /// Scales everything replayed after this point.
    pub fn scale(&mut self, v: Vec3) -> Result<&mut Self, SceneError> {
        self.command(Command::Scale(v))
    }

    /// Uniform scale.
    pub fn scale_uniform(&mut self, s: f32) -> Result<&mut Self, SceneError> {
        self.scale(Vec3::new(s, s, s))
    }

    /// Replaces the model-view matrix, typically with a camera transform.
    pub fn view(&mut self, matrix: Mat4) -> Result<&mut Self, SceneError> {
        self.command(Command::View(matrix))
    }

    /// Enables a fixed-function capability.
    pub fn enable(&mut self, capability: Capability) -> Result<&mut Self, SceneError> {
        self.command(Command::Enable(capability))
    }

    /// Disables a fixed-function capability.
    pub fn disable(&mut self, capability: Capability) -> Result<&mut Self, SceneError> {
        self.command(Command::Disable(capability))
    }

    /// Toggles depth writes.
    pub fn depth_mask(&mut self, enabled: bool) -> Result<&mut Self, SceneError> {
        self.command(Command::DepthMask(enabled))
    }

    /// Sets the blend function pair.
    pub fn blend_func(
        &mut self,
        src: BlendFactor,
        dst: BlendFactor,
    ) -> Result<&mut Self, SceneError> {
        self.command(Command::BlendFunc(src, dst))
    }

    /// Sets the rasterized line width.
    pub fn line_width(&mut self, width: f32) -> Result<&mut Self, SceneError> {
        self.command(Command::LineWidth(width))
    }

    /// Toggles normal generation and lighting for following shapes.
    pub fn lighting(&mut self, enabled: bool) -> Result<&mut Self, SceneError> {
        self.command(Command::Lighting(enabled))
    }

    /// Contributes ambient light to every frame this model is part of.
    pub fn ambient_light(&mut self, color: LinearRgba) -> Result<&mut Self, SceneError> {
        self.command(Command::AmbientLight(color))
    }

    /// Contributes a directional light.
    pub fn directional_light(
        &mut self,
        direction: Vec3,
        color: LinearRgba,
        intensity: f32,
    ) -> Result<&mut Self, SceneError> {
        self.command(Command::Light(SceneLight::Directional {
            direction,
            color,
            intensity,
        }))
    }

    /// Contributes a point light.
    pub fn point_light(
        &mut self,
        position: Vec3,
        color: LinearRgba,
        intensity: f32,
        range: f32,
    ) -> Result<&mut Self, SceneError> {
        self.command(Command::Light(SceneLight::Point {
            position,
            color,
            intensity,
            range,
        }))
    }

    /// Contributes a spot light.
    #[allow(clippy::too_many_arguments)]
    pub fn spot_light(
        &mut self,
        position: Vec3,
        direction: Vec3,
        color: LinearRgba,
        intensity: f32,
        range: f32,
        cutoff: f32,
    ) -> Result<&mut Self, SceneError> {
        self.command(Command::Light(SceneLight::Spot {
            position,
            direction,
            color,
            intensity,
            range,
            cutoff,
        }))
    }

    /// Clears the color and/or depth targets at this point of the replay.
    pub fn clear(
        &mut self,
        color: Option<LinearRgba>,
        depth: bool,
    ) -> Result<&mut Self, SceneError> {
        self.command(Command::Clear { color, depth })
    }

    /// Sets or removes the scissor rectangle.
    pub fn clip(&mut self, rect: Option<ScissorRect>) -> Result<&mut Self, SceneError> {
        self.command(Command::Clip(rect))
    }

    /// Embeds a pre-built drawable.
    pub fn object(&mut self, object: GpuObject) -> Result<&mut Self, SceneError> {
        self.command(Command::Object(object))
    }

    /// Embeds a shared, separately finished model.
    pub fn fragment(&mut self, model: Rc<RefCell<Model>>) -> Result<&mut Self, SceneError> {
        self.command(Command::Fragment(model))
    }
}

fn flatten3(vs: &[Vec3]) -> Vec<f32> {
    let mut flat = Vec::with_capacity(vs.len() * 3);
    for v in vs {
        flat.push(v.x);
        flat.push(v.y);
        flat.push(v.z);
    }
    flat
}
