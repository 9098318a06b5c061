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

//! The versioned dirty-tracking render-state node.

use crate::error::SceneError;
use crate::render::program::{Program, TextureUnitAllocator};
use ahash::AHashMap;
use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::Rc;
use tessera_core::gpu::{
    BlendFactor, Capability, CompareFunction, GpuDevice, ScissorRect, TextureLike,
};
use tessera_core::math::{LinearRgba, Mat2, Mat3, Mat4, Vec2, Vec3, Vec4};

/// The key of one tracked uniform.
pub type UniformKey = Cow<'static, str>;

/// The version sentinel meaning "newer than any node" — set once and every
/// consulting node re-uploads it until one of them stamps its own version.
const ALWAYS_NEW: u64 = u64::MAX;

/// The value of one tracked uniform.
///
/// Values are cheap to clone: matrices by copy, arrays and textures by
/// reference count.
#[derive(Debug, Clone)]
pub enum UniformValue {
    /// A scalar `float`.
    Float(f32),
    /// A scalar `int`.
    Int(i32),
    /// A `vec2`.
    Vec2(Vec2),
    /// A `vec3`.
    Vec3(Vec3),
    /// A `vec4`.
    Vec4(Vec4),
    /// A `mat2`.
    Mat2(Mat2),
    /// A `mat3`.
    Mat3(Mat3),
    /// A `mat4`.
    Mat4(Mat4),
    /// A packed `float[]` payload.
    FloatArray(Rc<[f32]>),
    /// A texture consumed through a sampler uniform.
    Texture(Rc<dyn TextureLike>),
}

macro_rules! uniform_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for UniformValue {
            fn from(value: $ty) -> Self {
                UniformValue::$variant(value)
            }
        })*
    };
}

uniform_from! {
    f32 => Float,
    i32 => Int,
    Vec2 => Vec2,
    Vec3 => Vec3,
    Vec4 => Vec4,
    Mat2 => Mat2,
    Mat3 => Mat3,
    Mat4 => Mat4,
    Rc<[f32]> => FloatArray,
    Rc<dyn TextureLike> => Texture,
}

impl From<LinearRgba> for UniformValue {
    fn from(color: LinearRgba) -> Self {
        UniformValue::Vec4(color.to_vec4())
    }
}

/// The per-key version table shared by reference across one branch chain.
///
/// A write from a child is deliberately visible to siblings rendered
/// afterwards within the same pass: that is what makes a value uploaded for
/// one subtree count as uploaded for every later subtree inheriting it
/// unchanged. The ledger object is reused frame to frame; stale stamps only
/// ever compare as "not newer", so reuse is safe.
#[derive(Debug)]
pub struct ChangeLedger {
    uniforms: AHashMap<UniformKey, u64>,
    blend_func: u64,
    depth_mask: u64,
    depth_func: u64,
    line_width: u64,
    scissor: u64,
    enabled: [u64; Capability::COUNT],
}

impl Default for ChangeLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeLedger {
    /// Creates a ledger with every slot marked newest, so the first pass
    /// against it uploads everything.
    pub fn new() -> Self {
        Self {
            uniforms: AHashMap::new(),
            blend_func: ALWAYS_NEW,
            depth_mask: ALWAYS_NEW,
            depth_func: ALWAYS_NEW,
            line_width: ALWAYS_NEW,
            scissor: ALWAYS_NEW,
            enabled: [ALWAYS_NEW; Capability::COUNT],
        }
    }

    fn mark_all(&mut self) {
        for version in self.uniforms.values_mut() {
            *version = ALWAYS_NEW;
        }
        self.blend_func = ALWAYS_NEW;
        self.depth_mask = ALWAYS_NEW;
        self.depth_func = ALWAYS_NEW;
        self.line_width = ALWAYS_NEW;
        self.scissor = ALWAYS_NEW;
        self.enabled = [ALWAYS_NEW; Capability::COUNT];
    }
}

/// One node of the versioned render-state tree.
///
/// A **root** node starts a fresh ledger and default fixed-function state;
/// a **branch** ([`copy`](Self::copy)) clones the value tables, reuses the
/// parent's ledger object, and takes `index = parent.index + 1`. A key is
/// dirty relative to a node iff its ledger stamp is newer than the node's
/// own index.
#[derive(Debug)]
pub struct RenderMatrix {
    uniforms: AHashMap<UniformKey, UniformValue>,
    enabled: [bool; Capability::COUNT],
    blend_func: (BlendFactor, BlendFactor),
    depth_mask: bool,
    depth_func: CompareFunction,
    line_width: f32,
    scissor: Option<ScissorRect>,
    index: u64,
    changes: Rc<RefCell<ChangeLedger>>,
}

impl RenderMatrix {
    /// Creates a root node with a fresh ledger and default GL state. The
    /// owning renderer seeds the initial uniforms afterwards.
    pub fn root() -> Self {
        Self::root_with_ledger(Rc::new(RefCell::new(ChangeLedger::new())))
    }

    /// Creates a root node against an existing ledger, letting a renderer
    /// keep incremental dirtiness across frames.
    pub fn root_with_ledger(changes: Rc<RefCell<ChangeLedger>>) -> Self {
        let mut enabled = [false; Capability::COUNT];
        enabled[Capability::Blend.index()] = true;
        enabled[Capability::DepthTest.index()] = true;
        Self {
            uniforms: AHashMap::new(),
            enabled,
            blend_func: (BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha),
            depth_mask: true,
            depth_func: CompareFunction::Less,
            line_width: 1.0,
            scissor: None,
            index: 0,
            changes,
        }
    }

    /// Produces a branch node: value tables cloned, ledger shared, version
    /// one past this node's.
    pub fn copy(&self) -> Self {
        Self {
            uniforms: self.uniforms.clone(),
            enabled: self.enabled,
            blend_func: self.blend_func,
            depth_mask: self.depth_mask,
            depth_func: self.depth_func,
            line_width: self.line_width,
            scissor: self.scissor,
            index: self.index + 1,
            changes: Rc::clone(&self.changes),
        }
    }

    /// Deep-copies into a node bound to a different renderer: value tables
    /// cloned but a fresh ledger, because no incremental dirtiness can be
    /// assumed against another program's GPU state.
    pub fn copy_for_renderer(&self) -> Self {
        let mut node = self.copy();
        node.changes = Rc::new(RefCell::new(ChangeLedger::new()));
        node
    }

    /// This node's version number.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// The ledger shared by this branch chain.
    pub fn ledger(&self) -> Rc<RefCell<ChangeLedger>> {
        Rc::clone(&self.changes)
    }

    /// Stores a uniform value and marks it newer than any node.
    pub fn set(&mut self, key: impl Into<UniformKey>, value: impl Into<UniformValue>) {
        let key = key.into();
        self.changes
            .borrow_mut()
            .uniforms
            .insert(key.clone(), ALWAYS_NEW);
        self.uniforms.insert(key, value.into());
    }

    /// Stores a uniform value without marking it newer: the existing
    /// ledger stamp decides whether it uploads, and an absent stamp counts
    /// as newest.
    ///
    /// Only sound for keys the replay never mutates, where the GPU copy at
    /// the stamped version is known to equal `value` already. A renderer
    /// uses this to carry its projection across frames without a per-frame
    /// upload.
    pub fn seed(&mut self, key: impl Into<UniformKey>, value: impl Into<UniformValue>) {
        self.uniforms.insert(key.into(), value.into());
    }

    /// Stores a uniform value only when the key is absent. Used for
    /// defaults that must not clobber an explicit upstream value.
    pub fn setn(&mut self, key: impl Into<UniformKey>, value: impl Into<UniformValue>) {
        let key = key.into();
        if !self.uniforms.contains_key(&key) {
            self.set(key, value);
        }
    }

    /// Non-mutating read of a uniform value.
    pub fn peek(&self, key: &str) -> Option<&UniformValue> {
        self.uniforms.get(key)
    }

    /// Applies a closure to a stored value and marks it dirty, atomically.
    ///
    /// This replaces the hazard of handing out a mutable reference and
    /// trusting the caller to have dirtied the key first: here the two
    /// steps cannot be separated. Returns `false` when the key is absent.
    pub fn mutate(
        &mut self,
        key: impl Into<UniformKey>,
        f: impl FnOnce(&mut UniformValue),
    ) -> bool {
        let key = key.into();
        match self.uniforms.get_mut(&key) {
            Some(value) => {
                f(value);
                self.changes.borrow_mut().uniforms.insert(key, ALWAYS_NEW);
                true
            }
            None => false,
        }
    }

    /// [`mutate`](Self::mutate) specialized to `Mat4` values; a stored
    /// value of any other kind is left untouched.
    pub fn mutate_mat4(&mut self, key: impl Into<UniformKey>, f: impl FnOnce(&mut Mat4)) -> bool {
        self.mutate(key, |value| {
            if let UniformValue::Mat4(matrix) = value {
                f(matrix);
            }
        })
    }

    /// Force-marks one key as needing reupload.
    pub fn dirty(&mut self, key: impl Into<UniformKey>) {
        self.changes
            .borrow_mut()
            .uniforms
            .insert(key.into(), ALWAYS_NEW);
    }

    /// Force-marks every tracked key and all fixed-function state. Used
    /// after any operation that invalidates GPU state out of band, such as
    /// a nested renderer pass.
    pub fn dirty_all(&mut self) {
        let mut ledger = self.changes.borrow_mut();
        for key in self.uniforms.keys() {
            ledger.uniforms.insert(key.clone(), ALWAYS_NEW);
        }
        ledger.mark_all();
    }

    // --- fixed-function state ---

    /// Sets the blend function pair.
    pub fn set_blend_func(&mut self, src: BlendFactor, dst: BlendFactor) {
        self.blend_func = (src, dst);
        self.changes.borrow_mut().blend_func = ALWAYS_NEW;
    }

    /// Enables or disables depth writes.
    pub fn set_depth_mask(&mut self, enabled: bool) {
        self.depth_mask = enabled;
        self.changes.borrow_mut().depth_mask = ALWAYS_NEW;
    }

    /// Sets the depth comparison function.
    pub fn set_depth_func(&mut self, func: CompareFunction) {
        self.depth_func = func;
        self.changes.borrow_mut().depth_func = ALWAYS_NEW;
    }

    /// Sets the rasterized line width.
    pub fn set_line_width(&mut self, width: f32) {
        self.line_width = width;
        self.changes.borrow_mut().line_width = ALWAYS_NEW;
    }

    /// Sets or clears the scissor rectangle.
    pub fn set_scissor(&mut self, rect: Option<ScissorRect>) {
        self.scissor = rect;
        self.enabled[Capability::ScissorTest.index()] = rect.is_some();
        let mut ledger = self.changes.borrow_mut();
        ledger.scissor = ALWAYS_NEW;
        ledger.enabled[Capability::ScissorTest.index()] = ALWAYS_NEW;
    }

    /// Enables or disables a capability.
    pub fn set_capability(&mut self, capability: Capability, enabled: bool) {
        self.enabled[capability.index()] = enabled;
        self.changes.borrow_mut().enabled[capability.index()] = ALWAYS_NEW;
    }

    /// Whether a capability is enabled at this node.
    pub fn capability(&self, capability: Capability) -> bool {
        self.enabled[capability.index()]
    }

    /// Uploads every uniform and fixed-function item whose ledger stamp is
    /// newer than this node's version, stamping each one at this version so
    /// later nodes inheriting the same value skip it.
    ///
    /// Must run after all `set`/`mutate` calls for the node and before its
    /// draw call; a draw issued earlier observes stale GPU state.
    pub fn unify(
        &mut self,
        program: &Program,
        units: &mut TextureUnitAllocator,
        device: &dyn GpuDevice,
    ) -> Result<(), SceneError> {
        self.unify_inner(program, units, device, false)
    }

    /// Unconditional variant used the first time a program becomes active,
    /// when no incremental dirtiness can be assumed.
    pub fn unify_all(
        &mut self,
        program: &Program,
        units: &mut TextureUnitAllocator,
        device: &dyn GpuDevice,
    ) -> Result<(), SceneError> {
        self.unify_inner(program, units, device, true)
    }

    fn unify_inner(
        &mut self,
        program: &Program,
        units: &mut TextureUnitAllocator,
        device: &dyn GpuDevice,
        force: bool,
    ) -> Result<(), SceneError> {
        units.reset();
        let mut ledger = self.changes.borrow_mut();

        for (key, value) in &self.uniforms {
            let stamp = ledger.uniforms.get(key).copied().unwrap_or(ALWAYS_NEW);
            if force || stamp > self.index {
                // A deferred upload (texture not ready) keeps its stamp so
                // the key is retried on the next pass.
                if program.upload(device, key, value, units)? {
                    ledger.uniforms.insert(key.clone(), self.index);
                }
            }
        }

        if force || ledger.blend_func > self.index {
            device.set_blend_func(self.blend_func.0, self.blend_func.1);
            ledger.blend_func = self.index;
        }
        if force || ledger.depth_mask > self.index {
            device.set_depth_mask(self.depth_mask);
            ledger.depth_mask = self.index;
        }
        if force || ledger.depth_func > self.index {
            device.set_depth_func(self.depth_func);
            ledger.depth_func = self.index;
        }
        if force || ledger.line_width > self.index {
            device.set_line_width(self.line_width);
            ledger.line_width = self.index;
        }
        if force || ledger.scissor > self.index {
            device.set_scissor(self.scissor);
            ledger.scissor = self.index;
        }
        for capability in Capability::ALL {
            let slot = capability.index();
            if force || ledger.enabled[slot] > self.index {
                device.set_capability(capability, self.enabled[slot]);
                ledger.enabled[slot] = self.index;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_takes_next_version_and_shares_ledger() {
        let root = RenderMatrix::root();
        let child = root.copy();
        assert_eq!(root.index(), 0);
        assert_eq!(child.index(), 1);
        assert!(Rc::ptr_eq(&root.ledger(), &child.ledger()));
    }

    #[test]
    fn copy_for_renderer_detaches_the_ledger() {
        let root = RenderMatrix::root();
        let detached = root.copy_for_renderer();
        assert!(!Rc::ptr_eq(&root.ledger(), &detached.ledger()));
    }

    #[test]
    fn set_is_visible_to_branches_but_not_to_the_parent_snapshot() {
        let mut root = RenderMatrix::root();
        root.set("value", 1.0f32);
        let mut child = root.copy();
        child.set("value", 2.0f32);
        assert!(matches!(root.peek("value"), Some(UniformValue::Float(v)) if *v == 1.0));
        assert!(matches!(child.peek("value"), Some(UniformValue::Float(v)) if *v == 2.0));
    }

    #[test]
    fn setn_does_not_clobber() {
        let mut node = RenderMatrix::root();
        node.set("value", 1.0f32);
        node.setn("value", 9.0f32);
        node.setn("other", 3.0f32);
        assert!(matches!(node.peek("value"), Some(UniformValue::Float(v)) if *v == 1.0));
        assert!(matches!(node.peek("other"), Some(UniformValue::Float(v)) if *v == 3.0));
    }

    #[test]
    fn mutate_requires_a_present_key() {
        let mut node = RenderMatrix::root();
        assert!(!node.mutate_mat4(MV, |m| *m = Mat4::IDENTITY));
        node.set(MV, Mat4::IDENTITY);
        assert!(node.mutate_mat4(MV, |m| *m = *m * Mat4::from_scale(Vec3::new(2.0, 2.0, 2.0))));
        match node.peek(MV) {
            Some(UniformValue::Mat4(m)) => assert_eq!(m.cols[0].x, 2.0),
            other => panic!("unexpected value: {other:?}"),
        }
    }

    const MV: &str = "mvMatrix";
}
