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

//! The render-state propagation layer.
//!
//! A compiled model is replayed through a tree of [`RenderMatrix`] nodes,
//! one branch per sub-model. Each node carries its own uniform snapshot but
//! shares one change ledger with the whole branch chain, which is what lets
//! [`RenderMatrix::unify`] re-upload each value at most once per frame for
//! the parts of the tree that inherit it unchanged.

pub mod gpu_object;
pub mod lighting;
pub mod matrix;
pub mod program;
pub mod renderer;

pub use gpu_object::GpuObject;
pub use lighting::LightTable;
pub use matrix::{RenderMatrix, UniformKey, UniformValue};
pub use program::{Program, TextureUnitAllocator};
pub use renderer::ModelRenderer;

/// The model-view transform uniform.
pub const MV_MATRIX: &str = "mvMatrix";
/// The projection transform uniform.
pub const P_MATRIX: &str = "pMatrix";
/// The global color-mask uniform multiplied over every fragment.
pub const COLOR_MASK: &str = "colorMask";
/// The sampler uniform fed by `bind_texture`.
pub const SAMPLER: &str = "sampler";
/// The packed light table uniform.
pub const LIGHTS: &str = "lights";
/// The number of valid entries in the packed light table.
pub const LIGHT_COUNT: &str = "lightCount";
/// The accumulated ambient light color.
pub const AMBIENT: &str = "ambient";

/// The position vertex attribute.
pub const ATTR_POSITION: &str = "position";
/// The per-vertex byte color attribute.
pub const ATTR_COLOR: &str = "color";
/// The per-vertex texture coordinate attribute.
pub const ATTR_UV: &str = "uv";
/// The per-vertex normal attribute.
pub const ATTR_NORMAL: &str = "normal";
