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

//! # Tessera Scene
//!
//! The retained-mode core: a scene compiler that turns an ordered stream of
//! authoring commands into GPU-resident buffers plus a replayable action
//! list, and a versioned render-state tree that re-uploads only the
//! uniform/fixed-function state that changed since the last shared ancestor.
//!
//! The flow end to end:
//!
//! 1. Client code authors a [`Model`] through chained drawing calls
//!    (`start`/`vertex`/`end`/`translate`/`color`/...). Each call
//!    feeds a [`compile::Command`] to the model's active
//!    [`compile::Initializer`].
//! 2. The initializer batches compatible geometry, triangulates shapes as
//!    they close, and flushes the pending batch whenever an incompatible
//!    command arrives. [`Model::finish`] runs the second pass that uploads
//!    every batch to the GPU.
//! 3. Each frame, a [`render::ModelRenderer`] replays the compiled action
//!    list into a tree of [`render::RenderMatrix`] nodes, unifying dirty
//!    state right before each draw call.
//!
//! Everything is single-threaded and synchronous; the only asynchrony
//! (texture readiness) is observed through `TextureLike::is_ready` and
//! resolved by skipping for a frame, never by blocking.

#![warn(missing_docs)]

pub mod compile;
pub mod error;
pub mod geometry;
pub mod model;
pub mod render;

pub use error::SceneError;
pub use model::Model;
pub use render::{ModelRenderer, RenderMatrix};
