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

//! The fatal error taxonomy of the scene layer.
//!
//! Every variant here is a programming error in the authoring sequence or
//! a hard device limit, not a runtime condition to tolerate: the core never
//! catches or downgrades them. Whether a malformed scene aborts the whole
//! render or is contained around a single frame is the embedding
//! application's call.

use tessera_core::gpu::ShapeType;
use tessera_core::{ResourceError, ShaderError};
use thiserror::Error;

/// A fatal scene-authoring or resource error.
#[derive(Debug, Error)]
pub enum SceneError {
    /// `start()` was called while a shape was already open.
    #[error("a shape is already open; call end() before starting another")]
    ShapeAlreadyOpen,

    /// A vertex/end call arrived with no open shape.
    #[error("no shape is open; call start() first")]
    NoOpenShape,

    /// Color, mask, or texture state was mutated while a shape was open.
    #[error("cannot change {0} while a shape is open")]
    MutationWhileShapeOpen(&'static str),

    /// The accumulated vertex count does not match the shape's grouping.
    #[error("{shape:?} requires a vertex count that is a multiple of {required}, got {count}")]
    VertexArity {
        /// The shape type being closed.
        shape: ShapeType,
        /// The vertex count that was accumulated.
        count: usize,
        /// The required multiple.
        required: usize,
    },

    /// A strip/fan shape was closed with too few vertices to triangulate.
    #[error("{shape:?} requires at least {required} vertices, got {count}")]
    TooFewVertices {
        /// The shape type being closed.
        shape: ShapeType,
        /// The vertex count that was accumulated.
        count: usize,
        /// The minimum vertex count.
        required: usize,
    },

    /// An attribute payload length is not a multiple of its component count.
    #[error("attribute payload of length {len} is not a multiple of {components} components")]
    AttributeArity {
        /// The payload length in scalars.
        len: usize,
        /// The per-vertex component count.
        components: usize,
    },

    /// `pop()` was called with only the root authoring scope open.
    #[error("pop() on the root authoring scope")]
    PopRootScope,

    /// `finish()` was called with nested scopes still open.
    #[error("finish() with {0} unclosed nested scope(s)")]
    UnclosedScopes(usize),

    /// `finish()` or `pop()` was called with a shape still open.
    #[error("a shape is still open; call end() before closing this scope")]
    UnfinishedShape,

    /// A fragment or render referenced a model that was never finished.
    #[error("model has not been finished")]
    NotCompiled,

    /// Geometry was pushed into a batch that has already been uploaded.
    #[error("geometry has already been uploaded; further data is illegal")]
    Sealed,

    /// A device resource operation failed or hit a limit.
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// A shader program failed to compile or link.
    #[error(transparent)]
    Shader(#[from] ShaderError),
}
