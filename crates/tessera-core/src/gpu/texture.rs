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

//! The texture capability surface the scene core consumes.
//!
//! Texture creation, image decoding, atlases, and render-to-texture all
//! live in the embedding application. The core only ever asks a texture
//! three questions: are you ready, what is your handle, and do you need
//! any per-frame configuration before sampling.

use super::device::GpuDevice;
use std::fmt::Debug;

/// An opaque handle to a GPU texture resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub usize);

/// A texture-like capability: anything a sampler uniform can consume.
///
/// Loading is asynchronous in the surrounding layer; a texture that is not
/// yet ready is simply skipped for the frame and retried on the next one,
/// never blocked on.
pub trait TextureLike: Debug {
    /// The GPU handle to bind.
    fn id(&self) -> TextureId;

    /// Whether the texture's backing data has arrived and been uploaded.
    fn is_ready(&self) -> bool {
        true
    }

    /// Hook for per-frame state the texture needs applied before sampling
    /// (e.g., advancing a video frame). Default does nothing.
    fn configure(&self, _device: &dyn GpuDevice) {}
}
