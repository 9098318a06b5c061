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

//! The GPU device contract consumed by the scene compiler.
//!
//! This module defines the full capability surface the retained-mode core
//! needs from a graphics context: resource creation and destruction, draw
//! calls, fixed-function state, and compiled-program introspection. The
//! numeric API tokens of any particular backend are an implementation
//! detail of that backend; the core's vocabulary is the closed enumerations
//! defined in [`enums`].

pub mod device;
pub mod enums;
pub mod texture;

pub use device::{
    AttributeInfo, AttributeLayout, BufferDescriptor, BufferId, BufferUsage, DeviceLimits,
    GpuDevice, ProgramDescriptor, ProgramId, ScissorRect, UniformInfo, UniformLocation,
    UniformStage,
};
pub use enums::{
    BlendFactor, Capability, CompareFunction, DataType, DrawMode, IndexFormat, PrimitiveTopology,
    ShapeType, UniformKind,
};
pub use texture::{TextureId, TextureLike};
