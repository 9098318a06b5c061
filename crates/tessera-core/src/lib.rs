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

//! # Tessera Core
//!
//! Foundational crate containing the math primitives, the GPU device
//! contracts, and the error hierarchy that the scene compiler and the
//! render-state layer in `tessera-scene` are built on.
//!
//! Nothing in this crate talks to a real graphics context: the [`gpu`]
//! module only defines the capability surface (one object-safe trait,
//! opaque resource IDs, closed state enumerations) that an embedding
//! application implements against its context of choice.

#![warn(missing_docs)]

pub mod error;
pub mod gpu;
pub mod math;

pub use error::{DiagnosticKind, ResourceError, ShaderDiagnostic, ShaderError};
pub use gpu::GpuDevice;
