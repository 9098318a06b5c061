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

//! Append-only numeric accumulation buffers.
//!
//! Geometry accumulates on the CPU before a single upload at compile time.
//! Two variants exist: [`FlatBuffer`] keeps one contiguous store (cheap
//! `combine`, reallocation on growth), [`FragmentedBuffer`] keeps
//! fixed-capacity chunks so appending never copies what was already pushed.

mod flat;
mod fragmented;

pub use flat::FlatBuffer;
pub use fragmented::FragmentedBuffer;

use std::ops::Add;

/// The scalar element of a geometry buffer.
///
/// Everything the compiler accumulates (positions, normals, byte colors,
/// indices) satisfies this; `Pod` gives the zero-copy byte cast at upload
/// time and `Add` supports index re-basing via `offset`.
pub trait Element: Copy + Default + PartialEq + Add<Output = Self> + bytemuck::Pod {}

impl<T> Element for T where T: Copy + Default + PartialEq + Add<Output = T> + bytemuck::Pod {}
