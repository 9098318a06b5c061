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

//! Compilation of authoring commands into a replayable action list.

pub mod action;
pub mod batch;
pub mod command;
pub mod initializer;
pub mod shape;

pub use action::Action;
pub use batch::{DrawBatch, INDEX_CEILING};
pub use command::Command;
pub use initializer::Initializer;
pub use shape::{ClosedShape, ShapeBuilder, ShapeContext};
