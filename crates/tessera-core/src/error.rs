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

//! Defines the hierarchy of error types for the GPU-facing layer.
//!
//! All errors here are fail-fast: the core never downgrades or retries
//! them. Shader compile failures carry a structured per-line diagnostic
//! list rather than a raw log string so tooling can render them usefully.

use crate::gpu::device::ProgramId;
use std::fmt;

/// An error related to GPU resource creation or limits.
#[derive(Debug)]
pub enum ResourceError {
    /// The backend failed to allocate a resource.
    AllocationFailed(String),
    /// A registration would exceed a device ceiling. Surfaced at
    /// registration time, before any GPU call is made.
    LimitExceeded {
        /// What was being registered (e.g., "vertex attributes").
        resource: &'static str,
        /// The count the registration would have reached.
        requested: usize,
        /// The device's ceiling.
        max: usize,
    },
    /// A capability the caller relies on is not present on this device
    /// (e.g., 32-bit element indices).
    Unsupported(&'static str),
    /// An operation referenced a handle the backend does not know.
    InvalidHandle(&'static str),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::AllocationFailed(details) => {
                write!(f, "GPU resource allocation failed: {details}")
            }
            ResourceError::LimitExceeded {
                resource,
                requested,
                max,
            } => {
                write!(
                    f,
                    "Device limit exceeded for {resource}: requested {requested}, max {max}"
                )
            }
            ResourceError::Unsupported(what) => {
                write!(f, "Device does not support {what}")
            }
            ResourceError::InvalidHandle(what) => {
                write!(f, "Invalid {what} handle")
            }
        }
    }
}

impl std::error::Error for ResourceError {}

/// The severity of one shader compiler message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A hard error; compilation did not produce a module.
    Error,
    /// A warning; compilation may still have succeeded.
    Warning,
}

/// One structured entry of a shader compiler log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderDiagnostic {
    /// The message severity.
    pub kind: DiagnosticKind,
    /// 1-based source line, when the compiler reported one.
    pub line: Option<u32>,
    /// 1-based source column, when the compiler reported one.
    pub column: Option<u32>,
    /// The compiler's message text.
    pub message: String,
}

impl fmt::Display for ShaderDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            DiagnosticKind::Error => "error",
            DiagnosticKind::Warning => "warning",
        };
        match (self.line, self.column) {
            (Some(line), Some(column)) => write!(f, "{kind} at {line}:{column}: {}", self.message),
            (Some(line), None) => write!(f, "{kind} at line {line}: {}", self.message),
            _ => write!(f, "{kind}: {}", self.message),
        }
    }
}

/// An error related to shader program compilation or linking.
#[derive(Debug)]
pub enum ShaderError {
    /// The shader source failed to compile.
    CompilationError {
        /// A descriptive label for the shader, if available.
        label: String,
        /// The structured per-line compiler breakdown.
        diagnostics: Vec<ShaderDiagnostic>,
    },
    /// The compiled stages failed to link into a program.
    LinkError {
        /// A descriptive label for the program, if available.
        label: String,
        /// The linker's message.
        details: String,
    },
    /// The requested program could not be found.
    NotFound {
        /// The ID of the program that was not found.
        id: ProgramId,
    },
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::CompilationError { label, diagnostics } => {
                write!(f, "Shader compilation failed for '{label}':")?;
                for diagnostic in diagnostics {
                    write!(f, "\n  {diagnostic}")?;
                }
                Ok(())
            }
            ShaderError::LinkError { label, details } => {
                write!(f, "Program link failed for '{label}': {details}")
            }
            ShaderError::NotFound { id } => {
                write!(f, "Program not found for ID: {id:?}")
            }
        }
    }
}

impl std::error::Error for ShaderError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_exceeded_display() {
        let err = ResourceError::LimitExceeded {
            resource: "vertex attributes",
            requested: 17,
            max: 16,
        };
        let text = err.to_string();
        assert!(text.contains("vertex attributes"));
        assert!(text.contains("17"));
    }

    #[test]
    fn compilation_error_lists_diagnostics() {
        let err = ShaderError::CompilationError {
            label: "lit".into(),
            diagnostics: vec![ShaderDiagnostic {
                kind: DiagnosticKind::Error,
                line: Some(12),
                column: Some(4),
                message: "undeclared identifier".into(),
            }],
        };
        let text = err.to_string();
        assert!(text.contains("12:4"));
        assert!(text.contains("undeclared identifier"));
    }
}
