// Copyright 2025 the Pyrite authors
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

//! Defines the hierarchy of error types for the GPU subsystem.

use std::fmt;

/// An error related to the creation, loading, or compilation of a shader.
#[derive(Debug)]
pub enum ShaderError {
    /// The shader source could not be loaded from disk.
    LoadError {
        /// The path of the file that failed to load.
        path: String,
        /// The underlying I/O error, stringified.
        source_error: String,
    },
    /// The shader source failed to compile to bytecode.
    CompilationError {
        /// A descriptive label for the shader.
        label: String,
        /// The compiler's diagnostic text.
        details: String,
    },
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::LoadError { path, source_error } => {
                write!(
                    f,
                    "Failed to load shader source from '{path}': {source_error}"
                )
            }
            ShaderError::CompilationError { label, details } => {
                write!(f, "Shader compilation failed for '{label}': {details}")
            }
        }
    }
}

impl std::error::Error for ShaderError {}

/// A fatal error from the graphics device or its factories.
///
/// Device-level failures carry no recovery path: the only retry-like
/// behavior in the system is the backend's fallback from a hardware adapter
/// to the software (WARP) adapter during device creation.
#[derive(Debug)]
pub enum DeviceError {
    /// No usable adapter could be opened, hardware or software.
    CreationFailed(String),
    /// A GPU object factory call failed.
    ObjectCreationFailed {
        /// What was being created (e.g. "command queue").
        what: &'static str,
        /// Backend-specific detail, typically a stringified HRESULT.
        details: String,
    },
    /// A command submission or queue operation failed.
    SubmissionFailed(String),
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::CreationFailed(msg) => {
                write!(f, "Failed to create graphics device: {msg}")
            }
            DeviceError::ObjectCreationFailed { what, details } => {
                write!(f, "Failed to create {what}: {details}")
            }
            DeviceError::SubmissionFailed(msg) => {
                write!(f, "Command submission failed: {msg}")
            }
        }
    }
}

impl std::error::Error for DeviceError {}

/// An error related to the creation or use of a GPU resource.
#[derive(Debug)]
pub enum ResourceError {
    /// A shader-specific error occurred.
    Shader(ShaderError),
    /// The handle used to reference a resource is not live.
    InvalidHandle,
    /// An access landed outside the resource's bounds.
    OutOfBounds,
    /// An error originating from the backend implementation.
    BackendError(String),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::Shader(err) => write!(f, "Shader resource error: {err}"),
            ResourceError::InvalidHandle => write!(f, "Invalid resource handle or ID."),
            ResourceError::OutOfBounds => write!(f, "Resource access out of bounds."),
            ResourceError::BackendError(msg) => {
                write!(f, "Backend-specific resource error: {msg}")
            }
        }
    }
}

impl std::error::Error for ResourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResourceError::Shader(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ShaderError> for ResourceError {
    fn from(err: ShaderError) -> Self {
        ResourceError::Shader(err)
    }
}

/// A high-level error from the renderer or graphics device.
#[derive(Debug)]
pub enum RenderError {
    /// A failure occurred while bringing up the backend.
    InitializationFailed(String),
    /// A critical, unrecoverable rendering operation failed.
    RenderingFailed(String),
    /// An error occurred while managing a GPU resource.
    Resource(ResourceError),
    /// A device-level failure.
    Device(DeviceError),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::InitializationFailed(msg) => {
                write!(f, "Failed to initialize renderer: {msg}")
            }
            RenderError::RenderingFailed(msg) => {
                write!(f, "A critical rendering operation failed: {msg}")
            }
            RenderError::Resource(err) => {
                write!(f, "Graphics resource operation failed: {err}")
            }
            RenderError::Device(err) => write!(f, "Graphics device failure: {err}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Resource(err) => Some(err),
            RenderError::Device(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ResourceError> for RenderError {
    fn from(err: ResourceError) -> Self {
        RenderError::Resource(err)
    }
}

impl From<DeviceError> for RenderError {
    fn from(err: DeviceError) -> Self {
        RenderError::Device(err)
    }
}

impl From<ShaderError> for RenderError {
    fn from(err: ShaderError) -> Self {
        RenderError::Resource(ResourceError::Shader(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn shader_error_display() {
        let err = ShaderError::CompilationError {
            label: "pbr_vs".to_string(),
            details: "unexpected token at line 12".to_string(),
        };
        assert_eq!(
            format!("{err}"),
            "Shader compilation failed for 'pbr_vs': unexpected token at line 12"
        );
    }

    #[test]
    fn render_error_chains_sources() {
        let err: RenderError = ShaderError::LoadError {
            path: "assets/shaders/pbr.hlsl".to_string(),
            source_error: "No such file".to_string(),
        }
        .into();
        assert!(err.source().is_some());
        assert!(err.source().unwrap().source().is_some());
    }
}
