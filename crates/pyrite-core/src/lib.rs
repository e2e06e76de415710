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

//! # Pyrite Core
//!
//! Foundational crate containing the GPU capability traits, descriptor and
//! resource value types, the error hierarchy, and a small column-major math
//! module. Everything here is backend-agnostic: the D3D12 backend and the
//! renderer both depend on this crate, never on each other.

#![warn(missing_docs)]

pub mod gpu;
pub mod math;
pub mod platform;

pub use gpu::error::{DeviceError, RenderError, ResourceError, ShaderError};
