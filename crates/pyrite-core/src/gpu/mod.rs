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

//! Backend-agnostic GPU layer.
//!
//! The capability traits in [`traits`] model a D3D12-class API surface:
//! explicit command allocators, a single direct queue with a monotonically
//! increasing fence, descriptor heaps addressed by integer slot, and
//! explicit resource state transitions. Backends implement the traits; the
//! renderer drives them and owns all descriptor-slot arithmetic.

pub mod error;
pub mod resource;
pub mod traits;

pub use error::*;
pub use resource::*;
pub use traits::*;

/// The hardware alignment granularity for constant buffer data, in bytes.
pub const CONSTANT_BUFFER_ALIGNMENT: u64 = 256;
