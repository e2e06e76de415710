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

//! # Pyrite DX12
//!
//! Direct3D 12 implementation of the `pyrite-core` capability traits,
//! built on `winapi`/`wio`. Windows only; on other targets the crate
//! compiles to nothing so the workspace (and the renderer's test suite)
//! stays buildable everywhere.

#[cfg(windows)]
mod convert;
#[cfg(windows)]
mod device;
#[cfg(windows)]
mod list;
#[cfg(windows)]
mod swap_chain;

#[cfg(windows)]
pub use device::Dx12Device;
#[cfg(windows)]
pub use swap_chain::Dx12SwapChain;
