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

//! # Pyrite Render
//!
//! The frame-resource-pipelined renderer. The CPU builds frame K+1 while
//! the GPU consumes frame K; the two timelines are coupled only through the
//! queue fence. All descriptor-heap offset arithmetic lives in
//! [`heap_layout::HeapLayout`], and everything here is written against the
//! capability traits in `pyrite-core`, so the whole frame state machine is
//! testable with recording doubles.

pub mod config;
pub mod constants;
pub mod drawable;
pub mod frame;
pub mod heap_layout;
pub mod material;
pub mod mesh;
pub mod renderer;
pub mod scene;
pub mod texture;
pub mod upload;

pub use config::RendererConfig;
pub use renderer::{Renderer, ViewMatrices};
pub use scene::{SceneData, SceneError};
