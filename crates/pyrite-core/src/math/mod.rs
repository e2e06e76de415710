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

//! Small column-major linear-algebra module.
//!
//! Only the pieces the renderer actually needs: `Vec2`/`Vec3`/`Vec4`,
//! `Mat4`, and a linear-space color. Right-handed conventions with a
//! zero-to-one clip depth, matching the D3D12 rasterizer.

mod color;
mod matrix;
mod vector;

pub use color::LinearRgba;
pub use matrix::Mat4;
pub use vector::{Vec2, Vec3, Vec4};
