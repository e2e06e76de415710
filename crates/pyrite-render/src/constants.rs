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

//! The exact byte layouts uploaded into the constant buffers.
//!
//! These mirror the cbuffer declarations in `assets/shaders/pbr.hlsl`;
//! matrices are column-major.

use bytemuck::{Pod, Zeroable};
use pyrite_core::math::{Mat4, Vec3};

/// Per-drawable constants (register `b0`).
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct PerObjectConstants {
    /// Local-to-world transform.
    pub world: [[f32; 4]; 4],
}

impl PerObjectConstants {
    /// Packs a world matrix.
    pub fn new(world: Mat4) -> Self {
        Self {
            world: world.to_cols_array_2d(),
        }
    }
}

/// Per-material constants (register `b1`).
///
/// One fixed layout serves both workflows; `workflow` selects the
/// interpretation in the shader. Packing is the only place the material
/// sum type is flattened, and it matches exhaustively.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct MaterialConstants {
    /// Base-color factor (metallic-roughness) or diffuse factor
    /// (specular-glossiness).
    pub color_factor: [f32; 4],
    /// Specular factor; unused by metallic-roughness.
    pub specular_factor: [f32; 3],
    /// 1 = metallic-roughness, 2 = specular-glossiness.
    pub workflow: u32,
    /// Metallic factor, or 0 for specular-glossiness.
    pub metallic_factor: f32,
    /// Roughness factor, or `1 - glossiness`.
    pub roughness_factor: f32,
    /// Emissive strength applied to the emissive factor.
    pub emissive_factor: f32,
    pub _padding: f32,
}

/// Per-pass constants (register `b2`).
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct PassConstants {
    /// World-to-view transform.
    pub view: [[f32; 4]; 4],
    /// View-to-clip transform.
    pub proj: [[f32; 4]; 4],
    /// Combined world-to-clip transform.
    pub view_proj: [[f32; 4]; 4],
    /// Camera position in world space.
    pub eye_pos: [f32; 3],
    /// Seconds since renderer start.
    pub time: f32,
}

impl PassConstants {
    /// Packs the pass block from view/projection matrices.
    pub fn new(view: Mat4, proj: Mat4, eye_pos: Vec3, time: f32) -> Self {
        Self {
            view: view.to_cols_array_2d(),
            proj: proj.to_cols_array_2d(),
            view_proj: (proj * view).to_cols_array_2d(),
            eye_pos: [eye_pos.x, eye_pos.y, eye_pos.z],
            time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_blocks_are_pod_sized() {
        // Sizes feed the 256-byte stride rounding; a silent field change
        // that crosses an alignment boundary should be caught loudly.
        assert_eq!(std::mem::size_of::<PerObjectConstants>(), 64);
        assert_eq!(std::mem::size_of::<MaterialConstants>(), 48);
        assert_eq!(std::mem::size_of::<PassConstants>(), 208);
    }
}
