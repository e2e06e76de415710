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

//! Drawables: the unit of per-object constants and draw submission.

use crate::material::MaterialHandle;
use crate::mesh::MeshHandle;
use pyrite_core::math::Mat4;

/// One indexed draw within a drawable's mesh.
#[derive(Debug, Clone, Copy)]
pub struct DrawRange {
    /// Number of indices.
    pub index_count: u32,
    /// First index into the mesh's index buffer.
    pub start_index: u32,
    /// Value added to each index before vertex fetch.
    pub base_vertex: i32,
}

/// A renderable instance: a mesh region, a material, a transform, and a
/// dense slot in every frame's per-object constant buffer.
///
/// Handles are arena indices into the renderer's mesh and material vectors;
/// drawables never hold references into them.
#[derive(Debug, Clone)]
pub struct Drawable {
    /// Mesh the ranges index into.
    pub mesh: MeshHandle,
    /// Material bound for every range.
    pub material: MaterialHandle,
    /// Draw ranges, issued in order. Usually one; several when the source
    /// primitive was split.
    pub ranges: Vec<DrawRange>,
    /// Dense index into each frame's per-object upload buffer, in
    /// `[0, num_drawables)`.
    pub per_object_cb_index: u32,
    /// Local-to-world transform.
    pub world: Mat4,
    /// Copies of the world matrix not yet refreshed, one per frame
    /// resource.
    pub num_frames_dirty: u32,
}

impl Drawable {
    /// Replaces the transform and marks every frame copy stale.
    pub fn set_world(&mut self, world: Mat4, num_frames: u32) {
        self.world = world;
        self.num_frames_dirty = num_frames;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyrite_core::math::Vec3;

    #[test]
    fn set_world_rearms_dirty_counter() {
        let mut drawable = Drawable {
            mesh: MeshHandle(0),
            material: MaterialHandle(0),
            ranges: vec![DrawRange {
                index_count: 36,
                start_index: 0,
                base_vertex: 0,
            }],
            per_object_cb_index: 0,
            world: Mat4::IDENTITY,
            num_frames_dirty: 0,
        };
        drawable.set_world(Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)), 3);
        assert_eq!(drawable.num_frames_dirty, 3);
    }
}
