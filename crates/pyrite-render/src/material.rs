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

//! GPU-side materials and the shading workflow sum type.

use crate::constants::MaterialConstants;
use pyrite_core::math::Vec3;

/// Index of a material in the renderer's material arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialHandle(pub usize);

/// The two supported shading workflows with their scalar factors.
///
/// A closed sum: packing into [`MaterialConstants`] matches exhaustively,
/// so adding a workflow is a compile error at every site that must handle
/// it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaterialWorkflow {
    /// The glTF default workflow.
    MetallicRoughness {
        /// RGBA multiplier for the base-color map.
        base_color_factor: [f32; 4],
        /// Metalness in [0, 1].
        metallic_factor: f32,
        /// Perceptual roughness in [0, 1].
        roughness_factor: f32,
    },
    /// The KHR_materials_pbrSpecularGlossiness workflow.
    SpecularGlossiness {
        /// RGBA multiplier for the diffuse map.
        diffuse_factor: [f32; 4],
        /// Specular reflectance color.
        specular_factor: Vec3,
        /// Glossiness in [0, 1]; roughness is `1 - glossiness`.
        glossiness_factor: f32,
    },
}

impl Default for MaterialWorkflow {
    fn default() -> Self {
        Self::MetallicRoughness {
            base_color_factor: [1.0, 1.0, 1.0, 1.0],
            metallic_factor: 0.0,
            roughness_factor: 1.0,
        }
    }
}

/// A material resolved against the descriptor heap: its dense constant
/// slot plus the SRV slots of its four maps (absent maps point at the
/// fallback texture's slot).
#[derive(Debug, Clone)]
pub struct Material {
    /// Debug name.
    pub name: String,
    /// Shading workflow and factors.
    pub workflow: MaterialWorkflow,
    /// Dense index into each frame's per-material upload buffer, in
    /// `[0, num_materials)`.
    pub cb_index: u32,
    /// Heap-relative SRV slot of the base-color (or diffuse) map.
    pub base_color_srv: u32,
    /// Heap-relative SRV slot of the metallic-roughness (or
    /// specular-glossiness) map.
    pub metallic_roughness_srv: u32,
    /// Heap-relative SRV slot of the normal map.
    pub normal_srv: u32,
    /// Heap-relative SRV slot of the emissive map.
    pub emissive_srv: u32,
    /// Emissive strength folded into the constants.
    pub emissive_factor: f32,
    /// Copies of the constants not yet refreshed, one per frame resource.
    pub num_frames_dirty: u32,
}

impl Material {
    /// Flattens the workflow into the fixed constant-buffer layout.
    pub fn pack_constants(&self) -> MaterialConstants {
        match self.workflow {
            MaterialWorkflow::MetallicRoughness {
                base_color_factor,
                metallic_factor,
                roughness_factor,
            } => MaterialConstants {
                color_factor: base_color_factor,
                specular_factor: [0.0; 3],
                workflow: 1,
                metallic_factor,
                roughness_factor,
                emissive_factor: self.emissive_factor,
                _padding: 0.0,
            },
            MaterialWorkflow::SpecularGlossiness {
                diffuse_factor,
                specular_factor,
                glossiness_factor,
            } => MaterialConstants {
                color_factor: diffuse_factor,
                specular_factor: [specular_factor.x, specular_factor.y, specular_factor.z],
                workflow: 2,
                metallic_factor: 0.0,
                roughness_factor: 1.0 - glossiness_factor,
                emissive_factor: self.emissive_factor,
                _padding: 0.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn material(workflow: MaterialWorkflow) -> Material {
        Material {
            name: "test".to_owned(),
            workflow,
            cb_index: 0,
            base_color_srv: 0,
            metallic_roughness_srv: 0,
            normal_srv: 0,
            emissive_srv: 0,
            emissive_factor: 0.25,
            num_frames_dirty: 3,
        }
    }

    #[test]
    fn metallic_roughness_packs_workflow_one() {
        let constants = material(MaterialWorkflow::MetallicRoughness {
            base_color_factor: [0.5, 0.6, 0.7, 1.0],
            metallic_factor: 0.9,
            roughness_factor: 0.3,
        })
        .pack_constants();
        assert_eq!(constants.workflow, 1);
        assert_eq!(constants.color_factor, [0.5, 0.6, 0.7, 1.0]);
        assert_relative_eq!(constants.metallic_factor, 0.9);
        assert_relative_eq!(constants.roughness_factor, 0.3);
        assert_relative_eq!(constants.emissive_factor, 0.25);
    }

    #[test]
    fn specular_glossiness_inverts_glossiness() {
        let constants = material(MaterialWorkflow::SpecularGlossiness {
            diffuse_factor: [1.0; 4],
            specular_factor: Vec3::new(0.2, 0.3, 0.4),
            glossiness_factor: 0.8,
        })
        .pack_constants();
        assert_eq!(constants.workflow, 2);
        assert_eq!(constants.specular_factor, [0.2, 0.3, 0.4]);
        assert_relative_eq!(constants.roughness_factor, 0.2);
        assert_relative_eq!(constants.metallic_factor, 0.0);
    }
}
