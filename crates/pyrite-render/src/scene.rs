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

//! CPU-side scene description handed to the renderer at construction.
//!
//! These are plain value shapes produced by an external importer (or the
//! procedural generators below). The renderer consumes a [`SceneData`] by
//! value: once the GPU scene is built, its counts are frozen and the
//! descriptor heap layout cannot be invalidated by later mutation.

use crate::material::MaterialWorkflow;
use bytemuck::{Pod, Zeroable};
use pyrite_core::math::{Mat4, Vec2};

/// Errors produced while assembling or validating a scene.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// A primitive names a material index the scene does not contain.
    #[error("primitive references material {material} but scene has {count} materials")]
    UnknownMaterial {
        /// The out-of-range material index.
        material: usize,
        /// Number of materials in the scene.
        count: usize,
    },
    /// A primitive's index range exceeds its mesh's index buffer.
    #[error("primitive range [{start}, {start}+{count}) exceeds index buffer of {len}")]
    IndexRangeOutOfBounds {
        /// First index of the range.
        start: u32,
        /// Number of indices in the range.
        count: u32,
        /// Length of the mesh's index buffer.
        len: usize,
    },
    /// A material names a texture index the scene does not contain.
    #[error("material references texture {texture} but scene has {count} textures")]
    UnknownTexture {
        /// The out-of-range texture index.
        texture: usize,
        /// Number of textures in the scene.
        count: usize,
    },
    /// The scene contains no drawable geometry.
    #[error("scene contains no primitives")]
    Empty,
}

/// One vertex, laid out exactly as the vertex buffer stores it.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Object-space position.
    pub position: [f32; 3],
    /// Object-space normal.
    pub normal: [f32; 3],
    /// Object-space tangent.
    pub tangent: [f32; 3],
    /// UV coordinate.
    pub tex_coord: Vec2,
}

/// A contiguous run of indices drawn with one material and transform.
#[derive(Debug, Clone)]
pub struct PrimitiveRange {
    /// First index into the mesh's index buffer.
    pub start_index: u32,
    /// Number of indices to draw.
    pub index_count: u32,
    /// Value added to each index before vertex fetch.
    pub base_vertex: i32,
    /// Material index in [`SceneData::materials`], or `None` for the
    /// default material.
    pub material: Option<usize>,
    /// Local-to-world transform of this primitive.
    pub world: Mat4,
}

/// One mesh: shared vertex/index buffers plus the primitives drawn from
/// them.
#[derive(Debug, Clone)]
pub struct MeshData {
    /// Debug name.
    pub name: String,
    /// Vertex buffer contents.
    pub vertices: Vec<Vertex>,
    /// Index buffer contents.
    pub indices: Vec<u32>,
    /// Primitives drawn from the buffers. Each becomes one drawable.
    pub primitives: Vec<PrimitiveRange>,
}

/// A material as imported, with texture slots by scene texture index.
///
/// Any slot may be `None` — either the source had no map or its decode
/// failed upstream. Absent slots resolve to the shared fallback texture.
#[derive(Debug, Clone)]
pub struct MaterialDesc {
    /// Debug name.
    pub name: String,
    /// Shading workflow and its factors.
    pub workflow: MaterialWorkflow,
    /// Base-color (or diffuse) texture, as an index into
    /// [`SceneData::textures`].
    pub base_color_texture: Option<usize>,
    /// Metallic-roughness (or specular-glossiness) texture.
    pub metallic_roughness_texture: Option<usize>,
    /// Normal map.
    pub normal_texture: Option<usize>,
    /// Emissive map.
    pub emissive_texture: Option<usize>,
    /// Emissive strength.
    pub emissive_factor: f32,
}

/// Decoded texel data for one texture.
#[derive(Debug, Clone)]
pub struct TextureData {
    /// Debug name.
    pub name: String,
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Tightly packed RGBA8 texels, `width * height * 4` bytes.
    pub pixels: Vec<u8>,
}

/// Everything the renderer needs to build the GPU scene.
#[derive(Debug, Clone, Default)]
pub struct SceneData {
    /// Meshes, each contributing one drawable per primitive.
    pub meshes: Vec<MeshData>,
    /// Materials referenced by primitives.
    pub materials: Vec<MaterialDesc>,
    /// Decoded textures referenced by materials.
    pub textures: Vec<TextureData>,
}

impl Default for MaterialDesc {
    fn default() -> Self {
        Self {
            name: "default".to_owned(),
            workflow: MaterialWorkflow::default(),
            base_color_texture: None,
            metallic_roughness_texture: None,
            normal_texture: None,
            emissive_texture: None,
            emissive_factor: 0.0,
        }
    }
}

impl SceneData {
    /// Total number of drawables the scene will produce.
    pub fn num_drawables(&self) -> usize {
        self.meshes.iter().map(|m| m.primitives.len()).sum()
    }

    /// Checks cross-references before any GPU resource is sized from the
    /// counts.
    pub fn validate(&self) -> Result<(), SceneError> {
        if self.num_drawables() == 0 {
            return Err(SceneError::Empty);
        }
        for mesh in &self.meshes {
            for primitive in &mesh.primitives {
                let end = primitive.start_index as usize + primitive.index_count as usize;
                if end > mesh.indices.len() {
                    return Err(SceneError::IndexRangeOutOfBounds {
                        start: primitive.start_index,
                        count: primitive.index_count,
                        len: mesh.indices.len(),
                    });
                }
                if let Some(material) = primitive.material {
                    if material >= self.materials.len() {
                        return Err(SceneError::UnknownMaterial {
                            material,
                            count: self.materials.len(),
                        });
                    }
                }
            }
        }
        for material in &self.materials {
            for texture in [
                material.base_color_texture,
                material.metallic_roughness_texture,
                material.normal_texture,
                material.emissive_texture,
            ]
            .into_iter()
            .flatten()
            {
                if texture >= self.textures.len() {
                    return Err(SceneError::UnknownTexture {
                        texture,
                        count: self.textures.len(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Builds a unit cube mesh with one primitive covering all 36 indices.
pub fn cube(name: &str, world: Mat4, material: Option<usize>) -> MeshData {
    // 24 vertices, 4 per face, so each face gets a flat normal.
    let face = |normal: [f32; 3], tangent: [f32; 3], corners: [[f32; 3]; 4]| {
        [
            Vertex {
                position: corners[0],
                normal,
                tangent,
                tex_coord: Vec2::new(0.0, 1.0),
            },
            Vertex {
                position: corners[1],
                normal,
                tangent,
                tex_coord: Vec2::new(0.0, 0.0),
            },
            Vertex {
                position: corners[2],
                normal,
                tangent,
                tex_coord: Vec2::new(1.0, 0.0),
            },
            Vertex {
                position: corners[3],
                normal,
                tangent,
                tex_coord: Vec2::new(1.0, 1.0),
            },
        ]
    };
    let h = 0.5f32;
    let faces = [
        // +Z
        face(
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 0.0],
            [[-h, -h, h], [-h, h, h], [h, h, h], [h, -h, h]],
        ),
        // -Z
        face(
            [0.0, 0.0, -1.0],
            [-1.0, 0.0, 0.0],
            [[h, -h, -h], [h, h, -h], [-h, h, -h], [-h, -h, -h]],
        ),
        // +X
        face(
            [1.0, 0.0, 0.0],
            [0.0, 0.0, -1.0],
            [[h, -h, h], [h, h, h], [h, h, -h], [h, -h, -h]],
        ),
        // -X
        face(
            [-1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0],
            [[-h, -h, -h], [-h, h, -h], [-h, h, h], [-h, -h, h]],
        ),
        // +Y
        face(
            [0.0, 1.0, 0.0],
            [1.0, 0.0, 0.0],
            [[-h, h, h], [-h, h, -h], [h, h, -h], [h, h, h]],
        ),
        // -Y
        face(
            [0.0, -1.0, 0.0],
            [1.0, 0.0, 0.0],
            [[-h, -h, -h], [-h, -h, h], [h, -h, h], [h, -h, -h]],
        ),
    ];
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (i, quad) in faces.iter().enumerate() {
        let base = (i * 4) as u32;
        vertices.extend_from_slice(quad);
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    MeshData {
        name: name.to_owned(),
        vertices,
        indices,
        primitives: vec![PrimitiveRange {
            start_index: 0,
            index_count: 36,
            base_vertex: 0,
            material,
            world,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_has_full_triangle_list() {
        let mesh = cube("cube", Mat4::IDENTITY, None);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
        assert_eq!(mesh.primitives.len(), 1);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < 24));
    }

    #[test]
    fn validate_rejects_dangling_material() {
        let mut mesh = cube("cube", Mat4::IDENTITY, Some(2));
        mesh.primitives[0].material = Some(2);
        let scene = SceneData {
            meshes: vec![mesh],
            materials: vec![MaterialDesc::default()],
            textures: vec![],
        };
        assert!(matches!(
            scene.validate(),
            Err(SceneError::UnknownMaterial { material: 2, .. })
        ));
    }

    #[test]
    fn validate_rejects_overlong_index_range() {
        let mut mesh = cube("cube", Mat4::IDENTITY, None);
        mesh.primitives[0].index_count = 37;
        let scene = SceneData {
            meshes: vec![mesh],
            materials: vec![],
            textures: vec![],
        };
        assert!(matches!(
            scene.validate(),
            Err(SceneError::IndexRangeOutOfBounds { .. })
        ));
    }

    #[test]
    fn validate_rejects_empty_scene() {
        assert!(matches!(
            SceneData::default().validate(),
            Err(SceneError::Empty)
        ));
    }
}
