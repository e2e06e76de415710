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

//! GPU texture registry with content-based deduplication.
//!
//! SRV region slot 0 is always the 1x1 white fallback texture; every
//! material map that is absent resolves there. Real textures are
//! deduplicated by a 64-bit hash over their pixel bytes and extent, so two
//! scene entries with identical content share one upload and one SRV slot.

use crate::scene::TextureData;
use pyrite_core::gpu::{
    GpuDevice, ResourceError, TextureDescriptor, TextureFormat, TextureId, TextureUsage,
};
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// One resident texture and its slot within the SRV region.
#[derive(Debug, Clone)]
pub struct GpuTexture {
    /// Debug name (first scene entry that produced the content).
    pub name: String,
    /// The GPU texture.
    pub texture: TextureId,
    /// Slot index relative to the SRV region base.
    pub srv_index: u32,
}

/// Uploads scene textures and maps scene indices to SRV region slots.
#[derive(Debug)]
pub struct TextureRegistry {
    textures: Vec<GpuTexture>,
    /// Scene texture index -> SRV region slot.
    scene_to_srv: Vec<u32>,
}

fn content_hash(data: &TextureData) -> u64 {
    let mut hasher = DefaultHasher::new();
    data.width.hash(&mut hasher);
    data.height.hash(&mut hasher);
    data.pixels.hash(&mut hasher);
    hasher.finish()
}

impl TextureRegistry {
    /// Uploads the fallback texture and all deduplicated scene textures.
    ///
    /// Must run before the heap layout is sized: [`Self::num_unique`] is
    /// the layout's texture count.
    pub fn build(device: &dyn GpuDevice, scene: &[TextureData]) -> Result<Self, ResourceError> {
        let fallback = device.create_texture_2d(
            &TextureDescriptor {
                label: Some("fallback white 1x1".to_owned()),
                width: 1,
                height: 1,
                format: TextureFormat::Rgba8Unorm,
                usage: TextureUsage::ShaderResource,
            },
            Some(&[0xff, 0xff, 0xff, 0xff]),
        )?;
        let mut textures = vec![GpuTexture {
            name: "fallback white 1x1".to_owned(),
            texture: fallback,
            srv_index: 0,
        }];

        let mut by_hash: HashMap<u64, u32> = HashMap::new();
        let mut scene_to_srv = Vec::with_capacity(scene.len());
        for data in scene {
            let hash = content_hash(data);
            let slot = match by_hash.get(&hash) {
                Some(&slot) => {
                    log::debug!(
                        "Texture '{}' shares content with slot {slot}, skipping upload",
                        data.name
                    );
                    slot
                }
                None => {
                    let texture = device.create_texture_2d(
                        &TextureDescriptor {
                            label: Some(data.name.clone()),
                            width: data.width,
                            height: data.height,
                            format: TextureFormat::Rgba8Unorm,
                            usage: TextureUsage::ShaderResource,
                        },
                        Some(&data.pixels),
                    )?;
                    let slot = textures.len() as u32;
                    textures.push(GpuTexture {
                        name: data.name.clone(),
                        texture,
                        srv_index: slot,
                    });
                    by_hash.insert(hash, slot);
                    slot
                }
            };
            scene_to_srv.push(slot);
        }
        log::info!(
            "Texture registry: {} scene textures, {} unique uploads (+1 fallback)",
            scene.len(),
            textures.len() - 1
        );
        Ok(Self {
            textures,
            scene_to_srv,
        })
    }

    /// Number of unique resident textures, fallback included. This is the
    /// SRV region size.
    pub fn num_unique(&self) -> u32 {
        self.textures.len() as u32
    }

    /// All resident textures in slot order.
    pub fn textures(&self) -> &[GpuTexture] {
        &self.textures
    }

    /// Resolves an optional scene texture index to an SRV region slot,
    /// falling back to slot 0 when absent.
    pub fn resolve(&self, scene_index: Option<usize>) -> u32 {
        match scene_index {
            Some(index) => self.scene_to_srv[index],
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_content_hashes_equal() {
        let a = TextureData {
            name: "a".to_owned(),
            width: 2,
            height: 2,
            pixels: vec![1; 16],
        };
        let b = TextureData {
            name: "b (different name)".to_owned(),
            width: 2,
            height: 2,
            pixels: vec![1; 16],
        };
        assert_eq!(content_hash(&a), content_hash(&b));
    }

    #[test]
    fn extent_participates_in_hash() {
        // Same bytes reshaped is different content.
        let a = TextureData {
            name: "a".to_owned(),
            width: 4,
            height: 1,
            pixels: vec![1; 16],
        };
        let b = TextureData {
            name: "b".to_owned(),
            width: 1,
            height: 4,
            pixels: vec![1; 16],
        };
        assert_ne!(content_hash(&a), content_hash(&b));
    }
}
