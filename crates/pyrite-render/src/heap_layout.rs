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

//! The four-region layout of the shared shader-visible descriptor heap.
//!
//! Regions in fixed order: per-object CBVs, per-material CBVs, per-pass
//! CBVs, then SRVs (slot 0 of the SRV region is the 1x1 white fallback
//! texture). Bases are computed once from the final scene counts; there is
//! deliberately no way to grow the layout afterwards — adding a drawable
//! after heap construction requires a rebuild.
//!
//! Every descriptor offset the renderer binds flows through this type.
//! Scattered ad hoc offset arithmetic is how heaps get silently corrupted.

/// A checked, heap-relative descriptor slot index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapOffset(pub u32);

/// Immutable region layout for one shared CBV/SRV/UAV heap.
#[derive(Debug, Clone)]
pub struct HeapLayout {
    num_frames: u32,
    num_objects: u32,
    num_materials: u32,
    num_textures: u32,
}

impl HeapLayout {
    /// Builds the layout from final counts. `num_textures` includes the
    /// fallback texture.
    pub fn new(num_frames: u32, num_objects: u32, num_materials: u32, num_textures: u32) -> Self {
        assert!(num_frames > 0, "at least one frame resource is required");
        assert!(num_textures > 0, "the fallback texture always exists");
        Self {
            num_frames,
            num_objects,
            num_materials,
            num_textures,
        }
    }

    /// First slot of the per-object CBV region (always 0).
    pub fn object_region_base(&self) -> u32 {
        0
    }

    /// First slot of the per-material CBV region.
    pub fn material_region_base(&self) -> u32 {
        self.num_objects * self.num_frames
    }

    /// First slot of the per-pass CBV region.
    pub fn pass_region_base(&self) -> u32 {
        self.material_region_base() + self.num_materials * self.num_frames
    }

    /// First slot of the SRV region.
    pub fn srv_region_base(&self) -> u32 {
        self.pass_region_base() + self.num_frames
    }

    /// Total number of slots the heap must hold.
    pub fn total_slots(&self) -> u32 {
        self.srv_region_base() + self.num_textures
    }

    /// Slot of object `object`'s CBV for frame resource `frame`.
    ///
    /// Frame-major: all of a frame's object CBVs are contiguous, so the
    /// per-drawable table offset during recording is
    /// `frame * num_objects + object`.
    pub fn object_cbv(&self, frame: u32, object: u32) -> HeapOffset {
        assert!(frame < self.num_frames, "frame index out of range");
        assert!(object < self.num_objects, "object index out of range");
        HeapOffset(frame * self.num_objects + object)
    }

    /// Slot of material `material`'s CBV for frame resource `frame`.
    pub fn material_cbv(&self, frame: u32, material: u32) -> HeapOffset {
        assert!(frame < self.num_frames, "frame index out of range");
        assert!(material < self.num_materials, "material index out of range");
        HeapOffset(self.material_region_base() + frame * self.num_materials + material)
    }

    /// Slot of the per-pass CBV for frame resource `frame`.
    pub fn pass_cbv(&self, frame: u32) -> HeapOffset {
        assert!(frame < self.num_frames, "frame index out of range");
        HeapOffset(self.pass_region_base() + frame)
    }

    /// Slot of SRV `texture` (0 is the fallback texture).
    pub fn srv(&self, texture: u32) -> HeapOffset {
        assert!(texture < self.num_textures, "texture index out of range");
        HeapOffset(self.srv_region_base() + texture)
    }

    /// The fallback texture's SRV slot.
    pub fn fallback_srv(&self) -> HeapOffset {
        self.srv(0)
    }

    /// Number of frame resources the layout was sized for.
    pub fn num_frames(&self) -> u32 {
        self.num_frames
    }

    /// Number of per-object slots per frame.
    pub fn num_objects(&self) -> u32 {
        self.num_objects
    }

    /// Number of per-material slots per frame.
    pub fn num_materials(&self) -> u32 {
        self.num_materials
    }

    /// Number of SRV slots, fallback included.
    pub fn num_textures(&self) -> u32 {
        self.num_textures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_bases_match_reference_layout() {
        // 10 drawables, 3 materials, 3 frames, 5 textures.
        let layout = HeapLayout::new(3, 10, 3, 5);
        assert_eq!(layout.object_region_base(), 0);
        assert_eq!(layout.material_region_base(), 30);
        assert_eq!(layout.pass_region_base(), 39);
        assert_eq!(layout.srv_region_base(), 42);
        assert_eq!(layout.total_slots(), 47);
    }

    #[test]
    fn regions_never_overlap() {
        for frames in 1..4u32 {
            for objects in 0..8u32 {
                for materials in 0..5u32 {
                    for textures in 1..6u32 {
                        let layout = HeapLayout::new(frames, objects, materials, textures);
                        let object_end = layout.object_region_base() + objects * frames;
                        assert!(object_end <= layout.material_region_base());
                        let material_end = layout.material_region_base() + materials * frames;
                        assert!(material_end <= layout.pass_region_base());
                        assert!(layout.pass_region_base() + frames <= layout.srv_region_base());
                        assert!(layout.srv_region_base() + textures <= layout.total_slots());
                    }
                }
            }
        }
    }

    #[test]
    fn object_slots_are_frame_major() {
        let layout = HeapLayout::new(3, 10, 3, 5);
        assert_eq!(layout.object_cbv(0, 0), HeapOffset(0));
        assert_eq!(layout.object_cbv(0, 9), HeapOffset(9));
        assert_eq!(layout.object_cbv(1, 0), HeapOffset(10));
        assert_eq!(layout.object_cbv(2, 9), HeapOffset(29));
    }

    #[test]
    fn pass_and_srv_slots() {
        let layout = HeapLayout::new(3, 10, 3, 5);
        assert_eq!(layout.pass_cbv(0), HeapOffset(39));
        assert_eq!(layout.pass_cbv(2), HeapOffset(41));
        assert_eq!(layout.fallback_srv(), HeapOffset(42));
        assert_eq!(layout.srv(4), HeapOffset(46));
    }

    #[test]
    #[should_panic(expected = "object index out of range")]
    fn out_of_range_object_is_rejected() {
        HeapLayout::new(3, 10, 3, 5).object_cbv(0, 10);
    }
}
