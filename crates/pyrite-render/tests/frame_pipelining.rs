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

//! Frame-resource ring behavior against the recording device: rotation,
//! dirty-counter propagation, and fence-gated slot reuse.

mod common;

use common::{Command, MockGpuDevice, MockSwapChain};
use pyrite_core::gpu::GpuDevice;
use pyrite_core::math::{Mat4, Vec3};
use pyrite_render::scene::{cube, SceneData};
use pyrite_render::{Renderer, RendererConfig};
use std::path::Path;
use std::sync::Arc;

fn cube_scene() -> SceneData {
    SceneData {
        meshes: vec![cube("cube", Mat4::IDENTITY, None)],
        materials: vec![],
        textures: vec![],
    }
}

fn build(device: &Arc<MockGpuDevice>, num_frames: usize) -> Renderer {
    Renderer::new(
        Arc::clone(device) as Arc<dyn GpuDevice>,
        Box::new(MockSwapChain::new()),
        RendererConfig {
            num_frames_in_flight: num_frames,
            ..RendererConfig::default()
        },
        cube_scene(),
        Path::new("assets/shaders"),
    )
    .expect("renderer construction against the mock device")
}

#[test]
fn ring_rotates_through_allocators_cyclically() {
    let device = Arc::new(MockGpuDevice::new());
    let mut renderer = build(&device, 3);
    for _ in 0..7 {
        renderer.render().unwrap();
    }

    let allocators: Vec<_> = device
        .recorded()
        .iter()
        .filter_map(|c| match c {
            Command::Begin { allocator, .. } => Some(*allocator),
            _ => None,
        })
        .collect();
    assert_eq!(allocators.len(), 7);
    // Three distinct allocators, revisited with period three.
    assert_eq!(
        allocators
            .iter()
            .collect::<std::collections::HashSet<_>>()
            .len(),
        3
    );
    for k in 0..4 {
        assert_eq!(allocators[k], allocators[k + 3], "frame {k} vs {}", k + 3);
    }
}

#[test]
fn dirty_counter_counts_down_once_per_frame() {
    let device = Arc::new(MockGpuDevice::new());
    let mut renderer = build(&device, 3);
    assert_eq!(renderer.drawables()[0].num_frames_dirty, 3);

    for expected in [2, 1, 0, 0, 0] {
        renderer.render().unwrap();
        assert_eq!(renderer.drawables()[0].num_frames_dirty, expected);
    }

    // A transform mutation re-arms the counter to N.
    renderer.set_world(0, Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0)));
    assert_eq!(renderer.drawables()[0].num_frames_dirty, 3);
    renderer.render().unwrap();
    assert_eq!(renderer.drawables()[0].num_frames_dirty, 2);
}

#[test]
fn clean_objects_stop_writing_constants() {
    let device = Arc::new(MockGpuDevice::new());
    let mut renderer = build(&device, 2);
    for _ in 0..5 {
        renderer.render().unwrap();
    }
    // Per-frame writes: the pass block always, the object block only while
    // dirty. 5 frames, 2 dirty frames -> 5 pass writes + 2 object writes
    // (+ 2 material writes).
    assert_eq!(device.upload_writes().len(), 5 + 2 + 2);
}

#[test]
fn slot_reuse_waits_for_lagging_gpu() {
    // A GPU that only completes work when the CPU blocks on it. The mock
    // panics if an allocator is reset while its submission is in flight.
    let device = Arc::new(MockGpuDevice::with_gpu_lag(u64::MAX));
    let mut renderer = build(&device, 2);
    for _ in 0..8 {
        renderer.render().unwrap();
    }

    // Frames 3..8 reuse slots whose work the GPU had not retired, so each
    // must have blocked on the slot's stored fence value.
    assert_eq!(device.fence_waits(), vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn instant_gpu_never_blocks() {
    let device = Arc::new(MockGpuDevice::new());
    let mut renderer = build(&device, 2);
    for _ in 0..8 {
        renderer.render().unwrap();
    }
    assert!(device.fence_waits().is_empty());
}
