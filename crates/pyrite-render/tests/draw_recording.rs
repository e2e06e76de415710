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

//! Command-stream assertions: draw order, descriptor table offsets,
//! fallback texture binding, and barrier hygiene.

mod common;

use common::{Command, MockGpuDevice, MockSwapChain};
use pyrite_core::gpu::{GpuDevice, ResourceState};
use pyrite_core::math::{Mat4, Vec2};
use pyrite_render::material::MaterialWorkflow;
use pyrite_render::scene::{MaterialDesc, MeshData, PrimitiveRange, SceneData, TextureData, Vertex};
use pyrite_render::{Renderer, RendererConfig};
use std::path::Path;
use std::sync::Arc;

fn flat_vertex() -> Vertex {
    Vertex {
        position: [0.0; 3],
        normal: [0.0, 1.0, 0.0],
        tangent: [1.0, 0.0, 0.0],
        tex_coord: Vec2::ZERO,
    }
}

/// A mesh whose index buffer is drawn as two separate primitive ranges.
fn split_mesh() -> MeshData {
    MeshData {
        name: "split".to_owned(),
        vertices: vec![flat_vertex(); 4],
        indices: vec![0; 450],
        primitives: vec![
            PrimitiveRange {
                start_index: 0,
                index_count: 300,
                base_vertex: 0,
                material: None,
                world: Mat4::IDENTITY,
            },
            PrimitiveRange {
                start_index: 300,
                index_count: 150,
                base_vertex: 200,
                material: None,
                world: Mat4::IDENTITY,
            },
        ],
    }
}

fn build(device: &Arc<MockGpuDevice>, scene: SceneData, num_frames: usize) -> Renderer {
    Renderer::new(
        Arc::clone(device) as Arc<dyn GpuDevice>,
        Box::new(MockSwapChain::new()),
        RendererConfig {
            num_frames_in_flight: num_frames,
            ..RendererConfig::default()
        },
        scene,
        Path::new("assets/shaders"),
    )
    .expect("renderer construction against the mock device")
}

#[test]
fn split_primitives_draw_in_range_order() {
    let device = Arc::new(MockGpuDevice::new());
    let scene = SceneData {
        meshes: vec![split_mesh()],
        materials: vec![],
        textures: vec![],
    };
    let mut renderer = build(&device, scene, 1);
    // Two primitives, same material and transform: one drawable.
    assert_eq!(renderer.num_drawables(), 1);
    renderer.render().unwrap();

    let commands = device.recorded();
    let draws: Vec<_> = commands
        .iter()
        .filter_map(|c| match c {
            Command::DrawIndexed {
                index_count,
                start_index,
                base_vertex,
            } => Some((*index_count, *start_index, *base_vertex)),
            _ => None,
        })
        .collect();
    assert_eq!(draws, vec![(300, 0, 0), (150, 300, 200)]);

    // With one frame resource and one drawable, the per-object table for
    // both draws is heap offset 0.
    let object_table = commands
        .iter()
        .find_map(|c| match c {
            Command::SetRootTable { parameter: 0, slot } => Some(slot.index),
            _ => None,
        })
        .expect("per-object table bound");
    assert_eq!(object_table, 0);
}

#[test]
fn absent_maps_bind_the_fallback_srv() {
    let device = Arc::new(MockGpuDevice::new());
    // One real texture, referenced only as a normal map; every other slot
    // is absent.
    let mut mesh = split_mesh();
    for primitive in &mut mesh.primitives {
        primitive.material = Some(0);
    }
    let scene = SceneData {
        meshes: vec![mesh],
        materials: vec![MaterialDesc {
            name: "untextured".to_owned(),
            workflow: MaterialWorkflow::default(),
            base_color_texture: None,
            metallic_roughness_texture: None,
            normal_texture: Some(0),
            emissive_texture: None,
            emissive_factor: 0.0,
        }],
        textures: vec![TextureData {
            name: "normals".to_owned(),
            width: 2,
            height: 2,
            pixels: vec![127; 16],
        }],
    };
    let mut renderer = build(&device, scene, 1);
    renderer.render().unwrap();

    // Layout: 1 object slot, 1 material slot, 1 pass slot, then SRVs with
    // the fallback first. SRV region base is therefore 3.
    let srv_binds: Vec<(u32, u32)> = device
        .recorded()
        .iter()
        .filter_map(|c| match c {
            Command::SetRootTable { parameter, slot } if *parameter >= 3 => {
                Some((*parameter, slot.index))
            }
            _ => None,
        })
        .collect();
    // Base color, metallic-roughness and emissive fall back to the region
    // base; the normal map gets the next slot.
    assert_eq!(srv_binds, vec![(3, 3), (4, 3), (5, 4), (6, 3)]);
}

#[test]
fn emissive_map_binds_its_own_srv_slot() {
    let device = Arc::new(MockGpuDevice::new());
    let mut mesh = split_mesh();
    for primitive in &mut mesh.primitives {
        primitive.material = Some(0);
    }
    let scene = SceneData {
        meshes: vec![mesh],
        materials: vec![MaterialDesc {
            name: "glowing".to_owned(),
            workflow: MaterialWorkflow::default(),
            base_color_texture: None,
            metallic_roughness_texture: None,
            normal_texture: None,
            emissive_texture: Some(0),
            emissive_factor: 1.0,
        }],
        textures: vec![TextureData {
            name: "glow".to_owned(),
            width: 2,
            height: 2,
            pixels: vec![255; 16],
        }],
    };
    let mut renderer = build(&device, scene, 1);
    renderer.render().unwrap();

    // Same layout as above: SRV region base 3 is the fallback, the real
    // emissive map lands on slot 4 and only parameter 6 points at it.
    let srv_binds: Vec<(u32, u32)> = device
        .recorded()
        .iter()
        .filter_map(|c| match c {
            Command::SetRootTable { parameter, slot } if *parameter >= 3 => {
                Some((*parameter, slot.index))
            }
            _ => None,
        })
        .collect();
    assert_eq!(srv_binds, vec![(3, 3), (4, 3), (5, 3), (6, 4)]);
}

#[test]
fn back_buffer_round_trips_present_state() {
    let device = Arc::new(MockGpuDevice::new());
    let scene = SceneData {
        meshes: vec![split_mesh()],
        materials: vec![],
        textures: vec![],
    };
    let mut renderer = build(&device, scene, 1);
    renderer.render().unwrap();

    let transitions = |device: &MockGpuDevice| -> Vec<(ResourceState, ResourceState)> {
        device
            .recorded()
            .iter()
            .filter_map(|c| match c {
                Command::Transition { before, after, .. } => Some((*before, *after)),
                _ => None,
            })
            .collect()
    };
    assert_eq!(
        transitions(&device),
        vec![
            (ResourceState::Present, ResourceState::RenderTarget),
            (ResourceState::Common, ResourceState::DepthWrite),
            (ResourceState::RenderTarget, ResourceState::Present),
        ]
    );

    // The depth transition is one-time; the second frame only flips the
    // back buffer, so exactly two more barriers appear.
    renderer.render().unwrap();
    assert_eq!(transitions(&device).len(), 5);
}

#[test]
fn pass_table_follows_the_active_frame() {
    let device = Arc::new(MockGpuDevice::new());
    let scene = SceneData {
        meshes: vec![split_mesh()],
        materials: vec![],
        textures: vec![],
    };
    let mut renderer = build(&device, scene, 3);
    for _ in 0..3 {
        renderer.render().unwrap();
    }

    // Layout with 3 frames, 1 drawable, 1 material: objects [0,3),
    // materials [3,6), pass [6,9). The ring advances before recording, so
    // the pass slots visit frames 1, 2, 0.
    let pass_slots: Vec<u32> = device
        .recorded()
        .iter()
        .filter_map(|c| match c {
            Command::SetRootTable { parameter: 2, slot } => Some(slot.index),
            _ => None,
        })
        .collect();
    assert_eq!(pass_slots, vec![7, 8, 6]);
}

#[test]
fn wireframe_toggle_switches_initial_pipeline() {
    let device = Arc::new(MockGpuDevice::new());
    let scene = SceneData {
        meshes: vec![split_mesh()],
        materials: vec![],
        textures: vec![],
    };
    let mut renderer = build(&device, scene, 1);
    renderer.render().unwrap();
    renderer.set_wireframe(true);
    renderer.render().unwrap();

    let pipelines: Vec<_> = device
        .recorded()
        .iter()
        .filter_map(|c| match c {
            Command::Begin { pipeline, .. } => Some(pipeline.expect("initial pipeline set")),
            _ => None,
        })
        .collect();
    assert_eq!(pipelines.len(), 2);
    assert_ne!(pipelines[0], pipelines[1]);
}
