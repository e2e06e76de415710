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

//! The renderer: owns the GPU scene and drives the frame pipeline.
//!
//! Construction consumes a [`SceneData`], finalizes the object, material
//! and texture counts, and sizes every frame resource and the shared
//! descriptor heap from them. There is no API for adding drawables
//! afterwards; a new scene means a new renderer.
//!
//! The per-frame contract is a single fence-gated wait: the CPU records
//! frame K+1 while the GPU consumes frame K, and blocks only when the slot
//! it is about to reuse is still in flight.

use crate::config::RendererConfig;
use crate::constants::{PassConstants, PerObjectConstants};
use crate::drawable::{DrawRange, Drawable};
use crate::frame::FrameResourceRing;
use crate::heap_layout::{HeapLayout, HeapOffset};
use crate::material::{Material, MaterialHandle};
use crate::mesh::{Mesh, MeshHandle};
use crate::scene::{MaterialDesc, SceneData};
use crate::texture::TextureRegistry;
use pyrite_core::gpu::{
    AddressMode, CullMode, DescriptorHeapDescriptor, DescriptorHeapId, DescriptorHeapKind,
    DescriptorRangeKind, DescriptorTable, FillMode, FilterMode, GpuDevice, HeapSlot,
    PipelineStateDescriptor, PipelineStateId, PrimitiveTopology, RenderError, ResourceState,
    RootSignatureDescriptor, RootSignatureId, ShaderModuleDescriptor, ShaderStage,
    StaticSamplerDescriptor, SwapChain, TextureDescriptor, TextureFormat, TextureId, TextureUsage,
    VertexAttribute, VertexFormat,
};
use pyrite_core::math::{Mat4, Vec3};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Camera matrices for the current pass.
#[derive(Debug, Clone, Copy)]
pub struct ViewMatrices {
    /// World-to-view transform.
    pub view: Mat4,
    /// View-to-clip transform.
    pub proj: Mat4,
    /// Camera position in world space.
    pub eye: Vec3,
}

impl Default for ViewMatrices {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY,
            proj: Mat4::IDENTITY,
            eye: Vec3::ZERO,
        }
    }
}

/// Root parameter indices, in declaration order of the root signature.
const PARAM_OBJECT_CBV: u32 = 0;
const PARAM_MATERIAL_CBV: u32 = 1;
const PARAM_PASS_CBV: u32 = 2;
const PARAM_BASE_COLOR_SRV: u32 = 3;
const PARAM_METALLIC_ROUGHNESS_SRV: u32 = 4;
const PARAM_NORMAL_SRV: u32 = 5;
const PARAM_EMISSIVE_SRV: u32 = 6;

/// The frame-pipelined forward renderer.
#[derive(Debug)]
pub struct Renderer {
    device: Arc<dyn GpuDevice>,
    swap_chain: Box<dyn SwapChain>,
    config: RendererConfig,

    meshes: Vec<Mesh>,
    materials: Vec<Material>,
    drawables: Vec<Drawable>,

    layout: HeapLayout,
    cbv_srv_heap: DescriptorHeapId,
    frames: FrameResourceRing,

    root_signature: RootSignatureId,
    pso_solid: PipelineStateId,
    pso_wireframe: PipelineStateId,

    depth_texture: TextureId,
    dsv_slot: HeapSlot,
    // One authoritative tracked state per physical resource; all barriers
    // flow through these.
    back_buffer_states: Vec<ResourceState>,
    depth_state: ResourceState,

    view: ViewMatrices,
    wireframe: bool,
    fence_counter: u64,
    start: Instant,
}

impl Renderer {
    /// Builds the whole GPU scene and pipeline from `scene`.
    ///
    /// Order matters: counts are finalized first, then frame resources and
    /// textures exist before the heap layout is sized, and every view is
    /// populated before the root signature and pipelines are created.
    pub fn new(
        device: Arc<dyn GpuDevice>,
        swap_chain: Box<dyn SwapChain>,
        config: RendererConfig,
        mut scene: SceneData,
        shader_dir: &Path,
    ) -> Result<Self, RenderError> {
        scene
            .validate()
            .map_err(|e| RenderError::InitializationFailed(e.to_string()))?;

        // Primitives without a material share one appended default.
        let default_material = if scene
            .meshes
            .iter()
            .flat_map(|m| &m.primitives)
            .any(|p| p.material.is_none())
        {
            scene.materials.push(MaterialDesc::default());
            Some(scene.materials.len() - 1)
        } else {
            None
        };

        let num_frames = config.num_frames_in_flight;

        // Load the scene shapes first; every count below is final once the
        // drawable list exists. One drawable per (mesh, material,
        // transform): consecutive primitives sharing all three coalesce
        // into a single drawable with several draw ranges, so they share
        // one per-object slot.
        let mut meshes = Vec::with_capacity(scene.meshes.len());
        let mut drawables: Vec<Drawable> = Vec::new();
        for mesh_data in &scene.meshes {
            let mesh_handle = MeshHandle(meshes.len());
            meshes.push(Mesh::upload(device.as_ref(), mesh_data)?);
            for primitive in &mesh_data.primitives {
                let material =
                    MaterialHandle(primitive.material.or(default_material).unwrap_or(0));
                let range = DrawRange {
                    index_count: primitive.index_count,
                    start_index: primitive.start_index,
                    base_vertex: primitive.base_vertex,
                };
                match drawables.last_mut() {
                    Some(last)
                        if last.mesh == mesh_handle
                            && last.material == material
                            && last.world == primitive.world =>
                    {
                        last.ranges.push(range);
                    }
                    _ => drawables.push(Drawable {
                        mesh: mesh_handle,
                        material,
                        ranges: vec![range],
                        per_object_cb_index: drawables.len() as u32,
                        world: primitive.world,
                        num_frames_dirty: num_frames as u32,
                    }),
                }
            }
        }
        let num_drawables = drawables.len() as u32;
        let num_materials = scene.materials.len() as u32;
        log::info!(
            "Building renderer: {num_drawables} drawables, {num_materials} materials, {} textures, {num_frames} frames in flight",
            scene.textures.len()
        );

        let frames =
            FrameResourceRing::new(device.as_ref(), num_frames, num_drawables, num_materials)?;

        let registry = TextureRegistry::build(device.as_ref(), &scene.textures)?;
        let layout = HeapLayout::new(
            num_frames as u32,
            num_drawables,
            num_materials,
            registry.num_unique(),
        );
        let cbv_srv_heap = device.create_descriptor_heap(&DescriptorHeapDescriptor {
            label: Some("scene cbv/srv heap".to_owned()),
            kind: DescriptorHeapKind::CbvSrvUav,
            capacity: layout.total_slots(),
            shader_visible: true,
        })?;
        log::info!(
            "Descriptor heap: {} slots (objects at 0, materials at {}, pass at {}, srvs at {})",
            layout.total_slots(),
            layout.material_region_base(),
            layout.pass_region_base(),
            layout.srv_region_base()
        );

        // Materials resolve their maps against the registry; absent maps
        // land on the fallback slot.
        let materials: Vec<Material> = scene
            .materials
            .iter()
            .enumerate()
            .map(|(i, desc)| Material {
                name: desc.name.clone(),
                workflow: desc.workflow,
                cb_index: i as u32,
                base_color_srv: registry.resolve(desc.base_color_texture),
                metallic_roughness_srv: registry.resolve(desc.metallic_roughness_texture),
                normal_srv: registry.resolve(desc.normal_texture),
                emissive_srv: registry.resolve(desc.emissive_texture),
                emissive_factor: desc.emissive_factor,
                num_frames_dirty: num_frames as u32,
            })
            .collect();

        // Populate every CBV and SRV slot of the shared heap.
        for frame in 0..num_frames as u32 {
            let fr = &frames.frames()[frame as usize];
            for object in 0..num_drawables {
                device.create_constant_buffer_view(
                    fr.per_object.buffer_id(),
                    fr.per_object.offset_of(object),
                    fr.per_object.stride() as u32,
                    HeapSlot {
                        heap: cbv_srv_heap,
                        index: layout.object_cbv(frame, object).0,
                    },
                )?;
            }
            for material in 0..num_materials {
                device.create_constant_buffer_view(
                    fr.per_material.buffer_id(),
                    fr.per_material.offset_of(material),
                    fr.per_material.stride() as u32,
                    HeapSlot {
                        heap: cbv_srv_heap,
                        index: layout.material_cbv(frame, material).0,
                    },
                )?;
            }
            device.create_constant_buffer_view(
                fr.per_pass.buffer_id(),
                0,
                fr.per_pass.stride() as u32,
                HeapSlot {
                    heap: cbv_srv_heap,
                    index: layout.pass_cbv(frame).0,
                },
            )?;
        }
        for texture in registry.textures() {
            device.create_shader_resource_view(
                texture.texture,
                HeapSlot {
                    heap: cbv_srv_heap,
                    index: layout.srv(texture.srv_index).0,
                },
            )?;
        }

        // Depth buffer sized to the swap chain, with its own one-slot heap.
        let (width, height) = swap_chain.extent();
        let depth_texture = device.create_texture_2d(
            &TextureDescriptor {
                label: Some("scene depth".to_owned()),
                width,
                height,
                format: TextureFormat::D32Float,
                usage: TextureUsage::DepthStencil,
            },
            None,
        )?;
        let dsv_heap = device.create_descriptor_heap(&DescriptorHeapDescriptor {
            label: Some("dsv heap".to_owned()),
            kind: DescriptorHeapKind::Dsv,
            capacity: 1,
            shader_visible: false,
        })?;
        let dsv_slot = HeapSlot {
            heap: dsv_heap,
            index: 0,
        };
        device.create_depth_stencil_view(depth_texture, dsv_slot)?;

        let vertex_shader = device.create_shader_module(&ShaderModuleDescriptor {
            label: "pbr vertex".to_owned(),
            path: shader_dir.join("pbr.hlsl"),
            entry_point: "vs_main".to_owned(),
            stage: ShaderStage::Vertex,
        })?;
        let pixel_shader = device.create_shader_module(&ShaderModuleDescriptor {
            label: "pbr pixel".to_owned(),
            path: shader_dir.join("pbr.hlsl"),
            entry_point: "ps_main".to_owned(),
            stage: ShaderStage::Pixel,
        })?;

        let root_signature = device.create_root_signature(&RootSignatureDescriptor {
            tables: vec![
                DescriptorTable {
                    kind: DescriptorRangeKind::Cbv,
                    count: 1,
                    base_register: 0,
                },
                DescriptorTable {
                    kind: DescriptorRangeKind::Cbv,
                    count: 1,
                    base_register: 1,
                },
                DescriptorTable {
                    kind: DescriptorRangeKind::Cbv,
                    count: 1,
                    base_register: 2,
                },
                DescriptorTable {
                    kind: DescriptorRangeKind::Srv,
                    count: 1,
                    base_register: 0,
                },
                DescriptorTable {
                    kind: DescriptorRangeKind::Srv,
                    count: 1,
                    base_register: 1,
                },
                DescriptorTable {
                    kind: DescriptorRangeKind::Srv,
                    count: 1,
                    base_register: 2,
                },
                DescriptorTable {
                    kind: DescriptorRangeKind::Srv,
                    count: 1,
                    base_register: 3,
                },
            ],
            static_samplers: vec![
                StaticSamplerDescriptor {
                    shader_register: 0,
                    filter: FilterMode::Linear,
                    address: AddressMode::Wrap,
                },
                StaticSamplerDescriptor {
                    shader_register: 1,
                    filter: FilterMode::Nearest,
                    address: AddressMode::Clamp,
                },
            ],
        })?;

        let input_layout = vec![
            VertexAttribute {
                semantic: "POSITION",
                format: VertexFormat::Float32x3,
                offset: 0,
            },
            VertexAttribute {
                semantic: "NORMAL",
                format: VertexFormat::Float32x3,
                offset: 12,
            },
            VertexAttribute {
                semantic: "TANGENT",
                format: VertexFormat::Float32x3,
                offset: 24,
            },
            VertexAttribute {
                semantic: "TEXCOORD",
                format: VertexFormat::Float32x2,
                offset: 36,
            },
        ];
        let pso_solid = device.create_pipeline_state(&PipelineStateDescriptor {
            label: Some("opaque solid".to_owned()),
            root_signature,
            vertex_shader,
            pixel_shader,
            input_layout: input_layout.clone(),
            fill_mode: FillMode::Solid,
            cull_mode: CullMode::Back,
            rtv_format: TextureFormat::Rgba8Unorm,
            dsv_format: TextureFormat::D32Float,
            topology: PrimitiveTopology::TriangleList,
        })?;
        let pso_wireframe = device.create_pipeline_state(&PipelineStateDescriptor {
            label: Some("opaque wireframe".to_owned()),
            root_signature,
            vertex_shader,
            pixel_shader,
            input_layout,
            fill_mode: FillMode::Wireframe,
            cull_mode: CullMode::None,
            rtv_format: TextureFormat::Rgba8Unorm,
            dsv_format: TextureFormat::D32Float,
            topology: PrimitiveTopology::TriangleList,
        })?;

        let back_buffer_states =
            vec![ResourceState::Present; swap_chain.back_buffer_count() as usize];
        let wireframe = config.wireframe;
        log::info!("Renderer ready");
        Ok(Self {
            device,
            swap_chain,
            config,
            meshes,
            materials,
            drawables,
            layout,
            cbv_srv_heap,
            frames,
            root_signature,
            pso_solid,
            pso_wireframe,
            depth_texture,
            dsv_slot,
            back_buffer_states,
            depth_state: ResourceState::Common,
            view: ViewMatrices::default(),
            wireframe,
            fence_counter: 0,
            start: Instant::now(),
        })
    }

    /// Number of drawables in the scene.
    pub fn num_drawables(&self) -> usize {
        self.drawables.len()
    }

    /// The drawables, for inspection.
    pub fn drawables(&self) -> &[Drawable] {
        &self.drawables
    }

    /// Replaces a drawable's transform. The new matrix reaches the GPU over
    /// the next N frames, one frame-resource copy at a time.
    pub fn set_world(&mut self, drawable: usize, world: Mat4) {
        let num_frames = self.frames.len() as u32;
        self.drawables[drawable].set_world(world, num_frames);
    }

    /// Sets the camera for subsequent frames.
    pub fn set_view(&mut self, view: ViewMatrices) {
        self.view = view;
    }

    /// Toggles wireframe rasterization from the next frame on.
    pub fn set_wireframe(&mut self, wireframe: bool) {
        self.wireframe = wireframe;
    }

    /// Records, submits and presents one frame.
    pub fn render(&mut self) -> Result<(), RenderError> {
        self.frames.advance();
        self.frames.wait_for_gpu(self.device.as_ref())?;
        self.update_frame_resources()?;
        self.record_and_submit()?;
        self.swap_chain.present()?;

        // Signal after present so the slot's stored value covers the whole
        // frame's queue work.
        self.fence_counter += 1;
        self.frames.current_mut().fence_value = self.fence_counter;
        self.device.signal_fence(self.fence_counter)?;
        Ok(())
    }

    /// Copies dirty constants into the active frame's private buffers.
    ///
    /// Dirty state is a countdown, not a flag: each of the N buffered
    /// copies of an object's constants must be refreshed independently, so
    /// a mutation arms the counter to N and each frame that consumes one
    /// copy decrements it.
    fn update_frame_resources(&mut self) -> Result<(), RenderError> {
        let frame = self.frames.current();
        for drawable in &mut self.drawables {
            if drawable.num_frames_dirty > 0 {
                let constants = PerObjectConstants::new(drawable.world);
                frame.per_object.copy_data(
                    self.device.as_ref(),
                    drawable.per_object_cb_index,
                    bytemuck::bytes_of(&constants),
                )?;
                drawable.num_frames_dirty -= 1;
            }
        }
        for material in &mut self.materials {
            if material.num_frames_dirty > 0 {
                let constants = material.pack_constants();
                frame.per_material.copy_data(
                    self.device.as_ref(),
                    material.cb_index,
                    bytemuck::bytes_of(&constants),
                )?;
                material.num_frames_dirty -= 1;
            }
        }
        let pass = PassConstants::new(
            self.view.view,
            self.view.proj,
            self.view.eye,
            self.start.elapsed().as_secs_f32(),
        );
        frame
            .per_pass
            .copy_data(self.device.as_ref(), 0, bytemuck::bytes_of(&pass))?;
        Ok(())
    }

    fn heap_slot(&self, offset: HeapOffset) -> HeapSlot {
        HeapSlot {
            heap: self.cbv_srv_heap,
            index: offset.0,
        }
    }

    fn record_and_submit(&mut self) -> Result<(), RenderError> {
        let frame_index = self.frames.current_index() as u32;
        let allocator = self.frames.current().allocator;
        let pso = if self.wireframe {
            self.pso_wireframe
        } else {
            self.pso_solid
        };
        let mut list = self.device.begin_command_list(allocator, Some(pso))?;

        let back = self.swap_chain.current_back_buffer_index();
        let back_texture = self.swap_chain.back_buffer(back);
        list.transition(
            back_texture,
            &mut self.back_buffer_states[back as usize],
            ResourceState::RenderTarget,
        );
        // First frame only; a no-op once the depth buffer is in place.
        list.transition(
            self.depth_texture,
            &mut self.depth_state,
            ResourceState::DepthWrite,
        );

        let (width, height) = self.swap_chain.extent();
        list.set_viewport_scissor(width, height);
        let rtv = self.swap_chain.back_buffer_rtv(back);
        list.clear_render_target(rtv, self.config.clear_color);
        list.clear_depth_stencil(self.dsv_slot, 1.0, 0);
        list.set_render_targets(rtv, self.dsv_slot);

        list.set_descriptor_heap(self.cbv_srv_heap);
        list.set_root_signature(self.root_signature);
        list.set_root_descriptor_table(
            PARAM_PASS_CBV,
            self.heap_slot(self.layout.pass_cbv(frame_index)),
        );
        list.set_primitive_topology(PrimitiveTopology::TriangleList);

        self.render_opaques(list.as_mut(), frame_index);

        list.transition(
            back_texture,
            &mut self.back_buffer_states[back as usize],
            ResourceState::Present,
        );
        self.device.submit(list)?;
        Ok(())
    }

    /// Binds and draws every drawable against frame `frame_index`'s
    /// descriptor regions.
    fn render_opaques(
        &self,
        list: &mut dyn pyrite_core::gpu::CommandList,
        frame_index: u32,
    ) {
        for drawable in &self.drawables {
            let mesh = &self.meshes[drawable.mesh.0];
            list.set_vertex_buffer(mesh.vertex_buffer, mesh.vertex_buffer_size, mesh.vertex_stride);
            list.set_index_buffer(mesh.index_buffer, mesh.index_buffer_size, mesh.index_format);

            list.set_root_descriptor_table(
                PARAM_OBJECT_CBV,
                self.heap_slot(self.layout.object_cbv(frame_index, drawable.per_object_cb_index)),
            );
            let material = &self.materials[drawable.material.0];
            list.set_root_descriptor_table(
                PARAM_MATERIAL_CBV,
                self.heap_slot(self.layout.material_cbv(frame_index, material.cb_index)),
            );
            list.set_root_descriptor_table(
                PARAM_BASE_COLOR_SRV,
                self.heap_slot(self.layout.srv(material.base_color_srv)),
            );
            list.set_root_descriptor_table(
                PARAM_METALLIC_ROUGHNESS_SRV,
                self.heap_slot(self.layout.srv(material.metallic_roughness_srv)),
            );
            list.set_root_descriptor_table(
                PARAM_NORMAL_SRV,
                self.heap_slot(self.layout.srv(material.normal_srv)),
            );
            list.set_root_descriptor_table(
                PARAM_EMISSIVE_SRV,
                self.heap_slot(self.layout.srv(material.emissive_srv)),
            );

            for range in &drawable.ranges {
                list.draw_indexed(range.index_count, range.start_index, range.base_vertex);
            }
        }
    }
}
