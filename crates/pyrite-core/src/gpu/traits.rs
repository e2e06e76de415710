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

//! Capability traits implemented by graphics backends.
//!
//! The renderer is written against these traits only, which keeps the frame
//! pipelining and descriptor arithmetic testable with recording doubles.
//! The design deliberately mirrors D3D12's ownership model: one direct
//! queue per device, one fence on that queue, explicit command allocators,
//! and a shared command list that is reset against a chosen allocator each
//! frame.

use crate::gpu::error::{DeviceError, ResourceError, ShaderError};
use crate::gpu::resource::*;
use crate::math::LinearRgba;
use std::any::Any;
use std::fmt::Debug;

/// The graphics device: resource factories plus the direct queue and its
/// fence.
///
/// All methods take `&self`; implementations guard their interior tables.
/// Submission itself is single-threaded by design — the engine records on
/// one logical thread, and nothing here makes concurrent recording safe.
pub trait GpuDevice: Send + Sync + Debug {
    /// Creates a command allocator for one frame resource.
    fn create_command_allocator(
        &self,
        label: Option<&str>,
    ) -> Result<CommandAllocatorId, DeviceError>;

    /// Creates a descriptor heap.
    fn create_descriptor_heap(
        &self,
        descriptor: &DescriptorHeapDescriptor,
    ) -> Result<DescriptorHeapId, DeviceError>;

    /// Creates a persistently mapped upload-heap buffer of `size` bytes.
    ///
    /// The mapping lives as long as the buffer; writes go through
    /// [`GpuDevice::write_upload_buffer`]. Nothing here prevents a write
    /// from racing in-flight GPU reads — the frame-resource fence gate is
    /// the caller's responsibility.
    fn create_upload_buffer(&self, label: Option<&str>, size: u64)
        -> Result<BufferId, ResourceError>;

    /// Copies `data` into an upload buffer at `offset`.
    fn write_upload_buffer(
        &self,
        buffer: BufferId,
        offset: u64,
        data: &[u8],
    ) -> Result<(), ResourceError>;

    /// Creates a default-heap buffer initialized with `data`, staged
    /// through an intermediate upload buffer and transitioned to
    /// `final_state`.
    fn create_buffer_with_data(
        &self,
        label: Option<&str>,
        data: &[u8],
        final_state: ResourceState,
    ) -> Result<BufferId, ResourceError>;

    /// Creates a 2D texture, optionally uploading initial texel data.
    fn create_texture_2d(
        &self,
        descriptor: &TextureDescriptor,
        pixels: Option<&[u8]>,
    ) -> Result<TextureId, ResourceError>;

    /// Writes a constant buffer view covering `[offset, offset + size)` of
    /// `buffer` into the given heap slot. `size` must already be 256-byte
    /// aligned.
    fn create_constant_buffer_view(
        &self,
        buffer: BufferId,
        offset: u64,
        size: u32,
        slot: HeapSlot,
    ) -> Result<(), ResourceError>;

    /// Writes a shader resource view for `texture` into the given heap slot.
    fn create_shader_resource_view(
        &self,
        texture: TextureId,
        slot: HeapSlot,
    ) -> Result<(), ResourceError>;

    /// Writes a render target view for `texture` into the given heap slot.
    fn create_render_target_view(
        &self,
        texture: TextureId,
        slot: HeapSlot,
    ) -> Result<(), ResourceError>;

    /// Writes a depth-stencil view for `texture` into the given heap slot.
    fn create_depth_stencil_view(
        &self,
        texture: TextureId,
        slot: HeapSlot,
    ) -> Result<(), ResourceError>;

    /// Loads and compiles a shader to bytecode.
    ///
    /// Compiler diagnostics are logged before the error is returned.
    fn create_shader_module(
        &self,
        descriptor: &ShaderModuleDescriptor,
    ) -> Result<ShaderModuleId, ShaderError>;

    /// Creates a root signature.
    fn create_root_signature(
        &self,
        descriptor: &RootSignatureDescriptor,
    ) -> Result<RootSignatureId, DeviceError>;

    /// Creates a graphics pipeline state object.
    fn create_pipeline_state(
        &self,
        descriptor: &PipelineStateDescriptor,
    ) -> Result<PipelineStateId, DeviceError>;

    /// Resets `allocator` and the shared command list against it, with an
    /// optional initial pipeline state, and returns the list open for
    /// recording.
    ///
    /// The caller must not reset an allocator whose previous submission the
    /// fence has not yet retired; see
    /// [`GpuDevice::completed_fence_value`].
    fn begin_command_list(
        &self,
        allocator: CommandAllocatorId,
        initial_state: Option<PipelineStateId>,
    ) -> Result<Box<dyn CommandList>, DeviceError>;

    /// Closes the list and executes it on the direct queue.
    fn submit(&self, list: Box<dyn CommandList>) -> Result<(), DeviceError>;

    /// Enqueues a GPU-side signal of the queue fence to `value`.
    fn signal_fence(&self, value: u64) -> Result<(), DeviceError>;

    /// The last fence value the GPU has completed.
    fn completed_fence_value(&self) -> u64;

    /// Blocks the calling thread until the GPU reaches `value`.
    ///
    /// The wait is unbounded; a hung driver stalls the process. Accepted
    /// for a demo engine.
    fn wait_for_fence_value(&self, value: u64) -> Result<(), DeviceError>;
}

/// An open command list recording GPU work for one frame.
pub trait CommandList {
    /// Emits a transition barrier moving `texture` from `*tracked` to
    /// `after`, then stores `after` into `*tracked`.
    ///
    /// A no-op when the states are already equal — the debug layer flags
    /// redundant transitions as errors. The caller owns exactly one tracked
    /// state per physical resource.
    fn transition(&mut self, texture: TextureId, tracked: &mut ResourceState, after: ResourceState);

    /// Sets the viewport and scissor rectangle to the full target extent.
    fn set_viewport_scissor(&mut self, width: u32, height: u32);

    /// Binds one render target and one depth-stencil target by descriptor
    /// slot.
    fn set_render_targets(&mut self, rtv: HeapSlot, dsv: HeapSlot);

    /// Clears a render target to `color`.
    fn clear_render_target(&mut self, rtv: HeapSlot, color: LinearRgba);

    /// Clears a depth-stencil target.
    fn clear_depth_stencil(&mut self, dsv: HeapSlot, depth: f32, stencil: u8);

    /// Makes a shader-visible descriptor heap current.
    fn set_descriptor_heap(&mut self, heap: DescriptorHeapId);

    /// Sets the graphics root signature.
    fn set_root_signature(&mut self, root_signature: RootSignatureId);

    /// Switches the active pipeline state.
    fn set_pipeline_state(&mut self, pipeline: PipelineStateId);

    /// Points root parameter `parameter_index` at the descriptor-heap slot
    /// `table_start`.
    fn set_root_descriptor_table(&mut self, parameter_index: u32, table_start: HeapSlot);

    /// Binds the vertex buffer.
    fn set_vertex_buffer(&mut self, buffer: BufferId, size: u64, stride: u32);

    /// Binds the index buffer.
    fn set_index_buffer(&mut self, buffer: BufferId, size: u64, format: IndexFormat);

    /// Sets the primitive topology.
    fn set_primitive_topology(&mut self, topology: PrimitiveTopology);

    /// Records one indexed draw.
    fn draw_indexed(&mut self, index_count: u32, start_index: u32, base_vertex: i32);

    /// Downcast support for backends and test doubles.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// The swap chain: rotating presentation targets for one window.
pub trait SwapChain: Debug {
    /// Number of back buffers.
    fn back_buffer_count(&self) -> u32;

    /// Index of the buffer the next present targets.
    fn current_back_buffer_index(&self) -> u32;

    /// The texture behind back buffer `index`.
    fn back_buffer(&self, index: u32) -> TextureId;

    /// The RTV heap slot pre-created for back buffer `index`.
    fn back_buffer_rtv(&self, index: u32) -> HeapSlot;

    /// Presents with sync interval 0 and no flags (no vsync wait; frame
    /// pacing is governed entirely by the frame-resource fence), then
    /// advances the back-buffer index.
    fn present(&mut self) -> Result<(), DeviceError>;

    /// Back buffer extent in pixels, `(width, height)`.
    fn extent(&self) -> (u32, u32);
}
