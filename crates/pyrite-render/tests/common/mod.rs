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

//! Recording test doubles for the GPU capability traits.
//!
//! `MockGpuDevice` hands out incrementing ids from every factory, records
//! every command a submitted list carried, and simulates a GPU whose fence
//! lags the CPU by a configurable number of signals. It also enforces the
//! allocator-reuse invariant: beginning a command list against an
//! allocator whose last submission the fence has not retired panics the
//! test.

use pyrite_core::gpu::{
    BufferId, CommandAllocatorId, CommandList, DescriptorHeapDescriptor, DescriptorHeapId,
    DeviceError, GpuDevice, HeapSlot, IndexFormat, PipelineStateDescriptor, PipelineStateId,
    PrimitiveTopology, ResourceError, ResourceState, RootSignatureDescriptor, RootSignatureId,
    ShaderError, ShaderModuleDescriptor, ShaderModuleId, SwapChain, TextureDescriptor, TextureId,
};
use pyrite_core::math::LinearRgba;
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Everything a command list can record, flattened for assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Begin {
        allocator: CommandAllocatorId,
        pipeline: Option<PipelineStateId>,
    },
    Transition {
        texture: TextureId,
        before: ResourceState,
        after: ResourceState,
    },
    SetViewportScissor(u32, u32),
    SetRenderTargets {
        rtv: HeapSlot,
        dsv: HeapSlot,
    },
    ClearRenderTarget {
        rtv: HeapSlot,
        color: LinearRgba,
    },
    ClearDepthStencil {
        dsv: HeapSlot,
        depth: f32,
        stencil: u8,
    },
    SetDescriptorHeap(DescriptorHeapId),
    SetRootSignature(RootSignatureId),
    SetPipelineState(PipelineStateId),
    SetRootTable {
        parameter: u32,
        slot: HeapSlot,
    },
    SetVertexBuffer(BufferId),
    SetIndexBuffer(BufferId, IndexFormat),
    SetTopology(PrimitiveTopology),
    DrawIndexed {
        index_count: u32,
        start_index: u32,
        base_vertex: i32,
    },
    Submit,
}

#[derive(Debug, Default)]
struct MockTables {
    next_id: usize,
    /// Upload buffer contents by id, for write inspection.
    upload_writes: Vec<(BufferId, u64, usize)>,
    /// Last signaled fence value per allocator's in-flight submission.
    allocator_fences: HashMap<CommandAllocatorId, u64>,
    /// Allocator of the most recent submit, pending its signal.
    pending_allocator: Option<CommandAllocatorId>,
    recording_allocator: Option<CommandAllocatorId>,
    signaled: u64,
    completed: u64,
    waits: Vec<u64>,
}

/// A trait-complete recording device with a simulated lagging GPU.
#[derive(Debug)]
pub struct MockGpuDevice {
    tables: Mutex<MockTables>,
    /// Number of signals the simulated GPU stays behind the CPU. Zero
    /// means signals complete instantly.
    lag: u64,
    pub commands: Arc<Mutex<Vec<Command>>>,
}

impl MockGpuDevice {
    pub fn new() -> Self {
        Self::with_gpu_lag(0)
    }

    /// A device whose fence only advances when the CPU explicitly waits,
    /// staying up to `lag` signals behind otherwise.
    pub fn with_gpu_lag(lag: u64) -> Self {
        Self {
            tables: Mutex::new(MockTables::default()),
            lag,
            commands: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn next_id(&self) -> usize {
        let mut tables = self.tables.lock().unwrap();
        tables.next_id += 1;
        tables.next_id
    }

    /// Fence values the CPU blocked on, in order.
    pub fn fence_waits(&self) -> Vec<u64> {
        self.tables.lock().unwrap().waits.clone()
    }

    /// Recorded `(buffer, offset, len)` of every upload-buffer write.
    pub fn upload_writes(&self) -> Vec<(BufferId, u64, usize)> {
        self.tables.lock().unwrap().upload_writes.clone()
    }

    /// A flat copy of every recorded command.
    pub fn recorded(&self) -> Vec<Command> {
        self.commands.lock().unwrap().clone()
    }
}

impl Default for MockGpuDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuDevice for MockGpuDevice {
    fn create_command_allocator(
        &self,
        _label: Option<&str>,
    ) -> Result<CommandAllocatorId, DeviceError> {
        Ok(CommandAllocatorId(self.next_id()))
    }

    fn create_descriptor_heap(
        &self,
        _descriptor: &DescriptorHeapDescriptor,
    ) -> Result<DescriptorHeapId, DeviceError> {
        Ok(DescriptorHeapId(self.next_id()))
    }

    fn create_upload_buffer(
        &self,
        _label: Option<&str>,
        _size: u64,
    ) -> Result<BufferId, ResourceError> {
        Ok(BufferId(self.next_id()))
    }

    fn write_upload_buffer(
        &self,
        buffer: BufferId,
        offset: u64,
        data: &[u8],
    ) -> Result<(), ResourceError> {
        self.tables
            .lock()
            .unwrap()
            .upload_writes
            .push((buffer, offset, data.len()));
        Ok(())
    }

    fn create_buffer_with_data(
        &self,
        _label: Option<&str>,
        _data: &[u8],
        _final_state: ResourceState,
    ) -> Result<BufferId, ResourceError> {
        Ok(BufferId(self.next_id()))
    }

    fn create_texture_2d(
        &self,
        _descriptor: &TextureDescriptor,
        _pixels: Option<&[u8]>,
    ) -> Result<TextureId, ResourceError> {
        Ok(TextureId(self.next_id()))
    }

    fn create_constant_buffer_view(
        &self,
        _buffer: BufferId,
        _offset: u64,
        _size: u32,
        _slot: HeapSlot,
    ) -> Result<(), ResourceError> {
        Ok(())
    }

    fn create_shader_resource_view(
        &self,
        _texture: TextureId,
        _slot: HeapSlot,
    ) -> Result<(), ResourceError> {
        Ok(())
    }

    fn create_render_target_view(
        &self,
        _texture: TextureId,
        _slot: HeapSlot,
    ) -> Result<(), ResourceError> {
        Ok(())
    }

    fn create_depth_stencil_view(
        &self,
        _texture: TextureId,
        _slot: HeapSlot,
    ) -> Result<(), ResourceError> {
        Ok(())
    }

    fn create_shader_module(
        &self,
        _descriptor: &ShaderModuleDescriptor,
    ) -> Result<ShaderModuleId, ShaderError> {
        Ok(ShaderModuleId(self.next_id()))
    }

    fn create_root_signature(
        &self,
        _descriptor: &RootSignatureDescriptor,
    ) -> Result<RootSignatureId, DeviceError> {
        Ok(RootSignatureId(self.next_id()))
    }

    fn create_pipeline_state(
        &self,
        _descriptor: &PipelineStateDescriptor,
    ) -> Result<PipelineStateId, DeviceError> {
        Ok(PipelineStateId(self.next_id()))
    }

    fn begin_command_list(
        &self,
        allocator: CommandAllocatorId,
        initial_state: Option<PipelineStateId>,
    ) -> Result<Box<dyn CommandList>, DeviceError> {
        {
            let mut tables = self.tables.lock().unwrap();
            if let Some(&fence) = tables.allocator_fences.get(&allocator) {
                assert!(
                    tables.completed >= fence,
                    "allocator {allocator:?} reset while its submission \
                     (fence {fence}) is still in flight (completed {})",
                    tables.completed
                );
            }
            tables.recording_allocator = Some(allocator);
        }
        self.commands.lock().unwrap().push(Command::Begin {
            allocator,
            pipeline: initial_state,
        });
        Ok(Box::new(MockCommandList {
            commands: Arc::clone(&self.commands),
        }))
    }

    fn submit(&self, _list: Box<dyn CommandList>) -> Result<(), DeviceError> {
        let mut tables = self.tables.lock().unwrap();
        tables.pending_allocator = tables.recording_allocator.take();
        drop(tables);
        self.commands.lock().unwrap().push(Command::Submit);
        Ok(())
    }

    fn signal_fence(&self, value: u64) -> Result<(), DeviceError> {
        let mut tables = self.tables.lock().unwrap();
        tables.signaled = value;
        if let Some(allocator) = tables.pending_allocator.take() {
            tables.allocator_fences.insert(allocator, value);
        }
        // The simulated GPU trails the CPU by `lag` signals.
        tables.completed = tables.completed.max(value.saturating_sub(self.lag));
        Ok(())
    }

    fn completed_fence_value(&self) -> u64 {
        self.tables.lock().unwrap().completed
    }

    fn wait_for_fence_value(&self, value: u64) -> Result<(), DeviceError> {
        let mut tables = self.tables.lock().unwrap();
        assert!(
            value <= tables.signaled,
            "waited for fence {value} which was never signaled"
        );
        tables.waits.push(value);
        // Blocking completes the work.
        tables.completed = tables.completed.max(value);
        Ok(())
    }
}

struct MockCommandList {
    commands: Arc<Mutex<Vec<Command>>>,
}

impl MockCommandList {
    fn push(&self, command: Command) {
        self.commands.lock().unwrap().push(command);
    }
}

impl CommandList for MockCommandList {
    fn transition(
        &mut self,
        texture: TextureId,
        tracked: &mut ResourceState,
        after: ResourceState,
    ) {
        if *tracked == after {
            return;
        }
        self.push(Command::Transition {
            texture,
            before: *tracked,
            after,
        });
        *tracked = after;
    }

    fn set_viewport_scissor(&mut self, width: u32, height: u32) {
        self.push(Command::SetViewportScissor(width, height));
    }

    fn set_render_targets(&mut self, rtv: HeapSlot, dsv: HeapSlot) {
        self.push(Command::SetRenderTargets { rtv, dsv });
    }

    fn clear_render_target(&mut self, rtv: HeapSlot, color: LinearRgba) {
        self.push(Command::ClearRenderTarget { rtv, color });
    }

    fn clear_depth_stencil(&mut self, dsv: HeapSlot, depth: f32, stencil: u8) {
        self.push(Command::ClearDepthStencil {
            dsv,
            depth,
            stencil,
        });
    }

    fn set_descriptor_heap(&mut self, heap: DescriptorHeapId) {
        self.push(Command::SetDescriptorHeap(heap));
    }

    fn set_root_signature(&mut self, root_signature: RootSignatureId) {
        self.push(Command::SetRootSignature(root_signature));
    }

    fn set_pipeline_state(&mut self, pipeline: PipelineStateId) {
        self.push(Command::SetPipelineState(pipeline));
    }

    fn set_root_descriptor_table(&mut self, parameter_index: u32, table_start: HeapSlot) {
        self.push(Command::SetRootTable {
            parameter: parameter_index,
            slot: table_start,
        });
    }

    fn set_vertex_buffer(&mut self, buffer: BufferId, _size: u64, _stride: u32) {
        self.push(Command::SetVertexBuffer(buffer));
    }

    fn set_index_buffer(&mut self, buffer: BufferId, _size: u64, format: IndexFormat) {
        self.push(Command::SetIndexBuffer(buffer, format));
    }

    fn set_primitive_topology(&mut self, topology: PrimitiveTopology) {
        self.push(Command::SetTopology(topology));
    }

    fn draw_indexed(&mut self, index_count: u32, start_index: u32, base_vertex: i32) {
        self.push(Command::DrawIndexed {
            index_count,
            start_index,
            base_vertex,
        });
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A two-buffer swap chain over synthetic texture ids.
#[derive(Debug)]
pub struct MockSwapChain {
    textures: [TextureId; 2],
    rtv_heap: DescriptorHeapId,
    current: u32,
    extent: (u32, u32),
}

impl MockSwapChain {
    pub fn new() -> Self {
        Self {
            // Ids far above anything the device counter hands out.
            textures: [TextureId(9000), TextureId(9001)],
            rtv_heap: DescriptorHeapId(9100),
            current: 0,
            extent: (800, 600),
        }
    }
}

impl Default for MockSwapChain {
    fn default() -> Self {
        Self::new()
    }
}

impl SwapChain for MockSwapChain {
    fn back_buffer_count(&self) -> u32 {
        2
    }

    fn current_back_buffer_index(&self) -> u32 {
        self.current
    }

    fn back_buffer(&self, index: u32) -> TextureId {
        self.textures[index as usize]
    }

    fn back_buffer_rtv(&self, index: u32) -> HeapSlot {
        HeapSlot {
            heap: self.rtv_heap,
            index,
        }
    }

    fn present(&mut self) -> Result<(), DeviceError> {
        self.current = (self.current + 1) % 2;
        Ok(())
    }

    fn extent(&self) -> (u32, u32) {
        self.extent
    }
}
