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

//! Command recording over the device's shared graphics command list.

use crate::convert;
use crate::device::{transition_barrier, DeviceShared};
use pyrite_core::gpu::{
    BufferId, CommandList, DescriptorHeapId, HeapSlot, IndexFormat, PipelineStateId,
    PrimitiveTopology, ResourceState, RootSignatureId, TextureId,
};
use pyrite_core::math::LinearRgba;
use std::any::Any;
use std::sync::Arc;
use winapi::um::d3d12::*;

/// An open recording pass. The underlying list was reset by
/// [`crate::Dx12Device`]'s `begin_command_list`; submission closes it.
pub struct Dx12CommandList {
    shared: Arc<DeviceShared>,
}

impl Dx12CommandList {
    pub(crate) fn new(shared: Arc<DeviceShared>) -> Self {
        Self { shared }
    }
}

impl CommandList for Dx12CommandList {
    fn transition(
        &mut self,
        texture: TextureId,
        tracked: &mut ResourceState,
        after: ResourceState,
    ) {
        if *tracked == after {
            return;
        }
        let raw = {
            let tables = self.shared.tables.lock().unwrap();
            tables.textures[texture.0].resource.as_raw()
        };
        let barrier = transition_barrier(
            raw,
            convert::resource_state(*tracked),
            convert::resource_state(after),
        );
        unsafe {
            self.shared.list.ResourceBarrier(1, &barrier);
        }
        *tracked = after;
    }

    fn set_viewport_scissor(&mut self, width: u32, height: u32) {
        let viewport = D3D12_VIEWPORT {
            TopLeftX: 0.0,
            TopLeftY: 0.0,
            Width: width as f32,
            Height: height as f32,
            MinDepth: 0.0,
            MaxDepth: 1.0,
        };
        let scissor = winapi::shared::windef::RECT {
            left: 0,
            top: 0,
            right: width as i32,
            bottom: height as i32,
        };
        unsafe {
            self.shared.list.RSSetViewports(1, &viewport);
            self.shared.list.RSSetScissorRects(1, &scissor);
        }
    }

    fn set_render_targets(&mut self, rtv: HeapSlot, dsv: HeapSlot) {
        let rtv_handle = self.shared.cpu_handle(rtv);
        let dsv_handle = self.shared.cpu_handle(dsv);
        unsafe {
            self.shared
                .list
                .OMSetRenderTargets(1, &rtv_handle, 0, &dsv_handle);
        }
    }

    fn clear_render_target(&mut self, rtv: HeapSlot, color: LinearRgba) {
        let handle = self.shared.cpu_handle(rtv);
        unsafe {
            self.shared
                .list
                .ClearRenderTargetView(handle, &color.to_array(), 0, std::ptr::null());
        }
    }

    fn clear_depth_stencil(&mut self, dsv: HeapSlot, depth: f32, stencil: u8) {
        let handle = self.shared.cpu_handle(dsv);
        unsafe {
            self.shared.list.ClearDepthStencilView(
                handle,
                D3D12_CLEAR_FLAG_DEPTH | D3D12_CLEAR_FLAG_STENCIL,
                depth,
                stencil,
                0,
                std::ptr::null(),
            );
        }
    }

    fn set_descriptor_heap(&mut self, heap: DescriptorHeapId) {
        let raw = {
            let tables = self.shared.tables.lock().unwrap();
            tables.heaps[heap.0].heap.as_raw()
        };
        let heaps = [raw];
        unsafe {
            self.shared.list.SetDescriptorHeaps(1, heaps.as_ptr() as *mut _);
        }
    }

    fn set_root_signature(&mut self, root_signature: RootSignatureId) {
        let raw = {
            let tables = self.shared.tables.lock().unwrap();
            tables.root_signatures[root_signature.0].as_raw()
        };
        unsafe {
            self.shared.list.SetGraphicsRootSignature(raw);
        }
    }

    fn set_pipeline_state(&mut self, pipeline: PipelineStateId) {
        let raw = {
            let tables = self.shared.tables.lock().unwrap();
            tables.pipelines[pipeline.0].as_raw()
        };
        unsafe {
            self.shared.list.SetPipelineState(raw);
        }
    }

    fn set_root_descriptor_table(&mut self, parameter_index: u32, table_start: HeapSlot) {
        let handle = self.shared.gpu_handle(table_start);
        unsafe {
            self.shared
                .list
                .SetGraphicsRootDescriptorTable(parameter_index, handle);
        }
    }

    fn set_vertex_buffer(&mut self, buffer: BufferId, size: u64, stride: u32) {
        let gpu_va = {
            let tables = self.shared.tables.lock().unwrap();
            tables.buffers[buffer.0].gpu_va
        };
        let view = D3D12_VERTEX_BUFFER_VIEW {
            BufferLocation: gpu_va,
            SizeInBytes: size as u32,
            StrideInBytes: stride,
        };
        unsafe {
            self.shared.list.IASetVertexBuffers(0, 1, &view);
        }
    }

    fn set_index_buffer(&mut self, buffer: BufferId, size: u64, format: IndexFormat) {
        let gpu_va = {
            let tables = self.shared.tables.lock().unwrap();
            tables.buffers[buffer.0].gpu_va
        };
        let view = D3D12_INDEX_BUFFER_VIEW {
            BufferLocation: gpu_va,
            SizeInBytes: size as u32,
            Format: convert::index_format(format),
        };
        unsafe {
            self.shared.list.IASetIndexBuffer(&view);
        }
    }

    fn set_primitive_topology(&mut self, topology: PrimitiveTopology) {
        unsafe {
            self.shared
                .list
                .IASetPrimitiveTopology(convert::topology(topology));
        }
    }

    fn draw_indexed(&mut self, index_count: u32, start_index: u32, base_vertex: i32) {
        unsafe {
            self.shared
                .list
                .DrawIndexedInstanced(index_count, 1, start_index, base_vertex, 0);
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
