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

//! The D3D12 device: adapter selection with WARP fallback, the direct
//! queue and its fence, resource factories, and the shared command list.
//!
//! GPU objects live in interior tables behind a mutex and are addressed by
//! the ID newtypes from `pyrite-core`; nothing COM-shaped crosses the
//! trait boundary.

use crate::convert;
use crate::list::Dx12CommandList;
use pyrite_core::gpu::{
    BufferId, CommandAllocatorId, CommandList, DescriptorHeapDescriptor, DescriptorHeapId,
    DeviceError, GpuDevice, HeapSlot, PipelineStateDescriptor, PipelineStateId, ResourceError,
    ResourceState, RootSignatureDescriptor, RootSignatureId, ShaderError, ShaderModuleDescriptor,
    ShaderModuleId, ShaderStage, TextureDescriptor, TextureFormat, TextureId, TextureUsage,
};
use std::ffi::CString;
use std::fmt;
use std::ptr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use winapi::shared::dxgi::{DXGI_ADAPTER_DESC1, DXGI_ADAPTER_FLAG_SOFTWARE, IDXGIAdapter1};
use winapi::shared::dxgi1_3::CreateDXGIFactory2;
use winapi::shared::dxgi1_4::IDXGIFactory4;
use winapi::shared::dxgiformat;
use winapi::shared::winerror::{HRESULT, SUCCEEDED};
use winapi::um::d3d12::*;
use winapi::um::d3dcommon::{D3D_FEATURE_LEVEL_11_0, ID3DBlob};
use winapi::um::d3dcompiler::{D3DCompileFromFile, D3DCOMPILE_DEBUG, D3DCOMPILE_SKIP_OPTIMIZATION};
use winapi::um::handleapi::CloseHandle;
use winapi::um::synchapi::{CreateEventExW, WaitForSingleObject};
use winapi::um::winbase::{INFINITE, WAIT_OBJECT_0};
use winapi::um::winnt::{EVENT_ALL_ACCESS, HANDLE};
use winapi::Interface;
use wio::com::ComPtr;

/// Maps a failed HRESULT to a factory error.
pub(crate) fn check(hr: HRESULT, what: &'static str) -> Result<(), DeviceError> {
    if SUCCEEDED(hr) {
        Ok(())
    } else {
        Err(DeviceError::ObjectCreationFailed {
            what,
            details: format!("HRESULT {hr:#010x}"),
        })
    }
}

fn check_resource(hr: HRESULT, what: &'static str) -> Result<(), ResourceError> {
    if SUCCEEDED(hr) {
        Ok(())
    } else {
        Err(ResourceError::BackendError(format!(
            "{what} failed with HRESULT {hr:#010x}"
        )))
    }
}

pub(crate) struct BufferSlot {
    pub resource: ComPtr<ID3D12Resource>,
    pub gpu_va: u64,
    pub size: u64,
    /// Persistent mapping; null for default-heap buffers.
    pub mapped: *mut u8,
}

pub(crate) struct TextureSlot {
    pub resource: ComPtr<ID3D12Resource>,
    pub format: dxgiformat::DXGI_FORMAT,
}

pub(crate) struct HeapEntry {
    pub heap: ComPtr<ID3D12DescriptorHeap>,
    pub increment: u32,
}

#[derive(Default)]
pub(crate) struct Tables {
    pub buffers: Vec<BufferSlot>,
    pub textures: Vec<TextureSlot>,
    pub allocators: Vec<ComPtr<ID3D12CommandAllocator>>,
    pub heaps: Vec<HeapEntry>,
    pub shaders: Vec<ComPtr<ID3DBlob>>,
    pub root_signatures: Vec<ComPtr<ID3D12RootSignature>>,
    pub pipelines: Vec<ComPtr<ID3D12PipelineState>>,
}

pub(crate) struct DeviceShared {
    pub device: ComPtr<ID3D12Device>,
    pub factory: ComPtr<IDXGIFactory4>,
    pub queue: ComPtr<ID3D12CommandQueue>,
    /// The frame fence the renderer signals and polls.
    pub fence: ComPtr<ID3D12Fence>,
    pub fence_event: HANDLE,
    /// A private fence serializing init-time staging uploads.
    pub upload_fence: ComPtr<ID3D12Fence>,
    pub upload_event: HANDLE,
    pub upload_counter: AtomicU64,
    pub upload_allocator: ComPtr<ID3D12CommandAllocator>,
    /// The one graphics command list, reset each frame against the active
    /// frame resource's allocator.
    pub list: ComPtr<ID3D12GraphicsCommandList>,
    pub tables: Mutex<Tables>,
}

// The D3D12 device, queue, fence and factories are free-threaded; the
// mutable tables are guarded by the mutex and raw mapped pointers are only
// written through `write_upload_buffer`.
unsafe impl Send for DeviceShared {}
unsafe impl Sync for DeviceShared {}

impl Drop for DeviceShared {
    fn drop(&mut self) {
        unsafe {
            CloseHandle(self.fence_event);
            CloseHandle(self.upload_event);
        }
    }
}

impl DeviceShared {
    pub fn cpu_handle(&self, slot: HeapSlot) -> D3D12_CPU_DESCRIPTOR_HANDLE {
        let tables = self.tables.lock().unwrap();
        let entry = &tables.heaps[slot.heap.0];
        let start = unsafe { entry.heap.GetCPUDescriptorHandleForHeapStart() };
        D3D12_CPU_DESCRIPTOR_HANDLE {
            ptr: start.ptr + slot.index as usize * entry.increment as usize,
        }
    }

    pub fn gpu_handle(&self, slot: HeapSlot) -> D3D12_GPU_DESCRIPTOR_HANDLE {
        let tables = self.tables.lock().unwrap();
        let entry = &tables.heaps[slot.heap.0];
        let start = unsafe { entry.heap.GetGPUDescriptorHandleForHeapStart() };
        D3D12_GPU_DESCRIPTOR_HANDLE {
            ptr: start.ptr + slot.index as u64 * entry.increment as u64,
        }
    }

    /// Executes whatever the shared list holds and blocks until the GPU
    /// drains it. Init-time only.
    fn flush_upload(&self) -> Result<(), ResourceError> {
        unsafe {
            check_resource(self.list.Close(), "command list close")?;
            let lists = [self.list.as_raw() as *mut ID3D12CommandList];
            self.queue.ExecuteCommandLists(1, lists.as_ptr());
            let value = self.upload_counter.fetch_add(1, Ordering::SeqCst) + 1;
            check_resource(
                self.queue.Signal(self.upload_fence.as_raw(), value),
                "upload fence signal",
            )?;
            if self.upload_fence.GetCompletedValue() < value {
                check_resource(
                    self.upload_fence
                        .SetEventOnCompletion(value, self.upload_event),
                    "upload fence event",
                )?;
                if WaitForSingleObject(self.upload_event, INFINITE) != WAIT_OBJECT_0 {
                    return Err(ResourceError::BackendError(
                        "upload fence wait failed".to_owned(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Resets the shared list against the upload allocator for a staging
    /// copy.
    fn begin_upload(&self) -> Result<(), ResourceError> {
        unsafe {
            check_resource(self.upload_allocator.Reset(), "upload allocator reset")?;
            check_resource(
                self.list
                    .Reset(self.upload_allocator.as_raw(), ptr::null_mut()),
                "upload list reset",
            )?;
        }
        Ok(())
    }

    fn create_committed_buffer(
        &self,
        size: u64,
        heap_type: D3D12_HEAP_TYPE,
        initial_state: D3D12_RESOURCE_STATES,
    ) -> Result<ComPtr<ID3D12Resource>, ResourceError> {
        let heap_properties = D3D12_HEAP_PROPERTIES {
            Type: heap_type,
            CPUPageProperty: D3D12_CPU_PAGE_PROPERTY_UNKNOWN,
            MemoryPoolPreference: D3D12_MEMORY_POOL_UNKNOWN,
            CreationNodeMask: 1,
            VisibleNodeMask: 1,
        };
        let desc = D3D12_RESOURCE_DESC {
            Dimension: D3D12_RESOURCE_DIMENSION_BUFFER,
            Alignment: 0,
            Width: size,
            Height: 1,
            DepthOrArraySize: 1,
            MipLevels: 1,
            Format: dxgiformat::DXGI_FORMAT_UNKNOWN,
            SampleDesc: winapi::shared::dxgitype::DXGI_SAMPLE_DESC {
                Count: 1,
                Quality: 0,
            },
            Layout: D3D12_TEXTURE_LAYOUT_ROW_MAJOR,
            Flags: D3D12_RESOURCE_FLAG_NONE,
        };
        let mut resource = ptr::null_mut();
        let hr = unsafe {
            self.device.CreateCommittedResource(
                &heap_properties,
                D3D12_HEAP_FLAG_NONE,
                &desc,
                initial_state,
                ptr::null(),
                &ID3D12Resource::uuidof(),
                &mut resource,
            )
        };
        check_resource(hr, "committed buffer")?;
        Ok(unsafe { ComPtr::from_raw(resource as *mut ID3D12Resource) })
    }
}

/// The `GpuDevice` implementation over a hardware (or WARP) adapter.
pub struct Dx12Device {
    pub(crate) shared: Arc<DeviceShared>,
}

impl fmt::Debug for Dx12Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dx12Device").finish_non_exhaustive()
    }
}

impl Dx12Device {
    /// Opens the first hardware adapter supporting feature level 11.0,
    /// falling back to WARP. In debug builds the D3D12 debug layer is
    /// enabled first.
    pub fn new() -> Result<Self, DeviceError> {
        unsafe {
            #[cfg(debug_assertions)]
            {
                use winapi::um::d3d12sdklayers::ID3D12Debug;
                let mut debug: *mut ID3D12Debug = ptr::null_mut();
                if SUCCEEDED(D3D12GetDebugInterface(
                    &ID3D12Debug::uuidof(),
                    &mut debug as *mut _ as *mut _,
                )) {
                    let debug = ComPtr::from_raw(debug);
                    debug.EnableDebugLayer();
                    log::info!("D3D12 debug layer enabled");
                }
            }

            let mut factory: *mut IDXGIFactory4 = ptr::null_mut();
            check(
                CreateDXGIFactory2(0, &IDXGIFactory4::uuidof(), &mut factory as *mut _ as *mut _),
                "DXGI factory",
            )?;
            let factory = ComPtr::from_raw(factory);

            let device = match Self::open_hardware_adapter(&factory) {
                Some(device) => device,
                None => {
                    log::warn!("No hardware adapter at feature level 11.0, falling back to WARP");
                    Self::open_warp_adapter(&factory)?
                }
            };

            let queue_desc = D3D12_COMMAND_QUEUE_DESC {
                Type: D3D12_COMMAND_LIST_TYPE_DIRECT,
                Priority: D3D12_COMMAND_QUEUE_PRIORITY_NORMAL as i32,
                Flags: D3D12_COMMAND_QUEUE_FLAG_NONE,
                NodeMask: 0,
            };
            let mut queue = ptr::null_mut();
            check(
                device.CreateCommandQueue(
                    &queue_desc,
                    &ID3D12CommandQueue::uuidof(),
                    &mut queue,
                ),
                "command queue",
            )?;
            let queue = ComPtr::from_raw(queue as *mut ID3D12CommandQueue);

            let make_fence = |what| -> Result<ComPtr<ID3D12Fence>, DeviceError> {
                let mut fence = ptr::null_mut();
                check(
                    device.CreateFence(0, D3D12_FENCE_FLAG_NONE, &ID3D12Fence::uuidof(), &mut fence),
                    what,
                )?;
                Ok(ComPtr::from_raw(fence as *mut ID3D12Fence))
            };
            let fence = make_fence("frame fence")?;
            let upload_fence = make_fence("upload fence")?;

            let make_event = |what: &'static str| -> Result<HANDLE, DeviceError> {
                let event = CreateEventExW(ptr::null_mut(), ptr::null(), 0, EVENT_ALL_ACCESS);
                if event.is_null() {
                    Err(DeviceError::ObjectCreationFailed {
                        what,
                        details: "CreateEventExW returned null".to_owned(),
                    })
                } else {
                    Ok(event)
                }
            };
            let fence_event = make_event("fence event")?;
            let upload_event = make_event("upload fence event")?;

            let mut upload_allocator = ptr::null_mut();
            check(
                device.CreateCommandAllocator(
                    D3D12_COMMAND_LIST_TYPE_DIRECT,
                    &ID3D12CommandAllocator::uuidof(),
                    &mut upload_allocator,
                ),
                "upload command allocator",
            )?;
            let upload_allocator =
                ComPtr::from_raw(upload_allocator as *mut ID3D12CommandAllocator);

            let mut list = ptr::null_mut();
            check(
                device.CreateCommandList(
                    0,
                    D3D12_COMMAND_LIST_TYPE_DIRECT,
                    upload_allocator.as_raw(),
                    ptr::null_mut(),
                    &ID3D12GraphicsCommandList::uuidof(),
                    &mut list,
                ),
                "graphics command list",
            )?;
            let list = ComPtr::from_raw(list as *mut ID3D12GraphicsCommandList);
            // Lists are created open; close so the first frame reset is
            // uniform.
            check(list.Close(), "command list close")?;

            log::info!("D3D12 device ready");
            Ok(Self {
                shared: Arc::new(DeviceShared {
                    device,
                    factory,
                    queue,
                    fence,
                    fence_event,
                    upload_fence,
                    upload_event,
                    upload_counter: AtomicU64::new(0),
                    upload_allocator,
                    list,
                    tables: Mutex::new(Tables::default()),
                }),
            })
        }
    }

    unsafe fn open_hardware_adapter(
        factory: &ComPtr<IDXGIFactory4>,
    ) -> Option<ComPtr<ID3D12Device>> {
        let mut index = 0;
        loop {
            let mut adapter: *mut IDXGIAdapter1 = ptr::null_mut();
            if !SUCCEEDED(unsafe { factory.EnumAdapters1(index, &mut adapter) }) {
                return None;
            }
            index += 1;
            let adapter = unsafe { ComPtr::from_raw(adapter) };
            let mut desc: DXGI_ADAPTER_DESC1 = unsafe { std::mem::zeroed() };
            unsafe { adapter.GetDesc1(&mut desc) };
            if desc.Flags & DXGI_ADAPTER_FLAG_SOFTWARE != 0 {
                continue;
            }
            let mut device = ptr::null_mut();
            if SUCCEEDED(unsafe {
                D3D12CreateDevice(
                    adapter.as_raw() as *mut _,
                    D3D_FEATURE_LEVEL_11_0,
                    &ID3D12Device::uuidof(),
                    &mut device,
                )
            }) {
                let name_len = desc.Description.iter().position(|&c| c == 0).unwrap_or(0);
                log::info!(
                    "Using adapter: {}",
                    String::from_utf16_lossy(&desc.Description[..name_len])
                );
                return Some(unsafe { ComPtr::from_raw(device as *mut ID3D12Device) });
            }
        }
    }

    unsafe fn open_warp_adapter(
        factory: &ComPtr<IDXGIFactory4>,
    ) -> Result<ComPtr<ID3D12Device>, DeviceError> {
        let mut adapter: *mut IDXGIAdapter1 = ptr::null_mut();
        let hr = unsafe {
            factory.EnumWarpAdapter(&IDXGIAdapter1::uuidof(), &mut adapter as *mut _ as *mut _)
        };
        if !SUCCEEDED(hr) {
            return Err(DeviceError::CreationFailed(format!(
                "no WARP adapter: HRESULT {hr:#010x}"
            )));
        }
        let adapter = unsafe { ComPtr::from_raw(adapter) };
        let mut device = ptr::null_mut();
        let hr = unsafe {
            D3D12CreateDevice(
                adapter.as_raw() as *mut _,
                D3D_FEATURE_LEVEL_11_0,
                &ID3D12Device::uuidof(),
                &mut device,
            )
        };
        if SUCCEEDED(hr) {
            Ok(unsafe { ComPtr::from_raw(device as *mut ID3D12Device) })
        } else {
            Err(DeviceError::CreationFailed(format!(
                "WARP device creation failed: HRESULT {hr:#010x}"
            )))
        }
    }

    /// Registers a swap-chain back buffer so the renderer can address it
    /// by `TextureId`.
    pub(crate) fn register_texture(
        &self,
        resource: ComPtr<ID3D12Resource>,
        format: dxgiformat::DXGI_FORMAT,
    ) -> TextureId {
        let mut tables = self.shared.tables.lock().unwrap();
        tables.textures.push(TextureSlot { resource, format });
        TextureId(tables.textures.len() - 1)
    }
}

impl GpuDevice for Dx12Device {
    fn create_command_allocator(
        &self,
        label: Option<&str>,
    ) -> Result<CommandAllocatorId, DeviceError> {
        let mut allocator = ptr::null_mut();
        unsafe {
            check(
                self.shared.device.CreateCommandAllocator(
                    D3D12_COMMAND_LIST_TYPE_DIRECT,
                    &ID3D12CommandAllocator::uuidof(),
                    &mut allocator,
                ),
                "command allocator",
            )?;
        }
        log::debug!("Created command allocator ({})", label.unwrap_or("unnamed"));
        let mut tables = self.shared.tables.lock().unwrap();
        tables
            .allocators
            .push(unsafe { ComPtr::from_raw(allocator as *mut ID3D12CommandAllocator) });
        Ok(CommandAllocatorId(tables.allocators.len() - 1))
    }

    fn create_descriptor_heap(
        &self,
        descriptor: &DescriptorHeapDescriptor,
    ) -> Result<DescriptorHeapId, DeviceError> {
        let kind = convert::heap_kind(descriptor.kind);
        let desc = D3D12_DESCRIPTOR_HEAP_DESC {
            Type: kind,
            NumDescriptors: descriptor.capacity,
            Flags: if descriptor.shader_visible {
                D3D12_DESCRIPTOR_HEAP_FLAG_SHADER_VISIBLE
            } else {
                D3D12_DESCRIPTOR_HEAP_FLAG_NONE
            },
            NodeMask: 0,
        };
        let mut heap = ptr::null_mut();
        unsafe {
            check(
                self.shared.device.CreateDescriptorHeap(
                    &desc,
                    &ID3D12DescriptorHeap::uuidof(),
                    &mut heap,
                ),
                "descriptor heap",
            )?;
        }
        let increment = unsafe {
            self.shared
                .device
                .GetDescriptorHandleIncrementSize(kind)
        };
        let mut tables = self.shared.tables.lock().unwrap();
        tables.heaps.push(HeapEntry {
            heap: unsafe { ComPtr::from_raw(heap as *mut ID3D12DescriptorHeap) },
            increment,
        });
        Ok(DescriptorHeapId(tables.heaps.len() - 1))
    }

    fn create_upload_buffer(
        &self,
        label: Option<&str>,
        size: u64,
    ) -> Result<BufferId, ResourceError> {
        let resource = self.shared.create_committed_buffer(
            size,
            D3D12_HEAP_TYPE_UPLOAD,
            D3D12_RESOURCE_STATE_GENERIC_READ,
        )?;
        let mut mapped = ptr::null_mut();
        unsafe {
            check_resource(
                resource.Map(0, ptr::null(), &mut mapped),
                "upload buffer map",
            )?;
        }
        let gpu_va = unsafe { resource.GetGPUVirtualAddress() };
        log::debug!(
            "Created upload buffer of {size} bytes ({})",
            label.unwrap_or("unnamed")
        );
        let mut tables = self.shared.tables.lock().unwrap();
        tables.buffers.push(BufferSlot {
            resource,
            gpu_va,
            size,
            mapped: mapped as *mut u8,
        });
        Ok(BufferId(tables.buffers.len() - 1))
    }

    fn write_upload_buffer(
        &self,
        buffer: BufferId,
        offset: u64,
        data: &[u8],
    ) -> Result<(), ResourceError> {
        let tables = self.shared.tables.lock().unwrap();
        let slot = tables
            .buffers
            .get(buffer.0)
            .ok_or(ResourceError::InvalidHandle)?;
        if slot.mapped.is_null() {
            return Err(ResourceError::InvalidHandle);
        }
        if offset + data.len() as u64 > slot.size {
            return Err(ResourceError::OutOfBounds);
        }
        unsafe {
            ptr::copy_nonoverlapping(
                data.as_ptr(),
                slot.mapped.add(offset as usize),
                data.len(),
            );
        }
        Ok(())
    }

    fn create_buffer_with_data(
        &self,
        label: Option<&str>,
        data: &[u8],
        final_state: ResourceState,
    ) -> Result<BufferId, ResourceError> {
        let size = data.len() as u64;
        let destination = self.shared.create_committed_buffer(
            size,
            D3D12_HEAP_TYPE_DEFAULT,
            D3D12_RESOURCE_STATE_COPY_DEST,
        )?;
        let staging = self.shared.create_committed_buffer(
            size,
            D3D12_HEAP_TYPE_UPLOAD,
            D3D12_RESOURCE_STATE_GENERIC_READ,
        )?;
        unsafe {
            let mut mapped = ptr::null_mut();
            check_resource(staging.Map(0, ptr::null(), &mut mapped), "staging map")?;
            ptr::copy_nonoverlapping(data.as_ptr(), mapped as *mut u8, data.len());
            staging.Unmap(0, ptr::null());

            self.shared.begin_upload()?;
            self.shared
                .list
                .CopyBufferRegion(destination.as_raw(), 0, staging.as_raw(), 0, size);
            let barrier = transition_barrier(
                destination.as_raw(),
                D3D12_RESOURCE_STATE_COPY_DEST,
                convert::resource_state(final_state),
            );
            self.shared.list.ResourceBarrier(1, &barrier);
            self.shared.flush_upload()?;
        }
        log::debug!(
            "Uploaded default-heap buffer of {size} bytes ({})",
            label.unwrap_or("unnamed")
        );
        let gpu_va = unsafe { destination.GetGPUVirtualAddress() };
        let mut tables = self.shared.tables.lock().unwrap();
        tables.buffers.push(BufferSlot {
            resource: destination,
            gpu_va,
            size,
            mapped: ptr::null_mut(),
        });
        Ok(BufferId(tables.buffers.len() - 1))
    }

    fn create_texture_2d(
        &self,
        descriptor: &TextureDescriptor,
        pixels: Option<&[u8]>,
    ) -> Result<TextureId, ResourceError> {
        let format = convert::texture_format(descriptor.format);
        let is_depth = descriptor.usage == TextureUsage::DepthStencil;
        let mut desc: D3D12_RESOURCE_DESC = unsafe { std::mem::zeroed() };
        desc.Dimension = D3D12_RESOURCE_DIMENSION_TEXTURE2D;
        desc.Width = descriptor.width as u64;
        desc.Height = descriptor.height;
        desc.DepthOrArraySize = 1;
        desc.MipLevels = 1;
        desc.Format = format;
        desc.SampleDesc.Count = 1;
        desc.Layout = D3D12_TEXTURE_LAYOUT_UNKNOWN;
        desc.Flags = if is_depth {
            D3D12_RESOURCE_FLAG_ALLOW_DEPTH_STENCIL
        } else {
            D3D12_RESOURCE_FLAG_NONE
        };

        let heap_properties = D3D12_HEAP_PROPERTIES {
            Type: D3D12_HEAP_TYPE_DEFAULT,
            CPUPageProperty: D3D12_CPU_PAGE_PROPERTY_UNKNOWN,
            MemoryPoolPreference: D3D12_MEMORY_POOL_UNKNOWN,
            CreationNodeMask: 1,
            VisibleNodeMask: 1,
        };
        let mut clear_value: D3D12_CLEAR_VALUE = unsafe { std::mem::zeroed() };
        let clear_ptr = if is_depth {
            clear_value.Format = format;
            unsafe {
                clear_value.u.DepthStencil_mut().Depth = 1.0;
                clear_value.u.DepthStencil_mut().Stencil = 0;
            }
            &clear_value as *const _
        } else {
            ptr::null()
        };
        let initial_state = if pixels.is_some() {
            D3D12_RESOURCE_STATE_COPY_DEST
        } else {
            D3D12_RESOURCE_STATE_COMMON
        };
        let mut resource = ptr::null_mut();
        unsafe {
            check_resource(
                self.shared.device.CreateCommittedResource(
                    &heap_properties,
                    D3D12_HEAP_FLAG_NONE,
                    &desc,
                    initial_state,
                    clear_ptr,
                    &ID3D12Resource::uuidof(),
                    &mut resource,
                ),
                "committed texture",
            )?;
        }
        let resource = unsafe { ComPtr::from_raw(resource as *mut ID3D12Resource) };

        if let Some(pixels) = pixels {
            debug_assert_eq!(descriptor.format, TextureFormat::Rgba8Unorm);
            let bytes_per_row = descriptor.width as usize * 4;
            if pixels.len() < bytes_per_row * descriptor.height as usize {
                return Err(ResourceError::OutOfBounds);
            }
            // Staging rows must start on 256-byte boundaries.
            let row_pitch = (bytes_per_row + D3D12_TEXTURE_DATA_PITCH_ALIGNMENT as usize - 1)
                & !(D3D12_TEXTURE_DATA_PITCH_ALIGNMENT as usize - 1);
            let staging_size = (row_pitch * descriptor.height as usize) as u64;
            let staging = self.shared.create_committed_buffer(
                staging_size,
                D3D12_HEAP_TYPE_UPLOAD,
                D3D12_RESOURCE_STATE_GENERIC_READ,
            )?;
            unsafe {
                let mut mapped = ptr::null_mut();
                check_resource(staging.Map(0, ptr::null(), &mut mapped), "staging map")?;
                for row in 0..descriptor.height as usize {
                    ptr::copy_nonoverlapping(
                        pixels.as_ptr().add(row * bytes_per_row),
                        (mapped as *mut u8).add(row * row_pitch),
                        bytes_per_row,
                    );
                }
                staging.Unmap(0, ptr::null());

                self.shared.begin_upload()?;
                let mut src: D3D12_TEXTURE_COPY_LOCATION = std::mem::zeroed();
                src.pResource = staging.as_raw();
                src.Type = D3D12_TEXTURE_COPY_TYPE_PLACED_FOOTPRINT;
                *src.u.PlacedFootprint_mut() = D3D12_PLACED_SUBRESOURCE_FOOTPRINT {
                    Offset: 0,
                    Footprint: D3D12_SUBRESOURCE_FOOTPRINT {
                        Format: format,
                        Width: descriptor.width,
                        Height: descriptor.height,
                        Depth: 1,
                        RowPitch: row_pitch as u32,
                    },
                };
                let mut dst: D3D12_TEXTURE_COPY_LOCATION = std::mem::zeroed();
                dst.pResource = resource.as_raw();
                dst.Type = D3D12_TEXTURE_COPY_TYPE_SUBRESOURCE_INDEX;
                *dst.u.SubresourceIndex_mut() = 0;
                self.shared
                    .list
                    .CopyTextureRegion(&dst, 0, 0, 0, &src, ptr::null());
                let barrier = transition_barrier(
                    resource.as_raw(),
                    D3D12_RESOURCE_STATE_COPY_DEST,
                    D3D12_RESOURCE_STATE_PIXEL_SHADER_RESOURCE,
                );
                self.shared.list.ResourceBarrier(1, &barrier);
                self.shared.flush_upload()?;
            }
        }
        log::debug!(
            "Created texture {}x{} ({})",
            descriptor.width,
            descriptor.height,
            descriptor.label.as_deref().unwrap_or("unnamed")
        );
        let mut tables = self.shared.tables.lock().unwrap();
        tables.textures.push(TextureSlot { resource, format });
        Ok(TextureId(tables.textures.len() - 1))
    }

    fn create_constant_buffer_view(
        &self,
        buffer: BufferId,
        offset: u64,
        size: u32,
        slot: HeapSlot,
    ) -> Result<(), ResourceError> {
        let gpu_va = {
            let tables = self.shared.tables.lock().unwrap();
            tables
                .buffers
                .get(buffer.0)
                .ok_or(ResourceError::InvalidHandle)?
                .gpu_va
        };
        let desc = D3D12_CONSTANT_BUFFER_VIEW_DESC {
            BufferLocation: gpu_va + offset,
            SizeInBytes: size,
        };
        unsafe {
            self.shared
                .device
                .CreateConstantBufferView(&desc, self.shared.cpu_handle(slot));
        }
        Ok(())
    }

    fn create_shader_resource_view(
        &self,
        texture: TextureId,
        slot: HeapSlot,
    ) -> Result<(), ResourceError> {
        let (raw, format) = {
            let tables = self.shared.tables.lock().unwrap();
            let entry = tables
                .textures
                .get(texture.0)
                .ok_or(ResourceError::InvalidHandle)?;
            (entry.resource.as_raw(), entry.format)
        };
        let mut desc: D3D12_SHADER_RESOURCE_VIEW_DESC = unsafe { std::mem::zeroed() };
        desc.Format = format;
        desc.ViewDimension = D3D12_SRV_DIMENSION_TEXTURE2D;
        desc.Shader4ComponentMapping = D3D12_DEFAULT_SHADER_4_COMPONENT_MAPPING;
        unsafe {
            desc.u.Texture2D_mut().MipLevels = 1;
            self.shared
                .device
                .CreateShaderResourceView(raw, &desc, self.shared.cpu_handle(slot));
        }
        Ok(())
    }

    fn create_render_target_view(
        &self,
        texture: TextureId,
        slot: HeapSlot,
    ) -> Result<(), ResourceError> {
        let raw = {
            let tables = self.shared.tables.lock().unwrap();
            tables
                .textures
                .get(texture.0)
                .ok_or(ResourceError::InvalidHandle)?
                .resource
                .as_raw()
        };
        unsafe {
            self.shared
                .device
                .CreateRenderTargetView(raw, ptr::null(), self.shared.cpu_handle(slot));
        }
        Ok(())
    }

    fn create_depth_stencil_view(
        &self,
        texture: TextureId,
        slot: HeapSlot,
    ) -> Result<(), ResourceError> {
        let raw = {
            let tables = self.shared.tables.lock().unwrap();
            tables
                .textures
                .get(texture.0)
                .ok_or(ResourceError::InvalidHandle)?
                .resource
                .as_raw()
        };
        unsafe {
            self.shared
                .device
                .CreateDepthStencilView(raw, ptr::null(), self.shared.cpu_handle(slot));
        }
        Ok(())
    }

    fn create_shader_module(
        &self,
        descriptor: &ShaderModuleDescriptor,
    ) -> Result<ShaderModuleId, ShaderError> {
        if !descriptor.path.exists() {
            return Err(ShaderError::LoadError {
                path: descriptor.path.display().to_string(),
                source_error: "file not found".to_owned(),
            });
        }
        let wide_path = convert::to_wide(descriptor.path.as_os_str());
        let entry = CString::new(descriptor.entry_point.as_str()).map_err(|_| {
            ShaderError::CompilationError {
                label: descriptor.label.clone(),
                details: "entry point contains a NUL byte".to_owned(),
            }
        })?;
        let target = CString::new(match descriptor.stage {
            ShaderStage::Vertex => "vs_5_0",
            ShaderStage::Pixel => "ps_5_0",
        })
        .unwrap();
        let flags = if cfg!(debug_assertions) {
            D3DCOMPILE_DEBUG | D3DCOMPILE_SKIP_OPTIMIZATION
        } else {
            0
        };
        let mut blob: *mut ID3DBlob = ptr::null_mut();
        let mut errors: *mut ID3DBlob = ptr::null_mut();
        let hr = unsafe {
            D3DCompileFromFile(
                wide_path.as_ptr(),
                ptr::null(),
                ptr::null_mut(),
                entry.as_ptr(),
                target.as_ptr(),
                flags,
                0,
                &mut blob,
                &mut errors,
            )
        };
        if !errors.is_null() {
            let errors = unsafe { ComPtr::from_raw(errors) };
            let text = unsafe {
                let bytes = std::slice::from_raw_parts(
                    errors.GetBufferPointer() as *const u8,
                    errors.GetBufferSize(),
                );
                String::from_utf8_lossy(bytes).into_owned()
            };
            if SUCCEEDED(hr) {
                log::warn!("Shader '{}' compiled with warnings: {text}", descriptor.label);
            } else {
                log::error!("Shader '{}' failed to compile: {text}", descriptor.label);
                return Err(ShaderError::CompilationError {
                    label: descriptor.label.clone(),
                    details: text,
                });
            }
        }
        if !SUCCEEDED(hr) {
            return Err(ShaderError::CompilationError {
                label: descriptor.label.clone(),
                details: format!("HRESULT {hr:#010x}"),
            });
        }
        log::debug!("Compiled shader '{}'", descriptor.label);
        let mut tables = self.shared.tables.lock().unwrap();
        tables.shaders.push(unsafe { ComPtr::from_raw(blob) });
        Ok(ShaderModuleId(tables.shaders.len() - 1))
    }

    fn create_root_signature(
        &self,
        descriptor: &RootSignatureDescriptor,
    ) -> Result<RootSignatureId, DeviceError> {
        use pyrite_core::gpu::DescriptorRangeKind;

        // Ranges must stay put while the parameters point at them.
        let ranges: Vec<D3D12_DESCRIPTOR_RANGE> = descriptor
            .tables
            .iter()
            .map(|table| D3D12_DESCRIPTOR_RANGE {
                RangeType: match table.kind {
                    DescriptorRangeKind::Cbv => D3D12_DESCRIPTOR_RANGE_TYPE_CBV,
                    DescriptorRangeKind::Srv => D3D12_DESCRIPTOR_RANGE_TYPE_SRV,
                },
                NumDescriptors: table.count,
                BaseShaderRegister: table.base_register,
                RegisterSpace: 0,
                OffsetInDescriptorsFromTableStart: D3D12_DESCRIPTOR_RANGE_OFFSET_APPEND,
            })
            .collect();
        let parameters: Vec<D3D12_ROOT_PARAMETER> = ranges
            .iter()
            .map(|range| {
                let mut parameter: D3D12_ROOT_PARAMETER = unsafe { std::mem::zeroed() };
                parameter.ParameterType = D3D12_ROOT_PARAMETER_TYPE_DESCRIPTOR_TABLE;
                parameter.ShaderVisibility = D3D12_SHADER_VISIBILITY_ALL;
                unsafe {
                    *parameter.u.DescriptorTable_mut() = D3D12_ROOT_DESCRIPTOR_TABLE {
                        NumDescriptorRanges: 1,
                        pDescriptorRanges: range,
                    };
                }
                parameter
            })
            .collect();
        let samplers: Vec<D3D12_STATIC_SAMPLER_DESC> = descriptor
            .static_samplers
            .iter()
            .map(|sampler| {
                let address = convert::address_mode(sampler.address);
                let mut desc: D3D12_STATIC_SAMPLER_DESC = unsafe { std::mem::zeroed() };
                desc.Filter = convert::filter(sampler.filter);
                desc.AddressU = address;
                desc.AddressV = address;
                desc.AddressW = address;
                desc.MaxAnisotropy = 1;
                desc.ComparisonFunc = D3D12_COMPARISON_FUNC_ALWAYS;
                desc.MaxLOD = D3D12_FLOAT32_MAX;
                desc.ShaderRegister = sampler.shader_register;
                desc.ShaderVisibility = D3D12_SHADER_VISIBILITY_PIXEL;
                desc
            })
            .collect();

        let desc = D3D12_ROOT_SIGNATURE_DESC {
            NumParameters: parameters.len() as u32,
            pParameters: parameters.as_ptr(),
            NumStaticSamplers: samplers.len() as u32,
            pStaticSamplers: samplers.as_ptr(),
            Flags: D3D12_ROOT_SIGNATURE_FLAG_ALLOW_INPUT_ASSEMBLER_INPUT_LAYOUT,
        };
        let mut blob: *mut ID3DBlob = ptr::null_mut();
        let mut errors: *mut ID3DBlob = ptr::null_mut();
        let hr = unsafe {
            D3D12SerializeRootSignature(
                &desc,
                D3D_ROOT_SIGNATURE_VERSION_1,
                &mut blob,
                &mut errors,
            )
        };
        if !SUCCEEDED(hr) {
            if !errors.is_null() {
                let errors = unsafe { ComPtr::from_raw(errors) };
                let text = unsafe {
                    let bytes = std::slice::from_raw_parts(
                        errors.GetBufferPointer() as *const u8,
                        errors.GetBufferSize(),
                    );
                    String::from_utf8_lossy(bytes).into_owned()
                };
                log::error!("Root signature serialization failed: {text}");
            }
            return Err(DeviceError::ObjectCreationFailed {
                what: "root signature",
                details: format!("serialization HRESULT {hr:#010x}"),
            });
        }
        let blob = unsafe { ComPtr::from_raw(blob) };
        let mut signature = ptr::null_mut();
        unsafe {
            check(
                self.shared.device.CreateRootSignature(
                    0,
                    blob.GetBufferPointer(),
                    blob.GetBufferSize(),
                    &ID3D12RootSignature::uuidof(),
                    &mut signature,
                ),
                "root signature",
            )?;
        }
        let mut tables = self.shared.tables.lock().unwrap();
        tables
            .root_signatures
            .push(unsafe { ComPtr::from_raw(signature as *mut ID3D12RootSignature) });
        Ok(RootSignatureId(tables.root_signatures.len() - 1))
    }

    fn create_pipeline_state(
        &self,
        descriptor: &PipelineStateDescriptor,
    ) -> Result<PipelineStateId, DeviceError> {
        let tables = self.shared.tables.lock().unwrap();
        let root_signature = tables
            .root_signatures
            .get(descriptor.root_signature.0)
            .ok_or(DeviceError::ObjectCreationFailed {
                what: "pipeline state",
                details: "unknown root signature".to_owned(),
            })?
            .as_raw();
        let bytecode = |id: ShaderModuleId| -> Result<D3D12_SHADER_BYTECODE, DeviceError> {
            let blob = tables
                .shaders
                .get(id.0)
                .ok_or(DeviceError::ObjectCreationFailed {
                    what: "pipeline state",
                    details: "unknown shader module".to_owned(),
                })?;
            Ok(unsafe {
                D3D12_SHADER_BYTECODE {
                    pShaderBytecode: blob.GetBufferPointer(),
                    BytecodeLength: blob.GetBufferSize(),
                }
            })
        };
        let vs = bytecode(descriptor.vertex_shader)?;
        let ps = bytecode(descriptor.pixel_shader)?;

        // Semantic names must outlive the create call.
        let semantics: Vec<CString> = descriptor
            .input_layout
            .iter()
            .map(|attribute| CString::new(attribute.semantic).expect("static semantic name"))
            .collect();
        let elements: Vec<D3D12_INPUT_ELEMENT_DESC> = descriptor
            .input_layout
            .iter()
            .zip(&semantics)
            .map(|(attribute, semantic)| D3D12_INPUT_ELEMENT_DESC {
                SemanticName: semantic.as_ptr(),
                SemanticIndex: 0,
                Format: convert::vertex_format(attribute.format),
                InputSlot: 0,
                AlignedByteOffset: attribute.offset,
                InputSlotClass: D3D12_INPUT_CLASSIFICATION_PER_VERTEX_DATA,
                InstanceDataStepRate: 0,
            })
            .collect();

        let mut desc: D3D12_GRAPHICS_PIPELINE_STATE_DESC = unsafe { std::mem::zeroed() };
        desc.pRootSignature = root_signature;
        desc.VS = vs;
        desc.PS = ps;
        // Opaque pass: blending off, but the enum fields still need the
        // default values or PSO validation rejects the zeroed struct.
        desc.BlendState.RenderTarget[0] = D3D12_RENDER_TARGET_BLEND_DESC {
            BlendEnable: 0,
            LogicOpEnable: 0,
            SrcBlend: D3D12_BLEND_ONE,
            DestBlend: D3D12_BLEND_ZERO,
            BlendOp: D3D12_BLEND_OP_ADD,
            SrcBlendAlpha: D3D12_BLEND_ONE,
            DestBlendAlpha: D3D12_BLEND_ZERO,
            BlendOpAlpha: D3D12_BLEND_OP_ADD,
            LogicOp: D3D12_LOGIC_OP_NOOP,
            RenderTargetWriteMask: D3D12_COLOR_WRITE_ENABLE_ALL as u8,
        };
        desc.SampleMask = u32::MAX;
        desc.RasterizerState.FillMode = convert::fill_mode(descriptor.fill_mode);
        desc.RasterizerState.CullMode = convert::cull_mode(descriptor.cull_mode);
        desc.RasterizerState.DepthClipEnable = 1;
        desc.DepthStencilState.DepthEnable = 1;
        desc.DepthStencilState.DepthWriteMask = D3D12_DEPTH_WRITE_MASK_ALL;
        desc.DepthStencilState.DepthFunc = D3D12_COMPARISON_FUNC_LESS;
        desc.InputLayout = D3D12_INPUT_LAYOUT_DESC {
            pInputElementDescs: elements.as_ptr(),
            NumElements: elements.len() as u32,
        };
        desc.PrimitiveTopologyType = convert::topology_type(descriptor.topology);
        desc.NumRenderTargets = 1;
        desc.RTVFormats[0] = convert::texture_format(descriptor.rtv_format);
        desc.DSVFormat = convert::texture_format(descriptor.dsv_format);
        desc.SampleDesc.Count = 1;

        let mut pipeline = ptr::null_mut();
        unsafe {
            check(
                self.shared.device.CreateGraphicsPipelineState(
                    &desc,
                    &ID3D12PipelineState::uuidof(),
                    &mut pipeline,
                ),
                "pipeline state",
            )?;
        }
        drop(tables);
        log::debug!(
            "Created pipeline state ({})",
            descriptor.label.as_deref().unwrap_or("unnamed")
        );
        let mut tables = self.shared.tables.lock().unwrap();
        tables
            .pipelines
            .push(unsafe { ComPtr::from_raw(pipeline as *mut ID3D12PipelineState) });
        Ok(PipelineStateId(tables.pipelines.len() - 1))
    }

    fn begin_command_list(
        &self,
        allocator: CommandAllocatorId,
        initial_state: Option<PipelineStateId>,
    ) -> Result<Box<dyn CommandList>, DeviceError> {
        let tables = self.shared.tables.lock().unwrap();
        let allocator_raw = tables
            .allocators
            .get(allocator.0)
            .ok_or(DeviceError::SubmissionFailed(
                "unknown command allocator".to_owned(),
            ))?
            .as_raw();
        let pipeline_raw = match initial_state {
            Some(id) => tables
                .pipelines
                .get(id.0)
                .ok_or(DeviceError::SubmissionFailed(
                    "unknown pipeline state".to_owned(),
                ))?
                .as_raw(),
            None => ptr::null_mut(),
        };
        unsafe {
            let hr = (*allocator_raw).Reset();
            if !SUCCEEDED(hr) {
                return Err(DeviceError::SubmissionFailed(format!(
                    "allocator reset failed: HRESULT {hr:#010x}"
                )));
            }
            let hr = self.shared.list.Reset(allocator_raw, pipeline_raw);
            if !SUCCEEDED(hr) {
                return Err(DeviceError::SubmissionFailed(format!(
                    "command list reset failed: HRESULT {hr:#010x}"
                )));
            }
        }
        drop(tables);
        Ok(Box::new(Dx12CommandList::new(Arc::clone(&self.shared))))
    }

    fn submit(&self, list: Box<dyn CommandList>) -> Result<(), DeviceError> {
        drop(list);
        unsafe {
            let hr = self.shared.list.Close();
            if !SUCCEEDED(hr) {
                return Err(DeviceError::SubmissionFailed(format!(
                    "command list close failed: HRESULT {hr:#010x}"
                )));
            }
            let lists = [self.shared.list.as_raw() as *mut ID3D12CommandList];
            self.shared.queue.ExecuteCommandLists(1, lists.as_ptr());
        }
        Ok(())
    }

    fn signal_fence(&self, value: u64) -> Result<(), DeviceError> {
        let hr = unsafe { self.shared.queue.Signal(self.shared.fence.as_raw(), value) };
        if SUCCEEDED(hr) {
            Ok(())
        } else {
            Err(DeviceError::SubmissionFailed(format!(
                "fence signal failed: HRESULT {hr:#010x}"
            )))
        }
    }

    fn completed_fence_value(&self) -> u64 {
        unsafe { self.shared.fence.GetCompletedValue() }
    }

    fn wait_for_fence_value(&self, value: u64) -> Result<(), DeviceError> {
        unsafe {
            if self.shared.fence.GetCompletedValue() >= value {
                return Ok(());
            }
            let hr = self
                .shared
                .fence
                .SetEventOnCompletion(value, self.shared.fence_event);
            if !SUCCEEDED(hr) {
                return Err(DeviceError::SubmissionFailed(format!(
                    "fence event registration failed: HRESULT {hr:#010x}"
                )));
            }
            if WaitForSingleObject(self.shared.fence_event, INFINITE) != WAIT_OBJECT_0 {
                return Err(DeviceError::SubmissionFailed(
                    "fence wait abandoned".to_owned(),
                ));
            }
        }
        Ok(())
    }
}

/// Builds one transition barrier over a whole resource.
pub(crate) fn transition_barrier(
    resource: *mut ID3D12Resource,
    before: D3D12_RESOURCE_STATES,
    after: D3D12_RESOURCE_STATES,
) -> D3D12_RESOURCE_BARRIER {
    let mut barrier: D3D12_RESOURCE_BARRIER = unsafe { std::mem::zeroed() };
    barrier.Type = D3D12_RESOURCE_BARRIER_TYPE_TRANSITION;
    barrier.Flags = D3D12_RESOURCE_BARRIER_FLAG_NONE;
    unsafe {
        *barrier.u.Transition_mut() = D3D12_RESOURCE_TRANSITION_BARRIER {
            pResource: resource,
            Subresource: D3D12_RESOURCE_BARRIER_ALL_SUBRESOURCES,
            StateBefore: before,
            StateAfter: after,
        };
    }
    barrier
}
