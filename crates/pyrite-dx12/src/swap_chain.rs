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

//! Flip-discard swap chain over an HWND, with pre-created RTVs.

use crate::device::{check, Dx12Device};
use pyrite_core::gpu::{
    DescriptorHeapDescriptor, DescriptorHeapId, DescriptorHeapKind, DeviceError, GpuDevice,
    HeapSlot, SwapChain, TextureId,
};
use pyrite_core::platform::WindowHandle;
use raw_window_handle::RawWindowHandle;
use std::fmt;
use std::ptr;
use winapi::shared::dxgi::DXGI_SWAP_EFFECT_FLIP_DISCARD;
use winapi::shared::dxgi1_2::{DXGI_SWAP_CHAIN_DESC1, IDXGISwapChain1};
use winapi::shared::dxgi1_4::IDXGISwapChain3;
use winapi::shared::dxgiformat::DXGI_FORMAT_R8G8B8A8_UNORM;
use winapi::shared::dxgitype::{DXGI_SAMPLE_DESC, DXGI_USAGE_RENDER_TARGET_OUTPUT};
use winapi::shared::windef::HWND;
use winapi::shared::winerror::SUCCEEDED;
use winapi::um::d3d12::ID3D12Resource;
use winapi::Interface;
use wio::com::ComPtr;

/// The presentation chain. Owns the back-buffer RTV heap; the renderer
/// addresses buffers through the `TextureId`s registered on the device.
pub struct Dx12SwapChain {
    swap_chain: ComPtr<IDXGISwapChain3>,
    back_buffers: Vec<TextureId>,
    rtv_heap: DescriptorHeapId,
    extent: (u32, u32),
}

impl fmt::Debug for Dx12SwapChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dx12SwapChain")
            .field("back_buffers", &self.back_buffers.len())
            .field("extent", &self.extent)
            .finish()
    }
}

// IDXGISwapChain3 is used from the render thread only, but the trait object
// travels with the renderer.
unsafe impl Send for Dx12SwapChain {}

impl Dx12SwapChain {
    /// Creates the swap chain for `window` and registers its back buffers
    /// with `device`.
    pub fn new(
        device: &Dx12Device,
        window: &dyn WindowHandle,
        width: u32,
        height: u32,
        buffer_count: u32,
    ) -> Result<Self, DeviceError> {
        let hwnd = match window
            .window_handle()
            .map_err(|e| DeviceError::CreationFailed(format!("no window handle: {e}")))?
            .as_raw()
        {
            RawWindowHandle::Win32(handle) => handle.hwnd.get() as HWND,
            _ => {
                return Err(DeviceError::CreationFailed(
                    "a Win32 window is required".to_owned(),
                ))
            }
        };

        let desc = DXGI_SWAP_CHAIN_DESC1 {
            Width: width,
            Height: height,
            Format: DXGI_FORMAT_R8G8B8A8_UNORM,
            Stereo: 0,
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: 1,
                Quality: 0,
            },
            BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
            BufferCount: buffer_count,
            Scaling: 0,
            SwapEffect: DXGI_SWAP_EFFECT_FLIP_DISCARD,
            AlphaMode: 0,
            Flags: 0,
        };
        let mut swap_chain1: *mut IDXGISwapChain1 = ptr::null_mut();
        unsafe {
            check(
                device.shared.factory.CreateSwapChainForHwnd(
                    device.shared.queue.as_raw() as *mut _,
                    hwnd,
                    &desc,
                    ptr::null(),
                    ptr::null_mut(),
                    &mut swap_chain1,
                ),
                "swap chain",
            )?;
        }
        let swap_chain1 = unsafe { ComPtr::from_raw(swap_chain1) };
        let swap_chain = swap_chain1
            .cast::<IDXGISwapChain3>()
            .map_err(|hr| DeviceError::ObjectCreationFailed {
                what: "swap chain",
                details: format!("IDXGISwapChain3 cast failed: HRESULT {hr:#010x}"),
            })?;

        // One RTV per back buffer, indexed by buffer index.
        let rtv_heap = device.create_descriptor_heap(&DescriptorHeapDescriptor {
            label: Some("swap chain rtv heap".to_owned()),
            kind: DescriptorHeapKind::Rtv,
            capacity: buffer_count,
            shader_visible: false,
        })?;
        let mut back_buffers = Vec::with_capacity(buffer_count as usize);
        for index in 0..buffer_count {
            let mut resource = ptr::null_mut();
            let hr = unsafe {
                swap_chain.GetBuffer(index, &ID3D12Resource::uuidof(), &mut resource)
            };
            check(hr, "swap chain buffer")?;
            let resource = unsafe { ComPtr::from_raw(resource as *mut ID3D12Resource) };
            let texture = device.register_texture(resource, DXGI_FORMAT_R8G8B8A8_UNORM);
            device
                .create_render_target_view(
                    texture,
                    HeapSlot {
                        heap: rtv_heap,
                        index,
                    },
                )
                .map_err(|e| DeviceError::ObjectCreationFailed {
                    what: "back buffer rtv",
                    details: e.to_string(),
                })?;
            back_buffers.push(texture);
        }
        log::info!("Swap chain ready: {buffer_count} buffers at {width}x{height}");
        Ok(Self {
            swap_chain,
            back_buffers,
            rtv_heap,
            extent: (width, height),
        })
    }
}

impl SwapChain for Dx12SwapChain {
    fn back_buffer_count(&self) -> u32 {
        self.back_buffers.len() as u32
    }

    fn current_back_buffer_index(&self) -> u32 {
        unsafe { self.swap_chain.GetCurrentBackBufferIndex() }
    }

    fn back_buffer(&self, index: u32) -> TextureId {
        self.back_buffers[index as usize]
    }

    fn back_buffer_rtv(&self, index: u32) -> HeapSlot {
        HeapSlot {
            heap: self.rtv_heap,
            index,
        }
    }

    fn present(&mut self) -> Result<(), DeviceError> {
        // No vsync wait; frame pacing is the fence's job.
        let hr = unsafe { self.swap_chain.Present(0, 0) };
        if SUCCEEDED(hr) {
            Ok(())
        } else {
            Err(DeviceError::SubmissionFailed(format!(
                "present failed: HRESULT {hr:#010x}"
            )))
        }
    }

    fn extent(&self) -> (u32, u32) {
        self.extent
    }
}
