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

//! Mappings from the backend-agnostic enums to D3D12/DXGI constants.

use pyrite_core::gpu::{
    AddressMode, DescriptorHeapKind, FillMode, CullMode, FilterMode, IndexFormat,
    PrimitiveTopology, ResourceState, TextureFormat, VertexFormat,
};
use winapi::shared::dxgiformat;
use winapi::um::d3d12;

pub fn resource_state(state: ResourceState) -> d3d12::D3D12_RESOURCE_STATES {
    match state {
        ResourceState::Common => d3d12::D3D12_RESOURCE_STATE_COMMON,
        // PRESENT aliases COMMON in D3D12.
        ResourceState::Present => d3d12::D3D12_RESOURCE_STATE_PRESENT,
        ResourceState::RenderTarget => d3d12::D3D12_RESOURCE_STATE_RENDER_TARGET,
        ResourceState::DepthWrite => d3d12::D3D12_RESOURCE_STATE_DEPTH_WRITE,
        ResourceState::GenericRead => d3d12::D3D12_RESOURCE_STATE_GENERIC_READ,
        ResourceState::CopyDest => d3d12::D3D12_RESOURCE_STATE_COPY_DEST,
        ResourceState::PixelShaderResource => {
            d3d12::D3D12_RESOURCE_STATE_PIXEL_SHADER_RESOURCE
        }
    }
}

pub fn texture_format(format: TextureFormat) -> dxgiformat::DXGI_FORMAT {
    match format {
        TextureFormat::Rgba8Unorm => dxgiformat::DXGI_FORMAT_R8G8B8A8_UNORM,
        TextureFormat::D32Float => dxgiformat::DXGI_FORMAT_D32_FLOAT,
    }
}

pub fn heap_kind(kind: DescriptorHeapKind) -> d3d12::D3D12_DESCRIPTOR_HEAP_TYPE {
    match kind {
        DescriptorHeapKind::CbvSrvUav => d3d12::D3D12_DESCRIPTOR_HEAP_TYPE_CBV_SRV_UAV,
        DescriptorHeapKind::Rtv => d3d12::D3D12_DESCRIPTOR_HEAP_TYPE_RTV,
        DescriptorHeapKind::Dsv => d3d12::D3D12_DESCRIPTOR_HEAP_TYPE_DSV,
        DescriptorHeapKind::Sampler => d3d12::D3D12_DESCRIPTOR_HEAP_TYPE_SAMPLER,
    }
}

pub fn index_format(format: IndexFormat) -> dxgiformat::DXGI_FORMAT {
    match format {
        IndexFormat::Uint16 => dxgiformat::DXGI_FORMAT_R16_UINT,
        IndexFormat::Uint32 => dxgiformat::DXGI_FORMAT_R32_UINT,
    }
}

pub fn topology(topology: PrimitiveTopology) -> u32 {
    match topology {
        PrimitiveTopology::TriangleList => {
            winapi::um::d3dcommon::D3D_PRIMITIVE_TOPOLOGY_TRIANGLELIST
        }
        PrimitiveTopology::LineList => winapi::um::d3dcommon::D3D_PRIMITIVE_TOPOLOGY_LINELIST,
    }
}

pub fn topology_type(topology: PrimitiveTopology) -> d3d12::D3D12_PRIMITIVE_TOPOLOGY_TYPE {
    match topology {
        PrimitiveTopology::TriangleList => d3d12::D3D12_PRIMITIVE_TOPOLOGY_TYPE_TRIANGLE,
        PrimitiveTopology::LineList => d3d12::D3D12_PRIMITIVE_TOPOLOGY_TYPE_LINE,
    }
}

pub fn fill_mode(mode: FillMode) -> d3d12::D3D12_FILL_MODE {
    match mode {
        FillMode::Solid => d3d12::D3D12_FILL_MODE_SOLID,
        FillMode::Wireframe => d3d12::D3D12_FILL_MODE_WIREFRAME,
    }
}

pub fn cull_mode(mode: CullMode) -> d3d12::D3D12_CULL_MODE {
    match mode {
        CullMode::None => d3d12::D3D12_CULL_MODE_NONE,
        CullMode::Back => d3d12::D3D12_CULL_MODE_BACK,
    }
}

pub fn vertex_format(format: VertexFormat) -> dxgiformat::DXGI_FORMAT {
    match format {
        VertexFormat::Float32x2 => dxgiformat::DXGI_FORMAT_R32G32_FLOAT,
        VertexFormat::Float32x3 => dxgiformat::DXGI_FORMAT_R32G32B32_FLOAT,
    }
}

pub fn filter(mode: FilterMode) -> d3d12::D3D12_FILTER {
    match mode {
        FilterMode::Nearest => d3d12::D3D12_FILTER_MIN_MAG_MIP_POINT,
        FilterMode::Linear => d3d12::D3D12_FILTER_MIN_MAG_MIP_LINEAR,
    }
}

pub fn address_mode(mode: AddressMode) -> d3d12::D3D12_TEXTURE_ADDRESS_MODE {
    match mode {
        AddressMode::Wrap => d3d12::D3D12_TEXTURE_ADDRESS_MODE_WRAP,
        AddressMode::Clamp => d3d12::D3D12_TEXTURE_ADDRESS_MODE_CLAMP,
    }
}

/// Encodes a path or name for APIs taking wide strings.
pub fn to_wide(s: &std::ffi::OsStr) -> Vec<u16> {
    use std::os::windows::ffi::OsStrExt;
    s.encode_wide().chain(std::iter::once(0)).collect()
}
