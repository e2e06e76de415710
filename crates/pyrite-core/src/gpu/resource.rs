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

//! Resource IDs, state enums, and descriptor value types shared by the
//! renderer and the backends.

use std::path::PathBuf;

/// Identifies a GPU buffer (upload or default heap).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub usize);

/// Identifies a GPU texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub usize);

/// Identifies a command allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandAllocatorId(pub usize);

/// Identifies a descriptor heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorHeapId(pub usize);

/// Identifies a compiled shader module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderModuleId(pub usize);

/// Identifies a root signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RootSignatureId(pub usize);

/// Identifies a pipeline state object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineStateId(pub usize);

/// One descriptor location: a heap plus a heap-relative slot index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapSlot {
    /// The heap the descriptor lives in.
    pub heap: DescriptorHeapId,
    /// Zero-based slot index from the heap start.
    pub index: u32,
}

/// The usage state a resource is in, as declared to the GPU.
///
/// Callers must serialize all transitions of a physical resource through a
/// single tracked state value; see [`CommandList::transition`]
/// (`crate::gpu::traits::CommandList::transition`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceState {
    /// Common/initial state.
    Common,
    /// Presentable by the swap chain.
    Present,
    /// Bound as a render target.
    RenderTarget,
    /// Bound as a writable depth-stencil target.
    DepthWrite,
    /// Readable by any stage (upload-heap resources live here).
    GenericRead,
    /// Destination of a copy operation.
    CopyDest,
    /// Sampled by the pixel shader.
    PixelShaderResource,
}

/// Texel formats the engine uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    /// 8-bit-per-channel RGBA, unsigned normalized.
    Rgba8Unorm,
    /// 32-bit float depth.
    D32Float,
}

/// What a texture may be bound as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureUsage {
    /// Sampled from shaders.
    ShaderResource,
    /// Rendered into.
    RenderTarget,
    /// Used as the depth-stencil target.
    DepthStencil,
}

/// Describes a 2D texture to create.
#[derive(Debug, Clone)]
pub struct TextureDescriptor {
    /// Debug label.
    pub label: Option<String>,
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Texel format.
    pub format: TextureFormat,
    /// Intended usage.
    pub usage: TextureUsage,
}

/// The kinds of descriptor heap the API distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorHeapKind {
    /// Constant-buffer, shader-resource and unordered-access views.
    CbvSrvUav,
    /// Render-target views.
    Rtv,
    /// Depth-stencil views.
    Dsv,
    /// Samplers.
    Sampler,
}

/// Describes a descriptor heap to create.
#[derive(Debug, Clone)]
pub struct DescriptorHeapDescriptor {
    /// Debug label.
    pub label: Option<String>,
    /// Which descriptor kind the heap stores.
    pub kind: DescriptorHeapKind,
    /// Number of slots.
    pub capacity: u32,
    /// Whether shaders may read the heap (required for CBV/SRV tables).
    pub shader_visible: bool,
}

/// Index element width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFormat {
    /// 16-bit indices.
    Uint16,
    /// 32-bit indices.
    Uint32,
}

/// Primitive assembly mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    /// Independent triangles.
    TriangleList,
    /// Independent lines.
    LineList,
}

/// Shader pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    /// Vertex shader.
    Vertex,
    /// Pixel shader.
    Pixel,
}

/// Describes a shader to load from source and compile.
#[derive(Debug, Clone)]
pub struct ShaderModuleDescriptor {
    /// Debug label, also used in compile diagnostics.
    pub label: String,
    /// Path of the HLSL source file.
    pub path: PathBuf,
    /// Entry point function name.
    pub entry_point: String,
    /// Which stage the entry point targets.
    pub stage: ShaderStage,
}

/// The descriptor kind a root-parameter table ranges over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorRangeKind {
    /// Constant buffer views.
    Cbv,
    /// Shader resource views.
    Srv,
}

/// One root parameter: a descriptor table of a single contiguous range.
#[derive(Debug, Clone)]
pub struct DescriptorTable {
    /// The descriptor kind of the range.
    pub kind: DescriptorRangeKind,
    /// Number of descriptors in the range.
    pub count: u32,
    /// First shader register the range binds to (`bN` or `tN`).
    pub base_register: u32,
}

/// Sampler filtering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Point sampling.
    Nearest,
    /// Bilinear filtering.
    Linear,
}

/// Sampler addressing mode, applied to all three coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMode {
    /// Repeat.
    Wrap,
    /// Clamp to edge.
    Clamp,
}

/// A sampler baked into the root signature.
#[derive(Debug, Clone)]
pub struct StaticSamplerDescriptor {
    /// Shader register the sampler binds to (`sN`).
    pub shader_register: u32,
    /// Filtering mode.
    pub filter: FilterMode,
    /// Addressing mode.
    pub address: AddressMode,
}

/// Describes the full root signature: the declared contract of which
/// descriptor tables a pipeline's commands will bind.
#[derive(Debug, Clone)]
pub struct RootSignatureDescriptor {
    /// Root parameters, bound by index in declaration order.
    pub tables: Vec<DescriptorTable>,
    /// Static samplers.
    pub static_samplers: Vec<StaticSamplerDescriptor>,
}

/// Polygon rasterization fill mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMode {
    /// Filled polygons.
    Solid,
    /// Edges only.
    Wireframe,
}

/// Face culling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    /// No culling.
    None,
    /// Cull back faces.
    Back,
}

/// Per-vertex attribute formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexFormat {
    /// Two 32-bit floats.
    Float32x2,
    /// Three 32-bit floats.
    Float32x3,
}

/// One entry of the vertex input layout.
#[derive(Debug, Clone)]
pub struct VertexAttribute {
    /// HLSL semantic name (e.g. `POSITION`).
    pub semantic: &'static str,
    /// Attribute format.
    pub format: VertexFormat,
    /// Byte offset within the vertex.
    pub offset: u32,
}

/// Describes a graphics pipeline state object.
#[derive(Debug, Clone)]
pub struct PipelineStateDescriptor {
    /// Debug label.
    pub label: Option<String>,
    /// Root signature the pipeline is built against.
    pub root_signature: RootSignatureId,
    /// Vertex shader.
    pub vertex_shader: ShaderModuleId,
    /// Pixel shader.
    pub pixel_shader: ShaderModuleId,
    /// Vertex input layout.
    pub input_layout: Vec<VertexAttribute>,
    /// Fill mode for the rasterizer.
    pub fill_mode: FillMode,
    /// Cull mode for the rasterizer.
    pub cull_mode: CullMode,
    /// Render target format.
    pub rtv_format: TextureFormat,
    /// Depth-stencil format.
    pub dsv_format: TextureFormat,
    /// Primitive topology class.
    pub topology: PrimitiveTopology,
}
