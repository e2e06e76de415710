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

//! GPU meshes: default-heap vertex/index buffers built once at init.

use crate::scene::{MeshData, Vertex};
use pyrite_core::gpu::{BufferId, GpuDevice, IndexFormat, ResourceError, ResourceState};

/// Index of a mesh in the renderer's mesh arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub usize);

/// A mesh resident on the GPU. Immutable after upload.
#[derive(Debug)]
pub struct Mesh {
    /// Debug name.
    pub name: String,
    /// Default-heap vertex buffer.
    pub vertex_buffer: BufferId,
    /// Vertex buffer size in bytes.
    pub vertex_buffer_size: u64,
    /// Byte stride of one vertex.
    pub vertex_stride: u32,
    /// Default-heap index buffer.
    pub index_buffer: BufferId,
    /// Index buffer size in bytes.
    pub index_buffer_size: u64,
    /// Index element width.
    pub index_format: IndexFormat,
}

impl Mesh {
    /// Uploads `data`'s buffers through the device's staging path, leaving
    /// both in the generic-read state for vertex/index fetch.
    pub fn upload(device: &dyn GpuDevice, data: &MeshData) -> Result<Self, ResourceError> {
        let vertex_bytes: &[u8] = bytemuck::cast_slice(&data.vertices);
        let index_bytes: &[u8] = bytemuck::cast_slice(&data.indices);
        let vertex_buffer = device.create_buffer_with_data(
            Some(&format!("{} vertices", data.name)),
            vertex_bytes,
            ResourceState::GenericRead,
        )?;
        let index_buffer = device.create_buffer_with_data(
            Some(&format!("{} indices", data.name)),
            index_bytes,
            ResourceState::GenericRead,
        )?;
        log::debug!(
            "Uploaded mesh '{}': {} vertices, {} indices",
            data.name,
            data.vertices.len(),
            data.indices.len()
        );
        Ok(Self {
            name: data.name.clone(),
            vertex_buffer,
            vertex_buffer_size: vertex_bytes.len() as u64,
            vertex_stride: std::mem::size_of::<Vertex>() as u32,
            index_buffer,
            index_buffer_size: index_bytes.len() as u64,
            index_format: IndexFormat::Uint32,
        })
    }
}
