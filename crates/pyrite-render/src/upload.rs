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

//! CPU-writable, GPU-readable linear buffer with constant-buffer stride
//! rounding.

use pyrite_core::gpu::{BufferId, GpuDevice, ResourceError, CONSTANT_BUFFER_ALIGNMENT};

/// Rounds `size` up to the smallest multiple of 256 that holds it.
///
/// Hardware requires constant buffer data to start on 256-byte boundaries,
/// so indexed addressing inside an upload buffer must use the rounded
/// stride, never the raw struct size.
pub fn align_constant_buffer_size(size: u64) -> u64 {
    (size + (CONSTANT_BUFFER_ALIGNMENT - 1)) & !(CONSTANT_BUFFER_ALIGNMENT - 1)
}

/// A persistently mapped upload-heap buffer holding `num_elements` slots of
/// a fixed stride.
///
/// No internal synchronization: single writer, and the caller must
/// guarantee (via the frame-resource fence gate) that the GPU is not still
/// reading a slot being overwritten.
#[derive(Debug)]
pub struct UploadBuffer {
    buffer: BufferId,
    stride: u64,
    num_elements: u32,
}

impl UploadBuffer {
    /// Allocates the buffer. With `is_constant_buffer`, the element stride
    /// is rounded up to the 256-byte hardware granularity.
    pub fn new(
        device: &dyn GpuDevice,
        label: Option<&str>,
        num_elements: u32,
        element_size: u64,
        is_constant_buffer: bool,
    ) -> Result<Self, ResourceError> {
        let stride = if is_constant_buffer {
            align_constant_buffer_size(element_size)
        } else {
            element_size
        };
        let buffer = device.create_upload_buffer(label, stride * num_elements as u64)?;
        Ok(Self {
            buffer,
            stride,
            num_elements,
        })
    }

    /// The underlying GPU buffer.
    pub fn buffer_id(&self) -> BufferId {
        self.buffer
    }

    /// Element stride in bytes (rounded, for constant buffers).
    pub fn stride(&self) -> u64 {
        self.stride
    }

    /// Number of element slots.
    pub fn num_elements(&self) -> u32 {
        self.num_elements
    }

    /// Byte offset of slot `index`.
    pub fn offset_of(&self, index: u32) -> u64 {
        index as u64 * self.stride
    }

    /// Raw byte copy of `data` into slot `index`.
    pub fn copy_data(
        &self,
        device: &dyn GpuDevice,
        index: u32,
        data: &[u8],
    ) -> Result<(), ResourceError> {
        if index >= self.num_elements || data.len() as u64 > self.stride {
            return Err(ResourceError::OutOfBounds);
        }
        device.write_upload_buffer(self.buffer, self.offset_of(index), data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment_rounds_to_next_256() {
        assert_eq!(align_constant_buffer_size(64), 256);
        assert_eq!(align_constant_buffer_size(300), 512);
        assert_eq!(align_constant_buffer_size(256), 256);
        assert_eq!(align_constant_buffer_size(1), 256);
        assert_eq!(align_constant_buffer_size(257), 512);
    }

    #[test]
    fn alignment_is_smallest_sufficient_multiple() {
        for size in 1..2048u64 {
            let aligned = align_constant_buffer_size(size);
            assert_eq!(aligned % 256, 0);
            assert!(aligned >= size);
            assert!(aligned - size < 256);
        }
    }
}
