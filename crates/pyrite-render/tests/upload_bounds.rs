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

//! Bounds checks on `UploadBuffer::copy_data`: a bad slot index or an
//! oversize payload must be rejected before any device write happens.

mod common;

use common::MockGpuDevice;
use pyrite_core::gpu::ResourceError;
use pyrite_render::upload::UploadBuffer;

#[test]
fn copy_past_the_last_slot_is_rejected() {
    let device = MockGpuDevice::new();
    let buffer = UploadBuffer::new(&device, Some("objects"), 4, 64, true).unwrap();

    let result = buffer.copy_data(&device, 4, &[0u8; 64]);
    assert!(matches!(result, Err(ResourceError::OutOfBounds)));
    // The rejection happens before the device is touched.
    assert!(device.upload_writes().is_empty());

    // The last valid slot still goes through.
    buffer.copy_data(&device, 3, &[0u8; 64]).unwrap();
    assert_eq!(
        device.upload_writes(),
        vec![(buffer.buffer_id(), 3 * buffer.stride(), 64)]
    );
}

#[test]
fn payload_wider_than_the_stride_is_rejected() {
    let device = MockGpuDevice::new();
    // Constant-buffer rounding makes the stride 256; one byte past that
    // would bleed into the next slot.
    let buffer = UploadBuffer::new(&device, Some("materials"), 2, 48, true).unwrap();
    assert_eq!(buffer.stride(), 256);

    let result = buffer.copy_data(&device, 0, &[0u8; 257]);
    assert!(matches!(result, Err(ResourceError::OutOfBounds)));
    assert!(device.upload_writes().is_empty());

    // A payload exactly the stride wide is the boundary case and is fine.
    buffer.copy_data(&device, 0, &[0u8; 256]).unwrap();
    assert_eq!(device.upload_writes().len(), 1);
}
