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

//! Renderer configuration, constructed by the application before init.

use pyrite_core::math::LinearRgba;

/// Tunable renderer parameters. Fixed after [`crate::Renderer::new`].
#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    /// Number of in-flight frame resources.
    pub num_frames_in_flight: usize,
    /// Number of swap-chain back buffers.
    pub back_buffer_count: u32,
    /// Color the render target is cleared to each frame.
    pub clear_color: LinearRgba,
    /// Start in wireframe mode instead of solid.
    pub wireframe: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            num_frames_in_flight: 3,
            back_buffer_count: 2,
            clear_color: LinearRgba {
                r: 0.05,
                g: 0.05,
                b: 0.08,
                a: 1.0,
            },
            wireframe: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_triple_buffer_the_cpu() {
        let config = RendererConfig::default();
        assert_eq!(config.num_frames_in_flight, 3);
        assert_eq!(config.back_buffer_count, 2);
        assert!(!config.wireframe);
    }
}
