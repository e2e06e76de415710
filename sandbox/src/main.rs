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

//! Pyrite sandbox: a grid of spinning cubes under two material workflows.

#[cfg(not(windows))]
fn main() {
    eprintln!("The sandbox renders through Direct3D 12 and only runs on Windows.");
    eprintln!("The renderer itself is tested everywhere: cargo test -p pyrite-render");
}

#[cfg(windows)]
fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let event_loop = winit::event_loop::EventLoop::new()?;
    event_loop.set_control_flow(winit::event_loop::ControlFlow::Poll);
    let mut app = app::Sandbox::new();
    event_loop.run_app(&mut app)?;
    Ok(())
}

#[cfg(windows)]
mod app {
    use anyhow::Context;
    use pyrite_core::gpu::GpuDevice;
    use pyrite_core::math::{Mat4, Vec3};
    use pyrite_dx12::{Dx12Device, Dx12SwapChain};
    use pyrite_render::material::MaterialWorkflow;
    use pyrite_render::scene::{cube, MaterialDesc, SceneData, TextureData};
    use pyrite_render::{Renderer, RendererConfig, ViewMatrices};
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Instant;
    use winit::application::ApplicationHandler;
    use winit::dpi::LogicalSize;
    use winit::event::WindowEvent;
    use winit::event_loop::ActiveEventLoop;
    use winit::window::{Window, WindowId};

    const GRID: i32 = 3;

    /// An 8x8-cell checkerboard, the classic "textures work" probe.
    fn checkerboard(size: u32) -> TextureData {
        let cell = size / 8;
        let mut pixels = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                let on = ((x / cell) + (y / cell)) % 2 == 0;
                let v = if on { 0xe0 } else { 0x30 };
                pixels.extend_from_slice(&[v, v, v, 0xff]);
            }
        }
        TextureData {
            name: "checkerboard".to_owned(),
            width: size,
            height: size,
            pixels,
        }
    }

    fn demo_scene() -> SceneData {
        let materials = vec![
            MaterialDesc {
                name: "checkered metal".to_owned(),
                workflow: MaterialWorkflow::MetallicRoughness {
                    base_color_factor: [1.0, 0.6, 0.3, 1.0],
                    metallic_factor: 0.8,
                    roughness_factor: 0.35,
                },
                base_color_texture: Some(0),
                metallic_roughness_texture: None,
                normal_texture: None,
                emissive_texture: None,
                emissive_factor: 0.0,
            },
            MaterialDesc {
                name: "glossy blue".to_owned(),
                workflow: MaterialWorkflow::SpecularGlossiness {
                    diffuse_factor: [0.2, 0.3, 0.9, 1.0],
                    specular_factor: Vec3::new(0.9, 0.9, 0.9),
                    glossiness_factor: 0.7,
                },
                base_color_texture: None,
                metallic_roughness_texture: None,
                normal_texture: None,
                emissive_texture: None,
                emissive_factor: 0.0,
            },
        ];
        let mut meshes = Vec::new();
        for row in 0..GRID {
            for col in 0..GRID {
                let index = row * GRID + col;
                let world = Mat4::from_translation(Vec3::new(
                    (col - GRID / 2) as f32 * 1.8,
                    0.0,
                    (row - GRID / 2) as f32 * 1.8,
                ));
                meshes.push(cube(
                    &format!("cube {index}"),
                    world,
                    Some((index % 2) as usize),
                ));
            }
        }
        SceneData {
            meshes,
            materials,
            textures: vec![checkerboard(64)],
        }
    }

    pub struct Sandbox {
        window: Option<Arc<Window>>,
        renderer: Option<Renderer>,
        positions: Vec<Vec3>,
        start: Instant,
    }

    impl Sandbox {
        pub fn new() -> Self {
            Self {
                window: None,
                renderer: None,
                positions: Vec::new(),
                start: Instant::now(),
            }
        }

        fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
            let window = Arc::new(
                event_loop
                    .create_window(
                        Window::default_attributes()
                            .with_title("Pyrite Sandbox")
                            .with_inner_size(LogicalSize::new(1280.0, 720.0)),
                    )
                    .context("window creation")?,
            );
            let size = window.inner_size();

            let config = RendererConfig::default();
            let device = Dx12Device::new()?;
            let swap_chain = Dx12SwapChain::new(
                &device,
                window.as_ref(),
                size.width,
                size.height,
                config.back_buffer_count,
            )?;

            let mut renderer = Renderer::new(
                Arc::new(device) as Arc<dyn GpuDevice>,
                Box::new(swap_chain),
                config,
                demo_scene(),
                Path::new("assets/shaders"),
            )?;

            let aspect = size.width as f32 / size.height.max(1) as f32;
            let eye = Vec3::new(0.0, 4.5, 8.0);
            renderer.set_view(ViewMatrices {
                view: Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::UP),
                proj: Mat4::perspective_rh_zo(std::f32::consts::FRAC_PI_4, aspect, 0.1, 100.0),
                eye,
            });

            self.positions = renderer
                .drawables()
                .iter()
                .map(|d| {
                    let col = d.world.cols[3];
                    Vec3::new(col.x, col.y, col.z)
                })
                .collect();
            self.renderer = Some(renderer);
            self.window = Some(window);
            Ok(())
        }

        fn draw_frame(&mut self) -> anyhow::Result<()> {
            let Some(renderer) = self.renderer.as_mut() else {
                return Ok(());
            };
            let t = self.start.elapsed().as_secs_f32();
            for (i, position) in self.positions.iter().enumerate() {
                // Neighbouring cubes spin out of phase.
                let angle = t * 0.8 + i as f32 * 0.35;
                let world = Mat4::from_translation(*position)
                    * Mat4::from_rotation_y(angle)
                    * Mat4::from_rotation_x(angle * 0.5);
                renderer.set_world(i, world);
            }
            renderer.render()?;
            Ok(())
        }
    }

    impl ApplicationHandler for Sandbox {
        fn resumed(&mut self, event_loop: &ActiveEventLoop) {
            if self.renderer.is_some() {
                return;
            }
            if let Err(e) = self.init(event_loop) {
                log::error!("Initialization failed: {e:#}");
                event_loop.exit();
            }
        }

        fn window_event(
            &mut self,
            event_loop: &ActiveEventLoop,
            _window_id: WindowId,
            event: WindowEvent,
        ) {
            match event {
                WindowEvent::CloseRequested => event_loop.exit(),
                WindowEvent::RedrawRequested => {
                    if let Err(e) = self.draw_frame() {
                        log::error!("Rendering failed: {e:#}");
                        event_loop.exit();
                    }
                }
                _ => {}
            }
        }

        fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
        }
    }
}
