use std::{sync::Arc, time::Instant};

use anyhow::Context;
use glam::Vec2;
use imgui::{FontConfig, FontSource};
use imgui_winit_support::WinitPlatform;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, Event, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use crate::{engine, rendering::renderer::Renderer, viewer::ViewerState};

/// A press-release pair with less pointer travel than this is a click (a
/// pick); anything longer is a camera drag.
const CLICK_SLOP: f32 = 4.0;

struct ImguiState {
    context: imgui::Context,
    platform: WinitPlatform,
}

struct App {
    renderer: Option<Renderer>,
    viewer: ViewerState,
    imgui: Option<ImguiState>,
    mouse_pos: Vec2,
    left_pressed_at: Option<Vec2>,
    left_down: bool,
    right_down: bool,
    last_frame: Instant,
}

impl App {
    fn from_viewer(viewer: ViewerState) -> Self {
        Self {
            renderer: None,
            viewer,
            imgui: None,
            mouse_pos: Vec2::ZERO,
            left_pressed_at: None,
            left_down: false,
            right_down: false,
            last_frame: Instant::now(),
        }
    }

    fn setup_imgui(&mut self, window: &Window) {
        let mut context = imgui::Context::create();
        let mut platform = WinitPlatform::new(&mut context);
        platform.attach_window(
            context.io_mut(),
            window,
            imgui_winit_support::HiDpiMode::Default,
        );

        let font_size = 14.0;
        context.fonts().add_font(&[FontSource::DefaultFontData {
            config: Some(FontConfig {
                oversample_h: 1,
                pixel_snap_h: true,
                size_pixels: font_size,
                ..Default::default()
            }),
        }]);

        // Disable INI support because it's broken in the published version of imgui
        context.set_ini_filename(None);

        self.imgui = Some(ImguiState { context, platform });
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &winit::event_loop::ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes().with_title("cadview");
        let window = event_loop.create_window(window_attributes).unwrap();
        self.setup_imgui(&window);

        let renderer = pollster::block_on(Renderer::new(
            Arc::new(window),
            &self.viewer,
            &mut self.imgui.as_mut().unwrap().context,
        ))
        .unwrap();

        let size = renderer.size;
        if size.height > 0 {
            self.viewer
                .camera
                .set_aspect(size.width as f32 / size.height as f32);
        }

        self.renderer = Some(renderer);

        self.renderer
            .as_mut()
            .unwrap()
            .load_models(&mut self.viewer)
            .unwrap();
    }

    fn window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let imgui = self.imgui.as_mut().unwrap();

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { ref event, .. } => {
                if event.physical_key == PhysicalKey::Code(KeyCode::Escape) {
                    event_loop.exit();
                }
            }
            WindowEvent::Resized(new_size) => {
                self.renderer.as_mut().unwrap().resize(new_size);
                if new_size.height > 0 {
                    self.viewer
                        .camera
                        .set_aspect(new_size.width as f32 / new_size.height as f32);
                }
            }
            WindowEvent::RedrawRequested => {
                let delta_time = self.last_frame.elapsed();
                let now = Instant::now();
                imgui.context.io_mut().update_delta_time(delta_time);
                self.last_frame = now;

                let renderer = self.renderer.as_mut().unwrap();
                renderer.window.request_redraw();

                imgui
                    .platform
                    .prepare_frame(imgui.context.io_mut(), &renderer.window)
                    .expect("Failed to prepare Imgui frame");

                let ui = imgui.context.new_frame();

                engine::update(&mut self.viewer, ui).expect("Error during engine::update");

                match renderer.render(&mut self.viewer, &mut imgui.context) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        renderer.resize(renderer.size);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory");
                        event_loop.exit();
                    }
                    Err(wgpu::SurfaceError::Timeout) => {
                        log::warn!("Timeout");
                    }
                    Err(other) => {
                        log::error!("Unexpected error: {:?}", other);
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let position = Vec2::new(position.x as f32, position.y as f32);
                let delta = position - self.mouse_pos;

                if !imgui.context.io().want_capture_mouse {
                    if self.left_down {
                        self.viewer.camera.orbit(delta);
                    }
                    if self.right_down {
                        self.viewer.camera.pan(delta);
                    }
                }

                self.mouse_pos = position;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if !imgui.context.io().want_capture_mouse {
                    let amount = match delta {
                        MouseScrollDelta::LineDelta(_, y) => y,
                        MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 40.0,
                    };
                    self.viewer.camera.zoom(amount);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let io_captures = imgui.context.io().want_capture_mouse;

                match (button, state) {
                    (MouseButton::Left, ElementState::Pressed) => {
                        self.left_down = true;
                        self.left_pressed_at = (!io_captures).then_some(self.mouse_pos);
                    }
                    (MouseButton::Left, ElementState::Released) => {
                        self.left_down = false;

                        if let Some(pressed_at) = self.left_pressed_at.take() {
                            let travelled = (self.mouse_pos - pressed_at).length();
                            if travelled <= CLICK_SLOP && !io_captures {
                                if let Some(renderer) = &self.renderer {
                                    self.viewer.handle_click(self.mouse_pos, renderer.size);
                                }
                            }
                        }
                    }
                    (MouseButton::Right, ElementState::Pressed) => {
                        self.right_down = true;
                    }
                    (MouseButton::Right, ElementState::Released) => {
                        self.right_down = false;
                    }
                    _ => {}
                }
            }
            _ => (),
        }

        {
            let window = self.renderer.as_mut().unwrap().window.as_ref();
            imgui.platform.handle_event::<()>(
                imgui.context.io_mut(),
                window,
                &Event::WindowEvent { window_id, event },
            );
        }
    }

    fn about_to_wait(&mut self, _event_loop: &winit::event_loop::ActiveEventLoop) {
        // Keep redrawing for the lifetime of the window.
        if let Some(renderer) = &self.renderer {
            renderer.window.request_redraw();
        }
    }
}

pub async fn run() -> anyhow::Result<()> {
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let viewer = ViewerState::new();
    let mut app = App::from_viewer(viewer);
    event_loop.run_app(&mut app)?;

    Ok(())
}
