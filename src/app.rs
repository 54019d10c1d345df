//! Window and event loop
//!
//! The scene is built on the CPU before the event loop starts; the window,
//! GPU and overlay are created on the first `resumed` and the scene is
//! uploaded then. Every frame advances the ghosts, eases the camera and
//! redraws.

use std::sync::Arc;

use rand::{rngs::StdRng, SeedableRng};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::config::SceneConfig;
use crate::error::{HauntedError, Result};
use crate::gfx::{
    camera::{CameraManager, Viewport},
    rendering::{RenderEngine, SurfaceRecovery},
    resources::TextureLoader,
    scene::Scene,
    ui::UiManager,
};
use crate::haunted::{build_scene, HauntedAnimation, SceneAnimation};

type UiPass = fn(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView);

pub struct HauntedApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    config: SceneConfig,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    ui_manager: Option<UiManager>,
    scene: Scene,
    animation: HauntedAnimation,
    viewport: Option<Viewport>,
    // First fatal error raised inside the event loop
    error: Option<HauntedError>,
}

impl HauntedApp {
    /// Builds the scene and the event loop; no window exists yet
    pub fn new(config: SceneConfig) -> Result<Self> {
        config.validate()?;
        let event_loop = EventLoop::new()?;

        let aspect = config.window.width as f32 / config.window.height.max(1) as f32;
        let mut scene = Scene::new(CameraManager::from_config(&config.camera, aspect));

        let seed = config.seed.unwrap_or_else(rand::random);
        log::info!("Grave seed: {seed}");
        let mut rng = StdRng::seed_from_u64(seed);

        let loader = TextureLoader::new(&config.textures.root);
        build_scene(&mut scene, &config, &loader, &mut rng)?;

        Ok(Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                config,
                window: None,
                render_engine: None,
                ui_manager: None,
                scene,
                animation: HauntedAnimation::new(),
                viewport: None,
                error: None,
            },
        })
    }

    /// Runs until the window closes; returns the first fatal error, if any
    pub fn run(mut self) -> Result<()> {
        let event_loop = self.event_loop.take().ok_or(HauntedError::EventLoopConsumed)?;
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut self.app_state)?;

        match self.app_state.error.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl AppState {
    fn init_graphics(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window_config = &self.config.window;
        let attributes = WindowAttributes::default()
            .with_title(window_config.title.clone())
            .with_inner_size(LogicalSize::new(window_config.width, window_config.height));
        let window = Arc::new(event_loop.create_window(attributes)?);

        let viewport = Viewport::resize(
            window.inner_size(),
            window.scale_factor(),
            window_config.max_pixel_ratio as f32,
        );

        let mut render_engine = pollster::block_on(RenderEngine::new(
            window.clone(),
            viewport.physical_width,
            viewport.physical_height,
            window_config.vsync,
        ))?;
        let viewport = viewport.clamped(render_engine.max_texture_dimension());
        render_engine.apply_viewport(&viewport);
        render_engine.init_scene(&mut self.scene);
        self.scene
            .camera_manager
            .resize(viewport.render_width, viewport.render_height);
        log::info!(
            "Window {}x{} logical, rendering {}x{} at pixel ratio {}",
            viewport.logical_width,
            viewport.logical_height,
            viewport.render_width,
            viewport.render_height,
            viewport.pixel_ratio
        );

        if self.config.debug_ui {
            let mut ui_manager = UiManager::new(
                render_engine.device(),
                render_engine.queue(),
                render_engine.surface_format(),
                &window,
            );
            let (width, height) = render_engine.surface_size();
            ui_manager.update_display_size(width, height);
            self.ui_manager = Some(ui_manager);
        }

        self.viewport = Some(viewport);
        self.render_engine = Some(render_engine);
        self.window = Some(window);
        Ok(())
    }

    fn resize(&mut self, physical: PhysicalSize<u32>, scale_factor: f64) {
        let max_pixel_ratio = self.config.window.max_pixel_ratio as f32;
        let mut viewport = Viewport::resize(physical, scale_factor, max_pixel_ratio);
        if viewport.is_empty() {
            return;
        }

        if let Some(render_engine) = self.render_engine.as_mut() {
            viewport = viewport.clamped(render_engine.max_texture_dimension());
            render_engine.apply_viewport(&viewport);
            if let Some(ui_manager) = self.ui_manager.as_mut() {
                let (width, height) = render_engine.surface_size();
                ui_manager.update_display_size(width, height);
            }
        }
        self.scene
            .camera_manager
            .resize(viewport.render_width, viewport.render_height);
        self.viewport = Some(viewport);
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(render_engine), Some(window)) =
            (self.render_engine.as_mut(), self.window.as_ref())
        else {
            return;
        };
        if self.viewport.is_some_and(|viewport| viewport.is_empty()) {
            return;
        }

        self.animation.tick(&mut self.scene);

        let result = match self.ui_manager.as_mut() {
            Some(ui_manager) => {
                let (animation, scene) = (&mut self.animation, &mut self.scene);
                ui_manager.update_logic(window, |ui| animation.render_ui(ui, scene));

                let result = render_engine.render_frame(
                    &mut self.scene,
                    Some(
                        |device: &wgpu::Device,
                         queue: &wgpu::Queue,
                         encoder: &mut wgpu::CommandEncoder,
                         view: &wgpu::TextureView| {
                            ui_manager.render_display_only(device, queue, encoder, view)
                        },
                    ),
                );
                if result.is_err() {
                    ui_manager.discard_frame();
                }
                result
            }
            None => render_engine.render_frame(&mut self.scene, None::<UiPass>),
        };

        if let Err(error) = result {
            if render_engine.recover(&error) == SurfaceRecovery::Exit {
                event_loop.exit();
            }
        }
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        if event.state == ElementState::Pressed
            && event.physical_key == PhysicalKey::Code(KeyCode::Escape)
        {
            event_loop.exit();
            return;
        }
        self.scene.camera_manager.process_keyboard_event(event);
    }

    fn ui_wants_input(&self) -> bool {
        self.ui_manager.as_ref().is_some_and(UiManager::wants_input)
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(error) = self.init_graphics(event_loop) {
            log::error!("Failed to start renderer: {error}");
            self.error = Some(error);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.clone() else {
            return;
        };

        // UI gets first look at input events
        if let Some(ui_manager) = self.ui_manager.as_mut() {
            let ui_event: winit::event::Event<()> = winit::event::Event::WindowEvent {
                window_id,
                event: event.clone(),
            };
            if ui_manager.handle_input(&window, &ui_event) {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(event_loop, &event),
            WindowEvent::MouseInput { state, button, .. } => {
                self.scene.camera_manager.process_mouse_button(button, state);
            }
            WindowEvent::Resized(size) => self.resize(size, window.scale_factor()),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.resize(window.inner_size(), scale_factor);
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => (),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if self.window.is_none() || self.ui_wants_input() {
            return;
        }
        self.scene.camera_manager.process_event(&event);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }
}
