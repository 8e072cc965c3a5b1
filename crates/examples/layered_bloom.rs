//! Selective bloom with a bloom-free UI overlay
//!
//! A red cube, a glowing cyan sphere orbiting it and a white HUD square that
//! sits in front of the sphere's path. Only the sphere blooms; the HUD stays
//! crisp even while the glow passes behind it.
//!
//! Controls:
//!   1 / 2 / 3   quality profile high / medium / low
//!   Escape      exit

use glam::Vec3;
use helio_layered::{
    BloomOverrides, Camera, FrameState, GpuBackend, Material, ObjectId, PipelineConfig,
    PipelineDriver, PipelineStatus, QualityProfile, Scene, Shape,
};
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

fn main() {
    env_logger::init();
    log::info!("Starting Helio layered bloom example");

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    let mut app = App::new();

    event_loop.run_app(&mut app).expect("Event loop error");
}

struct App {
    state: Option<AppState>,
}

struct AppState {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    surface_config: wgpu::SurfaceConfiguration,
    driver: PipelineDriver<GpuBackend>,
    scene: Scene,
    sphere: ObjectId,
    camera: Camera,
    frame: FrameState,
    last_frame: std::time::Instant,
}

impl App {
    fn new() -> Self {
        Self { state: None }
    }
}

fn build_scene() -> (Scene, ObjectId) {
    let mut scene = Scene::new().with_sky([0.02, 0.02, 0.04]);
    let red = Material::basic([1.0, 0.0, 0.0]);
    scene.add("red_cube", Shape::Quad, Vec3::new(-1.5, 0.0, 0.0), 0.6, red);
    let sphere = scene.add_glowing(
        "cyan_sphere",
        Shape::Disc,
        Vec3::new(1.5, 0.0, 0.0),
        0.6,
        Material::basic([0.0, 1.0, 1.0]),
    );
    scene.add_overlay(
        "hud_square",
        Shape::Quad,
        Vec3::new(1.9, 0.0, 1.5),
        0.25,
        Material::sprite([1.0, 1.0, 1.0], 1.0),
    );
    (scene, sphere)
}

fn camera_for(width: u32, height: u32) -> Camera {
    Camera::perspective(
        Vec3::new(0.0, 0.0, 6.0),
        Vec3::ZERO,
        Vec3::Y,
        std::f32::consts::FRAC_PI_4,
        width as f32 / height.max(1) as f32,
        0.1,
        100.0,
    )
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        let window = Arc::new(
            event_loop
                .create_window(
                    Window::default_attributes()
                        .with_title("Helio – Layered Bloom")
                        .with_inner_size(winit::dpi::LogicalSize::new(1280u32, 720u32)),
                )
                .expect("Failed to create window"),
        );

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .expect("Failed to create surface");

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .expect("Failed to find adapter");

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Main Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
            },
            None,
        ))
        .expect("Failed to create device");

        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let size = window.inner_size();
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let backend = GpuBackend::new(device.clone(), queue, surface_format)
            .expect("Failed to create GPU backend");
        let config = PipelineConfig::new(size.width, size.height).with_bloom(
            BloomOverrides::new()
                .with_strength(1.5)
                .with_threshold(0.4)
                .with_radius(0.4)
                .with_exposure(1.0),
        );
        let driver = PipelineDriver::new(backend, config).expect("Failed to create pipeline");

        let (scene, sphere) = build_scene();

        self.state = Some(AppState {
            window,
            surface,
            device,
            surface_config,
            driver,
            scene,
            sphere,
            camera: camera_for(size.width, size.height),
            frame: FrameState::new(),
            last_frame: std::time::Instant::now(),
        });
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(state) = &mut self.state else { return };
        // events can still arrive between teardown and exit
        if state.driver.status() == PipelineStatus::TornDown {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Shutting down");
                state.driver.teardown();
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event: KeyEvent {
                    state: ElementState::Pressed,
                    physical_key: PhysicalKey::Code(key),
                    repeat: false,
                    ..
                },
                ..
            } => {
                let profile = match key {
                    KeyCode::Digit1 => Some(QualityProfile::High),
                    KeyCode::Digit2 => Some(QualityProfile::Medium),
                    KeyCode::Digit3 => Some(QualityProfile::Low),
                    KeyCode::Escape => {
                        state.driver.teardown();
                        event_loop.exit();
                        None
                    }
                    _ => None,
                };
                if let Some(profile) = profile {
                    state.driver.set_profile(profile);
                    state
                        .window
                        .set_title(&format!("Helio – Layered Bloom ({})", profile));
                }
            }

            WindowEvent::Resized(size) if size.width > 0 && size.height > 0 => {
                state.surface_config.width = size.width;
                state.surface_config.height = size.height;
                state.surface.configure(&state.device, &state.surface_config);
                if let Err(e) = state.driver.resize(size.width, size.height) {
                    log::error!("Resize failed: {}", e);
                }
                let layers = state.camera.layers;
                state.camera = camera_for(size.width, size.height).with_layers(layers);
            }

            WindowEvent::RedrawRequested => {
                let now = std::time::Instant::now();
                let dt = (now - state.last_frame).as_secs_f32();
                state.last_frame = now;
                state.render(dt);
                state.window.request_redraw();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }
}

impl AppState {
    fn render(&mut self, dt: f32) {
        self.frame.tick(dt);

        // Sphere orbits the cube, passing behind the HUD square
        let t = self.frame.elapsed * 0.6;
        if let Some(sphere) = self.scene.get_mut(self.sphere) {
            sphere.position = Vec3::new(t.cos() * 1.8, t.sin() * 0.9, 0.0);
        }

        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(e) => {
                log::warn!("Surface error: {:?}", e);
                return;
            }
        };
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        if let Err(e) = self
            .driver
            .render_frame(&self.scene, &mut self.camera, &view, &mut self.frame)
        {
            log::error!("Render error: {}", e);
        }

        if self.frame.frame % 300 == 0 {
            log::debug!(
                "Frame {}: bloom {} / overlay {} / base {} draws",
                self.frame.frame,
                self.frame.bloom_draws,
                self.frame.overlay_draws,
                self.frame.base_draws
            );
        }

        output.present();
    }
}
