//! Render one layered frame on the CPU and save it as a PNG
//!
//! Usage: headless_snapshot [output.png] [high|medium|low]

use glam::Vec3;
use helio_layered::{
    BloomOverrides, Camera, ColorFormat, Extent, FrameState, Material, PipelineConfig,
    PipelineDriver, QualityProfile, Scene, Shape, SoftwareBackend,
};

const WIDTH: u32 = 320;
const HEIGHT: u32 = 180;

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let path = args.next().unwrap_or_else(|| "layered_bloom.png".to_string());
    let profile = match args.next() {
        Some(name) => name.parse::<QualityProfile>().unwrap_or_else(|e| {
            log::error!("{}", e);
            std::process::exit(2);
        }),
        None => QualityProfile::High,
    };
    log::info!("Rendering {}x{} snapshot ({} profile) to {}", WIDTH, HEIGHT, profile, path);

    let mut scene = Scene::new();
    let red = Material::basic([1.0, 0.0, 0.0]);
    scene.add("red_cube", Shape::Quad, Vec3::new(-60.0, 0.0, 0.0), 24.0, red);
    scene.add_glowing(
        "cyan_sphere",
        Shape::Disc,
        Vec3::new(40.0, 0.0, 0.0),
        24.0,
        Material::basic([0.0, 1.0, 1.0]),
    );
    scene.add_overlay(
        "hud_square",
        Shape::Quad,
        Vec3::new(56.0, 0.0, 1.0),
        10.0,
        Material::sprite([1.0, 1.0, 1.0], 1.0),
    );

    // one world unit per pixel
    let half_w = WIDTH as f32 / 2.0;
    let half_h = HEIGHT as f32 / 2.0;
    let mut camera = Camera::orthographic(
        Vec3::new(0.0, 0.0, 10.0),
        Vec3::ZERO,
        Vec3::Y,
        -half_w,
        half_w,
        -half_h,
        half_h,
        0.1,
        100.0,
    );

    let config = PipelineConfig::new(WIDTH, HEIGHT)
        .with_bloom(BloomOverrides::new().with_radius(0.25))
        .with_profile(profile);
    let mut driver =
        PipelineDriver::new(SoftwareBackend::new(), config).expect("Failed to create pipeline");
    let surface = driver
        .backend_mut()
        .create_surface(Extent::new(WIDTH, HEIGHT), ColorFormat::Rgba8Unorm);

    let mut frame = FrameState::new();
    driver
        .render_frame(&scene, &mut camera, &surface, &mut frame)
        .expect("Failed to render frame");

    let pixels = driver
        .backend()
        .read_rgba8(&surface)
        .expect("Failed to read surface");
    let image = image::RgbaImage::from_raw(WIDTH, HEIGHT, pixels).expect("Surface size mismatch");
    image.save(&path).expect("Failed to write PNG");

    log::info!(
        "Wrote {} (bloom draws {}, overlay draws {}, base draws {})",
        path,
        frame.bloom_draws,
        frame.overlay_draws,
        frame.base_draws
    );
}
