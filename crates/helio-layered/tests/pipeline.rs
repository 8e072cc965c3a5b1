//! End-to-end frames through the software backend
//!
//! The camera maps world units to pixels one to one on a 64x64 viewport:
//! world `x` lands on pixel column `x + 32`, world `y` on row `32 - y`.

use glam::Vec3;
use helio_layered::backend::TRANSPARENT;
use helio_layered::{
    BloomOverrides, Camera, ColorFormat, Error, Extent, FramePhase, FrameState, LayerId, LayerMask,
    Material, ObjectId, PipelineConfig, PipelineDriver, PipelineStatus, QualityProfile,
    RenderBackend, Scene, Shape, SoftwareBackend, SoftwareTarget,
};

const SIZE: u32 = 64;
const EPS: f32 = 1e-4;

const RED_PIXEL: (u32, u32) = (12, 32);
const SPHERE_CENTRE: (u32, u32) = (42, 32);
/// One row above the sphere's silhouette, inside the blur reach
const HALO_PIXEL: (u32, u32) = (42, 25);
/// Inside the overlay square, which also covers the sphere here
const OVERLAY_PIXEL: (u32, u32) = (46, 32);

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn camera() -> Camera {
    Camera::orthographic(
        Vec3::new(0.0, 0.0, 10.0),
        Vec3::ZERO,
        Vec3::Y,
        -32.0,
        32.0,
        -32.0,
        32.0,
        0.1,
        100.0,
    )
}

fn config() -> PipelineConfig {
    PipelineConfig::new(SIZE, SIZE).with_bloom(
        BloomOverrides::new()
            .with_strength(1.5)
            .with_threshold(0.4)
            .with_radius(0.0)
            .with_exposure(1.0),
    )
}

struct Objects {
    sphere: ObjectId,
    overlay: ObjectId,
}

/// Red cube on the left, glowing cyan sphere on the right, white UI square
/// over the sphere's right edge
fn demo_scene() -> (Scene, Objects) {
    let mut scene = Scene::new();
    let red = Material::basic([1.0, 0.0, 0.0]);
    scene.add("red_cube", Shape::Quad, Vec3::new(-20.0, 0.0, 0.0), 6.0, red);
    let sphere = scene.add_glowing(
        "cyan_sphere",
        Shape::Disc,
        Vec3::new(10.0, 0.0, 0.0),
        6.0,
        Material::basic([0.0, 1.0, 1.0]),
    );
    let overlay = scene.add_overlay(
        "hud_square",
        Shape::Quad,
        Vec3::new(14.0, 0.0, 1.0),
        3.0,
        Material::sprite([1.0, 1.0, 1.0], 1.0),
    );
    (scene, Objects { sphere, overlay })
}

fn driver_with(config: PipelineConfig) -> (PipelineDriver<SoftwareBackend>, SoftwareTarget) {
    init_logging();
    let mut driver = PipelineDriver::new(SoftwareBackend::new(), config).unwrap();
    let surface = driver
        .backend_mut()
        .create_surface(Extent::new(config.width, config.height), ColorFormat::Rgba16Float);
    (driver, surface)
}

fn pixel(
    driver: &PipelineDriver<SoftwareBackend>,
    target: &SoftwareTarget,
    (x, y): (u32, u32),
) -> [f32; 4] {
    driver.backend().pixel(target, x, y).unwrap()
}

fn bloom_is_empty(driver: &PipelineDriver<SoftwareBackend>) -> bool {
    let bloom = driver.bloom_buffer().unwrap();
    driver
        .backend()
        .read_pixels(bloom)
        .unwrap()
        .iter()
        .all(|&p| p == TRANSPARENT)
}

#[test]
fn end_to_end_frame_composes_all_layers() {
    let (scene, _) = demo_scene();
    let (mut driver, surface) = driver_with(config());
    let mut cam = camera();
    let mut state = FrameState::new();

    driver.render_frame(&scene, &mut cam, &surface, &mut state).unwrap();

    // regular geometry is untouched
    assert_eq!(pixel(&driver, &surface, RED_PIXEL), [1.0, 0.0, 0.0, 1.0]);

    // the sphere gets its own glow on top of its base colour
    let centre = pixel(&driver, &surface, SPHERE_CENTRE);
    assert_eq!(centre[0], 0.0);
    assert!(centre[1] > 1.0);
    assert!((centre[1] - 2.5).abs() < EPS);
    assert!((centre[2] - 2.5).abs() < EPS);

    // halo outside the silhouette
    let scene_color = driver.scene_color().unwrap();
    assert_eq!(pixel(&driver, scene_color, HALO_PIXEL), [0.0, 0.0, 0.0, 1.0]);
    assert!(pixel(&driver, &surface, HALO_PIXEL)[1] > 0.0);

    // overlay is opaque white even over the glowing sphere
    assert_eq!(pixel(&driver, &surface, OVERLAY_PIXEL), [1.0, 1.0, 1.0, 1.0]);

    assert_eq!(state.bloom_draws, 1);
    assert_eq!(state.overlay_draws, 1);
    assert_eq!(state.base_draws, 2);
    assert!(state.bloom_filtered);
    assert_eq!(state.phase, FramePhase::Idle);
    assert_eq!(state.frame, 1);
}

#[test]
fn low_profile_renders_without_bloom() {
    let (scene, _) = demo_scene();
    let (mut driver, surface) = driver_with(config());
    let mut cam = camera();
    let mut state = FrameState::new();

    driver.render_frame(&scene, &mut cam, &surface, &mut state).unwrap();
    assert!(!bloom_is_empty(&driver));

    assert!(driver.set_profile(QualityProfile::Low));
    assert_eq!(driver.effective_bloom().strength, 0.0);
    for _ in 0..2 {
        driver.render_frame(&scene, &mut cam, &surface, &mut state).unwrap();
        assert!(bloom_is_empty(&driver));
    }

    assert_eq!(pixel(&driver, &surface, SPHERE_CENTRE), [0.0, 1.0, 1.0, 1.0]);
    assert_eq!(pixel(&driver, &surface, HALO_PIXEL), [0.0, 0.0, 0.0, 1.0]);
    assert_eq!(state.bloom_draws, 0);
    assert!(!state.bloom_filtered);
}

#[test]
fn low_profile_from_the_start_never_blooms() {
    let (scene, _) = demo_scene();
    let (mut driver, surface) = driver_with(config().with_profile(QualityProfile::Low));
    let mut cam = camera();
    let mut state = FrameState::new();

    driver.render_frame(&scene, &mut cam, &surface, &mut state).unwrap();
    assert!(bloom_is_empty(&driver));
    assert_eq!(pixel(&driver, &surface, SPHERE_CENTRE), [0.0, 1.0, 1.0, 1.0]);
}

#[test]
fn medium_profile_scales_the_glow() {
    let (scene, _) = demo_scene();
    let (mut driver, surface) = driver_with(config().with_profile(QualityProfile::Medium));
    let mut cam = camera();
    let mut state = FrameState::new();

    driver.render_frame(&scene, &mut cam, &surface, &mut state).unwrap();
    let centre = pixel(&driver, &surface, SPHERE_CENTRE);
    assert!((centre[1] - 2.2).abs() < EPS);
}

#[test]
fn overlay_objects_never_reach_the_bloom_buffer() {
    init_logging();
    let mut scene = Scene::new();
    let hud = scene.add_overlay(
        "hud_square",
        Shape::Quad,
        Vec3::new(14.0, 0.0, 1.0),
        3.0,
        Material::sprite([1.0, 1.0, 1.0], 1.0),
    );
    assert!(!scene.enable_layer(hud, LayerId::Bloom));

    let (mut driver, surface) = driver_with(config());
    let mut cam = camera();
    let mut state = FrameState::new();
    driver.render_frame(&scene, &mut cam, &surface, &mut state).unwrap();

    assert!(bloom_is_empty(&driver));
    assert_eq!(state.bloom_draws, 0);
    let overlay = driver.overlay_buffer().unwrap();
    assert_eq!(pixel(&driver, overlay, OVERLAY_PIXEL), [1.0, 1.0, 1.0, 1.0]);
}

#[test]
fn overlay_stays_out_of_bloom_next_to_glowing_objects() {
    let (mut scene, objects) = demo_scene();
    assert_eq!(scene.layers().mask_of(objects.overlay), LayerMask::OVERLAY);
    assert_eq!(scene.layers().mask_of(objects.sphere), LayerMask::BASE | LayerMask::BLOOM);

    let (mut driver, surface) = driver_with(config());
    let mut cam = camera();
    let mut state = FrameState::new();
    driver.render_frame(&scene, &mut cam, &surface, &mut state).unwrap();
    let with_overlay = driver.backend().read_pixels(driver.bloom_buffer().unwrap()).unwrap();

    scene.remove(objects.overlay);
    driver.render_frame(&scene, &mut cam, &surface, &mut state).unwrap();
    let without_overlay = driver.backend().read_pixels(driver.bloom_buffer().unwrap()).unwrap();

    assert_eq!(with_overlay, without_overlay);
    assert_eq!(state.overlay_draws, 0);
}

#[test]
fn bloom_only_objects_are_added_not_drawn() {
    init_logging();
    let mut scene = Scene::new();
    scene.add_with_layers(
        "glow_only",
        Shape::Disc,
        Vec3::new(10.0, 0.0, 0.0),
        6.0,
        Material::basic([0.0, 1.0, 1.0]),
        LayerMask::BLOOM,
    );

    let (mut driver, surface) = driver_with(config());
    let mut cam = camera();
    let mut state = FrameState::new();
    driver.render_frame(&scene, &mut cam, &surface, &mut state).unwrap();
    assert_eq!(state.base_draws, 0);

    let backend = driver.backend();
    let base = backend.read_pixels(driver.scene_color().unwrap()).unwrap();
    let bloom = backend.read_pixels(driver.bloom_buffer().unwrap()).unwrap();
    let output = backend.read_pixels(&surface).unwrap();

    assert_eq!(base[(32 * SIZE + 42) as usize], [0.0, 0.0, 0.0, 1.0]);
    for i in 0..output.len() {
        for c in 0..3 {
            assert!((output[i][c] - (base[i][c] + bloom[i][c])).abs() < 1e-6);
        }
    }
    assert!(output[(32 * SIZE + 42) as usize][1] > 1.0);
}

#[test]
fn composition_is_deterministic() {
    let (scene, _) = demo_scene();
    let (mut driver, surface) = driver_with(config());
    let mut cam = camera();
    let mut state = FrameState::new();

    driver.render_frame(&scene, &mut cam, &surface, &mut state).unwrap();
    let first = driver.backend().read_rgba8(&surface).unwrap();
    driver.render_frame(&scene, &mut cam, &surface, &mut state).unwrap();
    let second = driver.backend().read_rgba8(&surface).unwrap();

    assert_eq!(first, second);
    assert_eq!(state.frame, 2);
}

#[test]
fn resize_round_trip_reuses_nothing_stale() {
    let (mut driver, _surface) = driver_with(config());
    let before = driver.backend().stats();
    assert_eq!(before.live(), 4);

    driver.resize(32, 32).unwrap();
    driver.resize(SIZE, SIZE).unwrap();

    let after = driver.backend().stats();
    assert_eq!(after.live(), before.live());
    assert_eq!(after.created, before.created + 2 * 4);
    assert_eq!(driver.targets().reallocations(), 2);
    assert_eq!(driver.viewport(), Extent::new(SIZE, SIZE));

    // same size again allocates nothing
    driver.resize(SIZE, SIZE).unwrap();
    assert_eq!(driver.backend().stats(), after);
    assert_eq!(driver.targets().reallocations(), 2);
}

#[test]
fn failed_resize_makes_the_pipeline_unavailable() {
    let (scene, _) = demo_scene();
    let (mut driver, surface) = driver_with(config());
    let mut cam = camera();
    let mut state = FrameState::new();

    driver.backend_mut().set_max_dimension(100);
    assert!(driver.resize(200, 200).is_err());
    assert_eq!(driver.status(), PipelineStatus::Unavailable);
    assert_eq!(driver.backend().stats().live(), 0);
    assert!(driver.bloom_buffer().is_none());

    let err = driver.render_frame(&scene, &mut cam, &surface, &mut state).unwrap_err();
    assert!(matches!(err, Error::Unavailable));
    assert_eq!(cam.layers, LayerMask::BASE);
    assert_eq!(state.frame, 0);

    driver.resize(SIZE, SIZE).unwrap();
    assert_eq!(driver.status(), PipelineStatus::Active);
    driver.render_frame(&scene, &mut cam, &surface, &mut state).unwrap();
    assert_eq!(state.frame, 1);
}

#[test]
fn construction_fails_when_targets_cannot_be_allocated() {
    init_logging();
    let backend = SoftwareBackend::new().with_allocation_limit(3);
    assert!(PipelineDriver::new(backend, config()).is_err());

    let backend = SoftwareBackend::new().with_max_dimension(32);
    assert!(PipelineDriver::new(backend, config()).is_err());

    let backend = SoftwareBackend::new().with_allocation_limit(4);
    assert!(PipelineDriver::new(backend, config()).is_ok());
}

#[test]
fn camera_mask_is_restored_after_frames() {
    let (scene, _) = demo_scene();
    let (mut driver, surface) = driver_with(config());
    let mut cam = camera().with_layers(LayerMask::BASE | LayerMask::OVERLAY);
    let mut state = FrameState::new();

    driver.render_frame(&scene, &mut cam, &surface, &mut state).unwrap();
    assert_eq!(cam.layers, LayerMask::BASE | LayerMask::OVERLAY);

    // a surface owned by another backend fails during composition
    let mut other = SoftwareBackend::new();
    let foreign = other.create_surface(Extent::new(SIZE, SIZE), ColorFormat::Rgba16Float);
    assert!(driver.render_frame(&scene, &mut cam, &foreign, &mut state).is_err());
    assert_eq!(cam.layers, LayerMask::BASE | LayerMask::OVERLAY);
    assert_eq!(state.phase, FramePhase::Idle);
    assert_eq!(state.frame, 1);
}

#[test]
fn failed_frames_are_aborted_not_submitted() {
    let (scene, _) = demo_scene();
    let (mut driver, surface) = driver_with(config());
    let mut cam = camera();
    let mut state = FrameState::new();

    driver.render_frame(&scene, &mut cam, &surface, &mut state).unwrap();
    assert_eq!(driver.backend().submitted_frames(), 1);
    assert_eq!(driver.backend().aborted_frames(), 0);

    // bloom and overlay succeed, composition onto the foreign surface fails
    let mut other = SoftwareBackend::new();
    let foreign = other.create_surface(Extent::new(SIZE, SIZE), ColorFormat::Rgba16Float);
    assert!(driver.render_frame(&scene, &mut cam, &foreign, &mut state).is_err());
    assert_eq!(driver.backend().submitted_frames(), 1);
    assert_eq!(driver.backend().aborted_frames(), 1);
    assert_eq!(state.frame, 1);

    driver.render_frame(&scene, &mut cam, &surface, &mut state).unwrap();
    assert_eq!(driver.backend().submitted_frames(), 2);
    assert_eq!(state.frame, 2);
}

#[test]
fn stale_surface_size_triggers_reconfiguration() {
    let (scene, _) = demo_scene();
    let (mut driver, surface) = driver_with(config());
    let mut cam = camera();
    let mut state = FrameState::new();

    driver.backend_mut().resize_surface(&surface, Extent::new(48, 40)).unwrap();
    driver.render_frame(&scene, &mut cam, &surface, &mut state).unwrap();

    assert_eq!(driver.viewport(), Extent::new(48, 40));
    assert_eq!(driver.targets().extent(), Extent::new(48, 40));
    let bloom = driver.bloom_buffer().unwrap();
    assert_eq!(driver.backend().target_extent(bloom), Extent::new(48, 40));
    assert_eq!(state.frame, 1);
}

#[test]
fn teardown_releases_every_target() {
    let (scene, _) = demo_scene();
    let (mut driver, surface) = driver_with(config());
    let mut cam = camera();
    let mut state = FrameState::new();

    driver.teardown();
    assert_eq!(driver.status(), PipelineStatus::TornDown);
    assert_eq!(driver.backend().stats().live(), 0);
    assert!(matches!(
        driver.render_frame(&scene, &mut cam, &surface, &mut state),
        Err(Error::TornDown)
    ));

    // a late resize or reconfiguration does not bring it back
    assert!(matches!(driver.resize(SIZE, SIZE), Err(Error::TornDown)));
    assert!(matches!(driver.set_config(config()), Err(Error::TornDown)));
    assert_eq!(driver.status(), PipelineStatus::TornDown);
    assert_eq!(driver.backend().stats().live(), 0);
    assert!(driver.bloom_buffer().is_none());
}

#[test]
fn overrides_take_effect_on_the_next_frame() {
    let (scene, _) = demo_scene();
    let (mut driver, surface) = driver_with(config());
    let mut cam = camera();
    let mut state = FrameState::new();

    assert!(driver.set_overrides(BloomOverrides::new().with_strength(0.0)));
    driver.render_frame(&scene, &mut cam, &surface, &mut state).unwrap();
    assert!(bloom_is_empty(&driver));
    assert_eq!(pixel(&driver, &surface, SPHERE_CENTRE), [0.0, 1.0, 1.0, 1.0]);
}

#[test]
fn switching_to_unorm_targets_clamps_the_glow() {
    let (scene, _) = demo_scene();
    let (mut driver, surface) = driver_with(config());
    let mut cam = camera();
    let mut state = FrameState::new();

    driver
        .set_config(config().with_color_format(ColorFormat::Rgba8Unorm))
        .unwrap();
    assert_eq!(driver.color_format(), ColorFormat::Rgba8Unorm);
    assert_eq!(driver.backend().stats().live(), 4);

    driver.render_frame(&scene, &mut cam, &surface, &mut state).unwrap();
    let bloom = driver.bloom_buffer().unwrap();
    assert_eq!(pixel(&driver, bloom, SPHERE_CENTRE)[1], 1.0);
    assert_eq!(pixel(&driver, &surface, SPHERE_CENTRE)[1], 2.0);
}

#[test]
fn failed_format_switch_recovers_in_the_new_format() {
    let (scene, _) = demo_scene();
    let (mut driver, surface) = driver_with(config());
    let mut cam = camera();
    let mut state = FrameState::new();

    driver.backend_mut().set_allocation_limit(Some(0));
    assert!(driver
        .set_config(config().with_color_format(ColorFormat::Rgba8Unorm))
        .is_err());
    assert_eq!(driver.status(), PipelineStatus::Unavailable);
    assert_eq!(driver.color_format(), ColorFormat::Rgba8Unorm);
    assert_eq!(driver.backend().stats().live(), 0);

    driver.backend_mut().set_allocation_limit(None);
    driver.resize(SIZE, SIZE).unwrap();
    assert_eq!(driver.status(), PipelineStatus::Active);
    assert_eq!(driver.targets().format(), ColorFormat::Rgba8Unorm);

    // the glow is clamped by the 8-bit buffer the driver reports
    driver.render_frame(&scene, &mut cam, &surface, &mut state).unwrap();
    let bloom = driver.bloom_buffer().unwrap();
    assert_eq!(pixel(&driver, bloom, SPHERE_CENTRE)[1], 1.0);
    assert_eq!(pixel(&driver, &surface, SPHERE_CENTRE)[1], 2.0);
}
