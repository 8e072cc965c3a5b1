//! Frame driver - owns the targets and runs the layer stages in order

use crate::backend::{ColorFormat, Extent, RenderBackend};
use crate::camera::Camera;
use crate::config::{
    BloomOverrides, BloomParameters, PerformanceProfileSelector, PipelineConfig, QualityProfile,
};
use crate::scene::Scene;
use crate::stages::{
    BaseCompositeStage, BloomExtractionStage, LayerStage, OverlayStage, StageContext, StageReport,
};
use crate::targets::RenderTargetSet;
use crate::{Error, Result};

/// Stage the driver is currently executing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FramePhase {
    #[default]
    Idle,
    BloomPass,
    OverlayPass,
    BaseCompositePass,
}

/// Per-frame bookkeeping owned by the caller and updated by the driver
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameState {
    /// Frames rendered successfully
    pub frame: u64,
    /// Seconds since the first tick
    pub elapsed: f32,
    pub delta_time: f32,
    pub phase: FramePhase,
    pub bloom_draws: usize,
    pub overlay_draws: usize,
    pub base_draws: usize,
    /// Whether the bloom filter ran in the last frame
    pub bloom_filtered: bool,
}

impl FrameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock by `delta_time` seconds
    pub fn tick(&mut self, delta_time: f32) {
        let dt = delta_time.max(0.0);
        self.delta_time = dt;
        self.elapsed += dt;
    }

    fn begin(&mut self) {
        self.bloom_draws = 0;
        self.overlay_draws = 0;
        self.base_draws = 0;
        self.bloom_filtered = false;
    }
}

/// Whether the driver can render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStatus {
    Active,
    /// Target allocation failed; frames are refused until a resize succeeds
    Unavailable,
    /// `teardown` ran; nothing brings the driver back
    TornDown,
}

/// Drives the bloom, overlay and base/composite stages for one viewport
pub struct PipelineDriver<B: RenderBackend> {
    backend: B,
    config: PipelineConfig,
    selector: PerformanceProfileSelector,
    targets: RenderTargetSet<B::Target>,
    bloom: BloomExtractionStage<B::Target>,
    overlay: OverlayStage,
    base: BaseCompositeStage<B::Target>,
    viewport: Extent,
    status: PipelineStatus,
}

impl<B: RenderBackend> PipelineDriver<B> {
    /// Allocate every target at the configured size
    pub fn new(mut backend: B, config: PipelineConfig) -> Result<Self> {
        let viewport = config.extent();
        log::info!("Creating layered pipeline ({} backend)", backend.name());
        log::info!("  Resolution: {}x{}", viewport.width, viewport.height);
        log::info!("  Profile: {}", config.profile);

        let (targets, bloom, base) = allocate_all(&mut backend, viewport, config.color_format)?;
        let selector = PerformanceProfileSelector::new(config.bloom_parameters(), config.profile);

        Ok(Self {
            backend,
            config,
            selector,
            targets,
            bloom,
            overlay: OverlayStage::new(),
            base,
            viewport,
            status: PipelineStatus::Active,
        })
    }

    /// Resize every target; on failure the driver becomes unavailable
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if self.status == PipelineStatus::TornDown {
            return Err(Error::TornDown);
        }
        let extent = Extent::new(width, height);
        self.viewport = extent;
        self.config.width = extent.width;
        self.config.height = extent.height;

        match self.reconfigure_targets(extent) {
            Ok(reallocated) => {
                if reallocated {
                    log::info!("Resized layered pipeline to {}x{}", extent.width, extent.height);
                }
                self.status = PipelineStatus::Active;
                Ok(())
            }
            Err(err) => {
                log::error!("Failed to resize to {}x{}: {}", extent.width, extent.height, err);
                self.release_targets();
                self.status = PipelineStatus::Unavailable;
                Err(err)
            }
        }
    }

    fn reconfigure_targets(&mut self, extent: Extent) -> Result<bool> {
        let format = self.config.color_format;
        let backend = &mut self.backend;
        let shared = self.targets.reconfigure(backend, extent, format)?;
        let bloom = LayerStage::reconfigure(&mut self.bloom, backend, extent, format)?;
        let base = LayerStage::reconfigure(&mut self.base, backend, extent, format)?;
        Ok(shared || bloom || base)
    }

    fn release_targets(&mut self) {
        self.targets.release(&mut self.backend);
        LayerStage::release(&mut self.bloom, &mut self.backend);
        LayerStage::release(&mut self.base, &mut self.backend);
    }

    /// Switch quality profile; returns whether effective bloom changed
    pub fn set_profile(&mut self, profile: QualityProfile) -> bool {
        self.config.profile = profile;
        let changed = self.selector.set_profile(profile);
        if changed {
            log::info!("Quality profile: {}", profile);
        }
        changed
    }

    /// Replace the bloom overrides; returns whether effective bloom changed
    pub fn set_overrides(&mut self, overrides: BloomOverrides) -> bool {
        self.config.bloom = overrides;
        self.selector.set_base(overrides.resolve())
    }

    /// Apply a whole configuration, reallocating targets if size or format changed
    ///
    /// A failed reallocation leaves the driver unavailable with the new
    /// format recorded, so the next successful resize allocates in it.
    pub fn set_config(&mut self, config: PipelineConfig) -> Result<()> {
        if self.status == PipelineStatus::TornDown {
            return Err(Error::TornDown);
        }
        self.set_overrides(config.bloom);
        self.set_profile(config.profile);

        if config.color_format != self.config.color_format {
            log::info!("Target format changed to {:?}", config.color_format);
            self.config.color_format = config.color_format;
        }
        self.resize(config.width, config.height)
    }

    /// Render one frame into `surface`
    ///
    /// Runs the bloom, overlay and base/composite stages in that order, each
    /// with the camera narrowed to its layer. The camera's mask is restored
    /// after every stage, whether or not it succeeded.
    pub fn render_frame(
        &mut self,
        scene: &Scene,
        camera: &mut Camera,
        surface: &B::Surface,
        state: &mut FrameState,
    ) -> Result<()> {
        match self.status {
            PipelineStatus::Active => {}
            PipelineStatus::Unavailable => return Err(Error::Unavailable),
            PipelineStatus::TornDown => return Err(Error::TornDown),
        }

        if let Some(extent) = self.backend.surface_extent(surface) {
            if extent != self.viewport {
                log::info!(
                    "Surface is {}x{}, viewport {}x{}; reconfiguring",
                    extent.width,
                    extent.height,
                    self.viewport.width,
                    self.viewport.height
                );
                self.resize(extent.width, extent.height)?;
            }
        }

        let params = self.selector.effective();
        state.begin();
        self.backend.begin_frame()?;
        let result = self.run_stages(scene, camera, surface, &params, state);
        state.phase = FramePhase::Idle;

        if let Err(err) = result {
            self.backend.abort_frame();
            return Err(err);
        }
        self.backend.end_frame()?;
        state.frame += 1;
        Ok(())
    }

    fn run_stages(
        &mut self,
        scene: &Scene,
        camera: &mut Camera,
        surface: &B::Surface,
        params: &BloomParameters,
        state: &mut FrameState,
    ) -> Result<()> {
        let backend = &mut self.backend;
        let targets = &self.targets;

        let bloom =
            run_stage(&mut self.bloom, backend, targets, scene, camera, surface, params, state)?;
        state.bloom_draws = bloom.draws;
        state.bloom_filtered = bloom.filtered;

        let overlay =
            run_stage(&mut self.overlay, backend, targets, scene, camera, surface, params, state)?;
        state.overlay_draws = overlay.draws;

        let base =
            run_stage(&mut self.base, backend, targets, scene, camera, surface, params, state)?;
        state.base_draws = base.draws;
        Ok(())
    }

    /// Release every target; frames, resizes and reconfiguration return
    /// [`Error::TornDown`] from then on
    pub fn teardown(&mut self) {
        if self.status != PipelineStatus::TornDown {
            log::info!("Tearing down layered pipeline");
        }
        self.release_targets();
        self.status = PipelineStatus::TornDown;
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn profile(&self) -> QualityProfile {
        self.selector.profile()
    }

    /// Bloom parameters the next frame renders with
    pub fn effective_bloom(&self) -> BloomParameters {
        self.selector.effective()
    }

    pub fn status(&self) -> PipelineStatus {
        self.status
    }

    pub fn viewport(&self) -> Extent {
        self.viewport
    }

    pub fn color_format(&self) -> ColorFormat {
        self.config.color_format
    }

    pub fn targets(&self) -> &RenderTargetSet<B::Target> {
        &self.targets
    }

    pub fn bloom_buffer(&self) -> Option<&B::Target> {
        self.targets.bloom_buffer().ok()
    }

    pub fn overlay_buffer(&self) -> Option<&B::Target> {
        self.targets.overlay_buffer().ok()
    }

    /// Base pass output before composition
    pub fn scene_color(&self) -> Option<&B::Target> {
        self.base.scene_color()
    }
}

impl<B: RenderBackend> Drop for PipelineDriver<B> {
    fn drop(&mut self) {
        self.release_targets();
    }
}

type AllocatedTargets<T> = (RenderTargetSet<T>, BloomExtractionStage<T>, BaseCompositeStage<T>);

/// Allocate the shared buffers and the stage-owned targets, all or nothing
fn allocate_all<B: RenderBackend>(
    backend: &mut B,
    extent: Extent,
    format: ColorFormat,
) -> Result<AllocatedTargets<B::Target>> {
    let mut targets = RenderTargetSet::allocate(backend, extent, format)?;
    let mut bloom = match BloomExtractionStage::new(backend, extent, format) {
        Ok(stage) => stage,
        Err(err) => {
            targets.release(backend);
            return Err(err);
        }
    };
    match BaseCompositeStage::new(backend, extent, format) {
        Ok(base) => Ok((targets, bloom, base)),
        Err(err) => {
            LayerStage::release(&mut bloom, backend);
            targets.release(backend);
            Err(err)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_stage<B: RenderBackend, S: LayerStage<B>>(
    stage: &mut S,
    backend: &mut B,
    targets: &RenderTargetSet<B::Target>,
    scene: &Scene,
    camera: &mut Camera,
    surface: &B::Surface,
    params: &BloomParameters,
    state: &mut FrameState,
) -> Result<StageReport> {
    state.phase = stage.phase();
    let scope = camera.scoped(stage.layers());
    log::trace!("Executing stage: {}", stage.name());

    let mut ctx = StageContext {
        backend,
        scene,
        camera: &*scope,
        targets,
        surface,
        bloom: params,
    };
    stage.execute(&mut ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_accumulates_time() {
        let mut state = FrameState::new();
        state.tick(0.5);
        state.tick(0.25);
        assert_eq!(state.delta_time, 0.25);
        assert_eq!(state.elapsed, 0.75);
        state.tick(-1.0);
        assert_eq!(state.delta_time, 0.0);
        assert_eq!(state.phase, FramePhase::Idle);
    }
}
