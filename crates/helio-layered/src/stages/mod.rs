//! Layer stages executed once per frame, in order: bloom, overlay, base + composite

mod bloom;
mod composite;
mod overlay;

pub use bloom::BloomExtractionStage;
pub use composite::BaseCompositeStage;
pub use overlay::OverlayStage;

use crate::backend::{ColorFormat, Extent, RenderBackend};
use crate::camera::Camera;
use crate::config::BloomParameters;
use crate::driver::FramePhase;
use crate::layers::LayerMask;
use crate::scene::Scene;
use crate::targets::RenderTargetSet;
use crate::Result;

/// Stage trait - implemented by all layer stages
pub trait LayerStage<B: RenderBackend> {
    /// Unique name for this stage
    fn name(&self) -> &str;

    /// Frame phase reported while this stage runs
    fn phase(&self) -> FramePhase;

    /// Camera mask installed for the duration of `execute`
    fn layers(&self) -> LayerMask;

    /// Resize or reformat stage-owned working targets; returns whether any
    /// were reallocated
    fn reconfigure(
        &mut self,
        _backend: &mut B,
        _extent: Extent,
        _format: ColorFormat,
    ) -> Result<bool> {
        Ok(false)
    }

    /// Hand stage-owned targets back to the backend
    fn release(&mut self, _backend: &mut B) {}

    /// Execute the stage
    fn execute(&mut self, ctx: &mut StageContext<'_, B>) -> Result<StageReport>;
}

/// Context for stage execution
pub struct StageContext<'a, B: RenderBackend> {
    pub backend: &'a mut B,
    pub scene: &'a Scene,
    /// Camera with the stage's mask already installed
    pub camera: &'a Camera,
    /// Shared bloom and overlay buffers
    pub targets: &'a RenderTargetSet<B::Target>,
    /// Output of the final composition
    pub surface: &'a B::Surface,
    /// Effective bloom parameters for this frame
    pub bloom: &'a BloomParameters,
}

/// What a stage did this frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageReport {
    /// Instances drawn
    pub draws: usize,
    /// Whether the bloom filter ran
    pub filtered: bool,
}
