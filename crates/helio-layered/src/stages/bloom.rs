//! Bloom extraction - draws glowing objects in isolation and filters them

use super::{LayerStage, StageContext, StageReport};
use crate::backend::{ColorFormat, Extent, RenderBackend, TRANSPARENT};
use crate::driver::FramePhase;
use crate::layers::LayerMask;
use crate::targets::SizedTarget;
use crate::Result;

/// Renders the bloom layer into a scratch target, then high-passes and blurs
/// it into the shared bloom buffer.
///
/// The bloom buffer is rewritten every frame: when bloom is disabled or no
/// object glows it is cleared to transparent, so a stale glow never reaches
/// the composition.
pub struct BloomExtractionStage<T> {
    scratch: SizedTarget<T>,
}

impl<T> BloomExtractionStage<T> {
    pub const SCRATCH_LABEL: &'static str = "Bloom Scratch";

    pub fn new<B>(backend: &mut B, extent: Extent, format: ColorFormat) -> Result<Self>
    where
        B: RenderBackend<Target = T>,
    {
        Ok(Self {
            scratch: SizedTarget::allocate(backend, Self::SCRATCH_LABEL, extent, format)?,
        })
    }

    pub fn scratch(&self) -> Option<&T> {
        self.scratch.target()
    }
}

impl<B: RenderBackend> LayerStage<B> for BloomExtractionStage<B::Target> {
    fn name(&self) -> &str {
        "bloom_extraction"
    }

    fn phase(&self) -> FramePhase {
        FramePhase::BloomPass
    }

    fn layers(&self) -> LayerMask {
        LayerMask::BLOOM
    }

    fn reconfigure(
        &mut self,
        backend: &mut B,
        extent: Extent,
        format: ColorFormat,
    ) -> Result<bool> {
        self.scratch.reconfigure(backend, extent, format)
    }

    fn release(&mut self, backend: &mut B) {
        self.scratch.release(backend);
    }

    fn execute(&mut self, ctx: &mut StageContext<'_, B>) -> Result<StageReport> {
        let output = ctx.targets.bloom_buffer()?;
        let instances = ctx.scene.instances_visible_to(ctx.camera);

        if ctx.bloom.is_disabled() || instances.is_empty() {
            ctx.backend.clear(output, TRANSPARENT)?;
            return Ok(StageReport::default());
        }

        let scratch = self.scratch.get()?;
        ctx.backend
            .draw_instances(scratch, &ctx.camera.uniform(), &instances, Some(TRANSPARENT))?;
        ctx.backend.bloom_filter(scratch, output, ctx.bloom)?;

        Ok(StageReport {
            draws: instances.len(),
            filtered: true,
        })
    }
}
