//! Base pass and final composition

use super::{LayerStage, StageContext, StageReport};
use crate::backend::{ColorFormat, CompositionInputs, Extent, RenderBackend};
use crate::driver::FramePhase;
use crate::layers::LayerMask;
use crate::targets::SizedTarget;
use crate::Result;

/// Draws the base layer into the scene colour target, then combines it with
/// the bloom and overlay buffers onto the surface.
pub struct BaseCompositeStage<T> {
    scene_color: SizedTarget<T>,
}

impl<T> BaseCompositeStage<T> {
    pub const SCENE_COLOR_LABEL: &'static str = "Scene Color";

    pub fn new<B>(backend: &mut B, extent: Extent, format: ColorFormat) -> Result<Self>
    where
        B: RenderBackend<Target = T>,
    {
        Ok(Self {
            scene_color: SizedTarget::allocate(backend, Self::SCENE_COLOR_LABEL, extent, format)?,
        })
    }

    pub fn scene_color(&self) -> Option<&T> {
        self.scene_color.target()
    }
}

impl<B: RenderBackend> LayerStage<B> for BaseCompositeStage<B::Target> {
    fn name(&self) -> &str {
        "base_composite"
    }

    fn phase(&self) -> FramePhase {
        FramePhase::BaseCompositePass
    }

    fn layers(&self) -> LayerMask {
        LayerMask::BASE
    }

    fn reconfigure(
        &mut self,
        backend: &mut B,
        extent: Extent,
        format: ColorFormat,
    ) -> Result<bool> {
        self.scene_color.reconfigure(backend, extent, format)
    }

    fn release(&mut self, backend: &mut B) {
        self.scene_color.release(backend);
    }

    fn execute(&mut self, ctx: &mut StageContext<'_, B>) -> Result<StageReport> {
        let scene_color = self.scene_color.get()?;
        let instances = ctx.scene.instances_visible_to(ctx.camera);
        let [r, g, b] = ctx.scene.sky_color;
        ctx.backend
            .draw_instances(scene_color, &ctx.camera.uniform(), &instances, Some([r, g, b, 1.0]))?;

        let inputs = CompositionInputs {
            base: scene_color,
            bloom: ctx.targets.bloom_buffer()?,
            overlay: ctx.targets.overlay_buffer()?,
        };
        ctx.backend.composite(inputs, ctx.bloom.exposure, ctx.surface)?;

        Ok(StageReport {
            draws: instances.len(),
            filtered: false,
        })
    }
}
