//! Overlay stage - UI elements into their own buffer, never bloomed

use super::{LayerStage, StageContext, StageReport};
use crate::backend::{RenderBackend, TRANSPARENT};
use crate::driver::FramePhase;
use crate::layers::LayerMask;
use crate::Result;

/// Renders overlay objects onto a transparent overlay buffer
#[derive(Debug, Default)]
pub struct OverlayStage;

impl OverlayStage {
    pub fn new() -> Self {
        Self
    }
}

impl<B: RenderBackend> LayerStage<B> for OverlayStage {
    fn name(&self) -> &str {
        "overlay"
    }

    fn phase(&self) -> FramePhase {
        FramePhase::OverlayPass
    }

    fn layers(&self) -> LayerMask {
        LayerMask::OVERLAY
    }

    fn execute(&mut self, ctx: &mut StageContext<'_, B>) -> Result<StageReport> {
        let output = ctx.targets.overlay_buffer()?;
        let instances = ctx.scene.instances_visible_to(ctx.camera);
        ctx.backend
            .draw_instances(output, &ctx.camera.uniform(), &instances, Some(TRANSPARENT))?;
        Ok(StageReport {
            draws: instances.len(),
            filtered: false,
        })
    }
}
