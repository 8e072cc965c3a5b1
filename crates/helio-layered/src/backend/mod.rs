//! Backends that execute the layer passes
//!
//! The pipeline only talks to a [`RenderBackend`]. Targets are handles owned
//! by whoever allocated them and must be handed back through
//! [`RenderBackend::release_target`]; they are deliberately not `Clone`.

mod gpu;
mod software;

pub use gpu::{GpuBackend, GpuTarget};
pub use software::{AllocationStats, SoftwareBackend, SoftwareTarget};

use crate::camera::CameraUniform;
use crate::config::BloomParameters;
use crate::Result;

/// Fully transparent black, the cleared state of the bloom and overlay buffers
pub const TRANSPARENT: [f32; 4] = [0.0, 0.0, 0.0, 0.0];

/// Size of a render target in pixels (never zero)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Colour format of off-screen targets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ColorFormat {
    /// 8-bit, values clamp to `[0, 1]`
    Rgba8Unorm,
    /// Half-float HDR, keeps bloom energy above 1.0
    #[default]
    Rgba16Float,
}

impl ColorFormat {
    pub fn to_wgpu(self) -> wgpu::TextureFormat {
        match self {
            ColorFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
            ColorFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
        }
    }

    pub fn is_hdr(self) -> bool {
        matches!(self, ColorFormat::Rgba16Float)
    }
}

pub const SHAPE_QUAD: u32 = 0;
pub const SHAPE_DISC: u32 = 1;

/// Per-object record consumed by the instance shader (48 bytes)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawInstance {
    /// World-space centre
    pub position: [f32; 3],
    /// World-space half size of the camera-facing primitive
    pub half_size: f32,
    /// Linear RGBA, straight alpha
    pub color: [f32; 4],
    /// `SHAPE_QUAD` or `SHAPE_DISC`
    pub shape: u32,
    pub _pad: [u32; 3],
}

/// Read-only views bound to the composition shader for one frame
pub struct CompositionInputs<'a, T> {
    pub base: &'a T,
    pub bloom: &'a T,
    pub overlay: &'a T,
}

/// Executes the primitive operations of the layer passes
///
/// All draws blend with premultiplied alpha over the target contents, so
/// targets cleared to [`TRANSPARENT`] end up holding premultiplied colour.
pub trait RenderBackend {
    /// Off-screen colour target
    type Target;
    /// Presentable output written by the composition
    type Surface: ?Sized;

    fn name(&self) -> &str;

    fn create_target(
        &mut self,
        label: &str,
        extent: Extent,
        format: ColorFormat,
    ) -> Result<Self::Target>;

    fn release_target(&mut self, target: Self::Target);

    fn target_extent(&self, target: &Self::Target) -> Extent;

    /// Size of the surface if the backend can query it
    fn surface_extent(&self, surface: &Self::Surface) -> Option<Extent>;

    /// Start recording a frame
    fn begin_frame(&mut self) -> Result<()> {
        Ok(())
    }

    /// Submit everything recorded since `begin_frame`
    fn end_frame(&mut self) -> Result<()> {
        Ok(())
    }

    /// Drop everything recorded since `begin_frame` without submitting it
    fn abort_frame(&mut self) {}

    fn clear(&mut self, target: &Self::Target, color: [f32; 4]) -> Result<()>;

    /// Draw camera-facing primitives; `clear` replaces the target first
    fn draw_instances(
        &mut self,
        target: &Self::Target,
        camera: &CameraUniform,
        instances: &[DrawInstance],
        clear: Option<[f32; 4]>,
    ) -> Result<()>;

    /// Luminance high-pass of `source` followed by a separable blur scaled by
    /// `params.strength`, written to `output`. `source` is used as the blur's
    /// intermediate and holds garbage afterwards.
    fn bloom_filter(
        &mut self,
        source: &Self::Target,
        output: &Self::Target,
        params: &BloomParameters,
    ) -> Result<()>;

    /// Full-screen composition of base, bloom and overlay onto the surface
    fn composite(
        &mut self,
        inputs: CompositionInputs<'_, Self::Target>,
        exposure: f32,
        surface: &Self::Surface,
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extent_never_zero() {
        let extent = Extent::new(0, 0);
        assert_eq!(extent, Extent { width: 1, height: 1 });
        assert_eq!(Extent::new(640, 480).pixel_count(), 640 * 480);
    }

    #[test]
    fn draw_instance_layout_matches_shader() {
        assert_eq!(std::mem::size_of::<DrawInstance>(), 48);
        assert_eq!(std::mem::offset_of!(DrawInstance, color), 16);
        assert_eq!(std::mem::offset_of!(DrawInstance, shape), 32);
    }
}
