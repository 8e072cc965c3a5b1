//! CPU reference backend
//!
//! Rasterizes the same camera-facing primitives as the GPU shaders, one
//! pixel centre at a time, and runs the bloom filter and composition through
//! [`crate::composite`]. Used for headless rendering and tests.

use super::{
    ColorFormat, CompositionInputs, DrawInstance, Extent, RenderBackend, SHAPE_DISC, TRANSPARENT,
};
use crate::camera::CameraUniform;
use crate::composite;
use crate::config::BloomParameters;
use crate::{Error, Result};
use glam::{Mat4, Vec4};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared by every backend instance; ids are never reused
static NEXT_IMAGE_ID: AtomicU64 = AtomicU64::new(0);

fn next_image_id() -> u64 {
    NEXT_IMAGE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Handle to an image owned by a [`SoftwareBackend`]
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct SoftwareTarget {
    id: u64,
}

impl SoftwareTarget {
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Allocation counters for off-screen targets (surfaces are not counted)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocationStats {
    pub created: usize,
    pub released: usize,
}

impl AllocationStats {
    pub fn live(&self) -> usize {
        self.created - self.released
    }
}

struct Image {
    label: String,
    extent: Extent,
    format: ColorFormat,
    surface: bool,
    pixels: Vec<[f32; 4]>,
}

impl Image {
    fn new(label: &str, extent: Extent, format: ColorFormat, surface: bool) -> Self {
        Self {
            label: label.to_string(),
            extent,
            format,
            surface,
            pixels: vec![TRANSPARENT; extent.pixel_count()],
        }
    }

    fn store(&mut self, index: usize, value: [f32; 4]) {
        self.pixels[index] = match self.format {
            ColorFormat::Rgba8Unorm => value.map(|c| c.clamp(0.0, 1.0)),
            ColorFormat::Rgba16Float => value,
        };
    }
}

/// CPU implementation of [`RenderBackend`]
pub struct SoftwareBackend {
    images: HashMap<u64, Image>,
    stats: AllocationStats,
    max_dimension: u32,
    allocation_limit: Option<usize>,
    submitted_frames: u64,
    aborted_frames: u64,
}

impl SoftwareBackend {
    /// Matches the common `max_texture_dimension_2d` of desktop adapters
    pub const DEFAULT_MAX_DIMENSION: u32 = 8192;

    pub fn new() -> Self {
        Self {
            images: HashMap::new(),
            stats: AllocationStats::default(),
            max_dimension: Self::DEFAULT_MAX_DIMENSION,
            allocation_limit: None,
            submitted_frames: 0,
            aborted_frames: 0,
        }
    }

    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    /// Cap the number of live off-screen targets
    pub fn with_allocation_limit(mut self, limit: usize) -> Self {
        self.allocation_limit = Some(limit);
        self
    }

    pub fn set_max_dimension(&mut self, max_dimension: u32) {
        self.max_dimension = max_dimension;
    }

    pub fn set_allocation_limit(&mut self, limit: Option<usize>) {
        self.allocation_limit = limit;
    }

    pub fn stats(&self) -> AllocationStats {
        self.stats
    }

    /// Frames closed with `end_frame`
    pub fn submitted_frames(&self) -> u64 {
        self.submitted_frames
    }

    /// Frames closed with `abort_frame`
    pub fn aborted_frames(&self) -> u64 {
        self.aborted_frames
    }

    /// Create an output surface for [`RenderBackend::composite`]
    pub fn create_surface(&mut self, extent: Extent, format: ColorFormat) -> SoftwareTarget {
        let id = next_image_id();
        self.images.insert(id, Image::new("surface", extent, format, true));
        SoftwareTarget { id }
    }

    /// Resize a surface in place, discarding its contents
    pub fn resize_surface(&mut self, surface: &SoftwareTarget, extent: Extent) -> Result<()> {
        let image = self.image_mut(surface)?;
        image.extent = extent;
        image.pixels = vec![TRANSPARENT; extent.pixel_count()];
        Ok(())
    }

    pub fn destroy_surface(&mut self, surface: SoftwareTarget) {
        self.images.remove(&surface.id);
    }

    pub fn read_pixels(&self, target: &SoftwareTarget) -> Result<Vec<[f32; 4]>> {
        Ok(self.image(target)?.pixels.clone())
    }

    /// Pixel at `(x, y)`, origin top-left
    pub fn pixel(&self, target: &SoftwareTarget, x: u32, y: u32) -> Option<[f32; 4]> {
        let image = self.images.get(&target.id)?;
        if x >= image.extent.width || y >= image.extent.height {
            return None;
        }
        Some(image.pixels[(y * image.extent.width + x) as usize])
    }

    /// Tightly packed 8-bit RGBA rows
    pub fn read_rgba8(&self, target: &SoftwareTarget) -> Result<Vec<u8>> {
        let image = self.image(target)?;
        Ok(image
            .pixels
            .iter()
            .flat_map(|&p| composite::to_rgba8(p))
            .collect())
    }

    pub fn label(&self, target: &SoftwareTarget) -> Option<&str> {
        self.images.get(&target.id).map(|image| image.label.as_str())
    }

    fn image(&self, target: &SoftwareTarget) -> Result<&Image> {
        self.images
            .get(&target.id)
            .ok_or_else(|| Error::Resource(format!("unknown software target {}", target.id)))
    }

    fn image_mut(&mut self, target: &SoftwareTarget) -> Result<&mut Image> {
        self.images
            .get_mut(&target.id)
            .ok_or_else(|| Error::Resource(format!("unknown software target {}", target.id)))
    }

    /// One blur direction over `src`, written into `dst`
    fn blur(
        &mut self,
        src: &SoftwareTarget,
        dst: &SoftwareTarget,
        horizontal: bool,
        weights: &[f32],
        strength: Option<f32>,
    ) -> Result<()> {
        let input = self.read_pixels(src)?;
        let image = self.image_mut(dst)?;
        let (w, h) = (image.extent.width as i64, image.extent.height as i64);
        let taps = weights.len() as i64 - 1;

        for y in 0..h {
            for x in 0..w {
                let mut acc = [0.0f32; 4];
                for offset in -taps..=taps {
                    let (sx, sy) = if horizontal {
                        ((x + offset).clamp(0, w - 1), y)
                    } else {
                        (x, (y + offset).clamp(0, h - 1))
                    };
                    let weight = weights[offset.unsigned_abs() as usize];
                    let texel = input[(sy * w + sx) as usize];
                    for c in 0..4 {
                        acc[c] += texel[c] * weight;
                    }
                }
                if let Some(strength) = strength {
                    for c in acc.iter_mut().take(3) {
                        *c *= strength;
                    }
                    acc[3] = (acc[3] * strength).min(1.0);
                }
                image.store((y * w + x) as usize, acc);
            }
        }
        Ok(())
    }
}

impl Default for SoftwareBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBackend for SoftwareBackend {
    type Target = SoftwareTarget;
    type Surface = SoftwareTarget;

    fn name(&self) -> &str {
        "software"
    }

    fn create_target(
        &mut self,
        label: &str,
        extent: Extent,
        format: ColorFormat,
    ) -> Result<SoftwareTarget> {
        if extent.width > self.max_dimension || extent.height > self.max_dimension {
            return Err(Error::Resource(format!(
                "{} {}x{} exceeds max dimension {}",
                label, extent.width, extent.height, self.max_dimension
            )));
        }
        if let Some(limit) = self.allocation_limit {
            if self.stats.live() >= limit {
                return Err(Error::Resource(format!(
                    "{}: allocation limit of {} targets reached",
                    label, limit
                )));
            }
        }

        let id = next_image_id();
        self.images.insert(id, Image::new(label, extent, format, false));
        self.stats.created += 1;
        log::debug!("Created software target '{}' {}x{}", label, extent.width, extent.height);
        Ok(SoftwareTarget { id })
    }

    fn release_target(&mut self, target: SoftwareTarget) {
        if let Some(image) = self.images.remove(&target.id) {
            if !image.surface {
                self.stats.released += 1;
            }
            log::debug!("Released software target '{}'", image.label);
        }
    }

    fn target_extent(&self, target: &SoftwareTarget) -> Extent {
        self.images
            .get(&target.id)
            .map(|image| image.extent)
            .unwrap_or(Extent::new(1, 1))
    }

    fn surface_extent(&self, surface: &SoftwareTarget) -> Option<Extent> {
        self.images.get(&surface.id).map(|image| image.extent)
    }

    fn end_frame(&mut self) -> Result<()> {
        self.submitted_frames += 1;
        Ok(())
    }

    fn abort_frame(&mut self) {
        self.aborted_frames += 1;
    }

    fn clear(&mut self, target: &SoftwareTarget, color: [f32; 4]) -> Result<()> {
        let image = self.image_mut(target)?;
        for i in 0..image.pixels.len() {
            image.store(i, color);
        }
        Ok(())
    }

    fn draw_instances(
        &mut self,
        target: &SoftwareTarget,
        camera: &CameraUniform,
        instances: &[DrawInstance],
        clear: Option<[f32; 4]>,
    ) -> Result<()> {
        if let Some(color) = clear {
            self.clear(target, color)?;
        }

        let view_proj = Mat4::from_cols_array_2d(&camera.view_proj);
        let image = self.image_mut(target)?;
        let (w, h) = (image.extent.width as f32, image.extent.height as f32);

        for instance in instances {
            let [x, y, z] = instance.position;
            let clip = view_proj * Vec4::new(x, y, z, 1.0);
            if clip.w <= 1e-6 {
                continue;
            }
            let ndc = clip.truncate() / clip.w;
            if !(0.0..=1.0).contains(&ndc.z) {
                continue;
            }

            let cx = (ndc.x * 0.5 + 0.5) * w;
            let cy = (1.0 - (ndc.y * 0.5 + 0.5)) * h;
            let rx = instance.half_size * camera.proj_scale[0].abs() / clip.w * 0.5 * w;
            let ry = instance.half_size * camera.proj_scale[1].abs() / clip.w * 0.5 * h;
            if rx <= 0.0 || ry <= 0.0 {
                continue;
            }

            let x0 = (cx - rx - 0.5).floor().max(0.0) as u32;
            let y0 = (cy - ry - 0.5).floor().max(0.0) as u32;
            let x1 = (cx + rx).ceil().min(w) as u32;
            let y1 = (cy + ry).ceil().min(h) as u32;

            let [r, g, b, a] = instance.color;
            let src = [r * a, g * a, b * a, a];

            for py in y0..y1 {
                for px in x0..x1 {
                    let u = (px as f32 + 0.5 - cx) / rx;
                    let v = (py as f32 + 0.5 - cy) / ry;
                    let covered = if instance.shape == SHAPE_DISC {
                        u * u + v * v <= 1.0
                    } else {
                        u.abs() <= 1.0 && v.abs() <= 1.0
                    };
                    if !covered {
                        continue;
                    }
                    let index = (py * image.extent.width + px) as usize;
                    let dst = image.pixels[index];
                    let inv = 1.0 - src[3];
                    let blended = [
                        src[0] + dst[0] * inv,
                        src[1] + dst[1] * inv,
                        src[2] + dst[2] * inv,
                        src[3] + dst[3] * inv,
                    ];
                    image.store(index, blended);
                }
            }
        }
        Ok(())
    }

    fn bloom_filter(
        &mut self,
        source: &SoftwareTarget,
        output: &SoftwareTarget,
        params: &BloomParameters,
    ) -> Result<()> {
        if self.image(source)?.extent != self.image(output)?.extent {
            return Err(Error::Resource("bloom source and output differ in size".into()));
        }

        let input = self.read_pixels(source)?;
        let image = self.image_mut(output)?;
        for (i, texel) in input.into_iter().enumerate() {
            image.store(i, composite::high_pass(texel, params.threshold));
        }

        let weights = composite::gaussian_weights(composite::kernel_radius(params.radius));
        self.blur(output, source, true, &weights, None)?;
        self.blur(source, output, false, &weights, Some(params.strength))
    }

    fn composite(
        &mut self,
        inputs: CompositionInputs<'_, SoftwareTarget>,
        exposure: f32,
        surface: &SoftwareTarget,
    ) -> Result<()> {
        let base = self.read_pixels(inputs.base)?;
        let bloom = self.read_pixels(inputs.bloom)?;
        let overlay = self.read_pixels(inputs.overlay)?;
        let image = self.image_mut(surface)?;
        if base.len() != image.pixels.len()
            || bloom.len() != base.len()
            || overlay.len() != base.len()
        {
            return Err(Error::Pipeline(format!(
                "composition inputs do not match surface {}x{}",
                image.extent.width, image.extent.height
            )));
        }

        for i in 0..base.len() {
            image.store(i, composite::compose_pixel(base[i], bloom[i], overlay[i], exposure));
        }
        Ok(())
    }
}
