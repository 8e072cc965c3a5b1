//! Viewport-sized off-screen targets
//!
//! Targets are reused while the requested size and format match and
//! reallocated otherwise. Allocation failures release whatever was already created so a
//! set is either complete or empty.

use crate::backend::{ColorFormat, Extent, RenderBackend};
use crate::{Error, Result};

/// A single target that follows the viewport size
pub struct SizedTarget<T> {
    label: &'static str,
    format: ColorFormat,
    target: Option<T>,
    extent: Extent,
}

impl<T> SizedTarget<T> {
    pub fn allocate<B>(
        backend: &mut B,
        label: &'static str,
        extent: Extent,
        format: ColorFormat,
    ) -> Result<Self>
    where
        B: RenderBackend<Target = T> + ?Sized,
    {
        let target = backend.create_target(label, extent, format)?;
        Ok(Self {
            label,
            format,
            target: Some(target),
            extent,
        })
    }

    /// Make sure the target exists at `extent` in `format`; returns whether it
    /// was reallocated.
    ///
    /// The requested size and format are recorded before allocating, so a
    /// failed attempt leaves an empty holder that later retries in the new
    /// format.
    pub fn reconfigure<B>(
        &mut self,
        backend: &mut B,
        extent: Extent,
        format: ColorFormat,
    ) -> Result<bool>
    where
        B: RenderBackend<Target = T> + ?Sized,
    {
        if self.matches(extent, format) {
            return Ok(false);
        }
        if let Some(old) = self.target.take() {
            backend.release_target(old);
        }
        self.extent = extent;
        self.format = format;
        let target = backend.create_target(self.label, extent, format)?;
        self.target = Some(target);
        Ok(true)
    }

    /// True when the target exists at `extent` in `format`
    pub fn matches(&self, extent: Extent, format: ColorFormat) -> bool {
        self.target.is_some() && self.extent == extent && self.format == format
    }

    pub fn release<B>(&mut self, backend: &mut B)
    where
        B: RenderBackend<Target = T> + ?Sized,
    {
        if let Some(target) = self.target.take() {
            backend.release_target(target);
        }
    }

    pub fn target(&self) -> Option<&T> {
        self.target.as_ref()
    }

    /// The target, or an error naming it when it has been released
    pub fn get(&self) -> Result<&T> {
        self.target
            .as_ref()
            .ok_or_else(|| Error::Resource(format!("{} target is not allocated", self.label)))
    }

    pub fn is_allocated(&self) -> bool {
        self.target.is_some()
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn format(&self) -> ColorFormat {
        self.format
    }

    pub fn label(&self) -> &'static str {
        self.label
    }
}

/// The two layer buffers shared between passes: bloom output and overlay
pub struct RenderTargetSet<T> {
    bloom: SizedTarget<T>,
    overlay: SizedTarget<T>,
    reallocations: u64,
}

impl<T> RenderTargetSet<T> {
    pub const BLOOM_LABEL: &'static str = "Bloom Buffer";
    pub const OVERLAY_LABEL: &'static str = "Overlay Buffer";

    pub fn allocate<B>(backend: &mut B, extent: Extent, format: ColorFormat) -> Result<Self>
    where
        B: RenderBackend<Target = T> + ?Sized,
    {
        let mut bloom = SizedTarget::allocate(backend, Self::BLOOM_LABEL, extent, format)?;
        let overlay = match SizedTarget::allocate(backend, Self::OVERLAY_LABEL, extent, format) {
            Ok(overlay) => overlay,
            Err(err) => {
                bloom.release(backend);
                return Err(err);
            }
        };
        log::debug!("Allocated layer buffers {}x{}", extent.width, extent.height);
        Ok(Self {
            bloom,
            overlay,
            reallocations: 0,
        })
    }

    /// Resize or reformat both buffers; on failure both are released
    pub fn reconfigure<B>(
        &mut self,
        backend: &mut B,
        extent: Extent,
        format: ColorFormat,
    ) -> Result<bool>
    where
        B: RenderBackend<Target = T> + ?Sized,
    {
        if self.matches(extent, format) {
            return Ok(false);
        }
        let result = self
            .bloom
            .reconfigure(backend, extent, format)
            .and_then(|_| self.overlay.reconfigure(backend, extent, format));
        if let Err(err) = result {
            self.release(backend);
            return Err(err);
        }
        self.reallocations += 1;
        log::debug!(
            "Reallocated layer buffers at {}x{} ({:?})",
            extent.width,
            extent.height,
            format
        );
        Ok(true)
    }

    pub fn release<B>(&mut self, backend: &mut B)
    where
        B: RenderBackend<Target = T> + ?Sized,
    {
        self.bloom.release(backend);
        self.overlay.release(backend);
    }

    pub fn bloom_buffer(&self) -> Result<&T> {
        self.bloom.get()
    }

    pub fn overlay_buffer(&self) -> Result<&T> {
        self.overlay.get()
    }

    /// True when both buffers exist at `extent` in `format`
    pub fn matches(&self, extent: Extent, format: ColorFormat) -> bool {
        self.bloom.matches(extent, format) && self.overlay.matches(extent, format)
    }

    pub fn is_allocated(&self) -> bool {
        self.bloom.is_allocated() && self.overlay.is_allocated()
    }

    pub fn extent(&self) -> Extent {
        self.bloom.extent()
    }

    pub fn format(&self) -> ColorFormat {
        self.bloom.format()
    }

    /// Number of successful resizes since allocation
    pub fn reallocations(&self) -> u64 {
        self.reallocations
    }
}
