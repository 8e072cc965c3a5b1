//! Bloom parameters, quality profiles and pipeline configuration

use crate::backend::{ColorFormat, Extent};
use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Tuning of the bloom effect
///
/// `strength == 0.0` is the disabled state; the bloom pass then only clears
/// its buffer. Values are clamped into range by [`BloomParameters::sanitized`]
/// instead of being rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloomParameters {
    /// Glow multiplier, `>= 0`
    pub strength: f32,
    /// Luminance cutoff of the high-pass, in `[0, 1]`
    pub threshold: f32,
    /// Blur spread, `>= 0`
    pub radius: f32,
    /// Multiplier applied to the base + bloom sum during composition, `>= 0`
    pub exposure: f32,
}

impl BloomParameters {
    pub const DEFAULT_STRENGTH: f32 = 1.5;
    pub const DEFAULT_THRESHOLD: f32 = 0.4;
    pub const DEFAULT_RADIUS: f32 = 0.4;
    pub const DEFAULT_EXPOSURE: f32 = 1.0;

    pub fn new(strength: f32, threshold: f32, radius: f32, exposure: f32) -> Self {
        Self {
            strength,
            threshold,
            radius,
            exposure,
        }
        .sanitized()
    }

    /// Clamp every field into its valid range (NaN/inf fall back to defaults)
    pub fn sanitized(self) -> Self {
        Self {
            strength: non_negative(self.strength, Self::DEFAULT_STRENGTH),
            threshold: unit_interval(self.threshold, Self::DEFAULT_THRESHOLD),
            radius: non_negative(self.radius, Self::DEFAULT_RADIUS),
            exposure: non_negative(self.exposure, Self::DEFAULT_EXPOSURE),
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.strength <= 0.0
    }

    pub fn with_strength(mut self, strength: f32) -> Self {
        self.strength = non_negative(strength, Self::DEFAULT_STRENGTH);
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = unit_interval(threshold, Self::DEFAULT_THRESHOLD);
        self
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = non_negative(radius, Self::DEFAULT_RADIUS);
        self
    }

    pub fn with_exposure(mut self, exposure: f32) -> Self {
        self.exposure = non_negative(exposure, Self::DEFAULT_EXPOSURE);
        self
    }
}

impl Default for BloomParameters {
    fn default() -> Self {
        Self {
            strength: Self::DEFAULT_STRENGTH,
            threshold: Self::DEFAULT_THRESHOLD,
            radius: Self::DEFAULT_RADIUS,
            exposure: Self::DEFAULT_EXPOSURE,
        }
    }
}

fn non_negative(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        fallback
    }
}

fn unit_interval(value: f32, fallback: f32) -> f32 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Caller-supplied overrides merged over [`BloomParameters::default`]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BloomOverrides {
    pub strength: Option<f32>,
    pub threshold: Option<f32>,
    pub radius: Option<f32>,
    pub exposure: Option<f32>,
}

impl BloomOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strength(mut self, strength: f32) -> Self {
        self.strength = Some(strength);
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = Some(radius);
        self
    }

    pub fn with_exposure(mut self, exposure: f32) -> Self {
        self.exposure = Some(exposure);
        self
    }

    pub fn merge_over(&self, defaults: &BloomParameters) -> BloomParameters {
        BloomParameters {
            strength: self.strength.unwrap_or(defaults.strength),
            threshold: self.threshold.unwrap_or(defaults.threshold),
            radius: self.radius.unwrap_or(defaults.radius),
            exposure: self.exposure.unwrap_or(defaults.exposure),
        }
        .sanitized()
    }

    pub fn resolve(&self) -> BloomParameters {
        self.merge_over(&BloomParameters::default())
    }
}

/// Performance/quality trade-off applied on top of the configured bloom
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum QualityProfile {
    #[default]
    High,
    Medium,
    Low,
}

impl QualityProfile {
    pub const ALL: [QualityProfile; 3] = [
        QualityProfile::High,
        QualityProfile::Medium,
        QualityProfile::Low,
    ];

    /// Medium strength factor
    pub const MEDIUM_STRENGTH_SCALE: f32 = 0.8;

    /// Derive the parameters this profile renders with
    pub fn apply(self, params: &BloomParameters) -> BloomParameters {
        let mut derived = *params;
        match self {
            QualityProfile::High => {}
            QualityProfile::Medium => derived.strength *= Self::MEDIUM_STRENGTH_SCALE,
            QualityProfile::Low => derived.strength = 0.0,
        }
        derived
    }

    pub fn name(self) -> &'static str {
        match self {
            QualityProfile::High => "high",
            QualityProfile::Medium => "medium",
            QualityProfile::Low => "low",
        }
    }
}

impl fmt::Display for QualityProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for QualityProfile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(QualityProfile::High),
            "medium" => Ok(QualityProfile::Medium),
            "low" => Ok(QualityProfile::Low),
            other => Err(Error::Config(format!("unknown quality profile '{}'", other))),
        }
    }
}

/// Maps the configured bloom and the active profile to effective parameters
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PerformanceProfileSelector {
    base: BloomParameters,
    profile: QualityProfile,
}

impl PerformanceProfileSelector {
    pub fn new(base: BloomParameters, profile: QualityProfile) -> Self {
        Self {
            base: base.sanitized(),
            profile,
        }
    }

    pub fn profile(&self) -> QualityProfile {
        self.profile
    }

    pub fn base(&self) -> BloomParameters {
        self.base
    }

    pub fn effective(&self) -> BloomParameters {
        self.profile.apply(&self.base)
    }

    /// Switch profile; returns whether the effective parameters changed
    pub fn set_profile(&mut self, profile: QualityProfile) -> bool {
        let before = self.effective();
        self.profile = profile;
        before != self.effective()
    }

    /// Replace the configured parameters; returns whether the effective
    /// parameters changed
    pub fn set_base(&mut self, base: BloomParameters) -> bool {
        let before = self.effective();
        self.base = base.sanitized();
        before != self.effective()
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    pub width: u32,
    pub height: u32,
    /// Format of the off-screen targets
    pub color_format: ColorFormat,
    pub bloom: BloomOverrides,
    pub profile: QualityProfile,
}

impl PipelineConfig {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            color_format: ColorFormat::default(),
            bloom: BloomOverrides::default(),
            profile: QualityProfile::default(),
        }
    }

    pub fn with_bloom(mut self, bloom: BloomOverrides) -> Self {
        self.bloom = bloom;
        self
    }

    pub fn with_profile(mut self, profile: QualityProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_color_format(mut self, color_format: ColorFormat) -> Self {
        self.color_format = color_format;
        self
    }

    pub fn extent(&self) -> Extent {
        Extent::new(self.width, self.height)
    }

    pub fn bloom_parameters(&self) -> BloomParameters {
        self.bloom.resolve()
    }
}
