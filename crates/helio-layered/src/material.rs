//! Closed set of material kinds understood by the layer passes

/// Surface description of a scene object
///
/// Each kind carries exactly the properties it supports, so opacity and
/// emission are resolved by matching on the variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Material {
    /// Opaque unlit colour
    Basic { color: [f32; 3] },
    /// Opaque colour scaled by an emission intensity (may exceed 1.0)
    Emissive { color: [f32; 3], intensity: f32 },
    /// Alpha-blended colour, used for UI sprites
    Sprite { color: [f32; 3], opacity: f32 },
}

impl Material {
    pub fn basic(color: [f32; 3]) -> Self {
        Material::Basic { color }
    }

    pub fn emissive(color: [f32; 3], intensity: f32) -> Self {
        Material::Emissive { color, intensity: intensity.max(0.0) }
    }

    pub fn sprite(color: [f32; 3], opacity: f32) -> Self {
        Material::Sprite { color, opacity: opacity.clamp(0.0, 1.0) }
    }

    pub fn opacity(&self) -> f32 {
        match *self {
            Material::Basic { .. } | Material::Emissive { .. } => 1.0,
            Material::Sprite { opacity, .. } => opacity.clamp(0.0, 1.0),
        }
    }

    /// Linear RGBA written by the instance shader (straight alpha)
    pub fn linear_color(&self) -> [f32; 4] {
        match *self {
            Material::Basic { color } => [color[0], color[1], color[2], 1.0],
            Material::Emissive { color, intensity } => {
                let k = intensity.max(0.0);
                [color[0] * k, color[1] * k, color[2] * k, 1.0]
            }
            Material::Sprite { color, .. } => [color[0], color[1], color[2], self.opacity()],
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.opacity() < 1.0
    }
}

impl Default for Material {
    fn default() -> Self {
        Material::basic([1.0, 1.0, 1.0])
    }
}
