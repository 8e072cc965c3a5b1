//! Per-pixel math shared by the bloom filter and the final composition
//!
//! The WGSL shaders in `shaders/passes/` implement the same formulas; the
//! software backend calls these directly.

/// Rec.709 luma coefficients
pub const LUMA: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// Width of the soft knee above the bloom threshold
pub const THRESHOLD_SMOOTH_WIDTH: f32 = 0.01;

/// Blur taps used even at `radius == 0`
pub const MIN_KERNEL_RADIUS: u32 = 2;
/// Pixels of blur per unit of bloom radius
pub const RADIUS_TO_PIXELS: f32 = 12.0;
pub const MAX_KERNEL_RADIUS: u32 = 32;

pub fn luminance(rgb: [f32; 3]) -> f32 {
    LUMA[0] * rgb[0] + LUMA[1] * rgb[1] + LUMA[2] * rgb[2]
}

/// Hermite step, matching WGSL `smoothstep`
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Luminance high-pass: texels brighter than `threshold` pass, the rest fade
/// to transparent black over [`THRESHOLD_SMOOTH_WIDTH`].
pub fn high_pass(texel: [f32; 4], threshold: f32) -> [f32; 4] {
    let l = luminance([texel[0], texel[1], texel[2]]);
    let alpha = smoothstep(threshold, threshold + THRESHOLD_SMOOTH_WIDTH, l);
    texel.map(|c| c * alpha)
}

/// Number of taps on each side of the centre for a bloom radius
pub fn kernel_radius(radius: f32) -> u32 {
    let extra = (radius.max(0.0) * RADIUS_TO_PIXELS).round() as u32;
    (MIN_KERNEL_RADIUS + extra).min(MAX_KERNEL_RADIUS)
}

pub fn sigma(kernel_radius: u32) -> f32 {
    (kernel_radius as f32 / 2.0).max(0.5)
}

/// One-sided Gaussian weights `w[0..=kernel_radius]`, normalized so that
/// `w[0] + 2 * sum(w[1..])` is one.
pub fn gaussian_weights(kernel_radius: u32) -> Vec<f32> {
    let sigma = sigma(kernel_radius);
    let denom = 2.0 * sigma * sigma;
    let mut weights: Vec<f32> = (0..=kernel_radius)
        .map(|i| (-((i * i) as f32) / denom).exp())
        .collect();
    let total = weights[0] + 2.0 * weights[1..].iter().sum::<f32>();
    for w in &mut weights {
        *w /= total;
    }
    weights
}

/// Final composition of one pixel
///
/// `base` holds the scene colour, `bloom` the additive glow and `overlay`
/// premultiplied UI colour. Exposure scales the lit scene only; the overlay
/// is laid on top unchanged.
pub fn compose_pixel(
    base: [f32; 4],
    bloom: [f32; 4],
    overlay: [f32; 4],
    exposure: f32,
) -> [f32; 4] {
    let keep = 1.0 - overlay[3];
    let mut out = [0.0; 4];
    for c in 0..3 {
        let hdr = (base[c] + bloom[c]) * exposure;
        out[c] = hdr * keep + overlay[c];
    }
    out[3] = base[3].max(overlay[3]);
    out
}

/// Quantize a linear colour to 8 bits per channel
pub fn to_rgba8(pixel: [f32; 4]) -> [u8; 4] {
    pixel.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn high_pass_keeps_bright_and_drops_dark() {
        let cyan = [0.0, 1.0, 1.0, 1.0];
        assert_eq!(high_pass(cyan, 0.4), cyan);

        let dim = [0.2, 0.2, 0.2, 1.0];
        assert_eq!(high_pass(dim, 0.4), [0.0; 4]);

        // threshold 1.0 still admits HDR emission
        let hot = [3.0, 3.0, 3.0, 1.0];
        assert_eq!(high_pass(hot, 1.0), hot);
    }

    #[test]
    fn kernel_grows_with_radius_and_saturates() {
        assert_eq!(kernel_radius(0.0), MIN_KERNEL_RADIUS);
        assert_eq!(kernel_radius(-3.0), MIN_KERNEL_RADIUS);
        assert_eq!(kernel_radius(0.5), MIN_KERNEL_RADIUS + 6);
        assert_eq!(kernel_radius(100.0), MAX_KERNEL_RADIUS);
    }

    #[test]
    fn weights_are_normalized_and_decreasing() {
        for radius in [MIN_KERNEL_RADIUS, 7, MAX_KERNEL_RADIUS] {
            let weights = gaussian_weights(radius);
            assert_eq!(weights.len(), radius as usize + 1);
            let total = weights[0] + 2.0 * weights[1..].iter().sum::<f32>();
            assert!((total - 1.0).abs() < EPS);
            assert!(weights.windows(2).all(|pair| pair[0] > pair[1]));
        }
    }

    #[test]
    fn empty_bloom_and_overlay_leave_base_unchanged() {
        let base = [0.3, 0.6, 0.9, 1.0];
        assert_eq!(compose_pixel(base, [0.0; 4], [0.0; 4], 1.0), base);
    }

    #[test]
    fn composition_is_idempotent_without_bloom_or_overlay() {
        let base = [0.25, 0.5, 0.75, 1.0];
        let once = compose_pixel(base, [0.0; 4], [0.0; 4], 1.0);
        let twice = compose_pixel(once, [0.0; 4], [0.0; 4], 1.0);
        assert_eq!(once, twice);
    }

    #[test]
    fn opaque_overlay_replaces_everything() {
        let out = compose_pixel([0.0, 2.0, 2.0, 1.0], [0.0, 1.5, 1.5, 1.0], [1.0; 4], 1.0);
        assert_eq!(out, [1.0; 4]);
    }

    #[test]
    fn bloom_adds_before_exposure() {
        let out = compose_pixel([0.0, 1.0, 1.0, 1.0], [0.0, 1.5, 1.5, 1.0], [0.0; 4], 2.0);
        assert!((out[1] - 5.0).abs() < EPS);
        assert_eq!(out[0], 0.0);
        assert_eq!(out[3], 1.0);
    }

    #[test]
    fn half_transparent_overlay_mixes() {
        // premultiplied 50% white
        let out = compose_pixel([1.0, 0.0, 0.0, 1.0], [0.0; 4], [0.5, 0.5, 0.5, 0.5], 1.0);
        assert!((out[0] - 1.0).abs() < EPS);
        assert!((out[1] - 0.5).abs() < EPS);
    }

    #[test]
    fn rgba8_clamps_hdr() {
        assert_eq!(to_rgba8([2.5, 0.5, -1.0, 1.0]), [255, 128, 0, 255]);
    }
}
