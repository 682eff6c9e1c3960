//! Color science: RGB <-> HSV and the HSV-domain grading stages.
//!
//! Hue is in degrees (0.0-360.0), saturation and value in 0.0-1.0.
//!
//! ## Hue wrap
//!
//! [`hsv_to_rgb`] folds a hue at or above 360 back by **359**, not 360, so
//! `h = 360.0` converts as 1 degree. Grading stages that push hue past 360
//! (sepia, the hue rotations) depend on this exact fold for output parity,
//! so it is kept as-is.

use glam::Vec3;

/// Hue fold applied when `h >= 360`.
const HUE_WRAP: f32 = 359.0;

/// A color in hue/saturation/value form.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColorHsv {
    /// Hue in degrees, 0.0-360.0
    pub h: f32,
    /// Saturation, 0.0-1.0
    pub s: f32,
    /// Value, 0.0-1.0
    pub v: f32,
}

impl ColorHsv {
    pub const fn new(h: f32, s: f32, v: f32) -> Self {
        Self { h, s, v }
    }
}

// ============================================================================
// Color Space Conversion
// ============================================================================

/// Convert RGB to HSV.
/// Input: r, g, b nominally in 0.0-1.0 (overflow is accepted)
/// Output: h in 0.0-360.0, s in 0.0-1.0, v = max channel
pub fn rgb_to_hsv(rgb: Vec3) -> ColorHsv {
    let max = rgb.max_element();
    let min = rgb.min_element();

    if max <= 0.0 {
        return ColorHsv::new(0.0, 0.0, max);
    }

    let delta = max - min;
    let s = delta / max;

    // Achromatic: hue is undefined, report 0.
    if delta <= 0.0 {
        return ColorHsv::new(0.0, s, max);
    }

    let sector = if rgb.x == max {
        (rgb.y - rgb.z) / delta
    } else if rgb.y == max {
        2.0 + (rgb.z - rgb.x) / delta
    } else {
        4.0 + (rgb.x - rgb.y) / delta
    };

    let mut h = sector * 60.0;
    if h < 0.0 {
        h += 360.0;
    }

    ColorHsv::new(h, s, max)
}

/// Convert HSV to RGB.
///
/// Hue below 0 gains 360; hue at or above 360 loses 359 (see module docs).
/// Saturation and value are clamped to 0.0-1.0 first.
pub fn hsv_to_rgb(hsv: ColorHsv) -> Vec3 {
    let mut h = hsv.h;
    if h < 0.0 {
        h += 360.0;
    }
    if h >= 360.0 {
        h -= HUE_WRAP;
    }

    let s = hsv.s.clamp(0.0, 1.0);
    let v = hsv.v.clamp(0.0, 1.0);

    if s == 0.0 {
        return Vec3::splat(v);
    }

    let h = h / 60.0;
    // Truncation toward zero, like an int cast.
    let i = h as i32;
    let f = h - i as f32;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    match i {
        0 => Vec3::new(v, t, p),
        1 => Vec3::new(q, v, p),
        2 => Vec3::new(p, v, t),
        3 => Vec3::new(p, q, v),
        4 => Vec3::new(t, p, v),
        5 => Vec3::new(v, p, q),
        _ => Vec3::ZERO,
    }
}

// ============================================================================
// HSV Grading Stages
// ============================================================================

/// Force hue to 0 (red axis), keeping saturation and value.
pub fn zero_hue(rgb: Vec3) -> Vec3 {
    let hsv = rgb_to_hsv(rgb);
    hsv_to_rgb(ColorHsv { h: 0.0, ..hsv })
}

/// Sepia toning: darken by a quarter of the saturation, then map value onto
/// the 0-40 degree (dark brown to light amber) hue band.
pub fn sepia_tone(rgb: Vec3) -> Vec3 {
    let hsv = rgb_to_hsv(rgb);
    let v = hsv.v - hsv.s * 0.25;
    hsv_to_rgb(ColorHsv::new(v * 40.0, hsv.s, v))
}

/// Greyscale: darken by half the saturation and drop all chroma.
pub fn desaturate(rgb: Vec3) -> Vec3 {
    let hsv = rgb_to_hsv(rgb);
    hsv_to_rgb(ColorHsv::new(hsv.h, 0.0, hsv.v - hsv.s * 0.5))
}

/// Add `degrees` to the hue.
pub fn rotate_hue(rgb: Vec3, degrees: f32) -> Vec3 {
    let hsv = rgb_to_hsv(rgb);
    hsv_to_rgb(ColorHsv {
        h: hsv.h + degrees,
        ..hsv
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn assert_rgb_eq(a: Vec3, b: Vec3, eps: f32) {
        assert_abs_diff_eq!(a.x, b.x, epsilon = eps);
        assert_abs_diff_eq!(a.y, b.y, epsilon = eps);
        assert_abs_diff_eq!(a.z, b.z, epsilon = eps);
    }

    #[test]
    fn test_rgb_hsv_primaries() {
        assert_eq!(rgb_to_hsv(Vec3::new(1.0, 0.0, 0.0)), ColorHsv::new(0.0, 1.0, 1.0));
        assert_eq!(rgb_to_hsv(Vec3::new(0.0, 1.0, 0.0)), ColorHsv::new(120.0, 1.0, 1.0));
        assert_eq!(rgb_to_hsv(Vec3::new(0.0, 0.0, 1.0)), ColorHsv::new(240.0, 1.0, 1.0));
    }

    #[test]
    fn test_rgb_hsv_black_and_negative() {
        assert_eq!(rgb_to_hsv(Vec3::ZERO), ColorHsv::new(0.0, 0.0, 0.0));
        let hsv = rgb_to_hsv(Vec3::new(-0.2, -0.5, -0.1));
        assert_eq!(hsv, ColorHsv::new(0.0, 0.0, -0.1));
    }

    #[test]
    fn test_rgb_hsv_gray_has_zero_hue() {
        let hsv = rgb_to_hsv(Vec3::splat(0.5));
        assert_eq!(hsv, ColorHsv::new(0.0, 0.0, 0.5));
        assert_eq!(hsv_to_rgb(hsv), Vec3::splat(0.5));
    }

    #[test]
    fn test_rgb_hsv_negative_hue_wraps() {
        // Red max, blue above green: hue just below 360.
        let hsv = rgb_to_hsv(Vec3::new(1.0, 0.0, 0.5));
        assert_abs_diff_eq!(hsv.h, 330.0, epsilon = 1e-4);
    }

    #[test]
    fn test_hsv_rgb_roundtrip_grid() {
        let steps = 8;
        for ri in 0..=steps {
            for gi in 0..=steps {
                for bi in 0..=steps {
                    let rgb = Vec3::new(ri as f32, gi as f32, bi as f32) / steps as f32;
                    if rgb.max_element() == rgb.min_element() {
                        continue;
                    }
                    let back = hsv_to_rgb(rgb_to_hsv(rgb));
                    assert_rgb_eq(back, rgb, 1e-5);
                }
            }
        }
    }

    #[test]
    fn test_hsv_rgb_clamps_saturation_and_value() {
        let rgb = hsv_to_rgb(ColorHsv::new(0.0, 2.0, 3.0));
        assert_eq!(rgb, Vec3::new(1.0, 0.0, 0.0));
        let rgb = hsv_to_rgb(ColorHsv::new(120.0, -1.0, 0.25));
        assert_eq!(rgb, Vec3::splat(0.25));
    }

    #[test]
    fn test_hsv_rgb_wrap_subtracts_359() {
        // 360 folds to 1 degree, not 0.
        let wrapped = hsv_to_rgb(ColorHsv::new(360.0, 1.0, 1.0));
        let one_degree = hsv_to_rgb(ColorHsv::new(1.0, 1.0, 1.0));
        assert_eq!(wrapped, one_degree);
        assert!(wrapped.y > 0.0);

        // 420 folds to 61 degrees.
        let wrapped = hsv_to_rgb(ColorHsv::new(420.0, 1.0, 1.0));
        assert_rgb_eq(wrapped, hsv_to_rgb(ColorHsv::new(61.0, 1.0, 1.0)), 1e-6);
    }

    #[test]
    fn test_hsv_rgb_negative_hue() {
        let rgb = hsv_to_rgb(ColorHsv::new(-120.0, 1.0, 1.0));
        assert_rgb_eq(rgb, Vec3::new(0.0, 0.0, 1.0), 1e-6);
    }

    #[test]
    fn test_greyscale_pure_red() {
        assert_eq!(desaturate(Vec3::new(1.0, 0.0, 0.0)), Vec3::splat(0.5));
    }

    #[test]
    fn test_rotate_red_to_yellow() {
        assert_eq!(rotate_hue(Vec3::new(1.0, 0.0, 0.0), 60.0), Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_rotate_red_180_is_cyan() {
        assert_rgb_eq(
            rotate_hue(Vec3::new(1.0, 0.0, 0.0), 180.0),
            Vec3::new(0.0, 1.0, 1.0),
            1e-6,
        );
    }

    #[test]
    fn test_zero_hue_moves_green_to_red() {
        let rgb = zero_hue(Vec3::new(0.2, 0.8, 0.2));
        assert_rgb_eq(rgb, Vec3::new(0.8, 0.2, 0.2), 1e-6);
    }

    #[test]
    fn test_sepia_white_stays_white() {
        // s = 0: value unchanged, achromatic output.
        assert_eq!(sepia_tone(Vec3::ONE), Vec3::ONE);
    }

    #[test]
    fn test_sepia_pure_red() {
        // v = 1 - 0.25 = 0.75, h = 30 degrees, s = 1.
        let rgb = sepia_tone(Vec3::new(1.0, 0.0, 0.0));
        assert_rgb_eq(rgb, Vec3::new(0.75, 0.375, 0.0), 1e-6);
    }
}
