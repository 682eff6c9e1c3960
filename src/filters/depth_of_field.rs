//! Ring-sampled depth-of-field blur.
//!
//! The red channel of the sample under the pixel is read as a depth-like
//! value. Its distance from the focal plane, times an aperture bias and
//! clamped to a maximum, becomes the defocus radius. The image is then
//! averaged over 41 fixed taps: the center plus four concentric rings at
//! 1.0, 0.9, 0.7 and 0.4 of the radius. Every tap has equal weight.

use glam::{Vec2, Vec4};
use serde::{Deserialize, Serialize};

use crate::sampler::ImageSampler;

/// Outer ring, 16 taps at radius 0.4.
const RING_OUTER: [Vec2; 16] = [
    Vec2::new(0.0, 0.4),
    Vec2::new(0.15, 0.37),
    Vec2::new(0.29, 0.29),
    Vec2::new(-0.37, 0.15),
    Vec2::new(0.4, 0.0),
    Vec2::new(0.37, -0.15),
    Vec2::new(0.29, -0.29),
    Vec2::new(-0.15, -0.37),
    Vec2::new(0.0, -0.4),
    Vec2::new(-0.15, 0.37),
    Vec2::new(-0.29, 0.29),
    Vec2::new(0.37, 0.15),
    Vec2::new(-0.4, 0.0),
    Vec2::new(-0.37, -0.15),
    Vec2::new(-0.29, -0.29),
    Vec2::new(0.15, -0.37),
];

/// Second ring, the eight off-axis directions of the outer ring.
const RING_OFF_AXIS: [Vec2; 8] = [
    Vec2::new(0.15, 0.37),
    Vec2::new(-0.37, 0.15),
    Vec2::new(0.37, -0.15),
    Vec2::new(-0.15, -0.37),
    Vec2::new(-0.15, 0.37),
    Vec2::new(0.37, 0.15),
    Vec2::new(-0.37, -0.15),
    Vec2::new(0.15, -0.37),
];

/// Inner rings, axis and diagonal directions.
const RING_AXIS: [Vec2; 8] = [
    Vec2::new(0.29, 0.29),
    Vec2::new(0.4, 0.0),
    Vec2::new(0.29, -0.29),
    Vec2::new(0.0, -0.4),
    Vec2::new(-0.29, 0.29),
    Vec2::new(-0.4, 0.0),
    Vec2::new(-0.29, -0.29),
    Vec2::new(0.0, 0.4),
];

/// (radius scale, offsets) per ring, outermost first.
const RINGS: [(f32, &[Vec2]); 4] = [
    (1.0, &RING_OUTER),
    (0.9, &RING_OFF_AXIS),
    (0.7, &RING_AXIS),
    (0.4, &RING_AXIS),
];

/// Total taps including the center.
pub const TAP_COUNT: usize = 1 + RING_OUTER.len() + RING_OFF_AXIS.len() + 2 * RING_AXIS.len();

/// Lens settings for the depth-of-field blur.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthOfField {
    /// Depth value that is perfectly sharp.
    pub focus: f32,
    /// Aperture; bigger values give a shallower depth of field.
    pub bias: f32,
    /// Maximum defocus radius (either side of the focal plane).
    pub max_blur: f32,
    /// Width over height used to keep the rings circular on screen.
    pub aspect_ratio: f32,
}

impl Default for DepthOfField {
    fn default() -> Self {
        Self {
            focus: 1.0,
            bias: 0.6,
            max_blur: 3.0,
            aspect_ratio: 800.0 / 600.0,
        }
    }
}

impl DepthOfField {
    /// Signed defocus radius for a depth-like value.
    pub fn defocus_radius(&self, depth: f32) -> f32 {
        ((depth - self.focus) * self.bias).clamp(-self.max_blur, self.max_blur)
    }

    /// Blur the image around `uv`. Alpha of the result is always 1.
    pub fn sample<S: ImageSampler + ?Sized>(&self, sampler: &S, uv: Vec2) -> Vec4 {
        let center = sampler.sample(uv);
        let radius = self.defocus_radius(center.x);
        let aspect = Vec2::new(1.0, self.aspect_ratio);

        let mut sum = center;
        for (scale, offsets) in RINGS {
            for &offset in offsets {
                sum += sampler.sample(uv + offset * aspect * radius * scale);
            }
        }

        let mut color = sum / TAP_COUNT as f32;
        color.w = 1.0;
        color
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::{AddressMode, FilterMode, SolidColor, Texture};
    use approx::assert_relative_eq;
    use ndarray::Array3;

    #[test]
    fn test_tap_count_is_41() {
        assert_eq!(TAP_COUNT, 41);
    }

    #[test]
    fn test_defocus_radius_clamped() {
        let dof = DepthOfField::default();
        assert_eq!(dof.defocus_radius(1.0), 0.0);
        assert_relative_eq!(dof.defocus_radius(0.0), -0.6);
        assert_eq!(dof.defocus_radius(100.0), 3.0);
        assert_eq!(dof.defocus_radius(-100.0), -3.0);
    }

    #[test]
    fn test_constant_image_is_preserved_with_opaque_alpha() {
        let color = Vec4::new(0.2, 0.4, 0.6, 0.3);
        let out = DepthOfField::default().sample(&SolidColor(color), Vec2::new(0.5, 0.5));
        assert_relative_eq!(out.x, 0.2, max_relative = 1e-5);
        assert_relative_eq!(out.y, 0.4, max_relative = 1e-5);
        assert_relative_eq!(out.z, 0.6, max_relative = 1e-5);
        assert_eq!(out.w, 1.0);
    }

    #[test]
    fn test_in_focus_pixel_keeps_its_color() {
        // Red = 1.0 sits exactly on the focal plane: every tap hits uv.
        let mut texels = Array3::<f32>::zeros((4, 4, 4));
        texels[[1, 1, 0]] = 1.0;
        texels[[1, 1, 1]] = 0.5;
        let tex = Texture::from_rgba(texels)
            .unwrap()
            .with_filter_mode(FilterMode::Nearest)
            .with_address_mode(AddressMode::ClampToEdge);

        let out = DepthOfField::default().sample(&tex, Vec2::new(1.5 / 4.0, 1.5 / 4.0));
        assert_relative_eq!(out.x, 1.0, max_relative = 1e-5);
        assert_relative_eq!(out.y, 0.5, max_relative = 1e-5);
        assert_eq!(out.w, 1.0);
    }

    #[test]
    fn test_out_of_focus_pixel_mixes_neighbors() {
        // Dark pixel (depth 0) next to a bright stripe gets blurred.
        let texels = Array3::from_shape_fn((8, 8, 4), |(_, x, c)| {
            if c == 3 || x >= 4 {
                1.0
            } else {
                0.0
            }
        });
        let tex = Texture::from_rgba(texels)
            .unwrap()
            .with_filter_mode(FilterMode::Nearest)
            .with_address_mode(AddressMode::ClampToEdge);

        let out = DepthOfField::default().sample(&tex, Vec2::new(3.5 / 8.0, 0.5));
        assert!(out.x > 0.0 && out.x < 1.0, "red {}", out.x);
    }
}
