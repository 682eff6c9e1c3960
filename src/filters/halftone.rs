//! CMYK halftone dot screen.
//!
//! The source color is separated into cyan, magenta, yellow and key (black)
//! amounts. Each ink is printed as a grid of round dots whose radius grows
//! with the square root of its amount; every grid is rotated to its own
//! screen angle so the dots interleave instead of forming moiré. Film grain
//! is added to the dot edges and the paper tone, then the key channel is
//! laid over the colored screens.
//!
//! Output alpha is always 1.

use glam::{Mat2, Vec2, Vec3, Vec4};

use super::antialias::{aastep, derivative_width, AntialiasFallback, AntialiasMode};
use super::core::{fract, mix};
use super::noise::film_grain;
use crate::sampler::ImageSampler;

/// Key screen, 45 degrees.
pub const SCREEN_K: Mat2 = Mat2::from_cols(Vec2::new(0.707, -0.707), Vec2::new(0.707, 0.707));
/// Cyan screen, 15 degrees.
pub const SCREEN_C: Mat2 = Mat2::from_cols(Vec2::new(0.966, -0.259), Vec2::new(0.259, 0.966));
/// Magenta screen, 75 degrees.
pub const SCREEN_M: Mat2 = Mat2::from_cols(Vec2::new(0.966, 0.259), Vec2::new(-0.259, 0.966));
/// Yellow screen, unrotated.
pub const SCREEN_Y: Mat2 = Mat2::IDENTITY;

/// Screens in (c, m, y, k) order.
const SCREENS: [Mat2; 4] = [SCREEN_C, SCREEN_M, SCREEN_Y, SCREEN_K];

/// Split RGB into `(c, m, y, k)` ink amounts with full black generation.
pub fn cmyk_separation(rgb: Vec3) -> Vec4 {
    let cmy = Vec3::ONE - rgb;
    let k = cmy.min_element();
    (cmy - k).extend(k)
}

/// Position inside a dot cell, in [-1, 1) on both axes.
#[inline]
pub fn cell(st: Vec2) -> Vec2 {
    2.0 * fract(st) - 1.0
}

/// Halftone screen configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Halftone {
    /// Dot cells per unit of uv.
    pub frequency: f32,
    pub antialias: AntialiasMode,
    pub fallback: AntialiasFallback,
    /// Size of one output pixel in uv, used for screen derivatives.
    pub pixel: Vec2,
}

impl Halftone {
    pub fn new(
        frequency: f32,
        antialias: AntialiasMode,
        fallback: AntialiasFallback,
        resolution: Vec2,
    ) -> Self {
        Self {
            frequency,
            antialias,
            fallback,
            pixel: resolution.recip(),
        }
    }

    /// Signed dot-edge distance of all four inks at `uv`.
    ///
    /// Positive inside a dot. `inks` holds `sqrt(amount)` per channel.
    fn dot_fields(&self, uv: Vec2, inks: Vec4, grain: f32) -> Vec4 {
        let mut fields = [0.0f32; 4];
        for (i, screen) in SCREENS.iter().enumerate() {
            let st = self.frequency * (*screen * uv);
            fields[i] = inks[i] - cell(st).length() + grain;
        }
        Vec4::from_array(fields)
    }

    /// Dot fields of the source at `uv`, with the grain used for them.
    fn fields_at<S: ImageSampler + ?Sized>(&self, sampler: &S, uv: Vec2) -> (Vec4, f32) {
        let rgb = sampler.sample(uv).truncate();
        let inks = cmyk_separation(rgb).max(Vec4::ZERO);
        let grain = film_grain(uv);
        let inks = Vec4::new(inks.x.sqrt(), inks.y.sqrt(), inks.z.sqrt(), inks.w.sqrt());
        (self.dot_fields(uv, inks, grain), grain)
    }

    /// Halftone the source color at `uv`.
    ///
    /// # Arguments
    /// * `sampler` - Source image (read directly, not an accumulated color)
    /// * `uv` - Pixel coordinate
    pub fn sample<S: ImageSampler + ?Sized>(&self, sampler: &S, uv: Vec2) -> Vec4 {
        let (fields, grain) = self.fields_at(sampler, uv);

        let widths = match self.antialias {
            AntialiasMode::Fallback => Vec4::splat(self.fallback.width(self.frequency)),
            AntialiasMode::ScreenDerivatives => {
                let (right, _) = self.fields_at(sampler, uv + Vec2::new(self.pixel.x, 0.0));
                let (down, _) = self.fields_at(sampler, uv + Vec2::new(0.0, self.pixel.y));
                let dx = right - fields;
                let dy = down - fields;
                Vec4::new(
                    derivative_width(dx.x, dy.x),
                    derivative_width(dx.y, dy.y),
                    derivative_width(dx.z, dy.z),
                    derivative_width(dx.w, dy.w),
                )
            }
        };

        let coverage = Vec4::new(
            aastep(0.0, fields.x, widths.x),
            aastep(0.0, fields.y, widths.y),
            aastep(0.0, fields.z, widths.z),
            aastep(0.0, fields.w, widths.w),
        );

        let screen = Vec3::ONE - 0.9 * coverage.truncate() + grain;
        let rgb = mix(screen, Vec3::splat(grain + 0.1), 0.85 * coverage.w + 0.3 * grain);
        rgb.extend(1.0)
    }
}
