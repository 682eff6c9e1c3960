//! Directional Gaussian blur evaluated at a single coordinate.
//!
//! Instead of evaluating `exp` per tap, the weights come from the incremental
//! recurrence of GPU Gems 3 (ch. 40): with
//!
//! ```text
//! x = 1 / (sqrt(2 pi) sigma)      peak weight
//! y = exp(-0.5 / sigma^2)         first decay ratio
//! z = y^2
//! ```
//!
//! each step does `x *= y; y *= z`, which walks the Gaussian curve one tap at
//! a time. Only a bounded number of taps is taken, so the accumulated color
//! is divided by the accumulated weight.

use std::f32::consts::PI;

use glam::{Vec2, Vec4};

use crate::sampler::ImageSampler;

/// Tap count of the uniform blur stage.
pub const UNIFORM_BLUR_TAPS: u32 = 2;

/// Tap counts of the three bloom layers, widest first.
pub const BLOOM_TAPS: [u32; 3] = [21, 7, 3];

/// Successive Gaussian weights from the incremental recurrence.
///
/// Yields the center weight first, then the weight of ring 1, ring 2, ...
#[derive(Debug, Clone, Copy)]
pub struct IncrementalGaussian {
    weight: f32,
    ratio: f32,
    ratio_step: f32,
}

impl IncrementalGaussian {
    pub fn new(sigma: f32) -> Self {
        let weight = 1.0 / ((2.0 * PI).sqrt() * sigma);
        let ratio = (-0.5 / (sigma * sigma)).exp();
        Self {
            weight,
            ratio,
            ratio_step: ratio * ratio,
        }
    }
}

impl Iterator for IncrementalGaussian {
    type Item = f32;

    #[inline]
    fn next(&mut self) -> Option<f32> {
        let current = self.weight;
        self.weight *= self.ratio;
        self.ratio *= self.ratio_step;
        Some(current)
    }
}

/// Gaussian blur along a direction vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianBlur {
    /// Standard deviation in taps.
    pub sigma: f32,
    /// Distance between taps in uv units (normally 1 / texture width).
    pub step: f32,
    /// Offset direction. (1, 1) offsets both axes at once; use
    /// [`GaussianBlur::horizontal`] / [`GaussianBlur::vertical`] for
    /// separable passes.
    pub direction: Vec2,
}

impl GaussianBlur {
    pub fn new(sigma: f32, step: f32, direction: Vec2) -> Self {
        Self {
            sigma,
            step,
            direction,
        }
    }

    pub fn horizontal(sigma: f32, step: f32) -> Self {
        Self::new(sigma, step, Vec2::X)
    }

    pub fn vertical(sigma: f32, step: f32) -> Self {
        Self::new(sigma, step, Vec2::Y)
    }

    /// Blur the image around `uv`.
    ///
    /// Takes the center sample plus `taps - 1` symmetric pairs. With a single
    /// tap, or a sigma that cannot weight anything, the center sample is
    /// returned unchanged.
    ///
    /// # Arguments
    /// * `sampler` - Source image
    /// * `uv` - Center coordinate
    /// * `taps` - Kernel radius in taps, counting the center
    pub fn sample<S: ImageSampler + ?Sized>(&self, sampler: &S, uv: Vec2, taps: u32) -> Vec4 {
        let center = sampler.sample(uv);
        if taps <= 1 || !(self.sigma > 0.0) || !self.sigma.is_finite() {
            return center;
        }

        let mut weights = IncrementalGaussian::new(self.sigma);
        let center_weight = weights.next().unwrap_or(0.0);

        let mut sum = center * center_weight;
        let mut weight_sum = center_weight;
        let offset = self.step * self.direction;

        for (i, w) in (1..taps).zip(weights) {
            let d = offset * i as f32;
            sum += sampler.sample(uv - d) * w;
            sum += sampler.sample(uv + d) * w;
            weight_sum += 2.0 * w;
        }

        sum / weight_sum
    }
}
