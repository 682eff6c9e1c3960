//! Anti-aliased thresholding.
//!
//! [`aastep`] is a `smoothstep` centered on the threshold whose half-width
//! tracks how fast the stepped value changes across one pixel. The width
//! comes from one of two sources:
//!
//! - **Screen derivatives**: `0.7 * |(d/dx, d/dy)|` of the value, from
//!   finite differences against the neighbouring pixels.
//! - **Fallback**: a closed form in the dot frequency, a fixed scale and a
//!   fixed rotation angle, used when no derivatives are available.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::core::smoothstep;

/// Source of the anti-aliasing width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AntialiasMode {
    /// Closed-form width from [`AntialiasFallback`].
    #[default]
    Fallback,
    /// Width from per-pixel finite differences of the stepped value.
    ScreenDerivatives,
}

/// Constants of the closed-form anti-aliasing width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AntialiasFallback {
    /// Isotropic scale of the pattern.
    pub scale: f32,
    /// Rotation angle in radians.
    pub rotation: f32,
}

impl Default for AntialiasFallback {
    fn default() -> Self {
        Self {
            scale: 10.0,
            rotation: 10.0,
        }
    }
}

impl AntialiasFallback {
    /// Half-width for a pattern of `frequency` cells per unit.
    ///
    /// `frequency / 200 / scale / cos(rotation)`, as a magnitude.
    pub fn width(&self, frequency: f32) -> f32 {
        (frequency * (1.0 / 200.0) / self.scale / self.rotation.cos()).abs()
    }
}

/// Half-width from screen-space derivatives of the stepped value.
#[inline]
pub fn derivative_width(dx: f32, dy: f32) -> f32 {
    0.7 * Vec2::new(dx, dy).length()
}

/// Smooth step of `value` across `threshold` with half-width `width`.
///
/// A zero, negative or non-finite width collapses to a hard step
/// (1.0 when `value >= threshold`).
#[inline]
pub fn aastep(threshold: f32, value: f32, width: f32) -> f32 {
    if width > 0.0 && width.is_finite() {
        smoothstep(threshold - width, threshold + width, value)
    } else if value >= threshold {
        1.0
    } else {
        0.0
    }
}
