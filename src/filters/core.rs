//! Core utilities shared by the per-pixel filters.
//!
//! This module provides the small shader-style helpers every filter leans on:
//! - Hermite `smoothstep` and linear `mix`
//! - Floor-based `fract` for cell coordinates
//! - u8 <-> f32 image conversion for the dual-precision entry points

use glam::{Vec2, Vec3};
use ndarray::{Array3, ArrayView3};

// ============================================================================
// Scalar / Vector Helpers
// ============================================================================

/// Hermite interpolation between `edge0` and `edge1`.
///
/// Returns 0.0 below `edge0`, 1.0 above `edge1`. Callers must pass
/// `edge0 < edge1`; equal edges divide by zero.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Linear blend `a * (1 - t) + b * t`.
#[inline]
pub fn mix(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    a * (1.0 - t) + b * t
}

/// Fractional part using floor, so negative inputs land in [0, 1).
#[inline]
pub fn fract(v: Vec2) -> Vec2 {
    v - v.floor()
}

// ============================================================================
// Conversion Utilities
// ============================================================================

/// Convert u8 image (0-255) to f32 (0.0-1.0)
pub fn u8_to_f32(input: ArrayView3<u8>) -> Array3<f32> {
    input.mapv(|v| v as f32 / 255.0)
}

/// Convert f32 image (0.0-1.0) to u8 (0-255), rounding to nearest.
///
/// Values outside [0, 1] (bloom and grain overflow) are clamped.
pub fn f32_to_u8(input: ArrayView3<f32>) -> Array3<u8> {
    input.mapv(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_smoothstep_edges() {
        assert_eq!(smoothstep(0.0, 1.0, -0.5), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 1.5), 1.0);
        assert_abs_diff_eq!(smoothstep(0.0, 1.0, 0.5), 0.5);
    }

    #[test]
    fn test_fract_negative() {
        let f = fract(Vec2::new(-0.25, 2.75));
        assert_abs_diff_eq!(f.x, 0.75);
        assert_abs_diff_eq!(f.y, 0.75);
    }

    #[test]
    fn test_mix_endpoints() {
        let a = Vec3::splat(1.0);
        let b = Vec3::ZERO;
        assert_eq!(mix(a, b, 0.0), a);
        assert_eq!(mix(a, b, 1.0), b);
    }

    #[test]
    fn test_u8_f32_roundtrip() {
        let mut img = Array3::<u8>::zeros((1, 3, 1));
        img[[0, 0, 0]] = 0;
        img[[0, 1, 0]] = 128;
        img[[0, 2, 0]] = 255;

        let back = f32_to_u8(u8_to_f32(img.view()).view());
        assert_eq!(back, img);
    }

    #[test]
    fn test_f32_to_u8_clamps_overflow() {
        let mut img = Array3::<f32>::zeros((1, 2, 1));
        img[[0, 0, 0]] = 3.5;
        img[[0, 1, 0]] = -0.2;

        let out = f32_to_u8(img.view());
        assert_eq!(out[[0, 0, 0]], 255);
        assert_eq!(out[[0, 1, 0]], 0);
    }
}
