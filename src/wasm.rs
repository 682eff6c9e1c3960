//! WebAssembly exports for postfx.
//!
//! These functions are exposed to JavaScript via wasm-bindgen. Frames are
//! shaded on the calling thread.
//!
//! ## Bit Depth Support
//!
//! All entry points have two versions:
//! - **u8**: 8-bit per channel (0-255), standard for web/display
//! - **f32**: Float per channel (0.0-1.0), for HDR/linear workflows
//!
//! Both versions use identical Rust implementations.

use wasm_bindgen::prelude::*;

use crate::error::FxError;
use crate::filters::core::f32_to_u8;
use crate::params::EffectParameters;
use crate::pipeline::EffectFlags;
use crate::render::apply_effects_rgba_serial;

fn to_js(err: FxError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn wasm_params(width: usize, height: usize, time: f32) -> EffectParameters {
    EffectParameters::for_frame(width, height).with_time(time)
}

// ============================================================================
// Frame Effects - u8 (8-bit)
// ============================================================================

/// Apply post-processing effects to an RGBA u8 image.
///
/// # Arguments
/// * `data` - Flat array of RGBA bytes (length = width * height * 4)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `flags` - Effect bitmask; unknown bits are ignored
/// * `time` - Elapsed time, seeds the additive noise
///
/// # Returns
/// Flat array of RGBA bytes
#[wasm_bindgen]
pub fn apply_effects_rgba_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    flags: u32,
    time: f32,
) -> Result<Vec<u8>, JsValue> {
    let input: Vec<f32> = data.iter().map(|&v| v as f32 / 255.0).collect();
    let result = apply_effects_rgba_serial(
        input,
        width,
        height,
        EffectFlags::from_bits_truncate(flags),
        &wasm_params(width, height, time),
    )
    .map_err(to_js)?;

    Ok(f32_to_u8(result.view()).into_raw_vec_and_offset().0)
}

// ============================================================================
// Frame Effects - f32 (float)
// ============================================================================

/// Apply post-processing effects to an RGBA f32 image.
///
/// # Arguments
/// * `data` - Flat array of RGBA floats (length = width * height * 4), values 0.0-1.0
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `flags` - Effect bitmask; unknown bits are ignored
/// * `time` - Elapsed time, seeds the additive noise
///
/// # Returns
/// Flat array of RGBA floats, unclamped
#[wasm_bindgen]
pub fn apply_effects_rgba_f32_wasm(
    data: &[f32],
    width: usize,
    height: usize,
    flags: u32,
    time: f32,
) -> Result<Vec<f32>, JsValue> {
    let result = apply_effects_rgba_serial(
        data.to_vec(),
        width,
        height,
        EffectFlags::from_bits_truncate(flags),
        &wasm_params(width, height, time),
    )
    .map_err(to_js)?;

    Ok(result.into_raw_vec_and_offset().0)
}
