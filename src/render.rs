//! Frame driver: shade every pixel of an image.
//!
//! ## Supported Formats
//!
//! | Format | Shape | Type | Description |
//! |--------|-------|------|-------------|
//! | Grayscale8 | (H, W, 1) | u8 | Single luminance channel, 0-255 |
//! | Grayscale float | (H, W, 1) | f32 | Single luminance channel, 0.0-1.0 |
//! | RGB8 | (H, W, 3) | u8 | Red, green, blue, 0-255 |
//! | RGB float | (H, W, 3) | f32 | Red, green, blue, 0.0-1.0 |
//! | RGBA8 | (H, W, 4) | u8 | RGB + alpha, 0-255 |
//! | RGBA float | (H, W, 4) | f32 | RGB + alpha, 0.0-1.0 |
//!
//! Inputs are expanded to RGBA for shading (gray to `(g, g, g, 1)`, RGB to
//! `(r, g, b, 1)`) and the result is folded back to the input's channel
//! count. Gray output is the BT.709 luminosity of the shaded color.
//!
//! ## Performance
//!
//! Rows are shaded in parallel with Rayon. Every pixel is independent, so
//! the output is identical to the serial loop.

use glam::{Vec2, Vec4};
use ndarray::{Array3, ArrayView3};
use rayon::prelude::*;
use tracing::debug;

use crate::error::{FxError, FxResult};
use crate::filters::core::{f32_to_u8, u8_to_f32};
use crate::params::EffectParameters;
use crate::pipeline::{EffectFlags, EffectPipeline};
use crate::sampler::{ImageSampler, Texture};

/// BT.709 luminosity weights.
const LUMA: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// Normalized coordinate of the center of pixel `(x, y)`.
#[inline]
pub fn pixel_uv(x: usize, y: usize, width: usize, height: usize) -> Vec2 {
    Vec2::new(
        (x as f32 + 0.5) / width as f32,
        (y as f32 + 0.5) / height as f32,
    )
}

fn check_frame(width: usize, height: usize) -> FxResult<()> {
    if width == 0 || height == 0 {
        return Err(FxError::InvalidDimensions(format!(
            "frame must be non-empty, got {}x{}",
            width, height
        )));
    }
    Ok(())
}

fn shade_row(
    pipeline: &EffectPipeline,
    source: &dyn ImageSampler,
    y: usize,
    width: usize,
    height: usize,
    row: &mut [f32],
) {
    for (x, px) in row.chunks_exact_mut(4).enumerate() {
        let color = pipeline.shade(source, pixel_uv(x, y, width, height));
        px.copy_from_slice(&color.to_array());
    }
}

// ============================================================================
// Frame Rendering
// ============================================================================

/// Shade a `width` x `height` RGBA frame, rows in parallel.
///
/// # Arguments
/// * `pipeline` - Enabled stages and their parameters
/// * `source` - Source image sampler
/// * `width` - Output width in pixels
/// * `height` - Output height in pixels
///
/// # Returns
/// RGBA f32 frame of shape (height, width, 4). Values are not clamped.
pub fn render_frame(
    pipeline: &EffectPipeline,
    source: &dyn ImageSampler,
    width: usize,
    height: usize,
) -> FxResult<Array3<f32>> {
    check_frame(width, height)?;
    debug!(width, height, flags = pipeline.flags().bits(), "rendering frame");

    let mut output = vec![0.0f32; height * width * 4];
    output
        .par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(y, row)| shade_row(pipeline, source, y, width, height, row));

    Array3::from_shape_vec((height, width, 4), output)
        .map_err(|e| FxError::InvalidDimensions(e.to_string()))
}

/// Single-threaded [`render_frame`], for targets without threads.
pub fn render_frame_serial(
    pipeline: &EffectPipeline,
    source: &dyn ImageSampler,
    width: usize,
    height: usize,
) -> FxResult<Array3<f32>> {
    check_frame(width, height)?;
    debug!(width, height, flags = pipeline.flags().bits(), "rendering frame (serial)");

    let mut output = vec![0.0f32; height * width * 4];
    for (y, row) in output.chunks_exact_mut(width * 4).enumerate() {
        shade_row(pipeline, source, y, width, height, row);
    }

    Array3::from_shape_vec((height, width, 4), output)
        .map_err(|e| FxError::InvalidDimensions(e.to_string()))
}

/// Fold an RGBA frame back to `channels` channels.
fn to_channels(rgba: Array3<f32>, channels: usize) -> Array3<f32> {
    let (height, width, _) = rgba.dim();
    match channels {
        4 => rgba,
        3 => Array3::from_shape_fn((height, width, 3), |(y, x, c)| rgba[[y, x, c]]),
        _ => Array3::from_shape_fn((height, width, 1), |(y, x, _)| {
            LUMA[0] * rgba[[y, x, 0]] + LUMA[1] * rgba[[y, x, 1]] + LUMA[2] * rgba[[y, x, 2]]
        }),
    }
}

// ============================================================================
// Image Entry Points
// ============================================================================

/// Apply effects to an image - f32 version.
///
/// The image is sampled with the default texture settings (repeat
/// addressing, linear filtering) and shaded at its own resolution.
///
/// # Arguments
/// * `input` - Image with 1, 3, or 4 channels (height, width, channels), 0.0-1.0
/// * `flags` - Enabled effects
/// * `params` - Effect parameters
///
/// # Returns
/// Image with the input's shape. Values may leave 0.0-1.0 (bloom, grain).
pub fn apply_effects_f32(
    input: ArrayView3<f32>,
    flags: EffectFlags,
    params: &EffectParameters,
) -> FxResult<Array3<f32>> {
    let (height, width, channels) = input.dim();
    let source = Texture::from_channels(input)?;
    let pipeline = EffectPipeline::new(flags, *params)?;
    debug!(width, height, channels, flags = flags.bits(), "applying effects");

    let rgba = render_frame(&pipeline, &source, width, height)?;
    Ok(to_channels(rgba, channels))
}

/// Apply effects to an image - u8 version.
///
/// # Arguments
/// * `input` - Image with 1, 3, or 4 channels (height, width, channels), 0-255
/// * `flags` - Enabled effects
/// * `params` - Effect parameters
///
/// # Returns
/// Image with the input's shape, clamped to 0-255.
pub fn apply_effects_u8(
    input: ArrayView3<u8>,
    flags: EffectFlags,
    params: &EffectParameters,
) -> FxResult<Array3<u8>> {
    let input_f32 = u8_to_f32(input);
    let result = apply_effects_f32(input_f32.view(), flags, params)?;
    Ok(f32_to_u8(result.view()))
}

/// Shade a flat RGBA buffer on the current thread.
pub fn apply_effects_rgba_serial(
    data: Vec<f32>,
    width: usize,
    height: usize,
    flags: EffectFlags,
    params: &EffectParameters,
) -> FxResult<Array3<f32>> {
    let input = Array3::from_shape_vec((height, width, 4), data)
        .map_err(|e| FxError::InvalidDimensions(format!("{} for {}x{} RGBA", e, width, height)))?;
    let source = Texture::from_rgba(input)?;
    let pipeline = EffectPipeline::new(flags, *params)?;
    render_frame_serial(&pipeline, &source, width, height)
}

/// RGBA color of a frame pixel.
#[inline]
pub fn frame_pixel(frame: &Array3<f32>, x: usize, y: usize) -> Vec4 {
    Vec4::new(
        frame[[y, x, 0]],
        frame[[y, x, 1]],
        frame[[y, x, 2]],
        frame[[y, x, 3]],
    )
}
