//! postfx
//!
//! A per-pixel post-processing kernel for rendered frames, with Python
//! bindings via PyO3 and WASM bindings for JavaScript.
//!
//! Each output pixel starts as the source image sampled at its normalized
//! coordinate and is then transformed by the effects enabled in an
//! [`EffectFlags`] bitmask: Gaussian blur, bloom, hashed additive noise,
//! HSV grading (hue zero, sepia, greyscale, hue rotations), a CMYK halftone
//! screen and a ring-sampled depth of field.
//!
//! ## Image Format
//! The frame entry points accept multiple channel configurations:
//! - **Grayscale**: (height, width, 1) - single channel
//! - **RGB**: (height, width, 3) - 3 color channels
//! - **RGBA**: (height, width, 4) - 3 color channels + alpha
//!
//! Both bit depths are supported:
//! - `u8`: 8-bit per channel (0-255)
//! - `f32`: Float per channel (0.0-1.0)
//!
//! ## Layers
//! - [`filters`]: the per-pixel building blocks
//! - [`sampler`]: how effects read the source image
//! - [`pipeline`]: flag bits and the ordered stage table
//! - [`render`]: whole-frame evaluation in parallel

pub mod error;
pub mod filters;
pub mod params;
pub mod pipeline;
pub mod render;
pub mod sampler;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use error::{FxError, FxResult};
pub use params::EffectParameters;
pub use pipeline::{shade_pixel, EffectFlags, EffectPipeline, PixelSample};
pub use render::{apply_effects_f32, apply_effects_u8, render_frame};
pub use sampler::{AddressMode, FilterMode, ImageSampler, Texture};

// Python bindings (only when python feature is enabled)
#[cfg(feature = "python")]
mod python {
    use glam::{Vec3, Vec4};
    use numpy::{IntoPyArray, PyArray3, PyReadonlyArray3};
    use pyo3::exceptions::PyValueError;
    use pyo3::prelude::*;

    use crate::error::FxError;
    use crate::filters::color_science::{self, ColorHsv};
    use crate::filters::random::random;
    use crate::params::EffectParameters;
    use crate::pipeline::EffectFlags;
    use crate::render;

    impl From<FxError> for PyErr {
        fn from(err: FxError) -> PyErr {
            PyValueError::new_err(err.to_string())
        }
    }

    /// Parameters for a `width` x `height` frame, optionally from JSON.
    fn frame_params(
        width: usize,
        height: usize,
        time: f32,
        params_json: Option<&str>,
    ) -> PyResult<EffectParameters> {
        let params = match params_json {
            Some(json) => EffectParameters::from_json(json)?,
            None => EffectParameters::for_frame(width, height),
        };
        Ok(params.with_time(time))
    }

    // ========================================================================
    // Frame Effects
    // ========================================================================

    /// Apply post-processing effects to a u8 image (1, 3 or 4 channels).
    ///
    /// `flags` is the effect bitmask; unknown bits are ignored. `params_json`
    /// overrides the defaults derived from the image size; `time` always
    /// wins over a time in the JSON document.
    #[pyfunction]
    #[pyo3(signature = (image, flags, time=0.0, params_json=None))]
    pub fn apply_effects<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        flags: u32,
        time: f32,
        params_json: Option<&str>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let input = image.as_array();
        let (height, width, _) = input.dim();
        let params = frame_params(width, height, time, params_json)?;
        let result = render::apply_effects_u8(input, EffectFlags::from_bits_truncate(flags), &params)?;
        Ok(result.into_pyarray(py))
    }

    /// Apply post-processing effects to an f32 image (values 0.0-1.0).
    #[pyfunction]
    #[pyo3(signature = (image, flags, time=0.0, params_json=None))]
    pub fn apply_effects_f32<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, f32>,
        flags: u32,
        time: f32,
        params_json: Option<&str>,
    ) -> PyResult<Bound<'py, PyArray3<f32>>> {
        let input = image.as_array();
        let (height, width, _) = input.dim();
        let params = frame_params(width, height, time, params_json)?;
        let result = render::apply_effects_f32(input, EffectFlags::from_bits_truncate(flags), &params)?;
        Ok(result.into_pyarray(py))
    }

    // ========================================================================
    // Color Helpers
    // ========================================================================

    /// RGB (0.0-1.0) to HSV: hue in degrees, saturation and value 0.0-1.0.
    #[pyfunction]
    pub fn rgb_to_hsv(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
        let hsv = color_science::rgb_to_hsv(Vec3::new(r, g, b));
        (hsv.h, hsv.s, hsv.v)
    }

    /// HSV to RGB (0.0-1.0).
    #[pyfunction]
    pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (f32, f32, f32) {
        let rgb = color_science::hsv_to_rgb(ColorHsv::new(h, s, v));
        (rgb.x, rgb.y, rgb.z)
    }

    /// Hashed pseudo-random value in [0, 1) from up to four floats.
    #[pyfunction]
    #[pyo3(signature = (x, y=None, z=None, w=None))]
    pub fn hashed_random(x: f32, y: Option<f32>, z: Option<f32>, w: Option<f32>) -> f32 {
        match (y, z, w) {
            (None, _, _) => random(x),
            (Some(y), None, _) => random(glam::Vec2::new(x, y)),
            (Some(y), Some(z), None) => random(Vec3::new(x, y, z)),
            (Some(y), Some(z), Some(w)) => random(Vec4::new(x, y, z, w)),
        }
    }

    /// Flag bit for an effect name such as "bloom" or "hue_rotate_60".
    #[pyfunction]
    pub fn effect_flags(names: &str) -> PyResult<u32> {
        Ok(names.parse::<EffectFlags>()?.bits())
    }

    /// postfx extension module
    #[pymodule]
    pub fn postfx(m: &Bound<'_, PyModule>) -> PyResult<()> {
        // Frame effects (u8 and f32)
        m.add_function(wrap_pyfunction!(apply_effects, m)?)?;
        m.add_function(wrap_pyfunction!(apply_effects_f32, m)?)?;

        // Color helpers
        m.add_function(wrap_pyfunction!(rgb_to_hsv, m)?)?;
        m.add_function(wrap_pyfunction!(hsv_to_rgb, m)?)?;
        m.add_function(wrap_pyfunction!(hashed_random, m)?)?;
        m.add_function(wrap_pyfunction!(effect_flags, m)?)?;

        for (name, bits) in crate::pipeline::STAGES
            .iter()
            .map(|stage| (stage.name.to_ascii_uppercase(), stage.flag.bits()))
        {
            m.add(name.as_str(), bits)?;
        }

        Ok(())
    }
}

#[cfg(feature = "python")]
pub use python::postfx;
