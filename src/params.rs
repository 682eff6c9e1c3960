//! Effect parameters.
//!
//! Everything the stages read besides the source image and the flags lives
//! in [`EffectParameters`]. It deserializes from partial JSON documents,
//! with missing fields taking their defaults:
//!
//! ```
//! use postfx::EffectParameters;
//!
//! let params = EffectParameters::from_json(r#"{ "sigma": 5.0, "time": 1.5 }"#).unwrap();
//! assert_eq!(params.sigma, 5.0);
//! assert_eq!(params.dot_frequency, 40.0);
//! ```

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{FxError, FxResult};
use crate::filters::antialias::{AntialiasFallback, AntialiasMode};
use crate::filters::blur::GaussianBlur;
use crate::filters::depth_of_field::DepthOfField;
use crate::filters::halftone::Halftone;

/// Tunables shared by all effect stages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectParameters {
    /// Gaussian standard deviation in taps.
    pub sigma: f32,
    /// Distance between blur taps in uv (1 / 640 for a 640 pixel wide frame).
    pub blur_step: f32,
    /// Blur offset direction.
    pub blur_direction: Vec2,
    /// Halftone dot cells per uv unit.
    pub dot_frequency: f32,
    /// Elapsed time, seeds the additive noise.
    pub time: f32,
    /// Output size in pixels. Only the screen-derivative anti-aliasing
    /// reads it.
    pub resolution: Vec2,
    pub antialias: AntialiasMode,
    pub antialias_fallback: AntialiasFallback,
    pub depth_of_field: DepthOfField,
}

impl Default for EffectParameters {
    fn default() -> Self {
        Self {
            sigma: 3.0,
            blur_step: 1.0 / 640.0,
            blur_direction: Vec2::ONE,
            dot_frequency: 40.0,
            time: 0.0,
            resolution: Vec2::new(800.0, 600.0),
            antialias: AntialiasMode::default(),
            antialias_fallback: AntialiasFallback::default(),
            depth_of_field: DepthOfField::default(),
        }
    }
}

impl EffectParameters {
    /// Defaults sized for a `width` x `height` frame: one blur tap per
    /// pixel column, matching resolution and depth-of-field aspect.
    pub fn for_frame(width: usize, height: usize) -> Self {
        let mut params = Self::default();
        if width > 0 && height > 0 {
            params.blur_step = 1.0 / width as f32;
            params.resolution = Vec2::new(width as f32, height as f32);
            params.depth_of_field.aspect_ratio = width as f32 / height as f32;
        }
        params
    }

    pub fn with_time(mut self, time: f32) -> Self {
        self.time = time;
        self
    }

    /// Parse a JSON document and validate it.
    pub fn from_json(json: &str) -> FxResult<Self> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    /// Reject values no stage can work with.
    pub fn validate(&self) -> FxResult<()> {
        positive("sigma", self.sigma)?;
        positive("blur_step", self.blur_step)?;
        positive("dot_frequency", self.dot_frequency)?;
        positive("antialias_fallback.scale", self.antialias_fallback.scale)?;
        positive("resolution.x", self.resolution.x)?;
        positive("resolution.y", self.resolution.y)?;
        positive("depth_of_field.max_blur", self.depth_of_field.max_blur)?;
        positive("depth_of_field.aspect_ratio", self.depth_of_field.aspect_ratio)?;
        finite("time", self.time)?;
        finite("antialias_fallback.rotation", self.antialias_fallback.rotation)?;
        finite("depth_of_field.focus", self.depth_of_field.focus)?;
        finite("depth_of_field.bias", self.depth_of_field.bias)?;
        if !self.blur_direction.is_finite() {
            return Err(FxError::InvalidParameter(format!(
                "blur_direction must be finite, got {}",
                self.blur_direction
            )));
        }
        Ok(())
    }

    /// Blur configured from `sigma`, `blur_step` and `blur_direction`.
    pub fn gaussian(&self) -> GaussianBlur {
        GaussianBlur::new(self.sigma, self.blur_step, self.blur_direction)
    }

    pub fn halftone(&self) -> Halftone {
        Halftone::new(
            self.dot_frequency,
            self.antialias,
            self.antialias_fallback,
            self.resolution,
        )
    }
}

fn finite(name: &str, value: f32) -> FxResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(FxError::InvalidParameter(format!(
            "{} must be finite, got {}",
            name, value
        )))
    }
}

fn positive(name: &str, value: f32) -> FxResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(FxError::InvalidParameter(format!(
            "{} must be positive and finite, got {}",
            name, value
        )))
    }
}
