//! Image sampling: the read side of every effect.
//!
//! Effects never index pixels directly. They ask an [`ImageSampler`] for a
//! filtered RGBA color at a normalized coordinate, which may lie outside
//! [0, 1] (blur and depth-of-field taps routinely do). What happens out of
//! range is decided by the sampler's [`AddressMode`], never by the effect.
//!
//! ## Coordinates
//!
//! `uv = (0, 0)` is the top-left corner of row 0, `uv = (1, 1)` the
//! bottom-right corner of the last row. Texel `(x, y)` has its center at
//! `((x + 0.5) / width, (y + 0.5) / height)`.

use glam::{Vec2, Vec4};
use ndarray::{s, Array3, ArrayView3};
use serde::{Deserialize, Serialize};

use crate::error::{FxError, FxResult};

/// Capability to fetch a filtered RGBA color at a normalized coordinate.
///
/// Implementations must be pure: the same `uv` always yields the same color.
/// `Sync` is required so a frame can be shaded from many threads at once.
pub trait ImageSampler: Sync {
    fn sample(&self, uv: Vec2) -> Vec4;
}

/// How texel indices outside the image are mapped back inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressMode {
    /// Indices are clamped to the nearest edge texel.
    ClampToEdge,
    /// Indices wrap around (tiling).
    #[default]
    Repeat,
}

impl AddressMode {
    /// Map a possibly out-of-range texel index into `0..size`.
    ///
    /// `size` must be non-zero.
    #[inline]
    pub fn resolve(self, index: i64, size: usize) -> usize {
        let size = size as i64;
        match self {
            AddressMode::ClampToEdge => index.clamp(0, size - 1) as usize,
            AddressMode::Repeat => index.rem_euclid(size) as usize,
        }
    }
}

/// Texel filtering applied by [`Texture`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Point sampling of the texel containing `uv`.
    Nearest,
    /// Bilinear blend of the four texels around `uv`.
    #[default]
    Linear,
}

// ============================================================================
// Samplers
// ============================================================================

/// A sampler that returns the same color everywhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolidColor(pub Vec4);

impl ImageSampler for SolidColor {
    #[inline]
    fn sample(&self, _uv: Vec2) -> Vec4 {
        self.0
    }
}

/// RGBA f32 image with explicit addressing and filtering.
///
/// Texels are stored as an `(height, width, 4)` array, values nominally in
/// 0.0-1.0 (nothing is clamped on read).
#[derive(Debug, Clone)]
pub struct Texture {
    texels: Array3<f32>,
    address_mode: AddressMode,
    filter_mode: FilterMode,
}

impl Texture {
    /// Wrap an `(height, width, 4)` RGBA array.
    pub fn from_rgba(texels: Array3<f32>) -> FxResult<Self> {
        let (height, width, channels) = texels.dim();
        if channels != 4 {
            return Err(FxError::UnsupportedChannels(channels));
        }
        if width == 0 || height == 0 {
            return Err(FxError::InvalidDimensions(format!(
                "texture must be non-empty, got {}x{}",
                width, height
            )));
        }
        Ok(Self {
            texels,
            address_mode: AddressMode::default(),
            filter_mode: FilterMode::default(),
        })
    }

    /// Build a texture from an image with 1, 3, or 4 channels.
    ///
    /// Grayscale expands to `(g, g, g, 1)`, RGB to `(r, g, b, 1)`.
    pub fn from_channels(input: ArrayView3<f32>) -> FxResult<Self> {
        let (height, width, channels) = input.dim();
        let texels = match channels {
            4 => input.to_owned(),
            3 => {
                let mut texels = Array3::<f32>::ones((height, width, 4));
                texels.slice_mut(s![.., .., 0..3]).assign(&input);
                texels
            }
            1 => {
                let mut texels = Array3::<f32>::ones((height, width, 4));
                let gray = input.slice(s![.., .., 0]);
                for c in 0..3 {
                    texels.slice_mut(s![.., .., c]).assign(&gray);
                }
                texels
            }
            other => return Err(FxError::UnsupportedChannels(other)),
        };
        Self::from_rgba(texels)
    }

    /// Texture filled with one color.
    pub fn solid(width: usize, height: usize, color: Vec4) -> FxResult<Self> {
        Self::from_rgba(Array3::from_shape_fn((height, width, 4), |(_, _, c)| color[c]))
    }

    pub fn with_address_mode(mut self, mode: AddressMode) -> Self {
        self.address_mode = mode;
        self
    }

    pub fn with_filter_mode(mut self, mode: FilterMode) -> Self {
        self.filter_mode = mode;
        self
    }

    pub fn width(&self) -> usize {
        self.texels.dim().1
    }

    pub fn height(&self) -> usize {
        self.texels.dim().0
    }

    pub fn address_mode(&self) -> AddressMode {
        self.address_mode
    }

    pub fn filter_mode(&self) -> FilterMode {
        self.filter_mode
    }

    /// Fetch one texel by integer index, applying the address mode.
    #[inline]
    pub fn texel(&self, x: i64, y: i64) -> Vec4 {
        let (height, width, _) = self.texels.dim();
        let x = self.address_mode.resolve(x, width);
        let y = self.address_mode.resolve(y, height);
        Vec4::new(
            self.texels[[y, x, 0]],
            self.texels[[y, x, 1]],
            self.texels[[y, x, 2]],
            self.texels[[y, x, 3]],
        )
    }

    #[inline]
    fn sample_nearest(&self, uv: Vec2) -> Vec4 {
        // Float-to-int casts saturate (NaN -> 0), so any uv is a valid index.
        let x = (uv.x * self.width() as f32).floor() as i64;
        let y = (uv.y * self.height() as f32).floor() as i64;
        self.texel(x, y)
    }

    #[inline]
    fn sample_linear(&self, uv: Vec2) -> Vec4 {
        let tx = uv.x * self.width() as f32 - 0.5;
        let ty = uv.y * self.height() as f32 - 0.5;
        let x0 = tx.floor();
        let y0 = ty.floor();
        let fx = tx - x0;
        let fy = ty - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let t00 = self.texel(x0, y0);
        let t10 = self.texel(x0.saturating_add(1), y0);
        let t01 = self.texel(x0, y0.saturating_add(1));
        let t11 = self.texel(x0.saturating_add(1), y0.saturating_add(1));

        t00.lerp(t10, fx).lerp(t01.lerp(t11, fx), fy)
    }
}

impl ImageSampler for Texture {
    #[inline]
    fn sample(&self, uv: Vec2) -> Vec4 {
        match self.filter_mode {
            FilterMode::Nearest => self.sample_nearest(uv),
            FilterMode::Linear => self.sample_linear(uv),
        }
    }
}

// ============================================================================
// Explicit Bilinear Lookup
// ============================================================================

/// Bilinear lookup built from four point fetches.
///
/// Bypasses the sampler's own filtering, so the interpolation runs at full
/// f32 precision regardless of how coarse the underlying hardware or
/// sampler filter is.
///
/// # Arguments
/// * `tex` - Sampler to fetch from (normally point-filtered)
/// * `st` - Normalized coordinate
/// * `dims` - Texture width and height in texels
/// * `one` - Reciprocal of `dims`, precomputed by the caller
pub fn texture_bilinear<S: ImageSampler + ?Sized>(tex: &S, st: Vec2, dims: Vec2, one: Vec2) -> Vec4 {
    let uv = st * dims;
    let uv00 = (uv - 0.5).floor();
    let weights = uv - uv00 - 0.5;
    let st00 = (uv00 + 0.5) * one;

    let t00 = tex.sample(st00);
    let t10 = tex.sample(st00 + Vec2::new(one.x, 0.0));
    let t01 = tex.sample(st00 + Vec2::new(0.0, one.y));
    let t11 = tex.sample(st00 + one);

    let t0 = t00.lerp(t01, weights.y);
    let t1 = t10.lerp(t11, weights.y);
    t0.lerp(t1, weights.x)
}

/// Sampler adapter that routes every fetch through [`texture_bilinear`].
#[derive(Debug, Clone)]
pub struct BilinearLookup<S> {
    inner: S,
    dims: Vec2,
    one: Vec2,
}

impl<S: ImageSampler> BilinearLookup<S> {
    pub fn new(inner: S, width: usize, height: usize) -> FxResult<Self> {
        if width == 0 || height == 0 {
            return Err(FxError::InvalidDimensions(format!(
                "bilinear lookup needs a non-empty grid, got {}x{}",
                width, height
            )));
        }
        let dims = Vec2::new(width as f32, height as f32);
        Ok(Self {
            inner,
            dims,
            one: dims.recip(),
        })
    }
}

impl<S: ImageSampler> ImageSampler for BilinearLookup<S> {
    #[inline]
    fn sample(&self, uv: Vec2) -> Vec4 {
        texture_bilinear(&self.inner, uv, self.dims, self.one)
    }
}
