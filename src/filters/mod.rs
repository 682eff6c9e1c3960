//! Per-pixel filter building blocks.
//!
//! Every filter here evaluates a single output pixel at a normalized
//! coordinate. Filters that look at neighbouring pixels take an
//! [`ImageSampler`](crate::sampler::ImageSampler) rather than an image, so
//! edge handling and texel filtering stay the sampler's concern.
//!
//! ## Filter Categories
//!
//! - **Random**: hashed pseudo-random scalars from float bit patterns
//! - **Color science**: RGB <-> HSV, hue zero/rotate, sepia, greyscale
//! - **Blur**: incremental-weight Gaussian blur (uniform blur and bloom)
//! - **Noise**: 2D simplex noise and film grain
//! - **Halftone**: CMYK dot screens with anti-aliased dot edges
//! - **Depth of field**: 41-tap ring blur driven by a depth-like value

pub mod antialias;
pub mod blur;
pub mod color_science;
pub mod core;
pub mod depth_of_field;
pub mod halftone;
pub mod noise;
pub mod random;

pub use antialias::{aastep, AntialiasFallback, AntialiasMode};
pub use blur::{GaussianBlur, IncrementalGaussian, BLOOM_TAPS, UNIFORM_BLUR_TAPS};
pub use color_science::{hsv_to_rgb, rgb_to_hsv, ColorHsv};
pub use depth_of_field::DepthOfField;
pub use halftone::{cmyk_separation, Halftone};
pub use noise::{film_grain, simplex2};
pub use random::{hash, random, HashInput};
