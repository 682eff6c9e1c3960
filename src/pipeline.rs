//! Effect flags and the ordered per-pixel stage table.
//!
//! A pixel starts as the unfiltered source sample at its coordinate. Each
//! enabled stage then transforms that accumulator in the fixed order of
//! [`STAGES`]. Some stages read the accumulator (noise, the HSV grading
//! stages), others resample the source image and replace it (blur,
//! halftone, depth of field), so the order decides what survives.
//!
//! ```
//! use glam::{Vec2, Vec4};
//! use postfx::{EffectFlags, EffectParameters, EffectPipeline};
//! use postfx::sampler::SolidColor;
//!
//! let flags: EffectFlags = "greyscale".parse().unwrap();
//! let pipeline = EffectPipeline::new(flags, EffectParameters::default()).unwrap();
//! let red = SolidColor(Vec4::new(1.0, 0.0, 0.0, 1.0));
//! assert_eq!(pipeline.shade(&red, Vec2::new(0.5, 0.5)), Vec4::new(0.5, 0.5, 0.5, 1.0));
//! ```

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::str::FromStr;

use glam::{Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{FxError, FxResult};
use crate::filters::blur::{GaussianBlur, BLOOM_TAPS, UNIFORM_BLUR_TAPS};
use crate::filters::color_science::{desaturate, rotate_hue, sepia_tone, zero_hue};
use crate::filters::halftone::Halftone;
use crate::filters::random::random;
use crate::params::EffectParameters;
use crate::sampler::ImageSampler;

// ============================================================================
// Flags
// ============================================================================

/// Bitmask of enabled effects.
///
/// Bits outside the known set are dropped on construction and never select
/// a stage.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct EffectFlags(u32);

impl EffectFlags {
    pub const UNIFORM_BLUR: Self = Self(1);
    pub const DEPTH_OF_FIELD: Self = Self(1 << 1);
    pub const BLOOM: Self = Self(1 << 2);
    pub const ADDITIVE_NOISE: Self = Self(1 << 3);
    pub const HUE_ZERO: Self = Self(1 << 4);
    pub const SCRATCHED_FILM: Self = Self(1 << 5);
    pub const SEPIA: Self = Self(1 << 6);
    pub const GREYSCALE: Self = Self(1 << 7);
    pub const HALFTONE: Self = Self(1 << 8);
    pub const HUE_ROTATE_60: Self = Self(1 << 9);
    pub const HUE_ROTATE_120: Self = Self(1 << 10);
    pub const HUE_ROTATE_180: Self = Self(1 << 11);
    pub const HUE_ROTATE_240: Self = Self(1 << 12);
    pub const HUE_ROTATE_300: Self = Self(1 << 13);

    const KNOWN: u32 = (1 << 14) - 1;

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn all() -> Self {
        Self(Self::KNOWN)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Keep the known bits of `bits`, drop the rest.
    pub const fn from_bits_truncate(bits: u32) -> Self {
        Self(bits & Self::KNOWN)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when every bit of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// True when any bit of `other` is set.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// Flip `other` on or off, the way an interactive host toggles an
    /// effect per key press.
    pub fn toggle(&mut self, other: Self) {
        self.0 ^= other.0;
    }

    /// Set flags in evaluation order.
    pub fn iter(self) -> impl Iterator<Item = Self> {
        STAGES
            .iter()
            .map(|stage| stage.flag)
            .filter(move |flag| self.contains(*flag))
    }

    /// Lowercase name of a single known flag.
    pub fn name(self) -> Option<&'static str> {
        STAGES
            .iter()
            .find(|stage| stage.flag == self)
            .map(|stage| stage.name)
    }
}

impl From<u32> for EffectFlags {
    fn from(bits: u32) -> Self {
        Self::from_bits_truncate(bits)
    }
}

impl From<EffectFlags> for u32 {
    fn from(flags: EffectFlags) -> Self {
        flags.0
    }
}

impl BitOr for EffectFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for EffectFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for EffectFlags {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Debug for EffectFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("EffectFlags(empty)");
        }
        f.write_str("EffectFlags(")?;
        for (i, flag) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            f.write_str(flag.name().unwrap_or("?"))?;
        }
        f.write_str(")")
    }
}

impl FromStr for EffectFlags {
    type Err = FxError;

    /// Parse names such as `"bloom | sepia"` or `"greyscale,halftone"`.
    fn from_str(s: &str) -> FxResult<Self> {
        let mut flags = Self::empty();
        for token in s
            .split(|c: char| c == '|' || c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            let token = token.to_ascii_lowercase();
            let stage = STAGES
                .iter()
                .find(|stage| stage.name == token)
                .ok_or_else(|| FxError::InvalidParameter(format!("unknown effect '{}'", token)))?;
            flags.insert(stage.flag);
        }
        Ok(flags)
    }
}

// ============================================================================
// Stage Table
// ============================================================================

/// Pixel being shaded: its coordinate and the running color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelSample {
    pub uv: Vec2,
    pub color: Vec4,
}

/// Inputs every stage can read besides the accumulator.
struct StageContext<'a> {
    source: &'a dyn ImageSampler,
    uv: Vec2,
    pipeline: &'a EffectPipeline,
}

type StageFn = fn(&StageContext<'_>, Vec4) -> Vec4;

/// One entry of the stage table.
pub struct Stage {
    pub flag: EffectFlags,
    pub name: &'static str,
    apply: StageFn,
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("flag", &self.flag.bits())
            .field("name", &self.name)
            .finish()
    }
}

/// All stages in evaluation order.
pub static STAGES: [Stage; 14] = [
    Stage { flag: EffectFlags::UNIFORM_BLUR, name: "uniform_blur", apply: uniform_blur },
    Stage { flag: EffectFlags::BLOOM, name: "bloom", apply: bloom },
    Stage { flag: EffectFlags::ADDITIVE_NOISE, name: "additive_noise", apply: additive_noise },
    Stage { flag: EffectFlags::HUE_ZERO, name: "hue_zero", apply: hue_zero },
    Stage { flag: EffectFlags::SCRATCHED_FILM, name: "scratched_film", apply: scratched_film },
    Stage { flag: EffectFlags::SEPIA, name: "sepia", apply: sepia },
    Stage { flag: EffectFlags::GREYSCALE, name: "greyscale", apply: greyscale },
    Stage { flag: EffectFlags::HALFTONE, name: "halftone", apply: halftone },
    Stage { flag: EffectFlags::HUE_ROTATE_60, name: "hue_rotate_60", apply: hue_rotate::<60> },
    Stage { flag: EffectFlags::HUE_ROTATE_120, name: "hue_rotate_120", apply: hue_rotate::<120> },
    Stage { flag: EffectFlags::HUE_ROTATE_180, name: "hue_rotate_180", apply: hue_rotate::<180> },
    Stage { flag: EffectFlags::HUE_ROTATE_240, name: "hue_rotate_240", apply: hue_rotate::<240> },
    Stage { flag: EffectFlags::HUE_ROTATE_300, name: "hue_rotate_300", apply: hue_rotate::<300> },
    Stage { flag: EffectFlags::DEPTH_OF_FIELD, name: "depth_of_field", apply: depth_of_field },
];

fn uniform_blur(ctx: &StageContext<'_>, _color: Vec4) -> Vec4 {
    ctx.pipeline.blur.sample(ctx.source, ctx.uv, UNIFORM_BLUR_TAPS)
}

/// Adds three blur radii on top; the result may exceed 1.
fn bloom(ctx: &StageContext<'_>, color: Vec4) -> Vec4 {
    let blur = &ctx.pipeline.blur;
    BLOOM_TAPS
        .iter()
        .fold(color, |acc, &taps| acc + blur.sample(ctx.source, ctx.uv, taps))
}

fn additive_noise(ctx: &StageContext<'_>, color: Vec4) -> Vec4 {
    let e = random(Vec3::new(ctx.uv.x, ctx.uv.y, ctx.pipeline.params.time));
    color + Vec4::splat(e)
}

fn hue_zero(_ctx: &StageContext<'_>, color: Vec4) -> Vec4 {
    zero_hue(color.truncate()).extend(1.0)
}

fn scratched_film(_ctx: &StageContext<'_>, color: Vec4) -> Vec4 {
    color
}

fn sepia(_ctx: &StageContext<'_>, color: Vec4) -> Vec4 {
    sepia_tone(color.truncate()).extend(1.0)
}

fn greyscale(_ctx: &StageContext<'_>, color: Vec4) -> Vec4 {
    desaturate(color.truncate()).extend(1.0)
}

fn halftone(ctx: &StageContext<'_>, _color: Vec4) -> Vec4 {
    ctx.pipeline.halftone.sample(ctx.source, ctx.uv)
}

fn hue_rotate<const DEGREES: u32>(_ctx: &StageContext<'_>, color: Vec4) -> Vec4 {
    rotate_hue(color.truncate(), DEGREES as f32).extend(1.0)
}

fn depth_of_field(ctx: &StageContext<'_>, _color: Vec4) -> Vec4 {
    ctx.pipeline
        .params
        .depth_of_field
        .sample(ctx.source, ctx.uv)
}

// ============================================================================
// Pipeline
// ============================================================================

/// The enabled stages for one frame plus the filters they share.
#[derive(Debug, Clone)]
pub struct EffectPipeline {
    flags: EffectFlags,
    params: EffectParameters,
    blur: GaussianBlur,
    halftone: Halftone,
    stages: Vec<&'static Stage>,
}

impl EffectPipeline {
    /// Build a pipeline after validating `params`.
    pub fn new(flags: EffectFlags, params: EffectParameters) -> FxResult<Self> {
        params.validate()?;
        let pipeline = Self::build(flags, params);
        trace!(
            flags = flags.bits(),
            stages = ?pipeline.stages().map(|s| s.name).collect::<Vec<_>>(),
            "built effect pipeline"
        );
        Ok(pipeline)
    }

    fn build(flags: EffectFlags, params: EffectParameters) -> Self {
        Self {
            flags,
            params,
            blur: params.gaussian(),
            halftone: params.halftone(),
            stages: STAGES.iter().filter(|s| flags.contains(s.flag)).collect(),
        }
    }

    pub fn flags(&self) -> EffectFlags {
        self.flags
    }

    pub fn params(&self) -> &EffectParameters {
        &self.params
    }

    /// Enabled stages, in evaluation order.
    pub fn stages(&self) -> impl Iterator<Item = &'static Stage> + '_ {
        self.stages.iter().copied()
    }

    /// Shade one pixel.
    ///
    /// # Arguments
    /// * `source` - Source image sampler
    /// * `uv` - Normalized pixel coordinate
    ///
    /// # Returns
    /// Final RGBA color. With no stages enabled this is exactly
    /// `source.sample(uv)`.
    pub fn shade(&self, source: &dyn ImageSampler, uv: Vec2) -> Vec4 {
        self.shade_sample(source, uv).color
    }

    /// Like [`shade`](Self::shade), returning the coordinate with the color.
    pub fn shade_sample(&self, source: &dyn ImageSampler, uv: Vec2) -> PixelSample {
        let ctx = StageContext {
            source,
            uv,
            pipeline: self,
        };
        let color = self
            .stages
            .iter()
            .fold(source.sample(uv), |color, stage| (stage.apply)(&ctx, color));
        PixelSample { uv, color }
    }
}

/// Shade a single pixel without building a pipeline up front.
///
/// `params` is used as given; invalid values are not rejected here but
/// degrade through the filters' own guards.
pub fn shade_pixel(
    source: &dyn ImageSampler,
    uv: Vec2,
    flags: EffectFlags,
    params: &EffectParameters,
) -> Vec4 {
    EffectPipeline::build(flags, *params).shade(source, uv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::{SolidColor, Texture};
    use approx::assert_relative_eq;
    use ndarray::Array3;

    const RED: Vec4 = Vec4::new(1.0, 0.0, 0.0, 1.0);

    fn pipeline(flags: EffectFlags) -> EffectPipeline {
        EffectPipeline::new(flags, EffectParameters::default()).unwrap()
    }

    fn gradient() -> Texture {
        let texels = Array3::from_shape_fn((6, 9, 4), |(y, x, c)| match c {
            0 => x as f32 / 8.0,
            1 => y as f32 / 5.0,
            2 => 0.25,
            _ => 0.5,
        });
        Texture::from_rgba(texels).unwrap()
    }

    #[test]
    fn test_no_flags_returns_raw_sample() {
        let tex = gradient();
        let p = pipeline(EffectFlags::empty());
        for uv in [Vec2::new(0.13, 0.77), Vec2::new(-0.4, 1.6), Vec2::new(0.5, 0.5)] {
            assert_eq!(p.shade(&tex, uv), tex.sample(uv));
        }
    }

    #[test]
    fn test_greyscale_red() {
        let out = pipeline(EffectFlags::GREYSCALE).shade(&SolidColor(RED), Vec2::splat(0.5));
        assert_eq!(out, Vec4::new(0.5, 0.5, 0.5, 1.0));
    }

    #[test]
    fn test_hue_rotate_red_to_yellow() {
        let out = pipeline(EffectFlags::HUE_ROTATE_60).shade(&SolidColor(RED), Vec2::splat(0.5));
        assert_eq!(out, Vec4::new(1.0, 1.0, 0.0, 1.0));
    }

    #[test]
    fn test_stage_order_sepia_then_greyscale() {
        let out = pipeline(EffectFlags::SEPIA | EffectFlags::GREYSCALE)
            .shade(&SolidColor(RED), Vec2::splat(0.5));
        let expected = desaturate(sepia_tone(RED.truncate())).extend(1.0);
        assert_eq!(out, expected);
        assert_relative_eq!(out.x, 0.25, max_relative = 1e-6);
    }

    #[test]
    fn test_hsv_stages_force_alpha() {
        let src = SolidColor(Vec4::new(0.2, 0.6, 0.4, 0.3));
        for flag in [
            EffectFlags::HUE_ZERO,
            EffectFlags::SEPIA,
            EffectFlags::GREYSCALE,
            EffectFlags::HUE_ROTATE_240,
        ] {
            assert_eq!(pipeline(flag).shade(&src, Vec2::splat(0.5)).w, 1.0);
        }
    }

    #[test]
    fn test_unknown_bits_ignored() {
        let tex = gradient();
        let uv = Vec2::new(0.3, 0.6);
        let noisy = EffectFlags::from_bits_truncate(EffectFlags::GREYSCALE.bits() | 1 << 20 | 1 << 31);
        assert_eq!(noisy, EffectFlags::GREYSCALE);
        assert_eq!(pipeline(noisy).shade(&tex, uv), pipeline(EffectFlags::GREYSCALE).shade(&tex, uv));
    }

    #[test]
    fn test_scratched_film_is_noop() {
        let tex = gradient();
        let uv = Vec2::new(0.21, 0.42);
        assert_eq!(pipeline(EffectFlags::SCRATCHED_FILM).shade(&tex, uv), tex.sample(uv));
    }

    #[test]
    fn test_bloom_on_constant_image_quadruples() {
        let c = Vec4::new(0.1, 0.2, 0.3, 0.5);
        let out = pipeline(EffectFlags::BLOOM).shade(&SolidColor(c), Vec2::splat(0.5));
        for i in 0..4 {
            assert_relative_eq!(out[i], 4.0 * c[i], max_relative = 1e-5);
        }
    }

    #[test]
    fn test_uniform_blur_on_constant_image() {
        let c = Vec4::new(0.1, 0.2, 0.3, 0.5);
        let out = pipeline(EffectFlags::UNIFORM_BLUR).shade(&SolidColor(c), Vec2::splat(0.5));
        for i in 0..4 {
            assert_relative_eq!(out[i], c[i], max_relative = 1e-5);
        }
    }

    #[test]
    fn test_additive_noise_adds_same_value_to_every_channel() {
        let c = Vec4::new(0.1, 0.2, 0.3, 0.4);
        let uv = Vec2::new(0.25, 0.75);
        let params = EffectParameters::default().with_time(3.5);
        let p = EffectPipeline::new(EffectFlags::ADDITIVE_NOISE, params).unwrap();
        let out = p.shade(&SolidColor(c), uv);
        let e = random(Vec3::new(uv.x, uv.y, 3.5));
        assert_eq!(out, c + Vec4::splat(e));

        // A different frame time gives different grain.
        let later = EffectPipeline::new(EffectFlags::ADDITIVE_NOISE, params.with_time(3.6)).unwrap();
        assert_ne!(later.shade(&SolidColor(c), uv), out);
    }

    #[test]
    fn test_halftone_and_depth_of_field_are_opaque() {
        let tex = gradient();
        let uv = Vec2::new(0.4, 0.4);
        assert_eq!(pipeline(EffectFlags::HALFTONE).shade(&tex, uv).w, 1.0);
        assert_eq!(pipeline(EffectFlags::DEPTH_OF_FIELD).shade(&tex, uv).w, 1.0);
    }

    #[test]
    fn test_depth_of_field_replaces_earlier_stages() {
        let tex = gradient();
        let uv = Vec2::new(0.4, 0.4);
        let dof_only = pipeline(EffectFlags::DEPTH_OF_FIELD).shade(&tex, uv);
        let with_grading = pipeline(EffectFlags::DEPTH_OF_FIELD | EffectFlags::SEPIA).shade(&tex, uv);
        assert_eq!(dof_only, with_grading);
    }

    #[test]
    fn test_shade_pixel_matches_pipeline() {
        let tex = gradient();
        let uv = Vec2::new(0.66, 0.12);
        let flags = EffectFlags::BLOOM | EffectFlags::HUE_ROTATE_120;
        let params = EffectParameters::default();
        assert_eq!(shade_pixel(&tex, uv, flags, &params), pipeline(flags).shade(&tex, uv));
    }

    #[test]
    fn test_stages_in_table_order() {
        let p = pipeline(
            EffectFlags::DEPTH_OF_FIELD | EffectFlags::HUE_ROTATE_60 | EffectFlags::UNIFORM_BLUR,
        );
        let names: Vec<_> = p.stages().map(|s| s.name).collect();
        assert_eq!(names, ["uniform_blur", "hue_rotate_60", "depth_of_field"]);
    }

    #[test]
    fn test_hue_rotation_runs_after_halftone() {
        let tex = gradient();
        let halftone = EffectParameters::default().halftone();
        let p = pipeline(EffectFlags::HALFTONE | EffectFlags::HUE_ROTATE_180);
        for uv in [Vec2::new(0.31, 0.44), Vec2::new(0.72, 0.18), Vec2::new(0.05, 0.93)] {
            let expected = rotate_hue(halftone.sample(&tex, uv).truncate(), 180.0).extend(1.0);
            let out = p.shade(&tex, uv);
            assert_eq!(out, expected);
            assert_eq!(out.w, 1.0);
        }
    }

    #[test]
    fn test_new_rejects_invalid_params() {
        let mut params = EffectParameters::default();
        params.sigma = -1.0;
        assert!(EffectPipeline::new(EffectFlags::BLOOM, params).is_err());
    }

    #[test]
    fn test_flag_set_operations() {
        let mut flags = EffectFlags::BLOOM;
        flags |= EffectFlags::SEPIA;
        assert!(flags.contains(EffectFlags::BLOOM | EffectFlags::SEPIA));
        assert!(flags.intersects(EffectFlags::SEPIA | EffectFlags::HALFTONE));
        assert!(!flags.contains(EffectFlags::HALFTONE));

        flags.toggle(EffectFlags::BLOOM);
        assert_eq!(flags, EffectFlags::SEPIA);
        flags.toggle(EffectFlags::BLOOM);
        flags.remove(EffectFlags::SEPIA);
        assert_eq!(flags, EffectFlags::BLOOM);
        assert_eq!((flags & EffectFlags::SEPIA), EffectFlags::empty());
        assert!(EffectFlags::empty().is_empty());
        assert_eq!(EffectFlags::all().bits(), 0x3FFF);
        assert_eq!(EffectFlags::all().iter().count(), 14);
    }

    #[test]
    fn test_flag_parse_and_debug() {
        let flags: EffectFlags = "Bloom | SEPIA, hue_rotate_300".parse().unwrap();
        assert_eq!(
            flags,
            EffectFlags::BLOOM | EffectFlags::SEPIA | EffectFlags::HUE_ROTATE_300
        );
        assert_eq!(format!("{:?}", flags), "EffectFlags(bloom | sepia | hue_rotate_300)");
        assert_eq!(format!("{:?}", EffectFlags::empty()), "EffectFlags(empty)");
        assert_eq!("".parse::<EffectFlags>().unwrap(), EffectFlags::empty());
        assert!(matches!(
            "bloom|sparkle".parse::<EffectFlags>(),
            Err(FxError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_flags_serde_as_integer() {
        let flags = EffectFlags::GREYSCALE | EffectFlags::HALFTONE;
        assert_eq!(serde_json::to_string(&flags).unwrap(), "384");
        let parsed: EffectFlags = serde_json::from_str("65920").unwrap();
        assert_eq!(parsed, EffectFlags::HALFTONE | EffectFlags::GREYSCALE);
    }
}
