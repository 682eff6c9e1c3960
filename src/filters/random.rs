//! Hashed pseudo-randomness for frame-coherent grain.
//!
//! Each input component's IEEE-754 bit pattern is run through one round of
//! Bob Jenkins' one-at-a-time hash, components are XOR-folded, and the low
//! 23 bits of the result become the mantissa of a float in [1, 2). Subtracting
//! 1.0 gives a value in [0, 1).
//!
//! The mapping is pure: identical bit patterns always give identical output,
//! so `random(Vec3::new(u, v, time))` is stable for a given pixel and frame
//! and changes from frame to frame.

use glam::{Vec2, Vec3, Vec4};

/// binary32 mantissa bitmask
const IEEE_MANTISSA: u32 = 0x007F_FFFF;
/// 1.0 in IEEE binary32
const IEEE_ONE: u32 = 0x3F80_0000;

/// One round of the one-at-a-time hash.
#[inline]
pub fn hash(mut x: u32) -> u32 {
    x = x.wrapping_add(x << 10);
    x ^= x >> 6;
    x = x.wrapping_add(x << 3);
    x ^= x >> 11;
    x = x.wrapping_add(x << 15);
    x
}

/// Build a float in [0, 1) from the low 23 bits of `m`.
///
/// All zeroes yields 0.0; all ones yields `1.0 - f32::EPSILON`.
#[inline]
pub fn float_construct(m: u32) -> f32 {
    f32::from_bits((m & IEEE_MANTISSA) | IEEE_ONE) - 1.0
}

/// Values that can be hashed component-wise by bit pattern.
pub trait HashInput {
    fn hash_bits(&self) -> u32;
}

impl HashInput for f32 {
    #[inline]
    fn hash_bits(&self) -> u32 {
        hash(self.to_bits())
    }
}

impl HashInput for Vec2 {
    #[inline]
    fn hash_bits(&self) -> u32 {
        hash(self.x.to_bits() ^ hash(self.y.to_bits()))
    }
}

impl HashInput for Vec3 {
    #[inline]
    fn hash_bits(&self) -> u32 {
        hash(self.x.to_bits() ^ hash(self.y.to_bits()) ^ hash(self.z.to_bits()))
    }
}

impl HashInput for Vec4 {
    #[inline]
    fn hash_bits(&self) -> u32 {
        hash(
            self.x.to_bits()
                ^ hash(self.y.to_bits())
                ^ hash(self.z.to_bits())
                ^ hash(self.w.to_bits()),
        )
    }
}

/// Deterministic pseudo-random value in [0, 1).
#[inline]
pub fn random<T: HashInput>(value: T) -> f32 {
    float_construct(value.hash_bits())
}
