//! Simplex noise and the film grain built from it.
//!
//! [`simplex2`] is the classic 2D simplex noise in its texture-free form:
//! lattice hashing uses the permutation polynomial `(34x + 1)x mod 289`
//! instead of a lookup table, and gradients are spread over a rotated
//! cross-polytope derived from `fract(p / 41)`. Output is continuous,
//! deterministic and roughly in [-1, 1].

use glam::{Vec2, Vec3, Vec4};

/// (3 - sqrt 3) / 6, sqrt(3) - 1 over 2, -1 + 2 * first, 1 / 41
const C: Vec4 = Vec4::new(
    0.211_324_87,
    0.366_025_42,
    -0.577_350_26,
    0.024_390_243,
);

/// Grain octaves as (coordinate scale, amplitude).
pub const GRAIN_OCTAVES: [(f32, f32); 3] = [(200.0, 0.1), (400.0, 0.05), (800.0, 0.025)];

#[inline]
fn mod289_2(x: Vec2) -> Vec2 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

#[inline]
fn mod289_3(x: Vec3) -> Vec3 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

#[inline]
fn permute(x: Vec3) -> Vec3 {
    mod289_3((x * 34.0 + 1.0) * x)
}

#[inline]
fn fract3(v: Vec3) -> Vec3 {
    v - v.floor()
}

/// 2D simplex noise.
pub fn simplex2(v: Vec2) -> f32 {
    // First corner
    let i = (v + v.dot(Vec2::splat(C.y))).floor();
    let x0 = v - i + i.dot(Vec2::splat(C.x));

    // Other corners
    let i1 = if x0.x > x0.y { Vec2::X } else { Vec2::Y };
    let x1 = x0 + C.x - i1;
    let x2 = x0 + C.z;

    // Permutations
    let i = mod289_2(i);
    let p = permute(
        permute(i.y + Vec3::new(0.0, i1.y, 1.0)) + i.x + Vec3::new(0.0, i1.x, 1.0),
    );

    let mut m = (Vec3::splat(0.5) - Vec3::new(x0.dot(x0), x1.dot(x1), x2.dot(x2))).max(Vec3::ZERO);
    m *= m;
    m *= m;

    // Gradients
    let x = 2.0 * fract3(p * C.w) - 1.0;
    let h = x.abs() - 0.5;
    let a0 = x - (x + 0.5).floor();

    // Normalise gradients implicitly by scaling m
    m *= 1.792_843 - 0.853_735 * (a0 * a0 + h * h);

    let g = Vec3::new(
        a0.x * x0.x + h.x * x0.y,
        a0.y * x1.x + h.y * x1.y,
        a0.z * x2.x + h.z * x2.y,
    );
    130.0 * m.dot(g)
}

/// Three-octave grain value at `uv`, roughly in [-0.175, 0.175].
pub fn film_grain(uv: Vec2) -> f32 {
    GRAIN_OCTAVES
        .iter()
        .map(|&(scale, amplitude)| amplitude * simplex2(uv * scale))
        .sum()
}
