//! Deterministic 2D gradient noise.
//!
//! The water shader evaluates the exact same function in WGSL (`noise2` in
//! `water.wgsl`), so the integer hash and the quintic fade here must stay in sync
//! with it.

use glam::{IVec2, Vec2};

/// Shift applied to the sample point of the vertical distortion axis so that the
/// two offsets are decorrelated.
pub const SECOND_AXIS_SHIFT: Vec2 = Vec2::new(17.13, 41.77);

/// Integer avalanche hash (lowbias32).
fn hash(mut x: u32) -> u32 {
    x ^= x >> 16;
    x = x.wrapping_mul(0x7feb_352d);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846c_a68b);
    x ^= x >> 16;
    x
}

/// Unit gradient assigned to a lattice point.
fn gradient(cell: IVec2) -> Vec2 {
    let h = hash((cell.x as u32).wrapping_mul(0x8da6_b343) ^ (cell.y as u32).wrapping_mul(0xd816_3841));
    // top 24 bits mapped onto [0, 2π)
    let angle = (h >> 8) as f32 * (std::f32::consts::TAU / 16_777_216.0);
    Vec2::new(angle.cos(), angle.sin())
}

fn fade(t: Vec2) -> Vec2 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

/// Evaluates gradient noise at `p`.
///
/// The result is continuous, zero on integer lattice points and lies in `[-1, 1]`.
/// Non-finite input yields `0.0`.
pub fn noise(p: Vec2) -> f32 {
    if !p.is_finite() {
        return 0.0;
    }

    let cell_f = p.floor();
    let f = p - cell_f;
    let cell = IVec2::new(cell_f.x as i32, cell_f.y as i32);
    let u = fade(f);

    let n00 = gradient(cell).dot(f);
    let n10 = gradient(cell + IVec2::X).dot(f - Vec2::X);
    let n01 = gradient(cell + IVec2::Y).dot(f - Vec2::Y);
    let n11 = gradient(cell + IVec2::ONE).dot(f - Vec2::ONE);

    let nx0 = n00 + (n10 - n00) * u.x;
    let nx1 = n01 + (n11 - n01) * u.x;
    let n = nx0 + (nx1 - nx0) * u.y;

    // 2D gradient noise peaks at sqrt(2)/2 for unit gradients.
    (n * std::f32::consts::SQRT_2).clamp(-1.0, 1.0)
}

/// Two-axis screen-space distortion offset.
///
/// Noise is sampled at `coord * frequency + time` (the vertical axis shifted by
/// [`SECOND_AXIS_SHIFT`]) and the result is scaled by `amplitude`. An amplitude of
/// zero always yields a zero offset.
pub fn distortion_offset(coord: Vec2, frequency: f32, amplitude: f32, time: f32) -> Vec2 {
    if amplitude == 0.0 {
        return Vec2::ZERO;
    }
    let p = coord * frequency + Vec2::splat(time);
    let offset = Vec2::new(noise(p), noise(p + SECOND_AXIS_SHIFT)) * amplitude;
    if offset.is_finite() {
        offset
    } else {
        Vec2::ZERO
    }
}
