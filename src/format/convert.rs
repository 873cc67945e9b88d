//! Sample format and channel conversion.

/// Averages one stereo pair into a mono sample.
///
/// The sum is taken in `i32` so full-scale inputs cannot overflow, and the
/// halving rounds toward negative infinity: `(-1, 0)` gives `-1`.
#[inline]
pub fn downmix(left: i16, right: i16) -> i16 {
    // floor((l + r) / 2) always lies between l and r, so it fits in i16
    (i32::from(left) + i32::from(right)).div_euclid(2) as i16
}

/// Converts i16 samples to f32.
///
/// Output will be in the range [-1.0, 1.0].
#[inline]
pub fn i16_to_f32(sample: i16) -> f32 {
    f32::from(sample) / 32768.0
}
