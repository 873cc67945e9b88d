//! Linear ramps used to hide the discontinuity at stream start and stop.

/// Applies the start-of-stream ramp to one sample.
///
/// `position` is the number of samples produced before this one. Inside the
/// ramp (`position < len`) the sample is scaled by `position / len`, so the
/// very first sample is silent and sample `len` is the first at full level.
#[inline]
pub fn fade_in(sample: i16, position: u64, len: usize) -> i16 {
    if position >= len as u64 {
        return sample;
    }
    // i128 holds any usize and any i16 * u64 product
    (i128::from(sample) * i128::from(position)).div_euclid(len as i128) as i16
}

/// Returns sample `step` of the stop ramp that leads `last` down to zero.
///
/// Step `len - 1` (and anything past it) is exactly zero.
#[inline]
pub fn fade_out_step(last: i16, step: usize, len: usize) -> i16 {
    if step + 1 >= len {
        return 0;
    }
    let remaining = (len - step - 1) as i128;
    (i128::from(last) * remaining).div_euclid(len as i128) as i16
}
