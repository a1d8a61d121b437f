//! Reverb effect — a short multi-tap echo.
//!
//! Delayed copies of the dry signal at multiples of a fixed base delay are
//! summed onto the original, each quieter than the last.

use super::buffer::{clip_i16, AudioBuffer};

/// Spacing between taps.
pub const BASE_DELAY_MS: f64 = 30.0;
/// Number of delayed copies.
pub const TAPS: usize = 3;

/// Add `TAPS` echoes of `buf`; tap `i` (1-based) is delayed by
/// `i * BASE_DELAY_MS` and scaled by `amount / (i + 1)`. Output length
/// matches the input.
pub fn reverb(buf: &AudioBuffer, amount: f64) -> AudioBuffer {
    let n = buf.channels().count();
    let frames = buf.frames();
    let delay = buf.frame_at(BASE_DELAY_MS);
    let dry = buf.samples();
    let mut wet: Vec<f64> = dry.iter().map(|&s| s as f64).collect();

    for tap in 1..=TAPS {
        let offset = delay * tap;
        if delay == 0 || offset >= frames {
            break;
        }
        let atten = amount / (tap + 1) as f64;
        for (dst, &src) in wet[offset * n..].iter_mut().zip(dry) {
            *dst += src as f64 * atten;
        }
    }

    buf.with_samples(wet.into_iter().map(clip_i16).collect())
}
