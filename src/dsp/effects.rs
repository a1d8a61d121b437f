//! Buffer transforms behind the Synthtax effect verbs.
//!
//! Every function borrows its input and returns a new buffer.

use crate::error::RenderError;

use super::buffer::{clip_i16, db_to_ratio, ratio_to_db, AudioBuffer, Channels};
use super::envelope::Fade;
use super::filter::{filter_buffer, FilterType};

/// Length of one 4/4 bar in milliseconds.
pub fn bar_ms(bpm: u32) -> Result<f64, RenderError> {
    if bpm == 0 {
        return Err(RenderError::InvalidParameter {
            name: "bpm",
            value: bpm.to_string(),
            reason: "tempo must be positive",
        });
    }
    Ok(60_000.0 / bpm as f64 * 4.0)
}

/// Tile `buf` end to end and cut it to exactly `bars` bars at `bpm`.
pub fn loop_bars(buf: &AudioBuffer, bars: u32, bpm: u32) -> Result<AudioBuffer, RenderError> {
    let target_ms = bar_ms(bpm)? * bars as f64;
    let target = buf.frame_at(target_ms);
    let n = buf.channels().count();

    if buf.is_empty() {
        return Ok(buf.with_samples(vec![0; target * n]));
    }
    let samples = buf.samples().iter().copied().cycle().take(target * n).collect();
    Ok(buf.with_samples(samples))
}

/// Scale every sample by `db` decibels, clipping.
pub fn gain(buf: &AudioBuffer, db: f64) -> AudioBuffer {
    let ratio = db_to_ratio(db);
    let samples = buf
        .samples()
        .iter()
        .map(|&s| clip_i16(s as f64 * ratio))
        .collect();
    buf.with_samples(samples)
}

/// Linear ramp up from silence over the first `duration_ms`.
pub fn fade_in(buf: &AudioBuffer, duration_ms: f64) -> AudioBuffer {
    let len = buf.frame_at(duration_ms).min(buf.frames());
    apply_fade(buf, 0, len, Fade::In)
}

/// Linear ramp down to silence over the last `duration_ms`.
pub fn fade_out(buf: &AudioBuffer, duration_ms: f64) -> AudioBuffer {
    let len = buf.frame_at(duration_ms).min(buf.frames());
    apply_fade(buf, buf.frames() - len, len, Fade::Out)
}

fn apply_fade(buf: &AudioBuffer, start: usize, len: usize, fade: Fade) -> AudioBuffer {
    let n = buf.channels().count();
    let mut samples = buf.samples().to_vec();
    for j in 0..len {
        let g = match fade {
            Fade::In => fade.gain(j, len),
            // Land exactly on silence at the final frame.
            Fade::Out => fade.gain(j + 1, len),
        };
        for s in &mut samples[(start + j) * n..(start + j + 1) * n] {
            *s = clip_i16(*s as f64 * g);
        }
    }
    buf.with_samples(samples)
}

/// The span `[start_ms, start_ms + duration_ms)`, clamped to the buffer.
pub fn slice(buf: &AudioBuffer, start_ms: u64, duration_ms: u64) -> AudioBuffer {
    let start = buf.frame_at(start_ms as f64);
    let end = buf.frame_at(start_ms.saturating_add(duration_ms) as f64);
    buf.frame_range(start, end)
}

/// Reverse frame order; channels within a frame keep their positions.
pub fn reverse(buf: &AudioBuffer) -> AudioBuffer {
    let mut frames: Vec<&[i16]> = buf.frame_iter().collect();
    frames.reverse();
    buf.with_samples(frames.concat())
}

/// Pan between left (-1.0) and right (+1.0). Mono input becomes stereo.
///
/// The favoured side is boosted by up to 3 dB; the other side is scaled by
/// `2 - 2^|amount|`, reaching silence at full pan.
pub fn pan(buf: &AudioBuffer, amount: f64) -> AudioBuffer {
    let amount = amount.clamp(-1.0, 1.0);
    let stereo = buf.to_stereo();

    let max_boost_db = ratio_to_db(2.0);
    let boost_db = amount.abs() * max_boost_db;
    let reduce = (2.0 - db_to_ratio(boost_db)).max(0.0);
    let boost = db_to_ratio(boost_db / 2.0);
    let (left, right) = if amount < 0.0 {
        (boost, reduce)
    } else {
        (reduce, boost)
    };

    let samples = stereo
        .frame_iter()
        .flat_map(|f| [clip_i16(f[0] as f64 * left), clip_i16(f[1] as f64 * right)])
        .collect();
    stereo.with_samples(samples)
}

/// Scale so the peak sits `headroom` dB below full scale. Silence is
/// returned unchanged.
pub fn normalize(buf: &AudioBuffer, headroom: f64) -> AudioBuffer {
    let peak_db = buf.max_dbfs();
    if !peak_db.is_finite() {
        return buf.clone();
    }
    gain(buf, -peak_db - headroom)
}

/// Attenuate content above `cutoff_hz`.
pub fn low_pass(buf: &AudioBuffer, cutoff_hz: f64) -> AudioBuffer {
    filter_buffer(buf, FilterType::Lowpass, cutoff_hz)
}

/// Attenuate content below `cutoff_hz`.
pub fn high_pass(buf: &AudioBuffer, cutoff_hz: f64) -> AudioBuffer {
    filter_buffer(buf, FilterType::Highpass, cutoff_hz)
}

/// Fold to mono and resample, for low-latency auditioning.
pub fn preview(buf: &AudioBuffer, frame_rate: u32) -> AudioBuffer {
    buf.with_channels(Channels::Mono).with_frame_rate(frame_rate)
}
