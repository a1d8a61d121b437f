//! Immutable PCM buffer shared by every operation.

use std::sync::Arc;

/// Full-scale amplitude of a signed 16-bit sample.
pub const FULL_SCALE: f64 = 32768.0;

/// Channel layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Channels {
    Mono = 1,
    Stereo = 2,
}

impl Channels {
    pub fn count(self) -> usize {
        self as usize
    }

    pub fn from_count(count: u16) -> Option<Channels> {
        match count {
            1 => Some(Channels::Mono),
            2 => Some(Channels::Stereo),
            _ => None,
        }
    }
}

/// Interleaved 16-bit PCM audio.
///
/// The sample storage is shared and never written after construction, so
/// clones are cheap and every transform produces a fresh buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    frame_rate: u32,
    channels: Channels,
    samples: Arc<[i16]>,
}

impl AudioBuffer {
    /// Build from interleaved samples. A trailing partial frame is dropped.
    pub fn new(frame_rate: u32, channels: Channels, mut samples: Vec<i16>) -> Self {
        let whole = samples.len() - samples.len() % channels.count();
        samples.truncate(whole);
        AudioBuffer {
            frame_rate,
            channels,
            samples: samples.into(),
        }
    }

    pub fn silent(duration_ms: u64, frame_rate: u32, channels: Channels) -> Self {
        let frames = ms_to_frames(duration_ms as f64, frame_rate);
        AudioBuffer::new(frame_rate, channels, vec![0; frames * channels.count()])
    }

    /// Build from interleaved samples in [-1, 1]; out-of-range values are clipped.
    pub fn from_f64(frame_rate: u32, channels: Channels, samples: &[f64]) -> Self {
        let pcm = samples.iter().map(|&s| float_to_i16(s)).collect();
        AudioBuffer::new(frame_rate, channels, pcm)
    }

    pub fn frame_rate(&self) -> u32 {
        self.frame_rate
    }

    pub fn channels(&self) -> Channels {
        self.channels
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.count()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_ms(&self) -> f64 {
        self.frames() as f64 * 1000.0 / self.frame_rate as f64
    }

    /// Frame index for a millisecond position at this buffer's rate.
    pub fn frame_at(&self, ms: f64) -> usize {
        ms_to_frames(ms, self.frame_rate)
    }

    /// Iterate over frames as slices of `channels` samples.
    pub fn frame_iter(&self) -> impl Iterator<Item = &[i16]> {
        self.samples.chunks_exact(self.channels.count())
    }

    /// Copy of one channel's samples.
    pub fn channel(&self, index: usize) -> Vec<i16> {
        self.frame_iter().map(|f| f[index.min(f.len() - 1)]).collect()
    }

    /// A new buffer with the same format and different samples.
    pub fn with_samples(&self, samples: Vec<i16>) -> Self {
        AudioBuffer::new(self.frame_rate, self.channels, samples)
    }

    /// Frames `[start, end)`, clamped to the buffer.
    pub fn frame_range(&self, start: usize, end: usize) -> Self {
        let n = self.channels.count();
        let end = end.min(self.frames());
        let start = start.min(end);
        self.with_samples(self.samples[start * n..end * n].to_vec())
    }

    /// Average all channels into one.
    pub fn to_mono(&self) -> Self {
        if self.channels == Channels::Mono {
            return self.clone();
        }
        let mono = self
            .frame_iter()
            .map(|f| {
                let sum: i32 = f.iter().map(|&s| s as i32).sum();
                (sum / f.len() as i32) as i16
            })
            .collect();
        AudioBuffer::new(self.frame_rate, Channels::Mono, mono)
    }

    /// Duplicate a mono signal into both channels.
    pub fn to_stereo(&self) -> Self {
        if self.channels == Channels::Stereo {
            return self.clone();
        }
        let stereo = self.samples.iter().flat_map(|&s| [s, s]).collect();
        AudioBuffer::new(self.frame_rate, Channels::Stereo, stereo)
    }

    pub fn with_channels(&self, channels: Channels) -> Self {
        match channels {
            Channels::Mono => self.to_mono(),
            Channels::Stereo => self.to_stereo(),
        }
    }

    /// Resample to `frame_rate` with linear interpolation.
    pub fn with_frame_rate(&self, frame_rate: u32) -> Self {
        if frame_rate == self.frame_rate || self.is_empty() {
            return AudioBuffer {
                frame_rate,
                ..self.clone()
            };
        }
        let n = self.channels.count();
        let frames = self.frames();
        let ratio = frame_rate as f64 / self.frame_rate as f64;
        let out_frames = (frames as f64 * ratio).round() as usize;
        let mut out = Vec::with_capacity(out_frames * n);

        for i in 0..out_frames {
            let src_pos = i as f64 / ratio;
            let idx = src_pos.floor() as usize;
            let frac = src_pos - idx as f64;
            for ch in 0..n {
                let a = self.samples[idx.min(frames - 1) * n + ch] as f64;
                let b = self.samples[(idx + 1).min(frames - 1) * n + ch] as f64;
                out.push((a + (b - a) * frac).round() as i16);
            }
        }
        AudioBuffer::new(frame_rate, self.channels, out)
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> u16 {
        self.samples.iter().map(|s| s.unsigned_abs()).max().unwrap_or(0)
    }

    /// Peak level relative to full scale, in dB. `-inf` for silence.
    pub fn max_dbfs(&self) -> f64 {
        ratio_to_db(self.peak() as f64 / FULL_SCALE)
    }

    /// RMS level relative to full scale, in dB. `-inf` for silence.
    pub fn dbfs(&self) -> f64 {
        if self.is_empty() {
            return f64::NEG_INFINITY;
        }
        let sum_sq: f64 = self.samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
        let rms = (sum_sq / self.samples.len() as f64).sqrt();
        ratio_to_db(rms / FULL_SCALE)
    }

    /// Samples as floats in [-1, 1).
    pub fn to_f64(&self) -> Vec<f64> {
        self.samples.iter().map(|&s| s as f64 / FULL_SCALE).collect()
    }
}

pub fn ms_to_frames(ms: f64, frame_rate: u32) -> usize {
    (ms * frame_rate as f64 / 1000.0).round().max(0.0) as usize
}

pub fn db_to_ratio(db: f64) -> f64 {
    10f64.powf(db / 20.0)
}

pub fn ratio_to_db(ratio: f64) -> f64 {
    if ratio <= 0.0 {
        f64::NEG_INFINITY
    } else {
        20.0 * ratio.log10()
    }
}

/// Clip a float sample in full-scale units to the i16 range.
pub fn clip_i16(value: f64) -> i16 {
    value.round().clamp(i16::MIN as f64, i16::MAX as f64) as i16
}

/// Convert a [-1, 1] float sample to i16, clipping.
pub fn float_to_i16(value: f64) -> i16 {
    clip_i16(value * FULL_SCALE)
}
