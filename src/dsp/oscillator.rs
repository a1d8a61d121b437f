//! Signal sources for drum synthesis: a sine oscillator with per-sample
//! frequency control, and seeded white noise.

use std::f64::consts::PI;

/// A phase-accumulating sine oscillator.
///
/// Frequency may change every sample without phase discontinuities, which
/// is what pitch sweeps need.
#[derive(Debug, Clone)]
pub struct Oscillator {
    pub frequency: f64,
    phase: f64,
    sample_rate: f64,
}

impl Oscillator {
    pub fn new(frequency: f64, sample_rate: f64) -> Self {
        Oscillator {
            frequency,
            phase: 0.0,
            sample_rate,
        }
    }

    /// Generate the next sample.
    pub fn next_sample(&mut self) -> f64 {
        let sample = (2.0 * PI * self.phase).sin();
        self.phase += self.frequency / self.sample_rate;
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }
        sample
    }
}

/// Exponential glide from `start` to `end` Hz, `progress` in [0, 1].
pub fn exponential_sweep(start: f64, end: f64, progress: f64) -> f64 {
    start * (end / start).powf(progress.clamp(0.0, 1.0))
}

/// Uniform white noise in [-1, 1) from a fixed seed, so rendered drums are
/// identical across runs.
#[derive(Debug, Clone)]
pub struct Noise {
    rng: oorandom::Rand32,
}

impl Noise {
    pub fn new(seed: u64) -> Self {
        Noise {
            rng: oorandom::Rand32::new(seed),
        }
    }

    pub fn next_sample(&mut self) -> f64 {
        self.rng.rand_float() as f64 * 2.0 - 1.0
    }
}
