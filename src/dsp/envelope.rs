//! Amplitude envelopes: exponential decay for drum voices and linear
//! fade ramps for the fade operations.

/// Exponential decay from 1.0 toward silence.
#[derive(Debug, Clone)]
pub struct DecayEnvelope {
    level: f64,
    factor: f64,
}

impl DecayEnvelope {
    /// Decay as `exp(-rate * t)`, `t` in seconds.
    pub fn new(rate: f64, sample_rate: f64) -> Self {
        DecayEnvelope {
            level: 1.0,
            factor: (-rate / sample_rate).exp(),
        }
    }

    /// Decay as `exp(-k * x)` where `x` runs 0 → 1 across `samples` samples.
    pub fn spanning(k: f64, samples: usize) -> Self {
        let steps = samples.saturating_sub(1).max(1) as f64;
        DecayEnvelope {
            level: 1.0,
            factor: (-k / steps).exp(),
        }
    }

    /// Generate the next envelope sample.
    pub fn next_sample(&mut self) -> f64 {
        let level = self.level;
        self.level *= self.factor;
        level
    }
}

/// Direction of a linear fade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fade {
    In,
    Out,
}

impl Fade {
    /// Gain for frame `index` of a fade spanning `len` frames.
    pub fn gain(self, index: usize, len: usize) -> f64 {
        if len == 0 {
            return 1.0;
        }
        let t = (index as f64 / len as f64).clamp(0.0, 1.0);
        match self {
            Fade::In => t,
            Fade::Out => 1.0 - t,
        }
    }
}
