//! Synthesized drum voices.

use super::buffer::{AudioBuffer, Channels};
use super::effects::{fade_out, high_pass};
use super::envelope::DecayEnvelope;
use super::mixer::Mixer;
use super::oscillator::{exponential_sweep, Noise, Oscillator};

/// A drum voice that a pattern row can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instrument {
    Kick,
    Snare,
    Hat,
}

/// One rendered hit of each instrument, at a fixed frame rate.
#[derive(Debug, Clone)]
pub struct DrumKit {
    kick: AudioBuffer,
    snare: AudioBuffer,
    hat: AudioBuffer,
}

impl DrumKit {
    pub fn new(frame_rate: u32) -> Self {
        DrumKit {
            kick: kick(frame_rate),
            snare: snare(frame_rate),
            hat: hat(frame_rate),
        }
    }

    pub fn voice(&self, instrument: Instrument) -> &AudioBuffer {
        match instrument {
            Instrument::Kick => &self.kick,
            Instrument::Snare => &self.snare,
            Instrument::Hat => &self.hat,
        }
    }
}

fn frames_for(ms: f64, frame_rate: u32) -> usize {
    (frame_rate as f64 * ms / 1000.0) as usize
}

/// 240 ms sine sweeping 120 → 50 Hz under an `exp(-6t)` envelope.
pub fn kick(frame_rate: u32) -> AudioBuffer {
    let sr = frame_rate as f64;
    let n = frames_for(240.0, frame_rate);
    let last = n.saturating_sub(1).max(1) as f64;
    let mut osc = Oscillator::new(120.0, sr);
    let mut env = DecayEnvelope::new(6.0, sr);

    let wave: Vec<f64> = (0..n)
        .map(|i| {
            osc.frequency = exponential_sweep(120.0, 50.0, i as f64 / last);
            osc.next_sample() * env.next_sample()
        })
        .collect();
    fade_out(&AudioBuffer::from_f64(frame_rate, Channels::Mono, &wave), 80.0)
}

/// 180 ms: a decaying 180 Hz body under high-passed noise.
pub fn snare(frame_rate: u32) -> AudioBuffer {
    let sr = frame_rate as f64;
    let n = frames_for(180.0, frame_rate);

    let mut noise = Noise::new(42);
    let mut noise_env = DecayEnvelope::spanning(10.0, n);
    let rattle: Vec<f64> = (0..n)
        .map(|_| noise.next_sample() * noise_env.next_sample() * 0.8)
        .collect();
    let rattle = high_pass(&AudioBuffer::from_f64(frame_rate, Channels::Mono, &rattle), 2000.0);

    let mut osc = Oscillator::new(180.0, sr);
    let mut body_env = DecayEnvelope::spanning(20.0, n);
    let body: Vec<f64> = (0..n)
        .map(|_| osc.next_sample() * body_env.next_sample() * 0.5)
        .collect();

    let mut mixer = Mixer::new(frame_rate, Channels::Mono, n);
    mixer.overlay(&rattle, 0);
    mixer.overlay(&AudioBuffer::from_f64(frame_rate, Channels::Mono, &body), 0);
    fade_out(&mixer.output(), 60.0)
}

/// 120 ms of noise high-passed at 6 kHz with a very fast decay.
pub fn hat(frame_rate: u32) -> AudioBuffer {
    let n = frames_for(120.0, frame_rate);
    let mut noise = Noise::new(99);
    let mut env = DecayEnvelope::spanning(12.0, n);
    let wave: Vec<f64> = (0..n).map(|_| noise.next_sample() * env.next_sample()).collect();
    let filtered = high_pass(&AudioBuffer::from_f64(frame_rate, Channels::Mono, &wave), 6000.0);
    fade_out(&filtered, 40.0)
}
