//! Biquad low/high-pass filters applied to whole buffers.

use std::f64::consts::PI;

use super::buffer::{clip_i16, AudioBuffer};

/// Filter type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterType {
    Lowpass,
    Highpass,
}

/// A 2nd-order Butterworth IIR filter.
///
/// Direct Form II Transposed; coefficients from the Audio EQ Cookbook
/// (Robert Bristow-Johnson).
#[derive(Debug, Clone)]
pub struct BiquadFilter {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,

    z1: f64,
    z2: f64,
}

impl BiquadFilter {
    /// `cutoff` is clamped to (0, Nyquist) so the filter stays stable.
    pub fn new(filter_type: FilterType, cutoff: f64, sample_rate: f64) -> Self {
        let q = std::f64::consts::FRAC_1_SQRT_2;
        let cutoff = cutoff.clamp(1.0, (sample_rate * 0.49).max(1.0));
        let w0 = 2.0 * PI * cutoff / sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q);

        let (b0, b1, b2) = match filter_type {
            FilterType::Lowpass => {
                let b1 = 1.0 - cos_w0;
                (b1 / 2.0, b1, b1 / 2.0)
            }
            FilterType::Highpass => {
                let b0 = (1.0 + cos_w0) / 2.0;
                (b0, -(1.0 + cos_w0), b0)
            }
        };
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_w0;
        let a2 = 1.0 - alpha;

        BiquadFilter {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
            z1: 0.0,
            z2: 0.0,
        }
    }

    /// Process a single sample through the filter.
    pub fn process(&mut self, input: f64) -> f64 {
        let output = self.b0 * input + self.z1;
        self.z1 = self.b1 * input - self.a1 * output + self.z2;
        self.z2 = self.b2 * input - self.a2 * output;
        output
    }
}

/// Filter every channel of `buf` independently.
/// Rates too low to place any cutoff below Nyquist pass through unchanged.
pub fn filter_buffer(buf: &AudioBuffer, filter_type: FilterType, cutoff: f64) -> AudioBuffer {
    if (buf.frame_rate() as f64) * 0.49 < 1.0 {
        return buf.clone();
    }
    let n = buf.channels().count();
    let mut filters =
        vec![BiquadFilter::new(filter_type, cutoff, buf.frame_rate() as f64); n];
    let samples = buf
        .samples()
        .iter()
        .enumerate()
        .map(|(i, &s)| clip_i16(filters[i % n].process(s as f64)))
        .collect();
    buf.with_samples(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowpass_passes_dc() {
        let mut f = BiquadFilter::new(FilterType::Lowpass, 5000.0, 44100.0);
        let mut output = 0.0;
        for _ in 0..1000 {
            output = f.process(1.0);
        }
        assert!(
            (output - 1.0).abs() < 0.001,
            "Lowpass should pass DC, got {output}"
        );
    }

    #[test]
    fn highpass_blocks_dc() {
        let mut f = BiquadFilter::new(FilterType::Highpass, 1000.0, 44100.0);
        let mut output = 0.0;
        for _ in 0..1000 {
            output = f.process(1.0);
        }
        assert!(output.abs() < 0.001, "Highpass should block DC, got {output}");
    }

    #[test]
    fn lowpass_attenuates_high_freq() {
        let mut f = BiquadFilter::new(FilterType::Lowpass, 200.0, 44100.0);
        let freq = 10000.0;
        let mut max_out = 0.0_f64;
        for i in 0..4410 {
            let t = i as f64 / 44100.0;
            let out = f.process((2.0 * PI * freq * t).sin());
            if i > 1000 {
                max_out = max_out.max(out.abs());
            }
        }
        assert!(
            max_out < 0.01,
            "Lowpass@200Hz should strongly attenuate 10kHz, got amplitude {max_out}"
        );
    }

    #[test]
    fn extreme_cutoffs_stay_finite() {
        for cutoff in [0.0, 1e9] {
            for kind in [FilterType::Lowpass, FilterType::Highpass] {
                let mut f = BiquadFilter::new(kind, cutoff, 8000.0);
                for i in 0..10000 {
                    let input = if i % 100 == 0 { 1.0 } else { 0.0 };
                    let out = f.process(input);
                    assert!(out.is_finite(), "Filter output not finite at sample {i}");
                }
            }
        }
    }

    #[test]
    fn buffer_channels_filtered_independently() {
        use crate::dsp::buffer::Channels;
        // Left is DC, right is silent: the right channel must stay silent.
        let samples: Vec<i16> = (0..2000).map(|i| if i % 2 == 0 { 10000 } else { 0 }).collect();
        let buf = AudioBuffer::new(8000, Channels::Stereo, samples);
        let out = filter_buffer(&buf, FilterType::Lowpass, 500.0);
        assert!(out.channel(1).iter().all(|&s| s == 0));
        assert!((out.channel(0)[999] - 10000).abs() <= 1);
    }

    #[test]
    fn tiny_frame_rates_do_not_panic() {
        use crate::dsp::buffer::Channels;
        for rate in [0, 1, 2, 3] {
            let buf = AudioBuffer::new(rate, Channels::Mono, vec![1000, -1000, 500, 0]);
            let out = filter_buffer(&buf, FilterType::Lowpass, 1000.0);
            assert_eq!(out.frames(), 4, "rate {rate} changed the length");
        }
        let mut f = BiquadFilter::new(FilterType::Highpass, 1000.0, 2.0);
        assert!(f.process(1.0).is_finite());
    }
}
