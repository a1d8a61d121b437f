//! Mixer — sums buffers at frame offsets into one output buffer.

use super::buffer::{clip_i16, AudioBuffer, Channels};

/// A summing mixer with a fixed output format.
///
/// Sums are accumulated at full precision and clipped once on output, so
/// the result does not depend on the order sources were added.
#[derive(Debug, Clone)]
pub struct Mixer {
    frame_rate: u32,
    channels: Channels,
    buffer: Vec<f64>,
}

impl Mixer {
    /// Prepare a silent mix of `frames` frames.
    pub fn new(frame_rate: u32, channels: Channels, frames: usize) -> Self {
        Mixer {
            frame_rate,
            channels,
            buffer: vec![0.0; frames * channels.count()],
        }
    }

    /// Output length in frames.
    pub fn frames(&self) -> usize {
        self.buffer.len() / self.channels.count()
    }

    /// Add `source` starting at frame `offset`. Source audio past the end
    /// of the mix is dropped; format differences are converted first.
    pub fn overlay(&mut self, source: &AudioBuffer, offset: usize) {
        let converted;
        let source = if source.frame_rate() != self.frame_rate || source.channels() != self.channels
        {
            converted = source
                .with_frame_rate(self.frame_rate)
                .with_channels(self.channels);
            &converted
        } else {
            source
        };

        let n = self.channels.count();
        let start = offset * n;
        if start >= self.buffer.len() {
            return;
        }
        for (dst, &s) in self.buffer[start..].iter_mut().zip(source.samples()) {
            *dst += s as f64;
        }
    }

    /// The mixed buffer, hard-clipped to the 16-bit range.
    pub fn output(&self) -> AudioBuffer {
        let samples = self.buffer.iter().map(|&s| clip_i16(s)).collect();
        AudioBuffer::new(self.frame_rate, self.channels, samples)
    }
}
