//! Step-sequenced drum beats.

use crate::error::RenderError;

use super::buffer::{ms_to_frames, AudioBuffer, Channels};
use super::drums::{DrumKit, Instrument};
use super::effects::{bar_ms, normalize};
use super::mixer::Mixer;

/// Steps in one bar of every pattern grid.
pub const STEPS_PER_BAR: usize = 16;
/// Frame rate beats are synthesized at.
pub const BEAT_FRAME_RATE: u32 = 44100;
/// Peak headroom of a finished beat, in dB.
pub const BEAT_HEADROOM: f64 = 1.5;
/// Silence appended past the last bar so rounding never cuts a hit short.
const TAIL_MARGIN_MS: f64 = 5.0;

/// Instrument → step flags for one drum style.
#[derive(Debug, Clone, Copy)]
pub struct PatternGrid {
    pub style: &'static str,
    pub rows: [(Instrument, [u8; STEPS_PER_BAR]); 3],
}

pub static STYLES: [PatternGrid; 3] = [
    PatternGrid {
        style: "house",
        rows: [
            (Instrument::Kick, [1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0]),
            (Instrument::Snare, [0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0]),
            (Instrument::Hat, [0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1]),
        ],
    },
    PatternGrid {
        style: "hiphop",
        rows: [
            (Instrument::Kick, [1, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 1, 0, 0, 1, 0]),
            (Instrument::Snare, [0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0]),
            (Instrument::Hat, [0, 1, 0, 0, 1, 0, 0, 1, 0, 1, 0, 0, 1, 0, 0, 1]),
        ],
    },
    PatternGrid {
        style: "breakbeat",
        rows: [
            (Instrument::Kick, [1, 0, 0, 1, 0, 0, 1, 0, 1, 0, 0, 1, 0, 1, 0, 0]),
            (Instrument::Snare, [0, 0, 1, 0, 0, 1, 0, 0, 0, 0, 1, 0, 0, 1, 0, 0]),
            (Instrument::Hat, [0, 1, 1, 1, 0, 1, 1, 1, 0, 1, 1, 1, 0, 1, 1, 1]),
        ],
    },
];

/// Look up a style by name.
pub fn pattern(style: &str) -> Option<&'static PatternGrid> {
    STYLES.iter().find(|p| p.style == style)
}

/// [`generate_beat_at`] with the default frame rate and headroom.
pub fn generate_beat(style: &str, bars: u32, bpm: u32) -> Result<AudioBuffer, RenderError> {
    generate_beat_at(style, bars, bpm, BEAT_FRAME_RATE, BEAT_HEADROOM)
}

/// Render `bars` repetitions of `style`'s grid at `bpm`, normalized to
/// `headroom` dB below full scale. Unknown styles play `house`.
pub fn generate_beat_at(
    style: &str,
    bars: u32,
    bpm: u32,
    frame_rate: u32,
    headroom: f64,
) -> Result<AudioBuffer, RenderError> {
    if bars == 0 {
        return Err(RenderError::InvalidParameter {
            name: "bars",
            value: bars.to_string(),
            reason: "beat generation needs at least one bar",
        });
    }
    let bar = bar_ms(bpm)?;
    let grid = pattern(style).unwrap_or_else(|| {
        log::warn!("unknown beat style '{style}', using house");
        &STYLES[0]
    });

    let kit = DrumKit::new(frame_rate);
    let step_ms = bar / STEPS_PER_BAR as f64;
    let total_ms = (bar * bars as f64).floor() + TAIL_MARGIN_MS;
    let mut mixer = Mixer::new(
        frame_rate,
        Channels::Mono,
        ms_to_frames(total_ms, frame_rate),
    );

    for (instrument, steps) in &grid.rows {
        let voice = kit.voice(*instrument);
        for bar_index in 0..bars as usize {
            for (step_index, _) in steps.iter().enumerate().filter(|(_, on)| **on != 0) {
                let position_ms = (bar_index * STEPS_PER_BAR + step_index) as f64 * step_ms;
                mixer.overlay(voice, voice.frame_at(position_ms));
            }
        }
    }

    Ok(normalize(&mixer.output(), headroom))
}
