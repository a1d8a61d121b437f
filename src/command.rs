//! The Synthtax command model.
//!
//! One [`Command`] per source line. The serde representation is the
//! interchange format: an `action` tag followed by the command's fields in
//! declaration order. `Display` writes the canonical source line.

use crate::token::quote;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default drum style for `beat`.
pub const DEFAULT_BEAT_STYLE: &str = "house";
/// Default bar count for `beat`.
pub const DEFAULT_BEAT_BARS: u32 = 4;
/// Sentinel `load` path replaced by the caller-supplied upload.
pub const UPLOADED: &str = "uploaded";

/// One parsed instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum Command {
    #[serde(rename = "set")]
    Set {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bpm: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<String>,
    },
    #[serde(rename = "load")]
    Load { track: String, file: String },
    #[serde(rename = "loop")]
    Loop { track: String, bars: u32 },
    #[serde(rename = "gain")]
    Gain { track: String, db: i32 },
    #[serde(rename = "fadeIn")]
    FadeIn { track: String, seconds: u32 },
    #[serde(rename = "fadeOut")]
    FadeOut { track: String, seconds: u32 },
    #[serde(rename = "slice")]
    Slice {
        track: String,
        #[serde(rename = "start")]
        start_ms: u64,
        #[serde(rename = "duration")]
        duration_ms: u64,
    },
    #[serde(rename = "reverse")]
    Reverse { track: String },
    #[serde(rename = "pan")]
    Pan { track: String, amount: f64 },
    #[serde(rename = "normalize")]
    Normalize {
        track: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        headroom: Option<f64>,
    },
    #[serde(rename = "lowPass")]
    LowPass {
        track: String,
        #[serde(rename = "cutoff")]
        cutoff_hz: u32,
    },
    #[serde(rename = "reverb")]
    Reverb { track: String, amount: f64 },
    #[serde(rename = "beat")]
    Beat {
        track: String,
        #[serde(default = "default_style")]
        style: String,
        #[serde(default = "default_bars")]
        bars: u32,
    },
    #[serde(rename = "export")]
    Export { file: String },
}

fn default_style() -> String {
    DEFAULT_BEAT_STYLE.to_string()
}

fn default_bars() -> u32 {
    DEFAULT_BEAT_BARS
}

/// Every verb of the language. The parser dispatches through [`Verb::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Set,
    Load,
    Loop,
    Gain,
    FadeIn,
    FadeOut,
    Slice,
    Reverse,
    Pan,
    Normalize,
    LowPass,
    Reverb,
    Beat,
    Export,
}

impl Verb {
    pub const ALL: [Verb; 14] = [
        Verb::Set,
        Verb::Load,
        Verb::Loop,
        Verb::Gain,
        Verb::FadeIn,
        Verb::FadeOut,
        Verb::Slice,
        Verb::Reverse,
        Verb::Pan,
        Verb::Normalize,
        Verb::LowPass,
        Verb::Reverb,
        Verb::Beat,
        Verb::Export,
    ];

    /// The source keyword, which is also the interchange `action`.
    pub fn keyword(self) -> &'static str {
        match self {
            Verb::Set => "set",
            Verb::Load => "load",
            Verb::Loop => "loop",
            Verb::Gain => "gain",
            Verb::FadeIn => "fadeIn",
            Verb::FadeOut => "fadeOut",
            Verb::Slice => "slice",
            Verb::Reverse => "reverse",
            Verb::Pan => "pan",
            Verb::Normalize => "normalize",
            Verb::LowPass => "lowPass",
            Verb::Reverb => "reverb",
            Verb::Beat => "beat",
            Verb::Export => "export",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Verb> {
        Verb::ALL.into_iter().find(|v| v.keyword() == word)
    }
}

impl Command {
    pub fn verb(&self) -> Verb {
        match self {
            Command::Set { .. } => Verb::Set,
            Command::Load { .. } => Verb::Load,
            Command::Loop { .. } => Verb::Loop,
            Command::Gain { .. } => Verb::Gain,
            Command::FadeIn { .. } => Verb::FadeIn,
            Command::FadeOut { .. } => Verb::FadeOut,
            Command::Slice { .. } => Verb::Slice,
            Command::Reverse { .. } => Verb::Reverse,
            Command::Pan { .. } => Verb::Pan,
            Command::Normalize { .. } => Verb::Normalize,
            Command::LowPass { .. } => Verb::LowPass,
            Command::Reverb { .. } => Verb::Reverb,
            Command::Beat { .. } => Verb::Beat,
            Command::Export { .. } => Verb::Export,
        }
    }

    /// The track this command binds or transforms, if any.
    pub fn track(&self) -> Option<&str> {
        match self {
            Command::Set { .. } | Command::Export { .. } => None,
            Command::Load { track, .. }
            | Command::Loop { track, .. }
            | Command::Gain { track, .. }
            | Command::FadeIn { track, .. }
            | Command::FadeOut { track, .. }
            | Command::Slice { track, .. }
            | Command::Reverse { track }
            | Command::Pan { track, .. }
            | Command::Normalize { track, .. }
            | Command::LowPass { track, .. }
            | Command::Reverb { track, .. }
            | Command::Beat { track, .. } => Some(track),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Set { bpm, key } => {
                let mut args = Vec::new();
                if let Some(bpm) = bpm {
                    args.push(format!("bpm={bpm}"));
                }
                if let Some(key) = key {
                    args.push(format!("key={}", quote(key)));
                }
                write!(f, "set({})", args.join(", "))
            }
            Command::Load { track, file } => write!(f, "load {track} from {}", quote(file)),
            Command::Loop { track, bars } => write!(f, "loop({track}, bars={bars})"),
            Command::Gain { track, db } => write!(f, "gain({track}, {db})"),
            Command::FadeIn { track, seconds } => write!(f, "fadeIn({track}, seconds={seconds})"),
            Command::FadeOut { track, seconds } => {
                write!(f, "fadeOut({track}, seconds={seconds})")
            }
            Command::Slice {
                track,
                start_ms,
                duration_ms,
            } => write!(f, "slice({track}, start={start_ms}, duration={duration_ms})"),
            Command::Reverse { track } => write!(f, "reverse({track})"),
            Command::Pan { track, amount } => write!(f, "pan({track}, amount={amount})"),
            Command::Normalize { track, headroom } => match headroom {
                Some(h) => write!(f, "normalize({track}, headroom={h})"),
                None => write!(f, "normalize({track})"),
            },
            Command::LowPass { track, cutoff_hz } => write!(f, "lowPass({track}, cutoff={cutoff_hz})"),
            Command::Reverb { track, amount } => write!(f, "reverb({track}, amount={amount})"),
            Command::Beat { track, style, bars } => {
                write!(f, "beat({track}, style={}, bars={bars})", quote(style))
            }
            Command::Export { file } => write!(f, "export({})", quote(file)),
        }
    }
}
