//! DSP — pure Rust audio buffers, transforms and drum synthesis.
//!
//! Everything here works on immutable [`buffer::AudioBuffer`] values, so
//! the same code serves the offline renderer and the WASM bindings.

pub mod beat;
pub mod buffer;
pub mod drums;
pub mod effects;
pub mod envelope;
pub mod filter;
pub mod mixer;
pub mod oscillator;
pub mod renderer;
pub mod reverb;
