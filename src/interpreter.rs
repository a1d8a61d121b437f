//! Interpreter — folds a command list over a track table and mixes the result.
//!
//! A run owns its [`ExecutionContext`] and [`TrackTable`]; nothing is shared
//! between runs, so independent renders may proceed on separate threads.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::command::{Command, Verb, UPLOADED};
use crate::dsp::beat::{generate_beat_at, BEAT_FRAME_RATE, BEAT_HEADROOM};
use crate::dsp::buffer::{AudioBuffer, Channels};
use crate::dsp::effects;
use crate::dsp::mixer::Mixer;
use crate::dsp::renderer::{read_audio, write_wav};
use crate::dsp::reverb::reverb;
use crate::error::RenderError;

// ── Context ─────────────────────────────────────────────────

/// Tempo and key, changed only by `set`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionContext {
    pub bpm: u32,
    pub key: String,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        ExecutionContext {
            bpm: 120,
            key: "C".to_string(),
        }
    }
}

/// Track name → buffer, kept in first-binding order.
#[derive(Debug, Clone, Default)]
pub struct TrackTable {
    tracks: Vec<(String, AudioBuffer)>,
}

impl TrackTable {
    pub fn get(&self, name: &str) -> Option<&AudioBuffer> {
        self.tracks.iter().find(|(n, _)| n == name).map(|(_, b)| b)
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut AudioBuffer> {
        self.tracks.iter_mut().find(|(n, _)| n == name).map(|(_, b)| b)
    }

    /// Bind `buffer` to `name`, replacing any earlier binding in place.
    pub fn bind(&mut self, name: &str, buffer: AudioBuffer) {
        match self.get_mut(name) {
            Some(slot) => *slot = buffer,
            None => self.tracks.push((name.to_string(), buffer)),
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AudioBuffer)> {
        self.tracks.iter().map(|(n, b)| (n.as_str(), b))
    }
}

// ── Configuration ───────────────────────────────────────────

/// What an effect does when its track has not been bound yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnboundTrack {
    /// Skip the command and log a warning.
    #[default]
    Ignore,
    /// Fail with [`RenderError::MissingTrack`].
    Error,
}

/// Render settings. Every field has a default, so a host may supply any subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Rate drum beats are synthesized at.
    pub frame_rate: u32,
    /// Rate of the mono preview mix.
    pub preview_frame_rate: u32,
    /// Length of the silent mix produced when no track is bound.
    pub silence_ms: u64,
    /// Peak headroom of generated beats, in dB.
    pub beat_headroom: f64,
    /// Headroom for `normalize` without an explicit value.
    pub default_headroom: f64,
    pub unbound_track: UnboundTrack,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            frame_rate: BEAT_FRAME_RATE,
            preview_frame_rate: 22050,
            silence_ms: 1000,
            beat_headroom: BEAT_HEADROOM,
            default_headroom: 0.1,
            unbound_track: UnboundTrack::Ignore,
        }
    }
}

// ── Output ──────────────────────────────────────────────────

/// State left behind by a completed fold.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub context: ExecutionContext,
    pub tracks: TrackTable,
    /// Path requested by the last `export`.
    pub export: Option<PathBuf>,
}

/// The mixed output of a run, before preview or export handling.
#[derive(Debug, Clone)]
pub struct Mixdown {
    pub buffer: AudioBuffer,
    pub export: Option<PathBuf>,
}

/// What [`apply_commands`] hands back to a front end.
#[derive(Debug, Clone)]
pub enum Rendered {
    Buffer(AudioBuffer),
    Exported(PathBuf),
}

// ── Renderer ────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Renderer { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Execute `commands` in order against a fresh session.
    pub fn run(&self, commands: &[Command], uploaded: Option<&Path>) -> Result<Session, RenderError> {
        let mut session = Session::default();
        for command in commands {
            log::debug!("{command}");
            self.execute(command, &mut session, uploaded)?;
        }
        Ok(session)
    }

    /// Run `commands` and mix every bound track. Never writes files.
    pub fn render(&self, commands: &[Command], uploaded: Option<&Path>) -> Result<Mixdown, RenderError> {
        let session = self.run(commands, uploaded)?;
        Ok(Mixdown {
            buffer: self.mix(&session.tracks),
            export: session.export,
        })
    }

    /// Render, then either return a preview, write the requested export,
    /// or return the full mix.
    pub fn apply(
        &self,
        commands: &[Command],
        uploaded: Option<&Path>,
        preview: bool,
    ) -> Result<Rendered, RenderError> {
        let Mixdown { buffer, export } = self.render(commands, uploaded)?;
        if preview {
            return Ok(Rendered::Buffer(effects::preview(
                &buffer,
                self.config.preview_frame_rate,
            )));
        }
        match export {
            Some(path) => {
                log::info!(
                    "exporting {:.0} ms of audio to {}",
                    buffer.duration_ms(),
                    path.display()
                );
                write_wav(&buffer, &path)?;
                Ok(Rendered::Exported(path))
            }
            None => Ok(Rendered::Buffer(buffer)),
        }
    }

    fn execute(
        &self,
        command: &Command,
        session: &mut Session,
        uploaded: Option<&Path>,
    ) -> Result<(), RenderError> {
        let ctx = &mut session.context;
        let tracks = &mut session.tracks;
        match command {
            Command::Set { bpm, key } => {
                if let Some(bpm) = bpm {
                    ctx.bpm = *bpm;
                }
                if let Some(key) = key {
                    ctx.key = key.clone();
                }
            }
            Command::Load { track, file } => {
                let path = match uploaded {
                    Some(upload) if file == UPLOADED => upload.to_path_buf(),
                    _ => PathBuf::from(file),
                };
                tracks.bind(track, read_audio(&path)?);
            }
            Command::Loop { track, bars } => {
                let bpm = ctx.bpm;
                self.update(tracks, Verb::Loop, track, |b| effects::loop_bars(b, *bars, bpm))?;
            }
            Command::Gain { track, db } => {
                self.update(tracks, Verb::Gain, track, |b| Ok(effects::gain(b, *db as f64)))?;
            }
            Command::FadeIn { track, seconds } => {
                let ms = *seconds as f64 * 1000.0;
                self.update(tracks, Verb::FadeIn, track, |b| Ok(effects::fade_in(b, ms)))?;
            }
            Command::FadeOut { track, seconds } => {
                let ms = *seconds as f64 * 1000.0;
                self.update(tracks, Verb::FadeOut, track, |b| Ok(effects::fade_out(b, ms)))?;
            }
            Command::Slice {
                track,
                start_ms,
                duration_ms,
            } => {
                self.update(tracks, Verb::Slice, track, |b| {
                    Ok(effects::slice(b, *start_ms, *duration_ms))
                })?;
            }
            Command::Reverse { track } => {
                self.update(tracks, Verb::Reverse, track, |b| Ok(effects::reverse(b)))?;
            }
            Command::Pan { track, amount } => {
                self.update(tracks, Verb::Pan, track, |b| Ok(effects::pan(b, *amount)))?;
            }
            Command::Normalize { track, headroom } => {
                let headroom = headroom.unwrap_or(self.config.default_headroom);
                self.update(tracks, Verb::Normalize, track, |b| {
                    Ok(effects::normalize(b, headroom))
                })?;
            }
            Command::LowPass { track, cutoff_hz } => {
                self.update(tracks, Verb::LowPass, track, |b| {
                    Ok(effects::low_pass(b, *cutoff_hz as f64))
                })?;
            }
            Command::Reverb { track, amount } => {
                self.update(tracks, Verb::Reverb, track, |b| Ok(reverb(b, *amount)))?;
            }
            Command::Beat { track, style, bars } => {
                let beat = generate_beat_at(
                    style,
                    *bars,
                    ctx.bpm,
                    self.config.frame_rate,
                    self.config.beat_headroom,
                )?;
                tracks.bind(track, beat);
            }
            Command::Export { file } => session.export = Some(PathBuf::from(file)),
        }
        Ok(())
    }

    /// Replace `track`'s buffer with `op` applied to it.
    fn update(
        &self,
        tracks: &mut TrackTable,
        verb: Verb,
        track: &str,
        op: impl FnOnce(&AudioBuffer) -> Result<AudioBuffer, RenderError>,
    ) -> Result<(), RenderError> {
        match tracks.get_mut(track) {
            Some(slot) => {
                let updated = op(slot)?;
                *slot = updated;
            }
            None => match self.config.unbound_track {
                UnboundTrack::Ignore => {
                    log::warn!("{} on unbound track '{track}' ignored", verb.keyword());
                }
                UnboundTrack::Error => {
                    return Err(RenderError::MissingTrack {
                        verb: verb.keyword(),
                        track: track.to_string(),
                    });
                }
            },
        }
        Ok(())
    }

    /// Sum every track from frame 0. The mix takes the highest frame rate
    /// and widest layout present and lasts as long as the first-bound track;
    /// later tracks are cut at that length.
    pub fn mix(&self, tracks: &TrackTable) -> AudioBuffer {
        let Some(frame_rate) = tracks.iter().map(|(_, b)| b.frame_rate()).max() else {
            return AudioBuffer::silent(self.config.silence_ms, self.config.frame_rate, Channels::Mono);
        };
        let channels = if tracks.iter().any(|(_, b)| b.channels() == Channels::Stereo) {
            Channels::Stereo
        } else {
            Channels::Mono
        };
        let frames = tracks
            .iter()
            .next()
            .map(|(_, b)| {
                (b.frames() as f64 * frame_rate as f64 / b.frame_rate() as f64).round() as usize
            })
            .unwrap_or(0);

        let mut mixer = Mixer::new(frame_rate, channels, frames);
        for (name, buffer) in tracks.iter() {
            log::debug!("mixing '{name}' ({:.0} ms)", buffer.duration_ms());
            mixer.overlay(buffer, 0);
        }
        mixer.output()
    }
}

/// Execute `commands` with the default [`RenderConfig`].
pub fn apply_commands(
    commands: &[Command],
    uploaded: Option<&Path>,
    preview: bool,
) -> Result<Rendered, RenderError> {
    Renderer::default().apply(commands, uploaded, preview)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::oscillator::Oscillator;
    use crate::parser::parse;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("synthtax-interp-{}-{name}", std::process::id()))
    }

    fn tone(ms: u64, frame_rate: u32, channels: Channels) -> AudioBuffer {
        let mut osc = Oscillator::new(440.0, frame_rate as f64);
        let frames = (ms * frame_rate as u64 / 1000) as usize;
        let wave: Vec<f64> = (0..frames).map(|_| osc.next_sample() * 0.5).collect();
        AudioBuffer::from_f64(frame_rate, Channels::Mono, &wave).with_channels(channels)
    }

    fn write_tone(name: &str, ms: u64, frame_rate: u32, channels: Channels) -> PathBuf {
        let path = temp_path(name);
        write_wav(&tone(ms, frame_rate, channels), &path).unwrap();
        path
    }

    fn buffer(rendered: Rendered) -> AudioBuffer {
        match rendered {
            Rendered::Buffer(b) => b,
            Rendered::Exported(p) => panic!("unexpected export to {}", p.display()),
        }
    }

    #[test]
    fn empty_program_is_one_second_of_silence() {
        init_logger();
        let out = buffer(apply_commands(&[], None, false).unwrap());
        assert_eq!(out.frame_rate(), 44100);
        assert_eq!(out.channels(), Channels::Mono);
        assert_eq!(out.frames(), 44100);
        assert_eq!(out.peak(), 0);
    }

    #[test]
    fn load_uploaded_uses_supplied_path() {
        init_logger();
        let path = write_tone("upload.wav", 100, 8000, Channels::Mono);
        let commands = parse("load vocals from \"uploaded\"").unwrap();
        let out = buffer(apply_commands(&commands, Some(&path), false).unwrap());
        assert_eq!(out, tone(100, 8000, Channels::Mono));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn missing_file_is_reported() {
        init_logger();
        let path = temp_path("missing.wav");
        let commands = parse(&format!("load a from \"{}\"", path.display())).unwrap();
        let err = apply_commands(&commands, None, false).unwrap_err();
        assert!(matches!(err, RenderError::FileNotFound { path: p } if p == path));
    }

    #[test]
    fn unbound_track_is_ignored_by_default() {
        init_logger();
        let commands = parse("gain(ghost, 3)\nreverse(ghost)").unwrap();
        let out = buffer(apply_commands(&commands, None, false).unwrap());
        assert_eq!(out.peak(), 0, "unbound effects must not create tracks");
    }

    #[test]
    fn unbound_track_can_be_an_error() {
        let renderer = Renderer::new(RenderConfig {
            unbound_track: UnboundTrack::Error,
            ..RenderConfig::default()
        });
        let commands = parse("pan(ghost, amount=0.5)").unwrap();
        let err = renderer.render(&commands, None).unwrap_err();
        assert!(matches!(
            err,
            RenderError::MissingTrack { verb: "pan", ref track } if track == "ghost"
        ));
    }

    #[test]
    fn set_updates_only_supplied_fields() {
        let renderer = Renderer::default();
        let commands = parse("set(key=\"D minor\")\nset(bpm=90)").unwrap();
        let session = renderer.run(&commands, None).unwrap();
        assert_eq!(
            session.context,
            ExecutionContext {
                bpm: 90,
                key: "D minor".to_string()
            }
        );
    }

    #[test]
    fn tempo_drives_loop_length() {
        init_logger();
        let path = write_tone("loop.wav", 100, 8000, Channels::Mono);
        let source = format!("load a from \"{}\"\nset(bpm=60)\nloop(a, bars=1)", path.display());
        let out = buffer(apply_commands(&parse(&source).unwrap(), None, false).unwrap());
        assert_eq!(out.frames(), 32000, "one bar at 60 bpm is four seconds");
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn tempo_drives_beat_length() {
        init_logger();
        let renderer = Renderer::new(RenderConfig {
            frame_rate: 8000,
            ..RenderConfig::default()
        });
        let fast = renderer.render(&parse("beat(d, bars=1)").unwrap(), None).unwrap();
        let slow = renderer
            .render(&parse("set(bpm=60)\nbeat(d, bars=1)").unwrap(), None)
            .unwrap();
        assert!((fast.buffer.duration_ms() - 2000.0).abs() <= 20.0);
        assert!((slow.buffer.duration_ms() - 4000.0).abs() <= 20.0);
    }

    #[test]
    fn zero_tempo_is_invalid() {
        let commands = parse("set(bpm=0)\nbeat(d)").unwrap();
        assert!(matches!(
            Renderer::default().render(&commands, None),
            Err(RenderError::InvalidParameter { name: "bpm", .. })
        ));
    }

    #[test]
    fn effects_replace_the_binding() {
        let path = write_tone("effects.wav", 200, 8000, Channels::Mono);
        let source = format!(
            "load a from \"{}\"\nslice(a, start=50, duration=100)\npan(a, amount=-1.0)",
            path.display()
        );
        let session = Renderer::default().run(&parse(&source).unwrap(), None).unwrap();
        let a = session.tracks.get("a").unwrap();
        assert_eq!(a.frames(), 800);
        assert_eq!(a.channels(), Channels::Stereo);
        assert_eq!(session.tracks.len(), 1);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn rebinding_keeps_one_track() {
        let short = write_tone("short.wav", 50, 8000, Channels::Mono);
        let long = write_tone("long.wav", 150, 8000, Channels::Mono);
        let source = format!(
            "load a from \"{}\"\nload a from \"{}\"",
            long.display(),
            short.display()
        );
        let session = Renderer::default().run(&parse(&source).unwrap(), None).unwrap();
        assert_eq!(session.tracks.len(), 1);
        assert_eq!(session.tracks.get("a").unwrap().frames(), 400);
        let _ = std::fs::remove_file(short);
        let _ = std::fs::remove_file(long);
    }

    #[test]
    fn mix_uses_first_track_length_and_widest_format() {
        let mut tracks = TrackTable::default();
        tracks.bind("a", tone(100, 8000, Channels::Mono));
        tracks.bind("b", tone(50, 16000, Channels::Stereo));
        let out = Renderer::default().mix(&tracks);
        assert_eq!(out.frame_rate(), 16000);
        assert_eq!(out.channels(), Channels::Stereo);
        assert_eq!(out.frames(), 1600, "100 ms at 16 kHz");
    }

    #[test]
    fn mix_cuts_later_tracks_to_first_track() {
        let mut tracks = TrackTable::default();
        tracks.bind("short", AudioBuffer::new(1000, Channels::Mono, vec![100; 100]));
        tracks.bind("long", AudioBuffer::new(1000, Channels::Mono, vec![50; 300]));
        let out = Renderer::default().mix(&tracks);
        assert_eq!(out.frames(), 100);
        assert!(out.samples().iter().all(|&s| s == 150));

        // Rebinding keeps the first track's slot, so its new length wins.
        tracks.bind("short", AudioBuffer::new(1000, Channels::Mono, vec![100; 200]));
        assert_eq!(Renderer::default().mix(&tracks).frames(), 200);
    }

    #[test]
    fn uploaded_without_upload_is_a_literal_path() {
        init_logger();
        let commands = parse("load a from \"uploaded\"").unwrap();
        let err = apply_commands(&commands, None, false).unwrap_err();
        assert!(
            matches!(&err, RenderError::FileNotFound { path } if path == Path::new(UPLOADED)),
            "got {err:?}"
        );
    }

    #[test]
    fn low_pass_on_tiny_frame_rate_returns_a_result() {
        init_logger();
        let path = temp_path("two-hertz.wav");
        write_wav(&AudioBuffer::new(2, Channels::Mono, vec![1000, -1000, 500, 0]), &path).unwrap();
        let source = format!("load a from \"{}\"\nlowPass(a, cutoff=1000)", path.display());
        let out = buffer(apply_commands(&parse(&source).unwrap(), None, false).unwrap());
        assert_eq!(out.frame_rate(), 2);
        assert_eq!(out.frames(), 4);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn export_writes_the_mix() {
        init_logger();
        let src = write_tone("export-src.wav", 100, 8000, Channels::Stereo);
        let dst = temp_path("export-dst.wav");
        let source = format!(
            "load a from \"{}\"\ngain(a, -6)\nexport(\"{}\")",
            src.display(),
            dst.display()
        );
        let rendered = apply_commands(&parse(&source).unwrap(), None, false).unwrap();
        assert!(matches!(&rendered, Rendered::Exported(p) if *p == dst));

        let written = read_audio(&dst).unwrap();
        assert_eq!(written.channels(), Channels::Stereo);
        assert_eq!(written.frames(), 800);
        let _ = std::fs::remove_file(src);
        let _ = std::fs::remove_file(dst);
    }

    #[test]
    fn preview_is_mono_and_skips_export() {
        init_logger();
        let src = write_tone("preview.wav", 100, 44100, Channels::Stereo);
        let dst = temp_path("preview-dst.wav");
        let source = format!(
            "load a from \"{}\"\nexport(\"{}\")",
            src.display(),
            dst.display()
        );
        let out = buffer(apply_commands(&parse(&source).unwrap(), None, true).unwrap());
        assert_eq!(out.channels(), Channels::Mono);
        assert_eq!(out.frame_rate(), 22050);
        assert!(!dst.exists(), "preview must not write the export");
        let _ = std::fs::remove_file(src);
    }

    #[test]
    fn config_loads_from_partial_json() {
        let config: RenderConfig =
            serde_json::from_str(r#"{"preview_frame_rate": 11025, "unbound_track": "error"}"#)
                .unwrap();
        assert_eq!(config.preview_frame_rate, 11025);
        assert_eq!(config.unbound_track, UnboundTrack::Error);
        assert_eq!(config.silence_ms, 1000);
    }
}
