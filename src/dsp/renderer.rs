//! Audio file I/O — decodes sources into [`AudioBuffer`]s and writes
//! 16-bit PCM WAV.

use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;

use crate::error::RenderError;

use super::buffer::{float_to_i16, AudioBuffer, Channels};

/// Open `path`, reporting a missing file as [`RenderError::FileNotFound`].
fn open(path: &Path) -> Result<File, RenderError> {
    File::open(path).map_err(|e| not_found_or_io(e, path))
}

fn not_found_or_io(e: std::io::Error, path: &Path) -> RenderError {
    if e.kind() == std::io::ErrorKind::NotFound {
        RenderError::FileNotFound {
            path: path.to_path_buf(),
        }
    } else {
        RenderError::Io(e)
    }
}

fn decode_error(path: &Path, message: impl ToString) -> RenderError {
    RenderError::Decode {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

/// Read an audio file. WAV is always supported; MP3 with the `mp3` feature.
pub fn read_audio(path: &Path) -> Result<AudioBuffer, RenderError> {
    let is_mp3 = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("mp3"));
    if is_mp3 {
        return read_mp3(path);
    }
    let reader = BufReader::new(open(path)?);
    decode_wav(reader).map_err(|e| match e {
        RenderError::Wav(w) => decode_error(path, w),
        RenderError::InvalidParameter {
            name: "channels",
            value,
            reason,
        } => decode_error(path, format!("{value} channels: {reason}")),
        other => other,
    })
}

/// Decode WAV data, reducing any integer or float sample format to 16 bits.
pub fn decode_wav<R: Read>(reader: R) -> Result<AudioBuffer, RenderError> {
    let mut reader = hound::WavReader::new(reader)?;
    let spec = reader.spec();
    let channels = Channels::from_count(spec.channels).ok_or(RenderError::InvalidParameter {
        name: "channels",
        value: spec.channels.to_string(),
        reason: "only mono and stereo sources are supported",
    })?;

    let samples: Vec<i16> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(|x| float_to_i16(x as f64)))
            .collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let bits = spec.bits_per_sample;
            reader
                .samples::<i32>()
                .map(|s| s.map(|x| int_to_i16(x, bits)))
                .collect::<Result<_, _>>()?
        }
    };

    Ok(AudioBuffer::new(spec.sample_rate, channels, samples))
}

fn int_to_i16(sample: i32, bits: u16) -> i16 {
    if bits > 16 {
        (sample >> (bits - 16)) as i16
    } else {
        (sample << (16 - bits)) as i16
    }
}

#[cfg(feature = "mp3")]
fn read_mp3(path: &Path) -> Result<AudioBuffer, RenderError> {
    let mut decoder = minimp3::Decoder::new(BufReader::new(open(path)?));
    let mut samples = Vec::new();
    let mut format: Option<(u32, usize)> = None;
    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                let fmt = *format.get_or_insert((frame.sample_rate as u32, frame.channels));
                if fmt.1 != frame.channels {
                    return Err(decode_error(path, "channel count changes mid-stream"));
                }
                samples.extend_from_slice(&frame.data);
            }
            Err(minimp3::Error::Eof) => break,
            Err(minimp3::Error::SkippedData) => continue,
            Err(minimp3::Error::Io(e)) => return Err(RenderError::Io(e)),
            Err(e) => return Err(decode_error(path, e)),
        }
    }
    let (rate, count) = format.ok_or_else(|| decode_error(path, "no audio frames"))?;
    let channels = Channels::from_count(count as u16)
        .ok_or_else(|| decode_error(path, format!("{count} channels")))?;
    Ok(AudioBuffer::new(rate, channels, samples))
}

#[cfg(not(feature = "mp3"))]
fn read_mp3(path: &Path) -> Result<AudioBuffer, RenderError> {
    Err(decode_error(path, "MP3 support is not enabled"))
}

fn wav_spec(buf: &AudioBuffer) -> hound::WavSpec {
    hound::WavSpec {
        channels: buf.channels().count() as u16,
        sample_rate: buf.frame_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    }
}

fn write_samples<W: Write + Seek>(buf: &AudioBuffer, out: W) -> Result<(), RenderError> {
    let mut writer = hound::WavWriter::new(out, wav_spec(buf))?;
    for &s in buf.samples() {
        writer.write_sample(s)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Write `buf` to `path` as 16-bit PCM WAV.
pub fn write_wav(buf: &AudioBuffer, path: &Path) -> Result<(), RenderError> {
    let file = File::create(path).map_err(|e| not_found_or_io(e, path))?;
    write_samples(buf, BufWriter::new(file))
}

/// Encode `buf` as an in-memory 16-bit PCM WAV file.
pub fn encode_wav(buf: &AudioBuffer) -> Result<Vec<u8>, RenderError> {
    let mut cursor = Cursor::new(Vec::new());
    write_samples(buf, &mut cursor)?;
    Ok(cursor.into_inner())
}
