pub mod command;
pub mod dsp;
pub mod error;
pub mod interchange;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod token;

use crate::interchange::Entry;
use wasm_bindgen::prelude::*;

pub use crate::interchange::{from_interchange, from_json, to_interchange, to_json};
pub use crate::interpreter::apply_commands;
pub use crate::parser::parse;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// WASM-exposed: return the synthtax-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// WASM-exposed: parse Synthtax source into the interchange list.
#[wasm_bindgen]
pub fn parse_to_interchange(source: &str) -> Result<JsValue, JsValue> {
    let entries = to_interchange(source).map_err(js_error)?;
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    serde::Serialize::serialize(&entries, &serializer).map_err(js_error)
}

/// WASM-exposed: turn an interchange list back into canonical source.
#[wasm_bindgen]
pub fn interchange_to_source(entries: JsValue) -> Result<String, JsValue> {
    let entries: Vec<Entry> = serde_wasm_bindgen::from_value(entries).map_err(js_error)?;
    from_interchange(&entries).map_err(js_error)
}

/// WASM-exposed: render source to WAV bytes. `export` lines are ignored
/// since the browser has no filesystem; `preview` returns the mono preview.
#[wasm_bindgen]
pub fn render_wav(source: &str, preview: bool) -> Result<Vec<u8>, JsValue> {
    let commands = parse(source).map_err(|e| js_error(e.report(source)))?;
    let renderer = interpreter::Renderer::default();
    let mixdown = renderer.render(&commands, None).map_err(js_error)?;
    let buffer = if preview {
        dsp::effects::preview(&mixdown.buffer, renderer.config().preview_frame_rate)
    } else {
        mixdown.buffer
    };
    dsp::renderer::encode_wav(&buffer).map_err(js_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_matches_manifest() {
        assert_eq!(core_version(), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn scenario_program_round_trips() {
        let source = "\
# a full session
set(bpm=100, key=\"C minor\")
beat(drums, style=\"hiphop\", bars=3)
gain(drums, -3)
normalize(drums, headroom=0.5)
lowPass(drums, cutoff=8000)
export(\"out.wav\")
";
        let entries = to_interchange(source).unwrap();
        let text = from_interchange(&entries).unwrap();
        assert_eq!(parse(&text).unwrap(), parse(source).unwrap());
    }

    #[test]
    fn render_wav_ignores_export() {
        let bytes = render_wav("export(\"/nonexistent/dir/out.wav\")", false).unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        // One second of mono silence at 44.1 kHz after a 44-byte header.
        assert_eq!(bytes.len(), 44 + 44100 * 2);
    }
}
