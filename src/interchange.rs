//! Structured interchange form of a command sequence.
//!
//! Each command becomes an ordered map: `action` first, then the verb's
//! fields in canonical order. Used for inspection and external editing;
//! execution always goes through [`Command`].

use serde_json::{Map, Value};

use crate::command::Command;
use crate::error::{InterchangeError, SynthtaxError};
use crate::parser;
use crate::token::is_identifier;

pub type Entry = Map<String, Value>;

/// Convert parsed commands to interchange entries.
pub fn commands_to_entries(commands: &[Command]) -> Result<Vec<Entry>, InterchangeError> {
    commands
        .iter()
        .enumerate()
        .map(|(index, cmd)| match serde_json::to_value(cmd)? {
            Value::Object(map) => Ok(map),
            other => Err(InterchangeError::InvalidCommand {
                index,
                message: format!("serialized to non-object {other}"),
            }),
        })
        .collect()
}

/// Convert interchange entries back to commands, validating each one.
pub fn entries_to_commands(entries: &[Entry]) -> Result<Vec<Command>, InterchangeError> {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let cmd: Command = serde_json::from_value(Value::Object(entry.clone())).map_err(
                |e| InterchangeError::InvalidCommand {
                    index,
                    message: e.to_string(),
                },
            )?;
            if let Some(track) = cmd.track() {
                if !is_identifier(track) {
                    return Err(InterchangeError::InvalidTrack {
                        index,
                        track: track.to_string(),
                    });
                }
            }
            Ok(cmd)
        })
        .collect()
}

/// Render commands as canonical Synthtax source, one per line.
pub fn commands_to_source(commands: &[Command]) -> String {
    commands
        .iter()
        .map(Command::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse Synthtax source and emit its interchange entries.
pub fn to_interchange(source: &str) -> Result<Vec<Entry>, SynthtaxError> {
    let commands = parser::parse(source)?;
    Ok(commands_to_entries(&commands)?)
}

/// Emit canonical Synthtax source for interchange entries.
pub fn from_interchange(entries: &[Entry]) -> Result<String, InterchangeError> {
    let commands = entries_to_commands(entries)?;
    Ok(commands_to_source(&commands))
}

/// [`to_interchange`] as a pretty-printed JSON document.
pub fn to_json(source: &str) -> Result<String, SynthtaxError> {
    let entries = to_interchange(source)?;
    serde_json::to_string_pretty(&entries)
        .map_err(|e| SynthtaxError::Interchange(InterchangeError::Json(e)))
}

/// [`from_interchange`] reading a JSON document.
pub fn from_json(json: &str) -> Result<String, InterchangeError> {
    let entries: Vec<Entry> = serde_json::from_str(json)?;
    from_interchange(&entries)
}
