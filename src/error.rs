use crate::token::Span;
use ariadne::{Config, Label, Report, ReportKind, Source};
use std::fmt;
use std::path::PathBuf;

/// Top-level error for the parse → render pipeline.
#[derive(Debug)]
pub enum SynthtaxError {
    Parse(ParseError),
    Interchange(InterchangeError),
    Render(RenderError),
}

#[derive(Debug)]
pub enum LexError {
    UnexpectedChar { ch: char, pos: usize },
    UnterminatedString { pos: usize },
    InvalidNumber { text: String, pos: usize },
}

/// A line of Synthtax that could not be turned into a command.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The line starts with a known verb but does not follow its grammar.
    Syntax {
        verb: String,
        line: String,
        line_no: usize,
        message: String,
        span: Span,
    },
    /// The line does not start with any known verb.
    UnknownCommand {
        line: String,
        line_no: usize,
        span: Span,
    },
}

#[derive(Debug)]
pub enum InterchangeError {
    Json(serde_json::Error),
    /// Entry `index` did not describe a valid command.
    InvalidCommand { index: usize, message: String },
    /// Entry `index` names a track that cannot be written back as an identifier.
    InvalidTrack { index: usize, track: String },
}

#[derive(Debug)]
pub enum RenderError {
    FileNotFound { path: PathBuf },
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
    MissingTrack { verb: &'static str, track: String },
    Decode { path: PathBuf, message: String },
    Wav(hound::Error),
    Io(std::io::Error),
}

impl ParseError {
    pub fn line_no(&self) -> usize {
        match self {
            ParseError::Syntax { line_no, .. } | ParseError::UnknownCommand { line_no, .. } => {
                *line_no
            }
        }
    }

    pub fn span(&self) -> Span {
        match self {
            ParseError::Syntax { span, .. } | ParseError::UnknownCommand { span, .. } => *span,
        }
    }

    /// Render this error as a source diagnostic against the text it came from.
    pub fn report(&self, source: &str) -> String {
        let span = self.span();
        let range = span.start.min(source.len())..span.end.min(source.len());
        let label = match self {
            ParseError::Syntax { verb, message, .. } => format!("{verb}: {message}"),
            ParseError::UnknownCommand { .. } => "no command with this name".to_string(),
        };
        let mut out = Vec::new();
        let written = Report::build(ReportKind::Error, range.clone())
            .with_config(Config::default().with_color(false))
            .with_message(self.to_string())
            .with_label(Label::new(range).with_message(label))
            .finish()
            .write(Source::from(source), &mut out);
        match written {
            Ok(()) => String::from_utf8_lossy(&out).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}

impl fmt::Display for SynthtaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SynthtaxError::Parse(e) => write!(f, "Parse error: {e}"),
            SynthtaxError::Interchange(e) => write!(f, "Interchange error: {e}"),
            SynthtaxError::Render(e) => write!(f, "Render error: {e}"),
        }
    }
}

impl std::error::Error for SynthtaxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SynthtaxError::Parse(e) => Some(e),
            SynthtaxError::Interchange(e) => Some(e),
            SynthtaxError::Render(e) => Some(e),
        }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexError::UnexpectedChar { ch, pos } => write!(f, "Unexpected char '{ch}' at pos {pos}"),
            LexError::UnterminatedString { pos } => write!(f, "Unterminated string at pos {pos}"),
            LexError::InvalidNumber { text, pos } => write!(f, "Invalid number '{text}' at pos {pos}"),
        }
    }
}

impl std::error::Error for LexError {}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Syntax {
                verb,
                line,
                line_no,
                message,
                ..
            } => write!(f, "Invalid {verb} syntax on line {line_no} ({message}): {line}"),
            ParseError::UnknownCommand { line, line_no, .. } => {
                write!(f, "Unknown command on line {line_no}: {line}")
            }
        }
    }
}

impl std::error::Error for ParseError {}

impl fmt::Display for InterchangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterchangeError::Json(e) => write!(f, "{e}"),
            InterchangeError::InvalidCommand { index, message } => {
                write!(f, "Entry {index} is not a valid command: {message}")
            }
            InterchangeError::InvalidTrack { index, track } => {
                write!(f, "Entry {index} has an invalid track name '{track}'")
            }
        }
    }
}

impl std::error::Error for InterchangeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InterchangeError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::FileNotFound { path } => write!(f, "File not found: {}", path.display()),
            RenderError::InvalidParameter {
                name,
                value,
                reason,
            } => write!(f, "Invalid {name} = {value}: {reason}"),
            RenderError::MissingTrack { verb, track } => {
                write!(f, "{verb} references unbound track '{track}'")
            }
            RenderError::Decode { path, message } => {
                write!(f, "Cannot decode {}: {message}", path.display())
            }
            RenderError::Wav(e) => write!(f, "WAV error: {e}"),
            RenderError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Wav(e) => Some(e),
            RenderError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParseError> for SynthtaxError {
    fn from(e: ParseError) -> Self {
        SynthtaxError::Parse(e)
    }
}

impl From<InterchangeError> for SynthtaxError {
    fn from(e: InterchangeError) -> Self {
        SynthtaxError::Interchange(e)
    }
}

impl From<RenderError> for SynthtaxError {
    fn from(e: RenderError) -> Self {
        SynthtaxError::Render(e)
    }
}

impl From<serde_json::Error> for InterchangeError {
    fn from(e: serde_json::Error) -> Self {
        InterchangeError::Json(e)
    }
}

impl From<hound::Error> for RenderError {
    fn from(e: hound::Error) -> Self {
        match e {
            hound::Error::IoError(io) => RenderError::Io(io),
            other => RenderError::Wav(other),
        }
    }
}

impl From<std::io::Error> for RenderError {
    fn from(e: std::io::Error) -> Self {
        RenderError::Io(e)
    }
}
