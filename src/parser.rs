//! Line-oriented Synthtax parser.
//!
//! Each verb owns one entry in [`GRAMMAR`]; a line is dispatched on its
//! leading word and must then match that verb's rule exactly.

use std::str::FromStr;

use crate::command::{Command, Verb, DEFAULT_BEAT_BARS, DEFAULT_BEAT_STYLE};
use crate::error::{LexError, ParseError};
use crate::lexer::Lexer;
use crate::token::{token_to_string, Span, Spanned, Token};

/// A grammar failure inside one line, before it is tagged with line context.
struct RuleError {
    message: String,
    span: Span,
}

type Rule = fn(&mut LineParser) -> Result<Command, RuleError>;

/// Verb → rule table.
const GRAMMAR: [(Verb, Rule); 14] = [
    (Verb::Set, parse_set),
    (Verb::Load, parse_load),
    (Verb::Loop, parse_loop),
    (Verb::Gain, parse_gain),
    (Verb::FadeIn, parse_fade_in),
    (Verb::FadeOut, parse_fade_out),
    (Verb::Slice, parse_slice),
    (Verb::Reverse, parse_reverse),
    (Verb::Pan, parse_pan),
    (Verb::Normalize, parse_normalize),
    (Verb::LowPass, parse_low_pass),
    (Verb::Reverb, parse_reverb),
    (Verb::Beat, parse_beat),
    (Verb::Export, parse_export),
];

fn rule_for(verb: Verb) -> Option<Rule> {
    GRAMMAR.iter().find(|(v, _)| *v == verb).map(|(_, rule)| *rule)
}

/// Parse Synthtax source into an ordered command sequence.
///
/// Blank lines and lines starting with `#` are skipped.
pub fn parse(source: &str) -> Result<Vec<Command>, ParseError> {
    let mut commands = Vec::new();
    let mut line_start = 0;

    for (idx, raw) in source.split_inclusive('\n').enumerate() {
        let offset = line_start;
        line_start += raw.len();

        let content = raw.trim_end_matches(['\n', '\r']);
        let line = content.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let base = offset + (content.len() - content.trim_start().len());
        commands.push(parse_line(line, idx + 1, base)?);
    }
    Ok(commands)
}

/// Parse a single trimmed, non-comment line. `base` is its byte offset in the source.
fn parse_line(line: &str, line_no: usize, base: usize) -> Result<Command, ParseError> {
    let word_len = line
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(line.len());
    let word = &line[..word_len];

    let Some((verb, rule)) = Verb::from_keyword(word).and_then(|v| rule_for(v).map(|r| (v, r)))
    else {
        return Err(ParseError::UnknownCommand {
            line: line.to_string(),
            line_no,
            span: Span {
                start: base,
                end: base + line.len(),
            },
        });
    };

    let syntax_error = |message: String, span: Span| ParseError::Syntax {
        verb: verb.keyword().to_string(),
        line: line.to_string(),
        line_no,
        message,
        span: span.offset(base),
    };

    let tokens = Lexer::new(line).tokenize().map_err(|e| {
        let pos = match &e {
            LexError::UnexpectedChar { pos, .. }
            | LexError::UnterminatedString { pos }
            | LexError::InvalidNumber { pos, .. } => *pos,
        };
        syntax_error(
            e.to_string(),
            Span {
                start: pos,
                end: line.len(),
            },
        )
    })?;

    let mut parser = LineParser::new(tokens);
    parser.advance(); // the verb itself
    rule(&mut parser).map_err(|e| syntax_error(e.message, e.span))
}

// ── Rules ───────────────────────────────────────────────────

fn parse_set(p: &mut LineParser) -> Result<Command, RuleError> {
    p.expect(&Token::LParen)?;
    let mut bpm = None;
    let mut key = None;
    if !p.check(&Token::RParen) {
        loop {
            let (name, span) = p.expect_ident()?;
            p.expect(&Token::Eq)?;
            match name.as_str() {
                "bpm" if bpm.is_none() => bpm = Some(p.expect_unsigned()?),
                "key" if key.is_none() => key = Some(p.expect_string()?),
                "bpm" | "key" => return Err(RuleError::at(span, format!("duplicate '{name}'"))),
                _ => return Err(RuleError::at(span, format!("unknown argument '{name}'"))),
            }
            if !p.eat(&Token::Comma) {
                break;
            }
        }
    }
    p.finish_call()?;
    Ok(Command::Set { bpm, key })
}

fn parse_load(p: &mut LineParser) -> Result<Command, RuleError> {
    let (track, _) = p.expect_ident()?;
    p.expect_word("from")?;
    let file = p.expect_string()?;
    p.expect_eol()?;
    Ok(Command::Load { track, file })
}

fn parse_loop(p: &mut LineParser) -> Result<Command, RuleError> {
    let track = p.open_call()?;
    p.expect(&Token::Comma)?;
    p.expect_keyword("bars")?;
    let bars = p.expect_unsigned()?;
    p.finish_call()?;
    Ok(Command::Loop { track, bars })
}

fn parse_gain(p: &mut LineParser) -> Result<Command, RuleError> {
    let track = p.open_call()?;
    p.expect(&Token::Comma)?;
    let db = p.expect_signed()?;
    p.finish_call()?;
    Ok(Command::Gain { track, db })
}

fn parse_fade_in(p: &mut LineParser) -> Result<Command, RuleError> {
    let (track, seconds) = parse_fade(p)?;
    Ok(Command::FadeIn { track, seconds })
}

fn parse_fade_out(p: &mut LineParser) -> Result<Command, RuleError> {
    let (track, seconds) = parse_fade(p)?;
    Ok(Command::FadeOut { track, seconds })
}

fn parse_fade(p: &mut LineParser) -> Result<(String, u32), RuleError> {
    let track = p.open_call()?;
    p.expect(&Token::Comma)?;
    p.expect_keyword("seconds")?;
    let seconds = p.expect_unsigned()?;
    p.finish_call()?;
    Ok((track, seconds))
}

fn parse_slice(p: &mut LineParser) -> Result<Command, RuleError> {
    let track = p.open_call()?;
    p.expect(&Token::Comma)?;
    p.expect_keyword("start")?;
    let start_ms = p.expect_unsigned()?;
    p.expect(&Token::Comma)?;
    p.expect_keyword("duration")?;
    let duration_ms = p.expect_unsigned()?;
    p.finish_call()?;
    Ok(Command::Slice {
        track,
        start_ms,
        duration_ms,
    })
}

fn parse_reverse(p: &mut LineParser) -> Result<Command, RuleError> {
    let track = p.open_call()?;
    p.finish_call()?;
    Ok(Command::Reverse { track })
}

fn parse_pan(p: &mut LineParser) -> Result<Command, RuleError> {
    let track = p.open_call()?;
    p.expect(&Token::Comma)?;
    p.expect_keyword("amount")?;
    let amount = p.expect_float(true)?;
    p.finish_call()?;
    Ok(Command::Pan { track, amount })
}

fn parse_normalize(p: &mut LineParser) -> Result<Command, RuleError> {
    let track = p.open_call()?;
    let headroom = if p.eat(&Token::Comma) {
        p.expect_keyword("headroom")?;
        Some(p.expect_float(false)?)
    } else {
        None
    };
    p.finish_call()?;
    Ok(Command::Normalize { track, headroom })
}

fn parse_low_pass(p: &mut LineParser) -> Result<Command, RuleError> {
    let track = p.open_call()?;
    p.expect(&Token::Comma)?;
    p.expect_keyword("cutoff")?;
    let cutoff_hz = p.expect_unsigned()?;
    p.finish_call()?;
    Ok(Command::LowPass { track, cutoff_hz })
}

fn parse_reverb(p: &mut LineParser) -> Result<Command, RuleError> {
    let track = p.open_call()?;
    p.expect(&Token::Comma)?;
    p.expect_keyword("amount")?;
    let amount = p.expect_float(false)?;
    p.finish_call()?;
    Ok(Command::Reverb { track, amount })
}

fn parse_beat(p: &mut LineParser) -> Result<Command, RuleError> {
    let track = p.open_call()?;
    let mut style = None;
    let mut bars = None;
    while p.eat(&Token::Comma) {
        let (name, span) = p.expect_ident()?;
        p.expect(&Token::Eq)?;
        match name.as_str() {
            "style" if style.is_none() => style = Some(p.expect_string()?),
            "bars" if bars.is_none() => bars = Some(p.expect_unsigned()?),
            "style" | "bars" => return Err(RuleError::at(span, format!("duplicate '{name}'"))),
            _ => return Err(RuleError::at(span, format!("unknown argument '{name}'"))),
        }
    }
    p.finish_call()?;
    Ok(Command::Beat {
        track,
        style: style.unwrap_or_else(|| DEFAULT_BEAT_STYLE.to_string()),
        bars: bars.unwrap_or(DEFAULT_BEAT_BARS),
    })
}

fn parse_export(p: &mut LineParser) -> Result<Command, RuleError> {
    p.expect(&Token::LParen)?;
    let file = p.expect_string()?;
    p.finish_call()?;
    Ok(Command::Export { file })
}

// ── Token cursor ────────────────────────────────────────────

impl RuleError {
    fn at(span: Span, message: String) -> Self {
        RuleError { message, span }
    }
}

struct LineParser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl LineParser {
    fn new(tokens: Vec<Spanned>) -> Self {
        LineParser { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos].token
    }

    fn span(&self) -> Span {
        self.tokens[self.pos].span
    }

    fn advance(&mut self) -> Spanned {
        let s = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        s
    }

    fn check(&self, expected: &Token) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(expected)
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.check(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn unexpected(&self, expected: &str) -> RuleError {
        RuleError::at(
            self.span(),
            format!("expected {expected}, found '{}'", token_to_string(self.peek())),
        )
    }

    fn expect(&mut self, expected: &Token) -> Result<Spanned, RuleError> {
        if self.check(expected) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&format!("'{}'", token_to_string(expected))))
        }
    }

    fn expect_ident(&mut self) -> Result<(String, Span), RuleError> {
        match self.peek() {
            Token::Ident(name) => {
                let name = name.clone();
                let span = self.advance().span;
                Ok((name, span))
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    /// Expect a specific bare word, e.g. `from`.
    fn expect_word(&mut self, word: &str) -> Result<(), RuleError> {
        match self.peek() {
            Token::Ident(name) if name == word => {
                self.advance();
                Ok(())
            }
            _ => Err(self.unexpected(&format!("'{word}'"))),
        }
    }

    /// Expect `name =`.
    fn expect_keyword(&mut self, name: &str) -> Result<(), RuleError> {
        self.expect_word(name)?;
        self.expect(&Token::Eq)?;
        Ok(())
    }

    fn expect_string(&mut self) -> Result<String, RuleError> {
        match self.peek() {
            Token::StringLit(s) => {
                let s = s.clone();
                self.advance();
                Ok(s)
            }
            _ => Err(self.unexpected("string literal")),
        }
    }

    fn expect_number<T: FromStr>(&mut self, expected: &str) -> Result<T, RuleError> {
        match self.peek() {
            Token::Number(text) => match text.parse::<T>() {
                Ok(n) => {
                    self.advance();
                    Ok(n)
                }
                Err(_) => Err(RuleError::at(
                    self.span(),
                    format!("expected {expected}, found '{text}'"),
                )),
            },
            _ => Err(self.unexpected(expected)),
        }
    }

    fn expect_unsigned<T: FromStr>(&mut self) -> Result<T, RuleError> {
        self.expect_number("non-negative integer")
    }

    fn expect_signed(&mut self) -> Result<i32, RuleError> {
        self.expect_number("integer")
    }

    fn expect_float(&mut self, signed: bool) -> Result<f64, RuleError> {
        if !signed {
            if let Token::Number(text) = self.peek() {
                if text.starts_with('-') {
                    return Err(RuleError::at(
                        self.span(),
                        format!("expected non-negative number, found '{text}'"),
                    ));
                }
            }
        }
        let span = self.span();
        let value: f64 = self.expect_number("number")?;
        if !value.is_finite() {
            return Err(RuleError::at(span, "number is out of range".to_string()));
        }
        Ok(value)
    }

    fn expect_eol(&mut self) -> Result<(), RuleError> {
        if self.check(&Token::EOL) {
            Ok(())
        } else {
            Err(self.unexpected("end of line"))
        }
    }

    /// `( TRACK`
    fn open_call(&mut self) -> Result<String, RuleError> {
        self.expect(&Token::LParen)?;
        Ok(self.expect_ident()?.0)
    }

    /// `)` followed by end of line.
    fn finish_call(&mut self) -> Result<(), RuleError> {
        self.expect(&Token::RParen)?;
        self.expect_eol()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one(line: &str) -> Command {
        let mut cmds = parse(line).unwrap();
        assert_eq!(cmds.len(), 1, "expected one command from {line:?}");
        cmds.remove(0)
    }

    #[test]
    fn every_verb_has_a_rule() {
        for verb in Verb::ALL {
            assert!(rule_for(verb).is_some(), "no grammar rule for {verb:?}");
        }
    }

    #[test]
    fn test_parse_set() {
        assert_eq!(
            one("set(bpm=100, key=\"C minor\")"),
            Command::Set {
                bpm: Some(100),
                key: Some("C minor".into()),
            }
        );
        assert_eq!(
            one("set(key=\"D\")"),
            Command::Set {
                bpm: None,
                key: Some("D".into()),
            }
        );
        assert_eq!(one("set()"), Command::Set { bpm: None, key: None });
    }

    #[test]
    fn test_parse_load() {
        assert_eq!(
            one("load DRUM from \"drum.wav\""),
            Command::Load {
                track: "DRUM".into(),
                file: "drum.wav".into(),
            }
        );
    }

    #[test]
    fn test_parse_effects() {
        assert_eq!(
            one("loop(DRUM, bars=4)"),
            Command::Loop {
                track: "DRUM".into(),
                bars: 4,
            }
        );
        assert_eq!(
            one("gain(DRUM, -3)"),
            Command::Gain {
                track: "DRUM".into(),
                db: -3,
            }
        );
        assert_eq!(
            one("fadeOut(pad, seconds=2)"),
            Command::FadeOut {
                track: "pad".into(),
                seconds: 2,
            }
        );
        assert_eq!(
            one("slice(vox, start=250, duration=1000)"),
            Command::Slice {
                track: "vox".into(),
                start_ms: 250,
                duration_ms: 1000,
            }
        );
        assert_eq!(one("reverse(vox)"), Command::Reverse { track: "vox".into() });
        assert_eq!(
            one("pan(DRUM, amount=-0.25)"),
            Command::Pan {
                track: "DRUM".into(),
                amount: -0.25,
            }
        );
        assert_eq!(
            one("lowPass(DRUM, cutoff=1000)"),
            Command::LowPass {
                track: "DRUM".into(),
                cutoff_hz: 1000,
            }
        );
        assert_eq!(
            one("reverb(DRUM, amount=0.4)"),
            Command::Reverb {
                track: "DRUM".into(),
                amount: 0.4,
            }
        );
        assert_eq!(
            one("export(\"out.wav\")"),
            Command::Export {
                file: "out.wav".into()
            }
        );
    }

    #[test]
    fn test_parse_normalize_optional_headroom() {
        assert_eq!(
            one("normalize(DRUM, headroom=0.5)"),
            Command::Normalize {
                track: "DRUM".into(),
                headroom: Some(0.5),
            }
        );
        assert_eq!(
            one("normalize(DRUM)"),
            Command::Normalize {
                track: "DRUM".into(),
                headroom: None,
            }
        );
    }

    #[test]
    fn test_parse_beat() {
        assert_eq!(
            one("beat(drums, style=\"hiphop\", bars=3)"),
            Command::Beat {
                track: "drums".into(),
                style: "hiphop".into(),
                bars: 3,
            }
        );
        assert_eq!(
            one("beat(groove, bars=2)"),
            Command::Beat {
                track: "groove".into(),
                style: "house".into(),
                bars: 2,
            }
        );
        assert_eq!(
            one("beat(groove)"),
            Command::Beat {
                track: "groove".into(),
                style: "house".into(),
                bars: 4,
            }
        );
    }

    #[test]
    fn test_skips_blank_and_comment_lines() {
        let source = "\n# intro\n  set(bpm=90)\n\n   # another\nreverse(a)\n";
        let cmds = parse(source).unwrap();
        assert_eq!(cmds.len(), 2);
        assert_eq!(cmds[1], Command::Reverse { track: "a".into() });
    }

    #[test]
    fn test_order_is_preserved() {
        let cmds = parse("load a from \"a.wav\"\ngain(a, 3)\nexport(\"o.wav\")").unwrap();
        let verbs: Vec<Verb> = cmds.iter().map(Command::verb).collect();
        assert_eq!(verbs, vec![Verb::Load, Verb::Gain, Verb::Export]);
    }

    #[test]
    fn test_unknown_command() {
        let err = parse("set(bpm=90)\nwobble(DRUM)").unwrap_err();
        match err {
            ParseError::UnknownCommand { line, line_no, span } => {
                assert_eq!(line, "wobble(DRUM)");
                assert_eq!(line_no, 2);
                assert_eq!(span, Span { start: 12, end: 24 });
            }
            other => panic!("Expected UnknownCommand, got {other:?}"),
        }
    }

    #[test]
    fn test_verb_prefix_is_not_a_verb() {
        let err = parse("loopy(DRUM, bars=2)").unwrap_err();
        assert!(matches!(err, ParseError::UnknownCommand { .. }));
    }

    #[test]
    fn test_syntax_errors_name_verb_and_line() {
        let cases = [
            ("loop(DRUM)", "loop"),
            ("loop(DRUM, bars=1.5)", "loop"),
            ("gain(DRUM, loud)", "gain"),
            ("load DRUM \"drum.wav\"", "load"),
            ("export(out.wav)", "export"),
            ("reverb(DRUM, amount=-0.5)", "reverb"),
            ("set(bpm=90, bpm=100)", "set"),
            ("beat(d, tempo=3)", "beat"),
            ("reverse(DRUM) extra", "reverse"),
            ("export(\"unterminated)", "export"),
        ];
        for (line, expected_verb) in cases {
            match parse(line) {
                Err(ParseError::Syntax { verb, line: text, .. }) => {
                    assert_eq!(verb, expected_verb, "wrong verb for {line:?}");
                    assert_eq!(text, line);
                }
                other => panic!("Expected syntax error for {line:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_syntax_error_span_is_source_relative() {
        let err = parse("set(bpm=1)\n  loop(DRUM, bars=x)").unwrap_err();
        match err {
            ParseError::Syntax { span, line_no, .. } => {
                assert_eq!(line_no, 2);
                // `x` sits at column 16 of the trimmed line, which starts at byte 13.
                assert_eq!(span.start, 13 + 16);
            }
            other => panic!("Expected Syntax, got {other:?}"),
        }
    }

    #[test]
    fn test_overflowing_float_is_rejected() {
        let huge = "9".repeat(400);
        for line in [
            format!("pan(a, amount={huge})"),
            format!("pan(a, amount=-{huge}.5)"),
            format!("reverb(a, amount={huge})"),
            format!("normalize(a, headroom={huge})"),
        ] {
            match parse(&line) {
                Err(ParseError::Syntax { message, span, .. }) => {
                    assert!(message.contains("out of range"), "unexpected message {message:?}");
                    assert_eq!(span.start, line.find('=').unwrap() + 1);
                }
                other => panic!("Expected syntax error for {line:?}, got {other:?}"),
            }
        }
        assert_eq!(
            one("pan(a, amount=-0.25)"),
            Command::Pan {
                track: "a".into(),
                amount: -0.25,
            }
        );
    }
}
