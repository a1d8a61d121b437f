#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Numeric literal, kept as source text so integer fields can reject fractions.
    Number(String),
    StringLit(String),
    Ident(String),

    // Punctuation
    Comma,  // ,
    Eq,     // =
    LParen, // (
    RParen, // )

    // Structural
    EOL,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// Shift a line-relative span to a position within the whole source.
    pub fn offset(self, by: usize) -> Span {
        Span {
            start: self.start + by,
            end: self.end + by,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Spanned {
    pub token: Token,
    pub span: Span,
}

/// Convert a token back to its approximate source representation.
pub fn token_to_string(token: &Token) -> String {
    match token {
        Token::Number(n) => n.clone(),
        Token::StringLit(s) => quote(s),
        Token::Ident(s) => s.clone(),
        Token::Comma => ",".into(),
        Token::Eq => "=".into(),
        Token::LParen => "(".into(),
        Token::RParen => ")".into(),
        Token::EOL => "end of line".into(),
    }
}

/// Render a string as a double-quoted literal the lexer reads back unchanged.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// True if `s` is usable as a bare track identifier.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
