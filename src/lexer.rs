use crate::error::LexError;
use crate::token::{Span, Spanned, Token};

/// Tokenizer for a single Synthtax line.
///
/// Spans are byte offsets within the line; the parser shifts them to
/// source offsets.
pub struct Lexer {
    chars: Vec<char>,
    /// Precomputed byte offset for each char index.
    /// `byte_offsets[i]` = byte offset of `chars[i]` in the original `&str`.
    /// `byte_offsets[chars.len()]` = total byte length (sentinel for EOL).
    byte_offsets: Vec<usize>,
    pos: usize,
}

impl Lexer {
    pub fn new(line: &str) -> Self {
        let chars: Vec<char> = line.chars().collect();
        let mut byte_offsets = Vec::with_capacity(chars.len() + 1);
        let mut offset = 0;
        for ch in &chars {
            byte_offsets.push(offset);
            offset += ch.len_utf8();
        }
        byte_offsets.push(offset);
        Lexer {
            chars,
            byte_offsets,
            pos: 0,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Spanned>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let spanned = self.next_token()?;
            let is_eol = spanned.token == Token::EOL;
            tokens.push(spanned);
            if is_eol {
                break;
            }
        }
        Ok(tokens)
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.chars.len() && self.chars[self.pos].is_whitespace() {
            self.pos += 1;
        }
    }

    fn byte_pos_of(&self, char_idx: usize) -> usize {
        self.byte_offsets[char_idx.min(self.chars.len())]
    }

    fn spanned(&self, token: Token, start: usize) -> Spanned {
        Spanned {
            token,
            span: Span {
                start: self.byte_pos_of(start),
                end: self.byte_pos_of(self.pos),
            },
        }
    }

    fn next_token(&mut self) -> Result<Spanned, LexError> {
        self.skip_whitespace();

        let start = self.pos;
        let Some(ch) = self.chars.get(self.pos).copied() else {
            return Ok(self.spanned(Token::EOL, start));
        };

        match ch {
            '(' => {
                self.pos += 1;
                Ok(self.spanned(Token::LParen, start))
            }
            ')' => {
                self.pos += 1;
                Ok(self.spanned(Token::RParen, start))
            }
            ',' => {
                self.pos += 1;
                Ok(self.spanned(Token::Comma, start))
            }
            '=' => {
                self.pos += 1;
                Ok(self.spanned(Token::Eq, start))
            }
            '"' => self.lex_string(start),
            '-' if self.peek_at(1).is_some_and(|c| c.is_ascii_digit() || c == '.') => {
                self.pos += 1;
                self.lex_number(start)
            }
            c if c.is_ascii_digit() || c == '.' => self.lex_number(start),
            c if c.is_ascii_alphabetic() || c == '_' => self.lex_ident(start),
            c => Err(LexError::UnexpectedChar {
                ch: c,
                pos: self.byte_pos_of(start),
            }),
        }
    }

    fn lex_string(&mut self, start: usize) -> Result<Spanned, LexError> {
        self.advance(); // opening quote
        let mut s = String::new();
        loop {
            match self.advance() {
                Some('"') => break,
                Some('\\') => match self.advance() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some('\\') => s.push('\\'),
                    Some('"') => s.push('"'),
                    Some(c) => {
                        s.push('\\');
                        s.push(c);
                    }
                    None => {
                        return Err(LexError::UnterminatedString {
                            pos: self.byte_pos_of(start),
                        });
                    }
                },
                Some(c) => s.push(c),
                None => {
                    return Err(LexError::UnterminatedString {
                        pos: self.byte_pos_of(start),
                    });
                }
            }
        }
        Ok(self.spanned(Token::StringLit(s), start))
    }

    /// Lex `[-]digits[.digits]`. The sign, if any, has already been consumed.
    fn lex_number(&mut self, start: usize) -> Result<Spanned, LexError> {
        let mut seen_dot = false;
        let mut seen_digit = false;
        while self.pos < self.chars.len() {
            let ch = self.chars[self.pos];
            if ch.is_ascii_digit() {
                seen_digit = true;
                self.pos += 1;
            } else if ch == '.' && !seen_dot {
                seen_dot = true;
                self.pos += 1;
            } else {
                break;
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        if !seen_digit || text.parse::<f64>().is_err() {
            return Err(LexError::InvalidNumber {
                text,
                pos: self.byte_pos_of(start),
            });
        }
        Ok(self.spanned(Token::Number(text), start))
    }

    fn lex_ident(&mut self, start: usize) -> Result<Spanned, LexError> {
        while self.pos < self.chars.len() {
            let ch = self.chars[self.pos];
            if ch.is_ascii_alphanumeric() || ch == '_' {
                self.pos += 1;
            } else {
                break;
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        Ok(self.spanned(Token::Ident(text), start))
    }
}
