// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Byte-oriented tokenizer for standard expressions
//!
//! Runs in two modes. In standard mode identifier-like runs are generic
//! tokens and may contain `.`, plus `-` or `/` between word characters, so
//! `main-section` or `fragments/footer` stay one token. In navigation mode
//! (the body of `${...}` and `*{...}`) identifiers are plain words and `.`,
//! `[` and `]` are separate tokens.
//!
//! Bracketed expressions (`${...}`, `*{...}`, `#{...}`, `@{...}`, `~{...}`)
//! are returned whole; the parser decides how to parse their content.

use super::error::{ParseError, ParseResult};
use unicode_xid::UnicodeXID;

/// A token with the byte range it was read from
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken<'input> {
    /// The token
    pub token: Token<'input>,
    /// Start offset in the expression text
    pub start: usize,
    /// End offset in the expression text (exclusive)
    pub end: usize,
}

impl SpannedToken<'_> {
    /// Text the token was read from
    pub fn source<'a>(&self, input: &'a str) -> &'a str {
        input.get(self.start..self.end).unwrap_or_default()
    }
}

/// Tokenizer mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenizerMode {
    /// Outer expression grammar
    Standard,
    /// Body of a variable or selection expression
    Navigation,
}

/// Kind of a bracketed expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimpleExpressionKind {
    /// `${...}`
    Variable,
    /// `*{...}`
    Selection,
    /// `#{...}`
    Message,
    /// `@{...}`
    Link,
    /// `~{...}`
    Fragment,
}

impl SimpleExpressionKind {
    /// Kind for a marker byte
    pub const fn from_marker(marker: u8) -> Option<Self> {
        match marker {
            b'$' => Some(Self::Variable),
            b'*' => Some(Self::Selection),
            b'#' => Some(Self::Message),
            b'@' => Some(Self::Link),
            b'~' => Some(Self::Fragment),
            _ => None,
        }
    }

    /// Marker character
    pub const fn marker(self) -> char {
        match self {
            Self::Variable => '$',
            Self::Selection => '*',
            Self::Message => '#',
            Self::Link => '@',
            Self::Fragment => '~',
        }
    }
}

/// Token with zero-copy slices into the input
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'input> {
    /// Integer literal digits
    Integer(&'input str),
    /// Decimal literal text, with fraction or exponent
    Decimal(&'input str),
    /// Raw content of a quoted text literal, escapes not yet processed
    String(&'input str),
    /// `true` / `false`
    Boolean(bool),
    /// `null`
    Null,
    /// `_`
    NoOp,
    /// Generic token (standard mode) or identifier (navigation mode)
    Word(&'input str),
    /// Bracketed expression with its inner content
    Simple {
        /// Expression kind
        kind: SimpleExpressionKind,
        /// Text between the braces
        content: &'input str,
    },

    // Arithmetic
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Multiply,
    /// `/`, `div`
    Divide,
    /// `%`, `mod`
    Remainder,

    // Comparison
    /// `==`, `eq`
    Equal,
    /// `!=`, `ne`, `neq`
    NotEqual,
    /// `<`, `lt`
    LessThan,
    /// `<=`, `le`
    LessThanOrEqual,
    /// `>`, `gt`
    GreaterThan,
    /// `>=`, `ge`
    GreaterThanOrEqual,

    // Logical
    /// `and`, `&&`
    And,
    /// `or`, `||`
    Or,
    /// `!`, `not`
    Not,

    // Conditionals
    /// `?`
    Question,
    /// `?:` written without a gap
    Elvis,
    /// `:`
    Colon,

    // Punctuation
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `,`
    Comma,
    /// `=`
    Assign,
    /// `.` (navigation mode)
    Dot,
    /// `[` (navigation mode)
    LeftBracket,
    /// `]` (navigation mode)
    RightBracket,
}

impl<'input> Token<'input> {
    /// Keyword for a word, matched case-insensitively
    pub fn from_keyword(word: &str) -> Option<Token<'static>> {
        const KEYWORDS: [(&str, Token<'static>); 15] = [
            ("and", Token::And),
            ("or", Token::Or),
            ("not", Token::Not),
            ("eq", Token::Equal),
            ("ne", Token::NotEqual),
            ("neq", Token::NotEqual),
            ("gt", Token::GreaterThan),
            ("ge", Token::GreaterThanOrEqual),
            ("lt", Token::LessThan),
            ("le", Token::LessThanOrEqual),
            ("div", Token::Divide),
            ("mod", Token::Remainder),
            ("true", Token::Boolean(true)),
            ("false", Token::Boolean(false)),
            ("null", Token::Null),
        ];

        if word.len() > 5 {
            return None;
        }
        KEYWORDS
            .iter()
            .find(|(keyword, _)| keyword.eq_ignore_ascii_case(word))
            .map(|(_, token)| token.clone())
    }

    /// Short description used in error messages
    pub fn describe(&self) -> String {
        match self {
            Token::Integer(s) | Token::Decimal(s) | Token::Word(s) => (*s).to_string(),
            Token::String(s) => format!("'{s}'"),
            Token::Boolean(b) => b.to_string(),
            Token::Null => "null".into(),
            Token::NoOp => "_".into(),
            Token::Simple { kind, content } => format!("{}{{{content}}}", kind.marker()),
            Token::Plus => "+".into(),
            Token::Minus => "-".into(),
            Token::Multiply => "*".into(),
            Token::Divide => "/".into(),
            Token::Remainder => "%".into(),
            Token::Equal => "==".into(),
            Token::NotEqual => "!=".into(),
            Token::LessThan => "<".into(),
            Token::LessThanOrEqual => "<=".into(),
            Token::GreaterThan => ">".into(),
            Token::GreaterThanOrEqual => ">=".into(),
            Token::And => "and".into(),
            Token::Or => "or".into(),
            Token::Not => "!".into(),
            Token::Question => "?".into(),
            Token::Elvis => "?:".into(),
            Token::Colon => ":".into(),
            Token::LeftParen => "(".into(),
            Token::RightParen => ")".into(),
            Token::Comma => ",".into(),
            Token::Assign => "=".into(),
            Token::Dot => ".".into(),
            Token::LeftBracket => "[".into(),
            Token::RightBracket => "]".into(),
        }
    }
}

/// Word characters shared by both modes
static WORD_CHAR_TABLE: [bool; 256] = {
    let mut table = [false; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = matches!(i as u8, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_');
        i += 1;
    }
    table
};

/// Word start characters
static WORD_START_TABLE: [bool; 256] = {
    let mut table = [false; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = matches!(i as u8, b'A'..=b'Z' | b'a'..=b'z' | b'_');
        i += 1;
    }
    table
};

/// Tokenizer over a single expression text
pub struct Tokenizer<'input> {
    input: &'input str,
    bytes: &'input [u8],
    pos: usize,
    end: usize,
    mode: TokenizerMode,
}

impl<'input> Tokenizer<'input> {
    /// Create a standard-mode tokenizer
    pub fn new(input: &'input str) -> Self {
        Self::with_mode(input, TokenizerMode::Standard)
    }

    /// Create a tokenizer in the given mode
    pub fn with_mode(input: &'input str, mode: TokenizerMode) -> Self {
        let bytes = input.as_bytes();
        Self {
            input,
            bytes,
            pos: 0,
            end: bytes.len(),
            mode,
        }
    }

    /// Current byte offset
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Tokenizer mode
    pub fn mode(&self) -> TokenizerMode {
        self.mode
    }

    #[inline]
    fn peek_byte(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    #[inline]
    fn slice(&self, start: usize, end: usize) -> &'input str {
        &self.input[start..end]
    }

    /// Character starting at `pos`, for non-ASCII classification
    fn char_at(&self, pos: usize) -> Option<char> {
        self.input.get(pos..).and_then(|rest| rest.chars().next())
    }

    fn is_word_start_at(&self, pos: usize) -> bool {
        match self.bytes.get(pos) {
            Some(&b) if b < 0x80 => WORD_START_TABLE[b as usize],
            Some(_) => self.char_at(pos).is_some_and(UnicodeXID::is_xid_start),
            None => false,
        }
    }

    fn is_word_char_at(&self, pos: usize) -> bool {
        match self.bytes.get(pos) {
            Some(&b) if b < 0x80 => WORD_CHAR_TABLE[b as usize],
            Some(_) => self.char_at(pos).is_some_and(UnicodeXID::is_xid_continue),
            None => false,
        }
    }

    /// Width in bytes of the character at `pos`
    fn char_width_at(&self, pos: usize) -> usize {
        self.char_at(pos).map_or(1, char::len_utf8)
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.end {
            match self.bytes[self.pos] {
                b' ' | b'\t' | b'\r' | b'\n' => self.pos += 1,
                _ => break,
            }
        }
    }

    /// Scan a generic token starting at `start`
    fn scan_generic_token(&mut self, start: usize) -> &'input str {
        let mut pos = start;
        while pos < self.end {
            let b = self.bytes[pos];
            if self.is_word_char_at(pos) || b == b'.' {
                pos += self.char_width_at(pos);
            } else if (b == b'-' || b == b'/')
                && pos > start
                && self.is_word_char_at(pos - 1)
                && self.is_word_start_at(pos + 1)
            {
                pos += 1;
            } else {
                break;
            }
        }
        self.pos = pos;
        self.slice(start, pos)
    }

    /// Scan an identifier starting at `start` (navigation mode)
    fn scan_identifier(&mut self, start: usize) -> &'input str {
        let mut pos = start;
        while pos < self.end && self.is_word_char_at(pos) {
            pos += self.char_width_at(pos);
        }
        self.pos = pos;
        self.slice(start, pos)
    }

    fn scan_digits(&self, mut pos: usize) -> usize {
        while pos < self.end && self.bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        pos
    }

    /// Scan a number; in standard mode a number running into word
    /// characters becomes a generic token (`3rd`)
    fn scan_number(&mut self, start: usize) -> Token<'input> {
        let mut pos = self.scan_digits(start);
        let mut decimal = false;

        if pos + 1 < self.end && self.bytes[pos] == b'.' && self.bytes[pos + 1].is_ascii_digit() {
            pos = self.scan_digits(pos + 1);
            decimal = true;
        }

        if pos < self.end && matches!(self.bytes[pos], b'e' | b'E') {
            let mut exp = pos + 1;
            if exp < self.end && matches!(self.bytes[exp], b'+' | b'-') {
                exp += 1;
            }
            if exp < self.end && self.bytes[exp].is_ascii_digit() {
                pos = self.scan_digits(exp);
                decimal = true;
            }
        }

        if self.mode == TokenizerMode::Standard
            && pos < self.end
            && (self.is_word_char_at(pos) || self.bytes[pos] == b'.')
        {
            return Token::Word(self.scan_generic_token(start));
        }

        self.pos = pos;
        let text = self.slice(start, pos);
        if decimal {
            Token::Decimal(text)
        } else {
            Token::Integer(text)
        }
    }

    /// Scan a quoted literal; returns the raw content
    fn scan_string_literal(&mut self) -> ParseResult<&'input str> {
        let quote = self.pos;
        self.pos += 1;
        let start = self.pos;

        while self.pos < self.end {
            match self.bytes[self.pos] {
                b'\'' => {
                    let content = self.slice(start, self.pos);
                    self.pos += 1;
                    return Ok(content);
                }
                b'\\' => {
                    self.pos += if self.pos + 1 < self.end { 2 } else { 1 };
                }
                _ => self.pos += 1,
            }
        }

        Err(ParseError::UnclosedString { position: quote })
    }

    /// Scan `X{...}` honoring nested braces and quoted literals
    fn scan_simple_expression(&mut self, kind: SimpleExpressionKind) -> ParseResult<Token<'input>> {
        let marker = self.pos;
        let content_start = marker + 2;
        let mut pos = content_start;
        let mut depth = 1usize;
        let mut in_literal = false;

        while pos < self.end {
            let b = self.bytes[pos];
            if in_literal {
                match b {
                    b'\\' => pos += 1,
                    b'\'' => in_literal = false,
                    _ => {}
                }
            } else {
                match b {
                    b'\'' => in_literal = true,
                    b'{' => depth += 1,
                    b'}' => {
                        depth -= 1;
                        if depth == 0 {
                            self.pos = pos + 1;
                            return Ok(Token::Simple {
                                kind,
                                content: self.slice(content_start, pos),
                            });
                        }
                    }
                    _ => {}
                }
            }
            pos += 1;
        }

        Err(ParseError::UnclosedExpression {
            marker: kind.marker(),
            position: marker,
        })
    }

    fn unexpected(&self, start: usize) -> ParseError {
        let width = self.char_width_at(start);
        ParseError::UnexpectedToken {
            token: self.slice(start, (start + width).min(self.end)).to_string(),
            position: start,
        }
    }

    /// Next token with its span, `None` at end of input
    pub fn next_token(&mut self) -> ParseResult<Option<SpannedToken<'input>>> {
        self.skip_whitespace();

        if self.pos >= self.end {
            return Ok(None);
        }

        let start = self.pos;
        let byte = self.bytes[start];
        let next = self.peek_byte(1);
        let navigation = self.mode == TokenizerMode::Navigation;

        let token = match byte {
            b'(' => self.single(Token::LeftParen),
            b')' => self.single(Token::RightParen),
            b',' => self.single(Token::Comma),
            b'+' => self.single(Token::Plus),
            b'-' => self.single(Token::Minus),
            b'/' => self.single(Token::Divide),
            b'%' => self.single(Token::Remainder),
            b':' => self.single(Token::Colon),
            b'.' if navigation => self.single(Token::Dot),
            b'[' if navigation => self.single(Token::LeftBracket),
            b']' if navigation => self.single(Token::RightBracket),
            b'=' => self.one_or_two(next == Some(b'='), Token::Equal, Token::Assign),
            b'!' => self.one_or_two(next == Some(b'='), Token::NotEqual, Token::Not),
            b'<' => self.one_or_two(next == Some(b'='), Token::LessThanOrEqual, Token::LessThan),
            b'>' => self.one_or_two(
                next == Some(b'='),
                Token::GreaterThanOrEqual,
                Token::GreaterThan,
            ),
            b'?' => self.one_or_two(next == Some(b':'), Token::Elvis, Token::Question),
            b'&' if next == Some(b'&') => {
                self.pos += 2;
                Token::And
            }
            b'|' if next == Some(b'|') => {
                self.pos += 2;
                Token::Or
            }
            b'*' if next != Some(b'{') => self.single(Token::Multiply),
            b'#' if navigation && self.is_word_start_at(start + 1) => {
                self.scan_identifier(start + 1);
                Token::Word(self.slice(start, self.pos))
            }
            b'$' | b'*' | b'#' | b'@' | b'~' if next == Some(b'{') => {
                match SimpleExpressionKind::from_marker(byte) {
                    Some(kind) => self.scan_simple_expression(kind)?,
                    None => return Err(self.unexpected(start)),
                }
            }
            b'\'' => Token::String(self.scan_string_literal()?),
            b'0'..=b'9' => self.scan_number(start),
            _ if self.is_word_start_at(start) => {
                let word = if navigation {
                    self.scan_identifier(start)
                } else {
                    self.scan_generic_token(start)
                };
                if !navigation && word == "_" {
                    Token::NoOp
                } else {
                    Token::from_keyword(word).unwrap_or(Token::Word(word))
                }
            }
            _ => return Err(self.unexpected(start)),
        };

        Ok(Some(SpannedToken {
            token,
            start,
            end: self.pos,
        }))
    }

    #[inline]
    fn single(&mut self, token: Token<'input>) -> Token<'input> {
        self.pos += 1;
        token
    }

    #[inline]
    fn one_or_two(&mut self, two: bool, long: Token<'input>, short: Token<'input>) -> Token<'input> {
        if two {
            self.pos += 2;
            long
        } else {
            self.pos += 1;
            short
        }
    }

    /// Tokenize the remaining input
    pub fn tokenize_all(&mut self) -> ParseResult<Vec<SpannedToken<'input>>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }
}

/// Tokenize a whole standard-mode expression
pub fn tokenize(input: &str) -> ParseResult<Vec<SpannedToken<'_>>> {
    Tokenizer::new(input).tokenize_all()
}
