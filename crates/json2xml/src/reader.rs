//! A pull tokenizer over a complete JSON text.
//!
//! This is the crate's default [`TokenSource`]: single pass, one-token
//! lookahead, strict JSON grammar. Structural separators (`,` and `:`) are
//! consumed during `peek` based on a scope stack, so by the time a token kind
//! is reported the cursor sits on the token's first character. Positions are
//! tracked as 1-based line/column and attached to every error.
//!
//! The tokenizer knows nothing about schemas or XML; it only answers "what
//! comes next" and decodes the token it is asked for.

use crate::{
    error::{SourceError, Syntax},
    token::{TokenKind, TokenSource},
};

/// Where the reader currently is inside the document's nesting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    /// Before the root value.
    EmptyDocument,
    /// After the root value; only end-of-input may follow.
    NonemptyDocument,
    /// Right after `{`: a member name or `}` follows.
    EmptyObject,
    /// A member name was read: `:` and a value follow.
    DanglingName,
    /// A member value finished: `,` plus a name, or `}`, follows.
    NonemptyObject,
    /// Right after `[`: a value or `]` follows.
    EmptyArray,
    /// An element finished: `,` plus a value, or `]`, follows.
    NonemptyArray,
}

/// Pull cursor over the raw tokens of one JSON document.
#[derive(Debug)]
pub struct JsonTokenReader<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    column: usize,
    scopes: Vec<Scope>,
    peeked: Option<TokenKind>,
}

impl<'a> JsonTokenReader<'a> {
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            column: 1,
            scopes: vec![Scope::EmptyDocument],
            peeked: None,
        }
    }

    /// Reports the kind of the next token without consuming it.
    ///
    /// # Errors
    ///
    /// Fails on malformed input or a premature end of the text.
    pub fn peek(&mut self) -> Result<TokenKind, SourceError> {
        if let Some(kind) = self.peeked {
            return Ok(kind);
        }
        let kind = self.do_peek()?;
        self.peeked = Some(kind);
        Ok(kind)
    }

    /// Consumes a `{` and descends into the object.
    pub fn begin_object(&mut self) -> Result<(), SourceError> {
        self.take(TokenKind::BeginObject, "expected begin-object")?;
        self.bump();
        self.begin_value();
        self.scopes.push(Scope::EmptyObject);
        Ok(())
    }

    /// Consumes a `}` and leaves the object.
    pub fn end_object(&mut self) -> Result<(), SourceError> {
        self.take(TokenKind::EndObject, "expected end-object")?;
        self.bump();
        self.scopes.pop();
        Ok(())
    }

    /// Consumes a `[` and descends into the array.
    pub fn begin_array(&mut self) -> Result<(), SourceError> {
        self.take(TokenKind::BeginArray, "expected begin-array")?;
        self.bump();
        self.begin_value();
        self.scopes.push(Scope::EmptyArray);
        Ok(())
    }

    /// Consumes a `]` and leaves the array.
    pub fn end_array(&mut self) -> Result<(), SourceError> {
        self.take(TokenKind::EndArray, "expected end-array")?;
        self.bump();
        self.scopes.pop();
        Ok(())
    }

    /// Consumes and decodes a member name.
    pub fn next_name(&mut self) -> Result<String, SourceError> {
        self.take(TokenKind::MemberName, "expected a member name")?;
        let name = self.parse_string()?;
        self.set_top(Scope::DanglingName);
        Ok(name)
    }

    /// Consumes and decodes a string value.
    pub fn next_string(&mut self) -> Result<String, SourceError> {
        self.take(TokenKind::String, "expected a string value")?;
        let value = self.parse_string()?;
        self.begin_value();
        Ok(value)
    }

    /// Consumes a number value through the integer reader.
    ///
    /// Integral literals written with a fraction or exponent (`1.0`, `1e2`)
    /// are accepted; anything with a fractional part is not.
    pub fn next_i64(&mut self) -> Result<i64, SourceError> {
        self.take(TokenKind::Number, "expected a number value")?;
        let lexeme = self.scan_number()?;
        let value = if let Ok(value) = lexeme.parse::<i64>() {
            value
        } else {
            let wide: f64 = lexeme
                .parse()
                .map_err(|_| self.err(Syntax::Grammar("invalid number literal")))?;
            if wide.fract() != 0.0 {
                return Err(self.err(Syntax::Grammar("number is not a valid integer")));
            }
            let Some(narrowed) = integral_f64_to_i64(wide) else {
                return Err(self.err(Syntax::Grammar("number is not a valid integer")));
            };
            narrowed
        };
        self.begin_value();
        Ok(value)
    }

    /// Consumes a number value through the floating point reader.
    pub fn next_f64(&mut self) -> Result<f64, SourceError> {
        self.take(TokenKind::Number, "expected a number value")?;
        let lexeme = self.scan_number()?;
        let value: f64 = lexeme
            .parse()
            .map_err(|_| self.err(Syntax::Grammar("invalid number literal")))?;
        self.begin_value();
        Ok(value)
    }

    /// Consumes a `true` or `false` literal.
    pub fn next_bool(&mut self) -> Result<bool, SourceError> {
        self.take(TokenKind::Boolean, "expected a boolean value")?;
        let value = if self.eat_literal("true") {
            true
        } else if self.eat_literal("false") {
            false
        } else {
            return Err(self.err(Syntax::Grammar("invalid literal")));
        };
        self.begin_value();
        Ok(value)
    }

    /// Consumes a `null` literal.
    pub fn next_null(&mut self) -> Result<(), SourceError> {
        self.take(TokenKind::Null, "expected a null value")?;
        if !self.eat_literal("null") {
            return Err(self.err(Syntax::Grammar("invalid literal")));
        }
        self.begin_value();
        Ok(())
    }

    // ── peeking ─────────────────────────────────────────────────────────

    fn do_peek(&mut self) -> Result<TokenKind, SourceError> {
        match self.top() {
            Scope::EmptyDocument => {
                self.skip_whitespace();
                self.value_kind()
            }
            Scope::NonemptyDocument => {
                self.skip_whitespace();
                if self.peek_char().is_none() {
                    Ok(TokenKind::EndDocument)
                } else {
                    Err(self.err(Syntax::Grammar(
                        "unexpected trailing characters after the root value",
                    )))
                }
            }
            Scope::EmptyObject => {
                self.skip_whitespace();
                match self.peek_char() {
                    None => Err(self.err(Syntax::UnexpectedEndOfInput)),
                    Some('}') => Ok(TokenKind::EndObject),
                    Some('"') => Ok(TokenKind::MemberName),
                    Some(c) => Err(self.err(Syntax::InvalidCharacter(c))),
                }
            }
            Scope::NonemptyObject => {
                self.skip_whitespace();
                match self.peek_char() {
                    None => Err(self.err(Syntax::UnexpectedEndOfInput)),
                    Some('}') => Ok(TokenKind::EndObject),
                    Some(',') => {
                        self.bump();
                        self.skip_whitespace();
                        match self.peek_char() {
                            None => Err(self.err(Syntax::UnexpectedEndOfInput)),
                            Some('"') => Ok(TokenKind::MemberName),
                            Some(c) => Err(self.err(Syntax::InvalidCharacter(c))),
                        }
                    }
                    Some(c) => Err(self.err(Syntax::InvalidCharacter(c))),
                }
            }
            Scope::DanglingName => {
                self.skip_whitespace();
                match self.peek_char() {
                    None => Err(self.err(Syntax::UnexpectedEndOfInput)),
                    Some(':') => {
                        self.bump();
                        self.skip_whitespace();
                        self.value_kind()
                    }
                    Some(c) => Err(self.err(Syntax::InvalidCharacter(c))),
                }
            }
            Scope::EmptyArray => {
                self.skip_whitespace();
                if self.peek_char() == Some(']') {
                    Ok(TokenKind::EndArray)
                } else {
                    self.value_kind()
                }
            }
            Scope::NonemptyArray => {
                self.skip_whitespace();
                match self.peek_char() {
                    None => Err(self.err(Syntax::UnexpectedEndOfInput)),
                    Some(']') => Ok(TokenKind::EndArray),
                    Some(',') => {
                        self.bump();
                        self.skip_whitespace();
                        self.value_kind()
                    }
                    Some(c) => Err(self.err(Syntax::InvalidCharacter(c))),
                }
            }
        }
    }

    fn value_kind(&self) -> Result<TokenKind, SourceError> {
        match self.peek_char() {
            None => Err(self.err(Syntax::UnexpectedEndOfInput)),
            Some('{') => Ok(TokenKind::BeginObject),
            Some('[') => Ok(TokenKind::BeginArray),
            Some('"') => Ok(TokenKind::String),
            Some('t' | 'f') => Ok(TokenKind::Boolean),
            Some('n') => Ok(TokenKind::Null),
            Some(c) if c == '-' || c.is_ascii_digit() => Ok(TokenKind::Number),
            Some(c) => Err(self.err(Syntax::InvalidCharacter(c))),
        }
    }

    fn take(&mut self, want: TokenKind, expectation: &'static str) -> Result<(), SourceError> {
        if self.peek()? != want {
            return Err(self.err(Syntax::Grammar(expectation)));
        }
        self.peeked = None;
        Ok(())
    }

    // ── scope bookkeeping ───────────────────────────────────────────────

    fn top(&self) -> Scope {
        self.scopes.last().copied().unwrap_or(Scope::NonemptyDocument)
    }

    fn set_top(&mut self, scope: Scope) {
        if let Some(top) = self.scopes.last_mut() {
            *top = scope;
        }
    }

    /// Marks the enclosing scope as having produced a value. Called when a
    /// value token (or the `{`/`[` opening one) is consumed.
    fn begin_value(&mut self) {
        let next = match self.top() {
            Scope::EmptyDocument => Scope::NonemptyDocument,
            Scope::DanglingName => Scope::NonemptyObject,
            Scope::EmptyArray | Scope::NonemptyArray => Scope::NonemptyArray,
            other => other,
        };
        self.set_top(next);
    }

    // ── character level ─────────────────────────────────────────────────

    fn err(&self, kind: Syntax) -> SourceError {
        SourceError {
            kind,
            line: self.line,
            column: self.column,
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek_char(), Some(' ' | '\t' | '\n' | '\r')) {
            self.bump();
        }
    }

    // ── token decoding ──────────────────────────────────────────────────

    fn parse_string(&mut self) -> Result<String, SourceError> {
        self.bump(); // opening quote
        let mut out = String::new();
        loop {
            let Some(c) = self.bump() else {
                return Err(self.err(Syntax::UnexpectedEndOfInput));
            };
            match c {
                '"' => return Ok(out),
                '\\' => out.push(self.parse_escape()?),
                c if (c as u32) < 0x20 => return Err(self.err(Syntax::InvalidCharacter(c))),
                c => out.push(c),
            }
        }
    }

    fn parse_escape(&mut self) -> Result<char, SourceError> {
        let Some(c) = self.bump() else {
            return Err(self.err(Syntax::UnexpectedEndOfInput));
        };
        Ok(match c {
            '"' => '"',
            '\\' => '\\',
            '/' => '/',
            'b' => '\u{0008}',
            'f' => '\u{000C}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'u' => self.parse_unicode_escape()?,
            other => return Err(self.err(Syntax::InvalidEscape(other))),
        })
    }

    fn parse_unicode_escape(&mut self) -> Result<char, SourceError> {
        let high = self.hex4()?;
        if (0xD800..=0xDBFF).contains(&high) {
            // High surrogate: the paired low surrogate must follow.
            if self.bump() != Some('\\') || self.bump() != Some('u') {
                return Err(self.err(Syntax::InvalidUnicodeEscape(high)));
            }
            let low = self.hex4()?;
            if !(0xDC00..=0xDFFF).contains(&low) {
                return Err(self.err(Syntax::InvalidUnicodeEscape(low)));
            }
            let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
            char::from_u32(code).ok_or_else(|| self.err(Syntax::InvalidUnicodeEscape(code)))
        } else {
            char::from_u32(high).ok_or_else(|| self.err(Syntax::InvalidUnicodeEscape(high)))
        }
    }

    fn hex4(&mut self) -> Result<u32, SourceError> {
        let mut code = 0u32;
        for _ in 0..4 {
            let Some(c) = self.bump() else {
                return Err(self.err(Syntax::UnexpectedEndOfInput));
            };
            let digit = c
                .to_digit(16)
                .ok_or_else(|| self.err(Syntax::InvalidEscape(c)))?;
            code = (code << 4) | digit;
        }
        Ok(code)
    }

    fn scan_number(&mut self) -> Result<&'a str, SourceError> {
        let start = self.pos;
        if self.peek_char() == Some('-') {
            self.bump();
        }
        match self.peek_char() {
            None => return Err(self.err(Syntax::UnexpectedEndOfInput)),
            Some('0') => {
                self.bump();
            }
            Some(c) if c.is_ascii_digit() => {
                self.eat_digits();
            }
            Some(c) => return Err(self.err(Syntax::InvalidCharacter(c))),
        }
        if self.peek_char() == Some('.') {
            self.bump();
            self.require_digit()?;
            self.eat_digits();
        }
        if matches!(self.peek_char(), Some('e' | 'E')) {
            self.bump();
            if matches!(self.peek_char(), Some('+' | '-')) {
                self.bump();
            }
            self.require_digit()?;
            self.eat_digits();
        }
        match self.peek_char() {
            None | Some(',' | '}' | ']' | ' ' | '\t' | '\n' | '\r') => {
                Ok(&self.input[start..self.pos])
            }
            Some(c) => Err(self.err(Syntax::InvalidCharacter(c))),
        }
    }

    fn eat_digits(&mut self) {
        while matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
    }

    fn require_digit(&mut self) -> Result<(), SourceError> {
        match self.peek_char() {
            Some(c) if c.is_ascii_digit() => Ok(()),
            Some(c) => Err(self.err(Syntax::InvalidCharacter(c))),
            None => Err(self.err(Syntax::UnexpectedEndOfInput)),
        }
    }

    fn eat_literal(&mut self, word: &str) -> bool {
        let rest = &self.input[self.pos..];
        if !rest.starts_with(word) {
            return false;
        }
        let boundary = rest[word.len()..].chars().next();
        if !matches!(boundary, None | Some(',' | '}' | ']' | ' ' | '\t' | '\n' | '\r')) {
            return false;
        }
        for _ in 0..word.len() {
            self.bump();
        }
        true
    }
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn integral_f64_to_i64(value: f64) -> Option<i64> {
    if value >= i64::MIN as f64 && value <= i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

impl TokenSource for JsonTokenReader<'_> {
    fn peek(&mut self) -> Result<TokenKind, SourceError> {
        JsonTokenReader::peek(self)
    }

    fn begin_object(&mut self) -> Result<(), SourceError> {
        JsonTokenReader::begin_object(self)
    }

    fn end_object(&mut self) -> Result<(), SourceError> {
        JsonTokenReader::end_object(self)
    }

    fn begin_array(&mut self) -> Result<(), SourceError> {
        JsonTokenReader::begin_array(self)
    }

    fn end_array(&mut self) -> Result<(), SourceError> {
        JsonTokenReader::end_array(self)
    }

    fn next_name(&mut self) -> Result<String, SourceError> {
        JsonTokenReader::next_name(self)
    }

    fn next_string(&mut self) -> Result<String, SourceError> {
        JsonTokenReader::next_string(self)
    }

    fn next_i64(&mut self) -> Result<i64, SourceError> {
        JsonTokenReader::next_i64(self)
    }

    fn next_f64(&mut self) -> Result<f64, SourceError> {
        JsonTokenReader::next_f64(self)
    }

    fn next_bool(&mut self) -> Result<bool, SourceError> {
        JsonTokenReader::next_bool(self)
    }

    fn next_null(&mut self) -> Result<(), SourceError> {
        JsonTokenReader::next_null(self)
    }
}
