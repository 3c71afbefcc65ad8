//! The raw JSON token contract consumed by the event cursor.
//!
//! The cursor never touches bytes itself; it pulls tokens through
//! [`TokenSource`], a gson-`JsonReader`-shaped interface with one-token
//! lookahead. The crate ships [`crate::JsonTokenReader`] as the default
//! implementation, but anything that can answer `peek` plus the typed
//! `next_*` calls (a network decoder, a test stub) will do.

use core::fmt;

use crate::error::SourceError;

/// The kind of the next raw token in a JSON stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `{`
    BeginObject,
    /// `}`
    EndObject,
    /// `[`
    BeginArray,
    /// `]`
    EndArray,
    /// A member name inside an object, before its `:`.
    MemberName,
    /// A JSON string value.
    String,
    /// A JSON number value.
    Number,
    /// `true` or `false`.
    Boolean,
    /// `null`.
    Null,
    /// The input is exhausted after a complete root value.
    EndDocument,
}

impl TokenKind {
    /// Scalar tokens are the ones that can appear as leaf element values.
    #[must_use]
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            TokenKind::String | TokenKind::Number | TokenKind::Boolean | TokenKind::Null
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::BeginObject => "begin-object",
            TokenKind::EndObject => "end-object",
            TokenKind::BeginArray => "begin-array",
            TokenKind::EndArray => "end-array",
            TokenKind::MemberName => "member name",
            TokenKind::String => "string",
            TokenKind::Number => "number",
            TokenKind::Boolean => "boolean",
            TokenKind::Null => "null",
            TokenKind::EndDocument => "end of document",
        };
        f.write_str(name)
    }
}

/// A pull cursor over raw JSON tokens.
///
/// Every method may fail with [`SourceError`] on malformed input or a
/// premature end of stream. `peek` must be idempotent: calling it repeatedly
/// without an intervening `next_*`/`begin_*`/`end_*` call returns the same
/// kind and consumes nothing (structural separators excepted).
pub trait TokenSource {
    /// Reports the kind of the next token without consuming it.
    fn peek(&mut self) -> Result<TokenKind, SourceError>;

    /// Consumes a `{`.
    fn begin_object(&mut self) -> Result<(), SourceError>;

    /// Consumes a `}`.
    fn end_object(&mut self) -> Result<(), SourceError>;

    /// Consumes a `[`.
    fn begin_array(&mut self) -> Result<(), SourceError>;

    /// Consumes a `]`.
    fn end_array(&mut self) -> Result<(), SourceError>;

    /// Consumes a member name and returns it decoded.
    fn next_name(&mut self) -> Result<String, SourceError>;

    /// Consumes a string value and returns it decoded.
    fn next_string(&mut self) -> Result<String, SourceError>;

    /// Consumes a number value, reading it as an integer.
    fn next_i64(&mut self) -> Result<i64, SourceError>;

    /// Consumes a number value, reading it as a floating point number.
    fn next_f64(&mut self) -> Result<f64, SourceError>;

    /// Consumes a `true` or `false` value.
    fn next_bool(&mut self) -> Result<bool, SourceError>;

    /// Consumes a `null` value.
    fn next_null(&mut self) -> Result<(), SourceError>;
}
