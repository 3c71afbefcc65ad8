//! Error taxonomy for the transcoder.
//!
//! Two layers: [`SourceError`] is produced by the raw token source and wraps
//! a syntax-level failure with its position; [`TranscodeError`] is everything
//! the transcoder itself can report, including wrapped source errors. None of
//! these are retried internally: the transcoder is single-shot per message
//! and any error terminates that message.

use thiserror::Error;

use crate::{event::EventKind, token::TokenKind};

/// A syntax-level failure in the raw JSON text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Syntax {
    #[error("invalid character '{0}'")]
    InvalidCharacter(char),
    #[error("invalid escape character '{0}'")]
    InvalidEscape(char),
    #[error("invalid unicode escape sequence \\u{0:04X}")]
    InvalidUnicodeEscape(u32),
    #[error("unexpected end of input")]
    UnexpectedEndOfInput,
    #[error("{0}")]
    Grammar(&'static str),
}

/// A tokenizer failure, positioned at a 1-based line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{kind} at {line}:{column}")]
pub struct SourceError {
    pub kind: Syntax,
    pub line: usize,
    pub column: usize,
}

/// Everything that can go wrong while transcoding one message.
///
/// `TokenSource`, `SchemaMismatch` and `TypeMismatch` describe bad input;
/// `UnexpectedToken` describes a structurally invalid token sequence and is
/// kept distinct so callers can tell malformed input from a broken bridge.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TranscodeError {
    /// The underlying tokenizer failed; the JSON text is malformed or
    /// truncated.
    #[error("error in json token stream: {0}")]
    TokenSource(#[from] SourceError),

    /// An incoming member name has no candidate at the current nesting
    /// level, even after one full wrap of the active pool.
    #[error("json message is not valid: '{name}' does not exist in schema")]
    SchemaMismatch { name: String },

    /// A leaf value's JSON kind is incompatible with the schema-declared
    /// type.
    #[error("value type mismatch for '{name}': expected {expected}, found {found}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: TokenKind,
    },

    /// The raw token stream violates well-formed JSON nesting at a point the
    /// tokenizer cannot see (for example a second root object, or a scalar
    /// where only an object item may appear).
    #[error("unexpected {found} token, expected {expected}")]
    UnexpectedToken {
        found: TokenKind,
        expected: &'static str,
    },

    /// `next_event` was called after the end-of-document event.
    #[error("there is no next event")]
    NoMoreEvents,

    /// A query was made that is not valid for the current event kind.
    #[error("{operation} is not valid while the current event is {event}")]
    IllegalState {
        operation: &'static str,
        event: EventKind,
    },

    /// An operation outside the synthesized-event contract (attributes,
    /// processing instructions, ...).
    #[error("{operation} is not supported by the json to xml bridge")]
    Unsupported { operation: &'static str },
}
