//! Error types for the tokenizer.
//!
//! Errors are per-token and non-fatal to the tokenizer itself: a failed scan
//! only poisons the lookahead slot it was destined for. Callers that want to
//! continue after an error should re-seek with
//! [`Tokenizer::set_position`](crate::Tokenizer::set_position).
//!
//! Running out of input is never an error: an exhausted tokenizer keeps
//! yielding `Eof` tokens.

/// Result type alias for tokenizer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while scanning a token.
///
/// The variants cover malformed lexemes only; end of input is reported
/// through the `Eof` token kind instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A name contained `#` not followed by two hex digits
    #[error("corrupted name object")]
    NameHexInvalid,

    /// A single `>` was encountered outside of a `>>` pair
    #[error("'>' not expected")]
    DictCloseExpected,

    /// Non-hex, non-whitespace byte inside a `< ... >` literal
    #[error("invalid hex char {0}")]
    HexCharInvalid(u8),

    /// End of input inside a `( ... )` literal
    #[error("error reading string: unexpected EOF")]
    StringUnterminated,

    /// `RD` or `-|` encountered without a preceding integer token
    #[error("expected INTEGER before -| or RD")]
    CharStringLeaderMissing,

    /// The integer preceding `RD` / `-|` failed numeric parsing
    #[error("invalid charstring length: {0}")]
    CharStringLengthInvalid(String),

    /// A token value could not be interpreted as a number
    #[error("invalid number {0:?}")]
    NumberInvalid(String),
}
