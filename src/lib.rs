//! # Token Oxide
//!
//! Low-level tokenizer for PostScript, PDF and Type1 font files.
//!
//! This crate implements the lowest level of processing of PS/PDF byte
//! streams: splitting raw input into typed tokens. It is meant to sit under
//! an object parser that combines tokens into dictionaries, arrays and
//! indirect references, and that handles stream bodies out of band.
//!
//! ## Features
//!
//! - **Full lexical grammar**: numbers (including PS radix and exponent
//!   forms), literal strings with escapes and balanced nesting, hex
//!   strings, names with `#HH` escapes, array/dictionary/procedure
//!   delimiters, operator words, comments
//! - **Type1 font support**: length-prefixed binary CharStrings introduced
//!   by `RD` or `-|`
//! - **Two-token lookahead**: recognize an indirect-reference head
//!   (`obj gen R`) without rewinding
//! - **Binary payload safety**: scanning stops at the `stream` and `ID`
//!   keywords instead of walking into arbitrary bytes
//! - **Pull sources**: tokenize from any [`std::io::Read`] without knowing
//!   the input length, buffering on demand
//!
//! ## Quick Start
//!
//! ```
//! use token_oxide::{Kind, Tokenizer};
//!
//! let mut tk = Tokenizer::new(b"<< /Type /Page /Count 3 >>");
//!
//! let token = tk.next_token().unwrap();
//! assert_eq!(token.kind, Kind::StartDic);
//!
//! let name = tk.next_token().unwrap();
//! assert_eq!(name.kind, Kind::Name);
//! assert_eq!(name.value, b"Type");
//! ```
//!
//! Collecting a whole input at once:
//!
//! ```
//! use token_oxide::{tokenize, Kind};
//!
//! let tokens = tokenize(b"8#17 (some text) /Key").unwrap();
//! assert_eq!(tokens.len(), 3);
//! assert_eq!(tokens[0].kind, Kind::Integer);
//! assert_eq!(tokens[0].value, b"15"); // radix form, already in decimal
//! ```
//!
//! ## License
//!
//! Licensed under either of Apache License, Version 2.0 or MIT license, at
//! your option.

#![warn(missing_docs)]

// Error handling
pub mod error;

// Core tokenization
pub mod classify;
pub mod options;
mod source;
pub mod token;
pub mod tokenizer;

// Re-exports
pub use classify::{hex_value, is_ascii_whitespace};
pub use error::{Error, Result};
pub use options::TokenizerOptions;
pub use token::{Kind, Token};
pub use tokenizer::{tokenize, Tokenizer};

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        // VERSION is populated from CARGO_PKG_VERSION at compile time
        assert!(VERSION.starts_with("0."));
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "token_oxide");
    }
}
