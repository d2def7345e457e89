//! PS/PDF tokenizer core.
//!
//! This module implements the lowest level of processing of PostScript,
//! PDF and Type1 font files: splitting raw bytes into typed tokens.
//! Higher layers combine tokens into objects, resolve references and
//! extract stream bodies.
//!
//! # Dispatch overview
//!
//! After skipping whitespace, the first byte of a lexeme selects a branch:
//! - `[` `]` `{` `}` — structural tokens, no value
//! - `/` — name, with `#HH` escapes validated
//! - `<` — `<<` dictionary open, or a hex string
//! - `>` — must pair into `>>`
//! - `%` — comment, skipped entirely
//! - `(` — literal string with escapes and balanced nesting
//! - anything else — number if the number scanner accepts, operator word
//!   otherwise (with `RD` / `-|` triggering a CharString read)
//!
//! Whenever a lexeme is terminated by a delimiter, that delimiter is pushed
//! back so the next scan can see it.

use std::io::Read;

use crate::classify::{hex_value, is_ascii_whitespace, is_delimiter, is_eol};
use crate::error::{Error, Result};
use crate::options::TokenizerOptions;
use crate::source::ByteSource;
use crate::token::{Kind, Token};

/// Consumes the whole input, splitting it into tokens.
///
/// The terminating `Eof` token is not included. When performance matters,
/// prefer iterating with [`Tokenizer::next_token`].
///
/// # Errors
///
/// The first scan error aborts the collection.
pub fn tokenize(data: &[u8]) -> Result<Vec<Token>> {
    let mut tk = Tokenizer::new(data);
    let mut out = Vec::new();
    loop {
        let token = tk.next_token()?;
        if token.kind == Kind::Eof {
            return Ok(out);
        }
        out.push(token);
    }
}

/// A PS/PDF tokenizer.
///
/// It handles PostScript features like procedures and CharStrings; strict
/// PDF parsers should check for such tokens and report them as errors.
///
/// Comments are skipped and never surface in the token stream.
///
/// The tokenizer cannot handle stream contents or inline image data on its
/// own: scanning stops right after the introducing keyword (`stream` /
/// `ID`), and the caller is expected to skip over the payload with
/// [`Tokenizer::skip_bytes`] or [`Tokenizer::set_position`] before
/// resuming.
///
/// Two tokens of lookahead are maintained, because recognizing an
/// indirect-reference head (`obj gen R`) takes three tokens. [`Tokenizer::peek_token`]
/// and [`Tokenizer::peek_peek_token`] return cached values and are cheap.
///
/// Regarding exponential numbers: per 7.3.3 Numeric Objects, a conforming
/// PDF writer shall not use the PostScript radix (`16#FFFE`) or exponential
/// (`6.02E23`) forms. Files with exponents do occur in the wild, so the
/// number scanner accepts them anyway; there is no confusion with other
/// token types.
pub struct Tokenizer<'a> {
    source: ByteSource<'a>,

    // scratch buffer reused across number scans
    number_buf: Vec<u8>,

    // lookahead slots: a = +1 token, aa = +2 token
    a_token: Token,
    a_error: Option<Error>,
    aa_token: Token,
    aa_error: Option<Error>,

    // end of the most recently consumed token
    current_pos: usize,
    // end of the +1 token (the source cursor itself marks the end of +2)
    next_pos: usize,
}

impl<'a> Tokenizer<'a> {
    /// Returns a tokenizer working on the given input.
    ///
    /// The input is borrowed, not copied; token values are still
    /// independent copies.
    pub fn new(data: &'a [u8]) -> Self {
        let mut tk = Tokenizer::with_source(ByteSource::from_slice(data));
        tk.set_position(0);
        tk
    }

    /// Returns a tokenizer pulling its input from `src`, without knowing
    /// its length.
    ///
    /// Bytes are buffered internally as scanning proceeds. Read errors
    /// from the source are discarded: the buffer is simply not grown, and
    /// tokenization ends as if the input stopped there. See
    /// [`Tokenizer::set_position`], [`Tokenizer::skip_bytes`] and
    /// [`Tokenizer::bytes`] for the behavior of position queries in this
    /// mode.
    pub fn from_reader(src: impl Read + 'a) -> Self {
        Self::from_reader_with(src, TokenizerOptions::default())
    }

    /// Same as [`Tokenizer::from_reader`], with an explicit growth quantum.
    pub fn from_reader_with(src: impl Read + 'a, options: TokenizerOptions) -> Self {
        let source = ByteSource::from_reader(Box::new(src), options.chunk_size);
        let mut tk = Tokenizer::with_source(source);
        tk.set_position(0);
        tk
    }

    fn with_source(source: ByteSource<'a>) -> Self {
        Tokenizer {
            source,
            number_buf: Vec::new(),
            a_token: Token::default(),
            a_error: None,
            aa_token: Token::default(),
            aa_error: None,
            current_pos: 0,
            next_pos: 0,
        }
    }

    /// Rebinds the tokenizer to a new input, reusing internal buffers.
    pub fn reset(&mut self, data: &'a [u8]) {
        self.source.rebind_slice(data);
        self.set_position(0);
    }

    /// Rebinds the tokenizer to a new pull source, reusing internal
    /// buffers.
    pub fn reset_from_reader(&mut self, src: impl Read + 'a) {
        self.source.rebind_reader(Box::new(src));
        self.set_position(0);
    }

    /// Sets the position of the tokenizer in the input and re-primes both
    /// lookahead slots from there.
    ///
    /// Most of the time [`Tokenizer::next_token`] should be preferred; this
    /// method is for going back to a saved position, or for jumping over a
    /// binary payload. When using a pull source, no additional buffering is
    /// performed beyond what the two scans require.
    pub fn set_position(&mut self, pos: usize) {
        self.current_pos = pos;
        self.source.set_pos(pos);
        match self.scan_token(&Token::default()) {
            Ok(token) => {
                self.a_token = token;
                self.a_error = None;
            }
            Err(err) => {
                self.a_token = Token::default();
                self.a_error = Some(err);
            }
        }
        self.next_pos = self.source.pos();
        self.refill_second_slot();
    }

    /// Returns the next token without advancing. Cached, so very cheap.
    ///
    /// # Errors
    ///
    /// The error recorded when the +1 slot was scanned, if any.
    pub fn peek_token(&self) -> Result<&Token> {
        match &self.a_error {
            Some(err) => Err(err.clone()),
            None => Ok(&self.a_token),
        }
    }

    /// Returns the token after the next one without advancing. Cached, so
    /// very cheap.
    ///
    /// # Errors
    ///
    /// The error recorded when the +2 slot was scanned, if any.
    pub fn peek_peek_token(&self) -> Result<&Token> {
        match &self.aa_error {
            Some(err) => Err(err.clone()),
            None => Ok(&self.aa_token),
        }
    }

    /// True once the next token is `Eof`.
    pub fn is_eof(&self) -> bool {
        self.a_token.kind == Kind::Eof
    }

    /// Returns the next token and advances past it.
    ///
    /// Reaching the end of the input is not an error: `Eof` tokens are
    /// returned indefinitely.
    ///
    /// # Errors
    ///
    /// The error recorded for this token when it was scanned. The cursor
    /// never moves backward on error; callers that want to continue should
    /// re-seek with [`Tokenizer::set_position`].
    pub fn next_token(&mut self) -> Result<Token> {
        let out = match self.a_error.take() {
            Some(err) => Err(err),
            None => Ok(std::mem::take(&mut self.a_token)),
        };
        self.a_token = std::mem::take(&mut self.aa_token);
        self.a_error = self.aa_error.take();
        self.current_pos = self.next_pos;
        self.next_pos = self.source.pos();
        self.refill_second_slot();
        out
    }

    // Scans a fresh +2 token, except when the +1 token introduces a binary
    // payload (stream contents or inline image data). Walking into such
    // payloads would be useless and possibly costly, so the +2 slot is
    // pinned to Eof instead; the caller is expected to reposition.
    fn refill_second_slot(&mut self) {
        if self.a_error.is_none() && self.a_token.starts_binary() {
            log::trace!(
                "'{}' introduces a binary payload, pinning lookahead to EOF",
                String::from_utf8_lossy(&self.a_token.value)
            );
            self.aa_token = Token::default();
            self.aa_error = None;
            return;
        }
        let previous = std::mem::take(&mut self.a_token);
        match self.scan_token(&previous) {
            Ok(token) => {
                self.aa_token = token;
                self.aa_error = None;
            }
            Err(err) => {
                self.aa_token = Token::default();
                self.aa_error = Some(err);
            }
        }
        self.a_token = previous;
    }

    /// Returns the end of the most recently consumed token.
    ///
    /// This is the position "expected" by the caller; it may be saved and
    /// later restored with [`Tokenizer::set_position`].
    pub fn current_position(&self) -> usize {
        self.current_pos
    }

    /// Skips the next `n` bytes and returns a copy of them, e.g. to step
    /// over inline image data.
    ///
    /// If `n` runs past the buffered input it is truncated; no additional
    /// buffering is done.
    pub fn skip_bytes(&mut self, n: usize) -> Vec<u8> {
        let len = self.source.len();
        let start = self.current_pos.min(len);
        let target = start.saturating_add(n).min(len);
        let out = self.source.data()[start..target].to_vec();
        self.set_position(target);
        out
    }

    /// Returns the remaining buffered bytes, starting from the current
    /// position.
    ///
    /// When using a pull source, only what has been buffered so far is
    /// returned.
    pub fn bytes(&self) -> &[u8] {
        let data = self.source.data();
        if self.current_pos >= data.len() {
            &[]
        } else {
            &data[self.current_pos..]
        }
    }

    /// Checks whether an end-of-line marker occurs before the next token.
    pub fn has_eol_before_token(&self) -> bool {
        for &ch in self.source.data().iter().skip(self.current_pos) {
            if !is_ascii_whitespace(ch) {
                break;
            }
            if is_eol(ch) {
                return true;
            }
        }
        false
    }

    /// Returns the position of the first byte of a stream payload,
    /// assuming the `stream` keyword was just consumed.
    ///
    /// See 7.3.8.1: the keyword shall be followed by CR LF or a single LF,
    /// not by a bare CR. A bare CR is tolerated here but not advanced
    /// past on its own.
    pub fn stream_position(&mut self) -> usize {
        let mut pos = self.current_pos;
        if pos + 2 >= self.source.len() && self.source.has_reader() {
            self.source.grow(2);
        }
        let data = self.source.data();
        if pos < data.len() && data[pos] == b'\r' {
            pos += 1;
        }
        if pos < data.len() && data[pos] == b'\n' {
            return pos + 1;
        }
        pos
    }

    // Scans one token forward, advancing the source cursor. `previous` is
    // the token scanned just before this one; the CharString trigger needs
    // it for the payload length.
    fn scan_token(&mut self, previous: &Token) -> Result<Token> {
        loop {
            let mut ch = match self.source.read() {
                Some(c) => c,
                None => return Ok(Token::default()),
            };
            while is_ascii_whitespace(ch) {
                ch = match self.source.read() {
                    Some(c) => c,
                    None => return Ok(Token::default()),
                };
            }
            match ch {
                b'[' => return Ok(Token::bare(Kind::StartArray)),
                b']' => return Ok(Token::bare(Kind::EndArray)),
                b'{' => return Ok(Token::bare(Kind::StartProc)),
                b'}' => return Ok(Token::bare(Kind::EndProc)),
                b'/' => return self.scan_name(),
                b'>' => {
                    if self.source.read() != Some(b'>') {
                        return Err(Error::DictCloseExpected);
                    }
                    return Ok(Token::bare(Kind::EndDic));
                }
                b'<' => {
                    let next = self.source.read();
                    if next == Some(b'<') {
                        return Ok(Token::bare(Kind::StartDic));
                    }
                    return self.scan_hex_string(next);
                }
                b'%' => {
                    // comments never reach the caller: drain and rescan
                    while let Some(c) = self.source.read() {
                        if is_eol(c) {
                            break;
                        }
                    }
                }
                b'(' => return self.scan_string(),
                _ => {
                    self.source.rewind(); // the number scanner wants the lead byte
                    if let Some(token) = self.scan_number() {
                        return Ok(token);
                    }
                    return self.scan_operator(previous);
                }
            }
        }
    }

    fn scan_name(&mut self) -> Result<Token> {
        let mut out = Vec::new();
        while let Some(ch) = self.source.read() {
            if is_delimiter(ch) {
                // the delimiter may matter to the next token, push it back
                self.source.rewind();
                break;
            }
            out.push(ch);
            if ch == b'#' {
                // two hex bytes must follow; they are validated here but
                // kept raw, escape expansion belongs to the object layer
                let h1 = self.source.read();
                let h2 = self.source.read();
                match (h1, h2) {
                    (Some(h1), Some(h2))
                        if hex_value(h1).is_some() && hex_value(h2).is_some() =>
                    {
                        out.push(h1);
                        out.push(h2);
                    }
                    _ => return Err(Error::NameHexInvalid),
                }
            }
        }
        Ok(Token::with_value(Kind::Name, out))
    }

    // `first` is the byte read right after `<`, which is the first nibble
    // when it opens a hex string rather than a dictionary.
    fn scan_hex_string(&mut self, first: Option<u8>) -> Result<Token> {
        let mut out = Vec::new();
        let mut high = first;
        loop {
            while let Some(c) = high {
                if !is_ascii_whitespace(c) {
                    break;
                }
                high = self.source.read();
            }
            let hi = match high {
                Some(b'>') => break,
                Some(c) => match hex_value(c) {
                    Some(v) => v,
                    None => return Err(Error::HexCharInvalid(c)),
                },
                None => return Err(Error::HexCharInvalid(0)),
            };
            let mut low = self.source.read();
            while let Some(c) = low {
                if !is_ascii_whitespace(c) {
                    break;
                }
                low = self.source.read();
            }
            match low {
                Some(b'>') => {
                    // odd trailing nibble: pad with a low nibble of zero
                    out.push(hi << 4);
                    break;
                }
                Some(c) => match hex_value(c) {
                    Some(v) => out.push((hi << 4) | v),
                    None => return Err(Error::HexCharInvalid(c)),
                },
                None => return Err(Error::HexCharInvalid(0)),
            }
            high = self.source.read();
        }
        Ok(Token::with_value(Kind::StringHex, out))
    }

    fn scan_string(&mut self) -> Result<Token> {
        let mut out = Vec::new();
        let mut nesting: i32 = 0;
        loop {
            let mut ch = match self.source.read() {
                Some(c) => c,
                None => return Err(Error::StringUnterminated),
            };
            match ch {
                b'(' => nesting += 1,
                b')' => nesting -= 1,
                b'\\' => {
                    let esc = match self.source.read() {
                        Some(c) => c,
                        None => return Err(Error::StringUnterminated),
                    };
                    match esc {
                        b'n' => ch = b'\n',
                        b'r' => ch = b'\r',
                        b't' => ch = b'\t',
                        b'b' => ch = 0x08,
                        b'f' => ch = 0x0C,
                        b'(' | b')' | b'\\' => ch = esc,
                        b'\r' => {
                            // escaped line break emits nothing; CR LF
                            // counts as one break
                            if let Some(c) = self.source.read() {
                                if c != b'\n' {
                                    self.source.rewind();
                                }
                            }
                            continue;
                        }
                        b'\n' => continue,
                        b'0'..=b'7' => {
                            // 1 to 3 octal digits, truncated to 8 bits
                            let mut octal = u16::from(esc - b'0');
                            match self.source.read() {
                                Some(d) if (b'0'..=b'7').contains(&d) => {
                                    octal = (octal << 3) + u16::from(d - b'0');
                                    match self.source.read() {
                                        Some(d) if (b'0'..=b'7').contains(&d) => {
                                            octal = (octal << 3) + u16::from(d - b'0');
                                        }
                                        Some(_) => self.source.rewind(),
                                        None => return Err(Error::StringUnterminated),
                                    }
                                }
                                Some(_) => self.source.rewind(),
                                None => return Err(Error::StringUnterminated),
                            }
                            ch = (octal & 0xFF) as u8;
                        }
                        _ => ch = esc,
                    }
                }
                b'\r' => {
                    // bare CR and CR LF both normalize to a single LF
                    match self.source.read() {
                        Some(b'\n') => {}
                        Some(_) => self.source.rewind(),
                        None => return Err(Error::StringUnterminated),
                    }
                    ch = b'\n';
                }
                _ => {}
            }
            if nesting == -1 {
                break;
            }
            out.push(ch);
        }
        Ok(Token::with_value(Kind::String, out))
    }

    // Accepts the PS number syntax, radix and exponent forms included.
    // Returns None, with the cursor restored, if the input is not a number.
    fn scan_number(&mut self) -> Option<Token> {
        let marked = self.source.pos();
        self.number_buf.clear();
        let mut radix: Option<String> = None;

        let mut ch = self.source.read();
        let mut has_digit = false;

        if let Some(c) = ch {
            if c == b'+' || c == b'-' {
                self.number_buf.push(c);
                ch = self.source.read();
            }
        }

        while let Some(c) = ch {
            if !c.is_ascii_digit() {
                break;
            }
            self.number_buf.push(c);
            has_digit = true;
            ch = self.source.read();
        }

        let mut number_required = true;
        match ch {
            Some(b'.') => {
                self.number_buf.push(b'.');
                ch = self.source.read();
                // a float may terminate right after '.', as in `4.`
                number_required = false;
            }
            Some(b'#') => {
                // PostScript radix number, base#digits
                radix = Some(String::from_utf8_lossy(&self.number_buf).into_owned());
                self.number_buf.clear();
                ch = self.source.read();
            }
            _ if self.number_buf.is_empty() || !has_digit => {
                self.source.set_pos(marked);
                return None;
            }
            Some(c) if c == b'E' || c == b'e' => {
                self.number_buf.push(c);
                ch = self.source.read();
                if ch == Some(b'-') {
                    self.number_buf.push(b'-');
                    ch = self.source.read();
                }
            }
            _ => {
                // plain integer, push the terminator back
                if ch.is_some() {
                    self.source.rewind();
                }
                return Some(Token::with_value(Kind::Integer, self.number_buf.clone()));
            }
        }

        // radix and exponent forms still need at least one digit here
        let next_is_digit = matches!(ch, Some(c) if c.is_ascii_digit());
        if number_required && !next_is_digit {
            self.source.set_pos(marked);
            return None;
        }

        while let Some(c) = ch {
            if !c.is_ascii_digit() {
                break;
            }
            self.number_buf.push(c);
            ch = self.source.read();
        }
        if ch.is_some() {
            self.source.rewind();
        }

        match radix {
            Some(base) if !base.is_empty() => {
                let value = parse_radix(&base, &self.number_buf);
                Some(Token::with_value(
                    Kind::Integer,
                    value.to_string().into_bytes(),
                ))
            }
            _ => Some(Token::with_value(Kind::Float, self.number_buf.clone())),
        }
    }

    fn scan_operator(&mut self, previous: &Token) -> Result<Token> {
        let mut out = Vec::new();
        if let Some(c) = self.source.read() {
            out.push(c);
        }
        while let Some(c) = self.source.read() {
            if is_delimiter(c) {
                self.source.rewind();
                break;
            }
            out.push(c);
        }

        if matches!(out.as_slice(), b"RD" | b"-|") {
            // not a word at all: a binary CharString follows, its byte
            // length given by the preceding integer token
            if previous.kind != Kind::Integer {
                return Err(Error::CharStringLeaderMissing);
            }
            let length = previous
                .int()
                .map_err(|err| Error::CharStringLengthInvalid(err.to_string()))?;
            return Ok(self.scan_charstring(length));
        }
        Ok(Token::with_value(Kind::Other, out))
    }

    // Copies `length` raw bytes after the single space that follows the
    // introducing operator. The cursor still advances by `length` even if
    // fewer bytes are buffered, so it may end up past the buffered end.
    fn scan_charstring(&mut self, length: i64) -> Token {
        self.source.advance(1); // the space after RD / -|
        let length = usize::try_from(length).unwrap_or(0);
        let start = self.source.pos();
        let wanted = start.saturating_add(length);
        if wanted >= self.source.len() && self.source.has_reader() {
            self.source.grow(wanted - self.source.len());
        }
        let end = wanted.min(self.source.len());
        let value = self.source.data()[start.min(end)..end].to_vec();
        self.source.set_pos(wanted);
        Token::with_value(Kind::CharString, value)
    }
}

// Lenient PostScript reading of base#digits: anything that does not parse
// cleanly collapses to zero.
fn parse_radix(base: &str, digits: &[u8]) -> i64 {
    let base: i64 = base.parse().unwrap_or(0);
    if !(2..=36).contains(&base) {
        return 0;
    }
    match std::str::from_utf8(digits) {
        Ok(digits) => i64::from_str_radix(digits, base as u32).unwrap_or(0),
        Err(_) => 0,
    }
}
