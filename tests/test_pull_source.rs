//! Integration tests for reader-backed tokenizers: on-demand buffering,
//! position handling and payload skipping without a known input length.

use std::io::{self, Read};

use token_oxide::{tokenize, Kind, Token, Tokenizer, TokenizerOptions};

const DOC: &[u8] = b"3 0 obj\n<< /Filter /FlateDecode /Length 6 >>\nstream\n\x78\x9C\x01\x02\xFF\xFE\nendstream\nendobj";

/// A reader handing out its bytes a few at a time, regardless of how many
/// were asked for.
struct Trickle {
    data: Vec<u8>,
    offset: usize,
    per_read: usize,
}

impl Read for Trickle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self
            .per_read
            .min(buf.len())
            .min(self.data.len() - self.offset);
        buf[..n].copy_from_slice(&self.data[self.offset..self.offset + n]);
        self.offset += n;
        Ok(n)
    }
}

fn drain(tk: &mut Tokenizer) -> Vec<Token> {
    let mut out = Vec::new();
    loop {
        let token = tk.next_token().expect("scan should succeed");
        if token.kind == Kind::Eof {
            return out;
        }
        out.push(token);
    }
}

#[test]
fn test_trickling_reader_matches_slice() {
    let head = b"<< /Kids [4 0 R 5 0 R] /Name /X#41Y (par(en)s) <0AFF> 16#99 >>";
    let expected = tokenize(head).unwrap();

    for per_read in [1, 3, 1024] {
        let reader = Trickle {
            data: head.to_vec(),
            offset: 0,
            per_read,
        };
        let mut tk = Tokenizer::from_reader_with(reader, TokenizerOptions { chunk_size: 4 });
        assert_eq!(drain(&mut tk), expected, "per_read {per_read}");
    }
}

#[test]
fn test_stream_skipping_without_known_length() {
    let reader = Trickle {
        data: DOC.to_vec(),
        offset: 0,
        per_read: 5,
    };
    let mut tk = Tokenizer::from_reader(reader);

    // walk to the stream keyword, remembering the declared length
    let mut length = None;
    loop {
        let token = tk.next_token().unwrap();
        if token.is_other("stream") {
            break;
        }
        if token.is_number() {
            length = Some(token.int().unwrap() as usize);
        }
        assert_ne!(token.kind, Kind::Eof, "stream keyword not found");
    }
    assert_eq!(tk.peek_token().unwrap().kind, Kind::Eof);

    let start = tk.stream_position();
    tk.set_position(start);
    let payload = tk.skip_bytes(length.expect("missing /Length"));
    assert_eq!(payload, b"\x78\x9C\x01\x02\xFF\xFE");

    let rest = drain(&mut tk);
    assert!(rest[0].is_other("endstream"));
    assert!(rest[1].is_other("endobj"));
}

#[test]
fn test_bytes_returns_only_buffered_input() {
    let reader = Trickle {
        data: b"1 2 3 4 5 6 7 8 9".to_vec(),
        offset: 0,
        per_read: 2,
    };
    let mut tk = Tokenizer::from_reader_with(reader, TokenizerOptions { chunk_size: 2 });
    tk.next_token().unwrap();
    // only what the lookahead needed so far is visible
    let buffered = tk.bytes().to_vec();
    assert!(buffered.len() < 16);
    assert!(buffered.starts_with(b" 2"));
}

#[test]
fn test_skip_bytes_truncates_on_unbuffered_input() {
    let reader = Trickle {
        data: b"12".to_vec(),
        offset: 0,
        per_read: 2,
    };
    let mut tk = Tokenizer::from_reader(reader);
    // everything is buffered by the priming scans; asking for more truncates
    let skipped = tk.skip_bytes(1000);
    assert_eq!(skipped, b"12");
    assert!(tk.is_eof());
}

#[test]
fn test_reset_from_reader_reuses_buffers() {
    let mut tk = Tokenizer::from_reader(Trickle {
        data: b"(one)".to_vec(),
        offset: 0,
        per_read: 3,
    });
    let one = tk.next_token().unwrap();
    assert_eq!(one.value, b"one");

    tk.reset_from_reader(Trickle {
        data: b"(two) 2".to_vec(),
        offset: 0,
        per_read: 3,
    });
    let two = tk.next_token().unwrap();
    assert_eq!(two.value, b"two");
    assert_eq!(tk.next_token().unwrap().int().unwrap(), 2);
    // the first token is untouched by the reset
    assert_eq!(one.value, b"one");
}
