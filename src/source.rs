//! Byte-level input abstraction.
//!
//! [`ByteSource`] presents a uniform read cursor over either a borrowed
//! byte slice or a pull-style reader whose bytes are buffered on demand.
//! Scanners only ever advance through [`ByteSource::read`], so buffer
//! growth stays transparent to them.

use std::borrow::Cow;
use std::io::Read;

use crate::options::DEFAULT_CHUNK_SIZE;

pub(crate) struct ByteSource<'a> {
    data: Cow<'a, [u8]>,
    // when present, `data` is grown from it on demand
    src: Option<Box<dyn Read + 'a>>,
    pos: usize,
    chunk_size: usize,
}

impl<'a> ByteSource<'a> {
    pub(crate) fn from_slice(data: &'a [u8]) -> Self {
        ByteSource {
            data: Cow::Borrowed(data),
            src: None,
            pos: 0,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub(crate) fn from_reader(src: Box<dyn Read + 'a>, chunk_size: usize) -> Self {
        ByteSource {
            data: Cow::Owned(Vec::new()),
            src: Some(src),
            pos: 0,
            chunk_size,
        }
    }

    /// Rebinds to a new slice, dropping any pull source.
    pub(crate) fn rebind_slice(&mut self, data: &'a [u8]) {
        self.data = Cow::Borrowed(data);
        self.src = None;
        self.pos = 0;
    }

    /// Rebinds to a new pull source, reusing the owned buffer when there
    /// is one.
    pub(crate) fn rebind_reader(&mut self, src: Box<dyn Read + 'a>) {
        let buf = match std::mem::replace(&mut self.data, Cow::Owned(Vec::new())) {
            Cow::Owned(mut buf) => {
                buf.clear();
                buf
            }
            Cow::Borrowed(_) => Vec::new(),
        };
        self.data = Cow::Owned(buf);
        self.src = Some(src);
        self.pos = 0;
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn set_pos(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Moves the cursor forward without reading, possibly past the
    /// buffered end.
    pub(crate) fn advance(&mut self, n: usize) {
        self.pos = self.pos.saturating_add(n);
    }

    pub(crate) fn len(&self) -> usize {
        self.data.len()
    }

    pub(crate) fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn has_reader(&self) -> bool {
        self.src.is_some()
    }

    /// Returns the byte at the cursor and advances, pulling more input
    /// from the source if needed. `None` once genuinely exhausted.
    pub(crate) fn read(&mut self) -> Option<u8> {
        if self.pos >= self.data.len() && self.src.is_some() {
            self.grow(self.chunk_size);
        }
        let ch = *self.data.get(self.pos)?;
        self.pos += 1;
        Some(ch)
    }

    /// Steps back over the byte just read. Only valid after a successful
    /// `read`.
    pub(crate) fn rewind(&mut self) {
        self.pos -= 1;
    }

    /// Appends up to `size` further bytes from the pull source. A single
    /// read is issued; partial reads are kept and read errors are
    /// swallowed, leaving the buffer as is.
    pub(crate) fn grow(&mut self, size: usize) {
        let src = match self.src.as_mut() {
            Some(src) => src,
            None => return,
        };
        if size == 0 {
            return;
        }
        let data = self.data.to_mut();
        let len = data.len();
        data.resize(len + size, 0);
        let n = match src.read(&mut data[len..]) {
            Ok(n) => n,
            Err(err) => {
                log::debug!("pull source read failed, treating as end of input: {err}");
                0
            }
        };
        data.truncate(len + n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_from_slice() {
        let mut source = ByteSource::from_slice(b"ab");
        assert_eq!(source.read(), Some(b'a'));
        assert_eq!(source.read(), Some(b'b'));
        assert_eq!(source.read(), None);
        // exhausted stays exhausted, the cursor does not move
        assert_eq!(source.read(), None);
        assert_eq!(source.pos(), 2);
    }

    #[test]
    fn test_rewind() {
        let mut source = ByteSource::from_slice(b"xy");
        assert_eq!(source.read(), Some(b'x'));
        source.rewind();
        assert_eq!(source.read(), Some(b'x'));
        assert_eq!(source.read(), Some(b'y'));
    }

    #[test]
    fn test_read_grows_from_reader() {
        let mut source = ByteSource::from_reader(Box::new(Cursor::new(b"abc".to_vec())), 2);
        assert_eq!(source.len(), 0);
        assert_eq!(source.read(), Some(b'a'));
        assert_eq!(source.len(), 2); // one chunk pulled in
        assert_eq!(source.read(), Some(b'b'));
        assert_eq!(source.read(), Some(b'c'));
        assert_eq!(source.read(), None);
    }

    #[test]
    fn test_grow_accepts_partial_reads() {
        let mut source = ByteSource::from_reader(Box::new(Cursor::new(b"ab".to_vec())), 16);
        source.grow(16);
        assert_eq!(source.len(), 2);
        assert_eq!(source.data(), b"ab");
    }

    #[test]
    fn test_grow_swallows_read_errors() {
        struct Failing;
        impl Read for Failing {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::Other, "boom"))
            }
        }
        let mut source = ByteSource::from_reader(Box::new(Failing), 8);
        assert_eq!(source.read(), None);
        assert_eq!(source.len(), 0);
    }

    #[test]
    fn test_rebind_slice_drops_reader() {
        let mut source = ByteSource::from_reader(Box::new(Cursor::new(b"abc".to_vec())), 8);
        assert_eq!(source.read(), Some(b'a'));
        source.rebind_slice(b"z");
        assert!(!source.has_reader());
        assert_eq!(source.pos(), 0);
        assert_eq!(source.read(), Some(b'z'));
        assert_eq!(source.read(), None);
    }

    #[test]
    fn test_rebind_reader_clears_buffer() {
        let mut source = ByteSource::from_reader(Box::new(Cursor::new(b"abc".to_vec())), 8);
        assert_eq!(source.read(), Some(b'a'));
        source.rebind_reader(Box::new(Cursor::new(b"xy".to_vec())));
        assert_eq!(source.pos(), 0);
        assert_eq!(source.read(), Some(b'x'));
        assert_eq!(source.read(), Some(b'y'));
        assert_eq!(source.read(), None);
    }
}
