//! Tagged, length-prefixed binary stream codec.
//!
//! This is the on-the-wire encoding shared by every binary-serialized type in
//! the workspace (movies, savestates, search snapshots). A stream is a flat
//! sequence of primitives; within it, self-describing *extension records*
//! (tag + length-prefixed body) let a reader skip data it doesn't recognize
//! without losing its place.
//!
//! # Usage
//!
//! ```
//! use tascore_wire::{Reader, Writer};
//!
//! let mut w = Writer::new();
//! w.number(300);
//! w.string("hello");
//!
//! let mut r = Reader::new(w.into_bytes());
//! assert_eq!(r.number().unwrap(), 300);
//! assert_eq!(r.string().unwrap(), "hello");
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

use std::io::Read;

use thiserror::Error;

/// Magic prefix for an [extension record](Writer::extension).
pub const EXTENSION_MAGIC: u32 = 0xADDB_2D86;

/// A convenient type alias for [`Result`](std::result::Result).
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// An error caused by a stream codec operation.
#[derive(Debug, Error)]
pub enum Error {
    /// Stream ended before the requested data could be read.
    #[error("unexpected end of stream")]
    UnexpectedEof,
    /// Stream did not begin with the expected magic, or was otherwise
    /// structurally invalid.
    #[error("malformed stream: {0}")]
    Malformed(String),
    /// Substream was asked to read a field that would cross its announced
    /// length.
    #[error("substream overrun: wanted {want} bytes, {left} left")]
    Overrun {
        /// Bytes requested.
        want: u64,
        /// Bytes actually remaining in the substream.
        left: u64,
    },
}

/// Appends primitives to a growing byte buffer.
#[derive(Clone, Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Constructs a new, empty `Writer`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a single byte.
    pub fn byte(&mut self, byte: u8) -> &mut Self {
        self.buf.push(byte);
        self
    }

    /// Appends a variable-length integer.
    ///
    /// Encoding is 7 data bits per output byte, little-endian, with the high
    /// bit of each byte set iff another byte follows.
    pub fn number(&mut self, mut value: u64) -> &mut Self {
        loop {
            let mut byte = (value & 0x7f) as u8;
            value >>= 7;
            if value != 0 {
                byte |= 0x80;
            }
            self.buf.push(byte);
            if value == 0 {
                break;
            }
        }
        self
    }

    /// Appends a fixed 4-byte big-endian integer.
    pub fn number32(&mut self, value: u32) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Appends a length-prefixed UTF-8 string.
    pub fn string(&mut self, s: &str) -> &mut Self {
        self.number(s.len() as u64);
        self.buf.extend_from_slice(s.as_bytes());
        self
    }

    /// Appends raw, unprefixed bytes.
    pub fn raw(&mut self, buf: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(buf);
        self
    }

    /// Appends a tagged extension record.
    ///
    /// The body is built by `fill` into a scratch [`Writer`] so that its
    /// encoded size is known before the size prefix is emitted.
    pub fn extension(&mut self, tag: u32, fill: impl FnOnce(&mut Writer)) -> &mut Self {
        let mut body = Writer::new();
        fill(&mut body);
        self.number32(EXTENSION_MAGIC);
        self.number32(tag);
        self.number(body.buf.len() as u64);
        self.buf.extend_from_slice(&body.buf);
        self
    }

    /// Consumes the `Writer`, returning the accumulated bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Borrows the accumulated bytes without consuming the `Writer`.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}

/// Consumes primitives from a byte slice, optionally bounded to a substream.
#[derive(Debug)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
    /// Remaining length, if this reader is a size-bounded substream.
    left: Option<u64>,
}

impl<'a> Reader<'a> {
    /// Constructs a new `Reader` over the entire provided slice.
    #[must_use]
    pub fn new(buf: impl Into<Owned<'a>>) -> Self {
        let buf = buf.into().0;
        Self {
            buf,
            pos: 0,
            left: None,
        }
    }

    /// Returns the number of bytes left to read.
    ///
    /// # Panics
    ///
    /// Panics if this reader is not a substream (only substreams have a
    /// defined notion of "left").
    #[must_use]
    pub fn get_left(&self) -> u64 {
        self.left
            .expect("get_left() is only valid on a substream")
    }

    /// Returns `true` if no unread bytes remain (EOF for a bare stream, or
    /// exhaustion for a substream).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self.left {
            Some(left) => left == 0,
            None => self.pos >= self.buf.len(),
        }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if let Some(left) = self.left {
            if n as u64 > left {
                return Err(Error::Overrun {
                    want: n as u64,
                    left,
                });
            }
        }
        let end = self
            .pos
            .checked_add(n)
            .filter(|&e| e <= self.buf.len())
            .ok_or(Error::UnexpectedEof)?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        if let Some(left) = &mut self.left {
            *left -= n as u64;
        }
        Ok(slice)
    }

    /// Reads a single byte.
    pub fn byte(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Reads a variable-length integer (see [`Writer::number`]).
    pub fn number(&mut self) -> Result<u64> {
        let mut value: u64 = 0;
        let mut shift = 0;
        loop {
            let byte = self.byte()?;
            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
            if shift >= 64 {
                return Err(Error::Malformed("number too long".into()));
            }
        }
        Ok(value)
    }

    /// Reads a fixed 4-byte big-endian integer.
    pub fn number32(&mut self) -> Result<u32> {
        let buf = self.take(4)?;
        Ok(u32::from_be_bytes(buf.try_into().unwrap()))
    }

    /// Reads a length-prefixed UTF-8 string.
    ///
    /// Invalid UTF-8 is replaced (lossily) rather than treated as fatal,
    /// matching the permissive stance taken for subtitle/author text.
    pub fn string(&mut self) -> Result<String> {
        let len = self.number()? as usize;
        let buf = self.take(len)?;
        Ok(String::from_utf8_lossy(buf).into_owned())
    }

    /// Reads exactly `n` raw bytes.
    pub fn raw(&mut self, n: usize) -> Result<Vec<u8>> {
        Ok(self.take(n)?.to_vec())
    }

    /// Opens a size-bounded substream of `len` bytes, running `body` over it.
    ///
    /// On return, any bytes of the substream left unconsumed by `body` are
    /// discarded and the parent reader's cursor advances past the substream.
    pub fn substream<T>(
        &mut self,
        len: u64,
        body: impl FnOnce(&mut Reader<'a>) -> Result<T>,
    ) -> Result<T> {
        let bytes = self.take(len as usize)?;
        let mut sub = Reader {
            buf: bytes,
            pos: 0,
            left: Some(len),
        };
        body(&mut sub)
        // `sub` is dropped here; any bytes it never consumed are simply
        // never read again, since the parent already advanced past `len`.
    }

    /// Handler invoked for each extension record encountered by
    /// [`extensions`](Reader::extensions).
    ///
    /// Dispatch by `tag`; unrecognized tags should be ignored, not erred on
    /// (see [`null_default`]).
    pub fn extensions(
        &mut self,
        mut dispatch: impl FnMut(u32, &mut Reader<'a>) -> Result<()>,
    ) -> Result<()> {
        while !self.is_empty() {
            let magic = self.number32()?;
            if magic != EXTENSION_MAGIC {
                return Err(Error::Malformed(format!(
                    "bad extension magic: {magic:#010x}"
                )));
            }
            let tag = self.number32()?;
            let size = self.number()?;
            self.substream(size, |sub| dispatch(tag, sub))?;
        }
        Ok(())
    }
}

/// Adapter allowing [`Reader::new`] to accept both owned and borrowed bytes.
#[derive(Debug)]
pub struct Owned<'a>(&'a [u8]);

impl<'a> From<&'a [u8]> for Owned<'a> {
    fn from(value: &'a [u8]) -> Self {
        Self(value)
    }
}

impl<'a> From<&'a Vec<u8>> for Owned<'a> {
    fn from(value: &'a Vec<u8>) -> Self {
        Self(value.as_slice())
    }
}

/// Default handler for unrecognized extension tags: silently skip the
/// substream.
///
/// This resolves the ambiguity noted in the design: some original callers
/// aborted on an unknown tag while others skipped it. We always skip,
/// consistently, since [`Reader::extensions`] already bounds the substream.
pub fn null_default(_tag: u32, _body: &mut Reader<'_>) -> Result<()> {
    Ok(())
}

/// Copies the remainder of a [`Read`] source into a `Vec<u8>`.
///
/// Convenience used by callers that build a [`Reader`] from a file.
pub fn slurp(mut r: impl Read) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    r.read_to_end(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_roundtrip() {
        for &n in &[0u64, 1, 127, 128, 300, 16384, u64::MAX] {
            let mut w = Writer::new();
            w.number(n);
            let mut r = Reader::new(w.as_bytes());
            assert_eq!(r.number().unwrap(), n);
        }
    }

    #[test]
    fn number32_roundtrip() {
        let mut w = Writer::new();
        w.number32(0xDEAD_BEEF);
        assert_eq!(w.as_bytes(), &[0xDE, 0xAD, 0xBE, 0xEF]);
        let mut r = Reader::new(w.as_bytes());
        assert_eq!(r.number32().unwrap(), 0xDEAD_BEEF);
    }

    #[test]
    fn string_roundtrip() {
        let mut w = Writer::new();
        w.string("hello, world");
        let mut r = Reader::new(w.as_bytes());
        assert_eq!(r.string().unwrap(), "hello, world");
    }

    #[test]
    fn extension_dispatch() {
        let mut w = Writer::new();
        w.extension(0xAAAA_AAAA, |b| {
            b.string("payload");
        });
        w.extension(0xBBBB_BBBB, |b| {
            b.number(42);
        });

        let mut r = Reader::new(w.as_bytes());
        let mut seen = Vec::new();
        r.extensions(|tag, body| {
            match tag {
                0xAAAA_AAAA => seen.push(("a", body.string()?)),
                0xBBBB_BBBB => seen.push(("b", body.number()?.to_string())),
                _ => unreachable!(),
            }
            Ok(())
        })
        .unwrap();
        assert_eq!(seen, vec![("a", "payload".into()), ("b", "42".into())]);
    }

    #[test]
    fn unknown_extension_is_skipped() {
        let mut w = Writer::new();
        w.extension(0xFFFF_FFFF, |b| {
            b.raw(&[1, 2, 3, 4, 5]);
        });
        w.extension(0xAAAA_AAAA, |b| {
            b.string("kept");
        });

        let mut r = Reader::new(w.as_bytes());
        let mut kept = None;
        r.extensions(|tag, body| {
            if tag == 0xAAAA_AAAA {
                kept = Some(body.string()?);
                Ok(())
            } else {
                null_default(tag, body)
            }
        })
        .unwrap();
        assert_eq!(kept.as_deref(), Some("kept"));
    }

    #[test]
    fn substream_cannot_overrun() {
        let mut w = Writer::new();
        w.number(1); // substream announces 1 byte of body
        w.byte(0xAB);
        let mut r = Reader::new(w.as_bytes());
        let len = r.number().unwrap();
        let res: Result<()> = r.substream(len, |sub| {
            let _ = sub.byte()?;
            // second read must fail: substream only had 1 byte
            sub.byte()?;
            Ok(())
        });
        assert!(matches!(res, Err(Error::Overrun { .. })));
    }

    #[test]
    fn malformed_magic_is_an_error() {
        let mut w = Writer::new();
        w.number32(0x1234_5678); // not the extension magic
        w.number32(0);
        w.number(0);
        let mut r = Reader::new(w.as_bytes());
        let res = r.extensions(|_, _| Ok(()));
        assert!(matches!(res, Err(Error::Malformed(_))));
    }

    #[test]
    fn truncated_read_is_unexpected_eof() {
        let mut r = Reader::new([0xAB].as_slice());
        assert_eq!(r.byte().unwrap(), 0xAB);
        assert!(matches!(r.byte(), Err(Error::UnexpectedEof)));
    }
}
