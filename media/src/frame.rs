//! Raw pixel frames: owned or borrowed backing storage, nearest-neighbor
//! resize, and screenshot serialization.

use std::io::{self, Read, Write};

use thiserror::Error;

/// Backing storage for a [`Frame`]: either owned (the emulation core's own
/// scratch buffer) or borrowed (a caller-supplied buffer the frame writes
/// into directly, avoiding a copy).
#[derive(Debug)]
enum Buffer<'a> {
    Owned(Box<[u32]>),
    Borrowed(&'a mut [u32]),
}

impl Buffer<'_> {
    fn as_slice(&self) -> &[u32] {
        match self {
            Buffer::Owned(buf) => buf,
            Buffer::Borrowed(buf) => buf,
        }
    }

    fn as_mut_slice(&mut self) -> &mut [u32] {
        match self {
            Buffer::Owned(buf) => buf,
            Buffer::Borrowed(buf) => buf,
        }
    }
}

/// A rectangular frame of 32-bit `0x00RRGGBB` pixels.
///
/// Rows run top-to-bottom unless [`Frame::set_upside_down`] is set, in which
/// case [`Frame::rowptr`] indexes from the bottom row upward (matching
/// platforms whose native framebuffer is stored bottom-up).
#[derive(Debug)]
pub struct Frame<'a> {
    width: usize,
    height: usize,
    upside_down: bool,
    buf: Buffer<'a>,
}

impl Frame<'static> {
    /// Constructs an owned frame of the given size, initialized to black.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            upside_down: false,
            buf: Buffer::Owned(vec![0u32; width * height].into_boxed_slice()),
        }
    }
}

impl<'a> Frame<'a> {
    /// Wraps a caller-supplied pixel buffer in place of allocating one.
    ///
    /// # Panics
    ///
    /// Panics if `buf.len() != width * height`.
    #[must_use]
    pub fn borrowed(width: usize, height: usize, buf: &'a mut [u32]) -> Self {
        assert_eq!(buf.len(), width * height, "buffer size mismatch");
        Self {
            width,
            height,
            upside_down: false,
            buf: Buffer::Borrowed(buf),
        }
    }

    /// Frame width, in pixels.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Frame height, in pixels.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Marks the frame's storage as bottom-up.
    pub fn set_upside_down(&mut self, upside_down: bool) {
        self.upside_down = upside_down;
    }

    /// Resizes the frame, discarding old contents (reallocates if borrowed
    /// storage no longer fits; otherwise reuses the existing allocation).
    pub fn set_size(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        let len = width * height;
        match &mut self.buf {
            Buffer::Owned(buf) if buf.len() == len => buf.fill(0),
            Buffer::Owned(_) => self.buf = Buffer::Owned(vec![0u32; len].into_boxed_slice()),
            Buffer::Borrowed(buf) => {
                assert!(buf.len() >= len, "borrowed frame cannot grow");
                buf[..len].fill(0);
            }
        }
    }

    /// Returns a pointer-equivalent row slice, honoring [`Self::set_upside_down`].
    #[must_use]
    pub fn rowptr(&self, row: usize) -> &[u32] {
        let row = if self.upside_down {
            self.height - 1 - row
        } else {
            row
        };
        let start = row * self.width;
        &self.buf.as_slice()[start..start + self.width]
    }

    /// Mutable counterpart to [`Self::rowptr`].
    pub fn rowptr_mut(&mut self, row: usize) -> &mut [u32] {
        let row = if self.upside_down {
            self.height - 1 - row
        } else {
            row
        };
        let width = self.width;
        let start = row * width;
        &mut self.buf.as_mut_slice()[start..start + width]
    }

    /// The full pixel buffer as a flat slice, in storage order (not
    /// necessarily display order if [`Self::set_upside_down`] is set).
    #[must_use]
    pub fn as_slice(&self) -> &[u32] {
        self.buf.as_slice()
    }

    /// Copies `src` into this frame with nearest-neighbor scaling.
    ///
    /// Equal-size copies take a direct `copy_from_slice` fast path; anything
    /// else maps each destination pixel back to its nearest source pixel
    /// (integer `src_x = dst_x * src_w / dst_w`), which reproduces the
    /// blocky magnification consoles of this era render at.
    pub fn copy_from(&mut self, src: &Frame<'_>) {
        if self.width == src.width && self.height == src.height {
            for row in 0..self.height {
                let pixels: Vec<u32> = src.rowptr(row).to_vec();
                self.rowptr_mut(row).copy_from_slice(&pixels);
            }
            return;
        }
        for dst_y in 0..self.height {
            let src_y = dst_y * src.height / self.height.max(1);
            let src_row = src.rowptr(src_y).to_vec();
            let dst_row = self.rowptr_mut(dst_y);
            for (dst_x, px) in dst_row.iter_mut().enumerate() {
                let src_x = dst_x * src.width / self.width.max(1);
                *px = src_row[src_x];
            }
        }
    }

    /// Applies a palette remap: replaces every pixel with `palette[pixel as
    /// usize]`, leaving pixels outside the palette's range untouched.
    ///
    /// Used when an indexed-color console core swaps its palette mid-frame
    /// (a palette-shift effect) and the renderer needs to recompute the
    /// already-drawn rows rather than re-running the whole scanline loop.
    pub fn set_palette(&mut self, palette: &[u32]) {
        for px in self.buf.as_mut_slice() {
            if let Some(&mapped) = palette.get(*px as usize) {
                *px = mapped;
            }
        }
    }

    /// Serializes this frame as an uncompressed screenshot record.
    ///
    /// Two formats exist in the wild (§9 open question): legacy readers
    /// expect a bare `width:u32 height:u32` header followed by raw
    /// `0x00RRGGBB` pixels with no magic; modern readers prefix a 4-byte
    /// magic (`b"TSSH"`) so the format is self-describing. We always write
    /// the modern form and only accept the legacy form on read, which is
    /// the same compromise [`crate::queue`] takes for its own wire
    /// compatibility: never emit the ambiguous format, but still read it.
    pub fn write_screenshot<W: Write>(&self, mut w: W) -> io::Result<()> {
        w.write_all(b"TSSH")?;
        w.write_all(&(self.width as u32).to_be_bytes())?;
        w.write_all(&(self.height as u32).to_be_bytes())?;
        for row in 0..self.height {
            for &px in self.rowptr(row) {
                w.write_all(&px.to_be_bytes())?;
            }
        }
        Ok(())
    }

    /// Parses a screenshot record written by either the legacy or modern
    /// writer, detected by whether the first four bytes match `b"TSSH"`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Truncated`] if the stream ends before a full frame
    /// has been read, or an I/O error from the underlying reader.
    pub fn read_screenshot<R: Read>(mut r: R) -> Result<Frame<'static>, Error> {
        let mut header = [0u8; 4];
        r.read_exact(&mut header).map_err(|_| Error::Truncated)?;
        let (width, height) = if &header == b"TSSH" {
            let mut dims = [0u8; 8];
            r.read_exact(&mut dims).map_err(|_| Error::Truncated)?;
            (
                u32::from_be_bytes(dims[0..4].try_into().unwrap()),
                u32::from_be_bytes(dims[4..8].try_into().unwrap()),
            )
        } else {
            let mut rest = [0u8; 4];
            r.read_exact(&mut rest).map_err(|_| Error::Truncated)?;
            (
                u32::from_be_bytes(header),
                u32::from_be_bytes(rest),
            )
        };
        let (width, height) = (width as usize, height as usize);
        let mut frame = Frame::new(width, height);
        for row in 0..height {
            let dst = frame.rowptr_mut(row);
            for px in dst.iter_mut() {
                let mut bytes = [0u8; 4];
                r.read_exact(&mut bytes).map_err(|_| Error::Truncated)?;
                *px = u32::from_be_bytes(bytes);
            }
        }
        Ok(frame)
    }
}

/// An error reading a screenshot record.
#[derive(Debug, Error)]
pub enum Error {
    /// The stream ended before a complete frame was read.
    #[error("truncated screenshot stream")]
    Truncated,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_size_copy_is_exact() {
        let mut src = Frame::new(2, 2);
        src.rowptr_mut(0).copy_from_slice(&[1, 2]);
        src.rowptr_mut(1).copy_from_slice(&[3, 4]);
        let mut dst = Frame::new(2, 2);
        dst.copy_from(&src);
        assert_eq!(dst.rowptr(0), &[1, 2]);
        assert_eq!(dst.rowptr(1), &[3, 4]);
    }

    #[test]
    fn upscale_is_nearest_neighbor() {
        let mut src = Frame::new(1, 1);
        src.rowptr_mut(0).copy_from_slice(&[0xFF0000]);
        let mut dst = Frame::new(2, 2);
        dst.copy_from(&src);
        assert_eq!(dst.rowptr(0), &[0xFF0000, 0xFF0000]);
        assert_eq!(dst.rowptr(1), &[0xFF0000, 0xFF0000]);
    }

    #[test]
    fn upside_down_flips_row_order() {
        let mut frame = Frame::new(1, 2);
        frame.set_upside_down(true);
        frame.rowptr_mut(0).copy_from_slice(&[1]);
        frame.rowptr_mut(1).copy_from_slice(&[2]);
        assert_eq!(frame.buf.as_slice(), &[2, 1]);
    }

    #[test]
    fn screenshot_roundtrip() {
        let mut frame = Frame::new(2, 1);
        frame.rowptr_mut(0).copy_from_slice(&[0x112233, 0x445566]);
        let mut bytes = Vec::new();
        frame.write_screenshot(&mut bytes).unwrap();
        let read_back = Frame::read_screenshot(&bytes[..]).unwrap();
        assert_eq!(read_back.rowptr(0), &[0x112233, 0x445566]);
    }

    #[test]
    fn legacy_screenshot_without_magic_still_parses() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.extend_from_slice(&0xABCDEFu32.to_be_bytes());
        let frame = Frame::read_screenshot(&bytes[..]).unwrap();
        assert_eq!(frame.rowptr(0), &[0xABCDEF]);
    }
}
