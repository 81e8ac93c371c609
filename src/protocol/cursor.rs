//! Cursor codec: sequential writer and seekable reader over frame buffers.
//!
//! Every catalog encoder allocates a [`Writer`] of the exact frame size computed from the
//! layout constants and writes fields in order. Every decoder wraps the received span in a
//! [`Reader`], seeks past the fields it does not need and reads the rest.
//!
//! All multi-byte integers are Big Endian.
//!
//! # Example
//!
//! ```
//! use std::io::SeekFrom;
//! use clusterwire::protocol::{Reader, Writer};
//!
//! let mut writer = Writer::with_size(7);
//! writer.write_u32(3);
//! writer.write_bool(true);
//! writer.write_i16(-2);
//! let bytes = writer.finish();
//!
//! let mut reader = Reader::new(&bytes);
//! reader.seek(SeekFrom::End(-2)).unwrap();
//! assert_eq!(reader.read_i16().unwrap(), -2);
//! ```

use std::io::SeekFrom;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{ClusterwireError, Result};

/// Fixed-size sequential writer.
///
/// Allocates exactly `size` bytes up front. Writing past `size` panics: frame sizes come
/// from the layout table, so an overflow is a bug in the encoder, not bad input.
#[derive(Debug)]
pub struct Writer {
    buf: BytesMut,
    size: usize,
}

impl Writer {
    /// Allocate a writer for a frame of exactly `size` bytes.
    pub fn with_size(size: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(size),
            size,
        }
    }

    /// Bytes written so far.
    #[inline]
    pub fn written(&self) -> usize {
        self.buf.len()
    }

    /// Bytes left before the writer is full.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.size - self.buf.len()
    }

    #[inline]
    fn claim(&self, n: usize) {
        assert!(
            n <= self.remaining(),
            "writer overflow: writing {} bytes with {} of {} remaining",
            n,
            self.remaining(),
            self.size
        );
    }

    pub fn write_u8(&mut self, value: u8) {
        self.claim(1);
        self.buf.put_u8(value);
    }

    /// Write a boolean as a single byte (`1` or `0`).
    pub fn write_bool(&mut self, value: bool) {
        self.write_u8(u8::from(value));
    }

    pub fn write_u16(&mut self, value: u16) {
        self.claim(2);
        self.buf.put_u16(value);
    }

    pub fn write_i16(&mut self, value: i16) {
        self.claim(2);
        self.buf.put_i16(value);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.claim(4);
        self.buf.put_u32(value);
    }

    pub fn write_u64(&mut self, value: u64) {
        self.claim(8);
        self.buf.put_u64(value);
    }

    pub fn write_i64(&mut self, value: i64) {
        self.claim(8);
        self.buf.put_i64(value);
    }

    pub fn write_slice(&mut self, value: &[u8]) {
        self.claim(value.len());
        self.buf.put_slice(value);
    }

    /// Finish writing and freeze the buffer.
    ///
    /// # Panics
    ///
    /// Panics if fewer than `size` bytes were written.
    pub fn finish(self) -> Bytes {
        assert_eq!(
            self.buf.len(),
            self.size,
            "writer finished with {} of {} bytes written",
            self.buf.len(),
            self.size
        );
        self.buf.freeze()
    }
}

/// Sequential reader with random access over a borrowed span.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current cursor position from the start of the span.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left after the cursor.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Move the cursor relative to the start, the current position or the end of the span.
    ///
    /// Returns the new position. Seeking to exactly the end is allowed; anything outside
    /// `0..=len` fails and leaves the cursor where it was.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<usize> {
        let len = self.data.len();
        let target = match pos {
            SeekFrom::Start(offset) => i64::try_from(offset).ok(),
            SeekFrom::Current(offset) => (self.pos as i64).checked_add(offset),
            SeekFrom::End(offset) => (len as i64).checked_add(offset),
        };

        let target = match target {
            Some(target) if (0..=len as i64).contains(&target) => target,
            // Overflowed targets are reported as the furthest representable offset.
            other => {
                return Err(ClusterwireError::SeekOutOfRange {
                    offset: other.unwrap_or(i64::MAX),
                    len,
                })
            }
        };

        self.pos = target as usize;
        Ok(self.pos)
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(ClusterwireError::Truncated {
                needed: n,
                available: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Read a one-byte boolean. Any non-zero byte is `true`.
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.take_array()?))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(i16::from_be_bytes(self.take_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.take_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_be_bytes(self.take_array()?))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_be_bytes(self.take_array()?))
    }

    /// Read `N` raw bytes into an array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.take_array()
    }

    /// Borrow the next `n` bytes without copying.
    pub fn read_slice(&mut self, n: usize) -> Result<&'a [u8]> {
        self.take(n)
    }
}
