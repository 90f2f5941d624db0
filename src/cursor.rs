//! A read cursor over an immutable byte buffer.
//!
//! Reads advance the cursor, peeks never do.
//! A cursor can hand out a framed sub-cursor bounding a nested read to an exact byte length;
//! reading past the end of a frame is an `EndOfFrame` error rather than an `EndOfData` error.

use crate::prelude::*;

#[derive(Copy, Clone, Debug)]
pub(crate) struct Cursor<'a> {
    /// Starts at the current read position, ends at the end of the frame (or input).
    raw: &'a [u8],
    /// Absolute offset of `raw[0]` in the original input.
    offset: usize,
    framed: bool,
}
impl<'a> Cursor<'a> {
    pub(crate) fn new(raw: &'a [u8]) -> Cursor<'a> {
        Cursor {
            raw,
            offset: 0,
            framed: false,
        }
    }

    /// Absolute offset of the next byte to be read.
    #[inline]
    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub(crate) fn remaining(&self) -> usize {
        self.raw.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// The unread bytes, without consuming them.
    #[inline]
    pub(crate) fn unread(&self) -> &'a [u8] {
        self.raw
    }

    /// Drop every remaining byte.
    #[inline]
    pub(crate) fn exhaust(&mut self) {
        self.offset += self.raw.len();
        self.raw = &[];
    }

    /// Build a truncation error for a read of `wanted` bytes at the current position.
    pub(crate) fn truncated(&self, wanted: usize) -> Error {
        let available = self.raw.len();
        let kind = if self.framed {
            ErrorKind::EndOfFrame { wanted, available }
        } else {
            ErrorKind::EndOfData { wanted, available }
        };
        Error::new(kind, self.offset)
    }

    /// Fail unless at least `len` bytes are left.
    #[inline]
    pub(crate) fn require(&self, len: usize) -> Result<()> {
        ensure!(self.raw.len() >= len, self.truncated(len));
        Ok(())
    }

    #[inline]
    pub(crate) fn peek(&self, len: usize) -> Result<&'a [u8]> {
        self.raw.get(..len).ok_or_else(|| self.truncated(len))
    }

    #[inline]
    pub(crate) fn read(&mut self, len: usize) -> Result<&'a [u8]> {
        let bytes = self.peek(len)?;
        self.raw = &self.raw[len..];
        self.offset += len;
        Ok(bytes)
    }

    /// Move forward by `len` bytes without looking at them.
    #[inline]
    pub(crate) fn skip(&mut self, len: usize) -> Result<()> {
        self.read(len).map(|_| ())
    }

    #[inline]
    pub(crate) fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read(1)?[0])
    }

    #[inline]
    pub(crate) fn read_u16(&mut self) -> Result<u16> {
        let buf = self.read(2)?;
        Ok(u16::from_be_bytes([buf[0], buf[1]]))
    }

    #[inline]
    pub(crate) fn read_i32(&mut self) -> Result<i32> {
        let buf = self.read(4)?;
        Ok(i32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]))
    }

    /// Split off the next `len` bytes as a framed cursor, advancing this cursor past them.
    pub(crate) fn frame(&mut self, len: usize) -> Result<Cursor<'a>> {
        let offset = self.offset;
        let raw = self.read(len)?;
        Ok(Cursor {
            raw,
            offset,
            framed: true,
        })
    }
}

