use dap4_dtype::NativeType;
use dap4_error::{Dap4Result, dap4_bail};

use crate::{COUNT_SIZE, DataBuffer};

/// A forward-only read position over a [`DataBuffer`].
///
/// The cursor is `Copy`: a look-ahead scan works on a copy, and the original is then moved to
/// the copy's position with [`BufferCursor::advance_to`].
#[derive(Debug, Clone, Copy)]
pub struct BufferCursor<'a> {
    buffer: &'a DataBuffer,
    pos: usize,
}

impl<'a> BufferCursor<'a> {
    /// A cursor at the start of `buffer`.
    pub fn new(buffer: &'a DataBuffer) -> Self {
        Self { buffer, pos: 0 }
    }

    /// The buffer being read.
    pub fn buffer(&self) -> &'a DataBuffer {
        self.buffer
    }

    /// The absolute offset of the next read.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// The number of bytes left after the current position.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.pos
    }

    /// Whether every byte has been consumed.
    pub fn is_at_end(&self) -> bool {
        self.remaining() == 0
    }

    /// Advance by `len` bytes, returning the offset the skipped region started at.
    pub fn skip(&mut self, len: usize) -> Dap4Result<usize> {
        let start = self.pos;
        self.take(len)?;
        Ok(start)
    }

    /// Borrow the next `len` bytes and advance past them.
    pub fn take(&mut self, len: usize) -> Dap4Result<&'a [u8]> {
        if len > self.remaining() {
            dap4_bail!(
                Layout: "need {} bytes at offset {}, only {} remain",
                len,
                self.pos,
                self.remaining()
            );
        }
        let buffer: &'a DataBuffer = self.buffer;
        let bytes = &buffer.as_slice()[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Decode one value and advance past it.
    pub fn read<T: NativeType>(&mut self) -> Dap4Result<T> {
        let order = self.buffer.order();
        let bytes = self.take(size_of::<T>())?;
        Ok(T::decode(bytes, order))
    }

    /// Decode an 8-byte count or length and advance past it.
    pub fn read_count(&mut self) -> Dap4Result<u64> {
        let order = self.buffer.order();
        let bytes = self.take(COUNT_SIZE)?;
        Ok(u64::decode(bytes, order))
    }

    /// Move forward to an absolute position. Moving backwards is an error.
    pub fn advance_to(&mut self, pos: usize) -> Dap4Result<()> {
        if pos < self.pos {
            dap4_bail!(
                "cannot move a read position backwards from {} to {}",
                self.pos,
                pos
            );
        }
        if pos > self.buffer.len() {
            dap4_bail!(
                Layout: "position {} is past the end of a buffer of {} bytes",
                pos,
                self.buffer.len()
            );
        }
        self.pos = pos;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use dap4_dtype::ByteOrder;

    use super::*;

    fn buffer() -> DataBuffer {
        let mut bytes = 2u64.to_le_bytes().to_vec();
        bytes.extend_from_slice(b"ab");
        bytes.extend_from_slice(&7i16.to_le_bytes());
        DataBuffer::new(bytes, ByteOrder::LittleEndian)
    }

    #[test]
    fn sequential_reads() {
        let buffer = buffer();
        let mut cursor = buffer.cursor();
        let len = cursor.read_count().unwrap();
        assert_eq!(cursor.take(usize::try_from(len).unwrap()).unwrap(), b"ab");
        assert_eq!(cursor.read::<i16>().unwrap(), 7);
        assert!(cursor.is_at_end());
        assert!(cursor.read::<u8>().is_err());
    }

    #[test]
    fn failed_read_does_not_move() {
        let buffer = buffer();
        let mut cursor = buffer.cursor();
        cursor.skip(10).unwrap();
        assert!(cursor.read::<i32>().is_err());
        assert_eq!(cursor.position(), 10);
    }

    #[test]
    fn scan_with_copy_then_commit() {
        let buffer = buffer();
        let mut cursor = buffer.cursor();
        let mut scan = cursor;
        scan.skip(8).unwrap();
        scan.skip(2).unwrap();
        assert_eq!(cursor.position(), 0);

        cursor.advance_to(scan.position()).unwrap();
        assert_eq!(cursor.position(), 10);
        assert!(cursor.advance_to(4).is_err());
        assert!(cursor.advance_to(13).is_err());
    }
}
