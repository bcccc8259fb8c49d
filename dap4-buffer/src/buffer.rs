use std::ops::Range;

use bytes::Bytes;
use dap4_dtype::{ByteOrder, NativeType};
use dap4_error::{Dap4Result, dap4_bail};

use crate::{BufferCursor, COUNT_SIZE};

/// An immutable, cheaply cloneable byte buffer tagged with the byte order of its contents.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DataBuffer {
    bytes: Bytes,
    order: ByteOrder,
}

impl DataBuffer {
    /// Wrap some bytes.
    pub fn new(bytes: impl Into<Bytes>, order: ByteOrder) -> Self {
        Self {
            bytes: bytes.into(),
            order,
        }
    }

    /// An empty buffer.
    pub fn empty(order: ByteOrder) -> Self {
        Self::new(Bytes::new(), order)
    }

    /// The number of bytes in the buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the buffer holds no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The byte order of multi-byte values in the buffer.
    #[inline]
    pub fn order(&self) -> ByteOrder {
        self.order
    }

    /// The underlying bytes.
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// The underlying bytes as a slice.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// A zero-copy view of `range`, which must lie within the buffer.
    pub fn slice(&self, range: Range<usize>) -> Dap4Result<Bytes> {
        self.check_range(&range)?;
        Ok(self.bytes.slice(range))
    }

    /// Borrow the bytes in `range`, which must lie within the buffer.
    pub fn slice_ref(&self, range: Range<usize>) -> Dap4Result<&[u8]> {
        self.check_range(&range)?;
        Ok(&self.bytes[range])
    }

    /// Decode one value at an absolute offset.
    pub fn read<T: NativeType>(&self, offset: usize) -> Dap4Result<T> {
        let end = offset.saturating_add(size_of::<T>());
        let bytes = self.slice_ref(offset..end)?;
        Ok(T::decode(bytes, self.order))
    }

    /// Decode an 8-byte count or length at an absolute offset.
    pub fn read_count(&self, offset: usize) -> Dap4Result<u64> {
        let end = offset.saturating_add(COUNT_SIZE);
        let bytes = self.slice_ref(offset..end)?;
        Ok(u64::decode(bytes, self.order))
    }

    /// A read position at the start of the buffer.
    pub fn cursor(&self) -> BufferCursor<'_> {
        BufferCursor::new(self)
    }

    fn check_range(&self, range: &Range<usize>) -> Dap4Result<()> {
        if range.start > range.end || range.end > self.len() {
            dap4_bail!(
                Layout: "byte range {}..{} is outside a buffer of {} bytes",
                range.start,
                range.end,
                self.len()
            );
        }
        Ok(())
    }
}

impl From<Vec<u8>> for DataBuffer {
    fn from(value: Vec<u8>) -> Self {
        Self::new(value, ByteOrder::default())
    }
}

impl AsRef<[u8]> for DataBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}
