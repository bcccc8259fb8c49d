use bytes::{BufMut, BytesMut};
use dap4_dtype::{ByteOrder, NativeType, Value};

use crate::{Checksum, DataBuffer};

/// Serializes values in the DAP4 data layout.
///
/// Fixed-width values are written in the writer's byte order, variable-length values as an
/// 8-byte length followed by their bytes.
#[derive(Debug)]
pub struct DataWriter {
    buf: BytesMut,
    order: ByteOrder,
}

impl DataWriter {
    /// A new writer producing `order` encoded values.
    pub fn new(order: ByteOrder) -> Self {
        Self {
            buf: BytesMut::new(),
            order,
        }
    }

    /// The byte order values are written in.
    pub fn order(&self) -> ByteOrder {
        self.order
    }

    /// The number of bytes written so far.
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    /// Write a fixed-width value.
    pub fn put<T: NativeType>(&mut self, value: T) -> &mut Self {
        value.encode(self.order, &mut self.buf);
        self
    }

    /// Write an 8-byte count or length.
    pub fn put_count(&mut self, count: u64) -> &mut Self {
        self.put(count)
    }

    /// Write a single character.
    pub fn put_char(&mut self, c: u8) -> &mut Self {
        self.buf.put_u8(c);
        self
    }

    /// Write a length prefixed byte string.
    pub fn put_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.put_count(bytes.len() as u64);
        self.buf.put_slice(bytes);
        self
    }

    /// Write a length prefixed string.
    pub fn put_str(&mut self, s: &str) -> &mut Self {
        self.put_bytes(s.as_bytes())
    }

    /// Write any value in its serialized form.
    pub fn put_value(&mut self, value: &Value) -> &mut Self {
        match value {
            Value::Char(v) => self.put_char(*v),
            Value::Int8(v) => self.put(*v),
            Value::UInt8(v) => self.put(*v),
            Value::Int16(v) => self.put(*v),
            Value::UInt16(v) => self.put(*v),
            Value::Int32(v) => self.put(*v),
            Value::UInt32(v) => self.put(*v),
            Value::Int64(v) => self.put(*v),
            Value::UInt64(v) => self.put(*v),
            Value::Float32(v) => self.put(*v),
            Value::Float64(v) => self.put(*v),
            Value::String(v) | Value::Url(v) => self.put_str(v),
            Value::Opaque(v) => self.put_bytes(v),
        }
    }

    /// Write raw bytes with no prefix.
    pub fn put_raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.put_slice(bytes);
        self
    }

    /// Write the checksum of everything written since `start`.
    pub fn put_checksum(&mut self, start: usize) -> &mut Self {
        let checksum = Checksum::compute(&self.buf[start..]);
        checksum.encode(self.order, &mut self.buf);
        self
    }

    /// Finish writing, returning the serialized buffer.
    pub fn finish(self) -> DataBuffer {
        DataBuffer::new(self.buf.freeze(), self.order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CHECKSUM_SIZE;

    #[test]
    fn writes_data_layout() {
        let mut writer = DataWriter::new(ByteOrder::BigEndian);
        writer
            .put(42i32)
            .put_str("hi")
            .put_value(&Value::Char(b'c'));
        let buffer = writer.finish();

        let mut cursor = buffer.cursor();
        assert_eq!(cursor.read::<i32>().unwrap(), 42);
        assert_eq!(cursor.read_count().unwrap(), 2);
        assert_eq!(cursor.take(2).unwrap(), b"hi");
        assert_eq!(cursor.take(1).unwrap(), b"c");
        assert!(cursor.is_at_end());
    }

    #[test]
    fn checksum_covers_region() {
        let mut writer = DataWriter::new(ByteOrder::LittleEndian);
        writer.put(1u8);
        let start = writer.position();
        writer.put(2.5f64).put_checksum(start);
        let buffer = writer.finish();

        assert_eq!(buffer.len(), 1 + 8 + CHECKSUM_SIZE);
        let stored = Checksum::decode(&buffer.as_slice()[9..], ByteOrder::LittleEndian);
        assert_eq!(stored, Checksum::compute(&buffer.as_slice()[1..9]));
    }
}
