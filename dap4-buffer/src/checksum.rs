use std::fmt::{Display, Formatter};

use bytes::BufMut;
use dap4_dtype::{ByteOrder, NativeType};

/// The number of bytes a checksum occupies after a top-level variable.
pub const CHECKSUM_SIZE: usize = 4;

/// A CRC-32 checksum as stored in a data response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Checksum(u32);

impl Checksum {
    /// Wrap a raw checksum value.
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Compute the checksum of `bytes`.
    pub fn compute(bytes: &[u8]) -> Self {
        Self(crc32fast::hash(bytes))
    }

    /// Decode a stored checksum from the first four bytes of `bytes`.
    pub fn decode(bytes: &[u8], order: ByteOrder) -> Self {
        Self(u32::decode(bytes, order))
    }

    /// Append the stored form of the checksum to `out`.
    pub fn encode<B: BufMut>(&self, order: ByteOrder, out: &mut B) {
        self.0.encode(order, out)
    }

    /// The checksum value.
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl Display for Checksum {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_value() {
        // The standard CRC-32 check value.
        let checksum = Checksum::compute(b"123456789");
        assert_eq!(checksum.value(), 0xcbf4_3926);
        assert_eq!(checksum.to_string(), "cbf43926");
    }

    #[test]
    fn stored_form_follows_byte_order() {
        let checksum = Checksum::new(0x0102_0304);
        let mut out = Vec::new();
        checksum.encode(ByteOrder::LittleEndian, &mut out);
        assert_eq!(out, [4, 3, 2, 1]);
        assert_eq!(Checksum::decode(&out, ByteOrder::LittleEndian), checksum);
        assert_ne!(Checksum::decode(&out, ByteOrder::BigEndian), checksum);
    }
}
