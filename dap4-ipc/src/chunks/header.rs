use std::fmt::{Display, Formatter};
use std::ops::BitOr;

use bytes::BufMut;
use dap4_dtype::ByteOrder;
use dap4_error::{Dap4Result, dap4_bail};

/// The size of a chunk header in bytes.
pub const HEADER_SIZE: usize = 4;

/// The largest payload a single chunk can carry.
pub const MAX_CHUNK_SIZE: usize = 0x00FF_FFFF;

/// The flag bits carried in the first byte of a chunk header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChunkFlags(u8);

impl ChunkFlags {
    /// No flags: an ordinary data chunk.
    pub const DATA: Self = Self(0x00);
    /// This is the last chunk of the response.
    pub const END: Self = Self(0x01);
    /// The payload is an error document rather than data.
    pub const ERROR: Self = Self(0x02);
    /// Multi-byte values in the data are little-endian.
    pub const LITTLE_ENDIAN: Self = Self(0x04);
    /// The data carries no checksums.
    pub const NOCHECKSUM: Self = Self(0x08);

    const KNOWN: u8 = 0x0F;

    /// The raw flag bits.
    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// Flags from raw bits. Unknown bits are kept but have no meaning.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Whether every bit of `other` is set.
    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// The flags with the bits of `other` also set, or cleared when `on` is false.
    pub const fn with(self, other: Self, on: bool) -> Self {
        if on {
            Self(self.0 | other.0)
        } else {
            Self(self.0 & !other.0)
        }
    }

    /// Whether this is the last chunk.
    pub const fn is_end(&self) -> bool {
        self.contains(Self::END)
    }

    /// Whether the chunk carries an error document.
    pub const fn is_error(&self) -> bool {
        self.contains(Self::ERROR)
    }

    /// The byte order the flags announce for the data.
    pub fn byte_order(&self) -> ByteOrder {
        ByteOrder::from(self.contains(Self::LITTLE_ENDIAN))
    }

    /// Whether the flags announce that the data carries checksums.
    pub const fn has_checksums(&self) -> bool {
        !self.contains(Self::NOCHECKSUM)
    }

    /// Bits set that no known flag accounts for.
    pub const fn unknown_bits(&self) -> u8 {
        self.0 & !Self::KNOWN
    }
}

impl BitOr for ChunkFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl Display for ChunkFlags {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut names = Vec::new();
        if self.is_end() {
            names.push("END");
        }
        if self.is_error() {
            names.push("ERROR");
        }
        if self.contains(Self::LITTLE_ENDIAN) {
            names.push("LITTLE_ENDIAN");
        }
        if self.contains(Self::NOCHECKSUM) {
            names.push("NOCHECKSUM");
        }
        if names.is_empty() {
            names.push("DATA");
        }
        write!(f, "{}", names.join("|"))
    }
}

/// A decoded chunk header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkHeader {
    flags: ChunkFlags,
    size: usize,
}

impl ChunkHeader {
    /// A header for a payload of `size` bytes, at most [`MAX_CHUNK_SIZE`].
    pub fn try_new(flags: ChunkFlags, size: usize) -> Dap4Result<Self> {
        if size > MAX_CHUNK_SIZE {
            dap4_bail!(
                "chunk payload of {} bytes exceeds the maximum of {}",
                size,
                MAX_CHUNK_SIZE
            );
        }
        Ok(Self { flags, size })
    }

    /// Decode a header from its 4-byte wire form.
    pub fn decode(bytes: [u8; HEADER_SIZE]) -> Self {
        let size = (usize::from(bytes[1]) << 16) | (usize::from(bytes[2]) << 8) | usize::from(bytes[3]);
        Self {
            flags: ChunkFlags::from_bits(bytes[0]),
            size,
        }
    }

    /// Append the 4-byte wire form to `out`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn encode<B: BufMut>(&self, out: &mut B) {
        out.put_u8(self.flags.bits());
        out.put_u8((self.size >> 16) as u8);
        out.put_u8((self.size >> 8) as u8);
        out.put_u8(self.size as u8);
    }

    /// The chunk flags.
    pub fn flags(&self) -> ChunkFlags {
        self.flags
    }

    /// The payload size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case([0x00, 0x00, 0x00, 0x10], ChunkFlags::DATA, 16)]
    #[case([0x01, 0x00, 0x01, 0x00], ChunkFlags::END, 256)]
    #[case([0x06, 0x01, 0x00, 0x00], ChunkFlags::ERROR | ChunkFlags::LITTLE_ENDIAN, 65536)]
    #[case([0x0D, 0xFF, 0xFF, 0xFF], ChunkFlags::END | ChunkFlags::LITTLE_ENDIAN | ChunkFlags::NOCHECKSUM, MAX_CHUNK_SIZE)]
    fn wire_form(#[case] wire: [u8; 4], #[case] flags: ChunkFlags, #[case] size: usize) {
        let header = ChunkHeader::decode(wire);
        assert_eq!(header.flags(), flags);
        assert_eq!(header.size(), size);

        let mut out = Vec::new();
        header.encode(&mut out);
        assert_eq!(out, wire);
    }

    #[test]
    fn flags() {
        let flags = ChunkFlags::END | ChunkFlags::LITTLE_ENDIAN;
        assert!(flags.is_end());
        assert!(!flags.is_error());
        assert_eq!(flags.byte_order(), ByteOrder::LittleEndian);
        assert!(flags.has_checksums());
        assert!(!flags.with(ChunkFlags::END, false).is_end());
        assert_eq!(flags.to_string(), "END|LITTLE_ENDIAN");
        assert_eq!(ChunkFlags::from_bits(0x30).unknown_bits(), 0x30);
    }

    #[test]
    fn oversized_payload() {
        assert!(ChunkHeader::try_new(ChunkFlags::DATA, MAX_CHUNK_SIZE + 1).is_err());
    }
}
