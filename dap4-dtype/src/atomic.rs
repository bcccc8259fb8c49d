use std::fmt::{Display, Formatter};
use std::str::FromStr;

use dap4_error::{Dap4Error, dap4_err};

/// The number of bytes one element of a type occupies in a serialized data response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeSize {
    /// Every element occupies exactly this many bytes.
    Fixed(usize),
    /// Each element is an 8-byte length followed by that many bytes.
    Variable,
}

impl TypeSize {
    /// The fixed width, or `None` for variable-length types.
    pub fn fixed(&self) -> Option<usize> {
        match self {
            Self::Fixed(width) => Some(*width),
            Self::Variable => None,
        }
    }

    /// Whether elements of this size carry their own length prefix.
    pub fn is_variable(&self) -> bool {
        matches!(self, Self::Variable)
    }
}

/// The DAP4 primitive types.
///
/// Enumerations are not listed here: an enumeration is always serialized as its integer base
/// type, see [`crate::DapType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AtomicType {
    /// A single 8-bit character.
    Char,
    /// Signed 8-bit integer.
    Int8,
    /// Unsigned 8-bit integer, also spelled `Byte`.
    UInt8,
    /// Signed 16-bit integer.
    Int16,
    /// Unsigned 16-bit integer.
    UInt16,
    /// Signed 32-bit integer.
    Int32,
    /// Unsigned 32-bit integer.
    UInt32,
    /// Signed 64-bit integer.
    Int64,
    /// Unsigned 64-bit integer.
    UInt64,
    /// IEEE-754 single precision float.
    Float32,
    /// IEEE-754 double precision float.
    Float64,
    /// UTF-8 string.
    String,
    /// A URL, serialized like a string.
    Url,
    /// Uninterpreted bytes.
    Opaque,
}

impl AtomicType {
    /// All atomic types, in declaration order.
    pub const ALL: [AtomicType; 14] = [
        AtomicType::Char,
        AtomicType::Int8,
        AtomicType::UInt8,
        AtomicType::Int16,
        AtomicType::UInt16,
        AtomicType::Int32,
        AtomicType::UInt32,
        AtomicType::Int64,
        AtomicType::UInt64,
        AtomicType::Float32,
        AtomicType::Float64,
        AtomicType::String,
        AtomicType::Url,
        AtomicType::Opaque,
    ];

    /// The serialized width of one element.
    ///
    /// Char is serialized as a single byte even though characters are logically wider.
    pub const fn serial_size(&self) -> TypeSize {
        match self {
            Self::Char | Self::Int8 | Self::UInt8 => TypeSize::Fixed(1),
            Self::Int16 | Self::UInt16 => TypeSize::Fixed(2),
            Self::Int32 | Self::UInt32 | Self::Float32 => TypeSize::Fixed(4),
            Self::Int64 | Self::UInt64 | Self::Float64 => TypeSize::Fixed(8),
            Self::String | Self::Url | Self::Opaque => TypeSize::Variable,
        }
    }

    /// Whether the type is an integer, signed or unsigned. Char is not an integer.
    pub const fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::Int8
                | Self::UInt8
                | Self::Int16
                | Self::UInt16
                | Self::Int32
                | Self::UInt32
                | Self::Int64
                | Self::UInt64
        )
    }

    /// Whether the type is an unsigned integer.
    pub const fn is_unsigned(&self) -> bool {
        matches!(
            self,
            Self::UInt8 | Self::UInt16 | Self::UInt32 | Self::UInt64
        )
    }

    /// Whether the type is a floating point type.
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// Whether the type is numeric: an integer, a float, or a char.
    pub const fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float() || self.is_char()
    }

    /// Whether the type is [`AtomicType::Char`].
    pub const fn is_char(&self) -> bool {
        matches!(self, Self::Char)
    }

    /// Whether the type is a string or a URL.
    pub const fn is_string(&self) -> bool {
        matches!(self, Self::String | Self::Url)
    }

    /// Whether elements of the type carry their own length prefix.
    pub const fn is_variable_length(&self) -> bool {
        matches!(self.serial_size(), TypeSize::Variable)
    }

    /// The signed type of the same width, for integer types. Other types are returned as-is.
    pub const fn signed_version(&self) -> Self {
        match self {
            Self::UInt8 => Self::Int8,
            Self::UInt16 => Self::Int16,
            Self::UInt32 => Self::Int32,
            Self::UInt64 => Self::Int64,
            other => *other,
        }
    }

    /// The unsigned type of the same width, for integer types. Other types are returned as-is.
    pub const fn unsigned_version(&self) -> Self {
        match self {
            Self::Int8 => Self::UInt8,
            Self::Int16 => Self::UInt16,
            Self::Int32 => Self::UInt32,
            Self::Int64 => Self::UInt64,
            other => *other,
        }
    }

    /// The DAP4 spelling of the type name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Char => "Char",
            Self::Int8 => "Int8",
            Self::UInt8 => "UInt8",
            Self::Int16 => "Int16",
            Self::UInt16 => "UInt16",
            Self::Int32 => "Int32",
            Self::UInt32 => "UInt32",
            Self::Int64 => "Int64",
            Self::UInt64 => "UInt64",
            Self::Float32 => "Float32",
            Self::Float64 => "Float64",
            Self::String => "String",
            Self::Url => "URL",
            Self::Opaque => "Opaque",
        }
    }
}

impl Display for AtomicType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AtomicType {
    type Err = Dap4Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "Byte" {
            return Ok(AtomicType::UInt8);
        }
        AtomicType::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| dap4_err!(Lookup: "unknown atomic type {}", s))
    }
}
