use std::fmt::{Display, Formatter};

use bytes::Bytes;
use dap4_error::{Dap4Result, dap4_bail};
use num_traits::NumCast;
use paste::paste;

use crate::{AtomicType, ByteOrder, NativeType, TypeSize};

/// A single decoded datum.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// An 8-bit character.
    Char(u8),
    /// A signed 8-bit integer.
    Int8(i8),
    /// An unsigned 8-bit integer.
    UInt8(u8),
    /// A signed 16-bit integer.
    Int16(i16),
    /// An unsigned 16-bit integer.
    UInt16(u16),
    /// A signed 32-bit integer.
    Int32(i32),
    /// An unsigned 32-bit integer.
    UInt32(u32),
    /// A signed 64-bit integer.
    Int64(i64),
    /// An unsigned 64-bit integer.
    UInt64(u64),
    /// A single precision float.
    Float32(f32),
    /// A double precision float.
    Float64(f64),
    /// A string.
    String(String),
    /// A URL.
    Url(String),
    /// Uninterpreted bytes, sharing the response buffer.
    Opaque(Bytes),
}

macro_rules! as_primitive {
    ($T:ty) => {
        paste! {
            #[doc = "Access the value as `" $T "`, returning `None` if it is not numeric or does not fit"]
            pub fn [<as_ $T>](&self) -> Option<$T> {
                match self {
                    Value::Char(v) => <$T as NumCast>::from(*v),
                    Value::Int8(v) => <$T as NumCast>::from(*v),
                    Value::UInt8(v) => <$T as NumCast>::from(*v),
                    Value::Int16(v) => <$T as NumCast>::from(*v),
                    Value::UInt16(v) => <$T as NumCast>::from(*v),
                    Value::Int32(v) => <$T as NumCast>::from(*v),
                    Value::UInt32(v) => <$T as NumCast>::from(*v),
                    Value::Int64(v) => <$T as NumCast>::from(*v),
                    Value::UInt64(v) => <$T as NumCast>::from(*v),
                    Value::Float32(v) => <$T as NumCast>::from(*v),
                    Value::Float64(v) => <$T as NumCast>::from(*v),
                    Value::String(_) | Value::Url(_) | Value::Opaque(_) => None,
                }
            }
        }
    };
}

impl Value {
    /// The type of the value.
    pub fn atomic_type(&self) -> AtomicType {
        match self {
            Self::Char(_) => AtomicType::Char,
            Self::Int8(_) => AtomicType::Int8,
            Self::UInt8(_) => AtomicType::UInt8,
            Self::Int16(_) => AtomicType::Int16,
            Self::UInt16(_) => AtomicType::UInt16,
            Self::Int32(_) => AtomicType::Int32,
            Self::UInt32(_) => AtomicType::UInt32,
            Self::Int64(_) => AtomicType::Int64,
            Self::UInt64(_) => AtomicType::UInt64,
            Self::Float32(_) => AtomicType::Float32,
            Self::Float64(_) => AtomicType::Float64,
            Self::String(_) => AtomicType::String,
            Self::Url(_) => AtomicType::Url,
            Self::Opaque(_) => AtomicType::Opaque,
        }
    }

    /// Whether the value has the given type.
    pub fn is_instance_of(&self, atype: AtomicType) -> bool {
        self.atomic_type() == atype
    }

    /// Decode one fixed-width value of type `atype` from the start of `bytes`.
    pub fn decode_fixed(atype: AtomicType, bytes: &[u8], order: ByteOrder) -> Dap4Result<Self> {
        let TypeSize::Fixed(width) = atype.serial_size() else {
            dap4_bail!(Conversion: "{} is not a fixed width type", atype);
        };
        if bytes.len() < width {
            dap4_bail!(
                Layout: "{} needs {} bytes, only {} available",
                atype,
                width,
                bytes.len()
            );
        }
        Ok(match atype {
            AtomicType::Char => Value::Char(bytes[0]),
            AtomicType::Int8 => i8::decode(bytes, order).into(),
            AtomicType::UInt8 => u8::decode(bytes, order).into(),
            AtomicType::Int16 => i16::decode(bytes, order).into(),
            AtomicType::UInt16 => u16::decode(bytes, order).into(),
            AtomicType::Int32 => i32::decode(bytes, order).into(),
            AtomicType::UInt32 => u32::decode(bytes, order).into(),
            AtomicType::Int64 => i64::decode(bytes, order).into(),
            AtomicType::UInt64 => u64::decode(bytes, order).into(),
            AtomicType::Float32 => f32::decode(bytes, order).into(),
            AtomicType::Float64 => f64::decode(bytes, order).into(),
            AtomicType::String | AtomicType::Url | AtomicType::Opaque => {
                unreachable!("variable length types handled above")
            }
        })
    }

    /// Borrow the string held by a String or URL value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Url(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the bytes held by an Opaque value.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Opaque(b) => Some(b),
            _ => None,
        }
    }

    as_primitive!(i8);
    as_primitive!(u8);
    as_primitive!(i16);
    as_primitive!(u16);
    as_primitive!(i32);
    as_primitive!(u32);
    as_primitive!(i64);
    as_primitive!(u64);
    as_primitive!(f32);
    as_primitive!(f64);
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<Bytes> for Value {
    fn from(value: Bytes) -> Self {
        Value::Opaque(value)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Char(v) => write!(f, "'{}'", char::from(*v)),
            Self::Int8(v) => write!(f, "{}", v),
            Self::UInt8(v) => write!(f, "{}", v),
            Self::Int16(v) => write!(f, "{}", v),
            Self::UInt16(v) => write!(f, "{}", v),
            Self::Int32(v) => write!(f, "{}", v),
            Self::UInt32(v) => write!(f, "{}", v),
            Self::Int64(v) => write!(f, "{}", v),
            Self::UInt64(v) => write!(f, "{}", v),
            Self::Float32(v) => write!(f, "{}", v),
            Self::Float64(v) => write!(f, "{}", v),
            Self::String(v) | Self::Url(v) => write!(f, "\"{}\"", v),
            Self::Opaque(v) => {
                write!(f, "0x")?;
                for b in v.iter() {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_fixed_values() {
        let value = Value::decode_fixed(AtomicType::Int32, &[0, 0, 0, 42], ByteOrder::BigEndian);
        assert_eq!(value.unwrap(), Value::Int32(42));

        let value = Value::decode_fixed(AtomicType::Char, b"x", ByteOrder::LittleEndian);
        assert_eq!(value.unwrap(), Value::Char(b'x'));
    }

    #[test]
    fn decode_fixed_rejects_short_and_variable() {
        assert!(Value::decode_fixed(AtomicType::Int64, &[0; 4], ByteOrder::BigEndian).is_err());
        assert!(Value::decode_fixed(AtomicType::String, &[0; 8], ByteOrder::BigEndian).is_err());
    }

    #[test]
    fn accessors() {
        assert_eq!(Value::UInt8(200).as_i8(), None);
        assert_eq!(Value::UInt8(200).as_i16(), Some(200));
        assert_eq!(Value::Float64(2.0).as_u32(), Some(2));
        assert_eq!(Value::from("abc").as_str(), Some("abc"));
        assert_eq!(Value::from("abc").as_i64(), None);
    }

    #[test]
    fn display() {
        assert_eq!(Value::Char(b'a').to_string(), "'a'");
        assert_eq!(Value::from("hi").to_string(), "\"hi\"");
        assert_eq!(
            Value::Opaque(Bytes::from_static(&[0xde, 0xad])).to_string(),
            "0xdead"
        );
    }
}
