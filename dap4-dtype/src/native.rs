use std::fmt::{Debug, Display};

use bytes::BufMut;

use crate::{AtomicType, ByteOrder, Value, Vector};

/// A Rust type that is the in-memory representation of a fixed-width DAP4 type.
///
/// `u8` represents [`AtomicType::UInt8`]. Char values are also held as `u8`, but only through
/// [`Value::Char`] and [`Vector::Char`].
pub trait NativeType:
    Copy + Debug + Display + PartialEq + PartialOrd + Default + Send + Sync + 'static
{
    /// The DAP4 type represented by this Rust type.
    const ATYPE: AtomicType;

    /// Decode one value from the first `size_of::<Self>()` bytes of `bytes`.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is shorter than the width of the type.
    fn decode(bytes: &[u8], order: ByteOrder) -> Self;

    /// Append the serialized form of this value to `out`.
    fn encode<B: BufMut>(self, order: ByteOrder, out: &mut B);

    /// Borrow a vector's values as a slice of this type, if the vector holds this type.
    fn slice_of(vector: &Vector) -> Option<&[Self]>;

    /// Wrap the value.
    fn into_value(self) -> Value;
}

macro_rules! native_type {
    ($T:ty, $A:ident) => {
        impl NativeType for $T {
            const ATYPE: AtomicType = AtomicType::$A;

            #[inline]
            fn decode(bytes: &[u8], order: ByteOrder) -> Self {
                let mut raw = [0u8; size_of::<$T>()];
                raw.copy_from_slice(&bytes[..size_of::<$T>()]);
                match order {
                    ByteOrder::BigEndian => <$T>::from_be_bytes(raw),
                    ByteOrder::LittleEndian => <$T>::from_le_bytes(raw),
                }
            }

            #[inline]
            fn encode<B: BufMut>(self, order: ByteOrder, out: &mut B) {
                match order {
                    ByteOrder::BigEndian => out.put_slice(&self.to_be_bytes()),
                    ByteOrder::LittleEndian => out.put_slice(&self.to_le_bytes()),
                }
            }

            fn slice_of(vector: &Vector) -> Option<&[Self]> {
                match vector {
                    Vector::$A(values) => Some(values),
                    _ => None,
                }
            }

            fn into_value(self) -> Value {
                Value::$A(self)
            }
        }

        impl From<$T> for Value {
            fn from(value: $T) -> Self {
                Value::$A(value)
            }
        }

        impl From<Vec<$T>> for Vector {
            fn from(values: Vec<$T>) -> Self {
                Vector::$A(values)
            }
        }
    };
}

native_type!(i8, Int8);
native_type!(u8, UInt8);
native_type!(i16, Int16);
native_type!(u16, UInt16);
native_type!(i32, Int32);
native_type!(u32, UInt32);
native_type!(i64, Int64);
native_type!(u64, UInt64);
native_type!(f32, Float32);
native_type!(f64, Float64);
