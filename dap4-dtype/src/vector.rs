use bytes::Bytes;
use dap4_error::{Dap4Result, dap4_bail};

use crate::{AtomicType, ByteOrder, NativeType, TypeSize, Value, convert};

/// A column of decoded values, all of the same atomic type.
#[derive(Debug, Clone, PartialEq)]
pub enum Vector {
    /// 8-bit characters.
    Char(Vec<u8>),
    /// Signed 8-bit integers.
    Int8(Vec<i8>),
    /// Unsigned 8-bit integers.
    UInt8(Vec<u8>),
    /// Signed 16-bit integers.
    Int16(Vec<i16>),
    /// Unsigned 16-bit integers.
    UInt16(Vec<u16>),
    /// Signed 32-bit integers.
    Int32(Vec<i32>),
    /// Unsigned 32-bit integers.
    UInt32(Vec<u32>),
    /// Signed 64-bit integers.
    Int64(Vec<i64>),
    /// Unsigned 64-bit integers.
    UInt64(Vec<u64>),
    /// Single precision floats.
    Float32(Vec<f32>),
    /// Double precision floats.
    Float64(Vec<f64>),
    /// Strings.
    String(Vec<String>),
    /// URLs.
    Url(Vec<String>),
    /// Opaque byte blobs.
    Opaque(Vec<Bytes>),
}

macro_rules! match_each_vector {
    ($self:expr, | $v:ident | $body:expr) => {
        match $self {
            Vector::Char($v) => $body,
            Vector::Int8($v) => $body,
            Vector::UInt8($v) => $body,
            Vector::Int16($v) => $body,
            Vector::UInt16($v) => $body,
            Vector::Int32($v) => $body,
            Vector::UInt32($v) => $body,
            Vector::Int64($v) => $body,
            Vector::UInt64($v) => $body,
            Vector::Float32($v) => $body,
            Vector::Float64($v) => $body,
            Vector::String($v) => $body,
            Vector::Url($v) => $body,
            Vector::Opaque($v) => $body,
        }
    };
}

fn decode_all<T: NativeType>(bytes: &[u8], order: ByteOrder) -> Vec<T> {
    bytes
        .chunks_exact(size_of::<T>())
        .map(|chunk| T::decode(chunk, order))
        .collect()
}

impl Vector {
    /// An empty vector of the given type with room for `capacity` values.
    pub fn with_capacity(atype: AtomicType, capacity: usize) -> Self {
        match atype {
            AtomicType::Char => Vector::Char(Vec::with_capacity(capacity)),
            AtomicType::Int8 => Vector::Int8(Vec::with_capacity(capacity)),
            AtomicType::UInt8 => Vector::UInt8(Vec::with_capacity(capacity)),
            AtomicType::Int16 => Vector::Int16(Vec::with_capacity(capacity)),
            AtomicType::UInt16 => Vector::UInt16(Vec::with_capacity(capacity)),
            AtomicType::Int32 => Vector::Int32(Vec::with_capacity(capacity)),
            AtomicType::UInt32 => Vector::UInt32(Vec::with_capacity(capacity)),
            AtomicType::Int64 => Vector::Int64(Vec::with_capacity(capacity)),
            AtomicType::UInt64 => Vector::UInt64(Vec::with_capacity(capacity)),
            AtomicType::Float32 => Vector::Float32(Vec::with_capacity(capacity)),
            AtomicType::Float64 => Vector::Float64(Vec::with_capacity(capacity)),
            AtomicType::String => Vector::String(Vec::with_capacity(capacity)),
            AtomicType::Url => Vector::Url(Vec::with_capacity(capacity)),
            AtomicType::Opaque => Vector::Opaque(Vec::with_capacity(capacity)),
        }
    }

    /// Decode a run of contiguous fixed-width values.
    ///
    /// The length of `bytes` must be a multiple of the width of `atype`.
    pub fn decode_fixed(atype: AtomicType, bytes: &[u8], order: ByteOrder) -> Dap4Result<Self> {
        let TypeSize::Fixed(width) = atype.serial_size() else {
            dap4_bail!(Conversion: "{} is not a fixed width type", atype);
        };
        if bytes.len() % width != 0 {
            dap4_bail!(
                Layout: "{} bytes is not a whole number of {} values",
                bytes.len(),
                atype
            );
        }
        Ok(match atype {
            AtomicType::Char => Vector::Char(bytes.to_vec()),
            AtomicType::Int8 => decode_all::<i8>(bytes, order).into(),
            AtomicType::UInt8 => bytes.to_vec().into(),
            AtomicType::Int16 => decode_all::<i16>(bytes, order).into(),
            AtomicType::UInt16 => decode_all::<u16>(bytes, order).into(),
            AtomicType::Int32 => decode_all::<i32>(bytes, order).into(),
            AtomicType::UInt32 => decode_all::<u32>(bytes, order).into(),
            AtomicType::Int64 => decode_all::<i64>(bytes, order).into(),
            AtomicType::UInt64 => decode_all::<u64>(bytes, order).into(),
            AtomicType::Float32 => decode_all::<f32>(bytes, order).into(),
            AtomicType::Float64 => decode_all::<f64>(bytes, order).into(),
            AtomicType::String | AtomicType::Url | AtomicType::Opaque => {
                unreachable!("variable length types handled above")
            }
        })
    }

    /// The type of the values held.
    pub fn atomic_type(&self) -> AtomicType {
        match self {
            Vector::Char(_) => AtomicType::Char,
            Vector::Int8(_) => AtomicType::Int8,
            Vector::UInt8(_) => AtomicType::UInt8,
            Vector::Int16(_) => AtomicType::Int16,
            Vector::UInt16(_) => AtomicType::UInt16,
            Vector::Int32(_) => AtomicType::Int32,
            Vector::UInt32(_) => AtomicType::UInt32,
            Vector::Int64(_) => AtomicType::Int64,
            Vector::UInt64(_) => AtomicType::UInt64,
            Vector::Float32(_) => AtomicType::Float32,
            Vector::Float64(_) => AtomicType::Float64,
            Vector::String(_) => AtomicType::String,
            Vector::Url(_) => AtomicType::Url,
            Vector::Opaque(_) => AtomicType::Opaque,
        }
    }

    /// The number of values held.
    pub fn len(&self) -> usize {
        match_each_vector!(self, |v| v.len())
    }

    /// Whether the vector holds no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The value at `index`, or `None` if out of range.
    pub fn get(&self, index: usize) -> Option<Value> {
        Some(match self {
            Vector::Char(v) => Value::Char(*v.get(index)?),
            Vector::Int8(v) => v.get(index)?.into_value(),
            Vector::UInt8(v) => v.get(index)?.into_value(),
            Vector::Int16(v) => v.get(index)?.into_value(),
            Vector::UInt16(v) => v.get(index)?.into_value(),
            Vector::Int32(v) => v.get(index)?.into_value(),
            Vector::UInt32(v) => v.get(index)?.into_value(),
            Vector::Int64(v) => v.get(index)?.into_value(),
            Vector::UInt64(v) => v.get(index)?.into_value(),
            Vector::Float32(v) => v.get(index)?.into_value(),
            Vector::Float64(v) => v.get(index)?.into_value(),
            Vector::String(v) => Value::String(v.get(index)?.clone()),
            Vector::Url(v) => Value::Url(v.get(index)?.clone()),
            Vector::Opaque(v) => Value::Opaque(v.get(index)?.clone()),
        })
    }

    /// Append a value. The value must have exactly the vector's type.
    pub fn push(&mut self, value: Value) -> Dap4Result<()> {
        match (self, value) {
            (Vector::Char(v), Value::Char(x)) => v.push(x),
            (Vector::Int8(v), Value::Int8(x)) => v.push(x),
            (Vector::UInt8(v), Value::UInt8(x)) => v.push(x),
            (Vector::Int16(v), Value::Int16(x)) => v.push(x),
            (Vector::UInt16(v), Value::UInt16(x)) => v.push(x),
            (Vector::Int32(v), Value::Int32(x)) => v.push(x),
            (Vector::UInt32(v), Value::UInt32(x)) => v.push(x),
            (Vector::Int64(v), Value::Int64(x)) => v.push(x),
            (Vector::UInt64(v), Value::UInt64(x)) => v.push(x),
            (Vector::Float32(v), Value::Float32(x)) => v.push(x),
            (Vector::Float64(v), Value::Float64(x)) => v.push(x),
            (Vector::String(v), Value::String(x)) => v.push(x),
            (Vector::Url(v), Value::Url(x)) => v.push(x),
            (Vector::Opaque(v), Value::Opaque(x)) => v.push(x),
            (this, value) => dap4_bail!(
                "cannot push a {} value onto a {} vector",
                value.atomic_type(),
                this.atomic_type()
            ),
        }
        Ok(())
    }

    /// Iterate over the values.
    pub fn values(&self) -> impl Iterator<Item = Value> + '_ {
        (0..self.len()).filter_map(|i| self.get(i))
    }

    /// Borrow the values as a native slice, if the vector holds `T`.
    pub fn as_slice<T: NativeType>(&self) -> Option<&[T]> {
        T::slice_of(self)
    }

    /// Convert every value to `dst`.
    pub fn convert(&self, dst: AtomicType) -> Dap4Result<Vector> {
        if dst == self.atomic_type() {
            return Ok(self.clone());
        }
        let mut out = Vector::with_capacity(dst, self.len());
        for value in self.values() {
            out.push(convert(&value, dst)?)?;
        }
        Ok(out)
    }
}

impl From<Vec<String>> for Vector {
    fn from(values: Vec<String>) -> Self {
        Vector::String(values)
    }
}

impl From<Vec<Bytes>> for Vector {
    fn from(values: Vec<Bytes>) -> Self {
        Vector::Opaque(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_fixed_run() {
        let bytes = [0, 1, 0, 2, 0, 3];
        let vector = Vector::decode_fixed(AtomicType::Int16, &bytes, ByteOrder::BigEndian).unwrap();
        assert_eq!(vector.as_slice::<i16>(), Some([1i16, 2, 3].as_slice()));
        assert!(vector.as_slice::<u16>().is_none());
    }

    #[test]
    fn decode_fixed_rejects_partial_values() {
        assert!(Vector::decode_fixed(AtomicType::Int32, &[0; 6], ByteOrder::BigEndian).is_err());
    }

    #[test]
    fn push_requires_matching_type() {
        let mut vector = Vector::with_capacity(AtomicType::Int32, 2);
        vector.push(Value::Int32(7)).unwrap();
        assert!(vector.push(Value::Int64(7)).is_err());
        assert_eq!(vector.len(), 1);
        assert_eq!(vector.get(0), Some(Value::Int32(7)));
        assert_eq!(vector.get(1), None);
    }

    #[test]
    fn convert_column() {
        let vector = Vector::from(vec![1i32, -2, 3]);
        let converted = vector.convert(AtomicType::Float64).unwrap();
        assert_eq!(converted, Vector::from(vec![1.0f64, -2.0, 3.0]));
        assert!(vector.convert(AtomicType::Opaque).is_err());
    }
}
