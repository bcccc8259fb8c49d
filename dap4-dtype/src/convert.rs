//! Conversion between values of different atomic types.

use dap4_error::{Dap4Result, dap4_bail, dap4_err};

use crate::{AtomicType, DapType, Value};

/// A numeric value widened to one of three carriers.
#[derive(Debug, Clone, Copy)]
enum Num {
    Signed(i64),
    Unsigned(u64),
    Float(f64),
}

impl Num {
    fn of(value: &Value) -> Option<Self> {
        Some(match value {
            Value::Char(v) => Num::Unsigned(u64::from(*v) & 0xFF),
            Value::Int8(v) => Num::Signed(i64::from(*v)),
            Value::UInt8(v) => Num::Unsigned(u64::from(*v)),
            Value::Int16(v) => Num::Signed(i64::from(*v)),
            Value::UInt16(v) => Num::Unsigned(u64::from(*v)),
            Value::Int32(v) => Num::Signed(i64::from(*v)),
            Value::UInt32(v) => Num::Unsigned(u64::from(*v)),
            Value::Int64(v) => Num::Signed(*v),
            Value::UInt64(v) => Num::Unsigned(*v),
            Value::Float32(v) => Num::Float(f64::from(*v)),
            Value::Float64(v) => Num::Float(*v),
            Value::String(_) | Value::Url(_) | Value::Opaque(_) => return None,
        })
    }

    /// The two's complement bit pattern of an integer, or the truncated value of a float.
    #[allow(clippy::cast_possible_truncation)]
    fn integer_bits(self, src: AtomicType, dst: AtomicType) -> Dap4Result<u64> {
        match self {
            Num::Signed(v) => Ok(v as u64),
            Num::Unsigned(v) => Ok(v),
            Num::Float(f) => {
                if f.is_nan() {
                    dap4_bail!(Conversion: "cannot convert NaN {} to {}", src, dst);
                }
                let unsigned_dst = dst.is_unsigned() || dst.is_char();
                if unsigned_dst && f < 0.0 {
                    dap4_bail!(
                        Conversion: "cannot convert negative {} value {} to {}",
                        src,
                        f,
                        dst
                    );
                }
                Ok(if unsigned_dst {
                    saturate_unsigned(f.trunc(), dst)
                } else {
                    saturate_signed(f.trunc(), dst) as u64
                })
            }
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Num::Signed(v) => v as f64,
            Num::Unsigned(v) => v as f64,
            Num::Float(v) => v,
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn saturate_unsigned(f: f64, dst: AtomicType) -> u64 {
    match dst {
        AtomicType::Char | AtomicType::UInt8 => u64::from(f as u8),
        AtomicType::UInt16 => u64::from(f as u16),
        AtomicType::UInt32 => u64::from(f as u32),
        _ => f as u64,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn saturate_signed(f: f64, dst: AtomicType) -> i64 {
    match dst {
        AtomicType::Int8 => i64::from(f as i8),
        AtomicType::Int16 => i64::from(f as i16),
        AtomicType::Int32 => i64::from(f as i32),
        _ => f as i64,
    }
}

fn textual(value: &Value) -> Option<String> {
    Some(match value {
        Value::Char(c) => char::from(*c).to_string(),
        Value::String(s) | Value::Url(s) => s.clone(),
        Value::Opaque(_) => return None,
        other => other.to_string(),
    })
}

/// Convert a value to the atomic type `dst`.
///
/// Integers convert to integers by truncation or sign extension, floats convert to integers by
/// truncating toward zero and saturating at the bounds of the destination. Negative floats
/// cannot become unsigned integers or characters. Every numeric or textual value can become a
/// String or URL. Opaque values only convert to Opaque.
#[allow(clippy::cast_possible_truncation)]
pub fn convert(value: &Value, dst: AtomicType) -> Dap4Result<Value> {
    let src = value.atomic_type();
    if src == dst {
        return Ok(value.clone());
    }

    match dst {
        AtomicType::String | AtomicType::Url => {
            let text = textual(value)
                .ok_or_else(|| dap4_err!(Conversion: "cannot convert {} to {}", src, dst))?;
            return Ok(if dst == AtomicType::Url {
                Value::Url(text)
            } else {
                Value::String(text)
            });
        }
        AtomicType::Opaque => dap4_bail!(Conversion: "cannot convert {} to {}", src, dst),
        _ => {}
    }

    let num =
        Num::of(value).ok_or_else(|| dap4_err!(Conversion: "cannot convert {} to {}", src, dst))?;

    Ok(match dst {
        AtomicType::Float32 => Value::Float32(num.as_f64() as f32),
        AtomicType::Float64 => Value::Float64(num.as_f64()),
        _ => {
            let bits = num.integer_bits(src, dst)?;
            match dst {
                AtomicType::Char => Value::Char(bits as u8),
                AtomicType::Int8 => Value::Int8(bits as i8),
                AtomicType::UInt8 => Value::UInt8(bits as u8),
                AtomicType::Int16 => Value::Int16(bits as i16),
                AtomicType::UInt16 => Value::UInt16(bits as u16),
                AtomicType::Int32 => Value::Int32(bits as i32),
                AtomicType::UInt32 => Value::UInt32(bits as u32),
                AtomicType::Int64 => Value::Int64(bits as i64),
                AtomicType::UInt64 => Value::UInt64(bits),
                AtomicType::Float32
                | AtomicType::Float64
                | AtomicType::String
                | AtomicType::Url
                | AtomicType::Opaque => unreachable!("handled above"),
            }
        }
    })
}

/// Convert a value to a declared type.
///
/// Converting into an enumeration requires an integer value equal to one of its constants. The
/// result is held as the enumeration's base type.
pub fn convert_to(value: &Value, dst: &DapType) -> Dap4Result<Value> {
    match dst {
        DapType::Atomic(atype) => convert(value, *atype),
        DapType::Enum(def) => {
            let src = value.atomic_type();
            if !src.is_integer() {
                dap4_bail!(Conversion: "cannot convert {} to enumeration {}", src, def.name());
            }
            let converted = convert(value, def.base_type())?;
            let matches = converted.as_i64().and_then(|v| def.lookup(v)).is_some();
            if !matches {
                dap4_bail!(
                    Conversion: "{} is not a constant of enumeration {}",
                    value,
                    def.name()
                );
            }
            Ok(converted)
        }
    }
}

/// The type unsigned values of `atype` are widened to so they survive a signed consumer.
pub fn upcast(atype: AtomicType) -> AtomicType {
    match atype {
        AtomicType::UInt8 => AtomicType::Int16,
        AtomicType::UInt16 => AtomicType::Int32,
        AtomicType::UInt32 => AtomicType::Int64,
        other => other,
    }
}

/// Widen an unsigned value per [`upcast`].
pub fn upcast_value(value: &Value) -> Value {
    match value {
        Value::UInt8(v) => Value::Int16(i16::from(*v)),
        Value::UInt16(v) => Value::Int32(i32::from(*v)),
        Value::UInt32(v) => Value::Int64(i64::from(*v)),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use rstest::rstest;

    use super::*;
    use crate::{EnumConst, EnumDef};

    #[rstest]
    #[case(Value::Int32(-1), AtomicType::UInt8, Value::UInt8(255))]
    #[case(Value::Int32(300), AtomicType::Int8, Value::Int8(44))]
    #[case(Value::Int8(-2), AtomicType::Int64, Value::Int64(-2))]
    #[case(Value::UInt64(u64::MAX), AtomicType::Int64, Value::Int64(-1))]
    #[case(Value::Char(b'A'), AtomicType::Int32, Value::Int32(65))]
    #[case(Value::Int16(97), AtomicType::Char, Value::Char(b'a'))]
    #[case(Value::Int32(7), AtomicType::Float64, Value::Float64(7.0))]
    #[case(Value::Float64(2.5), AtomicType::Float32, Value::Float32(2.5))]
    #[case(Value::Float64(-3.9), AtomicType::Int16, Value::Int16(-3))]
    #[case(Value::Float32(1e10), AtomicType::Int32, Value::Int32(i32::MAX))]
    #[case(Value::Float64(3.9), AtomicType::UInt8, Value::UInt8(3))]
    fn numeric_conversions(#[case] value: Value, #[case] dst: AtomicType, #[case] expected: Value) {
        assert_eq!(convert(&value, dst).unwrap(), expected);
    }

    #[rstest]
    #[case(Value::Float64(-1.0), AtomicType::UInt8)]
    #[case(Value::Float32(-0.5), AtomicType::Char)]
    #[case(Value::Float64(f64::NAN), AtomicType::Int32)]
    #[case(Value::from("12"), AtomicType::Int32)]
    #[case(Value::Int32(1), AtomicType::Opaque)]
    #[case(Value::Opaque(Bytes::from_static(b"x")), AtomicType::String)]
    fn failed_conversions(#[case] value: Value, #[case] dst: AtomicType) {
        assert!(convert(&value, dst).is_err());
    }

    #[test]
    fn to_text() {
        assert_eq!(
            convert(&Value::Int32(42), AtomicType::String).unwrap(),
            Value::from("42")
        );
        assert_eq!(
            convert(&Value::Char(b'z'), AtomicType::String).unwrap(),
            Value::from("z")
        );
        assert_eq!(
            convert(&Value::from("http://x"), AtomicType::Url).unwrap(),
            Value::Url("http://x".to_string())
        );
    }

    #[test]
    fn into_enum() {
        let def = EnumDef::try_new(
            "flags",
            AtomicType::Int16,
            vec![EnumConst::new("on", 1), EnumConst::new("off", 0)],
        )
        .unwrap();
        let dtype = DapType::from(def);
        assert_eq!(
            convert_to(&Value::Int64(1), &dtype).unwrap(),
            Value::Int16(1)
        );
        assert!(convert_to(&Value::Int64(2), &dtype).is_err());
        assert!(convert_to(&Value::Float64(1.0), &dtype).is_err());
    }

    #[test]
    fn upcasts() {
        assert_eq!(upcast(AtomicType::UInt32), AtomicType::Int64);
        assert_eq!(upcast(AtomicType::UInt64), AtomicType::UInt64);
        assert_eq!(upcast_value(&Value::UInt8(200)), Value::Int16(200));
    }
}
