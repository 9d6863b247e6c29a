//! Coder of the `Int64`, `UInt64` and `Double` points.
//!
//! XOR widths are 8, 16, ..., 64 bits, always whole little endian bytes.

use super::{RawBits, Value, XorCoder};
use crate::codes::TypeCode;

impl RawBits for u64 {
    const WIDTH_STEP: u32 = 8;
}

pub(crate) type Width64Coder = XorCoder<u64>;

/// Raw bits of a 64-bit value, `None` for a 32-bit variant
pub(crate) fn raw_bits(value: &Value) -> Option<u64> {
    match *value {
        Value::Double(v) => Some(v.to_bits()),
        Value::U64(v) => Some(v),
        Value::I64(v) => Some(v as u64),
        Value::Single(_) | Value::U32(_) | Value::I32(_) => None,
    }
}

pub(crate) fn to_value(type_code: TypeCode, bits: u64) -> Value {
    Value::from_bits(type_code, bits)
}
