//! Coder of the `Int32`, `UInt32` and `Single` points.
//!
//! XOR widths are 4, 8, ..., 32 bits. Widths that are not whole bytes send
//! their low nibble through the bit stream.

use super::{RawBits, Value, XorCoder};
use crate::codes::TypeCode;

impl RawBits for u32 {
    const WIDTH_STEP: u32 = 4;
}

pub(crate) type Width32Coder = XorCoder<u32>;

/// Raw bits of a 32-bit value, `None` for a 64-bit variant
pub(crate) fn raw_bits(value: &Value) -> Option<u32> {
    match *value {
        Value::Single(v) => Some(v.to_bits()),
        Value::U32(v) => Some(v),
        Value::I32(v) => Some(v as u32),
        Value::Double(_) | Value::U64(_) | Value::I64(_) => None,
    }
}

pub(crate) fn to_value(type_code: TypeCode, bits: u32) -> Value {
    Value::from_bits(type_code, u64::from(bits))
}
