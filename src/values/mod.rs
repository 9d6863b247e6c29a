//! Scalar values carried by the measurements and their XOR delta coders.
//!
//! A point remembers its 3 last raw values (most recent first). A new value
//! is coded, in this order of preference, as a repeat of the most recent value,
//! as zero, as a repeat of one of the two older values, or as the XOR with the
//! most recent value using the smallest width able to hold it.
//!
//! Widths step by 4 bits for 32-bit values (see [`width32`]) and by 8 bits for
//! 64-bit values (see [`width64`]).

use num_traits::{AsPrimitive, PrimInt};

use crate::bitstream::{BitReader, BitWriter};
use crate::codes::{
    TypeCode, VALUE1, VALUE2, VALUE3, VALUE_XOR_FIRST, VALUE_XOR_LAST, VALUE_ZERO,
};
use crate::errors::{CodePhase, MeasurementStreamError, Result};

pub mod width32;
pub mod width64;

/// A measurement value, the variant is the type the point was registered with.
///
/// Values compare by type and bit pattern, so a NaN equals itself
/// and `0.0` differs from `-0.0`.
#[derive(Debug, Copy, Clone)]
pub enum Value {
    Single(f32),
    U32(u32),
    I32(i32),
    Double(f64),
    U64(u64),
    I64(i64),
}

impl Value {
    pub fn type_code(&self) -> TypeCode {
        match self {
            Value::Single(_) => TypeCode::Single,
            Value::U32(_) => TypeCode::UInt32,
            Value::I32(_) => TypeCode::Int32,
            Value::Double(_) => TypeCode::Double,
            Value::U64(_) => TypeCode::UInt64,
            Value::I64(_) => TypeCode::Int64,
        }
    }

    /// The raw bits of the value, zero extended to 64 bits
    pub fn to_bits(&self) -> u64 {
        match *self {
            Value::Single(v) => u64::from(v.to_bits()),
            Value::U32(v) => u64::from(v),
            Value::I32(v) => u64::from(v as u32),
            Value::Double(v) => v.to_bits(),
            Value::U64(v) => v,
            Value::I64(v) => v as u64,
        }
    }

    /// Builds a value of type `type_code` from raw bits, 32-bit types use the low bits
    pub fn from_bits(type_code: TypeCode, bits: u64) -> Self {
        match type_code {
            TypeCode::Single => Value::Single(f32::from_bits(bits as u32)),
            TypeCode::UInt32 => Value::U32(bits as u32),
            TypeCode::Int32 => Value::I32(bits as u32 as i32),
            TypeCode::Double => Value::Double(f64::from_bits(bits)),
            TypeCode::UInt64 => Value::U64(bits),
            TypeCode::Int64 => Value::I64(bits as i64),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.type_code() == other.type_code() && self.to_bits() == other.to_bits()
    }
}

impl Eq for Value {}

/// Raw representation used by a value coder.
pub trait RawBits: PrimInt + AsPrimitive<u64> + 'static
where
    u64: AsPrimitive<Self>,
{
    /// Step between two consecutive XOR widths, in bits
    const WIDTH_STEP: u32;
}

/// XOR payload that follows a `ValueXOR` code
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct XorPayload {
    pub(crate) width: u32,
    pub(crate) bits: u64,
}

impl XorPayload {
    pub(crate) fn write_to(&self, writer: &mut BitWriter) {
        writer.write_split(self.width, self.bits);
    }
}

/// Value state of one point: the 3 most recently seen raw values.
#[derive(Debug, Clone)]
pub(crate) struct XorCoder<T> {
    history: [T; 3],
}

impl<T> XorCoder<T>
where
    T: RawBits,
    u64: AsPrimitive<T>,
{
    pub(crate) fn new() -> Self {
        Self {
            history: [T::zero(); 3],
        }
    }

    #[cfg(test)]
    pub(crate) fn history(&self) -> [T; 3] {
        self.history
    }

    /// Moves the value of `slot` (1 or 2) to the front
    fn promote(&mut self, slot: usize) {
        let value = self.history[slot];
        for i in (1..=slot).rev() {
            self.history[i] = self.history[i - 1];
        }
        self.history[0] = value;
    }

    fn push(&mut self, value: T) {
        self.history[2] = self.history[1];
        self.history[1] = self.history[0];
        self.history[0] = value;
    }

    /// XOR code able to hold `bits_changed`, with its width in bits
    pub(crate) fn xor_code_for(bits_changed: T) -> (u8, u32) {
        let significant = T::zero().count_zeros() - bits_changed.leading_zeros();
        let steps = ((significant + T::WIDTH_STEP - 1) / T::WIDTH_STEP).max(1);
        (VALUE_XOR_FIRST + (steps - 1) as u8, steps * T::WIDTH_STEP)
    }

    pub(crate) fn xor_width(code: u8) -> u32 {
        u32::from(code - VALUE_XOR_FIRST + 1) * T::WIDTH_STEP
    }

    /// Picks the cheapest code for `value` and updates the history
    pub(crate) fn encode(&mut self, value: T) -> Result<(u8, Option<XorPayload>)> {
        if value == self.history[0] {
            Ok((VALUE1, None))
        } else if value.is_zero() {
            self.push(value);
            Ok((VALUE_ZERO, None))
        } else if value == self.history[1] {
            self.promote(1);
            Ok((VALUE2, None))
        } else if value == self.history[2] {
            self.promote(2);
            Ok((VALUE3, None))
        } else {
            let bits_changed = value ^ self.history[0];
            if bits_changed.is_zero() {
                return Err(MeasurementStreamError::EncoderInvariantViolation);
            }
            let (code, width) = Self::xor_code_for(bits_changed);
            self.push(value);
            Ok((
                code,
                Some(XorPayload {
                    width,
                    bits: <T as AsPrimitive<u64>>::as_(bits_changed),
                }),
            ))
        }
    }

    /// Resolves the value of a value `code`, reading the XOR payload if any
    pub(crate) fn decode(
        &mut self,
        code: u8,
        phase: CodePhase,
        reader: &mut BitReader,
    ) -> Result<T> {
        match code {
            VALUE1 => {}
            VALUE2 => self.promote(1),
            VALUE3 => self.promote(2),
            VALUE_ZERO => self.push(T::zero()),
            VALUE_XOR_FIRST..=VALUE_XOR_LAST => {
                let width = Self::xor_width(code);
                let bits_changed = <u64 as AsPrimitive<T>>::as_(reader.read_split(width)?);
                let value = self.history[0] ^ bits_changed;
                self.push(value);
            }
            _ => return Err(MeasurementStreamError::MalformedStream { code, phase }),
        }
        Ok(self.history[0])
    }
}
