//! Local code words of the wire format and the scalar types a point can carry.

use crate::errors::MeasurementStreamError;
use std::convert::TryFrom;

pub(crate) const NEW_POINT_ID: u8 = 0;
pub(crate) const USER_COMMAND: u8 = 1;
pub(crate) const USER_COMMAND_WITH_DATA: u8 = 2;
pub(crate) const FLUSH_BITS: u8 = 3;

pub(crate) const POINT_ID_XOR4: u8 = 4;
pub(crate) const POINT_ID_XOR32: u8 = 10;

pub(crate) const TIME_DELTA1_FORWARD: u8 = 11;
pub(crate) const TIME_DELTA4_FORWARD: u8 = 14;
pub(crate) const TIME_DELTA1_REVERSE: u8 = 15;
pub(crate) const TIME_DELTA4_REVERSE: u8 = 18;
pub(crate) const TIMESTAMP2: u8 = 19;
pub(crate) const TIME_XOR_7BIT: u8 = 20;

pub(crate) const QUALITY2: u8 = 21;
pub(crate) const QUALITY_7BIT32: u8 = 22;

pub(crate) const VALUE1: u8 = 32;
pub(crate) const VALUE2: u8 = 33;
pub(crate) const VALUE3: u8 = 34;
pub(crate) const VALUE_ZERO: u8 = 35;
/// First XOR width code, the 4 bits (32-bit coder) or 8 bits (64-bit coder) width
pub(crate) const VALUE_XOR_FIRST: u8 = 36;
pub(crate) const VALUE_XOR_LAST: u8 = 43;

/// Number of distinct local codes, every code fits in 6 bits.
pub(crate) const CODE_COUNT: usize = 64;

/// Widths (in bits) selected by the `PointIDXOR` codes, in code order
pub(crate) const POINT_ID_XOR_WIDTHS: [u32; 7] = [4, 8, 12, 16, 20, 24, 32];

pub(crate) fn is_point_id_code(code: u8) -> bool {
    (POINT_ID_XOR4..=POINT_ID_XOR32).contains(&code)
}

pub(crate) fn is_timestamp_code(code: u8) -> bool {
    (TIME_DELTA1_FORWARD..=TIME_XOR_7BIT).contains(&code)
}

pub(crate) fn is_quality_code(code: u8) -> bool {
    (QUALITY2..=QUALITY_7BIT32).contains(&code)
}

pub(crate) fn is_value_code(code: u8) -> bool {
    (VALUE1..=VALUE_XOR_LAST).contains(&code)
}

/// Returns the code of the smallest `PointIDXOR` width able to hold `xor`.
///
/// `xor` must not be zero, a zero XOR is sent without any id code.
pub(crate) fn point_id_code_for(xor: u32) -> u8 {
    debug_assert_ne!(xor, 0);
    let significant_bits = 32 - xor.leading_zeros();
    let index = POINT_ID_XOR_WIDTHS
        .iter()
        .position(|&width| significant_bits <= width)
        .unwrap_or(POINT_ID_XOR_WIDTHS.len() - 1);
    POINT_ID_XOR4 + index as u8
}

pub(crate) fn point_id_width(code: u8) -> u32 {
    POINT_ID_XOR_WIDTHS[(code - POINT_ID_XOR4) as usize]
}

/// The scalar type of the values of a point, fixed at registration.
///
/// The discriminants are the bytes written on the wire.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TypeCode {
    Int32 = 9,
    UInt32 = 10,
    Int64 = 11,
    UInt64 = 12,
    Single = 13,
    Double = 14,
}

impl TypeCode {
    /// Whether values of this type are coded with the 64-bit value coder
    pub fn is_64_bits(self) -> bool {
        match self {
            TypeCode::Int64 | TypeCode::UInt64 | TypeCode::Double => true,
            TypeCode::Int32 | TypeCode::UInt32 | TypeCode::Single => false,
        }
    }
}

impl TryFrom<u8> for TypeCode {
    type Error = MeasurementStreamError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            9 => Ok(TypeCode::Int32),
            10 => Ok(TypeCode::UInt32),
            11 => Ok(TypeCode::Int64),
            12 => Ok(TypeCode::UInt64),
            13 => Ok(TypeCode::Single),
            14 => Ok(TypeCode::Double),
            _ => Err(MeasurementStreamError::UnsupportedType(value)),
        }
    }
}
