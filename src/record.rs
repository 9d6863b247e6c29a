//! The records that go in and out of a measurement stream.

use crate::codes::TypeCode;
use crate::values::Value;

/// One time-tagged sample of a registered point
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Measurement {
    /// Reference id of the point, as returned at registration
    pub id: u32,
    pub timestamp: i64,
    pub quality: u32,
    pub value: Value,
}

impl Measurement {
    pub fn new(id: u32, timestamp: i64, quality: u32, value: Value) -> Self {
        Self {
            id,
            timestamp,
            quality,
            value,
        }
    }
}

/// What a call to [`MeasurementDecoder::get_measurement`] produced
///
/// [`MeasurementDecoder::get_measurement`]: ../decoder/struct.MeasurementDecoder.html#method.get_measurement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeResult {
    /// A point was registered, `metadata` is opaque to the codec
    NewPointRegistered {
        id: u32,
        type_code: TypeCode,
        metadata: Vec<u8>,
    },
    /// Out of band command
    UserData { command: u32 },
    /// Out of band command with an opaque payload
    UserDataWithValue { command: u32, payload: Vec<u8> },
    MeasurementRead(Measurement),
    /// Every byte of the loaded buffer was consumed
    EndOfStream,
}
