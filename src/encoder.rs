//! Encoding side of the measurement stream.

use std::convert::TryFrom;

use log::debug;

use crate::bitstream::BitWriter;
use crate::buffer::ByteBuffer;
use crate::codes::{
    point_id_code_for, point_id_width, TypeCode, FLUSH_BITS, NEW_POINT_ID, USER_COMMAND,
    USER_COMMAND_WITH_DATA,
};
use crate::errors::{MeasurementStreamError, Result};
use crate::models::AdaptiveCodeModel;
use crate::options::StreamOptions;
use crate::point::Point;
use crate::record::Measurement;
use crate::timestamps::TimestampHistory;

/// Writes measurements into the bytes read by a [`MeasurementDecoder`].
///
/// Each call picks, for the point id, the timestamp, the quality and the value,
/// the cheapest code the decoder can resolve from the same history, and
/// updates that history exactly as the decoder will.
///
/// # Example
///
/// ```
/// use measurement_stream::{
///     DecodeResult, Measurement, MeasurementDecoder, MeasurementEncoder, TypeCode, Value,
/// };
///
/// # fn main() -> measurement_stream::Result<()> {
/// let mut encoder = MeasurementEncoder::new();
/// let id = encoder.register_point(TypeCode::Double, b"frequency")?;
/// encoder.write_measurement(&Measurement::new(id, 1_000, 0, Value::Double(59.98)))?;
/// encoder.write_measurement(&Measurement::new(id, 1_033, 0, Value::Double(59.98)))?;
/// let bytes = encoder.finish();
///
/// let mut decoder = MeasurementDecoder::new();
/// decoder.load(&bytes);
/// assert!(matches!(
///     decoder.get_measurement()?,
///     DecodeResult::NewPointRegistered { .. }
/// ));
/// assert_eq!(
///     decoder.get_measurement()?,
///     DecodeResult::MeasurementRead(Measurement::new(id, 1_000, 0, Value::Double(59.98)))
/// );
/// # Ok(())
/// # }
/// ```
///
/// [`MeasurementDecoder`]: ../decoder/struct.MeasurementDecoder.html
pub struct MeasurementEncoder {
    writer: BitWriter,
    points: Vec<Point>,
    // codes written before the first point registration
    bootstrap_model: AdaptiveCodeModel,
    last_point_cursor: u32,
    timestamps: TimestampHistory,
    options: StreamOptions,
}

impl MeasurementEncoder {
    pub fn new() -> Self {
        Self::with_options(StreamOptions::default())
    }

    pub fn with_options(options: StreamOptions) -> Self {
        Self {
            writer: BitWriter::new(ByteBuffer::with_capacity(options.initial_capacity)),
            points: vec![],
            bootstrap_model: AdaptiveCodeModel::new(),
            last_point_cursor: 0,
            timestamps: TimestampHistory::new(),
            options,
        }
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Number of bits that went through the bit stream so far,
    /// byte aligned payloads are not counted
    pub fn bits_written(&self) -> u64 {
        self.writer.bits_written()
    }

    /// Registers a new point and returns its reference id.
    ///
    /// Ids are handed out densely, starting at 0.
    pub fn register_point(&mut self, type_code: TypeCode, metadata: &[u8]) -> Result<u32> {
        if let Some(limit) = self.options.max_points {
            if self.points.len() >= limit as usize {
                return Err(MeasurementStreamError::TooManyPoints { limit });
            }
        }
        let length = length_prefix(metadata.len())?;
        let coding_point = self.coding_point();
        self.write_code(coding_point, NEW_POINT_ID);
        let buffer = self.writer.buffer();
        buffer.write_u8(type_code as u8);
        buffer.write_7bit_u32(length);
        buffer.write_bytes(metadata);

        let id = self.points.len() as u32;
        self.points.push(Point::new(id, type_code, metadata.to_vec()));
        self.last_point_cursor = id;
        debug!("registered point {} of type {:?}", id, type_code);
        Ok(id)
    }

    /// Encodes one measurement of an already registered point.
    ///
    /// Nothing is written when the point is unknown or the value
    /// does not have the registered type.
    pub fn write_measurement(&mut self, measurement: &Measurement) -> Result<()> {
        let id = measurement.id;
        match self.points.get(id as usize) {
            Some(point) => point.check_type(&measurement.value)?,
            None => return Err(MeasurementStreamError::UnknownPoint(id)),
        }
        let coding_point = self.coding_point();

        let id_xor = self.last_point_cursor ^ id;
        if id_xor != 0 {
            let code = point_id_code_for(id_xor);
            self.write_code(coding_point, code);
            self.writer.write_split(point_id_width(code), u64::from(id_xor));
            self.last_point_cursor = id;
        }

        if let Some((code, xor)) = self.timestamps.encode(measurement.timestamp) {
            self.write_code(coding_point, code);
            if let Some(xor) = xor {
                self.writer.buffer().write_7bit_u64(xor);
            }
        }

        let quality = self.points[id as usize]
            .common_mut()
            .encode_quality(measurement.quality);
        if let Some((code, raw)) = quality {
            self.write_code(coding_point, code);
            if let Some(raw) = raw {
                self.writer.buffer().write_7bit_u32(raw);
            }
        }

        let (code, payload) = self.points[id as usize].encode_value(&measurement.value)?;
        self.write_code(coding_point, code);
        if let Some(payload) = payload {
            payload.write_to(&mut self.writer);
        }
        Ok(())
    }

    pub fn write_user_command(&mut self, command: u32) {
        let coding_point = self.coding_point();
        self.write_code(coding_point, USER_COMMAND);
        self.writer.buffer().write_7bit_u32(command);
        debug!("user command {}", command);
    }

    pub fn write_user_command_with_data(&mut self, command: u32, payload: &[u8]) -> Result<()> {
        let length = length_prefix(payload.len())?;
        let coding_point = self.coding_point();
        self.write_code(coding_point, USER_COMMAND_WITH_DATA);
        let buffer = self.writer.buffer();
        buffer.write_7bit_u32(command);
        buffer.write_7bit_u32(length);
        buffer.write_bytes(payload);
        debug!("user command {} with {} bytes", command, payload.len());
        Ok(())
    }

    /// Writes a `FlushBits` code and pads the bit stream to the byte boundary
    pub fn flush_bits(&mut self) {
        let coding_point = self.coding_point();
        self.write_code(coding_point, FLUSH_BITS);
        self.writer.flush();
    }

    /// Hands back the bytes written since the last call.
    ///
    /// Point and history state is kept: the next block continues the same
    /// stream and must be fed to the same decoder.
    pub fn finish(&mut self) -> Vec<u8> {
        if self.writer.has_pending_bits() {
            self.flush_bits();
        }
        self.writer.buffer().take_bytes()
    }

    /// Forgets everything, as if the encoder was just created
    pub fn reset(&mut self) {
        debug!("measurement encoder reset");
        self.writer.reset();
        self.points.clear();
        self.bootstrap_model = AdaptiveCodeModel::new();
        self.last_point_cursor = 0;
        self.timestamps = TimestampHistory::new();
    }

    fn coding_point(&self) -> Option<usize> {
        let index = self.last_point_cursor as usize;
        if index < self.points.len() {
            Some(index)
        } else {
            None
        }
    }

    fn write_code(&mut self, coding_point: Option<usize>, code: u8) {
        let model = match coding_point {
            Some(index) => &mut self.points[index].common_mut().model,
            None => &mut self.bootstrap_model,
        };
        model.encode(&mut self.writer, code);
    }
}

fn length_prefix(length: usize) -> Result<u32> {
    u32::try_from(length).map_err(|_| MeasurementStreamError::LengthTooLarge { length })
}

impl Default for MeasurementEncoder {
    fn default() -> Self {
        Self::new()
    }
}
