//! Decoding side of the measurement stream.

use std::convert::TryFrom;

use log::{debug, warn};

use crate::bitstream::BitReader;
use crate::buffer::ByteBuffer;
use crate::codes::{
    is_point_id_code, is_quality_code, is_timestamp_code, is_value_code, point_id_width,
    TypeCode, FLUSH_BITS, NEW_POINT_ID, USER_COMMAND, USER_COMMAND_WITH_DATA,
};
use crate::errors::{CodePhase, MeasurementStreamError, Result};
use crate::models::AdaptiveCodeModel;
use crate::options::StreamOptions;
use crate::point::Point;
use crate::record::{DecodeResult, Measurement};
use crate::timestamps::TimestampHistory;

/// Reads measurements out of the bytes produced by a [`MeasurementEncoder`].
///
/// State (registered points, histories, code models) lives as long as the
/// decoder, so a stream may be fed block by block with [`load`].
///
/// After an error the decoder is unusable until [`load`] or [`reset`]:
/// the format has no marker to resynchronize on.
///
/// [`MeasurementEncoder`]: ../encoder/struct.MeasurementEncoder.html
/// [`load`]: #method.load
/// [`reset`]: #method.reset
pub struct MeasurementDecoder {
    reader: BitReader,
    points: Vec<Point>,
    // codes read before the first point registration
    bootstrap_model: AdaptiveCodeModel,
    last_point_cursor: u32,
    timestamps: TimestampHistory,
    options: StreamOptions,
    failure: Option<MeasurementStreamError>,
}

impl MeasurementDecoder {
    pub fn new() -> Self {
        Self::with_options(StreamOptions::default())
    }

    pub fn with_options(options: StreamOptions) -> Self {
        Self {
            reader: BitReader::new(ByteBuffer::with_capacity(options.initial_capacity)),
            points: vec![],
            bootstrap_model: AdaptiveCodeModel::new(),
            last_point_cursor: 0,
            timestamps: TimestampHistory::new(),
            options,
            failure: None,
        }
    }

    /// Replaces the bytes to decode, the stream state is kept
    pub fn load(&mut self, bytes: &[u8]) {
        self.reader.reset();
        self.reader.buffer().load(bytes);
        self.failure = None;
    }

    /// Appends bytes after the ones not decoded yet
    pub fn extend(&mut self, bytes: &[u8]) {
        self.reader.buffer().extend(bytes);
    }

    /// Forgets everything, as if the decoder was just created
    pub fn reset(&mut self) {
        debug!("measurement decoder reset");
        self.reader.reset();
        self.points.clear();
        self.bootstrap_model = AdaptiveCodeModel::new();
        self.last_point_cursor = 0;
        self.timestamps = TimestampHistory::new();
        self.failure = None;
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Opaque bytes given when the point was registered
    pub fn point_metadata(&self, id: u32) -> Option<&[u8]> {
        self.points
            .get(id as usize)
            .map(|p| p.common().metadata.as_slice())
    }

    pub fn point_type(&self, id: u32) -> Option<TypeCode> {
        self.points.get(id as usize).map(|p| p.type_code())
    }

    /// Decodes the next item of the stream
    pub fn get_measurement(&mut self) -> Result<DecodeResult> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        let result = self.read_next();
        if let Err(e) = &result {
            warn!("measurement stream cannot be decoded further: {}", e);
            self.failure = Some(e.clone());
        }
        result
    }

    fn read_next(&mut self) -> Result<DecodeResult> {
        loop {
            if self.reader.is_exhausted() {
                return Ok(DecodeResult::EndOfStream);
            }
            let coding_point = self.coding_point();
            let code = self.read_code(coding_point)?;
            match code {
                NEW_POINT_ID => return self.read_new_point(),
                USER_COMMAND => {
                    let command = self.reader.buffer().read_7bit_u32()?;
                    debug!("user command {}", command);
                    return Ok(DecodeResult::UserData { command });
                }
                USER_COMMAND_WITH_DATA => {
                    let command = self.reader.buffer().read_7bit_u32()?;
                    let length = self.reader.buffer().read_7bit_u32()? as usize;
                    let payload = self.reader.buffer().read_bytes(length)?.to_vec();
                    debug!("user command {} with {} bytes", command, payload.len());
                    return Ok(DecodeResult::UserDataWithValue { command, payload });
                }
                FLUSH_BITS => self.reader.clear_bits(),
                _ => return self.read_measurement(coding_point, code),
            }
        }
    }

    /// Index of the point whose model codes the next measurement,
    /// `None` while no point is registered
    fn coding_point(&self) -> Option<usize> {
        let index = self.last_point_cursor as usize;
        if index < self.points.len() {
            Some(index)
        } else {
            None
        }
    }

    fn read_code(&mut self, coding_point: Option<usize>) -> Result<u8> {
        let model = match coding_point {
            Some(index) => &mut self.points[index].common_mut().model,
            None => &mut self.bootstrap_model,
        };
        model.decode(&mut self.reader)
    }

    fn read_new_point(&mut self) -> Result<DecodeResult> {
        let type_code = TypeCode::try_from(self.reader.buffer().read_u8()?)?;
        if let Some(limit) = self.options.max_points {
            if self.points.len() >= limit as usize {
                return Err(MeasurementStreamError::TooManyPoints { limit });
            }
        }
        let length = self.reader.buffer().read_7bit_u32()? as usize;
        let metadata = self.reader.buffer().read_bytes(length)?.to_vec();

        let id = self.points.len() as u32;
        self.points.push(Point::new(id, type_code, metadata.clone()));
        self.last_point_cursor = id;
        debug!("registered point {} of type {:?}", id, type_code);
        Ok(DecodeResult::NewPointRegistered {
            id,
            type_code,
            metadata,
        })
    }

    fn read_measurement(
        &mut self,
        coding_point: Option<usize>,
        first_code: u8,
    ) -> Result<DecodeResult> {
        let mut code = first_code;
        let mut phase = CodePhase::Start;

        if is_point_id_code(code) {
            let xor = self.reader.read_split(point_id_width(code))? as u32;
            self.last_point_cursor ^= xor;
            code = self.read_code(coding_point)?;
            phase = CodePhase::AfterPointId;
        }
        if !(is_timestamp_code(code) || is_quality_code(code) || is_value_code(code)) {
            return Err(MeasurementStreamError::MalformedStream { code, phase });
        }
        let index = self.last_point_cursor as usize;
        if index >= self.points.len() {
            return Err(MeasurementStreamError::UnknownPoint(self.last_point_cursor));
        }

        let timestamp = if is_timestamp_code(code) {
            let timestamp = self.timestamps.decode(code, self.reader.buffer())?;
            code = self.read_code(coding_point)?;
            phase = CodePhase::AfterTimestamp;
            timestamp
        } else {
            self.timestamps.latest()
        };

        let quality = if is_quality_code(code) {
            let quality = self.points[index]
                .common_mut()
                .decode_quality(code, self.reader.buffer())?;
            code = self.read_code(coding_point)?;
            phase = CodePhase::AfterQuality;
            quality
        } else {
            self.points[index].common().prev_quality_1
        };

        if !is_value_code(code) {
            return Err(MeasurementStreamError::MalformedStream { code, phase });
        }
        let point = &mut self.points[index];
        let value = point.decode_value(code, phase, &mut self.reader)?;

        Ok(DecodeResult::MeasurementRead(Measurement {
            id: point.reference_id(),
            timestamp,
            quality,
            value,
        }))
    }
}

impl Default for MeasurementDecoder {
    fn default() -> Self {
        Self::new()
    }
}
