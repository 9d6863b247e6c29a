//! Per point coding state.

use crate::bitstream::BitReader;
use crate::buffer::ByteBuffer;
use crate::codes::{TypeCode, QUALITY2, QUALITY_7BIT32};
use crate::errors::{CodePhase, MeasurementStreamError, Result};
use crate::models::AdaptiveCodeModel;
use crate::values::width32::{self, Width32Coder};
use crate::values::width64::{self, Width64Coder};
use crate::values::{Value, XorPayload};

/// State shared by both kinds of points
#[derive(Debug, Clone)]
pub(crate) struct PointCommon {
    /// Index of the point in the list of registered points
    pub(crate) reference_id: u32,
    pub(crate) type_code: TypeCode,
    pub(crate) model: AdaptiveCodeModel,
    pub(crate) prev_quality_1: u32,
    pub(crate) prev_quality_2: u32,
    pub(crate) metadata: Vec<u8>,
}

impl PointCommon {
    fn new(reference_id: u32, type_code: TypeCode, metadata: Vec<u8>) -> Self {
        Self {
            reference_id,
            type_code,
            model: AdaptiveCodeModel::new(),
            prev_quality_1: 0,
            prev_quality_2: 0,
            metadata,
        }
    }

    /// Chooses the quality code, `None` when the quality did not change.
    ///
    /// `Quality7Bit32` comes with the quality to write as a 7 bit varint.
    pub(crate) fn encode_quality(&mut self, quality: u32) -> Option<(u8, Option<u32>)> {
        if quality == self.prev_quality_1 {
            None
        } else if quality == self.prev_quality_2 {
            self.swap_qualities();
            Some((QUALITY2, None))
        } else {
            self.prev_quality_2 = self.prev_quality_1;
            self.prev_quality_1 = quality;
            Some((QUALITY_7BIT32, Some(quality)))
        }
    }

    pub(crate) fn decode_quality(&mut self, code: u8, buffer: &mut ByteBuffer) -> Result<u32> {
        match code {
            QUALITY2 => self.swap_qualities(),
            QUALITY_7BIT32 => {
                let quality = buffer.read_7bit_u32()?;
                self.prev_quality_2 = self.prev_quality_1;
                self.prev_quality_1 = quality;
            }
            _ => {
                return Err(MeasurementStreamError::MalformedStream {
                    code,
                    phase: CodePhase::AfterTimestamp,
                })
            }
        }
        Ok(self.prev_quality_1)
    }

    fn swap_qualities(&mut self) {
        std::mem::swap(&mut self.prev_quality_1, &mut self.prev_quality_2);
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Width32State {
    pub(crate) common: PointCommon,
    pub(crate) coder: Width32Coder,
}

#[derive(Debug, Clone)]
pub(crate) struct Width64State {
    pub(crate) common: PointCommon,
    pub(crate) coder: Width64Coder,
}

/// A registered point, the variant follows the width of its type
#[derive(Debug, Clone)]
pub(crate) enum Point {
    Width32(Width32State),
    Width64(Width64State),
}

impl Point {
    pub(crate) fn new(reference_id: u32, type_code: TypeCode, metadata: Vec<u8>) -> Self {
        let common = PointCommon::new(reference_id, type_code, metadata);
        if type_code.is_64_bits() {
            Point::Width64(Width64State {
                common,
                coder: Width64Coder::new(),
            })
        } else {
            Point::Width32(Width32State {
                common,
                coder: Width32Coder::new(),
            })
        }
    }

    pub(crate) fn common(&self) -> &PointCommon {
        match self {
            Point::Width32(state) => &state.common,
            Point::Width64(state) => &state.common,
        }
    }

    pub(crate) fn common_mut(&mut self) -> &mut PointCommon {
        match self {
            Point::Width32(state) => &mut state.common,
            Point::Width64(state) => &mut state.common,
        }
    }

    pub(crate) fn reference_id(&self) -> u32 {
        self.common().reference_id
    }

    pub(crate) fn type_code(&self) -> TypeCode {
        self.common().type_code
    }

    pub(crate) fn check_type(&self, value: &Value) -> Result<()> {
        let expected = self.type_code();
        let found = value.type_code();
        if expected == found {
            Ok(())
        } else {
            Err(MeasurementStreamError::ValueTypeMismatch { expected, found })
        }
    }

    /// Chooses the value code and updates the value history
    pub(crate) fn encode_value(&mut self, value: &Value) -> Result<(u8, Option<XorPayload>)> {
        self.check_type(value)?;
        let found = value.type_code();
        match self {
            Point::Width32(state) => match width32::raw_bits(value) {
                Some(bits) => state.coder.encode(bits),
                None => Err(MeasurementStreamError::ValueTypeMismatch {
                    expected: state.common.type_code,
                    found,
                }),
            },
            Point::Width64(state) => match width64::raw_bits(value) {
                Some(bits) => state.coder.encode(bits),
                None => Err(MeasurementStreamError::ValueTypeMismatch {
                    expected: state.common.type_code,
                    found,
                }),
            },
        }
    }

    /// Resolves the value of a value `code`.
    ///
    /// The returned variant is always the registered type of the point.
    pub(crate) fn decode_value(
        &mut self,
        code: u8,
        phase: CodePhase,
        reader: &mut BitReader,
    ) -> Result<Value> {
        match self {
            Point::Width32(state) => {
                let bits = state.coder.decode(code, phase, reader)?;
                Ok(width32::to_value(state.common.type_code, bits))
            }
            Point::Width64(state) => {
                let bits = state.coder.decode(code, phase, reader)?;
                Ok(width64::to_value(state.common.type_code, bits))
            }
        }
    }
}
