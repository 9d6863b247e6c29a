//! Definitions of error related things.

use crate::codes::TypeCode;
use std::fmt;

/// The part of a measurement the decoder was resolving when it read a code
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CodePhase {
    /// First code of a measurement (control codes, point id, or anything after)
    Start,
    /// Code read right after a point id XOR
    AfterPointId,
    /// Code read right after a timestamp code
    AfterTimestamp,
    /// Code read right after a quality code, must be a value code
    AfterQuality,
}

/// Errors of this crate
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MeasurementStreamError {
    /// A decoded code is outside of the range accepted in the current phase
    MalformedStream { code: u8, phase: CodePhase },
    /// A point registration names a type code that is not one of the six scalars
    UnsupportedType(u8),
    /// A read needs more bytes than what remains in the loaded buffer
    BufferUnderrun { needed: usize, available: usize },
    /// The encoder reached the XOR branch with nothing changed,
    /// its own repeat checks were bypassed.
    EncoderInvariantViolation,
    /// The point reference id is not registered in the stream
    UnknownPoint(u32),
    /// The value variant does not match the registered type of the point
    ValueTypeMismatch { expected: TypeCode, found: TypeCode },
    /// The configured maximum number of points was reached
    TooManyPoints { limit: u32 },
    /// A 7 bit varint does not fit its target integer
    InvalidVarint,
    /// Metadata or user payload too long for its 32 bit length prefix
    LengthTooLarge { length: usize },
}

impl fmt::Display for MeasurementStreamError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MeasurementStreamError::MalformedStream { code, phase } => {
                write!(f, "Code {} is not valid in phase {:?}", code, phase)
            }
            MeasurementStreamError::UnsupportedType(t) => {
                write!(f, "Type code {} is not supported", t)
            }
            MeasurementStreamError::BufferUnderrun { needed, available } => write!(
                f,
                "Buffer underrun: needed {} bytes but only {} are available",
                needed, available
            ),
            MeasurementStreamError::EncoderInvariantViolation => {
                write!(f, "Encoder tried to XOR-code a value that did not change")
            }
            MeasurementStreamError::UnknownPoint(id) => {
                write!(f, "Point with reference id {} is not registered", id)
            }
            MeasurementStreamError::ValueTypeMismatch { expected, found } => write!(
                f,
                "Point expects values of type {:?} but got {:?}",
                expected, found
            ),
            MeasurementStreamError::TooManyPoints { limit } => {
                write!(f, "The stream cannot hold more than {} points", limit)
            }
            MeasurementStreamError::InvalidVarint => write!(f, "7 bit encoded integer is too long"),
            MeasurementStreamError::LengthTooLarge { length } => {
                write!(f, "Length {} does not fit in a 32 bit length prefix", length)
            }
        }
    }
}

impl std::error::Error for MeasurementStreamError {}

pub type Result<T> = std::result::Result<T, MeasurementStreamError>;
