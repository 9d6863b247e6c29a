//! Compact bit-packed encoding of time series measurements.
//!
//! A stream carries point registrations followed by `(id, timestamp, quality, value)`
//! measurements. Each part of a measurement is coded against what the stream already
//! saw: the previous point id, a cache of the smallest timestamp deltas, the two last
//! qualities and the three last values of the point. The codes themselves go through
//! an adaptive model, one per point, so the most frequent ones cost one to three bits.
//!
//! [`MeasurementEncoder`] and [`MeasurementDecoder`] are the two types
//! users wishing to write and / or read such streams should use.
//!
//! # Examples
//!
//! ```
//! use measurement_stream::{
//!     DecodeResult, Measurement, MeasurementDecoder, MeasurementEncoder,
//!     MeasurementStreamError, TypeCode, Value,
//! };
//!
//! # fn main() -> Result<(), MeasurementStreamError> {
//! let mut encoder = MeasurementEncoder::new();
//! let voltage = encoder.register_point(TypeCode::Single, b"bus 4 voltage")?;
//! let status = encoder.register_point(TypeCode::UInt32, b"bus 4 status")?;
//!
//! for (i, timestamp) in (0..100).map(|i| (i, 1_000 + i * 33)) {
//!     let magnitude = if i % 10 == 0 { 229.5 } else { 230.0 };
//!     encoder.write_measurement(&Measurement::new(voltage, timestamp, 0, Value::Single(magnitude)))?;
//!     encoder.write_measurement(&Measurement::new(status, timestamp, 0, Value::U32(1)))?;
//! }
//! // don't forget to call finish, it flushes the bits still in the cache
//! let bytes = encoder.finish();
//!
//! let mut decoder = MeasurementDecoder::new();
//! decoder.load(&bytes);
//! let mut count = 0;
//! loop {
//!     match decoder.get_measurement()? {
//!         DecodeResult::MeasurementRead(measurement) => {
//!             assert!(measurement.id == voltage || measurement.id == status);
//!             count += 1;
//!         }
//!         DecodeResult::EndOfStream => break,
//!         _ => {}
//!     }
//! }
//! assert_eq!(count, 200);
//! assert_eq!(decoder.point_metadata(status), Some(&b"bus 4 status"[..]));
//! # Ok(())
//! # }
//! ```
//!
//! A stream can be cut in blocks: [`MeasurementEncoder::finish`] hands back what was
//! written so far while keeping the state, the blocks must then be given in order to
//! the same decoder through [`MeasurementDecoder::load`].
//!
//! [`MeasurementEncoder`]: encoder/struct.MeasurementEncoder.html
//! [`MeasurementDecoder`]: decoder/struct.MeasurementDecoder.html
//! [`MeasurementEncoder::finish`]: encoder/struct.MeasurementEncoder.html#method.finish
//! [`MeasurementDecoder::load`]: decoder/struct.MeasurementDecoder.html#method.load
//!
//! # Parallelism
//!
//! This crates has an optional feature 'parallel'.
//! When using this feature, [`par_decode_buffers`] is exposed, it decodes
//! independent streams in multiple threads.
//!
//! [`par_decode_buffers`]: stream/fn.par_decode_buffers.html

pub(crate) mod bitstream;
pub(crate) mod buffer;
pub(crate) mod codes;
pub(crate) mod models;
pub(crate) mod point;
pub(crate) mod timestamps;

pub mod decoder;
pub mod encoder;
pub mod errors;
pub mod options;
pub mod record;
pub mod stream;
pub mod values;

pub use codes::TypeCode;
pub use decoder::MeasurementDecoder;
pub use encoder::MeasurementEncoder;
pub use errors::{MeasurementStreamError, Result};
pub use options::{StreamOptions, StreamOptionsBuilder};
pub use record::{DecodeResult, Measurement};
#[cfg(feature = "parallel")]
pub use stream::par_decode_buffers;
pub use stream::{decode_buffer, encode_records};
pub use values::Value;
