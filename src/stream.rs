//! Whole buffer helpers built on top of the encoder and decoder.

use crate::decoder::MeasurementDecoder;
use crate::encoder::MeasurementEncoder;
use crate::errors::{MeasurementStreamError, Result};
use crate::record::DecodeResult;

/// Decodes every item of a complete stream.
///
/// The trailing [`DecodeResult::EndOfStream`] is not part of the output.
///
/// [`DecodeResult::EndOfStream`]: ../record/enum.DecodeResult.html#variant.EndOfStream
pub fn decode_buffer(bytes: &[u8]) -> Result<Vec<DecodeResult>> {
    let mut decoder = MeasurementDecoder::new();
    decoder.load(bytes);
    let mut records = Vec::new();
    loop {
        match decoder.get_measurement()? {
            DecodeResult::EndOfStream => break,
            record => records.push(record),
        }
    }
    Ok(records)
}

/// Encodes a sequence of records, as produced by [`decode_buffer`], into a new stream.
///
/// Registrations must come with the dense ids the encoder hands out,
/// any other id is reported as an [`UnknownPoint`].
/// `EndOfStream` records are skipped.
///
/// [`decode_buffer`]: fn.decode_buffer.html
/// [`UnknownPoint`]: ../errors/enum.MeasurementStreamError.html#variant.UnknownPoint
pub fn encode_records(records: &[DecodeResult]) -> Result<Vec<u8>> {
    let mut encoder = MeasurementEncoder::new();
    for record in records {
        match record {
            DecodeResult::NewPointRegistered {
                id,
                type_code,
                metadata,
            } => {
                let expected = encoder.point_count() as u32;
                if *id != expected {
                    return Err(MeasurementStreamError::UnknownPoint(*id));
                }
                encoder.register_point(*type_code, metadata)?;
            }
            DecodeResult::UserData { command } => encoder.write_user_command(*command),
            DecodeResult::UserDataWithValue { command, payload } => {
                encoder.write_user_command_with_data(*command, payload)?
            }
            DecodeResult::MeasurementRead(measurement) => encoder.write_measurement(measurement)?,
            DecodeResult::EndOfStream => {}
        }
    }
    Ok(encoder.finish())
}

/// Decodes independent streams in parallel, one decoder per stream.
///
/// The results are in the same order as `buffers`.
#[cfg(feature = "parallel")]
pub fn par_decode_buffers<B>(buffers: &[B]) -> Vec<Result<Vec<DecodeResult>>>
where
    B: AsRef<[u8]> + Sync,
{
    use rayon::prelude::*;

    buffers
        .par_iter()
        .map(|bytes| decode_buffer(bytes.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::TypeCode;
    use crate::record::Measurement;
    use crate::values::Value;

    fn sample_records() -> Vec<DecodeResult> {
        vec![
            DecodeResult::NewPointRegistered {
                id: 0,
                type_code: TypeCode::Int32,
                metadata: b"breaker".to_vec(),
            },
            DecodeResult::MeasurementRead(Measurement::new(0, 5, 1, Value::I32(-4))),
            DecodeResult::UserData { command: 12 },
            DecodeResult::MeasurementRead(Measurement::new(0, 6, 1, Value::I32(-4))),
            DecodeResult::UserDataWithValue {
                command: 13,
                payload: vec![1, 2, 3],
            },
        ]
    }

    #[test]
    fn test_encode_then_decode_records() {
        let records = sample_records();
        let bytes = encode_records(&records).unwrap();
        assert_eq!(decode_buffer(&bytes).unwrap(), records);
    }

    #[test]
    fn test_registration_ids_must_be_dense() {
        let records = vec![DecodeResult::NewPointRegistered {
            id: 1,
            type_code: TypeCode::Single,
            metadata: vec![],
        }];
        assert_eq!(
            encode_records(&records),
            Err(MeasurementStreamError::UnknownPoint(1))
        );
    }

    #[test]
    fn test_empty_stream() {
        assert_eq!(decode_buffer(&[]).unwrap(), vec![]);
        assert!(encode_records(&[]).unwrap().is_empty());
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_par_decode_keeps_order() {
        let first = encode_records(&sample_records()).unwrap();
        let second = encode_records(&sample_records()[..2]).unwrap();
        let results = par_decode_buffers(&[first, second]);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap().len(), 5);
        assert_eq!(results[1].as_ref().unwrap().len(), 2);
    }
}
