use measurement_stream::errors::CodePhase;
use measurement_stream::{
    DecodeResult, MeasurementDecoder, MeasurementStreamError, StreamOptionsBuilder, TypeCode,
};

// Hand made streams, every code is 6 raw bits as long as the models are untrained.
// The first byte holds the bits of the codes, payload bytes follow it.

#[test]
fn test_unsupported_type_poisons_the_decoder() {
    let mut decoder = MeasurementDecoder::new();
    // NewPointId, then type byte 0x63
    decoder.load(&[0b0000_0000, 0x63, 0x00]);
    assert_eq!(
        decoder.get_measurement(),
        Err(MeasurementStreamError::UnsupportedType(0x63))
    );
    assert_eq!(
        decoder.get_measurement(),
        Err(MeasurementStreamError::UnsupportedType(0x63))
    );
    assert_eq!(decoder.point_count(), 0);

    // a new load lifts the failure
    decoder.load(&[]);
    assert_eq!(decoder.get_measurement(), Ok(DecodeResult::EndOfStream));
}

#[test]
fn test_truncated_registration() {
    let mut decoder = MeasurementDecoder::new();
    // NewPointId, type byte missing
    decoder.load(&[0b0000_0000]);
    assert_eq!(
        decoder.get_measurement(),
        Err(MeasurementStreamError::BufferUnderrun {
            needed: 1,
            available: 0,
        })
    );

    decoder.reset();
    // NewPointId Single with 4 bytes of metadata announced, 2 present
    decoder.load(&[0b0000_0000, 13, 4, b'a', b'b']);
    assert_eq!(
        decoder.get_measurement(),
        Err(MeasurementStreamError::BufferUnderrun {
            needed: 4,
            available: 2,
        })
    );
}

#[test]
fn test_unused_code_is_malformed() {
    let mut decoder = MeasurementDecoder::new();
    // NewPointId (000000) Single, no metadata, then code 44 (101100)
    // split over the first byte and a new one
    decoder.load(&[0b0000_0010, 13, 0, 0b1100_0000]);
    assert_eq!(
        decoder.get_measurement(),
        Ok(DecodeResult::NewPointRegistered {
            id: 0,
            type_code: TypeCode::Single,
            metadata: vec![],
        })
    );
    assert_eq!(
        decoder.get_measurement(),
        Err(MeasurementStreamError::MalformedStream {
            code: 44,
            phase: CodePhase::Start,
        })
    );
}

#[test]
fn test_quality_must_be_followed_by_a_value() {
    let mut decoder = MeasurementDecoder::new();
    // NewPointId (000000) Int32, then Quality7Bit32 (010110) with quality 5,
    // then Quality2 (010101)
    decoder.load(&[0b0000_0001, 9, 0, 0b0110_0101, 5, 0b0100_0000]);
    assert!(matches!(
        decoder.get_measurement(),
        Ok(DecodeResult::NewPointRegistered { .. })
    ));
    assert_eq!(
        decoder.get_measurement(),
        Err(MeasurementStreamError::MalformedStream {
            code: 21,
            phase: CodePhase::AfterQuality,
        })
    );
}

#[test]
fn test_measurement_before_any_registration() {
    let mut decoder = MeasurementDecoder::new();
    // Value1 (100000) with no point registered
    decoder.load(&[0b1000_0000]);
    assert_eq!(
        decoder.get_measurement(),
        Err(MeasurementStreamError::UnknownPoint(0))
    );
}

#[test]
fn test_unused_code_before_any_registration_is_malformed() {
    // code 44 (101100) with no point registered
    let mut decoder = MeasurementDecoder::new();
    decoder.load(&[0b1011_0000]);
    assert_eq!(
        decoder.get_measurement(),
        Err(MeasurementStreamError::MalformedStream {
            code: 44,
            phase: CodePhase::Start,
        })
    );

    // code 23 (010111), between the quality and the value codes
    let mut decoder = MeasurementDecoder::new();
    decoder.load(&[0b0101_1100]);
    assert_eq!(
        decoder.get_measurement(),
        Err(MeasurementStreamError::MalformedStream {
            code: 23,
            phase: CodePhase::Start,
        })
    );
}

#[test]
fn test_point_limit_on_hostile_input() {
    let options = StreamOptionsBuilder::new().with_max_points(1).build();
    let mut decoder = MeasurementDecoder::with_options(options);
    // two NewPointId Double registrations
    decoder.load(&[0b0000_0000, 14, 0, 0b0000_0000, 14, 0]);
    assert!(matches!(
        decoder.get_measurement(),
        Ok(DecodeResult::NewPointRegistered { id: 0, .. })
    ));
    assert_eq!(
        decoder.get_measurement(),
        Err(MeasurementStreamError::TooManyPoints { limit: 1 })
    );
}
