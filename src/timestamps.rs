//! Stream wide timestamp history.
//!
//! Timestamps are coded against the previous one using a small cache of the
//! smallest distinct deltas seen so far, sorted ascending. Unused slots hold
//! `i64::MAX`.

use std::convert::TryFrom;

use crate::buffer::ByteBuffer;
use crate::codes::{
    TIMESTAMP2, TIME_DELTA1_FORWARD, TIME_DELTA1_REVERSE, TIME_DELTA4_FORWARD,
    TIME_DELTA4_REVERSE, TIME_XOR_7BIT,
};
use crate::errors::{CodePhase, MeasurementStreamError, Result};

const DELTA_SLOTS: usize = 4;

#[derive(Debug, Clone)]
pub(crate) struct TimestampHistory {
    prev_timestamp_1: i64,
    prev_timestamp_2: i64,
    deltas: [i64; DELTA_SLOTS],
    has_previous: bool,
}

impl TimestampHistory {
    pub(crate) fn new() -> Self {
        Self {
            prev_timestamp_1: 0,
            prev_timestamp_2: 0,
            deltas: [i64::MAX; DELTA_SLOTS],
            has_previous: false,
        }
    }

    /// Timestamp of the last measurement that carried a timestamp code
    pub(crate) fn latest(&self) -> i64 {
        self.prev_timestamp_1
    }

    #[cfg(test)]
    pub(crate) fn deltas(&self) -> [i64; DELTA_SLOTS] {
        self.deltas
    }

    /// Chooses the code for `timestamp`, `None` when it did not change.
    ///
    /// The history is updated as the decoder will update it.
    /// The `TimeXOR7Bit` code comes with the value to write as a 7 bit varint.
    pub(crate) fn encode(&mut self, timestamp: i64) -> Option<(u8, Option<u64>)> {
        let prev = self.prev_timestamp_1;
        if timestamp == prev {
            return None;
        }
        let slot = if prev < timestamp {
            self.deltas
                .iter()
                .position(|&d| prev.wrapping_add(d) == timestamp)
                .map(|i| TIME_DELTA1_FORWARD + i as u8)
        } else {
            self.deltas
                .iter()
                .position(|&d| prev.wrapping_sub(d) == timestamp)
                .map(|i| TIME_DELTA1_REVERSE + i as u8)
        };
        let coded = if timestamp == self.prev_timestamp_2 {
            (TIMESTAMP2, None)
        } else if let Some(code) = slot {
            (code, None)
        } else {
            (TIME_XOR_7BIT, Some((prev ^ timestamp) as u64))
        };
        self.record(timestamp);
        Some(coded)
    }

    /// Resolves the timestamp of a time `code`, reading the varint if any
    pub(crate) fn decode(&mut self, code: u8, buffer: &mut ByteBuffer) -> Result<i64> {
        let prev = self.prev_timestamp_1;
        let timestamp = match code {
            TIME_DELTA1_FORWARD..=TIME_DELTA4_FORWARD => {
                prev.wrapping_add(self.deltas[(code - TIME_DELTA1_FORWARD) as usize])
            }
            TIME_DELTA1_REVERSE..=TIME_DELTA4_REVERSE => {
                prev.wrapping_sub(self.deltas[(code - TIME_DELTA1_REVERSE) as usize])
            }
            TIMESTAMP2 => self.prev_timestamp_2,
            TIME_XOR_7BIT => prev ^ buffer.read_7bit_u64()? as i64,
            _ => {
                return Err(MeasurementStreamError::MalformedStream {
                    code,
                    phase: CodePhase::AfterPointId,
                })
            }
        };
        self.record(timestamp);
        Ok(timestamp)
    }

    fn record(&mut self, timestamp: i64) {
        if self.has_previous {
            let delta =
                i64::try_from(self.prev_timestamp_1.abs_diff(timestamp)).unwrap_or(i64::MAX);
            self.insert_delta(delta);
        }
        self.has_previous = true;
        self.prev_timestamp_2 = self.prev_timestamp_1;
        self.prev_timestamp_1 = timestamp;
    }

    /// Keeps the 4 smallest distinct deltas, sorted ascending
    fn insert_delta(&mut self, delta: i64) {
        if delta >= self.deltas[DELTA_SLOTS - 1] || self.deltas.contains(&delta) {
            return;
        }
        let slot = self
            .deltas
            .iter()
            .position(|&d| delta < d)
            .unwrap_or(DELTA_SLOTS - 1);
        for i in (slot..DELTA_SLOTS - 1).rev() {
            self.deltas[i + 1] = self.deltas[i];
        }
        self.deltas[slot] = delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_timestamp_records_no_delta() {
        let mut history = TimestampHistory::new();
        assert_eq!(history.encode(100), Some((TIME_XOR_7BIT, Some(100))));
        assert_eq!(history.deltas(), [i64::MAX; 4]);
        assert_eq!(history.latest(), 100);
    }

    #[test]
    fn test_deltas_stay_sorted_and_distinct() {
        let mut history = TimestampHistory::new();
        for &ts in &[100, 105, 106, 200] {
            history.encode(ts);
        }
        assert_eq!(history.deltas(), [1, 5, 94, i64::MAX]);

        // 5 again is not inserted twice
        history.encode(205);
        assert_eq!(history.deltas(), [1, 5, 94, i64::MAX]);

        history.encode(207);
        assert_eq!(history.deltas(), [1, 2, 5, 94]);

        // larger than every slot: ignored
        history.encode(1207);
        assert_eq!(history.deltas(), [1, 2, 5, 94]);

        history.encode(1210);
        assert_eq!(history.deltas(), [1, 2, 3, 5]);
    }

    #[test]
    fn test_codes_chosen_for_known_deltas() {
        let mut history = TimestampHistory::new();
        history.encode(1000);
        history.encode(1010);
        history.encode(1011);
        // deltas are [1, 10, MAX, MAX]
        assert_eq!(history.encode(1021), Some((TIME_DELTA1_FORWARD + 1, None)));
        assert_eq!(history.encode(1020), Some((TIME_DELTA1_REVERSE, None)));
        // prev_timestamp_2 is 1021
        assert_eq!(history.encode(1021), Some((TIMESTAMP2, None)));
        assert_eq!(history.encode(1021), None);
        assert_eq!(history.encode(1000), Some((TIME_XOR_7BIT, Some(1021 ^ 1000))));
    }

    #[test]
    fn test_decode_mirrors_encode() {
        let timestamps = [
            5i64, 5, 10, 15, 20, 19, 20, -7, 1 << 40, 1 << 40, 3, i64::MIN, i64::MAX, 0, 1,
        ];
        let mut encoder = TimestampHistory::new();
        let mut buffer = ByteBuffer::default();
        let mut codes = Vec::new();
        for &ts in &timestamps {
            let coded = encoder.encode(ts);
            if let Some((_, Some(xor))) = coded {
                buffer.write_7bit_u64(xor);
            }
            codes.push(coded.map(|(code, _)| code));
        }

        let bytes = buffer.take_bytes();
        buffer.load(&bytes);
        let mut decoder = TimestampHistory::new();
        for (&ts, code) in timestamps.iter().zip(codes) {
            let decoded = match code {
                Some(code) => decoder.decode(code, &mut buffer).unwrap(),
                None => decoder.latest(),
            };
            assert_eq!(decoded, ts);
        }
        assert_eq!(decoder.deltas(), encoder.deltas());
    }

    proptest::proptest! {
        #[test]
        fn prop_delta_cache_is_sorted_distinct_and_minimal(
            timestamps in proptest::collection::vec(-1_000i64..1_000, 0..200)
        ) {
            let mut history = TimestampHistory::new();
            let mut seen = Vec::new();
            let mut previous: Option<i64> = None;
            for &ts in &timestamps {
                if history.encode(ts).is_some() {
                    if let Some(previous) = previous {
                        seen.push((previous - ts).abs());
                    }
                    previous = Some(ts);
                }
            }
            seen.sort_unstable();
            seen.dedup();
            let deltas = history.deltas();
            for (i, &delta) in deltas.iter().enumerate() {
                let expected = seen.get(i).copied().unwrap_or(i64::MAX);
                proptest::prop_assert_eq!(delta, expected);
            }
        }
    }
}
