//! Frequency adaptive prefix code of the 64 local codes.

use log::trace;

use crate::bitstream::{BitReader, BitWriter};
use crate::codes::CODE_COUNT;
use crate::errors::Result;

// codes seen before the first, second, and every later retrain
const FIRST_UPDATE_THRESHOLD: u32 = 5;
const SECOND_UPDATE_THRESHOLD: u32 = 20;
const STEADY_UPDATE_THRESHOLD: u32 = 100;

/// Bits to write a code that has no escape (the 6 raw bits included).
const RAW_CODE_BITS: [u32; 5] = [0, 6, 7, 8, 9];

/// Layout of the prefix code.
///
/// In mode `n` the `n - 1` escape codes are written as `1`, `01`, `001`,
/// every other code as `n - 1` zeros followed by its 6 raw bits.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CodeMode {
    /// Flat 6 bits
    Mode1,
    Mode2 { escape_1: u8 },
    Mode3 { escape_1: u8, escape_01: u8 },
    Mode4 { escape_1: u8, escape_01: u8, escape_001: u8 },
}

impl CodeMode {
    pub fn number(&self) -> u8 {
        match self {
            CodeMode::Mode1 => 1,
            CodeMode::Mode2 { .. } => 2,
            CodeMode::Mode3 { .. } => 3,
            CodeMode::Mode4 { .. } => 4,
        }
    }

    fn escapes(&self) -> [Option<u8>; 3] {
        match *self {
            CodeMode::Mode1 => [None, None, None],
            CodeMode::Mode2 { escape_1 } => [Some(escape_1), None, None],
            CodeMode::Mode3 {
                escape_1,
                escape_01,
            } => [Some(escape_1), Some(escape_01), None],
            CodeMode::Mode4 {
                escape_1,
                escape_01,
                escape_001,
            } => [Some(escape_1), Some(escape_01), Some(escape_001)],
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum TrainingEpoch {
    First,
    Second,
    Steady,
}

/// Adaptive mapping of the local codes to bit patterns, one per point.
#[derive(Debug, Clone)]
pub struct AdaptiveCodeModel {
    mode: CodeMode,
    code_counts: [u32; CODE_COUNT],
    codes_since_update: u32,
    epoch: TrainingEpoch,
}

impl AdaptiveCodeModel {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn mode(&self) -> CodeMode {
        self.mode
    }

    /// Returns the bit pattern (right aligned) and its length in bits for `code`.
    ///
    /// Pure lookup, statistics are not touched.
    pub fn code_bits(&self, code: u8) -> (u32, u32) {
        debug_assert!((code as usize) < CODE_COUNT);
        let escapes = self.mode.escapes();
        for (depth, escape) in escapes.iter().enumerate() {
            if *escape == Some(code) {
                // depth zeros then a one
                return (1, depth as u32 + 1);
            }
        }
        (u32::from(code), RAW_CODE_BITS[self.mode.number() as usize])
    }

    /// Writes `code` and updates the statistics
    pub fn encode(&mut self, writer: &mut BitWriter, code: u8) -> u32 {
        let (bits, length) = self.code_bits(code);
        writer.write_bits(bits, length);
        self.update_statistics(code);
        length
    }

    /// Reads one code and updates the statistics
    pub fn decode(&mut self, reader: &mut BitReader) -> Result<u8> {
        let escapes = self.mode.escapes();
        let mut code = None;
        for escape in escapes.iter().take_while(|e| e.is_some()).flatten() {
            if reader.read_bit()? == 1 {
                code = Some(*escape);
                break;
            }
        }
        let code = match code {
            Some(code) => code,
            None => reader.read_bits6()? as u8,
        };
        self.update_statistics(code);
        Ok(code)
    }

    fn update_statistics(&mut self, code: u8) {
        self.codes_since_update += 1;
        self.code_counts[code as usize] += 1;

        match self.epoch {
            TrainingEpoch::First if self.codes_since_update > FIRST_UPDATE_THRESHOLD => {
                self.epoch = TrainingEpoch::Second;
                self.adapt();
            }
            TrainingEpoch::Second if self.codes_since_update > SECOND_UPDATE_THRESHOLD => {
                self.epoch = TrainingEpoch::Steady;
                self.adapt();
            }
            TrainingEpoch::Steady if self.codes_since_update > STEADY_UPDATE_THRESHOLD => {
                self.adapt();
            }
            _ => {}
        }
    }

    /// Picks the mode that would have used the least bits on the codes
    /// seen since the last update, then forgets those statistics.
    fn adapt(&mut self) {
        let top = top_three_codes(&self.code_counts);
        let total: u64 = self.code_counts.iter().map(|&c| u64::from(c)).sum();
        let [(code_1, count_1), (code_2, count_2), (code_3, count_3)] = top;

        let mode_1_size = total * 6;
        let mode_2_size = count_1 + (total - count_1) * 7;
        let mode_3_size = count_1 + count_2 * 2 + (total - count_1 - count_2) * 8;
        let mode_4_size =
            count_1 + count_2 * 2 + count_3 * 3 + (total - count_1 - count_2 - count_3) * 9;

        let old_mode = self.mode;
        // ties go to the mode with fewer escapes
        self.mode = if mode_1_size <= mode_2_size
            && mode_1_size <= mode_3_size
            && mode_1_size <= mode_4_size
        {
            CodeMode::Mode1
        } else if mode_2_size <= mode_3_size && mode_2_size <= mode_4_size {
            CodeMode::Mode2 { escape_1: code_1 }
        } else if mode_3_size <= mode_4_size {
            CodeMode::Mode3 {
                escape_1: code_1,
                escape_01: code_2,
            }
        } else {
            CodeMode::Mode4 {
                escape_1: code_1,
                escape_01: code_2,
                escape_001: code_3,
            }
        };
        trace!(
            "code model retrained on {} codes: {:?} -> {:?}",
            total,
            old_mode,
            self.mode
        );

        self.code_counts = [0u32; CODE_COUNT];
        self.codes_since_update = 0;
    }
}

impl Default for AdaptiveCodeModel {
    fn default() -> Self {
        Self {
            mode: CodeMode::Mode1,
            code_counts: [0u32; CODE_COUNT],
            codes_since_update: 0,
            epoch: TrainingEpoch::First,
        }
    }
}

/// The three most frequent codes with their counts, most frequent first.
///
/// Equal counts are ordered by the lowest code, the three codes are distinct.
fn top_three_codes(counts: &[u32; CODE_COUNT]) -> [(u8, u64); 3] {
    let mut top = [(0u8, 0u64), (1u8, 0u64), (2u8, 0u64)];
    let mut filled = 0;
    for (code, &count) in counts.iter().enumerate() {
        let entry = (code as u8, u64::from(count));
        // strictly greater keeps the earliest (lowest) code on ties
        let slot = top[..filled]
            .iter()
            .position(|&(_, c)| entry.1 > c)
            .unwrap_or(filled);
        if slot < 3 {
            let end = filled.min(2);
            for i in (slot..end).rev() {
                top[i + 1] = top[i];
            }
            top[slot] = entry;
            filled = (filled + 1).min(3);
        }
    }
    top
}
