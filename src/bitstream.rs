//! Bits are packed most significant bit first.
//!
//! The bit stream and the byte aligned payloads share the same [`ByteBuffer`]:
//! when the writer starts a new cache byte it reserves its slot at the current
//! position, raw bytes written afterwards land after that slot. The reader
//! pulls a cache byte at the moment it needs its first bit, so both sides walk
//! the buffer in the same order.
//!
//! [`ByteBuffer`]: ../buffer/struct.ByteBuffer.html

use crate::buffer::ByteBuffer;
use crate::errors::Result;

pub struct BitReader {
    buffer: ByteBuffer,
    cache: u32,
    bit_count: u32,
}

impl BitReader {
    pub fn new(buffer: ByteBuffer) -> Self {
        Self {
            buffer,
            cache: 0,
            bit_count: 0,
        }
    }

    #[inline]
    pub fn read_bit(&mut self) -> Result<u32> {
        if self.bit_count == 0 {
            self.cache = u32::from(self.buffer.read_u8()?);
            self.bit_count = 8;
        }
        self.bit_count -= 1;
        Ok((self.cache >> self.bit_count) & 1)
    }

    pub fn read_bits4(&mut self) -> Result<u32> {
        self.read_bits(4)
    }

    pub fn read_bits6(&mut self) -> Result<u32> {
        self.read_bits(6)
    }

    /// Reads `bits` bits as sequential single bit reads.
    pub fn read_bits(&mut self, bits: u32) -> Result<u32> {
        debug_assert!(bits <= 32);
        let mut value = 0u32;
        for _ in 0..bits {
            value = (value << 1) | self.read_bit()?;
        }
        Ok(value)
    }

    /// Reads an XOR delta of `width` bits.
    ///
    /// Widths that are not a multiple of 8 start with a 4 bits nibble holding
    /// the low bits, taken from the bit stream, the rest is made of whole
    /// little endian bytes taken from the buffer.
    pub fn read_split(&mut self, width: u32) -> Result<u64> {
        debug_assert!(width > 0 && width <= 64 && width % 4 == 0);
        if width % 8 == 4 {
            let low = u64::from(self.read_bits4()?);
            let high = self.buffer.read_uint_le((width / 8) as usize)?;
            Ok(low | (high << 4))
        } else {
            self.buffer.read_uint_le((width / 8) as usize)
        }
    }

    /// Drops the bits left in the cache, the next bit read starts on a new byte
    pub fn clear_bits(&mut self) {
        self.cache = 0;
        self.bit_count = 0;
    }

    pub fn has_pending_bits(&self) -> bool {
        self.bit_count != 0
    }

    /// True when every byte was consumed and no bit is left in the cache
    pub fn is_exhausted(&self) -> bool {
        self.buffer.remaining() == 0 && !self.has_pending_bits()
    }

    pub fn buffer(&mut self) -> &mut ByteBuffer {
        &mut self.buffer
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.clear_bits();
    }
}

pub struct BitWriter {
    buffer: ByteBuffer,
    cache: u32,
    bit_count: u32,
    cache_index: usize,
    bits_written: u64,
}

impl BitWriter {
    pub fn new(buffer: ByteBuffer) -> Self {
        Self {
            buffer,
            cache: 0,
            bit_count: 0,
            cache_index: 0,
            bits_written: 0,
        }
    }

    #[inline]
    pub fn write_bit(&mut self, bit: u32) {
        if self.bit_count == 0 {
            self.cache_index = self.buffer.reserve_byte();
        }
        self.cache = (self.cache << 1) | (bit & 1);
        self.bit_count += 1;
        self.bits_written += 1;
        if self.bit_count == 8 {
            self.buffer.set_byte(self.cache_index, self.cache as u8);
            self.cache = 0;
            self.bit_count = 0;
        }
    }

    /// Writes the `count` low bits of `value`, most significant first
    pub fn write_bits(&mut self, value: u32, count: u32) {
        debug_assert!(count <= 32);
        for shift in (0..count).rev() {
            self.write_bit(value >> shift);
        }
    }

    /// Writes the `width` low bits of `bits` the way [`BitReader::read_split`] reads them
    ///
    /// [`BitReader::read_split`]: struct.BitReader.html#method.read_split
    pub fn write_split(&mut self, width: u32, bits: u64) {
        debug_assert!(width > 0 && width <= 64 && width % 4 == 0);
        if width % 8 == 4 {
            self.write_bits((bits & 0xF) as u32, 4);
            self.buffer.write_uint_le(bits >> 4, (width / 8) as usize);
        } else {
            self.buffer.write_uint_le(bits, (width / 8) as usize);
        }
    }

    /// Pads the cache with zeros up to the byte boundary and stores it
    pub fn flush(&mut self) {
        if self.bit_count > 0 {
            let byte = self.cache << (8 - self.bit_count);
            self.buffer.set_byte(self.cache_index, byte as u8);
            self.cache = 0;
            self.bit_count = 0;
        }
    }

    pub fn has_pending_bits(&self) -> bool {
        self.bit_count != 0
    }

    /// Number of bits that went through the bit stream since creation or reset
    pub fn bits_written(&self) -> u64 {
        self.bits_written
    }

    pub fn buffer(&mut self) -> &mut ByteBuffer {
        &mut self.buffer
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.cache = 0;
        self.bit_count = 0;
        self.bits_written = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader_of(writer: &mut BitWriter) -> BitReader {
        writer.flush();
        let bytes = writer.buffer().take_bytes();
        let mut buffer = ByteBuffer::default();
        buffer.load(&bytes);
        BitReader::new(buffer)
    }

    #[test]
    fn test_bits_are_msb_first() {
        let mut writer = BitWriter::new(ByteBuffer::default());
        writer.write_bits(0b1011, 4);
        writer.write_bits(0b0110, 4);
        assert_eq!(writer.buffer().as_slice(), &[0b1011_0110]);
    }

    #[test]
    fn test_flush_pads_with_zeros() {
        let mut writer = BitWriter::new(ByteBuffer::default());
        writer.write_bits(0b101, 3);
        assert!(writer.has_pending_bits());
        writer.flush();
        assert!(!writer.has_pending_bits());
        assert_eq!(writer.buffer().as_slice(), &[0b1010_0000]);
    }

    #[test]
    fn test_bits6_and_bits4_are_sequential_bit_reads() {
        let mut writer = BitWriter::new(ByteBuffer::default());
        writer.write_bits(0b11_0101, 6);
        writer.write_bits(0b1001, 4);
        writer.write_bit(1);

        let mut reader = reader_of(&mut writer);
        assert_eq!(reader.read_bits6().unwrap(), 0b11_0101);
        assert_eq!(reader.read_bits4().unwrap(), 0b1001);
        assert_eq!(reader.read_bit().unwrap(), 1);
    }

    #[test]
    fn test_raw_bytes_interleave_with_bits() {
        let mut writer = BitWriter::new(ByteBuffer::default());
        writer.write_bit(1);
        writer.buffer().write_u8(0xAB);
        writer.write_bits(0b0101_010, 7);
        writer.write_bits(0b111, 3);
        writer.buffer().write_u8(0xCD);

        let mut reader = reader_of(&mut writer);
        assert_eq!(reader.read_bit().unwrap(), 1);
        assert_eq!(reader.buffer().read_u8().unwrap(), 0xAB);
        assert_eq!(reader.read_bits(7).unwrap(), 0b0101_010);
        assert_eq!(reader.read_bits(3).unwrap(), 0b111);
        assert_eq!(reader.buffer().read_u8().unwrap(), 0xCD);
        reader.clear_bits();
        assert!(reader.is_exhausted());
    }

    #[test]
    fn test_split_widths() {
        let mut writer = BitWriter::new(ByteBuffer::default());
        writer.write_split(4, 0xA);
        writer.write_split(12, 0xBCD);
        writer.write_split(16, 0x1234);
        writer.write_split(28, 0x0FED_CBA9);
        writer.write_split(64, u64::MAX - 1);

        let mut reader = reader_of(&mut writer);
        assert_eq!(reader.read_split(4).unwrap(), 0xA);
        assert_eq!(reader.read_split(12).unwrap(), 0xBCD);
        assert_eq!(reader.read_split(16).unwrap(), 0x1234);
        assert_eq!(reader.read_split(28).unwrap(), 0x0FED_CBA9);
        assert_eq!(reader.read_split(64).unwrap(), u64::MAX - 1);
    }

    #[test]
    fn test_split_12_layout() {
        let mut writer = BitWriter::new(ByteBuffer::default());
        writer.write_split(12, 0xBCD);
        writer.flush();
        // the nibble byte was reserved first, the high byte follows it
        assert_eq!(writer.buffer().as_slice(), &[0xD0, 0xBC]);
    }

    #[test]
    fn test_reading_an_empty_buffer_fails() {
        let mut reader = BitReader::new(ByteBuffer::default());
        assert!(reader.is_exhausted());
        assert!(reader.read_bit().is_err());
    }
}
