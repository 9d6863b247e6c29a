//! Growable byte storage shared by the bit stream and the byte aligned payloads.

use byteorder::{ByteOrder, LittleEndian};

use crate::errors::{MeasurementStreamError, Result};

const MIN_CAPACITY: usize = 16;

/// Contiguous bytes with a cursor.
///
/// `data.len()` is the capacity, `length` the number of meaningful bytes.
/// Reads consume from `position` up to `length`, writes append at `position`.
#[derive(Debug, Clone)]
pub struct ByteBuffer {
    data: Vec<u8>,
    position: usize,
    length: usize,
}

impl ByteBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity],
            position: 0,
            length: 0,
        }
    }

    /// Replaces the content of the buffer with `bytes` and rewinds the cursor
    pub fn load(&mut self, bytes: &[u8]) {
        self.position = 0;
        self.length = 0;
        self.ensure_capacity(bytes.len());
        self.data[..bytes.len()].copy_from_slice(bytes);
        self.length = bytes.len();
    }

    /// Appends `bytes` after the unread part of the buffer.
    ///
    /// Already consumed bytes are discarded so the cursor goes back to 0.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.data.copy_within(self.position..self.length, 0);
        self.length -= self.position;
        self.position = self.length;
        self.ensure_capacity(bytes.len());
        self.data[self.length..self.length + bytes.len()].copy_from_slice(bytes);
        self.length += bytes.len();
        self.position = 0;
    }

    pub fn clear(&mut self) {
        self.position = 0;
        self.length = 0;
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.length
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.len() - self.position()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.length]
    }

    /// Returns the written bytes and empties the buffer, the capacity is kept.
    pub fn take_bytes(&mut self) -> Vec<u8> {
        let bytes = self.as_slice().to_vec();
        self.clear();
        bytes
    }

    /// Doubles the capacity, existing bytes are preserved
    pub fn grow(&mut self) {
        let new_capacity = (self.data.len() * 2).max(MIN_CAPACITY);
        self.data.resize(new_capacity, 0);
    }

    fn ensure_capacity(&mut self, additional: usize) {
        while self.position + additional > self.capacity()
            || self.length + additional > self.capacity()
        {
            self.grow();
        }
    }

    #[inline]
    fn check_available(&self, needed: usize) -> Result<()> {
        if needed > self.remaining() {
            Err(MeasurementStreamError::BufferUnderrun {
                needed,
                available: self.remaining(),
            })
        } else {
            Ok(())
        }
    }

    /*****************************************************************************
                        Reading
    *****************************************************************************/

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        self.check_available(1)?;
        let byte = self.data[self.position];
        self.position += 1;
        Ok(byte)
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<&[u8]> {
        self.check_available(count)?;
        let start = self.position;
        self.position += count;
        Ok(&self.data[start..self.position])
    }

    /// Reads a `num_bytes` (at most 8) little endian unsigned integer
    pub fn read_uint_le(&mut self, num_bytes: usize) -> Result<u64> {
        debug_assert!(num_bytes <= 8);
        if num_bytes == 0 {
            return Ok(0);
        }
        let bytes = self.read_bytes(num_bytes)?;
        Ok(LittleEndian::read_uint(bytes, num_bytes))
    }

    pub fn read_7bit_u32(&mut self) -> Result<u32> {
        let value = self.read_7bit(5)?;
        if value > u64::from(u32::MAX) {
            return Err(MeasurementStreamError::InvalidVarint);
        }
        Ok(value as u32)
    }

    pub fn read_7bit_u64(&mut self) -> Result<u64> {
        self.read_7bit(10)
    }

    fn read_7bit(&mut self, max_groups: u32) -> Result<u64> {
        let mut value = 0u64;
        for group in 0..max_groups {
            let byte = self.read_u8()?;
            let bits = u64::from(byte & 0x7F);
            let shift = 7 * group;
            if shift == 63 && bits > 1 {
                return Err(MeasurementStreamError::InvalidVarint);
            }
            value |= bits << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(MeasurementStreamError::InvalidVarint)
    }

    /*****************************************************************************
                        Writing
    *****************************************************************************/

    #[inline]
    pub fn write_u8(&mut self, byte: u8) {
        self.ensure_capacity(1);
        self.data[self.position] = byte;
        self.position += 1;
        self.length = self.position;
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.ensure_capacity(bytes.len());
        self.data[self.position..self.position + bytes.len()].copy_from_slice(bytes);
        self.position += bytes.len();
        self.length = self.position;
    }

    /// Writes the `num_bytes` low bytes of `value` in little endian order
    pub fn write_uint_le(&mut self, value: u64, num_bytes: usize) {
        debug_assert!(num_bytes <= 8);
        if num_bytes == 0 {
            return;
        }
        let mut tmp = [0u8; 8];
        let masked = if num_bytes == 8 {
            value
        } else {
            value & ((1u64 << (8 * num_bytes)) - 1)
        };
        LittleEndian::write_uint(&mut tmp, masked, num_bytes);
        self.write_bytes(&tmp[..num_bytes]);
    }

    pub fn write_7bit_u32(&mut self, value: u32) {
        self.write_7bit_u64(u64::from(value));
    }

    pub fn write_7bit_u64(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.write_u8((value as u8 & 0x7F) | 0x80);
            value >>= 7;
        }
        self.write_u8(value as u8);
    }

    /// Reserves one byte at the cursor to be filled later with [`set_byte`]
    ///
    /// [`set_byte`]: #method.set_byte
    pub(crate) fn reserve_byte(&mut self) -> usize {
        let index = self.position;
        self.write_u8(0);
        index
    }

    pub(crate) fn set_byte(&mut self, index: usize, byte: u8) {
        debug_assert!(index < self.length);
        self.data[index] = byte;
    }
}

impl Default for ByteBuffer {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grow_keeps_the_written_bytes() {
        let mut buffer = ByteBuffer::with_capacity(2);
        buffer.write_bytes(&[1, 2]);
        assert_eq!(buffer.capacity(), 2);
        buffer.write_u8(3);
        assert!(buffer.capacity() >= 4);
        assert_eq!(buffer.as_slice(), &[1, 2, 3]);

        buffer.grow();
        assert_eq!(buffer.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn test_reading_past_the_end_is_an_underrun() {
        let mut buffer = ByteBuffer::default();
        buffer.load(&[0xAA, 0xBB]);
        assert_eq!(buffer.read_u8().unwrap(), 0xAA);
        match buffer.read_uint_le(4) {
            Err(MeasurementStreamError::BufferUnderrun { needed, available }) => {
                assert_eq!(needed, 4);
                assert_eq!(available, 1);
            }
            other => panic!("expected an underrun, got {:?}", other),
        }
        assert_eq!(buffer.read_u8().unwrap(), 0xBB);
        assert!(buffer.read_u8().is_err());
    }

    #[test]
    fn test_uint_le_layout() {
        let mut buffer = ByteBuffer::default();
        buffer.write_uint_le(0x0001_0203, 3);
        assert_eq!(buffer.as_slice(), &[0x03, 0x02, 0x01]);

        let bytes = buffer.take_bytes();
        let mut reader = ByteBuffer::default();
        reader.load(&bytes);
        assert_eq!(reader.read_uint_le(3).unwrap(), 0x0001_0203);
    }

    #[test]
    fn test_7bit_layout() {
        let mut buffer = ByteBuffer::default();
        buffer.write_7bit_u32(300);
        assert_eq!(buffer.as_slice(), &[0xAC, 0x02]);
        buffer.write_7bit_u64(u64::MAX);
        assert_eq!(buffer.len(), 2 + 10);

        let bytes = buffer.take_bytes();
        buffer.load(&bytes);
        assert_eq!(buffer.read_7bit_u32().unwrap(), 300);
        assert_eq!(buffer.read_7bit_u64().unwrap(), u64::MAX);
    }

    #[test]
    fn test_7bit_overlong_is_rejected() {
        let mut buffer = ByteBuffer::default();
        buffer.load(&[0xFF, 0xFF, 0xFF, 0xFF, 0x7F]);
        assert!(matches!(
            buffer.read_7bit_u32(),
            Err(MeasurementStreamError::InvalidVarint)
        ));
        buffer.load(&[0x80, 0x80]);
        assert!(matches!(
            buffer.read_7bit_u32(),
            Err(MeasurementStreamError::BufferUnderrun { .. })
        ));
    }

    #[test]
    fn test_extend_keeps_unread_bytes() {
        let mut buffer = ByteBuffer::default();
        buffer.load(&[1, 2, 3]);
        buffer.read_u8().unwrap();
        buffer.extend(&[4, 5]);
        assert_eq!(buffer.position(), 0);
        assert_eq!(buffer.as_slice(), &[2, 3, 4, 5]);
    }
}
