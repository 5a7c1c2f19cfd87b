//! Data output traits and implementations for Compact serialization.

use crate::error::{CompactError, Result};
use bytes::{BufMut, BytesMut};

/// Default initial capacity of an [`ObjectDataOutput`].
pub const DEFAULT_OUTPUT_CAPACITY: usize = 256;

/// Trait for appending primitive values in the Compact binary format.
///
/// All multi-byte values are written in little-endian byte order.
pub trait DataOutput {
    /// Writes a single byte (i8).
    fn write_byte(&mut self, v: i8) -> Result<()>;

    /// Writes a boolean as a single byte (0 for false, 1 for true).
    fn write_bool(&mut self, v: bool) -> Result<()>;

    /// Writes a 16-bit signed integer in little-endian order.
    fn write_short(&mut self, v: i16) -> Result<()>;

    /// Writes a 32-bit signed integer in little-endian order.
    fn write_int(&mut self, v: i32) -> Result<()>;

    /// Writes a 64-bit signed integer in little-endian order.
    fn write_long(&mut self, v: i64) -> Result<()>;

    /// Writes a 32-bit floating point in little-endian order.
    fn write_float(&mut self, v: f32) -> Result<()>;

    /// Writes a 64-bit floating point in little-endian order.
    fn write_double(&mut self, v: f64) -> Result<()>;

    /// Writes raw bytes without length prefix.
    fn write_bytes(&mut self, v: &[u8]) -> Result<()>;

    /// Writes a string as its UTF-8 byte length followed by the bytes.
    fn write_string(&mut self, v: &str) -> Result<()>;
}

/// A growable buffer implementing `DataOutput` plus absolute-offset writes.
///
/// Positional writes (`pwrite_*`) patch bytes that were already appended and
/// never move the append cursor, so earlier reservations survive any later
/// growth of the buffer.
#[derive(Debug)]
pub struct ObjectDataOutput {
    buffer: BytesMut,
}

impl ObjectDataOutput {
    /// Creates a new `ObjectDataOutput` with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_OUTPUT_CAPACITY)
    }

    /// Creates a new `ObjectDataOutput` with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    /// Returns the written bytes as a slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Consumes the output and returns the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer.to_vec()
    }

    /// Returns the number of bytes written.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if no bytes have been written.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clears the buffer, removing all written data.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Returns the append cursor, which is always the end of the written data.
    pub fn position(&self) -> usize {
        self.buffer.len()
    }

    /// Appends `count` zero bytes.
    pub fn write_zero_bytes(&mut self, count: usize) {
        self.buffer.put_bytes(0, count);
    }

    /// Overwrites the byte at `position`.
    pub fn pwrite_byte(&mut self, position: usize, v: i8) -> Result<()> {
        self.pwrite_slice(position, &v.to_le_bytes())
    }

    /// Overwrites the 16-bit integer at `position`.
    pub fn pwrite_short(&mut self, position: usize, v: i16) -> Result<()> {
        self.pwrite_slice(position, &v.to_le_bytes())
    }

    /// Overwrites the 32-bit integer at `position`.
    pub fn pwrite_int(&mut self, position: usize, v: i32) -> Result<()> {
        self.pwrite_slice(position, &v.to_le_bytes())
    }

    /// Overwrites the 64-bit integer at `position`.
    pub fn pwrite_long(&mut self, position: usize, v: i64) -> Result<()> {
        self.pwrite_slice(position, &v.to_le_bytes())
    }

    /// Overwrites the 32-bit float at `position`.
    pub fn pwrite_float(&mut self, position: usize, v: f32) -> Result<()> {
        self.pwrite_slice(position, &v.to_le_bytes())
    }

    /// Overwrites the 64-bit float at `position`.
    pub fn pwrite_double(&mut self, position: usize, v: f64) -> Result<()> {
        self.pwrite_slice(position, &v.to_le_bytes())
    }

    /// Sets or clears bit `bit` of the byte at `position`, leaving the other bits intact.
    pub fn pwrite_bool_bit(&mut self, position: usize, bit: u8, v: bool) -> Result<()> {
        self.ensure_written(position, 1)?;
        let mask = 1u8 << (bit & 7);
        if v {
            self.buffer[position] |= mask;
        } else {
            self.buffer[position] &= !mask;
        }
        Ok(())
    }

    fn pwrite_slice(&mut self, position: usize, bytes: &[u8]) -> Result<()> {
        self.ensure_written(position, bytes.len())?;
        self.buffer[position..position + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    fn ensure_written(&self, position: usize, n: usize) -> Result<()> {
        match position.checked_add(n) {
            Some(end) if end <= self.buffer.len() => Ok(()),
            _ => Err(CompactError::Serialization(format!(
                "positional write of {} bytes at {} is outside the written range of {} bytes",
                n,
                position,
                self.buffer.len()
            ))),
        }
    }
}

impl Default for ObjectDataOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl DataOutput for ObjectDataOutput {
    fn write_byte(&mut self, v: i8) -> Result<()> {
        self.buffer.put_i8(v);
        Ok(())
    }

    fn write_bool(&mut self, v: bool) -> Result<()> {
        self.buffer.put_u8(if v { 1 } else { 0 });
        Ok(())
    }

    fn write_short(&mut self, v: i16) -> Result<()> {
        self.buffer.put_i16_le(v);
        Ok(())
    }

    fn write_int(&mut self, v: i32) -> Result<()> {
        self.buffer.put_i32_le(v);
        Ok(())
    }

    fn write_long(&mut self, v: i64) -> Result<()> {
        self.buffer.put_i64_le(v);
        Ok(())
    }

    fn write_float(&mut self, v: f32) -> Result<()> {
        self.buffer.put_f32_le(v);
        Ok(())
    }

    fn write_double(&mut self, v: f64) -> Result<()> {
        self.buffer.put_f64_le(v);
        Ok(())
    }

    fn write_bytes(&mut self, v: &[u8]) -> Result<()> {
        self.buffer.put_slice(v);
        Ok(())
    }

    fn write_string(&mut self, v: &str) -> Result<()> {
        let bytes = v.as_bytes();
        let len = i32::try_from(bytes.len()).map_err(|_| {
            CompactError::Serialization(format!("string of {} bytes is too long", bytes.len()))
        })?;
        self.write_int(len)?;
        self.write_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_output_is_empty() {
        let output = ObjectDataOutput::new();
        assert!(output.is_empty());
        assert_eq!(output.len(), 0);
        assert_eq!(output.position(), 0);
    }

    #[test]
    fn test_write_byte_negative() {
        let mut output = ObjectDataOutput::new();
        output.write_byte(-1).unwrap();
        assert_eq!(output.as_bytes(), &[0xFF]);
    }

    #[test]
    fn test_write_bool() {
        let mut output = ObjectDataOutput::new();
        output.write_bool(true).unwrap();
        output.write_bool(false).unwrap();
        assert_eq!(output.as_bytes(), &[1, 0]);
    }

    #[test]
    fn test_write_short_little_endian() {
        let mut output = ObjectDataOutput::new();
        output.write_short(0x0102).unwrap();
        assert_eq!(output.as_bytes(), &[0x02, 0x01]);
    }

    #[test]
    fn test_write_int_little_endian() {
        let mut output = ObjectDataOutput::new();
        output.write_int(0x01020304).unwrap();
        assert_eq!(output.as_bytes(), &[0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn test_write_long_little_endian() {
        let mut output = ObjectDataOutput::new();
        output.write_long(0x0102030405060708).unwrap();
        assert_eq!(
            output.as_bytes(),
            &[0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]
        );
    }

    #[test]
    fn test_write_float_and_double() {
        let mut output = ObjectDataOutput::new();
        output.write_float(1.0).unwrap();
        output.write_double(1.0).unwrap();
        assert_eq!(&output.as_bytes()[..4], &1.0f32.to_le_bytes());
        assert_eq!(&output.as_bytes()[4..], &1.0f64.to_le_bytes());
    }

    #[test]
    fn test_write_string() {
        let mut output = ObjectDataOutput::new();
        output.write_string("test").unwrap();
        assert_eq!(output.as_bytes(), &[4, 0, 0, 0, b't', b'e', b's', b't']);
    }

    #[test]
    fn test_write_string_multibyte_uses_byte_length() {
        let mut output = ObjectDataOutput::new();
        output.write_string("é").unwrap();
        assert_eq!(output.as_bytes(), &[2, 0, 0, 0, 0xC3, 0xA9]);
    }

    #[test]
    fn test_write_zero_bytes() {
        let mut output = ObjectDataOutput::new();
        output.write_byte(7).unwrap();
        output.write_zero_bytes(3);
        assert_eq!(output.as_bytes(), &[7, 0, 0, 0]);
    }

    #[test]
    fn test_pwrite_does_not_move_cursor() {
        let mut output = ObjectDataOutput::new();
        output.write_zero_bytes(8);
        output.pwrite_int(2, 0x0A0B0C0D).unwrap();
        assert_eq!(output.position(), 8);
        assert_eq!(output.as_bytes(), &[0, 0, 0x0D, 0x0C, 0x0B, 0x0A, 0, 0]);
    }

    #[test]
    fn test_pwrite_survives_growth() {
        let mut output = ObjectDataOutput::with_capacity(4);
        output.write_zero_bytes(4);
        output.write_bytes(&[0xAB; 1024]).unwrap();
        output.pwrite_int(0, -1).unwrap();
        assert_eq!(&output.as_bytes()[..4], &[0xFF; 4]);
        assert_eq!(output.len(), 1028);
        assert!(output.as_bytes()[4..].iter().all(|&b| b == 0xAB));
    }

    #[test]
    fn test_pwrite_out_of_range_fails() {
        let mut output = ObjectDataOutput::new();
        output.write_zero_bytes(2);
        assert!(output.pwrite_int(0, 1).is_err());
        assert!(output.pwrite_byte(2, 1).is_err());
        assert!(output.pwrite_byte(usize::MAX, 1).is_err());
    }

    #[test]
    fn test_pwrite_bool_bit() {
        let mut output = ObjectDataOutput::new();
        output.write_zero_bytes(1);
        output.pwrite_bool_bit(0, 0, true).unwrap();
        output.pwrite_bool_bit(0, 7, true).unwrap();
        assert_eq!(output.as_bytes(), &[0b1000_0001]);
        output.pwrite_bool_bit(0, 0, false).unwrap();
        assert_eq!(output.as_bytes(), &[0b1000_0000]);
    }

    #[test]
    fn test_clear() {
        let mut output = ObjectDataOutput::new();
        output.write_int(42).unwrap();
        output.clear();
        assert!(output.is_empty());
    }
}
