//! Data input traits and implementations for Compact serialization.

use crate::error::{CompactError, Result};
use bytes::Buf;
use std::io::Cursor;

/// Trait for reading primitive values from the Compact binary format.
///
/// All multi-byte values are read in little-endian byte order.
pub trait DataInput {
    /// Reads a single byte (i8).
    fn read_byte(&mut self) -> Result<i8>;

    /// Reads a boolean from a single byte.
    fn read_bool(&mut self) -> Result<bool>;

    /// Reads a 16-bit signed integer in little-endian order.
    fn read_short(&mut self) -> Result<i16>;

    /// Reads a 32-bit signed integer in little-endian order.
    fn read_int(&mut self) -> Result<i32>;

    /// Reads a 64-bit signed integer in little-endian order.
    fn read_long(&mut self) -> Result<i64>;

    /// Reads a 32-bit floating point in little-endian order.
    fn read_float(&mut self) -> Result<f32>;

    /// Reads a 64-bit floating point in little-endian order.
    fn read_double(&mut self) -> Result<f64>;

    /// Reads the specified number of raw bytes.
    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>>;

    /// Reads a string written as its UTF-8 byte length followed by the bytes.
    fn read_string(&mut self) -> Result<String>;
}

/// A slice-backed implementation of `DataInput` with random access.
///
/// Besides sequential reads at the cursor, values can be read at absolute
/// positions (`read_*_at`) without disturbing the cursor.
#[derive(Debug, Clone)]
pub struct ObjectDataInput<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> ObjectDataInput<'a> {
    /// Creates a new `ObjectDataInput` from the given byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    /// Returns the number of bytes remaining after the cursor.
    pub fn remaining(&self) -> usize {
        self.cursor.remaining()
    }

    /// Returns the total number of bytes in the underlying slice.
    pub fn len(&self) -> usize {
        self.cursor.get_ref().len()
    }

    /// Returns true if the underlying slice is empty.
    pub fn is_empty(&self) -> bool {
        self.cursor.get_ref().is_empty()
    }

    /// Returns the current cursor position.
    pub fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    /// Moves the cursor to an absolute position.
    pub fn set_position(&mut self, position: usize) -> Result<()> {
        if position > self.len() {
            return Err(CompactError::Serialization(format!(
                "cannot seek to {}: input has {} bytes",
                position,
                self.len()
            )));
        }
        self.cursor.set_position(position as u64);
        Ok(())
    }

    /// Reads a byte at an absolute position.
    pub fn read_byte_at(&self, position: usize) -> Result<i8> {
        Ok(self.slice_at(position, 1)?[0] as i8)
    }

    /// Reads an unsigned byte at an absolute position.
    pub fn read_unsigned_byte_at(&self, position: usize) -> Result<u8> {
        Ok(self.slice_at(position, 1)?[0])
    }

    /// Reads a 16-bit integer at an absolute position.
    pub fn read_short_at(&self, position: usize) -> Result<i16> {
        let mut bytes = self.slice_at(position, 2)?;
        Ok(bytes.get_i16_le())
    }

    /// Reads an unsigned 16-bit integer at an absolute position.
    pub fn read_unsigned_short_at(&self, position: usize) -> Result<u16> {
        let mut bytes = self.slice_at(position, 2)?;
        Ok(bytes.get_u16_le())
    }

    /// Reads a 32-bit integer at an absolute position.
    pub fn read_int_at(&self, position: usize) -> Result<i32> {
        let mut bytes = self.slice_at(position, 4)?;
        Ok(bytes.get_i32_le())
    }

    /// Reads a 64-bit integer at an absolute position.
    pub fn read_long_at(&self, position: usize) -> Result<i64> {
        let mut bytes = self.slice_at(position, 8)?;
        Ok(bytes.get_i64_le())
    }

    /// Reads a 32-bit float at an absolute position.
    pub fn read_float_at(&self, position: usize) -> Result<f32> {
        let mut bytes = self.slice_at(position, 4)?;
        Ok(bytes.get_f32_le())
    }

    /// Reads a 64-bit float at an absolute position.
    pub fn read_double_at(&self, position: usize) -> Result<f64> {
        let mut bytes = self.slice_at(position, 8)?;
        Ok(bytes.get_f64_le())
    }

    /// Reads bit `bit` of the byte at an absolute position.
    pub fn read_bool_bit_at(&self, position: usize, bit: u8) -> Result<bool> {
        let byte = self.read_unsigned_byte_at(position)?;
        Ok(byte & (1 << (bit & 7)) != 0)
    }

    fn slice_at(&self, position: usize, n: usize) -> Result<&'a [u8]> {
        let data: &'a [u8] = *self.cursor.get_ref();
        match position.checked_add(n) {
            Some(end) if end <= data.len() => Ok(&data[position..end]),
            _ => Err(CompactError::Serialization(format!(
                "insufficient data: need {} bytes at position {}, have {}",
                n,
                position,
                data.len().saturating_sub(position)
            ))),
        }
    }

    fn ensure_remaining(&self, n: usize) -> Result<()> {
        if self.cursor.remaining() < n {
            Err(CompactError::Serialization(format!(
                "insufficient data: need {} bytes, have {}",
                n,
                self.cursor.remaining()
            )))
        } else {
            Ok(())
        }
    }
}

impl DataInput for ObjectDataInput<'_> {
    fn read_byte(&mut self) -> Result<i8> {
        self.ensure_remaining(1)?;
        Ok(self.cursor.get_i8())
    }

    fn read_bool(&mut self) -> Result<bool> {
        self.ensure_remaining(1)?;
        Ok(self.cursor.get_u8() != 0)
    }

    fn read_short(&mut self) -> Result<i16> {
        self.ensure_remaining(2)?;
        Ok(self.cursor.get_i16_le())
    }

    fn read_int(&mut self) -> Result<i32> {
        self.ensure_remaining(4)?;
        Ok(self.cursor.get_i32_le())
    }

    fn read_long(&mut self) -> Result<i64> {
        self.ensure_remaining(8)?;
        Ok(self.cursor.get_i64_le())
    }

    fn read_float(&mut self) -> Result<f32> {
        self.ensure_remaining(4)?;
        Ok(self.cursor.get_f32_le())
    }

    fn read_double(&mut self) -> Result<f64> {
        self.ensure_remaining(8)?;
        Ok(self.cursor.get_f64_le())
    }

    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        self.ensure_remaining(len)?;
        let mut buf = vec![0u8; len];
        self.cursor.copy_to_slice(&mut buf);
        Ok(buf)
    }

    fn read_string(&mut self) -> Result<String> {
        let len = self.read_int()?;
        if len < 0 {
            return Err(CompactError::Serialization(format!(
                "invalid string length: {}",
                len
            )));
        }
        let bytes = self.read_bytes(len as usize)?;
        String::from_utf8(bytes)
            .map_err(|e| CompactError::Serialization(format!("invalid UTF-8 string: {}", e)))
    }
}
