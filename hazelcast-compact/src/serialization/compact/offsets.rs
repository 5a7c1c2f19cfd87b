//! Offset tables addressing the variable region of a record or array.
//!
//! The entry width is never stored; writer and reader both derive it from the
//! length of the region the table addresses.

use crate::error::{CompactError, Result};
use crate::serialization::{DataOutput, ObjectDataInput, ObjectDataOutput};

/// Offset recorded for a null variable-size value.
pub const NULL_OFFSET: i32 = -1;

/// Span of the signed byte range; shorter regions use one-byte entries.
pub const BYTE_OFFSET_READER_RANGE: usize = (i8::MAX as i32 - i8::MIN as i32) as usize;

/// Span of the signed short range; shorter regions use two-byte entries.
pub const SHORT_OFFSET_READER_RANGE: usize = (i16::MAX as i32 - i16::MIN as i32) as usize;

/// Width of the entries of one offset table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetWidth {
    /// One unsigned byte per entry, `0xFF` meaning null.
    Byte,
    /// Two bytes per entry, `0xFFFF` meaning null.
    Short,
    /// Four bytes per entry, `-1` meaning null.
    Int,
}

impl OffsetWidth {
    /// Picks the entry width for a region of `data_length` bytes.
    pub fn for_data_length(data_length: usize) -> Self {
        if data_length < BYTE_OFFSET_READER_RANGE {
            Self::Byte
        } else if data_length < SHORT_OFFSET_READER_RANGE {
            Self::Short
        } else {
            Self::Int
        }
    }

    /// Size of one entry in bytes.
    pub fn size(self) -> usize {
        match self {
            Self::Byte => 1,
            Self::Short => 2,
            Self::Int => 4,
        }
    }

    /// Appends `offsets` as a table of this width.
    pub fn write_table(self, output: &mut ObjectDataOutput, offsets: &[i32]) -> Result<()> {
        for &offset in offsets {
            match self {
                Self::Byte => output.write_byte(offset as i8)?,
                Self::Short => output.write_short(offset as i16)?,
                Self::Int => output.write_int(offset)?,
            }
        }
        Ok(())
    }

    /// Reads entry `index` of the table starting at `table_position`.
    pub fn read_entry(
        self,
        input: &ObjectDataInput<'_>,
        table_position: usize,
        index: usize,
    ) -> Result<i32> {
        let position = index
            .checked_mul(self.size())
            .and_then(|relative| relative.checked_add(table_position))
            .ok_or_else(|| {
                CompactError::Serialization(format!("offset table entry {} out of range", index))
            })?;
        let offset = match self {
            Self::Byte => match input.read_unsigned_byte_at(position)? {
                0xFF => NULL_OFFSET,
                v => v as i32,
            },
            Self::Short => match input.read_unsigned_short_at(position)? {
                0xFFFF => NULL_OFFSET,
                v => v as i32,
            },
            Self::Int => input.read_int_at(position)?,
        };
        if offset < NULL_OFFSET {
            return Err(CompactError::Serialization(format!(
                "invalid variable field offset {}",
                offset
            )));
        }
        Ok(offset)
    }
}

/// Appends the offset table for a region of `data_length` bytes.
pub fn write_offsets(
    output: &mut ObjectDataOutput,
    data_length: usize,
    offsets: &[i32],
) -> Result<()> {
    let width = OffsetWidth::for_data_length(data_length);
    tracing::trace!(data_length, entries = offsets.len(), ?width, "writing offset table");
    width.write_table(output, offsets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranges() {
        assert_eq!(BYTE_OFFSET_READER_RANGE, 255);
        assert_eq!(SHORT_OFFSET_READER_RANGE, 65535);
    }

    #[test]
    fn test_width_thresholds() {
        assert_eq!(OffsetWidth::for_data_length(0), OffsetWidth::Byte);
        assert_eq!(OffsetWidth::for_data_length(254), OffsetWidth::Byte);
        assert_eq!(OffsetWidth::for_data_length(255), OffsetWidth::Short);
        assert_eq!(OffsetWidth::for_data_length(65534), OffsetWidth::Short);
        assert_eq!(OffsetWidth::for_data_length(65535), OffsetWidth::Int);
    }

    #[test]
    fn test_byte_table_null_sentinel() {
        let mut output = ObjectDataOutput::new();
        write_offsets(&mut output, 10, &[0, NULL_OFFSET, 254]).unwrap();
        assert_eq!(output.as_bytes(), &[0, 0xFF, 254]);

        let input = ObjectDataInput::new(output.as_bytes());
        assert_eq!(OffsetWidth::Byte.read_entry(&input, 0, 0).unwrap(), 0);
        assert_eq!(OffsetWidth::Byte.read_entry(&input, 0, 1).unwrap(), NULL_OFFSET);
        assert_eq!(OffsetWidth::Byte.read_entry(&input, 0, 2).unwrap(), 254);
    }

    #[test]
    fn test_short_table_reads_unsigned() {
        let mut output = ObjectDataOutput::new();
        write_offsets(&mut output, 60000, &[40000, NULL_OFFSET]).unwrap();
        assert_eq!(output.len(), 4);

        let input = ObjectDataInput::new(output.as_bytes());
        assert_eq!(OffsetWidth::Short.read_entry(&input, 0, 0).unwrap(), 40000);
        assert_eq!(OffsetWidth::Short.read_entry(&input, 0, 1).unwrap(), NULL_OFFSET);
    }

    #[test]
    fn test_int_table() {
        let mut output = ObjectDataOutput::new();
        write_offsets(&mut output, 100_000, &[70_000, NULL_OFFSET]).unwrap();
        assert_eq!(output.len(), 8);

        let input = ObjectDataInput::new(output.as_bytes());
        assert_eq!(OffsetWidth::Int.read_entry(&input, 0, 0).unwrap(), 70_000);
        assert_eq!(OffsetWidth::Int.read_entry(&input, 0, 1).unwrap(), NULL_OFFSET);
    }

    #[test]
    fn test_read_entry_out_of_bounds() {
        let data = [1u8, 2];
        let input = ObjectDataInput::new(&data);
        assert!(OffsetWidth::Short.read_entry(&input, 0, 1).is_err());
        assert!(OffsetWidth::Int.read_entry(&input, usize::MAX, 1).is_err());
    }

    #[test]
    fn test_negative_int_offset_rejected() {
        let data = (-7i32).to_le_bytes();
        let input = ObjectDataInput::new(&data);
        assert!(OffsetWidth::Int.read_entry(&input, 0, 0).is_err());
    }
}
