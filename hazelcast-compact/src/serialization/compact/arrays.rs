//! Encodings of array field values.
//!
//! Arrays of fixed-width items carry an int item count followed by the items.
//! Arrays of nullable fixed-width items add a one-byte marker choosing between
//! an all-null, an all-present and a mixed representation; the mixed form
//! stores one presence bitmask per group of eight items followed by the
//! present items of that group. Arrays of variable-size items reuse the
//! offset-table technique of the enclosing record.

use crate::error::{CompactError, Result};
use crate::serialization::{DataInput, DataOutput, ObjectDataInput, ObjectDataOutput};

use super::offsets::{write_offsets, OffsetWidth, NULL_OFFSET};

/// Every item of the array is null.
pub const ALL_NULL: i8 = 0;
/// No item of the array is null.
pub const ALL_PRESENT: i8 = 1;
/// Nulls and values are interleaved.
pub const MIXED: i8 = 2;

const GROUP: usize = 8;

/// Reads a non-negative length or count.
pub fn read_count<I: DataInput>(input: &mut I) -> Result<usize> {
    let count = input.read_int()?;
    if count < 0 {
        return Err(CompactError::Serialization(format!(
            "invalid array length: {}",
            count
        )));
    }
    Ok(count as usize)
}

fn write_count(output: &mut ObjectDataOutput, count: usize) -> Result<()> {
    let count = i32::try_from(count).map_err(|_| {
        CompactError::Serialization(format!("array of {} items is too long", count))
    })?;
    output.write_int(count)
}

fn ensure_items_fit(input: &ObjectDataInput<'_>, count: usize, item_size: usize) -> Result<()> {
    match count.checked_mul(item_size) {
        Some(needed) if needed <= input.remaining() => Ok(()),
        _ => Err(CompactError::Serialization(format!(
            "insufficient data: {} items of {} bytes, have {}",
            count,
            item_size,
            input.remaining()
        ))),
    }
}

/// Writes `count` then `items` through `write_item`.
pub fn write_fixed_items<T: Copy>(
    output: &mut ObjectDataOutput,
    items: &[T],
    write_item: impl Fn(&mut ObjectDataOutput, T) -> Result<()>,
) -> Result<()> {
    write_count(output, items.len())?;
    for &item in items {
        write_item(output, item)?;
    }
    Ok(())
}

/// Reads an array written by [`write_fixed_items`].
pub fn read_fixed_items<'a, T>(
    input: &mut ObjectDataInput<'a>,
    item_size: usize,
    read_item: impl Fn(&mut ObjectDataInput<'a>) -> Result<T>,
) -> Result<Vec<T>> {
    let count = read_count(input)?;
    ensure_items_fit(input, count, item_size)?;
    (0..count).map(|_| read_item(input)).collect()
}

fn pack_bits(output: &mut ObjectDataOutput, bits: impl ExactSizeIterator<Item = bool>) -> Result<()> {
    let mut byte = 0u8;
    let mut filled = 0;
    for bit in bits {
        if bit {
            byte |= 1 << filled;
        }
        filled += 1;
        if filled == GROUP {
            output.write_byte(byte as i8)?;
            byte = 0;
            filled = 0;
        }
    }
    if filled > 0 {
        output.write_byte(byte as i8)?;
    }
    Ok(())
}

fn unpack_bits(input: &mut ObjectDataInput<'_>, count: usize) -> Result<Vec<bool>> {
    let bytes = input.read_bytes(count.div_ceil(GROUP))?;
    Ok((0..count)
        .map(|i| bytes[i / GROUP] & (1 << (i % GROUP)) != 0)
        .collect())
}

/// Writes `count` then the values packed eight per byte, lowest bit first.
pub fn write_boolean_bits(output: &mut ObjectDataOutput, items: &[bool]) -> Result<()> {
    write_count(output, items.len())?;
    pack_bits(output, items.iter().copied())
}

/// Reads an array written by [`write_boolean_bits`].
pub fn read_boolean_bits(input: &mut ObjectDataInput<'_>) -> Result<Vec<bool>> {
    let count = read_count(input)?;
    unpack_bits(input, count)
}

fn marker_for<T>(items: &[Option<T>]) -> i8 {
    let present = items.iter().filter(|item| item.is_some()).count();
    if present == items.len() {
        ALL_PRESENT
    } else if present == 0 {
        ALL_NULL
    } else {
        MIXED
    }
}

fn read_marker(input: &mut ObjectDataInput<'_>) -> Result<i8> {
    match input.read_byte()? {
        marker @ (ALL_NULL | ALL_PRESENT | MIXED) => Ok(marker),
        other => Err(CompactError::Serialization(format!(
            "invalid nullable array marker: {}",
            other
        ))),
    }
}

/// Writes an array of nullable fixed-width items with the representation its contents call for.
pub fn write_nullable_items<T: Copy>(
    output: &mut ObjectDataOutput,
    items: &[Option<T>],
    write_item: impl Fn(&mut ObjectDataOutput, T) -> Result<()>,
) -> Result<()> {
    write_count(output, items.len())?;
    let marker = marker_for(items);
    output.write_byte(marker)?;
    match marker {
        ALL_NULL => {}
        ALL_PRESENT => {
            for &item in items.iter().flatten() {
                write_item(output, item)?;
            }
        }
        _ => {
            for group in items.chunks(GROUP) {
                pack_bits(output, group.iter().map(Option::is_some))?;
                for &item in group.iter().flatten() {
                    write_item(output, item)?;
                }
            }
        }
    }
    Ok(())
}

/// Reads an array written by [`write_nullable_items`].
pub fn read_nullable_items<'a, T>(
    input: &mut ObjectDataInput<'a>,
    item_size: usize,
    read_item: impl Fn(&mut ObjectDataInput<'a>) -> Result<T>,
) -> Result<Vec<Option<T>>> {
    let count = read_count(input)?;
    match read_marker(input)? {
        ALL_NULL => Ok((0..count).map(|_| None).collect()),
        ALL_PRESENT => {
            ensure_items_fit(input, count, item_size)?;
            (0..count).map(|_| read_item(input).map(Some)).collect()
        }
        _ => {
            ensure_items_fit(input, count.div_ceil(GROUP), 1)?;
            let mut items = Vec::with_capacity(count);
            while items.len() < count {
                let group = (count - items.len()).min(GROUP);
                let mask = input.read_byte()? as u8;
                for bit in 0..group {
                    if mask & (1 << bit) != 0 {
                        items.push(Some(read_item(input)?));
                    } else {
                        items.push(None);
                    }
                }
            }
            Ok(items)
        }
    }
}

/// Writes an array of nullable booleans.
///
/// The mixed representation is one bit-array carrying two bits per item:
/// presence at bit `2i`, value at bit `2i + 1`.
pub fn write_nullable_booleans(output: &mut ObjectDataOutput, items: &[Option<bool>]) -> Result<()> {
    write_count(output, items.len())?;
    let marker = marker_for(items);
    output.write_byte(marker)?;
    match marker {
        ALL_NULL => Ok(()),
        ALL_PRESENT => pack_bits(output, items.iter().map(|item| item.unwrap_or(false))),
        _ => {
            let bits: Vec<bool> = items
                .iter()
                .flat_map(|item| [item.is_some(), item.unwrap_or(false)])
                .collect();
            pack_bits(output, bits.into_iter())
        }
    }
}

/// Reads an array written by [`write_nullable_booleans`].
pub fn read_nullable_booleans(input: &mut ObjectDataInput<'_>) -> Result<Vec<Option<bool>>> {
    let count = read_count(input)?;
    match read_marker(input)? {
        ALL_NULL => Ok(vec![None; count]),
        ALL_PRESENT => Ok(unpack_bits(input, count)?.into_iter().map(Some).collect()),
        _ => {
            let bit_count = count.checked_mul(2).ok_or_else(|| {
                CompactError::Serialization(format!("invalid array length: {}", count))
            })?;
            let bits = unpack_bits(input, bit_count)?;
            Ok(bits
                .chunks(2)
                .map(|pair| pair[0].then_some(pair[1]))
                .collect())
        }
    }
}

/// Writes an array of variable-size items: data length, count, items, offset table.
pub fn write_variable_items<T>(
    output: &mut ObjectDataOutput,
    items: &[Option<T>],
    mut write_item: impl FnMut(&mut ObjectDataOutput, &T) -> Result<()>,
) -> Result<()> {
    let data_length_position = output.position();
    output.write_zero_bytes(4);
    write_count(output, items.len())?;
    let data_start = output.position();
    let mut offsets = vec![NULL_OFFSET; items.len()];
    for (offset, item) in offsets.iter_mut().zip(items) {
        if let Some(item) = item {
            *offset = relative_offset(output.position() - data_start)?;
            write_item(output, item)?;
        }
    }
    let data_length = output.position() - data_start;
    output.pwrite_int(data_length_position, relative_offset(data_length)?)?;
    write_offsets(output, data_length, &offsets)
}

/// Reads an array written by [`write_variable_items`], leaving the cursor after its offset table.
pub fn read_variable_items<'a, T>(
    input: &mut ObjectDataInput<'a>,
    mut read_item: impl FnMut(&mut ObjectDataInput<'a>) -> Result<T>,
) -> Result<Vec<Option<T>>> {
    let data_length = read_count(input)?;
    let count = read_count(input)?;
    let data_start = input.position();
    let table_position = data_start.checked_add(data_length).ok_or_else(|| {
        CompactError::Serialization(format!("invalid array data length: {}", data_length))
    })?;
    let width = OffsetWidth::for_data_length(data_length);

    let mut items = Vec::with_capacity(count.min(input.len()));
    for index in 0..count {
        let offset = width.read_entry(input, table_position, index)?;
        if offset == NULL_OFFSET {
            items.push(None);
        } else {
            input.set_position(data_start + offset as usize)?;
            items.push(Some(read_item(input)?));
        }
    }
    input.set_position(table_position + count * width.size())?;
    Ok(items)
}

/// Converts a position inside a region into a stored offset.
pub fn relative_offset(offset: usize) -> Result<i32> {
    i32::try_from(offset)
        .map_err(|_| CompactError::Serialization(format!("offset {} exceeds the format limit", offset)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(f: impl FnOnce(&mut ObjectDataOutput) -> Result<()>) -> Vec<u8> {
        let mut output = ObjectDataOutput::new();
        f(&mut output).unwrap();
        output.into_bytes()
    }

    #[test]
    fn test_boolean_bits_layout() {
        let items = [true, false, true, false, false, false, false, false, true];
        let bytes = encode(|out| write_boolean_bits(out, &items));
        assert_eq!(bytes, vec![9, 0, 0, 0, 0b0000_0101, 0b0000_0001]);

        let mut input = ObjectDataInput::new(&bytes);
        assert_eq!(read_boolean_bits(&mut input).unwrap(), items.to_vec());
        assert_eq!(input.remaining(), 0);
    }

    #[test]
    fn test_empty_boolean_bits() {
        let bytes = encode(|out| write_boolean_bits(out, &[]));
        assert_eq!(bytes, vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_fixed_items() {
        let bytes = encode(|out| write_fixed_items(out, &[1i16, -2], |o, v| o.write_short(v)));
        assert_eq!(bytes, vec![2, 0, 0, 0, 1, 0, 0xFE, 0xFF]);
        let mut input = ObjectDataInput::new(&bytes);
        let items = read_fixed_items(&mut input, 2, |i| i.read_short()).unwrap();
        assert_eq!(items, vec![1, -2]);
    }

    #[test]
    fn test_fixed_items_count_beyond_data() {
        let bytes = [0xFF, 0xFF, 0xFF, 0x7F, 1, 2];
        let mut input = ObjectDataInput::new(&bytes);
        assert!(read_fixed_items(&mut input, 4, |i| i.read_int()).is_err());
    }

    #[test]
    fn test_nullable_items_all_null() {
        let bytes = encode(|out| write_nullable_items::<i32>(out, &[None, None, None], |o, v| o.write_int(v)));
        assert_eq!(bytes, vec![3, 0, 0, 0, ALL_NULL as u8]);
        let mut input = ObjectDataInput::new(&bytes);
        let items = read_nullable_items(&mut input, 4, |i| i.read_int()).unwrap();
        assert_eq!(items, vec![None, None, None]);
    }

    #[test]
    fn test_nullable_items_all_present_are_packed() {
        let bytes = encode(|out| write_nullable_items(out, &[Some(7i8), Some(-1)], |o, v| o.write_byte(v)));
        assert_eq!(bytes, vec![2, 0, 0, 0, ALL_PRESENT as u8, 7, 0xFF]);
    }

    #[test]
    fn test_nullable_items_mixed_groups() {
        let mut items: Vec<Option<i8>> = (0..10).map(|i| Some(i as i8)).collect();
        items[1] = None;
        items[9] = None;
        let bytes = encode(|out| write_nullable_items(out, &items, |o, v| o.write_byte(v)));
        assert_eq!(
            bytes,
            vec![10, 0, 0, 0, MIXED as u8, 0b1111_1101, 0, 2, 3, 4, 5, 6, 7, 0b0000_0001, 8]
        );
        let mut input = ObjectDataInput::new(&bytes);
        let read = read_nullable_items(&mut input, 1, |i| i.read_byte()).unwrap();
        assert_eq!(read, items);
        assert_eq!(input.remaining(), 0);
    }

    #[test]
    fn test_empty_nullable_items() {
        let bytes = encode(|out| write_nullable_items::<i64>(out, &[], |o, v| o.write_long(v)));
        assert_eq!(bytes, vec![0, 0, 0, 0, ALL_PRESENT as u8]);
        let mut input = ObjectDataInput::new(&bytes);
        assert!(read_nullable_items(&mut input, 8, |i| i.read_long()).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_marker() {
        let bytes = [1, 0, 0, 0, 9];
        let mut input = ObjectDataInput::new(&bytes);
        assert!(read_nullable_items(&mut input, 1, |i| i.read_byte()).is_err());
    }

    #[test]
    fn test_nullable_booleans_mixed_combined_bits() {
        let items = [Some(true), None, Some(false), Some(true)];
        let bytes = encode(|out| write_nullable_booleans(out, &items));
        // presence/value pairs: (1,1) (0,0) (1,0) (1,1)
        assert_eq!(bytes, vec![4, 0, 0, 0, MIXED as u8, 0b1101_0011]);
        let mut input = ObjectDataInput::new(&bytes);
        assert_eq!(read_nullable_booleans(&mut input).unwrap(), items.to_vec());
    }

    #[test]
    fn test_nullable_booleans_all_present() {
        let items = [Some(true), Some(false), Some(true)];
        let bytes = encode(|out| write_nullable_booleans(out, &items));
        assert_eq!(bytes, vec![3, 0, 0, 0, ALL_PRESENT as u8, 0b0000_0101]);
        let mut input = ObjectDataInput::new(&bytes);
        assert_eq!(read_nullable_booleans(&mut input).unwrap(), items.to_vec());
    }

    #[test]
    fn test_variable_items_layout() {
        let items = vec![Some("ab".to_string()), None, Some(String::new())];
        let bytes = encode(|out| write_variable_items(out, &items, |o, s| o.write_string(s)));
        let mut expected = vec![10, 0, 0, 0, 3, 0, 0, 0];
        expected.extend_from_slice(&[2, 0, 0, 0, b'a', b'b']);
        expected.extend_from_slice(&[0, 0, 0, 0]);
        expected.extend_from_slice(&[0, 0xFF, 6]);
        assert_eq!(bytes, expected);

        let mut prefixed = vec![0xAA];
        prefixed.extend_from_slice(&bytes);
        prefixed.push(0xBB);
        let mut input = ObjectDataInput::new(&prefixed);
        input.set_position(1).unwrap();
        let read = read_variable_items(&mut input, |i| i.read_string()).unwrap();
        assert_eq!(read, items);
        assert_eq!(input.position(), prefixed.len() - 1);
    }

    #[test]
    fn test_variable_items_truncated() {
        let items = vec![Some("abc".to_string())];
        let bytes = encode(|out| write_variable_items(out, &items, |o, s| o.write_string(s)));
        let mut input = ObjectDataInput::new(&bytes[..bytes.len() - 1]);
        assert!(read_variable_items(&mut input, |i| i.read_string()).is_err());
    }
}
