//! Encodings of decimal and temporal values.
//!
//! - decimal: int length, big-endian two's-complement unscaled value, int scale
//! - time: i8 hour, i8 minute, i8 second, i32 nanosecond
//! - date: i32 year, i8 month, i8 day
//! - timestamp: date then time
//! - timestamp with timezone: timestamp then i32 offset seconds

use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike,
};
use rust_decimal::Decimal;

use crate::error::{CompactError, Result};
use crate::serialization::{DataInput, DataOutput};

/// Largest timezone offset the format carries, in seconds (18 hours).
pub const MAX_OFFSET_SECONDS: i32 = 18 * 3600;

const MAX_DECIMAL_SCALE: u32 = 28;
const MAX_UNSCALED_BYTES: usize = 16;

/// Writes a decimal as its unscaled two's-complement bytes and scale.
pub fn write_decimal<O: DataOutput>(output: &mut O, value: &Decimal) -> Result<()> {
    let bytes = value.mantissa().to_be_bytes();
    let mut start = 0;
    while start < bytes.len() - 1 {
        let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
            || (bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    let unscaled = &bytes[start..];
    output.write_int(unscaled.len() as i32)?;
    output.write_bytes(unscaled)?;
    output.write_int(value.scale() as i32)
}

/// Reads a decimal written by [`write_decimal`].
///
/// Negative scales are expanded into the unscaled value; values outside the
/// range of [`Decimal`] are errors.
pub fn read_decimal<I: DataInput>(input: &mut I) -> Result<Decimal> {
    let len = input.read_int()?;
    if len <= 0 || len as usize > MAX_UNSCALED_BYTES {
        return Err(CompactError::Serialization(format!(
            "unsupported decimal unscaled value length: {}",
            len
        )));
    }
    let bytes = input.read_bytes(len as usize)?;
    let mut unscaled: i128 = if bytes[0] & 0x80 != 0 { -1 } else { 0 };
    for b in bytes {
        unscaled = (unscaled << 8) | b as i128;
    }
    let scale = input.read_int()?;

    let (unscaled, scale) = if scale < 0 {
        let expanded = 10i128
            .checked_pow(scale.unsigned_abs())
            .and_then(|factor| unscaled.checked_mul(factor))
            .ok_or_else(|| decimal_out_of_range(unscaled, scale))?;
        (expanded, 0)
    } else {
        (unscaled, scale as u32)
    };
    if scale > MAX_DECIMAL_SCALE {
        return Err(decimal_out_of_range(unscaled, scale as i32));
    }
    Decimal::try_from_i128_with_scale(unscaled, scale)
        .map_err(|_| decimal_out_of_range(unscaled, scale as i32))
}

fn decimal_out_of_range(unscaled: i128, scale: i32) -> CompactError {
    CompactError::Serialization(format!(
        "decimal with unscaled value {} and scale {} is out of range",
        unscaled, scale
    ))
}

/// Writes a time of day.
pub fn write_time<O: DataOutput>(output: &mut O, value: &NaiveTime) -> Result<()> {
    check_time(value)?;
    output.write_byte(value.hour() as i8)?;
    output.write_byte(value.minute() as i8)?;
    output.write_byte(value.second() as i8)?;
    output.write_int(value.nanosecond() as i32)
}

/// Reads a time of day.
pub fn read_time<I: DataInput>(input: &mut I) -> Result<NaiveTime> {
    let hour = input.read_byte()?;
    let minute = input.read_byte()?;
    let second = input.read_byte()?;
    let nano = input.read_int()?;
    let valid = hour >= 0 && minute >= 0 && second >= 0 && (0..1_000_000_000).contains(&nano);
    valid
        .then(|| NaiveTime::from_hms_nano_opt(hour as u32, minute as u32, second as u32, nano as u32))
        .flatten()
        .ok_or_else(|| {
            CompactError::Serialization(format!(
                "invalid time {}:{}:{}.{}",
                hour, minute, second, nano
            ))
        })
}

/// Rejects leap-second times, which the format cannot carry.
pub fn check_time(value: &NaiveTime) -> Result<()> {
    if value.nanosecond() >= 1_000_000_000 {
        return Err(CompactError::Serialization(format!(
            "leap second time {} cannot be serialized",
            value
        )));
    }
    Ok(())
}

/// Writes a calendar date.
pub fn write_date<O: DataOutput>(output: &mut O, value: &NaiveDate) -> Result<()> {
    output.write_int(value.year())?;
    output.write_byte(value.month() as i8)?;
    output.write_byte(value.day() as i8)
}

/// Reads a calendar date.
pub fn read_date<I: DataInput>(input: &mut I) -> Result<NaiveDate> {
    let year = input.read_int()?;
    let month = input.read_byte()?;
    let day = input.read_byte()?;
    (month > 0 && day > 0)
        .then(|| NaiveDate::from_ymd_opt(year, month as u32, day as u32))
        .flatten()
        .ok_or_else(|| {
            CompactError::Serialization(format!("invalid date {}-{}-{}", year, month, day))
        })
}

/// Writes a date and time without timezone.
pub fn write_timestamp<O: DataOutput>(output: &mut O, value: &NaiveDateTime) -> Result<()> {
    write_date(output, &value.date())?;
    write_time(output, &value.time())
}

/// Reads a date and time without timezone.
pub fn read_timestamp<I: DataInput>(input: &mut I) -> Result<NaiveDateTime> {
    let date = read_date(input)?;
    let time = read_time(input)?;
    Ok(NaiveDateTime::new(date, time))
}

/// Writes a local date and time followed by its UTC offset in seconds.
pub fn write_timestamp_with_timezone<O: DataOutput>(
    output: &mut O,
    value: &DateTime<FixedOffset>,
) -> Result<()> {
    let offset = check_offset(value)?;
    write_timestamp(output, &value.naive_local())?;
    output.write_int(offset)
}

/// Reads a local date and time with its UTC offset.
pub fn read_timestamp_with_timezone<I: DataInput>(input: &mut I) -> Result<DateTime<FixedOffset>> {
    let local = read_timestamp(input)?;
    let seconds = input.read_int()?;
    FixedOffset::east_opt(seconds)
        .and_then(|offset| offset.from_local_datetime(&local).single())
        .ok_or_else(|| {
            CompactError::Serialization(format!("invalid timezone offset {} seconds", seconds))
        })
}

/// Returns the UTC offset of `value`, rejecting offsets beyond +/-18 hours.
pub fn check_offset(value: &DateTime<FixedOffset>) -> Result<i32> {
    let seconds = value.offset().local_minus_utc();
    if seconds.abs() > MAX_OFFSET_SECONDS {
        return Err(CompactError::Serialization(format!(
            "timezone offset of {} seconds exceeds 18 hours",
            seconds
        )));
    }
    Ok(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::{ObjectDataInput, ObjectDataOutput};
    use std::str::FromStr;

    fn encode_decimal(value: &str) -> Vec<u8> {
        let mut output = ObjectDataOutput::new();
        write_decimal(&mut output, &Decimal::from_str(value).unwrap()).unwrap();
        output.into_bytes()
    }

    #[test]
    fn test_decimal_minimal_twos_complement() {
        assert_eq!(encode_decimal("0"), vec![1, 0, 0, 0, 0x00, 0, 0, 0, 0]);
        assert_eq!(encode_decimal("127"), vec![1, 0, 0, 0, 0x7F, 0, 0, 0, 0]);
        assert_eq!(encode_decimal("128"), vec![2, 0, 0, 0, 0x00, 0x80, 0, 0, 0, 0]);
        assert_eq!(encode_decimal("-1"), vec![1, 0, 0, 0, 0xFF, 0, 0, 0, 0]);
        assert_eq!(encode_decimal("-129"), vec![2, 0, 0, 0, 0xFF, 0x7F, 0, 0, 0, 0]);
        assert_eq!(encode_decimal("1.5"), vec![1, 0, 0, 0, 15, 1, 0, 0, 0]);
    }

    #[test]
    fn test_decimal_roundtrip_extremes() {
        for text in ["79228162514264337593543950335", "-79228162514264337593543950335", "0.0000000000000000000000000001"] {
            let bytes = encode_decimal(text);
            let mut input = ObjectDataInput::new(&bytes);
            assert_eq!(read_decimal(&mut input).unwrap(), Decimal::from_str(text).unwrap());
        }
    }

    #[test]
    fn test_decimal_negative_scale_expanded() {
        let mut output = ObjectDataOutput::new();
        output.write_int(1).unwrap();
        output.write_bytes(&[12]).unwrap();
        output.write_int(-3).unwrap();
        let mut input = ObjectDataInput::new(output.as_bytes());
        assert_eq!(read_decimal(&mut input).unwrap(), Decimal::from(12000));
    }

    #[test]
    fn test_decimal_scale_too_large() {
        let mut output = ObjectDataOutput::new();
        output.write_int(1).unwrap();
        output.write_bytes(&[1]).unwrap();
        output.write_int(29).unwrap();
        let mut input = ObjectDataInput::new(output.as_bytes());
        assert!(read_decimal(&mut input).is_err());
    }

    #[test]
    fn test_decimal_unscaled_too_large() {
        let mut output = ObjectDataOutput::new();
        output.write_int(13).unwrap();
        output.write_bytes(&[0x7F; 13]).unwrap();
        output.write_int(0).unwrap();
        let mut input = ObjectDataInput::new(output.as_bytes());
        assert!(read_decimal(&mut input).is_err());
    }

    #[test]
    fn test_time_layout() {
        let mut output = ObjectDataOutput::new();
        let time = NaiveTime::from_hms_nano_opt(13, 45, 59, 123_456_789).unwrap();
        write_time(&mut output, &time).unwrap();
        let mut expected = vec![13, 45, 59];
        expected.extend_from_slice(&123_456_789i32.to_le_bytes());
        assert_eq!(output.as_bytes(), expected.as_slice());

        let mut input = ObjectDataInput::new(output.as_bytes());
        assert_eq!(read_time(&mut input).unwrap(), time);
    }

    #[test]
    fn test_leap_second_rejected() {
        let leap = NaiveTime::from_hms_nano_opt(23, 59, 59, 1_500_000_000).unwrap();
        let mut output = ObjectDataOutput::new();
        assert!(write_time(&mut output, &leap).is_err());
    }

    #[test]
    fn test_invalid_time_rejected() {
        let mut output = ObjectDataOutput::new();
        output.write_bytes(&[25, 0, 0]).unwrap();
        output.write_int(0).unwrap();
        let mut input = ObjectDataInput::new(output.as_bytes());
        assert!(read_time(&mut input).is_err());
    }

    #[test]
    fn test_date_layout() {
        let mut output = ObjectDataOutput::new();
        let date = NaiveDate::from_ymd_opt(-2022, 2, 28).unwrap();
        write_date(&mut output, &date).unwrap();
        let mut expected = (-2022i32).to_le_bytes().to_vec();
        expected.extend_from_slice(&[2, 28]);
        assert_eq!(output.as_bytes(), expected.as_slice());

        let mut input = ObjectDataInput::new(output.as_bytes());
        assert_eq!(read_date(&mut input).unwrap(), date);
    }

    #[test]
    fn test_invalid_date_rejected() {
        let mut output = ObjectDataOutput::new();
        output.write_int(2023).unwrap();
        output.write_bytes(&[2, 30]).unwrap();
        let mut input = ObjectDataInput::new(output.as_bytes());
        assert!(read_date(&mut input).is_err());
    }

    #[test]
    fn test_timestamp_with_timezone_roundtrip() {
        let offset = FixedOffset::east_opt(-5 * 3600).unwrap();
        let value = offset.with_ymd_and_hms(2021, 6, 1, 8, 30, 0).unwrap();
        let mut output = ObjectDataOutput::new();
        write_timestamp_with_timezone(&mut output, &value).unwrap();
        assert_eq!(output.len(), 6 + 7 + 4);
        let mut input = ObjectDataInput::new(output.as_bytes());
        let read = read_timestamp_with_timezone(&mut input).unwrap();
        assert_eq!(read, value);
        assert_eq!(read.offset().local_minus_utc(), -5 * 3600);
    }

    #[test]
    fn test_offset_beyond_eighteen_hours_rejected() {
        let offset = FixedOffset::east_opt(19 * 3600).unwrap();
        let value = offset.with_ymd_and_hms(2021, 6, 1, 8, 30, 0).unwrap();
        let mut output = ObjectDataOutput::new();
        assert!(write_timestamp_with_timezone(&mut output, &value).is_err());
    }
}
