//! Per-kind dispatch between readers, writers and [`FieldValue`]s.

use chrono::{DateTime, FixedOffset, NaiveTime, Timelike};

use crate::error::{CompactError, Result};

use super::values::MAX_OFFSET_SECONDS;
use super::{CompactReader, CompactWriter, FieldDescriptor, FieldKind, FieldValue, GenericRecord};

/// Reads one field through `reader`; nested records become generic records.
pub fn read_field<R: CompactReader>(reader: &mut R, field: &FieldDescriptor) -> Result<FieldValue> {
    let name = field.name();
    let value = match field.kind() {
        FieldKind::Boolean => FieldValue::Boolean(reader.read_boolean(name)?),
        FieldKind::ArrayOfBoolean => FieldValue::ArrayOfBoolean(reader.read_array_of_boolean(name)?),
        FieldKind::Int8 => FieldValue::Int8(reader.read_int8(name)?),
        FieldKind::ArrayOfInt8 => FieldValue::ArrayOfInt8(reader.read_array_of_int8(name)?),
        FieldKind::Int16 => FieldValue::Int16(reader.read_int16(name)?),
        FieldKind::ArrayOfInt16 => FieldValue::ArrayOfInt16(reader.read_array_of_int16(name)?),
        FieldKind::Int32 => FieldValue::Int32(reader.read_int32(name)?),
        FieldKind::ArrayOfInt32 => FieldValue::ArrayOfInt32(reader.read_array_of_int32(name)?),
        FieldKind::Int64 => FieldValue::Int64(reader.read_int64(name)?),
        FieldKind::ArrayOfInt64 => FieldValue::ArrayOfInt64(reader.read_array_of_int64(name)?),
        FieldKind::Float32 => FieldValue::Float32(reader.read_float32(name)?),
        FieldKind::ArrayOfFloat32 => FieldValue::ArrayOfFloat32(reader.read_array_of_float32(name)?),
        FieldKind::Float64 => FieldValue::Float64(reader.read_float64(name)?),
        FieldKind::ArrayOfFloat64 => FieldValue::ArrayOfFloat64(reader.read_array_of_float64(name)?),
        FieldKind::String => FieldValue::String(reader.read_string(name)?),
        FieldKind::ArrayOfString => FieldValue::ArrayOfString(reader.read_array_of_string(name)?),
        FieldKind::Decimal => FieldValue::Decimal(reader.read_decimal(name)?),
        FieldKind::ArrayOfDecimal => FieldValue::ArrayOfDecimal(reader.read_array_of_decimal(name)?),
        FieldKind::Time => FieldValue::Time(reader.read_time(name)?),
        FieldKind::ArrayOfTime => FieldValue::ArrayOfTime(reader.read_array_of_time(name)?),
        FieldKind::Date => FieldValue::Date(reader.read_date(name)?),
        FieldKind::ArrayOfDate => FieldValue::ArrayOfDate(reader.read_array_of_date(name)?),
        FieldKind::Timestamp => FieldValue::Timestamp(reader.read_timestamp(name)?),
        FieldKind::ArrayOfTimestamp => {
            FieldValue::ArrayOfTimestamp(reader.read_array_of_timestamp(name)?)
        }
        FieldKind::TimestampWithTimezone => {
            FieldValue::TimestampWithTimezone(reader.read_timestamp_with_timezone(name)?)
        }
        FieldKind::ArrayOfTimestampWithTimezone => FieldValue::ArrayOfTimestampWithTimezone(
            reader.read_array_of_timestamp_with_timezone(name)?,
        ),
        FieldKind::Compact => FieldValue::Compact(reader.read_generic_record(name)?),
        FieldKind::ArrayOfCompact => {
            FieldValue::ArrayOfCompact(reader.read_array_of_generic_record(name)?)
        }
        FieldKind::NullableBoolean => FieldValue::NullableBoolean(reader.read_nullable_boolean(name)?),
        FieldKind::ArrayOfNullableBoolean => {
            FieldValue::ArrayOfNullableBoolean(reader.read_array_of_nullable_boolean(name)?)
        }
        FieldKind::NullableInt8 => FieldValue::NullableInt8(reader.read_nullable_int8(name)?),
        FieldKind::ArrayOfNullableInt8 => {
            FieldValue::ArrayOfNullableInt8(reader.read_array_of_nullable_int8(name)?)
        }
        FieldKind::NullableInt16 => FieldValue::NullableInt16(reader.read_nullable_int16(name)?),
        FieldKind::ArrayOfNullableInt16 => {
            FieldValue::ArrayOfNullableInt16(reader.read_array_of_nullable_int16(name)?)
        }
        FieldKind::NullableInt32 => FieldValue::NullableInt32(reader.read_nullable_int32(name)?),
        FieldKind::ArrayOfNullableInt32 => {
            FieldValue::ArrayOfNullableInt32(reader.read_array_of_nullable_int32(name)?)
        }
        FieldKind::NullableInt64 => FieldValue::NullableInt64(reader.read_nullable_int64(name)?),
        FieldKind::ArrayOfNullableInt64 => {
            FieldValue::ArrayOfNullableInt64(reader.read_array_of_nullable_int64(name)?)
        }
        FieldKind::NullableFloat32 => FieldValue::NullableFloat32(reader.read_nullable_float32(name)?),
        FieldKind::ArrayOfNullableFloat32 => {
            FieldValue::ArrayOfNullableFloat32(reader.read_array_of_nullable_float32(name)?)
        }
        FieldKind::NullableFloat64 => FieldValue::NullableFloat64(reader.read_nullable_float64(name)?),
        FieldKind::ArrayOfNullableFloat64 => {
            FieldValue::ArrayOfNullableFloat64(reader.read_array_of_nullable_float64(name)?)
        }
    };
    Ok(value)
}

/// Writes one value through `writer` under `name`.
pub fn write_field<W: CompactWriter>(writer: &mut W, name: &str, value: &FieldValue) -> Result<()> {
    match value {
        FieldValue::Boolean(v) => writer.write_boolean(name, *v),
        FieldValue::ArrayOfBoolean(v) => writer.write_array_of_boolean(name, v.as_deref()),
        FieldValue::Int8(v) => writer.write_int8(name, *v),
        FieldValue::ArrayOfInt8(v) => writer.write_array_of_int8(name, v.as_deref()),
        FieldValue::Int16(v) => writer.write_int16(name, *v),
        FieldValue::ArrayOfInt16(v) => writer.write_array_of_int16(name, v.as_deref()),
        FieldValue::Int32(v) => writer.write_int32(name, *v),
        FieldValue::ArrayOfInt32(v) => writer.write_array_of_int32(name, v.as_deref()),
        FieldValue::Int64(v) => writer.write_int64(name, *v),
        FieldValue::ArrayOfInt64(v) => writer.write_array_of_int64(name, v.as_deref()),
        FieldValue::Float32(v) => writer.write_float32(name, *v),
        FieldValue::ArrayOfFloat32(v) => writer.write_array_of_float32(name, v.as_deref()),
        FieldValue::Float64(v) => writer.write_float64(name, *v),
        FieldValue::ArrayOfFloat64(v) => writer.write_array_of_float64(name, v.as_deref()),
        FieldValue::String(v) => writer.write_string(name, v.as_deref()),
        FieldValue::ArrayOfString(v) => writer.write_array_of_string(name, v.as_deref()),
        FieldValue::Decimal(v) => writer.write_decimal(name, *v),
        FieldValue::ArrayOfDecimal(v) => writer.write_array_of_decimal(name, v.as_deref()),
        FieldValue::Time(v) => writer.write_time(name, *v),
        FieldValue::ArrayOfTime(v) => writer.write_array_of_time(name, v.as_deref()),
        FieldValue::Date(v) => writer.write_date(name, *v),
        FieldValue::ArrayOfDate(v) => writer.write_array_of_date(name, v.as_deref()),
        FieldValue::Timestamp(v) => writer.write_timestamp(name, *v),
        FieldValue::ArrayOfTimestamp(v) => writer.write_array_of_timestamp(name, v.as_deref()),
        FieldValue::TimestampWithTimezone(v) => writer.write_timestamp_with_timezone(name, *v),
        FieldValue::ArrayOfTimestampWithTimezone(v) => {
            writer.write_array_of_timestamp_with_timezone(name, v.as_deref())
        }
        FieldValue::Compact(v) => writer.write_generic_record(name, v.as_ref()),
        FieldValue::ArrayOfCompact(v) => writer.write_array_of_generic_record(name, v.as_deref()),
        FieldValue::NullableBoolean(v) => writer.write_nullable_boolean(name, *v),
        FieldValue::ArrayOfNullableBoolean(v) => {
            writer.write_array_of_nullable_boolean(name, v.as_deref())
        }
        FieldValue::NullableInt8(v) => writer.write_nullable_int8(name, *v),
        FieldValue::ArrayOfNullableInt8(v) => writer.write_array_of_nullable_int8(name, v.as_deref()),
        FieldValue::NullableInt16(v) => writer.write_nullable_int16(name, *v),
        FieldValue::ArrayOfNullableInt16(v) => {
            writer.write_array_of_nullable_int16(name, v.as_deref())
        }
        FieldValue::NullableInt32(v) => writer.write_nullable_int32(name, *v),
        FieldValue::ArrayOfNullableInt32(v) => {
            writer.write_array_of_nullable_int32(name, v.as_deref())
        }
        FieldValue::NullableInt64(v) => writer.write_nullable_int64(name, *v),
        FieldValue::ArrayOfNullableInt64(v) => {
            writer.write_array_of_nullable_int64(name, v.as_deref())
        }
        FieldValue::NullableFloat32(v) => writer.write_nullable_float32(name, *v),
        FieldValue::ArrayOfNullableFloat32(v) => {
            writer.write_array_of_nullable_float32(name, v.as_deref())
        }
        FieldValue::NullableFloat64(v) => writer.write_nullable_float64(name, *v),
        FieldValue::ArrayOfNullableFloat64(v) => {
            writer.write_array_of_nullable_float64(name, v.as_deref())
        }
    }
}

/// Checks that `value` can be stored in a field `name` declared with `kind`.
///
/// Besides the kind itself this rejects what the Rust types admit but the
/// format cannot carry: leap-second times, timezone offsets beyond 18 hours
/// and arrays of nested records with differing schemas.
pub fn validate_field(name: &str, kind: FieldKind, value: &FieldValue) -> Result<()> {
    if value.kind() != kind {
        return Err(CompactError::FieldKindMismatch {
            field: name.to_string(),
            expected: kind,
            actual: value.kind(),
        });
    }
    let invalid = |message: String| CompactError::InvalidValue {
        field: name.to_string(),
        message,
    };
    match value {
        FieldValue::Time(Some(t)) => check_time(t).map_err(invalid),
        FieldValue::ArrayOfTime(Some(items)) => {
            items.iter().flatten().try_for_each(check_time).map_err(invalid)
        }
        FieldValue::Timestamp(Some(t)) => check_time(&t.time()).map_err(invalid),
        FieldValue::ArrayOfTimestamp(Some(items)) => items
            .iter()
            .flatten()
            .try_for_each(|t| check_time(&t.time()))
            .map_err(invalid),
        FieldValue::TimestampWithTimezone(Some(t)) => check_zoned(t).map_err(invalid),
        FieldValue::ArrayOfTimestampWithTimezone(Some(items)) => {
            items.iter().flatten().try_for_each(check_zoned).map_err(invalid)
        }
        FieldValue::ArrayOfCompact(Some(items)) => check_same_schema(items).map_err(invalid),
        _ => Ok(()),
    }
}

fn check_time(time: &NaiveTime) -> std::result::Result<(), String> {
    if time.nanosecond() >= 1_000_000_000 {
        return Err(format!("leap second time {} is not supported", time));
    }
    Ok(())
}

fn check_zoned(value: &DateTime<FixedOffset>) -> std::result::Result<(), String> {
    check_time(&value.time())?;
    let seconds = value.offset().local_minus_utc();
    if seconds.abs() > MAX_OFFSET_SECONDS {
        return Err(format!("timezone offset {} is outside +/-18:00", value.offset()));
    }
    Ok(())
}

fn check_same_schema(items: &[Option<GenericRecord>]) -> std::result::Result<(), String> {
    let mut present = items.iter().flatten();
    if let Some(first) = present.next() {
        if let Some(other) = present.find(|r| r.schema_id() != first.schema_id()) {
            return Err(format!(
                "items of an array of compact must share one schema, found '{}' and '{}'",
                first.type_name(),
                other.type_name()
            ));
        }
    }
    Ok(())
}
