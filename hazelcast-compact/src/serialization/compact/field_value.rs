//! Dynamically typed field values of generic records.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde_json::{Number, Value};

use super::{FieldKind, GenericRecord};

/// A field value paired with its kind: one variant per [`FieldKind`].
///
/// Variable-size kinds carry an `Option` for the null value; arrays of
/// reference kinds additionally carry `Option` items.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum FieldValue {
    Boolean(bool),
    ArrayOfBoolean(Option<Vec<bool>>),
    Int8(i8),
    ArrayOfInt8(Option<Vec<i8>>),
    Int16(i16),
    ArrayOfInt16(Option<Vec<i16>>),
    Int32(i32),
    ArrayOfInt32(Option<Vec<i32>>),
    Int64(i64),
    ArrayOfInt64(Option<Vec<i64>>),
    Float32(f32),
    ArrayOfFloat32(Option<Vec<f32>>),
    Float64(f64),
    ArrayOfFloat64(Option<Vec<f64>>),
    String(Option<String>),
    ArrayOfString(Option<Vec<Option<String>>>),
    Decimal(Option<Decimal>),
    ArrayOfDecimal(Option<Vec<Option<Decimal>>>),
    Time(Option<NaiveTime>),
    ArrayOfTime(Option<Vec<Option<NaiveTime>>>),
    Date(Option<NaiveDate>),
    ArrayOfDate(Option<Vec<Option<NaiveDate>>>),
    Timestamp(Option<NaiveDateTime>),
    ArrayOfTimestamp(Option<Vec<Option<NaiveDateTime>>>),
    TimestampWithTimezone(Option<DateTime<FixedOffset>>),
    ArrayOfTimestampWithTimezone(Option<Vec<Option<DateTime<FixedOffset>>>>),
    Compact(Option<GenericRecord>),
    ArrayOfCompact(Option<Vec<Option<GenericRecord>>>),
    NullableBoolean(Option<bool>),
    ArrayOfNullableBoolean(Option<Vec<Option<bool>>>),
    NullableInt8(Option<i8>),
    ArrayOfNullableInt8(Option<Vec<Option<i8>>>),
    NullableInt16(Option<i16>),
    ArrayOfNullableInt16(Option<Vec<Option<i16>>>),
    NullableInt32(Option<i32>),
    ArrayOfNullableInt32(Option<Vec<Option<i32>>>),
    NullableInt64(Option<i64>),
    ArrayOfNullableInt64(Option<Vec<Option<i64>>>),
    NullableFloat32(Option<f32>),
    ArrayOfNullableFloat32(Option<Vec<Option<f32>>>),
    NullableFloat64(Option<f64>),
    ArrayOfNullableFloat64(Option<Vec<Option<f64>>>),
}

impl FieldValue {
    /// Returns the kind this value belongs to.
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Boolean(_) => FieldKind::Boolean,
            Self::ArrayOfBoolean(_) => FieldKind::ArrayOfBoolean,
            Self::Int8(_) => FieldKind::Int8,
            Self::ArrayOfInt8(_) => FieldKind::ArrayOfInt8,
            Self::Int16(_) => FieldKind::Int16,
            Self::ArrayOfInt16(_) => FieldKind::ArrayOfInt16,
            Self::Int32(_) => FieldKind::Int32,
            Self::ArrayOfInt32(_) => FieldKind::ArrayOfInt32,
            Self::Int64(_) => FieldKind::Int64,
            Self::ArrayOfInt64(_) => FieldKind::ArrayOfInt64,
            Self::Float32(_) => FieldKind::Float32,
            Self::ArrayOfFloat32(_) => FieldKind::ArrayOfFloat32,
            Self::Float64(_) => FieldKind::Float64,
            Self::ArrayOfFloat64(_) => FieldKind::ArrayOfFloat64,
            Self::String(_) => FieldKind::String,
            Self::ArrayOfString(_) => FieldKind::ArrayOfString,
            Self::Decimal(_) => FieldKind::Decimal,
            Self::ArrayOfDecimal(_) => FieldKind::ArrayOfDecimal,
            Self::Time(_) => FieldKind::Time,
            Self::ArrayOfTime(_) => FieldKind::ArrayOfTime,
            Self::Date(_) => FieldKind::Date,
            Self::ArrayOfDate(_) => FieldKind::ArrayOfDate,
            Self::Timestamp(_) => FieldKind::Timestamp,
            Self::ArrayOfTimestamp(_) => FieldKind::ArrayOfTimestamp,
            Self::TimestampWithTimezone(_) => FieldKind::TimestampWithTimezone,
            Self::ArrayOfTimestampWithTimezone(_) => FieldKind::ArrayOfTimestampWithTimezone,
            Self::Compact(_) => FieldKind::Compact,
            Self::ArrayOfCompact(_) => FieldKind::ArrayOfCompact,
            Self::NullableBoolean(_) => FieldKind::NullableBoolean,
            Self::ArrayOfNullableBoolean(_) => FieldKind::ArrayOfNullableBoolean,
            Self::NullableInt8(_) => FieldKind::NullableInt8,
            Self::ArrayOfNullableInt8(_) => FieldKind::ArrayOfNullableInt8,
            Self::NullableInt16(_) => FieldKind::NullableInt16,
            Self::ArrayOfNullableInt16(_) => FieldKind::ArrayOfNullableInt16,
            Self::NullableInt32(_) => FieldKind::NullableInt32,
            Self::ArrayOfNullableInt32(_) => FieldKind::ArrayOfNullableInt32,
            Self::NullableInt64(_) => FieldKind::NullableInt64,
            Self::ArrayOfNullableInt64(_) => FieldKind::ArrayOfNullableInt64,
            Self::NullableFloat32(_) => FieldKind::NullableFloat32,
            Self::ArrayOfNullableFloat32(_) => FieldKind::ArrayOfNullableFloat32,
            Self::NullableFloat64(_) => FieldKind::NullableFloat64,
            Self::ArrayOfNullableFloat64(_) => FieldKind::ArrayOfNullableFloat64,
        }
    }

    /// Returns true if the value is null. Fixed-width primitives never are.
    pub fn is_null(&self) -> bool {
        match self {
            Self::Boolean(_)
            | Self::Int8(_)
            | Self::Int16(_)
            | Self::Int32(_)
            | Self::Int64(_)
            | Self::Float32(_)
            | Self::Float64(_) => false,
            Self::ArrayOfBoolean(v) => v.is_none(),
            Self::ArrayOfInt8(v) => v.is_none(),
            Self::ArrayOfInt16(v) => v.is_none(),
            Self::ArrayOfInt32(v) => v.is_none(),
            Self::ArrayOfInt64(v) => v.is_none(),
            Self::ArrayOfFloat32(v) => v.is_none(),
            Self::ArrayOfFloat64(v) => v.is_none(),
            Self::String(v) => v.is_none(),
            Self::ArrayOfString(v) => v.is_none(),
            Self::Decimal(v) => v.is_none(),
            Self::ArrayOfDecimal(v) => v.is_none(),
            Self::Time(v) => v.is_none(),
            Self::ArrayOfTime(v) => v.is_none(),
            Self::Date(v) => v.is_none(),
            Self::ArrayOfDate(v) => v.is_none(),
            Self::Timestamp(v) => v.is_none(),
            Self::ArrayOfTimestamp(v) => v.is_none(),
            Self::TimestampWithTimezone(v) => v.is_none(),
            Self::ArrayOfTimestampWithTimezone(v) => v.is_none(),
            Self::Compact(v) => v.is_none(),
            Self::ArrayOfCompact(v) => v.is_none(),
            Self::NullableBoolean(v) => v.is_none(),
            Self::ArrayOfNullableBoolean(v) => v.is_none(),
            Self::NullableInt8(v) => v.is_none(),
            Self::ArrayOfNullableInt8(v) => v.is_none(),
            Self::NullableInt16(v) => v.is_none(),
            Self::ArrayOfNullableInt16(v) => v.is_none(),
            Self::NullableInt32(v) => v.is_none(),
            Self::ArrayOfNullableInt32(v) => v.is_none(),
            Self::NullableInt64(v) => v.is_none(),
            Self::ArrayOfNullableInt64(v) => v.is_none(),
            Self::NullableFloat32(v) => v.is_none(),
            Self::ArrayOfNullableFloat32(v) => v.is_none(),
            Self::NullableFloat64(v) => v.is_none(),
            Self::ArrayOfNullableFloat64(v) => v.is_none(),
        }
    }

    /// Renders the value as JSON.
    ///
    /// Decimals and temporal values become strings, non-finite floats become
    /// `null`, nested records render their fields without the type name.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Boolean(v) => Value::Bool(*v),
            Self::ArrayOfBoolean(v) => array(v.as_deref(), |b| Value::Bool(*b)),
            Self::Int8(v) => Value::from(*v),
            Self::ArrayOfInt8(v) => array(v.as_deref(), |n| Value::from(*n)),
            Self::Int16(v) => Value::from(*v),
            Self::ArrayOfInt16(v) => array(v.as_deref(), |n| Value::from(*n)),
            Self::Int32(v) => Value::from(*v),
            Self::ArrayOfInt32(v) => array(v.as_deref(), |n| Value::from(*n)),
            Self::Int64(v) => Value::from(*v),
            Self::ArrayOfInt64(v) => array(v.as_deref(), |n| Value::from(*n)),
            Self::Float32(v) => float(*v as f64),
            Self::ArrayOfFloat32(v) => array(v.as_deref(), |f| float(*f as f64)),
            Self::Float64(v) => float(*v),
            Self::ArrayOfFloat64(v) => array(v.as_deref(), |f| float(*f)),
            Self::String(v) => nullable(v.as_ref(), |s| Value::String(s.clone())),
            Self::ArrayOfString(v) => items(v.as_deref(), |s| Value::String(s.clone())),
            Self::Decimal(v) => nullable(v.as_ref(), display),
            Self::ArrayOfDecimal(v) => items(v.as_deref(), display),
            Self::Time(v) => nullable(v.as_ref(), display),
            Self::ArrayOfTime(v) => items(v.as_deref(), display),
            Self::Date(v) => nullable(v.as_ref(), display),
            Self::ArrayOfDate(v) => items(v.as_deref(), display),
            Self::Timestamp(v) => nullable(v.as_ref(), display),
            Self::ArrayOfTimestamp(v) => items(v.as_deref(), display),
            Self::TimestampWithTimezone(v) => nullable(v.as_ref(), |t| Value::String(t.to_rfc3339())),
            Self::ArrayOfTimestampWithTimezone(v) => {
                items(v.as_deref(), |t| Value::String(t.to_rfc3339()))
            }
            Self::Compact(v) => nullable(v.as_ref(), GenericRecord::fields_to_json),
            Self::ArrayOfCompact(v) => items(v.as_deref(), GenericRecord::fields_to_json),
            Self::NullableBoolean(v) => nullable(v.as_ref(), |b| Value::Bool(*b)),
            Self::ArrayOfNullableBoolean(v) => items(v.as_deref(), |b| Value::Bool(*b)),
            Self::NullableInt8(v) => nullable(v.as_ref(), |n| Value::from(*n)),
            Self::ArrayOfNullableInt8(v) => items(v.as_deref(), |n| Value::from(*n)),
            Self::NullableInt16(v) => nullable(v.as_ref(), |n| Value::from(*n)),
            Self::ArrayOfNullableInt16(v) => items(v.as_deref(), |n| Value::from(*n)),
            Self::NullableInt32(v) => nullable(v.as_ref(), |n| Value::from(*n)),
            Self::ArrayOfNullableInt32(v) => items(v.as_deref(), |n| Value::from(*n)),
            Self::NullableInt64(v) => nullable(v.as_ref(), |n| Value::from(*n)),
            Self::ArrayOfNullableInt64(v) => items(v.as_deref(), |n| Value::from(*n)),
            Self::NullableFloat32(v) => nullable(v.as_ref(), |f| float(*f as f64)),
            Self::ArrayOfNullableFloat32(v) => items(v.as_deref(), |f| float(*f as f64)),
            Self::NullableFloat64(v) => nullable(v.as_ref(), |f| float(*f)),
            Self::ArrayOfNullableFloat64(v) => items(v.as_deref(), |f| float(*f)),
        }
    }
}

fn float(v: f64) -> Value {
    Number::from_f64(v).map_or(Value::Null, Value::Number)
}

fn display<T: ToString>(v: &T) -> Value {
    Value::String(v.to_string())
}

fn nullable<T>(value: Option<&T>, render: impl Fn(&T) -> Value) -> Value {
    value.map_or(Value::Null, render)
}

fn array<T>(values: Option<&[T]>, render: impl Fn(&T) -> Value) -> Value {
    values.map_or(Value::Null, |values| values.iter().map(render).collect())
}

fn items<T>(values: Option<&[Option<T>]>, render: impl Fn(&T) -> Value) -> Value {
    array(values, |item| nullable(item.as_ref(), &render))
}
