//! Schema derivation by running a value's `write` against a recording writer.

use std::collections::HashSet;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

use crate::error::{CompactError, Result};

use super::{Compact, CompactWriter, FieldDescriptor, FieldKind, GenericRecord, Schema};

/// A [`CompactWriter`] that records field declarations and ignores values.
#[derive(Debug)]
pub struct SchemaWriter {
    type_name: String,
    fields: Vec<FieldDescriptor>,
    names: HashSet<String>,
}

impl SchemaWriter {
    /// Creates a writer collecting the fields of `type_name`.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
            names: HashSet::new(),
        }
    }

    /// Returns the type name of the schema being built.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Declares a field; a name can be declared only once.
    pub fn add_field(&mut self, field: FieldDescriptor) -> Result<()> {
        if !self.names.insert(field.name().to_string()) {
            return Err(CompactError::DuplicateField {
                type_name: self.type_name.clone(),
                field: field.name().to_string(),
            });
        }
        self.fields.push(field);
        Ok(())
    }

    /// Builds the schema from the declared fields.
    pub fn build(self) -> Result<Schema> {
        Schema::new(self.type_name, self.fields)
    }

    fn declare(&mut self, name: &str, kind: FieldKind) -> Result<()> {
        self.add_field(FieldDescriptor::new(name, kind))
    }
}

macro_rules! declare_fields {
    ($($method:ident($ty:ty) => $kind:ident;)*) => {
        $(
            fn $method(&mut self, name: &str, _value: $ty) -> Result<()> {
                self.declare(name, FieldKind::$kind)
            }
        )*
    };
}

impl CompactWriter for SchemaWriter {
    declare_fields! {
        write_boolean(bool) => Boolean;
        write_int8(i8) => Int8;
        write_int16(i16) => Int16;
        write_int32(i32) => Int32;
        write_int64(i64) => Int64;
        write_float32(f32) => Float32;
        write_float64(f64) => Float64;
        write_string(Option<&str>) => String;
        write_decimal(Option<Decimal>) => Decimal;
        write_time(Option<NaiveTime>) => Time;
        write_date(Option<NaiveDate>) => Date;
        write_timestamp(Option<NaiveDateTime>) => Timestamp;
        write_timestamp_with_timezone(Option<DateTime<FixedOffset>>) => TimestampWithTimezone;
        write_generic_record(Option<&GenericRecord>) => Compact;
        write_array_of_boolean(Option<&[bool]>) => ArrayOfBoolean;
        write_array_of_int8(Option<&[i8]>) => ArrayOfInt8;
        write_array_of_int16(Option<&[i16]>) => ArrayOfInt16;
        write_array_of_int32(Option<&[i32]>) => ArrayOfInt32;
        write_array_of_int64(Option<&[i64]>) => ArrayOfInt64;
        write_array_of_float32(Option<&[f32]>) => ArrayOfFloat32;
        write_array_of_float64(Option<&[f64]>) => ArrayOfFloat64;
        write_array_of_string(Option<&[Option<String>]>) => ArrayOfString;
        write_array_of_decimal(Option<&[Option<Decimal>]>) => ArrayOfDecimal;
        write_array_of_time(Option<&[Option<NaiveTime>]>) => ArrayOfTime;
        write_array_of_date(Option<&[Option<NaiveDate>]>) => ArrayOfDate;
        write_array_of_timestamp(Option<&[Option<NaiveDateTime>]>) => ArrayOfTimestamp;
        write_array_of_timestamp_with_timezone(Option<&[Option<DateTime<FixedOffset>>]>) => ArrayOfTimestampWithTimezone;
        write_array_of_generic_record(Option<&[Option<GenericRecord>]>) => ArrayOfCompact;
        write_nullable_boolean(Option<bool>) => NullableBoolean;
        write_nullable_int8(Option<i8>) => NullableInt8;
        write_nullable_int16(Option<i16>) => NullableInt16;
        write_nullable_int32(Option<i32>) => NullableInt32;
        write_nullable_int64(Option<i64>) => NullableInt64;
        write_nullable_float32(Option<f32>) => NullableFloat32;
        write_nullable_float64(Option<f64>) => NullableFloat64;
        write_array_of_nullable_boolean(Option<&[Option<bool>]>) => ArrayOfNullableBoolean;
        write_array_of_nullable_int8(Option<&[Option<i8>]>) => ArrayOfNullableInt8;
        write_array_of_nullable_int16(Option<&[Option<i16>]>) => ArrayOfNullableInt16;
        write_array_of_nullable_int32(Option<&[Option<i32>]>) => ArrayOfNullableInt32;
        write_array_of_nullable_int64(Option<&[Option<i64>]>) => ArrayOfNullableInt64;
        write_array_of_nullable_float32(Option<&[Option<f32>]>) => ArrayOfNullableFloat32;
        write_array_of_nullable_float64(Option<&[Option<f64>]>) => ArrayOfNullableFloat64;
    }

    fn write_compact<T: Compact>(&mut self, name: &str, _value: Option<&T>) -> Result<()> {
        self.declare(name, FieldKind::Compact)
    }

    fn write_array_of_compact<T: Compact>(
        &mut self,
        name: &str,
        _value: Option<&[Option<T>]>,
    ) -> Result<()> {
        self.declare(name, FieldKind::ArrayOfCompact)
    }
}
