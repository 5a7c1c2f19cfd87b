//! Compact serialization: schema-driven records with fingerprinted schemas.
//!
//! A Compact record is laid out against a [`Schema`]: fixed-width fields sit
//! at precomputed offsets, booleans are bit-packed, and variable-size fields
//! are addressed through an offset table whose entry width depends on the
//! size of the record. Typed values go through the [`Compact`] trait; values
//! of unknown types decode to a [`GenericRecord`].

mod arrays;
mod field_kind;
mod field_operations;
mod field_value;
pub mod fingerprint;
mod generic_record;
mod offsets;
mod reader;
mod registry;
mod schema;
mod schema_writer;
mod serializer;
mod values;
mod writer;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

use crate::error::Result;

pub use field_kind::{FieldKind, ALL_FIELD_KINDS, NOT_AVAILABLE_KIND_ID};
pub use field_operations::{read_field, validate_field, write_field};
pub use field_value::FieldValue;
pub use generic_record::{GenericRecord, GenericRecordBuilder};
pub use offsets::{OffsetWidth, BYTE_OFFSET_READER_RANGE, NULL_OFFSET, SHORT_OFFSET_READER_RANGE};
pub use reader::DefaultCompactReader;
pub use registry::{InMemorySchemaRegistry, SchemaRegistry};
pub use schema::{FieldDescriptor, Schema};
pub use schema_writer::SchemaWriter;
pub use serializer::CompactSerializer;
pub use values::MAX_OFFSET_SECONDS;
pub use writer::DefaultCompactWriter;

/// A type that can be written to and read from the Compact format.
///
/// `write` must emit the same set of fields, with the same kinds, for every
/// value of the type: the schema is derived from the first value serialized
/// and then cached per [`type_name`](Compact::type_name).
pub trait Compact: Sized {
    /// Returns the type name stored in the schema of this type.
    fn type_name() -> &'static str;

    /// Writes this value's fields to the given writer.
    fn write<W: CompactWriter>(&self, writer: &mut W) -> Result<()>;

    /// Reads a value from the given reader.
    fn read<R: CompactReader>(reader: &mut R) -> Result<Self>;
}

/// Trait for writing Compact fields by name.
pub trait CompactWriter {
    /// Writes a boolean field.
    fn write_boolean(&mut self, name: &str, value: bool) -> Result<()>;

    /// Writes an 8-bit integer field.
    fn write_int8(&mut self, name: &str, value: i8) -> Result<()>;

    /// Writes a 16-bit integer field.
    fn write_int16(&mut self, name: &str, value: i16) -> Result<()>;

    /// Writes a 32-bit integer field.
    fn write_int32(&mut self, name: &str, value: i32) -> Result<()>;

    /// Writes a 64-bit integer field.
    fn write_int64(&mut self, name: &str, value: i64) -> Result<()>;

    /// Writes a 32-bit float field.
    fn write_float32(&mut self, name: &str, value: f32) -> Result<()>;

    /// Writes a 64-bit float field.
    fn write_float64(&mut self, name: &str, value: f64) -> Result<()>;

    /// Writes a string field.
    fn write_string(&mut self, name: &str, value: Option<&str>) -> Result<()>;

    /// Writes an arbitrary precision decimal field.
    fn write_decimal(&mut self, name: &str, value: Option<Decimal>) -> Result<()>;

    /// Writes a time field.
    fn write_time(&mut self, name: &str, value: Option<NaiveTime>) -> Result<()>;

    /// Writes a date field.
    fn write_date(&mut self, name: &str, value: Option<NaiveDate>) -> Result<()>;

    /// Writes a timestamp field.
    fn write_timestamp(&mut self, name: &str, value: Option<NaiveDateTime>) -> Result<()>;

    /// Writes a timestamp with timezone field.
    fn write_timestamp_with_timezone(
        &mut self,
        name: &str,
        value: Option<DateTime<FixedOffset>>,
    ) -> Result<()>;

    /// Writes a nested Compact field.
    fn write_compact<T: Compact>(&mut self, name: &str, value: Option<&T>) -> Result<()>;

    /// Writes a nested generic record field.
    fn write_generic_record(&mut self, name: &str, value: Option<&GenericRecord>) -> Result<()>;

    /// Writes an array of booleans.
    fn write_array_of_boolean(&mut self, name: &str, value: Option<&[bool]>) -> Result<()>;

    /// Writes an array of 8-bit integers.
    fn write_array_of_int8(&mut self, name: &str, value: Option<&[i8]>) -> Result<()>;

    /// Writes an array of 16-bit integers.
    fn write_array_of_int16(&mut self, name: &str, value: Option<&[i16]>) -> Result<()>;

    /// Writes an array of 32-bit integers.
    fn write_array_of_int32(&mut self, name: &str, value: Option<&[i32]>) -> Result<()>;

    /// Writes an array of 64-bit integers.
    fn write_array_of_int64(&mut self, name: &str, value: Option<&[i64]>) -> Result<()>;

    /// Writes an array of 32-bit floats.
    fn write_array_of_float32(&mut self, name: &str, value: Option<&[f32]>) -> Result<()>;

    /// Writes an array of 64-bit floats.
    fn write_array_of_float64(&mut self, name: &str, value: Option<&[f64]>) -> Result<()>;

    /// Writes an array of strings.
    fn write_array_of_string(&mut self, name: &str, value: Option<&[Option<String>]>) -> Result<()>;

    /// Writes an array of decimals.
    fn write_array_of_decimal(&mut self, name: &str, value: Option<&[Option<Decimal>]>)
        -> Result<()>;

    /// Writes an array of times.
    fn write_array_of_time(&mut self, name: &str, value: Option<&[Option<NaiveTime>]>) -> Result<()>;

    /// Writes an array of dates.
    fn write_array_of_date(&mut self, name: &str, value: Option<&[Option<NaiveDate>]>) -> Result<()>;

    /// Writes an array of timestamps.
    fn write_array_of_timestamp(
        &mut self,
        name: &str,
        value: Option<&[Option<NaiveDateTime>]>,
    ) -> Result<()>;

    /// Writes an array of timestamps with timezone.
    fn write_array_of_timestamp_with_timezone(
        &mut self,
        name: &str,
        value: Option<&[Option<DateTime<FixedOffset>>]>,
    ) -> Result<()>;

    /// Writes an array of nested Compact values.
    ///
    /// All present items must share one schema.
    fn write_array_of_compact<T: Compact>(&mut self, name: &str, value: Option<&[Option<T>]>)
        -> Result<()>;

    /// Writes an array of nested generic records sharing one schema.
    fn write_array_of_generic_record(
        &mut self,
        name: &str,
        value: Option<&[Option<GenericRecord>]>,
    ) -> Result<()>;

    /// Writes a nullable boolean field.
    fn write_nullable_boolean(&mut self, name: &str, value: Option<bool>) -> Result<()>;

    /// Writes a nullable 8-bit integer field.
    fn write_nullable_int8(&mut self, name: &str, value: Option<i8>) -> Result<()>;

    /// Writes a nullable 16-bit integer field.
    fn write_nullable_int16(&mut self, name: &str, value: Option<i16>) -> Result<()>;

    /// Writes a nullable 32-bit integer field.
    fn write_nullable_int32(&mut self, name: &str, value: Option<i32>) -> Result<()>;

    /// Writes a nullable 64-bit integer field.
    fn write_nullable_int64(&mut self, name: &str, value: Option<i64>) -> Result<()>;

    /// Writes a nullable 32-bit float field.
    fn write_nullable_float32(&mut self, name: &str, value: Option<f32>) -> Result<()>;

    /// Writes a nullable 64-bit float field.
    fn write_nullable_float64(&mut self, name: &str, value: Option<f64>) -> Result<()>;

    /// Writes an array of nullable booleans.
    fn write_array_of_nullable_boolean(&mut self, name: &str, value: Option<&[Option<bool>]>)
        -> Result<()>;

    /// Writes an array of nullable 8-bit integers.
    fn write_array_of_nullable_int8(&mut self, name: &str, value: Option<&[Option<i8>]>)
        -> Result<()>;

    /// Writes an array of nullable 16-bit integers.
    fn write_array_of_nullable_int16(&mut self, name: &str, value: Option<&[Option<i16>]>)
        -> Result<()>;

    /// Writes an array of nullable 32-bit integers.
    fn write_array_of_nullable_int32(&mut self, name: &str, value: Option<&[Option<i32>]>)
        -> Result<()>;

    /// Writes an array of nullable 64-bit integers.
    fn write_array_of_nullable_int64(&mut self, name: &str, value: Option<&[Option<i64>]>)
        -> Result<()>;

    /// Writes an array of nullable 32-bit floats.
    fn write_array_of_nullable_float32(&mut self, name: &str, value: Option<&[Option<f32>]>)
        -> Result<()>;

    /// Writes an array of nullable 64-bit floats.
    fn write_array_of_nullable_float64(&mut self, name: &str, value: Option<&[Option<f64>]>)
        -> Result<()>;
}

/// Trait for reading Compact fields by name.
///
/// Accessors of primitive kinds also accept fields declared with the nullable
/// counterpart kind and fail if the stored value is null; nullable accessors
/// accept both kinds.
pub trait CompactReader {
    /// Returns the schema the record was written with.
    fn schema(&self) -> &Schema;

    /// Returns the kind of a field, or `None` if the schema lacks it.
    fn get_field_kind(&self, name: &str) -> Option<FieldKind>;

    /// Reads a boolean field.
    fn read_boolean(&mut self, name: &str) -> Result<bool>;

    /// Reads an 8-bit integer field.
    fn read_int8(&mut self, name: &str) -> Result<i8>;

    /// Reads a 16-bit integer field.
    fn read_int16(&mut self, name: &str) -> Result<i16>;

    /// Reads a 32-bit integer field.
    fn read_int32(&mut self, name: &str) -> Result<i32>;

    /// Reads a 64-bit integer field.
    fn read_int64(&mut self, name: &str) -> Result<i64>;

    /// Reads a 32-bit float field.
    fn read_float32(&mut self, name: &str) -> Result<f32>;

    /// Reads a 64-bit float field.
    fn read_float64(&mut self, name: &str) -> Result<f64>;

    /// Reads a string field.
    fn read_string(&mut self, name: &str) -> Result<Option<String>>;

    /// Reads a decimal field.
    fn read_decimal(&mut self, name: &str) -> Result<Option<Decimal>>;

    /// Reads a time field.
    fn read_time(&mut self, name: &str) -> Result<Option<NaiveTime>>;

    /// Reads a date field.
    fn read_date(&mut self, name: &str) -> Result<Option<NaiveDate>>;

    /// Reads a timestamp field.
    fn read_timestamp(&mut self, name: &str) -> Result<Option<NaiveDateTime>>;

    /// Reads a timestamp with timezone field.
    fn read_timestamp_with_timezone(&mut self, name: &str) -> Result<Option<DateTime<FixedOffset>>>;

    /// Reads a nested Compact field.
    fn read_compact<T: Compact>(&mut self, name: &str) -> Result<Option<T>>;

    /// Reads a nested field as a generic record.
    fn read_generic_record(&mut self, name: &str) -> Result<Option<GenericRecord>>;

    /// Reads an array of booleans.
    fn read_array_of_boolean(&mut self, name: &str) -> Result<Option<Vec<bool>>>;

    /// Reads an array of 8-bit integers.
    fn read_array_of_int8(&mut self, name: &str) -> Result<Option<Vec<i8>>>;

    /// Reads an array of 16-bit integers.
    fn read_array_of_int16(&mut self, name: &str) -> Result<Option<Vec<i16>>>;

    /// Reads an array of 32-bit integers.
    fn read_array_of_int32(&mut self, name: &str) -> Result<Option<Vec<i32>>>;

    /// Reads an array of 64-bit integers.
    fn read_array_of_int64(&mut self, name: &str) -> Result<Option<Vec<i64>>>;

    /// Reads an array of 32-bit floats.
    fn read_array_of_float32(&mut self, name: &str) -> Result<Option<Vec<f32>>>;

    /// Reads an array of 64-bit floats.
    fn read_array_of_float64(&mut self, name: &str) -> Result<Option<Vec<f64>>>;

    /// Reads an array of strings.
    fn read_array_of_string(&mut self, name: &str) -> Result<Option<Vec<Option<String>>>>;

    /// Reads an array of decimals.
    fn read_array_of_decimal(&mut self, name: &str) -> Result<Option<Vec<Option<Decimal>>>>;

    /// Reads an array of times.
    fn read_array_of_time(&mut self, name: &str) -> Result<Option<Vec<Option<NaiveTime>>>>;

    /// Reads an array of dates.
    fn read_array_of_date(&mut self, name: &str) -> Result<Option<Vec<Option<NaiveDate>>>>;

    /// Reads an array of timestamps.
    fn read_array_of_timestamp(&mut self, name: &str) -> Result<Option<Vec<Option<NaiveDateTime>>>>;

    /// Reads an array of timestamps with timezone.
    fn read_array_of_timestamp_with_timezone(
        &mut self,
        name: &str,
    ) -> Result<Option<Vec<Option<DateTime<FixedOffset>>>>>;

    /// Reads an array of nested Compact values.
    fn read_array_of_compact<T: Compact>(&mut self, name: &str) -> Result<Option<Vec<Option<T>>>>;

    /// Reads an array of nested values as generic records.
    fn read_array_of_generic_record(&mut self, name: &str)
        -> Result<Option<Vec<Option<GenericRecord>>>>;

    /// Reads a nullable boolean field.
    fn read_nullable_boolean(&mut self, name: &str) -> Result<Option<bool>>;

    /// Reads a nullable 8-bit integer field.
    fn read_nullable_int8(&mut self, name: &str) -> Result<Option<i8>>;

    /// Reads a nullable 16-bit integer field.
    fn read_nullable_int16(&mut self, name: &str) -> Result<Option<i16>>;

    /// Reads a nullable 32-bit integer field.
    fn read_nullable_int32(&mut self, name: &str) -> Result<Option<i32>>;

    /// Reads a nullable 64-bit integer field.
    fn read_nullable_int64(&mut self, name: &str) -> Result<Option<i64>>;

    /// Reads a nullable 32-bit float field.
    fn read_nullable_float32(&mut self, name: &str) -> Result<Option<f32>>;

    /// Reads a nullable 64-bit float field.
    fn read_nullable_float64(&mut self, name: &str) -> Result<Option<f64>>;

    /// Reads an array of nullable booleans.
    fn read_array_of_nullable_boolean(&mut self, name: &str) -> Result<Option<Vec<Option<bool>>>>;

    /// Reads an array of nullable 8-bit integers.
    fn read_array_of_nullable_int8(&mut self, name: &str) -> Result<Option<Vec<Option<i8>>>>;

    /// Reads an array of nullable 16-bit integers.
    fn read_array_of_nullable_int16(&mut self, name: &str) -> Result<Option<Vec<Option<i16>>>>;

    /// Reads an array of nullable 32-bit integers.
    fn read_array_of_nullable_int32(&mut self, name: &str) -> Result<Option<Vec<Option<i32>>>>;

    /// Reads an array of nullable 64-bit integers.
    fn read_array_of_nullable_int64(&mut self, name: &str) -> Result<Option<Vec<Option<i64>>>>;

    /// Reads an array of nullable 32-bit floats.
    fn read_array_of_nullable_float32(&mut self, name: &str) -> Result<Option<Vec<Option<f32>>>>;

    /// Reads an array of nullable 64-bit floats.
    fn read_array_of_nullable_float64(&mut self, name: &str) -> Result<Option<Vec<Option<f64>>>>;
}
