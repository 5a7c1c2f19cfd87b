//! Encoding of one Compact record against a known schema.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

use crate::error::{CompactError, Result};
use crate::serialization::{DataOutput, ObjectDataOutput};

use super::arrays;
use super::offsets::{write_offsets, NULL_OFFSET};
use super::values;
use super::{Compact, CompactSerializer, CompactWriter, FieldDescriptor, FieldKind, GenericRecord, Schema};

/// Writes the fields of one record into a shared output buffer.
///
/// The fixed region is reserved on creation and filled positionally; variable
/// fields are appended in call order and addressed through the offset table
/// emitted by [`end`](Self::end). Every declared field must be written exactly
/// once.
#[derive(Debug)]
pub struct DefaultCompactWriter<'a> {
    serializer: &'a CompactSerializer,
    output: &'a mut ObjectDataOutput,
    schema: &'a Schema,
    data_start_position: usize,
    field_offsets: Vec<i32>,
    written: Vec<bool>,
    depth: usize,
}

impl<'a> DefaultCompactWriter<'a> {
    /// Starts a record at the current end of `output`.
    ///
    /// `depth` is the nesting level of the record, zero for a top-level value.
    pub fn new(
        serializer: &'a CompactSerializer,
        output: &'a mut ObjectDataOutput,
        schema: &'a Schema,
        depth: usize,
    ) -> Result<Self> {
        let var_fields = schema.number_var_size_fields();
        if var_fields > 0 {
            // data length slot, patched by end()
            output.write_zero_bytes(4);
        }
        let data_start_position = output.position();
        output.write_zero_bytes(schema.fixed_size_fields_length());

        Ok(Self {
            serializer,
            output,
            schema,
            data_start_position,
            field_offsets: vec![NULL_OFFSET; var_fields],
            written: vec![false; schema.field_count()],
            depth,
        })
    }

    /// Returns the schema the record is written against.
    pub fn schema(&self) -> &Schema {
        self.schema
    }

    /// Completes the record: checks that every field was written, appends the
    /// offset table and patches the data length.
    pub fn end(self) -> Result<()> {
        if let Some(position) = self.written.iter().position(|written| !written) {
            return Err(CompactError::Serialization(format!(
                "field '{}' of schema '{}' was not written",
                self.schema.fields()[position].name(),
                self.schema.type_name()
            )));
        }
        if self.field_offsets.is_empty() {
            return Ok(());
        }

        let data_length = self.output.position() - self.data_start_position;
        let length_slot = self.data_start_position - 4;
        self.output
            .pwrite_int(length_slot, arrays::relative_offset(data_length)?)?;
        write_offsets(self.output, data_length, &self.field_offsets)
    }

    /// Resolves `name` against the schema, requiring the declared kind to be
    /// `kind`, and marks it written.
    fn descriptor(&mut self, name: &str, kind: FieldKind) -> Result<&'a FieldDescriptor> {
        let schema = self.schema;
        let position = schema
            .position_of(name)
            .ok_or_else(|| CompactError::UnknownField {
                field: name.to_string(),
                type_name: schema.type_name().to_string(),
            })?;
        let field = &schema.fields()[position];
        if field.kind() != kind {
            return Err(CompactError::FieldKindMismatch {
                field: name.to_string(),
                expected: kind,
                actual: field.kind(),
            });
        }
        if std::mem::replace(&mut self.written[position], true) {
            return Err(CompactError::Serialization(format!(
                "field '{}' of schema '{}' was already written",
                name,
                schema.type_name()
            )));
        }
        Ok(field)
    }

    fn fixed_position(&self, field: &FieldDescriptor) -> usize {
        self.data_start_position + field.offset() as usize
    }

    /// Appends a variable-size value, or records null if `value` is `None`.
    fn write_variable<T: ?Sized>(
        &mut self,
        name: &str,
        kind: FieldKind,
        value: Option<&T>,
        encode: impl FnOnce(&CompactSerializer, &mut ObjectDataOutput, &T, usize) -> Result<()>,
    ) -> Result<()> {
        let field = self.descriptor(name, kind)?;
        let index = field.index() as usize;
        match value {
            None => {
                self.field_offsets[index] = NULL_OFFSET;
                Ok(())
            }
            Some(value) => {
                let offset = self.output.position() - self.data_start_position;
                self.field_offsets[index] = arrays::relative_offset(offset)?;
                encode(self.serializer, self.output, value, self.depth)
            }
        }
    }

    fn write_variable_array<T>(
        &mut self,
        name: &str,
        kind: FieldKind,
        value: Option<&[Option<T>]>,
        mut encode: impl FnMut(&mut ObjectDataOutput, &T) -> Result<()>,
    ) -> Result<()> {
        self.write_variable(name, kind, value, |_, output, items, _| {
            arrays::write_variable_items(output, items, &mut encode)
        })
    }
}

macro_rules! fixed_fields {
    ($($method:ident($ty:ty) => $kind:ident, $pwrite:ident;)*) => {
        $(
            fn $method(&mut self, name: &str, value: $ty) -> Result<()> {
                let field = self.descriptor(name, FieldKind::$kind)?;
                let position = self.fixed_position(field);
                self.output.$pwrite(position, value)
            }
        )*
    };
}

macro_rules! nullable_fields {
    ($($method:ident($ty:ty) => $kind:ident, $write:ident;)*) => {
        $(
            fn $method(&mut self, name: &str, value: Option<$ty>) -> Result<()> {
                self.write_variable(name, FieldKind::$kind, value.as_ref(), |_, output, v, _| {
                    output.$write(*v)
                })
            }
        )*
    };
}

macro_rules! fixed_array_fields {
    ($($method:ident($ty:ty) => $kind:ident, $write:ident;)*) => {
        $(
            fn $method(&mut self, name: &str, value: Option<&[$ty]>) -> Result<()> {
                self.write_variable(name, FieldKind::$kind, value, |_, output, items, _| {
                    arrays::write_fixed_items(output, items, |o, v| o.$write(v))
                })
            }
        )*
    };
}

macro_rules! nullable_array_fields {
    ($($method:ident($ty:ty) => $kind:ident, $write:ident;)*) => {
        $(
            fn $method(&mut self, name: &str, value: Option<&[Option<$ty>]>) -> Result<()> {
                self.write_variable(name, FieldKind::$kind, value, |_, output, items, _| {
                    arrays::write_nullable_items(output, items, |o, v| o.$write(v))
                })
            }
        )*
    };
}

impl CompactWriter for DefaultCompactWriter<'_> {
    fixed_fields! {
        write_int8(i8) => Int8, pwrite_byte;
        write_int16(i16) => Int16, pwrite_short;
        write_int32(i32) => Int32, pwrite_int;
        write_int64(i64) => Int64, pwrite_long;
        write_float32(f32) => Float32, pwrite_float;
        write_float64(f64) => Float64, pwrite_double;
    }

    fn write_boolean(&mut self, name: &str, value: bool) -> Result<()> {
        let field = self.descriptor(name, FieldKind::Boolean)?;
        let position = self.fixed_position(field);
        self.output
            .pwrite_bool_bit(position, field.bit_offset() as u8, value)
    }

    fn write_string(&mut self, name: &str, value: Option<&str>) -> Result<()> {
        self.write_variable(name, FieldKind::String, value, |_, output, s, _| {
            output.write_string(s)
        })
    }

    fn write_decimal(&mut self, name: &str, value: Option<Decimal>) -> Result<()> {
        self.write_variable(name, FieldKind::Decimal, value.as_ref(), |_, output, v, _| {
            values::write_decimal(output, v)
        })
    }

    fn write_time(&mut self, name: &str, value: Option<NaiveTime>) -> Result<()> {
        self.write_variable(name, FieldKind::Time, value.as_ref(), |_, output, v, _| {
            values::write_time(output, v)
        })
    }

    fn write_date(&mut self, name: &str, value: Option<NaiveDate>) -> Result<()> {
        self.write_variable(name, FieldKind::Date, value.as_ref(), |_, output, v, _| {
            values::write_date(output, v)
        })
    }

    fn write_timestamp(&mut self, name: &str, value: Option<NaiveDateTime>) -> Result<()> {
        self.write_variable(name, FieldKind::Timestamp, value.as_ref(), |_, output, v, _| {
            values::write_timestamp(output, v)
        })
    }

    fn write_timestamp_with_timezone(
        &mut self,
        name: &str,
        value: Option<DateTime<FixedOffset>>,
    ) -> Result<()> {
        self.write_variable(
            name,
            FieldKind::TimestampWithTimezone,
            value.as_ref(),
            |_, output, v, _| values::write_timestamp_with_timezone(output, v),
        )
    }

    fn write_compact<T: Compact>(&mut self, name: &str, value: Option<&T>) -> Result<()> {
        self.write_variable(name, FieldKind::Compact, value, |serializer, output, v, depth| {
            serializer.write_object(output, v, depth + 1)
        })
    }

    fn write_generic_record(&mut self, name: &str, value: Option<&GenericRecord>) -> Result<()> {
        self.write_variable(name, FieldKind::Compact, value, |serializer, output, v, depth| {
            serializer.write_generic_object(output, v, depth + 1)
        })
    }

    fn write_array_of_boolean(&mut self, name: &str, value: Option<&[bool]>) -> Result<()> {
        self.write_variable(name, FieldKind::ArrayOfBoolean, value, |_, output, items, _| {
            arrays::write_boolean_bits(output, items)
        })
    }

    fixed_array_fields! {
        write_array_of_int8(i8) => ArrayOfInt8, write_byte;
        write_array_of_int16(i16) => ArrayOfInt16, write_short;
        write_array_of_int32(i32) => ArrayOfInt32, write_int;
        write_array_of_int64(i64) => ArrayOfInt64, write_long;
        write_array_of_float32(f32) => ArrayOfFloat32, write_float;
        write_array_of_float64(f64) => ArrayOfFloat64, write_double;
    }

    fn write_array_of_string(&mut self, name: &str, value: Option<&[Option<String>]>) -> Result<()> {
        self.write_variable_array(name, FieldKind::ArrayOfString, value, |output, s| {
            output.write_string(s)
        })
    }

    fn write_array_of_decimal(
        &mut self,
        name: &str,
        value: Option<&[Option<Decimal>]>,
    ) -> Result<()> {
        self.write_variable_array(name, FieldKind::ArrayOfDecimal, value, |output, v| {
            values::write_decimal(output, v)
        })
    }

    fn write_array_of_time(&mut self, name: &str, value: Option<&[Option<NaiveTime>]>) -> Result<()> {
        self.write_variable_array(name, FieldKind::ArrayOfTime, value, |output, v| {
            values::write_time(output, v)
        })
    }

    fn write_array_of_date(&mut self, name: &str, value: Option<&[Option<NaiveDate>]>) -> Result<()> {
        self.write_variable_array(name, FieldKind::ArrayOfDate, value, |output, v| {
            values::write_date(output, v)
        })
    }

    fn write_array_of_timestamp(
        &mut self,
        name: &str,
        value: Option<&[Option<NaiveDateTime>]>,
    ) -> Result<()> {
        self.write_variable_array(name, FieldKind::ArrayOfTimestamp, value, |output, v| {
            values::write_timestamp(output, v)
        })
    }

    fn write_array_of_timestamp_with_timezone(
        &mut self,
        name: &str,
        value: Option<&[Option<DateTime<FixedOffset>>]>,
    ) -> Result<()> {
        self.write_variable_array(
            name,
            FieldKind::ArrayOfTimestampWithTimezone,
            value,
            |output, v| values::write_timestamp_with_timezone(output, v),
        )
    }

    fn write_array_of_compact<T: Compact>(
        &mut self,
        name: &str,
        value: Option<&[Option<T>]>,
    ) -> Result<()> {
        let serializer = self.serializer;
        let depth = self.depth;
        let mut schema_id = None;
        self.write_variable_array(name, FieldKind::ArrayOfCompact, value, |output, item| {
            let id = serializer.schema_for(item)?.schema_id();
            check_single_schema(name, &mut schema_id, id)?;
            serializer.write_object(output, item, depth + 1)
        })
    }

    fn write_array_of_generic_record(
        &mut self,
        name: &str,
        value: Option<&[Option<GenericRecord>]>,
    ) -> Result<()> {
        let serializer = self.serializer;
        let depth = self.depth;
        let mut schema_id = None;
        self.write_variable_array(name, FieldKind::ArrayOfCompact, value, |output, record| {
            check_single_schema(name, &mut schema_id, record.schema_id())?;
            serializer.write_generic_object(output, record, depth + 1)
        })
    }

    nullable_fields! {
        write_nullable_boolean(bool) => NullableBoolean, write_bool;
        write_nullable_int8(i8) => NullableInt8, write_byte;
        write_nullable_int16(i16) => NullableInt16, write_short;
        write_nullable_int32(i32) => NullableInt32, write_int;
        write_nullable_int64(i64) => NullableInt64, write_long;
        write_nullable_float32(f32) => NullableFloat32, write_float;
        write_nullable_float64(f64) => NullableFloat64, write_double;
    }

    fn write_array_of_nullable_boolean(
        &mut self,
        name: &str,
        value: Option<&[Option<bool>]>,
    ) -> Result<()> {
        self.write_variable(
            name,
            FieldKind::ArrayOfNullableBoolean,
            value,
            |_, output, items, _| arrays::write_nullable_booleans(output, items),
        )
    }

    nullable_array_fields! {
        write_array_of_nullable_int8(i8) => ArrayOfNullableInt8, write_byte;
        write_array_of_nullable_int16(i16) => ArrayOfNullableInt16, write_short;
        write_array_of_nullable_int32(i32) => ArrayOfNullableInt32, write_int;
        write_array_of_nullable_int64(i64) => ArrayOfNullableInt64, write_long;
        write_array_of_nullable_float32(f32) => ArrayOfNullableFloat32, write_float;
        write_array_of_nullable_float64(f64) => ArrayOfNullableFloat64, write_double;
    }
}

fn check_single_schema(name: &str, expected: &mut Option<i64>, schema_id: i64) -> Result<()> {
    match *expected {
        Some(id) if id != schema_id => Err(CompactError::InvalidValue {
            field: name.to_string(),
            message: format!(
                "items of an array of compact must share one schema, found {} and {}",
                id, schema_id
            ),
        }),
        Some(_) => Ok(()),
        None => {
            *expected = Some(schema_id);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::compact::SchemaWriter;

    fn schema(build: impl FnOnce(&mut SchemaWriter) -> Result<()>) -> Schema {
        let mut writer = SchemaWriter::new("T");
        build(&mut writer).unwrap();
        writer.build().unwrap()
    }

    #[test]
    fn test_fixed_only_record_has_no_length_prefix() {
        let serializer = CompactSerializer::new();
        let schema = schema(|w| {
            w.write_int32("a", 0)?;
            w.write_boolean("b", false)
        });
        let mut output = ObjectDataOutput::new();
        let mut writer = DefaultCompactWriter::new(&serializer, &mut output, &schema, 0).unwrap();
        writer.write_boolean("b", true).unwrap();
        writer.write_int32("a", 0x01020304).unwrap();
        writer.end().unwrap();
        assert_eq!(output.as_bytes(), &[4, 3, 2, 1, 1]);
    }

    #[test]
    fn test_variable_fields_layout() {
        let serializer = CompactSerializer::new();
        let schema = schema(|w| {
            w.write_int8("n", 0)?;
            w.write_string("s", None)?;
            w.write_string("t", None)
        });
        let mut output = ObjectDataOutput::new();
        let mut writer = DefaultCompactWriter::new(&serializer, &mut output, &schema, 0).unwrap();
        writer.write_string("t", Some("x")).unwrap();
        writer.write_string("s", None).unwrap();
        writer.write_int8("n", 7).unwrap();
        writer.end().unwrap();

        // length(6) | n=7 | "x" at 1 | offsets: s=null, t=1
        assert_eq!(
            output.as_bytes(),
            &[6, 0, 0, 0, 7, 1, 0, 0, 0, b'x', 0xFF, 1]
        );
    }

    #[test]
    fn test_unknown_field() {
        let serializer = CompactSerializer::new();
        let schema = schema(|w| w.write_int32("a", 0));
        let mut output = ObjectDataOutput::new();
        let mut writer = DefaultCompactWriter::new(&serializer, &mut output, &schema, 0).unwrap();
        let err = writer.write_int32("b", 1).unwrap_err();
        assert!(matches!(err, CompactError::UnknownField { ref field, .. } if field == "b"));
    }

    #[test]
    fn test_kind_mismatch() {
        let serializer = CompactSerializer::new();
        let schema = schema(|w| w.write_int32("a", 0));
        let mut output = ObjectDataOutput::new();
        let mut writer = DefaultCompactWriter::new(&serializer, &mut output, &schema, 0).unwrap();
        let err = writer.write_int64("a", 1).unwrap_err();
        assert!(matches!(
            err,
            CompactError::FieldKindMismatch {
                expected: FieldKind::Int64,
                actual: FieldKind::Int32,
                ..
            }
        ));
    }

    #[test]
    fn test_field_written_twice() {
        let serializer = CompactSerializer::new();
        let schema = schema(|w| w.write_int32("a", 0));
        let mut output = ObjectDataOutput::new();
        let mut writer = DefaultCompactWriter::new(&serializer, &mut output, &schema, 0).unwrap();
        writer.write_int32("a", 1).unwrap();
        assert!(writer.write_int32("a", 2).is_err());
    }

    #[test]
    fn test_missing_field_fails_end() {
        let serializer = CompactSerializer::new();
        let schema = schema(|w| {
            w.write_int32("a", 0)?;
            w.write_string("s", None)
        });
        let mut output = ObjectDataOutput::new();
        let mut writer = DefaultCompactWriter::new(&serializer, &mut output, &schema, 0).unwrap();
        writer.write_int32("a", 1).unwrap();
        assert!(writer.end().is_err());
    }

    #[test]
    fn test_leap_second_rejected() {
        let serializer = CompactSerializer::new();
        let schema = schema(|w| w.write_time("t", None));
        let mut output = ObjectDataOutput::new();
        let mut writer = DefaultCompactWriter::new(&serializer, &mut output, &schema, 0).unwrap();
        let leap = NaiveTime::from_hms_nano_opt(23, 59, 59, 1_500_000_000).unwrap();
        assert!(writer.write_time("t", Some(leap)).is_err());
    }

    #[test]
    fn test_single_schema_check() {
        let mut expected = None;
        check_single_schema("a", &mut expected, 1).unwrap();
        check_single_schema("a", &mut expected, 1).unwrap();
        assert!(check_single_schema("a", &mut expected, 2).is_err());
    }
}
