//! Decoding of one Compact record against the schema it was written with.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

use crate::error::{CompactError, Result};
use crate::serialization::{DataInput, ObjectDataInput};

use super::arrays;
use super::field_operations;
use super::offsets::{OffsetWidth, NULL_OFFSET};
use super::values;
use super::{
    Compact, CompactReader, CompactSerializer, FieldDescriptor, FieldKind, GenericRecord, Schema,
};

/// Reads the fields of one record by name.
///
/// Construction reads the data length, locates the offset table and leaves
/// the input positioned after the record. Fixed-width fields are read in
/// place; variable-size fields are read by seeking to their offset, and the
/// cursor is restored afterwards, so fields can be read in any order and any
/// number of times.
#[derive(Debug)]
pub struct DefaultCompactReader<'r, 'a> {
    serializer: &'r CompactSerializer,
    input: &'r mut ObjectDataInput<'a>,
    schema: &'r Arc<Schema>,
    data_start_position: usize,
    offsets_position: usize,
    offset_width: OffsetWidth,
    depth: usize,
}

impl<'r, 'a> DefaultCompactReader<'r, 'a> {
    /// Starts reading a record at the cursor of `input`.
    pub fn new(
        serializer: &'r CompactSerializer,
        input: &'r mut ObjectDataInput<'a>,
        schema: &'r Arc<Schema>,
        depth: usize,
    ) -> Result<Self> {
        let var_fields = schema.number_var_size_fields();
        let (data_start_position, offsets_position, offset_width, end) = if var_fields > 0 {
            let data_length = arrays::read_count(input)?;
            let data_start = input.position();
            let offsets_position = data_start.checked_add(data_length).ok_or_else(|| {
                CompactError::Serialization(format!("invalid data length {}", data_length))
            })?;
            let width = OffsetWidth::for_data_length(data_length);
            let end = offsets_position + var_fields * width.size();
            (data_start, offsets_position, width, end)
        } else {
            let data_start = input.position();
            let end = data_start + schema.fixed_size_fields_length();
            (data_start, end, OffsetWidth::Byte, end)
        };
        input.set_position(end)?;

        Ok(Self {
            serializer,
            input,
            schema,
            data_start_position,
            offsets_position,
            offset_width,
            depth,
        })
    }

    /// Decodes every field into a generic record.
    pub fn to_generic_record(&mut self) -> Result<GenericRecord> {
        let schema: &'r Arc<Schema> = self.schema;
        let values = schema
            .fields()
            .iter()
            .map(|field| field_operations::read_field(&mut *self, field))
            .collect::<Result<Vec<_>>>()?;
        GenericRecord::from_parts(Arc::clone(schema), values)
    }

    /// Resolves `name`, accepting any of `kinds`; the first entry is reported
    /// as the expected kind on mismatch.
    fn descriptor(&self, name: &str, kinds: &[FieldKind]) -> Result<&'r FieldDescriptor> {
        let schema: &'r Schema = self.schema;
        let field = schema.field(name).ok_or_else(|| CompactError::UnknownField {
            field: name.to_string(),
            type_name: schema.type_name().to_string(),
        })?;
        if kinds.contains(&field.kind()) {
            Ok(field)
        } else {
            Err(CompactError::FieldKindMismatch {
                field: name.to_string(),
                expected: kinds[0],
                actual: field.kind(),
            })
        }
    }

    /// Descriptor of a field that must have exactly `kind`.
    fn exact(&self, name: &str, kind: FieldKind) -> Result<&'r FieldDescriptor> {
        self.descriptor(name, &[kind])
    }

    /// Descriptor of a primitive field or array, also accepting the nullable counterpart.
    fn with_nullable(&self, name: &str, kind: FieldKind) -> Result<&'r FieldDescriptor> {
        match kind.nullable_counterpart() {
            Some(other) => self.descriptor(name, &[kind, other]),
            None => self.exact(name, kind),
        }
    }

    fn fixed_position(&self, field: &FieldDescriptor) -> usize {
        self.data_start_position + field.offset() as usize
    }

    /// Reads a variable-size field, `None` if it is null.
    fn read_variable<T>(
        &mut self,
        field: &FieldDescriptor,
        decode: impl FnOnce(&CompactSerializer, &mut ObjectDataInput<'a>, usize) -> Result<T>,
    ) -> Result<Option<T>> {
        let offset =
            self.offset_width
                .read_entry(self.input, self.offsets_position, field.index() as usize)?;
        if offset == NULL_OFFSET {
            return Ok(None);
        }
        let saved = self.input.position();
        self.input
            .set_position(self.data_start_position + offset as usize)?;
        let value = decode(self.serializer, self.input, self.depth);
        self.input.set_position(saved)?;
        value.map(Some)
    }

    /// Reads a primitive through its fixed slot, or through the variable
    /// region when the field was declared with the nullable kind.
    fn read_primitive<T>(
        &mut self,
        name: &str,
        kind: FieldKind,
        method: &'static str,
        at: impl FnOnce(&ObjectDataInput<'a>, usize) -> Result<T>,
        read: impl FnOnce(&mut ObjectDataInput<'a>) -> Result<T>,
    ) -> Result<T> {
        let field = self.with_nullable(name, kind)?;
        if field.kind() == kind {
            return at(self.input, self.fixed_position(field));
        }
        self.read_variable(field, |_, input, _| read(input))?
            .ok_or_else(|| CompactError::UnexpectedNull {
                field: name.to_string(),
                method,
            })
    }

    /// Reads a nullable primitive, also from a field declared with the plain kind.
    fn read_nullable<T>(
        &mut self,
        name: &str,
        kind: FieldKind,
        at: impl FnOnce(&ObjectDataInput<'a>, usize) -> Result<T>,
        read: impl FnOnce(&mut ObjectDataInput<'a>) -> Result<T>,
    ) -> Result<Option<T>> {
        let field = self.with_nullable(name, kind)?;
        if field.kind() == kind {
            return self.read_variable(field, |_, input, _| read(input));
        }
        at(self.input, self.fixed_position(field)).map(Some)
    }

    /// Reads an array of primitives, also from a field declared as an array of
    /// the nullable kind, failing on null items.
    fn read_primitive_array<T>(
        &mut self,
        name: &str,
        kind: FieldKind,
        method: &'static str,
        read: impl FnOnce(&mut ObjectDataInput<'a>) -> Result<Vec<T>>,
        read_nullable: impl FnOnce(&mut ObjectDataInput<'a>) -> Result<Vec<Option<T>>>,
    ) -> Result<Option<Vec<T>>> {
        let field = self.with_nullable(name, kind)?;
        if field.kind() == kind {
            return self.read_variable(field, |_, input, _| read(input));
        }
        match self.read_variable(field, |_, input, _| read_nullable(input))? {
            None => Ok(None),
            Some(items) => items
                .into_iter()
                .collect::<Option<Vec<T>>>()
                .map(Some)
                .ok_or_else(|| CompactError::UnexpectedNullInArray {
                    field: name.to_string(),
                    method,
                }),
        }
    }

    /// Reads an array of nullable primitives, also from a field declared as an
    /// array of the plain kind.
    fn read_nullable_array<T>(
        &mut self,
        name: &str,
        kind: FieldKind,
        read: impl FnOnce(&mut ObjectDataInput<'a>) -> Result<Vec<T>>,
        read_nullable: impl FnOnce(&mut ObjectDataInput<'a>) -> Result<Vec<Option<T>>>,
    ) -> Result<Option<Vec<Option<T>>>> {
        let field = self.with_nullable(name, kind)?;
        if field.kind() == kind {
            return self.read_variable(field, |_, input, _| read_nullable(input));
        }
        let items = self.read_variable(field, |_, input, _| read(input))?;
        Ok(items.map(|items| items.into_iter().map(Some).collect()))
    }

    fn read_reference<T>(
        &mut self,
        name: &str,
        kind: FieldKind,
        decode: impl FnOnce(&CompactSerializer, &mut ObjectDataInput<'a>, usize) -> Result<T>,
    ) -> Result<Option<T>> {
        let field = self.exact(name, kind)?;
        self.read_variable(field, decode)
    }

    fn read_reference_array<T>(
        &mut self,
        name: &str,
        kind: FieldKind,
        mut decode: impl FnMut(&CompactSerializer, &mut ObjectDataInput<'a>, usize) -> Result<T>,
    ) -> Result<Option<Vec<Option<T>>>> {
        let field = self.exact(name, kind)?;
        self.read_variable(field, |serializer, input, depth| {
            arrays::read_variable_items(input, |input| decode(serializer, input, depth))
        })
    }
}

macro_rules! primitive_fields {
    ($($method:ident -> $ty:ty => $kind:ident, $at:ident, $read:ident;)*) => {
        $(
            fn $method(&mut self, name: &str) -> Result<$ty> {
                self.read_primitive(
                    name,
                    FieldKind::$kind,
                    stringify!($method),
                    |input, position| input.$at(position),
                    |input| input.$read(),
                )
            }
        )*
    };
}

macro_rules! nullable_fields {
    ($($method:ident -> $ty:ty => $kind:ident, $at:ident, $read:ident;)*) => {
        $(
            fn $method(&mut self, name: &str) -> Result<Option<$ty>> {
                self.read_nullable(
                    name,
                    FieldKind::$kind,
                    |input, position| input.$at(position),
                    |input| input.$read(),
                )
            }
        )*
    };
}

macro_rules! primitive_array_fields {
    ($($method:ident -> $ty:ty => $kind:ident, $size:expr, $read:ident;)*) => {
        $(
            fn $method(&mut self, name: &str) -> Result<Option<Vec<$ty>>> {
                self.read_primitive_array(
                    name,
                    FieldKind::$kind,
                    stringify!($method),
                    |input| arrays::read_fixed_items(input, $size, |i| i.$read()),
                    |input| arrays::read_nullable_items(input, $size, |i| i.$read()),
                )
            }
        )*
    };
}

macro_rules! nullable_array_fields {
    ($($method:ident -> $ty:ty => $kind:ident, $size:expr, $read:ident;)*) => {
        $(
            fn $method(&mut self, name: &str) -> Result<Option<Vec<Option<$ty>>>> {
                self.read_nullable_array(
                    name,
                    FieldKind::$kind,
                    |input| arrays::read_fixed_items(input, $size, |i| i.$read()),
                    |input| arrays::read_nullable_items(input, $size, |i| i.$read()),
                )
            }
        )*
    };
}

macro_rules! variable_array_fields {
    ($($method:ident -> $ty:ty => $kind:ident, $read:path;)*) => {
        $(
            fn $method(&mut self, name: &str) -> Result<Option<Vec<Option<$ty>>>> {
                self.read_reference_array(name, FieldKind::$kind, |_, input, _| $read(input))
            }
        )*
    };
}

impl CompactReader for DefaultCompactReader<'_, '_> {
    fn schema(&self) -> &Schema {
        self.schema
    }

    fn get_field_kind(&self, name: &str) -> Option<FieldKind> {
        self.schema.field(name).map(FieldDescriptor::kind)
    }

    fn read_boolean(&mut self, name: &str) -> Result<bool> {
        let field = self.with_nullable(name, FieldKind::Boolean)?;
        if field.kind() == FieldKind::Boolean {
            let position = self.fixed_position(field);
            return self
                .input
                .read_bool_bit_at(position, field.bit_offset() as u8);
        }
        self.read_variable(field, |_, input, _| input.read_bool())?
            .ok_or_else(|| CompactError::UnexpectedNull {
                field: name.to_string(),
                method: "read_boolean",
            })
    }

    primitive_fields! {
        read_int8 -> i8 => Int8, read_byte_at, read_byte;
        read_int16 -> i16 => Int16, read_short_at, read_short;
        read_int32 -> i32 => Int32, read_int_at, read_int;
        read_int64 -> i64 => Int64, read_long_at, read_long;
        read_float32 -> f32 => Float32, read_float_at, read_float;
        read_float64 -> f64 => Float64, read_double_at, read_double;
    }

    fn read_string(&mut self, name: &str) -> Result<Option<String>> {
        self.read_reference(name, FieldKind::String, |_, input, _| input.read_string())
    }

    fn read_decimal(&mut self, name: &str) -> Result<Option<Decimal>> {
        self.read_reference(name, FieldKind::Decimal, |_, input, _| values::read_decimal(input))
    }

    fn read_time(&mut self, name: &str) -> Result<Option<NaiveTime>> {
        self.read_reference(name, FieldKind::Time, |_, input, _| values::read_time(input))
    }

    fn read_date(&mut self, name: &str) -> Result<Option<NaiveDate>> {
        self.read_reference(name, FieldKind::Date, |_, input, _| values::read_date(input))
    }

    fn read_timestamp(&mut self, name: &str) -> Result<Option<NaiveDateTime>> {
        self.read_reference(name, FieldKind::Timestamp, |_, input, _| {
            values::read_timestamp(input)
        })
    }

    fn read_timestamp_with_timezone(&mut self, name: &str) -> Result<Option<DateTime<FixedOffset>>> {
        self.read_reference(name, FieldKind::TimestampWithTimezone, |_, input, _| {
            values::read_timestamp_with_timezone(input)
        })
    }

    fn read_compact<T: Compact>(&mut self, name: &str) -> Result<Option<T>> {
        self.read_reference(name, FieldKind::Compact, |serializer, input, depth| {
            serializer.read_object(input, depth + 1)
        })
    }

    fn read_generic_record(&mut self, name: &str) -> Result<Option<GenericRecord>> {
        self.read_reference(name, FieldKind::Compact, |serializer, input, depth| {
            serializer.read_generic_object(input, depth + 1)
        })
    }

    fn read_array_of_boolean(&mut self, name: &str) -> Result<Option<Vec<bool>>> {
        self.read_primitive_array(
            name,
            FieldKind::ArrayOfBoolean,
            "read_array_of_boolean",
            |input| arrays::read_boolean_bits(input),
            |input| arrays::read_nullable_booleans(input),
        )
    }

    primitive_array_fields! {
        read_array_of_int8 -> i8 => ArrayOfInt8, 1, read_byte;
        read_array_of_int16 -> i16 => ArrayOfInt16, 2, read_short;
        read_array_of_int32 -> i32 => ArrayOfInt32, 4, read_int;
        read_array_of_int64 -> i64 => ArrayOfInt64, 8, read_long;
        read_array_of_float32 -> f32 => ArrayOfFloat32, 4, read_float;
        read_array_of_float64 -> f64 => ArrayOfFloat64, 8, read_double;
    }

    fn read_array_of_string(&mut self, name: &str) -> Result<Option<Vec<Option<String>>>> {
        self.read_reference_array(name, FieldKind::ArrayOfString, |_, input, _| input.read_string())
    }

    variable_array_fields! {
        read_array_of_decimal -> Decimal => ArrayOfDecimal, values::read_decimal;
        read_array_of_time -> NaiveTime => ArrayOfTime, values::read_time;
        read_array_of_date -> NaiveDate => ArrayOfDate, values::read_date;
        read_array_of_timestamp -> NaiveDateTime => ArrayOfTimestamp, values::read_timestamp;
        read_array_of_timestamp_with_timezone -> DateTime<FixedOffset> => ArrayOfTimestampWithTimezone, values::read_timestamp_with_timezone;
    }

    fn read_array_of_compact<T: Compact>(&mut self, name: &str) -> Result<Option<Vec<Option<T>>>> {
        self.read_reference_array(name, FieldKind::ArrayOfCompact, |serializer, input, depth| {
            serializer.read_object(input, depth + 1)
        })
    }

    fn read_array_of_generic_record(
        &mut self,
        name: &str,
    ) -> Result<Option<Vec<Option<GenericRecord>>>> {
        self.read_reference_array(name, FieldKind::ArrayOfCompact, |serializer, input, depth| {
            serializer.read_generic_object(input, depth + 1)
        })
    }

    fn read_nullable_boolean(&mut self, name: &str) -> Result<Option<bool>> {
        let field = self.with_nullable(name, FieldKind::NullableBoolean)?;
        if field.kind() == FieldKind::NullableBoolean {
            return self.read_variable(field, |_, input, _| input.read_bool());
        }
        let position = self.fixed_position(field);
        self.input
            .read_bool_bit_at(position, field.bit_offset() as u8)
            .map(Some)
    }

    nullable_fields! {
        read_nullable_int8 -> i8 => NullableInt8, read_byte_at, read_byte;
        read_nullable_int16 -> i16 => NullableInt16, read_short_at, read_short;
        read_nullable_int32 -> i32 => NullableInt32, read_int_at, read_int;
        read_nullable_int64 -> i64 => NullableInt64, read_long_at, read_long;
        read_nullable_float32 -> f32 => NullableFloat32, read_float_at, read_float;
        read_nullable_float64 -> f64 => NullableFloat64, read_double_at, read_double;
    }

    fn read_array_of_nullable_boolean(&mut self, name: &str) -> Result<Option<Vec<Option<bool>>>> {
        self.read_nullable_array(
            name,
            FieldKind::ArrayOfNullableBoolean,
            |input| arrays::read_boolean_bits(input),
            |input| arrays::read_nullable_booleans(input),
        )
    }

    nullable_array_fields! {
        read_array_of_nullable_int8 -> i8 => ArrayOfNullableInt8, 1, read_byte;
        read_array_of_nullable_int16 -> i16 => ArrayOfNullableInt16, 2, read_short;
        read_array_of_nullable_int32 -> i32 => ArrayOfNullableInt32, 4, read_int;
        read_array_of_nullable_int64 -> i64 => ArrayOfNullableInt64, 8, read_long;
        read_array_of_nullable_float32 -> f32 => ArrayOfNullableFloat32, 4, read_float;
        read_array_of_nullable_float64 -> f64 => ArrayOfNullableFloat64, 8, read_double;
    }
}
