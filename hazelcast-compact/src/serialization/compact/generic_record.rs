//! GenericRecord for schema-driven access to Compact data without the concrete type.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::error::{CompactError, Result};

use super::{validate_field, FieldDescriptor, FieldKind, FieldValue, Schema};

/// A Compact record held as a schema plus one value per field.
///
/// `GenericRecord` allows reading and building Compact data without a Rust
/// type for it. This is useful for:
/// - Generic data processing pipelines
/// - Data inspection and debugging
/// - Handling data written by other applications with evolving schemas
///
/// Values are stored in schema field order and have all passed
/// [`validate_field`].
#[derive(Debug, Clone, PartialEq)]
pub struct GenericRecord {
    schema: Arc<Schema>,
    values: Vec<FieldValue>,
}

fn mismatch(name: &str, requested: FieldKind, found: &FieldValue) -> CompactError {
    CompactError::FieldKindMismatch {
        field: name.to_string(),
        expected: requested,
        actual: found.kind(),
    }
}

fn unexpected_null(name: &str, method: &'static str) -> CompactError {
    CompactError::UnexpectedNull {
        field: name.to_string(),
        method,
    }
}

fn without_nulls<T: Copy>(name: &str, method: &'static str, items: &[Option<T>]) -> Result<Vec<T>> {
    items
        .iter()
        .copied()
        .collect::<Option<Vec<T>>>()
        .ok_or_else(|| CompactError::UnexpectedNullInArray {
            field: name.to_string(),
            method,
        })
}

macro_rules! primitive_getters {
    ($($method:ident -> $ty:ty => $variant:ident, $nullable:ident;)*) => {
        $(
            #[doc = concat!("Returns a `", stringify!($ty), "` field, also accepting the nullable kind.")]
            pub fn $method(&self, name: &str) -> Result<$ty> {
                match self.get(name)? {
                    FieldValue::$variant(v) => Ok(*v),
                    FieldValue::$nullable(v) => v.ok_or_else(|| unexpected_null(name, stringify!($method))),
                    other => Err(mismatch(name, FieldKind::$variant, other)),
                }
            }
        )*
    };
}

macro_rules! nullable_getters {
    ($($method:ident -> $ty:ty => $nullable:ident, $variant:ident;)*) => {
        $(
            #[doc = concat!("Returns a nullable `", stringify!($ty), "` field, also accepting the plain kind.")]
            pub fn $method(&self, name: &str) -> Result<Option<$ty>> {
                match self.get(name)? {
                    FieldValue::$nullable(v) => Ok(*v),
                    FieldValue::$variant(v) => Ok(Some(*v)),
                    other => Err(mismatch(name, FieldKind::$nullable, other)),
                }
            }
        )*
    };
}

macro_rules! primitive_array_getters {
    ($($method:ident -> $ty:ty => $variant:ident, $nullable:ident;)*) => {
        $(
            #[doc = concat!("Returns an array of `", stringify!($ty), "`, failing on null items of a nullable array.")]
            pub fn $method(&self, name: &str) -> Result<Option<Vec<$ty>>> {
                match self.get(name)? {
                    FieldValue::$variant(v) => Ok(v.clone()),
                    FieldValue::$nullable(v) => v
                        .as_deref()
                        .map(|items| without_nulls(name, stringify!($method), items))
                        .transpose(),
                    other => Err(mismatch(name, FieldKind::$variant, other)),
                }
            }
        )*
    };
}

macro_rules! nullable_array_getters {
    ($($method:ident -> $ty:ty => $nullable:ident, $variant:ident;)*) => {
        $(
            #[doc = concat!("Returns an array of nullable `", stringify!($ty), "`, also accepting the plain array kind.")]
            pub fn $method(&self, name: &str) -> Result<Option<Vec<Option<$ty>>>> {
                match self.get(name)? {
                    FieldValue::$nullable(v) => Ok(v.clone()),
                    FieldValue::$variant(v) => {
                        Ok(v.as_ref().map(|items| items.iter().copied().map(Some).collect()))
                    }
                    other => Err(mismatch(name, FieldKind::$nullable, other)),
                }
            }
        )*
    };
}

macro_rules! reference_getters {
    ($($method:ident -> $ty:ty => $variant:ident;)*) => {
        $(
            #[doc = concat!("Returns a `", stringify!($variant), "` field.")]
            pub fn $method(&self, name: &str) -> Result<$ty> {
                match self.get(name)? {
                    FieldValue::$variant(v) => Ok(v.clone()),
                    other => Err(mismatch(name, FieldKind::$variant, other)),
                }
            }
        )*
    };
}

impl GenericRecord {
    /// Assembles a record from values in schema field order, validating each.
    pub(crate) fn from_parts(schema: Arc<Schema>, values: Vec<FieldValue>) -> Result<Self> {
        if values.len() != schema.field_count() {
            return Err(CompactError::Serialization(format!(
                "schema '{}' has {} fields, got {} values",
                schema.type_name(),
                schema.field_count(),
                values.len()
            )));
        }
        for (field, value) in schema.fields().iter().zip(&values) {
            validate_field(field.name(), field.kind(), value)?;
        }
        Ok(Self { schema, values })
    }

    /// Returns the schema of this record.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Returns the type name of this record.
    pub fn type_name(&self) -> &str {
        self.schema.type_name()
    }

    /// Returns the schema ID of this record.
    pub fn schema_id(&self) -> i64 {
        self.schema.schema_id()
    }

    /// Returns true if this record has a field with the given name.
    pub fn has_field(&self, name: &str) -> bool {
        self.schema.has_field(name)
    }

    /// Returns the field kind for the given field name, if it exists.
    pub fn get_field_kind(&self, name: &str) -> Option<FieldKind> {
        self.schema.field(name).map(FieldDescriptor::kind)
    }

    /// Returns an iterator over all field names, in schema order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.schema.fields().iter().map(FieldDescriptor::name)
    }

    /// Returns the number of fields in this record.
    pub fn field_count(&self) -> usize {
        self.values.len()
    }

    /// Returns the fields paired with their values, in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldDescriptor, &FieldValue)> {
        self.schema.fields().iter().zip(&self.values)
    }

    /// Returns the raw value of a field.
    pub fn get(&self, name: &str) -> Result<&FieldValue> {
        self.schema
            .position_of(name)
            .map(|position| &self.values[position])
            .ok_or_else(|| CompactError::UnknownField {
                field: name.to_string(),
                type_name: self.schema.type_name().to_string(),
            })
    }

    primitive_getters! {
        get_boolean -> bool => Boolean, NullableBoolean;
        get_int8 -> i8 => Int8, NullableInt8;
        get_int16 -> i16 => Int16, NullableInt16;
        get_int32 -> i32 => Int32, NullableInt32;
        get_int64 -> i64 => Int64, NullableInt64;
        get_float32 -> f32 => Float32, NullableFloat32;
        get_float64 -> f64 => Float64, NullableFloat64;
    }

    nullable_getters! {
        get_nullable_boolean -> bool => NullableBoolean, Boolean;
        get_nullable_int8 -> i8 => NullableInt8, Int8;
        get_nullable_int16 -> i16 => NullableInt16, Int16;
        get_nullable_int32 -> i32 => NullableInt32, Int32;
        get_nullable_int64 -> i64 => NullableInt64, Int64;
        get_nullable_float32 -> f32 => NullableFloat32, Float32;
        get_nullable_float64 -> f64 => NullableFloat64, Float64;
    }

    primitive_array_getters! {
        get_array_of_boolean -> bool => ArrayOfBoolean, ArrayOfNullableBoolean;
        get_array_of_int8 -> i8 => ArrayOfInt8, ArrayOfNullableInt8;
        get_array_of_int16 -> i16 => ArrayOfInt16, ArrayOfNullableInt16;
        get_array_of_int32 -> i32 => ArrayOfInt32, ArrayOfNullableInt32;
        get_array_of_int64 -> i64 => ArrayOfInt64, ArrayOfNullableInt64;
        get_array_of_float32 -> f32 => ArrayOfFloat32, ArrayOfNullableFloat32;
        get_array_of_float64 -> f64 => ArrayOfFloat64, ArrayOfNullableFloat64;
    }

    nullable_array_getters! {
        get_array_of_nullable_boolean -> bool => ArrayOfNullableBoolean, ArrayOfBoolean;
        get_array_of_nullable_int8 -> i8 => ArrayOfNullableInt8, ArrayOfInt8;
        get_array_of_nullable_int16 -> i16 => ArrayOfNullableInt16, ArrayOfInt16;
        get_array_of_nullable_int32 -> i32 => ArrayOfNullableInt32, ArrayOfInt32;
        get_array_of_nullable_int64 -> i64 => ArrayOfNullableInt64, ArrayOfInt64;
        get_array_of_nullable_float32 -> f32 => ArrayOfNullableFloat32, ArrayOfFloat32;
        get_array_of_nullable_float64 -> f64 => ArrayOfNullableFloat64, ArrayOfFloat64;
    }

    reference_getters! {
        get_string -> Option<String> => String;
        get_decimal -> Option<Decimal> => Decimal;
        get_time -> Option<NaiveTime> => Time;
        get_date -> Option<NaiveDate> => Date;
        get_timestamp -> Option<NaiveDateTime> => Timestamp;
        get_timestamp_with_timezone -> Option<DateTime<FixedOffset>> => TimestampWithTimezone;
        get_generic_record -> Option<GenericRecord> => Compact;
        get_array_of_string -> Option<Vec<Option<String>>> => ArrayOfString;
        get_array_of_decimal -> Option<Vec<Option<Decimal>>> => ArrayOfDecimal;
        get_array_of_time -> Option<Vec<Option<NaiveTime>>> => ArrayOfTime;
        get_array_of_date -> Option<Vec<Option<NaiveDate>>> => ArrayOfDate;
        get_array_of_timestamp -> Option<Vec<Option<NaiveDateTime>>> => ArrayOfTimestamp;
        get_array_of_timestamp_with_timezone -> Option<Vec<Option<DateTime<FixedOffset>>>> => ArrayOfTimestampWithTimezone;
        get_array_of_generic_record -> Option<Vec<Option<GenericRecord>>> => ArrayOfCompact;
    }

    /// Returns a builder for a new record with the same schema.
    pub fn new_builder(&self) -> GenericRecordBuilder {
        GenericRecordBuilder::with_schema(Arc::clone(&self.schema))
    }

    /// Returns a builder prefilled with this record's values; each field may
    /// be overwritten once.
    pub fn new_builder_with_clone(&self) -> GenericRecordBuilder {
        GenericRecordBuilder {
            target: Target::Clone(self.clone()),
            values: HashMap::new(),
            error: None,
        }
    }

    /// Returns a copy of this record with the given fields replaced.
    pub fn clone_with<'n>(
        &self,
        updates: impl IntoIterator<Item = (&'n str, FieldValue)>,
    ) -> Result<GenericRecord> {
        updates
            .into_iter()
            .fold(self.new_builder_with_clone(), |builder, (name, value)| {
                builder.set(name, value)
            })
            .build()
    }

    /// Renders the record as `{type_name: {field: value, ...}}`.
    pub fn to_json(&self) -> Value {
        let mut root = Map::new();
        root.insert(self.type_name().to_string(), self.fields_to_json());
        Value::Object(root)
    }

    /// Renders the fields of the record as a JSON object.
    pub fn fields_to_json(&self) -> Value {
        self.iter()
            .map(|(field, value)| (field.name().to_string(), value.to_json()))
            .collect::<Map<_, _>>()
            .into()
    }
}

impl fmt::Display for GenericRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

#[derive(Debug)]
enum Target {
    /// Schema derived from the fields set.
    Compact(String),
    /// Every field of the schema must be set.
    Schema(Arc<Schema>),
    /// Unset fields keep the values of the record.
    Clone(GenericRecord),
}

/// Builder for [`GenericRecord`]s.
///
/// Setters consume and return the builder so calls can be chained; the first
/// error encountered is reported by [`build`](Self::build).
#[derive(Debug)]
pub struct GenericRecordBuilder {
    target: Target,
    values: HashMap<String, FieldValue>,
    error: Option<CompactError>,
}

macro_rules! copy_setters {
    ($($method:ident($ty:ty) => $variant:ident;)*) => {
        $(
            #[doc = concat!("Sets a `", stringify!($variant), "` field.")]
            pub fn $method(self, name: &str, value: $ty) -> Self {
                self.set(name, FieldValue::$variant(value))
            }
        )*
    };
}

impl GenericRecordBuilder {
    /// Creates a builder whose schema is derived from the fields set on it.
    pub fn compact(type_name: impl Into<String>) -> Self {
        Self {
            target: Target::Compact(type_name.into()),
            values: HashMap::new(),
            error: None,
        }
    }

    /// Creates a builder for a known schema; every field must be set.
    pub fn with_schema(schema: Arc<Schema>) -> Self {
        Self {
            target: Target::Schema(schema),
            values: HashMap::new(),
            error: None,
        }
    }

    /// Sets a field to `value`.
    ///
    /// Fails (at [`build`](Self::build)) if the field was already set, or, for
    /// a builder with a schema, if the schema lacks the field or declares it
    /// with another kind.
    pub fn set(mut self, name: &str, value: FieldValue) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.try_set(name, value) {
                self.error = Some(e);
            }
        }
        self
    }

    fn try_set(&mut self, name: &str, value: FieldValue) -> Result<()> {
        let kind = match &self.target {
            Target::Compact(_) => value.kind(),
            Target::Schema(schema) => declared_kind(schema, name)?,
            Target::Clone(record) => declared_kind(record.schema(), name)?,
        };
        validate_field(name, kind, &value)?;
        if self.values.contains_key(name) {
            return Err(CompactError::Serialization(format!(
                "field '{}' cannot be set more than once",
                name
            )));
        }
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    copy_setters! {
        set_boolean(bool) => Boolean;
        set_int8(i8) => Int8;
        set_int16(i16) => Int16;
        set_int32(i32) => Int32;
        set_int64(i64) => Int64;
        set_float32(f32) => Float32;
        set_float64(f64) => Float64;
        set_decimal(Option<Decimal>) => Decimal;
        set_time(Option<NaiveTime>) => Time;
        set_date(Option<NaiveDate>) => Date;
        set_timestamp(Option<NaiveDateTime>) => Timestamp;
        set_timestamp_with_timezone(Option<DateTime<FixedOffset>>) => TimestampWithTimezone;
        set_generic_record(Option<GenericRecord>) => Compact;
        set_nullable_boolean(Option<bool>) => NullableBoolean;
        set_nullable_int8(Option<i8>) => NullableInt8;
        set_nullable_int16(Option<i16>) => NullableInt16;
        set_nullable_int32(Option<i32>) => NullableInt32;
        set_nullable_int64(Option<i64>) => NullableInt64;
        set_nullable_float32(Option<f32>) => NullableFloat32;
        set_nullable_float64(Option<f64>) => NullableFloat64;
        set_array_of_boolean(Option<Vec<bool>>) => ArrayOfBoolean;
        set_array_of_int8(Option<Vec<i8>>) => ArrayOfInt8;
        set_array_of_int16(Option<Vec<i16>>) => ArrayOfInt16;
        set_array_of_int32(Option<Vec<i32>>) => ArrayOfInt32;
        set_array_of_int64(Option<Vec<i64>>) => ArrayOfInt64;
        set_array_of_float32(Option<Vec<f32>>) => ArrayOfFloat32;
        set_array_of_float64(Option<Vec<f64>>) => ArrayOfFloat64;
        set_array_of_string(Option<Vec<Option<String>>>) => ArrayOfString;
        set_array_of_decimal(Option<Vec<Option<Decimal>>>) => ArrayOfDecimal;
        set_array_of_time(Option<Vec<Option<NaiveTime>>>) => ArrayOfTime;
        set_array_of_date(Option<Vec<Option<NaiveDate>>>) => ArrayOfDate;
        set_array_of_timestamp(Option<Vec<Option<NaiveDateTime>>>) => ArrayOfTimestamp;
        set_array_of_timestamp_with_timezone(Option<Vec<Option<DateTime<FixedOffset>>>>) => ArrayOfTimestampWithTimezone;
        set_array_of_generic_record(Option<Vec<Option<GenericRecord>>>) => ArrayOfCompact;
        set_array_of_nullable_boolean(Option<Vec<Option<bool>>>) => ArrayOfNullableBoolean;
        set_array_of_nullable_int8(Option<Vec<Option<i8>>>) => ArrayOfNullableInt8;
        set_array_of_nullable_int16(Option<Vec<Option<i16>>>) => ArrayOfNullableInt16;
        set_array_of_nullable_int32(Option<Vec<Option<i32>>>) => ArrayOfNullableInt32;
        set_array_of_nullable_int64(Option<Vec<Option<i64>>>) => ArrayOfNullableInt64;
        set_array_of_nullable_float32(Option<Vec<Option<f32>>>) => ArrayOfNullableFloat32;
        set_array_of_nullable_float64(Option<Vec<Option<f64>>>) => ArrayOfNullableFloat64;
    }

    /// Sets a string field.
    pub fn set_string(self, name: &str, value: Option<&str>) -> Self {
        self.set(name, FieldValue::String(value.map(str::to_string)))
    }

    /// Builds the record.
    pub fn build(self) -> Result<GenericRecord> {
        if let Some(e) = self.error {
            return Err(e);
        }
        let mut values = self.values;
        match self.target {
            Target::Compact(type_name) => {
                let fields = values
                    .iter()
                    .map(|(name, value)| FieldDescriptor::new(name.clone(), value.kind()))
                    .collect();
                let schema = Arc::new(Schema::new(type_name, fields)?);
                let ordered = take_in_order(&schema, &mut values, |_| None)?;
                Ok(GenericRecord {
                    schema,
                    values: ordered,
                })
            }
            Target::Schema(schema) => {
                let ordered = take_in_order(&schema, &mut values, |_| None)?;
                Ok(GenericRecord {
                    schema,
                    values: ordered,
                })
            }
            Target::Clone(record) => {
                let GenericRecord {
                    schema,
                    values: base,
                } = record;
                let mut base = base.into_iter().map(Some).collect::<Vec<_>>();
                let ordered = take_in_order(&schema, &mut values, |i| base[i].take())?;
                Ok(GenericRecord {
                    schema,
                    values: ordered,
                })
            }
        }
    }
}

fn declared_kind(schema: &Schema, name: &str) -> Result<FieldKind> {
    schema
        .field(name)
        .map(FieldDescriptor::kind)
        .ok_or_else(|| CompactError::UnknownField {
            field: name.to_string(),
            type_name: schema.type_name().to_string(),
        })
}

/// Collects the values in schema order, taking unset fields from `fallback`.
fn take_in_order(
    schema: &Schema,
    values: &mut HashMap<String, FieldValue>,
    mut fallback: impl FnMut(usize) -> Option<FieldValue>,
) -> Result<Vec<FieldValue>> {
    schema
        .fields()
        .iter()
        .enumerate()
        .map(|(i, field)| {
            values
                .remove(field.name())
                .or_else(|| fallback(i))
                .ok_or_else(|| {
                    CompactError::Serialization(format!(
                        "field '{}' of schema '{}' is not set",
                        field.name(),
                        schema.type_name()
                    ))
                })
        })
        .collect()
}
