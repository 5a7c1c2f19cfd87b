//! Error scenarios of the Compact reader and writer.

use hazelcast_compact::{
    Compact, CompactError, CompactReader, CompactSerializer, CompactWriter, FieldKind,
    GenericRecordBuilder, Result,
};

/// Writes a fixed set of fields and reads them back through a configurable accessor.
#[derive(Debug, PartialEq)]
struct Probe;

impl Compact for Probe {
    fn type_name() -> &'static str {
        "Probe"
    }

    fn write<W: CompactWriter>(&self, writer: &mut W) -> Result<()> {
        writer.write_int32("count", 5)?;
        writer.write_nullable_int32("maybe", None)?;
        writer.write_array_of_nullable_int16("holes", Some(&[Some(1), None]))?;
        writer.write_string("name", Some("probe"))
    }

    fn read<R: CompactReader>(_reader: &mut R) -> Result<Self> {
        Ok(Probe)
    }
}

/// A second type with the same type name but its own read logic.
macro_rules! reading_probe {
    ($name:ident, |$reader:ident| $body:expr) => {
        #[derive(Debug)]
        struct $name;

        impl Compact for $name {
            fn type_name() -> &'static str {
                "Probe"
            }

            fn write<W: CompactWriter>(&self, _writer: &mut W) -> Result<()> {
                Ok(())
            }

            fn read<R: CompactReader>($reader: &mut R) -> Result<Self> {
                $body;
                Ok($name)
            }
        }
    };
}

fn probe_bytes(serializer: &CompactSerializer) -> Vec<u8> {
    serializer.serialize(&Probe).unwrap()
}

#[test]
fn test_read_unknown_field() {
    reading_probe!(UnknownField, |reader| reader.read_int32("missing")?);
    let serializer = CompactSerializer::new();
    let err = serializer
        .deserialize::<UnknownField>(&probe_bytes(&serializer))
        .unwrap_err();
    assert!(matches!(
        err,
        CompactError::UnknownField { ref field, ref type_name } if field == "missing" && type_name == "Probe"
    ));
}

#[test]
fn test_read_kind_mismatch() {
    reading_probe!(Mismatch, |reader| reader.read_int64("count")?);
    let serializer = CompactSerializer::new();
    let err = serializer
        .deserialize::<Mismatch>(&probe_bytes(&serializer))
        .unwrap_err();
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
fn test_null_read_as_primitive() {
    reading_probe!(NullPrimitive, |reader| reader.read_int32("maybe")?);
    let serializer = CompactSerializer::new();
    let err = serializer
        .deserialize::<NullPrimitive>(&probe_bytes(&serializer))
        .unwrap_err();
    assert!(matches!(
        err,
        CompactError::UnexpectedNull { ref field, method: "read_int32" } if field == "maybe"
    ));
    assert!(err.to_string().contains("read_int32"));
}

#[test]
fn test_null_item_read_as_primitive_array() {
    reading_probe!(NullItem, |reader| reader.read_array_of_int16("holes")?);
    let serializer = CompactSerializer::new();
    let err = serializer
        .deserialize::<NullItem>(&probe_bytes(&serializer))
        .unwrap_err();
    assert!(matches!(err, CompactError::UnexpectedNullInArray { ref field, .. } if field == "holes"));
}

#[test]
fn test_cross_reads_between_primitive_and_nullable() {
    reading_probe!(Cross, |reader| {
        assert_eq!(reader.read_nullable_int32("count")?, Some(5));
        assert_eq!(reader.read_nullable_int32("maybe")?, None);
        assert_eq!(reader.read_array_of_nullable_int16("holes")?, Some(vec![Some(1), None]));
        assert_eq!(reader.get_field_kind("name"), Some(FieldKind::String));
        assert_eq!(reader.get_field_kind("nope"), None);
    });
    let serializer = CompactSerializer::new();
    serializer
        .deserialize::<Cross>(&probe_bytes(&serializer))
        .unwrap();
}

#[test]
fn test_fields_read_in_any_order_and_repeatedly() {
    reading_probe!(Repeat, |reader| {
        assert_eq!(reader.read_string("name")?.as_deref(), Some("probe"));
        assert_eq!(reader.read_int32("count")?, 5);
        assert_eq!(reader.read_string("name")?.as_deref(), Some("probe"));
        assert_eq!(reader.read_array_of_nullable_int16("holes")?, Some(vec![Some(1), None]));
        assert_eq!(reader.read_string("name")?.as_deref(), Some("probe"));
    });
    let serializer = CompactSerializer::new();
    serializer
        .deserialize::<Repeat>(&probe_bytes(&serializer))
        .unwrap();
}

#[test]
fn test_truncated_payload_never_panics() {
    let serializer = CompactSerializer::new();
    let bytes = probe_bytes(&serializer);
    for len in 0..bytes.len() {
        assert!(serializer.deserialize::<Probe>(&bytes[..len]).is_err());
        assert!(serializer.deserialize_generic_record(&bytes[..len]).is_err());
    }
}

#[test]
fn test_corrupted_offsets_are_errors() {
    reading_probe!(ReadName, |reader| reader.read_string("name")?);
    let serializer = CompactSerializer::new();
    let mut bytes = probe_bytes(&serializer);
    let last = bytes.len() - 1;
    bytes[last] = 0x7F;
    assert!(serializer.deserialize::<ReadName>(&bytes).is_err());
}

#[test]
fn test_unknown_schema_id() {
    let serializer = CompactSerializer::new();
    let bytes = 42i64.to_le_bytes();
    let err = serializer.deserialize_generic_record(&bytes).unwrap_err();
    assert!(matches!(err, CompactError::SchemaNotFound(42)));
}

#[test]
fn test_duplicate_field_in_write() {
    #[derive(Debug)]
    struct Twice;

    impl Compact for Twice {
        fn type_name() -> &'static str {
            "Twice"
        }

        fn write<W: CompactWriter>(&self, writer: &mut W) -> Result<()> {
            writer.write_int32("a", 1)?;
            writer.write_int64("a", 2)
        }

        fn read<R: CompactReader>(_reader: &mut R) -> Result<Self> {
            Ok(Twice)
        }
    }

    let err = CompactSerializer::new().serialize(&Twice).unwrap_err();
    assert!(matches!(err, CompactError::DuplicateField { ref field, .. } if field == "a"));
}

#[test]
fn test_array_of_generic_records_with_mixed_schemas() {
    let a = GenericRecordBuilder::compact("A").set_int32("x", 1).build().unwrap();
    let b = GenericRecordBuilder::compact("B").set_int32("x", 1).build().unwrap();
    let result = GenericRecordBuilder::compact("Holder")
        .set_array_of_generic_record("items", Some(vec![Some(a), Some(b)]))
        .build();
    assert!(matches!(result, Err(CompactError::InvalidValue { .. })));
}

#[test]
fn test_timezone_offset_out_of_range() {
    use chrono::{FixedOffset, TimeZone};

    let beyond = FixedOffset::east_opt(18 * 3600 + 1)
        .unwrap()
        .with_ymd_and_hms(2020, 1, 1, 0, 0, 0)
        .unwrap();
    let result = GenericRecordBuilder::compact("Zoned")
        .set_timestamp_with_timezone("at", Some(beyond))
        .build();
    assert!(matches!(result, Err(CompactError::InvalidValue { .. })));
}
