#![no_main]

use libfuzzer_sys::fuzz_target;

use hazelcast_compact::{CompactSerializer, FieldKind, GenericRecordBuilder};

fuzz_target!(|data: &[u8]| {
    let serializer = CompactSerializer::new();
    let template = GenericRecordBuilder::compact("FuzzRecord")
        .set_int32("id", 0)
        .set_nullable_int64("count", None)
        .set_string("name", None)
        .set_array_of_nullable_float64("scores", None)
        .set_array_of_string("tags", None)
        .set_decimal("amount", None)
        .set_timestamp_with_timezone("at", None)
        .build()
        .expect("template record builds");
    let seed = serializer
        .serialize_generic_record(&template)
        .expect("template record serializes");

    let mut input = seed[..8].to_vec();
    input.extend_from_slice(data);

    let Ok(record) = serializer.deserialize_generic_record(&input) else {
        return;
    };

    for name in record.field_names() {
        match record.get_field_kind(name) {
            Some(FieldKind::Int32) => {
                let _ = record.get_int32(name);
                let _ = record.get_nullable_int32(name);
            }
            Some(FieldKind::NullableInt64) => {
                let _ = record.get_int64(name);
            }
            Some(FieldKind::ArrayOfNullableFloat64) => {
                let _ = record.get_array_of_float64(name);
            }
            _ => {
                let _ = record.get(name);
            }
        }
    }

    // Anything that decodes must encode again to an equivalent record.
    let bytes = serializer
        .serialize_generic_record(&record)
        .expect("decoded record serializes");
    let again = serializer
        .deserialize_generic_record(&bytes)
        .expect("re-encoded record decodes");
    assert_eq!(again.to_json(), record.to_json());
});
