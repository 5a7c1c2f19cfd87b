#![no_main]

use libfuzzer_sys::fuzz_target;

use hazelcast_compact::{Compact, CompactReader, CompactSerializer, CompactWriter, Result};

#[derive(Debug, Default)]
struct FuzzCompact {
    bool_val: bool,
    int8_val: i8,
    int16_val: i16,
    int32_val: i32,
    int64_val: i64,
    float32_val: f32,
    float64_val: f64,
    string_val: Option<String>,
    nullable_int32: Option<i32>,
    bools: Option<Vec<bool>>,
    strings: Option<Vec<Option<String>>>,
    nullable_longs: Option<Vec<Option<i64>>>,
}

impl Compact for FuzzCompact {
    fn type_name() -> &'static str {
        "FuzzCompact"
    }

    fn write<W: CompactWriter>(&self, writer: &mut W) -> Result<()> {
        writer.write_boolean("bool", self.bool_val)?;
        writer.write_int8("int8", self.int8_val)?;
        writer.write_int16("int16", self.int16_val)?;
        writer.write_int32("int32", self.int32_val)?;
        writer.write_int64("int64", self.int64_val)?;
        writer.write_float32("float32", self.float32_val)?;
        writer.write_float64("float64", self.float64_val)?;
        writer.write_string("string", self.string_val.as_deref())?;
        writer.write_nullable_int32("nullable_int32", self.nullable_int32)?;
        writer.write_array_of_boolean("bools", self.bools.as_deref())?;
        writer.write_array_of_string("strings", self.strings.as_deref())?;
        writer.write_array_of_nullable_int64("nullable_longs", self.nullable_longs.as_deref())
    }

    fn read<R: CompactReader>(reader: &mut R) -> Result<Self> {
        Ok(Self {
            bool_val: reader.read_boolean("bool")?,
            int8_val: reader.read_int8("int8")?,
            int16_val: reader.read_int16("int16")?,
            int32_val: reader.read_int32("int32")?,
            int64_val: reader.read_int64("int64")?,
            float32_val: reader.read_float32("float32")?,
            float64_val: reader.read_float64("float64")?,
            string_val: reader.read_string("string")?,
            nullable_int32: reader.read_nullable_int32("nullable_int32")?,
            bools: reader.read_array_of_boolean("bools")?,
            strings: reader.read_array_of_string("strings")?,
            nullable_longs: reader.read_array_of_nullable_int64("nullable_longs")?,
        })
    }
}

fuzz_target!(|data: &[u8]| {
    let serializer = CompactSerializer::new();
    // Registers the schema so that inputs starting with its fingerprint reach the reader.
    let seed = serializer
        .serialize(&FuzzCompact::default())
        .expect("default value serializes");

    let _ = serializer.deserialize::<FuzzCompact>(data);
    let _ = serializer.deserialize_generic_record(data);

    let mut prefixed = seed[..8].to_vec();
    prefixed.extend_from_slice(data);
    let _ = serializer.deserialize::<FuzzCompact>(&prefixed);
    let _ = serializer.deserialize_generic_record(&prefixed);
});
