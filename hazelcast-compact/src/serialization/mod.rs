//! Byte-level input/output and the Compact format built on it.

mod data_input;
mod data_output;
pub mod compact;

pub use compact::{
    Compact, CompactReader, CompactSerializer, CompactWriter, DefaultCompactReader,
    DefaultCompactWriter, FieldDescriptor, FieldKind, FieldValue, GenericRecord,
    GenericRecordBuilder, InMemorySchemaRegistry, Schema, SchemaRegistry, SchemaWriter,
};
pub use data_input::{DataInput, ObjectDataInput};
pub use data_output::{DataOutput, ObjectDataOutput, DEFAULT_OUTPUT_CAPACITY};
