//! Schema-driven Compact binary serialization for Hazelcast records.
//!
//! Values are written against a [`Schema`] derived from their fields and
//! identified on the wire by the schema's 64-bit fingerprint. Typed values
//! implement [`Compact`] (usually through `#[derive(HazelcastCompact)]`);
//! payloads of unknown types decode to a [`GenericRecord`].
//!
//! ```
//! use hazelcast_compact::{CompactSerializer, GenericRecordBuilder};
//!
//! let record = GenericRecordBuilder::compact("Employee")
//!     .set_string("name", Some("Ada"))
//!     .set_int32("age", 36)
//!     .build()?;
//!
//! let serializer = CompactSerializer::new();
//! let bytes = serializer.serialize_generic_record(&record)?;
//! let decoded = serializer.deserialize_generic_record(&bytes)?;
//! assert_eq!(decoded.get_int32("age")?, 36);
//! # Ok::<(), hazelcast_compact::CompactError>(())
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod serialization;

pub use config::{CompactSerializationConfig, CompactSerializationConfigBuilder, ConfigError};
pub use error::{CompactError, Result};
pub use serialization::compact::{
    Compact, CompactReader, CompactSerializer, CompactWriter, FieldDescriptor, FieldKind,
    FieldValue, GenericRecord, GenericRecordBuilder, InMemorySchemaRegistry, Schema,
    SchemaRegistry,
};
pub use serialization::{DataInput, DataOutput, ObjectDataInput, ObjectDataOutput};
