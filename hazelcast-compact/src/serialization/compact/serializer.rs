//! Entry point for encoding and decoding Compact values.

use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, trace};

use crate::config::CompactSerializationConfig;
use crate::error::{CompactError, Result};
use crate::serialization::{DataInput, DataOutput, ObjectDataInput, ObjectDataOutput};

use super::{
    write_field, Compact, DefaultCompactReader, DefaultCompactWriter, GenericRecord,
    InMemorySchemaRegistry, Schema, SchemaRegistry, SchemaWriter,
};

/// Serializer for Compact values and generic records.
///
/// A serialized value is the 8-byte fingerprint of its schema followed by the
/// record. Schemas of typed values are derived on first use and cached per
/// type name; every schema written is made known to the [`SchemaRegistry`],
/// which readers use to resolve fingerprints.
#[derive(Debug)]
pub struct CompactSerializer {
    config: CompactSerializationConfig,
    registry: Arc<dyn SchemaRegistry>,
    schemas_by_type: RwLock<HashMap<String, Arc<Schema>>>,
}

impl Default for CompactSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl CompactSerializer {
    /// Creates a serializer with the default configuration and a private
    /// in-memory registry.
    pub fn new() -> Self {
        Self::with_config(CompactSerializationConfig::default())
    }

    /// Creates a serializer with the given configuration and a private
    /// in-memory registry.
    pub fn with_config(config: CompactSerializationConfig) -> Self {
        Self::with_registry(config, Arc::new(InMemorySchemaRegistry::new()))
    }

    /// Creates a serializer sharing the given registry.
    pub fn with_registry(
        config: CompactSerializationConfig,
        registry: Arc<dyn SchemaRegistry>,
    ) -> Self {
        Self {
            config,
            registry,
            schemas_by_type: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &CompactSerializationConfig {
        &self.config
    }

    /// Returns the schema registry.
    pub fn registry(&self) -> &Arc<dyn SchemaRegistry> {
        &self.registry
    }

    /// Serializes a value into a new buffer.
    pub fn serialize<T: Compact>(&self, value: &T) -> Result<Vec<u8>> {
        let mut output = ObjectDataOutput::with_capacity(self.config.initial_buffer_capacity());
        self.write_object(&mut output, value, 0)?;
        Ok(output.into_bytes())
    }

    /// Serializes a value into `sink`, returning the number of bytes written.
    pub fn serialize_to<T: Compact, W: Write>(&self, value: &T, sink: &mut W) -> Result<usize> {
        let bytes = self.serialize(value)?;
        sink.write_all(&bytes)?;
        Ok(bytes.len())
    }

    /// Deserializes a value of type `T`.
    pub fn deserialize<T: Compact>(&self, data: &[u8]) -> Result<T> {
        let mut input = ObjectDataInput::new(data);
        self.read_object(&mut input, 0)
    }

    /// Serializes a generic record into a new buffer.
    pub fn serialize_generic_record(&self, record: &GenericRecord) -> Result<Vec<u8>> {
        let mut output = ObjectDataOutput::with_capacity(self.config.initial_buffer_capacity());
        self.write_generic_object(&mut output, record, 0)?;
        Ok(output.into_bytes())
    }

    /// Deserializes any Compact payload whose schema is known to the registry.
    pub fn deserialize_generic_record(&self, data: &[u8]) -> Result<GenericRecord> {
        let mut input = ObjectDataInput::new(data);
        self.read_generic_object(&mut input, 0)
    }

    /// Returns the schema of `T`, deriving it from `value` on first use.
    pub fn schema_for<T: Compact>(&self, value: &T) -> Result<Arc<Schema>> {
        let type_name = T::type_name();
        if let Some(schema) = self
            .schemas_by_type
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(type_name)
        {
            trace!(type_name, schema_id = schema.schema_id(), "schema cache hit");
            return Ok(Arc::clone(schema));
        }

        let mut writer = SchemaWriter::new(type_name);
        value.write(&mut writer)?;
        let schema = Arc::new(writer.build()?);
        debug!(
            type_name,
            schema_id = schema.schema_id(),
            fields = schema.field_count(),
            "created schema"
        );

        let mut cache = self
            .schemas_by_type
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(
            cache.entry(type_name.to_string()).or_insert(schema),
        ))
    }

    /// Makes sure the registry knows `schema`, registering it if allowed.
    fn ensure_registered(&self, schema: &Arc<Schema>) -> Result<()> {
        if self.registry.get(schema.schema_id()).is_some() {
            return Ok(());
        }
        if !self.config.auto_register_schemas() {
            return Err(CompactError::SchemaNotReplicated {
                type_name: schema.type_name().to_string(),
                schema_id: schema.schema_id(),
            });
        }
        self.registry.put(Arc::clone(schema))
    }

    fn check_depth(&self, depth: usize) -> Result<()> {
        if depth > self.config.max_nesting_depth() {
            return Err(CompactError::Serialization(format!(
                "maximum nesting depth {} exceeded",
                self.config.max_nesting_depth()
            )));
        }
        Ok(())
    }

    fn read_schema(&self, input: &mut ObjectDataInput<'_>) -> Result<Arc<Schema>> {
        let schema_id = input.read_long()?;
        self.registry
            .get(schema_id)
            .ok_or(CompactError::SchemaNotFound(schema_id))
    }

    /// Writes `[fingerprint][record]` for a typed value.
    pub(crate) fn write_object<T: Compact>(
        &self,
        output: &mut ObjectDataOutput,
        value: &T,
        depth: usize,
    ) -> Result<()> {
        self.check_depth(depth)?;
        let schema = self.schema_for(value)?;
        self.ensure_registered(&schema)?;
        output.write_long(schema.schema_id())?;
        let mut writer = DefaultCompactWriter::new(self, output, &schema, depth)?;
        value.write(&mut writer)?;
        writer.end()
    }

    /// Writes `[fingerprint][record]` for a generic record.
    pub(crate) fn write_generic_object(
        &self,
        output: &mut ObjectDataOutput,
        record: &GenericRecord,
        depth: usize,
    ) -> Result<()> {
        self.check_depth(depth)?;
        let schema = record.schema();
        self.ensure_registered(schema)?;
        output.write_long(schema.schema_id())?;
        let mut writer = DefaultCompactWriter::new(self, output, schema, depth)?;
        for (field, value) in record.iter() {
            write_field(&mut writer, field.name(), value)?;
        }
        writer.end()
    }

    /// Reads `[fingerprint][record]` into a typed value.
    pub(crate) fn read_object<T: Compact>(
        &self,
        input: &mut ObjectDataInput<'_>,
        depth: usize,
    ) -> Result<T> {
        self.check_depth(depth)?;
        let schema = self.read_schema(input)?;
        if schema.type_name() != T::type_name() {
            return Err(CompactError::Serialization(format!(
                "expected a value of type '{}', found schema {} of type '{}'",
                T::type_name(),
                schema.schema_id(),
                schema.type_name()
            )));
        }
        let mut reader = DefaultCompactReader::new(self, input, &schema, depth)?;
        T::read(&mut reader)
    }

    /// Reads `[fingerprint][record]` into a generic record.
    pub(crate) fn read_generic_object(
        &self,
        input: &mut ObjectDataInput<'_>,
        depth: usize,
    ) -> Result<GenericRecord> {
        self.check_depth(depth)?;
        let schema = self.read_schema(input)?;
        let mut reader = DefaultCompactReader::new(self, input, &schema, depth)?;
        reader.to_generic_record()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::compact::{CompactReader, CompactWriter, GenericRecordBuilder};

    #[derive(Debug, Clone, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
        label: Option<String>,
    }

    impl Compact for Point {
        fn type_name() -> &'static str {
            "Point"
        }

        fn write<W: CompactWriter>(&self, writer: &mut W) -> Result<()> {
            writer.write_int32("x", self.x)?;
            writer.write_int32("y", self.y)?;
            writer.write_string("label", self.label.as_deref())
        }

        fn read<R: CompactReader>(reader: &mut R) -> Result<Self> {
            Ok(Self {
                x: reader.read_int32("x")?,
                y: reader.read_int32("y")?,
                label: reader.read_string("label")?,
            })
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Node {
        value: i32,
        next: Option<Box<Node>>,
    }

    impl Compact for Node {
        fn type_name() -> &'static str {
            "Node"
        }

        fn write<W: CompactWriter>(&self, writer: &mut W) -> Result<()> {
            writer.write_int32("value", self.value)?;
            writer.write_compact("next", self.next.as_deref())
        }

        fn read<R: CompactReader>(reader: &mut R) -> Result<Self> {
            Ok(Self {
                value: reader.read_int32("value")?,
                next: reader.read_compact::<Node>("next")?.map(Box::new),
            })
        }
    }

    fn chain(length: i32) -> Node {
        (1..length).fold(Node { value: 0, next: None }, |next, value| Node {
            value,
            next: Some(Box::new(next)),
        })
    }

    fn point() -> Point {
        Point {
            x: 3,
            y: -4,
            label: Some("p".to_string()),
        }
    }

    #[test]
    fn test_round_trip() {
        let serializer = CompactSerializer::new();
        let bytes = serializer.serialize(&point()).unwrap();
        let schema = serializer.schema_for(&point()).unwrap();
        assert_eq!(&bytes[..8], &schema.schema_id().to_le_bytes());
        assert_eq!(serializer.deserialize::<Point>(&bytes).unwrap(), point());
    }

    #[test]
    fn test_schema_cached_per_type() {
        let serializer = CompactSerializer::new();
        let first = serializer.schema_for(&point()).unwrap();
        let second = serializer.schema_for(&Point { x: 0, y: 0, label: None }).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_serialize_to_sink() {
        let serializer = CompactSerializer::new();
        let mut sink = Vec::new();
        let written = serializer.serialize_to(&point(), &mut sink).unwrap();
        assert_eq!(written, sink.len());
        assert_eq!(sink, serializer.serialize(&point()).unwrap());
    }

    #[test]
    fn test_unknown_schema_fails() {
        let bytes = CompactSerializer::new().serialize(&point()).unwrap();
        let err = CompactSerializer::new().deserialize::<Point>(&bytes).unwrap_err();
        assert!(matches!(err, CompactError::SchemaNotFound(_)));
    }

    #[test]
    fn test_shared_registry() {
        let registry: Arc<dyn SchemaRegistry> = Arc::new(InMemorySchemaRegistry::new());
        let writer = CompactSerializer::with_registry(
            CompactSerializationConfig::default(),
            Arc::clone(&registry),
        );
        let reader =
            CompactSerializer::with_registry(CompactSerializationConfig::default(), registry);
        let bytes = writer.serialize(&point()).unwrap();
        assert_eq!(reader.deserialize::<Point>(&bytes).unwrap(), point());
    }

    #[test]
    fn test_type_name_mismatch() {
        let serializer = CompactSerializer::new();
        let bytes = serializer.serialize(&point()).unwrap();
        let err = serializer.deserialize::<Node>(&bytes).unwrap_err();
        assert!(err.to_string().contains("expected a value of type 'Node'"));
    }

    #[test]
    fn test_schema_not_replicated() {
        let config = CompactSerializationConfig::builder()
            .auto_register_schemas(false)
            .build()
            .unwrap();
        let serializer = CompactSerializer::with_config(config);
        let err = serializer.serialize(&point()).unwrap_err();
        assert!(matches!(
            err,
            CompactError::SchemaNotReplicated { ref type_name, .. } if type_name == "Point"
        ));

        let schema = serializer.schema_for(&point()).unwrap();
        serializer.registry().put(schema).unwrap();
        assert!(serializer.serialize(&point()).is_ok());
    }

    #[test]
    fn test_nested_round_trip() {
        let serializer = CompactSerializer::new();
        let bytes = serializer.serialize(&chain(5)).unwrap();
        assert_eq!(serializer.deserialize::<Node>(&bytes).unwrap(), chain(5));
    }

    #[test]
    fn test_nesting_depth_limit() {
        let config = CompactSerializationConfig::builder()
            .max_nesting_depth(3)
            .build()
            .unwrap();
        let serializer = CompactSerializer::with_config(config);
        assert!(serializer.serialize(&chain(4)).is_ok());
        let err = serializer.serialize(&chain(5)).unwrap_err();
        assert!(err.to_string().contains("maximum nesting depth 3 exceeded"));
    }

    #[test]
    fn test_generic_record_round_trip() {
        let serializer = CompactSerializer::new();
        let record = GenericRecordBuilder::compact("Point")
            .set_int32("x", 3)
            .set_int32("y", -4)
            .set_string("label", Some("p"))
            .build()
            .unwrap();
        let bytes = serializer.serialize_generic_record(&record).unwrap();
        assert_eq!(bytes, serializer.serialize(&point()).unwrap());
        assert_eq!(serializer.deserialize_generic_record(&bytes).unwrap(), record);
        assert_eq!(serializer.deserialize::<Point>(&bytes).unwrap(), point());
    }

    #[test]
    fn test_truncated_input() {
        let serializer = CompactSerializer::new();
        let bytes = serializer.serialize(&point()).unwrap();
        for len in [0, 7, 12, bytes.len() - 1] {
            assert!(serializer.deserialize::<Point>(&bytes[..len]).is_err());
        }
    }
}
