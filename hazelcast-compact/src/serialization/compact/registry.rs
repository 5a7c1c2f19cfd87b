//! Storage of Compact schemas by fingerprint.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, warn};

use crate::error::{CompactError, Result};

use super::Schema;

/// A store of schemas keyed by [`Schema::schema_id`].
///
/// Readers consult the registry to resolve the fingerprint at the start of
/// every record; writers register the schemas they use.
pub trait SchemaRegistry: Send + Sync + Debug {
    /// Looks up a schema by its fingerprint.
    fn get(&self, schema_id: i64) -> Option<Arc<Schema>>;

    /// Registers a schema.
    ///
    /// Registering an identical schema again is a no-op; a different schema
    /// under an already registered fingerprint is rejected.
    fn put(&self, schema: Arc<Schema>) -> Result<()>;
}

/// A [`SchemaRegistry`] held in process memory.
#[derive(Debug, Default)]
pub struct InMemorySchemaRegistry {
    schemas: RwLock<HashMap<i64, Arc<Schema>>>,
}

impl InMemorySchemaRegistry {
    /// Creates a new empty schema registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of registered schemas.
    pub fn len(&self) -> usize {
        self.schemas.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true if no schemas are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns all registered schemas with the given type name.
    pub fn schemas_by_type(&self, type_name: &str) -> Vec<Arc<Schema>> {
        self.schemas
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|schema| schema.type_name() == type_name)
            .cloned()
            .collect()
    }
}

impl SchemaRegistry for InMemorySchemaRegistry {
    fn get(&self, schema_id: i64) -> Option<Arc<Schema>> {
        self.schemas
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&schema_id)
            .cloned()
    }

    fn put(&self, schema: Arc<Schema>) -> Result<()> {
        let schema_id = schema.schema_id();
        let mut schemas = self.schemas.write().unwrap_or_else(PoisonError::into_inner);
        match schemas.get(&schema_id) {
            Some(existing) if **existing == *schema => Ok(()),
            Some(existing) => {
                warn!(
                    schema_id,
                    registered = %existing.type_name(),
                    rejected = %schema.type_name(),
                    "schema id collision"
                );
                Err(CompactError::Serialization(format!(
                    "schema id {} is already registered for a different schema: {}",
                    schema_id, existing
                )))
            }
            None => {
                debug!(schema_id, type_name = %schema.type_name(), "registered schema");
                schemas.insert(schema_id, schema);
                Ok(())
            }
        }
    }
}
