//! Compact serializer configuration types and builders.

use crate::error::CompactError;

/// Default initial capacity of the output buffer of one serialization.
pub const DEFAULT_INITIAL_BUFFER_CAPACITY: usize = 256;
/// Default maximum number of nested records below a top-level value.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 64;
/// Schemas are registered automatically unless configured otherwise.
pub const DEFAULT_AUTO_REGISTER_SCHEMAS: bool = true;

/// Configuration error returned when validation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    message: String,
}

impl ConfigError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the validation failure message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for CompactError {
    fn from(e: ConfigError) -> Self {
        CompactError::Configuration(e.message)
    }
}

/// Settings of a [`CompactSerializer`](crate::CompactSerializer).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompactSerializationConfig {
    initial_buffer_capacity: usize,
    max_nesting_depth: usize,
    auto_register_schemas: bool,
}

impl CompactSerializationConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> CompactSerializationConfigBuilder {
        CompactSerializationConfigBuilder::new()
    }

    /// Returns the initial capacity of output buffers.
    pub fn initial_buffer_capacity(&self) -> usize {
        self.initial_buffer_capacity
    }

    /// Returns how many levels of nested records are accepted.
    pub fn max_nesting_depth(&self) -> usize {
        self.max_nesting_depth
    }

    /// Returns whether unknown schemas are put into the registry on write.
    ///
    /// When disabled, writing a value whose schema is not in the registry
    /// fails with [`CompactError::SchemaNotReplicated`].
    pub fn auto_register_schemas(&self) -> bool {
        self.auto_register_schemas
    }
}

impl Default for CompactSerializationConfig {
    fn default() -> Self {
        Self {
            initial_buffer_capacity: DEFAULT_INITIAL_BUFFER_CAPACITY,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            auto_register_schemas: DEFAULT_AUTO_REGISTER_SCHEMAS,
        }
    }
}

/// Builder for `CompactSerializationConfig`.
#[derive(Debug, Clone, Default)]
pub struct CompactSerializationConfigBuilder {
    initial_buffer_capacity: Option<usize>,
    max_nesting_depth: Option<usize>,
    auto_register_schemas: Option<bool>,
}

impl CompactSerializationConfigBuilder {
    /// Creates a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial capacity of output buffers.
    pub fn initial_buffer_capacity(mut self, capacity: usize) -> Self {
        self.initial_buffer_capacity = Some(capacity);
        self
    }

    /// Sets how many levels of nested records are accepted.
    pub fn max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = Some(depth);
        self
    }

    /// Enables or disables automatic schema registration.
    pub fn auto_register_schemas(mut self, enabled: bool) -> Self {
        self.auto_register_schemas = Some(enabled);
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> Result<CompactSerializationConfig, ConfigError> {
        let initial_buffer_capacity = self
            .initial_buffer_capacity
            .unwrap_or(DEFAULT_INITIAL_BUFFER_CAPACITY);
        if initial_buffer_capacity == 0 {
            return Err(ConfigError::new("initial_buffer_capacity must be greater than zero"));
        }

        let max_nesting_depth = self.max_nesting_depth.unwrap_or(DEFAULT_MAX_NESTING_DEPTH);
        if max_nesting_depth == 0 {
            return Err(ConfigError::new("max_nesting_depth must be greater than zero"));
        }

        Ok(CompactSerializationConfig {
            initial_buffer_capacity,
            max_nesting_depth,
            auto_register_schemas: self
                .auto_register_schemas
                .unwrap_or(DEFAULT_AUTO_REGISTER_SCHEMAS),
        })
    }
}
