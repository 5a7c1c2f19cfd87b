//! Error types for Compact serialization.

use std::io;
use thiserror::Error;

use crate::serialization::compact::FieldKind;

/// The main error type for Compact serialization.
#[derive(Debug, Error)]
pub enum CompactError {
    /// Malformed or truncated data, unsupported kinds and other codec failures.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A field name was declared twice while building a schema.
    #[error("field '{field}' is defined more than once in schema '{type_name}'")]
    DuplicateField {
        /// Type name of the schema being built.
        type_name: String,
        /// The duplicated field name.
        field: String,
    },

    /// The field does not exist in the active schema.
    #[error("no field with the name '{field}' in schema '{type_name}'")]
    UnknownField {
        /// The requested field name.
        field: String,
        /// Type name of the active schema.
        type_name: String,
    },

    /// The requested field kind differs from the kind declared in the schema.
    #[error("mismatched field kinds for '{field}': expected {expected}, found {actual}")]
    FieldKindMismatch {
        /// The field name.
        field: String,
        /// The kind the caller asked for.
        expected: FieldKind,
        /// The kind declared in the schema.
        actual: FieldKind,
    },

    /// A null value was found through an accessor that cannot represent it.
    #[error("error while reading '{field}': null value cannot be read via {method}; use the nullable variant instead")]
    UnexpectedNull {
        /// The field name.
        field: String,
        /// The accessor that was used.
        method: &'static str,
    },

    /// A null element was found in an array read through a non-nullable accessor.
    #[error("error while reading '{field}': null array element cannot be read via {method}; use the nullable array variant instead")]
    UnexpectedNullInArray {
        /// The field name.
        field: String,
        /// The accessor that was used.
        method: &'static str,
    },

    /// No schema is known for the fingerprint read from the stream.
    #[error("schema with id {0} could not be found")]
    SchemaNotFound(i64),

    /// The schema was never made available to the schema registry.
    #[error("schema {schema_id} for type '{type_name}' is not registered")]
    SchemaNotReplicated {
        /// Type name of the schema.
        type_name: String,
        /// Fingerprint of the schema.
        schema_id: i64,
    },

    /// A value does not satisfy the constraints of its declared field kind.
    #[error("invalid value for field '{field}': {message}")]
    InvalidValue {
        /// The field name.
        field: String,
        /// What was wrong with the value.
        message: String,
    },

    /// Configuration errors (invalid settings).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// I/O errors from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A specialized `Result` type for Compact serialization.
pub type Result<T> = std::result::Result<T, CompactError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_error_display() {
        let err = CompactError::Serialization("insufficient data: need 4 bytes, have 1".to_string());
        assert_eq!(
            err.to_string(),
            "serialization error: insufficient data: need 4 bytes, have 1"
        );
    }

    #[test]
    fn test_duplicate_field_display() {
        let err = CompactError::DuplicateField {
            type_name: "Point".to_string(),
            field: "x".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "field 'x' is defined more than once in schema 'Point'"
        );
    }

    #[test]
    fn test_unknown_field_display() {
        let err = CompactError::UnknownField {
            field: "missing".to_string(),
            type_name: "Point".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "no field with the name 'missing' in schema 'Point'"
        );
    }

    #[test]
    fn test_kind_mismatch_display() {
        let err = CompactError::FieldKindMismatch {
            field: "id".to_string(),
            expected: FieldKind::String,
            actual: FieldKind::Int32,
        };
        assert_eq!(
            err.to_string(),
            "mismatched field kinds for 'id': expected STRING, found INT32"
        );
    }

    #[test]
    fn test_unexpected_null_display() {
        let err = CompactError::UnexpectedNull {
            field: "age".to_string(),
            method: "read_int8",
        };
        assert!(err.to_string().contains("read_int8"));
        assert!(err.to_string().contains("'age'"));
    }

    #[test]
    fn test_schema_not_found_display() {
        let err = CompactError::SchemaNotFound(42);
        assert_eq!(err.to_string(), "schema with id 42 could not be found");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::UnexpectedEof, "eof");
        let err: CompactError = io_err.into();
        assert!(matches!(err, CompactError::Io(_)));
        assert!(err.to_string().starts_with("I/O error:"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CompactError>();
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(CompactError::Configuration("test".to_string()))
        }

        assert!(returns_ok().is_ok());
        assert!(returns_err().is_err());
    }
}
