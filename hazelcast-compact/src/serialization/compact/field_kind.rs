//! The closed catalogue of Compact field kinds.

use std::fmt;

use crate::error::{CompactError, Result};

/// Field kind identifiers for Compact serialization.
///
/// The discriminants are the wire ids; they also feed the schema fingerprint
/// and therefore must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
#[repr(i32)]
#[allow(missing_docs)]
pub enum FieldKind {
    Boolean = 1,
    ArrayOfBoolean = 2,
    Int8 = 3,
    ArrayOfInt8 = 4,
    Int16 = 7,
    ArrayOfInt16 = 8,
    Int32 = 9,
    ArrayOfInt32 = 10,
    Int64 = 11,
    ArrayOfInt64 = 12,
    Float32 = 13,
    ArrayOfFloat32 = 14,
    Float64 = 15,
    ArrayOfFloat64 = 16,
    String = 17,
    ArrayOfString = 18,
    Decimal = 19,
    ArrayOfDecimal = 20,
    Time = 21,
    ArrayOfTime = 22,
    Date = 23,
    ArrayOfDate = 24,
    Timestamp = 25,
    ArrayOfTimestamp = 26,
    TimestampWithTimezone = 27,
    ArrayOfTimestampWithTimezone = 28,
    Compact = 29,
    ArrayOfCompact = 30,
    NullableBoolean = 33,
    ArrayOfNullableBoolean = 34,
    NullableInt8 = 35,
    ArrayOfNullableInt8 = 36,
    NullableInt16 = 37,
    ArrayOfNullableInt16 = 38,
    NullableInt32 = 39,
    ArrayOfNullableInt32 = 40,
    NullableInt64 = 41,
    ArrayOfNullableInt64 = 42,
    NullableFloat32 = 43,
    ArrayOfNullableFloat32 = 44,
    NullableFloat64 = 45,
    ArrayOfNullableFloat64 = 46,
}

/// Every supported kind, in id order.
pub const ALL_FIELD_KINDS: [FieldKind; 42] = [
    FieldKind::Boolean,
    FieldKind::ArrayOfBoolean,
    FieldKind::Int8,
    FieldKind::ArrayOfInt8,
    FieldKind::Int16,
    FieldKind::ArrayOfInt16,
    FieldKind::Int32,
    FieldKind::ArrayOfInt32,
    FieldKind::Int64,
    FieldKind::ArrayOfInt64,
    FieldKind::Float32,
    FieldKind::ArrayOfFloat32,
    FieldKind::Float64,
    FieldKind::ArrayOfFloat64,
    FieldKind::String,
    FieldKind::ArrayOfString,
    FieldKind::Decimal,
    FieldKind::ArrayOfDecimal,
    FieldKind::Time,
    FieldKind::ArrayOfTime,
    FieldKind::Date,
    FieldKind::ArrayOfDate,
    FieldKind::Timestamp,
    FieldKind::ArrayOfTimestamp,
    FieldKind::TimestampWithTimezone,
    FieldKind::ArrayOfTimestampWithTimezone,
    FieldKind::Compact,
    FieldKind::ArrayOfCompact,
    FieldKind::NullableBoolean,
    FieldKind::ArrayOfNullableBoolean,
    FieldKind::NullableInt8,
    FieldKind::ArrayOfNullableInt8,
    FieldKind::NullableInt16,
    FieldKind::ArrayOfNullableInt16,
    FieldKind::NullableInt32,
    FieldKind::ArrayOfNullableInt32,
    FieldKind::NullableInt64,
    FieldKind::ArrayOfNullableInt64,
    FieldKind::NullableFloat32,
    FieldKind::ArrayOfNullableFloat32,
    FieldKind::NullableFloat64,
    FieldKind::ArrayOfNullableFloat64,
];

/// Wire id reported for a field the schema does not know.
pub const NOT_AVAILABLE_KIND_ID: i32 = 0;

impl FieldKind {
    /// Creates a FieldKind from its wire representation.
    pub fn from_id(id: i32) -> Result<Self> {
        let kind = match id {
            1 => Self::Boolean,
            2 => Self::ArrayOfBoolean,
            3 => Self::Int8,
            4 => Self::ArrayOfInt8,
            5 | 6 => {
                return Err(CompactError::Serialization(
                    "Compact format does not support char fields".to_string(),
                ))
            }
            7 => Self::Int16,
            8 => Self::ArrayOfInt16,
            9 => Self::Int32,
            10 => Self::ArrayOfInt32,
            11 => Self::Int64,
            12 => Self::ArrayOfInt64,
            13 => Self::Float32,
            14 => Self::ArrayOfFloat32,
            15 => Self::Float64,
            16 => Self::ArrayOfFloat64,
            17 => Self::String,
            18 => Self::ArrayOfString,
            19 => Self::Decimal,
            20 => Self::ArrayOfDecimal,
            21 => Self::Time,
            22 => Self::ArrayOfTime,
            23 => Self::Date,
            24 => Self::ArrayOfDate,
            25 => Self::Timestamp,
            26 => Self::ArrayOfTimestamp,
            27 => Self::TimestampWithTimezone,
            28 => Self::ArrayOfTimestampWithTimezone,
            29 => Self::Compact,
            30 => Self::ArrayOfCompact,
            31 | 32 => {
                return Err(CompactError::Serialization(
                    "Compact format does not support portable fields".to_string(),
                ))
            }
            33 => Self::NullableBoolean,
            34 => Self::ArrayOfNullableBoolean,
            35 => Self::NullableInt8,
            36 => Self::ArrayOfNullableInt8,
            37 => Self::NullableInt16,
            38 => Self::ArrayOfNullableInt16,
            39 => Self::NullableInt32,
            40 => Self::ArrayOfNullableInt32,
            41 => Self::NullableInt64,
            42 => Self::ArrayOfNullableInt64,
            43 => Self::NullableFloat32,
            44 => Self::ArrayOfNullableFloat32,
            45 => Self::NullableFloat64,
            46 => Self::ArrayOfNullableFloat64,
            _ => {
                return Err(CompactError::Serialization(format!(
                    "Unknown field kind id: {}",
                    id
                )))
            }
        };
        Ok(kind)
    }

    /// Returns the wire representation of this field kind.
    pub fn id(&self) -> i32 {
        *self as i32
    }

    /// Returns the fixed size in bytes, or `None` for variable-size kinds.
    ///
    /// Booleans report zero bytes because they are bit-packed in a region of
    /// their own.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            Self::Boolean => Some(0),
            Self::Int8 => Some(1),
            Self::Int16 => Some(2),
            Self::Int32 | Self::Float32 => Some(4),
            Self::Int64 | Self::Float64 => Some(8),
            _ => None,
        }
    }

    /// Returns true if values of this kind live in the variable region.
    pub fn is_variable_size(&self) -> bool {
        self.fixed_size().is_none()
    }

    /// Returns true if this is a nullable primitive or an array of them.
    pub fn is_nullable(&self) -> bool {
        matches!(
            self,
            Self::NullableBoolean
                | Self::NullableInt8
                | Self::NullableInt16
                | Self::NullableInt32
                | Self::NullableInt64
                | Self::NullableFloat32
                | Self::NullableFloat64
                | Self::ArrayOfNullableBoolean
                | Self::ArrayOfNullableInt8
                | Self::ArrayOfNullableInt16
                | Self::ArrayOfNullableInt32
                | Self::ArrayOfNullableInt64
                | Self::ArrayOfNullableFloat32
                | Self::ArrayOfNullableFloat64
        )
    }

    /// Returns true if this is an array kind.
    pub fn is_array(&self) -> bool {
        self.element_kind().is_some()
    }

    /// Returns the kind of the items of an array kind.
    pub fn element_kind(&self) -> Option<FieldKind> {
        let element = match self {
            Self::ArrayOfBoolean => Self::Boolean,
            Self::ArrayOfInt8 => Self::Int8,
            Self::ArrayOfInt16 => Self::Int16,
            Self::ArrayOfInt32 => Self::Int32,
            Self::ArrayOfInt64 => Self::Int64,
            Self::ArrayOfFloat32 => Self::Float32,
            Self::ArrayOfFloat64 => Self::Float64,
            Self::ArrayOfString => Self::String,
            Self::ArrayOfDecimal => Self::Decimal,
            Self::ArrayOfTime => Self::Time,
            Self::ArrayOfDate => Self::Date,
            Self::ArrayOfTimestamp => Self::Timestamp,
            Self::ArrayOfTimestampWithTimezone => Self::TimestampWithTimezone,
            Self::ArrayOfCompact => Self::Compact,
            Self::ArrayOfNullableBoolean => Self::NullableBoolean,
            Self::ArrayOfNullableInt8 => Self::NullableInt8,
            Self::ArrayOfNullableInt16 => Self::NullableInt16,
            Self::ArrayOfNullableInt32 => Self::NullableInt32,
            Self::ArrayOfNullableInt64 => Self::NullableInt64,
            Self::ArrayOfNullableFloat32 => Self::NullableFloat32,
            Self::ArrayOfNullableFloat64 => Self::NullableFloat64,
            _ => return None,
        };
        Some(element)
    }

    /// Maps a primitive kind to its nullable variant and back, arrays included.
    ///
    /// Kinds without such a pairing (strings, temporals, nested records)
    /// return `None`.
    pub fn nullable_counterpart(&self) -> Option<FieldKind> {
        let other = match self {
            Self::Boolean => Self::NullableBoolean,
            Self::Int8 => Self::NullableInt8,
            Self::Int16 => Self::NullableInt16,
            Self::Int32 => Self::NullableInt32,
            Self::Int64 => Self::NullableInt64,
            Self::Float32 => Self::NullableFloat32,
            Self::Float64 => Self::NullableFloat64,
            Self::ArrayOfBoolean => Self::ArrayOfNullableBoolean,
            Self::ArrayOfInt8 => Self::ArrayOfNullableInt8,
            Self::ArrayOfInt16 => Self::ArrayOfNullableInt16,
            Self::ArrayOfInt32 => Self::ArrayOfNullableInt32,
            Self::ArrayOfInt64 => Self::ArrayOfNullableInt64,
            Self::ArrayOfFloat32 => Self::ArrayOfNullableFloat32,
            Self::ArrayOfFloat64 => Self::ArrayOfNullableFloat64,
            Self::NullableBoolean => Self::Boolean,
            Self::NullableInt8 => Self::Int8,
            Self::NullableInt16 => Self::Int16,
            Self::NullableInt32 => Self::Int32,
            Self::NullableInt64 => Self::Int64,
            Self::NullableFloat32 => Self::Float32,
            Self::NullableFloat64 => Self::Float64,
            Self::ArrayOfNullableBoolean => Self::ArrayOfBoolean,
            Self::ArrayOfNullableInt8 => Self::ArrayOfInt8,
            Self::ArrayOfNullableInt16 => Self::ArrayOfInt16,
            Self::ArrayOfNullableInt32 => Self::ArrayOfInt32,
            Self::ArrayOfNullableInt64 => Self::ArrayOfInt64,
            Self::ArrayOfNullableFloat32 => Self::ArrayOfFloat32,
            Self::ArrayOfNullableFloat64 => Self::ArrayOfFloat64,
            _ => return None,
        };
        Some(other)
    }

    /// Returns the upper-snake name used in messages and JSON output.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Boolean => "BOOLEAN",
            Self::ArrayOfBoolean => "ARRAY_OF_BOOLEAN",
            Self::Int8 => "INT8",
            Self::ArrayOfInt8 => "ARRAY_OF_INT8",
            Self::Int16 => "INT16",
            Self::ArrayOfInt16 => "ARRAY_OF_INT16",
            Self::Int32 => "INT32",
            Self::ArrayOfInt32 => "ARRAY_OF_INT32",
            Self::Int64 => "INT64",
            Self::ArrayOfInt64 => "ARRAY_OF_INT64",
            Self::Float32 => "FLOAT32",
            Self::ArrayOfFloat32 => "ARRAY_OF_FLOAT32",
            Self::Float64 => "FLOAT64",
            Self::ArrayOfFloat64 => "ARRAY_OF_FLOAT64",
            Self::String => "STRING",
            Self::ArrayOfString => "ARRAY_OF_STRING",
            Self::Decimal => "DECIMAL",
            Self::ArrayOfDecimal => "ARRAY_OF_DECIMAL",
            Self::Time => "TIME",
            Self::ArrayOfTime => "ARRAY_OF_TIME",
            Self::Date => "DATE",
            Self::ArrayOfDate => "ARRAY_OF_DATE",
            Self::Timestamp => "TIMESTAMP",
            Self::ArrayOfTimestamp => "ARRAY_OF_TIMESTAMP",
            Self::TimestampWithTimezone => "TIMESTAMP_WITH_TIMEZONE",
            Self::ArrayOfTimestampWithTimezone => "ARRAY_OF_TIMESTAMP_WITH_TIMEZONE",
            Self::Compact => "COMPACT",
            Self::ArrayOfCompact => "ARRAY_OF_COMPACT",
            Self::NullableBoolean => "NULLABLE_BOOLEAN",
            Self::ArrayOfNullableBoolean => "ARRAY_OF_NULLABLE_BOOLEAN",
            Self::NullableInt8 => "NULLABLE_INT8",
            Self::ArrayOfNullableInt8 => "ARRAY_OF_NULLABLE_INT8",
            Self::NullableInt16 => "NULLABLE_INT16",
            Self::ArrayOfNullableInt16 => "ARRAY_OF_NULLABLE_INT16",
            Self::NullableInt32 => "NULLABLE_INT32",
            Self::ArrayOfNullableInt32 => "ARRAY_OF_NULLABLE_INT32",
            Self::NullableInt64 => "NULLABLE_INT64",
            Self::ArrayOfNullableInt64 => "ARRAY_OF_NULLABLE_INT64",
            Self::NullableFloat32 => "NULLABLE_FLOAT32",
            Self::ArrayOfNullableFloat32 => "ARRAY_OF_NULLABLE_FLOAT32",
            Self::NullableFloat64 => "NULLABLE_FLOAT64",
            Self::ArrayOfNullableFloat64 => "ARRAY_OF_NULLABLE_FLOAT64",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_id_roundtrip_for_all_kinds() {
        for kind in ALL_FIELD_KINDS {
            assert_eq!(FieldKind::from_id(kind.id()).unwrap(), kind);
        }
    }

    #[test]
    fn test_wire_ids_are_pinned() {
        assert_eq!(FieldKind::Boolean.id(), 1);
        assert_eq!(FieldKind::Int32.id(), 9);
        assert_eq!(FieldKind::String.id(), 17);
        assert_eq!(FieldKind::ArrayOfTimestamp.id(), 26);
        assert_eq!(FieldKind::Compact.id(), 29);
        assert_eq!(FieldKind::NullableBoolean.id(), 33);
        assert_eq!(FieldKind::ArrayOfNullableFloat64.id(), 46);
    }

    #[test]
    fn test_unsupported_ids() {
        for id in [NOT_AVAILABLE_KIND_ID, 5, 6, 31, 32, 47, -1] {
            assert!(FieldKind::from_id(id).is_err(), "id {} should be rejected", id);
        }
    }

    #[test]
    fn test_fixed_sizes() {
        assert_eq!(FieldKind::Boolean.fixed_size(), Some(0));
        assert_eq!(FieldKind::Int8.fixed_size(), Some(1));
        assert_eq!(FieldKind::Int16.fixed_size(), Some(2));
        assert_eq!(FieldKind::Int32.fixed_size(), Some(4));
        assert_eq!(FieldKind::Float32.fixed_size(), Some(4));
        assert_eq!(FieldKind::Int64.fixed_size(), Some(8));
        assert_eq!(FieldKind::Float64.fixed_size(), Some(8));
        assert_eq!(FieldKind::NullableInt32.fixed_size(), None);
        assert_eq!(FieldKind::String.fixed_size(), None);
        assert_eq!(FieldKind::ArrayOfBoolean.fixed_size(), None);
    }

    #[test]
    fn test_only_seven_fixed_kinds() {
        let fixed = ALL_FIELD_KINDS
            .iter()
            .filter(|k| !k.is_variable_size())
            .count();
        assert_eq!(fixed, 7);
    }

    #[test]
    fn test_element_kind() {
        assert_eq!(FieldKind::ArrayOfInt32.element_kind(), Some(FieldKind::Int32));
        assert_eq!(
            FieldKind::ArrayOfNullableInt8.element_kind(),
            Some(FieldKind::NullableInt8)
        );
        assert_eq!(FieldKind::Int32.element_kind(), None);
        assert!(FieldKind::ArrayOfCompact.is_array());
        assert!(!FieldKind::Compact.is_array());
    }

    #[test]
    fn test_nullable_counterpart_is_involution() {
        for kind in ALL_FIELD_KINDS {
            if let Some(other) = kind.nullable_counterpart() {
                assert_eq!(other.nullable_counterpart(), Some(kind));
                assert_ne!(kind.is_nullable(), other.is_nullable());
            }
        }
        assert_eq!(FieldKind::String.nullable_counterpart(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(FieldKind::ArrayOfNullableInt8.to_string(), "ARRAY_OF_NULLABLE_INT8");
        assert_eq!(FieldKind::TimestampWithTimezone.to_string(), "TIMESTAMP_WITH_TIMEZONE");
    }
}
