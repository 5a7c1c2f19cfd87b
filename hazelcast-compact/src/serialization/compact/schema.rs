//! Schema definition and layout computation for Compact records.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{CompactError, Result};
use crate::serialization::{DataInput, DataOutput};

use super::fingerprint;
use super::FieldKind;

/// Descriptor for a field within a Compact schema.
///
/// Layout positions are assigned when the descriptor becomes part of a
/// [`Schema`]; until then they are `-1`. Equality only considers the name and
/// the kind.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FieldDescriptor {
    name: String,
    kind: FieldKind,
    offset: i32,
    bit_offset: i8,
    index: i32,
}

impl FieldDescriptor {
    /// Creates a new, not yet laid out, field descriptor.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            offset: -1,
            bit_offset: -1,
            index: -1,
        }
    }

    /// Returns the field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the field kind.
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Byte offset inside the fixed region, or `-1` for variable-size fields.
    pub fn offset(&self) -> i32 {
        self.offset
    }

    /// Bit inside the byte at [`offset`](Self::offset) for booleans, `-1` otherwise.
    pub fn bit_offset(&self) -> i8 {
        self.bit_offset
    }

    /// Position in the offset table for variable-size fields, `-1` otherwise.
    pub fn index(&self) -> i32 {
        self.index
    }
}

impl PartialEq for FieldDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.kind == other.kind
    }
}

impl Eq for FieldDescriptor {}

impl Hash for FieldDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.kind.hash(state);
    }
}

/// Immutable layout of a Compact record type.
///
/// Fields are kept sorted by name. The constructor assigns fixed-region
/// offsets (widest fields first, then bit-packed booleans), variable-field
/// indices and the fingerprint; nothing changes afterwards, so a schema can be
/// shared freely between threads.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Schema {
    type_name: String,
    fields: Vec<FieldDescriptor>,
    #[cfg_attr(feature = "serde", serde(skip))]
    field_indices: HashMap<String, usize>,
    fixed_size_fields_length: usize,
    number_var_size_fields: usize,
    schema_id: i64,
}

impl Schema {
    /// Creates a schema from an unordered set of field descriptors.
    ///
    /// Fails if two descriptors share a name.
    pub fn new(type_name: impl Into<String>, mut fields: Vec<FieldDescriptor>) -> Result<Self> {
        let type_name = type_name.into();
        fields.sort_by(|a, b| a.name.cmp(&b.name));

        if let Some(pair) = fields.windows(2).find(|pair| pair[0].name == pair[1].name) {
            return Err(CompactError::DuplicateField {
                type_name,
                field: pair[0].name.clone(),
            });
        }

        let mut fixed = Vec::new();
        let mut booleans = Vec::new();
        let mut variable = Vec::new();
        for (i, field) in fields.iter().enumerate() {
            match field.kind.fixed_size() {
                Some(0) => booleans.push(i),
                Some(_) => fixed.push(i),
                None => variable.push(i),
            }
        }

        // Stable, so equally wide fields stay in name order.
        fixed.sort_by_key(|&i| std::cmp::Reverse(fields[i].kind.fixed_size().unwrap_or(0)));

        let mut offset = 0usize;
        for i in fixed {
            fields[i].offset = offset as i32;
            offset += fields[i].kind.fixed_size().unwrap_or(0);
        }

        let mut bit = 0usize;
        for i in booleans {
            fields[i].offset = offset as i32;
            fields[i].bit_offset = (bit % 8) as i8;
            bit += 1;
            if bit % 8 == 0 {
                offset += 1;
            }
        }
        if bit % 8 != 0 {
            offset += 1;
        }

        let number_var_size_fields = variable.len();
        for (index, i) in variable.into_iter().enumerate() {
            fields[i].index = index as i32;
        }

        let field_indices = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();
        let schema_id = fingerprint::of_schema(&type_name, &fields);

        tracing::trace!(
            type_name = %type_name,
            schema_id,
            fixed_size_fields_length = offset,
            number_var_size_fields,
            "computed schema layout"
        );

        Ok(Self {
            type_name,
            fields,
            field_indices,
            fixed_size_fields_length: offset,
            number_var_size_fields,
            schema_id,
        })
    }

    /// Returns the type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns the schema ID (fingerprint).
    pub fn schema_id(&self) -> i64 {
        self.schema_id
    }

    /// Returns the number of fields.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Returns all field descriptors, sorted by name.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.field_indices.get(name).map(|&i| &self.fields[i])
    }

    /// Position of a field in [`fields`](Self::fields).
    pub(crate) fn position_of(&self, name: &str) -> Option<usize> {
        self.field_indices.get(name).copied()
    }

    /// Returns true if a field with the given name exists.
    pub fn has_field(&self, name: &str) -> bool {
        self.field_indices.contains_key(name)
    }

    /// Total bytes of the fixed region, bit-packed booleans included.
    pub fn fixed_size_fields_length(&self) -> usize {
        self.fixed_size_fields_length
    }

    /// Number of fields stored in the variable region.
    pub fn number_var_size_fields(&self) -> usize {
        self.number_var_size_fields
    }

    /// Writes the structural description used for schema exchange.
    ///
    /// The fingerprint of these bytes equals [`schema_id`](Self::schema_id).
    pub fn write_data<O: DataOutput>(&self, output: &mut O) -> Result<()> {
        output.write_string(&self.type_name)?;
        output.write_int(self.fields.len() as i32)?;
        for field in &self.fields {
            output.write_string(&field.name)?;
            output.write_int(field.kind.id())?;
        }
        Ok(())
    }

    /// Reads a schema written by [`write_data`](Self::write_data) and recomputes its layout.
    pub fn read_data<I: DataInput>(input: &mut I) -> Result<Self> {
        let type_name = input.read_string()?;
        let count = input.read_int()?;
        if count < 0 {
            return Err(CompactError::Serialization(format!(
                "invalid field count {} for schema '{}'",
                count, type_name
            )));
        }
        let mut fields = Vec::new();
        for _ in 0..count {
            let name = input.read_string()?;
            let kind = FieldKind::from_id(input.read_int()?)?;
            fields.push(FieldDescriptor::new(name, kind));
        }
        Self::new(type_name, fields)
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.schema_id == other.schema_id
            && self.type_name == other.type_name
            && self.fields == other.fields
    }
}

impl Eq for Schema {}

impl Hash for Schema {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.schema_id.hash(state);
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Schema {{ type_name: {}, schema_id: {}, fields: [", self.type_name, self.schema_id)?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", field.name, field.kind)?;
        }
        f.write_str("] }")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::{ObjectDataInput, ObjectDataOutput};

    fn fd(name: &str, kind: FieldKind) -> FieldDescriptor {
        FieldDescriptor::new(name, kind)
    }

    #[test]
    fn test_fields_sorted_by_name() {
        let schema = Schema::new(
            "T",
            vec![fd("c", FieldKind::Int8), fd("a", FieldKind::String), fd("b", FieldKind::Int64)],
        )
        .unwrap();
        let names: Vec<_> = schema.fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_fixed_fields_ordered_by_descending_width() {
        let schema = Schema::new(
            "T",
            vec![
                fd("a", FieldKind::Int8),
                fd("b", FieldKind::Int16),
                fd("c", FieldKind::Int32),
                fd("d", FieldKind::Int64),
                fd("e", FieldKind::Float32),
                fd("f", FieldKind::Float64),
            ],
        )
        .unwrap();
        let offset = |n: &str| schema.field(n).unwrap().offset();
        assert_eq!(offset("d"), 0);
        assert_eq!(offset("f"), 8);
        assert_eq!(offset("c"), 16);
        assert_eq!(offset("e"), 20);
        assert_eq!(offset("b"), 24);
        assert_eq!(offset("a"), 26);
        assert_eq!(schema.fixed_size_fields_length(), 27);
        assert_eq!(schema.number_var_size_fields(), 0);
    }

    #[test]
    fn test_booleans_packed_after_fixed_fields() {
        let mut fields: Vec<_> = (0..9).map(|i| fd(&format!("b{}", i), FieldKind::Boolean)).collect();
        fields.push(fd("x", FieldKind::Int32));
        let schema = Schema::new("T", fields).unwrap();

        for i in 0..8 {
            let field = schema.field(&format!("b{}", i)).unwrap();
            assert_eq!(field.offset(), 4);
            assert_eq!(field.bit_offset(), i as i8);
        }
        let ninth = schema.field("b8").unwrap();
        assert_eq!(ninth.offset(), 5);
        assert_eq!(ninth.bit_offset(), 0);
        assert_eq!(schema.fixed_size_fields_length(), 6);
    }

    #[test]
    fn test_exactly_eight_booleans_take_one_byte() {
        let fields: Vec<_> = (0..8).map(|i| fd(&format!("b{}", i), FieldKind::Boolean)).collect();
        let schema = Schema::new("T", fields).unwrap();
        assert_eq!(schema.fixed_size_fields_length(), 1);
    }

    #[test]
    fn test_variable_fields_indexed_in_name_order() {
        let schema = Schema::new(
            "T",
            vec![
                fd("z", FieldKind::String),
                fd("m", FieldKind::NullableInt32),
                fd("a", FieldKind::ArrayOfInt8),
                fd("k", FieldKind::Int32),
            ],
        )
        .unwrap();
        assert_eq!(schema.field("a").unwrap().index(), 0);
        assert_eq!(schema.field("m").unwrap().index(), 1);
        assert_eq!(schema.field("z").unwrap().index(), 2);
        assert_eq!(schema.field("k").unwrap().index(), -1);
        assert_eq!(schema.field("k").unwrap().offset(), 0);
        assert_eq!(schema.field("z").unwrap().offset(), -1);
        assert_eq!(schema.number_var_size_fields(), 3);
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let err = Schema::new("T", vec![fd("x", FieldKind::Int32), fd("x", FieldKind::String)])
            .unwrap_err();
        assert!(matches!(err, CompactError::DuplicateField { ref field, .. } if field == "x"));
    }

    #[test]
    fn test_equality_ignores_declaration_order() {
        let a = Schema::new("T", vec![fd("x", FieldKind::Int32), fd("y", FieldKind::String)]).unwrap();
        let b = Schema::new("T", vec![fd("y", FieldKind::String), fd("x", FieldKind::Int32)]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.schema_id(), b.schema_id());
    }

    #[test]
    fn test_descriptor_equality_ignores_layout() {
        let schema = Schema::new("T", vec![fd("x", FieldKind::Int32)]).unwrap();
        assert_eq!(schema.field("x").unwrap(), &fd("x", FieldKind::Int32));
        assert_ne!(schema.field("x").unwrap(), &fd("x", FieldKind::Int64));
    }

    #[test]
    fn test_wire_form_fingerprint_matches_schema_id() {
        let schema = Schema::new(
            "SomeType",
            vec![
                fd("id", FieldKind::Int32),
                fd("name", FieldKind::String),
                fd("age", FieldKind::Int8),
                fd("times", FieldKind::ArrayOfTimestamp),
            ],
        )
        .unwrap();
        let mut output = ObjectDataOutput::new();
        schema.write_data(&mut output).unwrap();
        assert_eq!(
            fingerprint::rabin_fingerprint_64(output.as_bytes()),
            schema.schema_id()
        );
        assert_eq!(schema.schema_id(), 3662264393229655598);

        let mut input = ObjectDataInput::new(output.as_bytes());
        let read = Schema::read_data(&mut input).unwrap();
        assert_eq!(read, schema);
        assert_eq!(read.field("id").unwrap().offset(), 0);
    }

    #[test]
    fn test_read_data_rejects_negative_count() {
        let mut output = ObjectDataOutput::new();
        output.write_string("T").unwrap();
        output.write_int(-1).unwrap();
        let mut input = ObjectDataInput::new(output.as_bytes());
        assert!(Schema::read_data(&mut input).is_err());
    }

    #[test]
    fn test_display() {
        let schema = Schema::new("T", vec![fd("x", FieldKind::Int32)]).unwrap();
        let text = schema.to_string();
        assert!(text.contains("type_name: T"));
        assert!(text.contains("x: INT32"));
    }
}
