/* Struct types: immutable layouts built once from a field list */

use crate::accessor::AccessorKind;
use crate::buffer::{BufferView, ByteBuffer};
use crate::errors::{StructError, StructResult};
use crate::field::{normalize, parse_elements, ElementSpec, Field};
use crate::format::{layout_string, linear_string};
use crate::instance::Struct;
use crate::layout;
use crate::value::Value;
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use std::fmt;
use std::rc::Rc;
use tracing::debug;

struct StructTypeInner {
    fields: Vec<Field>,
    accessors: Vec<AccessorKind>,
    names: IndexMap<String, usize>,
    byte_length: usize,
    alignment: usize,
}

/// A composite type with a fixed C-style layout.
///
/// Cloning is cheap and yields the same type; equality is identity, so two
/// types built from identical field lists are still distinct.
#[derive(Clone)]
pub struct StructType {
    inner: Rc<StructTypeInner>,
}

impl StructType {
    /// Builds a struct type from field and union specs.
    pub fn new<I, E>(elements: I) -> StructResult<Self>
    where
        I: IntoIterator<Item = E>,
        E: Into<ElementSpec>,
    {
        let specs: Vec<ElementSpec> = elements.into_iter().map(Into::into).collect();
        let layout = layout::compute(normalize(&specs)?)?;
        let accessors = layout.fields.iter().map(AccessorKind::for_field).collect();
        debug!(
            fields = layout.fields.len(),
            byte_length = layout.byte_length,
            alignment = layout.alignment,
            "built struct type"
        );
        Ok(Self {
            inner: Rc::new(StructTypeInner {
                fields: layout.fields,
                accessors,
                names: layout.names,
                byte_length: layout.byte_length,
                alignment: layout.alignment,
            }),
        })
    }

    /// Builds a struct type from a JSON field list. Field `type`s must be
    /// catalog dtypes.
    pub fn from_json(json: &JsonValue) -> StructResult<Self> {
        Self::from_json_with(json, |_| None)
    }

    /// Like [`StructType::from_json`], resolving non-catalog `type` names
    /// through `resolve`.
    pub fn from_json_with(
        json: &JsonValue,
        resolve: impl Fn(&str) -> Option<StructType>,
    ) -> StructResult<Self> {
        Self::new(parse_elements(json, &resolve)?)
    }

    pub fn byte_length(&self) -> usize {
        self.inner.byte_length
    }

    /* Zero for a type without fields */
    pub fn alignment(&self) -> usize {
        self.inner.alignment
    }

    /// Field names in flattened order (union members included).
    pub fn fields(&self) -> Vec<&str> {
        self.inner.names.keys().map(String::as_str).collect()
    }

    /// Names of the fields listed by [`Struct::entries`].
    pub fn enumerable_fields(&self) -> Vec<&str> {
        self.inner
            .fields
            .iter()
            .filter(|f| f.enumerable)
            .map(|f| f.name.as_str())
            .collect()
    }

    pub fn field_list(&self) -> &[Field] {
        &self.inner.fields
    }

    pub fn field(&self, name: &str) -> StructResult<&Field> {
        let index = self.index_of(name)?;
        Ok(&self.inner.fields[index])
    }

    pub fn byte_length_of(&self, name: &str) -> StructResult<usize> {
        Ok(self.field(name)?.byte_length)
    }

    pub fn byte_offset_of(&self, name: &str) -> StructResult<usize> {
        Ok(self.field(name)?.byte_offset)
    }

    pub fn description_of(&self, name: &str) -> StructResult<Option<&str>> {
        Ok(self.field(name)?.description())
    }

    /// Compact `|<dtype>[offset,length]|...` rendering of the layout.
    pub fn layout(&self) -> String {
        layout_string(self)
    }

    /// Byte-by-byte table of the layout.
    pub fn linear(&self) -> String {
        linear_string(self)
    }

    /* True when both handles refer to one type */
    pub fn same_type(&self, other: &StructType) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn index_of(&self, name: &str) -> StructResult<usize> {
        if self.inner.fields.is_empty() {
            return Err(StructError::NoFields);
        }
        self.inner
            .names
            .get(name)
            .copied()
            .ok_or_else(|| StructError::UnknownField {
                name: name.to_string(),
                available: self.fields().join(", "),
            })
    }

    pub(crate) fn accessor(&self, index: usize) -> AccessorKind {
        self.inner.accessors[index]
    }

    /// A zero-filled instance.
    pub fn create(&self) -> Struct {
        let buffer = ByteBuffer::new(self.byte_length());
        Struct::bind(self.clone(), BufferView::whole(&buffer))
    }

    /// An instance over caller storage starting at `byte_offset`. The
    /// optional `byte_length` caps the usable capacity.
    pub fn create_in(
        &self,
        buffer: &ByteBuffer,
        byte_offset: usize,
        byte_length: Option<usize>,
    ) -> StructResult<Struct> {
        let remaining = buffer.len().saturating_sub(byte_offset);
        let available = byte_length.map_or(remaining, |len| len.min(remaining));
        if byte_offset > buffer.len() || available < self.byte_length() {
            return Err(StructError::InsufficientCapacity {
                required: self.byte_length(),
                available,
            });
        }
        let view = BufferView::new(buffer, byte_offset, self.byte_length())?;
        Ok(Struct::bind(self.clone(), view))
    }

    /// An instance initialized from `(name, value)` pairs.
    ///
    /// At most one member of each union may be given a value. Fields left
    /// unset fall back to their defaults, unless another member of their
    /// union was set. Values are applied in field order with the usual
    /// cast checks; read-only fields are writable here.
    pub fn create_with<I, K, V>(&self, values: I) -> StructResult<Struct>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut provided: IndexMap<String, Value> = IndexMap::new();
        for (name, value) in values {
            provided.insert(name.into(), value.into());
        }
        let resolved = self.resolve_initializers(provided)?;
        let instance = self.create();
        for (index, value) in resolved.into_iter().enumerate() {
            if let Some(value) = value {
                instance.set_at(index, value)?;
            }
        }
        Ok(instance)
    }

    fn resolve_initializers(
        &self,
        mut provided: IndexMap<String, Value>,
    ) -> StructResult<Vec<Option<Value>>> {
        let fields = &self.inner.fields;
        let partitions = fields.iter().map(|f| f.partition).max().map_or(0, |p| p + 1);
        let mut claimed: Vec<Option<usize>> = vec![None; partitions];
        let mut slots: Vec<Option<Value>> = vec![None; fields.len()];

        for (index, field) in fields.iter().enumerate() {
            let Some(value) = provided.swap_remove(&field.name) else {
                continue;
            };
            if let Some(first) = claimed[field.partition] {
                return Err(StructError::UnionConflict {
                    first: fields[first].name.clone(),
                    second: field.name.clone(),
                });
            }
            claimed[field.partition] = Some(index);
            slots[index] = Some(value);
        }

        for (index, field) in fields.iter().enumerate() {
            if claimed[field.partition].is_none() {
                if let Some(default) = &field.default {
                    slots[index] = Some(default.clone());
                }
            }
        }

        if !provided.is_empty() {
            debug!(
                ignored = ?provided.keys().collect::<Vec<_>>(),
                "initializer names without a matching field"
            );
        }
        Ok(slots)
    }

    /// Rebuilds an instance from the object produced by [`Struct::to_json`].
    pub fn create_from_json(&self, json: &JsonValue) -> StructResult<Struct> {
        let obj = json.as_object().ok_or_else(|| {
            StructError::InvalidArgument(format!(
                "Initializer must be a JSON object. Value: `{}`",
                json
            ))
        })?;
        let mut values = Vec::new();
        for field in &self.inner.fields {
            let Some(item) = obj.get(&field.name) else {
                continue;
            };
            if let Some(value) = Value::from_json(item, &field.field_type, field.length)? {
                values.push((field.name.clone(), value));
            }
        }
        self.create_with(values)
    }

    /// Storage backing an instance of this type.
    pub fn buffer_of(&self, instance: &Struct) -> StructResult<ByteBuffer> {
        Ok(self.view_of(instance)?.buffer().clone())
    }

    /// View bound by an instance of this type.
    pub fn view_of(&self, instance: &Struct) -> StructResult<BufferView> {
        if !self.same_type(instance.struct_type()) {
            return Err(StructError::ForeignInstance);
        }
        Ok(instance.view().clone())
    }
}

impl PartialEq for StructType {
    fn eq(&self, other: &Self) -> bool {
        self.same_type(other)
    }
}

impl Eq for StructType {}

impl fmt::Debug for StructType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructType")
            .field("byte_length", &self.byte_length())
            .field("alignment", &self.alignment())
            .field("fields", &self.fields())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldSpec, UnionSpec};
    use dstruct_types::DataType;

    #[test]
    fn lookups_on_an_empty_type_fail() {
        let ty = StructType::new(Vec::<ElementSpec>::new()).unwrap();
        assert_eq!(ty.byte_length(), 0);
        assert!(matches!(ty.byte_offset_of("a"), Err(StructError::NoFields)));
    }

    #[test]
    fn unknown_names_list_the_alternatives() {
        let ty = StructType::new([
            FieldSpec::new("a", DataType::Int8),
            FieldSpec::new("b", DataType::Int8),
        ])
        .unwrap();
        match ty.byte_length_of("c") {
            Err(StructError::UnknownField { name, available }) => {
                assert_eq!(name, "c");
                assert_eq!(available, "a, b");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn capacity_is_checked_against_the_offset() {
        let ty = StructType::new([FieldSpec::new("a", DataType::Float64)]).unwrap();
        let buffer = ByteBuffer::new(12);
        assert!(ty.create_in(&buffer, 4, None).is_ok());
        assert!(matches!(
            ty.create_in(&buffer, 5, None),
            Err(StructError::InsufficientCapacity { required: 8, available: 7 })
        ));
        assert!(matches!(
            ty.create_in(&buffer, 0, Some(4)),
            Err(StructError::InsufficientCapacity { required: 8, available: 4 })
        ));
    }

    #[test]
    fn defaults_fill_unclaimed_partitions_only() {
        let ty = StructType::new([
            ElementSpec::from(FieldSpec::new("n", DataType::Int16).default_value(7)),
            ElementSpec::from(UnionSpec::new([
                FieldSpec::new("x", DataType::Int32).default_value(1),
                FieldSpec::new("y", DataType::Uint32),
            ])),
        ])
        .unwrap();

        let s = ty.create_with([("y", 9u32)]).unwrap();
        assert_eq!(s.get("n").unwrap(), Value::Number(7.0));
        assert_eq!(s.get("y").unwrap(), Value::Number(9.0));

        let s = ty.create_with(Vec::<(String, Value)>::new()).unwrap();
        assert_eq!(s.get("x").unwrap(), Value::Number(1.0));
    }

    #[test]
    fn identical_field_lists_make_distinct_types() {
        let a = StructType::new([FieldSpec::new("a", DataType::Int8)]).unwrap();
        let b = StructType::new([FieldSpec::new("a", DataType::Int8)]).unwrap();
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert!(matches!(b.view_of(&a.create()), Err(StructError::ForeignInstance)));
    }
}
