/* Struct instances: a struct type bound to a byte view */

use crate::accessor;
use crate::buffer::{BufferView, ByteBuffer};
use crate::errors::{StructError, StructResult};
use crate::format::{json_object, StringFormat};
use crate::struct_type::StructType;
use crate::value::Value;
use serde_json::Value as JsonValue;
use std::fmt;

/// A view of `byte_length` bytes interpreted through a [`StructType`].
///
/// Instances are handles: clones, nested-struct getters and array views
/// all alias the same storage, so writes through any of them are visible
/// through the others.
#[derive(Clone)]
pub struct Struct {
    ty: StructType,
    view: BufferView,
}

impl Struct {
    pub(crate) fn bind(ty: StructType, view: BufferView) -> Self {
        Self { ty, view }
    }

    pub fn struct_type(&self) -> &StructType {
        &self.ty
    }

    pub fn byte_length(&self) -> usize {
        self.view.byte_length()
    }

    pub fn buffer(&self) -> &ByteBuffer {
        self.view.buffer()
    }

    pub fn view(&self) -> &BufferView {
        &self.view
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.view.to_vec()
    }

    pub fn get(&self, name: &str) -> StructResult<Value> {
        let index = self.ty.index_of(name)?;
        self.get_at(index)
    }

    /// Assigns a field. Read-only fields reject the write.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> StructResult<()> {
        let index = self.ty.index_of(name)?;
        let field = &self.ty.field_list()[index];
        if !field.writable {
            return Err(StructError::ReadOnlyField {
                field: field.name.clone(),
            });
        }
        self.set_at(index, value.into())
    }

    pub(crate) fn get_at(&self, index: usize) -> StructResult<Value> {
        let field = &self.ty.field_list()[index];
        accessor::get(field, self.ty.accessor(index), &self.view)
    }

    pub(crate) fn set_at(&self, index: usize, value: Value) -> StructResult<()> {
        let field = &self.ty.field_list()[index];
        accessor::set(field, self.ty.accessor(index), &self.view, value)
    }

    /// `(name, value)` pairs of the enumerable fields, in field order.
    pub fn entries(&self) -> StructResult<Vec<(String, Value)>> {
        self.ty
            .field_list()
            .iter()
            .enumerate()
            .filter(|(_, field)| field.enumerable)
            .map(|(index, field)| self.get_at(index).map(|value| (field.name.clone(), value)))
            .collect()
    }

    /// Every field (enumerable or not) as a JSON object.
    pub fn to_json(&self) -> StructResult<JsonValue> {
        json_object(self)
    }

    pub fn format(&self, format: StringFormat) -> String {
        match format {
            StringFormat::Default => self.to_string(),
            StringFormat::Linear => self.ty.linear(),
            StringFormat::Layout => self.ty.layout(),
        }
    }

    /* Same type and same bytes */
    pub(crate) fn same_contents(&self, other: &Struct) -> bool {
        self.ty.same_type(&other.ty) && self.to_bytes() == other.to_bytes()
    }
}

impl fmt::Display for Struct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<Struct>")
    }
}

impl fmt::Debug for Struct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Struct")
            .field("fields", &self.ty.fields())
            .field("byte_offset", &self.view.byte_offset())
            .field("byte_length", &self.view.byte_length())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldSpec;
    use dstruct_types::DataType;

    #[test]
    fn read_only_fields_reject_public_writes() {
        let ty = StructType::new([
            FieldSpec::new("id", DataType::Uint32).writable(false),
            FieldSpec::new("n", DataType::Uint32),
        ])
        .unwrap();
        let s = ty.create_with([("id", 42u32)]).unwrap();
        assert_eq!(s.get("id").unwrap(), Value::Number(42.0));
        assert!(matches!(
            s.set("id", 1u32),
            Err(StructError::ReadOnlyField { .. })
        ));
        assert_eq!(s.get("id").unwrap(), Value::Number(42.0));
    }

    #[test]
    fn entries_skip_hidden_fields() {
        let ty = StructType::new([
            FieldSpec::new("a", DataType::Int8),
            FieldSpec::new("b", DataType::Int8).enumerable(false),
        ])
        .unwrap();
        let names: Vec<String> = ty
            .create()
            .entries()
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["a"]);
        assert_eq!(ty.enumerable_fields(), vec!["a"]);
    }

    #[test]
    fn default_format_is_a_placeholder() {
        let ty = StructType::new([FieldSpec::new("a", DataType::Int8)]).unwrap();
        let s = ty.create();
        assert_eq!(s.to_string(), "<Struct>");
        assert_eq!(s.format(StringFormat::Layout), "|<int8>[0,1]|");
    }
}
