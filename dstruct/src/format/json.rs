use crate::errors::StructResult;
use crate::instance::Struct;
use crate::struct_type::StructType;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

/* Field name -> current value, in declaration order, union members included */
pub(crate) fn json_object(instance: &Struct) -> StructResult<JsonValue> {
    let mut out = Map::new();
    for (index, field) in instance.struct_type().field_list().iter().enumerate() {
        let value = instance.get_at(index)?;
        out.insert(field.name.clone(), value.to_json()?);
    }
    Ok(JsonValue::Object(out))
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
    #[serde(rename = "byteOffset")]
    pub byte_offset: usize,
    #[serde(rename = "byteLength")]
    pub byte_length: usize,
    pub alignment: usize,
    pub padding: usize,
    pub partition: usize,
    #[serde(rename = "castingMode")]
    pub casting_mode: String,
    pub enumerable: bool,
    pub writable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "byteLength")]
    pub byte_length: usize,
    pub alignment: usize,
    pub layout: String,
    pub fields: Vec<FieldSummary>,
}

/// Static metadata of a struct type, ready for serialization.
pub fn describe(ty: &StructType) -> TypeSummary {
    let fields = ty
        .field_list()
        .iter()
        .map(|f| FieldSummary {
            name: f.name.clone(),
            type_name: f.field_type.label().to_string(),
            length: f.length,
            byte_offset: f.byte_offset,
            byte_length: f.byte_length,
            alignment: f.alignment,
            padding: f.padding,
            partition: f.partition,
            casting_mode: f.casting_mode.to_string(),
            enumerable: f.enumerable,
            writable: f.writable,
            description: f.description.clone(),
        })
        .collect();
    TypeSummary {
        description: None,
        byte_length: ty.byte_length(),
        alignment: ty.alignment(),
        layout: ty.layout(),
        fields,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{ElementSpec, FieldSpec, UnionSpec};
    use dstruct_types::{Complex128, DataType};
    use serde_json::json;

    #[test]
    fn union_members_all_appear() {
        let ty = StructType::new([ElementSpec::from(UnionSpec::new([
            FieldSpec::new("b", DataType::Uint8),
            FieldSpec::new("flag", DataType::Bool),
        ]))])
        .unwrap();
        let s = ty.create_with([("b", 1u8)]).unwrap();
        assert_eq!(s.to_json().unwrap(), json!({ "b": 1, "flag": true }));
    }

    #[test]
    fn complex_fields_use_the_structural_form() {
        let ty = StructType::new([FieldSpec::new("z", DataType::Complex128)]).unwrap();
        let s = ty.create_with([("z", Complex128::new(1.5, -2.0))]).unwrap();
        assert_eq!(
            s.to_json().unwrap(),
            json!({ "z": { "type": "Complex128", "re": 1.5, "im": -2.0 } })
        );
    }

    #[test]
    fn summary_lists_placement() {
        let ty = StructType::new([
            FieldSpec::new("a", DataType::Int8),
            FieldSpec::new("b", DataType::Float64).description("value"),
        ])
        .unwrap();
        let summary = serde_json::to_value(describe(&ty)).unwrap();
        assert_eq!(summary["byteLength"], json!(16));
        assert_eq!(summary["fields"][0]["padding"], json!(7));
        assert_eq!(summary["fields"][1]["byteOffset"], json!(8));
        assert_eq!(summary["fields"][1]["description"], json!("value"));
    }
}
