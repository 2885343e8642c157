/* Field definitions: user-facing specs, JSON parsing, and normalization */

use crate::errors::{StructError, StructResult};
use crate::struct_type::StructType;
use crate::value::Value;
use dstruct_types::{CastingMode, DataType};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

/* Either a catalog dtype or a nested struct type */
#[derive(Debug, Clone)]
pub enum FieldType {
    Scalar(DataType),
    Struct(StructType),
}

impl FieldType {
    pub fn is_struct(&self) -> bool {
        matches!(self, FieldType::Struct(_))
    }

    pub fn dtype(&self) -> Option<DataType> {
        match self {
            FieldType::Scalar(dtype) => Some(*dtype),
            FieldType::Struct(_) => None,
        }
    }

    /* Size of one element */
    pub fn element_size(&self) -> usize {
        match self {
            FieldType::Scalar(dtype) => dtype.byte_size(),
            FieldType::Struct(ty) => ty.byte_length(),
        }
    }

    pub fn alignment(&self) -> usize {
        match self {
            FieldType::Scalar(dtype) => dtype.alignment(),
            FieldType::Struct(ty) => ty.alignment(),
        }
    }

    /* Label used by the string formats */
    pub fn label(&self) -> &'static str {
        match self {
            FieldType::Scalar(dtype) => dtype.as_str(),
            FieldType::Struct(_) => "struct",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<DataType> for FieldType {
    fn from(dtype: DataType) -> Self {
        FieldType::Scalar(dtype)
    }
}

impl From<StructType> for FieldType {
    fn from(ty: StructType) -> Self {
        FieldType::Struct(ty)
    }
}

impl From<&StructType> for FieldType {
    fn from(ty: &StructType) -> Self {
        FieldType::Struct(ty.clone())
    }
}

/// Declaration of a single field, built with chained setters.
///
/// ```ignore
/// FieldSpec::new("count", DataType::Uint32).writable(false)
/// ```
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: String,
    field_type: FieldType,
    description: Option<String>,
    length: Option<usize>,
    enumerable: bool,
    writable: bool,
    casting_mode: CastingMode,
    default: Option<Value>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, field_type: impl Into<FieldType>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            description: None,
            length: None,
            enumerable: true,
            writable: true,
            casting_mode: CastingMode::default(),
            default: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /* Marks the field as a fixed-length array of `length` elements */
    pub fn length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    pub fn enumerable(mut self, enumerable: bool) -> Self {
        self.enumerable = enumerable;
        self
    }

    pub fn writable(mut self, writable: bool) -> Self {
        self.writable = writable;
        self
    }

    pub fn casting_mode(mut self, mode: CastingMode) -> Self {
        self.casting_mode = mode;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A group of fields sharing one byte range.
#[derive(Debug, Clone)]
pub struct UnionSpec {
    fields: Vec<ElementSpec>,
}

impl UnionSpec {
    pub fn new<I, E>(fields: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<ElementSpec>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

/// Top-level entry of a struct definition.
#[derive(Debug, Clone)]
pub enum ElementSpec {
    Field(FieldSpec),
    Union(UnionSpec),
}

impl ElementSpec {
    fn describe(&self) -> String {
        match self {
            ElementSpec::Field(spec) => spec.name.clone(),
            ElementSpec::Union(_) => "union".to_string(),
        }
    }
}

impl From<FieldSpec> for ElementSpec {
    fn from(spec: FieldSpec) -> Self {
        ElementSpec::Field(spec)
    }
}

impl From<UnionSpec> for ElementSpec {
    fn from(spec: UnionSpec) -> Self {
        ElementSpec::Union(spec)
    }
}

/// A canonical field with its resolved placement.
#[derive(Debug, Clone)]
pub struct Field {
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) field_type: FieldType,
    pub(crate) length: Option<usize>,
    pub(crate) enumerable: bool,
    pub(crate) writable: bool,
    pub(crate) casting_mode: CastingMode,
    pub(crate) default: Option<Value>,
    pub(crate) byte_length: usize,
    pub(crate) alignment: usize,
    pub(crate) byte_offset: usize,
    pub(crate) padding: usize,
    pub(crate) partition: usize,
}

impl Field {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    pub fn length(&self) -> Option<usize> {
        self.length
    }

    pub fn is_array(&self) -> bool {
        self.length.is_some()
    }

    pub fn enumerable(&self) -> bool {
        self.enumerable
    }

    pub fn writable(&self) -> bool {
        self.writable
    }

    pub fn casting_mode(&self) -> CastingMode {
        self.casting_mode
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /* Total bytes: element size times the element count */
    pub fn byte_length(&self) -> usize {
        self.byte_length
    }

    pub fn alignment(&self) -> usize {
        self.alignment
    }

    pub fn byte_offset(&self) -> usize {
        self.byte_offset
    }

    /* Bytes inserted after this field */
    pub fn padding(&self) -> usize {
        self.padding
    }

    pub fn partition(&self) -> usize {
        self.partition
    }

    pub fn element_size(&self) -> usize {
        self.field_type.element_size()
    }

    fn from_spec(spec: &FieldSpec) -> StructResult<Self> {
        if spec.name.is_empty() {
            return Err(StructError::invalid_property(
                "name",
                "must be a nonempty string",
                "",
            ));
        }
        if spec.length == Some(0) {
            return Err(StructError::invalid_property(
                "length",
                "must be a positive integer",
                0,
            ));
        }
        let byte_length = spec.field_type.element_size() * spec.length.unwrap_or(1);
        Ok(Self {
            name: spec.name.clone(),
            description: spec.description.clone(),
            field_type: spec.field_type.clone(),
            length: spec.length,
            enumerable: spec.enumerable,
            writable: spec.writable,
            casting_mode: spec.casting_mode,
            default: spec.default.clone(),
            byte_length,
            alignment: spec.field_type.alignment(),
            byte_offset: 0,
            padding: 0,
            partition: 0,
        })
    }
}

/// Union members after validation.
#[derive(Debug, Clone)]
pub(crate) struct Union {
    pub(crate) fields: Vec<Field>,
}

impl Union {
    fn from_spec(spec: &UnionSpec) -> StructResult<Self> {
        if spec.fields.is_empty() {
            return Err(StructError::EmptyUnion);
        }
        let mut fields: Vec<Field> = Vec::with_capacity(spec.fields.len());
        let mut with_default: Option<String> = None;
        for member in &spec.fields {
            let ElementSpec::Field(member) = member else {
                return Err(StructError::NestedUnion {
                    member: member.describe(),
                });
            };
            if member.default.is_some() {
                if let Some(first) = &with_default {
                    return Err(StructError::MultipleUnionDefaults {
                        first: first.clone(),
                        second: member.name.clone(),
                    });
                }
                with_default = Some(member.name.clone());
            }
            let field = Field::from_spec(member)?;
            if let Some(first) = fields.first() {
                if field.byte_length != first.byte_length {
                    return Err(StructError::UnionLengthMismatch {
                        field: field.name.clone(),
                        expected: first.byte_length,
                        found: field.byte_length,
                    });
                }
            }
            fields.push(field);
        }
        Ok(Self { fields })
    }
}

/// A normalized top-level element.
#[derive(Debug, Clone)]
pub(crate) enum Element {
    Field(Field),
    Union(Union),
}

pub(crate) fn normalize(specs: &[ElementSpec]) -> StructResult<Vec<Element>> {
    specs
        .iter()
        .map(|spec| match spec {
            ElementSpec::Field(field) => Field::from_spec(field).map(Element::Field),
            ElementSpec::Union(union) => Union::from_spec(union).map(Element::Union),
        })
        .collect()
}

/* Recognised keys of a JSON field object, in validation order */
const FIELD_PROPERTIES: [&str; 8] = [
    "name",
    "type",
    "description",
    "length",
    "enumerable",
    "writable",
    "default",
    "castingMode",
];

/// Parses a JSON field list (or a single union object) into element specs.
///
/// `resolve` maps a non-catalog `type` name to a previously defined struct
/// type; returning `None` makes the name invalid.
pub(crate) fn parse_elements(
    json: &JsonValue,
    resolve: &dyn Fn(&str) -> Option<StructType>,
) -> StructResult<Vec<ElementSpec>> {
    match json {
        JsonValue::Array(items) => items
            .iter()
            .map(|item| parse_element(item, resolve))
            .collect(),
        JsonValue::Object(obj) if is_union_object(obj) => {
            Ok(vec![ElementSpec::Union(parse_union(obj, resolve)?)])
        }
        other => Err(StructError::InvalidArgument(format!(
            "First argument must be an array of field objects. Value: `{}`",
            other
        ))),
    }
}

fn parse_element(
    item: &JsonValue,
    resolve: &dyn Fn(&str) -> Option<StructType>,
) -> StructResult<ElementSpec> {
    let obj = item.as_object().ok_or_else(|| {
        StructError::InvalidArgument(format!(
            "Field specifications must be objects. Value: `{}`",
            item
        ))
    })?;
    if is_union_object(obj) {
        Ok(ElementSpec::Union(parse_union(obj, resolve)?))
    } else {
        Ok(ElementSpec::Field(parse_field(obj, resolve)?))
    }
}

fn is_union_object(obj: &Map<String, JsonValue>) -> bool {
    obj.get("type").and_then(JsonValue::as_str) == Some("union")
        && obj.get("fields").is_some_and(JsonValue::is_array)
}

fn parse_union(
    obj: &Map<String, JsonValue>,
    resolve: &dyn Fn(&str) -> Option<StructType>,
) -> StructResult<UnionSpec> {
    let members = obj
        .get("fields")
        .and_then(JsonValue::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let fields = members
        .iter()
        .map(|member| parse_element(member, resolve))
        .collect::<StructResult<Vec<_>>>()?;
    Ok(UnionSpec { fields })
}

fn parse_field(
    obj: &Map<String, JsonValue>,
    resolve: &dyn Fn(&str) -> Option<StructType>,
) -> StructResult<FieldSpec> {
    let mut name: Option<String> = None;
    let mut field_type: Option<FieldType> = None;
    let mut description = None;
    let mut length = None;
    let mut enumerable = true;
    let mut writable = true;
    let mut casting_mode = CastingMode::default();

    for key in FIELD_PROPERTIES {
        let Some(value) = obj.get(key) else {
            continue;
        };
        match key {
            "name" => match value.as_str() {
                Some(s) if !s.is_empty() => name = Some(s.to_string()),
                _ => {
                    return Err(StructError::invalid_property(
                        "name",
                        "must be a nonempty string",
                        value,
                    ))
                }
            },
            "type" => {
                let resolved = value.as_str().and_then(|s| match s.parse::<DataType>() {
                    Ok(dtype) => Some(FieldType::Scalar(dtype)),
                    Err(_) => resolve(s).map(FieldType::Struct),
                });
                match resolved {
                    Some(ty) => field_type = Some(ty),
                    None => {
                        return Err(StructError::invalid_property(
                            "type",
                            format!(
                                "must be either a struct type or one of the following: \"{}\"",
                                DataType::catalog_names()
                            ),
                            value,
                        ))
                    }
                }
            }
            "description" => match value.as_str() {
                Some(s) => description = Some(s.to_string()),
                None => {
                    return Err(StructError::invalid_property(
                        "description",
                        "must be a string",
                        value,
                    ))
                }
            },
            "length" => match value.as_u64() {
                Some(n) if n > 0 => length = Some(n as usize),
                _ => {
                    return Err(StructError::invalid_property(
                        "length",
                        "must be a positive integer",
                        value,
                    ))
                }
            },
            "enumerable" => {
                enumerable = value.as_bool().ok_or_else(|| {
                    StructError::invalid_property("enumerable", "must be a boolean", value)
                })?
            }
            "writable" => {
                writable = value.as_bool().ok_or_else(|| {
                    StructError::invalid_property("writable", "must be a boolean", value)
                })?
            }
            "castingMode" => {
                casting_mode = value
                    .as_str()
                    .and_then(|s| s.parse::<CastingMode>().ok())
                    .ok_or_else(|| {
                        StructError::invalid_property(
                            "castingMode",
                            format!(
                                "must be one of the following: \"{}\"",
                                CastingMode::names()
                            ),
                            value,
                        )
                    })?
            }
            /* "default" is interpreted once the type is known */
            _ => {}
        }
    }

    let spec_text = JsonValue::Object(obj.clone()).to_string();
    let name = name.ok_or_else(|| StructError::MissingProperty {
        property: "name",
        spec: spec_text.clone(),
    })?;
    let field_type = field_type.ok_or(StructError::MissingProperty {
        property: "type",
        spec: spec_text,
    })?;

    let default = match obj.get("default") {
        Some(json) => Value::from_json(json, &field_type, length)?,
        None => None,
    };

    Ok(FieldSpec {
        name,
        field_type,
        description,
        length,
        enumerable,
        writable,
        casting_mode,
        default,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn no_refs(_: &str) -> Option<StructType> {
        None
    }

    #[test]
    fn parses_field_properties() {
        let specs = parse_elements(
            &json!([{
                "name": "a",
                "type": "uint16",
                "length": 3,
                "writable": false,
                "castingMode": "same-kind",
                "description": "counts"
            }]),
            &no_refs,
        )
        .unwrap();
        let ElementSpec::Field(spec) = &specs[0] else {
            panic!("expected a field");
        };
        assert_eq!(spec.name, "a");
        assert_eq!(spec.length, Some(3));
        assert!(!spec.writable);
        assert!(spec.enumerable);
        assert_eq!(spec.casting_mode, CastingMode::SameKind);
        assert_eq!(spec.description.as_deref(), Some("counts"));
    }

    #[test]
    fn missing_type_is_reported() {
        let err = parse_elements(&json!([{ "name": "a" }]), &no_refs).unwrap_err();
        assert!(matches!(
            err,
            StructError::MissingProperty { property: "type", .. }
        ));
    }

    #[test]
    fn invalid_values_name_the_property() {
        let cases = [
            (json!([{ "name": "", "type": "int8" }]), "name"),
            (json!([{ "name": "a", "type": "int128" }]), "type"),
            (json!([{ "name": "a", "type": "int8", "length": 0 }]), "length"),
            (json!([{ "name": "a", "type": "int8", "length": 1.5 }]), "length"),
            (json!([{ "name": "a", "type": "int8", "writable": "yes" }]), "writable"),
            (json!([{ "name": "a", "type": "int8", "castingMode": "loose" }]), "castingMode"),
        ];
        for (json, expected) in cases {
            match parse_elements(&json, &no_refs) {
                Err(StructError::InvalidProperty { property, .. }) => assert_eq!(property, expected),
                other => panic!("unexpected result for {}: {:?}", json, other),
            }
        }
    }

    #[test]
    fn non_object_fields_are_rejected() {
        assert!(matches!(
            parse_elements(&json!([1]), &no_refs),
            Err(StructError::InvalidArgument(_))
        ));
        assert!(matches!(
            parse_elements(&json!("int8"), &no_refs),
            Err(StructError::InvalidArgument(_))
        ));
    }

    #[test]
    fn union_rules_are_enforced() {
        let empty = UnionSpec::new(Vec::<FieldSpec>::new());
        assert!(matches!(
            normalize(&[ElementSpec::from(empty)]),
            Err(StructError::EmptyUnion)
        ));

        let nested = UnionSpec::new([ElementSpec::Union(UnionSpec::new([FieldSpec::new(
            "x",
            DataType::Int8,
        )]))]);
        assert!(matches!(
            normalize(&[ElementSpec::from(nested)]),
            Err(StructError::NestedUnion { .. })
        ));

        let uneven = UnionSpec::new([
            FieldSpec::new("x", DataType::Int8),
            FieldSpec::new("y", DataType::Int16),
        ]);
        assert!(matches!(
            normalize(&[ElementSpec::from(uneven)]),
            Err(StructError::UnionLengthMismatch { expected: 1, found: 2, .. })
        ));

        let defaults = UnionSpec::new([
            FieldSpec::new("x", DataType::Int8).default_value(1),
            FieldSpec::new("y", DataType::Uint8).default_value(2),
        ]);
        assert!(matches!(
            normalize(&[ElementSpec::from(defaults)]),
            Err(StructError::MultipleUnionDefaults { .. })
        ));
    }

    #[test]
    fn array_byte_length_multiplies_element_size() {
        let elements = normalize(&[ElementSpec::from(
            FieldSpec::new("a", DataType::Float32).length(5),
        )]).unwrap();
        let Element::Field(field) = &elements[0] else {
            panic!("expected a field");
        };
        assert_eq!(field.byte_length, 20);
        assert_eq!(field.alignment, 4);
    }
}
