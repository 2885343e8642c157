/* Schema files with named struct types */

use dstruct::{SchemaRegistry, StructError, Value};
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn geometry() -> SchemaRegistry {
    SchemaRegistry::from_path(fixture("geometry.yaml")).expect("load geometry schema")
}

#[test]
fn types_resolve_in_dependency_order() {
    let registry = geometry();
    assert_eq!(registry.names(), vec!["Point", "Segment", "Sample"]);
    assert_eq!(registry.len(), 3);

    let segment = registry.require("Segment").expect("segment");
    assert_eq!(segment.byte_length(), 40);
    assert_eq!(segment.byte_offset_of("end").expect("end"), 16);
    assert_eq!(segment.byte_offset_of("weight").expect("weight"), 32);
}

#[test]
fn type_descriptions_reach_the_summary() {
    let registry = geometry();
    assert_eq!(
        registry.description_of("Segment"),
        Some("Two points joined by a line")
    );
    assert_eq!(registry.description_of("Point"), None);

    let summary = serde_json::to_value(registry.describe("Segment").expect("summary"))
        .expect("serialize");
    assert_eq!(summary["description"], "Two points joined by a line");
    assert_eq!(summary["byteLength"], 40);
    let point = serde_json::to_value(registry.describe("Point").expect("summary"))
        .expect("serialize");
    assert!(point.get("description").is_none());
}

#[test]
fn nested_fields_share_the_registered_type() {
    let registry = geometry();
    let point = registry.require("Point").expect("point");
    let segment = registry.require("Segment").expect("segment");
    let s = segment
        .create_with([("start", point.create_with([("x", 1.0), ("y", 2.0)]).expect("point"))])
        .expect("segment instance");
    let start = s.get("start").expect("start");
    assert_eq!(
        start.as_struct().expect("struct").get("y").expect("y"),
        Value::Number(2.0)
    );
    assert_eq!(s.get("weight").expect("weight"), Value::Number(1.0));
}

#[test]
fn yaml_field_properties_are_honoured() {
    let registry = geometry();
    let sample = registry.require("Sample").expect("sample");
    assert_eq!(sample.fields(), vec!["tag", "value", "raw", "path"]);
    assert_eq!(sample.enumerable_fields(), vec!["tag", "value", "raw"]);
    assert_eq!(sample.byte_length(), 48);
    assert_eq!(
        sample.layout(),
        "|<uint8>[0,1]|<float64,uint32>[8,8]|<float64>[16,8]|<float64>[24,8]|<float64>[32,8]|<float64>[40,8]|"
    );
}

#[test]
fn unknown_lookup_lists_known_types() {
    let err = geometry().require("Polygon").unwrap_err();
    assert!(matches!(err, StructError::UnknownType { ref name, .. } if name == "Polygon"));
    assert!(err.to_string().contains("Point, Segment, Sample"));
}

#[test]
fn circular_references_fail() {
    let err = SchemaRegistry::from_path(fixture("cycle.yaml")).unwrap_err();
    match err {
        StructError::Schema(message) => assert!(message.contains("Left, Right")),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn json_schemas_are_accepted() {
    let registry = SchemaRegistry::from_json_str(
        r#"{"types": [{"name": "Flag", "fields": [{"name": "on", "type": "bool", "default": true}]}]}"#,
    )
    .expect("json schema");
    let flag = registry.require("Flag").expect("flag");
    let s = flag
        .create_with(Vec::<(String, Value)>::new())
        .expect("instance");
    assert_eq!(s.get("on").expect("on"), Value::Bool(true));
}

#[test]
fn invalid_field_definitions_name_the_type() {
    let err = SchemaRegistry::from_yaml_str(
        "types:\n  - name: Bad\n    fields:\n      - { name: a, type: int8, length: -1 }\n",
    )
    .unwrap_err();
    assert!(err.to_string().contains("type `Bad`"));
}
