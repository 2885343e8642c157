/* Field getters/setters, construction rules, and cast checks */

use dstruct::{
    ByteBuffer, CastingMode, Complex128, Complex64, DataType, ElementSpec, FieldSpec,
    StructError, StructType, TypedArray, UnionSpec, Value,
};
use serde_json::json;

fn union_struct() -> StructType {
    StructType::new([ElementSpec::from(UnionSpec::new([
        FieldSpec::new("double", DataType::Float64),
        FieldSpec::new("words", DataType::Uint32).length(2),
    ]))])
    .expect("union struct")
}

#[test]
fn union_members_alias_each_other() {
    let ty = union_struct();
    let s = ty.create_with([("double", 3.14)]).expect("instance");
    let words = s.get("words").expect("words");
    let view = words.as_view().expect("array view");
    let bits = 3.14f64.to_bits();
    assert_eq!(view.get(0).expect("low"), Value::Number((bits & 0xffff_ffff) as f64));
    assert_eq!(view.get(1).expect("high"), Value::Number((bits >> 32) as f64));

    /* And back through the other member */
    let t = ty.create();
    t.set("words", words.clone()).expect("copy words");
    assert_eq!(t.get("double").expect("double"), Value::Number(3.14));
}

#[test]
fn union_conflict_is_rejected() {
    let ty = union_struct();
    let err = ty
        .create_with([
            ("double", Value::from(1.0)),
            ("words", Value::from(vec![1u32, 2])),
        ])
        .unwrap_err();
    assert!(matches!(
        err,
        StructError::UnionConflict { ref first, ref second } if first == "double" && second == "words"
    ));
}

#[test]
fn casting_mode_none_requires_matching_dtype() {
    let ty = StructType::new([
        FieldSpec::new("i", DataType::Int32),
        FieldSpec::new("f", DataType::Float32),
    ])
    .expect("struct");
    let s = ty.create();
    s.set("i", 5).expect("exact integer");
    assert_eq!(s.get("i").expect("i"), Value::Number(5.0));

    let before = s.to_bytes();
    assert!(matches!(
        s.set("i", 2.5),
        Err(StructError::CastingViolation { .. })
    ));
    assert!(matches!(
        s.set("i", true),
        Err(StructError::CastingViolation { .. })
    ));
    assert!(matches!(
        s.set("i", 1i64),
        Err(StructError::CastingViolation { .. })
    ));
    assert_eq!(s.to_bytes(), before);

    s.set("f", 0.1).expect("float field takes any number");
    assert_eq!(s.get("f").expect("f"), Value::Number(0.1f32 as f64));
}

#[test]
fn safe_and_unsafe_modes_widen_the_accepted_sources() {
    let ty = StructType::new([
        FieldSpec::new("safe", DataType::Float64).casting_mode(CastingMode::Safe),
        FieldSpec::new("wide", DataType::Int16).casting_mode(CastingMode::Safe),
        FieldSpec::new("any", DataType::Uint8).casting_mode(CastingMode::Unsafe),
    ])
    .expect("struct");
    let s = ty.create();

    s.set("safe", true).expect("bool widens to float64");
    assert_eq!(s.get("safe").expect("safe"), Value::Number(1.0));
    s.set("wide", 300).expect("int16 holds 300");
    assert!(matches!(
        s.set("wide", 70000),
        Err(StructError::CastingViolation { .. })
    ));

    s.set("any", 300).expect("unsafe wraps");
    assert_eq!(s.get("any").expect("any"), Value::Number(44.0));
    s.set("any", Complex128::new(7.9, 1.0)).expect("unsafe drops imaginary");
    assert_eq!(s.get("any").expect("any"), Value::Number(7.0));
}

#[test]
fn sixty_four_bit_fields_keep_full_precision() {
    let ty = StructType::new([
        FieldSpec::new("s", DataType::Int64),
        FieldSpec::new("u", DataType::Uint64),
    ])
    .expect("struct");
    let s = ty.create_with([
        ("s", Value::from(i64::MIN)),
        ("u", Value::from(u64::MAX)),
    ])
    .expect("instance");
    assert_eq!(s.get("s").expect("s"), Value::Int64(i64::MIN));
    assert_eq!(s.get("u").expect("u"), Value::Uint64(u64::MAX));

    s.set("s", -12).expect("small integer");
    assert_eq!(s.get("s").expect("s"), Value::Int64(-12));
}

#[test]
fn numbers_past_the_sixty_four_bit_range_are_refused() {
    let ty = StructType::new([
        FieldSpec::new("s", DataType::Int64),
        FieldSpec::new("u", DataType::Uint64),
    ])
    .expect("struct");
    let s = ty.create();

    let err = s.set("s", 9.223372036854775808e18).unwrap_err();
    assert!(matches!(err, StructError::CastingViolation { .. }));
    assert_eq!(s.get("s").expect("s"), Value::Int64(0));

    let err = s.set("u", 18446744073709551616.0).unwrap_err();
    assert!(matches!(err, StructError::CastingViolation { .. }));
    assert_eq!(s.get("u").expect("u"), Value::Uint64(0));

    s.set("u", 9.223372036854775808e18).expect("2^63 fits uint64");
    assert_eq!(s.get("u").expect("u"), Value::Uint64(1 << 63));
}

#[test]
fn complex_fields_store_real_then_imaginary() {
    let ty = StructType::new([
        FieldSpec::new("z", DataType::Complex64),
        FieldSpec::new("w", DataType::Complex128).casting_mode(CastingMode::Safe),
    ])
    .expect("struct");
    let s = ty.create();
    s.set("z", Complex64::new(1.5, -2.0)).expect("z");
    assert_eq!(s.get("z").expect("z"), Value::Complex64(Complex64::new(1.5, -2.0)));
    let bytes = s.to_bytes();
    assert_eq!(&bytes[0..4], &1.5f32.to_le_bytes());
    assert_eq!(&bytes[4..8], &(-2.0f32).to_le_bytes());

    s.set("w", 4.0).expect("real promotes to complex");
    assert_eq!(s.get("w").expect("w"), Value::Complex128(Complex128::new(4.0, 0.0)));
}

#[test]
fn bool_fields_read_back_as_bool() {
    let ty = StructType::new([
        FieldSpec::new("b", DataType::Bool),
        FieldSpec::new("loose", DataType::Bool).casting_mode(CastingMode::Unsafe),
    ])
    .expect("struct");
    let s = ty.create_with([("b", true)]).expect("instance");
    assert_eq!(s.get("b").expect("b"), Value::Bool(true));
    s.set("loose", 2.5).expect("unsafe accepts numbers");
    assert_eq!(s.get("loose").expect("loose"), Value::Bool(true));
    assert!(matches!(s.set("b", 1), Err(StructError::CastingViolation { .. })));
}

#[test]
fn array_fields_check_length_and_cast() {
    let ty = StructType::new([
        FieldSpec::new("v", DataType::Float64).length(3),
        FieldSpec::new("m", DataType::Int16)
            .length(2)
            .casting_mode(CastingMode::SameKind),
    ])
    .expect("struct");
    let s = ty.create();

    s.set("v", vec![1.0, 2.0, 3.0]).expect("same dtype");
    assert_eq!(s.get("v").expect("v"), Value::from(vec![1.0, 2.0, 3.0]));
    assert!(matches!(
        s.set("v", vec![1.0, 2.0]),
        Err(StructError::LengthMismatch { expected: 3, found: 2, .. })
    ));
    assert!(matches!(
        s.set("v", vec![1.0f32, 2.0, 3.0]),
        Err(StructError::CastingViolation { .. })
    ));

    s.set("m", vec![70000i64, -1]).expect("same kind narrows");
    assert_eq!(s.get("m").expect("m"), Value::from(vec![4464i16, -1]));
    assert!(matches!(
        s.set("m", vec![1.5f64, 2.0]),
        Err(StructError::CastingViolation { .. })
    ));
    s.set("m", TypedArray::Generic(vec![9.7, -3.2])).expect("generic skips the check");
    assert_eq!(s.get("m").expect("m"), Value::from(vec![9i16, -3]));
    assert!(matches!(
        s.set("m", 1),
        Err(StructError::InvalidAssignment { .. })
    ));
}

#[test]
fn array_views_write_through() {
    let ty = StructType::new([FieldSpec::new("v", DataType::Uint8).length(4)]).expect("struct");
    let s = ty.create();
    let view = s.get("v").expect("v");
    let view = view.as_view().expect("view");
    view.set(2, 200).expect("element write");
    assert_eq!(s.to_bytes(), vec![0, 0, 200, 0]);
    assert_eq!(view.len(), 4);
    assert_eq!(view.dtype(), DataType::Uint8);
}

#[test]
fn nested_struct_getter_aliases_parent_storage() {
    let point = StructType::new([
        FieldSpec::new("x", DataType::Int32),
        FieldSpec::new("y", DataType::Int32),
    ])
    .expect("point");
    let ty = StructType::new([
        FieldSpec::new("id", DataType::Uint32),
        FieldSpec::new("at", &point),
    ])
    .expect("struct");
    let s = ty.create();
    let at = s.get("at").expect("at");
    let at = at.as_struct().expect("nested");
    at.set("y", -7).expect("write nested");
    assert_eq!(&s.to_bytes()[8..12], &(-7i32).to_le_bytes());

    let replacement = point.create_with([("x", 1), ("y", 2)]).expect("point");
    s.set("at", replacement).expect("copy in");
    assert_eq!(at.get("x").expect("x"), Value::Number(1.0));

    let lookalike = StructType::new([
        FieldSpec::new("x", DataType::Int32),
        FieldSpec::new("y", DataType::Int32),
    ])
    .expect("lookalike");
    assert!(matches!(
        s.set("at", lookalike.create()),
        Err(StructError::CastingViolation { .. })
    ));
    assert!(matches!(
        s.set("at", 3),
        Err(StructError::InvalidAssignment { .. })
    ));
}

#[test]
fn nested_struct_arrays_stride_by_element_length() {
    let pair = StructType::new([
        FieldSpec::new("a", DataType::Uint8),
        FieldSpec::new("b", DataType::Uint8),
    ])
    .expect("pair");
    let ty = StructType::new([
        FieldSpec::new("head", DataType::Uint32),
        FieldSpec::new("pairs", &pair).length(3),
    ])
    .expect("struct");
    let s = ty.create();
    let items = vec![
        pair.create_with([("a", 1), ("b", 2)]).expect("p0"),
        pair.create_with([("a", 3), ("b", 4)]).expect("p1"),
        pair.create_with([("a", 5), ("b", 6)]).expect("p2"),
    ];
    s.set("pairs", items).expect("struct array");
    assert_eq!(&s.to_bytes()[4..10], &[1, 2, 3, 4, 5, 6]);

    let pairs = s.get("pairs").expect("pairs");
    let pairs = pairs.as_structs().expect("structs");
    assert_eq!(pairs.len(), 3);
    assert_eq!(pairs[2].get("b").expect("b"), Value::Number(6.0));
    assert!(matches!(
        s.set("pairs", vec![pair.create()]),
        Err(StructError::LengthMismatch { expected: 3, found: 1, .. })
    ));
}

#[test]
fn defaults_apply_at_construction() {
    let ty = StructType::from_json(&json!([
        { "name": "version", "type": "uint8", "default": 2, "writable": false },
        { "name": "scale", "type": "float64", "default": 0.5 },
        { "name": "values", "type": "int16", "length": 2, "default": [7, -7] }
    ]))
    .expect("struct");
    let s = ty.create_with(Vec::<(String, Value)>::new()).expect("instance");
    assert_eq!(s.get("version").expect("version"), Value::Number(2.0));
    assert_eq!(s.get("scale").expect("scale"), Value::Number(0.5));
    assert_eq!(s.get("values").expect("values"), Value::from(vec![7i16, -7]));

    /* create() skips initialization entirely */
    assert_eq!(ty.create().to_bytes(), vec![0; ty.byte_length()]);
}

#[test]
fn instances_bind_caller_storage() {
    let ty = StructType::new([FieldSpec::new("n", DataType::Uint16)]).expect("struct");
    let buffer = ByteBuffer::from_vec(vec![0xaa; 6]);
    let s = ty.create_in(&buffer, 2, None).expect("bound");
    s.set("n", 0x0102).expect("write");
    assert_eq!(buffer.to_vec(), vec![0xaa, 0xaa, 0x02, 0x01, 0xaa, 0xaa]);
    assert!(ty.buffer_of(&s).expect("buffer").ptr_eq(&buffer));
    assert_eq!(ty.view_of(&s).expect("view").byte_offset(), 2);
    assert!(matches!(
        ty.create_in(&buffer, 5, None),
        Err(StructError::InsufficientCapacity { required: 2, available: 1 })
    ));
}

#[test]
fn unknown_field_names_fail() {
    let ty = StructType::new([FieldSpec::new("a", DataType::Int8)]).expect("struct");
    let s = ty.create();
    assert!(matches!(s.get("b"), Err(StructError::UnknownField { .. })));
    assert!(matches!(s.set("b", 1), Err(StructError::UnknownField { .. })));
}
