/* Typed getters and setters bound to one field of a struct type */

use crate::array::ArrayView;
use crate::buffer::BufferView;
use crate::convert::{check_cast, infer_number_dtype, load_lane, min_dtype, store_lane, Lane};
use crate::errors::{StructError, StructResult};
use crate::field::{Field, FieldType};
use crate::instance::Struct;
use crate::struct_type::StructType;
use crate::value::{opaque_lane, Value};
use dstruct_types::half::{f16_bits_from_f32, f32_from_f16_bits};
use dstruct_types::{CastingMode, DataType};

/* Accessor family, chosen once per field */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AccessorKind {
    Number,
    BigInt,
    Boolean,
    Complex,
    Struct,
    TypedArray,
    StructArray,
}

impl AccessorKind {
    pub(crate) fn for_field(field: &Field) -> Self {
        match (&field.field_type, field.length.is_some()) {
            (FieldType::Struct(_), true) => AccessorKind::StructArray,
            (FieldType::Struct(_), false) => AccessorKind::Struct,
            (FieldType::Scalar(_), true) => AccessorKind::TypedArray,
            (FieldType::Scalar(dtype), false) => match dtype {
                DataType::Int64 | DataType::Uint64 => AccessorKind::BigInt,
                DataType::Bool => AccessorKind::Boolean,
                DataType::Complex32 | DataType::Complex64 | DataType::Complex128 => {
                    AccessorKind::Complex
                }
                _ => AccessorKind::Number,
            },
        }
    }
}

/// Reads `field` from the instance storage `view`.
pub(crate) fn get(field: &Field, kind: AccessorKind, view: &BufferView) -> StructResult<Value> {
    match (&field.field_type, kind) {
        (FieldType::Struct(ty), AccessorKind::StructArray) => {
            let stride = ty.byte_length();
            let items = (0..field.length.unwrap_or(1))
                .map(|i| {
                    view.subview(field.byte_offset + i * stride, stride)
                        .map(|v| Struct::bind(ty.clone(), v))
                })
                .collect::<StructResult<Vec<_>>>()?;
            Ok(Value::Structs(items))
        }
        (FieldType::Struct(ty), _) => {
            let child = view.subview(field.byte_offset, field.byte_length)?;
            Ok(Value::Struct(Struct::bind(ty.clone(), child)))
        }
        (FieldType::Scalar(dtype), AccessorKind::TypedArray) => {
            let window = view.subview(field.byte_offset, field.byte_length)?;
            Ok(Value::View(ArrayView::new(
                window,
                *dtype,
                field.length.unwrap_or(1),
            )))
        }
        (FieldType::Scalar(dtype), _) => {
            let lane = load_lane(view, field.byte_offset, *dtype)?;
            Ok(Value::from_lane(*dtype, lane))
        }
    }
}

/// Writes `value` into `field`. Nothing is written when a check fails.
pub(crate) fn set(
    field: &Field,
    kind: AccessorKind,
    view: &BufferView,
    value: Value,
) -> StructResult<()> {
    match (&field.field_type, kind) {
        (FieldType::Struct(ty), AccessorKind::StructArray) => set_struct_array(field, ty, view, value),
        (FieldType::Struct(ty), _) => set_struct(field, ty, view, value),
        (FieldType::Scalar(dtype), AccessorKind::TypedArray) => {
            set_typed_array(field, *dtype, view, value)
        }
        (FieldType::Scalar(dtype), AccessorKind::BigInt) => set_bigint(field, *dtype, view, value),
        (FieldType::Scalar(_), AccessorKind::Boolean) => set_boolean(field, view, value),
        (FieldType::Scalar(dtype), AccessorKind::Complex) => {
            set_complex(field, *dtype, view, value)
        }
        (FieldType::Scalar(dtype), _) => set_number(field, *dtype, view, value),
    }
}

/* Anything without a scalar reading goes through as generic */
fn generic_lane(value: &Value) -> Lane {
    match value {
        Value::Opaque(json) => opaque_lane(json),
        _ => Lane::Real(f64::NAN),
    }
}

fn write_scalar(
    field: &Field,
    dtype: DataType,
    view: &BufferView,
    source: DataType,
    lane: Lane,
) -> StructResult<()> {
    check_cast(&field.name, source, dtype, field.casting_mode)?;
    store_lane(view, field.byte_offset, dtype, lane)
}

fn set_number(field: &Field, dtype: DataType, view: &BufferView, value: Value) -> StructResult<()> {
    let (source, lane) = match &value {
        Value::Number(v) => (infer_number_dtype(*v, dtype), Lane::Real(*v)),
        Value::Bool(b) => (DataType::Bool, Lane::Bool(*b)),
        Value::Int64(v) => (DataType::Int64, Lane::Int((*v).into())),
        Value::Uint64(v) => (DataType::Uint64, Lane::Int((*v).into())),
        Value::Complex64(c) => (complex64_source(c.re, c.im, dtype), Lane::Real(c.re.into())),
        Value::Complex128(c) => (DataType::Complex128, Lane::Real(c.re)),
        other => (DataType::Generic, generic_lane(other)),
    };
    write_scalar(field, dtype, view, source, lane)
}

fn set_bigint(field: &Field, dtype: DataType, view: &BufferView, value: Value) -> StructResult<()> {
    let (source, lane) = match &value {
        Value::Int64(v) => (DataType::Int64, Lane::Int((*v).into())),
        Value::Uint64(v) => (DataType::Uint64, Lane::Int((*v).into())),
        Value::Number(v) => (infer_number_dtype(*v, dtype), floor_lane(*v)),
        Value::Bool(b) => (DataType::Bool, Lane::Int((*b).into())),
        Value::Complex64(c) => (DataType::Complex64, floor_lane(c.re.into())),
        Value::Complex128(c) => (DataType::Complex128, floor_lane(c.re)),
        other => (DataType::Generic, floor_lane(generic_lane(other).as_f64())),
    };
    write_scalar(field, dtype, view, source, lane)
}

/* 64-bit fields round fractional sources toward negative infinity */
fn floor_lane(value: f64) -> Lane {
    if value.is_finite() {
        Lane::Int(value.floor() as i128)
    } else {
        Lane::Int(0)
    }
}

fn set_boolean(field: &Field, view: &BufferView, value: Value) -> StructResult<()> {
    let (source, lane) = match &value {
        Value::Bool(b) => (DataType::Bool, Lane::Bool(*b)),
        Value::Number(v) => (min_dtype(*v), Lane::Real(*v)),
        Value::Int64(v) => (DataType::Int64, Lane::Int((*v).into())),
        Value::Uint64(v) => (DataType::Uint64, Lane::Int((*v).into())),
        Value::Complex64(c) => (DataType::Complex64, Lane::Complex(c.re.into(), c.im.into())),
        Value::Complex128(c) => (DataType::Complex128, Lane::Complex(c.re, c.im)),
        other => (DataType::Generic, generic_lane(other)),
    };
    write_scalar(field, DataType::Bool, view, source, lane)
}

fn set_complex(field: &Field, dtype: DataType, view: &BufferView, value: Value) -> StructResult<()> {
    let (source, lane) = match &value {
        Value::Complex64(c) => (
            complex64_source(c.re, c.im, dtype),
            Lane::Complex(c.re.into(), c.im.into()),
        ),
        Value::Complex128(c) => (DataType::Complex128, Lane::Complex(c.re, c.im)),
        Value::Number(v) => {
            let source = if dtype == DataType::Complex128 {
                DataType::Float64
            } else {
                DataType::Float32
            };
            (source, Lane::Real(*v))
        }
        Value::Bool(b) => (DataType::Bool, Lane::Bool(*b)),
        Value::Int64(v) => (DataType::Int64, Lane::Int((*v).into())),
        Value::Uint64(v) => (DataType::Uint64, Lane::Int((*v).into())),
        other => (DataType::Generic, generic_lane(other)),
    };
    write_scalar(field, dtype, view, source, lane)
}

/* A complex64 value counts as complex32 when the target is complex32 and
 * both components survive the round trip through half precision */
fn complex64_source(re: f32, im: f32, target: DataType) -> DataType {
    let exact = |v: f32| f32_from_f16_bits(f16_bits_from_f32(v)) == v;
    if target == DataType::Complex32 && exact(re) && exact(im) {
        DataType::Complex32
    } else {
        DataType::Complex64
    }
}

fn same_type_required(field: &Field, expected: &StructType, source: &StructType) -> StructResult<()> {
    if field.casting_mode == CastingMode::None && !expected.same_type(source) {
        return Err(StructError::CastingViolation {
            field: field.name.clone(),
            dtype: "struct".to_string(),
            source_dtype: "struct".to_string(),
        });
    }
    Ok(())
}

fn set_struct(field: &Field, ty: &StructType, view: &BufferView, value: Value) -> StructResult<()> {
    let kind = value.kind_name();
    let Value::Struct(source) = value else {
        return Err(StructError::invalid_assignment(
            &field.name,
            format!("must be a `struct` instance. Value: `{}`", kind),
        ));
    };
    same_type_required(field, ty, source.struct_type())?;
    if source.byte_length() != field.byte_length {
        return Err(StructError::ByteLengthMismatch {
            field: field.name.clone(),
            expected: field.byte_length,
            found: source.byte_length(),
        });
    }
    view.copy_from(field.byte_offset, source.view())
}

fn set_struct_array(
    field: &Field,
    ty: &StructType,
    view: &BufferView,
    value: Value,
) -> StructResult<()> {
    let kind = value.kind_name();
    let Value::Structs(items) = value else {
        return Err(StructError::invalid_assignment(
            &field.name,
            format!("must be an array of `struct` instances. Value: `{}`", kind),
        ));
    };
    let expected = field.length.unwrap_or(1);
    if items.len() != expected {
        return Err(StructError::LengthMismatch {
            field: field.name.clone(),
            expected,
            found: items.len(),
        });
    }
    let stride = ty.byte_length();
    for item in &items {
        same_type_required(field, ty, item.struct_type())?;
        if item.byte_length() != stride {
            return Err(StructError::ByteLengthMismatch {
                field: field.name.clone(),
                expected: stride,
                found: item.byte_length(),
            });
        }
    }
    /* Snapshot first; sources may alias the destination */
    let snapshots: Vec<Vec<u8>> = items.iter().map(|item| item.view().to_vec()).collect();
    for (i, bytes) in snapshots.iter().enumerate() {
        view.write(field.byte_offset + i * stride, bytes)?;
    }
    Ok(())
}

fn set_typed_array(
    field: &Field,
    dtype: DataType,
    view: &BufferView,
    value: Value,
) -> StructResult<()> {
    let (source, lanes) = match &value {
        Value::Array(array) => (array.dtype(), array.lanes()),
        Value::View(array) => (array.dtype(), array.lanes()?),
        other => {
            return Err(StructError::invalid_assignment(
                &field.name,
                format!(
                    "must be an array-like object. Value: `{}`",
                    other.kind_name()
                ),
            ))
        }
    };
    let expected = field.length.unwrap_or(1);
    if lanes.len() != expected {
        return Err(StructError::LengthMismatch {
            field: field.name.clone(),
            expected,
            found: lanes.len(),
        });
    }
    if source != DataType::Generic {
        check_cast(&field.name, source, dtype, field.casting_mode)?;
    }
    let size = dtype.byte_size();
    for (i, lane) in lanes.into_iter().enumerate() {
        store_lane(view, field.byte_offset + i * size, dtype, lane)?;
    }
    Ok(())
}
