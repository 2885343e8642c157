/* Values read from and written to struct fields */

use crate::array::{json_lane, ArrayView, TypedArray};
use crate::convert::Lane;
use crate::errors::StructResult;
use crate::field::FieldType;
use crate::instance::Struct;
use dstruct_types::{Complex128, Complex64, ComplexJson, DataType};
use serde_json::Value as JsonValue;

/// A field value.
///
/// Getters produce `Number` for 8/16/32-bit integers and floats,
/// `Int64`/`Uint64` for 64-bit integers, `Complex64` for complex32 and
/// complex64 fields, `View` for array fields and `Struct`/`Structs` for
/// nested struct fields. `Opaque` carries arbitrary data with no dtype,
/// which only `unsafe` fields accept.
#[derive(Debug, Clone)]
pub enum Value {
    Number(f64),
    Bool(bool),
    Int64(i64),
    Uint64(u64),
    Complex64(Complex64),
    Complex128(Complex128),
    Array(TypedArray),
    View(ArrayView),
    Struct(Struct),
    Structs(Vec<Struct>),
    Opaque(JsonValue),
}

impl Value {
    /* Short label used in error messages */
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Bool(_) => "boolean",
            Value::Int64(_) | Value::Uint64(_) => "bigint",
            Value::Complex64(_) | Value::Complex128(_) => "complex",
            Value::Array(_) | Value::View(_) => "array",
            Value::Struct(_) => "struct",
            Value::Structs(_) => "struct array",
            Value::Opaque(_) => "opaque",
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            Value::Int64(v) => Some(*v as f64),
            Value::Uint64(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            Value::Uint64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Uint64(v) => Some(*v),
            Value::Int64(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_complex(&self) -> Option<Complex128> {
        match self {
            Value::Complex64(c) => Some(c.widen()),
            Value::Complex128(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&Struct> {
        match self {
            Value::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_structs(&self) -> Option<&[Struct]> {
        match self {
            Value::Structs(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_view(&self) -> Option<&ArrayView> {
        match self {
            Value::View(v) => Some(v),
            _ => None,
        }
    }

    /* Getter result for an element of `dtype` */
    pub(crate) fn from_lane(dtype: DataType, lane: Lane) -> Value {
        match dtype {
            DataType::Int64 => Value::Int64(lane.as_i128() as i64),
            DataType::Uint64 => Value::Uint64(lane.as_i128() as u64),
            DataType::Bool => Value::Bool(lane.as_bool()),
            DataType::Complex32 | DataType::Complex64 => {
                let (re, im) = lane.as_complex();
                Value::Complex64(Complex64::new(re as f32, im as f32))
            }
            DataType::Complex128 => {
                let (re, im) = lane.as_complex();
                Value::Complex128(Complex128::new(re, im))
            }
            _ => Value::Number(lane.as_f64()),
        }
    }

    /* Scalar as a conversion lane; `None` for sequences and structs */
    pub(crate) fn to_lane(&self) -> Option<Lane> {
        match self {
            Value::Number(v) => Some(Lane::Real(*v)),
            Value::Bool(b) => Some(Lane::Bool(*b)),
            Value::Int64(v) => Some(Lane::Int((*v).into())),
            Value::Uint64(v) => Some(Lane::Int((*v).into())),
            Value::Complex64(c) => Some(Lane::Complex(c.re.into(), c.im.into())),
            Value::Complex128(c) => Some(Lane::Complex(c.re, c.im)),
            Value::Opaque(json) => Some(opaque_lane(json)),
            _ => None,
        }
    }

    /// JSON rendering used by `to_json` exports.
    pub fn to_json(&self) -> StructResult<JsonValue> {
        let json = match self {
            Value::Number(v) => number_json(*v),
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Int64(v) => JsonValue::from(*v),
            Value::Uint64(v) => JsonValue::from(*v),
            Value::Complex64(c) => serde_json::to_value(ComplexJson::from(*c))?,
            Value::Complex128(c) => serde_json::to_value(ComplexJson::from(*c))?,
            Value::Array(array) => array.to_json()?,
            Value::View(view) => view.to_json()?,
            Value::Struct(s) => s.to_json()?,
            Value::Structs(items) => JsonValue::Array(
                items
                    .iter()
                    .map(Struct::to_json)
                    .collect::<StructResult<Vec<_>>>()?,
            ),
            Value::Opaque(json) => json.clone(),
        };
        Ok(json)
    }

    /// Interprets a JSON value as an initializer for a field of
    /// `field_type`, using the field's dtype as a hint. `None` means the
    /// field should be left unset (JSON `null`).
    pub(crate) fn from_json(
        json: &JsonValue,
        field_type: &FieldType,
        length: Option<usize>,
    ) -> StructResult<Option<Value>> {
        if json.is_null() {
            return Ok(None);
        }
        let value = match (field_type, length) {
            (FieldType::Struct(ty), Some(_)) => match json.as_array() {
                Some(items) if items.iter().all(JsonValue::is_object) => Value::Structs(
                    items
                        .iter()
                        .map(|item| ty.create_from_json(item))
                        .collect::<StructResult<Vec<_>>>()?,
                ),
                _ => Value::Opaque(json.clone()),
            },
            (FieldType::Struct(ty), None) if json.is_object() => {
                Value::Struct(ty.create_from_json(json)?)
            }
            (FieldType::Struct(_), None) => Value::Opaque(json.clone()),
            (FieldType::Scalar(dtype), Some(_)) => {
                let lanes = json
                    .as_array()
                    .and_then(|items| items.iter().map(json_lane).collect::<Option<Vec<_>>>());
                match lanes {
                    Some(lanes) => Value::Array(TypedArray::from_lanes(*dtype, &lanes)),
                    None => Value::Opaque(json.clone()),
                }
            }
            (FieldType::Scalar(dtype), None) => scalar_from_json(json, *dtype),
        };
        Ok(Some(value))
    }
}

fn scalar_from_json(json: &JsonValue, dtype: DataType) -> Value {
    match json {
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Number(n) => {
            let wide = matches!(dtype, DataType::Int64 | DataType::Uint64);
            match (n.as_i64(), n.as_u64()) {
                (Some(v), _) if wide && (v < 0 || dtype == DataType::Int64) => Value::Int64(v),
                (_, Some(v)) if wide => Value::Uint64(v),
                _ => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            }
        }
        JsonValue::Object(_) => match serde_json::from_value::<ComplexJson>(json.clone()) {
            Ok(ComplexJson::Complex64 { re, im }) => Value::Complex64(Complex64::new(re, im)),
            Ok(ComplexJson::Complex128 { re, im }) => Value::Complex128(Complex128::new(re, im)),
            Err(_) => Value::Opaque(json.clone()),
        },
        other => Value::Opaque(other.clone()),
    }
}

/* Integral numbers render without a fractional part */
fn number_json(value: f64) -> JsonValue {
    const MAX_SAFE: f64 = 9_007_199_254_740_991.0;
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= MAX_SAFE {
        JsonValue::from(value as i64)
    } else {
        JsonValue::from(value)
    }
}

/* Numeric coercion for data without a dtype */
pub(crate) fn opaque_lane(json: &JsonValue) -> Lane {
    match json {
        JsonValue::Bool(b) => Lane::Bool(*b),
        JsonValue::Number(n) => Lane::Real(n.as_f64().unwrap_or(f64::NAN)),
        JsonValue::String(s) => Lane::Real(s.trim().parse().unwrap_or(f64::NAN)),
        _ => Lane::Real(f64::NAN),
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Uint64(a), Value::Uint64(b)) => a == b,
            (Value::Complex64(a), Value::Complex64(b)) => a == b,
            (Value::Complex128(a), Value::Complex128(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::View(a), Value::View(b)) => {
                matches!((a.to_typed_array(), b.to_typed_array()), (Ok(x), Ok(y)) if x == y)
            }
            (Value::View(v), Value::Array(a)) | (Value::Array(a), Value::View(v)) => {
                matches!(v.to_typed_array(), Ok(x) if &x == a)
            }
            (Value::Struct(a), Value::Struct(b)) => a.same_contents(b),
            (Value::Structs(a), Value::Structs(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_contents(y))
            }
            (Value::Opaque(a), Value::Opaque(b)) => a == b,
            _ => false,
        }
    }
}

macro_rules! value_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Number(value.into())
                }
            }
        )*
    };
}

value_from_number!(f64, f32, i8, i16, i32, u8, u16, u32);

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int64(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Uint64(value)
    }
}

impl From<Complex64> for Value {
    fn from(value: Complex64) -> Self {
        Value::Complex64(value)
    }
}

impl From<Complex128> for Value {
    fn from(value: Complex128) -> Self {
        Value::Complex128(value)
    }
}

impl From<TypedArray> for Value {
    fn from(value: TypedArray) -> Self {
        Value::Array(value)
    }
}

impl From<ArrayView> for Value {
    fn from(value: ArrayView) -> Self {
        Value::View(value)
    }
}

impl From<Struct> for Value {
    fn from(value: Struct) -> Self {
        Value::Struct(value)
    }
}

impl From<Vec<Struct>> for Value {
    fn from(value: Vec<Struct>) -> Self {
        Value::Structs(value)
    }
}

macro_rules! value_from_vec {
    ($($ty:ty),*) => {
        $(
            impl From<Vec<$ty>> for Value {
                fn from(values: Vec<$ty>) -> Self {
                    Value::Array(TypedArray::from(values))
                }
            }
        )*
    };
}

value_from_vec!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, bool, Complex64, Complex128);
