/* Typed element sequences: owned arrays and live array views */

use crate::buffer::BufferView;
use crate::convert::{load_lane, store_lane, Lane};
use crate::errors::{StructError, StructResult};
use crate::value::Value;
use dstruct_types::{Complex128, Complex64, ComplexJson, DataType};
use serde_json::Value as JsonValue;

/// An owned, homogeneous sequence of elements of one dtype.
///
/// `Generic` holds plain numbers that carry no dtype of their own; writing
/// them into an array field skips the cast check.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedArray {
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Uint8(Vec<u8>),
    Uint16(Vec<u16>),
    Uint32(Vec<u32>),
    Uint64(Vec<u64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    Complex32(Vec<Complex64>),
    Complex64(Vec<Complex64>),
    Complex128(Vec<Complex128>),
    Bool(Vec<bool>),
    Generic(Vec<f64>),
}

impl TypedArray {
    pub fn dtype(&self) -> DataType {
        match self {
            TypedArray::Int8(_) => DataType::Int8,
            TypedArray::Int16(_) => DataType::Int16,
            TypedArray::Int32(_) => DataType::Int32,
            TypedArray::Int64(_) => DataType::Int64,
            TypedArray::Uint8(_) => DataType::Uint8,
            TypedArray::Uint16(_) => DataType::Uint16,
            TypedArray::Uint32(_) => DataType::Uint32,
            TypedArray::Uint64(_) => DataType::Uint64,
            TypedArray::Float32(_) => DataType::Float32,
            TypedArray::Float64(_) => DataType::Float64,
            TypedArray::Complex32(_) => DataType::Complex32,
            TypedArray::Complex64(_) => DataType::Complex64,
            TypedArray::Complex128(_) => DataType::Complex128,
            TypedArray::Bool(_) => DataType::Bool,
            TypedArray::Generic(_) => DataType::Generic,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TypedArray::Int8(v) => v.len(),
            TypedArray::Int16(v) => v.len(),
            TypedArray::Int32(v) => v.len(),
            TypedArray::Int64(v) => v.len(),
            TypedArray::Uint8(v) => v.len(),
            TypedArray::Uint16(v) => v.len(),
            TypedArray::Uint32(v) => v.len(),
            TypedArray::Uint64(v) => v.len(),
            TypedArray::Float32(v) => v.len(),
            TypedArray::Float64(v) => v.len(),
            TypedArray::Complex32(v) | TypedArray::Complex64(v) => v.len(),
            TypedArray::Complex128(v) => v.len(),
            TypedArray::Bool(v) => v.len(),
            TypedArray::Generic(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /* Element `index` as a conversion lane; caller guarantees the bound */
    pub(crate) fn lane(&self, index: usize) -> Lane {
        match self {
            TypedArray::Int8(v) => Lane::Int(v[index].into()),
            TypedArray::Int16(v) => Lane::Int(v[index].into()),
            TypedArray::Int32(v) => Lane::Int(v[index].into()),
            TypedArray::Int64(v) => Lane::Int(v[index].into()),
            TypedArray::Uint8(v) => Lane::Int(v[index].into()),
            TypedArray::Uint16(v) => Lane::Int(v[index].into()),
            TypedArray::Uint32(v) => Lane::Int(v[index].into()),
            TypedArray::Uint64(v) => Lane::Int(v[index].into()),
            TypedArray::Float32(v) => Lane::Real(v[index].into()),
            TypedArray::Float64(v) | TypedArray::Generic(v) => Lane::Real(v[index]),
            TypedArray::Complex32(v) | TypedArray::Complex64(v) => {
                Lane::Complex(v[index].re.into(), v[index].im.into())
            }
            TypedArray::Complex128(v) => Lane::Complex(v[index].re, v[index].im),
            TypedArray::Bool(v) => Lane::Bool(v[index]),
        }
    }

    pub(crate) fn lanes(&self) -> Vec<Lane> {
        (0..self.len()).map(|i| self.lane(i)).collect()
    }

    /* Builds an array of `dtype` from lanes, converting each element */
    pub(crate) fn from_lanes(dtype: DataType, lanes: &[Lane]) -> TypedArray {
        fn collect<T>(lanes: &[Lane], f: impl Fn(Lane) -> T) -> Vec<T> {
            lanes.iter().copied().map(f).collect()
        }
        match dtype {
            DataType::Int8 => TypedArray::Int8(collect(lanes, |l| l.as_i128() as i8)),
            DataType::Int16 => TypedArray::Int16(collect(lanes, |l| l.as_i128() as i16)),
            DataType::Int32 => TypedArray::Int32(collect(lanes, |l| l.as_i128() as i32)),
            DataType::Int64 => TypedArray::Int64(collect(lanes, |l| l.as_i128() as i64)),
            DataType::Uint8 => TypedArray::Uint8(collect(lanes, |l| l.as_i128() as u8)),
            DataType::Uint16 => TypedArray::Uint16(collect(lanes, |l| l.as_i128() as u16)),
            DataType::Uint32 => TypedArray::Uint32(collect(lanes, |l| l.as_i128() as u32)),
            DataType::Uint64 => TypedArray::Uint64(collect(lanes, |l| l.as_i128() as u64)),
            DataType::Float32 => TypedArray::Float32(collect(lanes, |l| l.as_f64() as f32)),
            DataType::Float64 => TypedArray::Float64(collect(lanes, Lane::as_f64)),
            DataType::Complex32 | DataType::Complex64 => {
                let values = collect(lanes, |l| {
                    let (re, im) = l.as_complex();
                    Complex64::new(re as f32, im as f32)
                });
                if dtype == DataType::Complex32 {
                    TypedArray::Complex32(values)
                } else {
                    TypedArray::Complex64(values)
                }
            }
            DataType::Complex128 => TypedArray::Complex128(collect(lanes, |l| {
                let (re, im) = l.as_complex();
                Complex128::new(re, im)
            })),
            DataType::Bool => TypedArray::Bool(collect(lanes, Lane::as_bool)),
            DataType::Generic => TypedArray::Generic(collect(lanes, Lane::as_f64)),
        }
    }

    /// Element `index` as a [`Value`], or `None` when out of range.
    pub fn get(&self, index: usize) -> Option<Value> {
        (index < self.len()).then(|| Value::from_lane(self.dtype(), self.lane(index)))
    }

    /// Plain JSON sequence; complex elements use the structural form.
    pub fn to_json(&self) -> StructResult<JsonValue> {
        let items = (0..self.len())
            .map(|i| Value::from_lane(self.dtype(), self.lane(i)).to_json())
            .collect::<StructResult<Vec<_>>>()?;
        Ok(JsonValue::Array(items))
    }
}

macro_rules! typed_array_from {
    ($($variant:ident, $ty:ty;)*) => {
        $(
            impl From<Vec<$ty>> for TypedArray {
                fn from(values: Vec<$ty>) -> Self {
                    TypedArray::$variant(values)
                }
            }
        )*
    };
}

typed_array_from! {
    Int8, i8;
    Int16, i16;
    Int32, i32;
    Int64, i64;
    Uint8, u8;
    Uint16, u16;
    Uint32, u32;
    Uint64, u64;
    Float32, f32;
    Float64, f64;
    Complex64, Complex64;
    Complex128, Complex128;
    Bool, bool;
}

/// A live, typed window onto an array field. Writes go straight to the
/// underlying storage of the struct instance it came from.
#[derive(Debug, Clone)]
pub struct ArrayView {
    view: BufferView,
    dtype: DataType,
    len: usize,
}

impl ArrayView {
    pub(crate) fn new(view: BufferView, dtype: DataType, len: usize) -> Self {
        Self { view, dtype, len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn dtype(&self) -> DataType {
        self.dtype
    }

    pub fn view(&self) -> &BufferView {
        &self.view
    }

    fn element_offset(&self, index: usize) -> StructResult<usize> {
        let size = self.dtype.byte_size();
        if index >= self.len {
            return Err(StructError::OutOfBounds {
                offset: index.saturating_mul(size),
                size,
                byte_length: self.view.byte_length(),
            });
        }
        Ok(index * size)
    }

    pub(crate) fn lane(&self, index: usize) -> StructResult<Lane> {
        load_lane(&self.view, self.element_offset(index)?, self.dtype)
    }

    pub(crate) fn lanes(&self) -> StructResult<Vec<Lane>> {
        (0..self.len).map(|i| self.lane(i)).collect()
    }

    pub fn get(&self, index: usize) -> StructResult<Value> {
        Ok(Value::from_lane(self.dtype, self.lane(index)?))
    }

    /// Writes one element, converting through the real/complex/bool matrix.
    /// Element writes are not cast-checked.
    pub fn set(&self, index: usize, value: impl Into<Value>) -> StructResult<()> {
        let value = value.into();
        let lane = value.to_lane().ok_or_else(|| {
            StructError::InvalidArgument(format!(
                "array elements must be scalar values. Value: `{}`",
                value.kind_name()
            ))
        })?;
        store_lane(&self.view, self.element_offset(index)?, self.dtype, lane)
    }

    /// Snapshot of the current contents.
    pub fn to_typed_array(&self) -> StructResult<TypedArray> {
        Ok(TypedArray::from_lanes(self.dtype, &self.lanes()?))
    }

    pub fn to_json(&self) -> StructResult<JsonValue> {
        self.to_typed_array()?.to_json()
    }
}

/* Element of a JSON sequence as a lane */
pub(crate) fn json_lane(value: &JsonValue) -> Option<Lane> {
    match value {
        JsonValue::Bool(b) => Some(Lane::Bool(*b)),
        JsonValue::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(v), _) => Some(Lane::Int(v.into())),
            (_, Some(v)) => Some(Lane::Int(v.into())),
            _ => n.as_f64().map(Lane::Real),
        },
        JsonValue::Object(_) => match serde_json::from_value::<ComplexJson>(value.clone()) {
            Ok(ComplexJson::Complex64 { re, im }) => Some(Lane::Complex(re.into(), im.into())),
            Ok(ComplexJson::Complex128 { re, im }) => Some(Lane::Complex(re, im)),
            Err(_) => None,
        },
        _ => None,
    }
}
