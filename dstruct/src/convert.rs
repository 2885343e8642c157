/* Element conversions between values, lanes, and buffer storage */

use crate::buffer::{BufferView, Endian};
use crate::errors::{StructError, StructResult};
use dstruct_types::half::{f16_bits_from_f32, f32_from_f16_bits};
use dstruct_types::{is_allowed_cast, CastingMode, DataType};

/* Engine byte order. Every field is stored little-endian */
pub(crate) const ENDIAN: Endian = Endian::Little;

/* One element as seen by the conversion matrix */
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Lane {
    Int(i128),
    Real(f64),
    Complex(f64, f64),
    Bool(bool),
}

impl Lane {
    pub(crate) fn as_f64(self) -> f64 {
        match self {
            Lane::Int(v) => v as f64,
            Lane::Real(v) => v,
            Lane::Complex(re, _) => re,
            Lane::Bool(b) => f64::from(u8::from(b)),
        }
    }

    /* Truncating integer view; non-finite reals map to zero */
    pub(crate) fn as_i128(self) -> i128 {
        match self {
            Lane::Int(v) => v,
            Lane::Real(v) | Lane::Complex(v, _) => truncate(v),
            Lane::Bool(b) => i128::from(b),
        }
    }

    pub(crate) fn as_bool(self) -> bool {
        match self {
            Lane::Int(v) => v != 0,
            Lane::Real(v) => v != 0.0 && !v.is_nan(),
            Lane::Complex(re, im) => (re != 0.0 && !re.is_nan()) || (im != 0.0 && !im.is_nan()),
            Lane::Bool(b) => b,
        }
    }

    pub(crate) fn as_complex(self) -> (f64, f64) {
        match self {
            Lane::Complex(re, im) => (re, im),
            other => (other.as_f64(), 0.0),
        }
    }
}

fn truncate(value: f64) -> i128 {
    if value.is_finite() {
        value.trunc() as i128
    } else {
        0
    }
}

/// Reads the element of `dtype` stored at `offset`.
pub(crate) fn load_lane(view: &BufferView, offset: usize, dtype: DataType) -> StructResult<Lane> {
    let lane = match dtype {
        DataType::Int8 => Lane::Int(view.get_int8(offset, ENDIAN)?.into()),
        DataType::Int16 => Lane::Int(view.get_int16(offset, ENDIAN)?.into()),
        DataType::Int32 => Lane::Int(view.get_int32(offset, ENDIAN)?.into()),
        DataType::Int64 => Lane::Int(view.get_int64(offset, ENDIAN)?.into()),
        DataType::Uint8 => Lane::Int(view.get_uint8(offset, ENDIAN)?.into()),
        DataType::Uint16 => Lane::Int(view.get_uint16(offset, ENDIAN)?.into()),
        DataType::Uint32 => Lane::Int(view.get_uint32(offset, ENDIAN)?.into()),
        DataType::Uint64 => Lane::Int(view.get_uint64(offset, ENDIAN)?.into()),
        DataType::Float32 => Lane::Real(view.get_float32(offset, ENDIAN)?.into()),
        DataType::Float64 => Lane::Real(view.get_float64(offset, ENDIAN)?),
        DataType::Complex32 => {
            let re = f32_from_f16_bits(view.get_uint16(offset, ENDIAN)?);
            let im = f32_from_f16_bits(view.get_uint16(offset + 2, ENDIAN)?);
            Lane::Complex(re.into(), im.into())
        }
        DataType::Complex64 => {
            let re = view.get_float32(offset, ENDIAN)?;
            let im = view.get_float32(offset + 4, ENDIAN)?;
            Lane::Complex(re.into(), im.into())
        }
        DataType::Complex128 => Lane::Complex(
            view.get_float64(offset, ENDIAN)?,
            view.get_float64(offset + 8, ENDIAN)?,
        ),
        DataType::Bool => Lane::Bool(view.get_bool(offset)?),
        DataType::Generic => {
            return Err(StructError::InvalidArgument(
                "`generic` values have no storage representation".to_string(),
            ))
        }
    };
    Ok(lane)
}

/// Writes `lane` as an element of `dtype` at `offset`.
///
/// Integer stores truncate toward zero and wrap; complex sources drop the
/// imaginary part for real targets; booleans store as 0/1.
pub(crate) fn store_lane(
    view: &BufferView,
    offset: usize,
    dtype: DataType,
    lane: Lane,
) -> StructResult<()> {
    match dtype {
        DataType::Int8 => view.set_int8(offset, lane.as_i128() as i8, ENDIAN),
        DataType::Int16 => view.set_int16(offset, lane.as_i128() as i16, ENDIAN),
        DataType::Int32 => view.set_int32(offset, lane.as_i128() as i32, ENDIAN),
        DataType::Int64 => view.set_int64(offset, lane.as_i128() as i64, ENDIAN),
        DataType::Uint8 => view.set_uint8(offset, lane.as_i128() as u8, ENDIAN),
        DataType::Uint16 => view.set_uint16(offset, lane.as_i128() as u16, ENDIAN),
        DataType::Uint32 => view.set_uint32(offset, lane.as_i128() as u32, ENDIAN),
        DataType::Uint64 => view.set_uint64(offset, lane.as_i128() as u64, ENDIAN),
        DataType::Float32 => view.set_float32(offset, lane.as_f64() as f32, ENDIAN),
        DataType::Float64 => view.set_float64(offset, lane.as_f64(), ENDIAN),
        DataType::Complex32 => {
            let (re, im) = lane.as_complex();
            view.set_uint16(offset, f16_bits_from_f32(re as f32), ENDIAN)?;
            view.set_uint16(offset + 2, f16_bits_from_f32(im as f32), ENDIAN)
        }
        DataType::Complex64 => {
            let (re, im) = lane.as_complex();
            view.set_float32(offset, re as f32, ENDIAN)?;
            view.set_float32(offset + 4, im as f32, ENDIAN)
        }
        DataType::Complex128 => {
            let (re, im) = lane.as_complex();
            view.set_float64(offset, re, ENDIAN)?;
            view.set_float64(offset + 8, im, ENDIAN)
        }
        DataType::Bool => view.set_bool(offset, lane.as_bool()),
        DataType::Generic => Err(StructError::InvalidArgument(
            "`generic` values have no storage representation".to_string(),
        )),
    }
}

pub(crate) fn is_integral(value: f64) -> bool {
    value.is_finite() && value.fract() == 0.0
}

/// Smallest dtype able to hold `value`.
pub(crate) fn min_dtype(value: f64) -> DataType {
    if !is_integral(value) {
        if (value as f32) as f64 == value {
            return DataType::Float32;
        }
        return DataType::Float64;
    }
    if value >= 0.0 {
        if value <= u8::MAX as f64 {
            DataType::Uint8
        } else if value <= u16::MAX as f64 {
            DataType::Uint16
        } else if value <= u32::MAX as f64 {
            DataType::Uint32
        } else {
            DataType::Float64
        }
    } else {
        min_signed_dtype(value)
    }
}

/// Smallest signed integer dtype able to hold an integral `value`.
pub(crate) fn min_signed_dtype(value: f64) -> DataType {
    if value >= i8::MIN as f64 && value <= i8::MAX as f64 {
        DataType::Int8
    } else if value >= i16::MIN as f64 && value <= i16::MAX as f64 {
        DataType::Int16
    } else if value >= i32::MIN as f64 && value <= i32::MAX as f64 {
        DataType::Int32
    } else {
        DataType::Float64
    }
}

/// Source dtype of a plain number written into a real field of `target`.
///
/// Floating point targets take the number as their own dtype. Integer
/// targets do the same when the number is integral and in range; otherwise
/// the smallest dtype holding the number is used.
pub(crate) fn infer_number_dtype(value: f64, target: DataType) -> DataType {
    if target.is_floating_point() {
        return target;
    }
    if !is_integral(value) {
        return min_dtype(value);
    }
    /* `hi + 1` is a power of two, so the exclusive bound is exact in f64 */
    match target.integer_range() {
        Some((lo, hi)) if value >= lo as f64 && value < (hi + 1) as f64 => target,
        _ if target.is_signed_integer() => min_signed_dtype(value),
        _ => min_dtype(value),
    }
}

/// Fails with a casting violation when `source` may not be written into
/// `target` under `mode`.
pub(crate) fn check_cast(
    field: &str,
    source: DataType,
    target: DataType,
    mode: CastingMode,
) -> StructResult<()> {
    if is_allowed_cast(source, target, mode) {
        Ok(())
    } else {
        Err(StructError::CastingViolation {
            field: field.to_string(),
            dtype: target.to_string(),
            source_dtype: source.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ByteBuffer;

    #[test]
    fn integer_stores_truncate_and_wrap() {
        let view = BufferView::whole(&ByteBuffer::new(8));
        store_lane(&view, 0, DataType::Int8, Lane::Real(-1.9)).unwrap();
        assert_eq!(view.get_int8(0, ENDIAN).unwrap(), -1);
        store_lane(&view, 0, DataType::Uint8, Lane::Int(300)).unwrap();
        assert_eq!(view.get_uint8(0, ENDIAN).unwrap(), 44);
        store_lane(&view, 0, DataType::Int32, Lane::Real(f64::NAN)).unwrap();
        assert_eq!(view.get_int32(0, ENDIAN).unwrap(), 0);
    }

    #[test]
    fn sixty_four_bit_range_is_exclusive_at_the_top() {
        let two_63 = 9_223_372_036_854_775_808.0;
        let two_64 = 18_446_744_073_709_551_616.0;
        assert_eq!(infer_number_dtype(two_63, DataType::Int64), DataType::Float64);
        assert_eq!(infer_number_dtype(-two_63, DataType::Int64), DataType::Int64);
        assert_eq!(infer_number_dtype(two_63, DataType::Uint64), DataType::Uint64);
        assert_eq!(infer_number_dtype(two_64, DataType::Uint64), DataType::Float64);
    }

    #[test]
    fn complex_to_real_drops_imaginary_part() {
        let view = BufferView::whole(&ByteBuffer::new(16));
        store_lane(&view, 0, DataType::Float64, Lane::Complex(2.5, 7.0)).unwrap();
        assert_eq!(load_lane(&view, 0, DataType::Float64).unwrap(), Lane::Real(2.5));
        store_lane(&view, 0, DataType::Complex128, Lane::Real(3.0)).unwrap();
        assert_eq!(
            load_lane(&view, 0, DataType::Complex128).unwrap(),
            Lane::Complex(3.0, 0.0)
        );
    }

    #[test]
    fn complex32_uses_half_precision_components() {
        let view = BufferView::whole(&ByteBuffer::new(4));
        store_lane(&view, 0, DataType::Complex32, Lane::Complex(1.5, -0.25)).unwrap();
        assert_eq!(view.get_uint16(0, ENDIAN).unwrap(), 0x3e00);
        assert_eq!(
            load_lane(&view, 0, DataType::Complex32).unwrap(),
            Lane::Complex(1.5, -0.25)
        );
    }

    #[test]
    fn number_inference_prefers_the_target() {
        assert_eq!(infer_number_dtype(5.0, DataType::Int32), DataType::Int32);
        assert_eq!(infer_number_dtype(300.0, DataType::Int8), DataType::Int16);
        assert_eq!(infer_number_dtype(300.0, DataType::Uint8), DataType::Uint16);
        assert_eq!(infer_number_dtype(-1.0, DataType::Uint8), DataType::Int8);
        assert_eq!(infer_number_dtype(0.5, DataType::Int32), DataType::Float32);
        assert_eq!(infer_number_dtype(0.1, DataType::Int32), DataType::Float64);
        assert_eq!(infer_number_dtype(0.1, DataType::Float32), DataType::Float32);
    }

    #[test]
    fn bool_lanes_follow_truthiness() {
        assert!(!Lane::Real(f64::NAN).as_bool());
        assert!(Lane::Complex(0.0, 1.0).as_bool());
        assert_eq!(Lane::Bool(true).as_f64(), 1.0);
    }
}
