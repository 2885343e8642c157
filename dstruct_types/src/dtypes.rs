use serde_derive::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Broad classification used by the cast tables and the value conversion matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DataKind {
    Bool,
    UnsignedInt,
    SignedInt,
    Float,
    Complex,
    Generic,
}

/// A scalar element type. Every variant except [`DataType::Generic`] belongs
/// to the field catalog; `Generic` only ever describes the source of a write.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
    Complex32,
    Complex64,
    Complex128,
    Bool,
    Generic,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized data type `{0}`")]
pub struct UnknownDataType(pub String);

impl DataType {
    /// Field types accepted by the struct factory, in catalog order.
    pub const CATALOG: [DataType; 14] = [
        DataType::Int8,
        DataType::Int16,
        DataType::Int32,
        DataType::Int64,
        DataType::Uint8,
        DataType::Uint16,
        DataType::Uint32,
        DataType::Uint64,
        DataType::Float32,
        DataType::Float64,
        DataType::Complex32,
        DataType::Complex64,
        DataType::Complex128,
        DataType::Bool,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Int8 => "int8",
            DataType::Int16 => "int16",
            DataType::Int32 => "int32",
            DataType::Int64 => "int64",
            DataType::Uint8 => "uint8",
            DataType::Uint16 => "uint16",
            DataType::Uint32 => "uint32",
            DataType::Uint64 => "uint64",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
            DataType::Complex32 => "complex32",
            DataType::Complex64 => "complex64",
            DataType::Complex128 => "complex128",
            DataType::Bool => "bool",
            DataType::Generic => "generic",
        }
    }

    /// Comma separated catalog names, used in validation messages.
    pub fn catalog_names() -> String {
        Self::CATALOG
            .iter()
            .map(DataType::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn is_catalog(&self) -> bool {
        !matches!(self, DataType::Generic)
    }

    /// Number of bytes occupied by one element.
    pub fn byte_size(&self) -> usize {
        match self {
            DataType::Int8 | DataType::Uint8 | DataType::Bool => 1,
            DataType::Int16 | DataType::Uint16 => 2,
            DataType::Int32 | DataType::Uint32 | DataType::Float32 | DataType::Complex32 => 4,
            DataType::Int64 | DataType::Uint64 | DataType::Float64 | DataType::Complex64 => 8,
            DataType::Complex128 => 16,
            DataType::Generic => 0,
        }
    }

    /// Natural alignment. Complex numbers align to their component type.
    pub fn alignment(&self) -> usize {
        match self {
            DataType::Complex32 => 2,
            DataType::Complex64 => 4,
            DataType::Complex128 => 8,
            other => other.byte_size(),
        }
    }

    pub fn kind(&self) -> DataKind {
        match self {
            DataType::Bool => DataKind::Bool,
            DataType::Uint8 | DataType::Uint16 | DataType::Uint32 | DataType::Uint64 => {
                DataKind::UnsignedInt
            }
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 => {
                DataKind::SignedInt
            }
            DataType::Float32 | DataType::Float64 => DataKind::Float,
            DataType::Complex32 | DataType::Complex64 | DataType::Complex128 => DataKind::Complex,
            DataType::Generic => DataKind::Generic,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self.kind(), DataKind::SignedInt | DataKind::UnsignedInt)
    }

    pub fn is_signed_integer(&self) -> bool {
        self.kind() == DataKind::SignedInt
    }

    pub fn is_floating_point(&self) -> bool {
        self.kind() == DataKind::Float
    }

    /// Integers and real floating point types.
    pub fn is_real(&self) -> bool {
        self.is_integer() || self.is_floating_point()
    }

    pub fn is_complex(&self) -> bool {
        self.kind() == DataKind::Complex
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, DataType::Bool)
    }

    /// Width in bytes of one complex component (re or im).
    pub fn component_size(&self) -> usize {
        match self {
            DataType::Complex32 | DataType::Complex64 | DataType::Complex128 => self.byte_size() / 2,
            other => other.byte_size(),
        }
    }

    /// Inclusive integer range for integer dtypes.
    pub fn integer_range(&self) -> Option<(i128, i128)> {
        match self {
            DataType::Int8 => Some((i8::MIN as i128, i8::MAX as i128)),
            DataType::Int16 => Some((i16::MIN as i128, i16::MAX as i128)),
            DataType::Int32 => Some((i32::MIN as i128, i32::MAX as i128)),
            DataType::Int64 => Some((i64::MIN as i128, i64::MAX as i128)),
            DataType::Uint8 => Some((0, u8::MAX as i128)),
            DataType::Uint16 => Some((0, u16::MAX as i128)),
            DataType::Uint32 => Some((0, u32::MAX as i128)),
            DataType::Uint64 => Some((0, u64::MAX as i128)),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = UnknownDataType;

    /* Only catalog names parse; `generic` is never a valid field type */
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::CATALOG
            .iter()
            .copied()
            .find(|dtype| dtype.as_str() == s)
            .ok_or_else(|| UnknownDataType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_names_round_trip() {
        for dtype in DataType::CATALOG {
            assert_eq!(dtype.as_str().parse::<DataType>(), Ok(dtype));
        }
        assert!("generic".parse::<DataType>().is_err());
        assert!("float16".parse::<DataType>().is_err());
    }

    #[test]
    fn complex_types_align_to_their_component() {
        assert_eq!(DataType::Complex128.byte_size(), 16);
        assert_eq!(DataType::Complex128.alignment(), 8);
        assert_eq!(DataType::Complex64.alignment(), 4);
        assert_eq!(DataType::Complex32.component_size(), 2);
        assert_eq!(DataType::Bool.alignment(), 1);
    }

    #[test]
    fn serde_uses_catalog_names() {
        let json = serde_json::to_string(&DataType::Uint16).unwrap();
        assert_eq!(json, "\"uint16\"");
        let parsed: DataType = serde_json::from_str("\"complex64\"").unwrap();
        assert_eq!(parsed, DataType::Complex64);
    }
}
