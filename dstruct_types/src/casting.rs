/* Casting modes and the cast-compatibility table */

use crate::dtypes::{DataKind, DataType};
use serde_derive::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/* Strictness applied when a value is written into a field */
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CastingMode {
    /* Only the identical data type */
    #[default]
    None,
    /* Identical data type (byte order is fixed by the engine) */
    Equiv,
    /* Value-preserving casts */
    Safe,
    /* Safe casts plus precision loss within floating point kinds */
    MostlySafe,
    /* Casts that never move to a lower kind */
    SameKind,
    /* Anything goes */
    Unsafe,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized casting mode `{0}`")]
pub struct UnknownCastingMode(pub String);

impl CastingMode {
    pub const ALL: [CastingMode; 6] = [
        CastingMode::None,
        CastingMode::Equiv,
        CastingMode::Safe,
        CastingMode::MostlySafe,
        CastingMode::SameKind,
        CastingMode::Unsafe,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CastingMode::None => "none",
            CastingMode::Equiv => "equiv",
            CastingMode::Safe => "safe",
            CastingMode::MostlySafe => "mostly-safe",
            CastingMode::SameKind => "same-kind",
            CastingMode::Unsafe => "unsafe",
        }
    }

    pub fn names() -> String {
        Self::ALL
            .iter()
            .map(CastingMode::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for CastingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CastingMode {
    type Err = UnknownCastingMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CastingMode::ALL
            .iter()
            .copied()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| UnknownCastingMode(s.to_string()))
    }
}

/// Returns whether a value of dtype `from` may be written into a `to` slot
/// under `mode`.
pub fn is_allowed_cast(from: DataType, to: DataType, mode: CastingMode) -> bool {
    if from == to {
        return true;
    }
    match mode {
        CastingMode::None | CastingMode::Equiv => false,
        CastingMode::Safe => is_safe_cast(from, to),
        CastingMode::MostlySafe => is_mostly_safe_cast(from, to),
        CastingMode::SameKind => is_same_kind_cast(from, to),
        CastingMode::Unsafe => true,
    }
}

pub fn is_safe_cast(from: DataType, to: DataType) -> bool {
    if from == to {
        return true;
    }
    if to == DataType::Generic {
        return false;
    }
    match from.kind() {
        DataKind::Bool => true,
        DataKind::SignedInt => match to.kind() {
            DataKind::SignedInt => to.byte_size() > from.byte_size(),
            DataKind::Float | DataKind::Complex => mantissa_holds(from, to),
            _ => false,
        },
        DataKind::UnsignedInt => match to.kind() {
            DataKind::UnsignedInt | DataKind::SignedInt => to.byte_size() > from.byte_size(),
            DataKind::Float | DataKind::Complex => mantissa_holds(from, to),
            _ => false,
        },
        DataKind::Float => match to.kind() {
            DataKind::Float => to.byte_size() > from.byte_size(),
            DataKind::Complex => to.component_size() >= from.byte_size(),
            _ => false,
        },
        DataKind::Complex => to.is_complex() && to.byte_size() > from.byte_size(),
        DataKind::Generic => false,
    }
}

pub fn is_mostly_safe_cast(from: DataType, to: DataType) -> bool {
    if is_safe_cast(from, to) {
        return true;
    }
    from.kind() == to.kind() && matches!(from.kind(), DataKind::Float | DataKind::Complex)
}

pub fn is_same_kind_cast(from: DataType, to: DataType) -> bool {
    if is_mostly_safe_cast(from, to) {
        return true;
    }
    if from == DataType::Generic || to == DataType::Generic {
        return false;
    }
    to.kind() >= from.kind()
}

/* Integer magnitude bits vs. floating point significand bits of the target component */
fn mantissa_holds(int_type: DataType, float_type: DataType) -> bool {
    let magnitude_bits = match int_type {
        DataType::Int8 => 7,
        DataType::Int16 => 15,
        DataType::Int32 => 31,
        DataType::Int64 => 63,
        DataType::Uint8 => 8,
        DataType::Uint16 => 16,
        DataType::Uint32 => 32,
        DataType::Uint64 => 64,
        _ => return false,
    };
    let significand_bits = match float_type.component_size() {
        2 => 11,
        4 => 24,
        8 => 53,
        _ => return false,
    };
    significand_bits >= magnitude_bits
}
