/* String and JSON renderings of struct types and instances */

mod json;
mod layout;
mod linear;

pub use json::{describe, FieldSummary, TypeSummary};
pub(crate) use json::json_object;
pub(crate) use layout::layout_string;
pub(crate) use linear::linear_string;

use crate::field::Field;
use std::fmt;
use std::str::FromStr;

/// Rendering selected by [`crate::Struct::format`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StringFormat {
    /* The `<Struct>` placeholder */
    #[default]
    Default,
    /* One line per byte */
    Linear,
    /* One token per byte range */
    Layout,
}

impl FromStr for StringFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" | "default" => Ok(StringFormat::Default),
            "linear" => Ok(StringFormat::Linear),
            "layout" => Ok(StringFormat::Layout),
            other => Err(format!(
                "unrecognized format `{}`. Expected one of: none, linear, layout",
                other
            )),
        }
    }
}

impl fmt::Display for StringFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StringFormat::Default => "none",
            StringFormat::Linear => "linear",
            StringFormat::Layout => "layout",
        })
    }
}

/* Consecutive runs of fields sharing a partition (a union, or one field) */
pub(crate) fn partition_groups(fields: &[Field]) -> Vec<&[Field]> {
    let mut groups = Vec::new();
    let mut start = 0;
    for i in 1..=fields.len() {
        if i == fields.len() || fields[i].partition != fields[start].partition {
            groups.push(&fields[start..i]);
            start = i;
        }
    }
    groups
}
