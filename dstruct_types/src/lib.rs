//! Struct Type Definitions
//!
//! This crate contains the primitive building blocks shared by the struct
//! engine: the fixed dtype catalog, casting modes together with the
//! cast-compatibility table, and the complex value type. It carries no
//! layout or buffer logic.

pub mod casting;
pub mod complex;
pub mod dtypes;
pub mod half;

// Re-export commonly used types at the crate root
pub use casting::*;
pub use complex::*;
pub use dtypes::*;
