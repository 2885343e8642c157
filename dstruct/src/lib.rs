/* Struct Engine Library
 *
 * Builds fixed-layout composite ("struct") types at runtime from a list of
 * field descriptors: C-style alignment and padding, overlapping union
 * members, nested structs and fixed-length arrays, typed accessors with
 * configurable cast strictness, and linear/layout/JSON renderings.
 */

mod accessor;
pub mod array;
pub mod buffer;
mod convert;
pub mod errors;
pub mod field;
pub mod format;
pub mod instance;
mod layout;
pub mod schema;
pub mod struct_type;
pub mod value;

pub use array::{ArrayView, TypedArray};
pub use buffer::{BufferView, ByteBuffer, Endian};
pub use dstruct_types::{CastingMode, Complex128, Complex64, DataType};
pub use errors::{StructError, StructResult};
pub use field::{ElementSpec, Field, FieldSpec, FieldType, UnionSpec};
pub use format::{describe, StringFormat};
pub use instance::Struct;
pub use schema::SchemaRegistry;
pub use struct_type::StructType;
pub use value::Value;
