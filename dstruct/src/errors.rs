use thiserror::Error;

/// Result alias used across the struct engine.
pub type StructResult<T> = Result<T, StructError>;

/// Errors produced while defining struct types, building instances, or
/// assigning field values.
#[derive(Debug, Error)]
pub enum StructError {
    /// A field object is missing `name` or `type`.
    #[error("invalid argument. Field objects must have the following properties: \"name, type\". Missing: `{property}`. Value: `{spec}`")]
    MissingProperty { property: &'static str, spec: String },

    /// A recognised field property carries an invalid value.
    #[error("invalid argument. `{property}` field {reason}. Value: `{value}`")]
    InvalidProperty {
        property: &'static str,
        reason: String,
        value: String,
    },

    /// Argument has the wrong overall shape.
    #[error("invalid argument. {0}")]
    InvalidArgument(String),

    /// Two fields (union members included) share a name.
    #[error("invalid argument. Field names must be unique. Duplicate: `{name}`")]
    DuplicateField { name: String },

    /// A union declares no members.
    #[error("invalid argument. Union types must contain at least one field")]
    EmptyUnion,

    /// A union member is itself a union.
    #[error("invalid argument. Union types cannot contain nested union types. Member: `{member}`")]
    NestedUnion { member: String },

    /// Union members do not share one byte length.
    #[error("invalid argument. Union types must contain fields having the same byte length. `{field}` has {found} bytes, expected {expected}")]
    UnionLengthMismatch {
        field: String,
        expected: usize,
        found: usize,
    },

    /// More than one union member carries a default value.
    #[error("invalid argument. Union types can only contain one field with a default value. Fields: `{first}`, `{second}`")]
    MultipleUnionDefaults { first: String, second: String },

    /// Two members of one union were given initial values.
    #[error("invalid argument. Union types may only be initialized by a single member. Fields: `{first}`, `{second}`")]
    UnionConflict { first: String, second: String },

    /// Caller-supplied storage is too small.
    #[error("invalid argument. Buffer has insufficient capacity. Minimum capacity: `{required}`. Available: `{available}`")]
    InsufficientCapacity { required: usize, available: usize },

    /// A read or write fell outside a buffer view.
    #[error("byte range [{offset}, {offset}+{size}) is outside a view of {byte_length} bytes")]
    OutOfBounds {
        offset: usize,
        size: usize,
        byte_length: usize,
    },

    /// A field name lookup failed.
    #[error("invalid argument. Field name must be one of the following: \"{available}\". Value: `{name}`")]
    UnknownField { name: String, available: String },

    /// Lookup on a struct type without fields.
    #[error("invalid operation. struct does not have any fields")]
    NoFields,

    /// The inferred source dtype may not be cast to the field dtype.
    #[error("invalid assignment. Assigned value cannot be cast to the data type of `{field}`. Data types: [{dtype}, {source_dtype}]")]
    CastingViolation {
        field: String,
        dtype: String,
        source_dtype: String,
    },

    /// The assigned value has the wrong shape for the field.
    #[error("invalid assignment. `{field}` {reason}")]
    InvalidAssignment { field: String, reason: String },

    /// Array assignment with the wrong element count.
    #[error("invalid assignment. `{field}` must be an array-like object having length {expected}. Length: {found}")]
    LengthMismatch {
        field: String,
        expected: usize,
        found: usize,
    },

    /// Struct assignment with the wrong byte length.
    #[error("invalid assignment. `{field}` must be a `struct` instance having byte length {expected}. Byte length: {found}")]
    ByteLengthMismatch {
        field: String,
        expected: usize,
        found: usize,
    },

    /// Public assignment to a non-writable field.
    #[error("invalid assignment. `{field}` is read-only")]
    ReadOnlyField { field: String },

    /// An instance of a different struct type was supplied.
    #[error("invalid argument. Value is not an instance of this struct type")]
    ForeignInstance,

    /// Schema definition file problems (unknown or circular type names, bad shape).
    #[error("schema error: {0}")]
    Schema(String),

    #[error("Unknown type `{name}`. Known types: {known}")]
    UnknownType { name: String, known: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yml::Error),
}

impl StructError {
    pub(crate) fn invalid_property(
        property: &'static str,
        reason: impl Into<String>,
        value: impl ToString,
    ) -> Self {
        StructError::InvalidProperty {
            property,
            reason: reason.into(),
            value: value.to_string(),
        }
    }

    pub(crate) fn invalid_assignment(field: &str, reason: impl Into<String>) -> Self {
        StructError::InvalidAssignment {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
