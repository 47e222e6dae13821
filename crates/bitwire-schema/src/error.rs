/// Errors that can occur while loading, compiling or applying definitions.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A definition file could not be loaded.
    #[error("failed to load definitions: {0}")]
    LoadFailed(String),

    /// The definition document is not valid JSON or has the wrong shape.
    #[error("invalid definition JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A definition violates a layout rule.
    #[error("invalid definition {name}: {reason}")]
    InvalidDefinition { name: String, reason: String },

    /// Two definitions share a name.
    #[error("duplicate definition: {0}")]
    Duplicate(String),

    /// A message field references a type that is neither a scalar nor a
    /// registered enum or bitfield.
    #[error("field {field} has unknown type {type_name}")]
    UnknownType { field: String, type_name: String },

    /// No message layout with this name.
    #[error("unknown message: {0}")]
    UnknownMessage(String),

    /// The layout has no field (or sub-field) with this name.
    #[error("message {message} has no field {field}")]
    UnknownField { message: String, field: String },

    /// A value does not fit or does not apply to the field.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    /// Byte-level codec failure.
    #[error("codec error: {0}")]
    Codec(#[from] bitwire_codec::CodecError),
}

pub type Result<T> = std::result::Result<T, SchemaError>;
