//! Wire codec errors

use prost::encoding::WireType;

/// Errors raised while encoding or decoding messages
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// Malformed varint or field key
    #[error("decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    /// A declared field arrived with the wrong wire type
    #[error("field '{field}' in {schema}: expected wire type {expected:?}, got {actual:?}")]
    UnexpectedWireType {
        schema: String,
        field: String,
        expected: WireType,
        actual: WireType,
    },

    /// String field is not valid UTF-8
    #[error("field '{field}' in {schema} is not valid UTF-8")]
    InvalidUtf8 { schema: String, field: String },

    /// Input ended inside a field
    #[error("buffer truncated while reading {schema}")]
    Truncated { schema: String },

    /// Nested messages deeper than the configured limit
    #[error("recursion limit of {limit} nested messages exceeded")]
    RecursionLimit { limit: u32 },

    /// A referenced message schema is unknown to the inspector
    #[error("unknown message schema: {0}")]
    UnknownSchema(String),

    /// A raw message stores a tag its schema does not declare
    #[error("tag {tag} is not declared by {schema}")]
    UndeclaredTag { schema: String, tag: u32 },

    /// A stored value does not fit its field's declared type
    #[error("field '{field}' in {schema} expects {expected}, found {found}")]
    ValueKindMismatch {
        schema: String,
        field: String,
        expected: String,
        found: &'static str,
    },

    /// Deprecated group encoding
    #[error("group encoding is not supported (tag {tag})")]
    UnsupportedGroup { tag: u32 },
}
