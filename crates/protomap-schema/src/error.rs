//! Error types for schema construction, loading and resolution

use crate::descriptor::ScalarType;
use std::path::PathBuf;

/// Errors raised while building, loading or walking schemas
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A message or enum was declared with an empty name
    #[error("schema name must not be empty")]
    EmptyName,

    /// Two messages share a name
    #[error("duplicate message schema: {0}")]
    DuplicateMessage(String),

    /// Two enums share a name
    #[error("duplicate enum schema: {0}")]
    DuplicateEnum(String),

    /// A message and an enum share a name
    #[error("name '{0}' is declared as both a message and an enum")]
    NameCollision(String),

    /// Two fields of one message share a name
    #[error("duplicate field '{field}' in {schema}")]
    DuplicateField { schema: String, field: String },

    /// Two fields of one message share a tag
    #[error("duplicate tag {tag} in {schema}")]
    DuplicateTag { schema: String, tag: u32 },

    /// Tag is zero, too large, or inside the reserved range
    #[error("invalid tag {tag} for field '{field}' in {schema}")]
    InvalidTag {
        schema: String,
        field: String,
        tag: u32,
    },

    /// Lookup of a message schema that does not exist
    #[error("unknown message schema: {0}")]
    UnknownMessage(String),

    /// Lookup of an enum schema that does not exist
    #[error("unknown enum schema: {0}")]
    UnknownEnum(String),

    /// A field references a message or enum that is not declared
    #[error("field '{field}' in {schema} references undeclared type '{target}'")]
    UnresolvedReference {
        schema: String,
        field: String,
        target: String,
    },

    /// A document field names a type that is neither scalar nor declared
    #[error("field '{field}' in {schema} has unknown type '{ty}'")]
    UnknownType {
        schema: String,
        field: String,
        ty: String,
    },

    /// Map keys must be integral, bool or string scalars
    #[error("field '{field}' in {schema} uses {key} as a map key")]
    InvalidMapKey {
        schema: String,
        field: String,
        key: ScalarType,
    },

    /// One-of members must be singular
    #[error("one-of member '{field}' in {schema} must be singular")]
    InvalidOneOfMember { schema: String, field: String },

    /// Enums need at least one value, and one of them numbered zero
    #[error("enum {0} has no value numbered 0")]
    EnumWithoutZero(String),

    /// Two enum values share a name
    #[error("duplicate value '{value}' in enum {schema}")]
    DuplicateEnumValue { schema: String, value: String },

    /// Document is structurally valid but inconsistent
    #[error("invalid schema document: {0}")]
    InvalidDocument(String),

    /// YAML parsing failed
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing failed
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading a schema file failed
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SchemaError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Name of the missing message schema, if this is a lookup failure
    #[must_use]
    pub fn missing_message(&self) -> Option<&str> {
        match self {
            Self::UnknownMessage(name) => Some(name),
            _ => None,
        }
    }
}
