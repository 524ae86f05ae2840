//! Error types for mapper definition and value access
//!
//! Definition-time failures are collected under [`DefinitionError`] and are
//! always raised before a mapper is published. Every per-call failure is a
//! [`MapError`] that keeps its original cause reachable through `source()`.

use protomap_schema::SchemaError;
use protomap_wire::WireError;

use crate::config::ConfigError;

/// Errors raised while defining a mapper
#[derive(Debug, thiserror::Error)]
pub enum DefinitionError {
    /// Mapper name is empty
    #[error("mapper name must not be empty")]
    EmptyName,

    /// No root schemas were given
    #[error("mapper '{0}' has no root schemas")]
    NoRoots(String),

    /// A root is not a message schema known to the inspector
    #[error("root '{0}' is not a known message schema")]
    NotAMessage(String),

    /// A named function reference is missing from the catalog
    #[error("unresolved {kind} function '{name}'")]
    UnresolvedFunction { kind: &'static str, name: String },

    /// The key function produced an empty key
    #[error("key function maps '{field}' in {schema} to an empty key")]
    EmptyKey { schema: String, field: String },

    /// The key function produced the same key twice within one schema
    #[error("duplicate key '{key}' in {schema}")]
    DuplicateKey { schema: String, key: String },

    /// The enum function produced the same name twice within one enum
    #[error("duplicate enum name '{name}' in {schema}")]
    DuplicateEnumName { schema: String, name: String },

    /// An encoder names a schema outside the mapper's closure
    #[error("encoder registered for '{0}', which the mapper does not load")]
    EncoderForUnknownSchema(String),

    /// Resolution failed inside the schema layer
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
}

/// Errors raised by mapper and value operations
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// Mapper definition failed
    #[error("definition error: {0}")]
    Definition(#[from] DefinitionError),

    /// The schema has no wrapper type in this mapper
    #[error("schema '{schema}' is not loaded by mapper '{mapper}' ({detail})")]
    NotLoadedByMapper {
        schema: String,
        mapper: String,
        detail: String,
        #[source]
        source: Option<Box<MapError>>,
    },

    /// Key or value does not match the schema
    #[error("schema violation in {schema} at '{key}': {reason}")]
    SchemaViolation {
        schema: String,
        key: String,
        reason: String,
    },

    /// Access of an undeclared key or one-of group
    #[error("{schema} has no key '{key}'")]
    NotFound { schema: String, key: String },

    /// Wire encoding or decoding failed
    #[error("codec error: {0}")]
    Codec(#[from] WireError),

    /// A custom encoder hook failed
    #[error("encoder for {schema} failed: {reason}")]
    Encoder { schema: String, reason: String },

    /// Schema inspector lookup failed
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Mapper configuration could not be loaded
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

impl MapError {
    /// Create schema violation error
    pub fn violation(schema: impl Into<String>, key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SchemaViolation {
            schema: schema.into(),
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create not-found error
    pub fn not_found(schema: impl Into<String>, key: impl Into<String>) -> Self {
        Self::NotFound {
            schema: schema.into(),
            key: key.into(),
        }
    }

    /// Create encoder error
    pub fn encoder(schema: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Encoder {
            schema: schema.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for mapper operations
pub type MapResult<T> = Result<T, MapError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn violation_display() {
        let err = MapError::violation("Person", "age", "expected int32");
        assert_eq!(err.to_string(), "schema violation in Person at 'age': expected int32");
    }

    #[test]
    fn not_loaded_keeps_cause() {
        let cause = MapError::Schema(SchemaError::UnknownMessage("Team".to_string()));
        let err = MapError::NotLoadedByMapper {
            schema: "Team".to_string(),
            mapper: "people".to_string(),
            detail: "unknown to the schema inspector".to_string(),
            source: Some(Box::new(cause)),
        };
        assert!(err.to_string().contains("not loaded by mapper 'people'"));
        assert!(err.source().is_some_and(|s| s.to_string().contains("unknown message schema")));
    }

    #[test]
    fn definition_error_converts() {
        let err: MapError = DefinitionError::NoRoots("m".to_string()).into();
        assert!(matches!(err, MapError::Definition(DefinitionError::NoRoots(_))));
    }
}
