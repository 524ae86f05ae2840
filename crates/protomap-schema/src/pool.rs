//! Schema pools
//!
//! A [`SchemaPool`] is an immutable, validated set of message and enum
//! schemas. It is the shipped implementation of [`SchemaInspector`], the
//! read-only view every other crate consumes.

use indexmap::IndexMap;
use std::collections::HashSet;
use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;

use crate::descriptor::{
    EnumSchema, FieldDescriptor, FieldType, Label, MessageSchema, MAX_TAG, RESERVED_TAGS,
};
use crate::document::SchemaDocument;
use crate::error::SchemaError;

/// Read-only access to message and enum descriptors
pub trait SchemaInspector: Send + Sync + Debug {
    /// Message schema by fully qualified name
    fn message(&self, name: &str) -> Option<&MessageSchema>;

    /// Enum schema by fully qualified name
    fn enumeration(&self, name: &str) -> Option<&EnumSchema>;

    /// Ordered field descriptors of a message
    fn fields(&self, name: &str) -> Option<&[FieldDescriptor]> {
        self.message(name).map(MessageSchema::fields)
    }

    /// Message lookup that reports the missing name
    ///
    /// # Errors
    /// Returns [`SchemaError::UnknownMessage`] if no such message exists
    fn require_message(&self, name: &str) -> Result<&MessageSchema, SchemaError> {
        self.message(name)
            .ok_or_else(|| SchemaError::UnknownMessage(name.to_string()))
    }
}

/// Immutable, validated set of schemas
#[derive(Debug, Clone, Default)]
pub struct SchemaPool {
    messages: IndexMap<Arc<str>, MessageSchema>,
    enums: IndexMap<Arc<str>, EnumSchema>,
}

impl SchemaPool {
    /// Start building a pool
    #[inline]
    #[must_use]
    pub fn builder() -> SchemaPoolBuilder {
        SchemaPoolBuilder::default()
    }

    /// Parse and validate a YAML schema document
    ///
    /// # Errors
    /// Returns error if the document is malformed or fails validation
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SchemaError> {
        SchemaDocument::from_yaml_str(yaml)?.into_pool()
    }

    /// Parse and validate a JSON schema document
    ///
    /// # Errors
    /// Returns error if the document is malformed or fails validation
    pub fn from_json_str(json: &str) -> Result<Self, SchemaError> {
        SchemaDocument::from_json_str(json)?.into_pool()
    }

    /// Load a schema document, choosing the format by extension
    ///
    /// `.json` is parsed as JSON; anything else as YAML.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or the document is invalid
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| SchemaError::io_error(path, e))?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_yaml_str(&text)
        }
    }

    /// Message schemas in declaration order
    pub fn messages(&self) -> impl Iterator<Item = &MessageSchema> {
        self.messages.values()
    }

    /// Enum schemas in declaration order
    pub fn enums(&self) -> impl Iterator<Item = &EnumSchema> {
        self.enums.values()
    }

    #[inline]
    #[must_use]
    pub fn contains_message(&self, name: &str) -> bool {
        self.messages.contains_key(name)
    }

    /// Number of message schemas
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl SchemaInspector for SchemaPool {
    fn message(&self, name: &str) -> Option<&MessageSchema> {
        self.messages.get(name)
    }

    fn enumeration(&self, name: &str) -> Option<&EnumSchema> {
        self.enums.get(name)
    }
}

/// Builder that validates schemas as a whole
#[derive(Debug, Default)]
pub struct SchemaPoolBuilder {
    messages: Vec<MessageSchema>,
    enums: Vec<EnumSchema>,
}

impl SchemaPoolBuilder {
    /// Add a message schema
    #[inline]
    #[must_use]
    pub fn message(mut self, schema: MessageSchema) -> Self {
        self.messages.push(schema);
        self
    }

    /// Add an enum schema
    #[inline]
    #[must_use]
    pub fn enumeration(mut self, schema: EnumSchema) -> Self {
        self.enums.push(schema);
        self
    }

    /// Validate and freeze the pool
    ///
    /// # Errors
    /// Returns the first validation failure found
    pub fn build(self) -> Result<SchemaPool, SchemaError> {
        let mut pool = SchemaPool::default();

        for schema in self.enums {
            validate_enum(&schema)?;
            let name = schema.name_arc().clone();
            if pool.enums.insert(name.clone(), schema).is_some() {
                return Err(SchemaError::DuplicateEnum(name.to_string()));
            }
        }

        for schema in self.messages {
            let name = schema.name_arc().clone();
            if name.is_empty() {
                return Err(SchemaError::EmptyName);
            }
            if pool.enums.contains_key(&name) {
                return Err(SchemaError::NameCollision(name.to_string()));
            }
            if pool.messages.insert(name.clone(), schema).is_some() {
                return Err(SchemaError::DuplicateMessage(name.to_string()));
            }
        }

        for schema in pool.messages.values() {
            validate_message(schema, &pool)?;
        }

        tracing::debug!(
            messages = pool.messages.len(),
            enums = pool.enums.len(),
            "schema pool built"
        );
        Ok(pool)
    }
}

fn validate_enum(schema: &EnumSchema) -> Result<(), SchemaError> {
    if schema.name().is_empty() {
        return Err(SchemaError::EmptyName);
    }
    let mut names = HashSet::new();
    for value in schema.values() {
        if !names.insert(value.name()) {
            return Err(SchemaError::DuplicateEnumValue {
                schema: schema.name().to_string(),
                value: value.name().to_string(),
            });
        }
    }
    if schema.default_entry().is_none() {
        return Err(SchemaError::EnumWithoutZero(schema.name().to_string()));
    }
    Ok(())
}

fn validate_message(schema: &MessageSchema, pool: &SchemaPool) -> Result<(), SchemaError> {
    let owner = || schema.name().to_string();
    let mut names = HashSet::new();
    let mut tags = HashSet::new();

    for field in schema.fields() {
        if !names.insert(field.name()) {
            return Err(SchemaError::DuplicateField {
                schema: owner(),
                field: field.name().to_string(),
            });
        }
        if !tags.insert(field.tag()) {
            return Err(SchemaError::DuplicateTag {
                schema: owner(),
                tag: field.tag(),
            });
        }
        if field.tag() == 0 || field.tag() > MAX_TAG || RESERVED_TAGS.contains(&field.tag()) {
            return Err(SchemaError::InvalidTag {
                schema: owner(),
                field: field.name().to_string(),
                tag: field.tag(),
            });
        }

        let resolved = match field.field_type() {
            FieldType::Scalar(_) => true,
            FieldType::Enum(name) => pool.enums.contains_key(name),
            FieldType::Message(name) => pool.messages.contains_key(name),
        };
        if !resolved {
            let target = match field.field_type() {
                FieldType::Enum(name) | FieldType::Message(name) => name.to_string(),
                FieldType::Scalar(ty) => ty.to_string(),
            };
            return Err(SchemaError::UnresolvedReference {
                schema: owner(),
                field: field.name().to_string(),
                target,
            });
        }

        if let Label::Map { key } = field.label() {
            if !key.is_valid_map_key() {
                return Err(SchemaError::InvalidMapKey {
                    schema: owner(),
                    field: field.name().to_string(),
                    key,
                });
            }
        }

        if field.one_of().is_some() && !matches!(field.label(), Label::Singular) {
            return Err(SchemaError::InvalidOneOfMember {
                schema: owner(),
                field: field.name().to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ScalarType;

    fn address() -> MessageSchema {
        MessageSchema::new("Address").with_field(FieldDescriptor::scalar("city", 1, ScalarType::String))
    }

    #[test]
    fn builds_valid_pool() {
        let pool = SchemaPool::builder()
            .message(address())
            .message(
                MessageSchema::new("Person")
                    .with_field(FieldDescriptor::scalar("name", 1, ScalarType::String))
                    .with_field(FieldDescriptor::message("address", 2, "Address")),
            )
            .build()
            .unwrap();
        assert_eq!(pool.len(), 2);
        assert!(pool.contains_message("Person"));
        assert_eq!(pool.fields("Person").unwrap().len(), 2);
        assert!(pool.require_message("Nope").is_err());
    }

    #[test]
    fn rejects_duplicate_messages() {
        let result = SchemaPool::builder().message(address()).message(address()).build();
        assert!(matches!(result, Err(SchemaError::DuplicateMessage(name)) if name == "Address"));
    }

    #[test]
    fn rejects_duplicate_tags() {
        let schema = address().with_field(FieldDescriptor::scalar("zip", 1, ScalarType::String));
        let result = SchemaPool::builder().message(schema).build();
        assert!(matches!(result, Err(SchemaError::DuplicateTag { tag: 1, .. })));
    }

    #[test]
    fn rejects_duplicate_field_names() {
        let schema = address().with_field(FieldDescriptor::scalar("city", 2, ScalarType::String));
        let result = SchemaPool::builder().message(schema).build();
        assert!(matches!(result, Err(SchemaError::DuplicateField { .. })));
    }

    #[test]
    fn rejects_reserved_and_zero_tags() {
        for tag in [0, 19_500, MAX_TAG + 1] {
            let schema = MessageSchema::new("Bad").with_field(FieldDescriptor::scalar("x", tag, ScalarType::Bool));
            let result = SchemaPool::builder().message(schema).build();
            assert!(matches!(result, Err(SchemaError::InvalidTag { .. })), "tag {tag}");
        }
    }

    #[test]
    fn rejects_unresolved_reference() {
        let schema = MessageSchema::new("Person").with_field(FieldDescriptor::message("address", 1, "Address"));
        let result = SchemaPool::builder().message(schema).build();
        assert!(matches!(
            result,
            Err(SchemaError::UnresolvedReference { target, .. }) if target == "Address"
        ));
    }

    #[test]
    fn rejects_float_map_keys() {
        let schema = MessageSchema::new("M")
            .with_field(FieldDescriptor::scalar("m", 1, ScalarType::Int32).map_key(ScalarType::Double));
        let result = SchemaPool::builder().message(schema).build();
        assert!(matches!(result, Err(SchemaError::InvalidMapKey { .. })));
    }

    #[test]
    fn rejects_repeated_one_of_member() {
        let schema = MessageSchema::new("M")
            .with_field(FieldDescriptor::scalar("m", 1, ScalarType::Int32).repeated().in_one_of("g"));
        let result = SchemaPool::builder().message(schema).build();
        assert!(matches!(result, Err(SchemaError::InvalidOneOfMember { .. })));
    }

    #[test]
    fn rejects_enum_without_zero() {
        let result = SchemaPool::builder()
            .enumeration(EnumSchema::new("Kind").with_value("KIND_WORK", 1))
            .build();
        assert!(matches!(result, Err(SchemaError::EnumWithoutZero(_))));
    }

    #[test]
    fn rejects_message_enum_collision() {
        let result = SchemaPool::builder()
            .enumeration(EnumSchema::new("Address").with_value("NONE", 0))
            .message(address())
            .build();
        assert!(matches!(result, Err(SchemaError::NameCollision(_))));
    }
}
