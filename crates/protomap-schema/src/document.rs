//! Schema documents
//!
//! YAML/JSON form of a schema pool. A field's `type` is either a scalar name
//! or the name of an enum or message declared in the same document.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::descriptor::{EnumSchema, FieldDescriptor, FieldType, MessageSchema, ScalarType};
use crate::error::SchemaError;
use crate::pool::SchemaPool;

/// Top-level schema document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    #[serde(default)]
    pub enums: Vec<EnumDoc>,
    #[serde(default)]
    pub messages: Vec<MessageDoc>,
}

/// Enum declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumDoc {
    pub name: String,
    pub values: Vec<EnumValueDoc>,
}

/// One enum constant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumValueDoc {
    pub name: String,
    pub number: i32,
}

/// Message declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDoc {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDoc>,
}

/// Field declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDoc {
    pub name: String,
    pub tag: u32,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub label: LabelDoc,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_key: Option<ScalarType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_of: Option<String>,
}

/// Field label as written in documents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelDoc {
    #[default]
    Singular,
    Repeated,
}

impl SchemaDocument {
    /// Parse from YAML string
    ///
    /// # Errors
    /// Returns error if YAML is invalid
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SchemaError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse from JSON string
    ///
    /// # Errors
    /// Returns error if JSON is invalid
    pub fn from_json_str(json: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Resolve type names and build a validated pool
    ///
    /// # Errors
    /// Returns error for unknown type names, conflicting labels, or any pool
    /// validation failure
    pub fn into_pool(self) -> Result<SchemaPool, SchemaError> {
        let enum_names: HashSet<&str> = self.enums.iter().map(|e| e.name.as_str()).collect();
        let message_names: HashSet<&str> = self.messages.iter().map(|m| m.name.as_str()).collect();

        let mut builder = SchemaPool::builder();
        for doc in &self.enums {
            let schema = doc
                .values
                .iter()
                .fold(EnumSchema::new(doc.name.as_str()), |schema, v| {
                    schema.with_value(v.name.as_str(), v.number)
                });
            builder = builder.enumeration(schema);
        }

        for doc in &self.messages {
            let mut schema = MessageSchema::new(doc.name.as_str());
            for field in &doc.fields {
                let ty = if let Some(scalar) = ScalarType::parse(&field.ty) {
                    FieldType::Scalar(scalar)
                } else if enum_names.contains(field.ty.as_str()) {
                    FieldType::Enum(field.ty.as_str().into())
                } else if message_names.contains(field.ty.as_str()) {
                    FieldType::Message(field.ty.as_str().into())
                } else {
                    return Err(SchemaError::UnknownType {
                        schema: doc.name.clone(),
                        field: field.name.clone(),
                        ty: field.ty.clone(),
                    });
                };

                let mut descriptor = FieldDescriptor::new(field.name.as_str(), field.tag, ty);
                match (field.label, field.map_key) {
                    (LabelDoc::Repeated, Some(_)) => {
                        return Err(SchemaError::InvalidDocument(format!(
                            "field '{}' in {} is both repeated and a map",
                            field.name, doc.name
                        )));
                    }
                    (LabelDoc::Repeated, None) => descriptor = descriptor.repeated(),
                    (LabelDoc::Singular, Some(key)) => descriptor = descriptor.map_key(key),
                    (LabelDoc::Singular, None) => {}
                }
                if let Some(group) = &field.one_of {
                    descriptor = descriptor.in_one_of(group.as_str());
                }
                schema = schema.with_field(descriptor);
            }
            builder = builder.message(schema);
        }

        builder.build()
    }
}
