//! Shared schema fixtures for protomap tests
//!
//! Every fixture pool is built from the same set of schemas:
//!
//! - `Person` / `Address`: the minimal nested pair
//! - `Contact`: one field of every category, a one-of group, lists, maps, an
//!   enum and a `StringValue` wrapper
//! - `Tree` (self-recursive) and `Ping` / `Pong` (mutually recursive)
//! - `Scalars`: one field per scalar type
//! - `Orphan`: referenced by nothing

#![allow(missing_docs)]

use protomap_schema::{EnumSchema, FieldDescriptor, MessageSchema, ScalarType, SchemaInspector, SchemaPool};
use std::sync::Arc;

pub fn address_schema() -> MessageSchema {
    MessageSchema::new("Address").with_field(FieldDescriptor::scalar("city", 1, ScalarType::String))
}

pub fn person_schema() -> MessageSchema {
    MessageSchema::new("Person")
        .with_field(FieldDescriptor::scalar("name", 1, ScalarType::String))
        .with_field(FieldDescriptor::scalar("email", 2, ScalarType::String))
        .with_field(FieldDescriptor::message("address", 3, "Address"))
}

/// `Person` as a later revision sees it, with an extra `nickname` field
pub fn person_v2_schema() -> MessageSchema {
    person_schema().with_field(FieldDescriptor::scalar("nickname", 4, ScalarType::String))
}

pub fn kind_enum() -> EnumSchema {
    EnumSchema::new("Kind")
        .with_value("KIND_UNSPECIFIED", 0)
        .with_value("KIND_PERSONAL", 1)
        .with_value("KIND_WORK", 2)
}

pub fn contact_schema() -> MessageSchema {
    MessageSchema::new("Contact")
        .with_field(FieldDescriptor::scalar("id", 1, ScalarType::Uint64))
        .with_field(FieldDescriptor::message("person", 2, "Person"))
        .with_field(FieldDescriptor::message("phones", 3, "Phone").repeated())
        .with_field(FieldDescriptor::scalar("labels", 4, ScalarType::Int32).map_key(ScalarType::String))
        .with_field(FieldDescriptor::enumeration("kind", 5, "Kind"))
        .with_field(FieldDescriptor::scalar("handle", 6, ScalarType::String).in_one_of("channel"))
        .with_field(FieldDescriptor::message("account", 7, "Account").in_one_of("channel"))
        .with_field(FieldDescriptor::scalar("notes", 8, ScalarType::String).repeated())
        .with_field(FieldDescriptor::scalar("avatar", 9, ScalarType::Bytes))
        .with_field(FieldDescriptor::scalar("score", 10, ScalarType::Double))
        .with_field(FieldDescriptor::message("created", 11, "StringValue"))
        .with_field(FieldDescriptor::message("lookup", 12, "Address").map_key(ScalarType::Int32))
}

pub fn phone_schema() -> MessageSchema {
    MessageSchema::new("Phone")
        .with_field(FieldDescriptor::scalar("number", 1, ScalarType::String))
        .with_field(FieldDescriptor::scalar("primary", 2, ScalarType::Bool))
}

pub fn account_schema() -> MessageSchema {
    MessageSchema::new("Account")
        .with_field(FieldDescriptor::scalar("id", 1, ScalarType::Uint64))
        .with_field(FieldDescriptor::scalar("active", 2, ScalarType::Bool))
}

pub fn string_value_schema() -> MessageSchema {
    MessageSchema::new("StringValue").with_field(FieldDescriptor::scalar("value", 1, ScalarType::String))
}

pub fn tree_schema() -> MessageSchema {
    MessageSchema::new("Tree")
        .with_field(FieldDescriptor::scalar("label", 1, ScalarType::String))
        .with_field(FieldDescriptor::message("children", 2, "Tree").repeated())
}

pub fn ping_schema() -> MessageSchema {
    MessageSchema::new("Ping")
        .with_field(FieldDescriptor::scalar("seq", 1, ScalarType::Int32))
        .with_field(FieldDescriptor::message("pong", 2, "Pong"))
}

pub fn pong_schema() -> MessageSchema {
    MessageSchema::new("Pong")
        .with_field(FieldDescriptor::scalar("seq", 1, ScalarType::Int32))
        .with_field(FieldDescriptor::message("ping", 2, "Ping"))
}

pub fn scalars_schema() -> MessageSchema {
    MessageSchema::new("Scalars")
        .with_field(FieldDescriptor::scalar("f_double", 1, ScalarType::Double))
        .with_field(FieldDescriptor::scalar("f_float", 2, ScalarType::Float))
        .with_field(FieldDescriptor::scalar("f_int32", 3, ScalarType::Int32))
        .with_field(FieldDescriptor::scalar("f_int64", 4, ScalarType::Int64))
        .with_field(FieldDescriptor::scalar("f_uint32", 5, ScalarType::Uint32))
        .with_field(FieldDescriptor::scalar("f_uint64", 6, ScalarType::Uint64))
        .with_field(FieldDescriptor::scalar("f_sint32", 7, ScalarType::Sint32))
        .with_field(FieldDescriptor::scalar("f_sint64", 8, ScalarType::Sint64))
        .with_field(FieldDescriptor::scalar("f_fixed32", 9, ScalarType::Fixed32))
        .with_field(FieldDescriptor::scalar("f_fixed64", 10, ScalarType::Fixed64))
        .with_field(FieldDescriptor::scalar("f_sfixed32", 11, ScalarType::Sfixed32))
        .with_field(FieldDescriptor::scalar("f_sfixed64", 12, ScalarType::Sfixed64))
        .with_field(FieldDescriptor::scalar("f_bool", 13, ScalarType::Bool))
        .with_field(FieldDescriptor::scalar("f_string", 14, ScalarType::String))
        .with_field(FieldDescriptor::scalar("f_bytes", 15, ScalarType::Bytes))
}

pub fn orphan_schema() -> MessageSchema {
    MessageSchema::new("Orphan").with_field(FieldDescriptor::scalar("note", 1, ScalarType::String))
}

/// `Person` and `Address` only
pub fn person_pool() -> SchemaPool {
    SchemaPool::builder()
        .message(address_schema())
        .message(person_schema())
        .build()
        .unwrap()
}

/// Same as [`person_pool`] with [`person_v2_schema`] in place of `Person`
pub fn person_v2_pool() -> SchemaPool {
    SchemaPool::builder()
        .message(address_schema())
        .message(person_v2_schema())
        .build()
        .unwrap()
}

/// Every fixture schema
pub fn full_pool() -> SchemaPool {
    SchemaPool::builder()
        .enumeration(kind_enum())
        .message(address_schema())
        .message(person_schema())
        .message(phone_schema())
        .message(account_schema())
        .message(string_value_schema())
        .message(contact_schema())
        .message(tree_schema())
        .message(ping_schema())
        .message(pong_schema())
        .message(scalars_schema())
        .message(orphan_schema())
        .build()
        .unwrap()
}

/// [`full_pool`] behind the inspector trait object mappers take
pub fn inspector() -> Arc<dyn SchemaInspector> {
    Arc::new(full_pool())
}

/// [`person_pool`] behind the inspector trait object mappers take
pub fn person_inspector() -> Arc<dyn SchemaInspector> {
    Arc::new(person_pool())
}

/// Document form of the `Person`, `Address`, `Contact` and `Kind` fixtures
pub const CONTACTS_YAML: &str = r"
enums:
  - name: Kind
    values:
      - { name: KIND_UNSPECIFIED, number: 0 }
      - { name: KIND_PERSONAL, number: 1 }
      - { name: KIND_WORK, number: 2 }
messages:
  - name: Address
    fields:
      - { name: city, tag: 1, type: string }
  - name: Person
    fields:
      - { name: name, tag: 1, type: string }
      - { name: email, tag: 2, type: string }
      - { name: address, tag: 3, type: Address }
  - name: Phone
    fields:
      - { name: number, tag: 1, type: string }
      - { name: primary, tag: 2, type: bool }
  - name: Account
    fields:
      - { name: id, tag: 1, type: uint64 }
      - { name: active, tag: 2, type: bool }
  - name: StringValue
    fields:
      - { name: value, tag: 1, type: string }
  - name: Contact
    fields:
      - { name: id, tag: 1, type: uint64 }
      - { name: person, tag: 2, type: Person }
      - { name: phones, tag: 3, type: Phone, label: repeated }
      - { name: labels, tag: 4, type: int32, map_key: string }
      - { name: kind, tag: 5, type: Kind }
      - { name: handle, tag: 6, type: string, one_of: channel }
      - { name: account, tag: 7, type: Account, one_of: channel }
      - { name: notes, tag: 8, type: string, label: repeated }
      - { name: avatar, tag: 9, type: bytes }
      - { name: score, tag: 10, type: double }
      - { name: created, tag: 11, type: StringValue }
      - { name: lookup, tag: 12, type: Address, map_key: int32 }
";
