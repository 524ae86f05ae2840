//! protomap schema layer
//!
//! Descriptors for protobuf-style messages and enums, validated schema pools,
//! and nested-type dependency resolution.
//!
//! # Core Concepts
//!
//! - [`MessageSchema`]: ordered field descriptors for one message type
//! - [`SchemaInspector`]: read-only descriptor access consumed by the rest of protomap
//! - [`SchemaPool`]: validated pool, built programmatically or from YAML/JSON
//! - [`dependencies`] / [`generation_order`]: leaves-first closure of nested schemas
//! - [`Fingerprint`]: Blake3 digest of a schema's canonical text
//!
//! # Example
//!
//! ```rust
//! use protomap_schema::{dependencies, FieldDescriptor, MessageSchema, ScalarType, SchemaPool};
//!
//! let pool = SchemaPool::builder()
//!     .message(MessageSchema::new("Address").with_field(FieldDescriptor::scalar("city", 1, ScalarType::String)))
//!     .message(
//!         MessageSchema::new("Person")
//!             .with_field(FieldDescriptor::scalar("name", 1, ScalarType::String))
//!             .with_field(FieldDescriptor::message("address", 3, "Address")),
//!     )
//!     .build()?;
//!
//! let deps = dependencies(&pool, "Person")?;
//! assert!(deps.contains("Address"));
//! # Ok::<(), protomap_schema::SchemaError>(())
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod descriptor;
mod document;
mod error;
mod fingerprint;
mod pool;
pub mod resolve;

pub use descriptor::{
    EnumEntry, EnumSchema, FieldDescriptor, FieldType, Label, MessageSchema, ScalarType,
    TypeCategory, MAX_TAG, RESERVED_TAGS,
};
pub use document::{EnumDoc, EnumValueDoc, FieldDoc, LabelDoc, MessageDoc, SchemaDocument};
pub use error::SchemaError;
pub use fingerprint::{Fingerprint, FingerprintBuilder, FingerprintError};
pub use pool::{SchemaInspector, SchemaPool, SchemaPoolBuilder};
pub use resolve::{dependencies, depends_on, generation_order, resolve, DependencyGraph, SeenSet};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
