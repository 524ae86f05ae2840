//! protomap core
//!
//! Immutable, map-like access to binary messages, generated from schemas.
//!
//! # Core Concepts
//!
//! - [`Mapper`]: a named, configured registry of generated wrapper types for
//!   the dependency closure of its root schemas
//! - [`WrapperType`]: per-schema field table keyed by transformed access key
//! - [`Value`]: immutable wrapper around one message; updates return new values
//! - [`Transient`]: owned builder moved through one update chain
//! - [`UpdateOp`], [`pipe`], [`pipe_cond`]: threading combinators over values
//! - [`PlainValue`], [`to_plain_map`], [`from_plain_map`]: plain-map conversion
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use protomap_core::{define_mapper, EntryXform, KeyPath, MapperOptions};
//! use protomap_schema::{FieldDescriptor, MessageSchema, ScalarType, SchemaPool};
//!
//! let pool = SchemaPool::builder()
//!     .message(MessageSchema::new("Address").with_field(FieldDescriptor::scalar("city", 1, ScalarType::String)))
//!     .message(
//!         MessageSchema::new("Person")
//!             .with_field(FieldDescriptor::scalar("full_name", 1, ScalarType::String))
//!             .with_field(FieldDescriptor::message("home_address", 3, "Address")),
//!     )
//!     .build()?;
//! let mapper = define_mapper("people", Arc::new(pool), &["Person"], MapperOptions::new().with_key_name("kebab-case"))?;
//!
//! let ann = mapper.construct("Person", [("full-name", "Ann")])?;
//! assert!(!ann.has_field("home-address")?);
//!
//! let moved = ann.assoc_in(&"home-address.city".parse::<KeyPath>()?, "Oslo")?;
//! assert!(moved.has_field("home-address")?);
//!
//! let bytes = moved.to_bytes()?;
//! assert_eq!(mapper.from_bytes("Person", &bytes)?, moved);
//!
//! let plain = moved.to_plain_map(&EntryXform::elide_defaults())?;
//! assert_eq!(plain.to_json(), serde_json::json!({"full-name": "Ann", "home-address": {"city": "Oslo"}}));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod coerce;
mod collections;
mod config;
mod error;
mod lens;
mod mapper;
mod options;
mod path;
mod plain;
mod transient;
mod value;
mod wrapper;

pub mod naming;

pub use collections::{ListValue, MapValue};
pub use config::{ConfigError, MapperConfig};
pub use error::{DefinitionError, MapError, MapResult};
pub use lens::{pipe, pipe_cond, when, Pred, UpdateFn, UpdateOp};
pub use mapper::{define_mapper, Mapper};
pub use options::{Encoder, Entry, EntryXform, FnRef, MapperOptions, NameFn, TransformCatalog};
pub use path::{KeyPath, PathError};
pub use plain::{from_plain_map, to_plain_map, PlainValue};
pub use transient::Transient;
pub use value::{EnumValue, FieldValue, Value};
pub use wrapper::{FieldAccessor, WrapperType};

/// Re-exported from the schema layer
pub use protomap_schema::{dependencies, depends_on, DependencyGraph, Fingerprint, SchemaInspector, SchemaPool};
/// Re-exported from the wire layer
pub use protomap_wire::{Bytes, Codec, MapKey, ProtoCodec, RawMessage};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
