//! protomap wire layer
//!
//! The persistent [`RawMessage`] representation every value wraps, the
//! [`Codec`] seam between bytes and raw messages, and [`ProtoCodec`], the
//! protobuf binary implementation.
//!
//! # Example
//!
//! ```rust
//! use protomap_schema::{FieldDescriptor, MessageSchema, ScalarType, SchemaInspector, SchemaPool};
//! use protomap_wire::{Codec, ProtoCodec, RawField, RawMessage, RawValue};
//!
//! let pool = SchemaPool::builder()
//!     .message(MessageSchema::new("Address").with_field(FieldDescriptor::scalar("city", 1, ScalarType::String)))
//!     .build()?;
//! let schema = pool.require_message("Address")?;
//!
//! let raw = RawMessage::new().with(1, RawField::Single(RawValue::String("Oslo".into())));
//! let bytes = ProtoCodec::new().encode(&raw, schema, &pool)?;
//! assert_eq!(ProtoCodec::new().decode(&bytes, schema, &pool)?, raw);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod codec;
mod error;
mod proto;
mod raw;

pub use codec::Codec;
pub use error::WireError;
pub use proto::{ProtoCodec, DEFAULT_RECURSION_LIMIT};
pub use raw::{MapKey, RawField, RawMessage, RawValue};

/// Re-exported persistent collections used by [`RawField`]
pub use im::{OrdMap, Vector};
/// Re-exported byte buffer used by [`RawValue::Bytes`]
pub use prost::bytes::Bytes;
