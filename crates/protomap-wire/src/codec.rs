//! The codec seam

use protomap_schema::{MessageSchema, SchemaInspector};
use std::fmt::Debug;

use crate::error::WireError;
use crate::raw::RawMessage;

/// Converts between bytes and [`RawMessage`] for a given schema
///
/// The inspector resolves nested message schemas. Implementations must be
/// shareable across threads; a mapper holds one for its whole lifetime.
pub trait Codec: Send + Sync + Debug {
    /// Short name used in logs and diagnostics
    fn name(&self) -> &str;

    /// Encode a message of `schema`
    ///
    /// # Errors
    /// Returns error if the message stores a value that does not fit the schema
    fn encode(
        &self,
        message: &RawMessage,
        schema: &MessageSchema,
        inspector: &dyn SchemaInspector,
    ) -> Result<Vec<u8>, WireError>;

    /// Decode bytes as a message of `schema`
    ///
    /// # Errors
    /// Returns error if the bytes are malformed or disagree with the schema
    fn decode(
        &self,
        bytes: &[u8],
        schema: &MessageSchema,
        inspector: &dyn SchemaInspector,
    ) -> Result<RawMessage, WireError>;
}
