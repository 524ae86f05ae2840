//! Transient builders for update chains
//!
//! A [`Transient`] is moved through every step of an update chain. It starts
//! out borrowing the snapshot it was created from and takes ownership of a
//! draft on the first write, so a published [`Value`] is never mutated.
//! It is moved by value through each step and is not `Sync`.

use std::cell::Cell;
use std::fmt::{self, Debug, Formatter};
use std::marker::PhantomData;
use std::sync::Arc;

use protomap_wire::{RawField, RawMessage, RawValue};

use crate::error::{MapError, MapResult};
use crate::lens::UpdateOp;
use crate::mapper::Mapper;
use crate::path::KeyPath;
use crate::value::{FieldValue, Value};
use crate::wrapper::WrapperType;

enum Draft {
    /// Snapshot shared with a published value
    Borrowed(RawMessage),
    /// Draft owned by this builder
    Owned(RawMessage),
}

impl Draft {
    fn raw(&self) -> &RawMessage {
        match self {
            Self::Borrowed(raw) | Self::Owned(raw) => raw,
        }
    }

    /// Copy on first write after publish
    fn make_mut(&mut self) -> &mut RawMessage {
        if let Self::Borrowed(raw) = self {
            *self = Self::Owned(raw.clone());
        }
        match self {
            Self::Borrowed(raw) | Self::Owned(raw) => raw,
        }
    }

    fn into_raw(self) -> RawMessage {
        match self {
            Self::Borrowed(raw) | Self::Owned(raw) => raw,
        }
    }
}

/// Exclusively owned builder for one update chain
pub struct Transient {
    mapper: Mapper,
    ty: Arc<WrapperType>,
    draft: Draft,
    _not_sync: PhantomData<Cell<()>>,
}

impl Transient {
    pub(crate) fn new(mapper: Mapper, ty: Arc<WrapperType>, raw: RawMessage) -> Self {
        Self {
            mapper,
            ty,
            draft: Draft::Borrowed(raw),
            _not_sync: PhantomData,
        }
    }

    #[inline]
    #[must_use]
    pub fn schema_name(&self) -> &str {
        self.ty.schema_name()
    }

    #[inline]
    #[must_use]
    pub fn wrapper_type(&self) -> &Arc<WrapperType> {
        &self.ty
    }

    #[inline]
    #[must_use]
    pub fn mapper(&self) -> &Mapper {
        &self.mapper
    }

    /// Whether the draft has been written since the last snapshot
    #[inline]
    #[must_use]
    pub fn is_owned(&self) -> bool {
        matches!(self.draft, Draft::Owned(_))
    }

    /// Read a field of the in-progress draft
    ///
    /// # Errors
    /// Returns [`MapError::NotFound`] for an undeclared key
    pub fn get(&self, key: &str) -> MapResult<FieldValue> {
        let idx = self.ty.index_of(key)?;
        self.ty.read(&self.mapper, self.draft.raw(), idx)
    }

    /// # Errors
    /// Returns [`MapError::NotFound`] for an undeclared key
    pub fn has_field(&self, key: &str) -> MapResult<bool> {
        let idx = self.ty.index_of(key)?;
        Ok(self.ty.has_field(self.draft.raw(), idx))
    }

    /// # Errors
    /// Returns error for an undeclared key or a value that does not fit it
    pub fn assoc(mut self, key: &str, value: impl Into<FieldValue>) -> MapResult<Self> {
        let idx = self.ty.index_of(key)?;
        self.ty.write(&self.mapper, self.draft.make_mut(), idx, value.into())?;
        Ok(self)
    }

    /// # Errors
    /// Returns error if the assoc runs and fails
    pub fn assoc_if(
        self,
        pred: impl FnOnce(&Transient) -> bool,
        key: &str,
        value: impl Into<FieldValue>,
    ) -> MapResult<Self> {
        if pred(&self) {
            self.assoc(key, value)
        } else {
            Ok(self)
        }
    }

    /// Revert `key` to its default in place
    ///
    /// # Errors
    /// Returns [`MapError::NotFound`] for an undeclared key
    pub fn clear_field(mut self, key: &str) -> MapResult<Self> {
        let idx = self.ty.index_of(key)?;
        self.ty.store(self.draft.make_mut(), idx, None);
        Ok(self)
    }

    /// # Errors
    /// Returns error for an undeclared key or if the result does not fit it
    pub fn update(self, key: &str, f: impl FnOnce(FieldValue) -> FieldValue) -> MapResult<Self> {
        let current = self.get(key)?;
        self.assoc(key, f(current))
    }

    /// Set a nested key, creating missing messages on the way
    ///
    /// # Errors
    /// Returns error if a segment is undeclared or not a singular message
    pub fn assoc_in(mut self, path: &KeyPath, value: impl Into<FieldValue>) -> MapResult<Self> {
        assoc_path(&self.mapper, &self.ty, self.draft.make_mut(), path.segments(), value.into())?;
        Ok(self)
    }

    /// # Errors
    /// Returns error if the operation fails
    pub fn apply(self, op: &UpdateOp) -> MapResult<Self> {
        op.apply(self)
    }

    /// Publish the current draft; later writes copy before mutating
    pub fn snapshot(&mut self) -> Value {
        let raw = self.draft.raw().clone();
        self.draft = Draft::Borrowed(raw.clone());
        Value::new(self.mapper.clone(), self.ty.clone(), raw)
    }

    /// Finish the chain
    #[must_use]
    pub fn persist(self) -> Value {
        Value::new(self.mapper, self.ty, self.draft.into_raw())
    }
}

fn assoc_path(
    mapper: &Mapper,
    ty: &Arc<WrapperType>,
    raw: &mut RawMessage,
    path: &[String],
    value: FieldValue,
) -> MapResult<()> {
    match path {
        [] => Err(MapError::violation(ty.schema_name(), "", "empty key path")),
        [key] => {
            let idx = ty.index_of(key)?;
            ty.write(mapper, raw, idx, value)
        }
        [head, rest @ ..] => {
            let idx = ty.index_of(head)?;
            let nested_ty = ty.nested_message_type(mapper, idx)?;
            let tag = ty.accessor(idx).descriptor().tag();
            let mut nested = raw
                .single(tag)
                .and_then(RawValue::as_message)
                .cloned()
                .unwrap_or_default();
            assoc_path(mapper, &nested_ty, &mut nested, rest, value)?;
            ty.store(raw, idx, Some(RawField::Single(RawValue::Message(nested))));
            Ok(())
        }
    }
}

impl Debug for Transient {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transient")
            .field("schema", &self.schema_name())
            .field("owned", &self.is_owned())
            .field("fields", &self.draft.raw().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::define_mapper;
    use crate::options::MapperOptions;
    use protomap_schema::{FieldDescriptor, MessageSchema, ScalarType, SchemaPool};

    fn address() -> Value {
        let pool = SchemaPool::builder()
            .message(MessageSchema::new("Address").with_field(FieldDescriptor::scalar("city", 1, ScalarType::String)))
            .build()
            .unwrap();
        let mapper = define_mapper("addresses", Arc::new(pool), &["Address"], MapperOptions::new()).unwrap();
        mapper.construct("Address", [("city", "Oslo")]).unwrap()
    }

    #[test]
    fn copies_on_first_write() {
        let original = address();
        let transient = original.transient();
        assert!(!transient.is_owned());

        let transient = transient.assoc("city", "Bergen").unwrap();
        assert!(transient.is_owned());
        assert_eq!(original.get("city").unwrap().as_str(), Some("Oslo"));
        assert_eq!(transient.persist().get("city").unwrap().as_str(), Some("Bergen"));
    }

    #[test]
    fn snapshot_is_not_changed_by_later_writes() {
        let mut transient = address().transient().assoc("city", "Bergen").unwrap();
        let snapshot = transient.snapshot();
        assert!(!transient.is_owned());

        let finished = transient.clear_field("city").unwrap().persist();
        assert_eq!(snapshot.get("city").unwrap().as_str(), Some("Bergen"));
        assert_eq!(finished.get("city").unwrap().as_str(), Some(""));
    }

    #[test]
    fn failed_write_leaves_source_untouched() {
        let original = address();
        assert!(original.transient().assoc("city", 3_i32).is_err());
        assert_eq!(original.get("city").unwrap().as_str(), Some("Oslo"));
    }
}
