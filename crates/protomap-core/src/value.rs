//! Immutable map-like values
//!
//! A [`Value`] wraps one raw message under the wrapper type its mapper
//! generated for the schema. Reads convert on demand; every update returns
//! a new `Value` and leaves the original untouched, sharing whatever the
//! update did not touch.

use std::fmt::{self, Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use protomap_wire::{Bytes, RawMessage, RawValue};

use crate::collections::{ListValue, MapValue};
use crate::error::{MapError, MapResult};
use crate::mapper::Mapper;
use crate::options::{Entry, EntryXform};
use crate::path::KeyPath;
use crate::plain::{self, PlainValue};
use crate::transient::Transient;
use crate::wrapper::WrapperType;

/// Enum constant read from or written to a field
///
/// `name` is the constant's name under the mapper's enum-value function, or
/// `None` for a number the enum does not declare.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    name: Option<Arc<str>>,
    number: i32,
}

impl EnumValue {
    #[inline]
    #[must_use]
    pub fn new(name: Option<Arc<str>>, number: i32) -> Self {
        Self { name, number }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn number(&self) -> i32 {
        self.number
    }
}

/// Dynamic value of one field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Unset message, or a request to clear a field with presence
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(Arc<str>),
    Bytes(Bytes),
    Enum(EnumValue),
    Message(Value),
    List(ListValue),
    Map(MapValue),
}

impl FieldValue {
    pub(crate) fn from_raw_scalar(raw: RawValue) -> Self {
        match raw {
            RawValue::Bool(v) => Self::Bool(v),
            RawValue::I32(v) => Self::I32(v),
            RawValue::I64(v) => Self::I64(v),
            RawValue::U32(v) => Self::U32(v),
            RawValue::U64(v) => Self::U64(v),
            RawValue::F32(v) => Self::F32(v),
            RawValue::F64(v) => Self::F64(v),
            RawValue::String(v) => Self::String(v),
            RawValue::Bytes(v) => Self::Bytes(v),
            RawValue::Enum(number) => Self::Enum(EnumValue::new(None, number)),
            RawValue::Message(_) => Self::Null,
        }
    }

    /// Whether this equals its type default
    ///
    /// Null, zero numbers (but not `-0.0`), `false`, empty strings, bytes,
    /// lists and maps, and enum number zero are defaults. Messages are not.
    #[must_use]
    pub fn is_default(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(v) => !v,
            Self::I32(v) => *v == 0,
            Self::I64(v) => *v == 0,
            Self::U32(v) => *v == 0,
            Self::U64(v) => *v == 0,
            Self::F32(v) => v.to_bits() == 0,
            Self::F64(v) => v.to_bits() == 0,
            Self::String(v) => v.is_empty(),
            Self::Bytes(v) => v.is_empty(),
            Self::Enum(v) => v.number == 0,
            Self::Message(_) => false,
            Self::List(v) => v.is_empty(),
            Self::Map(v) => v.is_empty(),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Variant name used in diagnostics
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::U32(_) => "u32",
            Self::U64(_) => "u64",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Enum(_) => "enum",
            Self::Message(_) => "message",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Any integer variant that fits in `i64`
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::I32(v) => Some(i64::from(*v)),
            Self::I64(v) => Some(*v),
            Self::U32(v) => Some(i64::from(*v)),
            Self::U64(v) => i64::try_from(*v).ok(),
            Self::Enum(v) => Some(i64::from(v.number)),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::F32(v) => Some(f64::from(*v)),
            Self::F64(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Bytes(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Self::Enum(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_message(&self) -> Option<&Value> {
        match self {
            Self::Message(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&ListValue> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&MapValue> {
        match self {
            Self::Map(v) => Some(v),
            _ => None,
        }
    }
}

macro_rules! field_value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for FieldValue {
            fn from(v: $ty) -> Self {
                Self::$variant(v.into())
            }
        })*
    };
}

field_value_from! {
    bool => Bool,
    i32 => I32,
    i64 => I64,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    &str => String,
    String => String,
    Arc<str> => String,
    Bytes => Bytes,
    Vec<u8> => Bytes,
    EnumValue => Enum,
    Value => Message,
    ListValue => List,
    MapValue => Map,
    Vec<FieldValue> => List,
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Immutable map-like wrapper around one message
///
/// Equality and hashing cover the schema name and the raw message; the
/// mapper a value was read through is not part of its identity.
#[derive(Clone)]
pub struct Value {
    mapper: Mapper,
    ty: Arc<WrapperType>,
    raw: RawMessage,
}

impl Value {
    pub(crate) fn new(mapper: Mapper, ty: Arc<WrapperType>, raw: RawMessage) -> Self {
        Self { mapper, ty, raw }
    }

    #[inline]
    #[must_use]
    pub fn schema_name(&self) -> &str {
        self.ty.schema_name()
    }

    #[inline]
    #[must_use]
    pub fn mapper(&self) -> &Mapper {
        &self.mapper
    }

    #[inline]
    #[must_use]
    pub fn wrapper_type(&self) -> &Arc<WrapperType> {
        &self.ty
    }

    #[inline]
    #[must_use]
    pub fn raw(&self) -> &RawMessage {
        &self.raw
    }

    #[inline]
    #[must_use]
    pub fn into_raw(self) -> RawMessage {
        self.raw
    }

    /// Read a field; unset fields read as their default
    ///
    /// # Errors
    /// Returns [`MapError::NotFound`] for an undeclared key
    pub fn get(&self, key: &str) -> MapResult<FieldValue> {
        let idx = self.ty.index_of(key)?;
        self.ty.read(&self.mapper, &self.raw, idx)
    }

    /// Read through nested messages; an unset message on the way reads as null
    ///
    /// # Errors
    /// Returns error for an undeclared key or a path through a non-message field
    pub fn get_in(&self, path: &KeyPath) -> MapResult<FieldValue> {
        let mut current = FieldValue::Message(self.clone());
        for key in path.iter() {
            current = match current {
                FieldValue::Message(value) => value.get(key)?,
                FieldValue::Null => return Ok(FieldValue::Null),
                other => {
                    return Err(MapError::violation(
                        self.schema_name(),
                        path.to_string(),
                        format!("cannot descend into {}", other.kind()),
                    ))
                }
            };
        }
        Ok(current)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.ty.field(key).is_some()
    }

    /// Number of declared keys
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ty.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ty.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.ty.keys().map(|k| &**k)
    }

    /// Every declared entry in schema order, unfiltered
    ///
    /// # Errors
    /// Returns error if a field cannot be read
    pub fn entries(&self) -> MapResult<Vec<Entry>> {
        self.ty
            .keys()
            .enumerate()
            .map(|(idx, key)| Ok((key.clone(), self.ty.read(&self.mapper, &self.raw, idx)?)))
            .collect()
    }

    /// Entries through the mapper's iteration transform
    ///
    /// # Errors
    /// Returns error if a field cannot be read
    #[allow(clippy::iter_not_returning_iterator)]
    pub fn iter(&self) -> MapResult<std::vec::IntoIter<Entry>> {
        let xform = self.mapper.iter_xf();
        Ok(self
            .entries()?
            .into_iter()
            .filter_map(|entry| xform.apply(entry))
            .collect::<Vec<_>>()
            .into_iter())
    }

    /// Whether a message or one-of field is set
    ///
    /// Always false for plain scalar, enum, repeated and map keys.
    ///
    /// # Errors
    /// Returns [`MapError::NotFound`] for an undeclared key
    pub fn has_field(&self, key: &str) -> MapResult<bool> {
        let idx = self.ty.index_of(key)?;
        Ok(self.ty.has_field(&self.raw, idx))
    }

    /// Key of the set member of a one-of group
    ///
    /// # Errors
    /// Returns [`MapError::NotFound`] for an undeclared group
    pub fn which_one_of(&self, group: &str) -> MapResult<Option<Arc<str>>> {
        Ok(self
            .ty
            .which_one_of(&self.raw, group)?
            .map(|idx| self.ty.accessor(idx).key().clone()))
    }

    /// Key and value of the set member of a one-of group
    ///
    /// # Errors
    /// Returns [`MapError::NotFound`] for an undeclared group
    pub fn one_of(&self, group: &str) -> MapResult<Option<Entry>> {
        match self.ty.which_one_of(&self.raw, group)? {
            Some(idx) => {
                let key = self.ty.accessor(idx).key().clone();
                Ok(Some((key, self.ty.read(&self.mapper, &self.raw, idx)?)))
            }
            None => Ok(None),
        }
    }

    /// New value with `key` set
    ///
    /// # Errors
    /// Returns error for an undeclared key or a value that does not fit it
    pub fn assoc(&self, key: &str, value: impl Into<FieldValue>) -> MapResult<Value> {
        Ok(self.transient().assoc(key, value)?.persist())
    }

    /// [`Value::assoc`] if `pred` holds, otherwise a clone
    ///
    /// # Errors
    /// Returns error if the assoc runs and fails
    pub fn assoc_if(
        &self,
        pred: impl FnOnce(&Value) -> bool,
        key: &str,
        value: impl Into<FieldValue>,
    ) -> MapResult<Value> {
        if pred(self) {
            self.assoc(key, value)
        } else {
            Ok(self.clone())
        }
    }

    /// New value with `key` reverted to its default
    ///
    /// # Errors
    /// Returns [`MapError::NotFound`] for an undeclared key
    pub fn dissoc(&self, key: &str) -> MapResult<Value> {
        Ok(self.transient().clear_field(key)?.persist())
    }

    /// Alias of [`Value::dissoc`]
    ///
    /// # Errors
    /// Returns [`MapError::NotFound`] for an undeclared key
    pub fn clear_field(&self, key: &str) -> MapResult<Value> {
        self.dissoc(key)
    }

    /// New value with `f` applied to the current value of `key`
    ///
    /// # Errors
    /// Returns error for an undeclared key or if the result does not fit it
    pub fn update(&self, key: &str, f: impl FnOnce(FieldValue) -> FieldValue) -> MapResult<Value> {
        Ok(self.transient().update(key, f)?.persist())
    }

    /// New value with a nested key set, creating missing messages on the way
    ///
    /// # Errors
    /// Returns error if a segment is undeclared or not a singular message
    pub fn assoc_in(&self, path: &KeyPath, value: impl Into<FieldValue>) -> MapResult<Value> {
        Ok(self.transient().assoc_in(path, value)?.persist())
    }

    /// Start an update chain from this value
    #[must_use]
    pub fn transient(&self) -> Transient {
        Transient::new(self.mapper.clone(), self.ty.clone(), self.raw.clone())
    }

    /// Encode with the mapper's codec
    ///
    /// # Errors
    /// Returns [`MapError::Codec`] if encoding fails
    pub fn to_bytes(&self) -> MapResult<Vec<u8>> {
        let bytes = self
            .mapper
            .codec()
            .encode(&self.raw, self.ty.descriptor(), self.mapper.inspector())?;
        Ok(bytes)
    }

    /// Convert to a plain map, applying `xform` at every level
    ///
    /// # Errors
    /// Returns error if a field cannot be read
    pub fn to_plain_map(&self, xform: &EntryXform) -> MapResult<PlainValue> {
        plain::to_plain_map(self, xform)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.schema_name() == other.schema_name() && self.raw == other.raw
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.schema_name().hash(state);
        self.raw.hash(state);
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.schema_name())?;
        match self.iter() {
            Ok(entries) => f
                .debug_map()
                .entries(entries.map(|(key, value)| (format!("{key}"), value)))
                .finish(),
            Err(err) => write!(f, "<{err}>"),
        }
    }
}
