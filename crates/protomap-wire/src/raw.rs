//! Persistent raw message representation
//!
//! A [`RawMessage`] is what a codec produces and consumes: a tag-ordered
//! persistent map of field storage plus the bytes of any fields the schema
//! does not declare. Built on `im` collections, so cloning is O(1) and an
//! update copies only the path it touches; a clone taken before an update
//! never observes it.

use im::{OrdMap, Vector};
use prost::bytes::Bytes;
use protomap_schema::ScalarType;
use std::fmt::{self, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Storage for one field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RawField {
    /// Singular value (scalar, enum or message)
    Single(RawValue),
    /// Repeated values in wire order
    List(Vector<RawValue>),
    /// Map entries ordered by key
    Map(OrdMap<MapKey, RawValue>),
}

impl RawField {
    #[inline]
    #[must_use]
    pub fn as_single(&self) -> Option<&RawValue> {
        match self {
            Self::Single(value) => Some(value),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_list(&self) -> Option<&Vector<RawValue>> {
        match self {
            Self::List(values) => Some(values),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_map(&self) -> Option<&OrdMap<MapKey, RawValue>> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }
}

/// One decoded value
///
/// Integer variants follow the Rust type of the declared scalar, so `sint32`
/// and `sfixed32` are both [`RawValue::I32`]. Floats compare and hash by bit
/// pattern, which makes `RawValue` usable as `Eq + Hash`.
#[derive(Debug, Clone)]
pub enum RawValue {
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(Arc<str>),
    Bytes(Bytes),
    /// Enum number, possibly one the enum does not name
    Enum(i32),
    Message(RawMessage),
}

impl RawValue {
    /// Type default for a scalar
    #[must_use]
    pub fn default_for(ty: ScalarType) -> Self {
        match ty {
            ScalarType::Double => Self::F64(0.0),
            ScalarType::Float => Self::F32(0.0),
            ScalarType::Int32 | ScalarType::Sint32 | ScalarType::Sfixed32 => Self::I32(0),
            ScalarType::Int64 | ScalarType::Sint64 | ScalarType::Sfixed64 => Self::I64(0),
            ScalarType::Uint32 | ScalarType::Fixed32 => Self::U32(0),
            ScalarType::Uint64 | ScalarType::Fixed64 => Self::U64(0),
            ScalarType::Bool => Self::Bool(false),
            ScalarType::String => Self::String(Arc::from("")),
            ScalarType::Bytes => Self::Bytes(Bytes::new()),
        }
    }

    /// Whether the value has the variant `ty` is stored as
    #[must_use]
    pub fn matches_scalar(&self, ty: ScalarType) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(&Self::default_for(ty))
    }

    /// Whether this is a scalar or enum type default
    ///
    /// `-0.0` is not a default. Messages never are.
    #[must_use]
    pub fn is_default(&self) -> bool {
        match self {
            Self::Bool(v) => !v,
            Self::I32(v) | Self::Enum(v) => *v == 0,
            Self::I64(v) => *v == 0,
            Self::U32(v) => *v == 0,
            Self::U64(v) => *v == 0,
            Self::F32(v) => v.to_bits() == 0,
            Self::F64(v) => v.to_bits() == 0,
            Self::String(v) => v.is_empty(),
            Self::Bytes(v) => v.is_empty(),
            Self::Message(_) => false,
        }
    }

    /// Variant name used in diagnostics
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
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
        }
    }

    #[inline]
    #[must_use]
    pub fn as_message(&self) -> Option<&RawMessage> {
        match self {
            Self::Message(message) => Some(message),
            _ => None,
        }
    }
}

impl PartialEq for RawValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::I32(a), Self::I32(b)) | (Self::Enum(a), Self::Enum(b)) => a == b,
            (Self::I64(a), Self::I64(b)) => a == b,
            (Self::U32(a), Self::U32(b)) => a == b,
            (Self::U64(a), Self::U64(b)) => a == b,
            (Self::F32(a), Self::F32(b)) => a.to_bits() == b.to_bits(),
            (Self::F64(a), Self::F64(b)) => a.to_bits() == b.to_bits(),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::Message(a), Self::Message(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for RawValue {}

impl Hash for RawValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Bool(v) => v.hash(state),
            Self::I32(v) | Self::Enum(v) => v.hash(state),
            Self::I64(v) => v.hash(state),
            Self::U32(v) => v.hash(state),
            Self::U64(v) => v.hash(state),
            Self::F32(v) => v.to_bits().hash(state),
            Self::F64(v) => v.to_bits().hash(state),
            Self::String(v) => v.hash(state),
            Self::Bytes(v) => v.hash(state),
            Self::Message(v) => v.hash(state),
        }
    }
}

/// Key of a map field
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MapKey {
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    String(Arc<str>),
}

impl MapKey {
    /// Type default for a key type, `None` if `ty` cannot key a map
    #[must_use]
    pub fn default_for(ty: ScalarType) -> Option<Self> {
        Self::from_value(RawValue::default_for(ty))
    }

    /// Convert a decoded scalar into a key
    #[must_use]
    pub fn from_value(value: RawValue) -> Option<Self> {
        match value {
            RawValue::Bool(v) => Some(Self::Bool(v)),
            RawValue::I32(v) => Some(Self::I32(v)),
            RawValue::I64(v) => Some(Self::I64(v)),
            RawValue::U32(v) => Some(Self::U32(v)),
            RawValue::U64(v) => Some(Self::U64(v)),
            RawValue::String(v) => Some(Self::String(v)),
            _ => None,
        }
    }

    /// The key as a scalar value
    #[must_use]
    pub fn to_value(&self) -> RawValue {
        match self {
            Self::Bool(v) => RawValue::Bool(*v),
            Self::I32(v) => RawValue::I32(*v),
            Self::I64(v) => RawValue::I64(*v),
            Self::U32(v) => RawValue::U32(*v),
            Self::U64(v) => RawValue::U64(*v),
            Self::String(v) => RawValue::String(v.clone()),
        }
    }

    /// Parse the textual form of a key of type `ty`
    #[must_use]
    pub fn parse(ty: ScalarType, text: &str) -> Option<Self> {
        match RawValue::default_for(ty) {
            RawValue::Bool(_) => text.parse().ok().map(Self::Bool),
            RawValue::I32(_) => text.parse().ok().map(Self::I32),
            RawValue::I64(_) => text.parse().ok().map(Self::I64),
            RawValue::U32(_) => text.parse().ok().map(Self::U32),
            RawValue::U64(_) => text.parse().ok().map(Self::U64),
            RawValue::String(_) => Some(Self::String(Arc::from(text))),
            _ => None,
        }
    }
}

impl Display for MapKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::U32(v) => write!(f, "{v}"),
            Self::U64(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
        }
    }
}

macro_rules! map_key_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for MapKey {
            fn from(v: $ty) -> Self {
                Self::$variant(v.into())
            }
        })*
    };
}

map_key_from! {
    bool => Bool,
    i32 => I32,
    i64 => I64,
    u32 => U32,
    u64 => U64,
    &str => String,
    String => String,
    Arc<str> => String,
}

/// Tag-ordered field storage plus preserved unknown fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RawMessage {
    fields: OrdMap<u32, RawField>,
    unknown: Bytes,
}

impl RawMessage {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn get(&self, tag: u32) -> Option<&RawField> {
        self.fields.get(&tag)
    }

    /// Whether a value is stored for `tag`
    #[inline]
    #[must_use]
    pub fn contains(&self, tag: u32) -> bool {
        self.fields.contains_key(&tag)
    }

    /// Stored fields in ascending tag order
    pub fn fields(&self) -> impl Iterator<Item = (u32, &RawField)> + '_ {
        self.fields.iter().map(|(tag, field)| (*tag, field))
    }

    /// Number of stored fields (unknown bytes excluded)
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// No stored fields and no unknown bytes
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.unknown.is_empty()
    }

    /// Store a field in place
    pub fn set(&mut self, tag: u32, field: RawField) -> Option<RawField> {
        self.fields.insert(tag, field)
    }

    /// Remove a field in place
    pub fn remove(&mut self, tag: u32) -> Option<RawField> {
        self.fields.remove(&tag)
    }

    /// Persistent variant of [`RawMessage::set`]
    #[must_use]
    pub fn with(&self, tag: u32, field: RawField) -> Self {
        Self {
            fields: self.fields.update(tag, field),
            unknown: self.unknown.clone(),
        }
    }

    /// Persistent variant of [`RawMessage::remove`]
    #[must_use]
    pub fn without(&self, tag: u32) -> Self {
        Self {
            fields: self.fields.without(&tag),
            unknown: self.unknown.clone(),
        }
    }

    #[inline]
    #[must_use]
    pub fn single(&self, tag: u32) -> Option<&RawValue> {
        self.get(tag).and_then(RawField::as_single)
    }

    #[inline]
    #[must_use]
    pub fn list(&self, tag: u32) -> Option<&Vector<RawValue>> {
        self.get(tag).and_then(RawField::as_list)
    }

    #[inline]
    #[must_use]
    pub fn map(&self, tag: u32) -> Option<&OrdMap<MapKey, RawValue>> {
        self.get(tag).and_then(RawField::as_map)
    }

    /// Append one element to a repeated field, replacing non-list storage
    pub fn push(&mut self, tag: u32, value: RawValue) {
        match self.fields.get_mut(&tag) {
            Some(RawField::List(values)) => values.push_back(value),
            _ => {
                self.fields.insert(tag, RawField::List(Vector::unit(value)));
            }
        }
    }

    /// Insert one map entry, replacing non-map storage
    pub fn insert_entry(&mut self, tag: u32, key: MapKey, value: RawValue) {
        match self.fields.get_mut(&tag) {
            Some(RawField::Map(entries)) => {
                entries.insert(key, value);
            }
            _ => {
                self.fields.insert(tag, RawField::Map(OrdMap::unit(key, value)));
            }
        }
    }

    /// Preserved bytes of fields the schema does not declare
    #[inline]
    #[must_use]
    pub fn unknown(&self) -> &Bytes {
        &self.unknown
    }

    pub fn set_unknown(&mut self, bytes: Bytes) {
        self.unknown = bytes;
    }

    /// Same fields without the unknown bytes
    #[must_use]
    pub fn without_unknown(&self) -> Self {
        Self {
            fields: self.fields.clone(),
            unknown: Bytes::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistent_updates_leave_original_untouched() {
        let base = RawMessage::new().with(1, RawField::Single(RawValue::String("Ann".into())));
        let updated = base.with(1, RawField::Single(RawValue::String("Bob".into())));
        let removed = updated.without(1);

        assert_eq!(base.single(1), Some(&RawValue::String("Ann".into())));
        assert_eq!(updated.single(1), Some(&RawValue::String("Bob".into())));
        assert!(removed.is_empty());
        assert!(!base.is_empty());
    }

    #[test]
    fn push_and_insert_entry() {
        let mut msg = RawMessage::new();
        msg.push(3, RawValue::I32(1));
        msg.push(3, RawValue::I32(2));
        msg.insert_entry(4, MapKey::String("a".into()), RawValue::I64(7));
        msg.insert_entry(4, MapKey::String("a".into()), RawValue::I64(8));

        assert_eq!(msg.list(3).map(Vector::len), Some(2));
        assert_eq!(msg.map(4).map(OrdMap::len), Some(1));
        assert_eq!(
            msg.map(4).and_then(|m| m.get(&MapKey::String("a".into()))),
            Some(&RawValue::I64(8))
        );
    }

    #[test]
    fn floats_compare_by_bits() {
        assert_eq!(RawValue::F64(f64::NAN), RawValue::F64(f64::NAN));
        assert_ne!(RawValue::F64(0.0), RawValue::F64(-0.0));
        assert!(RawValue::F64(0.0).is_default());
        assert!(!RawValue::F64(-0.0).is_default());
    }

    #[test]
    fn scalar_defaults_match_their_type() {
        for ty in ScalarType::ALL {
            let value = RawValue::default_for(ty);
            assert!(value.is_default(), "{ty}");
            assert!(value.matches_scalar(ty), "{ty}");
        }
        assert!(!RawValue::I64(0).matches_scalar(ScalarType::Int32));
    }

    #[test]
    fn map_keys_parse_and_display() {
        assert_eq!(MapKey::parse(ScalarType::Sint32, "-4"), Some(MapKey::I32(-4)));
        assert_eq!(MapKey::parse(ScalarType::Bool, "true"), Some(MapKey::Bool(true)));
        assert_eq!(MapKey::parse(ScalarType::Uint64, "x"), None);
        assert_eq!(MapKey::parse(ScalarType::Double, "1"), None);
        assert_eq!(MapKey::U64(9).to_string(), "9");
        assert_eq!(MapKey::default_for(ScalarType::String), Some(MapKey::String("".into())));
    }

    #[test]
    fn unknown_bytes_are_part_of_equality() {
        let mut a = RawMessage::new();
        let b = a.clone();
        a.set_unknown(Bytes::from_static(&[0x08, 0x01]));
        assert_ne!(a, b);
        assert_eq!(a.without_unknown(), b);
    }
}
