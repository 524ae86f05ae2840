//! Message, field and enum descriptors
//!
//! [`MessageSchema`] is the unit every other part of protomap is keyed on:
//! the resolver walks its message references, the wire codec reads its tags,
//! and the core generates one wrapper type per schema.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use crate::error::SchemaError;
use crate::fingerprint::Fingerprint;

/// Largest field tag allowed on the wire (2^29 - 1)
pub const MAX_TAG: u32 = (1 << 29) - 1;

/// Tags reserved by the protobuf implementation
pub const RESERVED_TAGS: std::ops::RangeInclusive<u32> = 19_000..=19_999;

/// The fifteen protobuf scalar types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
}

impl ScalarType {
    /// Every scalar type, in declaration order
    pub const ALL: [ScalarType; 15] = [
        Self::Double,
        Self::Float,
        Self::Int32,
        Self::Int64,
        Self::Uint32,
        Self::Uint64,
        Self::Sint32,
        Self::Sint64,
        Self::Fixed32,
        Self::Fixed64,
        Self::Sfixed32,
        Self::Sfixed64,
        Self::Bool,
        Self::String,
        Self::Bytes,
    ];

    /// Schema-language name (`int32`, `string`, ...)
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Double => "double",
            Self::Float => "float",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Sint32 => "sint32",
            Self::Sint64 => "sint64",
            Self::Fixed32 => "fixed32",
            Self::Fixed64 => "fixed64",
            Self::Sfixed32 => "sfixed32",
            Self::Sfixed64 => "sfixed64",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Bytes => "bytes",
        }
    }

    /// Parse a schema-language name, `None` for anything else
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.name() == name)
    }

    /// Repeated fields of this type are written packed
    #[inline]
    #[must_use]
    pub const fn is_packable(self) -> bool {
        !matches!(self, Self::String | Self::Bytes)
    }

    /// Whether this type may key a map field
    #[inline]
    #[must_use]
    pub const fn is_valid_map_key(self) -> bool {
        !matches!(self, Self::Double | Self::Float | Self::Bytes)
    }
}

impl Display for ScalarType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScalarType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| SchemaError::InvalidDocument(format!("not a scalar type: {s}")))
    }
}

/// Value type of a field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// Primitive value
    Scalar(ScalarType),
    /// Reference to an enum schema by name
    Enum(Arc<str>),
    /// Reference to a message schema by name
    Message(Arc<str>),
}

impl Display for FieldType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(ty) => write!(f, "{ty}"),
            Self::Enum(name) => write!(f, "enum {name}"),
            Self::Message(name) => write!(f, "message {name}"),
        }
    }
}

/// Cardinality of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Label {
    #[default]
    Singular,
    Repeated,
    /// Map from a scalar key to the field's value type
    Map { key: ScalarType },
}

/// Category a field falls into for access purposes
///
/// One-of membership wins over the value type, then maps and repeated
/// fields, then the value type itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    Scalar,
    Enum,
    Message,
    Repeated,
    Map,
    OneOfMember,
}

impl TypeCategory {
    /// Lowercase name used in diagnostics
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Enum => "enum",
            Self::Message => "message",
            Self::Repeated => "repeated",
            Self::Map => "map",
            Self::OneOfMember => "one-of",
        }
    }
}

impl Display for TypeCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One field of a message schema
///
/// # Example
/// ```
/// use protomap_schema::{FieldDescriptor, ScalarType, TypeCategory};
///
/// let tags = FieldDescriptor::scalar("tags", 4, ScalarType::Int32).map_key(ScalarType::String);
/// assert_eq!(tags.category(), TypeCategory::Map);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldDescriptor {
    name: Arc<str>,
    tag: u32,
    ty: FieldType,
    label: Label,
    one_of: Option<Arc<str>>,
}

impl FieldDescriptor {
    /// Create a descriptor with an explicit type
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>, tag: u32, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            tag,
            ty,
            label: Label::Singular,
            one_of: None,
        }
    }

    /// Singular scalar field
    #[inline]
    #[must_use]
    pub fn scalar(name: impl Into<Arc<str>>, tag: u32, ty: ScalarType) -> Self {
        Self::new(name, tag, FieldType::Scalar(ty))
    }

    /// Singular enum field
    #[inline]
    #[must_use]
    pub fn enumeration(name: impl Into<Arc<str>>, tag: u32, enum_name: impl Into<Arc<str>>) -> Self {
        Self::new(name, tag, FieldType::Enum(enum_name.into()))
    }

    /// Singular message field
    #[inline]
    #[must_use]
    pub fn message(name: impl Into<Arc<str>>, tag: u32, schema: impl Into<Arc<str>>) -> Self {
        Self::new(name, tag, FieldType::Message(schema.into()))
    }

    /// Make the field repeated
    #[inline]
    #[must_use]
    pub fn repeated(mut self) -> Self {
        self.label = Label::Repeated;
        self
    }

    /// Make the field a map keyed by `key`
    #[inline]
    #[must_use]
    pub fn map_key(mut self, key: ScalarType) -> Self {
        self.label = Label::Map { key };
        self
    }

    /// Place the field in a one-of group
    #[inline]
    #[must_use]
    pub fn in_one_of(mut self, group: impl Into<Arc<str>>) -> Self {
        self.one_of = Some(group.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared handle to the field name
    #[inline]
    #[must_use]
    pub fn name_arc(&self) -> &Arc<str> {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn tag(&self) -> u32 {
        self.tag
    }

    #[inline]
    #[must_use]
    pub fn field_type(&self) -> &FieldType {
        &self.ty
    }

    #[inline]
    #[must_use]
    pub fn label(&self) -> Label {
        self.label
    }

    /// One-of group name, if the field belongs to one
    #[inline]
    #[must_use]
    pub fn one_of(&self) -> Option<&Arc<str>> {
        self.one_of.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn is_repeated(&self) -> bool {
        matches!(self.label, Label::Repeated)
    }

    #[inline]
    #[must_use]
    pub fn is_map(&self) -> bool {
        matches!(self.label, Label::Map { .. })
    }

    /// Access category of this field
    #[must_use]
    pub fn category(&self) -> TypeCategory {
        if self.one_of.is_some() {
            return TypeCategory::OneOfMember;
        }
        match (self.label, &self.ty) {
            (Label::Map { .. }, _) => TypeCategory::Map,
            (Label::Repeated, _) => TypeCategory::Repeated,
            (Label::Singular, FieldType::Scalar(_)) => TypeCategory::Scalar,
            (Label::Singular, FieldType::Enum(_)) => TypeCategory::Enum,
            (Label::Singular, FieldType::Message(_)) => TypeCategory::Message,
        }
    }

    /// Referenced message schema, including repeated elements and map values
    #[inline]
    #[must_use]
    pub fn nested_schema(&self) -> Option<&Arc<str>> {
        match &self.ty {
            FieldType::Message(name) => Some(name),
            _ => None,
        }
    }

    /// Referenced enum schema
    #[inline]
    #[must_use]
    pub fn enum_name(&self) -> Option<&Arc<str>> {
        match &self.ty {
            FieldType::Enum(name) => Some(name),
            _ => None,
        }
    }

    /// Whether the wire format tracks presence for this field
    ///
    /// Only singular message fields and one-of members do. Plain scalars,
    /// enums, repeated and map fields never report presence.
    #[inline]
    #[must_use]
    pub fn has_presence(&self) -> bool {
        self.one_of.is_some()
            || (matches!(self.label, Label::Singular) && matches!(self.ty, FieldType::Message(_)))
    }

    fn canonical(&self) -> String {
        let label = match self.label {
            Label::Singular => String::new(),
            Label::Repeated => "repeated ".to_string(),
            Label::Map { key } => format!("map<{key}> "),
        };
        let one_of = self
            .one_of
            .as_deref()
            .map(|g| format!(" oneof {g}"))
            .unwrap_or_default();
        format!("{label}{} {}={}{one_of};", self.ty, self.name, self.tag)
    }
}

/// Descriptor for one message type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSchema {
    name: Arc<str>,
    fields: Vec<FieldDescriptor>,
    by_tag: HashMap<u32, usize>,
    by_name: HashMap<Arc<str>, usize>,
}

impl MessageSchema {
    /// Create an empty schema
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            by_tag: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    /// Append a field; duplicates are kept and rejected by pool validation
    #[must_use]
    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        let idx = self.fields.len();
        self.by_tag.entry(field.tag).or_insert(idx);
        self.by_name.entry(field.name.clone()).or_insert(idx);
        self.fields.push(field);
        self
    }

    /// Fully qualified message name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn name_arc(&self) -> &Arc<str> {
        &self.name
    }

    /// Fields in declaration order
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    #[inline]
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.by_name.get(name).map(|&idx| &self.fields[idx])
    }

    #[inline]
    #[must_use]
    pub fn field_by_tag(&self, tag: u32) -> Option<&FieldDescriptor> {
        self.by_tag.get(&tag).map(|&idx| &self.fields[idx])
    }

    /// One-of group names in order of first appearance
    #[must_use]
    pub fn one_of_groups(&self) -> Vec<&Arc<str>> {
        let mut groups: Vec<&Arc<str>> = Vec::new();
        for group in self.fields.iter().filter_map(FieldDescriptor::one_of) {
            if !groups.contains(&group) {
                groups.push(group);
            }
        }
        groups
    }

    /// Members of a one-of group, in declaration order
    pub fn one_of_members<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a FieldDescriptor> + 'a {
        self.fields
            .iter()
            .filter(move |f| f.one_of().is_some_and(|g| &**g == group))
    }

    /// Canonical textual form, stable across runs
    #[must_use]
    pub fn canonical_text(&self) -> String {
        let body: String = self.fields.iter().map(FieldDescriptor::canonical).collect();
        format!("message {}{{{body}}}", self.name)
    }

    /// Fingerprint of the canonical text
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::compute(self.canonical_text().as_bytes())
    }
}

/// One named enum constant
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumEntry {
    name: Arc<str>,
    number: i32,
}

impl EnumEntry {
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn name_arc(&self) -> &Arc<str> {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn number(&self) -> i32 {
        self.number
    }
}

/// Descriptor for one enum type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumSchema {
    name: Arc<str>,
    values: Vec<EnumEntry>,
}

impl EnumSchema {
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
        }
    }

    /// Append a constant
    #[must_use]
    pub fn with_value(mut self, name: impl Into<Arc<str>>, number: i32) -> Self {
        self.values.push(EnumEntry {
            name: name.into(),
            number,
        });
        self
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn name_arc(&self) -> &Arc<str> {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn values(&self) -> &[EnumEntry] {
        &self.values
    }

    /// First constant with this number (aliases resolve to the first)
    #[must_use]
    pub fn by_number(&self, number: i32) -> Option<&EnumEntry> {
        self.values.iter().find(|v| v.number == number)
    }

    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&EnumEntry> {
        self.values.iter().find(|v| &*v.name == name)
    }

    /// The zero-numbered constant
    #[must_use]
    pub fn default_entry(&self) -> Option<&EnumEntry> {
        self.by_number(0)
    }
}
