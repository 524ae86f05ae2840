//! Plain-map conversion
//!
//! [`PlainValue`] is the ordinary recursive key/value form of a message, the
//! shape JSON and YAML documents take. [`to_plain_map`] converts a value
//! recursively, applying an entry transform at every level before
//! descending; [`from_plain_map`] builds a value and rejects anything the
//! schema does not declare.

use indexmap::IndexMap;
use std::sync::Arc;

use protomap_schema::Label;
use protomap_wire::{Bytes, MapKey};

use crate::collections::{ListValue, MapValue};
use crate::error::{MapError, MapResult};
use crate::mapper::Mapper;
use crate::options::EntryXform;
use crate::transient::Transient;
use crate::value::{FieldValue, Value};
use crate::wrapper::{FieldAccessor, WrapperType};

/// Plain recursive value
///
/// Map equality ignores key order.
#[derive(Debug, Clone, PartialEq)]
pub enum PlainValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    List(Vec<PlainValue>),
    Map(IndexMap<String, PlainValue>),
}

impl PlainValue {
    /// Empty map
    #[must_use]
    pub fn map() -> Self {
        Self::Map(IndexMap::new())
    }

    /// Add an entry to a map; no effect on other variants
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PlainValue>) -> Self {
        if let Self::Map(entries) = &mut self {
            entries.insert(key.into(), value.into());
        }
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&PlainValue> {
        match self {
            Self::Map(entries) => entries.get(key),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&IndexMap<String, PlainValue>> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) | Self::UInt(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// JSON form; bytes become lowercase hex, non-finite floats null
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Self::Null => Json::Null,
            Self::Bool(v) => Json::Bool(*v),
            Self::Int(v) => Json::from(*v),
            Self::UInt(v) => Json::from(*v),
            Self::Float(v) => serde_json::Number::from_f64(*v).map_or(Json::Null, Json::Number),
            Self::String(v) => Json::String(v.clone()),
            Self::Bytes(v) => Json::String(hex::encode(v)),
            Self::List(items) => Json::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(entries) => Json::Object(entries.iter().map(|(k, v)| (k.clone(), v.to_json())).collect()),
        }
    }
}

impl From<serde_json::Value> for PlainValue {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match json {
            Json::Null => Self::Null,
            Json::Bool(v) => Self::Bool(v),
            Json::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(v), _) => Self::Int(v),
                (None, Some(v)) => Self::UInt(v),
                _ => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(v) => Self::String(v),
            Json::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Json::Object(entries) => Self::Map(entries.into_iter().map(|(k, v)| (k, Self::from(v))).collect()),
        }
    }
}

macro_rules! plain_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for PlainValue {
            fn from(v: $ty) -> Self {
                Self::$variant(v.into())
            }
        })*
    };
}

plain_from! {
    bool => Bool,
    i32 => Int,
    i64 => Int,
    u32 => Int,
    u64 => UInt,
    f64 => Float,
    &str => String,
    String => String,
    Vec<u8> => Bytes,
    Vec<PlainValue> => List,
}

/// Convert a value to a plain map in schema field order
///
/// `xform` sees every entry of every message level, before nested messages
/// are converted.
///
/// # Errors
/// Returns error if a field cannot be read
pub fn to_plain_map(value: &Value, xform: &EntryXform) -> MapResult<PlainValue> {
    let mut entries = IndexMap::with_capacity(value.len());
    for entry in value.entries()? {
        if let Some((key, field)) = xform.apply(entry) {
            entries.insert(key.to_string(), field_to_plain(field, xform)?);
        }
    }
    Ok(PlainValue::Map(entries))
}

fn field_to_plain(field: FieldValue, xform: &EntryXform) -> MapResult<PlainValue> {
    Ok(match field {
        FieldValue::Null => PlainValue::Null,
        FieldValue::Bool(v) => PlainValue::Bool(v),
        FieldValue::I32(v) => PlainValue::Int(v.into()),
        FieldValue::I64(v) => PlainValue::Int(v),
        FieldValue::U32(v) => PlainValue::Int(v.into()),
        FieldValue::U64(v) => i64::try_from(v).map_or(PlainValue::UInt(v), PlainValue::Int),
        FieldValue::F32(v) => PlainValue::Float(v.into()),
        FieldValue::F64(v) => PlainValue::Float(v),
        FieldValue::String(v) => PlainValue::String(v.to_string()),
        FieldValue::Bytes(v) => PlainValue::Bytes(v.to_vec()),
        FieldValue::Enum(e) => match e.name() {
            Some(name) => PlainValue::String(name.to_string()),
            None => PlainValue::Int(e.number().into()),
        },
        FieldValue::Message(nested) => to_plain_map(&nested, xform)?,
        FieldValue::List(list) => PlainValue::List(
            list.iter()
                .map(|item| item.and_then(|item| field_to_plain(item, xform)))
                .collect::<MapResult<_>>()?,
        ),
        FieldValue::Map(map) => PlainValue::Map(
            map.iter()
                .map(|entry| -> MapResult<(String, PlainValue)> {
                    let (key, item) = entry?;
                    Ok((key.to_string(), field_to_plain(item, xform)?))
                })
                .collect::<MapResult<_>>()?,
        ),
    })
}

/// Build a value of `schema` from a plain map
///
/// Null entries are skipped. Nested maps become nested messages, lists fill
/// repeated fields, map keys are parsed per key type and hex strings are
/// accepted for bytes.
///
/// # Errors
/// Returns [`MapError::SchemaViolation`] for an undeclared key or a value of
/// the wrong shape, or [`MapError::NotLoadedByMapper`] for an unloaded schema
pub fn from_plain_map(mapper: &Mapper, schema: &str, plain: &PlainValue) -> MapResult<Value> {
    let entries = plain
        .as_map()
        .ok_or_else(|| MapError::violation(schema, "", format!("expected map, found {}", plain.kind())))?;
    let ty = mapper.wrapper(schema)?.clone();

    let mut transient = mapper.transient(schema)?;
    for (key, item) in entries {
        if matches!(item, PlainValue::Null) {
            continue;
        }
        let accessor = ty
            .field(key)
            .ok_or_else(|| MapError::violation(schema, key.as_str(), "undeclared key"))?;
        let value = plain_to_field(mapper, &ty, accessor, item)?;
        transient = transient.assoc(key, value)?;
    }
    Ok(Transient::persist(transient))
}

fn plain_to_field(mapper: &Mapper, ty: &WrapperType, accessor: &FieldAccessor, plain: &PlainValue) -> MapResult<FieldValue> {
    let violation = |reason: String| MapError::violation(ty.schema_name(), &**accessor.key(), reason);
    match (accessor.descriptor().label(), plain) {
        (Label::Repeated, PlainValue::List(items)) => {
            let items = items
                .iter()
                .map(|item| element_to_field(mapper, ty, accessor, item))
                .collect::<MapResult<Vec<_>>>()?;
            Ok(FieldValue::List(ListValue::from_values(items)))
        }
        (Label::Map { key: key_type }, PlainValue::Map(entries)) => {
            let entries = entries
                .iter()
                .map(|(key, item)| -> MapResult<(MapKey, FieldValue)> {
                    let key = MapKey::parse(key_type, key)
                        .ok_or_else(|| violation(format!("cannot parse map key '{key}' as {key_type}")))?;
                    Ok((key, element_to_field(mapper, ty, accessor, item)?))
                })
                .collect::<MapResult<Vec<_>>>()?;
            Ok(FieldValue::Map(MapValue::from_entries(entries)))
        }
        (Label::Repeated, other) => Err(violation(format!("expected list, found {}", other.kind()))),
        (Label::Map { .. }, other) => Err(violation(format!("expected map, found {}", other.kind()))),
        (Label::Singular, plain) => element_to_field(mapper, ty, accessor, plain),
    }
}

fn element_to_field(mapper: &Mapper, ty: &WrapperType, accessor: &FieldAccessor, plain: &PlainValue) -> MapResult<FieldValue> {
    use protomap_schema::{FieldType, ScalarType};

    match (accessor.descriptor().field_type(), plain) {
        (FieldType::Message(nested), PlainValue::Map(_)) => {
            Ok(FieldValue::Message(from_plain_map(mapper, nested, plain)?))
        }
        (FieldType::Message(nested), other) if !accessor.has_encoder() => Err(MapError::violation(
            ty.schema_name(),
            &**accessor.key(),
            format!("expected map for message {nested}, found {}", other.kind()),
        )),
        (FieldType::Scalar(ScalarType::Bytes), PlainValue::String(text)) => hex::decode(text)
            .map(|bytes| FieldValue::Bytes(Bytes::from(bytes)))
            .map_err(|e| MapError::violation(ty.schema_name(), &**accessor.key(), format!("invalid hex: {e}"))),
        (_, other) => Ok(generic(other)),
    }
}

/// Schema-free conversion; field writes do the checking
fn generic(plain: &PlainValue) -> FieldValue {
    match plain {
        PlainValue::Null => FieldValue::Null,
        PlainValue::Bool(v) => FieldValue::Bool(*v),
        PlainValue::Int(v) => FieldValue::I64(*v),
        PlainValue::UInt(v) => FieldValue::U64(*v),
        PlainValue::Float(v) => FieldValue::F64(*v),
        PlainValue::String(v) => FieldValue::String(Arc::from(v.as_str())),
        PlainValue::Bytes(v) => FieldValue::Bytes(Bytes::from(v.clone())),
        PlainValue::List(items) => FieldValue::List(ListValue::from_values(items.iter().map(generic))),
        PlainValue::Map(entries) => FieldValue::Map(MapValue::from_entries(
            entries.iter().map(|(k, v)| (k.as_str(), generic(v))),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_conversion() {
        let plain = PlainValue::from(json!({"a": 1, "b": [true, null], "c": 1.5, "d": u64::MAX}));
        let expected = PlainValue::map()
            .with("a", 1_i64)
            .with("b", vec![PlainValue::Bool(true), PlainValue::Null])
            .with("c", 1.5)
            .with("d", u64::MAX);
        assert_eq!(plain, expected);
    }

    #[test]
    fn bytes_render_as_hex() {
        let plain = PlainValue::map().with("avatar", vec![0xde_u8, 0xad]);
        assert_eq!(plain.to_json(), json!({"avatar": "dead"}));
    }

    #[test]
    fn map_equality_ignores_order() {
        let a = PlainValue::map().with("x", 1_i64).with("y", 2_i64);
        let b = PlainValue::map().with("y", 2_i64).with("x", 1_i64);
        assert_eq!(a, b);
    }

    #[test]
    fn non_finite_floats_become_null() {
        assert_eq!(PlainValue::Float(f64::NAN).to_json(), serde_json::Value::Null);
    }
}
