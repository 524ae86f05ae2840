//! Lazy list and map views for repeated and map fields
//!
//! Reading a repeated or map field never converts its elements up front. The
//! view keeps the persistent wire storage and converts one element per
//! access, wrapping nested messages only when they are reached. Views built
//! by callers hold [`FieldValue`]s directly.

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use protomap_schema::{FieldDescriptor, FieldType};
use protomap_wire::{MapKey, OrdMap, RawValue, Vector};

use crate::error::MapResult;
use crate::mapper::Mapper;
use crate::value::FieldValue;
use crate::wrapper::WrapperType;

/// Where wire elements of a view came from
#[derive(Clone)]
pub(crate) struct ElementCtx {
    mapper: Mapper,
    owner: Arc<WrapperType>,
    field: usize,
}

impl ElementCtx {
    pub(crate) fn new(mapper: Mapper, owner: Arc<WrapperType>, field: usize) -> Self {
        Self { mapper, owner, field }
    }

    fn decode(&self, raw: &RawValue) -> MapResult<FieldValue> {
        self.owner.element(&self.mapper, self.field, raw)
    }

    fn descriptor(&self) -> &FieldDescriptor {
        self.owner.accessor(self.field).descriptor()
    }

    /// Same element storage as `target`
    fn stores_like(&self, target: &FieldDescriptor) -> bool {
        let source = self.descriptor();
        source.field_type() == target.field_type() && source.label() == target.label()
    }

    /// Storage can move as is into `target` under `mapper`
    fn reusable_for(&self, mapper: &Mapper, target: &FieldDescriptor) -> bool {
        self.stores_like(target)
            && match target.field_type() {
                FieldType::Message(schema) => mapper.shares_definition(&self.mapper, schema),
                _ => true,
            }
    }
}

#[derive(Clone)]
enum ListRepr {
    Wire { items: Vector<RawValue>, ctx: ElementCtx },
    Built(Vector<FieldValue>),
}

/// Value of a repeated field
#[derive(Clone)]
pub struct ListValue(ListRepr);

impl ListValue {
    pub(crate) fn wire(items: Vector<RawValue>, ctx: ElementCtx) -> Self {
        Self(ListRepr::Wire { items, ctx })
    }

    pub fn from_values<V: Into<FieldValue>>(values: impl IntoIterator<Item = V>) -> Self {
        Self(ListRepr::Built(values.into_iter().map(Into::into).collect()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match &self.0 {
            ListRepr::Wire { items, .. } => items.len(),
            ListRepr::Built(values) => values.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at `index`, converted on access
    ///
    /// # Errors
    /// Returns error if a nested message cannot be wrapped or its encoder fails
    pub fn get(&self, index: usize) -> MapResult<Option<FieldValue>> {
        match &self.0 {
            ListRepr::Wire { items, ctx } => items.get(index).map(|raw| ctx.decode(raw)).transpose(),
            ListRepr::Built(values) => Ok(values.get(index).cloned()),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = MapResult<FieldValue>> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i).transpose())
    }

    /// Convert every element
    ///
    /// # Errors
    /// Returns the first element conversion error
    pub fn to_vec(&self) -> MapResult<Vec<FieldValue>> {
        self.iter().collect()
    }

    pub(crate) fn wire_items_for(&self, mapper: &Mapper, target: &FieldDescriptor) -> Option<&Vector<RawValue>> {
        match &self.0 {
            ListRepr::Wire { items, ctx } if ctx.reusable_for(mapper, target) => Some(items),
            _ => None,
        }
    }
}

impl From<Vec<FieldValue>> for ListValue {
    fn from(values: Vec<FieldValue>) -> Self {
        Self::from_values(values)
    }
}

impl PartialEq for ListValue {
    fn eq(&self, other: &Self) -> bool {
        if let (ListRepr::Wire { items: a, ctx: ca }, ListRepr::Wire { items: b, ctx: cb }) = (&self.0, &other.0) {
            if ca.stores_like(cb.descriptor()) {
                return a == b;
            }
        }
        match (self.to_vec(), other.to_vec()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

impl Debug for ListValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for item in self.iter() {
            match item {
                Ok(value) => list.entry(&value),
                Err(err) => list.entry(&format_args!("<{err}>")),
            };
        }
        list.finish()
    }
}

#[derive(Clone)]
enum MapRepr {
    Wire {
        entries: OrdMap<MapKey, RawValue>,
        ctx: ElementCtx,
    },
    Built(OrdMap<MapKey, FieldValue>),
}

/// Value of a map field, ordered by key
#[derive(Clone)]
pub struct MapValue(MapRepr);

impl MapValue {
    pub(crate) fn wire(entries: OrdMap<MapKey, RawValue>, ctx: ElementCtx) -> Self {
        Self(MapRepr::Wire { entries, ctx })
    }

    pub fn from_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<MapKey>,
        V: Into<FieldValue>,
    {
        Self(MapRepr::Built(
            entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        ))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match &self.0 {
            MapRepr::Wire { entries, .. } => entries.len(),
            MapRepr::Built(entries) => entries.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value under `key`, converted on access
    ///
    /// # Errors
    /// Returns error if a nested message cannot be wrapped or its encoder fails
    pub fn get(&self, key: &MapKey) -> MapResult<Option<FieldValue>> {
        match &self.0 {
            MapRepr::Wire { entries, ctx } => entries.get(key).map(|raw| ctx.decode(raw)).transpose(),
            MapRepr::Built(entries) => Ok(entries.get(key).cloned()),
        }
    }

    #[must_use]
    pub fn contains_key(&self, key: &MapKey) -> bool {
        match &self.0 {
            MapRepr::Wire { entries, .. } => entries.contains_key(key),
            MapRepr::Built(entries) => entries.contains_key(key),
        }
    }

    /// Keys in ascending order
    #[must_use]
    pub fn keys(&self) -> Vec<MapKey> {
        match &self.0 {
            MapRepr::Wire { entries, .. } => entries.keys().cloned().collect(),
            MapRepr::Built(entries) => entries.keys().cloned().collect(),
        }
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = MapResult<(MapKey, FieldValue)>> + '_> {
        match &self.0 {
            MapRepr::Wire { entries, ctx } => Box::new(
                entries
                    .iter()
                    .map(move |(key, raw)| ctx.decode(raw).map(|value| (key.clone(), value))),
            ),
            MapRepr::Built(entries) => {
                Box::new(entries.iter().map(|(key, value)| Ok((key.clone(), value.clone()))))
            }
        }
    }

    /// Convert every entry
    ///
    /// # Errors
    /// Returns the first value conversion error
    pub fn to_vec(&self) -> MapResult<Vec<(MapKey, FieldValue)>> {
        self.iter().collect()
    }

    pub(crate) fn wire_entries_for(&self, mapper: &Mapper, target: &FieldDescriptor) -> Option<&OrdMap<MapKey, RawValue>> {
        match &self.0 {
            MapRepr::Wire { entries, ctx } if ctx.reusable_for(mapper, target) => Some(entries),
            _ => None,
        }
    }
}

impl PartialEq for MapValue {
    fn eq(&self, other: &Self) -> bool {
        if let (MapRepr::Wire { entries: a, ctx: ca }, MapRepr::Wire { entries: b, ctx: cb }) = (&self.0, &other.0) {
            if ca.stores_like(cb.descriptor()) {
                return a == b;
            }
        }
        match (self.to_vec(), other.to_vec()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

impl Debug for MapValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for entry in self.iter() {
            match entry {
                Ok((key, value)) => map.entry(&format_args!("{key}"), &value),
                Err(err) => map.entry(&"<error>", &format_args!("{err}")),
            };
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_lists_index_and_iterate() {
        let list = ListValue::from_values([1_i32, 2, 3]);
        assert_eq!(list.len(), 3);
        assert_eq!(list.get(1).unwrap(), Some(FieldValue::I32(2)));
        assert_eq!(list.get(3).unwrap(), None);
        assert_eq!(
            list.to_vec().unwrap(),
            vec![FieldValue::I32(1), FieldValue::I32(2), FieldValue::I32(3)]
        );
        assert!(ListValue::from_values(Vec::<FieldValue>::new()).is_empty());
    }

    #[test]
    fn built_maps_order_by_key() {
        let map = MapValue::from_entries([("b", 2_i32), ("a", 1)]);
        assert_eq!(map.keys(), vec![MapKey::from("a"), MapKey::from("b")]);
        assert_eq!(map.get(&MapKey::from("b")).unwrap(), Some(FieldValue::I32(2)));
        assert!(!map.contains_key(&MapKey::from("c")));
        assert_eq!(format!("{map:?}"), r#"{a: I32(1), b: I32(2)}"#);
    }

    #[test]
    fn built_views_compare_by_elements() {
        assert_eq!(ListValue::from_values(["x"]), ListValue::from_values(vec![FieldValue::from("x")]));
        assert_ne!(ListValue::from_values([1_i32]), ListValue::from_values([2_i32]));
    }
}
