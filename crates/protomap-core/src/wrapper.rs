//! Generated wrapper types
//!
//! A [`WrapperType`] is built once per schema when a mapper is defined. It
//! owns a field table keyed by transformed access key in which every entry
//! carries its resolved element kind: the scalar type, the renamed enum
//! constants, or the slot of the nested wrapper type in the owning mapper
//! plus any encoder registered for that schema. All reads and writes of a
//! [`Value`] or [`Transient`] go through this table.
//!
//! Construction is two-phase. [`FieldTable::build`] does every fallible step;
//! the infallible [`WrapperType::new`] then attaches the weak back-reference
//! to the mapper while the mapper itself is being allocated.

use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::sync::{Arc, Weak};

use protomap_schema::{
    EnumSchema, FieldDescriptor, FieldType, Fingerprint, FingerprintBuilder, Label, MessageSchema,
    ScalarType, SchemaError, TypeCategory,
};
use protomap_wire::{MapKey, OrdMap, RawField, RawMessage, RawValue, Vector};

use crate::coerce;
use crate::collections::{ElementCtx, ListValue, MapValue};
use crate::error::{DefinitionError, MapError, MapResult};
use crate::mapper::{Mapper, MapperInner};
use crate::options::{Encoder, NameFn};
use crate::transient::Transient;
use crate::value::{EnumValue, FieldValue, Value};

/// Enum constants under the mapper's enum-value function
#[derive(Debug)]
pub(crate) struct EnumTable {
    name: Arc<str>,
    entries: Vec<(Arc<str>, i32)>,
    names: HashMap<i32, Arc<str>>,
    numbers: HashMap<Arc<str>, i32>,
}

impl EnumTable {
    pub(crate) fn build(schema: &EnumSchema, rename: &NameFn) -> Result<Self, DefinitionError> {
        let mut table = Self {
            name: schema.name_arc().clone(),
            entries: Vec::with_capacity(schema.values().len()),
            names: HashMap::new(),
            numbers: HashMap::new(),
        };
        for entry in schema.values() {
            let name: Arc<str> = Arc::from(rename(entry.name()));
            if table.numbers.insert(name.clone(), entry.number()).is_some() {
                return Err(DefinitionError::DuplicateEnumName {
                    schema: schema.name().to_string(),
                    name: name.to_string(),
                });
            }
            table.names.entry(entry.number()).or_insert_with(|| name.clone());
            table.entries.push((name, entry.number()));
        }
        Ok(table)
    }

    /// Value for a number; numbers the enum does not name keep no name
    pub(crate) fn value(&self, number: i32) -> EnumValue {
        EnumValue::new(self.names.get(&number).cloned(), number)
    }

    pub(crate) fn number(&self, name: &str) -> Option<i32> {
        self.numbers.get(name).copied()
    }

    fn fingerprint_into(&self, builder: &mut FingerprintBuilder) {
        builder.part(self.name.as_bytes());
        for (name, number) in &self.entries {
            builder.part(name.as_bytes()).part(&number.to_le_bytes());
        }
    }
}

/// What one element of a field holds
#[derive(Clone)]
pub(crate) enum ElementKind {
    Scalar(ScalarType),
    Enum(Arc<EnumTable>),
    Message {
        schema: Arc<str>,
        slot: usize,
        encoder: Option<Encoder>,
    },
}

/// One entry of a wrapper type's field table
#[derive(Clone)]
pub struct FieldAccessor {
    key: Arc<str>,
    descriptor: FieldDescriptor,
    element: ElementKind,
    group: Option<Arc<str>>,
}

impl FieldAccessor {
    /// Access key (the transformed field name)
    #[inline]
    #[must_use]
    pub fn key(&self) -> &Arc<str> {
        &self.key
    }

    #[inline]
    #[must_use]
    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }

    #[inline]
    #[must_use]
    pub fn category(&self) -> TypeCategory {
        self.descriptor.category()
    }

    /// Transformed one-of group key, if the field is a member
    #[inline]
    #[must_use]
    pub fn one_of_group(&self) -> Option<&Arc<str>> {
        self.group.as_ref()
    }

    /// Whether an encoder rewrites this field's nested messages
    #[must_use]
    pub fn has_encoder(&self) -> bool {
        matches!(&self.element, ElementKind::Message { encoder: Some(_), .. })
    }

    fn default_value(&self) -> FieldValue {
        match &self.element {
            ElementKind::Scalar(ty) => FieldValue::from_raw_scalar(RawValue::default_for(*ty)),
            ElementKind::Enum(table) => FieldValue::Enum(table.value(0)),
            ElementKind::Message { .. } => FieldValue::Null,
        }
    }
}

impl Debug for FieldAccessor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldAccessor")
            .field("key", &self.key)
            .field("field", &self.descriptor.name())
            .field("tag", &self.descriptor.tag())
            .field("category", &self.category())
            .finish()
    }
}

/// Shared lookups needed while building field tables
pub(crate) struct TableContext<'a> {
    pub(crate) key_name: &'a NameFn,
    pub(crate) slots: &'a IndexSet<Arc<str>>,
    pub(crate) enums: &'a HashMap<Arc<str>, Arc<EnumTable>>,
    pub(crate) encoders: &'a HashMap<Arc<str>, Encoder>,
}

/// Everything a wrapper type knows except its mapper
pub(crate) struct FieldTable {
    schema: MessageSchema,
    fingerprint: Fingerprint,
    fields: Vec<FieldAccessor>,
    by_key: HashMap<Arc<str>, usize>,
    by_tag: HashMap<u32, usize>,
    groups: IndexMap<Arc<str>, Vec<usize>>,
}

impl FieldTable {
    pub(crate) fn build(schema: &MessageSchema, ctx: &TableContext<'_>) -> Result<Self, DefinitionError> {
        let mut table = Self {
            schema: schema.clone(),
            fingerprint: schema.fingerprint(),
            fields: Vec::with_capacity(schema.fields().len()),
            by_key: HashMap::new(),
            by_tag: HashMap::new(),
            groups: IndexMap::new(),
        };
        let mut group_names: HashMap<Arc<str>, Arc<str>> = HashMap::new();

        for descriptor in schema.fields() {
            let key = table.key_for(descriptor.name(), ctx.key_name)?;
            let idx = table.fields.len();
            if table.by_key.insert(key.clone(), idx).is_some() {
                return Err(DefinitionError::DuplicateKey {
                    schema: schema.name().to_string(),
                    key: key.to_string(),
                });
            }
            table.by_tag.insert(descriptor.tag(), idx);

            let group = match descriptor.one_of() {
                Some(name) => {
                    let group = table.key_for(name, ctx.key_name)?;
                    match group_names.get(&group) {
                        Some(existing) if existing != name => {
                            return Err(DefinitionError::DuplicateKey {
                                schema: schema.name().to_string(),
                                key: group.to_string(),
                            });
                        }
                        Some(_) => {}
                        None => {
                            group_names.insert(group.clone(), name.clone());
                        }
                    }
                    table.groups.entry(group.clone()).or_default().push(idx);
                    Some(group)
                }
                None => None,
            };

            let element = match descriptor.field_type() {
                FieldType::Scalar(ty) => ElementKind::Scalar(*ty),
                FieldType::Enum(name) => ElementKind::Enum(
                    ctx.enums
                        .get(name)
                        .cloned()
                        .ok_or_else(|| SchemaError::UnknownEnum(name.to_string()))?,
                ),
                FieldType::Message(name) => ElementKind::Message {
                    schema: name.clone(),
                    slot: ctx
                        .slots
                        .get_index_of(name)
                        .ok_or_else(|| SchemaError::UnknownMessage(name.to_string()))?,
                    encoder: ctx.encoders.get(name).cloned(),
                },
            };

            table.fields.push(FieldAccessor {
                key,
                descriptor: descriptor.clone(),
                element,
                group,
            });
        }
        Ok(table)
    }

    fn key_for(&self, name: &str, key_name: &NameFn) -> Result<Arc<str>, DefinitionError> {
        let key = key_name(name);
        if key.is_empty() {
            return Err(DefinitionError::EmptyKey {
                schema: self.schema.name().to_string(),
                field: name.to_string(),
            });
        }
        Ok(Arc::from(key))
    }

    #[inline]
    pub(crate) fn schema_name(&self) -> &Arc<str> {
        self.schema.name_arc()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.fields.len()
    }

    /// Feed the schema fingerprint and the generated key tables
    pub(crate) fn fingerprint_into(&self, builder: &mut FingerprintBuilder) {
        builder.part(self.fingerprint.as_bytes());
        for accessor in &self.fields {
            builder.part(accessor.key.as_bytes());
            if let ElementKind::Enum(table) = &accessor.element {
                table.fingerprint_into(builder);
            }
        }
        for group in self.groups.keys() {
            builder.part(group.as_bytes());
        }
    }
}

/// Generated access type for one message schema
pub struct WrapperType {
    table: FieldTable,
    mapper: Weak<MapperInner>,
}

impl WrapperType {
    pub(crate) fn new(table: FieldTable, mapper: Weak<MapperInner>) -> Self {
        Self { table, mapper }
    }

    #[inline]
    #[must_use]
    pub fn schema_name(&self) -> &str {
        self.table.schema.name()
    }

    #[inline]
    #[must_use]
    pub fn descriptor(&self) -> &MessageSchema {
        &self.table.schema
    }

    #[inline]
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        self.table.fingerprint
    }

    /// Number of declared keys
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.fields.is_empty()
    }

    /// Keys in schema field order
    pub fn keys(&self) -> impl Iterator<Item = &Arc<str>> + '_ {
        self.table.fields.iter().map(|f| &f.key)
    }

    #[inline]
    #[must_use]
    pub fn fields(&self) -> &[FieldAccessor] {
        &self.table.fields
    }

    #[must_use]
    pub fn field(&self, key: &str) -> Option<&FieldAccessor> {
        self.table.by_key.get(key).map(|&idx| &self.table.fields[idx])
    }

    /// Access key of a schema field name
    #[must_use]
    pub fn key_of(&self, field_name: &str) -> Option<&Arc<str>> {
        let descriptor = self.table.schema.field(field_name)?;
        let idx = self.table.by_tag.get(&descriptor.tag())?;
        Some(&self.table.fields[*idx].key)
    }

    /// Transformed one-of group keys in declaration order
    pub fn one_of_groups(&self) -> impl Iterator<Item = &Arc<str>> + '_ {
        self.table.groups.keys()
    }

    #[must_use]
    pub fn one_of_members(&self, group: &str) -> Option<Vec<&FieldAccessor>> {
        self.table
            .groups
            .get(group)
            .map(|members| members.iter().map(|&idx| &self.table.fields[idx]).collect())
    }

    /// The mapper that generated this type, while it is alive
    #[must_use]
    pub fn mapper(&self) -> Option<Mapper> {
        self.mapper.upgrade().map(Mapper::from_inner)
    }

    pub(crate) fn schema_name_arc(&self) -> &Arc<str> {
        self.table.schema_name()
    }

    pub(crate) fn index_of(&self, key: &str) -> MapResult<usize> {
        self.table
            .by_key
            .get(key)
            .copied()
            .ok_or_else(|| MapError::not_found(self.schema_name(), key))
    }

    pub(crate) fn accessor(&self, idx: usize) -> &FieldAccessor {
        &self.table.fields[idx]
    }

    fn violation(&self, accessor: &FieldAccessor, reason: impl Into<String>) -> MapError {
        MapError::violation(self.schema_name(), &*accessor.key, reason)
    }

    fn storage_mismatch(&self, accessor: &FieldAccessor) -> MapError {
        self.violation(accessor, "stored value does not match the field type")
    }

    /// Read field `idx` of `raw`, applying defaults for unset fields
    pub(crate) fn read(self: &Arc<Self>, mapper: &Mapper, raw: &RawMessage, idx: usize) -> MapResult<FieldValue> {
        let accessor = self.accessor(idx);
        let tag = accessor.descriptor.tag();
        match accessor.descriptor.label() {
            Label::Repeated => {
                let items = match raw.get(tag) {
                    None => Vector::new(),
                    Some(RawField::List(items)) => items.clone(),
                    Some(_) => return Err(self.storage_mismatch(accessor)),
                };
                let ctx = ElementCtx::new(mapper.clone(), self.clone(), idx);
                Ok(FieldValue::List(ListValue::wire(items, ctx)))
            }
            Label::Map { .. } => {
                let entries = match raw.get(tag) {
                    None => OrdMap::new(),
                    Some(RawField::Map(entries)) => entries.clone(),
                    Some(_) => return Err(self.storage_mismatch(accessor)),
                };
                let ctx = ElementCtx::new(mapper.clone(), self.clone(), idx);
                Ok(FieldValue::Map(MapValue::wire(entries, ctx)))
            }
            Label::Singular => match raw.get(tag) {
                None => Ok(accessor.default_value()),
                Some(RawField::Single(value)) => self.element(mapper, idx, value),
                Some(_) => Err(self.storage_mismatch(accessor)),
            },
        }
    }

    /// Convert one stored element of field `idx`
    pub(crate) fn element(&self, mapper: &Mapper, idx: usize, raw: &RawValue) -> MapResult<FieldValue> {
        let accessor = self.accessor(idx);
        match (&accessor.element, raw) {
            (ElementKind::Enum(table), RawValue::Enum(number)) => Ok(FieldValue::Enum(table.value(*number))),
            (ElementKind::Message { schema, slot, encoder }, RawValue::Message(message)) => {
                let ty = mapper.nested_type(schema, *slot)?.clone();
                let value = Value::new(mapper.clone(), ty, message.clone());
                match encoder {
                    Some(encoder) => encoder.decode(value),
                    None => Ok(FieldValue::Message(value)),
                }
            }
            (ElementKind::Scalar(ty), value) if value.matches_scalar(*ty) => {
                Ok(FieldValue::from_raw_scalar(value.clone()))
            }
            _ => Err(self.storage_mismatch(accessor)),
        }
    }

    /// Write `value` to field `idx` of `raw`
    ///
    /// Null clears a field with presence. A default scalar or enum outside
    /// a one-of group clears the field, as do empty lists and maps.
    pub(crate) fn write(&self, mapper: &Mapper, raw: &mut RawMessage, idx: usize, value: FieldValue) -> MapResult<()> {
        let accessor = self.accessor(idx);
        let field = match (accessor.descriptor.label(), value) {
            (_, FieldValue::Null) if accessor.descriptor.has_presence() => None,
            (_, FieldValue::Null) => {
                return Err(self.violation(accessor, "null is only allowed for fields with presence"));
            }
            (Label::Repeated, FieldValue::List(list)) => self.list_storage(mapper, accessor, &list)?,
            (Label::Map { key }, FieldValue::Map(map)) => self.map_storage(mapper, accessor, key, &map)?,
            (Label::Repeated, other) => {
                return Err(self.violation(accessor, format!("expected list, found {}", other.kind())));
            }
            (Label::Map { .. }, other) => {
                return Err(self.violation(accessor, format!("expected map, found {}", other.kind())));
            }
            (Label::Singular, value) => {
                let stored = self.to_raw(mapper, accessor, value)?;
                if accessor.group.is_none() && stored.is_default() {
                    None
                } else {
                    Some(RawField::Single(stored))
                }
            }
        };
        self.store(raw, idx, field);
        Ok(())
    }

    /// Set or remove raw storage, clearing one-of siblings on set
    pub(crate) fn store(&self, raw: &mut RawMessage, idx: usize, field: Option<RawField>) {
        let accessor = self.accessor(idx);
        let tag = accessor.descriptor.tag();
        match field {
            Some(field) => {
                let siblings = accessor.group.as_ref().and_then(|g| self.table.groups.get(g));
                for &sibling in siblings.into_iter().flatten().filter(|&&i| i != idx) {
                    raw.remove(self.accessor(sibling).descriptor.tag());
                }
                raw.set(tag, field);
            }
            None => {
                raw.remove(tag);
            }
        }
    }

    fn to_raw(&self, mapper: &Mapper, accessor: &FieldAccessor, value: FieldValue) -> MapResult<RawValue> {
        match &accessor.element {
            ElementKind::Scalar(ty) => coerce::scalar(&value, *ty).map_err(|reason| self.violation(accessor, reason)),
            ElementKind::Enum(table) => match &value {
                FieldValue::Enum(e) => Ok(RawValue::Enum(e.number())),
                FieldValue::String(name) => table.number(name).map(RawValue::Enum).ok_or_else(|| {
                    self.violation(accessor, format!("unknown {} constant '{name}'", table.name))
                }),
                other => coerce::enum_number(other)
                    .map(RawValue::Enum)
                    .map_err(|reason| self.violation(accessor, reason)),
            },
            ElementKind::Message { schema, slot, encoder } => match value {
                FieldValue::Message(nested) if nested.schema_name() == &**schema => {
                    if !mapper.shares_definition(nested.mapper(), schema) {
                        return Err(self.violation(
                            accessor,
                            format!(
                                "message {schema} from mapper '{}' differs from the one loaded by mapper '{}'",
                                nested.mapper().name(),
                                mapper.name()
                            ),
                        ));
                    }
                    Ok(RawValue::Message(nested.into_raw()))
                }
                other => match encoder {
                    Some(encoder) => {
                        let ty = mapper.nested_type(schema, *slot)?.clone();
                        let encoded = encoder.encode(other, Transient::new(mapper.clone(), ty, RawMessage::new()))?;
                        if encoded.schema_name() != &**schema {
                            return Err(MapError::encoder(
                                &**schema,
                                format!("encoder produced a {} message", encoded.schema_name()),
                            ));
                        }
                        Ok(RawValue::Message(encoded.persist().into_raw()))
                    }
                    None => Err(self.violation(
                        accessor,
                        format!("expected message {schema}, found {}", other.kind()),
                    )),
                },
            },
        }
    }

    fn element_to_raw(&self, mapper: &Mapper, accessor: &FieldAccessor, item: FieldValue) -> MapResult<RawValue> {
        if item.is_null() {
            return Err(self.violation(accessor, "null element"));
        }
        self.to_raw(mapper, accessor, item)
    }

    fn list_storage(&self, mapper: &Mapper, accessor: &FieldAccessor, list: &ListValue) -> MapResult<Option<RawField>> {
        if list.is_empty() {
            return Ok(None);
        }
        if let Some(items) = list.wire_items_for(mapper, &accessor.descriptor) {
            return Ok(Some(RawField::List(items.clone())));
        }
        let items = list
            .iter()
            .map(|item| item.and_then(|item| self.element_to_raw(mapper, accessor, item)))
            .collect::<MapResult<Vector<RawValue>>>()?;
        Ok(Some(RawField::List(items)))
    }

    fn map_storage(
        &self,
        mapper: &Mapper,
        accessor: &FieldAccessor,
        key_type: ScalarType,
        map: &MapValue,
    ) -> MapResult<Option<RawField>> {
        if map.is_empty() {
            return Ok(None);
        }
        if let Some(entries) = map.wire_entries_for(mapper, &accessor.descriptor) {
            return Ok(Some(RawField::Map(entries.clone())));
        }
        let entries = map
            .iter()
            .map(|entry| -> MapResult<(MapKey, RawValue)> {
                let (key, item) = entry?;
                let key = coerce::map_key(&key, key_type).map_err(|reason| self.violation(accessor, reason))?;
                Ok((key, self.element_to_raw(mapper, accessor, item)?))
            })
            .collect::<MapResult<OrdMap<_, _>>>()?;
        Ok(Some(RawField::Map(entries)))
    }

    /// Wrapper type of a singular message field, for path updates
    pub(crate) fn nested_message_type(&self, mapper: &Mapper, idx: usize) -> MapResult<Arc<WrapperType>> {
        let accessor = self.accessor(idx);
        match (&accessor.element, accessor.descriptor.label()) {
            (ElementKind::Message { schema, slot, .. }, Label::Singular) => {
                Ok(mapper.nested_type(schema, *slot)?.clone())
            }
            _ => Err(self.violation(accessor, "not a singular message field")),
        }
    }

    /// Presence bit of a field; only message and one-of fields have one
    pub(crate) fn has_field(&self, raw: &RawMessage, idx: usize) -> bool {
        let descriptor = &self.accessor(idx).descriptor;
        descriptor.has_presence() && raw.contains(descriptor.tag())
    }

    /// Index of the set member of a one-of group
    pub(crate) fn which_one_of(&self, raw: &RawMessage, group: &str) -> MapResult<Option<usize>> {
        let members = self
            .table
            .groups
            .get(group)
            .ok_or_else(|| MapError::not_found(self.schema_name(), group))?;
        Ok(members
            .iter()
            .copied()
            .find(|&idx| raw.contains(self.accessor(idx).descriptor.tag())))
    }
}

impl Debug for WrapperType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrapperType")
            .field("schema", &self.schema_name())
            .field("keys", &self.keys().collect::<Vec<_>>())
            .field("one_ofs", &self.one_of_groups().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming;
    use protomap_schema::{FieldDescriptor, MessageSchema};

    fn context<'a>(
        key_name: &'a NameFn,
        slots: &'a IndexSet<Arc<str>>,
        enums: &'a HashMap<Arc<str>, Arc<EnumTable>>,
        encoders: &'a HashMap<Arc<str>, Encoder>,
    ) -> TableContext<'a> {
        TableContext {
            key_name,
            slots,
            enums,
            encoders,
        }
    }

    fn contact() -> MessageSchema {
        MessageSchema::new("Contact")
            .with_field(FieldDescriptor::scalar("first_name", 1, ScalarType::String))
            .with_field(FieldDescriptor::scalar("handle", 2, ScalarType::String).in_one_of("reach_by"))
            .with_field(FieldDescriptor::message("home_address", 3, "Address").in_one_of("reach_by"))
    }

    #[test]
    fn builds_keys_and_groups() {
        let key_name: NameFn = Arc::new(naming::kebab_case);
        let slots: IndexSet<Arc<str>> = [Arc::from("Address")].into_iter().collect();
        let (enums, encoders) = (HashMap::new(), HashMap::new());
        let table = FieldTable::build(&contact(), &context(&key_name, &slots, &enums, &encoders)).unwrap();

        let ty = WrapperType::new(table, Weak::new());
        assert_eq!(
            ty.keys().map(|k| &**k).collect::<Vec<_>>(),
            vec!["first-name", "handle", "home-address"]
        );
        assert_eq!(ty.key_of("home_address").map(|k| &**k), Some("home-address"));
        assert_eq!(ty.one_of_groups().map(|g| &**g).collect::<Vec<_>>(), vec!["reach-by"]);
        assert_eq!(ty.one_of_members("reach-by").map(|m| m.len()), Some(2));
        assert_eq!(ty.field("handle").map(FieldAccessor::category), Some(TypeCategory::OneOfMember));
        assert!(ty.mapper().is_none());
    }

    #[test]
    fn rejects_colliding_keys() {
        let key_name: NameFn = Arc::new(|_: &str| "same".to_string());
        let slots: IndexSet<Arc<str>> = [Arc::from("Address")].into_iter().collect();
        let (enums, encoders) = (HashMap::new(), HashMap::new());
        let err = FieldTable::build(&contact(), &context(&key_name, &slots, &enums, &encoders)).err();
        assert!(matches!(err, Some(DefinitionError::DuplicateKey { key, .. }) if key == "same"));
    }

    #[test]
    fn rejects_empty_keys() {
        let key_name: NameFn = Arc::new(|name: &str| if name == "handle" { String::new() } else { name.to_string() });
        let slots: IndexSet<Arc<str>> = [Arc::from("Address")].into_iter().collect();
        let (enums, encoders) = (HashMap::new(), HashMap::new());
        let err = FieldTable::build(&contact(), &context(&key_name, &slots, &enums, &encoders)).err();
        assert!(matches!(err, Some(DefinitionError::EmptyKey { field, .. }) if field == "handle"));
    }

    #[test]
    fn enum_table_renames_and_keeps_first_alias() {
        let schema = EnumSchema::new("Kind")
            .with_value("KIND_UNSPECIFIED", 0)
            .with_value("KIND_WORK", 1)
            .with_value("KIND_JOB", 1);
        let rename: NameFn = Arc::new(naming::lower_kebab_case);
        let table = EnumTable::build(&schema, &rename).unwrap();

        assert_eq!(table.value(1).name(), Some("kind-work"));
        assert_eq!(table.number("kind-job"), Some(1));
        assert_eq!(table.value(9).name(), None);
    }

    #[test]
    fn enum_table_rejects_renamed_duplicates() {
        let schema = EnumSchema::new("Kind").with_value("A", 0).with_value("a", 1);
        let rename: NameFn = Arc::new(|n: &str| n.to_lowercase());
        let err = EnumTable::build(&schema, &rename).unwrap_err();
        assert!(matches!(err, DefinitionError::DuplicateEnumName { name, .. } if name == "a"));
    }
}
