//! Mapper registry
//!
//! A [`Mapper`] is the unit of definition and lookup: a named, configured
//! set of wrapper types covering the dependency closure of its root
//! schemas. Definition is all-or-nothing. Every fallible step (option
//! resolution, dependency resolution, key and enum tables) completes before
//! the shared registry is allocated, so a failed definition never leaves a
//! partially built mapper behind.

use indexmap::{IndexMap, IndexSet};
use std::collections::{HashMap, HashSet};
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use protomap_schema::{generation_order, DependencyGraph, FieldType, Fingerprint, SchemaInspector};
use protomap_wire::Codec;

use crate::error::{DefinitionError, MapError, MapResult};
use crate::options::{EntryXform, MapperOptions, ResolvedOptions};
use crate::plain::{self, PlainValue};
use crate::transient::Transient;
use crate::value::{FieldValue, Value};
use crate::wrapper::{EnumTable, FieldTable, TableContext, WrapperType};

pub(crate) struct MapperInner {
    name: Arc<str>,
    inspector: Arc<dyn SchemaInspector>,
    roots: Vec<Arc<str>>,
    types: IndexMap<Arc<str>, Arc<WrapperType>>,
    graph: DependencyGraph,
    options: ResolvedOptions,
    version: Fingerprint,
}

/// Configured registry of generated wrapper types
///
/// Cheap to clone; all clones share one registry. Immutable after
/// definition and safe to share across threads.
#[derive(Clone)]
pub struct Mapper {
    inner: Arc<MapperInner>,
}

/// Define a mapper over the closure of `roots`
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use protomap_core::{define_mapper, MapperOptions};
/// use protomap_schema::{FieldDescriptor, MessageSchema, ScalarType, SchemaPool};
///
/// let pool = SchemaPool::builder()
///     .message(MessageSchema::new("Address").with_field(FieldDescriptor::scalar("city", 1, ScalarType::String)))
///     .build()?;
/// let mapper = define_mapper("addresses", Arc::new(pool), &["Address"], MapperOptions::new())?;
///
/// let address = mapper.construct("Address", [("city", "Oslo")])?;
/// assert_eq!(address.get("city")?.as_str(), Some("Oslo"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
///
/// # Errors
/// Returns [`DefinitionError`] if the name or roots are invalid, a named
/// function does not resolve, or a key or enum table cannot be built
pub fn define_mapper<S: AsRef<str>>(
    name: &str,
    inspector: Arc<dyn SchemaInspector>,
    roots: &[S],
    options: MapperOptions,
) -> Result<Mapper, DefinitionError> {
    let roots: Vec<Arc<str>> = roots.iter().map(|r| Arc::from(r.as_ref())).collect();
    let _span = tracing::info_span!("define_mapper", mapper = name, roots = ?roots).entered();

    if name.is_empty() {
        return Err(DefinitionError::EmptyName);
    }
    if roots.is_empty() {
        return Err(DefinitionError::NoRoots(name.to_string()));
    }
    if let Some(root) = roots.iter().find(|r| inspector.message(r).is_none()) {
        return Err(DefinitionError::NotAMessage(root.to_string()));
    }

    let options = options.resolve()?;
    let order = generation_order(&*inspector, &roots)?;
    let slots: IndexSet<Arc<str>> = order.iter().cloned().collect();

    if let Some(schema) = options.encoders.keys().find(|s| !slots.contains(*s)) {
        return Err(DefinitionError::EncoderForUnknownSchema(schema.to_string()));
    }

    let mut enums: HashMap<Arc<str>, Arc<EnumTable>> = HashMap::new();
    for schema in &order {
        let message = inspector.require_message(schema)?;
        for field in message.fields() {
            if let FieldType::Enum(enum_name) = field.field_type() {
                if enums.contains_key(enum_name) {
                    continue;
                }
                let descriptor = inspector
                    .enumeration(enum_name)
                    .ok_or_else(|| protomap_schema::SchemaError::UnknownEnum(enum_name.to_string()))?;
                enums.insert(enum_name.clone(), Arc::new(EnumTable::build(descriptor, &options.enum_value)?));
            }
        }
    }

    let ctx = TableContext {
        key_name: &options.key_name,
        slots: &slots,
        enums: &enums,
        encoders: &options.encoders,
    };
    let mut tables = Vec::with_capacity(order.len());
    for schema in &order {
        let table = FieldTable::build(inspector.require_message(schema)?, &ctx)?;
        tracing::debug!("Generated wrapper type {} ({} keys)", schema, table.len());
        tables.push(table);
    }

    let graph = DependencyGraph::build(&*inspector, &roots)?;
    for group in graph.recursive_groups() {
        let names: Vec<&str> = group.iter().map(|n| &**n).collect();
        tracing::info!("Recursive schema group: {}", names.join(", "));
    }

    let mut version = Fingerprint::builder();
    version.part(name.as_bytes());
    for table in &tables {
        table.fingerprint_into(&mut version);
    }
    let version = version.finish();

    let inner = Arc::new_cyclic(|weak| MapperInner {
        name: Arc::from(name),
        roots,
        types: tables
            .into_iter()
            .map(|table| {
                let schema = table.schema_name().clone();
                (schema, Arc::new(WrapperType::new(table, weak.clone())))
            })
            .collect(),
        inspector,
        graph,
        options,
        version,
    });
    tracing::info!(
        "Defined mapper {} with {} wrapper types (version {})",
        name,
        inner.types.len(),
        version.short()
    );
    Ok(Mapper { inner })
}

impl Mapper {
    pub(crate) fn from_inner(inner: Arc<MapperInner>) -> Self {
        Self { inner }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    #[inline]
    #[must_use]
    pub fn roots(&self) -> &[Arc<str>] {
        &self.inner.roots
    }

    /// Fingerprint of the name, schemas and generated key tables
    #[inline]
    #[must_use]
    pub fn version(&self) -> Fingerprint {
        self.inner.version
    }

    /// Schema to wrapper type, in generation order
    #[inline]
    #[must_use]
    pub fn types(&self) -> &IndexMap<Arc<str>, Arc<WrapperType>> {
        &self.inner.types
    }

    /// Loaded schema names in generation order
    pub fn schemas(&self) -> impl Iterator<Item = &str> + '_ {
        self.inner.types.keys().map(|k| &**k)
    }

    #[inline]
    #[must_use]
    pub fn is_loaded(&self, schema: &str) -> bool {
        self.inner.types.contains_key(schema)
    }

    #[inline]
    #[must_use]
    pub fn dependency_graph(&self) -> &DependencyGraph {
        &self.inner.graph
    }

    #[inline]
    #[must_use]
    pub fn inspector(&self) -> &dyn SchemaInspector {
        &*self.inner.inspector
    }

    #[inline]
    #[must_use]
    pub fn codec(&self) -> &dyn Codec {
        &*self.inner.options.codec
    }

    #[inline]
    #[must_use]
    pub fn iter_xf(&self) -> &EntryXform {
        &self.inner.options.iter_xf
    }

    /// Whether both handles share one registry
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Mapper) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Wrapper type of a loaded schema
    ///
    /// # Errors
    /// Returns [`MapError::NotLoadedByMapper`] naming the mapper's roots; when
    /// the schema is unknown to the inspector as well, the inspector's error
    /// is attached as source
    pub fn wrapper(&self, schema: &str) -> MapResult<&Arc<WrapperType>> {
        match self.inner.types.get(schema) {
            Some(ty) => Ok(ty),
            None => Err(self.not_loaded(schema)),
        }
    }

    fn not_loaded(&self, schema: &str) -> MapError {
        let (detail, source) = match self.inspector().require_message(schema) {
            Ok(_) => {
                let roots: Vec<&str> = self.roots().iter().map(|r| &**r).collect();
                (format!("not reachable from roots [{}]", roots.join(", ")), None)
            }
            Err(e) => ("unknown to the schema inspector".to_string(), Some(Box::new(MapError::Schema(e)))),
        };
        MapError::NotLoadedByMapper {
            schema: schema.to_string(),
            mapper: self.name().to_string(),
            detail,
            source,
        }
    }

    /// Nested wrapper type by reserved slot, falling back to name lookup
    pub(crate) fn nested_type(&self, schema: &str, slot: usize) -> MapResult<&Arc<WrapperType>> {
        match self.inner.types.get_index(slot) {
            Some((name, ty)) if &**name == schema => Ok(ty),
            _ => self.wrapper(schema),
        }
    }

    /// Whether `other` loads `schema` and every message it reaches with the
    /// same definitions as this mapper
    pub(crate) fn shares_definition(&self, other: &Mapper, schema: &str) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let mut seen: HashSet<&str> = HashSet::new();
        let mut pending = vec![schema];
        while let Some(name) = pending.pop() {
            if !seen.insert(name) {
                continue;
            }
            let (Some(ours), Some(theirs)) = (self.inner.types.get(name), other.inner.types.get(name)) else {
                return false;
            };
            if ours.fingerprint() != theirs.fingerprint() {
                return false;
            }
            pending.extend(ours.descriptor().fields().iter().filter_map(|f| match f.field_type() {
                FieldType::Message(nested) => Some(&**nested),
                _ => None,
            }));
        }
        true
    }

    /// Empty value of `schema`
    ///
    /// # Errors
    /// Returns [`MapError::NotLoadedByMapper`] for a schema outside the mapper
    pub fn empty(&self, schema: &str) -> MapResult<Value> {
        let ty = self.wrapper(schema)?.clone();
        Ok(Value::new(self.clone(), ty, protomap_wire::RawMessage::new()))
    }

    /// Transient over an empty value of `schema`
    ///
    /// # Errors
    /// Returns [`MapError::NotLoadedByMapper`] for a schema outside the mapper
    pub fn transient(&self, schema: &str) -> MapResult<Transient> {
        let ty = self.wrapper(schema)?.clone();
        Ok(Transient::new(self.clone(), ty, protomap_wire::RawMessage::new()))
    }

    /// Value of `schema` with the given entries assigned in order
    ///
    /// # Errors
    /// Returns error for a schema outside the mapper, an undeclared key, or
    /// a value that does not fit its field
    pub fn construct<K, V>(&self, schema: &str, entries: impl IntoIterator<Item = (K, V)>) -> MapResult<Value>
    where
        K: AsRef<str>,
        V: Into<FieldValue>,
    {
        entries
            .into_iter()
            .try_fold(self.transient(schema)?, |t, (key, value)| t.assoc(key.as_ref(), value))
            .map(Transient::persist)
    }

    /// Decode bytes as a value of `schema`
    ///
    /// # Errors
    /// Returns [`MapError::NotLoadedByMapper`] or [`MapError::Codec`]
    pub fn from_bytes(&self, schema: &str, bytes: &[u8]) -> MapResult<Value> {
        let ty = self.wrapper(schema)?.clone();
        let raw = self.codec().decode(bytes, ty.descriptor(), self.inspector())?;
        Ok(Value::new(self.clone(), ty, raw))
    }

    /// Build a value of `schema` from a plain map
    ///
    /// # Errors
    /// Returns [`MapError::SchemaViolation`] for keys or values that do not
    /// fit the schema
    pub fn from_plain_map(&self, schema: &str, map: &PlainValue) -> MapResult<Value> {
        plain::from_plain_map(self, schema, map)
    }

    /// Re-wrap a value's raw message under this mapper
    ///
    /// # Errors
    /// Returns [`MapError::NotLoadedByMapper`] if the schema is not loaded,
    /// or [`MapError::SchemaViolation`] if this mapper defines the schema or
    /// any message it reaches differently
    pub fn remap(&self, value: &Value) -> MapResult<Value> {
        let ty = self.wrapper(value.schema_name())?;
        if !self.shares_definition(value.mapper(), value.schema_name()) {
            return Err(MapError::violation(
                value.schema_name(),
                "",
                format!("schema differs from the one loaded by mapper '{}'", self.name()),
            ));
        }
        Ok(Value::new(self.clone(), ty.clone(), value.raw().clone()))
    }
}

impl Debug for Mapper {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapper")
            .field("name", &self.name())
            .field("roots", &self.inner.roots)
            .field("schemas", &self.schemas().collect::<Vec<_>>())
            .field("codec", &self.codec().name())
            .field("version", &self.version().short())
            .finish()
    }
}
