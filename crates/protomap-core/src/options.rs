//! Mapper options and the transform catalog
//!
//! Every function-valued option is either an inline closure or a name looked
//! up in a [`TransformCatalog`]. Names are resolved once, when the mapper is
//! defined; an unknown name fails the definition.

use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use protomap_wire::{Codec, ProtoCodec};

use crate::error::{DefinitionError, MapError, MapResult};
use crate::naming;
use crate::transient::Transient;
use crate::value::{FieldValue, Value};

/// Renames schema field, group or enum constant names
pub type NameFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// One `(key, value)` entry seen during iteration or plain conversion
pub type Entry = (Arc<str>, FieldValue);

/// Reference to a function-valued option
#[derive(Clone)]
pub enum FnRef<F> {
    /// Looked up in the catalog at definition time
    Named(String),
    /// Used as given
    Inline(F),
}

impl<F> FnRef<F> {
    #[inline]
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }
}

impl<F> Debug for FnRef<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "Named({name:?})"),
            Self::Inline(_) => f.write_str("Inline(..)"),
        }
    }
}

fn resolve_ref<F: Clone>(
    reference: &FnRef<F>,
    kind: &'static str,
    lookup: impl Fn(&str) -> Option<F>,
) -> Result<F, DefinitionError> {
    match reference {
        FnRef::Inline(f) => Ok(f.clone()),
        FnRef::Named(name) => lookup(name).ok_or_else(|| DefinitionError::UnresolvedFunction {
            kind,
            name: name.clone(),
        }),
    }
}

/// Filter/transform over entries
///
/// Returning `None` drops the entry.
#[derive(Clone)]
pub struct EntryXform(Arc<dyn Fn(Entry) -> Option<Entry> + Send + Sync>);

impl EntryXform {
    pub fn new(f: impl Fn(Entry) -> Option<Entry> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    #[must_use]
    pub fn identity() -> Self {
        Self::new(Some)
    }

    /// Drop entries holding their type default (unset messages included)
    #[must_use]
    pub fn elide_defaults() -> Self {
        Self::filter(|_, value| !value.is_default())
    }

    pub fn filter(pred: impl Fn(&str, &FieldValue) -> bool + Send + Sync + 'static) -> Self {
        Self::new(move |(key, value)| pred(&key, &value).then_some((key, value)))
    }

    pub fn map(f: impl Fn(Entry) -> Entry + Send + Sync + 'static) -> Self {
        Self::new(move |entry| Some(f(entry)))
    }

    /// Apply `self`, then `next` to whatever survives
    #[must_use]
    pub fn then(self, next: EntryXform) -> Self {
        Self::new(move |entry| (self.0)(entry).and_then(|entry| (next.0)(entry)))
    }

    #[inline]
    pub fn apply(&self, entry: Entry) -> Option<Entry> {
        (self.0)(entry)
    }
}

impl Debug for EntryXform {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("EntryXform(..)")
    }
}

type FromWire = Arc<dyn Fn(Value) -> MapResult<FieldValue> + Send + Sync>;
type ToWire = Arc<dyn Fn(FieldValue, Transient) -> MapResult<Transient> + Send + Sync>;

/// Custom read/write hooks for fields of one nested schema
///
/// `from_wire` turns the wrapped nested message into the value callers see;
/// `to_wire` fills a fresh transient of the nested schema from a caller value.
#[derive(Clone)]
pub struct Encoder {
    from_wire: FromWire,
    to_wire: ToWire,
}

impl Encoder {
    pub fn new(
        from_wire: impl Fn(Value) -> MapResult<FieldValue> + Send + Sync + 'static,
        to_wire: impl Fn(FieldValue, Transient) -> MapResult<Transient> + Send + Sync + 'static,
    ) -> Self {
        Self {
            from_wire: Arc::new(from_wire),
            to_wire: Arc::new(to_wire),
        }
    }

    /// Wrapper messages with a single `value` field read and write as that field
    #[must_use]
    pub fn unwrap_value() -> Self {
        fn value_key(ty: &crate::wrapper::WrapperType) -> MapResult<Arc<str>> {
            ty.key_of("value")
                .cloned()
                .ok_or_else(|| MapError::encoder(ty.schema_name(), "schema has no 'value' field"))
        }
        Self::new(
            |value| {
                let key = value_key(value.wrapper_type())?;
                value.get(&key)
            },
            |input, transient| {
                let key = value_key(transient.wrapper_type())?;
                transient.assoc(&key, input)
            },
        )
    }

    /// Read hook
    ///
    /// # Errors
    /// Propagates the hook's failure
    pub fn decode(&self, value: Value) -> MapResult<FieldValue> {
        (self.from_wire)(value)
    }

    /// Write hook
    ///
    /// # Errors
    /// Propagates the hook's failure
    pub fn encode(&self, input: FieldValue, transient: Transient) -> MapResult<Transient> {
        (self.to_wire)(input, transient)
    }
}

impl Debug for Encoder {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("Encoder(..)")
    }
}

/// Named functions available to [`FnRef::Named`] and mapper configs
#[derive(Clone, Default)]
pub struct TransformCatalog {
    names: HashMap<String, NameFn>,
    entries: HashMap<String, EntryXform>,
    encoders: HashMap<String, Encoder>,
}

impl TransformCatalog {
    /// Create new empty catalog
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the built-in transforms
    #[must_use]
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        catalog.register_name_fn("identity", naming::identity);
        catalog.register_name_fn("kebab-case", naming::kebab_case);
        catalog.register_name_fn("snake-case", naming::snake_case);
        catalog.register_name_fn("camel-case", naming::camel_case);
        catalog.register_name_fn("lower-kebab-case", naming::lower_kebab_case);
        catalog.register_entry_xform("identity", EntryXform::identity());
        catalog.register_entry_xform("elide-defaults", EntryXform::elide_defaults());
        catalog.register_encoder("unwrap-value", Encoder::unwrap_value());
        catalog
    }

    pub fn register_name_fn(&mut self, name: &str, f: impl Fn(&str) -> String + Send + Sync + 'static) {
        self.names.insert(name.to_string(), Arc::new(f));
    }

    pub fn register_entry_xform(&mut self, name: &str, xform: EntryXform) {
        self.entries.insert(name.to_string(), xform);
    }

    pub fn register_encoder(&mut self, name: &str, encoder: Encoder) {
        self.encoders.insert(name.to_string(), encoder);
    }

    #[must_use]
    pub fn name_fn(&self, name: &str) -> Option<NameFn> {
        self.names.get(name).cloned()
    }

    #[must_use]
    pub fn entry_xform(&self, name: &str) -> Option<EntryXform> {
        self.entries.get(name).cloned()
    }

    #[must_use]
    pub fn encoder(&self, name: &str) -> Option<Encoder> {
        self.encoders.get(name).cloned()
    }

    /// Registered name function names, sorted
    #[must_use]
    pub fn name_fns(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Debug for TransformCatalog {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformCatalog")
            .field("names", &self.name_fns())
            .field("entries", &self.entries.keys().collect::<Vec<_>>())
            .field("encoders", &self.encoders.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Configuration for [`crate::define_mapper`]
///
/// # Example
/// ```
/// use protomap_core::{EntryXform, MapperOptions};
///
/// let options = MapperOptions::new()
///     .with_key_name("kebab-case")
///     .with_iter_xf_fn(EntryXform::elide_defaults())
///     .with_encoder("google.protobuf.StringValue", "unwrap-value");
/// ```
#[derive(Clone, Debug)]
pub struct MapperOptions {
    key_name: FnRef<NameFn>,
    enum_value: FnRef<NameFn>,
    iter_xf: FnRef<EntryXform>,
    encoders: IndexMap<String, FnRef<Encoder>>,
    codec: Arc<dyn Codec>,
    catalog: TransformCatalog,
}

impl Default for MapperOptions {
    fn default() -> Self {
        Self {
            key_name: FnRef::Inline(Arc::new(naming::identity)),
            enum_value: FnRef::Inline(Arc::new(naming::identity)),
            iter_xf: FnRef::Inline(EntryXform::identity()),
            encoders: IndexMap::new(),
            codec: Arc::new(ProtoCodec::new()),
            catalog: TransformCatalog::builtin(),
        }
    }
}

impl MapperOptions {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Key function by catalog name
    #[must_use]
    pub fn with_key_name(mut self, name: impl Into<String>) -> Self {
        self.key_name = FnRef::named(name);
        self
    }

    /// Inline key function
    ///
    /// Keys containing `.` or whitespace cannot be reached through a parsed
    /// [`crate::KeyPath`]; build those paths with [`crate::KeyPath::new`].
    #[must_use]
    pub fn with_key_name_fn(mut self, f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.key_name = FnRef::Inline(Arc::new(f));
        self
    }

    /// Enum constant function by catalog name
    #[must_use]
    pub fn with_enum_value(mut self, name: impl Into<String>) -> Self {
        self.enum_value = FnRef::named(name);
        self
    }

    #[must_use]
    pub fn with_enum_value_fn(mut self, f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.enum_value = FnRef::Inline(Arc::new(f));
        self
    }

    /// Iteration transform by catalog name
    #[must_use]
    pub fn with_iter_xf(mut self, name: impl Into<String>) -> Self {
        self.iter_xf = FnRef::named(name);
        self
    }

    #[must_use]
    pub fn with_iter_xf_fn(mut self, xform: EntryXform) -> Self {
        self.iter_xf = FnRef::Inline(xform);
        self
    }

    /// Encoder for `schema` by catalog name
    #[must_use]
    pub fn with_encoder(mut self, schema: impl Into<String>, name: impl Into<String>) -> Self {
        self.encoders.insert(schema.into(), FnRef::named(name));
        self
    }

    #[must_use]
    pub fn with_encoder_fn(mut self, schema: impl Into<String>, encoder: Encoder) -> Self {
        self.encoders.insert(schema.into(), FnRef::Inline(encoder));
        self
    }

    #[must_use]
    pub fn with_codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = codec;
        self
    }

    /// Catalog named references resolve against
    #[must_use]
    pub fn with_catalog(mut self, catalog: TransformCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &TransformCatalog {
        &self.catalog
    }

    /// Resolve every reference to a callable
    pub(crate) fn resolve(&self) -> Result<ResolvedOptions, DefinitionError> {
        let catalog = &self.catalog;
        let key_name = resolve_ref(&self.key_name, "key-name", |n| catalog.name_fn(n))?;
        let enum_value = resolve_ref(&self.enum_value, "enum-value", |n| catalog.name_fn(n))?;
        let iter_xf = resolve_ref(&self.iter_xf, "iter-xf", |n| catalog.entry_xform(n))?;
        let encoders = self
            .encoders
            .iter()
            .map(|(schema, reference)| {
                resolve_ref(reference, "encoder", |n| catalog.encoder(n)).map(|e| (Arc::from(schema.as_str()), e))
            })
            .collect::<Result<HashMap<Arc<str>, Encoder>, _>>()?;

        Ok(ResolvedOptions {
            key_name,
            enum_value,
            iter_xf,
            encoders,
            codec: self.codec.clone(),
        })
    }
}

/// Options with every reference resolved
#[derive(Clone)]
pub(crate) struct ResolvedOptions {
    pub(crate) key_name: NameFn,
    pub(crate) enum_value: NameFn,
    pub(crate) iter_xf: EntryXform,
    pub(crate) encoders: HashMap<Arc<str>, Encoder>,
    pub(crate) codec: Arc<dyn Codec>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_has_name_fns() {
        let catalog = TransformCatalog::builtin();
        assert_eq!(
            catalog.name_fns(),
            vec!["camel-case", "identity", "kebab-case", "lower-kebab-case", "snake-case"]
        );
        let kebab = catalog.name_fn("kebab-case").unwrap();
        assert_eq!(kebab("first_name"), "first-name");
        assert!(catalog.entry_xform("elide-defaults").is_some());
        assert!(catalog.encoder("unwrap-value").is_some());
        assert!(catalog.name_fn("shout").is_none());
    }

    #[test]
    fn resolves_named_references() {
        let resolved = MapperOptions::new()
            .with_key_name("camel-case")
            .with_enum_value("lower-kebab-case")
            .resolve()
            .unwrap();
        assert_eq!((resolved.key_name)("first_name"), "firstName");
        assert_eq!((resolved.enum_value)("KIND_WORK"), "kind-work");
    }

    #[test]
    fn unknown_name_fails() {
        let result = MapperOptions::new().with_iter_xf("nope").resolve();
        assert!(matches!(
            result,
            Err(DefinitionError::UnresolvedFunction { kind: "iter-xf", name }) if name == "nope"
        ));
    }

    #[test]
    fn custom_catalog_entries_resolve() {
        let mut catalog = TransformCatalog::new();
        catalog.register_name_fn("shout", |s| s.to_uppercase());
        let resolved = MapperOptions::new()
            .with_catalog(catalog)
            .with_key_name("shout")
            .resolve()
            .unwrap();
        assert_eq!((resolved.key_name)("name"), "NAME");
    }

    #[test]
    fn entry_xforms_compose() {
        let drop_secret = EntryXform::filter(|key, _| key != "secret");
        let upper = EntryXform::map(|(key, value)| (Arc::from(key.to_uppercase().as_str()), value));
        let xform = drop_secret.then(upper);

        assert!(xform.apply((Arc::from("secret"), FieldValue::Bool(true))).is_none());
        let (key, _) = xform.apply((Arc::from("name"), FieldValue::Bool(true))).unwrap();
        assert_eq!(&*key, "NAME");

        let elide = EntryXform::elide_defaults();
        assert!(elide.apply((Arc::from("n"), FieldValue::I32(0))).is_none());
        assert!(elide.apply((Arc::from("n"), FieldValue::Null)).is_none());
        assert!(elide.apply((Arc::from("n"), FieldValue::I32(3))).is_some());
    }
}
