//! Mapper configuration files
//!
//! A [`MapperConfig`] names its transforms instead of holding closures, so
//! it can live in TOML or YAML next to the schema documents:
//!
//! ```toml
//! name = "contacts"
//! roots = ["Contact"]
//! key_name = "kebab-case"
//! enum_value = "lower-kebab-case"
//! iter_xf = "elide-defaults"
//!
//! [encoders]
//! "google.protobuf.StringValue" = "unwrap-value"
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use protomap_schema::SchemaInspector;

use crate::error::{DefinitionError, MapResult};
use crate::mapper::{define_mapper, Mapper};
use crate::options::{MapperOptions, TransformCatalog};

/// Errors raised while loading a mapper config
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid TOML
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid YAML
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Reading the file failed
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Create IO error
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn identity_name() -> String {
    "identity".to_string()
}

/// Serializable mapper definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MapperConfig {
    pub name: String,
    pub roots: Vec<String>,
    #[serde(default = "identity_name")]
    pub key_name: String,
    #[serde(default = "identity_name")]
    pub enum_value: String,
    #[serde(default = "identity_name")]
    pub iter_xf: String,
    /// Schema name to encoder name
    #[serde(default)]
    pub encoders: IndexMap<String, String>,
}

impl MapperConfig {
    /// Config with identity transforms
    #[must_use]
    pub fn new(name: impl Into<String>, roots: Vec<String>) -> Self {
        Self {
            name: name.into(),
            roots,
            key_name: identity_name(),
            enum_value: identity_name(),
            iter_xf: identity_name(),
            encoders: IndexMap::new(),
        }
    }

    /// Parse from TOML string
    ///
    /// # Errors
    /// Returns error if TOML is invalid or has unknown fields
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml)?)
    }

    /// Parse from YAML string
    ///
    /// # Errors
    /// Returns error if YAML is invalid or has unknown fields
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a file; `.yaml` and `.yml` are YAML, anything else TOML
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::io_error(path, e))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml_str(&text),
            _ => Self::from_toml_str(&text),
        }
    }

    /// Options referring to every transform by name
    #[must_use]
    pub fn to_options(&self, catalog: TransformCatalog) -> MapperOptions {
        self.encoders.iter().fold(
            MapperOptions::new()
                .with_catalog(catalog)
                .with_key_name(&self.key_name)
                .with_enum_value(&self.enum_value)
                .with_iter_xf(&self.iter_xf),
            |options, (schema, encoder)| options.with_encoder(schema, encoder),
        )
    }
}

impl Mapper {
    /// Define a mapper from a config, resolving names in the built-in catalog
    ///
    /// # Errors
    /// Returns [`DefinitionError`] under the same conditions as [`define_mapper`]
    pub fn from_config(inspector: Arc<dyn SchemaInspector>, config: &MapperConfig) -> Result<Mapper, DefinitionError> {
        Self::from_config_with_catalog(inspector, config, TransformCatalog::builtin())
    }

    /// Define a mapper from a config, resolving names in `catalog`
    ///
    /// # Errors
    /// Returns [`DefinitionError`] under the same conditions as [`define_mapper`]
    pub fn from_config_with_catalog(
        inspector: Arc<dyn SchemaInspector>,
        config: &MapperConfig,
        catalog: TransformCatalog,
    ) -> Result<Mapper, DefinitionError> {
        define_mapper(&config.name, inspector, &config.roots, config.to_options(catalog))
    }

    /// Load a config file and define the mapper it describes
    ///
    /// # Errors
    /// Returns [`crate::MapError::Config`] if the file cannot be loaded, or
    /// [`crate::MapError::Definition`] if the definition fails
    pub fn from_config_path(inspector: Arc<dyn SchemaInspector>, path: impl AsRef<Path>) -> MapResult<Mapper> {
        let config = MapperConfig::from_path(path)?;
        Ok(Self::from_config(inspector, &config)?)
    }
}
