//! Subcommand implementations
//!
//! Each command loads the schema document, builds the mapper it needs and
//! returns the text to print, so the binary only parses arguments.

use anyhow::{bail, Context, Result};
use protomap_core::{define_mapper, EntryXform, Mapper, MapperConfig, MapperOptions, PlainValue};
use protomap_schema::{DependencyGraph, Label, SchemaInspector, SchemaPool};
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

/// Options shared by commands that build a mapper
#[derive(Debug, Clone, Default)]
pub(crate) struct MapperArgs<'a> {
    pub(crate) config: Option<&'a Path>,
}

fn load_pool(schema: &Path) -> Result<Arc<SchemaPool>> {
    let pool = SchemaPool::from_path(schema).with_context(|| format!("loading schema {}", schema.display()))?;
    tracing::debug!("loaded {} messages from {}", pool.len(), schema.display());
    Ok(Arc::new(pool))
}

fn build_mapper(schema: &Path, message: &str, args: &MapperArgs<'_>) -> Result<Mapper> {
    let pool = load_pool(schema)?;
    let mapper = match args.config {
        Some(path) => {
            let config = MapperConfig::from_path(path)?;
            Mapper::from_config(pool, &config)?
        }
        None => define_mapper("protomap", pool, &[message], MapperOptions::new())?,
    };
    if !mapper.is_loaded(message) {
        bail!("message {message} is not reachable from the roots of mapper '{}'", mapper.name());
    }
    Ok(mapper)
}

/// Generation order and recursive groups of `message`
pub(crate) fn deps(schema: &Path, message: &str) -> Result<String> {
    let pool = load_pool(schema)?;
    if pool.message(message).is_none() {
        bail!("unknown message {message}");
    }
    let graph = DependencyGraph::build(pool.as_ref(), &[message])?;

    let mut out = String::new();
    writeln!(out, "generation order:")?;
    for name in graph.schemas() {
        let direct = graph.direct_dependencies(name);
        if direct.is_empty() {
            writeln!(out, "  {name}")?;
        } else {
            writeln!(out, "  {name} -> {}", direct.join(", "))?;
        }
    }
    let groups = graph.recursive_groups();
    if !groups.is_empty() {
        writeln!(out, "recursive groups:")?;
        for group in groups {
            let names: Vec<&str> = group.iter().map(|n| &**n).collect();
            writeln!(out, "  {}", names.join(", "))?;
        }
    }
    Ok(out)
}

/// Generated key table of `message`
pub(crate) fn describe(schema: &Path, message: &str, args: &MapperArgs<'_>) -> Result<String> {
    let mapper = build_mapper(schema, message, args)?;
    let ty = mapper.wrapper(message)?;

    let mut out = String::new();
    writeln!(out, "{message} (mapper '{}', version {})", mapper.name(), mapper.version().short())?;
    for accessor in ty.fields() {
        let descriptor = accessor.descriptor();
        let label = match descriptor.label() {
            Label::Singular => String::new(),
            Label::Repeated => "repeated ".to_string(),
            Label::Map { key } => format!("map<{key}> "),
        };
        write!(
            out,
            "  {:<20} {:>4}  {:<10} {label}{}",
            &**accessor.key(),
            descriptor.tag(),
            accessor.category().as_str(),
            descriptor.field_type()
        )?;
        if let Some(group) = accessor.one_of_group() {
            write!(out, " [{group}]")?;
        }
        if accessor.has_encoder() {
            write!(out, " (encoded)")?;
        }
        writeln!(out)?;
    }
    Ok(out)
}

/// Decode a binary message to pretty JSON
pub(crate) fn decode(schema: &Path, message: &str, input: &Path, elide_defaults: bool, args: &MapperArgs<'_>) -> Result<String> {
    let mapper = build_mapper(schema, message, args)?;
    let bytes = std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let value = mapper.from_bytes(message, &bytes)?;
    tracing::info!("decoded {} bytes as {}", bytes.len(), message);

    let xform = if elide_defaults {
        EntryXform::elide_defaults()
    } else {
        EntryXform::identity()
    };
    let plain = value.to_plain_map(&xform)?;
    Ok(serde_json::to_string_pretty(&plain.to_json())?)
}

/// Encode a JSON document as a binary message, returning the byte count
pub(crate) fn encode(schema: &Path, message: &str, input: &Path, output: &Path, args: &MapperArgs<'_>) -> Result<usize> {
    let mapper = build_mapper(schema, message, args)?;
    let text = std::fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))?;
    let json: serde_json::Value = serde_json::from_str(&text).with_context(|| format!("parsing {}", input.display()))?;

    let value = mapper.from_plain_map(message, &PlainValue::from(json))?;
    let bytes = value.to_bytes()?;
    std::fs::write(output, &bytes).with_context(|| format!("writing {}", output.display()))?;
    tracing::info!("encoded {} as {} bytes", message, bytes.len());
    Ok(bytes.len())
}
