//! Nested-type dependency resolution
//!
//! [`resolve`] walks message references depth first and emits each nested
//! schema after its own dependencies (post-order), so a consumer generating
//! types in the returned order always finds leaves first. The seen-set is
//! marked before descending, which is what makes self- and mutually
//! referencing schemas terminate.

use indexmap::IndexSet;
use petgraph::graphmap::DiGraphMap;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::SchemaError;
use crate::pool::SchemaInspector;

/// Schemas already visited during one resolution
pub type SeenSet = IndexSet<Arc<str>>;

/// Resolve the nested message dependencies of `schema`
///
/// Returns the distinct nested schemas not already in `seen`, leaves first,
/// together with the updated seen-set. `schema` itself is not added to the
/// result; seed it into `seen` to keep it out of the output when it is
/// reachable from its own fields.
///
/// # Errors
/// Returns [`SchemaError::UnknownMessage`] if `schema` or any referenced
/// schema is unknown to the inspector
pub fn resolve<I>(
    inspector: &I,
    schema: &str,
    seen: SeenSet,
) -> Result<(Vec<Arc<str>>, SeenSet), SchemaError>
where
    I: SchemaInspector + ?Sized,
{
    let mut seen = seen;
    let mut ordered = Vec::new();
    visit(inspector, schema, &mut seen, &mut ordered)?;
    Ok((ordered, seen))
}

fn visit<I>(
    inspector: &I,
    schema: &str,
    seen: &mut SeenSet,
    ordered: &mut Vec<Arc<str>>,
) -> Result<(), SchemaError>
where
    I: SchemaInspector + ?Sized,
{
    let message = inspector.require_message(schema)?;
    for field in message.fields() {
        let Some(nested) = field.nested_schema() else {
            continue;
        };
        if !seen.insert(nested.clone()) {
            continue;
        }
        visit(inspector, nested, seen, ordered)?;
        ordered.push(nested.clone());
    }
    Ok(())
}

/// All schemas transitively referenced by `schema`, leaves first
///
/// A schema never lists itself, even when it references itself.
///
/// # Errors
/// Returns error if `schema` or a referenced schema is unknown
pub fn dependencies<I>(inspector: &I, schema: &str) -> Result<SeenSet, SchemaError>
where
    I: SchemaInspector + ?Sized,
{
    let root = inspector.require_message(schema)?.name_arc().clone();
    let mut seen = SeenSet::new();
    seen.insert(root);
    let (ordered, _) = resolve(inspector, schema, seen)?;
    Ok(ordered.into_iter().collect())
}

/// Whether `a` transitively references `b`
///
/// # Errors
/// Returns error if `a` or a schema it references is unknown
pub fn depends_on<I>(inspector: &I, a: &str, b: &str) -> Result<bool, SchemaError>
where
    I: SchemaInspector + ?Sized,
{
    Ok(dependencies(inspector, a)?.contains(b))
}

/// Order in which wrapper types for `roots` must be generated
///
/// The union of every root's closure, deduplicated, with each root placed
/// after its own dependencies.
///
/// # Errors
/// Returns error if any root or referenced schema is unknown
pub fn generation_order<I, S>(inspector: &I, roots: &[S]) -> Result<Vec<Arc<str>>, SchemaError>
where
    I: SchemaInspector + ?Sized,
    S: AsRef<str>,
{
    let mut seen = SeenSet::new();
    let mut order = Vec::new();
    for root in roots {
        let root = inspector.require_message(root.as_ref())?.name_arc().clone();
        if !seen.insert(root.clone()) {
            continue;
        }
        let (deps, updated) = resolve(inspector, &root, std::mem::take(&mut seen))?;
        seen = updated;
        order.extend(deps);
        order.push(root);
    }
    Ok(order)
}

/// Materialized reference graph over a closure of schemas
///
/// Edges point from a schema to the schemas its fields reference.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    names: Vec<Arc<str>>,
    index: HashMap<Arc<str>, usize>,
    graph: DiGraphMap<usize, ()>,
}

impl DependencyGraph {
    /// Build the graph for the closure of `roots`
    ///
    /// # Errors
    /// Returns error if any root or referenced schema is unknown
    pub fn build<I, S>(inspector: &I, roots: &[S]) -> Result<Self, SchemaError>
    where
        I: SchemaInspector + ?Sized,
        S: AsRef<str>,
    {
        let names = generation_order(inspector, roots)?;
        let index: HashMap<Arc<str>, usize> = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();

        let mut graph = DiGraphMap::new();
        for (from, name) in names.iter().enumerate() {
            graph.add_node(from);
            let message = inspector.require_message(name)?;
            for nested in message.fields().iter().filter_map(|f| f.nested_schema()) {
                if let Some(&to) = index.get(nested) {
                    graph.add_edge(from, to, ());
                }
            }
        }

        Ok(Self { names, index, graph })
    }

    /// Schemas in generation order
    #[inline]
    #[must_use]
    pub fn schemas(&self) -> &[Arc<str>] {
        &self.names
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Reference edges as `(from, to)` name pairs
    #[must_use]
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.graph
            .all_edges()
            .map(|(from, to, ())| (&*self.names[from], &*self.names[to]))
            .collect()
    }

    /// Schemas directly referenced by `name`
    #[must_use]
    pub fn direct_dependencies(&self, name: &str) -> Vec<&str> {
        self.index
            .get(name)
            .map(|&i| self.graph.neighbors(i).map(|n| &*self.names[n]).collect())
            .unwrap_or_default()
    }

    /// Whether `name` can reach itself through its fields
    #[must_use]
    pub fn is_recursive(&self, name: &str) -> bool {
        let Some(&i) = self.index.get(name) else {
            return false;
        };
        self.graph.contains_edge(i, i)
            || petgraph::algo::tarjan_scc(&self.graph)
                .iter()
                .any(|scc| scc.len() > 1 && scc.contains(&i))
    }

    /// Groups of mutually (or self-) referencing schemas
    #[must_use]
    pub fn recursive_groups(&self) -> Vec<Vec<Arc<str>>> {
        petgraph::algo::tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || self.graph.contains_edge(scc[0], scc[0]))
            .map(|mut scc| {
                scc.sort_unstable();
                scc.into_iter().map(|i| self.names[i].clone()).collect()
            })
            .collect()
    }
}
