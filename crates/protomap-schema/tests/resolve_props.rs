use protomap_schema::{
    dependencies, generation_order, DependencyGraph, FieldDescriptor, MessageSchema, ScalarType,
    SchemaPool,
};
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};

fn name(i: usize) -> String {
    format!("M{i}")
}

/// Pool of `count` messages where `edges` become message-typed fields
fn pool_from_edges(count: usize, edges: &[(usize, usize)]) -> SchemaPool {
    let mut adjacency: HashMap<usize, Vec<usize>> = HashMap::new();
    for &(from, to) in edges {
        if from < count && to < count {
            adjacency.entry(from).or_default().push(to);
        }
    }

    let mut builder = SchemaPool::builder();
    for i in 0..count {
        let mut schema = MessageSchema::new(name(i)).with_field(FieldDescriptor::scalar("id", 1, ScalarType::Int64));
        for (n, to) in adjacency.get(&i).into_iter().flatten().enumerate() {
            let field = FieldDescriptor::message(format!("ref_{n}"), n as u32 + 2, name(*to));
            let field = if n % 2 == 0 { field } else { field.repeated() };
            schema = schema.with_field(field);
        }
        builder = builder.message(schema);
    }
    builder.build().unwrap()
}

/// Plain breadth-first reachability, excluding the start node
fn reachable(count: usize, edges: &[(usize, usize)], start: usize) -> BTreeSet<String> {
    let mut seen = BTreeSet::new();
    let mut stack = vec![start];
    let mut visited = vec![false; count];
    while let Some(node) = stack.pop() {
        for &(from, to) in edges {
            if from == node && from < count && to < count && !visited[to] {
                visited[to] = true;
                stack.push(to);
            }
        }
    }
    for (i, hit) in visited.into_iter().enumerate() {
        if hit && i != start {
            seen.insert(name(i));
        }
    }
    seen
}

proptest! {
    #[test]
    fn prop_dependencies_match_reachability(
        count in 1..12usize,
        edges in proptest::collection::vec((0..12usize, 0..12usize), 0..40),
        root in 0..12usize,
    ) {
        let root = root % count;
        let pool = pool_from_edges(count, &edges);

        let deps = dependencies(&pool, &name(root)).unwrap();
        let as_set: BTreeSet<String> = deps.iter().map(|s| s.to_string()).collect();

        // no duplicates, never the root itself
        prop_assert_eq!(as_set.len(), deps.len());
        prop_assert!(!deps.contains(name(root).as_str()));
        prop_assert_eq!(as_set, reachable(count, &edges, root));
    }

    #[test]
    fn prop_generation_order_is_leaves_first_outside_cycles(
        count in 1..12usize,
        edges in proptest::collection::vec((0..12usize, 0..12usize), 0..40),
    ) {
        let pool = pool_from_edges(count, &edges);
        let roots: Vec<String> = (0..count).map(name).collect();
        let order = generation_order(&pool, &roots).unwrap();
        let graph = DependencyGraph::build(&pool, &roots).unwrap();

        prop_assert_eq!(order.len(), count);
        let position: HashMap<&str, usize> =
            order.iter().enumerate().map(|(i, s)| (&**s, i)).collect();

        for (from, to) in graph.edges() {
            let mutually_recursive = graph
                .recursive_groups()
                .iter()
                .any(|g| g.iter().any(|s| &**s == from) && g.iter().any(|s| &**s == to));
            if !mutually_recursive {
                prop_assert!(position[to] < position[from], "{} must precede {}", to, from);
            }
        }
    }
}

#[test]
fn test_repeated_references_collapse() {
    let pool = pool_from_edges(3, &[(0, 1), (0, 1), (0, 2), (1, 2)]);
    let deps: Vec<String> = dependencies(&pool, "M0").unwrap().iter().map(|s| s.to_string()).collect();
    assert_eq!(deps, vec!["M2".to_string(), "M1".to_string()]);
}

#[test]
fn test_cycle_through_root() {
    let pool = pool_from_edges(3, &[(0, 1), (1, 2), (2, 0)]);
    let deps = dependencies(&pool, "M0").unwrap();
    assert_eq!(deps.len(), 2);
    let graph = DependencyGraph::build(&pool, &["M0"]).unwrap();
    assert!(graph.is_recursive("M1"));
    assert_eq!(graph.recursive_groups().len(), 1);
}
