//! Integration tests for graph traversal queries.

mod helpers;

use flowcheck::traverse::*;
use helpers::*;

fn ids(nodes: &[&flowcheck::parse::types::WorkflowNode]) -> Vec<String> {
    nodes.iter().map(|n| n.id.clone()).collect()
}

#[test]
fn upstream_is_nearest_first_and_excludes_self() {
    // t -> a -> b -> d, t -> c -> d
    let d = code_graph(
        &["a", "b", "c", "d"],
        &[("t", "a"), ("a", "b"), ("b", "d"), ("t", "c"), ("c", "d")],
    );
    let upstream = all_upstream_nodes("d", &d.nodes, &d.edges);
    assert_eq!(ids(&upstream), vec!["b", "c", "a", "t"]);
}

#[test]
fn shared_ancestor_keeps_shallowest_position() {
    // t -> a -> x, t -> x
    let d = code_graph(&["a", "x"], &[("t", "a"), ("a", "x"), ("t", "x")]);
    let upstream = all_upstream_nodes("x", &d.nodes, &d.edges);
    assert_eq!(ids(&upstream), vec!["t", "a"]);
}

#[test]
fn reverse_edge_would_create_cycle() {
    let d = code_graph(&["a", "b"], &[("t", "a"), ("a", "b")]);
    assert!(!would_create_cycle("a", "b", &d.nodes, &d.edges));
    assert!(would_create_cycle("b", "a", &d.nodes, &d.edges));
    assert!(would_create_cycle("b", "t", &d.nodes, &d.edges));
    assert!(would_create_cycle("a", "a", &d.nodes, &d.edges));
}

#[test]
fn incomers_and_outgoers_deduplicate_parallel_edges() {
    let mut d = code_graph(&["a", "b"], &[("t", "a"), ("a", "b")]);
    d.edges.push(edge_on("a", "other", "b"));
    assert_eq!(ids(&outgoers("a", &d.nodes, &d.edges)), vec!["b"]);
    assert_eq!(ids(&incomers("b", &d.nodes, &d.edges)), vec!["a"]);
    assert_eq!(connected_edges(&["b"], &d.edges).len(), 2);
}

#[test]
fn free_nodes_are_unreachable_from_entry() {
    let d = code_graph(&["a", "lonely"], &[("t", "a")]);
    assert_eq!(ids(&free_nodes("t", &d.nodes, &d.edges)), vec!["lonely"]);
}

#[test]
fn unknown_ids_yield_nothing() {
    let d = code_graph(&["a"], &[("t", "a")]);
    assert!(all_upstream_nodes("ghost", &d.nodes, &d.edges).is_empty());
    assert!(outgoers("ghost", &d.nodes, &d.edges).is_empty());
}
