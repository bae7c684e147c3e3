//! Generic graph queries over a node/edge snapshot.
//!
//! All functions take the slices explicitly and are total: ids that are not in
//! `nodes` are simply never returned.

use std::collections::{HashSet, VecDeque};

use crate::parse::graph::WorkflowGraph;
use crate::parse::types::{WorkflowEdge, WorkflowNode};

/// Nodes with an edge into `node_id`, in document order.
pub fn incomers<'a>(
    node_id: &str,
    nodes: &'a [WorkflowNode],
    edges: &[WorkflowEdge],
) -> Vec<&'a WorkflowNode> {
    let sources: HashSet<&str> = edges
        .iter()
        .filter(|e| e.target == node_id)
        .map(|e| e.source.as_str())
        .collect();
    select_nodes(nodes, &sources)
}

/// Nodes `node_id` has an edge into, in document order.
pub fn outgoers<'a>(
    node_id: &str,
    nodes: &'a [WorkflowNode],
    edges: &[WorkflowEdge],
) -> Vec<&'a WorkflowNode> {
    let targets: HashSet<&str> = edges
        .iter()
        .filter(|e| e.source == node_id)
        .map(|e| e.target.as_str())
        .collect();
    select_nodes(nodes, &targets)
}

fn select_nodes<'a>(nodes: &'a [WorkflowNode], ids: &HashSet<&str>) -> Vec<&'a WorkflowNode> {
    let mut seen = HashSet::new();
    nodes
        .iter()
        .filter(|n| ids.contains(n.id.as_str()) && seen.insert(n.id.as_str()))
        .collect()
}

/// Edges touching any of `node_ids`, in edge order.
pub fn connected_edges<'a>(node_ids: &[&str], edges: &'a [WorkflowEdge]) -> Vec<&'a WorkflowEdge> {
    edges
        .iter()
        .filter(|e| node_ids.contains(&e.source.as_str()) || node_ids.contains(&e.target.as_str()))
        .collect()
}

/// Every transitive upstream node of `node_id`, nearest first.
///
/// Breadth-first by distance, so an ancestor reachable along paths of
/// different lengths keeps the position of its shallowest occurrence. The
/// queried node itself is never part of the result.
pub fn all_upstream_nodes<'a>(
    node_id: &str,
    nodes: &'a [WorkflowNode],
    edges: &[WorkflowEdge],
) -> Vec<&'a WorkflowNode> {
    let mut result = Vec::new();
    let mut seen: HashSet<&str> = HashSet::from([node_id]);
    let mut frontier: VecDeque<&'a WorkflowNode> = incomers(node_id, nodes, edges).into();

    while let Some(node) = frontier.pop_front() {
        if !seen.insert(node.id.as_str()) {
            continue;
        }
        result.push(node);
        for parent in incomers(&node.id, nodes, edges) {
            if !seen.contains(parent.id.as_str()) {
                frontier.push_back(parent);
            }
        }
    }

    result
}

/// Whether adding `source -> target` would close a cycle: a self-loop, or
/// `target` can already reach `source`.
pub fn would_create_cycle(
    source: &str,
    target: &str,
    nodes: &[WorkflowNode],
    edges: &[WorkflowEdge],
) -> bool {
    source == target || WorkflowGraph::from_parts(nodes, edges).has_path(target, source)
}

/// Nodes that cannot be reached from `entry_id` following edge direction.
pub fn free_nodes<'a>(
    entry_id: &str,
    nodes: &'a [WorkflowNode],
    edges: &[WorkflowEdge],
) -> Vec<&'a WorkflowNode> {
    WorkflowGraph::from_parts(nodes, edges).unreachable(entry_id, nodes)
}
