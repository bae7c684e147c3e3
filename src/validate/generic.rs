//! Rules every node carries regardless of type, plus the document-level
//! identity checks (I001–I005).

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;

use crate::config::ValidationLimits;
use crate::error::WorkflowError;
use crate::parse::types::{WorkflowEdge, WorkflowNode};

fn id_regex() -> &'static Regex {
    static ID: OnceLock<Regex> = OnceLock::new();
    ID.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_]*$").expect("valid regex"))
}

/// Node and edge ids: letters, digits and `_`, not starting with `_`.
pub fn is_valid_id(id: &str) -> bool {
    id_regex().is_match(id)
}

/// Generic messages for one node, in check order: id format, id uniqueness,
/// name, remark.
pub fn node_messages(
    node: &WorkflowNode,
    nodes: &[WorkflowNode],
    limits: &ValidationLimits,
) -> Vec<String> {
    let mut messages = Vec::new();

    if !is_valid_id(&node.id) {
        messages.push(format!(
            "Node id '{}' may only contain letters, digits and '_' and must not start with '_'",
            node.id
        ));
    }

    let clash = nodes
        .iter()
        .find(|other| other.id == node.id && !std::ptr::eq(*other, node));
    if let Some(other) = clash {
        messages.push(format!(
            "Node id '{}' is used by both '{}' and '{}'",
            node.id,
            node.label(),
            other.label()
        ));
    }

    let name_len = node.data.name.trim().chars().count();
    if name_len == 0 {
        messages.push("Name is required".to_string());
    } else if name_len > limits.name_max_len {
        messages.push(format!(
            "Name must be at most {} characters",
            limits.name_max_len
        ));
    }

    let remark_len = node.data.remark.as_deref().map_or(0, |r| r.chars().count());
    if remark_len > limits.remark_max_len {
        messages.push(format!(
            "Remark must be at most {} characters",
            limits.remark_max_len
        ));
    }

    messages
}

// =============================================================================
// DOCUMENT IDENTITY
// =============================================================================

/// Identity errors for the whole snapshot, nodes first, then edges.
pub fn identity_errors(nodes: &[WorkflowNode], edges: &[WorkflowEdge]) -> Vec<WorkflowError> {
    let mut errors = Vec::new();
    i001_node_id_format(nodes, &mut errors);
    i002_node_id_unique(nodes, &mut errors);
    i003_edge_id_format(edges, &mut errors);
    i004_edge_id_unique(edges, &mut errors);
    i005_edges_reference_existing_nodes(nodes, edges, &mut errors);
    errors
}

fn i001_node_id_format(nodes: &[WorkflowNode], errors: &mut Vec<WorkflowError>) {
    for node in nodes.iter().filter(|n| !is_valid_id(&n.id)) {
        errors.push(WorkflowError::node_identity(
            "I001",
            format!("Node '{}' has a malformed id '{}'", node.label(), node.id),
            &node.id,
        ));
    }
}

fn i002_node_id_unique(nodes: &[WorkflowNode], errors: &mut Vec<WorkflowError>) {
    let mut first_seen: HashMap<&str, &WorkflowNode> = HashMap::new();
    for node in nodes {
        match first_seen.get(node.id.as_str()) {
            Some(first) => errors.push(WorkflowError::node_identity(
                "I002",
                format!(
                    "Nodes '{}' and '{}' share the id '{}'",
                    first.label(),
                    node.label(),
                    node.id
                ),
                &node.id,
            )),
            None => {
                first_seen.insert(&node.id, node);
            }
        }
    }
}

fn i003_edge_id_format(edges: &[WorkflowEdge], errors: &mut Vec<WorkflowError>) {
    for edge in edges.iter().filter(|e| !is_valid_id(&e.id)) {
        errors.push(WorkflowError::edge_identity(
            "I003",
            format!("Edge '{}' has a malformed id", edge.id),
            &edge.id,
        ));
    }
}

fn i004_edge_id_unique(edges: &[WorkflowEdge], errors: &mut Vec<WorkflowError>) {
    let mut seen = HashSet::new();
    for edge in edges {
        if !seen.insert(edge.id.as_str()) {
            errors.push(WorkflowError::edge_identity(
                "I004",
                format!("Edge id '{}' is used more than once", edge.id),
                &edge.id,
            ));
        }
    }
}

fn i005_edges_reference_existing_nodes(
    nodes: &[WorkflowNode],
    edges: &[WorkflowEdge],
    errors: &mut Vec<WorkflowError>,
) {
    let ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    for edge in edges {
        for (end, node_id) in [("source", &edge.source), ("target", &edge.target)] {
            if !ids.contains(node_id.as_str()) {
                errors.push(WorkflowError::edge_identity(
                    "I005",
                    format!(
                        "Edge '{}' references unknown {} node '{}'",
                        edge.id, end, node_id
                    ),
                    &edge.id,
                ));
            }
        }
    }
}
