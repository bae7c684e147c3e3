//! Structural rules run by the checker before any field validation (S001–S010).

use crate::config::ValidationLimits;
use crate::error::WorkflowError;
use crate::parallel;
use crate::parse::graph::WorkflowGraph;
use crate::parse::types::{WorkflowDocument, WorkflowNode};

/// Stage 1: enough nodes, exactly one entry node, not only entry nodes.
pub fn node_cardinality(doc: &WorkflowDocument, limits: &ValidationLimits) -> Vec<WorkflowError> {
    let mut errors = Vec::new();
    s001_min_nodes(doc, limits, &mut errors);
    s002_s003_entry_nodes(doc, &mut errors);
    errors
}

fn s001_min_nodes(doc: &WorkflowDocument, limits: &ValidationLimits, errors: &mut Vec<WorkflowError>) {
    if doc.nodes.len() < limits.min_nodes {
        errors.push(WorkflowError::structural(
            "S001",
            format!(
                "Workflow must have at least {} nodes, found {}",
                limits.min_nodes,
                doc.nodes.len()
            ),
            None,
        ));
    }
}

fn s002_s003_entry_nodes(doc: &WorkflowDocument, errors: &mut Vec<WorkflowError>) {
    let entries: Vec<&WorkflowNode> = doc.nodes.iter().filter(|n| n.is_entry()).collect();

    if !doc.nodes.is_empty() && entries.len() == doc.nodes.len() {
        errors.push(WorkflowError::structural(
            "S003",
            "Workflow consists only of entry nodes; add at least one processing node",
            None,
        ));
        return;
    }

    match entries.as_slice() {
        [_] => {}
        [] => errors.push(WorkflowError::structural(
            "S002",
            "Workflow must have exactly 1 entry node, found 0",
            None,
        )),
        [_, extra @ ..] => {
            for node in extra {
                errors.push(WorkflowError::structural(
                    "S002",
                    format!(
                        "Workflow must have exactly 1 entry node, found {}; remove '{}'",
                        entries.len(),
                        node.label()
                    ),
                    Some(node.id.clone()),
                ));
            }
        }
    }
}

/// Stage 2: no cycle anywhere in the graph.
pub fn s004_no_cycles(graph: &WorkflowGraph) -> Vec<WorkflowError> {
    match graph.find_cycle() {
        Some(node_id) => vec![WorkflowError::structural(
            "S004",
            format!("Workflow contains a cycle through node '{}'", node_id),
            Some(node_id.to_string()),
        )],
        None => vec![],
    }
}

/// Stage 3: every node reachable from the entry node.
pub fn s005_no_free_nodes(
    doc: &WorkflowDocument,
    graph: &WorkflowGraph,
    entry: &WorkflowNode,
) -> Vec<WorkflowError> {
    graph
        .unreachable(&entry.id, &doc.nodes)
        .into_iter()
        .map(|n| {
            WorkflowError::structural(
                "S005",
                format!("Node '{}' is not connected to '{}'", n.label(), entry.label()),
                Some(n.id.clone()),
            )
        })
        .collect()
}

/// Stage 4: parallel branches well formed and within depth and width limits.
pub fn parallel_structure(
    graph: &WorkflowGraph,
    entry: &WorkflowNode,
    limits: &ValidationLimits,
) -> Vec<WorkflowError> {
    let analysis = parallel::analyze_graph(&entry.id, graph);
    log::debug!(
        "parallel analysis from '{}': {} split(s), max depth {}",
        entry.id,
        analysis.records.len(),
        analysis.max_depth()
    );
    analysis.violations(limits)
}

/// Stage 5: at most one output node, and only behind a trigger entry.
pub fn output_cardinality(doc: &WorkflowDocument, entry: &WorkflowNode) -> Vec<WorkflowError> {
    let mut errors = Vec::new();
    let outputs: Vec<&WorkflowNode> = doc.nodes.iter().filter(|n| n.is_output()).collect();

    for extra in outputs.iter().skip(1) {
        errors.push(WorkflowError::structural(
            "S009",
            format!(
                "Workflow may have at most 1 output node, found {}; remove '{}'",
                outputs.len(),
                extra.label()
            ),
            Some(extra.id.clone()),
        ));
    }

    if let Some(first) = outputs.first() {
        if !entry.node_type.permits_output_node() {
            errors.push(WorkflowError::structural(
                "S010",
                format!(
                    "Output node '{}' is only allowed when the workflow starts with a trigger, \
                     not a {} node",
                    first.label(),
                    entry.node_type
                ),
                Some(first.id.clone()),
            ));
        }
    }

    errors
}
