//! Whole-workflow invariant checker.
//!
//! Runs the structural stages, the identity stage and field validation in a
//! fixed order and reports the resulting [`WorkflowState`]. The first failing
//! stage ends the check. The report is recomputed from the snapshot on every
//! call, so checking the same input twice gives the same report.

use serde::{Deserialize, Serialize};

use crate::config::{CheckOptions, ValidationLimits};
use crate::error::WorkflowError;
use crate::parallel::can_add_parallel_branch;
use crate::parse::graph::WorkflowGraph;
use crate::parse::types::{WorkflowDocument, WorkflowEdge, WorkflowNode};
use crate::traverse::would_create_cycle;
use crate::validate::generic::identity_errors;
use crate::validate::{ValidationEnv, ValidationIssue, ValidatorRegistry, structural, validate_nodes};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkflowState {
    Empty,
    StructurallyInvalid,
    DataInvalid,
    Valid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CheckStage {
    NodeCardinality,
    Acyclic,
    Connectivity,
    ParallelStructure,
    OutputCardinality,
    Identity,
    Fields,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    pub state: WorkflowState,
    pub failed_stage: Option<CheckStage>,
    pub errors: Vec<WorkflowError>,
    /// Per-node results of the field stage; empty when an earlier stage failed.
    pub issues: Vec<ValidationIssue>,
}

impl CheckReport {
    fn with_state(state: WorkflowState) -> Self {
        CheckReport {
            state,
            failed_stage: None,
            errors: vec![],
            issues: vec![],
        }
    }

    fn failed(stage: CheckStage, mut errors: Vec<WorkflowError>, options: CheckOptions) -> Self {
        if options.validate_first {
            errors.truncate(1);
        }
        log::debug!("check failed at {:?} with {} error(s)", stage, errors.len());
        CheckReport {
            state: WorkflowState::StructurallyInvalid,
            failed_stage: Some(stage),
            errors,
            issues: vec![],
        }
    }

    pub fn is_valid(&self) -> bool {
        self.state == WorkflowState::Valid
    }

    /// First message to surface, for single-line notifications.
    pub fn first_message(&self) -> Option<&str> {
        self.errors.first().map(|e| e.message.as_str())
    }
}

/// Check a workflow snapshot against every invariant.
pub fn check_workflow(
    doc: &WorkflowDocument,
    registry: &ValidatorRegistry,
    env: ValidationEnv<'_>,
    options: CheckOptions,
) -> CheckReport {
    if doc.nodes.is_empty() {
        return CheckReport::with_state(WorkflowState::Empty);
    }

    let errors = structural::node_cardinality(doc, env.limits);
    if !errors.is_empty() {
        return CheckReport::failed(CheckStage::NodeCardinality, errors, options);
    }
    let Some(entry) = doc.nodes.iter().find(|n| n.is_entry()) else {
        return CheckReport::failed(CheckStage::NodeCardinality, errors, options);
    };

    let graph = WorkflowGraph::build(doc);

    let errors = structural::s004_no_cycles(&graph);
    if !errors.is_empty() {
        return CheckReport::failed(CheckStage::Acyclic, errors, options);
    }

    let errors = structural::s005_no_free_nodes(doc, &graph, entry);
    if !errors.is_empty() {
        return CheckReport::failed(CheckStage::Connectivity, errors, options);
    }

    let errors = structural::parallel_structure(&graph, entry, env.limits);
    if !errors.is_empty() {
        return CheckReport::failed(CheckStage::ParallelStructure, errors, options);
    }

    let errors = structural::output_cardinality(doc, entry);
    if !errors.is_empty() {
        return CheckReport::failed(CheckStage::OutputCardinality, errors, options);
    }

    let errors = identity_errors(&doc.nodes, &doc.edges);
    if !errors.is_empty() {
        return CheckReport::failed(CheckStage::Identity, errors, options);
    }

    log::debug!("structure ok, validating {} node(s)", doc.nodes.len());
    let issues = validate_nodes(&doc.nodes, &doc.edges, registry, env, options);
    let errors: Vec<WorkflowError> = issues
        .iter()
        .filter(|issue| issue.is_error())
        .flat_map(|issue| {
            issue
                .messages
                .iter()
                .map(move |m| WorkflowError::field(m.clone(), &issue.node_id))
        })
        .collect();

    if errors.is_empty() {
        CheckReport {
            issues,
            ..CheckReport::with_state(WorkflowState::Valid)
        }
    } else {
        CheckReport {
            state: WorkflowState::DataInvalid,
            failed_stage: Some(CheckStage::Fields),
            errors,
            issues,
        }
    }
}

/// Gate for adding `candidate` to the snapshot interactively: both ends must
/// exist, and the edge must not close a cycle or widen a fan-out past the limit.
pub fn check_connection(
    nodes: &[WorkflowNode],
    edges: &[WorkflowEdge],
    candidate: &WorkflowEdge,
    limits: &ValidationLimits,
) -> Result<(), WorkflowError> {
    for end in [&candidate.source, &candidate.target] {
        if !nodes.iter().any(|n| &n.id == end) {
            return Err(WorkflowError::edge_identity(
                "I005",
                format!("Cannot connect to unknown node '{}'", end),
                &candidate.id,
            ));
        }
    }

    if candidate.source == candidate.target {
        return Err(WorkflowError::structural(
            "S004",
            "A node cannot be connected to itself",
            Some(candidate.source.clone()),
        )
        .with_edge(&candidate.id));
    }

    if would_create_cycle(&candidate.source, &candidate.target, nodes, edges) {
        return Err(WorkflowError::structural(
            "S004",
            format!(
                "Connecting '{}' to '{}' would create a cycle",
                candidate.source, candidate.target
            ),
            Some(candidate.source.clone()),
        )
        .with_edge(&candidate.id));
    }

    if !can_add_parallel_branch(
        &candidate.source,
        candidate.source_handle.as_deref(),
        edges,
        limits,
    ) {
        return Err(WorkflowError::structural(
            "S008",
            format!(
                "Node '{}' already fans out to {} parallel branches",
                candidate.source, limits.max_parallel_width
            ),
            Some(candidate.source.clone()),
        )
        .with_edge(&candidate.id));
    }

    Ok(())
}
