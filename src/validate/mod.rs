//! Field-level validation phase.
//!
//! Runs the generic node rules and every registered field rule against a
//! snapshot, producing one [`ValidationIssue`] per node.

pub mod generic;
pub mod node_rules;
pub mod registry;
pub mod rules;
pub mod structural;

use serde::{Deserialize, Serialize};

use crate::config::{CheckOptions, ValidationLimits};
use crate::parse::types::{NodeType, WorkflowEdge, WorkflowNode};
use crate::resolve::{EntityCatalog, NodeCatalog, upstream_params};

pub use registry::{Rule, RuleContext, ValidatorFn, ValidatorRegistry, rule_key};

/// Read-only configuration a validation pass is evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct ValidationEnv<'a> {
    pub catalog: &'a NodeCatalog,
    pub entities: &'a EntityCatalog,
    pub limits: &'a ValidationLimits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub node_id: String,
    pub node_type: NodeType,
    pub node_label: String,
    pub status: IssueStatus,
    pub messages: Vec<String>,
}

impl ValidationIssue {
    pub fn is_error(&self) -> bool {
        self.status == IssueStatus::Error
    }
}

/// Validate every node in document order.
///
/// With `validate_first`, the pass stops at the first failing node and that
/// node's issue carries a single message.
pub fn validate_nodes(
    nodes: &[WorkflowNode],
    edges: &[WorkflowEdge],
    registry: &ValidatorRegistry,
    env: ValidationEnv<'_>,
    options: CheckOptions,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::with_capacity(nodes.len());
    for node in nodes {
        let issue = validate_node(node, nodes, edges, registry, env, options);
        let failed = issue.is_error();
        issues.push(issue);
        if failed && options.validate_first {
            break;
        }
    }
    issues
}

/// Validate one node: generic rules, then each field in rule-set order. The
/// first failing rule of a field contributes that field's message.
pub fn validate_node(
    node: &WorkflowNode,
    nodes: &[WorkflowNode],
    edges: &[WorkflowEdge],
    registry: &ValidatorRegistry,
    env: ValidationEnv<'_>,
    options: CheckOptions,
) -> ValidationIssue {
    let mut messages = generic::node_messages(node, nodes, env.limits);

    if messages.is_empty() || !options.validate_first {
        let upstream = upstream_params(&node.id, nodes, edges, env.catalog, env.entities);
        let ctx = RuleContext {
            node,
            nodes,
            upstream: &upstream,
            entities: env.entities,
            limits: env.limits,
        };

        for (field, field_rules) in registry.field_plan(node) {
            let value = node.parameter(field);
            let label = env.catalog.field_label(node.node_type, field);
            let failure = field_rules
                .iter()
                .find_map(|rule| (rule.check)(value, label, &ctx).err());
            if let Some(message) = failure {
                messages.push(message);
                if options.validate_first {
                    break;
                }
            }
        }
    }

    if options.validate_first {
        messages.truncate(1);
    }

    if !messages.is_empty() {
        log::debug!("node '{}' failed validation: {:?}", node.id, messages);
    }

    ValidationIssue {
        node_id: node.id.clone(),
        node_type: node.node_type,
        node_label: node.label().to_string(),
        status: if messages.is_empty() {
            IssueStatus::Success
        } else {
            IssueStatus::Error
        },
        messages,
    }
}
