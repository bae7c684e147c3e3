//! Validator registry keyed by `"{nodeType}.{fieldName}"`.
//!
//! Type-wide rules apply to every node of a type. Dynamic rules belong to one
//! node instance and run after the type-wide rules of the same field. The
//! document layer must call [`ValidatorRegistry::remove_node_validators`]
//! when it deletes a node.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::config::ValidationLimits;
use crate::parse::types::{NodeType, WorkflowNode};
use crate::resolve::{EntityCatalog, NodeCatalog, UpstreamParams};

/// `Ok(())` when the value passes, otherwise the user-facing message.
pub type ValidatorFn =
    Arc<dyn Fn(Option<&Value>, &str, &RuleContext<'_>) -> Result<(), String> + Send + Sync>;

/// Everything a rule may look at besides the field value itself.
pub struct RuleContext<'a> {
    pub node: &'a WorkflowNode,
    pub nodes: &'a [WorkflowNode],
    pub upstream: &'a UpstreamParams,
    pub entities: &'a EntityCatalog,
    pub limits: &'a ValidationLimits,
}

#[derive(Clone)]
pub struct Rule {
    pub name: String,
    pub check: ValidatorFn,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish()
    }
}

#[derive(Debug, Clone)]
struct FieldRules {
    field: String,
    rules: Vec<Rule>,
}

#[derive(Debug, Clone)]
struct DynamicRules {
    node_type: NodeType,
    fields: Vec<FieldRules>,
}

pub fn rule_key(node_type: NodeType, field: &str) -> String {
    format!("{}.{}", node_type, field)
}

#[derive(Debug, Clone, Default)]
pub struct ValidatorRegistry {
    builtin: HashMap<NodeType, Vec<FieldRules>>,
    dynamic: HashMap<String, DynamicRules>,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with schema-derived and node-specific rules.
    pub fn with_builtin_rules(catalog: &NodeCatalog) -> Self {
        let mut registry = Self::new();
        super::node_rules::register_builtin(&mut registry, catalog);
        registry
    }

    /// Add a type-wide rule. A rule with the same name on the same field is replaced in place.
    pub fn register(&mut self, node_type: NodeType, field: &str, name: &str, check: ValidatorFn) {
        let fields = self.builtin.entry(node_type).or_default();
        insert_rule(fields, field, name, check);
    }

    /// Add a rule for one node instance, layered on top of its type's rules.
    pub fn register_dynamic(
        &mut self,
        node_id: &str,
        node_type: NodeType,
        field: &str,
        name: &str,
        check: ValidatorFn,
    ) {
        let entry = self
            .dynamic
            .entry(node_id.to_string())
            .or_insert_with(|| DynamicRules {
                node_type,
                fields: Vec::new(),
            });
        if entry.node_type != node_type {
            log::debug!(
                "node '{}' changed type {} -> {}, dropping its dynamic rules",
                node_id,
                entry.node_type,
                node_type
            );
            entry.node_type = node_type;
            entry.fields.clear();
        }
        insert_rule(&mut entry.fields, field, name, check);
    }

    /// Drop every dynamic rule of `node_id`. Returns whether any existed.
    pub fn remove_node_validators(&mut self, node_id: &str) -> bool {
        self.dynamic.remove(node_id).is_some()
    }

    /// Drop dynamic rules of nodes no longer in `nodes`. Returns how many were pruned.
    pub fn retain_nodes(&mut self, nodes: &[WorkflowNode]) -> usize {
        let before = self.dynamic.len();
        self.dynamic
            .retain(|node_id, _| nodes.iter().any(|n| &n.id == node_id));
        let pruned = before - self.dynamic.len();
        if pruned > 0 {
            log::warn!("pruned dynamic validators of {} deleted node(s)", pruned);
        }
        pruned
    }

    /// Node ids that currently carry dynamic rules, sorted.
    pub fn dynamic_node_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.dynamic.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Type-wide rules registered under `"{nodeType}.{fieldName}"`.
    pub fn rules_for(&self, key: &str) -> Vec<&Rule> {
        let Some((type_part, field)) = key.split_once('.') else {
            return vec![];
        };
        self.builtin
            .iter()
            .filter(|(node_type, _)| node_type.as_str() == type_part)
            .flat_map(|(_, fields)| fields.iter())
            .filter(|f| f.field == field)
            .flat_map(|f| f.rules.iter())
            .collect()
    }

    /// Fields to check on `node`, in registration order, each with its
    /// type-wide rules followed by the node's own dynamic rules.
    pub fn field_plan(&self, node: &WorkflowNode) -> Vec<(&str, Vec<&Rule>)> {
        let mut plan: Vec<(&str, Vec<&Rule>)> = self
            .builtin
            .get(&node.node_type)
            .into_iter()
            .flatten()
            .map(|f| (f.field.as_str(), f.rules.iter().collect()))
            .collect();

        let dynamic = self
            .dynamic
            .get(&node.id)
            .filter(|d| d.node_type == node.node_type);
        for extra in dynamic.into_iter().flat_map(|d| d.fields.iter()) {
            match plan.iter_mut().find(|(field, _)| *field == extra.field) {
                Some((_, rules)) => rules.extend(extra.rules.iter()),
                None => plan.push((extra.field.as_str(), extra.rules.iter().collect())),
            }
        }

        plan
    }
}

fn insert_rule(fields: &mut Vec<FieldRules>, field: &str, name: &str, check: ValidatorFn) {
    let rule = Rule {
        name: name.to_string(),
        check,
    };
    match fields.iter_mut().find(|f| f.field == field) {
        Some(existing) => match existing.rules.iter_mut().find(|r| r.name == name) {
            Some(slot) => *slot = rule,
            None => existing.rules.push(rule),
        },
        None => fields.push(FieldRules {
            field: field.to_string(),
            rules: vec![rule],
        }),
    }
}
