#![allow(dead_code)]

use flowcheck::config::{CheckOptions, ValidationLimits};
use flowcheck::parse::types::*;
use flowcheck::resolve::{EntityCatalog, EntityMeta, NodeCatalog, ValueType};
use flowcheck::validate::{ValidationEnv, ValidatorRegistry};
use flowcheck::{CheckReport, check_workflow};
use serde_json::{Value, json};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// =============================================================================
// Node / edge builders
// =============================================================================

pub fn node(id: &str, node_type: NodeType, params: Value) -> WorkflowNode {
    let mut node = WorkflowNode::new(id, node_type, format!("{} {}", node_type, id));
    if let Value::Object(map) = params {
        node.data.parameters = map;
    }
    node
}

/// Trigger with one `LONG` input argument named `count`.
pub fn trigger(id: &str) -> WorkflowNode {
    node(
        id,
        NodeType::Trigger,
        json!({ "entityConfigs": [{ "name": "count", "type": "LONG" }] }),
    )
}

/// Code node exposing one `LONG` output named `result`.
pub fn code(id: &str) -> WorkflowNode {
    node(
        id,
        NodeType::Code,
        json!({
            "language": "JAVASCRIPT",
            "expression": "return { result: 1 };",
            "payload": [{ "name": "result", "type": "LONG" }]
        }),
    )
}

pub fn http(id: &str, url: &str) -> WorkflowNode {
    node(id, NodeType::Http, json!({ "method": "GET", "url": url }))
}

pub fn output(id: &str, variables: Value) -> WorkflowNode {
    node(id, NodeType::Output, json!({ "outputVariables": variables }))
}

pub fn edge(source: &str, target: &str) -> WorkflowEdge {
    WorkflowEdge {
        id: format!("e_{}_{}", source, target),
        source: source.into(),
        target: target.into(),
        source_handle: None,
        target_handle: None,
    }
}

pub fn edge_on(source: &str, handle: &str, target: &str) -> WorkflowEdge {
    WorkflowEdge {
        source_handle: Some(handle.into()),
        ..edge(source, target)
    }
}

pub fn doc(nodes: Vec<WorkflowNode>, edges: Vec<WorkflowEdge>) -> WorkflowDocument {
    WorkflowDocument {
        nodes,
        edges,
        viewport: None,
    }
}

/// Code nodes for each id, wired along `pairs`, hanging off trigger `t`.
pub fn code_graph(ids: &[&str], pairs: &[(&str, &str)]) -> WorkflowDocument {
    let mut nodes = vec![trigger("t")];
    nodes.extend(ids.iter().map(|id| code(id)));
    let edges = pairs.iter().map(|(s, t)| edge(s, t)).collect();
    doc(nodes, edges)
}

// =============================================================================
// Environment
// =============================================================================

pub struct Fixture {
    pub catalog: NodeCatalog,
    pub entities: EntityCatalog,
    pub limits: ValidationLimits,
    pub registry: ValidatorRegistry,
}

impl Fixture {
    pub fn new() -> Self {
        let catalog = NodeCatalog::builtin();
        let registry = ValidatorRegistry::with_builtin_rules(&catalog);
        Fixture {
            catalog,
            entities: sample_entities(),
            limits: ValidationLimits::default(),
            registry,
        }
    }

    pub fn env(&self) -> ValidationEnv<'_> {
        ValidationEnv {
            catalog: &self.catalog,
            entities: &self.entities,
            limits: &self.limits,
        }
    }

    pub fn check(&self, doc: &WorkflowDocument) -> CheckReport {
        check_workflow(doc, &self.registry, self.env(), CheckOptions::default())
    }

    pub fn check_fail_fast(&self, doc: &WorkflowDocument) -> CheckReport {
        check_workflow(doc, &self.registry, self.env(), CheckOptions::fail_fast())
    }
}

pub fn sample_entities() -> EntityCatalog {
    let mut entities = EntityCatalog::new();

    let mut temp = EntityMeta::new("Temperature", ValueType::Double);
    temp.min = Some(-40.0);
    temp.max = Some(85.0);
    entities.insert("device.temp", temp);

    entities.insert("device.online", EntityMeta::new("Online", ValueType::Boolean));

    let mut mode = EntityMeta::new("Mode", ValueType::String);
    mode.enum_values = Some(
        [("eco", "Eco"), ("boost", "Boost")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    );
    entities.insert("device.mode", mode);

    entities
}
