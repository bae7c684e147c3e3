//! Derive the referenceable parameters a node exposes to its downstream nodes.

use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::catalog::{EntityCatalog, NodeCatalog, OutputDescriptor, OutputKind, ValueType};
use crate::parse::types::{NodeType, WorkflowEdge, WorkflowNode};
use crate::reference::{gen_ref_param_key, is_ref_param_key};
use crate::traverse::all_upstream_nodes;

fn url_placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{([^{}]+)\}").expect("valid regex"))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamParam {
    pub name: String,
    pub value_type: ValueType,
    /// Reference token downstream fields embed to read this parameter.
    pub key: String,
    /// Raw output key inside the token.
    pub value_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enums: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamGroup {
    pub node_id: String,
    pub node_name: String,
    pub node_type: NodeType,
    pub params: Vec<UpstreamParam>,
}

/// One row of the flattened view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatParam {
    pub node_id: String,
    pub node_name: String,
    pub node_type: NodeType,
    #[serde(flatten)]
    pub param: UpstreamParam,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamParams {
    /// One group per upstream node, nearest first.
    pub groups: Vec<ParamGroup>,
    pub flat: Vec<FlatParam>,
}

impl UpstreamParams {
    pub fn from_groups(groups: Vec<ParamGroup>) -> Self {
        let flat = groups
            .iter()
            .flat_map(|group| {
                group.params.iter().map(|param| FlatParam {
                    node_id: group.node_id.clone(),
                    node_name: group.node_name.clone(),
                    node_type: group.node_type,
                    param: param.clone(),
                })
            })
            .collect();
        UpstreamParams { groups, flat }
    }

    pub fn contains_node(&self, node_id: &str) -> bool {
        self.groups.iter().any(|g| g.node_id == node_id)
    }

    /// Whether `ref_key` (a full reference token) currently resolves.
    pub fn contains_key(&self, ref_key: &str) -> bool {
        self.find(ref_key).is_some()
    }

    pub fn find(&self, ref_key: &str) -> Option<&FlatParam> {
        self.flat.iter().find(|p| p.param.key == ref_key)
    }
}

/// Referenceable parameters of every upstream node of `node_id`.
pub fn upstream_params(
    node_id: &str,
    nodes: &[WorkflowNode],
    edges: &[WorkflowEdge],
    catalog: &NodeCatalog,
    entities: &EntityCatalog,
) -> UpstreamParams {
    let groups = all_upstream_nodes(node_id, nodes, edges)
        .into_iter()
        .map(|node| ParamGroup {
            node_id: node.id.clone(),
            node_name: node.label().to_string(),
            node_type: node.node_type,
            params: node_output_params(node, catalog, entities),
        })
        .collect();
    UpstreamParams::from_groups(groups)
}

/// Parameters one node currently exposes, in descriptor order.
pub fn node_output_params(
    node: &WorkflowNode,
    catalog: &NodeCatalog,
    entities: &EntityCatalog,
) -> Vec<UpstreamParam> {
    let mut params = Vec::new();
    for descriptor in catalog.outputs(node.node_type) {
        let value = node.parameter(&descriptor.key);
        match descriptor.kind {
            OutputKind::Static => params.push(static_param(node, descriptor)),
            OutputKind::Url => url_params(node, descriptor, value, &mut params),
            OutputKind::Object => object_params(node, value, &mut params),
            OutputKind::ObjectArray => object_array_params(node, value, &mut params),
            OutputKind::Entities => {
                let keys = value
                    .and_then(Value::as_array)
                    .into_iter()
                    .flatten()
                    .filter_map(Value::as_str);
                entity_params(node, keys, entities, &mut params);
            }
            OutputKind::ObjectEntities => {
                let keys = value
                    .and_then(Value::as_object)
                    .into_iter()
                    .flat_map(|map| map.keys().map(String::as_str));
                entity_params(node, keys, entities, &mut params);
            }
        }
    }
    params
}

fn param(node: &WorkflowNode, name: &str, value_key: &str, value_type: ValueType) -> UpstreamParam {
    UpstreamParam {
        name: name.to_string(),
        value_type,
        key: gen_ref_param_key(&node.id, value_key),
        value_key: value_key.to_string(),
        enums: None,
    }
}

fn static_param(node: &WorkflowNode, descriptor: &OutputDescriptor) -> UpstreamParam {
    let name = descriptor.label.as_deref().unwrap_or(&descriptor.key);
    param(
        node,
        name,
        &descriptor.key,
        descriptor.value_type.unwrap_or(ValueType::String),
    )
}

fn url_params(
    node: &WorkflowNode,
    descriptor: &OutputDescriptor,
    value: Option<&Value>,
    params: &mut Vec<UpstreamParam>,
) {
    let Some(url) = value.and_then(Value::as_str).filter(|u| !u.trim().is_empty()) else {
        return;
    };
    let name = descriptor.label.as_deref().unwrap_or(&descriptor.key);
    params.push(param(node, name, &descriptor.key, ValueType::String));

    let mut seen = HashSet::new();
    for caps in url_placeholder_regex().captures_iter(url) {
        let Some(whole) = caps.get(0) else { continue };
        // `#{properties...}` is a reference token, not a path placeholder.
        if url[..whole.start()].ends_with('#') {
            continue;
        }
        let placeholder = caps[1].trim();
        if placeholder.is_empty() || !seen.insert(placeholder.to_string()) {
            continue;
        }
        let value_key = format!("{}.{}", descriptor.key, placeholder);
        params.push(param(node, placeholder, &value_key, ValueType::String));
    }
}

fn object_params(node: &WorkflowNode, value: Option<&Value>, params: &mut Vec<UpstreamParam>) {
    let Some(map) = value.and_then(Value::as_object) else {
        return;
    };
    for (key, entry) in map {
        if is_empty_value(entry) {
            continue;
        }
        if entry.as_str().is_some_and(is_ref_param_key) {
            continue;
        }
        params.push(param(node, key, key, infer_value_type(entry)));
    }
}

fn object_array_params(node: &WorkflowNode, value: Option<&Value>, params: &mut Vec<UpstreamParam>) {
    let Some(items) = value.and_then(Value::as_array) else {
        return;
    };
    for item in items {
        let name = item.get("name").and_then(Value::as_str).filter(|n| !n.is_empty());
        let value_type = item
            .get("type")
            .and_then(Value::as_str)
            .and_then(ValueType::from_tag);
        let (Some(name), Some(value_type)) = (name, value_type) else {
            continue;
        };
        let mut p = param(node, name, name, value_type);
        if value_type == ValueType::Boolean {
            p.enums = Some(boolean_enums());
        }
        params.push(p);
    }
}

fn entity_params<'a>(
    node: &WorkflowNode,
    keys: impl Iterator<Item = &'a str>,
    entities: &EntityCatalog,
    params: &mut Vec<UpstreamParam>,
) {
    for key in keys {
        let Some(meta) = entities.get(key) else {
            log::debug!("node '{}' lists unknown entity '{}', skipping", node.id, key);
            continue;
        };
        let mut p = param(node, &meta.name, key, meta.value_type);
        p.enums = match (&meta.enum_values, meta.value_type) {
            (Some(values), _) => Some(values.clone()),
            (None, ValueType::Boolean) => Some(boolean_enums()),
            _ => None,
        };
        params.push(p);
    }
}

fn boolean_enums() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("false".to_string(), "False".to_string()),
        ("true".to_string(), "True".to_string()),
    ])
}

/// Null, blank strings and empty containers count as "no value".
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

fn infer_value_type(value: &Value) -> ValueType {
    match value {
        Value::String(_) => ValueType::String,
        Value::Bool(_) => ValueType::Boolean,
        Value::Number(n) if n.is_i64() || n.is_u64() => ValueType::Long,
        Value::Number(_) => ValueType::Double,
        Value::Null | Value::Array(_) | Value::Object(_) => ValueType::Object,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node_with(node_type: NodeType, params: Value) -> WorkflowNode {
        let mut node = WorkflowNode::new("n1", node_type, "Node");
        if let Value::Object(map) = params {
            node.data.parameters = map;
        }
        node
    }

    #[test]
    fn url_placeholders_become_dotted_outputs() {
        let node = node_with(
            NodeType::Httpin,
            json!({ "method": "GET", "url": "/api/{deviceId}/{ slot }/{deviceId}" }),
        );
        let params = node_output_params(&node, &NodeCatalog::builtin(), &EntityCatalog::new());
        let keys: Vec<&str> = params.iter().map(|p| p.value_key.as_str()).collect();
        assert_eq!(keys, vec!["url", "url.deviceId", "url.slot", "header", "body"]);
        assert_eq!(params[1].key, "#{properties.n1['url.deviceId']}");
    }

    #[test]
    fn url_reference_tokens_are_not_placeholders() {
        let node = node_with(
            NodeType::Httpin,
            json!({ "url": "/api/#{properties.a['x']}/{id}" }),
        );
        let params = node_output_params(&node, &NodeCatalog::builtin(), &EntityCatalog::new());
        let keys: Vec<&str> = params.iter().map(|p| p.value_key.as_str()).collect();
        assert_eq!(keys, vec!["url", "url.id", "header", "body"]);
    }

    #[test]
    fn object_skips_empty_and_reference_values() {
        let node = node_with(
            NodeType::Service,
            json!({ "serviceParams": {
                "a": "literal",
                "b": "",
                "c": "#{properties.up['x']}",
                "d": 3,
                "e": null
            }}),
        );
        let params = node_output_params(&node, &NodeCatalog::builtin(), &EntityCatalog::new());
        let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "d"]);
        assert_eq!(params[1].value_type, ValueType::Long);
    }

    #[test]
    fn object_array_requires_name_and_type() {
        let node = node_with(
            NodeType::Code,
            json!({ "payload": [
                { "name": "ok", "type": "BOOLEAN" },
                { "name": "noType" },
                { "type": "STRING" },
                { "name": "bad", "type": "NOPE" }
            ]}),
        );
        let params = node_output_params(&node, &NodeCatalog::builtin(), &EntityCatalog::new());
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].name, "ok");
        assert_eq!(params[0].enums.as_ref().map(|e| e.len()), Some(2));
    }
}
