//! Integration tests for upstream parameter resolution.

mod helpers;

use flowcheck::parse::types::NodeType;
use flowcheck::resolve::{ValueType, upstream_params};
use helpers::*;
use serde_json::json;

#[test]
fn groups_follow_upstream_order() {
    let fx = Fixture::new();
    let d = code_graph(&["a", "b"], &[("t", "a"), ("a", "b")]);
    let params = upstream_params("b", &d.nodes, &d.edges, &fx.catalog, &fx.entities);

    let groups: Vec<&str> = params.groups.iter().map(|g| g.node_id.as_str()).collect();
    assert_eq!(groups, vec!["a", "t"]);
    assert_eq!(params.flat.len(), 2);
    assert_eq!(params.flat[0].param.key, "#{properties.a['result']}");
    assert_eq!(params.flat[1].param.name, "count");
    assert_eq!(params.flat[1].node_type, NodeType::Trigger);
}

#[test]
fn entity_outputs_resolve_through_catalog() {
    let fx = Fixture::new();
    let select = node(
        "sel",
        NodeType::Select,
        json!({ "entities": ["device.temp", "device.removed", "device.online"] }),
    );
    let d = doc(
        vec![trigger("t"), select, code("c")],
        vec![edge("t", "sel"), edge("sel", "c")],
    );
    let params = upstream_params("c", &d.nodes, &d.edges, &fx.catalog, &fx.entities);

    let group = &params.groups[0];
    assert_eq!(group.node_id, "sel");
    let names: Vec<&str> = group.params.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Temperature", "Online"]);
    assert_eq!(group.params[0].value_type, ValueType::Double);
    assert!(group.params[0].enums.is_none());
    assert_eq!(group.params[1].enums.as_ref().map(|e| e.len()), Some(2));
}

#[test]
fn assigner_exposes_assigned_entities() {
    let fx = Fixture::new();
    let assigner = node(
        "set",
        NodeType::Assigner,
        json!({ "exchangePayload": { "device.mode": "eco" } }),
    );
    let d = doc(
        vec![trigger("t"), assigner, code("c")],
        vec![edge("t", "set"), edge("set", "c")],
    );
    let params = upstream_params("c", &d.nodes, &d.edges, &fx.catalog, &fx.entities);
    let mode = params
        .find("#{properties.set['device.mode']}")
        .expect("assigned entity should resolve");
    assert_eq!(mode.param.name, "Mode");
    assert_eq!(mode.param.enums.as_ref().map(|e| e.len()), Some(2));
}

#[test]
fn entry_node_has_no_upstream() {
    let fx = Fixture::new();
    let d = code_graph(&["a"], &[("t", "a")]);
    let params = upstream_params("t", &d.nodes, &d.edges, &fx.catalog, &fx.entities);
    assert!(params.groups.is_empty());
    assert!(params.flat.is_empty());
}

#[test]
fn static_outputs_use_descriptor_types() {
    let fx = Fixture::new();
    let d = doc(
        vec![trigger("t"), http("h", "https://example.com"), code("c")],
        vec![edge("t", "h"), edge("h", "c")],
    );
    let params = upstream_params("c", &d.nodes, &d.edges, &fx.catalog, &fx.entities);
    let status = params
        .find("#{properties.h['statusCode']}")
        .expect("static output");
    assert_eq!(status.param.value_type, ValueType::Long);
}
