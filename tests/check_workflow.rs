//! Integration tests for the whole-workflow invariant checker.

mod helpers;

use flowcheck::parse::types::{NodeType, WorkflowEdge};
use flowcheck::{CheckStage, ErrorKind, WorkflowState, check_connection, parse};
use helpers::*;
use serde_json::json;

#[test]
fn empty_document_is_empty_state() {
    init_logging();
    let report = Fixture::new().check(&doc(vec![], vec![]));
    assert_eq!(report.state, WorkflowState::Empty);
    assert!(report.errors.is_empty());
    assert_eq!(report.first_message(), None);
}

#[test]
fn single_trigger_is_structurally_invalid() {
    init_logging();
    let report = Fixture::new().check(&doc(vec![trigger("t")], vec![]));
    insta::assert_json_snapshot!(report);
}

#[test]
fn lone_entry_node_reports_entry_only() {
    init_logging();
    let report = Fixture::new().check_fail_fast(&doc(vec![trigger("t")], vec![]));
    assert_eq!(report.state, WorkflowState::StructurallyInvalid);
    let codes: Vec<&str> = report.errors.iter().map(|e| e.code.as_str()).collect();
    assert_eq!(codes, vec!["S001"]);

    let report = Fixture::new().check(&doc(vec![trigger("t")], vec![]));
    let codes: Vec<&str> = report.errors.iter().map(|e| e.code.as_str()).collect();
    assert_eq!(codes, vec!["S001", "S003"]);
}

#[test]
fn one_bad_field_is_data_invalid() {
    init_logging();
    let d = doc(vec![trigger("t"), http("h", "")], vec![edge("t", "h")]);
    let report = Fixture::new().check(&d);
    assert_eq!(report.state, WorkflowState::DataInvalid);
    assert_eq!(report.failed_stage, Some(CheckStage::Fields));
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].kind, ErrorKind::Field);
    assert_eq!(report.errors[0].node_id.as_deref(), Some("h"));
    assert_eq!(report.first_message(), Some("URL is required"));
}

#[test]
fn ifelse_diamond_into_output_is_valid() {
    init_logging();
    let d = parse::parse(include_str!("fixtures/ifelse_diamond.json")).expect("Should parse");
    let report = Fixture::new().check(&d);
    assert_eq!(report.state, WorkflowState::Valid, "{:?}", report.errors);
    assert!(report.is_valid());
    assert_eq!(report.issues.len(), 5);
}

#[test]
fn missing_reference_output_is_reported() {
    init_logging();
    let d = parse::parse(include_str!("fixtures/missing_reference.json")).expect("Should parse");
    let report = Fixture::new().check(&d);
    assert_eq!(report.state, WorkflowState::DataInvalid);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].node_id.as_deref(), Some("push"));
    assert_eq!(
        report.errors[0].message,
        "URL references 'missing' of node 'calc', which no longer resolves"
    );
}

#[test]
fn checking_twice_gives_the_same_report() {
    let fx = Fixture::new();
    let d = parse::parse(include_str!("fixtures/missing_reference.json")).expect("Should parse");
    assert_eq!(fx.check(&d), fx.check(&d));
}

#[test]
fn cycle_fails_before_connectivity() {
    let d = code_graph(&["a", "b"], &[("t", "a"), ("a", "b"), ("b", "a")]);
    let report = Fixture::new().check(&d);
    assert_eq!(report.state, WorkflowState::StructurallyInvalid);
    assert_eq!(report.failed_stage, Some(CheckStage::Acyclic));
    assert_eq!(report.errors[0].code, "S004");
}

#[test]
fn free_nodes_are_all_listed_unless_fail_fast() {
    let fx = Fixture::new();
    let d = code_graph(&["a", "x", "y"], &[("t", "a")]);

    let report = fx.check(&d);
    assert_eq!(report.failed_stage, Some(CheckStage::Connectivity));
    let offenders: Vec<_> = report.errors.iter().map(|e| e.node_id.clone()).collect();
    assert_eq!(offenders, vec![Some("x".to_string()), Some("y".to_string())]);

    assert_eq!(fx.check_fail_fast(&d).errors.len(), 1);
}

#[test]
fn too_deep_parallel_branches_fail_stage_four() {
    let d = code_graph(
        &["s1", "x1", "y1", "x2", "y2", "x3", "y3", "x4", "y4"],
        &[
            ("t", "s1"),
            ("s1", "x1"),
            ("s1", "y1"),
            ("x1", "x2"),
            ("x1", "y2"),
            ("x2", "x3"),
            ("x2", "y3"),
            ("x3", "x4"),
            ("x3", "y4"),
        ],
    );
    let report = Fixture::new().check(&d);
    assert_eq!(report.failed_stage, Some(CheckStage::ParallelStructure));
    assert_eq!(report.errors[0].code, "S007");
}

#[test]
fn output_behind_timer_is_rejected() {
    let timer = node(
        "tm",
        NodeType::Timer,
        json!({ "timerSettings": { "type": "ONCE", "executionEpochSecond": 1700000000 } }),
    );
    let d = doc(
        vec![timer, output("o", json!({ "x": "1" }))],
        vec![edge("tm", "o")],
    );
    let report = Fixture::new().check(&d);
    assert_eq!(report.failed_stage, Some(CheckStage::OutputCardinality));
    assert_eq!(report.errors[0].code, "S010");
}

#[test]
fn duplicate_node_id_names_both_nodes() {
    let mut first = code("a");
    first.data.name = "Parse".into();
    let mut second = code("a");
    second.data.name = "Format".into();
    let d = doc(vec![trigger("t"), first, second], vec![edge("t", "a")]);

    let report = Fixture::new().check(&d);
    assert_eq!(report.failed_stage, Some(CheckStage::Identity));
    assert_eq!(report.errors[0].code, "I002");
    assert!(report.errors[0].message.contains("Parse"));
    assert!(report.errors[0].message.contains("Format"));
}

#[test]
fn dangling_edge_fails_identity() {
    let mut d = code_graph(&["a"], &[("t", "a")]);
    d.edges.push(edge("a", "ghost"));
    let report = Fixture::new().check(&d);
    assert_eq!(report.failed_stage, Some(CheckStage::Identity));
    assert_eq!(report.errors[0].code, "I005");
    assert_eq!(report.errors[0].edge_id.as_deref(), Some("e_a_ghost"));
}

#[test]
fn connection_gate() {
    let fx = Fixture::new();
    let d = code_graph(&["a", "b"], &[("t", "a"), ("a", "b")]);

    assert!(check_connection(&d.nodes, &d.edges, &edge("t", "b"), &fx.limits).is_ok());

    let back = check_connection(&d.nodes, &d.edges, &edge("b", "a"), &fx.limits).unwrap_err();
    assert_eq!(back.code, "S004");
    assert_eq!(back.edge_id.as_deref(), Some("e_b_a"));

    let own = check_connection(&d.nodes, &d.edges, &edge("a", "a"), &fx.limits).unwrap_err();
    assert_eq!(own.code, "S004");

    let unknown = WorkflowEdge {
        target: "ghost".into(),
        ..edge("a", "b")
    };
    assert_eq!(
        check_connection(&d.nodes, &d.edges, &unknown, &fx.limits)
            .unwrap_err()
            .code,
        "I005"
    );
}
