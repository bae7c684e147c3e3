//! WASM entry points for browser use.
//!
//! Both functions take JSON strings and return plain JS values. The built-in
//! node catalog and default limits are used; the entity catalog is passed in
//! by the caller (an empty string means "no entities").

use wasm_bindgen::prelude::*;

use crate::checker::{self, CheckReport};
use crate::config::{CheckOptions, ValidationLimits};
use crate::error::WorkflowError;
use crate::resolve::{self, EntityCatalog, NodeCatalog, UpstreamParams};
use crate::validate::{ValidationEnv, ValidatorRegistry};

/// Check a workflow document. Returns a `CheckReport` object, or
/// `{ status: "errors", errors }` when an input fails to parse.
#[wasm_bindgen]
pub fn check_workflow(document_json: &str, entities_json: &str, validate_first: bool) -> JsValue {
    let result = check_workflow_inner(document_json, entities_json, validate_first);
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

fn check_workflow_inner(
    document_json: &str,
    entities_json: &str,
    validate_first: bool,
) -> CallResult<CheckReport> {
    let document = match crate::parse::parse(document_json) {
        Ok(d) => d,
        Err(errors) => return CallResult::Errors(errors),
    };
    let entities = match load_entities(entities_json) {
        Ok(e) => e,
        Err(error) => return CallResult::Errors(vec![error]),
    };

    let catalog = NodeCatalog::builtin();
    let limits = ValidationLimits::default();
    let registry = ValidatorRegistry::with_builtin_rules(&catalog);
    let env = ValidationEnv {
        catalog: &catalog,
        entities: &entities,
        limits: &limits,
    };
    let options = CheckOptions { validate_first };

    CallResult::Success(checker::check_workflow(&document, &registry, env, options))
}

/// Parameters `node_id` may reference, grouped by upstream node.
#[wasm_bindgen]
pub fn upstream_params(document_json: &str, node_id: &str, entities_json: &str) -> JsValue {
    let result = upstream_params_inner(document_json, node_id, entities_json);
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

fn upstream_params_inner(
    document_json: &str,
    node_id: &str,
    entities_json: &str,
) -> CallResult<UpstreamParams> {
    let document = match crate::parse::parse(document_json) {
        Ok(d) => d,
        Err(errors) => return CallResult::Errors(errors),
    };
    let entities = match load_entities(entities_json) {
        Ok(e) => e,
        Err(error) => return CallResult::Errors(vec![error]),
    };

    CallResult::Success(resolve::upstream_params(
        node_id,
        &document.nodes,
        &document.edges,
        &NodeCatalog::builtin(),
        &entities,
    ))
}

fn load_entities(json: &str) -> Result<EntityCatalog, WorkflowError> {
    if json.trim().is_empty() {
        return Ok(EntityCatalog::new());
    }
    EntityCatalog::from_json(json).map_err(|e| WorkflowError::parse("P002", e.to_string()))
}

// ---------------------------------------------------------------------------
// DTOs for serialization to JS
// ---------------------------------------------------------------------------

#[derive(Debug, serde::Serialize)]
#[serde(tag = "status", content = "result")]
enum CallResult<T> {
    #[serde(rename = "success")]
    Success(T),
    #[serde(rename = "errors")]
    Errors(Vec<WorkflowError>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::WorkflowState;

    const DOC: &str = r##"{
        "nodes": [
            { "id": "t", "type": "trigger", "data": { "name": "Start", "parameters": {
                "entityConfigs": [{ "name": "count", "type": "LONG" }] } } },
            { "id": "o", "type": "output", "data": { "name": "Done", "parameters": {
                "outputVariables": { "result": "#{properties.t['count']}" } } } }
        ],
        "edges": [{ "id": "e1", "source": "t", "target": "o" }]
    }"##;

    #[test]
    fn check_runs_end_to_end() {
        match check_workflow_inner(DOC, "", false) {
            CallResult::Success(report) => assert_eq!(report.state, WorkflowState::Valid),
            CallResult::Errors(errors) => panic!("unexpected errors: {errors:?}"),
        }
    }

    #[test]
    fn malformed_entities_are_reported() {
        match check_workflow_inner(DOC, "{ nope", false) {
            CallResult::Errors(errors) => assert_eq!(errors[0].code, "P002"),
            CallResult::Success(_) => panic!("expected a parse error"),
        }
    }

    #[test]
    fn upstream_of_output_lists_trigger_arguments() {
        match upstream_params_inner(DOC, "o", "") {
            CallResult::Success(params) => {
                assert_eq!(params.flat.len(), 1);
                assert_eq!(params.flat[0].param.key, "#{properties.t['count']}");
            }
            CallResult::Errors(errors) => panic!("unexpected errors: {errors:?}"),
        }
    }
}
