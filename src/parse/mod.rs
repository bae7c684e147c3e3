//! Parse phase: JSON → document types + graph construction.

pub mod graph;
pub mod types;

pub use graph::WorkflowGraph;
pub use types::*;

use crate::error::WorkflowError;

/// Deserialize a workflow JSON string into a `WorkflowDocument`.
pub fn parse(json: &str) -> Result<WorkflowDocument, Vec<WorkflowError>> {
    serde_json::from_str::<WorkflowDocument>(json).map_err(|e| {
        vec![WorkflowError::parse(
            "P001",
            format!("Failed to parse workflow JSON: {}", e),
        )]
    })
}

/// Parse JSON and build the graph in one step.
pub fn parse_and_build(json: &str) -> Result<(WorkflowDocument, WorkflowGraph), Vec<WorkflowError>> {
    let document = parse(json)?;
    let graph = WorkflowGraph::build(&document);
    Ok((document, graph))
}
