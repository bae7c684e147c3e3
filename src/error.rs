//! Unified error types used across parsing, structural checks and field validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    Parse,
    Structural,
    Identity,
    Field,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Parse => write!(f, "Parse"),
            ErrorKind::Structural => write!(f, "Structural"),
            ErrorKind::Identity => write!(f, "Identity"),
            ErrorKind::Field => write!(f, "Field"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowError {
    pub code: String,
    pub kind: ErrorKind,
    pub message: String,
    pub node_id: Option<String>,
    pub edge_id: Option<String>,
}

impl std::fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.node_id, &self.edge_id) {
            (Some(id), _) => write!(
                f,
                "[{}:{}] {} (node '{}')",
                self.kind, self.code, self.message, id
            ),
            (None, Some(id)) => write!(
                f,
                "[{}:{}] {} (edge '{}')",
                self.kind, self.code, self.message, id
            ),
            (None, None) => write!(f, "[{}:{}] {}", self.kind, self.code, self.message),
        }
    }
}

impl std::error::Error for WorkflowError {}

impl WorkflowError {
    pub fn parse(code: &str, message: impl Into<String>) -> Self {
        WorkflowError {
            code: code.into(),
            kind: ErrorKind::Parse,
            message: message.into(),
            node_id: None,
            edge_id: None,
        }
    }

    pub fn structural(code: &str, message: impl Into<String>, node_id: Option<String>) -> Self {
        WorkflowError {
            code: code.into(),
            kind: ErrorKind::Structural,
            message: message.into(),
            node_id,
            edge_id: None,
        }
    }

    pub fn node_identity(code: &str, message: impl Into<String>, node_id: &str) -> Self {
        WorkflowError {
            code: code.into(),
            kind: ErrorKind::Identity,
            message: message.into(),
            node_id: Some(node_id.to_string()),
            edge_id: None,
        }
    }

    pub fn edge_identity(code: &str, message: impl Into<String>, edge_id: &str) -> Self {
        WorkflowError {
            code: code.into(),
            kind: ErrorKind::Identity,
            message: message.into(),
            node_id: None,
            edge_id: Some(edge_id.to_string()),
        }
    }

    pub fn field(message: impl Into<String>, node_id: &str) -> Self {
        WorkflowError {
            code: "F001".into(),
            kind: ErrorKind::Field,
            message: message.into(),
            node_id: Some(node_id.to_string()),
            edge_id: None,
        }
    }

    /// Attach an edge id to a structural error.
    pub fn with_edge(mut self, edge_id: &str) -> Self {
        self.edge_id = Some(edge_id.to_string());
        self
    }
}

/// Failures while loading catalogs or limits from their JSON form.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("node type '{node_type}' declares field '{field}' twice")]
    DuplicateField { node_type: String, field: String },

    #[error("node type '{node_type}' declares output '{output}' twice")]
    DuplicateOutput { node_type: String, output: String },
}
