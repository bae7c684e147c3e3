//! Tunable limits for structural and generic field validation.

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// Numeric limits applied by the checker. Every field has a default, so a
/// partial JSON object only overrides what it names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationLimits {
    /// Smallest node count a savable workflow may have.
    pub min_nodes: usize,
    /// Deepest allowed nesting of parallel branches.
    pub max_parallel_depth: usize,
    /// Most outgoing edges a single source handle may fan out to.
    pub max_parallel_width: usize,
    pub name_max_len: usize,
    pub remark_max_len: usize,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        ValidationLimits {
            min_nodes: 2,
            max_parallel_depth: 3,
            max_parallel_width: 10,
            name_max_len: 50,
            remark_max_len: 1000,
        }
    }
}

impl ValidationLimits {
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Per-call switches for a checker or validator pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckOptions {
    /// Stop at the first failure and surface only that message.
    pub validate_first: bool,
}

impl CheckOptions {
    pub fn fail_fast() -> Self {
        CheckOptions {
            validate_first: true,
        }
    }
}
