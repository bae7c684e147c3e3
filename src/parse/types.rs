//! Workflow document types.
//!
//! These types are the serde target for the editor's workflow JSON
//! (`{ nodes, edges, viewport }`). The engine only reads them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// TOP-LEVEL DOCUMENT
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDocument {
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
    #[serde(default)]
    pub edges: Vec<WorkflowEdge>,
    #[serde(default)]
    pub viewport: Option<Viewport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub source_handle: Option<String>,
    #[serde(default)]
    pub target_handle: Option<String>,
}

impl WorkflowEdge {
    /// Handle name used to group fan-out; unnamed handles share `"source"`.
    pub fn handle(&self) -> &str {
        self.source_handle.as_deref().unwrap_or("source")
    }
}

// =============================================================================
// NODES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default)]
    pub data: NodeData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub remark: Option<String>,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl WorkflowNode {
    pub fn new(id: impl Into<String>, node_type: NodeType, name: impl Into<String>) -> Self {
        WorkflowNode {
            id: id.into(),
            node_type,
            position: None,
            data: NodeData {
                name: name.into(),
                remark: None,
                parameters: Map::new(),
            },
        }
    }

    /// Display label: the user-given name, falling back to the id.
    pub fn label(&self) -> &str {
        if self.data.name.trim().is_empty() {
            &self.id
        } else {
            &self.data.name
        }
    }

    pub fn parameter(&self, key: &str) -> Option<&Value> {
        self.data.parameters.get(key)
    }

    pub fn category(&self) -> NodeCategory {
        self.node_type.category()
    }

    pub fn is_entry(&self) -> bool {
        self.category() == NodeCategory::Entry
    }

    pub fn is_output(&self) -> bool {
        self.category() == NodeCategory::Output
    }
}

// =============================================================================
// NODE TYPE TAGS (closed set)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    // Entry
    Trigger,
    Timer,
    Listener,
    Mqtt,
    Httpin,

    // Control
    Ifelse,

    // Action
    Code,
    Service,
    Assigner,
    Select,

    // External
    Email,
    Webhook,
    Http,

    // Output
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeCategory {
    Entry,
    Control,
    Action,
    External,
    Output,
}

impl NodeType {
    pub const ALL: [NodeType; 14] = [
        NodeType::Trigger,
        NodeType::Timer,
        NodeType::Listener,
        NodeType::Mqtt,
        NodeType::Httpin,
        NodeType::Ifelse,
        NodeType::Code,
        NodeType::Service,
        NodeType::Assigner,
        NodeType::Select,
        NodeType::Email,
        NodeType::Webhook,
        NodeType::Http,
        NodeType::Output,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Trigger => "trigger",
            NodeType::Timer => "timer",
            NodeType::Listener => "listener",
            NodeType::Mqtt => "mqtt",
            NodeType::Httpin => "httpin",
            NodeType::Ifelse => "ifelse",
            NodeType::Code => "code",
            NodeType::Service => "service",
            NodeType::Assigner => "assigner",
            NodeType::Select => "select",
            NodeType::Email => "email",
            NodeType::Webhook => "webhook",
            NodeType::Http => "http",
            NodeType::Output => "output",
        }
    }

    pub fn category(&self) -> NodeCategory {
        match self {
            NodeType::Trigger
            | NodeType::Timer
            | NodeType::Listener
            | NodeType::Mqtt
            | NodeType::Httpin => NodeCategory::Entry,
            NodeType::Ifelse => NodeCategory::Control,
            NodeType::Code | NodeType::Service | NodeType::Assigner | NodeType::Select => {
                NodeCategory::Action
            }
            NodeType::Email | NodeType::Webhook | NodeType::Http => NodeCategory::External,
            NodeType::Output => NodeCategory::Output,
        }
    }

    /// Only a manually triggered workflow can hand a result back to its caller.
    pub fn permits_output_node(&self) -> bool {
        matches!(self, NodeType::Trigger)
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
