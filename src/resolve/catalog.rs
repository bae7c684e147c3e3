//! Node-type and entity catalogs: the read-only configuration the engine is
//! handed once per editing session.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::parse::types::NodeType;

// =============================================================================
// VALUE TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueType {
    String,
    Long,
    Double,
    Boolean,
    Binary,
    Object,
}

impl ValueType {
    /// Parse the upper-case tag used in argument declarations (`"LONG"`).
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "STRING" => Some(ValueType::String),
            "LONG" => Some(ValueType::Long),
            "DOUBLE" => Some(ValueType::Double),
            "BOOLEAN" => Some(ValueType::Boolean),
            "BINARY" => Some(ValueType::Binary),
            "OBJECT" => Some(ValueType::Object),
            _ => None,
        }
    }
}

// =============================================================================
// NODE TYPE SCHEMA
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutputKind {
    Static,
    Url,
    Object,
    ObjectArray,
    Entities,
    ObjectEntities,
}

/// How one logical output of a node type is derived from its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputDescriptor {
    /// Output key for `static`, parameter key for every other kind.
    pub key: String,
    pub kind: OutputKind,
    #[serde(default)]
    pub value_type: Option<ValueType>,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub enum_values: Option<Vec<String>>,
}

impl FieldSchema {
    fn new(name: &str, label: &str) -> Self {
        FieldSchema {
            name: name.into(),
            label: Some(label.into()),
            required: false,
            enum_values: None,
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn one_of(mut self, values: &[&str]) -> Self {
        self.enum_values = Some(values.iter().map(|v| v.to_string()).collect());
        self
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTypeSchema {
    pub node_type: NodeType,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
    #[serde(default)]
    pub outputs: Vec<OutputDescriptor>,
}

#[derive(Debug, Clone, Default)]
pub struct NodeCatalog {
    schemas: HashMap<NodeType, NodeTypeSchema>,
}

impl NodeCatalog {
    pub fn from_schemas(schemas: Vec<NodeTypeSchema>) -> Result<Self, CatalogError> {
        let mut catalog = NodeCatalog::default();
        for schema in schemas {
            let mut fields = HashSet::new();
            for field in &schema.fields {
                if !fields.insert(field.name.as_str()) {
                    return Err(CatalogError::DuplicateField {
                        node_type: schema.node_type.to_string(),
                        field: field.name.clone(),
                    });
                }
            }
            let mut outputs = HashSet::new();
            for output in &schema.outputs {
                if !outputs.insert(output.key.as_str()) {
                    return Err(CatalogError::DuplicateOutput {
                        node_type: schema.node_type.to_string(),
                        output: output.key.clone(),
                    });
                }
            }
            catalog.schemas.insert(schema.node_type, schema);
        }
        Ok(catalog)
    }

    /// Load a JSON array of node-type schemas as served by the catalog service.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let schemas: Vec<NodeTypeSchema> = serde_json::from_str(json)?;
        Self::from_schemas(schemas)
    }

    pub fn builtin() -> Self {
        let mut catalog = NodeCatalog::default();
        for schema in builtin_schemas() {
            catalog.schemas.insert(schema.node_type, schema);
        }
        catalog
    }

    pub fn schema(&self, node_type: NodeType) -> Option<&NodeTypeSchema> {
        self.schemas.get(&node_type)
    }

    pub fn outputs(&self, node_type: NodeType) -> &[OutputDescriptor] {
        self.schema(node_type)
            .map(|s| s.outputs.as_slice())
            .unwrap_or(&[])
    }

    pub fn fields(&self, node_type: NodeType) -> &[FieldSchema] {
        self.schema(node_type)
            .map(|s| s.fields.as_slice())
            .unwrap_or(&[])
    }

    pub fn field(&self, node_type: NodeType, name: &str) -> Option<&FieldSchema> {
        self.fields(node_type).iter().find(|f| f.name == name)
    }

    pub fn field_label<'a>(&'a self, node_type: NodeType, name: &'a str) -> &'a str {
        self.field(node_type, name).map(|f| f.label()).unwrap_or(name)
    }
}

const HTTP_METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"];

fn output(key: &str, kind: OutputKind) -> OutputDescriptor {
    OutputDescriptor {
        key: key.into(),
        kind,
        value_type: None,
        label: None,
    }
}

fn static_output(key: &str, value_type: ValueType) -> OutputDescriptor {
    OutputDescriptor {
        key: key.into(),
        kind: OutputKind::Static,
        value_type: Some(value_type),
        label: None,
    }
}

fn builtin_schemas() -> Vec<NodeTypeSchema> {
    vec![
        NodeTypeSchema {
            node_type: NodeType::Trigger,
            fields: vec![FieldSchema::new("entityConfigs", "Input Arguments").required()],
            outputs: vec![output("entityConfigs", OutputKind::ObjectArray)],
        },
        NodeTypeSchema {
            node_type: NodeType::Timer,
            fields: vec![FieldSchema::new("timerSettings", "Timer Settings").required()],
            outputs: vec![],
        },
        NodeTypeSchema {
            node_type: NodeType::Listener,
            fields: vec![FieldSchema::new("entities", "Listening Entities").required()],
            outputs: vec![output("entities", OutputKind::Entities)],
        },
        NodeTypeSchema {
            node_type: NodeType::Mqtt,
            fields: vec![FieldSchema::new("subscriptionTopic", "Subscription Topic").required()],
            outputs: vec![
                static_output("topic", ValueType::String),
                static_output("payload", ValueType::String),
            ],
        },
        NodeTypeSchema {
            node_type: NodeType::Httpin,
            fields: vec![
                FieldSchema::new("method", "Method").required().one_of(HTTP_METHODS),
                FieldSchema::new("url", "URL").required(),
            ],
            outputs: vec![
                output("url", OutputKind::Url),
                static_output("header", ValueType::Object),
                static_output("body", ValueType::Object),
            ],
        },
        NodeTypeSchema {
            node_type: NodeType::Ifelse,
            fields: vec![FieldSchema::new("choice", "Conditions").required()],
            outputs: vec![],
        },
        NodeTypeSchema {
            node_type: NodeType::Code,
            fields: vec![
                FieldSchema::new("language", "Language")
                    .required()
                    .one_of(&["JAVASCRIPT", "PYTHON", "GROOVY", "MVEL"]),
                FieldSchema::new("expression", "Code").required(),
                FieldSchema::new("inputArguments", "Input Arguments"),
                FieldSchema::new("payload", "Output Variables"),
            ],
            outputs: vec![output("payload", OutputKind::ObjectArray)],
        },
        NodeTypeSchema {
            node_type: NodeType::Service,
            fields: vec![
                FieldSchema::new("serviceEntity", "Service").required(),
                FieldSchema::new("serviceParams", "Service Parameters"),
            ],
            outputs: vec![output("serviceParams", OutputKind::Object)],
        },
        NodeTypeSchema {
            node_type: NodeType::Assigner,
            fields: vec![FieldSchema::new("exchangePayload", "Assignments").required()],
            outputs: vec![output("exchangePayload", OutputKind::ObjectEntities)],
        },
        NodeTypeSchema {
            node_type: NodeType::Select,
            fields: vec![FieldSchema::new("entities", "Entities").required()],
            outputs: vec![output("entities", OutputKind::Entities)],
        },
        NodeTypeSchema {
            node_type: NodeType::Email,
            fields: vec![
                FieldSchema::new("emailConfig", "Sender").required(),
                FieldSchema::new("recipients", "Recipients").required(),
                FieldSchema::new("subject", "Subject").required(),
                FieldSchema::new("content", "Content").required(),
            ],
            outputs: vec![],
        },
        NodeTypeSchema {
            node_type: NodeType::Webhook,
            fields: vec![
                FieldSchema::new("webhookUrl", "Webhook URL").required(),
                FieldSchema::new("secretKey", "Secret Key"),
                FieldSchema::new("inputArguments", "Payload"),
            ],
            outputs: vec![],
        },
        NodeTypeSchema {
            node_type: NodeType::Http,
            fields: vec![
                FieldSchema::new("method", "Method").required().one_of(HTTP_METHODS),
                FieldSchema::new("url", "URL").required(),
                FieldSchema::new("header", "Header"),
                FieldSchema::new("params", "Query Parameters"),
                FieldSchema::new("body", "Body"),
            ],
            outputs: vec![
                static_output("statusCode", ValueType::Long),
                static_output("responseHeaders", ValueType::Object),
                static_output("responseBody", ValueType::String),
            ],
        },
        NodeTypeSchema {
            node_type: NodeType::Output,
            fields: vec![FieldSchema::new("outputVariables", "Output Variables").required()],
            outputs: vec![],
        },
    ]
}

// =============================================================================
// ENTITY CATALOG
// =============================================================================

/// Display and range metadata for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityMeta {
    pub name: String,
    pub value_type: ValueType,
    #[serde(default)]
    pub enum_values: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub min_length: Option<usize>,
    #[serde(default)]
    pub max_length: Option<usize>,
}

impl EntityMeta {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        EntityMeta {
            name: name.into(),
            value_type,
            enum_values: None,
            min: None,
            max: None,
            min_length: None,
            max_length: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityCatalog {
    entities: HashMap<String, EntityMeta>,
}

impl EntityCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON object keyed by entity key.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let entities: HashMap<String, EntityMeta> = serde_json::from_str(json)?;
        Ok(EntityCatalog { entities })
    }

    pub fn insert(&mut self, key: impl Into<String>, meta: EntityMeta) {
        self.entities.insert(key.into(), meta);
    }

    pub fn get(&self, key: &str) -> Option<&EntityMeta> {
        self.entities.get(key)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
