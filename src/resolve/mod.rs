//! Parameter resolution: which upstream outputs a node may reference.

pub mod catalog;
pub mod params;

pub use catalog::{
    EntityCatalog, EntityMeta, FieldSchema, NodeCatalog, NodeTypeSchema, OutputDescriptor,
    OutputKind, ValueType,
};
pub use params::{
    FlatParam, ParamGroup, UpstreamParam, UpstreamParams, is_empty_value, node_output_params,
    upstream_params,
};
