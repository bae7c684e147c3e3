//! Validation and parameter-resolution engine for node/edge workflow graphs.
//!
//! Every operation is a pure function of a document snapshot plus the
//! node-type and entity catalogs. The only state kept across calls is the
//! per-node part of [`validate::ValidatorRegistry`].

pub mod checker;
pub mod config;
pub mod error;
pub mod parallel;
pub mod parse;
pub mod reference;
pub mod resolve;
pub mod traverse;
pub mod validate;
pub mod wasm;

pub use checker::{CheckReport, CheckStage, WorkflowState, check_connection, check_workflow};
pub use config::{CheckOptions, ValidationLimits};
pub use error::{CatalogError, ErrorKind, WorkflowError};
