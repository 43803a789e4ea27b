//! # algolia-node
//!
//! Declarative Algolia REST operations for workflow nodes.
//!
//! Every Algolia operation is described by data: an HTTP method, a path
//! template, and a table of fields saying where each user-supplied value goes
//! (path, query, body or header). A single request builder interprets that
//! table, so adding an operation never means writing request code.
//!
//! ## Core Features
//!
//! - **Operation Catalog**: ten resources and their operations, embedded as JSON and checked at load
//! - **Pure Request Builder**: `(resource, operation, parameters)` to a request, or a typed error before any I/O
//! - **Round-Trip Recovery**: read the placed parameters back out of a built request
//! - **Response Reshaping**: optional whitelist of top-level response keys
//! - **Pluggable Transport**: `reqwest` by default, swappable for tests
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use algolia_node::{AlgoliaClient, AlgoliaNode, Config, ParameterSet};
//!
//! let node = AlgoliaNode::new(
//!     "records",
//!     "getObject",
//!     ParameterSet::new().with("indexName_string", "products").with("objectID_string", "42"),
//! );
//! let request = node.build()?;
//! let output = node.run(&AlgoliaClient::new(Config::create("algolia.toml")?)).await?;
//! ```

mod catalog;
mod client;
mod common;
mod config;
mod error;
mod lookup;
mod node;
mod request;
mod response;

pub use catalog::{
    Catalog, ChoiceOption, Condition, ConditionOperator, DisplayContext, FieldKind, FieldSpec, HttpMethod, OperationSpec, OperationSummary,
    Placement, ResourceSpec, ResponseReshape, SIMPLIFY_FIELD, Validation,
};
pub use client::{AlgoliaClient, ApiResponse, HttpRequest, HttpResponse, ReqwestTransport, Transport};
pub use common::ParameterSet;
pub use config::Config;
pub use error::AlgoliaError;
pub use lookup::{Choice, LookupSpec, project_choices};
pub use node::{AlgoliaNode, NodeOutput};
pub use request::{RequestBuilder, RequestDescriptor, ResolvedField, build_request, recover_parameters};
pub use response::{SIMPLIFY_FLAGS, reshape, simplify_requested};

/// Result type alias for Algolia node operations.
pub type Result<T> = std::result::Result<T, AlgoliaError>;
