//! Workflow node running one Algolia operation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{
    Result,
    catalog::{Catalog, OperationSummary},
    client::AlgoliaClient,
    common::ParameterSet,
    request::{RequestBuilder, RequestDescriptor},
    response,
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AlgoliaNode {
    resource: String,
    operation: String,
    #[serde(default)]
    parameters: ParameterSet,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NodeOutput {
    pub status_code: u16,
    pub body: Value,
}

impl AlgoliaNode {
    pub fn new(
        resource: impl Into<String>,
        operation: impl Into<String>,
        parameters: ParameterSet,
    ) -> Self {
        Self {
            resource: resource.into(),
            operation: operation.into(),
            parameters,
        }
    }

    /// Create a node from its JSON definition.
    pub fn create(params: Value) -> Result<Self> {
        jsonschema::validate(&Self::schema(), &params)?;
        let node = serde_json::from_value::<Self>(params)?;
        Ok(node)
    }

    pub fn schema() -> Value {
        serde_json::json!({
            "type": "object",
            "required": ["resource", "operation"],
            "properties": {
                "resource": {
                    "type": "string",
                    "minLength": 1,
                    "description": "Resource key or display name, e.g. records"
                },
                "operation": {
                    "type": "string",
                    "minLength": 1,
                    "description": "Operation key or display name, e.g. getObject"
                },
                "parameters": {
                    "type": "object",
                    "description": "Field values keyed by field name, collections as nested objects"
                }
            }
        })
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    /// Form description of this node's operation.
    pub fn describe(&self) -> Result<OperationSummary<'static>> {
        Catalog::builtin()?.describe(&self.resource, &self.operation)
    }

    pub fn build(&self) -> Result<RequestDescriptor> {
        RequestBuilder::builtin()?.build(&self.resource, &self.operation, &self.parameters)
    }

    /// Build, send and reshape.
    pub async fn run(
        &self,
        client: &AlgoliaClient,
    ) -> Result<NodeOutput> {
        let (_, operation) = Catalog::builtin()?.operation(&self.resource, &self.operation)?;
        let request = self.build()?;
        let response = client.execute(&request).await?;

        let body = response::apply(operation, &self.parameters, response.body);
        debug!(operation = %operation.name, status = response.status_code, "node finished");

        Ok(NodeOutput {
            status_code: response.status_code,
            body,
        })
    }
}
