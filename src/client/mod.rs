//! Dispatch of built requests to the Algolia REST API.

mod transport;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::{
    AlgoliaError, Result,
    catalog::Catalog,
    common::MemCache,
    config::Config,
    lookup::{Choice, project_choices},
    request::RequestDescriptor,
};

pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};

const APPLICATION_ID_HEADER: &str = "x-algolia-application-id";
const API_KEY_HEADER: &str = "x-algolia-api-key";
const JSON_CONTENT: &str = "application/json";

/// Successful API response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status_code: u16,
    pub body: Value,
}

#[derive(Clone)]
pub struct AlgoliaClient {
    config: Config,
    transport: Arc<dyn Transport>,
    choices: MemCache<String, Vec<Choice>>,
}

impl AlgoliaClient {
    pub fn new(config: Config) -> Self {
        Self::with_transport(config, Arc::new(ReqwestTransport::new()))
    }

    pub fn with_transport(
        config: Config,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let choices = MemCache::new(config.lookup_cache_capacity);
        Self { config, transport, choices }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Attach host, credentials and timeout to a built request.
    pub fn prepare(
        &self,
        request: &RequestDescriptor,
    ) -> HttpRequest {
        let mut headers = request.headers.clone();
        headers.insert(APPLICATION_ID_HEADER.to_string(), self.config.application_id.clone());
        headers.insert(API_KEY_HEADER.to_string(), self.config.api_key.clone());
        headers.insert("accept".to_string(), JSON_CONTENT.to_string());
        if request.body.is_some() {
            headers.insert("content-type".to_string(), JSON_CONTENT.to_string());
        }

        HttpRequest {
            method: request.method,
            url: format!("{}{}", self.config.base_url(), request.path),
            query: request.query.clone(),
            headers,
            body: request.body.clone(),
            timeout: self.config.timeout(),
        }
    }

    /// Send a request; non-2xx statuses become [`AlgoliaError::Api`].
    pub async fn execute(
        &self,
        request: &RequestDescriptor,
    ) -> Result<ApiResponse> {
        debug!(method = %request.method, path = %request.path, "dispatching request");

        let response = self.transport.send(self.prepare(request)).await?;
        if !response.is_success() {
            return Err(AlgoliaError::Api {
                status: response.status,
                body: response.body,
            });
        }

        Ok(ApiResponse {
            status_code: response.status,
            body: parse_body(&response.body),
        })
    }

    /// Choices of a dynamic-choice field, fetched once per client.
    pub async fn load_choices(
        &self,
        catalog: &Catalog,
        name: &str,
    ) -> Result<Vec<Choice>> {
        let key = name.to_string();
        if let Some(choices) = self.choices.get(&key) {
            trace!(lookup = name, "lookup cache hit");
            return Ok(choices);
        }

        let spec = catalog.lookup(name).ok_or_else(|| AlgoliaError::Catalog(format!("unknown lookup '{}'", name)))?;
        let response = self.execute(&spec.request()).await?;
        let choices = project_choices(spec, &response.body)?;
        self.choices.set(key, choices.clone());

        Ok(choices)
    }

    /// Drop the cached choices so the next load re-issues the list call.
    pub fn refresh_choices(
        &self,
        name: &str,
    ) {
        self.choices.remove(&name.to_string());
    }
}

/// Empty bodies become `null`, non-JSON text is kept as a string.
fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}
