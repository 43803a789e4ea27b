use std::{collections::BTreeMap, time::Duration};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, InvalidHeaderName, InvalidHeaderValue};
use serde_json::Value;

use crate::{AlgoliaError, HttpMethod, Result};

/// Fully resolved HTTP call handed to a [`Transport`].
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    /// absolute url, query string excluded
    pub url: String,
    pub query: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// raw response text
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends HTTP calls. Swapped out in tests.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        request: HttpRequest,
    ) -> Result<HttpResponse>;
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn build(
        &self,
        request: HttpRequest,
    ) -> Result<reqwest::RequestBuilder> {
        let mut headers = HeaderMap::new();
        for (key, value) in &request.headers {
            headers.insert(
                key.parse::<HeaderName>().map_err(|err: InvalidHeaderName| AlgoliaError::Http(err.to_string()))?,
                value.parse::<HeaderValue>().map_err(|err: InvalidHeaderValue| AlgoliaError::Http(err.to_string()))?,
            );
        }

        let method = request.method.as_ref().parse::<reqwest::Method>().map_err(|err| AlgoliaError::Http(err.to_string()))?;
        let mut builder = self.client.request(method, &request.url).headers(headers).timeout(request.timeout);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.body(serde_json::to_vec(body)?);
        }

        Ok(builder)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        request: HttpRequest,
    ) -> Result<HttpResponse> {
        let res = self.build(request)?.send().await?;
        let status = res.status().as_u16();
        let body = res.text().await?;

        Ok(HttpResponse { status, body })
    }
}
