//! HTTP dispatcher using reqwest

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::HeaderMap, Client, Method};

use crate::cases::{Headers, Request};
use crate::common::{Error, Result};

use super::{ActualResponse, DispatchError, RequestDispatcher};

/// Dispatcher sending requests to a base address with a shared client
pub struct ReqwestDispatcher {
    client: Client,
    base_url: String,
}

impl ReqwestDispatcher {
    /// Create a dispatcher with its own client
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("casetest/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self::with_client(client, base_url))
    }

    /// Create a dispatcher around an existing client
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

/// Join the base address and a case path with exactly one `/` between them
fn join_url(base: &str, path: &str) -> String {
    if path.is_empty() {
        return base.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Parse a case method; an empty method means GET
fn parse_method(method: &str) -> std::result::Result<Method, DispatchError> {
    if method.is_empty() {
        return Ok(Method::GET);
    }
    Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|_| DispatchError::InvalidMethod(method.to_string()))
}

/// Collect response headers into the case header shape
fn collect_headers(map: &HeaderMap) -> Headers {
    let mut headers = Headers::new();
    for (name, value) in map {
        headers
            .entry(name.as_str().to_string())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    headers
}

#[async_trait]
impl RequestDispatcher for ReqwestDispatcher {
    async fn send(&self, request: &Request) -> std::result::Result<ActualResponse, DispatchError> {
        let method = parse_method(&request.method)?;
        let url = join_url(&self.base_url, &request.path);
        tracing::debug!("{} {}", method, url);

        let mut builder = self.client.request(method, &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        // One value per header name is propagated
        for (name, values) in &request.headers {
            if let Some(value) = values.first() {
                builder = builder.header(name.as_str(), value.as_str());
            }
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(|e| DispatchError::Body(e.to_string()))?
            .to_vec();

        tracing::debug!("Response {} ({} bytes)", status, body.len());
        Ok(ActualResponse {
            status,
            headers,
            body,
        })
    }
}
