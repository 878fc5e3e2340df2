//! FHIR REST transport over `reqwest`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;

use super::interceptor::{self, ClientInterceptor};
use super::TerminologyTransport;
use crate::config::ServerConfig;
use crate::error::{Error, Result};
use crate::parameters::OperationRequest;

const FHIR_JSON: &str = "application/fhir+json";

/// Connect timeout used unless configured otherwise.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(120);

/// Talks to one FHIR terminology server.
///
/// Cloning is cheap; the underlying connection pool is shared.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    interceptors: Vec<Arc<dyn ClientInterceptor>>,
}

impl HttpTransport {
    /// Create a transport for `base_url` with the default connect timeout.
    ///
    /// Trailing slashes are trimmed from `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_connect_timeout(base_url, DEFAULT_CONNECT_TIMEOUT)
    }

    pub fn with_connect_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().connect_timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            interceptors: Vec::new(),
        })
    }

    /// Build a transport from a server section, registering its authorization
    /// interceptor if one is configured.
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let mut transport = Self::with_connect_timeout(
            &config.base_url,
            Duration::from_secs(config.connect_timeout_seconds),
        )?;
        if let Some(authorization) = &config.authorization {
            transport = transport.with_interceptor(interceptor::from_authorization(authorization)?);
        }
        Ok(transport)
    }

    /// Register an interceptor. Interceptors run in registration order.
    pub fn with_interceptor(mut self, interceptor: Arc<dyn ClientInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    async fn intercept(&self, mut request: RequestBuilder) -> Result<RequestBuilder> {
        for interceptor in &self.interceptors {
            request = interceptor.intercept_request(request).await?;
        }
        Ok(request)
    }

    async fn read_json(&self, response: Response, target: &str) -> Result<Value> {
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes);
            return Err(classify_failure(status, target, &body));
        }

        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl TerminologyTransport for HttpTransport {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn invoke(&self, request: &OperationRequest) -> Result<Value> {
        let url = format!(
            "{}/{}/${}",
            self.base_url, request.resource_type, request.operation_name
        );
        tracing::debug!(
            url = %url,
            parameters = ?request.parameters.names(),
            "Invoking terminology operation"
        );

        let builder = self
            .client
            .post(&url)
            .header(ACCEPT, FHIR_JSON)
            .header(CONTENT_TYPE, FHIR_JSON)
            .body(serde_json::to_vec(&request.parameters)?);
        let response = self.intercept(builder).await?.send().await.map_err(|e| {
            Error::Transport(format!("Request to {url} failed: {e}"))
        })?;

        self.read_json(response, &url).await
    }

    async fn search(&self, resource_type: &str, url: &str) -> Result<Vec<Value>> {
        let target = format!(
            "{}/{}?url={}",
            self.base_url,
            resource_type,
            urlencoding::encode(url)
        );
        tracing::debug!(url = %target, "Searching terminology server");

        let builder = self.client.get(&target).header(ACCEPT, FHIR_JSON);
        let response = self.intercept(builder).await?.send().await.map_err(|e| {
            Error::Transport(format!("Request to {target} failed: {e}"))
        })?;

        let bundle = self.read_json(response, &target).await?;
        Ok(bundle_resources(&bundle))
    }
}

/// Map a non-success status onto the error taxonomy callers act on.
fn classify_failure(status: StatusCode, target: &str, body: &str) -> Error {
    let detail = outcome_message(body).unwrap_or_else(|| body.trim().to_string());
    let message = format!(
        "HTTP {} {}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown"),
        detail
    );

    match status {
        StatusCode::NOT_FOUND | StatusCode::GONE => {
            Error::ResourceNotFound(format!("{target} ({message})"))
        }
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => Error::InvalidRequest(message),
        _ => Error::Transport(message),
    }
}

/// First human-readable text of an `OperationOutcome` body, if the body is one.
fn outcome_message(body: &str) -> Option<String> {
    let outcome: Value = serde_json::from_str(body).ok()?;
    if outcome.get("resourceType").and_then(|v| v.as_str()) != Some("OperationOutcome") {
        return None;
    }
    outcome
        .get("issue")?
        .as_array()?
        .iter()
        .find_map(|issue| {
            issue
                .get("diagnostics")
                .or_else(|| issue.get("details").and_then(|d| d.get("text")))
                .and_then(|v| v.as_str())
        })
        .map(str::to_string)
}

/// `Bundle.entry[].resource`, skipping entries without one.
fn bundle_resources(bundle: &Value) -> Vec<Value> {
    bundle
        .get("entry")
        .and_then(|e| e.as_array())
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| entry.get("resource").cloned())
                .collect()
        })
        .unwrap_or_default()
}
