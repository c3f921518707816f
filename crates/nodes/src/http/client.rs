//! `reqwest`-backed transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use super::{HttpRequest, HttpTransport, Method};
use crate::NodeError;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest slice of an error body copied into a [`NodeError::Transport`].
const ERROR_BODY_SNIPPET: usize = 200;

/// Transport that sends requests with a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// # Errors
    /// [`NodeError::Transport`] if the TLS backend cannot be initialised.
    pub fn new(timeout: Duration) -> Result<Self, NodeError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NodeError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Wrap an existing client, e.g. one shared with other components.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<Value, NodeError> {
        debug!(method = %request.method, url = %request.url, "sending request");

        let mut builder = self.client.request(request.method.into(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| NodeError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| NodeError::Transport(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            return Err(NodeError::Transport(format!(
                "HTTP {}: {}",
                status,
                snippet(&text)
            )));
        }

        Ok(decode_body(&text))
    }
}

/// Empty bodies become `{}`; non-JSON bodies are returned as a JSON string.
fn decode_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return json!({});
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

fn snippet(text: &str) -> String {
    if text.chars().count() > ERROR_BODY_SNIPPET {
        let head: String = text.chars().take(ERROR_BODY_SNIPPET).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}
