//! Outbound HTTP transport
//!
//! Provider adapters talk to the network only through [`HttpTransport`], so
//! tests can substitute a recording mock for the reqwest-backed client.

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use crate::Result;

/// Configuration for the HTTP client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpClientConfig {
    /// Request timeout in seconds; `None` waits indefinitely
    pub timeout_secs: Option<u64>,
    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            user_agent: format!("ecotips/{}", crate::VERSION),
        }
    }
}

/// A JSON POST request ready to send
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Value,
}

impl HttpRequest {
    pub fn new(url: impl Into<String>, body: Value) -> Self {
        Self {
            url: url.into(),
            headers: HashMap::new(),
            body,
        }
    }
}

/// Status and raw body of a provider response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON
    pub fn json(&self) -> Result<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Sends a single JSON request and returns the response, whatever its status
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn post_json(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// Production transport backed by reqwest
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: ReqwestClient,
}

impl ReqwestTransport {
    /// Create a transport from configuration
    pub fn new(config: &HttpClientConfig) -> Result<Self> {
        let mut builder = ReqwestClient::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let client = builder.build().map_err(|e| crate::Error::Transport {
            message: format!("Failed to create HTTP client: {}", e),
            status_code: None,
            source: Some(anyhow::Error::new(e)),
        })?;

        Ok(Self { client })
    }

    /// Create with default configuration
    pub fn with_default_config() -> Result<Self> {
        Self::new(&HttpClientConfig::default())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_json(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = self.client.post(&request.url).json(&request.body);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        tracing::debug!(status, bytes = body.len(), "Received provider response");
        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = HttpClientConfig::default();
        assert_eq!(config.timeout_secs, None);
        assert!(config.user_agent.starts_with("ecotips/"));
    }

    #[test]
    fn test_response_success_range() {
        assert!(HttpResponse::new(200, "{}").is_success());
        assert!(!HttpResponse::new(401, "{}").is_success());
        assert!(HttpResponse::new(500, "not json").json().is_err());
    }

    #[test]
    fn test_transport_builds_with_timeout() {
        let config = HttpClientConfig {
            timeout_secs: Some(5),
            ..Default::default()
        };
        assert!(ReqwestTransport::new(&config).is_ok());
    }
}
