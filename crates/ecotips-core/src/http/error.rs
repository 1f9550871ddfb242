//! HTTP error classification and normalization
//!
//! Normalizes provider-specific error bodies into a uniform shape the
//! provider adapters map onto [`crate::Error`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Classification of a non-success provider response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClassification {
    /// 401/403
    AuthenticationError,
    /// 429
    RateLimitError,
    /// Other 4xx
    ClientError,
    /// 5xx
    ServerError,
    /// Anything else
    Unknown,
}

impl ErrorClassification {
    /// Classify an HTTP status code
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => ErrorClassification::AuthenticationError,
            429 => ErrorClassification::RateLimitError,
            400..=499 => ErrorClassification::ClientError,
            500..=599 => ErrorClassification::ServerError,
            _ => ErrorClassification::Unknown,
        }
    }
}

/// Normalized HTTP error representation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpError {
    /// HTTP status code
    pub status_code: u16,
    /// Classification derived from the status code
    pub classification: ErrorClassification,
    /// Provider-specific error code, type or status
    pub provider_code: Option<String>,
    /// Provider-supplied message, if the body carried one
    pub provider_message: Option<String>,
    /// Raw body text
    pub body: String,
    /// Parsed JSON body, if any
    pub details: Option<Value>,
}

impl HttpError {
    /// Build from a status code and raw body text
    pub fn from_parts(status_code: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let details = serde_json::from_str::<Value>(&body).ok();
        let (provider_code, provider_message) = Self::extract_provider_error(&details);

        Self {
            status_code,
            classification: ErrorClassification::from_status(status_code),
            provider_code,
            provider_message,
            body,
            details,
        }
    }

    /// Extract provider-specific error information
    fn extract_provider_error(details: &Option<Value>) -> (Option<String>, Option<String>) {
        let Some(json) = details else {
            return (None, None);
        };

        let message_of = |value: &Value| {
            value
                .get("message")
                .and_then(|m| m.as_str())
                .map(|s| s.to_string())
        };

        if let Some(error) = json.get("error") {
            // Anthropic: {"type":"error","error":{"type":"...","message":"..."}}
            // OpenAI:    {"error":{"message":"...","type":"...","code":"..."}}
            // Google:    {"error":{"code":401,"message":"...","status":"UNAUTHENTICATED"}}
            if let Some(text) = error.as_str() {
                return (None, Some(text.to_string()));
            }
            let code = error
                .get("status")
                .and_then(|s| s.as_str())
                .or_else(|| error.get("type").and_then(|t| t.as_str()))
                .or_else(|| error.get("code").and_then(|c| c.as_str()))
                .map(|s| s.to_string());
            return (code, message_of(error));
        }

        let code = json
            .get("type")
            .and_then(|t| t.as_str())
            .map(|s| s.to_string());
        (code, message_of(json))
    }

    /// Provider message, or the raw body when there is none
    pub fn message_or_body(&self) -> String {
        match &self.provider_message {
            Some(message) => message.clone(),
            None if !self.body.trim().is_empty() => self.body.trim().to_string(),
            None => format!("HTTP {}", self.status_code),
        }
    }

    /// Whether the provider code equals `code`
    pub fn has_code(&self, code: &str) -> bool {
        self.provider_code.as_deref() == Some(code)
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HTTP Error [{}]: {} (classification: {:?})",
            self.status_code,
            self.message_or_body(),
            self.classification
        )
    }
}

impl std::error::Error for HttpError {}
