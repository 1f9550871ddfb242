//! Authentication handling for provider APIs
//!
//! Supports the two schemes the providers need:
//! - Bearer tokens (OpenAI, Gemini on Vertex AI)
//! - API keys in headers (Anthropic)

use crate::types::{ProviderCredential, ProviderKind};
use crate::Result;
use std::collections::HashMap;

/// Anthropic API version header value
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Trait for handling provider-specific authentication
pub trait AuthHandler: Send + Sync {
    /// Apply authentication to request headers
    fn apply_auth(&self, headers: &mut HashMap<String, String>) -> Result<()>;

    /// Validate that required credentials are available
    fn validate_credentials(&self) -> Result<()>;
}

/// Bearer token authentication (`Authorization: Bearer ...`)
#[derive(Clone)]
pub struct BearerAuth {
    provider: ProviderKind,
    token: String,
}

impl BearerAuth {
    pub fn new(provider: ProviderKind, token: impl Into<String>) -> Self {
        Self {
            provider,
            token: token.into(),
        }
    }
}

impl AuthHandler for BearerAuth {
    fn apply_auth(&self, headers: &mut HashMap<String, String>) -> Result<()> {
        self.validate_credentials()?;
        headers.insert(
            "Authorization".to_string(),
            format!("Bearer {}", self.token.trim()),
        );
        Ok(())
    }

    fn validate_credentials(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(crate::Error::configuration(format!(
                "{} API key not configured",
                self.provider.display_name()
            )));
        }
        Ok(())
    }
}

/// Anthropic authentication handler (x-api-key header)
#[derive(Clone)]
pub struct AnthropicAuth {
    api_key: String,
}

impl AnthropicAuth {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }
}

impl AuthHandler for AnthropicAuth {
    fn apply_auth(&self, headers: &mut HashMap<String, String>) -> Result<()> {
        self.validate_credentials()?;
        headers.insert("x-api-key".to_string(), self.api_key.trim().to_string());
        headers.insert(
            "anthropic-version".to_string(),
            ANTHROPIC_VERSION.to_string(),
        );
        Ok(())
    }

    fn validate_credentials(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(crate::Error::configuration(
                "Anthropic API key not configured",
            ));
        }
        Ok(())
    }
}

/// Factory for creating the auth handler a credential needs
pub fn create_auth_handler(credential: &ProviderCredential) -> Box<dyn AuthHandler> {
    match credential.provider {
        ProviderKind::OpenAI | ProviderKind::Gemini => {
            Box::new(BearerAuth::new(credential.provider, credential.api_key.clone()))
        }
        ProviderKind::Anthropic => Box::new(AnthropicAuth::new(credential.api_key.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_auth() {
        let credential = ProviderCredential::new(ProviderKind::OpenAI, "test-key-123");
        let auth = create_auth_handler(&credential);
        let mut headers = HashMap::new();

        auth.apply_auth(&mut headers).unwrap();

        assert_eq!(headers.get("Authorization").unwrap(), "Bearer test-key-123");
    }

    #[test]
    fn test_anthropic_auth() {
        let credential = ProviderCredential::new(ProviderKind::Anthropic, "test-key-456");
        let auth = create_auth_handler(&credential);
        let mut headers = HashMap::new();

        auth.apply_auth(&mut headers).unwrap();

        assert_eq!(headers.get("x-api-key").unwrap(), "test-key-456");
        assert_eq!(headers.get("anthropic-version").unwrap(), "2023-06-01");
    }

    #[test]
    fn test_missing_api_key() {
        let auth = BearerAuth::new(ProviderKind::Gemini, "   ");
        let mut headers = HashMap::new();

        let result = auth.apply_auth(&mut headers);

        assert!(result.is_err(), "Expected auth to fail with blank API key");
        let error_message = result.unwrap_err().to_string();
        assert!(
            error_message.contains("not configured"),
            "Expected error message to mention missing key, got: {}",
            error_message
        );
        assert!(headers.is_empty());
    }
}
