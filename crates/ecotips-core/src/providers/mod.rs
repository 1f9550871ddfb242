//! Provider adapters
//!
//! One [`TipProvider`] implementation per vendor. Each builds its own request
//! shape, sends it through the shared [`HttpTransport`], and normalizes the
//! reply (or the failure) into a [`TipList`] or a classified [`crate::Error`].

pub mod anthropic;
pub mod gemini;
pub mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::http::{HttpResponse, HttpTransport};
use crate::types::{ObservationRecord, ProviderCredential, ProviderKind, TipList};

pub use anthropic::{AnthropicProvider, AnthropicSettings};
pub use gemini::{GeminiProvider, GeminiSettings};
pub use openai::{OpenAIProvider, OpenAISettings};

/// A provider able to turn a record into tips
#[async_trait]
pub trait TipProvider: Send + Sync {
    /// Which vendor this adapter talks to
    fn kind(&self) -> ProviderKind;

    /// Model identifier sent with the request
    fn model(&self) -> &str;

    /// Request tips for a record
    async fn generate_tips(&self, record: &ObservationRecord) -> Result<TipList>;
}

/// Settings for every provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterSettings {
    pub openai: OpenAISettings,
    pub anthropic: AnthropicSettings,
    pub gemini: GeminiSettings,
}

/// Build the adapter for a credential
///
/// Fails with a configuration error, before any network use, when the
/// credential is incomplete for its provider.
pub fn create_provider(
    credential: &ProviderCredential,
    settings: &AdapterSettings,
    transport: Arc<dyn HttpTransport>,
) -> Result<Box<dyn TipProvider>> {
    let provider: Box<dyn TipProvider> = match credential.provider {
        ProviderKind::OpenAI => Box::new(OpenAIProvider::new(
            credential,
            settings.openai.clone(),
            transport,
        )?),
        ProviderKind::Anthropic => Box::new(AnthropicProvider::new(
            credential,
            settings.anthropic.clone(),
            transport,
        )?),
        ProviderKind::Gemini => Box::new(GeminiProvider::new(
            credential,
            settings.gemini.clone(),
            transport,
        )?),
    };
    Ok(provider)
}

/// Validate that an endpoint is an absolute http(s) URL
pub(crate) fn validate_endpoint(kind: ProviderKind, endpoint: &str) -> Result<()> {
    let url = url::Url::parse(endpoint).map_err(|e| {
        Error::configuration(format!(
            "Invalid {} endpoint '{}': {}",
            kind.display_name(),
            endpoint,
            e
        ))
    })?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(Error::configuration(format!(
            "Unsupported scheme '{}' in {} endpoint",
            scheme,
            kind.display_name()
        ))),
    }
}

/// Decode a success body into the provider's typed response
///
/// A body that is not JSON is a transport failure; JSON of the wrong shape is
/// an unexpected format.
pub(crate) fn decode_success<T>(kind: ProviderKind, response: &HttpResponse) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let value: Value = response.json()?;
    serde_json::from_value(value).map_err(|e| Error::UnexpectedFormat {
        provider: kind,
        detail: e.to_string(),
    })
}
