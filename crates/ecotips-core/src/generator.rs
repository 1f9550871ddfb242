//! Tip generation entry point
//!
//! [`TipGenerator`] holds the adapter settings and a shared transport, and
//! builds the right provider for each credential it is handed.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, HttpTransport, ReqwestTransport};
use crate::providers::{create_provider, AdapterSettings};
use crate::types::{ObservationRecord, ProviderCredential, TipList};

/// Generates tips through whichever provider a credential names
pub struct TipGenerator {
    settings: AdapterSettings,
    transport: Arc<dyn HttpTransport>,
}

impl TipGenerator {
    pub fn new(settings: AdapterSettings, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            settings,
            transport,
        }
    }

    /// Generator backed by a reqwest client
    pub fn with_reqwest(settings: AdapterSettings, client: &HttpClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(client)?;
        Ok(Self::new(settings, Arc::new(transport)))
    }

    pub fn settings(&self) -> &AdapterSettings {
        &self.settings
    }

    /// Request tips for a record
    ///
    /// A single outbound request at most; failures are never retried.
    pub async fn generate(
        &self,
        record: &ObservationRecord,
        credential: &ProviderCredential,
    ) -> Result<TipList> {
        let provider = create_provider(credential, &self.settings, Arc::clone(&self.transport))?;
        tracing::info!(
            provider = %provider.kind(),
            model = provider.model(),
            "Generating tips"
        );

        match provider.generate_tips(record).await {
            Ok(tips) => {
                tracing::info!(provider = %provider.kind(), count = tips.len(), "Tips generated");
                Ok(tips)
            }
            Err(err) => {
                tracing::warn!(
                    provider = %provider.kind(),
                    kind = %err.kind(),
                    error = %err,
                    "Tip generation failed"
                );
                Err(err)
            }
        }
    }
}

/// Fail with a configuration error when no credential was supplied
pub fn require_credential(credential: Option<ProviderCredential>) -> Result<ProviderCredential> {
    credential.ok_or_else(|| Error::configuration("No provider credential configured"))
}
