//! EcoTips Core - Household metric extraction and eco-tip generation
//!
//! This crate turns a short free-text report of household readings into a
//! structured record, then asks a language model provider for energy-saving
//! tips based on it.
//!
//! # Main Components
//!
//! - **Field Extraction**: Pull the six metrics out of Japanese free text
//! - **Prompting**: Render the fixed advisor prompt for a record
//! - **Provider Adapters**: OpenAI, Anthropic and Gemini (Vertex AI) clients
//! - **Post-processing**: Normalize raw model text into at most ten tips
//! - **Error Handling**: Classified errors with localized user messages
//!
//! # Example
//!
//! ```no_run
//! use ecotips_core::{extract, generate_tips, ProviderCredential, ProviderKind, Result};
//!
//! async fn example() -> Result<()> {
//!     let record = extract("電力: 10kWh\n水: 200L\n気温: 25℃\n湿度: 60%\n天気: 晴れ\n人数: 2人")?;
//!     let credential = ProviderCredential::new(ProviderKind::OpenAI, "sk-...");
//!     for tip in generate_tips(&record, &credential).await? {
//!         println!("{}", tip);
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod extract;
pub mod generator;
pub mod http;
pub mod prompt;
pub mod providers;
pub mod tips;
pub mod types;

// Re-export main types for convenience
pub use error::{Error, ErrorKind, Result};
pub use extract::{extract, extract_at, extract_with, ExtractOptions};
pub use generator::{require_credential, TipGenerator};
pub use http::{HttpClientConfig, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
pub use providers::{create_provider, AdapterSettings, TipProvider};
pub use tips::{NumberingPolicy, PostProcessOverrides, TipPostProcessor};
pub use types::{
    EcoMetrics, MetricField, ObservationRecord, ProviderCredential, ProviderKind, TipList,
    MAX_TIPS,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Generate tips with default settings over a fresh reqwest client
pub async fn generate_tips(
    record: &ObservationRecord,
    credential: &ProviderCredential,
) -> Result<TipList> {
    let generator = TipGenerator::with_reqwest(AdapterSettings::default(), &HttpClientConfig::default())?;
    generator.generate(record, credential).await
}
