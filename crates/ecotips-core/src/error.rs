//! Error types for the EcoTips core library
//!
//! Every failure that crosses the library boundary is one of a small set of
//! kinds. Each carries an English `Display` for logs, a localized message for
//! end users, and the raw triggering detail for diagnostics.

use crate::types::{MetricField, ProviderKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main error type for EcoTips operations
#[derive(Error, Debug)]
pub enum Error {
    /// Extraction could not populate all six metrics
    #[error("Missing required fields: input must contain electricity, water, temperature, humidity, weather and people")]
    MissingFields {
        /// Fields that were actually unset, kept for diagnostics only
        missing: Vec<MetricField>,
    },

    /// Credential absent or incomplete
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Provider rejected the credential
    #[error("Authentication failed for {provider}: {detail}")]
    Authentication { provider: ProviderKind, detail: String },

    /// Provider signaled throttling
    #[error("Rate limit exceeded for {provider}: {detail}")]
    RateLimit { provider: ProviderKind, detail: String },

    /// Provider answered without the expected content structure
    #[error("Unexpected response format from {provider}: {detail}")]
    UnexpectedFormat { provider: ProviderKind, detail: String },

    /// Network failure or any other provider error
    #[error("{message}")]
    Transport {
        message: String,
        /// HTTP status reported by the provider, if any
        status_code: Option<u16>,
        #[source]
        source: Option<anyhow::Error>,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Externally visible error category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingFields,
    Configuration,
    Authentication,
    RateLimit,
    UnexpectedFormat,
    TransportOrUnknown,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::MissingFields => write!(f, "missing_fields"),
            ErrorKind::Configuration => write!(f, "configuration"),
            ErrorKind::Authentication => write!(f, "authentication"),
            ErrorKind::RateLimit => write!(f, "rate_limit"),
            ErrorKind::UnexpectedFormat => write!(f, "unexpected_format"),
            ErrorKind::TransportOrUnknown => write!(f, "transport_or_unknown"),
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a transport error without an underlying source
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            status_code: None,
            source: None,
        }
    }

    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingFields { .. } => ErrorKind::MissingFields,
            Error::Configuration { .. } => ErrorKind::Configuration,
            Error::Authentication { .. } => ErrorKind::Authentication,
            Error::RateLimit { .. } => ErrorKind::RateLimit,
            Error::UnexpectedFormat { .. } => ErrorKind::UnexpectedFormat,
            Error::Transport { .. } => ErrorKind::TransportOrUnknown,
        }
    }

    /// Message shown to the end user
    pub fn localized_message(&self) -> String {
        match self {
            Error::MissingFields { .. } => {
                let mut message =
                    String::from("データの形式が正しくありません。以下の情報を含めてください：");
                for field in MetricField::ALL {
                    message.push_str("\n- ");
                    message.push_str(field.hint());
                }
                message
            }
            Error::Configuration { .. } => "APIの設定が必要です".to_string(),
            Error::Authentication { .. } => "APIキーが無効です".to_string(),
            Error::RateLimit { .. } => {
                "APIの利用制限に達しました。しばらく時間をおいて再度お試しください。".to_string()
            }
            Error::UnexpectedFormat { provider, .. } => {
                format!("{} APIから予期しない形式の応答が返されました", provider.display_name())
            }
            Error::Transport { message, .. } => {
                if message.is_empty() {
                    "エラーが発生しました".to_string()
                } else {
                    message.clone()
                }
            }
        }
    }

    /// Raw detail that triggered the error, for diagnostics
    pub fn detail(&self) -> Option<String> {
        match self {
            Error::MissingFields { missing } => Some(format!(
                "unset: {}",
                missing
                    .iter()
                    .map(|field| field.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
            Error::Configuration { message } => Some(message.clone()),
            Error::Authentication { detail, .. }
            | Error::RateLimit { detail, .. }
            | Error::UnexpectedFormat { detail, .. } => Some(detail.clone()),
            Error::Transport { source, message, .. } => match source {
                Some(source) => Some(format!("{:#}", source)),
                None => Some(message.clone()),
            },
        }
    }

    /// HTTP status the web route answers with for this error
    pub fn http_status(&self) -> u16 {
        match self {
            Error::MissingFields { .. } | Error::Configuration { .. } => 400,
            Error::Authentication { .. } => 401,
            Error::RateLimit { .. } => 429,
            Error::UnexpectedFormat { .. } => 500,
            Error::Transport { status_code, .. } => status_code
                .filter(|code| (400..=599).contains(code))
                .unwrap_or(500),
        }
    }

    /// Provider involved in the failure, if any
    pub fn provider(&self) -> Option<ProviderKind> {
        match self {
            Error::Authentication { provider, .. }
            | Error::RateLimit { provider, .. }
            | Error::UnexpectedFormat { provider, .. } => Some(*provider),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport {
            message: err.to_string(),
            status_code: err.status().map(|s| s.as_u16()),
            source: Some(anyhow::Error::new(err)),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Transport {
            message: format!("Failed to decode provider response: {}", err),
            status_code: None,
            source: Some(anyhow::Error::new(err)),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Transport {
            message: err.to_string(),
            status_code: None,
            source: Some(err),
        }
    }
}
