//! Error types and handling for the CLI
//!
//! This module provides error types and utilities for handling
//! various failure modes in the CLI application.

use ecotips_core::ErrorKind;
use std::io;
use std::path::PathBuf;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CLI operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error from ecotips-core library
    #[error("{0}")]
    Core(#[from] ecotips_core::Error),

    /// File not found
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Invalid file format
    #[error("Invalid file format for {}: expected {} format", path.display(), expected)]
    InvalidFormat { path: PathBuf, expected: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument combination
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    /// The user declined the confirmation prompt
    #[error("Cancelled")]
    Cancelled,

    /// HTTP server failure
    #[error("Server error: {0}")]
    Server(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Generic error with context
    #[error("{message}")]
    Other { message: String },
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid arguments error
    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::InvalidArgs(message.into())
    }

    /// Create a generic error with message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) => 1,
            Self::Core(core) => match core.kind() {
                ErrorKind::MissingFields => 20,
                ErrorKind::Configuration => 21,
                ErrorKind::Authentication => 22,
                ErrorKind::RateLimit => 23,
                ErrorKind::UnexpectedFormat => 24,
                ErrorKind::TransportOrUnknown => 25,
            },
            Self::FileNotFound { .. } => 3,
            Self::InvalidFormat { .. } => 4,
            Self::Config(_) => 5,
            Self::InvalidArgs(_) => 6,
            Self::Cancelled => 7,
            Self::Server(_) => 10,
            Self::Json(_) => 12,
            Self::Yaml(_) => 13,
            Self::Toml(_) | Self::TomlSerialize(_) => 14,
            Self::Other { .. } => 99,
        }
    }

    /// Check if this error should display usage help
    pub fn should_show_help(&self) -> bool {
        matches!(self, Self::InvalidArgs(_))
    }
}

/// Format an error for display to the user
///
/// Core errors show their localized message; the raw detail follows at
/// verbosity 1 and above.
pub fn format_error(error: &Error, use_color: bool, verbosity: u8) -> String {
    use colored::Colorize;

    let (headline, detail) = match error {
        Error::Core(core) => (
            core.localized_message(),
            core.detail().filter(|_| verbosity > 0),
        ),
        other => (other.to_string(), None),
    };

    let mut message = if use_color {
        format!("{} {}", "Error:".red().bold(), headline)
    } else {
        format!("Error: {}", headline)
    };

    if let Some(detail) = detail {
        let detail = crate::logging::redaction::redact_sensitive(&detail);
        if use_color {
            message.push_str(&format!("\n  {} {}", "detail:".dimmed(), detail.dimmed()));
        } else {
            message.push_str(&format!("\n  detail: {}", detail));
        }
    }

    message
}
