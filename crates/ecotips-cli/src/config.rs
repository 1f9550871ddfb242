//! Configuration management for the CLI
//!
//! This module handles loading configuration from:
//! - Default values
//! - Configuration files (YAML/JSON/TOML)
//! - The location given by `--config` or `ECOTIPS_CONFIG`

use crate::error::{Error, Result};
use ecotips_core::{AdapterSettings, HttpClientConfig, ProviderKind, MAX_TIPS};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Directory name under the user config dir
pub const APP_DIR: &str = "ecotips";

/// Default listen address for `serve`
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Provider used when a credential does not name one
    pub default_provider: Option<ProviderKind>,

    /// Per-provider adapter settings
    pub providers: AdapterSettings,

    /// Outbound HTTP settings
    pub http: HttpClientConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingSection,

    /// HTTP server settings
    pub server: ServerConfig,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Show progress indicators
    pub progress: bool,

    /// Ask before sending readings to a provider
    pub confirm: bool,
}

/// Logging settings from the configuration file
///
/// Unset fields leave the verbosity and environment defaults in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level or filter directive
    pub level: Option<String>,

    /// Log format (compact, full, json)
    pub format: Option<String>,

    /// Log file path
    pub file: Option<PathBuf>,
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            progress: true,
            confirm: true,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

/// On-disk configuration format, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Json,
    Yaml,
    Toml,
}

impl FileFormat {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            Some("toml") => FileFormat::Toml,
            _ => FileFormat::Json,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path)?;

        let config = match FileFormat::from_path(path) {
            FileFormat::Yaml => serde_yaml::from_str(&content)?,
            FileFormat::Toml => toml::from_str(&content)?,
            FileFormat::Json => serde_json::from_str(&content)?,
        };

        tracing::debug!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        match Self::discover() {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file or default locations
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        match file {
            Some(path) => Self::from_file(path),
            None => Self::load(),
        }
    }

    /// First existing file among the default locations
    pub fn discover() -> Option<PathBuf> {
        Self::default_config_paths()
            .into_iter()
            .find(|path| path.exists())
    }

    /// Get default configuration file paths to check
    pub fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // Current directory
        for name in ["ecotips.toml", "ecotips.yaml", "ecotips.yml", "ecotips.json"] {
            paths.push(PathBuf::from(name));
        }

        // User config directory
        if let Some(dir) = Self::user_config_dir() {
            for name in ["config.toml", "config.yaml", "config.yml", "config.json"] {
                paths.push(dir.join(name));
            }
        }

        paths
    }

    /// Per-user configuration directory
    pub fn user_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR))
    }

    /// Default path for a new user config file
    pub fn user_config_path(extension: &str) -> Option<PathBuf> {
        Self::user_config_dir().map(|dir| dir.join(format!("config.{}", extension)))
    }

    /// Serialize in the format implied by `path`
    pub fn to_string_for(&self, path: &Path) -> Result<String> {
        let content = match FileFormat::from_path(path) {
            FileFormat::Yaml => serde_yaml::to_string(self)?,
            FileFormat::Toml => toml::to_string_pretty(self)?,
            FileFormat::Json => serde_json::to_string_pretty(self)?,
        };
        Ok(content)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_string_for(path)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// HTTP client settings, with an optional timeout override
    pub fn http_client(&self, timeout_secs: Option<u64>) -> HttpClientConfig {
        let mut http = self.http.clone();
        if timeout_secs.is_some() {
            http.timeout_secs = timeout_secs;
        }
        http
    }

    /// Check values a file can get wrong
    ///
    /// Returns one message per problem; an empty list means valid.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let providers = &self.providers;

        let endpoints = [
            ("providers.openai.endpoint", Some(&providers.openai.endpoint)),
            ("providers.anthropic.endpoint", Some(&providers.anthropic.endpoint)),
            ("providers.gemini.base_url", providers.gemini.base_url.as_ref()),
        ];
        for (key, endpoint) in endpoints {
            if let Some(endpoint) = endpoint {
                if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                    problems.push(format!("{} must be an http(s) URL, got '{}'", key, endpoint));
                }
            }
        }

        if !(0.0..=2.0).contains(&providers.openai.temperature) {
            problems.push(format!(
                "providers.openai.temperature must be between 0 and 2, got {}",
                providers.openai.temperature
            ));
        }
        if let Some(temperature) = providers.gemini.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                problems.push(format!(
                    "providers.gemini.temperature must be between 0 and 2, got {}",
                    temperature
                ));
            }
        }
        if providers.anthropic.max_tokens == 0 {
            problems.push("providers.anthropic.max_tokens must be greater than 0".to_string());
        }
        if providers.gemini.location.trim().is_empty() {
            problems.push("providers.gemini.location must not be empty".to_string());
        }

        let post_process = [
            ("openai", providers.openai.post_process.max_tips),
            ("anthropic", providers.anthropic.post_process.max_tips),
            ("gemini", providers.gemini.post_process.max_tips),
        ];
        for (name, max_tips) in post_process {
            if let Some(max_tips) = max_tips {
                if max_tips == 0 || max_tips > MAX_TIPS {
                    problems.push(format!(
                        "providers.{}.post_process.max_tips must be between 1 and {}, got {}",
                        name, MAX_TIPS, max_tips
                    ));
                }
            }
        }

        if self.http.timeout_secs == Some(0) {
            problems.push("http.timeout_secs must be greater than 0".to_string());
        }

        if self.server.bind.parse::<SocketAddr>().is_err() {
            problems.push(format!(
                "server.bind must be a socket address like {}, got '{}'",
                DEFAULT_BIND, self.server.bind
            ));
        }

        if let Some(format) = &self.logging.format {
            if crate::logging::LogFormat::parse(format).is_none() {
                problems.push(format!(
                    "logging.format must be compact, full or json, got '{}'",
                    format
                ));
            }
        }

        problems
    }
}
