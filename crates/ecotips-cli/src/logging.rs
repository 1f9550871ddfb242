//! Logging utilities for the EcoTips CLI
//!
//! This module provides:
//! - Session request ID generation
//! - Sensitive data redaction
//! - Performance timing spans
//! - Structured logging setup with console or file output

use crate::error::{Error, Result};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{field, Span};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Global request ID for the current session
static REQUEST_ID: OnceLock<String> = OnceLock::new();

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter
    pub level: String,
    /// Output format: compact, full, json
    pub format: LogFormat,
    /// Enable console output
    pub console: bool,
    /// Optional file output path
    pub file: Option<PathBuf>,
    /// Include thread IDs
    pub thread_ids: bool,
    /// Include file and line numbers
    pub source_location: bool,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact format for production
    Compact,
    /// Full format with all details
    Full,
    /// JSON structured format
    Json,
}

impl LogFormat {
    /// Parse a format name, case-insensitively
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "compact" => Some(LogFormat::Compact),
            "full" => Some(LogFormat::Full),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            console: true,
            file: None,
            thread_ids: false,
            source_location: false,
        }
    }
}

impl LoggingConfig {
    /// Create logging config from verbosity level
    pub fn from_verbosity(verbosity: u8) -> Self {
        let mut config = Self::default();

        match verbosity {
            0 => {
                config.level = "warn".to_string();
            }
            1 => {
                config.level = "info".to_string();
            }
            2 => {
                config.level = "debug".to_string();
                config.source_location = true;
            }
            _ => {
                config.level = "trace".to_string();
                config.format = LogFormat::Full;
                config.source_location = true;
                config.thread_ids = true;
            }
        }

        config
    }

    /// Apply settings from the configuration file
    ///
    /// Verbosity flags win over the file's level unless no flag was given.
    pub fn merge_with_file(&mut self, section: &crate::config::LoggingSection, verbosity: u8) {
        if verbosity == 0 {
            if let Some(level) = &section.level {
                self.level = level.clone();
            }
        }
        if let Some(format) = section.format.as_deref().and_then(LogFormat::parse) {
            self.format = format;
        }
        if section.file.is_some() {
            self.file = section.file.clone();
        }
    }

    /// Apply overrides from `lookup`, usually the process environment
    pub fn merge_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // RUST_LOG takes precedence
        if let Some(rust_log) = lookup("RUST_LOG") {
            self.level = rust_log;
        }

        if let Some(format) = lookup("ECOTIPS_LOG_FORMAT") {
            match LogFormat::parse(&format) {
                Some(parsed) => self.format = parsed,
                None => eprintln!("Invalid log format: {}, using default", format),
            }
        }

        if let Some(file) = lookup("ECOTIPS_LOG_FILE") {
            self.file = Some(PathBuf::from(file));
        }
    }
}

/// Initialize the global logging system
///
/// The returned guard flushes file output when dropped and must be held for
/// the life of the process.
pub fn init_logging(config: LoggingConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = create_env_filter(&config)?;

    let (writer, guard, ansi) = match &config.file {
        Some(path) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender(path)?);
            (BoxMakeWriter::new(non_blocking), Some(guard), false)
        }
        None => (
            BoxMakeWriter::new(std::io::stderr),
            None,
            config.console && std::io::stderr().is_terminal(),
        ),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_target(true)
        .with_thread_ids(config.thread_ids)
        .with_file(config.source_location)
        .with_line_number(config.source_location);

    // Separate arms because each format yields a distinct subscriber type
    let installed = match config.format {
        LogFormat::Compact => {
            tracing::subscriber::set_global_default(builder.with_ansi(ansi).compact().finish())
        }
        LogFormat::Json => {
            tracing::subscriber::set_global_default(builder.with_ansi(false).json().finish())
        }
        LogFormat::Full => tracing::subscriber::set_global_default(builder.with_ansi(ansi).finish()),
    };
    installed.map_err(|e| Error::other(format!("Failed to initialize logging: {}", e)))?;

    let request_id = generate_request_id();
    REQUEST_ID.set(request_id.clone()).map_err(|_| {
        Error::other("Failed to set request ID - request tracking may not work correctly")
    })?;

    tracing::info!(
        request_id = %request_id,
        level = %config.level,
        format = ?config.format,
        file = ?config.file,
        "Logging system initialized"
    );

    Ok(guard)
}

fn file_appender(path: &Path) -> Result<tracing_appender::rolling::RollingFileAppender> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| Error::config(format!("Invalid log file path: {}", path.display())))?;

    std::fs::create_dir_all(&directory)?;
    Ok(tracing_appender::rolling::never(directory, file_name))
}

/// Create environment filter based on configuration
fn create_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    EnvFilter::try_new(&config.level)
        .map_err(|e| Error::config(format!("Invalid log filter '{}': {}", config.level, e)))
}

/// Fresh id tagging every log line of one CLI invocation
pub fn generate_request_id() -> String {
    format!("req_{}", Uuid::new_v4().simple())
}

/// Id installed by [`init_logging`], if logging is up
pub fn current_request_id() -> Option<&'static str> {
    REQUEST_ID.get().map(String::as_str)
}

/// Span for one timed operation, carrying the session id
pub fn create_operation_span(operation: &str, details: Option<&str>) -> Span {
    tracing::info_span!(
        "operation",
        operation = operation,
        request_id = current_request_id().unwrap_or("-"),
        details = details.unwrap_or_default(),
        duration_ms = field::Empty,
    )
}

/// Masking of provider credentials before text reaches a terminal or log
pub mod redaction {
    use regex::Regex;
    use serde_json::Value;
    use std::sync::OnceLock;

    /// Key name fragments whose values are always masked
    const SECRET_KEY_PARTS: [&str; 5] = ["apikey", "api_key", "token", "secret", "authorization"];

    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();

    fn patterns() -> &'static [(Regex, &'static str)] {
        PATTERNS.get_or_init(|| {
            [
                // api_key=..., x-api-key: ..., "apiKey": "..."
                (
                    r#"(?i)(api[_-]?key|x-api-key)["']?\s*[=:]\s*["']?[A-Za-z0-9_.-]{10,}["']?"#,
                    "$1=***",
                ),
                // Authorization: Bearer ..., token=...
                (r#"(?i)(bearer|token)[=:\s]+["']?[A-Za-z0-9_.-]{10,}["']?"#, "$1=***"),
                // Bare OpenAI / Anthropic keys and Google access tokens
                (r"\b(sk-ant-|sk-|ya29\.)[A-Za-z0-9_.-]{8,}", "${1}***"),
            ]
            .into_iter()
            .map(|(pattern, replacement)| {
                (Regex::new(pattern).expect("Valid regex pattern"), replacement)
            })
            .collect()
        })
    }

    /// Mask credentials inside free text
    pub fn redact_sensitive(input: &str) -> String {
        patterns()
            .iter()
            .fold(input.to_string(), |text, (regex, replacement)| {
                regex.replace_all(&text, *replacement).into_owned()
            })
    }

    /// Mask credential-bearing fields and any key-shaped strings in a JSON tree
    pub fn redact_json_value(value: &mut Value) {
        match value {
            Value::Object(map) => {
                for (key, entry) in map.iter_mut() {
                    if is_secret_key(key) {
                        *entry = Value::String("***".to_string());
                    } else {
                        redact_json_value(entry);
                    }
                }
            }
            Value::Array(items) => items.iter_mut().for_each(redact_json_value),
            Value::String(text) => *text = redact_sensitive(text),
            _ => {}
        }
    }

    fn is_secret_key(key: &str) -> bool {
        let key = key.to_lowercase();
        SECRET_KEY_PARTS.iter().any(|part| key.contains(part))
    }
}

/// Operation timing
pub mod timing {
    use std::time::{Duration, Instant};
    use tracing::Span;

    /// Records how long an operation took on its span
    ///
    /// [`Timer::finish`] logs at info; a timer dropped unfinished logs at
    /// debug, so early returns are still timed.
    pub struct Timer {
        operation: String,
        span: Span,
        started: Instant,
        done: bool,
    }

    impl Timer {
        pub fn new(operation: &str) -> Self {
            Self::start(operation, None)
        }

        pub fn with_details(operation: &str, details: &str) -> Self {
            Self::start(operation, Some(details))
        }

        fn start(operation: &str, details: Option<&str>) -> Self {
            Self {
                operation: operation.to_string(),
                span: super::create_operation_span(operation, details),
                started: Instant::now(),
                done: false,
            }
        }

        pub fn elapsed(&self) -> Duration {
            self.started.elapsed()
        }

        /// Stop the timer and log the duration
        pub fn finish(mut self) {
            let duration_ms = self.close();
            tracing::info!(operation = %self.operation, duration_ms, "Operation completed");
        }

        fn close(&mut self) -> u64 {
            self.done = true;
            let duration_ms = self.started.elapsed().as_millis() as u64;
            self.span.record("duration_ms", duration_ms);
            duration_ms
        }
    }

    impl Drop for Timer {
        fn drop(&mut self) {
            if !self.done {
                let duration_ms = self.close();
                tracing::debug!(operation = %self.operation, duration_ms, "Operation ended");
            }
        }
    }
}
