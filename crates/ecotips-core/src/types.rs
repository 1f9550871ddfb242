//! Core types and data structures for EcoTips
//!
//! This module defines the household metrics record produced by the
//! extractor, the credential used to reach a provider, and the tip list
//! returned by every provider adapter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum number of tips returned from a single generation
pub const MAX_TIPS: usize = 10;

/// The six metrics collected from the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricField {
    Electricity,
    Water,
    Temperature,
    Humidity,
    Weather,
    People,
}

impl MetricField {
    /// All fields in display order
    pub const ALL: [MetricField; 6] = [
        MetricField::Electricity,
        MetricField::Water,
        MetricField::Temperature,
        MetricField::Humidity,
        MetricField::Weather,
        MetricField::People,
    ];

    /// Label used in the confirmation view and prompts
    pub fn label(&self) -> &'static str {
        match self {
            MetricField::Electricity => "先月の電力使用量",
            MetricField::Water => "先月の水使用量",
            MetricField::Temperature => "気温",
            MetricField::Humidity => "湿度",
            MetricField::Weather => "天気",
            MetricField::People => "在室人数",
        }
    }

    /// Short label used in the missing-fields hint
    pub fn hint(&self) -> &'static str {
        match self {
            MetricField::Electricity => "電力使用量（kWh）",
            MetricField::Water => "水使用量（L）",
            MetricField::Temperature => "気温（℃）",
            MetricField::Humidity => "湿度（%）",
            MetricField::Weather => "天気",
            MetricField::People => "在室人数",
        }
    }

    /// Unit suffix appended to the value, empty for weather
    pub fn unit(&self) -> &'static str {
        match self {
            MetricField::Electricity => "kWh",
            MetricField::Water => "L",
            MetricField::Temperature => "℃",
            MetricField::Humidity => "%",
            MetricField::Weather => "",
            MetricField::People => "人",
        }
    }
}

impl fmt::Display for MetricField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricField::Electricity => "electricity",
            MetricField::Water => "water",
            MetricField::Temperature => "temperature",
            MetricField::Humidity => "humidity",
            MetricField::Weather => "weather",
            MetricField::People => "people",
        };
        write!(f, "{}", name)
    }
}

/// Household resource-usage metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EcoMetrics {
    /// Electricity used last month, in kWh
    pub electricity: f64,
    /// Water used last month, in litres
    pub water: f64,
    /// Temperature in ℃
    pub temperature: f64,
    /// Relative humidity in percent
    pub humidity: f64,
    /// Free-text weather description
    pub weather: String,
    /// Number of occupants
    pub people: u32,
}

impl EcoMetrics {
    /// Render a single field the way the confirmation view shows it
    pub fn display_value(&self, field: MetricField) -> String {
        let value = match field {
            MetricField::Electricity => self.electricity.to_string(),
            MetricField::Water => self.water.to_string(),
            MetricField::Temperature => self.temperature.to_string(),
            MetricField::Humidity => self.humidity.to_string(),
            MetricField::Weather => self.weather.clone(),
            MetricField::People => self.people.to_string(),
        };
        format!("{}{}", value, field.unit())
    }

    /// `label: value` lines in display order
    pub fn summary_lines(&self) -> Vec<String> {
        MetricField::ALL
            .iter()
            .map(|field| format!("{}: {}", field.label(), self.display_value(*field)))
            .collect()
    }
}

/// A confirmed submission: metrics plus the instant it was confirmed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    #[serde(flatten)]
    metrics: EcoMetrics,
    timestamp: DateTime<Utc>,
}

impl ObservationRecord {
    pub fn new(metrics: EcoMetrics, timestamp: DateTime<Utc>) -> Self {
        Self { metrics, timestamp }
    }

    pub fn metrics(&self) -> &EcoMetrics {
        &self.metrics
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Supported LLM vendors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAI,
    Anthropic,
    Gemini,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::OpenAI,
        ProviderKind::Anthropic,
        ProviderKind::Gemini,
    ];

    /// Human-facing vendor name
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "OpenAI",
            ProviderKind::Anthropic => "Anthropic",
            ProviderKind::Gemini => "Gemini",
        }
    }

    /// Whether the credential needs a project id
    pub fn requires_project_id(&self) -> bool {
        matches!(self, ProviderKind::Gemini)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::OpenAI => write!(f, "openai"),
            ProviderKind::Anthropic => write!(f, "anthropic"),
            ProviderKind::Gemini => write!(f, "gemini"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAI),
            "anthropic" | "claude" => Ok(ProviderKind::Anthropic),
            "gemini" | "google" | "vertex" => Ok(ProviderKind::Gemini),
            other => Err(crate::Error::configuration(format!(
                "Unknown provider '{}'. Expected one of: openai, anthropic, gemini",
                other
            ))),
        }
    }
}

/// Credential for a single provider
///
/// Field names follow the JSON the browser client stores and posts.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCredential {
    #[serde(rename = "type")]
    pub provider: ProviderKind,

    #[serde(rename = "apiKey")]
    pub api_key: String,

    #[serde(rename = "projectId", default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

impl ProviderCredential {
    pub fn new(provider: ProviderKind, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            project_id: None,
        }
    }

    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Project id if present and non-blank
    pub fn project_id(&self) -> Option<&str> {
        self.project_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// API key with everything but the last four characters masked
    pub fn masked_key(&self) -> String {
        let chars: Vec<char> = self.api_key.chars().collect();
        if chars.len() <= 4 {
            return "*".repeat(chars.len());
        }
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{}", "*".repeat(chars.len() - 4), tail)
    }
}

impl fmt::Debug for ProviderCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredential")
            .field("provider", &self.provider)
            .field("api_key", &"***")
            .field("project_id", &self.project_id)
            .finish()
    }
}

/// Ordered tips, at most [`MAX_TIPS`] entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TipList(Vec<String>);

impl TipList {
    /// Build from lines in model order, keeping the first [`MAX_TIPS`]
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(lines.into_iter().take(MAX_TIPS).map(Into::into).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl IntoIterator for TipList {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a TipList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
