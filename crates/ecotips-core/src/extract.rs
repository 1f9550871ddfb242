//! Free-text metric extraction
//!
//! Turns newline-delimited user input into an [`ObservationRecord`]. Each
//! trimmed, non-empty line is tested against every keyword predicate; a line
//! may set several fields, and a later matching line overwrites an earlier one.

use crate::error::{Error, Result};
use crate::types::{EcoMetrics, MetricField, ObservationRecord};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::num::IntErrorKind;
use std::sync::OnceLock;

static DECIMAL_REGEX: OnceLock<Regex> = OnceLock::new();
static INTEGER_REGEX: OnceLock<Regex> = OnceLock::new();
static WEATHER_REGEX: OnceLock<Regex> = OnceLock::new();

fn decimal_regex() -> &'static Regex {
    DECIMAL_REGEX.get_or_init(|| Regex::new(r"[0-9]+(\.[0-9]+)?").expect("Valid regex pattern"))
}

fn integer_regex() -> &'static Regex {
    INTEGER_REGEX.get_or_init(|| Regex::new(r"[0-9]+").expect("Valid regex pattern"))
}

fn weather_regex() -> &'static Regex {
    WEATHER_REGEX.get_or_init(|| Regex::new(r"天気[は:]?\s*(.+)").expect("Valid regex pattern"))
}

/// Options controlling extraction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Treat a parsed zero as a present value.
    ///
    /// Off by default: a zero reading counts as unset, so `0人` fails
    /// extraction.
    pub accept_zero: bool,
}

/// Fields collected so far during a parse pass
#[derive(Debug, Default, Clone, PartialEq)]
struct PartialMetrics {
    electricity: Option<f64>,
    water: Option<f64>,
    temperature: Option<f64>,
    humidity: Option<f64>,
    weather: Option<String>,
    people: Option<u32>,
}

impl PartialMetrics {
    fn scan_line(&mut self, line: &str) {
        if contains_any(line, &["電力", "kWh"]) {
            if let Some(value) = first_decimal(line) {
                self.electricity = Some(value);
            }
        }
        if contains_any(line, &["水", "L", "リットル"]) {
            if let Some(value) = first_decimal(line) {
                self.water = Some(value);
            }
        }
        if contains_any(line, &["気温", "温度", "℃"]) {
            if let Some(value) = first_decimal(line) {
                self.temperature = Some(value);
            }
        }
        if contains_any(line, &["湿度", "%"]) {
            if let Some(value) = first_decimal(line) {
                self.humidity = Some(value);
            }
        }
        if line.contains("天気") {
            if let Some(captures) = weather_regex().captures(line) {
                self.weather = Some(captures[1].trim().to_string());
            }
        }
        if contains_any(line, &["人数", "人"]) {
            if let Some(value) = first_integer(line) {
                self.people = Some(value);
            }
        }
    }

    fn missing(&self, options: ExtractOptions) -> Vec<MetricField> {
        let present_number = |value: Option<f64>| match value {
            Some(v) => options.accept_zero || v != 0.0,
            None => false,
        };

        let mut missing = Vec::new();
        if !present_number(self.electricity) {
            missing.push(MetricField::Electricity);
        }
        if !present_number(self.water) {
            missing.push(MetricField::Water);
        }
        if !present_number(self.temperature) {
            missing.push(MetricField::Temperature);
        }
        if !present_number(self.humidity) {
            missing.push(MetricField::Humidity);
        }
        if self.weather.as_deref().map_or(true, str::is_empty) {
            missing.push(MetricField::Weather);
        }
        if !present_number(self.people.map(f64::from)) {
            missing.push(MetricField::People);
        }
        missing
    }

    fn into_metrics(self) -> Option<EcoMetrics> {
        Some(EcoMetrics {
            electricity: self.electricity?,
            water: self.water?,
            temperature: self.temperature?,
            humidity: self.humidity?,
            weather: self.weather?,
            people: self.people?,
        })
    }
}

fn contains_any(line: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| line.contains(keyword))
}

fn first_decimal(line: &str) -> Option<f64> {
    decimal_regex()
        .find(line)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// First ASCII integer on the line; values past `u32::MAX` saturate so an
/// oversized later reading still overwrites an earlier one
fn first_integer(line: &str) -> Option<u32> {
    let digits = integer_regex().find(line)?.as_str();
    match digits.parse::<u32>() {
        Ok(value) => Some(value),
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => Some(u32::MAX),
        Err(_) => None,
    }
}

/// Extract a record stamped with the current instant
pub fn extract(text: &str) -> Result<ObservationRecord> {
    extract_with(text, ExtractOptions::default(), Utc::now())
}

/// Extract a record stamped with `now`
pub fn extract_at(text: &str, now: DateTime<Utc>) -> Result<ObservationRecord> {
    extract_with(text, ExtractOptions::default(), now)
}

/// Extract a record with explicit options and timestamp
pub fn extract_with(
    text: &str,
    options: ExtractOptions,
    now: DateTime<Utc>,
) -> Result<ObservationRecord> {
    let mut partial = PartialMetrics::default();

    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        partial.scan_line(line);
    }

    let missing = partial.missing(options);
    if !missing.is_empty() {
        tracing::debug!(?missing, "Extraction left required fields unset");
        return Err(Error::MissingFields { missing });
    }

    let metrics = partial
        .into_metrics()
        .ok_or_else(|| Error::MissingFields {
            missing: MetricField::ALL.to_vec(),
        })?;

    Ok(ObservationRecord::new(metrics, now))
}
