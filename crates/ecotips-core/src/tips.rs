//! Post-processing of raw model text into a [`TipList`]
//!
//! Each provider ships its own default pipeline. The defaults differ in how
//! they treat the model's own list numbering; configuration can override any
//! step per provider.

use crate::types::{ProviderKind, TipList, MAX_TIPS};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

static MARKER_LINE_REGEX: OnceLock<Regex> = OnceLock::new();
static MARKER_PREFIX_REGEX: OnceLock<Regex> = OnceLock::new();

fn marker_line_regex() -> &'static Regex {
    MARKER_LINE_REGEX
        .get_or_init(|| Regex::new(r"^\d+\s*[.．)）、]?$").expect("Valid regex pattern"))
}

fn marker_prefix_regex() -> &'static Regex {
    MARKER_PREFIX_REGEX
        .get_or_init(|| Regex::new(r"^\d+\s*[.．)）、]\s*").expect("Valid regex pattern"))
}

/// How numbered-list markers in model output are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberingPolicy {
    /// Lines pass through with their numbering
    Keep,
    /// Lines that are only a marker (`"3."`) are dropped
    DropMarkerLines,
    /// Leading markers are removed and the remaining text kept
    StripMarkers,
}

/// Pipeline turning raw model text into tips
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TipPostProcessor {
    /// Characters removed anywhere in the raw text
    pub strip_chars: String,
    /// Collapse `\n\n` into `\n` before splitting
    pub collapse_blank_lines: bool,
    /// Numbering treatment
    pub numbering: NumberingPolicy,
    /// Upper bound on returned tips, clamped to [`MAX_TIPS`]
    pub max_tips: usize,
}

impl Default for TipPostProcessor {
    fn default() -> Self {
        Self {
            strip_chars: String::new(),
            collapse_blank_lines: false,
            numbering: NumberingPolicy::Keep,
            max_tips: MAX_TIPS,
        }
    }
}

impl TipPostProcessor {
    /// Default pipeline for a provider
    pub fn for_provider(kind: ProviderKind) -> Self {
        match kind {
            ProviderKind::OpenAI => Self::default(),
            ProviderKind::Anthropic => Self {
                strip_chars: "'+".to_string(),
                collapse_blank_lines: true,
                ..Self::default()
            },
            ProviderKind::Gemini => Self {
                numbering: NumberingPolicy::DropMarkerLines,
                ..Self::default()
            },
        }
    }

    /// Apply the override on top of this pipeline
    pub fn merged(mut self, overrides: &PostProcessOverrides) -> Self {
        if let Some(strip_chars) = &overrides.strip_chars {
            self.strip_chars = strip_chars.clone();
        }
        if let Some(collapse) = overrides.collapse_blank_lines {
            self.collapse_blank_lines = collapse;
        }
        if let Some(numbering) = overrides.numbering {
            self.numbering = numbering;
        }
        if let Some(max_tips) = overrides.max_tips {
            self.max_tips = max_tips;
        }
        self
    }

    /// Turn raw model text into tips
    pub fn process(&self, raw: &str) -> TipList {
        let mut text: String = raw
            .chars()
            .filter(|c| !self.strip_chars.contains(*c))
            .collect();

        if self.collapse_blank_lines {
            text = text.replace("\n\n", "\n");
        }

        let limit = self.max_tips.min(MAX_TIPS);
        let lines = text
            .split('\n')
            .map(str::trim)
            .filter_map(|line| self.apply_numbering(line))
            .filter(|line| !line.is_empty())
            .take(limit);

        TipList::from_lines(lines)
    }

    fn apply_numbering<'a>(&self, line: &'a str) -> Option<&'a str> {
        match self.numbering {
            NumberingPolicy::Keep => Some(line),
            NumberingPolicy::DropMarkerLines => {
                if marker_line_regex().is_match(line) {
                    None
                } else {
                    Some(line)
                }
            }
            NumberingPolicy::StripMarkers => match marker_prefix_regex().find(line) {
                Some(prefix) => Some(line[prefix.end()..].trim()),
                None => Some(line),
            },
        }
    }
}

/// Partial pipeline settings read from configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostProcessOverrides {
    pub strip_chars: Option<String>,
    pub collapse_blank_lines: Option<bool>,
    pub numbering: Option<NumberingPolicy>,
    pub max_tips: Option<usize>,
}
