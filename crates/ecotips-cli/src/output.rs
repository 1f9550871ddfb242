//! Output formatting and writing utilities
//!
//! This module provides utilities for formatting and writing output
//! in various formats (JSON, YAML, human-readable), with dedicated
//! rendering for extracted records, tip lists and progress indicators.

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::logging::redaction;
use colored::Colorize;
use ecotips_core::{ObservationRecord, TipList};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io::{self, IsTerminal, Write};
use std::time::Duration;
use tracing::{debug, trace};

/// Trait for formatting output with specialized support for common types
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;

    /// Format an extracted record as the confirmation view
    fn format_record(&self, record: &ObservationRecord) -> Result<String>;

    /// Format generated tips
    fn format_tips(&self, tips: &TipList) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
            // Human output falls back to pretty JSON for arbitrary values
            OutputFormat::Human => Ok(serde_json::to_string_pretty(value)?),
        }
    }

    fn format_record(&self, record: &ObservationRecord) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_record_human(record)),
            _ => self.format(record),
        }
    }

    fn format_tips(&self, tips: &TipList) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_tips_human(tips)),
            _ => self.format(&serde_json::json!({ "tips": tips })),
        }
    }
}

#[derive(Clone, Copy)]
enum Notice {
    Info,
    Success,
    Warning,
    Error,
}

impl Notice {
    fn quietable(self) -> bool {
        matches!(self, Notice::Info | Notice::Success)
    }
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    show_progress: bool,
    quiet: bool,
    verbose: u8,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool, verbose: u8) -> Self {
        Self {
            format,
            use_color,
            show_progress: !quiet && std::io::stdout().is_terminal(),
            quiet,
            verbose,
            writer: Box::new(io::stdout()),
        }
    }

    /// Create an output writer with a custom writer
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn with_writer(
        format: OutputFormat,
        use_color: bool,
        quiet: bool,
        verbose: u8,
        writer: Box<dyn Write>,
    ) -> Self {
        Self {
            format,
            use_color,
            show_progress: false, // No progress bars with custom writers
            quiet,
            verbose,
            writer,
        }
    }

    /// Whether output is human-readable
    pub fn is_human(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Turn off progress indicators regardless of terminal
    pub fn disable_progress(&mut self) {
        self.show_progress = false;
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write an info message
    pub fn info(&mut self, message: &str) -> Result<()> {
        debug!(message, "Output info");
        self.notice(Notice::Info, message)
    }

    /// Write a success message
    pub fn success(&mut self, message: &str) -> Result<()> {
        self.notice(Notice::Success, message)
    }

    /// Write a warning message; shown even when quiet
    pub fn warning(&mut self, message: &str) -> Result<()> {
        self.notice(Notice::Warning, message)
    }

    /// Write an error message; shown even when quiet
    pub fn error(&mut self, message: &str) -> Result<()> {
        self.notice(Notice::Error, message)
    }

    fn notice(&mut self, notice: Notice, message: &str) -> Result<()> {
        if !self.is_human() || (self.quiet && notice.quietable()) {
            return Ok(());
        }

        let line = match (notice, self.use_color) {
            (Notice::Info, true) => format!("{} {}", "ℹ".blue(), message),
            (Notice::Info, false) => format!("INFO: {}", message),
            (Notice::Success, true) => message.green().to_string(),
            (Notice::Success, false) => message.to_string(),
            (Notice::Warning, true) => message.yellow().to_string(),
            (Notice::Warning, false) => format!("WARNING: {}", message),
            (Notice::Error, true) => message.red().to_string(),
            (Notice::Error, false) => format!("ERROR: {}", message),
        };
        self.writeln(&line)
    }

    /// Write a section header
    pub fn section(&mut self, title: &str) -> Result<()> {
        if self.quiet || !self.is_human() {
            return Ok(());
        }

        self.writeln("")?;
        if self.use_color {
            self.writeln(&format!("═══ {} ═══", title).bright_blue().to_string())
        } else {
            self.writeln(&format!("=== {} ===", title))
        }
    }

    /// Write debug information if verbose mode is enabled
    pub fn debug(&mut self, message: &str) -> Result<()> {
        if self.verbose > 0 && self.is_human() {
            if self.use_color {
                self.writeln(&format!("{} {}", "DEBUG:".dimmed(), message.dimmed()))
            } else {
                self.writeln(&format!("DEBUG: {}", message))
            }
        } else {
            Ok(())
        }
    }

    /// Write data in the configured format
    pub fn data<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let mut value_json = serde_json::to_value(value)?;
        redaction::redact_json_value(&mut value_json);

        trace!(
            "Outputting data: {}",
            serde_json::to_string(&value_json).unwrap_or_else(|_| "[failed to serialize]".to_string())
        );

        let formatted = self.format.format(value)?;
        self.writeln(formatted.trim_end())
    }

    /// Write an extracted record
    pub fn record(&mut self, record: &ObservationRecord) -> Result<()> {
        let formatted = self.format.format_record(record)?;
        self.writeln(formatted.trim_end())
    }

    /// Write generated tips
    pub fn tips(&mut self, tips: &TipList) -> Result<()> {
        let formatted = self.format.format_tips(tips)?;
        self.writeln(formatted.trim_end())
    }

    /// Create a spinner for indeterminate progress
    pub fn spinner(&self, message: &str) -> Option<ProgressBar> {
        if !self.show_progress || !self.is_human() {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(default_spinner_style());
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    }

    /// Write a two-or-more column table (for human format)
    pub fn table(&mut self, headers: &[&str], rows: Vec<Vec<String>>) -> Result<()> {
        if self.quiet || !self.is_human() {
            return Ok(());
        }

        let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();
        for row in &rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(display_width(cell));
                }
            }
        }

        let header_row = headers
            .iter()
            .enumerate()
            .map(|(i, h)| pad(h, widths[i]))
            .collect::<Vec<_>>()
            .join(" │ ");

        if self.use_color {
            self.writeln(&header_row.bold().to_string())?;
        } else {
            self.writeln(&header_row)?;
        }

        let separator = widths
            .iter()
            .map(|w| "─".repeat(*w))
            .collect::<Vec<_>>()
            .join("─┼─");
        self.writeln(&separator)?;

        for row in rows {
            let row_str = row
                .iter()
                .enumerate()
                .map(|(i, cell)| match widths.get(i) {
                    Some(width) => pad(cell, *width),
                    None => cell.clone(),
                })
                .collect::<Vec<_>>()
                .join(" │ ");
            self.writeln(&row_str)?;
        }

        Ok(())
    }
}

/// Helper function to create a spinner style
pub fn default_spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"])
}

/// Terminal columns taken by `text`, counting wide (CJK) characters as two
fn display_width(text: &str) -> usize {
    text.chars()
        .map(|c| if is_wide(c) { 2 } else { 1 })
        .sum()
}

fn is_wide(c: char) -> bool {
    matches!(c as u32,
        0x1100..=0x115F
        | 0x2E80..=0x303E
        | 0x3041..=0x33FF
        | 0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6)
}

fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(display_width(text));
    format!("{}{}", text, " ".repeat(fill))
}

/// Format a record as the labelled confirmation view
fn format_record_human(record: &ObservationRecord) -> String {
    let mut output = String::from("入力データの確認:\n");

    for line in record.metrics().summary_lines() {
        output.push_str(&format!("  {}\n", line));
    }
    output.push_str(&format!(
        "  記録日時: {}\n",
        record.timestamp().format("%Y-%m-%d %H:%M:%S UTC")
    ));

    output
}

/// Format tips one per line, exactly as the provider numbered them
fn format_tips_human(tips: &TipList) -> String {
    if tips.is_empty() {
        return "Tipsが生成されませんでした\n".to_string();
    }

    let mut output = String::from("エコライフTips:\n");
    for tip in tips {
        output.push_str(&format!("  {}\n", tip));
    }
    output
}
