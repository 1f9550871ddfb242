//! Parse command handler

use crate::cli::ParseArgs;
use crate::error::Result;
use crate::handlers::utils::read_input;
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use chrono::Utc;
use ecotips_core::{extract_with, ExtractOptions};
use tracing::{info, instrument};

/// Handle the parse command
#[instrument(skip(output), fields(input = ?args.input))]
pub async fn handle_parse(args: ParseArgs, output: &mut OutputWriter) -> Result<()> {
    let _timer = match &args.input {
        Some(path) => Timer::with_details("parse_command", &format!("input: {}", path.display())),
        None => Timer::new("parse_command"),
    };

    let text = read_input(args.input.as_deref())?;
    let options = ExtractOptions {
        accept_zero: args.accept_zero,
    };

    let record = extract_with(&text, options, Utc::now())?;
    info!(timestamp = %record.timestamp(), "Readings extracted");

    output.record(&record)
}
