//! EcoTips CLI - Command-line interface for household eco tips
//!
//! This is the main entry point for the EcoTips CLI application, providing
//! commands for extracting readings, generating tips with a provider, and
//! serving the generate API over HTTP.

mod cli;
mod config;
mod credentials;
mod error;
mod handlers;
mod logging;
mod output;

use cli::{Cli, Commands};
use colored::control;
use config::Config;
use error::Result;
use logging::{timing::Timer, LoggingConfig};
use output::OutputWriter;
use std::process;
use tracing::instrument;
use tracing_appender::non_blocking::WorkerGuard;

#[tokio::main]
async fn main() {
    // Provider keys may live in a .env file
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();
    control::set_override(cli.use_color());

    // Logging reads its file section from the config, so load that first
    let config = Config::load_with_file(cli.config.as_deref());

    let guard = match init_logging(&cli, config.as_ref().ok()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            None
        }
    };

    let verbosity = cli.verbosity_level();
    let result = match config {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(e),
    };

    // process::exit skips destructors; flush file logs first
    drop(guard);

    match result {
        Ok(()) => process::exit(0),
        Err(e) => {
            eprintln!(
                "{}",
                error::format_error(&e, control::SHOULD_COLORIZE.should_colorize(), verbosity)
            );

            if e.should_show_help() {
                eprintln!("\nFor more information, try '--help'");
            }

            process::exit(e.exit_code());
        }
    }
}

/// Main application logic
#[instrument(skip(cli, config), fields(command = ?cli.command))]
async fn run(cli: Cli, config: Config) -> Result<()> {
    let _timer = Timer::new("cli_execution");

    let mut output = OutputWriter::new(cli.output, cli.use_color(), cli.quiet, cli.verbosity_level());

    tracing::info!(
        command = ?cli.command,
        verbosity = cli.verbosity_level(),
        "Executing command"
    );

    match cli.command {
        Commands::Parse(args) => handlers::handle_parse(args, &mut output).await,
        Commands::Generate(args) => handlers::handle_generate(args, &config, &mut output).await,
        Commands::Serve(args) => handlers::handle_serve(args, &config, &mut output).await,
        Commands::Credential(args) => handlers::handle_credential(args, &mut output).await,
        Commands::Config(args) => {
            handlers::handle_config(args, &config, cli.config.as_deref(), &mut output).await
        }
        Commands::Notice(args) => handlers::handle_notice(args, &mut output).await,
        Commands::Completions(args) => handlers::handle_completions(args),
    }
}

/// Initialize the logging system
fn init_logging(cli: &Cli, config: Option<&Config>) -> Result<Option<WorkerGuard>> {
    let logging_config = logging_config(cli, config, |name| std::env::var(name).ok());
    logging::init_logging(logging_config)
}

/// Combine verbosity flags, the config file and the environment
fn logging_config(
    cli: &Cli,
    config: Option<&Config>,
    env: impl Fn(&str) -> Option<String>,
) -> LoggingConfig {
    let mut logging_config = LoggingConfig::from_verbosity(cli.verbosity_level());

    if let Some(config) = config {
        logging_config.merge_with_file(&config.logging, cli.verbosity_level());
    }
    logging_config.merge_with(env);

    // If quiet mode, only log errors
    if cli.quiet {
        logging_config.level = "error".to_string();
    }

    logging_config
}
