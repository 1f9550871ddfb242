//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API,
//! providing a type-safe and well-documented command interface.

use clap::{Parser, Subcommand, ValueEnum};
use ecotips_core::ProviderKind;
use std::io::IsTerminal;
use std::path::PathBuf;

/// EcoTips CLI - Energy-saving tips from your household readings
///
/// Parse a short report of last month's electricity and water use, today's
/// weather and the number of occupants, then ask a language model for
/// practical eco tips.
#[derive(Parser, Debug)]
#[command(
    name = "ecotips",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "ECOTIPS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract the six readings from free text and show them
    Parse(ParseArgs),

    /// Extract readings and generate eco tips with a provider
    Generate(GenerateArgs),

    /// Serve the generate API over HTTP
    Serve(ServeArgs),

    /// Manage the stored provider credential
    Credential(CredentialArgs),

    /// Manage configuration files and settings
    Config(ConfigArgs),

    /// Show security and pricing notes for provider APIs
    Notice(NoticeArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Arguments for the parse command
#[derive(Parser, Debug)]
pub struct ParseArgs {
    /// Input file with one reading per line (`-` or omitted reads stdin)
    #[arg(value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Accept zero as a valid reading
    #[arg(long)]
    pub accept_zero: bool,
}

/// Arguments for the generate command
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Input file with one reading per line (`-` or omitted reads stdin)
    #[arg(value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Provider to use (openai, anthropic, gemini)
    #[arg(short, long, value_parser = parse_provider)]
    pub provider: Option<ProviderKind>,

    /// API key or access token for the provider
    #[arg(long)]
    pub api_key: Option<String>,

    /// Google Cloud project id (Gemini only)
    #[arg(long)]
    pub project_id: Option<String>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Accept zero as a valid reading
    #[arg(long)]
    pub accept_zero: bool,

    /// Request timeout in seconds (no timeout by default)
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to listen on (defaults to the configured `server.bind`)
    #[arg(short, long, value_name = "ADDR")]
    pub bind: Option<String>,
}

/// Arguments for the credential command
#[derive(Parser, Debug)]
pub struct CredentialArgs {
    #[command(subcommand)]
    pub action: CredentialAction,
}

/// Credential store actions
#[derive(Subcommand, Debug)]
pub enum CredentialAction {
    /// Store a credential
    Set(CredentialSetArgs),

    /// Show the stored credential with the key masked
    Show,

    /// Delete the stored credential
    Clear,
}

/// Arguments for credential set
#[derive(Parser, Debug)]
pub struct CredentialSetArgs {
    /// Provider the credential belongs to
    #[arg(short, long, value_parser = parse_provider)]
    pub provider: ProviderKind,

    /// API key or access token
    #[arg(long)]
    pub api_key: String,

    /// Google Cloud project id (Gemini only)
    #[arg(long)]
    pub project_id: Option<String>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a default configuration file
    Init(ConfigInitArgs),

    /// Show current configuration values
    Show(ConfigShowArgs),

    /// Print where configuration and credentials are read from
    Path,

    /// Validate current configuration
    Validate,
}

/// Arguments for config init
#[derive(Parser, Debug)]
pub struct ConfigInitArgs {
    /// File format to write
    #[arg(short, long, value_enum, default_value = "toml")]
    pub format: ConfigFormat,

    /// Write to this path instead of the user config directory
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Force overwrite existing config files
    #[arg(long)]
    pub force: bool,
}

/// Arguments for config show
#[derive(Parser, Debug)]
pub struct ConfigShowArgs {
    /// Show configuration in specified format
    #[arg(short, long, value_enum, default_value = "toml")]
    pub format: ConfigFormat,
}

/// Configuration file formats
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    /// TOML format
    Toml,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

impl ConfigFormat {
    /// File extension for this format
    pub fn extension(self) -> &'static str {
        match self {
            ConfigFormat::Toml => "toml",
            ConfigFormat::Json => "json",
            ConfigFormat::Yaml => "yaml",
        }
    }
}

/// Arguments for the notice command
#[derive(Parser, Debug)]
pub struct NoticeArgs {
    /// Show the pricing note for this provider only
    #[arg(short, long, value_parser = parse_provider)]
    pub provider: Option<ProviderKind>,
}

/// Arguments for generating shell completions
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

/// Supported shells for completion generation
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

impl Shell {
    /// Convert to clap_complete shell type
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}

fn parse_provider(value: &str) -> std::result::Result<ProviderKind, String> {
    value.parse::<ProviderKind>().map_err(|e| e.to_string())
}
