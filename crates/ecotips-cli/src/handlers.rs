//! Command handlers for CLI subcommands
//!
//! This module contains the implementation logic for each CLI subcommand.

mod completions;
mod config;
mod credential;
mod generate;
mod notice;
mod parse;
mod serve;
mod utils;

pub use completions::handle_completions;
pub use config::handle_config;
pub use credential::handle_credential;
pub use generate::handle_generate;
pub use notice::handle_notice;
pub use parse::handle_parse;
pub use serve::handle_serve;
