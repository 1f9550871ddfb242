//! Configuration command handlers

use crate::cli::{ConfigAction, ConfigArgs, ConfigFormat, ConfigInitArgs, ConfigShowArgs};
use crate::config::Config;
use crate::credentials::{CredentialStore, ENV_API_KEY, ENV_PROJECT_ID, ENV_PROVIDER};
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use std::path::{Path, PathBuf};

/// Handle the config command
///
/// `config_file` is the `--config` path, when one was given.
pub async fn handle_config(
    args: ConfigArgs,
    config: &Config,
    config_file: Option<&Path>,
    output: &mut OutputWriter,
) -> Result<()> {
    match args.action {
        ConfigAction::Init(init_args) => handle_config_init(init_args, output),
        ConfigAction::Show(show_args) => handle_config_show(show_args, config, output),
        ConfigAction::Path => handle_config_path(config_file, output),
        ConfigAction::Validate => handle_config_validate(config, output),
    }
}

/// Handle config init subcommand
fn handle_config_init(args: ConfigInitArgs, output: &mut OutputWriter) -> Result<()> {
    let path = match args.path {
        Some(path) => path,
        None => Config::user_config_path(args.format.extension())
            .ok_or_else(|| Error::config("Unable to determine user config directory"))?,
    };

    if path.exists() && !args.force {
        output.warning(&format!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        ))?;
        return Ok(());
    }

    Config::default().save(&path)?;
    output.success(&format!("✓ Created config at {}", path.display()))?;
    output.info("Edit it to change models, endpoints or the default provider.")
}

/// Handle config show subcommand
fn handle_config_show(args: ConfigShowArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let content = render(config, args.format)?;
    output.writeln(content.trim_end())
}

fn render(config: &Config, format: ConfigFormat) -> Result<String> {
    let content = match format {
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };
    Ok(content)
}

/// Handle config path subcommand
fn handle_config_path(config_file: Option<&Path>, output: &mut OutputWriter) -> Result<()> {
    let loaded = config_file.map(Path::to_path_buf).or_else(Config::discover);
    let credential = CredentialStore::user().ok().map(|store| store.path().to_path_buf());

    let show = |path: Option<PathBuf>| {
        path.map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string())
    };

    if !output.is_human() {
        return output.data(&serde_json::json!({
            "config": loaded,
            "user_config_dir": Config::user_config_dir(),
            "credential": credential,
        }));
    }

    output.table(
        &["Item", "Path"],
        vec![
            vec!["config".to_string(), show(loaded)],
            vec!["user config dir".to_string(), show(Config::user_config_dir())],
            vec!["credential".to_string(), show(credential)],
        ],
    )
}

/// Handle config validate subcommand
fn handle_config_validate(config: &Config, output: &mut OutputWriter) -> Result<()> {
    output.info("Validating configuration...")?;

    let problems = config.validate();
    if !problems.is_empty() {
        for problem in &problems {
            output.error(&format!("✗ {}", problem))?;
        }
        return Err(Error::config(format!(
            "{} problem(s) found in configuration",
            problems.len()
        )));
    }
    output.success("✓ Configuration is valid")?;

    let active: Vec<&str> = [ENV_API_KEY, ENV_PROJECT_ID, ENV_PROVIDER, "ECOTIPS_CONFIG"]
        .into_iter()
        .filter(|name| std::env::var(name).is_ok())
        .collect();
    if !active.is_empty() {
        output.section("Environment")?;
        for name in active {
            output.info(&format!("{} is set", name))?;
        }
    }

    Ok(())
}
