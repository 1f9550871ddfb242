//! Generate command handler

use crate::cli::GenerateArgs;
use crate::config::Config;
use crate::credentials::{resolve_credential, CredentialFlags, CredentialStore};
use crate::error::{Error, Result};
use crate::handlers::utils::{confirm, read_input, reads_stdin};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use chrono::Utc;
use ecotips_core::{extract_with, require_credential, ExtractOptions, TipGenerator};
use std::io::{self, IsTerminal};
use tracing::{debug, info, instrument};

/// Handle the generate command
#[instrument(skip(args, config, output), fields(provider = ?args.provider))]
pub async fn handle_generate(
    args: GenerateArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let timer = Timer::new("generate_command");

    if !config.output.progress {
        output.disable_progress();
    }

    let text = read_input(args.input.as_deref())?;
    let record = extract_with(
        &text,
        ExtractOptions {
            accept_zero: args.accept_zero,
        },
        Utc::now(),
    )?;

    if output.is_human() {
        output.record(&record)?;
    }

    if needs_confirmation(&args, config) {
        if reads_stdin(args.input.as_deref()) || !io::stdin().is_terminal() {
            return Err(Error::invalid_args(
                "Cannot ask for confirmation without a terminal; pass --yes to skip it",
            ));
        }

        let proceed = confirm(
            "この内容でTipsを生成しますか?",
            &mut io::stdin().lock(),
            &mut io::stderr(),
        )?;
        if !proceed {
            info!("Generation cancelled at confirmation");
            return Err(Error::Cancelled);
        }
    }

    let flags = CredentialFlags {
        provider: args.provider,
        api_key: args.api_key.clone(),
        project_id: args.project_id.clone(),
    };
    let store = CredentialStore::user().ok();
    let credential = require_credential(resolve_credential(
        &flags,
        |name| std::env::var(name).ok(),
        store.as_ref(),
        config.default_provider,
    )?)?;
    debug!(credential = ?credential, "Using credential");
    output.debug(&format!(
        "provider: {}, key: {}",
        credential.provider.display_name(),
        credential.masked_key()
    ))?;

    let generator =
        TipGenerator::with_reqwest(config.providers.clone(), &config.http_client(args.timeout))?;

    let spinner = output.spinner(&format!(
        "{} にTipsを問い合わせています...",
        credential.provider.display_name()
    ));
    let result = generator.generate(&record, &credential).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let tips = result?;
    output.tips(&tips)?;
    output.debug(&format!("completed in {:.2}s", timer.elapsed().as_secs_f64()))?;
    timer.finish();

    Ok(())
}

/// Whether the record must be confirmed before sending
fn needs_confirmation(args: &GenerateArgs, config: &Config) -> bool {
    !args.yes && config.output.confirm
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> GenerateArgs {
        GenerateArgs {
            input: None,
            provider: None,
            api_key: None,
            project_id: None,
            yes: false,
            accept_zero: false,
            timeout: None,
        }
    }

    #[test]
    fn test_needs_confirmation() {
        let mut config = Config::default();
        assert!(needs_confirmation(&args(), &config));

        let skip = GenerateArgs { yes: true, ..args() };
        assert!(!needs_confirmation(&skip, &config));

        config.output.confirm = false;
        assert!(!needs_confirmation(&args(), &config));
    }
}
