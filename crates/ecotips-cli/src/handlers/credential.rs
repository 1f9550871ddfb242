//! Credential command handlers

use crate::cli::{CredentialAction, CredentialArgs, CredentialSetArgs};
use crate::credentials::CredentialStore;
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use ecotips_core::ProviderCredential;
use tracing::instrument;

/// Handle the credential command
pub async fn handle_credential(args: CredentialArgs, output: &mut OutputWriter) -> Result<()> {
    let store = CredentialStore::user()?;

    match args.action {
        CredentialAction::Set(set_args) => handle_credential_set(set_args, &store, output),
        CredentialAction::Show => handle_credential_show(&store, output),
        CredentialAction::Clear => handle_credential_clear(&store, output),
    }
}

/// Handle credential set subcommand
#[instrument(skip(args, store, output), fields(provider = %args.provider))]
fn handle_credential_set(
    args: CredentialSetArgs,
    store: &CredentialStore,
    output: &mut OutputWriter,
) -> Result<()> {
    let credential = credential_from_args(args)?;
    store.save(&credential)?;

    output.success(&format!(
        "✓ Saved {} credential to {}",
        credential.provider.display_name(),
        store.path().display()
    ))
}

/// Handle credential show subcommand
fn handle_credential_show(store: &CredentialStore, output: &mut OutputWriter) -> Result<()> {
    let Some(credential) = store.load()? else {
        output.warning("No credential stored. Use 'ecotips credential set' to add one.")?;
        return Ok(());
    };

    if !output.is_human() {
        return output.data(&masked(&credential));
    }

    output.section("Stored credential")?;
    output.table(
        &["Field", "Value"],
        vec![
            vec![
                "provider".to_string(),
                credential.provider.display_name().to_string(),
            ],
            vec!["api_key".to_string(), credential.masked_key()],
            vec![
                "project_id".to_string(),
                credential.project_id().unwrap_or("-").to_string(),
            ],
            vec!["path".to_string(), store.path().display().to_string()],
        ],
    )
}

/// Handle credential clear subcommand
fn handle_credential_clear(store: &CredentialStore, output: &mut OutputWriter) -> Result<()> {
    if store.clear()? {
        output.success("✓ Credential removed")
    } else {
        output.info("No credential stored")
    }
}

/// Build a credential, rejecting blank keys and Gemini without a project
fn credential_from_args(args: CredentialSetArgs) -> Result<ProviderCredential> {
    if args.api_key.trim().is_empty() {
        return Err(Error::invalid_args("--api-key must not be empty"));
    }

    let mut credential = ProviderCredential::new(args.provider, args.api_key.trim());
    if let Some(project_id) = args.project_id.filter(|id| !id.trim().is_empty()) {
        credential = credential.with_project_id(project_id.trim());
    }

    if credential.provider.requires_project_id() && credential.project_id().is_none() {
        return Err(Error::invalid_args(format!(
            "{} requires --project-id",
            credential.provider.display_name()
        )));
    }

    Ok(credential)
}

/// Credential as shown to the user, key masked
fn masked(credential: &ProviderCredential) -> ProviderCredential {
    let mut shown = credential.clone();
    shown.api_key = credential.masked_key();
    shown
}
