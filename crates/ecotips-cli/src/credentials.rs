//! Provider credential storage and resolution
//!
//! A single credential is kept as `credential.json` in the user config
//! directory, in the same JSON shape the web client posts.

use crate::config::Config;
use crate::error::{Error, Result};
use ecotips_core::{ProviderCredential, ProviderKind};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const CREDENTIAL_FILE: &str = "credential.json";

pub const ENV_API_KEY: &str = "ECOTIPS_API_KEY";
pub const ENV_PROJECT_ID: &str = "ECOTIPS_PROJECT_ID";
pub const ENV_PROVIDER: &str = "ECOTIPS_PROVIDER";

/// File-backed credential store
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Store at an explicit path
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store in the user config directory
    pub fn user() -> Result<Self> {
        Config::user_config_dir()
            .map(|dir| Self::at(dir.join(CREDENTIAL_FILE)))
            .ok_or_else(|| Error::config("Unable to determine user config directory"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored credential, if any
    pub fn load(&self) -> Result<Option<ProviderCredential>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        let credential = serde_json::from_str(&content).map_err(|_| Error::InvalidFormat {
            path: self.path.clone(),
            expected: "credential JSON".to_string(),
        })?;
        Ok(Some(credential))
    }

    /// Replace the stored credential
    pub fn save(&self, credential: &ProviderCredential) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = open_private(&self.path)?;
        file.write_all(serde_json::to_string_pretty(credential)?.as_bytes())?;

        tracing::info!(
            provider = %credential.provider,
            path = %self.path.display(),
            "Stored provider credential"
        );
        Ok(())
    }

    /// Delete the stored credential; returns whether one existed
    pub fn clear(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&self.path)?;
        Ok(true)
    }
}

/// Open the store for writing, owner-only from creation on unix
#[cfg(unix)]
fn open_private(path: &Path) -> Result<File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode only applies on creation
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> Result<File> {
    Ok(OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?)
}

/// Credential fields given on the command line
#[derive(Debug, Clone, Default)]
pub struct CredentialFlags {
    pub provider: Option<ProviderKind>,
    pub api_key: Option<String>,
    pub project_id: Option<String>,
}

/// Pick the credential for a generation call
///
/// An API key from the flags wins, then one from the environment, then the
/// store. Provider and project id fill in from the flags and environment in
/// the same order. `Ok(None)` means nothing is configured anywhere.
pub fn resolve_credential(
    flags: &CredentialFlags,
    env: impl Fn(&str) -> Option<String>,
    store: Option<&CredentialStore>,
    default_provider: Option<ProviderKind>,
) -> Result<Option<ProviderCredential>> {
    let non_blank = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

    let env_provider = match non_blank(env(ENV_PROVIDER)) {
        Some(name) => Some(name.parse::<ProviderKind>()?),
        None => None,
    };
    let project_id = non_blank(flags.project_id.clone()).or_else(|| non_blank(env(ENV_PROJECT_ID)));

    let explicit_key = non_blank(flags.api_key.clone())
        .map(|key| (key, "flags"))
        .or_else(|| non_blank(env(ENV_API_KEY)).map(|key| (key, "environment")));

    if let Some((api_key, source)) = explicit_key {
        let provider = flags
            .provider
            .or(env_provider)
            .or(default_provider)
            .unwrap_or(ProviderKind::OpenAI);
        let mut credential = ProviderCredential::new(provider, api_key);
        credential.project_id = project_id;

        tracing::debug!(provider = %provider, source, "Resolved credential");
        return Ok(Some(credential));
    }

    let Some(store) = store else {
        return Ok(None);
    };
    let Some(mut credential) = store.load()? else {
        return Ok(None);
    };

    if let Some(provider) = flags.provider.or(env_provider) {
        if provider != credential.provider {
            return Err(Error::config(format!(
                "Stored credential is for {}, but {} was requested",
                credential.provider.display_name(),
                provider.display_name()
            )));
        }
    }
    if project_id.is_some() {
        credential.project_id = project_id;
    }

    tracing::debug!(provider = %credential.provider, source = "store", "Resolved credential");
    Ok(Some(credential))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn stored(dir: &TempDir, credential: &ProviderCredential) -> CredentialStore {
        let store = CredentialStore::at(dir.path().join(CREDENTIAL_FILE));
        store.save(credential).unwrap();
        store
    }

    #[test]
    fn test_store_round_trip_uses_web_field_names() {
        let dir = TempDir::new().unwrap();
        let credential =
            ProviderCredential::new(ProviderKind::Gemini, "ya29.token").with_project_id("eco");
        let store = stored(&dir, &credential);

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"type\": \"gemini\""));
        assert!(raw.contains("\"apiKey\""));
        assert!(raw.contains("\"projectId\": \"eco\""));

        assert_eq!(store.load().unwrap(), Some(credential));
        assert!(store.clear().unwrap());
        assert!(!store.clear().unwrap());
        assert_eq!(store.load().unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_store_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CREDENTIAL_FILE);
        std::fs::write(&path, "{}").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let store = CredentialStore::at(&path);
        store
            .save(&ProviderCredential::new(ProviderKind::OpenAI, "sk-test"))
            .unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        std::fs::remove_file(&path).unwrap();
        store
            .save(&ProviderCredential::new(ProviderKind::OpenAI, "sk-test"))
            .unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_corrupt_store_is_invalid_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CREDENTIAL_FILE);
        std::fs::write(&path, "not json").unwrap();

        let result = CredentialStore::at(path).load();
        assert!(matches!(result, Err(Error::InvalidFormat { .. })));
    }

    #[test]
    fn test_flags_win_over_environment_and_store() {
        let dir = TempDir::new().unwrap();
        let store = stored(&dir, &ProviderCredential::new(ProviderKind::OpenAI, "sk-stored"));
        let flags = CredentialFlags {
            provider: Some(ProviderKind::Anthropic),
            api_key: Some("sk-ant-flag".to_string()),
            project_id: None,
        };
        let env = env_from(&[(ENV_API_KEY, "sk-env")]);

        let credential = resolve_credential(&flags, env, Some(&store), None)
            .unwrap()
            .unwrap();

        assert_eq!(credential.provider, ProviderKind::Anthropic);
        assert_eq!(credential.api_key, "sk-ant-flag");
    }

    #[test]
    fn test_environment_credential() {
        let env = env_from(&[
            (ENV_API_KEY, "ya29.env"),
            (ENV_PROVIDER, "vertex"),
            (ENV_PROJECT_ID, "eco-project"),
        ]);

        let credential = resolve_credential(&CredentialFlags::default(), env, None, None)
            .unwrap()
            .unwrap();

        assert_eq!(credential.provider, ProviderKind::Gemini);
        assert_eq!(credential.project_id(), Some("eco-project"));
    }

    #[test]
    fn test_default_provider_applies_to_bare_key() {
        let env = env_from(&[(ENV_API_KEY, "sk-ant-env")]);
        let credential = resolve_credential(
            &CredentialFlags::default(),
            env,
            None,
            Some(ProviderKind::Anthropic),
        )
        .unwrap()
        .unwrap();
        assert_eq!(credential.provider, ProviderKind::Anthropic);
    }

    #[test]
    fn test_store_used_last() {
        let dir = TempDir::new().unwrap();
        let store = stored(&dir, &ProviderCredential::new(ProviderKind::OpenAI, "sk-stored"));

        let credential = resolve_credential(&CredentialFlags::default(), env_from(&[]), Some(&store), None)
            .unwrap()
            .unwrap();
        assert_eq!(credential.api_key, "sk-stored");
    }

    #[test]
    fn test_provider_mismatch_with_store() {
        let dir = TempDir::new().unwrap();
        let store = stored(&dir, &ProviderCredential::new(ProviderKind::OpenAI, "sk-stored"));
        let flags = CredentialFlags {
            provider: Some(ProviderKind::Gemini),
            ..Default::default()
        };

        let result = resolve_credential(&flags, env_from(&[]), Some(&store), None);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_nothing_configured() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::at(dir.path().join(CREDENTIAL_FILE));

        let resolved =
            resolve_credential(&CredentialFlags::default(), env_from(&[]), Some(&store), None).unwrap();
        assert!(resolved.is_none());
    }

    #[test]
    fn test_unknown_env_provider() {
        let env = env_from(&[(ENV_API_KEY, "k"), (ENV_PROVIDER, "mistral")]);
        let result = resolve_credential(&CredentialFlags::default(), env, None, None);
        assert!(matches!(result, Err(Error::Core(_))));
    }
}
