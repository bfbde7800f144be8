//! Credential resolution and persistence
//!
//! The token and username are looked up field by field:
//! environment variable > credentials file > interactive prompt.
//! When anything had to be typed in, the user is offered to persist both
//! values so the next run needs no input.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::console::Console;
use crate::error::{PrivacyError, Result};

/// Access token and owner identity for one run
#[derive(Debug, Clone)]
pub struct Credentials {
    token: SecretString,
    username: String,
}

impl Credentials {
    pub fn new(token: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            token: SecretString::from(token.into()),
            username: username.into(),
        }
    }

    pub fn token(&self) -> &SecretString {
        &self.token
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

/// Where a credential field was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CredentialSource {
    Environment,
    File,
    Prompt,
}

/// On-disk shape of the credentials file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredentials {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

/// JSON credentials file at a fixed per-user path
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored credentials; a missing file yields `None`
    pub fn load(&self) -> Result<Option<StoredCredentials>> {
        if !self.path.exists() {
            debug!("No credentials file at {:?}", self.path);
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            PrivacyError::CredentialStore(format!("cannot read {:?}: {}", self.path, e))
        })?;

        let stored = serde_json::from_str(&content).map_err(|e| {
            PrivacyError::CredentialStore(format!("cannot parse {:?}: {}", self.path, e))
        })?;

        Ok(Some(stored))
    }

    /// Write both fields, readable only by the current user on Unix
    pub fn save(&self, credentials: &Credentials) -> Result<()> {
        let stored = StoredCredentials {
            token: Some(credentials.token().expose_secret().to_string()),
            username: Some(credentials.username().to_string()),
        };
        let content = serde_json::to_string_pretty(&stored)
            .map_err(|e| PrivacyError::CredentialStore(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                PrivacyError::CredentialStore(format!("cannot create {:?}: {}", parent, e))
            })?;
        }

        write_private(&self.path, content.as_bytes()).map_err(|e| {
            PrivacyError::CredentialStore(format!("cannot write {:?}: {}", self.path, e))
        })?;

        info!("Saved credentials to {:?}", self.path);
        Ok(())
    }
}

#[cfg(unix)]
fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies on creation
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    file.write_all(content)
}

#[cfg(not(unix))]
fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, content)
}

/// Resolves [`Credentials`] from the environment, the credentials file or the user
pub struct CredentialResolver {
    token_env: String,
    username_env: String,
    store: CredentialStore,
}

impl CredentialResolver {
    /// Resolver using the variable names and file path from the configuration
    pub fn new(config: &Config) -> Self {
        Self::with_store(
            config.github.token_env.clone(),
            config.github.username_env.clone(),
            CredentialStore::new(config.credentials_path()),
        )
    }

    pub fn with_store(
        token_env: impl Into<String>,
        username_env: impl Into<String>,
        store: CredentialStore,
    ) -> Self {
        Self {
            token_env: token_env.into(),
            username_env: username_env.into(),
            store,
        }
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Resolve the token and username, prompting for whatever is still missing
    pub fn resolve(&self, console: &mut dyn Console) -> Result<Credentials> {
        let stored = match self.store.load() {
            Ok(stored) => stored.unwrap_or_default(),
            Err(e) => {
                warn!("Ignoring unreadable credentials file: {}", e);
                console.say(&format!("⚠️  Ignoring credentials file: {}", e))?;
                StoredCredentials::default()
            }
        };

        let (token, token_source) = match lookup(&self.token_env, stored.token) {
            Some(found) => found,
            None => {
                console.say("🔑 GitHub Personal Access Token required")?;
                console.say("Create one at: https://github.com/settings/tokens")?;
                console.say("Required scopes: repo (Full control of private repositories)")?;
                let token = non_empty(console.ask_secret("Enter your GitHub token: ")?)
                    .ok_or(PrivacyError::AuthenticationMissing)?;
                (token, CredentialSource::Prompt)
            }
        };

        let (username, username_source) = match lookup(&self.username_env, stored.username) {
            Some(found) => found,
            None => {
                let username = non_empty(console.ask("Enter your GitHub username: ")?)
                    .ok_or(PrivacyError::AuthenticationMissing)?;
                (username, CredentialSource::Prompt)
            }
        };

        debug!(
            "Resolved token from {:?}, username from {:?}",
            token_source, username_source
        );

        let credentials = Credentials::new(token, username);

        if token_source == CredentialSource::Prompt || username_source == CredentialSource::Prompt
        {
            self.offer_to_save(&credentials, console)?;
        }

        Ok(credentials)
    }

    fn offer_to_save(&self, credentials: &Credentials, console: &mut dyn Console) -> Result<()> {
        if !console.confirm("Save credentials for future use? (y/n): ")? {
            return Ok(());
        }

        match self.store.save(credentials) {
            Ok(()) => console.say(&format!(
                "💾 Credentials saved to {}",
                self.store.path().display()
            ))?,
            Err(e) => {
                warn!("{}", e);
                console.say("⚠️  Could not save credentials file")?;
            }
        }
        Ok(())
    }
}

fn lookup(env_name: &str, stored: Option<String>) -> Option<(String, CredentialSource)> {
    if let Some(value) = non_empty(std::env::var(env_name).ok()) {
        return Some((value, CredentialSource::Environment));
    }
    non_empty(stored).map(|value| (value, CredentialSource::File))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
