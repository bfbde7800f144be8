use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for repo-privacy
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// GitHub API and credential lookup settings
    #[serde(default)]
    pub github: GitHubConfig,

    /// Where the persisted token and username live
    #[serde(default = "default_credentials_file")]
    pub credentials_file: String,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// GitHub configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GitHubConfig {
    /// REST API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Page size for repository listing (GitHub caps this at 100)
    #[serde(default = "default_per_page")]
    pub per_page: u8,

    /// Environment variable holding the access token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Environment variable holding the GitHub username
    #[serde(default = "default_username_env")]
    pub username_env: String,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Log level used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String, // "warn"
}

// Default value functions
fn default_api_url() -> String {
    "https://api.github.com".to_string()
}
fn default_per_page() -> u8 {
    100
}
fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}
fn default_username_env() -> String {
    "GITHUB_USERNAME".to_string()
}
fn default_credentials_file() -> String {
    "~/.github_privacy_config.json".to_string()
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            per_page: default_per_page(),
            token_env: default_token_env(),
            username_env: default_username_env(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github: GitHubConfig::default(),
            credentials_file: default_credentials_file(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, falling back to defaults
    ///
    /// Unlike the credentials file, the settings file is never created implicitly.
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load(&config_path)
        } else {
            let mut config = Self::default();
            config.expand_paths()?;
            Ok(config)
        }
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        config.expand_paths()?;

        if config.github.per_page == 0 || config.github.per_page > 100 {
            anyhow::bail!(
                "Invalid github.per_page {} in {:?}: must be between 1 and 100",
                config.github.per_page,
                path
            );
        }

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize configuration")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Get the default configuration file path (XDG compliant)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to get user config directory")?;

        Ok(config_dir.join("repo-privacy").join("config.yml"))
    }

    /// Expand `~` and environment variables in configured paths
    pub fn expand_paths(&mut self) -> Result<()> {
        self.credentials_file = shellexpand::full(&self.credentials_file)
            .context("Failed to expand credentials_file path")?
            .into_owned();

        Ok(())
    }

    /// Path of the persisted credentials file
    pub fn credentials_path(&self) -> PathBuf {
        PathBuf::from(&self.credentials_file)
    }
}
