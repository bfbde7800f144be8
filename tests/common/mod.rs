//! Common test utilities and helpers for repo-privacy tests

#![allow(dead_code)]

use assert_fs::TempDir;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Isolated HOME / config directory for running the binary
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub config_path: PathBuf,
    pub credentials_path: PathBuf,
}

impl TestEnvironment {
    /// Environment whose API URL points at `api_url`
    pub fn new(api_url: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("config.yml");
        let credentials_path = temp_dir.path().join("credentials.json");

        let config = format!(
            "github:\n  api_url: \"{}\"\n  token_env: \"RP_IT_TOKEN\"\n  username_env: \"RP_IT_USERNAME\"\ncredentials_file: \"{}\"\n",
            api_url,
            credentials_path.display()
        );
        std::fs::write(&config_path, config).expect("Failed to write test config");

        Self {
            temp_dir,
            config_path,
            credentials_path,
        }
    }

    pub fn write_credentials(&self, token: &str, username: &str) {
        let content = json!({ "token": token, "username": username }).to_string();
        std::fs::write(&self.credentials_path, content).expect("Failed to write credentials");
    }

    /// Command for the built binary with stdin closed and a clean environment
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_repo-privacy"));
        cmd.arg("--config")
            .arg(&self.config_path)
            .env("HOME", self.temp_dir.path())
            .env("XDG_CONFIG_HOME", self.temp_dir.path())
            .env_remove("RP_IT_TOKEN")
            .env_remove("RP_IT_USERNAME")
            .env_remove("GITHUB_TOKEN")
            .env_remove("GITHUB_USERNAME")
            .env_remove("RUST_LOG")
            .stdin(Stdio::null());
        cmd
    }
}

/// Minimal GitHub repository payload
pub fn repo_json(name: &str, owner: &str, visibility: &str) -> Value {
    json!({
        "id": 1,
        "name": name,
        "full_name": format!("{}/{}", owner, name),
        "owner": { "login": owner, "id": 1, "type": "User" },
        "private": visibility != "public",
        "visibility": visibility,
        "stargazers_count": 4,
        "forks_count": 1,
        "updated_at": "2024-06-01T08:30:00Z"
    })
}

/// Assertion helpers for test validation
pub fn assert_contains_all(text: &str, expected: &[&str]) {
    for item in expected {
        assert!(
            text.contains(item),
            "Expected text to contain '{}', but it didn't. Text: {}",
            item,
            text
        );
    }
}
