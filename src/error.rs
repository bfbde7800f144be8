//! Error types for repo-privacy
//!
//! Every failure the user can hit carries a readable message and, where there
//! is something to do about it, a hint on how to fix it.

use serde::Deserialize;
use thiserror::Error;

/// Main error type for repository listing, selection and updates
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrivacyError {
    /// Neither the environment, the credentials file nor the prompt produced a token and username
    #[error("GitHub token and username are required.\n\n  → Set GITHUB_TOKEN and GITHUB_USERNAME, or run interactively to enter them.\n  → Create a token at https://github.com/settings/tokens (scope: repo).")]
    AuthenticationMissing,

    /// Token rejected or lacking the required scope
    #[error("GitHub rejected the token (HTTP {status}): {message}\n\n  → Check that the token is valid and has the 'repo' scope.")]
    Auth { status: u16, message: String },

    /// Repository does not exist or is not visible to the token
    #[error("Repository not found: {0}")]
    NotFound(String),

    /// Primary or secondary rate limit hit
    #[error("GitHub API rate limit exceeded: {0}\n\n  → Wait a few minutes and try again.")]
    RateLimited(String),

    /// Transport failure, no HTTP status available
    #[error("Network request failed: {0}\n\n  → Check your internet connection.")]
    Network(String),

    /// Any other non-success response
    #[error("GitHub API request failed (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Reading or writing the persisted credentials failed
    #[error("Credentials file error: {0}")]
    CredentialStore(String),

    /// Console I/O failed
    #[error("Input error: {0}")]
    Input(String),
}

/// Result type alias using PrivacyError
pub type Result<T> = std::result::Result<T, PrivacyError>;

impl PrivacyError {
    /// Map an HTTP status and GitHub's error message to an error variant
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            429 => Self::RateLimited(message),
            403 if is_rate_limit_message(&message) => Self::RateLimited(message),
            401 | 403 => Self::Auth { status, message },
            404 => Self::NotFound(message),
            _ => Self::Api { status, message },
        }
    }

    /// Classify a raw HTTP error response. GitHub's JSON `message` is used
    /// when the body has one; proxies and gateways often send none.
    pub fn from_response(status: u16, reason: &str, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .map(|body| body.message)
            .unwrap_or_else(|_| reason.to_string());
        Self::from_status(status, message)
    }

    /// Classify an octocrab error by the status GitHub returned, if any
    pub fn from_octocrab(err: octocrab::Error) -> Self {
        match err {
            octocrab::Error::GitHub { source, .. } => {
                Self::from_status(source.status_code.as_u16(), source.message.clone())
            }
            // octocrab's Display appends a captured backtrace; report the cause chain only
            other => match std::error::Error::source(&other) {
                Some(source) => Self::Network(describe_chain(source)),
                None => Self::Network(
                    other.to_string().lines().next().unwrap_or_default().to_string(),
                ),
            },
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Join an error and its sources into one line
fn describe_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut current = err.source();
    while let Some(source) = current {
        let text = source.to_string();
        if !parts.iter().any(|part| part.contains(&text)) {
            parts.push(text);
        }
        current = source.source();
    }
    parts.join(": ")
}

impl From<std::io::Error> for PrivacyError {
    fn from(err: std::io::Error) -> Self {
        Self::Input(err.to_string())
    }
}

fn is_rate_limit_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("rate limit") || lower.contains("limit exceeded")
}
