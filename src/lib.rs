//! repo-privacy - make your public GitHub repositories private
//!
//! Lists the public repositories owned by the authenticated user and flips
//! the selected ones to private through the GitHub REST API.
//!
//! ## Modules
//!
//! - [`config`]: Settings file loading and defaults
//! - [`credentials`]: Token and username resolution and persistence
//! - [`github`]: GitHub API access (listing and visibility updates)
//! - [`selection`]: Interactive, batch and all-repositories selection
//! - [`updater`]: Sequential visibility updates with per-repository results
//! - [`runner`]: One complete invocation, list through summary

pub mod config;
pub mod console;
pub mod credentials;
pub mod error;
pub mod github;
pub mod runner;
pub mod selection;
pub mod updater;

pub use config::Config;
pub use credentials::{CredentialResolver, Credentials};
pub use error::PrivacyError;
pub use github::{GitHubClient, RepositoryHost, RepositoryRecord};
pub use runner::{RunMode, RunOptions, RunOutcome};
pub use selection::{SelectionMode, SelectionSet};
pub use updater::UpdateReport;
