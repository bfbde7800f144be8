//! Run driver - lists, selects, confirms and updates
//!
//! Wires the Repository Lister, Selection Driver and Visibility Updater
//! together for one invocation. Listing failures abort the run; update
//! failures are collected in the report.

use std::process::ExitCode;
use tracing::info;

use crate::console::Console;
use crate::error::Result;
use crate::github::{RepositoryHost, RepositoryRecord};
use crate::selection::{self, SelectionMode, SelectionSet};
use crate::updater::{self, UpdateReport};

/// What a run should do after listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Show the public repositories, change nothing
    List,
    /// Pick repositories and make them private
    Update(SelectionMode),
}

/// Options for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub mode: RunMode,
    /// Skip the final "are you sure?" question
    pub assume_yes: bool,
}

/// How a run ended
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// `--list` finished
    Listed { count: usize },
    /// Nothing was selected, so nothing was changed
    NothingSelected,
    /// The user declined the confirmation
    Cancelled,
    /// Updates were attempted
    Updated(UpdateReport),
}

impl RunOutcome {
    /// False only when some update failed
    pub fn is_success(&self) -> bool {
        !matches!(self, RunOutcome::Updated(report) if report.has_failures())
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}

/// Execute one run against `host`
pub async fn run<H>(host: &H, options: &RunOptions, console: &mut dyn Console) -> Result<RunOutcome>
where
    H: RepositoryHost + ?Sized,
{
    console.say("🔍 Fetching your public repositories...")?;
    let repositories = host.list_public_repositories().await?;
    display_repositories(&repositories, console)?;

    let selection_mode = match &options.mode {
        RunMode::List => {
            console.say("📋 Listing complete. Use without --list to make changes.")?;
            return Ok(RunOutcome::Listed {
                count: repositories.len(),
            });
        }
        RunMode::Update(mode) => mode,
    };

    let selected = select(&repositories, selection_mode, console)?;
    if selected.is_empty() {
        console.say("No repositories selected.")?;
        return Ok(RunOutcome::NothingSelected);
    }

    if !options.assume_yes && !confirm_action(&selected, console)? {
        console.say("Operation cancelled.")?;
        return Ok(RunOutcome::Cancelled);
    }

    let report = updater::apply(host, &selected, console).await?;
    print_summary(&report, console)?;

    Ok(RunOutcome::Updated(report))
}

fn select(
    repositories: &[RepositoryRecord],
    mode: &SelectionMode,
    console: &mut dyn Console,
) -> Result<SelectionSet> {
    let selected = match mode {
        SelectionMode::All => selection::select_all(repositories),
        SelectionMode::Interactive => selection::select_interactive(repositories, console)?,
        SelectionMode::Batch(names) => {
            let batch = selection::select_batch(repositories, names);
            if !batch.missing.is_empty() {
                console.say(&format!(
                    "⚠️  Repositories not found or not public: {}",
                    batch.missing.join(", ")
                ))?;
            }
            batch.selected
        }
    };

    info!("Selected {} repositories", selected.len());
    Ok(selected)
}

/// Print the numbered listing of candidates
pub fn display_repositories(
    repositories: &[RepositoryRecord],
    console: &mut dyn Console,
) -> Result<()> {
    if repositories.is_empty() {
        console.say("🎉 No public repositories found!")?;
        return Ok(());
    }

    let rule = "-".repeat(80);
    console.say("")?;
    console.say(&format!(
        "📋 Found {} public repositories:",
        repositories.len()
    ))?;
    console.say(&rule)?;

    for (i, repo) in repositories.iter().enumerate() {
        let updated = repo
            .updated_at
            .map(|ts| ts.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        console.say(&format!(
            "{:2}. {:<30} ⭐{:3} 🍴{:3} 📅{}",
            i + 1,
            repo.name,
            repo.stars,
            repo.forks,
            updated
        ))?;
    }

    console.say(&rule)?;
    Ok(())
}

fn confirm_action(selected: &SelectionSet, console: &mut dyn Console) -> Result<bool> {
    console.say("")?;
    console.say(&format!(
        "⚠️  You're about to make {} repositories private:",
        selected.len()
    ))?;
    for name in selected.iter() {
        console.say(&format!("   • {}", name))?;
    }

    Ok(console.confirm("\nAre you sure? This action cannot be undone easily. (yes/no): ")?)
}

fn print_summary(report: &UpdateReport, console: &mut dyn Console) -> Result<()> {
    console.say("")?;
    console.say(&format!(
        "🎉 Successfully made {}/{} repositories private!",
        report.successful(),
        report.total()
    ))?;

    if report.has_failures() {
        console.say("")?;
        console.say("🔍 Failed repositories:")?;
        for (name, error) in report.failures() {
            let first_line = error.to_string();
            let first_line = first_line.lines().next().unwrap_or_default();
            console.say(&format!("   ❌ {}: {}", name, first_line))?;
        }
    }

    Ok(())
}
