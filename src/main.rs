use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use repo_privacy::console::LineConsole;
use repo_privacy::selection::parse_batch_names;
use repo_privacy::{
    Config, CredentialResolver, GitHubClient, RunMode, RunOptions, SelectionMode,
};

#[derive(Parser)]
#[command(name = "repo-privacy")]
#[command(about = "Make your public GitHub repositories private")]
#[command(version)]
#[command(after_help = "Examples:
  repo-privacy                       Interactive mode
  repo-privacy --batch repo1,repo2   Batch mode
  repo-privacy --list                List public repos only")]
struct Cli {
    /// List public repositories without making changes
    #[arg(long, conflicts_with_all = ["batch", "all"])]
    list: bool,

    /// Comma-separated list of repository names to make private
    #[arg(long, value_name = "NAMES", conflicts_with = "all")]
    batch: Option<String>,

    /// Make all public repositories private (use with caution)
    #[arg(long)]
    all: bool,

    /// Do not ask for confirmation before making changes
    #[arg(short, long)]
    yes: bool,

    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn run_options(&self) -> RunOptions {
        let mode = if self.list {
            RunMode::List
        } else if self.all {
            RunMode::Update(SelectionMode::All)
        } else if let Some(batch) = &self.batch {
            RunMode::Update(SelectionMode::Batch(parse_batch_names(batch)))
        } else {
            RunMode::Update(SelectionMode::Interactive)
        };

        RunOptions {
            mode,
            assume_yes: self.yes,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = load_config(cli.config.as_deref())?;
    init_logging(cli.verbose, &config)?;
    debug!("Loaded configuration: {:?}", config);

    println!("🚀 GitHub Repository Privacy Manager");
    println!("{}", "=".repeat(40));

    let mut console = LineConsole::stdio();

    // Credentials must be complete before anything touches the network
    let credentials = CredentialResolver::new(&config).resolve(&mut console)?;

    let client = GitHubClient::new(&credentials, &config.github)?;
    let login = client.verify_authentication().await?;
    println!("✅ Successfully authenticated as: {}", login);

    let options = cli.run_options();
    let outcome = repo_privacy::runner::run(&client, &options, &mut console)
        .await
        .context("Run aborted")?;

    info!("Run finished: {:?}", outcome);
    Ok(outcome.exit_code())
}

/// Initialize logging: RUST_LOG wins, then --verbose, then the configured level
fn init_logging(verbose: bool, config: &Config) -> Result<()> {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.logging.level))
            .context("Invalid logging.level in configuration")?
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal()),
        )
        .with(filter)
        .init();

    Ok(())
}

/// Load configuration from specified path or default location
fn load_config(config_path: Option<&std::path::Path>) -> Result<Config> {
    match config_path {
        Some(path) => Config::load(path),
        None => Config::load_or_default(),
    }
}

