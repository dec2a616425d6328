//! cli
//!
//! Command-line interface layer: parses arguments, loads configuration,
//! and delegates to the pipeline or the server.

pub mod args;
pub mod commands;

use anyhow::Result;
use clap::Parser;

use crate::config::Config;

pub use args::{Cli, Command};

/// Parse arguments and run the selected command.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Serve => commands::serve::run(config).await,
        Command::Scan {
            repo_url,
            branch,
            scan_id,
        } => commands::scan::run(config, &repo_url, &branch, scan_id).await,
        Command::Analyze { scan_id } => commands::analyze::run(config, &scan_id).await,
        Command::Apply {
            scan_id,
            repo_url,
            branch,
        } => commands::apply::run(config, &scan_id, repo_url, &branch).await,
    }
}
