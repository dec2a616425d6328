//! cli::args
//!
//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Autonomous code security scanning and patching pipeline.
#[derive(Debug, Parser)]
#[command(name = "mender", version, about)]
pub struct Cli {
    /// Path to a TOML config file (environment variables override it).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the HTTP API.
    Serve,

    /// Run the scanner stage once against a repository.
    Scan {
        /// Repository URL to scan.
        repo_url: String,
        /// Branch to scan.
        #[arg(long, default_value = "main")]
        branch: String,
        /// Reuse an explicit scan id instead of generating one.
        #[arg(long)]
        scan_id: Option<String>,
    },

    /// Run the analyzer stage once over a stored scan.
    Analyze {
        /// Scan id to analyze.
        scan_id: String,
    },

    /// Apply the stored (or freshly planned) patches for a scan.
    Apply {
        /// Scan id whose patch plan to apply.
        scan_id: String,
        /// Repository to patch (defaults to the one recorded in the scan).
        #[arg(long)]
        repo_url: Option<String>,
        /// Branch to check out before patching.
        #[arg(long, default_value = "main")]
        branch: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scan_command() {
        let cli = Cli::parse_from([
            "mender",
            "scan",
            "https://example.com/repo.git",
            "--branch",
            "develop",
            "--scan-id",
            "scan_abc",
        ]);
        match cli.command {
            Command::Scan {
                repo_url,
                branch,
                scan_id,
            } => {
                assert_eq!(repo_url, "https://example.com/repo.git");
                assert_eq!(branch, "develop");
                assert_eq!(scan_id.as_deref(), Some("scan_abc"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn branch_defaults_to_main() {
        let cli = Cli::parse_from(["mender", "apply", "scan_abc"]);
        match cli.command {
            Command::Apply { branch, .. } => assert_eq!(branch, "main"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::parse_from(["mender", "serve", "--config", "/etc/mender.toml"]);
        assert_eq!(
            cli.config,
            Some(std::path::PathBuf::from("/etc/mender.toml"))
        );
    }
}
