//! cli::commands::scan
//!
//! `mender scan` - run the scanner stage once.

use anyhow::{anyhow, Result};

use super::Components;
use crate::config::Config;
use crate::core::types::ScanId;

/// Run one scan and print the outcome.
pub async fn run(
    config: Config,
    repo_url: &str,
    branch: &str,
    scan_id: Option<String>,
) -> Result<()> {
    let scan_id = scan_id
        .map(ScanId::new)
        .transpose()
        .map_err(|e| anyhow!("{e}"))?;

    let components = Components::from_config(&config);
    let outcome = components
        .scanner
        .run(repo_url, branch, scan_id)
        .await
        .map_err(|e| anyhow!("Scanner error: {e}"))?;

    println!("scan_id: {}", outcome.scan_id);
    println!("findings: {}", outcome.findings_count);
    println!("result: {}", outcome.result_key);
    Ok(())
}
