//! cli::commands::analyze
//!
//! `mender analyze` - run the analyzer stage once.

use anyhow::{anyhow, Result};

use super::Components;
use crate::config::Config;
use crate::core::types::ScanId;

/// Analyze one stored scan and print the outcome.
pub async fn run(config: Config, scan_id: &str) -> Result<()> {
    let scan_id = ScanId::new(scan_id).map_err(|e| anyhow!("{e}"))?;

    let components = Components::from_config(&config);
    let outcome = components
        .analyzer
        .run(&scan_id)
        .await
        .map_err(|e| anyhow!("Analyzer error: {e}"))?;

    println!("scan_id: {}", outcome.scan_id);
    println!("remediations: {}", outcome.remediations_count);
    println!("result: {}", outcome.result_key);
    Ok(())
}
