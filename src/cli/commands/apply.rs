//! cli::commands::apply
//!
//! `mender apply` - apply a scan's patches to a fresh checkout.

use anyhow::{anyhow, Result};

use super::Components;
use crate::config::Config;
use crate::core::types::ScanId;

/// Apply patches for one stored scan and print the summary.
pub async fn run(
    config: Config,
    scan_id: &str,
    repo_url: Option<String>,
    branch: &str,
) -> Result<()> {
    let scan_id = ScanId::new(scan_id).map_err(|e| anyhow!("{e}"))?;
    let components = Components::from_config(&config);

    // Fall back to the repository recorded in the scan document.
    let repo_url = match repo_url {
        Some(url) => url,
        None => {
            let body = components
                .store
                .get(&scan_id.result_key())
                .await
                .map_err(|e| anyhow!("{e}"))?
                .ok_or_else(|| anyhow!("no scan document found for {scan_id}"))?;
            let document = crate::core::document::parse_document(&body)?;
            document.repo_url
        }
    };
    if repo_url.trim().is_empty() {
        return Err(anyhow!("deployment target not configured"));
    }

    let summary = components
        .deploy
        .run(&scan_id, &repo_url, branch)
        .await
        .map_err(|e| anyhow!("Deployment error: {e}"))?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
