//! pipeline::scanner
//!
//! Scanner stage: repository checkout, tool invocation, normalization,
//! and the initial scan document write.
//!
//! # Contract
//!
//! Given a repository location and branch, produce a scan document with
//! `status=scanned`. An unreachable URL or missing branch aborts the
//! stage before any storage write; a successful run performs exactly
//! one durable write.
//!
//! Finding ids are assigned `finding_<index>` in tool emission order,
//! so re-running against identical scanner input reproduces identical
//! ids and ordering.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::core::document::{DocumentError, Finding, ScanDocument};
use crate::core::types::{ScanId, Severity};
use crate::scanner::{RawResult, ScanTool, ScanToolError, Workspace, WorkspaceError};
use crate::store::{BlobStore, StoreError};

/// Errors that abort the scanner stage.
#[derive(Debug, Error)]
pub enum ScannerError {
    /// Checkout failed (unreachable URL or missing branch).
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    /// The scan tool failed.
    #[error(transparent)]
    Tool(#[from] ScanToolError),

    /// The document could not be serialized.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// The document could not be persisted.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of a scanner stage run.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// Identifier of the pipeline run (generated when absent).
    pub scan_id: ScanId,
    /// Number of normalized findings.
    pub findings_count: usize,
    /// Storage key the document was written to.
    pub result_key: String,
}

/// Normalize raw tool records into findings.
///
/// Ids are `finding_<index>` in emission order; a zero end line from
/// the tool is treated as absent.
pub fn normalize_findings(raw: &[RawResult]) -> Vec<Finding> {
    raw.iter()
        .enumerate()
        .map(|(index, record)| {
            let mut finding = Finding::new(
                format!("finding_{index}"),
                Severity::from_tool_label(&record.extra.severity),
                record.check_id.clone(),
                record.path.clone(),
                record.start.line,
                record.extra.message.clone(),
                record.extra.lines.clone(),
            );
            finding.end_line = record.end.as_ref().map(|p| p.line).filter(|line| *line != 0);
            finding
        })
        .collect()
}

/// The scanner stage.
///
/// Collaborators are injected so tests can substitute a static tool
/// and an in-memory store.
pub struct ScannerStage {
    tool: Arc<dyn ScanTool>,
    store: Arc<dyn BlobStore>,
}

impl ScannerStage {
    /// Create a stage with its collaborator handles.
    pub fn new(tool: Arc<dyn ScanTool>, store: Arc<dyn BlobStore>) -> Self {
        Self { tool, store }
    }

    /// Run the stage: checkout, scan, normalize, persist.
    ///
    /// A missing `scan_id` gets a fresh generated one.
    ///
    /// # Errors
    ///
    /// Any [`ScannerError`]; on error nothing has been written.
    pub async fn run(
        &self,
        repo_url: &str,
        branch: &str,
        scan_id: Option<ScanId>,
    ) -> Result<ScanOutcome, ScannerError> {
        let scan_id = scan_id.unwrap_or_else(ScanId::generate);
        info!(scan_id = %scan_id, repo_url, branch, "scanner stage starting");

        let workspace = Workspace::checkout(repo_url, branch).await?;
        let raw = self.tool.run(workspace.path()).await?;
        let findings = normalize_findings(&raw);
        let findings_count = findings.len();

        let document = ScanDocument::new(scan_id.clone(), repo_url, findings);
        let result_key = scan_id.result_key();
        self.store
            .put(&result_key, &document.to_json_pretty()?)
            .await?;

        info!(
            scan_id = %scan_id,
            findings = findings_count,
            "scan completed"
        );
        Ok(ScanOutcome {
            scan_id,
            findings_count,
            result_key,
        })
    }
}
