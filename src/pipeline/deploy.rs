//! pipeline::deploy
//!
//! Deployment stage: turn a stored scan document into an applied patch
//! branch on a fresh checkout.
//!
//! # Contract
//!
//! Load the document for the scan id (fatal if absent). Derive the
//! patch suggestions: a non-empty stored patch plan is used directly
//! (one suggestion per entry, carrying the fixed code); an empty plan
//! falls back to the [`PatchPlanner`], which never fails. Check out the
//! repository at the requested branch and hand the suggestions to the
//! [`PatchApplier`]. The scan document itself is not mutated here; the
//! applier works on the ephemeral checkout and its report blob.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::core::document::{parse_document, DocumentError, PatchPlanEntry};
use crate::core::types::ScanId;
use crate::patch::{ApplyError, ApplySummary, PatchApplier, PatchSuggestion};
use crate::pipeline::planner::PatchPlanner;
use crate::scanner::{Workspace, WorkspaceError};
use crate::store::{BlobStore, StoreError};

/// Errors that abort the deployment stage.
#[derive(Debug, Error)]
pub enum DeployError {
    /// No document is stored for the scan id.
    #[error("no scan document found for {scan_id}")]
    DocumentNotFound {
        /// The unresolved scan id
        scan_id: ScanId,
    },

    /// The stored document is unreadable or violates invariants.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Storage failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Checkout of the target repository failed.
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    /// Patch application failed fatally.
    #[error(transparent)]
    Apply(#[from] ApplyError),
}

/// Convert a stored patch-plan entry into an applier suggestion.
fn suggestion_from_entry(entry: &PatchPlanEntry) -> PatchSuggestion {
    PatchSuggestion {
        file: entry.file.clone(),
        line: entry.line,
        suggestion: entry.fixed_code.clone(),
        description: Some(entry.explanation.clone()),
    }
}

/// The deployment stage.
pub struct DeployStage {
    store: Arc<dyn BlobStore>,
    planner: PatchPlanner,
    applier: PatchApplier,
    /// Upload the applier's report blob to the store.
    upload_report: bool,
}

impl DeployStage {
    /// Create a stage with its collaborator handles.
    pub fn new(
        store: Arc<dyn BlobStore>,
        planner: PatchPlanner,
        applier: PatchApplier,
        upload_report: bool,
    ) -> Self {
        Self {
            store,
            planner,
            applier,
            upload_report,
        }
    }

    /// Run the stage: load, derive suggestions, checkout, apply.
    ///
    /// # Errors
    ///
    /// Any [`DeployError`]; push and report-upload trouble is NOT an
    /// error here, it lands inline in the returned summary.
    pub async fn run(
        &self,
        scan_id: &ScanId,
        repo_url: &str,
        branch: &str,
    ) -> Result<ApplySummary, DeployError> {
        let key = scan_id.result_key();
        let json = self
            .store
            .get(&key)
            .await?
            .ok_or_else(|| DeployError::DocumentNotFound {
                scan_id: scan_id.clone(),
            })?;
        let document = parse_document(&json)?;

        let suggestions: Vec<PatchSuggestion> = if document.patch_plan.is_empty() {
            info!(scan_id = %scan_id, "no stored patch plan; planning from findings");
            self.planner.plan(&document.findings).await
        } else {
            document.patch_plan.iter().map(suggestion_from_entry).collect()
        };

        info!(
            scan_id = %scan_id,
            repo_url,
            branch,
            suggestions = suggestions.len(),
            "deployment starting"
        );

        let workspace = Workspace::checkout(repo_url, branch).await?;
        let report_store = self.upload_report.then(|| Arc::clone(&self.store));
        let summary = self
            .applier
            .apply(workspace.path(), &suggestions, report_store)
            .await?;

        Ok(summary)
    }
}
