//! patch::applier
//!
//! Apply a patch plan to a working copy and commit the result.
//!
//! # Contract
//!
//! - Fails fatally if the target is not a directory holding a Git
//!   working copy.
//! - Creates (or re-enters) a branch named from the current UTC
//!   timestamp: `fix/autopatch-<%Y%m%d%H%M%S>`.
//! - Per plan item: a missing target file is skipped silently (it is
//!   simply absent from the summary); an existing file has the
//!   suggestion merged in by the configured [`PatchStrategy`] and is
//!   staged.
//! - One commit for all staged changes, after the loop.
//! - An optional push and an optional report upload are best-effort:
//!   their failures are recorded inline in the returned summary and
//!   never roll back the commit.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::strategy::{AppendStrategy, PatchStrategy, PatchSuggestion};
use crate::core::types::now_utc_rfc3339;
use crate::git::{Git, GitError};
use crate::store::BlobStore;

/// Commit message used for every patch commit.
pub const PATCH_COMMIT_MESSAGE: &str = "Apply automated security patches";

/// Errors that abort patch application.
///
/// Everything else (missing files, push/upload trouble) is absorbed
/// into the summary.
#[derive(Debug, Error)]
pub enum ApplyError {
    /// The target path is not a directory.
    #[error("invalid working copy path: {path}")]
    InvalidPath {
        /// The offending path
        path: String,
    },

    /// The target directory is not a Git working copy, or a branch,
    /// staging, or commit operation failed.
    #[error(transparent)]
    Git(#[from] GitError),
}

/// Per-item outcome recorded in the summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatchItemOutcome {
    /// The suggestion was merged and staged.
    Applied {
        /// Target file
        file: String,
        /// Issue description carried from the plan, if any
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        /// First 150 characters of the inserted text
        inserted_code: String,
    },
    /// The file existed but could not be patched.
    Failed {
        /// Target file
        file: String,
        /// I/O diagnostic
        error: String,
    },
}

/// Result of one patch application run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplySummary {
    /// Branch the commit landed on.
    pub branch: String,
    /// Number of files successfully patched and staged.
    pub patched_files: usize,
    /// Per-item outcomes (missing files are omitted entirely).
    pub details: Vec<PatchItemOutcome>,
    /// Storage location of the uploaded report, when one was written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_path: Option<String>,
    /// Report upload failure, when one occurred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_error: Option<String>,
    /// Push failure, when one occurred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_error: Option<String>,
}

/// Report blob uploaded after a run.
#[derive(Debug, Serialize)]
struct PatchReport<'a> {
    branch: &'a str,
    patched_files: usize,
    timestamp: String,
    patch_summary: &'a [PatchItemOutcome],
}

/// Applies patch plans to working copies.
pub struct PatchApplier {
    strategy: Arc<dyn PatchStrategy>,
    /// Push the new branch to `origin` after committing.
    push_remote: bool,
    /// HTTPS access token for the push.
    push_token: Option<String>,
}

impl Default for PatchApplier {
    fn default() -> Self {
        Self::new()
    }
}

impl PatchApplier {
    /// Applier with the append strategy and no push.
    pub fn new() -> Self {
        Self {
            strategy: Arc::new(AppendStrategy),
            push_remote: false,
            push_token: None,
        }
    }

    /// Use a different patch strategy.
    pub fn with_strategy(mut self, strategy: Arc<dyn PatchStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Push the branch to `origin` after committing.
    pub fn with_push(mut self, token: Option<String>) -> Self {
        self.push_remote = true;
        self.push_token = token;
        self
    }

    /// Branch name for a run starting now.
    fn branch_name() -> String {
        format!(
            "fix/autopatch-{}",
            chrono::Utc::now().format("%Y%m%d%H%M%S")
        )
    }

    /// Apply `patches` to the working copy at `work_dir`.
    ///
    /// When `report_store` is given, a JSON report is uploaded to
    /// `patch_reports/<branch>.json` after the commit.
    ///
    /// # Errors
    ///
    /// - [`ApplyError::InvalidPath`] if `work_dir` is not a directory
    /// - [`ApplyError::Git`] if it is not a working copy, or the
    ///   branch/commit machinery fails
    pub async fn apply(
        &self,
        work_dir: &Path,
        patches: &[PatchSuggestion],
        report_store: Option<Arc<dyn BlobStore>>,
    ) -> Result<ApplySummary, ApplyError> {
        if !work_dir.is_dir() {
            return Err(ApplyError::InvalidPath {
                path: work_dir.display().to_string(),
            });
        }
        let git = Git::open(work_dir)?;

        let branch = Self::branch_name();
        git.ensure_branch(&branch)?;
        info!(branch = %branch, patches = patches.len(), "applying patch plan");

        let mut details = Vec::new();
        let mut patched_files = 0usize;

        for patch in patches {
            let target = work_dir.join(&patch.file);
            if !target.is_file() {
                // Nonexistent targets are omitted from the summary.
                debug!(file = %patch.file, "skipping missing file");
                continue;
            }

            match self.patch_file(&git, work_dir, &target, patch) {
                Ok(inserted) => {
                    patched_files += 1;
                    details.push(PatchItemOutcome::Applied {
                        file: patch.file.clone(),
                        description: patch.description.clone(),
                        inserted_code: truncate_chars(&inserted, 150),
                    });
                }
                Err(error) => {
                    warn!(file = %patch.file, %error, "failed to patch file");
                    details.push(PatchItemOutcome::Failed {
                        file: patch.file.clone(),
                        error,
                    });
                }
            }
        }

        git.commit_staged(PATCH_COMMIT_MESSAGE)?;

        let push_error = if self.push_remote {
            match git.push_branch(&branch, self.push_token.as_deref()) {
                Ok(()) => None,
                Err(e) => {
                    warn!(branch = %branch, error = %e, "push failed; local commit kept");
                    Some(e.to_string())
                }
            }
        } else {
            None
        };

        let mut summary = ApplySummary {
            branch,
            patched_files,
            details,
            report_path: None,
            report_error: None,
            push_error,
        };

        if let Some(store) = report_store {
            self.upload_report(store.as_ref(), &mut summary).await;
        }

        info!(
            branch = %summary.branch,
            patched_files = summary.patched_files,
            "patch application complete"
        );
        Ok(summary)
    }

    /// Merge one suggestion into its file and stage the result.
    fn patch_file(
        &self,
        git: &Git,
        work_dir: &Path,
        target: &Path,
        patch: &PatchSuggestion,
    ) -> Result<String, String> {
        let original = std::fs::read_to_string(target).map_err(|e| e.to_string())?;
        let patched = self.strategy.apply(&original, &patch.suggestion);
        std::fs::write(target, &patched).map_err(|e| e.to_string())?;

        let rel = target.strip_prefix(work_dir).map_err(|e| e.to_string())?;
        git.stage_path(rel).map_err(|e| e.to_string())?;
        Ok(patch.suggestion.clone())
    }

    /// Best-effort report upload; failures land in the summary.
    async fn upload_report(&self, store: &dyn BlobStore, summary: &mut ApplySummary) {
        let key = format!("patch_reports/{}.json", summary.branch);
        let report = PatchReport {
            branch: &summary.branch,
            patched_files: summary.patched_files,
            timestamp: now_utc_rfc3339(),
            patch_summary: &summary.details,
        };
        let body = match serde_json::to_string_pretty(&report) {
            Ok(body) => body,
            Err(e) => {
                summary.report_error = Some(format!("failed to serialize report: {e}"));
                return;
            }
        };
        match store.put(&key, &body).await {
            Ok(()) => summary.report_path = Some(key),
            Err(e) => {
                warn!(key = %key, error = %e, "report upload failed");
                summary.report_error = Some(e.to_string());
            }
        }
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_name_shape() {
        let name = PatchApplier::branch_name();
        assert!(name.starts_with("fix/autopatch-"));
        let stamp = name.trim_start_matches("fix/autopatch-");
        assert_eq!(stamp.len(), 14);
        assert!(stamp.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn truncate_is_char_safe() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("日本語テキスト", 3), "日本語");
        assert_eq!(truncate_chars("ab", 150), "ab");
    }

    #[test]
    fn applied_outcome_serializes_without_null_description() {
        let outcome = PatchItemOutcome::Applied {
            file: "a.py".into(),
            description: None,
            inserted_code: "x".into(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert!(json.get("description").is_none());
        assert_eq!(json["file"], "a.py");
    }

    #[tokio::test]
    async fn apply_rejects_missing_directory() {
        let applier = PatchApplier::new();
        let err = applier
            .apply(Path::new("/nonexistent/never"), &[], None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApplyError::InvalidPath { .. }));
    }

    #[tokio::test]
    async fn apply_rejects_non_repo_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let applier = PatchApplier::new();
        let err = applier.apply(dir.path(), &[], None).await.unwrap_err();
        assert!(matches!(err, ApplyError::Git(GitError::NotARepo { .. })));
    }
}
