//! pipeline::approval
//!
//! Approval gate: flip a finding's review state inside a persisted
//! document.
//!
//! # Contract
//!
//! Load the document, find the finding by linear scan, set its state,
//! persist. An unknown scan id is a not-found error; an unknown
//! finding id is a silent no-op (the document is persisted unchanged
//! and the caller still sees success). The last gate action wins:
//! approve-after-reject leaves the finding approved, and vice versa.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::core::document::{parse_document, DocumentError};
use crate::core::types::{ReviewState, ScanId};
use crate::store::{BlobStore, StoreError};

/// A gate action requested by a reviewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateAction {
    /// Approve the finding's remediation.
    Approve,
    /// Reject the finding's remediation.
    Reject,
}

impl GateAction {
    /// The review state this action establishes.
    pub fn review_state(&self) -> ReviewState {
        match self {
            GateAction::Approve => ReviewState::Approved,
            GateAction::Reject => ReviewState::Rejected,
        }
    }
}

/// Errors from the approval gate.
#[derive(Debug, Error)]
pub enum ApprovalError {
    /// No document is stored for the scan id.
    #[error("no scan document found for {scan_id}")]
    ScanNotFound {
        /// The unresolved scan id
        scan_id: ScanId,
    },

    /// The stored document is unreadable or violates invariants.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Storage failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The approval gate.
pub struct ApprovalGate {
    store: Arc<dyn BlobStore>,
}

impl ApprovalGate {
    /// Create a gate over the given store.
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Apply a gate action to one finding.
    ///
    /// Returns whether the finding id matched. An unmatched id still
    /// persists the (unchanged) document and returns `Ok(false)`.
    ///
    /// # Errors
    ///
    /// - [`ApprovalError::ScanNotFound`] when the scan id is unknown
    /// - [`ApprovalError::Document`]/[`ApprovalError::Store`] for
    ///   storage and schema failures
    pub async fn apply(
        &self,
        scan_id: &ScanId,
        finding_id: &str,
        action: GateAction,
    ) -> Result<bool, ApprovalError> {
        let key = scan_id.result_key();
        let json = self
            .store
            .get(&key)
            .await?
            .ok_or_else(|| ApprovalError::ScanNotFound {
                scan_id: scan_id.clone(),
            })?;
        let mut document = parse_document(&json)?;

        let state = action.review_state();
        let matched = document.set_review_state(finding_id, state);
        if matched {
            info!(scan_id = %scan_id, finding_id, state = ?state, "review state updated");
        } else {
            warn!(scan_id = %scan_id, finding_id, "finding not found; document unchanged");
        }

        self.store.put(&key, &document.to_json_pretty()?).await?;
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::document::{Finding, ScanDocument};
    use crate::core::types::Severity;
    use crate::store::MemoryBlobStore;

    fn seeded() -> (MemoryBlobStore, ScanId) {
        let scan_id = ScanId::new("scan_gate").unwrap();
        let doc = ScanDocument::new(
            scan_id.clone(),
            "https://example.com/repo.git",
            vec![
                Finding::new("finding_0", Severity::High, "rules.a", "a.py", 1, "d", "c"),
                Finding::new("finding_1", Severity::Low, "rules.b", "b.py", 2, "d", "c"),
            ],
        );
        let store =
            MemoryBlobStore::with_blob(scan_id.result_key(), doc.to_json_pretty().unwrap());
        (store, scan_id)
    }

    fn stored_doc(store: &MemoryBlobStore, scan_id: &ScanId) -> ScanDocument {
        parse_document(&store.peek(&scan_id.result_key()).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn approve_sets_state_and_persists() {
        let (store, scan_id) = seeded();
        let gate = ApprovalGate::new(Arc::new(store.clone()));

        let matched = gate
            .apply(&scan_id, "finding_0", GateAction::Approve)
            .await
            .unwrap();
        assert!(matched);

        let doc = stored_doc(&store, &scan_id);
        assert_eq!(
            doc.finding("finding_0").unwrap().review_state,
            ReviewState::Approved
        );
        assert_eq!(
            doc.finding("finding_1").unwrap().review_state,
            ReviewState::Pending
        );
    }

    #[tokio::test]
    async fn last_action_wins() {
        let (store, scan_id) = seeded();
        let gate = ApprovalGate::new(Arc::new(store.clone()));

        gate.apply(&scan_id, "finding_0", GateAction::Approve)
            .await
            .unwrap();
        gate.apply(&scan_id, "finding_0", GateAction::Reject)
            .await
            .unwrap();
        assert_eq!(
            stored_doc(&store, &scan_id)
                .finding("finding_0")
                .unwrap()
                .review_state,
            ReviewState::Rejected
        );

        // And approve-after-reject clears the rejection.
        gate.apply(&scan_id, "finding_0", GateAction::Approve)
            .await
            .unwrap();
        assert_eq!(
            stored_doc(&store, &scan_id)
                .finding("finding_0")
                .unwrap()
                .review_state,
            ReviewState::Approved
        );
    }

    #[tokio::test]
    async fn unknown_finding_is_silent_noop_with_persist() {
        let (store, scan_id) = seeded();
        let before = stored_doc(&store, &scan_id);
        let gate = ApprovalGate::new(Arc::new(store.clone()));

        let matched = gate
            .apply(&scan_id, "finding_99", GateAction::Reject)
            .await
            .unwrap();
        assert!(!matched);

        // The document was rewritten, unchanged.
        assert_eq!(stored_doc(&store, &scan_id), before);
        assert_eq!(store.put_count(), 1);
    }

    #[tokio::test]
    async fn unknown_scan_id_is_not_found() {
        let store = MemoryBlobStore::new();
        let gate = ApprovalGate::new(Arc::new(store));
        let err = gate
            .apply(
                &ScanId::new("scan_missing").unwrap(),
                "finding_0",
                GateAction::Approve,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApprovalError::ScanNotFound { .. }));
    }
}
