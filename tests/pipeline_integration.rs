//! End-to-end pipeline tests over deterministic collaborators.
//!
//! These exercise the scanner -> analyzer -> approval flow against a
//! local git repository, a static scan tool, and mocked
//! retrieval/generation services, checking the document invariants
//! after every stage write.

use std::path::Path;
use std::sync::Arc;

use mender::core::document::{parse_document, PENDING_ANALYSIS, PENDING_FIX};
use mender::core::types::{DocumentStatus, ReviewState, ScanId, Stage};
use mender::knowledge::MockKnowledgeBase;
use mender::model::{GenerationError, MockTextGenerator};
use mender::pipeline::{AnalyzerStage, ApprovalGate, GateAction, ScannerStage};
use mender::scanner::{RawExtra, RawPosition, RawResult, StaticScanTool};
use mender::store::MemoryBlobStore;

// =============================================================================
// Helpers
// =============================================================================

fn raw(check_id: &str, path: &str, line: u64, severity: &str) -> RawResult {
    RawResult {
        check_id: check_id.to_string(),
        path: path.to_string(),
        start: RawPosition { line },
        end: None,
        extra: RawExtra {
            severity: severity.to_string(),
            message: format!("message for {check_id}"),
            lines: format!("snippet at {path}:{line}"),
        },
    }
}

/// Three raw results with severities {error, warning, info}.
fn three_raw_results() -> Vec<RawResult> {
    vec![
        raw("rules.exec", "app/run.py", 12, "ERROR"),
        raw("rules.md5", "app/auth.py", 3, "WARNING"),
        raw("rules.debug", "app/settings.py", 1, "INFO"),
    ]
}

/// Seed a local repository reachable over file:// and return (guard, url, branch).
fn seed_repo() -> (tempfile::TempDir, String, String) {
    let dir = tempfile::TempDir::new().unwrap();
    let repo = git2::Repository::init(dir.path()).unwrap();
    let mut config = repo.config().unwrap();
    config.set_str("user.name", "tester").unwrap();
    config.set_str("user.email", "tester@example.com").unwrap();
    std::fs::write(dir.path().join("app.py"), "print('hi')\n").unwrap();
    let mut index = repo.index().unwrap();
    index.add_path(Path::new("app.py")).unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let sig = repo.signature().unwrap();
    repo.commit(Some("HEAD"), &sig, &sig, "initial", &tree, &[])
        .unwrap();
    let branch = repo.head().unwrap().shorthand().unwrap().to_string();
    let url = format!("file://{}", dir.path().display());
    (dir, url, branch)
}

fn good_fix(confidence: f64) -> String {
    format!(
        r#"{{"code": "fixed()", "explanation": "why", "references": ["CWE-89"], "confidence": {confidence}}}"#
    )
}

// =============================================================================
// Scanner -> Analyzer end-to-end
// =============================================================================

#[tokio::test]
async fn scanner_produces_expected_document_for_three_severities() {
    let (_src, url, branch) = seed_repo();
    let store = MemoryBlobStore::new();
    let stage = ScannerStage::new(
        Arc::new(StaticScanTool::with_results(three_raw_results())),
        Arc::new(store.clone()),
    );

    let outcome = stage
        .run(&url, &branch, Some(ScanId::new("scan_e2e").unwrap()))
        .await
        .unwrap();
    assert_eq!(outcome.findings_count, 3);

    let doc = parse_document(&store.peek("scan-results/scan_e2e/result.json").unwrap()).unwrap();
    assert_eq!(doc.stats.total_findings, 3);
    assert_eq!(doc.stats.high_severity, 1);
    assert_eq!(doc.stats.medium_severity, 1);
    assert_eq!(doc.stats.low_severity, 1);
    assert_eq!(doc.stats.total_files_scanned, 3);
    assert!(doc.patch_plan.is_empty());
    assert_eq!(doc.status, DocumentStatus::Scanned);

    // Pre-analysis placeholders are in place.
    for finding in &doc.findings {
        assert_eq!(finding.llm_analysis, PENDING_ANALYSIS);
        assert_eq!(finding.recommended_fix, PENDING_FIX);
    }
}

#[tokio::test]
async fn analyzer_enriches_scanned_document() {
    let (_src, url, branch) = seed_repo();
    let store = MemoryBlobStore::new();
    let scan_id = ScanId::new("scan_e2e").unwrap();

    ScannerStage::new(
        Arc::new(StaticScanTool::with_results(three_raw_results())),
        Arc::new(store.clone()),
    )
    .run(&url, &branch, Some(scan_id.clone()))
    .await
    .unwrap();

    let analyzer = AnalyzerStage::new(
        Arc::new(MockKnowledgeBase::empty()),
        Arc::new(MockTextGenerator::always(good_fix(0.9))),
        Arc::new(store.clone()),
    );
    let outcome = analyzer.run(&scan_id).await.unwrap();
    assert_eq!(outcome.remediations_count, 3);

    let doc = parse_document(&store.peek(&scan_id.result_key()).unwrap()).unwrap();
    assert_eq!(doc.status, DocumentStatus::Analyzed);
    assert_eq!(doc.stage, Stage::Analyzer);
    assert_eq!(doc.patch_plan.len(), 3);
    assert_eq!(doc.stats.total_remediations, Some(3));
    assert_eq!(doc.stats.total_findings, 3);

    // Every plan entry references an existing finding.
    for entry in &doc.patch_plan {
        assert!(doc.finding(&entry.finding_id).is_some());
        assert_eq!(entry.confidence, 0.9);
    }

    // The analyzer never changes id, file, or line.
    let ids: Vec<&str> = doc.findings.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["finding_0", "finding_1", "finding_2"]);
    assert_eq!(doc.findings[0].file, "app/run.py");
    assert_eq!(doc.findings[0].line, 12);
}

#[tokio::test]
async fn partial_failure_keeps_all_findings_and_shortens_plan() {
    let (_src, url, branch) = seed_repo();
    let store = MemoryBlobStore::new();
    let scan_id = ScanId::new("scan_partial").unwrap();

    ScannerStage::new(
        Arc::new(StaticScanTool::with_results(three_raw_results())),
        Arc::new(store.clone()),
    )
    .run(&url, &branch, Some(scan_id.clone()))
    .await
    .unwrap();

    // Enrichment of the second finding fails; the others succeed.
    let generator = MockTextGenerator::with_responses(vec![
        Ok(good_fix(0.9)),
        Err(GenerationError::NetworkError("simulated outage".into())),
        Ok(good_fix(0.9)),
    ]);
    AnalyzerStage::new(
        Arc::new(MockKnowledgeBase::empty()),
        Arc::new(generator),
        Arc::new(store.clone()),
    )
    .run(&scan_id)
    .await
    .unwrap();

    let doc = parse_document(&store.peek(&scan_id.result_key()).unwrap()).unwrap();
    // All N findings present, plan of length N-1.
    assert_eq!(doc.findings.len(), 3);
    assert_eq!(doc.patch_plan.len(), 2);
    assert_eq!(doc.stats.total_remediations, Some(2));

    let skipped = doc.finding("finding_1").unwrap();
    assert_eq!(skipped.llm_analysis, PENDING_ANALYSIS);
    assert!(!doc.patch_plan.iter().any(|e| e.finding_id == "finding_1"));
}

// =============================================================================
// Approval gate over analyzed documents
// =============================================================================

#[tokio::test]
async fn approval_gate_round_trip_on_analyzed_document() {
    let (_src, url, branch) = seed_repo();
    let store = MemoryBlobStore::new();
    let scan_id = ScanId::new("scan_gate").unwrap();

    ScannerStage::new(
        Arc::new(StaticScanTool::with_results(three_raw_results())),
        Arc::new(store.clone()),
    )
    .run(&url, &branch, Some(scan_id.clone()))
    .await
    .unwrap();
    AnalyzerStage::new(
        Arc::new(MockKnowledgeBase::empty()),
        Arc::new(MockTextGenerator::always(good_fix(0.9))),
        Arc::new(store.clone()),
    )
    .run(&scan_id)
    .await
    .unwrap();

    let gate = ApprovalGate::new(Arc::new(store.clone()));

    // Approve then reject: the last action is authoritative.
    gate.apply(&scan_id, "finding_0", GateAction::Approve)
        .await
        .unwrap();
    gate.apply(&scan_id, "finding_0", GateAction::Reject)
        .await
        .unwrap();

    let doc = parse_document(&store.peek(&scan_id.result_key()).unwrap()).unwrap();
    assert_eq!(
        doc.finding("finding_0").unwrap().review_state,
        ReviewState::Rejected
    );
    // Gate writes preserve stage metadata and the stats invariant.
    assert_eq!(doc.status, DocumentStatus::Analyzed);
    assert_eq!(doc.stats.total_findings, doc.findings.len() as u64);
}

#[tokio::test]
async fn stage_sequence_performs_one_write_each() {
    let (_src, url, branch) = seed_repo();
    let store = MemoryBlobStore::new();
    let scan_id = ScanId::new("scan_writes").unwrap();

    ScannerStage::new(
        Arc::new(StaticScanTool::with_results(three_raw_results())),
        Arc::new(store.clone()),
    )
    .run(&url, &branch, Some(scan_id.clone()))
    .await
    .unwrap();
    assert_eq!(store.put_count(), 1);

    AnalyzerStage::new(
        Arc::new(MockKnowledgeBase::empty()),
        Arc::new(MockTextGenerator::always(good_fix(0.9))),
        Arc::new(store.clone()),
    )
    .run(&scan_id)
    .await
    .unwrap();
    assert_eq!(store.put_count(), 2);
}
