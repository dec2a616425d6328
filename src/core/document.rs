//! core::document
//!
//! Scan document schema: the aggregate JSON record tracking a scan's
//! findings, patch plan, and stats across pipeline stages.
//!
//! # Schema Design
//!
//! The document is persisted as a single pretty-printed JSON blob at
//! `scan-results/<scan_id>/result.json` and rewritten whole on every
//! stage transition. Parsing is strict (unknown fields rejected) and
//! followed by invariant validation:
//!
//! - `stats.total_findings` equals the number of findings
//! - every patch-plan entry references an existing finding id
//!
//! # Lifecycle
//!
//! Created by the scanner stage (`status=scanned`), enriched in place by
//! the analyzer stage (`status=analyzed`), mutated by zero or more
//! approval gate actions, and consumed read-only by the patch applier.
//!
//! # Example
//!
//! ```
//! use mender::core::document::{Finding, ScanDocument, parse_document};
//! use mender::core::types::{ScanId, Severity};
//!
//! let finding = Finding::new(
//!     "finding_0",
//!     Severity::High,
//!     "rules.sql-injection",
//!     "src/db.py",
//!     42,
//!     "User input flows into a SQL query.",
//!     "cursor.execute(q)",
//! );
//! let doc = ScanDocument::new(
//!     ScanId::new("scan_0a1b2c3d4e5f").unwrap(),
//!     "https://example.com/repo.git",
//!     vec![finding],
//! );
//!
//! assert_eq!(doc.stats.total_findings, 1);
//! assert_eq!(doc.stats.high_severity, 1);
//!
//! let json = doc.to_json_pretty().unwrap();
//! let parsed = parse_document(&json).unwrap();
//! assert_eq!(parsed.scan_id.as_str(), "scan_0a1b2c3d4e5f");
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::{now_utc_rfc3339, DocumentStatus, ReviewState, ScanId, Severity, Stage};

/// Placeholder analysis text before the analyzer stage runs.
pub const PENDING_ANALYSIS: &str = "Pending AI-driven analysis.";

/// Placeholder fix text before the analyzer stage runs.
pub const PENDING_FIX: &str = "Pending recommendation.";

/// Placeholder confidence before the analyzer stage runs.
pub const INITIAL_CONFIDENCE: f64 = 0.9;

/// Analysis summary written by the scanner stage.
pub const INITIAL_SUMMARY: &str = "Initial scan complete. Awaiting LLM analysis.";

/// Errors from document parsing and validation.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The JSON is malformed or fails strict field checks.
    #[error("failed to parse scan document: {0}")]
    ParseError(String),

    /// Serialization failed.
    #[error("failed to serialize scan document: {0}")]
    SerializeError(String),

    /// A patch-plan entry references a finding id that does not exist.
    #[error("patch plan references unknown finding: {finding_id}")]
    OrphanedRemediation {
        /// The dangling finding id
        finding_id: String,
    },

    /// `stats.total_findings` disagrees with the findings list.
    #[error("stats.total_findings is {recorded} but document has {actual} findings")]
    StatsMismatch {
        /// Value recorded in stats
        recorded: u64,
        /// Actual findings count
        actual: u64,
    },
}

/// One normalized static-analysis result.
///
/// The atomic unit processed by every stage. `id`, `file`, and `line`
/// are fixed at scanner time and never change afterwards; the analyzer
/// only fills in `llm_analysis`, `recommended_fix`, and `confidence`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Finding {
    /// Identifier unique within the scan document (`finding_<index>`).
    pub id: String,

    /// Normalized severity.
    pub severity: Severity,

    /// Rule/check identifier from the scan tool (opaque).
    #[serde(rename = "type")]
    pub rule: String,

    /// File the finding was reported in, relative to the repo root.
    pub file: String,

    /// First reported line.
    pub line: u64,

    /// Last reported line; defaults to `line` when the tool gave none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_line: Option<u64>,

    /// Tool message for the finding.
    pub description: String,

    /// Source excerpt the tool attached.
    pub code_snippet: String,

    /// Remediation explanation; [`PENDING_ANALYSIS`] until analyzed.
    pub llm_analysis: String,

    /// Suggested replacement code; [`PENDING_FIX`] until analyzed.
    pub recommended_fix: String,

    /// Remediation confidence in `[0, 1]`.
    pub confidence: f64,

    /// Approval gate state; omitted from JSON while pending.
    #[serde(default, skip_serializing_if = "ReviewState::is_pending")]
    pub review_state: ReviewState,
}

impl Finding {
    /// Create a finding with pre-analysis placeholder fields.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        severity: Severity,
        rule: impl Into<String>,
        file: impl Into<String>,
        line: u64,
        description: impl Into<String>,
        code_snippet: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            severity,
            rule: rule.into(),
            file: file.into(),
            line,
            end_line: None,
            description: description.into(),
            code_snippet: code_snippet.into(),
            llm_analysis: PENDING_ANALYSIS.to_string(),
            recommended_fix: PENDING_FIX.to_string(),
            confidence: INITIAL_CONFIDENCE,
            review_state: ReviewState::Pending,
        }
    }

    /// Last reported line, falling back to the first line.
    pub fn end_line_or_line(&self) -> u64 {
        self.end_line.unwrap_or(self.line)
    }

    /// Whether the analyzer has enriched this finding.
    pub fn is_enriched(&self) -> bool {
        self.llm_analysis != PENDING_ANALYSIS
    }
}

/// One proposed remediation in the patch plan.
///
/// At most one entry exists per finding that successfully produced a
/// fix; findings whose enrichment failed have no entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatchPlanEntry {
    /// The finding this remediation addresses.
    pub finding_id: String,
    /// Target file, relative to the repo root.
    pub file: String,
    /// First affected line.
    pub line: u64,
    /// Last affected line.
    pub end_line: u64,
    /// Vulnerability rule identifier.
    pub vulnerability: String,
    /// Severity of the underlying finding.
    pub severity: Severity,
    /// Code as reported by the scanner.
    pub original_code: String,
    /// Proposed replacement code.
    pub fixed_code: String,
    /// Explanation of the fix.
    pub explanation: String,
    /// Standards references (e.g. CWE/OWASP identifiers).
    pub references: Vec<String>,
    /// Fix confidence in `[0, 1]`; `0.0` marks a sentinel fallback.
    pub confidence: f64,
}

/// Reserved dependency-audit section.
///
/// Always present; the scanner stage writes it empty. No dependency
/// scanner exists in this pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependencyVulnerabilities {
    /// Count of dependency vulnerabilities (always 0).
    pub total_vulnerabilities: u64,
    /// Dependency vulnerability records (always empty).
    pub vulnerabilities: Vec<serde_json::Value>,
}

/// Human-readable analysis summary plus the ids it covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Analysis {
    /// One-line summary of the last analysis pass.
    pub summary: String,
    /// Ids of the findings considered.
    pub findings: Vec<String>,
}

/// Aggregate counters over the document.
///
/// Recomputed from the current `findings`/`patch_plan` contents on
/// every stage write; never incremented or carried over stale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Stats {
    /// Distinct files among the findings.
    pub total_files_scanned: u64,
    /// Number of findings; always equals `findings.len()`.
    pub total_findings: u64,
    /// Findings with high severity.
    pub high_severity: u64,
    /// Findings with medium severity.
    pub medium_severity: u64,
    /// Findings with low severity.
    pub low_severity: u64,
    /// Patch-plan entries with a usable (non-sentinel) fix.
    pub auto_fixable: u64,
    /// Patch-plan length; absent before the analyzer runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_remediations: Option<u64>,
}

impl Stats {
    /// Compute scanner-stage stats from normalized findings.
    ///
    /// `total_remediations` stays absent and `auto_fixable` is 0
    /// because no patch plan exists yet.
    pub fn for_scan(findings: &[Finding]) -> Self {
        let mut stats = Self::severity_counts(findings);
        stats.total_remediations = None;
        stats.auto_fixable = 0;
        stats
    }

    /// Compute analyzer-stage stats from findings and the patch plan.
    ///
    /// Severity sub-counts stay derived from findings (unknown-severity
    /// findings count toward `total_findings` only); the plan contributes
    /// `total_remediations` and `auto_fixable`.
    pub fn for_analysis(findings: &[Finding], patch_plan: &[PatchPlanEntry]) -> Self {
        let mut stats = Self::severity_counts(findings);
        stats.total_remediations = Some(patch_plan.len() as u64);
        stats.auto_fixable = patch_plan.iter().filter(|e| e.confidence > 0.0).count() as u64;
        stats
    }

    fn severity_counts(findings: &[Finding]) -> Self {
        let distinct_files: HashSet<&str> = findings.iter().map(|f| f.file.as_str()).collect();
        Self {
            total_files_scanned: distinct_files.len() as u64,
            total_findings: findings.len() as u64,
            high_severity: count_severity(findings, Severity::High),
            medium_severity: count_severity(findings, Severity::Medium),
            low_severity: count_severity(findings, Severity::Low),
            auto_fixable: 0,
            total_remediations: None,
        }
    }
}

fn count_severity(findings: &[Finding], severity: Severity) -> u64 {
    findings.iter().filter(|f| f.severity == severity).count() as u64
}

/// The aggregate scan record threaded through the whole pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanDocument {
    /// Identifier of this pipeline run.
    pub scan_id: ScanId,
    /// RFC3339 timestamp of the last stage write.
    pub timestamp: String,
    /// Source repository location.
    pub repo_url: String,
    /// Findings in scanner discovery order; order is stable thereafter.
    pub findings: Vec<Finding>,
    /// Proposed remediations, at most one per finding.
    pub patch_plan: Vec<PatchPlanEntry>,
    /// Reserved dependency-audit section (always empty).
    pub dependency_vulnerabilities: DependencyVulnerabilities,
    /// Summary of the last analysis pass.
    pub analysis: Analysis,
    /// Aggregate counters, recomputed on every stage write.
    pub stats: Stats,
    /// Stage that last wrote the document.
    pub stage: Stage,
    /// Coarse pipeline phase.
    pub status: DocumentStatus,
}

impl ScanDocument {
    /// Build the initial (scanner-stage) document from normalized findings.
    pub fn new(scan_id: ScanId, repo_url: impl Into<String>, findings: Vec<Finding>) -> Self {
        let stats = Stats::for_scan(&findings);
        let analysis = Analysis {
            summary: INITIAL_SUMMARY.to_string(),
            findings: findings.iter().map(|f| f.id.clone()).collect(),
        };
        Self {
            scan_id,
            timestamp: now_utc_rfc3339(),
            repo_url: repo_url.into(),
            findings,
            patch_plan: Vec::new(),
            dependency_vulnerabilities: DependencyVulnerabilities::default(),
            analysis,
            stats,
            stage: Stage::Scanner,
            status: DocumentStatus::Scanned,
        }
    }

    /// Look up a finding by id (linear scan; documents are small).
    pub fn finding(&self, finding_id: &str) -> Option<&Finding> {
        self.findings.iter().find(|f| f.id == finding_id)
    }

    /// Mutable lookup of a finding by id.
    pub fn finding_mut(&mut self, finding_id: &str) -> Option<&mut Finding> {
        self.findings.iter_mut().find(|f| f.id == finding_id)
    }

    /// Set the review state of a finding.
    ///
    /// Returns `false` (leaving the document untouched) when no finding
    /// has the given id.
    pub fn set_review_state(&mut self, finding_id: &str, state: ReviewState) -> bool {
        match self.finding_mut(finding_id) {
            Some(finding) => {
                finding.review_state = state;
                true
            }
            None => false,
        }
    }

    /// Validate document invariants.
    ///
    /// # Errors
    ///
    /// - [`DocumentError::StatsMismatch`] if `stats.total_findings`
    ///   disagrees with the findings list
    /// - [`DocumentError::OrphanedRemediation`] if a patch-plan entry
    ///   references a finding id that does not exist
    pub fn validate(&self) -> Result<(), DocumentError> {
        let actual = self.findings.len() as u64;
        if self.stats.total_findings != actual {
            return Err(DocumentError::StatsMismatch {
                recorded: self.stats.total_findings,
                actual,
            });
        }

        let ids: HashSet<&str> = self.findings.iter().map(|f| f.id.as_str()).collect();
        for entry in &self.patch_plan {
            if !ids.contains(entry.finding_id.as_str()) {
                return Err(DocumentError::OrphanedRemediation {
                    finding_id: entry.finding_id.clone(),
                });
            }
        }

        Ok(())
    }

    /// Serialize to the persisted pretty-printed form.
    pub fn to_json_pretty(&self) -> Result<String, DocumentError> {
        serde_json::to_string_pretty(self).map_err(|e| DocumentError::SerializeError(e.to_string()))
    }
}

/// Parse a scan document from JSON and validate its invariants.
///
/// # Errors
///
/// Returns [`DocumentError::ParseError`] for malformed JSON or unknown
/// fields, plus any invariant violation from [`ScanDocument::validate`].
///
/// # Example
///
/// ```
/// use mender::core::document::parse_document;
///
/// assert!(parse_document("not json").is_err());
/// ```
pub fn parse_document(json: &str) -> Result<ScanDocument, DocumentError> {
    let doc: ScanDocument =
        serde_json::from_str(json).map_err(|e| DocumentError::ParseError(e.to_string()))?;
    doc.validate()?;
    Ok(doc)
}
