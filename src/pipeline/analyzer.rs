//! pipeline::analyzer
//!
//! Analyzer stage: per-finding enrichment with retrieved knowledge and
//! generated fixes.
//!
//! # Contract
//!
//! Given an existing scan id, load its document, enrich every finding
//! independently, and persist `status=analyzed` as one full overwrite.
//!
//! Per finding: retrieve remediation context (passages with relevance
//! strictly above 0.5, at most 5 kept, top 3 embedded in the prompt),
//! ask the reasoning service for a structured fix, merge it into the
//! finding, and append a patch-plan entry. A failure of retrieval or
//! generation for one finding leaves that finding unmodified and moves
//! on; a single finding can never abort the stage. An unparseable
//! response is not a failure: it degrades to the zero-confidence
//! sentinel fix via [`recover_fix`].

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::core::document::{
    parse_document, Analysis, DocumentError, Finding, PatchPlanEntry, Stats,
};
use crate::core::types::{now_utc_rfc3339, DocumentStatus, ScanId, Stage};
use crate::knowledge::{filter_passages, KnowledgeBase, Passage, RetrievalQuery};
use crate::model::{
    classify_response, recover_fix, FixRecord, GenerationRequest, TextGenerator,
};
use crate::store::{BlobStore, StoreError};

/// Passages embedded into the fix prompt.
const PROMPT_PASSAGES: usize = 3;

/// Errors that abort the analyzer stage.
#[derive(Debug, Error)]
pub enum AnalyzerError {
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
}

/// Result of an analyzer stage run.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    /// Identifier of the pipeline run.
    pub scan_id: ScanId,
    /// Patch-plan entries produced.
    pub remediations_count: usize,
    /// Storage key the document was written to.
    pub result_key: String,
}

/// Build the remediation prompt for one finding.
///
/// Embeds the finding's full detail, its snippet fenced, and up to
/// three retrieved passages ordered by descending relevance, each
/// labeled with its score to two decimals.
pub fn build_fix_prompt(finding: &Finding, passages: &[Passage]) -> String {
    let context_text = passages
        .iter()
        .take(PROMPT_PASSAGES)
        .map(|p| format!("Reference (relevance: {:.2}):\n{}", p.score, p.text))
        .collect::<Vec<_>>()
        .join("\n\n");
    let context_text = if context_text.is_empty() {
        "No specific standards found. Use general security best practices.".to_string()
    } else {
        context_text
    };

    format!(
        "You are a security expert analyzing a code vulnerability. Generate a secure fix based on industry standards.\n\
         \n\
         VULNERABILITY DETAILS:\n\
         - Type: {rule}\n\
         - File: {file}\n\
         - Line: {line}\n\
         - Severity: {severity}\n\
         - Description: {description}\n\
         \n\
         VULNERABLE CODE:\n\
         ```\n\
         {snippet}\n\
         ```\n\
         \n\
         SECURITY STANDARDS CONTEXT (from CWE/OWASP):\n\
         {context_text}\n\
         \n\
         TASK:\n\
         Generate a secure code fix that addresses this vulnerability. Provide:\n\
         1. The corrected code (only the fixed lines, maintain formatting)\n\
         2. A clear explanation of what was wrong and how the fix addresses it\n\
         3. Any relevant CWE/OWASP references\n\
         \n\
         Format your response as JSON:\n\
         {{\n\
         \"code\": \"corrected code here\",\n\
         \"explanation\": \"explanation of the fix\",\n\
         \"references\": [\"CWE-89\", \"OWASP A03:2021\"],\n\
         \"confidence\": 0.95\n\
         }}\n\
         \n\
         Respond ONLY with valid JSON, no additional text.",
        rule = finding.rule,
        file = finding.file,
        line = finding.line,
        severity = finding.severity,
        description = finding.description,
        snippet = finding.code_snippet,
    )
}

/// The analyzer stage.
pub struct AnalyzerStage {
    knowledge: Arc<dyn KnowledgeBase>,
    generator: Arc<dyn TextGenerator>,
    store: Arc<dyn BlobStore>,
}

impl AnalyzerStage {
    /// Create a stage with its collaborator handles.
    pub fn new(
        knowledge: Arc<dyn KnowledgeBase>,
        generator: Arc<dyn TextGenerator>,
        store: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            knowledge,
            generator,
            store,
        }
    }

    /// Run the stage over a stored document.
    ///
    /// # Errors
    ///
    /// - [`AnalyzerError::DocumentNotFound`] when `scan_id` resolves to
    ///   nothing; the stage aborts before mutating anything
    /// - [`AnalyzerError::Document`]/[`AnalyzerError::Store`] for
    ///   storage and schema failures
    pub async fn run(&self, scan_id: &ScanId) -> Result<AnalysisOutcome, AnalyzerError> {
        let result_key = scan_id.result_key();
        let json = self
            .store
            .get(&result_key)
            .await?
            .ok_or_else(|| AnalyzerError::DocumentNotFound {
                scan_id: scan_id.clone(),
            })?;
        let mut document = parse_document(&json)?;

        info!(
            scan_id = %scan_id,
            findings = document.findings.len(),
            "analyzer stage starting"
        );

        let mut patch_plan = Vec::new();
        let total = document.findings.len();
        for (index, finding) in document.findings.iter_mut().enumerate() {
            info!(
                scan_id = %scan_id,
                finding = %finding.id,
                rule = %finding.rule,
                current = index + 1,
                total,
                "processing finding"
            );

            match self.generate_fix(finding).await {
                Ok(fix) => {
                    patch_plan.push(merge_fix(finding, &fix));
                }
                Err(error) => {
                    // Per-finding containment: carry the finding over
                    // unmodified and keep going.
                    warn!(
                        scan_id = %scan_id,
                        finding = %finding.id,
                        error = %error,
                        "enrichment failed; finding carried over unmodified"
                    );
                }
            }
        }

        document.analysis = Analysis {
            summary: format!(
                "Automated analysis complete for {} findings.",
                document.findings.len()
            ),
            findings: document.findings.iter().map(|f| f.id.clone()).collect(),
        };
        document.stats = Stats::for_analysis(&document.findings, &patch_plan);
        document.patch_plan = patch_plan;
        document.status = DocumentStatus::Analyzed;
        document.stage = Stage::Analyzer;
        document.timestamp = now_utc_rfc3339();

        self.store
            .put(&result_key, &document.to_json_pretty()?)
            .await?;

        let remediations_count = document.patch_plan.len();
        info!(
            scan_id = %scan_id,
            remediations = remediations_count,
            "analysis complete"
        );
        Ok(AnalysisOutcome {
            scan_id: scan_id.clone(),
            remediations_count,
            result_key,
        })
    }

    /// Retrieval plus generation for one finding.
    ///
    /// Errors are stringified here: the caller only ever absorbs them
    /// into the per-finding skip, so the typed detail would be lost
    /// anyway and the text lands in the log.
    async fn generate_fix(&self, finding: &Finding) -> Result<FixRecord, String> {
        let query = RetrievalQuery::for_vulnerability(&finding.rule, &finding.description);
        let passages = self
            .knowledge
            .retrieve(&query)
            .await
            .map_err(|e| e.to_string())?;
        let passages = filter_passages(passages);

        let prompt = build_fix_prompt(finding, &passages);
        let response = self
            .generator
            .generate(&GenerationRequest::for_fix(prompt))
            .await
            .map_err(|e| e.to_string())?;

        Ok(recover_fix(
            classify_response(&response),
            &finding.code_snippet,
        ))
    }
}

/// Merge a fix into its finding and build the patch-plan entry.
fn merge_fix(finding: &mut Finding, fix: &FixRecord) -> PatchPlanEntry {
    let fixed_code = if fix.code.is_empty() {
        finding.code_snippet.clone()
    } else {
        fix.code.clone()
    };

    finding.llm_analysis = fix.explanation.clone();
    finding.recommended_fix = fixed_code.clone();
    finding.confidence = fix.confidence;

    PatchPlanEntry {
        finding_id: finding.id.clone(),
        file: finding.file.clone(),
        line: finding.line,
        end_line: finding.end_line_or_line(),
        vulnerability: finding.rule.clone(),
        severity: finding.severity,
        original_code: finding.code_snippet.clone(),
        fixed_code,
        explanation: fix.explanation.clone(),
        references: fix.references.clone(),
        confidence: fix.confidence,
    }
}
