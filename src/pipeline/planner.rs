//! pipeline::planner
//!
//! Patch planner: one reasoning-service call over a findings summary,
//! with a fallback that never fails.
//!
//! # Contract
//!
//! The planner embeds the whole findings summary in a single prompt
//! (truncated to a fixed character budget) and expects a JSON list of
//! `{file, line, suggestion}` records back. A parseable non-list or
//! free-text response degrades to a single item carrying the raw text;
//! a failed call degrades to one "review manually" placeholder per
//! finding. This is the terminal error-absorption point: `plan` cannot
//! return an error.

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::core::document::Finding;
use crate::model::{GenerationRequest, TextGenerator};
use crate::patch::PatchSuggestion;

/// Character budget for the findings summary embedded in the prompt.
pub const MAX_SUMMARY_CHARS: usize = 8000;

/// Placeholder suggestion when the response was usable text but not a list.
pub const REVIEW_MANUALLY: &str = "# TODO: Review this issue manually.";

/// Placeholder suggestion when the call failed entirely.
pub const REVIEW_LINE: &str = "# TODO: Review this vulnerable line";

/// Condensed finding shape embedded in the planning prompt.
#[derive(Debug, Serialize)]
struct FindingSummary<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    rule: &'a str,
    severity: String,
    file: &'a str,
    line: u64,
    description: &'a str,
    code_snippet: &'a str,
}

impl<'a> From<&'a Finding> for FindingSummary<'a> {
    fn from(f: &'a Finding) -> Self {
        Self {
            id: &f.id,
            rule: &f.rule,
            severity: f.severity.to_string(),
            file: &f.file,
            line: f.line,
            description: &f.description,
            code_snippet: &f.code_snippet,
        }
    }
}

/// Build the planning prompt over a findings summary.
fn build_plan_prompt(findings: &[Finding]) -> String {
    let summaries: Vec<FindingSummary<'_>> = findings.iter().map(Into::into).collect();
    let summary_json = serde_json::to_string(&summaries).unwrap_or_else(|_| "[]".to_string());
    let summary_json = truncate_chars(&summary_json, MAX_SUMMARY_CHARS);

    format!(
        "You are a senior security engineer. For each static-analysis finding below, \
         propose minimal, secure, context-aware code patches. \
         Output strictly as JSON in this format:\n\n\
         [{{\"file\": \"<path>\", \"line\": <line_number>, \"suggestion\": \"<patch>\"}}]\n\n\
         Findings:\n{summary_json}"
    )
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// The patch planner.
pub struct PatchPlanner {
    generator: Arc<dyn TextGenerator>,
}

impl PatchPlanner {
    /// Create a planner with its generator handle.
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Produce an ordered patch plan for the findings.
    ///
    /// This function absorbs every failure into a best-effort fallback
    /// and never errors.
    pub async fn plan(&self, findings: &[Finding]) -> Vec<PatchSuggestion> {
        let prompt = build_plan_prompt(findings);
        let response = self
            .generator
            .generate(&GenerationRequest::for_plan(prompt))
            .await;

        match response {
            Ok(text) => parse_plan_response(&text),
            Err(error) => {
                warn!(error = %error, "patch planning call failed; using per-finding placeholders");
                findings
                    .iter()
                    .map(|f| PatchSuggestion {
                        file: f.file.clone(),
                        line: f.line,
                        suggestion: REVIEW_LINE.to_string(),
                        description: None,
                    })
                    .collect()
            }
        }
    }
}

/// Interpret the planner's response text.
///
/// A JSON list parses directly; anything else becomes a single
/// placeholder item carrying the raw text (or [`REVIEW_MANUALLY`] when
/// the text is empty).
fn parse_plan_response(text: &str) -> Vec<PatchSuggestion> {
    let trimmed = text.trim();
    if let Ok(suggestions) = serde_json::from_str::<Vec<PatchSuggestion>>(trimmed) {
        return suggestions;
    }

    vec![PatchSuggestion {
        file: "unknown".to_string(),
        line: 0,
        suggestion: if trimmed.is_empty() {
            REVIEW_MANUALLY.to_string()
        } else {
            trimmed.to_string()
        },
        description: None,
    }]
}
