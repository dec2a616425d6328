//! patch::strategy
//!
//! How a suggestion is merged into a file's content.
//!
//! # Design
//!
//! Patch application is deliberately a blind text transform, isolated
//! behind the `PatchStrategy` trait so a stricter diff-based strategy
//! can be substituted later without touching the branch/commit logic.
//! The only production strategy, [`AppendStrategy`], appends the
//! suggestion as trailing content and never parses or rewrites the
//! original.

use serde::{Deserialize, Serialize};

/// One proposed patch: a suggestion targeted at a file and line.
///
/// Produced by the patch planner (or derived from a stored patch plan)
/// and consumed by the applier. The `line` is advisory; strategies are
/// not required to honor it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchSuggestion {
    /// Target file, relative to the working copy root.
    pub file: String,
    /// Line the suggestion refers to.
    #[serde(default)]
    pub line: u64,
    /// Suggested patch text.
    #[serde(default)]
    pub suggestion: String,
    /// Optional human description of the issue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Strategy for merging a suggestion into existing file content.
pub trait PatchStrategy: Send + Sync {
    /// Strategy name for summaries and logs.
    fn name(&self) -> &'static str;

    /// Produce the patched content of a file.
    fn apply(&self, original: &str, suggestion: &str) -> String;
}

/// Append the suggestion as new trailing content.
///
/// The original content is preserved byte-for-byte and the suggestion
/// lands after it, separated and terminated by a newline.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppendStrategy;

impl PatchStrategy for AppendStrategy {
    fn name(&self) -> &'static str {
        "append"
    }

    fn apply(&self, original: &str, suggestion: &str) -> String {
        format!("{original}\n{suggestion}\n")
    }
}
