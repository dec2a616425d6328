//! scanner::tool
//!
//! Static-analysis tool invocation and raw output model.
//!
//! # Design
//!
//! The `ScanTool` trait abstracts "run the scanner over a working copy
//! and hand back raw result records". The production implementation,
//! [`SemgrepTool`], shells out to Semgrep; the pipeline never interprets
//! rule semantics, it only normalizes the record shape.
//!
//! Parsing of the tool's JSON output is a standalone function
//! ([`parse_tool_output`]) so the exit-code policy and the format
//! handling are testable without a Semgrep installation.

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Errors from scan tool invocation.
#[derive(Debug, Error)]
pub enum ScanToolError {
    /// The tool binary could not be launched.
    #[error("failed to launch scan tool: {message}")]
    Launch {
        /// OS-level diagnostic
        message: String,
    },

    /// The tool exited with a failure status.
    ///
    /// Exit code 1 is NOT a failure for Semgrep (it signals findings);
    /// see [`SemgrepTool`].
    #[error("scan tool failed with status {status}: {stderr}")]
    Failed {
        /// Exit code reported by the tool
        status: i32,
        /// Captured stderr
        stderr: String,
    },

    /// The tool's stdout was not parseable as its JSON format.
    #[error("failed to parse scan tool output: {0}")]
    ParseOutput(String),
}

/// Position of a raw result in its file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawPosition {
    /// 1-based line number; 0 when the tool omitted it.
    #[serde(default)]
    pub line: u64,
}

/// Extra payload attached to a raw result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawExtra {
    /// Tool-native severity label (`ERROR`/`WARNING`/`INFO`).
    #[serde(default)]
    pub severity: String,
    /// Human-readable rule message.
    #[serde(default)]
    pub message: String,
    /// Source excerpt for the matched span.
    #[serde(default)]
    pub lines: String,
}

/// One raw result record as emitted by the scan tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawResult {
    /// Rule/check identifier.
    #[serde(default = "default_check_id")]
    pub check_id: String,
    /// File path relative to the scanned root.
    #[serde(default)]
    pub path: String,
    /// Match start position.
    #[serde(default)]
    pub start: RawPosition,
    /// Match end position, when the tool reports one.
    #[serde(default)]
    pub end: Option<RawPosition>,
    /// Severity/message/snippet payload.
    #[serde(default)]
    pub extra: RawExtra,
}

fn default_check_id() -> String {
    "Unknown".to_string()
}

/// Top-level scan tool output document.
#[derive(Debug, Deserialize)]
struct ToolOutput {
    #[serde(default)]
    results: Vec<RawResult>,
}

/// Parse the tool's JSON stdout into raw result records.
///
/// Unknown top-level fields are ignored; only `results` matters.
///
/// # Errors
///
/// [`ScanToolError::ParseOutput`] when the document is not valid JSON
/// of the expected shape.
///
/// # Example
///
/// ```
/// use mender::scanner::parse_tool_output;
///
/// let out = r#"{"results": [{"check_id": "rules.x", "path": "a.py",
///   "start": {"line": 3}, "extra": {"severity": "ERROR", "message": "m", "lines": "c"}}],
///   "errors": []}"#;
/// let results = parse_tool_output(out).unwrap();
/// assert_eq!(results.len(), 1);
/// assert_eq!(results[0].check_id, "rules.x");
/// ```
pub fn parse_tool_output(stdout: &str) -> Result<Vec<RawResult>, ScanToolError> {
    let output: ToolOutput =
        serde_json::from_str(stdout).map_err(|e| ScanToolError::ParseOutput(e.to_string()))?;
    Ok(output.results)
}

/// A static-analysis tool runnable against a working copy.
#[async_trait]
pub trait ScanTool: Send + Sync {
    /// Run the tool and return raw result records in emission order.
    async fn run(&self, workspace: &Path) -> Result<Vec<RawResult>, ScanToolError>;
}

/// Semgrep invoked as a subprocess.
///
/// Runs `semgrep --config auto --json --severity ERROR --severity
/// WARNING <path>`. Exit codes 0 and 1 are both success (1 means
/// findings were reported); anything else is a tool failure carrying
/// stderr as detail.
#[derive(Debug, Clone)]
pub struct SemgrepTool {
    /// Binary to invoke (default `semgrep`).
    program: String,
}

impl Default for SemgrepTool {
    fn default() -> Self {
        Self {
            program: "semgrep".to_string(),
        }
    }
}

impl SemgrepTool {
    /// Create a runner using the `semgrep` binary on PATH.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a runner using a specific binary (useful for tests and
    /// pinned installations).
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl ScanTool for SemgrepTool {
    async fn run(&self, workspace: &Path) -> Result<Vec<RawResult>, ScanToolError> {
        let output = tokio::process::Command::new(&self.program)
            .arg("--config")
            .arg("auto")
            .arg("--json")
            .arg("--severity")
            .arg("ERROR")
            .arg("--severity")
            .arg("WARNING")
            .arg(workspace)
            .output()
            .await
            .map_err(|e| ScanToolError::Launch {
                message: e.to_string(),
            })?;

        let status = output.status.code().unwrap_or(-1);
        if status != 0 && status != 1 {
            return Err(ScanToolError::Failed {
                status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        parse_tool_output(&String::from_utf8_lossy(&output.stdout))
    }
}
