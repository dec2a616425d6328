//! scanner::mock
//!
//! Deterministic scan tool for testing.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::tool::{RawResult, ScanTool, ScanToolError};

/// Scan tool returning a fixed result set.
///
/// Thread-safe via internal `Arc<Mutex<...>>`; clones share state.
/// Records the paths it was invoked with so tests can assert the stage
/// scanned the checkout it created.
#[derive(Debug, Clone, Default)]
pub struct StaticScanTool {
    inner: Arc<Mutex<StaticScanToolInner>>,
}

#[derive(Debug, Default)]
struct StaticScanToolInner {
    results: Vec<RawResult>,
    fail: bool,
    invocations: Vec<std::path::PathBuf>,
}

impl StaticScanTool {
    /// Tool that reports no findings.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Tool that reports the given raw results on every run.
    pub fn with_results(results: Vec<RawResult>) -> Self {
        let tool = Self::default();
        tool.inner.lock().unwrap().results = results;
        tool
    }

    /// Make every run fail with a tool error.
    pub fn failing() -> Self {
        let tool = Self::default();
        tool.inner.lock().unwrap().fail = true;
        tool
    }

    /// Workspaces the tool was invoked against, in order.
    pub fn invocations(&self) -> Vec<std::path::PathBuf> {
        self.inner.lock().unwrap().invocations.clone()
    }
}

#[async_trait]
impl ScanTool for StaticScanTool {
    async fn run(&self, workspace: &Path) -> Result<Vec<RawResult>, ScanToolError> {
        let mut inner = self.inner.lock().unwrap();
        inner.invocations.push(workspace.to_path_buf());
        if inner.fail {
            return Err(ScanToolError::Failed {
                status: 2,
                stderr: "injected tool failure".to_string(),
            });
        }
        Ok(inner.results.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_preset_results() {
        let raw = RawResult {
            check_id: "rules.test".to_string(),
            path: "a.py".to_string(),
            ..Default::default()
        };
        let tool = StaticScanTool::with_results(vec![raw.clone()]);
        let results = tool.run(Path::new("/tmp/ws")).await.unwrap();
        assert_eq!(results, vec![raw]);
        assert_eq!(tool.invocations(), vec![std::path::PathBuf::from("/tmp/ws")]);
    }

    #[tokio::test]
    async fn failing_tool_errors() {
        let tool = StaticScanTool::failing();
        assert!(tool.run(Path::new("/tmp/ws")).await.is_err());
    }
}
