//! server::invoker
//!
//! Asynchronous stage triggering.
//!
//! # Design
//!
//! Entry points never run stages inline; they hand a payload to a
//! `StageInvoker` and answer immediately, mirroring an asynchronous
//! function-invocation service. The production [`LocalInvoker`] spawns
//! the stage onto the runtime; [`MockInvoker`] records payloads for
//! route tests.
//!
//! A scan trigger chains into analysis: once the scanner stage has
//! persisted its document, the analyzer stage runs against the same
//! scan id. Stage failures happen after the trigger has been
//! acknowledged, so they surface in logs (with their stage-tagged
//! prefix), not in the HTTP response.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use crate::core::types::ScanId;
use crate::pipeline::{AnalyzerStage, DeployStage, ScannerStage};

/// Errors from stage triggering.
#[derive(Debug, Clone, Error)]
pub enum InvokeError {
    /// The trigger could not be dispatched.
    #[error("failed to dispatch stage trigger: {0}")]
    Dispatch(String),
}

/// Payload of one asynchronous stage trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "lowercase")]
pub enum StagePayload {
    /// Run the scanner (and then the analyzer) for a repository.
    Scan {
        /// Pipeline run identifier (pre-allocated by the entry point).
        scan_id: ScanId,
        /// Repository to scan.
        repo_url: String,
        /// Branch to scan.
        branch: String,
    },
    /// Run the analyzer over a stored document.
    Analyze {
        /// Pipeline run identifier.
        scan_id: ScanId,
    },
    /// Apply patches for a stored document to a fresh checkout.
    Deploy {
        /// Pipeline run identifier.
        scan_id: ScanId,
        /// Repository to patch.
        repo_url: String,
        /// Branch to check out.
        branch: String,
    },
}

/// Dispatches stage work asynchronously.
#[async_trait]
pub trait StageInvoker: Send + Sync {
    /// Dispatch a stage trigger; returns once the work is accepted,
    /// not once it completes.
    async fn invoke(&self, payload: StagePayload) -> Result<(), InvokeError>;
}

/// Invoker that runs stages as local runtime tasks.
pub struct LocalInvoker {
    scanner: Arc<ScannerStage>,
    analyzer: Arc<AnalyzerStage>,
    deploy: Arc<DeployStage>,
}

impl LocalInvoker {
    /// Create an invoker over the three runnable stages.
    pub fn new(
        scanner: Arc<ScannerStage>,
        analyzer: Arc<AnalyzerStage>,
        deploy: Arc<DeployStage>,
    ) -> Self {
        Self {
            scanner,
            analyzer,
            deploy,
        }
    }
}

#[async_trait]
impl StageInvoker for LocalInvoker {
    async fn invoke(&self, payload: StagePayload) -> Result<(), InvokeError> {
        match payload {
            StagePayload::Scan {
                scan_id,
                repo_url,
                branch,
            } => {
                let scanner = Arc::clone(&self.scanner);
                let analyzer = Arc::clone(&self.analyzer);
                tokio::spawn(async move {
                    match scanner.run(&repo_url, &branch, Some(scan_id.clone())).await {
                        Ok(_) => {
                            if let Err(e) = analyzer.run(&scan_id).await {
                                error!(scan_id = %scan_id, "Analyzer error: {e}");
                            }
                        }
                        Err(e) => error!(scan_id = %scan_id, "Scanner error: {e}"),
                    }
                });
            }
            StagePayload::Analyze { scan_id } => {
                let analyzer = Arc::clone(&self.analyzer);
                tokio::spawn(async move {
                    if let Err(e) = analyzer.run(&scan_id).await {
                        error!(scan_id = %scan_id, "Analyzer error: {e}");
                    }
                });
            }
            StagePayload::Deploy {
                scan_id,
                repo_url,
                branch,
            } => {
                let deploy = Arc::clone(&self.deploy);
                tokio::spawn(async move {
                    if let Err(e) = deploy.run(&scan_id, &repo_url, &branch).await {
                        error!(scan_id = %scan_id, "Deployment error: {e}");
                    }
                });
            }
        }
        Ok(())
    }
}

/// Recording invoker for route tests.
#[derive(Debug, Clone, Default)]
pub struct MockInvoker {
    inner: Arc<Mutex<MockInvokerInner>>,
}

#[derive(Debug, Default)]
struct MockInvokerInner {
    payloads: Vec<StagePayload>,
    fail: bool,
}

impl MockInvoker {
    /// Invoker that accepts every trigger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Invoker that rejects every trigger.
    pub fn failing() -> Self {
        let invoker = Self::default();
        invoker.inner.lock().unwrap().fail = true;
        invoker
    }

    /// Payloads received so far, in order.
    pub fn payloads(&self) -> Vec<StagePayload> {
        self.inner.lock().unwrap().payloads.clone()
    }
}

#[async_trait]
impl StageInvoker for MockInvoker {
    async fn invoke(&self, payload: StagePayload) -> Result<(), InvokeError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail {
            return Err(InvokeError::Dispatch("injected trigger failure".into()));
        }
        inner.payloads.push(payload);
        Ok(())
    }
}
