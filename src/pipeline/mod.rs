//! pipeline
//!
//! The scan-result document pipeline: the sequential stage components a
//! scan record flows through.
//!
//! # Architecture
//!
//! ```text
//! scanner -> analyzer -> [approval gate, 0..n] -> planner/deploy
//! ```
//!
//! Each stage is a struct carrying injected collaborator handles
//! (scan tool, knowledge base, text generator, blob store) so tests can
//! substitute deterministic doubles. Stage transitions for one scan id
//! are strictly sequential by convention: every write is a full
//! document overwrite with no concurrency check, so at most one stage
//! writer may be active per scan id (see `store::traits`).
//!
//! # Error Handling
//!
//! Each stage has its own closed error enum. Fatal errors abort a
//! stage before any write; per-finding enrichment trouble is absorbed
//! inside the analyzer; the planner absorbs everything.

pub mod analyzer;
pub mod approval;
pub mod deploy;
pub mod planner;
pub mod scanner;

pub use analyzer::{build_fix_prompt, AnalysisOutcome, AnalyzerError, AnalyzerStage};
pub use approval::{ApprovalError, ApprovalGate, GateAction};
pub use deploy::{DeployError, DeployStage};
pub use planner::{PatchPlanner, MAX_SUMMARY_CHARS, REVIEW_LINE, REVIEW_MANUALLY};
pub use scanner::{normalize_findings, ScanOutcome, ScannerError, ScannerStage};
