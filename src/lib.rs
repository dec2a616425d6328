//! Mender - an autonomous code security scanning and patching pipeline
//!
//! Mender moves a scan request through a sequence of external
//! collaborators - clone repository, run a static-analysis tool,
//! retrieve remediation knowledge, prompt a reasoning model for fixes,
//! persist results, optionally apply a patch branch - and maintains a
//! single JSON scan document per run as the pipeline's shared state.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates)
//! - [`server`] - HTTP entry points and asynchronous stage triggering
//! - [`pipeline`] - Scanner -> Analyzer -> Approval -> Deploy stages
//! - [`patch`] - Patch strategies and the commit/push applier
//! - [`scanner`] - Scan tool invocation and repository checkouts
//! - [`knowledge`] - Retrieval client for remediation context
//! - [`model`] - Generation client and fix-response normalization
//! - [`core`] - Domain types and the scan document schema
//! - [`store`] - Blob storage abstraction for persisted state
//! - [`git`] - Single interface for all Git operations
//! - [`config`] - Service configuration
//!
//! # Correctness Invariants
//!
//! 1. `stats.total_findings` always equals the findings count
//! 2. Every patch-plan entry references an existing finding
//! 3. The analyzer never changes a finding's `id`, `file`, or `line`
//! 4. Documents are rewritten whole; at most one stage writer per scan
//!    id is assumed (last write wins, by documented convention)

pub mod cli;
pub mod config;
pub mod core;
pub mod git;
pub mod knowledge;
pub mod model;
pub mod patch;
pub mod pipeline;
pub mod scanner;
pub mod server;
pub mod store;
