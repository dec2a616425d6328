//! core
//!
//! Domain types and the scan document schema.
//!
//! This layer has no I/O: it defines the validated identifier and enum
//! types ([`types`]) and the aggregate scan record with its invariants
//! ([`document`]). Everything above it (stages, storage, server) moves
//! these values around.

pub mod document;
pub mod types;

pub use document::{
    parse_document, Analysis, DependencyVulnerabilities, DocumentError, Finding, PatchPlanEntry,
    ScanDocument, Stats, INITIAL_CONFIDENCE, INITIAL_SUMMARY, PENDING_ANALYSIS, PENDING_FIX,
};
pub use types::{
    now_utc_rfc3339, DocumentStatus, ReviewState, ScanId, Severity, Stage, TypeError,
};
