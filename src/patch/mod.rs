//! patch
//!
//! Patch application: merge strategies and the commit/push applier.

pub mod applier;
pub mod strategy;

pub use applier::{
    ApplyError, ApplySummary, PatchApplier, PatchItemOutcome, PATCH_COMMIT_MESSAGE,
};
pub use strategy::{AppendStrategy, PatchStrategy, PatchSuggestion};
