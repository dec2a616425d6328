//! store::traits
//!
//! Blob store trait definition.
//!
//! # Design
//!
//! The `BlobStore` trait is the key-value doorway to durable storage.
//! Keys are relative slash-separated paths (e.g.
//! `scan-results/scan_abc/result.json`); values are whole JSON blobs.
//! The trait is async because production implementations sit in front
//! of remote object storage.
//!
//! # Concurrency
//!
//! `put` is a full overwrite with last-write-wins semantics. The
//! pipeline assumes at most one stage writer per scan id by convention;
//! the store does not provide conditional writes, so two concurrent
//! writers to the same key can lose updates. Implementations only
//! guarantee that readers never observe a torn value.
//!
//! # Example
//!
//! ```ignore
//! use mender::store::{BlobStore, StoreError};
//!
//! async fn load(store: &dyn BlobStore, key: &str) -> Result<String, StoreError> {
//!     store
//!         .get(key)
//!         .await?
//!         .ok_or_else(|| StoreError::ReadError(format!("missing blob: {key}")))
//! }
//! ```

use async_trait::async_trait;
use thiserror::Error;

/// Errors from blob store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The key is not a valid relative path.
    #[error("invalid blob key: {0}")]
    InvalidKey(String),

    /// Failed to read from storage.
    #[error("failed to read blob: {0}")]
    ReadError(String),

    /// Failed to write to storage.
    #[error("failed to write blob: {0}")]
    WriteError(String),
}

/// Validate a blob key.
///
/// Keys must be non-empty relative paths using `/` separators, with no
/// empty, `.`, or `..` components, so they can be mapped onto a
/// filesystem root without escaping it.
///
/// # Errors
///
/// Returns `StoreError::InvalidKey` describing the first violation.
///
/// # Example
///
/// ```
/// use mender::store::validate_key;
///
/// assert!(validate_key("scan-results/scan_abc/result.json").is_ok());
/// assert!(validate_key("/absolute").is_err());
/// assert!(validate_key("a/../b").is_err());
/// assert!(validate_key("").is_err());
/// ```
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty() {
        return Err(StoreError::InvalidKey("key cannot be empty".into()));
    }
    if key.starts_with('/') || key.ends_with('/') {
        return Err(StoreError::InvalidKey(format!(
            "key cannot start or end with '/': {key}"
        )));
    }
    for component in key.split('/') {
        if component.is_empty() {
            return Err(StoreError::InvalidKey(format!(
                "key cannot contain empty components: {key}"
            )));
        }
        if component == "." || component == ".." {
            return Err(StoreError::InvalidKey(format!(
                "key cannot contain '.' or '..' components: {key}"
            )));
        }
        if component.contains('\\') {
            return Err(StoreError::InvalidKey(format!(
                "key cannot contain '\\': {key}"
            )));
        }
    }
    Ok(())
}

/// Key-value blob storage.
///
/// Implementations must be `Send + Sync` so handles can be shared
/// across async tasks.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read a blob, returning `None` when the key does not exist.
    ///
    /// # Errors
    ///
    /// - `StoreError::InvalidKey` for malformed keys
    /// - `StoreError::ReadError` for storage failures other than absence
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a blob, replacing any existing value (last write wins).
    ///
    /// # Errors
    ///
    /// - `StoreError::InvalidKey` for malformed keys
    /// - `StoreError::WriteError` for storage failures
    async fn put(&self, key: &str, body: &str) -> Result<(), StoreError>;

    /// Check whether a key exists.
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_relative_paths() {
        for key in [
            "result.json",
            "scan-results/scan_abc/result.json",
            "patch_reports/fix-autopatch-20250101000000.json",
        ] {
            assert!(validate_key(key).is_ok(), "{key} should be valid");
        }
    }

    #[test]
    fn rejects_escaping_keys() {
        for key in ["", "/abs", "trail/", "a//b", "a/./b", "a/../b", "..", "a\\b"] {
            assert!(validate_key(key).is_err(), "{key} should be invalid");
        }
    }

    #[test]
    fn error_display() {
        let err = validate_key("/abs").unwrap_err();
        assert!(err.to_string().contains("invalid blob key"));
    }
}
