//! store::memory
//!
//! In-memory blob store for deterministic testing.
//!
//! # Design
//!
//! Stores blobs in a `HashMap` behind an `Arc<Mutex<...>>` so clones
//! share state, and allows configuring failure injection for error-path
//! tests. Operations are recorded so tests can assert, for example,
//! that a stage performed exactly one durable write.
//!
//! # Example
//!
//! ```
//! use mender::store::{BlobStore, MemoryBlobStore};
//!
//! # tokio_test::block_on(async {
//! let store = MemoryBlobStore::new();
//! store.put("k.json", "v").await.unwrap();
//! assert_eq!(store.get("k.json").await.unwrap().unwrap(), "v");
//! assert_eq!(store.put_count(), 1);
//! # });
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::traits::{validate_key, BlobStore, StoreError};

/// Which operation should fail (for testing error paths).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    /// Fail every `get`.
    Get,
    /// Fail every `put`.
    Put,
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOperation {
    /// A `get` with the requested key.
    Get(String),
    /// A `put` with the written key.
    Put(String),
}

#[derive(Debug, Default)]
struct MemoryBlobStoreInner {
    blobs: HashMap<String, String>,
    fail_on: Option<FailOn>,
    operations: Vec<StoreOperation>,
}

/// In-memory blob store.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share
/// the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    inner: Arc<Mutex<MemoryBlobStoreInner>>,
}

impl MemoryBlobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with a blob.
    pub fn with_blob(key: impl Into<String>, body: impl Into<String>) -> Self {
        let store = Self::new();
        store
            .inner
            .lock()
            .unwrap()
            .blobs
            .insert(key.into(), body.into());
        store
    }

    /// Configure an operation to fail.
    pub fn fail_on(&self, fail_on: FailOn) {
        self.inner.lock().unwrap().fail_on = Some(fail_on);
    }

    /// Clear any configured failure.
    pub fn clear_failure(&self) {
        self.inner.lock().unwrap().fail_on = None;
    }

    /// All recorded operations, in order.
    pub fn operations(&self) -> Vec<StoreOperation> {
        self.inner.lock().unwrap().operations.clone()
    }

    /// Number of successful `put` operations.
    pub fn put_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap()
            .operations
            .iter()
            .filter(|op| matches!(op, StoreOperation::Put(_)))
            .count()
    }

    /// Direct read of a stored blob without recording an operation.
    pub fn peek(&self, key: &str) -> Option<String> {
        self.inner.lock().unwrap().blobs.get(key).cloned()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        validate_key(key)?;
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_on == Some(FailOn::Get) {
            return Err(StoreError::ReadError("injected get failure".into()));
        }
        inner.operations.push(StoreOperation::Get(key.to_string()));
        Ok(inner.blobs.get(key).cloned())
    }

    async fn put(&self, key: &str, body: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_on == Some(FailOn::Put) {
            return Err(StoreError::WriteError("injected put failure".into()));
        }
        inner.operations.push(StoreOperation::Put(key.to_string()));
        inner.blobs.insert(key.to_string(), body.to_string());
        Ok(())
    }
}
