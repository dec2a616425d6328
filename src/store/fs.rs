//! store::fs
//!
//! Filesystem-backed blob store.
//!
//! # Design
//!
//! Keys map directly onto paths under a root directory. Writes are
//! atomic from a reader's point of view: the value is written to a
//! sibling temp file and renamed into place, so `get` never observes a
//! partially written blob. A per-key `fs2` advisory lock serializes
//! writers to the same key within and across processes.
//!
//! The lock does NOT turn read-modify-write sequences into
//! transactions: two writers racing on the same key still end with
//! last-write-wins, matching the documented pipeline convention of at
//! most one stage writer per scan id.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fs2::FileExt;

use super::traits::{validate_key, BlobStore, StoreError};

/// Blob store rooted at a local directory.
///
/// # Example
///
/// ```ignore
/// use mender::store::{BlobStore, FsBlobStore};
///
/// let store = FsBlobStore::new("/var/lib/mender/data");
/// store.put("scan-results/scan_abc/result.json", "{}").await?;
/// ```
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    /// Directory all keys resolve under.
    root: PathBuf,
}

impl FsBlobStore {
    /// Create a store rooted at `root`. The directory is created lazily
    /// on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }

    /// Locked, atomic write of `body` to `path`.
    ///
    /// Lock file lives next to the target so the rename stays on one
    /// filesystem.
    fn write_locked(path: &Path, body: &str) -> Result<(), StoreError> {
        let parent = path
            .parent()
            .ok_or_else(|| StoreError::WriteError(format!("no parent for {}", path.display())))?;
        fs::create_dir_all(parent)
            .map_err(|e| StoreError::WriteError(format!("cannot create {}: {e}", parent.display())))?;

        let lock_path = path.with_extension("lock");
        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| StoreError::WriteError(format!("cannot open lock file: {e}")))?;
        lock_file
            .lock_exclusive()
            .map_err(|e| StoreError::WriteError(format!("cannot acquire write lock: {e}")))?;

        let result = Self::write_atomic(path, body);

        // Drop would release the lock too; unlock eagerly.
        let _ = fs2::FileExt::unlock(&lock_file);
        result
    }

    fn write_atomic(path: &Path, body: &str) -> Result<(), StoreError> {
        let tmp_path = path.with_extension("tmp");
        {
            let mut tmp = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)
                .map_err(|e| StoreError::WriteError(format!("cannot create temp file: {e}")))?;
            tmp.write_all(body.as_bytes())
                .map_err(|e| StoreError::WriteError(format!("cannot write temp file: {e}")))?;
            tmp.sync_all()
                .map_err(|e| StoreError::WriteError(format!("cannot sync temp file: {e}")))?;
        }
        fs::rename(&tmp_path, path)
            .map_err(|e| StoreError::WriteError(format!("cannot rename into place: {e}")))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(body) => Ok(Some(body)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::ReadError(format!(
                "cannot read {}: {e}",
                path.display()
            ))),
        }
    }

    async fn put(&self, key: &str, body: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let body = body.to_string();
        tokio::task::spawn_blocking(move || Self::write_locked(&path, &body))
            .await
            .map_err(|e| StoreError::WriteError(format!("write task failed: {e}")))?
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let path = self.path_for(key)?;
        Ok(tokio::fs::try_exists(&path).await.unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, FsBlobStore) {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn get_missing_key_returns_none() {
        let (_dir, store) = store();
        assert_eq!(store.get("scan-results/none/result.json").await.unwrap(), None);
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let (_dir, store) = store();
        store
            .put("scan-results/scan_abc/result.json", "{\"ok\":true}")
            .await
            .unwrap();
        let body = store
            .get("scan-results/scan_abc/result.json")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(body, "{\"ok\":true}");
    }

    #[tokio::test]
    async fn put_creates_nested_directories() {
        let (dir, store) = store();
        store.put("a/b/c/blob.json", "x").await.unwrap();
        assert!(dir.path().join("a/b/c/blob.json").is_file());
    }

    #[tokio::test]
    async fn put_overwrites_whole_value() {
        let (_dir, store) = store();
        store.put("k.json", "first").await.unwrap();
        store.put("k.json", "second").await.unwrap();
        assert_eq!(store.get("k.json").await.unwrap().unwrap(), "second");
    }

    #[tokio::test]
    async fn exists_reflects_puts() {
        let (_dir, store) = store();
        assert!(!store.exists("k.json").await.unwrap());
        store.put("k.json", "v").await.unwrap();
        assert!(store.exists("k.json").await.unwrap());
    }

    #[tokio::test]
    async fn rejects_escaping_keys() {
        let (_dir, store) = store();
        assert!(matches!(
            store.get("../outside").await,
            Err(StoreError::InvalidKey(_))
        ));
        assert!(matches!(
            store.put("/abs", "v").await,
            Err(StoreError::InvalidKey(_))
        ));
    }

    /// Two interleaved read-modify-write sequences lose one update.
    /// This pins the documented last-write-wins gap rather than fixing it.
    #[tokio::test]
    async fn concurrent_writers_are_last_write_wins() {
        let (_dir, store) = store();
        store.put("doc.json", "base").await.unwrap();

        // Both writers read "base", then write their own value.
        let a_saw = store.get("doc.json").await.unwrap().unwrap();
        let b_saw = store.get("doc.json").await.unwrap().unwrap();
        assert_eq!(a_saw, b_saw);

        store.put("doc.json", "from-a").await.unwrap();
        store.put("doc.json", "from-b").await.unwrap();

        // Writer A's update is silently gone.
        assert_eq!(store.get("doc.json").await.unwrap().unwrap(), "from-b");
    }

    #[tokio::test]
    async fn no_temp_or_lock_artifacts_in_value_path() {
        let (dir, store) = store();
        store.put("x/doc.json", "v").await.unwrap();
        // Temp file is gone after rename; the lock file is a sibling.
        assert!(!dir.path().join("x/doc.tmp").exists());
        assert!(dir.path().join("x/doc.json").is_file());
    }
}
