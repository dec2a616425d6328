//! scanner::workspace
//!
//! Ephemeral repository checkouts for scanning.
//!
//! A [`Workspace`] owns a temporary directory holding a clone of the
//! requested repository at the requested branch. Dropping the
//! workspace removes the checkout.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use thiserror::Error;

use crate::git::{Git, GitError};

/// Errors from workspace checkout.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// The scratch directory could not be created.
    #[error("failed to create scratch directory: {0}")]
    Scratch(String),

    /// Cloning failed (unreachable URL or missing branch).
    #[error(transparent)]
    Clone(#[from] GitError),
}

/// A temporary working copy of a repository.
#[derive(Debug)]
pub struct Workspace {
    // Held for its Drop; the checkout lives inside.
    _dir: TempDir,
    repo_path: PathBuf,
}

impl Workspace {
    /// Clone `repo_url` at `branch` into a fresh temporary directory.
    ///
    /// The clone runs on the blocking pool; network and disk I/O do
    /// not stall the async runtime.
    ///
    /// # Errors
    ///
    /// - [`WorkspaceError::Scratch`] if no temp directory can be made
    /// - [`WorkspaceError::Clone`] if the URL or branch is unreachable
    pub async fn checkout(repo_url: &str, branch: &str) -> Result<Self, WorkspaceError> {
        let dir = TempDir::new().map_err(|e| WorkspaceError::Scratch(e.to_string()))?;
        let repo_path = dir.path().join("repo");

        let url = repo_url.to_string();
        let branch = branch.to_string();
        let target = repo_path.clone();
        tokio::task::spawn_blocking(move || Git::clone(&url, &target, &branch))
            .await
            .map_err(|e| WorkspaceError::Scratch(format!("checkout task failed: {e}")))??;

        Ok(Self {
            _dir: dir,
            repo_path,
        })
    }

    /// Path of the checked-out repository root.
    pub fn path(&self) -> &Path {
        &self.repo_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_repo(dir: &Path) {
        let repo = git2::Repository::init(dir).unwrap();
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "tester").unwrap();
        config.set_str("user.email", "tester@example.com").unwrap();
        std::fs::write(dir.join("app.py"), "print('hi')\n").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("app.py")).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = repo.signature().unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "initial", &tree, &[])
            .unwrap();
    }

    #[tokio::test]
    async fn checkout_clones_requested_repo() {
        let src = TempDir::new().unwrap();
        seed_repo(src.path());
        let url = format!("file://{}", src.path().display());
        let head = git2::Repository::open(src.path())
            .unwrap()
            .head()
            .unwrap()
            .shorthand()
            .unwrap()
            .to_string();

        let ws = Workspace::checkout(&url, &head).await.unwrap();
        assert!(ws.path().join("app.py").is_file());
    }

    #[tokio::test]
    async fn checkout_fails_for_bad_url() {
        let err = Workspace::checkout("file:///nonexistent/never/repo.git", "main")
            .await
            .unwrap_err();
        assert!(matches!(err, WorkspaceError::Clone(_)));
    }

    #[tokio::test]
    async fn checkout_fails_for_missing_branch() {
        let src = TempDir::new().unwrap();
        seed_repo(src.path());
        let url = format!("file://{}", src.path().display());
        let err = Workspace::checkout(&url, "no-such-branch").await.unwrap_err();
        assert!(matches!(err, WorkspaceError::Clone(_)));
    }
}
