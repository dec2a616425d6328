//! git::interface
//!
//! Git interface implementation using git2.
//!
//! This module is the **single doorway** to all Git operations: cloning
//! a repository for scanning, and branching/staging/committing/pushing
//! for patch application. No other runtime module imports `git2`
//! directly, which keeps error handling consistent and makes the
//! version-control surface easy to audit.
//!
//! # Error Handling
//!
//! Git errors are categorized into typed variants:
//! - [`GitError::NotARepo`]: the path is not a Git working copy
//! - [`GitError::CloneFailed`]: the remote or branch is unreachable
//! - [`GitError::PushFailed`]: the remote rejected the push
//! - [`GitError::Internal`]: anything else, with the git2 message kept
//!   as opaque detail
//!
//! # Example
//!
//! ```ignore
//! use mender::git::Git;
//! use std::path::Path;
//!
//! let git = Git::clone("https://example.com/repo.git", Path::new("/tmp/wc"), "main")?;
//! git.ensure_branch("fix/autopatch-20250101000000")?;
//! git.stage_path(Path::new("src/db.py"))?;
//! git.commit_staged("Apply automated security patches")?;
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// The path is not a Git working copy.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was checked
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,

    /// Cloning the remote repository failed (unreachable URL or branch).
    #[error("clone of {url} (branch {branch}) failed: {message}")]
    CloneFailed {
        /// The remote URL
        url: String,
        /// The requested branch
        branch: String,
        /// git2 diagnostic text
        message: String,
    },

    /// Pushing a branch to the remote failed.
    #[error("push of {branch} failed: {message}")]
    PushFailed {
        /// The branch being pushed
        branch: String,
        /// git2 diagnostic text
        message: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        GitError::Internal {
            message: err.message().to_string(),
        }
    }
}

/// The Git interface.
///
/// Wraps one opened repository. Obtain it with [`Git::open`] for an
/// existing working copy or [`Git::clone`] for a fresh checkout.
pub struct Git {
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git").field("path", &self.repo.path()).finish()
    }
}

impl Git {
    /// Open an existing working copy.
    ///
    /// The path must itself be the repository root (no upward
    /// discovery); patch application refuses to guess which repository
    /// a caller meant.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if the path is not a Git repository
    /// - [`GitError::BareRepo`] if it has no working directory
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::open(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;
        if repo.is_bare() {
            return Err(GitError::BareRepo);
        }
        Ok(Self { repo })
    }

    /// Clone `url` at `branch` into `target`.
    ///
    /// # Errors
    ///
    /// [`GitError::CloneFailed`] if the URL is unreachable or the
    /// branch does not exist; no partial working copy is left usable.
    pub fn clone(url: &str, target: &Path, branch: &str) -> Result<Self, GitError> {
        let repo = git2::build::RepoBuilder::new()
            .branch(branch)
            .clone(url, target)
            .map_err(|e| GitError::CloneFailed {
                url: url.to_string(),
                branch: branch.to_string(),
                message: e.message().to_string(),
            })?;
        Ok(Self { repo })
    }

    /// Path to the working directory.
    pub fn work_dir(&self) -> Result<PathBuf, GitError> {
        self.repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or(GitError::BareRepo)
    }

    /// Name of the branch HEAD currently points at, if any.
    pub fn current_branch(&self) -> Result<Option<String>, GitError> {
        let head = self.repo.head()?;
        if head.is_branch() {
            Ok(head.shorthand().map(str::to_string))
        } else {
            Ok(None)
        }
    }

    /// Switch to `name`, creating it from HEAD if it does not exist.
    ///
    /// An existing branch is checked out as-is; this mirrors re-running
    /// patch application within the same timestamp second.
    pub fn ensure_branch(&self, name: &str) -> Result<(), GitError> {
        if self.repo.find_branch(name, git2::BranchType::Local).is_err() {
            let head = self.repo.head()?.peel_to_commit()?;
            self.repo.branch(name, &head, false)?;
        }
        self.repo.set_head(&format!("refs/heads/{name}"))?;
        let mut checkout = git2::build::CheckoutBuilder::new();
        checkout.force();
        self.repo.checkout_head(Some(&mut checkout))?;
        Ok(())
    }

    /// Stage one file, given relative to the working directory.
    pub fn stage_path(&self, rel_path: &Path) -> Result<(), GitError> {
        let mut index = self.repo.index()?;
        index.add_path(rel_path)?;
        index.write()?;
        Ok(())
    }

    /// Commit everything staged as a single commit on HEAD.
    ///
    /// Uses the repository's configured signature, falling back to a
    /// fixed service identity when none is configured.
    pub fn commit_staged(&self, message: &str) -> Result<(), GitError> {
        let mut index = self.repo.index()?;
        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;
        let signature = self
            .repo
            .signature()
            .or_else(|_| git2::Signature::now("mender", "mender@localhost"))?;
        let parent = self.repo.head()?.peel_to_commit()?;
        self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &[&parent],
        )?;
        Ok(())
    }

    /// Push `branch` to the `origin` remote.
    ///
    /// When `token` is given it is used as an HTTPS access token.
    ///
    /// # Errors
    ///
    /// [`GitError::PushFailed`] with the remote's diagnostic text; the
    /// local commit is unaffected.
    pub fn push_branch(&self, branch: &str, token: Option<&str>) -> Result<(), GitError> {
        let mut remote = self
            .repo
            .find_remote("origin")
            .map_err(|e| GitError::PushFailed {
                branch: branch.to_string(),
                message: format!("no origin remote: {}", e.message()),
            })?;

        let mut callbacks = git2::RemoteCallbacks::new();
        if let Some(token) = token {
            let token = token.to_string();
            callbacks.credentials(move |_url, username, _allowed| {
                git2::Cred::userpass_plaintext(username.unwrap_or("x-access-token"), &token)
            });
        }
        let mut options = git2::PushOptions::new();
        options.remote_callbacks(callbacks);

        let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
        remote
            .push(&[refspec.as_str()], Some(&mut options))
            .map_err(|e| GitError::PushFailed {
                branch: branch.to_string(),
                message: e.message().to_string(),
            })
    }
}
