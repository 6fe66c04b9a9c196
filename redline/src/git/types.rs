//! Owned message types for the git background thread.
//!
//! Requests carry their own `tokio::sync::oneshot` reply sender so the
//! worker never needs a back-channel; everything crossing the thread
//! boundary is fully owned.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::oneshot;

use redline_core::ChangedFile;

/// Errors from change-set acquisition and reference queries.
#[derive(Debug, Error)]
pub enum GitError {
    /// Hard precondition: the working directory is not a git repository.
    #[error("not a git repository: {0}")]
    NotARepository(String),

    #[error("invalid git reference: {0}")]
    InvalidRef(String),

    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    /// The worker thread exited while a request was in flight.
    #[error("git worker is gone")]
    WorkerGone,
}

/// The merged result of the four resolution passes.
///
/// `warnings` records passes that failed and contributed nothing (for
/// example an invalid base ref or a repository without commits); the file
/// list is always best-effort rather than all-or-nothing.
#[derive(Debug, Default)]
pub struct ChangeSet {
    pub files: Vec<ChangedFile>,
    pub warnings: Vec<String>,
}

/// One entry of the recent-commit listing used for reference picking.
#[derive(Debug, Clone)]
pub struct CommitInfo {
    pub hash: String,
    pub summary: String,
    pub author: String,
    pub date: DateTime<Utc>,
}

/// Commands sent from the async side to the git worker thread.
#[derive(Debug)]
pub enum GitRequest {
    /// Run the four-pass change-set resolution between two references.
    ResolveChangeSet {
        base: String,
        head: String,
        reply: oneshot::Sender<ChangeSet>,
    },
    /// Fetch a file's content at a reference. A path missing at that
    /// reference yields an empty string, not an error.
    FileAtRef {
        reference: String,
        path: String,
        reply: oneshot::Sender<Result<String, GitError>>,
    },
    /// List recent commits from HEAD, newest first.
    RecentCommits {
        limit: usize,
        reply: oneshot::Sender<Result<Vec<CommitInfo>, GitError>>,
    },
    /// Whether a reference resolves to a commit.
    RefExists {
        reference: String,
        reply: oneshot::Sender<bool>,
    },
    /// Current branch name, `None` on a detached HEAD.
    CurrentBranch {
        reply: oneshot::Sender<Option<String>>,
    },
    /// Abbreviated object id of a reference.
    ShortHash {
        reference: String,
        reply: oneshot::Sender<Result<String, GitError>>,
    },
}
