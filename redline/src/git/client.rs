//! Async facade over the git worker thread.

use std::path::Path;

use crossbeam_channel::Sender;
use tokio::sync::oneshot;

use crate::git::types::{ChangeSet, CommitInfo, GitError, GitRequest};
use crate::git::worker;

/// Handle to the background thread owning the repository.
///
/// Cloning is cheap; all clones feed the same worker. Dropping the last
/// clone closes the channel and ends the thread.
#[derive(Clone, Debug)]
pub struct GitClient {
    tx: Sender<GitRequest>,
}

impl GitClient {
    /// Spawns the worker thread and opens the repository inside it.
    ///
    /// Fails with [`GitError::NotARepository`] before any request is
    /// served when `path` is not inside a git repository.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, GitError> {
        let path = path.as_ref().to_path_buf();
        let (tx, rx) = crossbeam_channel::unbounded();
        let (ready_tx, ready_rx) = oneshot::channel();

        std::thread::spawn(move || {
            let repo = match worker::open_repository(&path) {
                Ok(repo) => {
                    let _ = ready_tx.send(Ok(()));
                    repo
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            worker::git_worker_loop(repo, rx);
        });

        ready_rx.await.map_err(|_| GitError::WorkerGone)??;
        Ok(Self { tx })
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> GitRequest,
    ) -> Result<T, GitError> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(make(reply)).map_err(|_| GitError::WorkerGone)?;
        rx.await.map_err(|_| GitError::WorkerGone)
    }

    /// Runs the four-pass resolution and returns the best-effort merge.
    pub async fn resolve_change_set(
        &self,
        base: &str,
        head: &str,
    ) -> Result<ChangeSet, GitError> {
        let (base, head) = (base.to_owned(), head.to_owned());
        self.request(|reply| GitRequest::ResolveChangeSet { base, head, reply })
            .await
    }

    /// File content at a reference; empty when the path is absent there.
    pub async fn file_at_ref(&self, reference: &str, path: &str) -> Result<String, GitError> {
        let (reference, path) = (reference.to_owned(), path.to_owned());
        self.request(|reply| GitRequest::FileAtRef { reference, path, reply })
            .await?
    }

    pub async fn recent_commits(&self, limit: usize) -> Result<Vec<CommitInfo>, GitError> {
        self.request(|reply| GitRequest::RecentCommits { limit, reply })
            .await?
    }

    pub async fn ref_exists(&self, reference: &str) -> Result<bool, GitError> {
        let reference = reference.to_owned();
        self.request(|reply| GitRequest::RefExists { reference, reply })
            .await
    }

    pub async fn current_branch(&self) -> Result<Option<String>, GitError> {
        self.request(|reply| GitRequest::CurrentBranch { reply }).await
    }

    pub async fn short_hash(&self, reference: &str) -> Result<String, GitError> {
        let reference = reference.to_owned();
        self.request(|reply| GitRequest::ShortHash { reference, reply })
            .await?
    }
}
