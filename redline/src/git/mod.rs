//! Git integration for redline.
//!
//! A background thread owns the `git2::Repository` for its lifetime —
//! the handle is opened inside the thread and never crosses it. The async
//! [`client::GitClient`] facade sends [`types::GitRequest`] messages over a
//! crossbeam channel and awaits per-request oneshot replies.

pub mod client;
pub mod types;
pub mod worker;

pub use client::GitClient;
pub use types::{ChangeSet, CommitInfo, GitError};
