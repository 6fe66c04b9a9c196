//! redline — change-set acquisition and review orchestration.
//!
//! Library half of the binary crate: the `git` module resolves what
//! changed relative to a baseline (merging committed, staged, unstaged,
//! and untracked sources), and the `orchestrator` module drives the
//! session lifecycle from start through submit or cancel. The review
//! model itself lives in `redline-core`.

pub mod config;
pub mod git;
pub mod orchestrator;
