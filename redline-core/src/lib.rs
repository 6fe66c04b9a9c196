//! redline-core — review session model, document format, and export.
//!
//! This crate holds the reviewer-facing domain: the [`session::ReviewSession`]
//! aggregate tracking a change set, per-file reviewed flags, and line-level
//! comments; the [`document::ReviewDocument`] TOML snapshot an automated fix
//! agent consumes; and the [`export::DocumentExporter`] that persists
//! snapshots with a fixed `latest.toml` hand-off alias. Change-set
//! acquisition and orchestration live in the `redline` binary crate.

pub mod document;
pub mod error;
pub mod export;
pub mod ids;
pub mod session;
pub mod types;

pub use document::ReviewDocument;
pub use error::ReviewError;
pub use export::DocumentExporter;
pub use ids::CommentIdSource;
pub use session::{ReviewComment, ReviewSession};
pub use types::{ChangedFile, Decision, FileStatus, ReviewStats, ReviewedFile, Severity};
