//! In-memory review session aggregate.
//!
//! A `ReviewSession` is the single source of truth for one reviewer pass:
//! the change set fixed at start, per-file reviewed flags, and the comment
//! list. It lives entirely in memory and is discarded on cancel or after a
//! successful submit — submission snapshots it into a [`ReviewDocument`]
//! first. All operations are synchronous; the orchestrator serializes
//! access so no internal locking is needed.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::document::{toml_datetime, CommentBlock, ReviewDocument, ReviewHeader};
use crate::error::ReviewError;
use crate::ids::CommentIdSource;
use crate::types::{ChangedFile, Decision, ReviewStats, ReviewedFile, Severity};

/// A structured line-level comment, created only through the session.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewComment {
    /// Monotonic id from the injected [`CommentIdSource`], never reused.
    pub id: String,
    /// Path of a [`ChangedFile`] in the same session.
    pub file: String,
    /// 1-indexed line number.
    pub line: u32,
    /// End of the commented range; `Some` only when strictly past `line`.
    pub end_line: Option<u32>,
    pub severity: Severity,
    pub body: String,
    /// Best-effort source snippet for the agent, advisory only.
    pub code_context: Option<String>,
    pub resolved: bool,
    pub created_at: DateTime<Utc>,
}

/// One reviewer's in-progress pass over a fixed change set.
pub struct ReviewSession {
    base_ref: String,
    head_ref: String,
    started_at: DateTime<Utc>,
    /// Change set plus reviewed flag, in resolver order. Fixed at start.
    files: Vec<(ChangedFile, bool)>,
    /// Insertion order is preserved and flows into the exported document.
    comments: Vec<ReviewComment>,
    ids: Arc<CommentIdSource>,
}

impl ReviewSession {
    /// Builds a session over an already-resolved change set.
    ///
    /// The file list is taken as-is (the resolver guarantees path
    /// uniqueness); all files start unreviewed.
    pub fn new(
        base_ref: impl Into<String>,
        head_ref: impl Into<String>,
        files: Vec<ChangedFile>,
        ids: Arc<CommentIdSource>,
    ) -> Self {
        Self {
            base_ref: base_ref.into(),
            head_ref: head_ref.into(),
            started_at: Utc::now(),
            files: files.into_iter().map(|f| (f, false)).collect(),
            comments: Vec::new(),
            ids,
        }
    }

    pub fn base_ref(&self) -> &str {
        &self.base_ref
    }

    pub fn head_ref(&self) -> &str {
        &self.head_ref
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// The fixed change set, in resolver order.
    pub fn files(&self) -> impl Iterator<Item = &ChangedFile> {
        self.files.iter().map(|(f, _)| f)
    }

    /// Change set entries paired with their current reviewed flag.
    pub fn files_with_reviewed(&self) -> impl Iterator<Item = (&ChangedFile, bool)> {
        self.files.iter().map(|(f, r)| (f, *r))
    }

    /// All comments in insertion order.
    pub fn comments(&self) -> &[ReviewComment] {
        &self.comments
    }

    /// Whether `path` belongs to this session's change set.
    pub fn contains_file(&self, path: &str) -> bool {
        self.files.iter().any(|(f, _)| f.path == path)
    }

    /// Adds a comment and returns a reference to it.
    ///
    /// Paths outside the change set are rejected with
    /// [`ReviewError::UnknownFile`] — this session validates rather than
    /// trusting the caller. `line` is clamped to 1; an `end_line` at or
    /// before `line` is dropped so single-line comments never carry a range.
    pub fn add_comment(
        &mut self,
        file: &str,
        line: u32,
        body: impl Into<String>,
        severity: Severity,
        end_line: Option<u32>,
        code_context: Option<String>,
    ) -> Result<&ReviewComment, ReviewError> {
        if !self.contains_file(file) {
            return Err(ReviewError::UnknownFile(file.to_owned()));
        }
        let line = line.max(1);
        let comment = ReviewComment {
            id: self.ids.next_id(),
            file: file.to_owned(),
            line,
            end_line: end_line.filter(|&e| e > line),
            severity,
            body: body.into(),
            code_context,
            resolved: false,
            created_at: Utc::now(),
        };
        self.comments.push(comment);
        Ok(&self.comments[self.comments.len() - 1])
    }

    /// Permanently removes a comment. Returns `false` when the id is
    /// unknown; calling twice with the same id is harmless.
    pub fn remove_comment(&mut self, id: &str) -> bool {
        let before = self.comments.len();
        self.comments.retain(|c| c.id != id);
        self.comments.len() != before
    }

    /// Rewrites a comment's body (and severity, when given) in place.
    ///
    /// Returns `false` when the id is unknown — a benign race with a
    /// concurrent delete, not an error.
    pub fn update_comment(
        &mut self,
        id: &str,
        body: impl Into<String>,
        severity: Option<Severity>,
    ) -> bool {
        match self.comments.iter_mut().find(|c| c.id == id) {
            Some(c) => {
                c.body = body.into();
                if let Some(s) = severity {
                    c.severity = s;
                }
                true
            }
            None => false,
        }
    }

    /// Flips a comment's resolved flag and returns the resulting state.
    ///
    /// Unknown ids report `false`: resolved defaults to false, so toggling
    /// an absent comment has no observable effect.
    pub fn toggle_resolved(&mut self, id: &str) -> bool {
        match self.comments.iter_mut().find(|c| c.id == id) {
            Some(c) => {
                c.resolved = !c.resolved;
                c.resolved
            }
            None => false,
        }
    }

    /// Flips the reviewed flag for `path` and returns the resulting state.
    /// Unknown paths are a no-op reporting `false`.
    pub fn toggle_file_reviewed(&mut self, path: &str) -> bool {
        match self.files.iter_mut().find(|(f, _)| f.path == path) {
            Some((_, reviewed)) => {
                *reviewed = !*reviewed;
                *reviewed
            }
            None => false,
        }
    }

    /// Sets the reviewed flag for `path`. No-op for unknown paths.
    pub fn mark_file_reviewed(&mut self, path: &str) {
        if let Some((_, reviewed)) = self.files.iter_mut().find(|(f, _)| f.path == path) {
            *reviewed = true;
        }
    }

    /// Clears the reviewed flag for `path`. No-op for unknown paths.
    pub fn unmark_file_reviewed(&mut self, path: &str) {
        if let Some((_, reviewed)) = self.files.iter_mut().find(|(f, _)| f.path == path) {
            *reviewed = false;
        }
    }

    /// Recomputes aggregate counts from current state. Never cached.
    pub fn stats(&self) -> ReviewStats {
        let mut stats = ReviewStats {
            files_changed: self.files.len(),
            files_reviewed: self.files.iter().filter(|(_, r)| *r).count(),
            total_comments: self.comments.len(),
            ..ReviewStats::default()
        };
        for c in &self.comments {
            match c.severity {
                Severity::MustFix => stats.must_fix += 1,
                Severity::Suggestion => stats.suggestions += 1,
                Severity::Nitpick => stats.nitpicks += 1,
                Severity::Question => stats.questions += 1,
            }
        }
        stats
    }

    /// The document id this session will export under, derived from the
    /// immutable start time — repeated calls yield the same id.
    pub fn document_id(&self) -> String {
        self.started_at.format("review-%Y-%m-%d-%H%M%S").to_string()
    }

    /// Pure snapshot into an export document. Does not mutate the session
    /// and may be called repeatedly (preview, then final submit); every
    /// call shares the id, so submission is the terminal action.
    pub fn to_document(&self, decision: Decision, summary: impl Into<String>) -> ReviewDocument {
        ReviewDocument {
            review: ReviewHeader {
                id: self.document_id(),
                timestamp: toml_datetime(Utc::now()),
                base_ref: self.base_ref.clone(),
                head_ref: self.head_ref.clone(),
                decision,
                summary: summary.into(),
            },
            stats: self.stats(),
            comments: self
                .comments
                .iter()
                .map(|c| CommentBlock {
                    file: c.file.clone(),
                    line: c.line,
                    end_line: c.end_line,
                    severity: c.severity,
                    body: c.body.clone(),
                    code_context: c.code_context.clone(),
                    resolved: c.resolved,
                    timestamp: toml_datetime(c.created_at),
                })
                .collect(),
            reviewed_files: self
                .files
                .iter()
                .map(|(f, reviewed)| ReviewedFile {
                    path: f.path.clone(),
                    status: f.status,
                    reviewed: *reviewed,
                })
                .collect(),
        }
    }
}
