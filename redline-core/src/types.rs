//! Core data model for a review session.
//!
//! Everything in this module is fully owned and `Send` so values can move
//! freely between the git worker thread, the orchestrator, and the exporter.
//! Serde renames reproduce the on-disk key names of the exported document
//! exactly; round-tripping through TOML must be lossless.

use serde::{Deserialize, Serialize};

/// Change status of a file within a change set.
///
/// Serialized as lowercase snake_case (`"added"`, `"modified"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
}

impl FileStatus {
    /// Maps a porcelain status letter to a `FileStatus`.
    ///
    /// `A` added, `D` deleted, `R` renamed, `M` modified. Anything else
    /// (notably the `?` untracked marker) maps to `Added`.
    pub fn from_letter(letter: char) -> Self {
        match letter {
            'D' => FileStatus::Deleted,
            'R' => FileStatus::Renamed,
            'M' => FileStatus::Modified,
            _ => FileStatus::Added,
        }
    }

    /// Single-letter display form, the inverse of [`FileStatus::from_letter`].
    pub fn letter(self) -> char {
        match self {
            FileStatus::Added => 'A',
            FileStatus::Modified => 'M',
            FileStatus::Deleted => 'D',
            FileStatus::Renamed => 'R',
        }
    }
}

/// A single entry in a change set.
///
/// `path` is repository-relative with forward slashes and is the identity
/// key: a change set never contains two entries with the same path. Once a
/// file is placed in a session its metadata is never mutated — a refreshed
/// change set is a new list, reconciled by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedFile {
    /// Repository-relative path, forward-slash normalized.
    pub path: String,
    /// Change status, frozen by the first resolver pass that saw the path.
    pub status: FileStatus,
    /// Lines added, accumulated across resolver passes.
    pub additions: usize,
    /// Lines removed, accumulated across resolver passes.
    pub deletions: usize,
    /// Previous path, present only when `status == Renamed`.
    pub old_path: Option<String>,
}

/// Severity of a review comment, ordered by urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    MustFix,
    Suggestion,
    Nitpick,
    Question,
}

/// The reviewer's overall verdict attached to a submitted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Comment,
    RequestChanges,
}

/// Aggregate counts over a session, recomputed on every access.
///
/// Derived data only — never stored, never cached. The invariant
/// `total_comments == must_fix + suggestions + nitpicks + questions`
/// holds by construction in [`crate::session::ReviewSession::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub files_changed: usize,
    pub files_reviewed: usize,
    pub total_comments: usize,
    pub must_fix: usize,
    pub suggestions: usize,
    pub nitpicks: usize,
    pub questions: usize,
}

/// Per-file review completion, derived from the session's file list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewedFile {
    pub path: String,
    pub status: FileStatus,
    pub reviewed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_letters_round_trip() {
        for status in [
            FileStatus::Added,
            FileStatus::Modified,
            FileStatus::Deleted,
            FileStatus::Renamed,
        ] {
            assert_eq!(FileStatus::from_letter(status.letter()), status);
        }
    }

    #[test]
    fn untracked_marker_maps_to_added() {
        assert_eq!(FileStatus::from_letter('?'), FileStatus::Added);
        assert_eq!(FileStatus::from_letter('X'), FileStatus::Added);
    }

    #[test]
    fn severity_serializes_snake_case() {
        assert_eq!(
            toml::to_string(&std::collections::BTreeMap::from([("s", Severity::MustFix)]))
                .unwrap()
                .trim(),
            "s = \"must_fix\""
        );
    }

    #[test]
    fn decision_serializes_snake_case() {
        assert_eq!(
            toml::to_string(&std::collections::BTreeMap::from([(
                "d",
                Decision::RequestChanges
            )]))
            .unwrap()
            .trim(),
            "d = \"request_changes\""
        );
    }
}
