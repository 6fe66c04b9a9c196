//! The exported review document and its TOML wire format.
//!
//! A `ReviewDocument` is the immutable snapshot of a finished session that
//! the downstream fix agent consumes. The on-disk format is plain TOML:
//! `[review]` and `[stats]` tables followed by `[[comments]]` and
//! `[[reviewedFiles]]` arrays-of-tables, in session insertion order.
//! Timestamps are unquoted TOML datetimes; multi-line strings serialize as
//! triple-quoted blocks. Every field round-trips losslessly.

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};
use toml::value::{Date, Datetime, Offset, Time};

use crate::error::Result;
use crate::types::{Decision, ReviewStats, ReviewedFile, Severity};

/// Converts a UTC timestamp to a TOML datetime, truncated to whole seconds.
///
/// Second precision is deliberate: the document id embeds the same instant
/// as `review-%Y-%m-%d-%H%M%S`, and sub-second noise would break the
/// serialize/parse/serialize fixed point.
pub fn toml_datetime(t: DateTime<Utc>) -> Datetime {
    Datetime {
        date: Some(Date {
            year: t.year() as u16,
            month: t.month() as u8,
            day: t.day() as u8,
        }),
        time: Some(Time {
            hour: t.hour() as u8,
            minute: t.minute() as u8,
            second: t.second() as u8,
            nanosecond: 0,
        }),
        offset: Some(Offset::Z),
    }
}

/// Session-level metadata of an exported review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewHeader {
    /// `review-YYYY-MM-DD-HHMMSS`, derived from the session start time.
    pub id: String,
    /// When the snapshot was taken (submission time).
    pub timestamp: Datetime,
    pub base_ref: String,
    pub head_ref: String,
    pub decision: Decision,
    pub summary: String,
}

/// One comment block in the document, in session insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentBlock {
    pub file: String,
    /// 1-indexed line in the post-change file.
    pub line: u32,
    /// Present only for ranges, i.e. when strictly greater than `line`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<u32>,
    pub severity: Severity,
    pub body: String,
    /// Best-effort source snippet, advisory only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_context: Option<String>,
    pub resolved: bool,
    pub timestamp: Datetime,
}

/// The complete export artifact. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewDocument {
    pub review: ReviewHeader,
    pub stats: ReviewStats,
    #[serde(default)]
    pub comments: Vec<CommentBlock>,
    #[serde(default, rename = "reviewedFiles")]
    pub reviewed_files: Vec<ReviewedFile>,
}

impl ReviewDocument {
    /// Serializes to the on-disk TOML form.
    ///
    /// `to_string_pretty` is what gives multi-line strings their
    /// triple-quoted block form instead of `\n` escapes.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Parses a document previously written by [`ReviewDocument::to_toml`].
    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// File name the exporter writes this document under.
    pub fn file_name(&self) -> String {
        format!("{}.toml", self.review.id)
    }
}
