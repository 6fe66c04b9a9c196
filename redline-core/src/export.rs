//! Durable storage for exported review documents.
//!
//! Documents land under `.redline/reviews/` inside the working directory:
//! one file per submission keyed by the document id, plus `latest.toml`,
//! which is rewritten on every save and is the fixed hand-off path the fix
//! agent reads. The output directory is appended to `.gitignore` on a
//! best-effort basis so review artifacts never show up in the change sets
//! they describe.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::document::ReviewDocument;
use crate::error::Result;

/// Directory for review artifacts, relative to the working directory root.
pub const EXPORT_DIR: &str = ".redline/reviews";

/// Fixed-name alias always holding the most recent submission.
pub const LATEST_FILE: &str = "latest.toml";

/// Ignore-file entry covering everything redline writes.
const IGNORE_ENTRY: &str = ".redline/";

/// Writes review documents beneath a working directory root.
pub struct DocumentExporter {
    root: PathBuf,
}

impl DocumentExporter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn out_dir(&self) -> PathBuf {
        self.root.join(EXPORT_DIR)
    }

    /// Path of the fixed "latest" alias, whether or not it exists yet.
    pub fn latest_path(&self) -> PathBuf {
        self.out_dir().join(LATEST_FILE)
    }

    /// Persists `doc` and returns the path of the timestamped file.
    ///
    /// Both the timestamped file and `latest.toml` receive identical
    /// content; the alias is overwritten unconditionally so the external
    /// agent can always read a fixed name. A failed write surfaces as an
    /// error — callers keep their session alive and retry.
    pub async fn save(&self, doc: &ReviewDocument) -> Result<PathBuf> {
        let rendered = doc.to_toml()?;
        let dir = self.out_dir();
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(doc.file_name());
        tokio::fs::write(&path, &rendered).await?;
        tokio::fs::write(self.latest_path(), &rendered).await?;
        tracing::info!(path = %path.display(), "review document exported");

        // Keep review artifacts out of version control. Never fatal.
        if let Err(e) = ensure_ignored(&self.root).await {
            tracing::warn!(error = %e, "could not update .gitignore");
        }

        Ok(path)
    }

    /// Previously written documents, newest first by modification time.
    /// The `latest.toml` alias is excluded.
    pub async fn history(&self) -> Result<Vec<PathBuf>> {
        let dir = self.out_dir();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut entries: Vec<(SystemTime, PathBuf)> = Vec::new();
        let mut reader = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = reader.next_entry().await? {
            let path = entry.path();
            if path.extension().map(|e| e == "toml") != Some(true) {
                continue;
            }
            if path.file_name().map(|n| n == LATEST_FILE) == Some(true) {
                continue;
            }
            let modified = entry
                .metadata()
                .await
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            entries.push((modified, path));
        }

        // Names embed the start timestamp, so they break mtime ties.
        entries.sort_by(|a, b| b.cmp(a));
        Ok(entries.into_iter().map(|(_, p)| p).collect())
    }
}

/// Appends the redline directory to the root `.gitignore` when missing.
async fn ensure_ignored(root: &Path) -> std::io::Result<()> {
    let gitignore = root.join(".gitignore");
    let existing = match tokio::fs::read_to_string(&gitignore).await {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e),
    };
    if existing.lines().any(|l| l.trim() == IGNORE_ENTRY) {
        return Ok(());
    }
    let mut updated = existing;
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(IGNORE_ENTRY);
    updated.push('\n');
    tokio::fs::write(&gitignore, updated).await
}
