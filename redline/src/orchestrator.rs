//! Use-case layer: the state machine over the single active session.
//!
//! Idle (no session) → Active (session exists) → Idle again on cancel or
//! successful submit. The orchestrator exclusively owns the session and is
//! driven by discrete, serialized external events, so session mutations
//! never overlap. The only suspending operations are change-set resolution
//! (`start`) and document export (`submit`).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use redline_core::{
    CommentIdSource, Decision, DocumentExporter, ReviewComment, ReviewError, ReviewSession,
    ReviewStats, Severity,
};

use crate::git::{ChangeSet, GitClient, GitError};

#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// A mutation or submit arrived while no session is active.
    #[error("no active review session")]
    NoActiveSession,

    /// `start` without confirmed discard while a session is active.
    #[error("a review session is already active; discard it first")]
    SessionActive,

    /// The requested base reference does not resolve to a commit.
    #[error("invalid base reference: {0}")]
    InvalidRef(String),

    #[error(transparent)]
    Git(#[from] GitError),

    /// Model rejection or export failure. On export failure the session
    /// stays active so the reviewer can retry without losing comments.
    #[error(transparent)]
    Review(#[from] ReviewError),
}

/// Result of a `start` call. An empty change set is a no-op condition,
/// not an error — the orchestrator stays Idle.
#[derive(Debug)]
pub enum StartOutcome {
    Started {
        files: usize,
        /// Per-pass resolution failures, already best-effort-tolerated.
        warnings: Vec<String>,
    },
    NothingToReview,
}

/// Result of a successful submit. The hand-off warning, when present,
/// means the fix agent was not notified — the exported document is still
/// complete and current at `latest_path`.
#[derive(Debug)]
pub struct SubmitOutcome {
    pub document_path: PathBuf,
    pub latest_path: PathBuf,
    pub handoff_warning: Option<String>,
}

/// Owns the single active [`ReviewSession`] and drives its lifecycle.
pub struct SessionOrchestrator {
    git: GitClient,
    exporter: DocumentExporter,
    ids: Arc<CommentIdSource>,
    current: Option<ReviewSession>,
    agent_command: Option<String>,
}

impl SessionOrchestrator {
    pub fn new(
        git: GitClient,
        exporter: DocumentExporter,
        agent_command: Option<String>,
    ) -> Self {
        Self {
            git,
            exporter,
            ids: Arc::new(CommentIdSource::new()),
            current: None,
            agent_command,
        }
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    /// Read access for presentation layers. Never hand out `&mut` — all
    /// mutation goes through the named operations below.
    pub fn session(&self) -> Option<&ReviewSession> {
        self.current.as_ref()
    }

    fn session_mut(&mut self) -> Result<&mut ReviewSession, OrchestratorError> {
        self.current.as_mut().ok_or(OrchestratorError::NoActiveSession)
    }

    /// Starts a review of everything that differs from `base_ref`.
    ///
    /// Precondition: Idle, unless the caller explicitly confirmed
    /// discarding the active session. Resolution failures of individual
    /// passes surface as warnings in the outcome; an empty change set
    /// aborts the transition and reports [`StartOutcome::NothingToReview`].
    pub async fn start(
        &mut self,
        base_ref: &str,
        discard_active: bool,
    ) -> Result<StartOutcome, OrchestratorError> {
        if self.current.is_some() {
            if !discard_active {
                return Err(OrchestratorError::SessionActive);
            }
            tracing::info!("discarding active session on explicit request");
            self.current = None;
        }

        if !self.git.ref_exists(base_ref).await? {
            return Err(OrchestratorError::InvalidRef(base_ref.to_owned()));
        }

        let head_ref = self
            .git
            .short_hash("HEAD")
            .await
            .unwrap_or_else(|_| "HEAD".to_owned());
        let ChangeSet { files, warnings } =
            self.git.resolve_change_set(base_ref, "HEAD").await?;

        if files.is_empty() {
            tracing::info!(base_ref, "nothing to review");
            return Ok(StartOutcome::NothingToReview);
        }

        let count = files.len();
        tracing::info!(base_ref, head_ref = %head_ref, files = count, "review session started");
        self.current = Some(ReviewSession::new(base_ref, head_ref, files, self.ids.clone()));
        Ok(StartOutcome::Started { files: count, warnings })
    }

    pub fn add_comment(
        &mut self,
        file: &str,
        line: u32,
        body: &str,
        severity: Severity,
        end_line: Option<u32>,
        code_context: Option<String>,
    ) -> Result<ReviewComment, OrchestratorError> {
        let comment = self
            .session_mut()?
            .add_comment(file, line, body, severity, end_line, code_context)?
            .clone();
        Ok(comment)
    }

    pub fn remove_comment(&mut self, id: &str) -> Result<bool, OrchestratorError> {
        Ok(self.session_mut()?.remove_comment(id))
    }

    pub fn update_comment(
        &mut self,
        id: &str,
        body: &str,
        severity: Option<Severity>,
    ) -> Result<bool, OrchestratorError> {
        Ok(self.session_mut()?.update_comment(id, body, severity))
    }

    pub fn toggle_resolved(&mut self, id: &str) -> Result<bool, OrchestratorError> {
        Ok(self.session_mut()?.toggle_resolved(id))
    }

    pub fn toggle_file_reviewed(&mut self, path: &str) -> Result<bool, OrchestratorError> {
        Ok(self.session_mut()?.toggle_file_reviewed(path))
    }

    pub fn mark_file_reviewed(&mut self, path: &str) -> Result<(), OrchestratorError> {
        self.session_mut()?.mark_file_reviewed(path);
        Ok(())
    }

    pub fn unmark_file_reviewed(&mut self, path: &str) -> Result<(), OrchestratorError> {
        self.session_mut()?.unmark_file_reviewed(path);
        Ok(())
    }

    pub fn stats(&self) -> Result<ReviewStats, OrchestratorError> {
        Ok(self
            .session()
            .ok_or(OrchestratorError::NoActiveSession)?
            .stats())
    }

    /// Snapshots, exports, and discards the active session.
    ///
    /// Export failure keeps the session active for retry. After a
    /// successful export the session is gone no matter what the hand-off
    /// does — hand-off failure is downgraded to a warning carrying the
    /// fixed document path.
    pub async fn submit(
        &mut self,
        decision: Decision,
        summary: &str,
        auto_fix: bool,
    ) -> Result<SubmitOutcome, OrchestratorError> {
        let session = self
            .current
            .as_ref()
            .ok_or(OrchestratorError::NoActiveSession)?;
        let document = session.to_document(decision, summary);

        let document_path = self.exporter.save(&document).await?;
        self.current = None;

        let latest_path = self.exporter.latest_path();
        let handoff_warning = if auto_fix {
            self.hand_off(&latest_path).err()
        } else {
            None
        };
        if let Some(warning) = &handoff_warning {
            tracing::warn!(warning = %warning, "auto-fix hand-off did not complete");
        }

        Ok(SubmitOutcome { document_path, latest_path, handoff_warning })
    }

    /// Previously exported documents, newest first, from the same root
    /// the submit path writes to.
    pub async fn history(&self) -> Result<Vec<PathBuf>, OrchestratorError> {
        Ok(self.exporter.history().await?)
    }

    /// Discards the active session without exporting.
    pub fn cancel(&mut self) -> Result<(), OrchestratorError> {
        if self.current.take().is_none() {
            return Err(OrchestratorError::NoActiveSession);
        }
        tracing::info!("review session cancelled");
        Ok(())
    }

    /// Fire-and-forget notification of the external fix agent: spawn the
    /// configured command with the fixed document path appended. Nobody
    /// waits on the child; submit has already completed.
    fn hand_off(&self, latest: &Path) -> Result<(), String> {
        let command = self.agent_command.as_deref().ok_or_else(|| {
            format!(
                "no agent command configured; apply the review manually from {}",
                latest.display()
            )
        })?;
        let mut parts = command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| "agent command is empty".to_owned())?;

        tokio::process::Command::new(program)
            .args(parts)
            .arg(latest)
            .spawn()
            .map(|_child| tracing::info!(command, "fix agent notified"))
            .map_err(|e| {
                format!(
                    "could not launch fix agent ({e}); document is at {}",
                    latest.display()
                )
            })
    }
}
