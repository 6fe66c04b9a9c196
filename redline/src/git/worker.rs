//! Background thread that owns git2::Repository for its lifetime.
//!
//! The repository handle is opened inside the thread and never passed out.
//! All communication is via channels: `GitRequest` in, oneshot replies out.
//!
//! Change-set resolution merges four sources in a fixed order — committed
//! diff, staged, unstaged, untracked — with first-seen-wins deduplication
//! by path. A pass that fails (invalid base ref, repository with no
//! commits) contributes zero files and a warning; only failing to open the
//! repository at all is fatal, and that is reported before the loop starts.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use crossbeam_channel::Receiver;
use git2::{Delta, Diff, DiffFindOptions, DiffOptions, Repository, Status, StatusOptions};

use redline_core::{ChangedFile, FileStatus};

use crate::git::types::{ChangeSet, CommitInfo, GitError, GitRequest};

/// Opens the repository backing the worker thread.
///
/// This is the one hard precondition of the whole git layer: everything
/// after it degrades gracefully, but a directory that is not a repository
/// is reported to the caller before any request is served.
pub fn open_repository(path: &Path) -> Result<Repository, GitError> {
    Repository::discover(path).map_err(|_| GitError::NotARepository(path.display().to_string()))
}

/// Entry point for the worker thread. Loops over incoming requests until
/// the channel is closed (all senders dropped).
pub fn git_worker_loop(repo: Repository, rx: Receiver<GitRequest>) {
    for request in rx {
        handle_request(&repo, request);
    }
}

/// Dispatches one request and sends the reply. A dropped reply receiver
/// just means the caller gave up waiting; the send result is ignored.
fn handle_request(repo: &Repository, request: GitRequest) {
    match request {
        GitRequest::ResolveChangeSet { base, head, reply } => {
            let _ = reply.send(resolve_change_set(repo, &base, &head));
        }
        GitRequest::FileAtRef { reference, path, reply } => {
            let _ = reply.send(file_at_ref(repo, &reference, &path));
        }
        GitRequest::RecentCommits { limit, reply } => {
            let _ = reply.send(recent_commits(repo, limit));
        }
        GitRequest::RefExists { reference, reply } => {
            let _ = reply.send(ref_exists(repo, &reference));
        }
        GitRequest::CurrentBranch { reply } => {
            let _ = reply.send(current_branch(repo));
        }
        GitRequest::ShortHash { reference, reply } => {
            let _ = reply.send(short_hash(repo, &reference));
        }
    }
}

/// Four ordered passes, first-seen-wins by path.
///
/// A path recorded by an earlier pass keeps its status; later passes only
/// accumulate line deltas onto it. This is what stops a file that is both
/// staged and further edited from appearing twice or double-counting.
pub fn resolve_change_set(repo: &Repository, base: &str, head: &str) -> ChangeSet {
    let mut out = ChangeSet::default();
    let mut index: HashMap<String, usize> = HashMap::new();

    let passes: [(&str, Result<Vec<ChangedFile>, git2::Error>); 4] = [
        ("committed diff", committed_diff(repo, base, head)),
        ("staged changes", staged_changes(repo)),
        ("unstaged changes", unstaged_changes(repo)),
        ("untracked files", untracked_files(repo)),
    ];

    for (pass, result) in passes {
        match result {
            Ok(files) => merge_pass(&mut out.files, &mut index, files),
            Err(e) => {
                tracing::warn!(pass, error = %e, "change-set pass contributed nothing");
                out.warnings.push(format!("{pass}: {e}"));
            }
        }
    }
    out
}

fn merge_pass(
    files: &mut Vec<ChangedFile>,
    index: &mut HashMap<String, usize>,
    incoming: Vec<ChangedFile>,
) {
    for file in incoming {
        match index.get(&file.path) {
            Some(&i) => {
                // Status and old_path are frozen at first sight.
                files[i].additions += file.additions;
                files[i].deletions += file.deletions;
            }
            None => {
                index.insert(file.path.clone(), files.len());
                files.push(file);
            }
        }
    }
}

fn delta_status(delta: Delta) -> FileStatus {
    match delta {
        Delta::Added | Delta::Untracked => FileStatus::Added,
        Delta::Deleted => FileStatus::Deleted,
        Delta::Renamed => FileStatus::Renamed,
        _ => FileStatus::Modified,
    }
}

/// Pass 1: everything that differs between `base` and `head` trees, with
/// rename detection pairing old and new paths.
fn committed_diff(
    repo: &Repository,
    base: &str,
    head: &str,
) -> Result<Vec<ChangedFile>, git2::Error> {
    let base_tree = repo.revparse_single(base)?.peel_to_commit()?.tree()?;
    let head_tree = repo.revparse_single(head)?.peel_to_commit()?.tree()?;
    let mut opts = DiffOptions::new();
    let mut diff =
        repo.diff_tree_to_tree(Some(&base_tree), Some(&head_tree), Some(&mut opts))?;
    let mut find = DiffFindOptions::new();
    find.renames(true);
    diff.find_similar(Some(&mut find))?;
    Ok(collect_files(&diff))
}

/// Pass 2: index vs HEAD tree (`git diff --cached`). Fails on a repository
/// with no commits yet — that failure becomes a warning upstream.
fn staged_changes(repo: &Repository) -> Result<Vec<ChangedFile>, git2::Error> {
    let head_tree = repo.head()?.peel_to_commit()?.tree()?;
    let mut opts = DiffOptions::new();
    let diff = repo.diff_tree_to_index(Some(&head_tree), None, Some(&mut opts))?;
    Ok(collect_files(&diff))
}

/// Pass 3: working directory vs index, tracked files only.
fn unstaged_changes(repo: &Repository) -> Result<Vec<ChangedFile>, git2::Error> {
    let mut opts = DiffOptions::new();
    let diff = repo.diff_index_to_workdir(None, Some(&mut opts))?;
    Ok(collect_files(&diff))
}

/// Pass 4: files present in the working tree but never committed. Always
/// `Added`; additions count the working-tree lines where the file is
/// readable text, else stay zero.
fn untracked_files(repo: &Repository) -> Result<Vec<ChangedFile>, git2::Error> {
    let mut opts = StatusOptions::new();
    opts.include_untracked(true).recurse_untracked_dirs(true);
    let statuses = repo.statuses(Some(&mut opts))?;

    let mut files = Vec::new();
    for entry in statuses.iter() {
        if !entry.status().contains(Status::WT_NEW) {
            continue;
        }
        let Some(path) = entry.path() else { continue };
        let additions = repo
            .workdir()
            .map(|w| w.join(path))
            .and_then(|p| std::fs::read_to_string(p).ok())
            .map(|s| s.lines().count())
            .unwrap_or(0);
        files.push(ChangedFile {
            path: path.to_owned(),
            status: FileStatus::Added,
            additions,
            deletions: 0,
            old_path: None,
        });
    }
    Ok(files)
}

/// Walks diff deltas and lines in a single pass, collecting per-file
/// status plus real added/removed line counts.
///
/// The file callback fires once per delta in order, so `last_mut()` in the
/// line callback always refers to the current file. `RefCell` shares
/// mutable access between the two closures, which git2 runs sequentially
/// on this thread.
fn collect_files(diff: &Diff<'_>) -> Vec<ChangedFile> {
    use std::cell::RefCell;

    let files: RefCell<Vec<ChangedFile>> = RefCell::new(Vec::new());

    let _ = diff.foreach(
        &mut |delta, _progress| {
            let status = delta_status(delta.status());
            let path = delta
                .new_file()
                .path()
                .or_else(|| delta.old_file().path())
                .unwrap_or(Path::new("unknown"))
                .to_string_lossy()
                .into_owned();
            let old_path = if status == FileStatus::Renamed {
                delta
                    .old_file()
                    .path()
                    .map(|p| p.to_string_lossy().into_owned())
            } else {
                None
            };
            files.borrow_mut().push(ChangedFile {
                path,
                status,
                additions: 0,
                deletions: 0,
                old_path,
            });
            true
        },
        None,
        None,
        Some(&mut |_delta, _hunk, line| {
            let mut files = files.borrow_mut();
            if let Some(f) = files.last_mut() {
                match line.origin() {
                    '+' => f.additions += 1,
                    '-' => f.deletions += 1,
                    _ => {}
                }
            }
            true
        }),
    );

    files.into_inner()
}

/// Content of `path` as of `reference`.
///
/// A path that does not exist at the reference yields an empty string —
/// the designed way to synthesize "before" content for added files. Only
/// an unresolvable reference is an error.
fn file_at_ref(repo: &Repository, reference: &str, path: &str) -> Result<String, GitError> {
    let tree = repo
        .revparse_single(reference)
        .map_err(|_| GitError::InvalidRef(reference.to_owned()))?
        .peel_to_tree()?;
    let entry = match tree.get_path(Path::new(path)) {
        Ok(e) => e,
        Err(_) => return Ok(String::new()),
    };
    let object = entry.to_object(repo)?;
    Ok(object
        .as_blob()
        .map(|b| String::from_utf8_lossy(b.content()).into_owned())
        .unwrap_or_default())
}

/// Recent commits from HEAD, newest first, for reference picking.
fn recent_commits(repo: &Repository, limit: usize) -> Result<Vec<CommitInfo>, GitError> {
    let mut walk = repo.revwalk()?;
    walk.push_head()?;

    let mut commits = Vec::new();
    for oid in walk.take(limit) {
        let commit = repo.find_commit(oid?)?;
        let hash = commit
            .as_object()
            .short_id()
            .ok()
            .and_then(|b| b.as_str().map(str::to_owned))
            .unwrap_or_else(|| commit.id().to_string());
        commits.push(CommitInfo {
            hash,
            summary: commit.summary().unwrap_or_default().to_owned(),
            author: commit.author().name().unwrap_or_default().to_owned(),
            date: commit_time(commit.time().seconds()),
        });
    }
    Ok(commits)
}

fn commit_time(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(seconds, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

fn ref_exists(repo: &Repository, reference: &str) -> bool {
    repo.revparse_single(reference)
        .and_then(|o| o.peel_to_commit())
        .is_ok()
}

fn current_branch(repo: &Repository) -> Option<String> {
    let head = repo.head().ok()?;
    if head.is_branch() {
        head.shorthand().map(str::to_owned)
    } else {
        None
    }
}

fn short_hash(repo: &Repository, reference: &str) -> Result<String, GitError> {
    let object = repo
        .revparse_single(reference)
        .map_err(|_| GitError::InvalidRef(reference.to_owned()))?;
    let buf = object.short_id()?;
    Ok(buf.as_str().unwrap_or_default().to_owned())
}
