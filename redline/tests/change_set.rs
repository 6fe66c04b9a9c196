//! Change-set resolution against scratch repositories.
//!
//! Each test builds a throwaway repository inside a TempDir with git2 and
//! exercises the four-pass merge through the async client facade.

use std::path::Path;

use git2::{IndexAddOption, Repository};

use redline::git::{GitClient, GitError};
use redline_core::FileStatus;

fn init_repo(dir: &Path) -> Repository {
    let repo = Repository::init(dir).unwrap();
    let mut cfg = repo.config().unwrap();
    cfg.set_str("user.name", "Reviewer").unwrap();
    cfg.set_str("user.email", "reviewer@example.com").unwrap();
    repo
}

fn write(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

fn commit_all(repo: &Repository, message: &str) {
    let mut index = repo.index().unwrap();
    index
        .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
        .unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = repo.signature().unwrap();
    let parent = repo
        .head()
        .ok()
        .and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<_> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap();
}

fn stage(repo: &Repository, rel: &str) {
    let mut index = repo.index().unwrap();
    index.add_path(Path::new(rel)).unwrap();
    index.write().unwrap();
}

#[tokio::test]
async fn merges_all_four_sources() {
    let dir = tempfile::TempDir::new().unwrap();
    let repo = init_repo(dir.path());

    write(dir.path(), "a.txt", "one\ntwo\nthree\n");
    write(dir.path(), "b.txt", "alpha\nbeta\n");
    commit_all(&repo, "base");

    // Committed change on top of base.
    write(dir.path(), "a.txt", "one\ntwo\nthree\nfour\n");
    commit_all(&repo, "extend a");

    // Staged-only new file.
    write(dir.path(), "staged.txt", "s1\ns2\n");
    stage(&repo, "staged.txt");

    // Unstaged edit of a tracked file.
    write(dir.path(), "b.txt", "alpha\nbeta\ngamma\n");

    // Untracked file, three lines.
    write(dir.path(), "untracked.txt", "u1\nu2\nu3\n");

    let git = GitClient::open(dir.path()).await.unwrap();
    let set = git.resolve_change_set("HEAD~1", "HEAD").await.unwrap();
    assert!(set.warnings.is_empty(), "warnings: {:?}", set.warnings);

    let find = |p: &str| set.files.iter().find(|f| f.path == p).unwrap();
    assert_eq!(find("a.txt").status, FileStatus::Modified);
    assert_eq!(find("a.txt").additions, 1);
    assert_eq!(find("staged.txt").status, FileStatus::Added);
    assert_eq!(find("b.txt").status, FileStatus::Modified);
    let untracked = find("untracked.txt");
    assert_eq!(untracked.status, FileStatus::Added);
    assert_eq!(untracked.additions, 3);
    assert_eq!(set.files.len(), 4);
}

#[tokio::test]
async fn staged_plus_unstaged_file_appears_once() {
    let dir = tempfile::TempDir::new().unwrap();
    let repo = init_repo(dir.path());

    write(dir.path(), "c.txt", "l1\nl2\nl3\n");
    commit_all(&repo, "base");

    // Stage one edit, then edit again without staging.
    write(dir.path(), "c.txt", "l1\nl2\nl3\nl4\n");
    stage(&repo, "c.txt");
    write(dir.path(), "c.txt", "l1\nl2\nl3\nl4\nl5\n");

    let git = GitClient::open(dir.path()).await.unwrap();
    let set = git.resolve_change_set("HEAD", "HEAD").await.unwrap();

    assert_eq!(set.files.len(), 1);
    let c = &set.files[0];
    assert_eq!(c.path, "c.txt");
    // Status was frozen by the staged pass, stats accumulated both passes.
    assert_eq!(c.status, FileStatus::Modified);
    assert_eq!(c.additions, 2);
}

#[tokio::test]
async fn invalid_base_ref_degrades_to_working_tree() {
    let dir = tempfile::TempDir::new().unwrap();
    let repo = init_repo(dir.path());
    write(dir.path(), "a.txt", "x\n");
    commit_all(&repo, "base");
    write(dir.path(), "fresh.txt", "one line\n");

    let git = GitClient::open(dir.path()).await.unwrap();
    let set = git
        .resolve_change_set("no-such-ref", "HEAD")
        .await
        .unwrap();

    assert!(set.warnings.iter().any(|w| w.starts_with("committed diff")));
    assert_eq!(set.files.len(), 1);
    assert_eq!(set.files[0].path, "fresh.txt");
    assert_eq!(set.files[0].status, FileStatus::Added);
}

#[tokio::test]
async fn repository_without_commits_still_lists_untracked() {
    let dir = tempfile::TempDir::new().unwrap();
    let _repo = init_repo(dir.path());
    write(dir.path(), "brand_new.txt", "a\nb\n");

    let git = GitClient::open(dir.path()).await.unwrap();
    let set = git.resolve_change_set("HEAD", "HEAD").await.unwrap();

    // Committed and staged passes both fail without a HEAD commit.
    assert!(set.warnings.len() >= 2);
    assert_eq!(set.files.len(), 1);
    assert_eq!(set.files[0].path, "brand_new.txt");
}

#[tokio::test]
async fn not_a_repository_is_a_hard_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let err = GitClient::open(dir.path()).await.unwrap_err();
    assert!(matches!(err, GitError::NotARepository(_)));
}

#[tokio::test]
async fn rename_is_detected_with_old_path() {
    let dir = tempfile::TempDir::new().unwrap();
    let repo = init_repo(dir.path());

    let body = "fn main() {\n    println!(\"hello\");\n}\n// filler\n// filler\n// filler\n";
    write(dir.path(), "old_name.rs", body);
    commit_all(&repo, "base");

    std::fs::rename(dir.path().join("old_name.rs"), dir.path().join("new_name.rs")).unwrap();
    let mut index = repo.index().unwrap();
    index.remove_path(Path::new("old_name.rs")).unwrap();
    index.add_path(Path::new("new_name.rs")).unwrap();
    index.write().unwrap();
    commit_all(&repo, "rename");

    let git = GitClient::open(dir.path()).await.unwrap();
    let set = git.resolve_change_set("HEAD~1", "HEAD").await.unwrap();

    assert_eq!(set.files.len(), 1);
    let f = &set.files[0];
    assert_eq!(f.status, FileStatus::Renamed);
    assert_eq!(f.path, "new_name.rs");
    assert_eq!(f.old_path.as_deref(), Some("old_name.rs"));
}

#[tokio::test]
async fn first_seen_status_wins_over_later_passes() {
    let dir = tempfile::TempDir::new().unwrap();
    let repo = init_repo(dir.path());

    write(dir.path(), "a.txt", "one\n");
    commit_all(&repo, "base");
    write(dir.path(), "a.txt", "one\ntwo\n");
    commit_all(&repo, "modify");

    // Deleted in the working tree after being committed as modified.
    std::fs::remove_file(dir.path().join("a.txt")).unwrap();

    let git = GitClient::open(dir.path()).await.unwrap();
    let set = git.resolve_change_set("HEAD~1", "HEAD").await.unwrap();

    assert_eq!(set.files.len(), 1);
    assert_eq!(set.files[0].status, FileStatus::Modified);
}

#[tokio::test]
async fn file_content_queries_tolerate_missing_paths() {
    let dir = tempfile::TempDir::new().unwrap();
    let repo = init_repo(dir.path());
    write(dir.path(), "a.txt", "committed content\n");
    commit_all(&repo, "base");

    let git = GitClient::open(dir.path()).await.unwrap();
    assert_eq!(
        git.file_at_ref("HEAD", "a.txt").await.unwrap(),
        "committed content\n"
    );
    // Missing at the ref: empty content by design, not an error.
    assert_eq!(git.file_at_ref("HEAD", "never_existed.txt").await.unwrap(), "");
    assert!(matches!(
        git.file_at_ref("bogus-ref", "a.txt").await,
        Err(GitError::InvalidRef(_))
    ));
}

#[tokio::test]
async fn reference_helpers_answer_basic_queries() {
    let dir = tempfile::TempDir::new().unwrap();
    let repo = init_repo(dir.path());
    write(dir.path(), "a.txt", "x\n");
    commit_all(&repo, "first");
    write(dir.path(), "a.txt", "y\n");
    commit_all(&repo, "second");

    let git = GitClient::open(dir.path()).await.unwrap();

    assert!(git.ref_exists("HEAD").await.unwrap());
    assert!(!git.ref_exists("does-not-exist").await.unwrap());

    let commits = git.recent_commits(10).await.unwrap();
    assert_eq!(commits.len(), 2);
    assert_eq!(commits[0].summary, "second");
    assert_eq!(commits[0].author, "Reviewer");

    let hash = git.short_hash("HEAD").await.unwrap();
    assert!(!hash.is_empty() && hash.len() < 40);

    let branch = git.current_branch().await.unwrap();
    assert!(branch.is_some());
}
