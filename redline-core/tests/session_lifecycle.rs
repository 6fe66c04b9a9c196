//! End-to-end lifecycle: build a session, review it, snapshot it, export
//! it, and read the document back from disk.

use std::sync::Arc;

use redline_core::{
    ChangedFile, CommentIdSource, Decision, DocumentExporter, FileStatus, ReviewDocument,
    ReviewSession, Severity,
};

fn change_set() -> Vec<ChangedFile> {
    vec![
        ChangedFile {
            path: "src/parser.rs".to_owned(),
            status: FileStatus::Modified,
            additions: 42,
            deletions: 7,
            old_path: None,
        },
        ChangedFile {
            path: "src/codec/frame.rs".to_owned(),
            status: FileStatus::Renamed,
            additions: 3,
            deletions: 3,
            old_path: Some("src/frame.rs".to_owned()),
        },
        ChangedFile {
            path: "docs/NOTES.md".to_owned(),
            status: FileStatus::Added,
            additions: 12,
            deletions: 0,
            old_path: None,
        },
    ]
}

#[tokio::test]
async fn full_review_round_trip() {
    let mut session = ReviewSession::new(
        "main",
        "f00dfeed",
        change_set(),
        Arc::new(CommentIdSource::new()),
    );

    session
        .add_comment(
            "src/parser.rs",
            17,
            "This loop re-parses the header on every iteration.",
            Severity::MustFix,
            Some(24),
            Some("for chunk in input.chunks(4) {".to_owned()),
        )
        .unwrap();
    let q = session
        .add_comment(
            "docs/NOTES.md",
            1,
            "Is this doc meant to ship?",
            Severity::Question,
            None,
            None,
        )
        .unwrap()
        .id
        .clone();
    session.toggle_resolved(&q);
    session.mark_file_reviewed("src/parser.rs");
    session.mark_file_reviewed("src/codec/frame.rs");

    let stats = session.stats();
    assert_eq!(stats.files_changed, 3);
    assert_eq!(stats.files_reviewed, 2);
    assert_eq!(stats.total_comments, 2);

    let doc = session.to_document(
        Decision::RequestChanges,
        "Parser hot path needs fixing.\nEverything else is fine.",
    );
    assert_eq!(doc.stats, stats);
    assert_eq!(doc.comments.len(), 2);
    assert!(doc.comments[1].resolved);

    let dir = tempfile::TempDir::new().unwrap();
    let exporter = DocumentExporter::new(dir.path());
    let path = exporter.save(&doc).await.unwrap();

    let reread = ReviewDocument::from_toml(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(reread, doc);
    assert_eq!(reread.comments, doc.comments);
    assert_eq!(reread.reviewed_files, doc.reviewed_files);

    // The fixed alias carries the same bytes as the timestamped file.
    let latest = std::fs::read_to_string(exporter.latest_path()).unwrap();
    assert_eq!(latest, std::fs::read_to_string(&path).unwrap());
}

#[tokio::test]
async fn two_sessions_two_documents_one_latest() {
    let ids = Arc::new(CommentIdSource::new());
    let dir = tempfile::TempDir::new().unwrap();
    let exporter = DocumentExporter::new(dir.path());

    let first = ReviewSession::new("main", "aaaa111", change_set(), ids.clone());
    let mut first_doc = first.to_document(Decision::Approve, "round one");
    // Distinct ids regardless of wall-clock resolution.
    first_doc.review.id = "review-2026-05-01-080000".to_owned();
    exporter.save(&first_doc).await.unwrap();

    let second = ReviewSession::new("main", "bbbb222", change_set(), ids);
    let mut second_doc = second.to_document(Decision::Comment, "round two");
    second_doc.review.id = "review-2026-05-01-091500".to_owned();
    exporter.save(&second_doc).await.unwrap();

    let history = exporter.history().await.unwrap();
    assert_eq!(history.len(), 2);

    let latest =
        ReviewDocument::from_toml(&std::fs::read_to_string(exporter.latest_path()).unwrap())
            .unwrap();
    assert_eq!(latest.review.summary, "round two");
    assert_eq!(latest.review.head_ref, "bbbb222");
}
