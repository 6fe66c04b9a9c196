//! redline — line-oriented review driver.
//!
//! Thin presentation glue over the review core: starts a session against a
//! baseline reference, then reads one command per line from stdin and maps
//! it onto the orchestrator's operations. Commands are handled strictly one
//! at a time, so exactly one mutation is ever in flight.
//!
//! Usage: `redline [base-ref]` inside a repository. The base ref defaults
//! to the configured one (`main` out of the box).

use std::io::{BufRead, Write};

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use redline_core::{Decision, DocumentExporter, Severity};

use redline::config;
use redline::git::GitClient;
use redline::orchestrator::{SessionOrchestrator, StartOutcome};

fn parse_severity(word: &str) -> Option<Severity> {
    match word {
        "must_fix" => Some(Severity::MustFix),
        "suggestion" => Some(Severity::Suggestion),
        "nitpick" => Some(Severity::Nitpick),
        "question" => Some(Severity::Question),
        _ => None,
    }
}

fn parse_decision(word: &str) -> Option<Decision> {
    match word {
        "approve" => Some(Decision::Approve),
        "comment" => Some(Decision::Comment),
        "request_changes" => Some(Decision::RequestChanges),
        _ => None,
    }
}

/// Accepts `12` or `12-20`, returning `(line, end_line)`.
fn parse_line_range(range: &str) -> Option<(u32, Option<u32>)> {
    match range.split_once('-') {
        Some((a, b)) => Some((a.parse().ok()?, Some(b.parse().ok()?))),
        None => Some((range.parse().ok()?, None)),
    }
}

/// Best-effort snippet of `line` from the working-tree copy of `file`.
fn snippet(file: &str, line: u32) -> Option<String> {
    let content = std::fs::read_to_string(file).ok()?;
    content
        .lines()
        .nth(line.saturating_sub(1) as usize)
        .map(|l| l.trim_end().to_owned())
}

const HELP: &str = "\
commands:
  files                                    list the change set
  comments                                 list comments
  stats                                    show review progress
  comment <file> <line[-end]> <sev> <body> add a comment (sev: must_fix|suggestion|nitpick|question)
  edit <id> [<sev>] <body>                 rewrite a comment
  delete <id>                              remove a comment
  resolve <id>                             toggle a comment's resolved flag
  review <path>                            toggle a file's reviewed flag
  show <ref> <path>                        print a file as of a reference
  log [n]                                  recent commits
  history                                  previously exported documents
  submit <decision> [--fix] <summary>      export and end the session
  cancel                                   discard the session
  quit";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cfg = config::load();
    let base_ref = std::env::args().nth(1).unwrap_or_else(|| cfg.base_ref.clone());

    let cwd = std::env::current_dir()?;
    let git = GitClient::open(&cwd).await?;
    let exporter = DocumentExporter::new(&cwd);
    let mut orch = SessionOrchestrator::new(git.clone(), exporter, cfg.agent_command.clone());

    if let Ok(Some(branch)) = git.current_branch().await {
        println!("on branch {branch}");
    }

    match orch.start(&base_ref, false).await? {
        StartOutcome::NothingToReview => {
            println!("nothing to review against {base_ref}");
            return Ok(());
        }
        StartOutcome::Started { files, warnings } => {
            println!("reviewing {files} changed file(s) against {base_ref}");
            for w in warnings {
                println!("warning: {w}");
            }
        }
    }

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("redline> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let line = line?;
        match run_command(line.trim(), &mut orch, &git).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => println!("error: {e}"),
        }
        if !orch.is_active() {
            break;
        }
    }
    Ok(())
}

/// Executes one command. Returns `Ok(false)` to exit the loop.
async fn run_command(
    line: &str,
    orch: &mut SessionOrchestrator,
    git: &GitClient,
) -> Result<bool> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else { return Ok(true) };
    let rest: Vec<&str> = words.collect();

    match command {
        "help" => println!("{HELP}"),
        "files" => {
            let Some(session) = orch.session() else { return Ok(true) };
            for (file, reviewed) in session.files_with_reviewed() {
                println!(
                    "{} {} +{:<4} -{:<4} {}{}",
                    if reviewed { '*' } else { ' ' },
                    file.status.letter(),
                    file.additions,
                    file.deletions,
                    file.path,
                    file.old_path
                        .as_deref()
                        .map(|p| format!("  (was {p})"))
                        .unwrap_or_default(),
                );
            }
        }
        "comments" => {
            let Some(session) = orch.session() else { return Ok(true) };
            for c in session.comments() {
                println!(
                    "{} [{}] {}:{} {}{}",
                    c.id,
                    match c.severity {
                        Severity::MustFix => "must_fix",
                        Severity::Suggestion => "suggestion",
                        Severity::Nitpick => "nitpick",
                        Severity::Question => "question",
                    },
                    c.file,
                    c.line,
                    c.body,
                    if c.resolved { "  (resolved)" } else { "" },
                );
            }
        }
        "stats" => {
            let s = orch.stats()?;
            println!(
                "{}/{} files reviewed, {} comments ({} must_fix, {} suggestion, {} nitpick, {} question)",
                s.files_reviewed,
                s.files_changed,
                s.total_comments,
                s.must_fix,
                s.suggestions,
                s.nitpicks,
                s.questions,
            );
        }
        "comment" => {
            let (Some(file), Some(range), Some(sev)) =
                (rest.first(), rest.get(1), rest.get(2))
            else {
                println!("usage: comment <file> <line[-end]> <severity> <body>");
                return Ok(true);
            };
            let Some((lo, hi)) = parse_line_range(range) else {
                println!("bad line range: {range}");
                return Ok(true);
            };
            let Some(severity) = parse_severity(sev) else {
                println!("bad severity: {sev}");
                return Ok(true);
            };
            let body = rest[3..].join(" ");
            let context = snippet(file, lo);
            let comment = orch.add_comment(file, lo, &body, severity, hi, context)?;
            println!("added {}", comment.id);
        }
        "edit" => {
            let Some(id) = rest.first() else {
                println!("usage: edit <id> [<severity>] <body>");
                return Ok(true);
            };
            let (severity, body_from) = match rest.get(1).and_then(|w| parse_severity(w)) {
                Some(s) => (Some(s), 2),
                None => (None, 1),
            };
            let body = rest[body_from..].join(" ");
            if orch.update_comment(id, &body, severity)? {
                println!("updated {id}");
            } else {
                println!("no such comment: {id}");
            }
        }
        "delete" => {
            let Some(id) = rest.first() else {
                println!("usage: delete <id>");
                return Ok(true);
            };
            if orch.remove_comment(id)? {
                println!("deleted {id}");
            } else {
                println!("no such comment: {id}");
            }
        }
        "resolve" => {
            let Some(id) = rest.first() else {
                println!("usage: resolve <id>");
                return Ok(true);
            };
            println!("resolved = {}", orch.toggle_resolved(id)?);
        }
        "review" => {
            let Some(path) = rest.first() else {
                println!("usage: review <path> [on|off]");
                return Ok(true);
            };
            match rest.get(1).copied() {
                Some("on") => {
                    orch.mark_file_reviewed(path)?;
                    println!("reviewed = true");
                }
                Some("off") => {
                    orch.unmark_file_reviewed(path)?;
                    println!("reviewed = false");
                }
                _ => println!("reviewed = {}", orch.toggle_file_reviewed(path)?),
            }
        }
        "show" => {
            let (Some(reference), Some(path)) = (rest.first(), rest.get(1)) else {
                println!("usage: show <ref> <path>");
                return Ok(true);
            };
            print!("{}", git.file_at_ref(reference, path).await?);
        }
        "log" => {
            let limit = rest
                .first()
                .and_then(|n| n.parse().ok())
                .unwrap_or(10usize);
            for c in git.recent_commits(limit).await? {
                println!("{} {} ({}, {})", c.hash, c.summary, c.author, c.date.date_naive());
            }
        }
        "history" => {
            for path in orch.history().await? {
                println!("{}", path.display());
            }
        }
        "submit" => {
            let Some(decision) = rest.first().and_then(|w| parse_decision(w)) else {
                println!("usage: submit <approve|comment|request_changes> [--fix] <summary>");
                return Ok(true);
            };
            let auto_fix = rest.get(1) == Some(&"--fix");
            let summary_from = if auto_fix { 2 } else { 1 };
            let summary = rest[summary_from..].join(" ");
            let outcome = orch.submit(decision, &summary, auto_fix).await?;
            println!("exported {}", outcome.document_path.display());
            println!("latest   {}", outcome.latest_path.display());
            if let Some(warning) = outcome.handoff_warning {
                println!("warning: {warning}");
            }
            return Ok(false);
        }
        "cancel" => {
            orch.cancel()?;
            println!("session discarded");
            return Ok(false);
        }
        "quit" | "exit" => {
            orch.cancel()?;
            return Ok(false);
        }
        other => println!("unknown command: {other} (try `help`)"),
    }
    Ok(true)
}
