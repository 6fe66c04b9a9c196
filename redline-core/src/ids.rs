//! Monotonic comment-id generation.
//!
//! Comment ids must be unique and never reused, even across sessions in the
//! same process. The source is injected into whatever constructs sessions
//! (normally the orchestrator holds one `Arc<CommentIdSource>` for its whole
//! lifetime) so tests can create their own and assert on exact ids.

use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out `"c1"`, `"c2"`, ... in strictly increasing order.
///
/// Interior mutability via `AtomicU64` so a shared `Arc` works without a
/// lock; `Ordering::Relaxed` is enough because only the counter value
/// matters, not ordering relative to other memory.
#[derive(Debug)]
pub struct CommentIdSource {
    next: AtomicU64,
}

impl CommentIdSource {
    pub fn new() -> Self {
        Self { next: AtomicU64::new(1) }
    }

    /// Returns the next id and advances the counter.
    pub fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("c{n}")
    }
}

impl Default for CommentIdSource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_sequential_and_never_reused() {
        let ids = CommentIdSource::new();
        assert_eq!(ids.next_id(), "c1");
        assert_eq!(ids.next_id(), "c2");
        assert_eq!(ids.next_id(), "c3");
    }

    #[test]
    fn shared_source_stays_monotonic() {
        let ids = std::sync::Arc::new(CommentIdSource::new());
        let a = ids.next_id();
        let b = ids.clone().next_id();
        assert_ne!(a, b);
    }
}
