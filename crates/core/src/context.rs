//! Batch-wide cancellation signal.
//!
//! [`Context`] pairs a [`CancellationToken`] with an optional deadline so a
//! single value carries both explicit cancellation and timeouts into every
//! worker invocation. Cancellation is cooperative: the pool stops handing
//! out jobs once the context is done, but a worker function that is already
//! running keeps going unless it watches [`Context::done`] or
//! [`Context::is_done`] itself.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a [`Context`] is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    /// The context (or one of its ancestors) was cancelled explicitly.
    #[error("context cancelled")]
    Cancelled,

    /// The context deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Cancellation token plus optional deadline, cheap to clone.
///
/// Clones share the same token. Derived contexts ([`child`](Self::child),
/// [`with_timeout`](Self::with_timeout), [`with_deadline`](Self::with_deadline))
/// observe cancellation of their parent, but cancelling a derived context
/// leaves the parent untouched.
#[derive(Debug, Clone)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// A fresh context that is never done until cancelled.
    pub fn new() -> Self {
        Self::from_token(CancellationToken::new())
    }

    /// Wrap an existing token, e.g. an application shutdown token.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Derive a context that is also done after `timeout` has elapsed.
    ///
    /// A timeout too large to represent as an [`Instant`] adds no deadline.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self.child(),
        }
    }

    /// Derive a context that is also done at `deadline`.
    ///
    /// A parent deadline that expires earlier still wins.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(parent) => parent.min(deadline),
            None => deadline,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    /// Derive a context that can be cancelled independently of this one.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Cancel this context and every context derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The reason this context is done, or `None` while it is still live.
    ///
    /// Explicit cancellation is reported in preference to an expired
    /// deadline.
    pub fn err(&self) -> Option<ContextError> {
        if self.token.is_cancelled() {
            return Some(ContextError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Wait until the context is done and report why.
    pub async fn done(&self) -> ContextError {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    _ = self.token.cancelled() => ContextError::Cancelled,
                    _ = tokio::time::sleep_until(deadline) => ContextError::DeadlineExceeded,
                }
            }
            None => {
                self.token.cancelled().await;
                ContextError::Cancelled
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_context_is_live() {
        let ctx = Context::new();
        assert!(!ctx.is_done());
        assert_eq!(ctx.err(), None);
        assert!(ctx.deadline().is_none());
    }

    #[test]
    fn cancel_marks_context_and_clones_done() {
        let ctx = Context::new();
        let clone = ctx.clone();
        ctx.cancel();
        assert_eq!(ctx.err(), Some(ContextError::Cancelled));
        assert_eq!(clone.err(), Some(ContextError::Cancelled));
    }

    #[test]
    fn parent_cancellation_reaches_child() {
        let parent = Context::new();
        let child = parent.child();
        parent.cancel();
        assert_eq!(child.err(), Some(ContextError::Cancelled));
    }

    #[test]
    fn child_cancellation_does_not_reach_parent() {
        let parent = Context::new();
        let child = parent.child();
        child.cancel();
        assert!(child.is_done());
        assert!(!parent.is_done());
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_expires_after_timeout() {
        let ctx = Context::new().with_timeout(Duration::from_millis(100));
        assert!(!ctx.is_done());

        tokio::time::advance(Duration::from_millis(150)).await;
        assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn earlier_parent_deadline_wins() {
        let parent = Context::new().with_timeout(Duration::from_millis(50));
        let child = parent.with_timeout(Duration::from_secs(60));
        assert_eq!(child.deadline(), parent.deadline());
    }

    #[tokio::test]
    async fn unrepresentable_timeout_adds_no_deadline() {
        let ctx = Context::new().with_timeout(Duration::MAX);
        assert!(ctx.deadline().is_none());
        assert!(!ctx.is_done());

        ctx.cancel();
        assert_eq!(ctx.err(), Some(ContextError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn unrepresentable_timeout_keeps_parent_deadline() {
        let parent = Context::new().with_timeout(Duration::from_millis(50));
        let child = parent.with_timeout(Duration::MAX);
        assert_eq!(child.deadline(), parent.deadline());
    }

    #[tokio::test(start_paused = true)]
    async fn done_resolves_on_deadline() {
        let ctx = Context::new().with_timeout(Duration::from_millis(10));
        assert_eq!(ctx.done().await, ContextError::DeadlineExceeded);
    }

    #[tokio::test]
    async fn done_resolves_on_cancel() {
        let ctx = Context::new();
        let canceller = ctx.clone();
        tokio::spawn(async move { canceller.cancel() });
        assert_eq!(ctx.done().await, ContextError::Cancelled);
    }

    #[test]
    fn cancellation_reported_before_deadline() {
        let ctx = Context::new().with_timeout(Duration::ZERO);
        ctx.cancel();
        assert_eq!(ctx.err(), Some(ContextError::Cancelled));
    }
}
