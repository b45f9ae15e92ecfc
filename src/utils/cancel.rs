//! Cancellation utilities
//!
//! Provides first-class cancellation handles for requests and cursors.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// A handle that can be used to request cancellation.
///
/// Clones share the same signal, so one handle can act as a global abort for
/// many requests or be scoped to a single call. A handle may also carry a
/// deadline after which every request observing it is cancelled.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CancelHandle {
    /// Create a new cancel handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a handle that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().deadline_at(Instant::now() + timeout)
    }

    /// Attach a deadline. The earlier of the existing and the new deadline wins.
    pub fn deadline_at(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// Request cancellation. Any request observing this handle stops waiting
    /// and its in-flight exchange is dropped.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Check if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// A future that resolves when cancellation is requested.
    pub fn cancelled(&self) -> tokio_util::sync::WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the deadline, if any, has already passed.
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| d <= Instant::now())
    }

    /// A handle that is cancelled together with this one but can also be
    /// cancelled on its own.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }
}
