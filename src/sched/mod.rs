//! Scheduler/Timer Facade
//!
//! Cancellable delayed and repeating callbacks. While a poll is active the
//! engine keeps a repeating reminder and a repeating countdown tick armed
//! and cancels both when the poll closes or the host shuts down.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Callback invoked when a timer fires.
pub type TimerFn = Arc<dyn Fn() + Send + Sync>;

/// Handle to a scheduled timer.
///
/// Cancellation is idempotent. Dropping the handle does not cancel; a timer
/// without a reachable handle keeps firing.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    token: CancellationToken,
}

impl TimerHandle {
    /// Wrap a cancellation token controlling one timer.
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    /// Stop the timer. No callback runs after this returns.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the timer has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Source of delayed and repeating callbacks.
pub trait Scheduler: Send + Sync {
    /// Run `f` once after `delay`, unless cancelled first.
    fn once(&self, delay: Duration, f: TimerFn) -> TimerHandle;

    /// Run `f` every `period` until the handle is cancelled.
    fn every(&self, period: Duration, f: TimerFn) -> TimerHandle;
}

/// Scheduler backed by spawned tokio tasks.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioScheduler;

impl TokioScheduler {
    /// Create a scheduler.
    pub fn new() -> Self {
        Self
    }
}

impl Scheduler for TokioScheduler {
    fn once(&self, delay: Duration, f: TimerFn) -> TimerHandle {
        let token = CancellationToken::new();
        let guard = token.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = guard.cancelled() => {}
                _ = tokio::time::sleep(delay) => f(),
            }
        });

        TimerHandle::new(token)
    }

    fn every(&self, period: Duration, f: TimerFn) -> TimerHandle {
        let token = CancellationToken::new();
        let guard = token.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = guard.cancelled() => break,
                    _ = tokio::time::sleep(period) => f(),
                }
            }
        });

        TimerHandle::new(token)
    }
}
