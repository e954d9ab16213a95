//! Single-assignment settlement cell for step results.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use sequencing_shared::errors::{SequencingError, SequencingResult, StepFailure};
use tokio::sync::Notify;

enum FlowState<T> {
    Pending,
    Settled(Result<T, StepFailure>),
}

struct FlowInner<T> {
    state: Mutex<FlowState<T>>,
    /// Wakes threads blocked in `wait`.
    cond: Condvar,
    /// Wakes async waiters (successor tasks).
    notify: Notify,
}

/// Result cell of one task in a chain.
///
/// Starts pending and is settled exactly once, either fulfilled with the
/// step's value or rejected with its [`StepFailure`]. Handles are cheap to
/// clone; all clones observe the same settlement.
pub struct StepFuture<T> {
    inner: Arc<FlowInner<T>>,
}

impl<T> Clone for StepFuture<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> StepFuture<T> {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(FlowInner {
                state: Mutex::new(FlowState::Pending),
                cond: Condvar::new(),
                notify: Notify::new(),
            }),
        }
    }

    /// Settle the future. Fails if it was already settled; the first
    /// outcome is kept.
    pub(crate) fn settle(&self, outcome: Result<T, StepFailure>) -> SequencingResult<()> {
        {
            let mut state = self.inner.state.lock();
            if !matches!(*state, FlowState::Pending) {
                return Err(SequencingError::AlreadySettled);
            }
            *state = FlowState::Settled(outcome);
        }
        self.inner.cond.notify_all();
        self.inner.notify.notify_waiters();
        Ok(())
    }

    pub fn is_pending(&self) -> bool {
        matches!(*self.inner.state.lock(), FlowState::Pending)
    }

    pub fn is_fulfilled(&self) -> bool {
        matches!(*self.inner.state.lock(), FlowState::Settled(Ok(_)))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(*self.inner.state.lock(), FlowState::Settled(Err(_)))
    }

    /// Rejection reason. `None` while pending or when fulfilled.
    pub fn reason(&self) -> Option<StepFailure> {
        match &*self.inner.state.lock() {
            FlowState::Settled(Err(failure)) => Some(failure.clone()),
            _ => None,
        }
    }

    /// Wait asynchronously until the future is settled, in either state.
    pub async fn settled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a concurrent settle is not missed.
            notified.as_mut().enable();
            if !self.is_pending() {
                return;
            }
            notified.await;
        }
    }
}

impl<T: Clone> StepFuture<T> {
    /// Non-blocking snapshot of the outcome.
    pub fn outcome(&self) -> Option<Result<T, StepFailure>> {
        match &*self.inner.state.lock() {
            FlowState::Pending => None,
            FlowState::Settled(outcome) => Some(outcome.clone()),
        }
    }

    /// Block the calling thread until settled.
    ///
    /// Returns the fulfilled value, or `None` when rejected. Blocks forever
    /// if the future is never settled; see [`StepFuture::wait_timeout`].
    pub fn wait(&self) -> Option<T> {
        let mut state = self.inner.state.lock();
        loop {
            if let FlowState::Settled(outcome) = &*state {
                return outcome.as_ref().ok().cloned();
            }
            self.inner.cond.wait(&mut state);
        }
    }

    /// Like [`StepFuture::wait`], giving up after `timeout`.
    pub fn wait_timeout(&self, timeout: Duration) -> SequencingResult<Option<T>> {
        let deadline = Instant::now() + timeout;
        let mut state = self.inner.state.lock();
        loop {
            if let FlowState::Settled(outcome) = &*state {
                return Ok(outcome.as_ref().ok().cloned());
            }
            if self.inner.cond.wait_until(&mut state, deadline).timed_out()
                && matches!(*state, FlowState::Pending)
            {
                return Err(SequencingError::Timeout(timeout));
            }
        }
    }

    /// Wait asynchronously and return the fulfilled value, or `None` when
    /// rejected.
    pub async fn value_async(&self) -> Option<T> {
        self.settled().await;
        self.outcome().and_then(Result::ok)
    }
}

impl<T> fmt::Debug for StepFuture<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.inner.state.lock() {
            FlowState::Pending => "pending",
            FlowState::Settled(Ok(_)) => "fulfilled",
            FlowState::Settled(Err(_)) => "rejected",
        };
        f.debug_struct("StepFuture").field("state", &state).finish()
    }
}
