//! Shared worker pool that runs every task of every chain.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use sequencing_shared::errors::{SequencingError, SequencingResult};
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;

use crate::options::SequencingOptions;

/// Handle to a multi-threaded tokio runtime.
///
/// **Cloning**: cheap via `Arc`; all clones share one pool. The runtime
/// shuts down when the last clone is dropped, so every chain holds a clone
/// for as long as it lives.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    runtime: Option<Runtime>,
    handle: Handle,
}

impl Scheduler {
    /// Build a worker pool from options.
    pub fn new(options: &SequencingOptions) -> SequencingResult<Self> {
        options.sanitize()?;

        let mut builder = Builder::new_multi_thread();
        builder.enable_time().thread_name(options.thread_name.clone());
        if let Some(threads) = options.worker_threads {
            builder.worker_threads(threads);
        }

        let runtime = builder
            .build()
            .map_err(|e| SequencingError::Runtime(format!("Failed to build worker pool: {}", e)))?;

        tracing::debug!(
            worker_threads = ?options.worker_threads,
            thread_name = %options.thread_name,
            "Started worker pool"
        );

        Ok(Self {
            inner: Arc::new(SchedulerInner {
                handle: runtime.handle().clone(),
                runtime: Some(runtime),
            }),
        })
    }

    pub fn handle(&self) -> &Handle {
        &self.inner.handle
    }

    pub(crate) fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.inner.handle.spawn(future)
    }
}

impl Drop for SchedulerInner {
    fn drop(&mut self) {
        let Some(runtime) = self.runtime.take() else {
            return;
        };
        // Dropping a runtime from async context panics; hand it off instead.
        if Handle::try_current().is_ok() {
            runtime.shutdown_background();
        } else {
            drop(runtime);
        }
        tracing::debug!("Worker pool shut down");
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("workers", &self.inner.handle.metrics().num_workers())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_spawn_runs_on_pool() {
        let options = SequencingOptions {
            worker_threads: Some(1),
            ..Default::default()
        };
        let scheduler = Scheduler::new(&options).unwrap();
        let handle = scheduler.spawn(async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            7
        });
        assert_eq!(scheduler.handle().block_on(handle).unwrap(), 7);
    }

    #[test]
    fn test_worker_thread_count() {
        let options = SequencingOptions {
            worker_threads: Some(2),
            ..Default::default()
        };
        let scheduler = Scheduler::new(&options).unwrap();
        assert_eq!(scheduler.handle().metrics().num_workers(), 2);
    }

    #[test]
    fn test_rejects_zero_workers() {
        let options = SequencingOptions {
            worker_threads: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            Scheduler::new(&options),
            Err(SequencingError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_drop_inside_async_context_does_not_panic() {
        let scheduler = Scheduler::new(&SequencingOptions::default()).unwrap();
        let clone = scheduler.clone();
        drop(scheduler);
        drop(clone);
    }
}
