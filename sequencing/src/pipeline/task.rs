//! Task: one scheduled step of a chain.
//!
//! A task waits for its trigger, sleeps out its delay, runs the step on the
//! blocking pool and settles its own future. The settlement is the trigger
//! of the next task, so a failing step never holds up the rest of the chain.

use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use sequencing_shared::errors::{FailureKind, StepFailure};

use super::future::StepFuture;
use super::metrics::{TaskMetrics, TaskOutcome};
use super::step::{BoxedStep, StepSpec};
use crate::report::{Reporter, report};
use crate::runtime::Scheduler;

/// Condition that releases a task.
pub(crate) enum Trigger<T> {
    /// First task of a chain.
    Immediate,
    /// Predecessor settled, in either state. Its value is never read.
    After(StepFuture<T>),
}

/// Shared inputs every task of a chain is scheduled with.
pub(crate) struct TaskContext {
    pub(crate) scheduler: Scheduler,
    pub(crate) reporter: Arc<dyn Reporter>,
    pub(crate) chain_start: Instant,
}

pub(crate) struct Task<T> {
    index: usize,
    label: String,
    future: StepFuture<T>,
    metrics: Arc<OnceLock<TaskMetrics>>,
}

impl<T: Send + 'static> Task<T> {
    /// Create the task and hand it to the scheduler right away.
    pub(crate) fn schedule(
        index: usize,
        spec: StepSpec<T>,
        trigger: Trigger<T>,
        ctx: &TaskContext,
    ) -> Self {
        let StepSpec { label, delay, step } = spec;
        let future = StepFuture::new();
        let metrics = Arc::new(OnceLock::new());

        let run = TaskRun {
            index,
            label: label.clone(),
            delay,
            step,
            trigger,
            future: future.clone(),
            metrics: Arc::clone(&metrics),
            reporter: Arc::clone(&ctx.reporter),
            chain_start: ctx.chain_start,
            scheduler: ctx.scheduler.clone(),
        };
        ctx.scheduler.spawn(run.execute());

        Self {
            index,
            label,
            future,
            metrics,
        }
    }
}

impl<T> Task<T> {
    pub(crate) fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn future(&self) -> &StepFuture<T> {
        &self.future
    }

    /// Available once the task has settled.
    pub(crate) fn metrics(&self) -> Option<&TaskMetrics> {
        self.metrics.get()
    }
}

/// State moved onto the worker pool for a single execution.
struct TaskRun<T> {
    index: usize,
    label: String,
    delay: Duration,
    step: BoxedStep<T>,
    trigger: Trigger<T>,
    future: StepFuture<T>,
    metrics: Arc<OnceLock<TaskMetrics>>,
    reporter: Arc<dyn Reporter>,
    chain_start: Instant,
    /// Keeps the pool alive until this task settles, even if every chain
    /// and sequencer handle is gone.
    scheduler: Scheduler,
}

impl<T: Send + 'static> TaskRun<T> {
    async fn execute(self) {
        let TaskRun {
            index,
            label,
            delay,
            step,
            trigger,
            future,
            metrics,
            reporter,
            chain_start,
            scheduler,
        } = self;

        if let Trigger::After(previous) = &trigger {
            previous.settled().await;
        }
        let triggered_at = Instant::now();
        tracing::debug!(
            index,
            label = %label,
            delay = ?delay,
            "Task triggered"
        );

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let run_start = Instant::now();
        let outcome = match tokio::task::spawn_blocking(move || step.produce()).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(StepFailure::from_error(index, label.as_str(), err)),
            Err(join_err) if join_err.is_panic() => Err(StepFailure::from_panic(
                index,
                label.as_str(),
                join_err.into_panic(),
            )),
            Err(join_err) => Err(StepFailure::new(
                index,
                label.as_str(),
                FailureKind::Error,
                format!("step did not run to completion: {}", join_err),
            )),
        };
        let completed_at = Instant::now();

        match &outcome {
            Ok(_) => tracing::debug!(index, label = %label, "Task fulfilled"),
            Err(failure) => tracing::warn!(
                index,
                label = %label,
                kind = %failure.kind(),
                error = %failure,
                "Task rejected"
            ),
        }

        // Progress is reported whatever the outcome.
        report(reporter.as_ref(), &label);

        let _ = metrics.set(TaskMetrics {
            index,
            label,
            delay_ms: delay.as_millis(),
            triggered_at_ms: triggered_at.duration_since(chain_start).as_millis(),
            run_duration_ms: completed_at.duration_since(run_start).as_millis(),
            completed_at_ms: completed_at.duration_since(chain_start).as_millis(),
            outcome: if outcome.is_ok() {
                TaskOutcome::Fulfilled
            } else {
                TaskOutcome::Rejected
            },
        });

        if let Err(e) = future.settle(outcome) {
            tracing::error!(index, "Failed to settle task future: {}", e);
        }
        drop(scheduler);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::SequencingOptions;
    use crate::report::MemoryReporter;

    fn context(reporter: Arc<dyn Reporter>) -> TaskContext {
        TaskContext {
            scheduler: Scheduler::new(&SequencingOptions::default()).unwrap(),
            reporter,
            chain_start: Instant::now(),
        }
    }

    #[test]
    fn test_immediate_task_fulfills() {
        let reporter = Arc::new(MemoryReporter::new(true));
        let ctx = context(reporter.clone());
        let task = Task::schedule(0, StepSpec::new("first", || Ok(1)), Trigger::Immediate, &ctx);

        assert_eq!(task.future().wait(), Some(1));
        assert_eq!(task.index(), 0);
        assert_eq!(task.label(), "first");
        assert_eq!(reporter.lines(), vec!["first"]);

        let metrics = task.metrics().unwrap();
        assert_eq!(metrics.outcome, TaskOutcome::Fulfilled);
    }

    #[test]
    fn test_error_is_captured_and_reported() {
        let reporter = Arc::new(MemoryReporter::new(true));
        let ctx = context(reporter.clone());
        let spec: StepSpec<u32> =
            StepSpec::new("boom", || -> anyhow::Result<u32> { anyhow::bail!("Ooops") });
        let task = Task::schedule(3, spec, Trigger::Immediate, &ctx);

        assert_eq!(task.future().wait(), None);
        let reason = task.future().reason().unwrap();
        assert_eq!(reason.message(), "Ooops");
        assert_eq!(reason.index(), 3);
        assert_eq!(reason.kind(), FailureKind::Error);
        assert_eq!(reporter.lines(), vec!["boom"]);
    }

    #[test]
    fn test_panic_is_captured() {
        let ctx = context(Arc::new(MemoryReporter::new(false)));
        let spec: StepSpec<u32> =
            StepSpec::new("", || -> anyhow::Result<u32> { panic!("kaboom") });
        let task = Task::schedule(0, spec, Trigger::Immediate, &ctx);

        assert_eq!(task.future().wait(), None);
        let reason = task.future().reason().unwrap();
        assert_eq!(reason.kind(), FailureKind::Panic);
        assert_eq!(reason.message(), "kaboom");
    }

    #[test]
    fn test_successor_waits_for_rejected_predecessor() {
        let ctx = context(Arc::new(MemoryReporter::new(false)));
        let first: StepSpec<u32> = StepSpec::new("a", || -> anyhow::Result<u32> {
            std::thread::sleep(Duration::from_millis(50));
            anyhow::bail!("X")
        });
        let first = Task::schedule(0, first, Trigger::Immediate, &ctx);
        let second = Task::schedule(
            1,
            StepSpec::new("b", || Ok(2)).after(Duration::from_millis(20)),
            Trigger::After(first.future().clone()),
            &ctx,
        );

        assert_eq!(second.future().wait(), Some(2));
        assert!(first.future().is_rejected());
        assert_eq!(second.metrics().unwrap().delay_ms, 20);

        let first_done = first.metrics().unwrap().completed_at_ms;
        let second_triggered = second.metrics().unwrap().triggered_at_ms;
        assert!(second_triggered >= first_done);
        assert!(second.metrics().unwrap().completed_at_ms >= first_done + 20);
    }
}
