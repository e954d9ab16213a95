//! Chain: an append-only, strictly ordered sequence of tasks.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use sequencing_shared::errors::{SequencingError, SequencingResult};

use super::future::StepFuture;
use super::metrics::ChainMetrics;
use super::step::{Step, StepSpec};
use super::task::{Task, TaskContext, Trigger};
use crate::report::{Reporter, report};
use crate::runtime::Scheduler;

const ACTIVATED_MESSAGE: &str = "sequence activated";

/// Ordered pipeline of delayed steps.
///
/// Each appended step is scheduled immediately and starts only once the
/// previous step has settled, successfully or not. Delays are therefore
/// cumulative: a step's delay counts from its predecessor's completion.
///
/// Errors stay inside the chain until [`Chain::assert_no_errors`] is
/// called; [`Chain::value`] only waits.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
///
/// let chain = sequencing::run_after(Duration::from_millis(150), "first", || Ok(1))
///     .then_after(Duration::from_millis(250), "second", || Ok(2))
///     .then("third", || Ok(3));
///
/// assert_eq!(chain.value(), Some(3));
/// assert_eq!(chain.assert_no_errors().unwrap(), vec![1, 2, 3]);
/// ```
pub struct Chain<T> {
    ctx: TaskContext,
    tasks: Vec<Task<T>>,
}

impl<T: Clone + Send + 'static> Chain<T> {
    pub(crate) fn start(
        scheduler: Scheduler,
        reporter: Arc<dyn Reporter>,
        first: StepSpec<T>,
    ) -> Self {
        let chain = Self {
            ctx: TaskContext {
                scheduler,
                reporter,
                chain_start: Instant::now(),
            },
            tasks: Vec::new(),
        };
        chain.then_step(first)
    }

    /// Append a step that runs as soon as the current last step settles.
    pub fn then(self, label: impl Into<String>, step: impl Step<T>) -> Self {
        self.then_step(StepSpec::new(label, step))
    }

    /// Append a step that runs `delay` after the current last step settles.
    pub fn then_after(self, delay: Duration, label: impl Into<String>, step: impl Step<T>) -> Self {
        self.then_step(StepSpec::new(label, step).after(delay))
    }

    /// Append a pre-built step.
    pub fn then_step(mut self, spec: StepSpec<T>) -> Self {
        let trigger = match self.tasks.last() {
            Some(tail) => Trigger::After(tail.future().clone()),
            None => Trigger::Immediate,
        };
        let index = self.tasks.len();
        tracing::trace!(index, label = %spec.label(), delay = ?spec.delay(), "Appending task");
        self.tasks.push(Task::schedule(index, spec, trigger, &self.ctx));
        self
    }

    /// Block until the last step settles and return its value.
    ///
    /// Returns `None` if the last step failed. Never reports errors; use
    /// [`Chain::assert_no_errors`] for that.
    pub fn value(&self) -> Option<T> {
        self.tail().and_then(StepFuture::wait)
    }

    /// Like [`Chain::value`], giving up after `timeout`.
    pub fn value_timeout(&self, timeout: Duration) -> SequencingResult<Option<T>> {
        match self.tail() {
            Some(tail) => tail.wait_timeout(timeout),
            None => Ok(None),
        }
    }

    /// Async counterpart of [`Chain::value`].
    pub async fn value_async(&self) -> Option<T> {
        match self.tail() {
            Some(tail) => tail.value_async().await,
            None => None,
        }
    }

    /// Block until every step settled, then return all values in chain
    /// order, or the first failure by chain position.
    pub fn assert_no_errors(&self) -> SequencingResult<Vec<T>> {
        let _ = self.value();
        self.collect_outcomes()
    }

    /// Like [`Chain::assert_no_errors`], giving up after `timeout`.
    pub fn assert_no_errors_timeout(&self, timeout: Duration) -> SequencingResult<Vec<T>> {
        self.value_timeout(timeout)?;
        self.collect_outcomes()
    }

    /// Block until every step settled and return their timings.
    pub fn metrics(&self) -> ChainMetrics {
        let _ = self.value();
        let tasks: Vec<_> = self
            .tasks
            .iter()
            .filter_map(|task| task.metrics().cloned())
            .collect();
        ChainMetrics {
            total_duration_ms: tasks.last().map(|task| task.completed_at_ms).unwrap_or(0),
            tasks,
        }
    }

    fn collect_outcomes(&self) -> SequencingResult<Vec<T>> {
        self.tasks
            .iter()
            .map(|task| match task.future().outcome() {
                Some(Ok(value)) => Ok(value),
                Some(Err(failure)) => Err(SequencingError::Step(failure)),
                None => Err(SequencingError::Internal(format!(
                    "task {} still pending after the chain settled",
                    task.index()
                ))),
            })
            .collect()
    }
}

impl<T> Chain<T> {
    /// Force a lazily built chain into existence. Emits a notice through the
    /// reporter when it is verbose; scheduling is unaffected.
    pub fn activate(&self) -> &Self {
        report(self.ctx.reporter.as_ref(), ACTIVATED_MESSAGE);
        self
    }

    /// Like [`Chain::activate`] without the notice.
    pub fn activate_quietly(&self) -> &Self {
        self
    }

    /// Futures of every task, in chain order.
    pub fn futures(&self) -> impl Iterator<Item = &StepFuture<T>> {
        self.tasks.iter().map(Task::future)
    }

    pub fn labels(&self) -> Vec<&str> {
        self.tasks.iter().map(Task::label).collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Whether every task has settled.
    pub fn is_settled(&self) -> bool {
        self.tail().is_none_or(|tail| !tail.is_pending())
    }

    fn tail(&self) -> Option<&StepFuture<T>> {
        self.tasks.last().map(Task::future)
    }
}

impl<T> fmt::Debug for Chain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("labels", &self.labels())
            .field("futures", &self.tasks.iter().map(Task::future).collect::<Vec<_>>())
            .finish()
    }
}
