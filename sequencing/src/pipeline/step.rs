//! Step definition: the caller's computation plus its delay and label.

use std::fmt;
use std::time::Duration;

/// A computation that can be run as one step of a chain.
///
/// Implemented for every `FnOnce() -> anyhow::Result<T>` closure, so most
/// callers never name this trait. A returned error or a panic is captured
/// as the step's failure.
pub trait Step<T>: Send + 'static {
    /// Run the computation. Called once, on a worker of the blocking pool.
    fn produce(self: Box<Self>) -> anyhow::Result<T>;
}

impl<T, F> Step<T> for F
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
{
    fn produce(self: Box<Self>) -> anyhow::Result<T> {
        (*self)()
    }
}

pub type BoxedStep<T> = Box<dyn Step<T>>;

/// A step together with how it is scheduled.
pub struct StepSpec<T> {
    pub(crate) label: String,
    pub(crate) delay: Duration,
    pub(crate) step: BoxedStep<T>,
}

impl<T> StepSpec<T> {
    /// Create a step with no delay.
    pub fn new(label: impl Into<String>, step: impl Step<T>) -> Self {
        Self {
            label: label.into(),
            delay: Duration::ZERO,
            step: Box::new(step),
        }
    }

    /// Delay before the computation runs, measured from the moment the
    /// predecessor settles.
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl<T> fmt::Debug for StepSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepSpec")
            .field("label", &self.label)
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}
