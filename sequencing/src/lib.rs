//! Ordered, delayed step chains for asserting on asynchronous timing.
//!
//! A chain is declared with [`run`] / [`run_after`] and extended with
//! [`Chain::then`] / [`Chain::then_after`]. Every step starts only after the
//! previous one finished, successfully or not, and then waits out its own
//! delay. Callers block on [`Chain::value`] for completion and on
//! [`Chain::assert_no_errors`] to surface the first failure.
//!
//! ```no_run
//! use std::time::Duration;
//!
//! let chain = sequencing::run("first", || Ok(1))
//!     .then_after(Duration::from_millis(250), "second", || Err(anyhow::anyhow!("Ooops")))
//!     .then_after(Duration::from_millis(250), "third", || Ok(3));
//!
//! assert_eq!(chain.value(), Some(3));
//! assert_eq!(chain.assert_no_errors().unwrap_err().to_string(), "Ooops");
//! ```

pub mod logging;
pub mod options;
pub mod pipeline;
pub mod report;
pub mod runtime;
pub mod timeline;

use std::time::Duration;

pub use logging::init_logging;
pub use options::{LogOptions, SequencingOptions};
pub use pipeline::{Chain, ChainMetrics, Step, StepFuture, StepSpec, TaskMetrics, TaskOutcome};
pub use report::{ConsoleReporter, MemoryReporter, NullReporter, Reporter, TracingReporter};
pub use runtime::{Scheduler, Sequencer};
pub use sequencing_shared::errors::{FailureKind, SequencingError, SequencingResult, StepFailure};

/// Start a chain on the default sequencer; the first step runs immediately.
pub fn run<T>(label: impl Into<String>, step: impl Step<T>) -> Chain<T>
where
    T: Clone + Send + 'static,
{
    Sequencer::default_sequencer().run(label, step)
}

/// Start a chain on the default sequencer; the first step runs after `delay`.
pub fn run_after<T>(delay: Duration, label: impl Into<String>, step: impl Step<T>) -> Chain<T>
where
    T: Clone + Send + 'static,
{
    Sequencer::default_sequencer().run_after(delay, label, step)
}
