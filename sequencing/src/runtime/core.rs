//! Sequencer: entry point that owns the worker pool and the reporter.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use sequencing_shared::errors::{SequencingError, SequencingResult};

use super::scheduler::Scheduler;
use crate::logging::init_logging;
use crate::options::SequencingOptions;
use crate::pipeline::{Chain, Step, StepSpec};
use crate::report::{ConsoleReporter, NullReporter, Reporter};

// ============================================================================
// GLOBAL DEFAULT SEQUENCER
// ============================================================================

/// Process-wide default sequencer (lazy initialization).
///
/// Configured from `SEQUENCING_*` environment variables on first use.
/// Backs the crate-level [`run`](crate::run) and [`run_after`](crate::run_after).
static DEFAULT_SEQUENCER: OnceLock<Sequencer> = OnceLock::new();

/// Builds chains on a shared worker pool.
///
/// **Cloning**: cheap; clones share the pool and the reporter.
#[derive(Clone)]
pub struct Sequencer {
    scheduler: Scheduler,
    reporter: Arc<dyn Reporter>,
}

impl Sequencer {
    /// Create a sequencer with its own worker pool.
    ///
    /// Uses a [`ConsoleReporter`] when `options.verbose` is set, otherwise
    /// a [`NullReporter`].
    pub fn new(options: SequencingOptions) -> SequencingResult<Self> {
        options.sanitize()?;
        let scheduler = Scheduler::new(&options)?;
        let reporter: Arc<dyn Reporter> = if options.verbose {
            Arc::new(ConsoleReporter::new(true))
        } else {
            Arc::new(NullReporter)
        };
        Ok(Self {
            scheduler,
            reporter,
        })
    }

    /// Create a sequencer configured from the environment, installing the
    /// global log subscriber from `SEQUENCING_LOG` / `RUST_LOG`.
    pub fn with_defaults() -> SequencingResult<Self> {
        Self::with_logging(SequencingOptions::from_env()?)
    }

    /// Like [`Sequencer::new`], first installing the log subscriber
    /// described by `options.log`.
    pub fn with_logging(options: SequencingOptions) -> SequencingResult<Self> {
        init_logging(&options.log)?;
        Self::new(options)
    }

    /// Create a sequencer on an existing pool.
    pub fn from_parts(scheduler: Scheduler, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            scheduler,
            reporter,
        }
    }

    /// Replace the reporter. Chains already built keep the old one.
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Get the default sequencer, creating it on first use.
    ///
    /// # Panics
    ///
    /// Panics if the environment holds invalid `SEQUENCING_*` values or the
    /// worker pool cannot be started.
    pub fn default_sequencer() -> &'static Self {
        DEFAULT_SEQUENCER.get_or_init(|| {
            Self::with_defaults().expect("Failed to initialize default Sequencer")
        })
    }

    /// The default sequencer, if it has been created.
    pub fn try_default_sequencer() -> Option<&'static Self> {
        DEFAULT_SEQUENCER.get()
    }

    /// Initialize the default sequencer with custom options.
    ///
    /// Must be called before the first use of [`Sequencer::default_sequencer`].
    pub fn init_default_sequencer(options: SequencingOptions) -> SequencingResult<()> {
        let sequencer = Self::new(options)?;
        DEFAULT_SEQUENCER.set(sequencer).map_err(|_| {
            SequencingError::Internal(
                "Default sequencer already initialized. \
                 Call init_default_sequencer() before any use of default_sequencer()."
                    .into(),
            )
        })
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn reporter(&self) -> &Arc<dyn Reporter> {
        &self.reporter
    }

    /// Start a chain whose first step runs immediately.
    pub fn run<T>(&self, label: impl Into<String>, step: impl Step<T>) -> Chain<T>
    where
        T: Clone + Send + 'static,
    {
        self.run_step(StepSpec::new(label, step))
    }

    /// Start a chain whose first step runs after `delay`.
    pub fn run_after<T>(
        &self,
        delay: Duration,
        label: impl Into<String>,
        step: impl Step<T>,
    ) -> Chain<T>
    where
        T: Clone + Send + 'static,
    {
        self.run_step(StepSpec::new(label, step).after(delay))
    }

    /// Start a chain from a pre-built step.
    pub fn run_step<T>(&self, first: StepSpec<T>) -> Chain<T>
    where
        T: Clone + Send + 'static,
    {
        Chain::start(self.scheduler.clone(), Arc::clone(&self.reporter), first)
    }
}

impl std::fmt::Debug for Sequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sequencer")
            .field("scheduler", &self.scheduler)
            .field("verbose", &self.reporter.is_verbose())
            .finish()
    }
}
