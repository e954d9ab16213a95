//! Error types for step chains.

use std::any::Any;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Result alias used across the sequencing crates.
pub type SequencingResult<T> = Result<T, SequencingError>;

/// How a step computation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The computation returned an error.
    Error,
    /// The computation panicked.
    Panic,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Error => write!(f, "error"),
            FailureKind::Panic => write!(f, "panic"),
        }
    }
}

/// Failure captured from a single step.
///
/// Stored as the rejection reason of the step's future. Cloneable so the
/// same failure can be handed out by every aggregation call; the error a
/// step returned is shared, not copied, and stays reachable through
/// [`StepFailure::downcast_ref`] and the `source()` chain.
#[derive(Debug, Clone)]
pub struct StepFailure {
    index: usize,
    label: String,
    kind: FailureKind,
    message: String,
    error: Option<Arc<anyhow::Error>>,
}

impl StepFailure {
    pub fn new(
        index: usize,
        label: impl Into<String>,
        kind: FailureKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            index,
            label: label.into(),
            kind,
            message: message.into(),
            error: None,
        }
    }

    /// Capture an error returned by a step. The message carries the full
    /// context chain; the error itself is kept for downcasting.
    pub fn from_error(index: usize, label: impl Into<String>, err: anyhow::Error) -> Self {
        let mut failure = Self::new(index, label, FailureKind::Error, format!("{:#}", err));
        failure.error = Some(Arc::new(err));
        failure
    }

    /// Capture a panic payload from a step.
    pub fn from_panic(
        index: usize,
        label: impl Into<String>,
        payload: Box<dyn Any + Send>,
    ) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "step panicked with a non-string payload".to_string()
        };
        Self::new(index, label, FailureKind::Panic, message)
    }

    /// Position of the failing step in its chain.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The error the step returned. `None` for panics.
    pub fn error(&self) -> Option<&anyhow::Error> {
        self.error.as_deref()
    }

    /// Downcast the step's error, looking through any context layers.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        self.error.as_deref()?.downcast_ref::<E>()
    }
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for StepFailure {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        let error = self.error.as_deref()?;
        let source: &(dyn StdError + 'static) = error.as_ref();
        Some(source)
    }
}

// Two failures are equal when they describe the same step and message; the
// captured error object is not compared.
impl PartialEq for StepFailure {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
            && self.label == other.label
            && self.kind == other.kind
            && self.message == other.message
    }
}

impl Eq for StepFailure {}

#[derive(Debug, Clone, Error)]
pub enum SequencingError {
    /// A step in the chain failed. Only the earliest failure is reported.
    #[error(transparent)]
    Step(StepFailure),

    #[error("timed out after {0:?} waiting for the chain to settle")]
    Timeout(Duration),

    #[error("future already settled")]
    AlreadySettled,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("worker pool error: {0}")]
    Runtime(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl SequencingError {
    /// The captured step failure, if this error came from a step.
    pub fn step_failure(&self) -> Option<&StepFailure> {
        match self {
            SequencingError::Step(failure) => Some(failure),
            _ => None,
        }
    }
}

impl From<StepFailure> for SequencingError {
    fn from(failure: StepFailure) -> Self {
        SequencingError::Step(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_display_is_message() {
        let failure = StepFailure::new(1, "second", FailureKind::Error, "Ooops");
        assert_eq!(failure.to_string(), "Ooops");
        assert_eq!(SequencingError::Step(failure).to_string(), "Ooops");
    }

    #[test]
    fn test_from_error_keeps_context() {
        let err = anyhow::anyhow!("disk full").context("writing snapshot");
        let failure = StepFailure::from_error(0, "save", err);
        assert_eq!(failure.kind(), FailureKind::Error);
        assert_eq!(failure.message(), "writing snapshot: disk full");
        assert_eq!(failure.label(), "save");
        assert!(failure.error().is_some());
    }

    #[derive(Debug, PartialEq)]
    struct QuotaExceeded {
        limit: u32,
    }

    impl fmt::Display for QuotaExceeded {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "quota of {} exceeded", self.limit)
        }
    }

    impl StdError for QuotaExceeded {}

    #[test]
    fn test_from_error_keeps_original_error() {
        let err = anyhow::Error::new(QuotaExceeded { limit: 3 }).context("uploading");
        let failure = StepFailure::from_error(1, "upload", err);

        assert_eq!(
            failure.downcast_ref::<QuotaExceeded>(),
            Some(&QuotaExceeded { limit: 3 })
        );
        assert_eq!(failure.message(), "uploading: quota of 3 exceeded");

        let cloned = failure.clone();
        assert!(cloned.downcast_ref::<QuotaExceeded>().is_some());

        let wrapped = SequencingError::Step(failure);
        let mut source = wrapped.source();
        let mut found = false;
        while let Some(err) = source {
            if err.downcast_ref::<QuotaExceeded>().is_some() {
                found = true;
            }
            source = err.source();
        }
        assert!(found);
    }

    #[test]
    fn test_panic_failure_has_no_error() {
        let failure = StepFailure::from_panic(0, "", Box::new("boom"));
        assert!(failure.error().is_none());
        assert!(failure.source().is_none());
        assert!(failure.downcast_ref::<QuotaExceeded>().is_none());
    }

    #[test]
    fn test_from_panic_payloads() {
        let failure = StepFailure::from_panic(2, "", Box::new("boom"));
        assert_eq!(failure.message(), "boom");
        assert_eq!(failure.kind(), FailureKind::Panic);

        let failure = StepFailure::from_panic(2, "", Box::new(String::from("owned boom")));
        assert_eq!(failure.message(), "owned boom");

        let failure = StepFailure::from_panic(2, "", Box::new(42_u8));
        assert!(failure.message().contains("non-string"));
    }

    #[test]
    fn test_step_failure_accessor() {
        let failure = StepFailure::new(0, "a", FailureKind::Error, "X");
        let err: SequencingError = failure.clone().into();
        assert_eq!(err.step_failure(), Some(&failure));
        assert!(SequencingError::AlreadySettled.step_failure().is_none());
    }
}
