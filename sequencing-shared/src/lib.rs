//! Types shared across the sequencing workspace.

pub mod errors;

pub use errors::{FailureKind, SequencingError, SequencingResult, StepFailure};
