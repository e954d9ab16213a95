//! Step-chaining engine.
//!
//! ## Architecture
//!
//! ```text
//! Chain → Tasks → StepFuture
//!
//! - Chain: Append-only list of tasks, links each one to its predecessor
//! - Task: Waits for its trigger, sleeps out its delay, runs the step
//! - StepFuture: Single-assignment cell the task settles exactly once
//! ```
//!
//! Task `i` is triggered by the settlement of task `i - 1`, never by its
//! value, so failures are contained in the failing task's future and the
//! chain always runs to the end:
//!
//! ```text
//!   run_after(150ms)  then_after(250ms)  then_after(350ms)
//!   ├── sleep ──┤ a ├──── sleep ────┤ b ├────── sleep ──────┤ c
//!   0         150ms                 400ms                   750ms
//! ```

mod chain;
mod future;
mod metrics;
mod step;
mod task;

pub use chain::Chain;
pub use future::StepFuture;
pub use metrics::{ChainMetrics, TaskMetrics, TaskOutcome};
pub use step::{BoxedStep, Step, StepSpec};
