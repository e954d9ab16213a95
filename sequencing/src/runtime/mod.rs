//! Worker pool and the sequencer entry point.

mod core;
mod scheduler;

pub use self::core::Sequencer;
pub use self::scheduler::Scheduler;
