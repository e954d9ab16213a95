//! Timestamped value recorder for asserting on chain timing.
//!
//! ```no_run
//! use std::time::Duration;
//! use sequencing::timeline::Timeline;
//!
//! let timeline = Timeline::new();
//! let recorder = timeline.clone();
//! sequencing::run_after(Duration::from_millis(150), "first", move || {
//!     recorder.add("I");
//!     Ok(())
//! })
//! .value();
//!
//! let first = &timeline.results()[0];
//! assert!(first.within(Duration::from_millis(150), Duration::from_millis(50)));
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// A value and when it was recorded, relative to the timeline start.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedValue<T> {
    pub offset: Duration,
    pub value: T,
}

impl<T> TimedValue<T> {
    /// Whether the offset lies within `tolerance` of `expected`.
    pub fn within(&self, expected: Duration, tolerance: Duration) -> bool {
        self.offset.abs_diff(expected) <= tolerance
    }
}

/// Shared, append-only list of timed values.
#[derive(Debug)]
pub struct Timeline<T> {
    start: Instant,
    entries: Arc<Mutex<Vec<TimedValue<T>>>>,
}

impl<T> Clone for Timeline<T> {
    fn clone(&self) -> Self {
        Self {
            start: self.start,
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<T> Default for Timeline<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Timeline<T> {
    /// Start a timeline now.
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(start: Instant) -> Self {
        Self {
            start,
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Record `value` at the current offset.
    pub fn add(&self, value: T) {
        let offset = self.start.elapsed();
        self.entries.lock().push(TimedValue { offset, value });
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drop all recorded values. The start instant is unchanged.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl<T: Clone> Timeline<T> {
    pub fn results(&self) -> Vec<TimedValue<T>> {
        self.entries.lock().clone()
    }

    pub fn values(&self) -> Vec<T> {
        self.entries.lock().iter().map(|e| e.value.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_order() {
        let timeline = Timeline::new();
        timeline.add("I");
        timeline.clone().add("II");
        assert_eq!(timeline.values(), vec!["I", "II"]);
        assert_eq!(timeline.len(), 2);

        let results = timeline.results();
        assert!(results[0].offset <= results[1].offset);
    }

    #[test]
    fn test_clear_keeps_start() {
        let start = Instant::now() - Duration::from_millis(100);
        let timeline = Timeline::starting_at(start);
        timeline.add(1);
        timeline.clear();
        assert!(timeline.is_empty());

        timeline.add(2);
        assert!(timeline.results()[0].offset >= Duration::from_millis(100));
    }

    #[test]
    fn test_within_tolerance() {
        let tv = TimedValue {
            offset: Duration::from_millis(420),
            value: (),
        };
        let tolerance = Duration::from_millis(50);
        assert!(tv.within(Duration::from_millis(400), tolerance));
        assert!(tv.within(Duration::from_millis(450), tolerance));
        assert!(!tv.within(Duration::from_millis(300), tolerance));
    }
}
