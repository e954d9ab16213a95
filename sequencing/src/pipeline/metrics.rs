use serde::Serialize;

/// Outcome of a task as recorded in its metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskOutcome {
    Fulfilled,
    Rejected,
}

/// Timing of one task. Offsets are measured from chain creation.
#[derive(Debug, Clone, Serialize)]
pub struct TaskMetrics {
    pub index: usize,
    pub label: String,
    pub delay_ms: u128,
    /// When the predecessor settled (or chain creation, for the first task).
    pub triggered_at_ms: u128,
    /// Time spent inside the computation itself.
    pub run_duration_ms: u128,
    pub completed_at_ms: u128,
    pub outcome: TaskOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChainMetrics {
    pub total_duration_ms: u128,
    pub tasks: Vec<TaskMetrics>,
}

impl ChainMetrics {
    pub fn task(&self, label: &str) -> Option<&TaskMetrics> {
        self.tasks.iter().find(|task| task.label == label)
    }

    pub fn completed_at_ms(&self, label: &str) -> Option<u128> {
        self.task(label).map(|task| task.completed_at_ms)
    }

    pub fn rejected_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|task| task.outcome == TaskOutcome::Rejected)
            .count()
    }
}
