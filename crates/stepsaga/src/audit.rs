use std::time::Instant;

/// Status of a step in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StepStatus {
    /// Forward action completed.
    Executed,
    /// Forward action returned an error.
    Failed,
    /// Forward action panicked.
    Panicked,
    /// Step was rolled back successfully.
    RolledBack,
    /// Rollback returned an error.
    RollbackFailed,
}

/// Record of one step within a saga run.
#[derive(Debug)]
pub struct StepRecord {
    /// Name of the step.
    pub name: String,
    /// Current status.
    pub status: StepStatus,
    /// When the forward action started.
    pub started_at: Instant,
    /// When the step last changed status (execution or rollback).
    pub completed_at: Option<Instant>,
    /// Description of the rollback, once the step has executed.
    pub rollback_description: Option<String>,
}

/// Audit log of a single saga run.
///
/// Unlike the error returned by [`Saga::exec`](crate::Saga::exec), the audit
/// log shows whether every rollback succeeded.
#[derive(Debug, Default)]
pub struct SagaAuditLog {
    records: Vec<StepRecord>,
}

impl SagaAuditLog {
    /// Create a new empty audit log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_start(&mut self, name: &str) {
        self.records.push(StepRecord {
            name: name.to_string(),
            status: StepStatus::Executed,
            started_at: Instant::now(),
            completed_at: None,
            rollback_description: None,
        });
    }

    pub(crate) fn record_success(&mut self, rollback_description: String) {
        if let Some(record) = self.records.last_mut() {
            record.status = StepStatus::Executed;
            record.completed_at = Some(Instant::now());
            record.rollback_description = Some(rollback_description);
        }
    }

    pub(crate) fn record_failure(&mut self, status: StepStatus) {
        if let Some(record) = self.records.last_mut() {
            record.status = status;
            record.completed_at = Some(Instant::now());
        }
    }

    pub(crate) fn record_rollback(&mut self, step_name: &str, status: StepStatus) {
        if let Some(record) = self.records.iter_mut().find(|r| r.name == step_name) {
            record.status = status;
            record.completed_at = Some(Instant::now());
        }
    }

    /// Get all records, in execution order.
    #[must_use]
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// Names of the steps whose rollback failed, in rollback order.
    #[must_use]
    pub fn rollback_failures(&self) -> Vec<&str> {
        self.records
            .iter()
            .rev()
            .filter(|r| r.status == StepStatus::RollbackFailed)
            .map(|r| r.name.as_str())
            .collect()
    }

    /// One line per step, prefixed with a status marker.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        for record in &self.records {
            let status = match record.status {
                StepStatus::Executed => "✓",
                StepStatus::Failed => "✗",
                StepStatus::Panicked => "‼",
                StepStatus::RolledBack => "↩",
                StepStatus::RollbackFailed => "⚠",
            };
            lines.push(format!("{status} {}", record.name));
        }
        lines.join("\n")
    }
}
