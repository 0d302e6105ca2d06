use std::time::Instant;

use atomkit_core::OperationId;

/// Status of an operation in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationStatus {
    /// Operation executed successfully.
    Executed,
    /// Operation was rejected by the store.
    Failed,
    /// Every inverse of the operation was applied.
    RolledBack,
    /// At least one inverse of the operation could not be applied.
    RollbackFailed,
}

/// Record of one operation's journey through a run.
#[derive(Debug)]
pub struct OperationRecord {
    pub operation_id: OperationId,
    /// Human-readable form of the operation.
    pub description: String,
    pub status: OperationStatus,
    pub started_at: Instant,
    /// When the operation (or its rollback) last changed status.
    pub completed_at: Option<Instant>,
    /// Number of inverse operations recorded for it.
    pub inverse_count: usize,
    /// Why no safety net could be prepared, if that happened.
    pub preparation_error: Option<String>,
    /// Store error for a failed operation.
    pub error: Option<String>,
}

/// Audit log tracking every operation of a run and its rollback.
#[derive(Debug, Default)]
pub struct RunAuditLog {
    records: Vec<OperationRecord>,
}

impl RunAuditLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_start(&mut self, operation_id: &OperationId, description: String) {
        self.records.push(OperationRecord {
            operation_id: operation_id.clone(),
            description,
            status: OperationStatus::Executed,
            started_at: Instant::now(),
            completed_at: None,
            inverse_count: 0,
            preparation_error: None,
            error: None,
        });
    }

    /// Note on the current operation that its inverse could not be prepared.
    pub(crate) fn record_preparation_failed(&mut self, message: String) {
        if let Some(record) = self.records.last_mut() {
            record.preparation_error = Some(message);
        }
    }

    pub(crate) fn record_success(&mut self, inverse_count: usize) {
        if let Some(record) = self.records.last_mut() {
            record.status = OperationStatus::Executed;
            record.completed_at = Some(Instant::now());
            record.inverse_count = inverse_count;
        }
    }

    pub(crate) fn record_failure(&mut self, message: String) {
        if let Some(record) = self.records.last_mut() {
            record.status = OperationStatus::Failed;
            record.completed_at = Some(Instant::now());
            record.error = Some(message);
        }
    }

    /// An inverse of `operation_id` was applied. A prior rollback failure
    /// for the same operation is kept.
    pub(crate) fn record_rolled_back(&mut self, operation_id: &OperationId) {
        if let Some(record) = self.find_mut(operation_id) {
            if record.status == OperationStatus::Executed {
                record.status = OperationStatus::RolledBack;
            }
            record.completed_at = Some(Instant::now());
        }
    }

    pub(crate) fn record_rollback_failed(&mut self, operation_id: &OperationId) {
        if let Some(record) = self.find_mut(operation_id) {
            record.status = OperationStatus::RollbackFailed;
            record.completed_at = Some(Instant::now());
        }
    }

    fn find_mut(&mut self, operation_id: &OperationId) -> Option<&mut OperationRecord> {
        self.records
            .iter_mut()
            .find(|record| &record.operation_id == operation_id)
    }

    #[must_use]
    pub fn records(&self) -> &[OperationRecord] {
        &self.records
    }

    #[must_use]
    pub fn record(&self, operation_id: &OperationId) -> Option<&OperationRecord> {
        self.records
            .iter()
            .find(|record| &record.operation_id == operation_id)
    }

    /// One line per operation, prefixed with a status marker.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        for record in &self.records {
            let status = match record.status {
                OperationStatus::Executed => "✓",
                OperationStatus::Failed => "✗",
                OperationStatus::RolledBack => "↩",
                OperationStatus::RollbackFailed => "⚠",
            };
            lines.push(format!(
                "{status} {} {}",
                record.operation_id, record.description
            ));
        }
        lines.join("\n")
    }
}
