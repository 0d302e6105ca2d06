use atomkit_core::{Filter, OperationId, RunError, RunErrorKind};
use atomkit_store::StoreError;

/// Why an inverse operation did not restore anything.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum InverseError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The inverse ran but matched no record.
    #[error("no record matched {filter}")]
    NothingMatched { filter: Filter },
}

/// A single inverse operation that could not be applied during rollback.
#[derive(Debug, thiserror::Error)]
#[error("rollback failed for operation {operation_id} ({description}): {error}")]
pub struct RollbackFailure {
    /// Operation whose inverse failed.
    pub operation_id: OperationId,
    /// What the inverse was trying to do.
    pub description: String,
    #[source]
    pub error: InverseError,
}

/// Outcome of replaying the rollback stack.
///
/// Failures here are diagnostic only; they never replace the error that
/// triggered the rollback.
#[derive(Debug, Default)]
pub struct RollbackReport {
    /// Number of inverse operations attempted.
    pub attempted: usize,
    /// Inverse operations that failed, most recent first.
    pub failures: Vec<RollbackFailure>,
}

impl RollbackReport {
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.attempted - self.failures.len()
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Map the store error that ended a run onto the reported run error.
pub(crate) fn run_error(
    operation_id: &OperationId,
    kind: RunErrorKind,
    error: &StoreError,
) -> RunError {
    let kind = match error {
        StoreError::Cancelled => RunErrorKind::Cancelled,
        _ => kind,
    };
    RunError::new(kind, error.to_string()).for_operation(operation_id.clone())
}
