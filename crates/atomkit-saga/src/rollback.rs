use atomkit_core::{
    Filter, InvalidOperation, Operation, OperationId, QueuedOperation, Record, RollbackOperation,
};
use atomkit_store::{RecordStore, StoreError};
use tracing::{debug, error, warn};

use crate::audit::RunAuditLog;
use crate::error::{InverseError, RollbackFailure, RollbackReport};
use crate::executor::RemoteExecutor;

/// Inverse data captured for one operation before it runs.
///
/// Inverses only reach the rollback stack through
/// [`PreparedRollback::into_inverses`], which is called once the operation
/// succeeded.
#[derive(Debug)]
pub(crate) struct PreparedRollback {
    operation_id: OperationId,
    plan: InversePlan,
}

#[derive(Debug)]
enum InversePlan {
    /// Nothing to undo, or nothing could be captured.
    Nothing,
    /// Delete whatever the create returns, keyed by its primary key.
    DeleteCreated { collection: String },
    /// Inverses fully known before execution.
    Ready(Vec<Operation>),
}

impl PreparedRollback {
    /// No safety net for this operation.
    pub(crate) fn none(operation_id: &OperationId) -> Self {
        Self {
            operation_id: operation_id.clone(),
            plan: InversePlan::Nothing,
        }
    }

    /// Turn the captured data into inverse operations, using the records the
    /// forward operation returned where the inverse depends on them.
    pub(crate) fn into_inverses(self, result: &[Record], id_field: &str) -> Vec<RollbackOperation> {
        let operation_id = self.operation_id;
        let actions = match self.plan {
            InversePlan::Nothing => Vec::new(),
            InversePlan::Ready(actions) => actions,
            InversePlan::DeleteCreated { collection } => result
                .iter()
                .filter_map(|record| match record.get(id_field) {
                    Some(id) => Some(Operation::Delete {
                        collection: collection.clone(),
                        filter: Filter::by_field(id_field, id.clone()),
                    }),
                    None => {
                        warn!(
                            operation = %operation_id,
                            %collection,
                            id_field,
                            "created record has no primary key, it cannot be rolled back"
                        );
                        None
                    }
                })
                .collect(),
        };

        actions
            .into_iter()
            .map(|action| RollbackOperation::new(operation_id.clone(), action))
            .collect()
    }
}

/// Capture what is needed to undo `queued` before it executes.
///
/// Creates need no pre-read. Updates and deletes read the records their
/// filter currently matches; an empty match needs no inverse.
pub(crate) async fn prepare_rollback<S: RecordStore>(
    executor: &RemoteExecutor<'_, S>,
    queued: &QueuedOperation,
    id_field: &str,
) -> Result<PreparedRollback, StoreError> {
    let operation_id = queued.id().clone();
    let plan = match queued.operation() {
        Operation::Create { collection, .. } => InversePlan::DeleteCreated {
            collection: collection.clone(),
        },
        Operation::Update {
            collection,
            data,
            filter,
        } => {
            let snapshot = executor.select(collection, filter).await?;
            restore_updates(&operation_id, collection, data, filter, snapshot, id_field)
        }
        Operation::Delete { collection, filter } => {
            let snapshot = executor.select(collection, filter).await?;
            recreate_deleted(&operation_id, collection, snapshot)
        }
    };

    debug!(operation = %operation_id, ?plan, "prepared rollback");
    Ok(PreparedRollback { operation_id, plan })
}

/// Undo an update by deleting the updated records and recreating the
/// snapshot, so fields the update added or changed do not survive.
///
/// The deletes come last so LIFO replay runs them before the recreates.
fn restore_updates(
    operation_id: &OperationId,
    collection: &str,
    data: &Record,
    filter: &Filter,
    snapshot: Vec<Record>,
    id_field: &str,
) -> InversePlan {
    if snapshot.is_empty() {
        return InversePlan::Nothing;
    }

    let locators = if snapshot.iter().all(|record| record.contains_key(id_field)) {
        let mut locators: Vec<Filter> = Vec::new();
        for record in &snapshot {
            // where the record's key will be once the update has run
            let Some(id) = data.get(id_field).or_else(|| record.get(id_field)) else {
                continue;
            };
            let locator = Filter::by_field(id_field, id.clone());
            if !locators.contains(&locator) {
                locators.push(locator);
            }
        }
        locators
    } else {
        vec![filter_after_update(filter, data)]
    };

    let mut actions: Vec<Operation> = snapshot
        .into_iter()
        .filter_map(|record| inverse_or_warn(operation_id, Operation::create(collection, record)))
        .collect();
    actions.extend(
        locators
            .into_iter()
            .filter_map(|locator| inverse_or_warn(operation_id, Operation::delete(collection, locator))),
    );
    InversePlan::Ready(actions)
}

/// `filter` as it reads once `data` has been written: every filtered field
/// the update sets now holds the new value.
fn filter_after_update(filter: &Filter, data: &Record) -> Filter {
    filter
        .iter()
        .map(|(field, value)| (field.clone(), data.get(field).unwrap_or(value).clone()))
        .collect()
}

fn recreate_deleted(
    operation_id: &OperationId,
    collection: &str,
    snapshot: Vec<Record>,
) -> InversePlan {
    if snapshot.is_empty() {
        return InversePlan::Nothing;
    }

    let actions = snapshot
        .into_iter()
        .filter_map(|record| inverse_or_warn(operation_id, Operation::create(collection, record)))
        .collect();
    InversePlan::Ready(actions)
}

fn inverse_or_warn(
    operation_id: &OperationId,
    inverse: Result<Operation, InvalidOperation>,
) -> Option<Operation> {
    match inverse {
        Ok(action) => Some(action),
        Err(err) => {
            warn!(
                operation = %operation_id,
                error = %err,
                "snapshot cannot be turned into an inverse, it will not be rolled back"
            );
            None
        }
    }
}

/// Inverse operations of the operations that have run so far.
#[derive(Debug, Default)]
pub(crate) struct RollbackStack {
    entries: Vec<RollbackOperation>,
}

impl RollbackStack {
    pub(crate) fn push_all(&mut self, inverses: Vec<RollbackOperation>) {
        self.entries.extend(inverses);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Apply every inverse, most recent first.
    ///
    /// A failed inverse is logged and recorded; the remaining older
    /// inverses are still attempted.
    pub(crate) async fn replay<S: RecordStore>(
        mut self,
        executor: &RemoteExecutor<'_, S>,
        audit_log: &mut RunAuditLog,
    ) -> RollbackReport {
        let mut report = RollbackReport::default();
        debug!(count = self.entries.len(), "rolling back completed operations");

        while let Some(entry) = self.entries.pop() {
            report.attempted += 1;
            let description = entry.action().to_string();

            match apply_inverse(executor, entry.action()).await {
                Ok(()) => {
                    debug!(operation = %entry.operation_id(), action = %description, "applied inverse");
                    audit_log.record_rolled_back(entry.operation_id());
                }
                Err(err) => {
                    error!(
                        operation = %entry.operation_id(),
                        action = %description,
                        error = %err,
                        "rollback step failed"
                    );
                    audit_log.record_rollback_failed(entry.operation_id());
                    report.failures.push(RollbackFailure {
                        operation_id: entry.operation_id().clone(),
                        description,
                        error: err,
                    });
                }
            }
        }

        report
    }
}

/// Apply one inverse. A delete or update that matches nothing restored
/// nothing, so it counts as a failure.
async fn apply_inverse<S: RecordStore>(
    executor: &RemoteExecutor<'_, S>,
    action: &Operation,
) -> Result<(), InverseError> {
    let affected = executor.apply(action).await?;
    match action.filter() {
        Some(filter) if affected.is_empty() => Err(InverseError::NothingMatched {
            filter: filter.clone(),
        }),
        _ => Ok(()),
    }
}
