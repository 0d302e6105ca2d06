use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use atomkit_core::{
    Operation, OperationId, OperationOutcome, QueuedOperation, RunError, RunErrorKind, RunResult,
};
use atomkit_store::{RecordStore, StoreError};
use indexmap::IndexSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::audit::RunAuditLog;
use crate::config::{CoordinatorConfig, PreparationPolicy};
use crate::error::run_error;
use crate::executor::RemoteExecutor;
use crate::observer::RunObserver;
use crate::queue::OperationQueue;
use crate::rollback::{PreparedRollback, RollbackStack, prepare_rollback};

/// Snapshot of a coordinator's run state.
#[derive(Debug, Clone, PartialEq)]
pub struct RunState {
    pub is_running: bool,
    pub operations: Vec<QueuedOperation>,
    pub completed_operation_ids: Vec<OperationId>,
    pub failed_operation_ids: Vec<OperationId>,
}

#[derive(Debug, Default)]
struct Ledger {
    queue: OperationQueue,
    completed: Vec<OperationId>,
    failed: Vec<OperationId>,
}

/// Runs queued operations against a store as one compensated unit.
///
/// Operations execute strictly in submission order. The first failure stops
/// the run and replays the inverses of everything already executed, newest
/// first. Only one run may be in flight per coordinator; a concurrent call
/// is rejected without touching the store.
pub struct Coordinator<S> {
    store: S,
    config: CoordinatorConfig,
    observers: Vec<Arc<dyn RunObserver>>,
    cancellation: CancellationToken,
    running: AtomicBool,
    ledger: Mutex<Ledger>,
}

impl<S> Coordinator<S>
where
    S: RecordStore,
{
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            config: CoordinatorConfig::default(),
            observers: Vec::new(),
            cancellation: CancellationToken::new(),
            running: AtomicBool::new(false),
            ledger: Mutex::new(Ledger::default()),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Register an observer to notify after each committed run.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Abandon in-flight operations once `token` is cancelled.
    ///
    /// Rollback of already executed operations still runs to completion.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn add_operation(&self, operation: Operation) -> OperationId {
        let id = self.ledger().queue.add(operation);
        debug!(operation = %id, "queued operation");
        id
    }

    /// Drop every queued operation and forget the last run's outcome.
    pub fn clear_operations(&self) {
        let mut ledger = self.ledger();
        ledger.queue.clear();
        ledger.completed.clear();
        ledger.failed.clear();
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn operations(&self) -> Vec<QueuedOperation> {
        self.ledger().queue.operations().to_vec()
    }

    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.ledger().queue.len()
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.ledger().completed.len()
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.ledger().failed.len()
    }

    #[must_use]
    pub fn run_state(&self) -> RunState {
        let ledger = self.ledger();
        RunState {
            is_running: self.is_running(),
            operations: ledger.queue.operations().to_vec(),
            completed_operation_ids: ledger.completed.clone(),
            failed_operation_ids: ledger.failed.clone(),
        }
    }

    /// Execute every queued operation, rolling back on the first failure.
    pub async fn execute_transaction(&self) -> RunResult {
        let (result, _audit_log) = self.execute_transaction_with_audit().await;
        result
    }

    /// Execute the run and return both the result and an audit log.
    pub async fn execute_transaction_with_audit(&self) -> (RunResult, RunAuditLog) {
        let mut audit_log = RunAuditLog::new();

        if self.is_running() {
            warn!("rejected transaction: another run is in flight");
            return (
                RunResult::failed(Vec::new(), RunError::already_running()),
                audit_log,
            );
        }

        let operations = self.operations();
        if operations.is_empty() {
            debug!("nothing queued");
            return (
                RunResult::failed(Vec::new(), RunError::empty_queue()),
                audit_log,
            );
        }

        let Some(_running) = RunningGuard::acquire(&self.running) else {
            warn!("rejected transaction: another run is in flight");
            return (
                RunResult::failed(Vec::new(), RunError::already_running()),
                audit_log,
            );
        };

        {
            let mut ledger = self.ledger();
            ledger.completed.clear();
            ledger.failed.clear();
        }

        let result = self.run(&operations, &mut audit_log).await;
        (result, audit_log)
    }

    async fn run(&self, operations: &[QueuedOperation], audit_log: &mut RunAuditLog) -> RunResult {
        let executor = RemoteExecutor::new(&self.store, self.config.call_timeout())
            .with_cancellation(self.cancellation.clone());
        let id_field = self.config.id_field();
        let mut rollback = RollbackStack::default();
        let mut results = Vec::with_capacity(operations.len());
        let mut touched: IndexSet<String> = IndexSet::new();

        for queued in operations {
            let id = queued.id();
            let operation = queued.operation();
            audit_log.record_start(id, operation.to_string());
            debug!(operation = %id, kind = %operation.kind(), collection = operation.collection(), "executing operation");

            let prepared = match prepare_rollback(&executor, queued, id_field).await {
                Ok(prepared) => prepared,
                Err(err) => {
                    audit_log.record_preparation_failed(err.to_string());
                    if matches!(err, StoreError::Cancelled)
                        || self.config.preparation_policy() == PreparationPolicy::Strict
                    {
                        let error = run_error(id, RunErrorKind::Preparation, &err);
                        return self
                            .abort(&executor, rollback, audit_log, results, id, error)
                            .await;
                    }
                    warn!(
                        operation = %id,
                        error = %err,
                        "could not prepare rollback, executing without an undo for this operation"
                    );
                    PreparedRollback::none(id)
                }
            };

            match executor.apply(operation).await {
                Ok(data) => {
                    let inverses = prepared.into_inverses(&data, id_field);
                    audit_log.record_success(inverses.len());
                    rollback.push_all(inverses);
                    touched.insert(operation.collection().to_string());
                    self.ledger().completed.push(id.clone());
                    debug!(operation = %id, records = data.len(), "operation completed");
                    results.push(OperationOutcome {
                        operation_id: id.clone(),
                        data,
                    });
                }
                Err(err) => {
                    let error = run_error(id, RunErrorKind::Operation, &err);
                    return self
                        .abort(&executor, rollback, audit_log, results, id, error)
                        .await;
                }
            }
        }

        let collections: Vec<String> = touched.into_iter().collect();
        for observer in &self.observers {
            observer.collections_changed(&collections).await;
        }

        info!(
            operations = results.len(),
            collections = collections.len(),
            "transaction committed"
        );
        RunResult::succeeded(results)
    }

    async fn abort(
        &self,
        executor: &RemoteExecutor<'_, S>,
        rollback: RollbackStack,
        audit_log: &mut RunAuditLog,
        results: Vec<OperationOutcome>,
        failed: &OperationId,
        error: RunError,
    ) -> RunResult {
        warn!(operation = %failed, error = %error, "transaction failed, rolling back");
        audit_log.record_failure(error.message.clone());

        let report = rollback
            .replay(&executor.uncancellable(), audit_log)
            .await;
        if report.is_clean() {
            info!(reverted = report.attempted, "rollback completed");
        } else {
            warn!(
                reverted = report.succeeded(),
                failed = report.failures.len(),
                "rollback completed with failures"
            );
        }

        self.ledger().failed.push(failed.clone());
        RunResult::failed(results, error)
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Holds the running flag; clears it when dropped, including when the run
/// future itself is dropped mid-flight.
struct RunningGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RunningGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use atomkit_core::Filter;
    use atomkit_store::StoreMethod;
    use atomkit_store::testing::ScriptedStore;
    use serde_json::{Value, json};

    use super::*;
    use crate::audit::OperationStatus;

    fn record(value: Value) -> atomkit_core::Record {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn running_guard_is_exclusive_and_released_on_drop() {
        let flag = AtomicBool::new(false);

        let guard = RunningGuard::acquire(&flag);
        assert!(guard.is_some());
        assert!(RunningGuard::acquire(&flag).is_none());

        drop(guard);
        assert!(!flag.load(Ordering::SeqCst));
        assert!(RunningGuard::acquire(&flag).is_some());
    }

    #[tokio::test]
    async fn counters_follow_a_failed_run() -> anyhow::Result<()> {
        let store = ScriptedStore::new().fail_on(StoreMethod::Insert, "gadgets", "boom");
        let coordinator = Coordinator::new(store);
        coordinator.add_operation(Operation::create("widgets", record(json!({"n": 1})))?);
        let failing =
            coordinator.add_operation(Operation::create("gadgets", record(json!({"n": 2})))?);

        let result = coordinator.execute_transaction().await;

        assert!(!result.success);
        assert_eq!(coordinator.operation_count(), 2);
        assert_eq!(coordinator.completed_count(), 1);
        assert_eq!(coordinator.failed_count(), 1);
        assert_eq!(coordinator.run_state().failed_operation_ids, vec![failing]);
        assert!(!coordinator.is_running());
        Ok(())
    }

    #[tokio::test]
    async fn clear_operations_resets_state() -> anyhow::Result<()> {
        let coordinator = Coordinator::new(ScriptedStore::new());
        coordinator.add_operation(Operation::create("widgets", record(json!({"n": 1})))?);
        coordinator.execute_transaction().await;
        assert_eq!(coordinator.completed_count(), 1);

        coordinator.clear_operations();

        let state = coordinator.run_state();
        assert!(state.operations.is_empty());
        assert!(state.completed_operation_ids.is_empty());
        assert!(state.failed_operation_ids.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn audit_log_marks_rolled_back_and_failed_operations() -> anyhow::Result<()> {
        let store = ScriptedStore::new().fail_on(StoreMethod::Update, "widgets", "conflict");
        let coordinator = Coordinator::new(store);
        let created =
            coordinator.add_operation(Operation::create("widgets", record(json!({"n": 1})))?);
        let updated = coordinator.add_operation(Operation::update(
            "widgets",
            record(json!({"n": 2})),
            Filter::by_field("n", 1),
        )?);

        let (result, audit_log) = coordinator.execute_transaction_with_audit().await;

        assert!(!result.success);
        let created_record = audit_log.record(&created).expect("create is audited");
        let updated_record = audit_log.record(&updated).expect("update is audited");
        assert_eq!(created_record.status, OperationStatus::RolledBack);
        assert_eq!(updated_record.status, OperationStatus::Failed);
        assert_eq!(updated_record.error.as_deref(), Some("conflict"));
        Ok(())
    }
}
