//! Integration tests for rollback steps that themselves fail.

use atomkit_core::{Filter, Operation, OperationId, Record, RunErrorKind};
use atomkit_saga::{Coordinator, OperationStatus};
use atomkit_store::StoreMethod;
use atomkit_store::testing::ScriptedStore;
use serde_json::{Value, json};

fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

#[tokio::test]
async fn failed_inverse_does_not_stop_older_inverses() -> anyhow::Result<()> {
    let store = ScriptedStore::new()
        .fail_on(StoreMethod::Delete, "gadgets", "delete refused")
        .fail_on(StoreMethod::Insert, "trigger", "triggered failure");
    let coordinator = Coordinator::new(store);
    coordinator.add_operation(Operation::create("widgets", record(json!({"id": "w-1"})))?);
    coordinator.add_operation(Operation::create("gadgets", record(json!({"id": "g-1"})))?);
    coordinator.add_operation(Operation::create("widgets", record(json!({"id": "w-2"})))?);
    coordinator.add_operation(Operation::create("trigger", record(json!({"id": "t-1"})))?);

    let result = coordinator.execute_transaction().await;

    assert!(!result.success);
    let deletes: Vec<_> = coordinator
        .store()
        .calls_to(StoreMethod::Delete)
        .into_iter()
        .map(|call| (call.collection, call.filter))
        .collect();
    assert_eq!(
        deletes,
        vec![
            ("widgets".to_string(), Some(Filter::by_field("id", "w-2"))),
            ("gadgets".to_string(), Some(Filter::by_field("id", "g-1"))),
            ("widgets".to_string(), Some(Filter::by_field("id", "w-1"))),
        ]
    );
    assert!(coordinator.store().records("widgets").is_empty());
    assert_eq!(coordinator.store().records("gadgets").len(), 1);
    Ok(())
}

#[tokio::test]
async fn rollback_failure_never_replaces_reported_error() -> anyhow::Result<()> {
    let store = ScriptedStore::new()
        .fail_on(StoreMethod::Delete, "widgets", "delete refused")
        .fail_on(StoreMethod::Update, "widgets", "original cause");
    let coordinator = Coordinator::new(store);
    coordinator.add_operation(Operation::create("widgets", record(json!({"id": "w-1"})))?);
    coordinator.add_operation(Operation::update(
        "widgets",
        record(json!({"name": "b"})),
        Filter::by_field("id", "w-1"),
    )?);

    let result = coordinator.execute_transaction().await;

    let error = result.error.expect("failed run carries an error");
    assert_eq!(error.kind, RunErrorKind::Operation);
    assert_eq!(error.message, "original cause");
    Ok(())
}

#[tokio::test]
async fn audit_log_separates_reverted_from_unreverted_operations() -> anyhow::Result<()> {
    let store = ScriptedStore::new()
        .fail_on(StoreMethod::Delete, "gadgets", "delete refused")
        .fail_on(StoreMethod::Insert, "trigger", "triggered failure");
    let coordinator = Coordinator::new(store);
    let widget =
        coordinator.add_operation(Operation::create("widgets", record(json!({"id": "w-1"})))?);
    let gadget =
        coordinator.add_operation(Operation::create("gadgets", record(json!({"id": "g-1"})))?);
    let trigger =
        coordinator.add_operation(Operation::create("trigger", record(json!({"id": "t-1"})))?);

    let (_, audit_log) = coordinator.execute_transaction_with_audit().await;

    let status = |id: &OperationId| audit_log.record(id).map(|r| r.status);
    assert_eq!(status(&widget), Some(OperationStatus::RolledBack));
    assert_eq!(status(&gadget), Some(OperationStatus::RollbackFailed));
    assert_eq!(status(&trigger), Some(OperationStatus::Failed));
    Ok(())
}
