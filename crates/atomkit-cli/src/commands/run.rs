use std::path::Path;

use atomkit_core::RunErrorKind;
use atomkit_saga::Coordinator;
use atomkit_store::JsonFileStore;
use tracing::info;

use super::RunArgs;
use crate::config;
use crate::error::{CliError, Result};
use crate::output;
use crate::plan::Plan;

pub(crate) async fn run(args: RunArgs, config_path: Option<&Path>) -> Result<()> {
    let config = config::load(config_path)?;
    let plan = Plan::load(&args.plan)?;
    let store = JsonFileStore::open(args.store.clone())?.with_id_field(config.id_field());

    let coordinator = Coordinator::new(store).with_config(config);
    for operation in plan.operations {
        coordinator.add_operation(operation);
    }

    let (result, audit_log) = coordinator.execute_transaction_with_audit().await;

    // rejected runs never reached the store
    let reached_store = !matches!(
        result.error_kind(),
        Some(RunErrorKind::EmptyQueue | RunErrorKind::AlreadyRunning)
    );

    if reached_store && !args.dry_run {
        coordinator.store().save()?;
        info!(path = %args.store.display(), "store saved");
    }

    let rendered = if args.json {
        output::render_json(&result)?
    } else {
        output::render_plain(&result, &audit_log)
    };
    println!("{rendered}");

    match result.error {
        None => Ok(()),
        Some(error) if reached_store => Err(CliError::RolledBack(error)),
        Some(error) => Err(CliError::NotRun(error)),
    }
}
