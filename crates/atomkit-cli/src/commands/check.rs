use atomkit_saga::OperationQueue;

use super::CheckArgs;
use crate::error::Result;
use crate::plan::Plan;

pub(crate) fn run(args: &CheckArgs) -> Result<()> {
    let plan = Plan::load(&args.plan)?;

    if plan.operations.is_empty() {
        println!("Plan has no operations.");
        return Ok(());
    }

    let mut queue = OperationQueue::new();
    for operation in plan.operations {
        queue.add(operation);
    }

    println!("Plan is valid: {} operation(s)", queue.len());
    for queued in queue.operations() {
        println!("  {}  {}", queued.id(), queued.operation());
    }

    Ok(())
}
