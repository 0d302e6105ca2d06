//! Compensating transactions over non-transactional record stores.
//!
//! A [`Coordinator`] executes queued create/update/delete operations one at
//! a time. Before each operation it captures what is needed to undo it; if
//! a later operation fails, the captured inverses are replayed in reverse
//! order (LIFO), best-effort, and the run is reported as failed.

mod audit;
mod config;
mod coordinator;
mod error;
mod executor;
mod observer;
mod queue;
mod rollback;

pub use audit::{OperationRecord, OperationStatus, RunAuditLog};
pub use config::{CoordinatorConfig, DEFAULT_CALL_TIMEOUT, PreparationPolicy};
pub use coordinator::{Coordinator, RunState};
pub use error::{InverseError, RollbackFailure, RollbackReport};
pub use observer::{InvalidationLog, RunObserver};
pub use queue::OperationQueue;
pub use tokio_util::sync::CancellationToken;
