//! Core data model for atomkit.
//!
//! Records, equality filters, validated mutation operations, their inverses
//! and the terminal report of a transaction run.

pub mod error;
mod operation;
mod record;
mod result;

pub use error::{InvalidOperation, Result};
pub use operation::{
    Operation, OperationId, OperationInput, OperationKind, QueuedOperation, RollbackOperation,
};
pub use record::{Filter, Record};
pub use result::{
    Notification, NotificationLevel, OperationOutcome, RunError, RunErrorKind, RunResult,
};
