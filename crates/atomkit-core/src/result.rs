use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::operation::OperationId;
use crate::record::Record;

/// The data returned by the store for one successful operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationOutcome {
    pub operation_id: OperationId,
    pub data: Vec<Record>,
}

/// Category of the error that ended a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum RunErrorKind {
    /// A queued operation was rejected by the store.
    Operation,
    /// Nothing was queued.
    EmptyQueue,
    /// Another run is in flight on the same coordinator.
    AlreadyRunning,
    /// A rollback snapshot could not be read and the policy is strict.
    Preparation,
    /// The run was cancelled while an operation was in flight.
    Cancelled,
}

impl fmt::Display for RunErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Operation => "operation",
            Self::EmptyQueue => "empty-queue",
            Self::AlreadyRunning => "already-running",
            Self::Preparation => "preparation",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Terminal error of a failed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{}", self.describe())]
pub struct RunError {
    pub kind: RunErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<OperationId>,
    pub message: String,
}

impl RunError {
    #[must_use]
    pub fn new(kind: RunErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            operation_id: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn empty_queue() -> Self {
        Self::new(RunErrorKind::EmptyQueue, "no operations to execute")
    }

    #[must_use]
    pub fn already_running() -> Self {
        Self::new(
            RunErrorKind::AlreadyRunning,
            "a transaction is already running",
        )
    }

    #[must_use]
    pub fn for_operation(mut self, operation_id: OperationId) -> Self {
        self.operation_id = Some(operation_id);
        self
    }

    fn describe(&self) -> String {
        match &self.operation_id {
            Some(id) => format!("operation {id} failed: {}", self.message),
            None => self.message.clone(),
        }
    }
}

/// Terminal report of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    pub success: bool,
    pub results: Vec<OperationOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RunError>,
}

impl RunResult {
    #[must_use]
    pub fn succeeded(results: Vec<OperationOutcome>) -> Self {
        Self {
            success: true,
            results,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(results: Vec<OperationOutcome>, error: RunError) -> Self {
        Self {
            success: false,
            results,
            error: Some(error),
        }
    }

    #[must_use]
    pub fn error_kind(&self) -> Option<RunErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }

    /// The single aggregate message to show for this run.
    #[must_use]
    pub fn notification(&self) -> Notification {
        match &self.error {
            None => Notification {
                level: NotificationLevel::Success,
                message: format!(
                    "Transaction completed: {} operation(s) executed",
                    self.results.len()
                ),
            },
            Some(error) => Notification {
                level: NotificationLevel::Error,
                message: format!("Transaction failed: {error}"),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
