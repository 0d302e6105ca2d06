use thiserror::Error;

use crate::OperationKind;

/// Reasons an operation cannot be constructed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum InvalidOperation {
    #[error("collection name cannot be empty")]
    EmptyCollection,

    #[error("{kind} operation on '{collection}' requires non-empty data")]
    MissingData {
        kind: OperationKind,
        collection: String,
    },

    #[error("{kind} operation on '{collection}' requires a non-empty filter")]
    MissingFilter {
        kind: OperationKind,
        collection: String,
    },
}

pub type Result<T> = std::result::Result<T, InvalidOperation>;
