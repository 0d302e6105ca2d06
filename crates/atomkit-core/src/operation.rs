use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{InvalidOperation, Result};
use crate::record::{Filter, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Create,
    Update,
    Delete,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Identity of a queued operation, assigned when it is enqueued.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(String);

impl OperationId {
    /// Identifier derived from a queue's monotonic sequence number.
    #[must_use]
    pub fn from_sequence(sequence: u64) -> Self {
        Self(format!("op-{sequence}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OperationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for OperationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Unvalidated operation as it appears in a plan document.
///
/// Convert with [`Operation::try_from`] to get a checked [`Operation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationInput {
    #[serde(rename = "type")]
    pub kind: OperationKind,
    pub collection: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
}

/// A single requested mutation against a named collection.
///
/// Built through [`Operation::create`], [`Operation::update`],
/// [`Operation::delete`] or by deserializing, all of which validate the
/// payload the variant needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Operation {
    Create {
        collection: String,
        data: Record,
    },
    Update {
        collection: String,
        data: Record,
        filter: Filter,
    },
    Delete {
        collection: String,
        filter: Filter,
    },
}

impl Operation {
    /// # Errors
    ///
    /// Returns an error if the collection name or the data is empty.
    pub fn create(collection: impl Into<String>, data: Record) -> Result<Self> {
        let collection = non_empty_collection(collection.into())?;
        if data.is_empty() {
            return Err(InvalidOperation::MissingData {
                kind: OperationKind::Create,
                collection,
            });
        }
        Ok(Self::Create { collection, data })
    }

    /// # Errors
    ///
    /// Returns an error if the collection name, the data or the filter is empty.
    pub fn update(collection: impl Into<String>, data: Record, filter: Filter) -> Result<Self> {
        let collection = non_empty_collection(collection.into())?;
        if data.is_empty() {
            return Err(InvalidOperation::MissingData {
                kind: OperationKind::Update,
                collection,
            });
        }
        if filter.is_empty() {
            return Err(InvalidOperation::MissingFilter {
                kind: OperationKind::Update,
                collection,
            });
        }
        Ok(Self::Update {
            collection,
            data,
            filter,
        })
    }

    /// # Errors
    ///
    /// Returns an error if the collection name or the filter is empty.
    pub fn delete(collection: impl Into<String>, filter: Filter) -> Result<Self> {
        let collection = non_empty_collection(collection.into())?;
        if filter.is_empty() {
            return Err(InvalidOperation::MissingFilter {
                kind: OperationKind::Delete,
                collection,
            });
        }
        Ok(Self::Delete { collection, filter })
    }

    #[must_use]
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Create { .. } => OperationKind::Create,
            Self::Update { .. } => OperationKind::Update,
            Self::Delete { .. } => OperationKind::Delete,
        }
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        match self {
            Self::Create { collection, .. }
            | Self::Update { collection, .. }
            | Self::Delete { collection, .. } => collection,
        }
    }

    #[must_use]
    pub fn data(&self) -> Option<&Record> {
        match self {
            Self::Create { data, .. } | Self::Update { data, .. } => Some(data),
            Self::Delete { .. } => None,
        }
    }

    #[must_use]
    pub fn filter(&self) -> Option<&Filter> {
        match self {
            Self::Update { filter, .. } | Self::Delete { filter, .. } => Some(filter),
            Self::Create { .. } => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.filter() {
            Some(filter) => write!(f, "{} {} where {filter}", self.kind(), self.collection()),
            None => write!(f, "{} {}", self.kind(), self.collection()),
        }
    }
}

impl TryFrom<OperationInput> for Operation {
    type Error = InvalidOperation;

    fn try_from(input: OperationInput) -> Result<Self> {
        let OperationInput {
            kind,
            collection,
            data,
            filter,
        } = input;
        match kind {
            OperationKind::Create => Self::create(collection, data.unwrap_or_default()),
            OperationKind::Update => Self::update(
                collection,
                data.unwrap_or_default(),
                filter.unwrap_or_default(),
            ),
            OperationKind::Delete => Self::delete(collection, filter.unwrap_or_default()),
        }
    }
}

impl<'de> Deserialize<'de> for Operation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let input = OperationInput::deserialize(deserializer)?;
        Self::try_from(input).map_err(serde::de::Error::custom)
    }
}

fn non_empty_collection(collection: String) -> Result<String> {
    if collection.trim().is_empty() {
        Err(InvalidOperation::EmptyCollection)
    } else {
        Ok(collection)
    }
}

/// An operation paired with the id it was enqueued under.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueuedOperation {
    id: OperationId,
    #[serde(flatten)]
    operation: Operation,
}

impl QueuedOperation {
    #[must_use]
    pub fn new(id: OperationId, operation: Operation) -> Self {
        Self { id, operation }
    }

    #[must_use]
    pub fn id(&self) -> &OperationId {
        &self.id
    }

    #[must_use]
    pub fn operation(&self) -> &Operation {
        &self.operation
    }
}

/// The inverse of an executed operation.
///
/// Applying `action` restores the state that existed before the operation
/// identified by `operation_id` ran.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollbackOperation {
    operation_id: OperationId,
    action: Operation,
}

impl RollbackOperation {
    #[must_use]
    pub fn new(operation_id: OperationId, action: Operation) -> Self {
        Self {
            operation_id,
            action,
        }
    }

    #[must_use]
    pub fn operation_id(&self) -> &OperationId {
        &self.operation_id
    }

    #[must_use]
    pub fn action(&self) -> &Operation {
        &self.action
    }
}
