use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use atomkit_core::{Filter, Record};

use crate::Result;

/// The four primitives a backing store must offer.
///
/// Every mutation returns the affected records. Implementations are not
/// expected to be transactional.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the backend rejects the insert.
    async fn insert(&self, collection: &str, data: &Record) -> Result<Vec<Record>>;

    /// # Errors
    ///
    /// Returns an error if the backend rejects the update.
    async fn update(&self, collection: &str, data: &Record, filter: &Filter)
    -> Result<Vec<Record>>;

    /// # Errors
    ///
    /// Returns an error if the backend rejects the delete.
    async fn delete(&self, collection: &str, filter: &Filter) -> Result<Vec<Record>>;

    /// # Errors
    ///
    /// Returns an error if the backend cannot run the query.
    async fn select(&self, collection: &str, filter: &Filter) -> Result<Vec<Record>>;
}

#[async_trait]
impl<S> RecordStore for Arc<S>
where
    S: RecordStore + ?Sized,
{
    async fn insert(&self, collection: &str, data: &Record) -> Result<Vec<Record>> {
        (**self).insert(collection, data).await
    }

    async fn update(
        &self,
        collection: &str,
        data: &Record,
        filter: &Filter,
    ) -> Result<Vec<Record>> {
        (**self).update(collection, data, filter).await
    }

    async fn delete(&self, collection: &str, filter: &Filter) -> Result<Vec<Record>> {
        (**self).delete(collection, filter).await
    }

    async fn select(&self, collection: &str, filter: &Filter) -> Result<Vec<Record>> {
        (**self).select(collection, filter).await
    }
}

/// Names the primitive a call went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreMethod {
    Insert,
    Update,
    Delete,
    Select,
}

impl fmt::Display for StoreMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Select => "select",
        };
        f.write_str(name)
    }
}
