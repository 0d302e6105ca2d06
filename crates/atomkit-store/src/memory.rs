use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use atomkit_core::{Filter, Record};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use crate::Result;
use crate::error::StoreError;
use crate::store::RecordStore;

/// Field that holds a record's primary key unless configured otherwise.
pub const DEFAULT_ID_FIELD: &str = "id";

pub(crate) type Collections = IndexMap<String, Vec<Record>>;

/// Records held in process memory, grouped by collection.
///
/// Inserts without a primary key get a UUID v4 string. Unknown collections
/// behave as empty ones.
#[derive(Debug)]
pub struct MemoryStore {
    collections: Mutex<Collections>,
    id_field: String,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::from_collections(IndexMap::new())
    }

    #[must_use]
    pub fn from_collections(collections: Collections) -> Self {
        Self {
            collections: Mutex::new(collections),
            id_field: DEFAULT_ID_FIELD.to_string(),
        }
    }

    #[must_use]
    pub fn with_collection(self, name: impl Into<String>, records: Vec<Record>) -> Self {
        self.lock().insert(name.into(), records);
        self
    }

    #[must_use]
    pub fn with_id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = id_field.into();
        self
    }

    #[must_use]
    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// Current contents of one collection.
    #[must_use]
    pub fn records(&self, collection: &str) -> Vec<Record> {
        self.lock().get(collection).cloned().unwrap_or_default()
    }

    /// Copy of every collection.
    #[must_use]
    pub fn snapshot(&self) -> Collections {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Collections> {
        self.collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn insert_now(&self, collection: &str, data: &Record) -> Result<Vec<Record>> {
        let mut record = data.clone();
        let mut collections = self.lock();
        let records = collections.entry(collection.to_string()).or_default();

        if let Some(id) = record.get(&self.id_field) {
            if records.iter().any(|r| r.get(&self.id_field) == Some(id)) {
                return Err(self.duplicate_key(collection, id));
            }
        } else {
            record.insert(
                self.id_field.clone(),
                Value::String(uuid::Uuid::new_v4().to_string()),
            );
        }

        debug!(collection, "inserting record");
        records.push(record.clone());
        Ok(vec![record])
    }

    pub(crate) fn update_now(
        &self,
        collection: &str,
        data: &Record,
        filter: &Filter,
    ) -> Result<Vec<Record>> {
        let mut collections = self.lock();
        let Some(records) = collections.get_mut(collection) else {
            return Ok(Vec::new());
        };

        // a new primary key may land on at most one record and must stay unique
        if let Some(new_id) = data.get(&self.id_field) {
            let matched = records.iter().filter(|r| filter.matches(r)).count();
            let taken = records
                .iter()
                .any(|r| !filter.matches(r) && r.get(&self.id_field) == Some(new_id));
            if matched > 1 || taken {
                return Err(self.duplicate_key(collection, new_id));
            }
        }

        let mut updated = Vec::new();
        for record in records.iter_mut().filter(|r| filter.matches(r)) {
            for (field, value) in data {
                record.insert(field.clone(), value.clone());
            }
            updated.push(record.clone());
        }
        debug!(collection, %filter, count = updated.len(), "updated records");
        Ok(updated)
    }

    fn duplicate_key(&self, collection: &str, id: &Value) -> StoreError {
        StoreError::backend(format!(
            "duplicate key: '{collection}' already has a record with {} = {id}",
            self.id_field
        ))
    }

    pub(crate) fn delete_now(&self, collection: &str, filter: &Filter) -> Vec<Record> {
        let mut collections = self.lock();
        let Some(records) = collections.get_mut(collection) else {
            return Vec::new();
        };

        let (removed, kept): (Vec<_>, Vec<_>) =
            records.drain(..).partition(|r| filter.matches(r));
        *records = kept;
        debug!(collection, %filter, count = removed.len(), "deleted records");
        removed
    }

    pub(crate) fn select_now(&self, collection: &str, filter: &Filter) -> Vec<Record> {
        self.lock()
            .get(collection)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| filter.matches(r))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert(&self, collection: &str, data: &Record) -> Result<Vec<Record>> {
        self.insert_now(collection, data)
    }

    async fn update(
        &self,
        collection: &str,
        data: &Record,
        filter: &Filter,
    ) -> Result<Vec<Record>> {
        self.update_now(collection, data, filter)
    }

    async fn delete(&self, collection: &str, filter: &Filter) -> Result<Vec<Record>> {
        Ok(self.delete_now(collection, filter))
    }

    async fn select(&self, collection: &str, filter: &Filter) -> Result<Vec<Record>> {
        Ok(self.select_now(collection, filter))
    }
}
