use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use atomkit_core::{Filter, Record};
use tracing::debug;

use crate::Result;
use crate::error::StoreError;
use crate::memory::{Collections, MemoryStore};
use crate::store::RecordStore;

/// A [`MemoryStore`] loaded from and saved to a JSON document.
///
/// The document maps collection names to arrays of records. Changes stay in
/// memory until [`JsonFileStore::save`] is called.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl JsonFileStore {
    /// Load the store at `path`; a missing file starts an empty store.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let collections = load_collections(&path)?;
        debug!(path = %path.display(), collections = collections.len(), "opened store file");
        Ok(Self {
            path,
            inner: MemoryStore::from_collections(collections),
        })
    }

    #[must_use]
    pub fn with_id_field(mut self, id_field: impl Into<String>) -> Self {
        self.inner = self.inner.with_id_field(id_field);
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn records(&self, collection: &str) -> Vec<Record> {
        self.inner.records(collection)
    }

    /// Write the current contents back to the file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self) -> Result<()> {
        let content =
            serde_json::to_string_pretty(&self.inner.snapshot()).map_err(StoreError::Serialize)?;
        fs::write(&self.path, content + "\n").map_err(|source| StoreError::FileWrite {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), "saved store file");
        Ok(())
    }
}

fn load_collections(path: &Path) -> Result<Collections> {
    if !path.exists() {
        return Ok(Collections::new());
    }

    let content = fs::read_to_string(path).map_err(|source| StoreError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    if content.trim().is_empty() {
        return Ok(Collections::new());
    }

    serde_json::from_str(&content).map_err(|source| StoreError::FileParse {
        path: path.to_path_buf(),
        source,
    })
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn insert(&self, collection: &str, data: &Record) -> Result<Vec<Record>> {
        self.inner.insert(collection, data).await
    }

    async fn update(
        &self,
        collection: &str,
        data: &Record,
        filter: &Filter,
    ) -> Result<Vec<Record>> {
        self.inner.update(collection, data, filter).await
    }

    async fn delete(&self, collection: &str, filter: &Filter) -> Result<Vec<Record>> {
        self.inner.delete(collection, filter).await
    }

    async fn select(&self, collection: &str, filter: &Filter) -> Result<Vec<Record>> {
        self.inner.select(collection, filter).await
    }
}
