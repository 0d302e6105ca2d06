use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

/// Notified after a run commits, with every collection it changed.
///
/// This is the hook for refreshing read caches. Rolled-back runs never
/// notify.
#[async_trait]
pub trait RunObserver: Send + Sync {
    /// `collections` holds each touched collection once, in the order the
    /// run first touched it.
    async fn collections_changed(&self, collections: &[String]);
}

/// Observer that remembers every notification it receives.
#[derive(Debug, Default)]
pub struct InvalidationLog {
    batches: Mutex<Vec<Vec<String>>>,
}

impl InvalidationLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// One entry per committed run, oldest first.
    #[must_use]
    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl RunObserver for InvalidationLog {
    async fn collections_changed(&self, collections: &[String]) {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(collections.to_vec());
    }
}
