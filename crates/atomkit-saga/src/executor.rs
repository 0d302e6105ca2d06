use std::future::Future;
use std::time::Duration;

use atomkit_core::{Filter, Operation, Record};
use atomkit_store::{RecordStore, StoreError};
use tokio_util::sync::CancellationToken;

type CallResult = Result<Vec<Record>, StoreError>;

/// Dispatches operations to the store primitive matching their kind.
///
/// Every call is bounded by the configured timeout. Calls made through an
/// executor holding a cancellation token stop waiting once it fires.
pub(crate) struct RemoteExecutor<'a, S> {
    store: &'a S,
    timeout: Option<Duration>,
    cancellation: Option<CancellationToken>,
}

impl<'a, S> RemoteExecutor<'a, S>
where
    S: RecordStore,
{
    pub(crate) fn new(store: &'a S, timeout: Option<Duration>) -> Self {
        Self {
            store,
            timeout,
            cancellation: None,
        }
    }

    pub(crate) fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Same store and timeout, but deaf to cancellation.
    pub(crate) fn uncancellable(&self) -> RemoteExecutor<'a, S> {
        RemoteExecutor::new(self.store, self.timeout)
    }

    pub(crate) async fn apply(&self, operation: &Operation) -> CallResult {
        match operation {
            Operation::Create { collection, data } => {
                self.bounded(self.store.insert(collection, data)).await
            }
            Operation::Update {
                collection,
                data,
                filter,
            } => {
                self.bounded(self.store.update(collection, data, filter))
                    .await
            }
            Operation::Delete { collection, filter } => {
                self.bounded(self.store.delete(collection, filter)).await
            }
        }
    }

    pub(crate) async fn select(&self, collection: &str, filter: &Filter) -> CallResult {
        self.bounded(self.store.select(collection, filter)).await
    }

    async fn bounded<F>(&self, call: F) -> CallResult
    where
        F: Future<Output = CallResult>,
    {
        let timed = async {
            match self.timeout {
                Some(limit) => tokio::time::timeout(limit, call)
                    .await
                    .unwrap_or_else(|_| Err(StoreError::Timeout(limit))),
                None => call.await,
            }
        };

        match &self.cancellation {
            Some(token) => {
                tokio::select! {
                    biased;
                    () = token.cancelled() => Err(StoreError::Cancelled),
                    result = timed => result,
                }
            }
            None => timed.await,
        }
    }
}
