//! Store double with failure injection and a call journal.
//!
//! [`ScriptedStore`] wraps a [`MemoryStore`], records every call it
//! receives in order, and can be told to fail or hang on selected calls.
//! It also tracks how many calls were in flight at once so callers can
//! assert that they never overlap.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use atomkit_core::{Filter, Record};

use crate::Result;
use crate::error::StoreError;
use crate::memory::MemoryStore;
use crate::store::{RecordStore, StoreMethod};

/// One call received by a [`ScriptedStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct StoreCall {
    pub method: StoreMethod,
    pub collection: String,
    pub data: Option<Record>,
    pub filter: Option<Filter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Behavior {
    Fail,
    Hang,
}

#[derive(Debug)]
struct Rule {
    method: StoreMethod,
    collection: String,
    behavior: Behavior,
    message: String,
    remaining: Option<usize>,
}

impl Rule {
    fn applies(&self, method: StoreMethod, collection: &str) -> bool {
        self.method == method
            && self.collection == collection
            && self.remaining.is_none_or(|n| n > 0)
    }
}

#[derive(Debug, Default)]
pub struct ScriptedStore {
    inner: MemoryStore,
    rules: Mutex<Vec<Rule>>,
    journal: Mutex<Vec<StoreCall>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn wrapping(inner: MemoryStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_collection(mut self, name: impl Into<String>, records: Vec<Record>) -> Self {
        self.inner = self.inner.with_collection(name, records);
        self
    }

    /// Fail every `method` call on `collection` with a backend error.
    #[must_use]
    pub fn fail_on(self, method: StoreMethod, collection: &str, message: &str) -> Self {
        self.push_rule(method, collection, Behavior::Fail, message, None)
    }

    /// Fail only the next `times` matching calls.
    #[must_use]
    pub fn fail_times(
        self,
        method: StoreMethod,
        collection: &str,
        message: &str,
        times: usize,
    ) -> Self {
        self.push_rule(method, collection, Behavior::Fail, message, Some(times))
    }

    /// Never complete `method` calls on `collection`.
    #[must_use]
    pub fn hang_on(self, method: StoreMethod, collection: &str) -> Self {
        self.push_rule(method, collection, Behavior::Hang, "", None)
    }

    fn push_rule(
        self,
        method: StoreMethod,
        collection: &str,
        behavior: Behavior,
        message: &str,
        remaining: Option<usize>,
    ) -> Self {
        lock(&self.rules).push(Rule {
            method,
            collection: collection.to_string(),
            behavior,
            message: message.to_string(),
            remaining,
        });
        self
    }

    #[must_use]
    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    #[must_use]
    pub fn records(&self, collection: &str) -> Vec<Record> {
        self.inner.records(collection)
    }

    /// Every call received so far, in arrival order.
    #[must_use]
    pub fn calls(&self) -> Vec<StoreCall> {
        lock(&self.journal).clone()
    }

    /// Calls that went through `method`, in arrival order.
    #[must_use]
    pub fn calls_to(&self, method: StoreMethod) -> Vec<StoreCall> {
        lock(&self.journal)
            .iter()
            .filter(|call| call.method == method)
            .cloned()
            .collect()
    }

    /// Highest number of calls observed in flight at the same time.
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(
        &self,
        method: StoreMethod,
        collection: &str,
        data: Option<&Record>,
        filter: Option<&Filter>,
    ) -> Result<InFlight<'_>> {
        lock(&self.journal).push(StoreCall {
            method,
            collection: collection.to_string(),
            data: data.cloned(),
            filter: filter.cloned(),
        });

        let guard = InFlight::new(&self.in_flight, &self.max_in_flight);

        // a real backend suspends here; let any other task get scheduled
        tokio::task::yield_now().await;

        match self.take_behavior(method, collection) {
            Some((Behavior::Fail, message)) => Err(StoreError::backend(message)),
            Some((Behavior::Hang, _)) => std::future::pending().await,
            None => Ok(guard),
        }
    }

    fn take_behavior(&self, method: StoreMethod, collection: &str) -> Option<(Behavior, String)> {
        let mut rules = lock(&self.rules);
        let rule = rules.iter_mut().find(|r| r.applies(method, collection))?;
        if let Some(remaining) = rule.remaining.as_mut() {
            *remaining -= 1;
        }
        Some((rule.behavior, rule.message.clone()))
    }
}

struct InFlight<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> InFlight<'a> {
    fn new(counter: &'a AtomicUsize, max: &AtomicUsize) -> Self {
        let now = counter.fetch_add(1, Ordering::SeqCst) + 1;
        max.fetch_max(now, Ordering::SeqCst);
        Self { counter }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl RecordStore for ScriptedStore {
    async fn insert(&self, collection: &str, data: &Record) -> Result<Vec<Record>> {
        let _guard = self
            .enter(StoreMethod::Insert, collection, Some(data), None)
            .await?;
        self.inner.insert(collection, data).await
    }

    async fn update(
        &self,
        collection: &str,
        data: &Record,
        filter: &Filter,
    ) -> Result<Vec<Record>> {
        let _guard = self
            .enter(StoreMethod::Update, collection, Some(data), Some(filter))
            .await?;
        self.inner.update(collection, data, filter).await
    }

    async fn delete(&self, collection: &str, filter: &Filter) -> Result<Vec<Record>> {
        let _guard = self
            .enter(StoreMethod::Delete, collection, None, Some(filter))
            .await?;
        self.inner.delete(collection, filter).await
    }

    async fn select(&self, collection: &str, filter: &Filter) -> Result<Vec<Record>> {
        let _guard = self
            .enter(StoreMethod::Select, collection, None, Some(filter))
            .await?;
        self.inner.select(collection, filter).await
    }
}
