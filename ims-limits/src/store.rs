use crate::{counter::LimitCounter, key::LimitKey};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Separates the Limit Service's compare-and-swap contract from its backing store (§6:
/// "a key-value store for Limit Service counters (CAS-capable)"), the same way
/// [`ims_position::SnapshotStore`] separates checkpoint persistence from its backing object
/// store — grounded on the teacher's `ExecutionClient` interface/impl split.
#[async_trait]
pub trait LimitCounterStore: Send + Sync {
    async fn load(&self, key: &LimitKey) -> LimitCounter;

    /// Installs `updated` only if the stored counter's version still equals `expected_version`.
    /// Returns `true` on success, `false` on a lost race (the caller retries with a fresh read).
    async fn compare_and_swap(&self, key: LimitKey, expected_version: u64, updated: LimitCounter) -> bool;
}

/// Default in-memory [`LimitCounterStore`].
#[derive(Debug, Default)]
pub struct InMemoryLimitCounterStore {
    counters: Mutex<HashMap<LimitKey, LimitCounter>>,
}

impl InMemoryLimitCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LimitCounterStore for InMemoryLimitCounterStore {
    async fn load(&self, key: &LimitKey) -> LimitCounter {
        self.counters.lock().get(key).copied().unwrap_or_else(LimitCounter::flat)
    }

    async fn compare_and_swap(&self, key: LimitKey, expected_version: u64, updated: LimitCounter) -> bool {
        let mut counters = self.counters.lock();
        let current = counters.entry(key).or_insert_with(LimitCounter::flat);
        if current.version != expected_version {
            return false;
        }
        *current = updated;
        true
    }
}
