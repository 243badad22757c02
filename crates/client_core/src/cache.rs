//! In-memory store of query results, keyed by [`QueryKey`].
//!
//! The store is an explicit object: construct one per process, hand it to the
//! query client, and call [`QueryStore::clear`] on teardown. Entries are kept
//! in recency order and the least recently used key is evicted once the store
//! grows past its capacity. An optional TTL expires entries lazily on read.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use indexmap::IndexMap;
use parking_lot::Mutex;
use shared::domain::{Person, PersonId};
use tracing::debug;

use crate::query::QueryKey;

pub const DEFAULT_CACHE_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    pub capacity: usize,
    pub ttl: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
            ttl: None,
        }
    }
}

struct CacheEntry {
    persons: Arc<Vec<Person>>,
    stored_at: Instant,
}

struct StoreState {
    entries: IndexMap<QueryKey, CacheEntry>,
    epoch: u64,
}

pub struct QueryStore {
    capacity: usize,
    ttl: Option<Duration>,
    inner: Mutex<StoreState>,
}

impl QueryStore {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            capacity: config.capacity.max(1),
            ttl: config.ttl,
            inner: Mutex::new(StoreState {
                entries: IndexMap::new(),
                epoch: 0,
            }),
        }
    }

    /// Bumped by every [`QueryStore::clear`]; lets late writers detect a teardown.
    pub fn epoch(&self) -> u64 {
        self.inner.lock().epoch
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.inner.lock().entries.contains_key(key)
    }

    pub fn get(&self, key: &QueryKey) -> Option<Arc<Vec<Person>>> {
        let mut state = self.inner.lock();
        let entry = state.entries.shift_remove(key)?;
        if self.is_expired(&entry) {
            debug!(operation = key.operation(), "cache entry expired");
            return None;
        }
        let persons = Arc::clone(&entry.persons);
        // Re-inserting moves the key to the most recently used end.
        state.entries.insert(key.clone(), entry);
        Some(persons)
    }

    pub fn insert(&self, key: QueryKey, persons: Arc<Vec<Person>>) {
        let mut state = self.inner.lock();
        self.insert_locked(&mut state, key, persons);
    }

    /// Inserts only if no [`QueryStore::clear`] happened since `epoch` was read.
    pub fn insert_if_epoch(&self, epoch: u64, key: QueryKey, persons: Arc<Vec<Person>>) -> bool {
        let mut state = self.inner.lock();
        if state.epoch != epoch {
            return false;
        }
        self.insert_locked(&mut state, key, persons);
        true
    }

    pub fn remove(&self, key: &QueryKey) -> bool {
        self.inner.lock().entries.shift_remove(key).is_some()
    }

    /// Most recent cached copy of the person with this id, if any entry holds one.
    pub fn find_person(&self, id: &PersonId) -> Option<Person> {
        let state = self.inner.lock();
        state
            .entries
            .values()
            .rev()
            .filter(|entry| !self.is_expired(entry))
            .find_map(|entry| entry.persons.iter().find(|person| person.id() == id))
            .cloned()
    }

    pub fn clear(&self) {
        let mut state = self.inner.lock();
        state.entries.clear();
        state.epoch += 1;
    }

    fn insert_locked(&self, state: &mut StoreState, key: QueryKey, persons: Arc<Vec<Person>>) {
        state.entries.shift_remove(&key);
        state.entries.insert(
            key,
            CacheEntry {
                persons,
                stored_at: Instant::now(),
            },
        );
        while state.entries.len() > self.capacity {
            if let Some((evicted, _)) = state.entries.shift_remove_index(0) {
                debug!(
                    operation = evicted.operation(),
                    variables = evicted.variables(),
                    "evicted least recently used cache entry"
                );
            }
        }
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        self.ttl
            .is_some_and(|ttl| entry.stored_at.elapsed() >= ttl)
    }
}

impl Default for QueryStore {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

#[cfg(test)]
#[path = "tests/cache_tests.rs"]
mod tests;
