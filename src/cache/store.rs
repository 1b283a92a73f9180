//! Cache store boundary and the default in-memory backend

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::config::CacheConfig;
use crate::error::{Error, Result};
use super::{CacheEntry, CacheKey};

/// Persistence boundary for cached responses.
///
/// Any conforming backend (in-memory, on-disk, remote) may be substituted.
/// Implementations must be safe under concurrent use from unrelated
/// in-flight requests; no cross-key ordering is guaranteed, and concurrent
/// puts for the same key resolve last-write-wins. That race is acceptable by
/// contract: a stored entry is always revalidated before reuse, and a miss is
/// always a correct (merely costlier) outcome.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up the entry for a key.
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>>;

    /// Store an entry, replacing any existing entry for the key.
    async fn put(&self, key: CacheKey, entry: CacheEntry) -> Result<()>;

    /// Remove the entry for a key, if present.
    async fn remove(&self, key: &CacheKey) -> Result<()>;

    /// Whether an entry exists for a key.
    async fn exists(&self, key: &CacheKey) -> Result<bool>;

    /// Remove every entry.
    ///
    /// # Errors
    ///
    /// Backends that cannot bulk-clear decline with [`Error::Unsupported`];
    /// that is a legitimate terminal failure, not a bug.
    async fn clear(&self) -> Result<()>;
}

struct Shelf {
    entries: HashMap<CacheKey, CacheEntry>,
    // Insertion order, for FIFO eviction once capacity is reached.
    order: VecDeque<CacheKey>,
}

/// Default in-memory [`CacheStore`] with bounded FIFO eviction.
///
/// Entries are evicted individually, oldest insertion first, once the
/// configured capacity is reached. Bulk [`clear`](CacheStore::clear) is not
/// supported by this backend.
pub struct InMemoryStore {
    shelf: RwLock<Shelf>,
    capacity: usize,
}

impl InMemoryStore {
    /// Create a store with the default capacity.
    pub fn new() -> Self {
        Self::with_config(&CacheConfig::default())
    }

    /// Create a store with an explicit configuration.
    pub fn with_config(config: &CacheConfig) -> Self {
        Self {
            shelf: RwLock::new(Shelf {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            // A zero capacity would make every put a no-op; keep at least one.
            capacity: config.capacity.max(1),
        }
    }

    /// Number of entries currently held.
    pub async fn len(&self) -> usize {
        self.shelf.read().await.entries.len()
    }

    /// Whether the store holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for InMemoryStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
        Ok(self.shelf.read().await.entries.get(key).cloned())
    }

    async fn put(&self, key: CacheKey, entry: CacheEntry) -> Result<()> {
        let mut shelf = self.shelf.write().await;
        if shelf.entries.contains_key(&key) {
            shelf.order.retain(|k| k != &key);
        } else if shelf.entries.len() >= self.capacity {
            if let Some(evicted) = shelf.order.pop_front() {
                shelf.entries.remove(&evicted);
                tracing::debug!(uri = evicted.uri(), "evicted cache entry at capacity");
            }
        }
        shelf.order.push_back(key.clone());
        shelf.entries.insert(key, entry);
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> Result<()> {
        let mut shelf = self.shelf.write().await;
        if shelf.entries.remove(key).is_some() {
            shelf.order.retain(|k| k != key);
        }
        Ok(())
    }

    async fn exists(&self, key: &CacheKey) -> Result<bool> {
        Ok(self.shelf.read().await.entries.contains_key(key))
    }

    async fn clear(&self) -> Result<()> {
        Err(Error::Unsupported(
            "the in-memory store evicts entries individually and cannot bulk-clear".into(),
        ))
    }
}
