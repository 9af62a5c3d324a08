//! DashMap-backed entity cache.

use std::future::Future;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use northwind_core::{CacheConfig, CacheError, Entity, EntityKey, NorthwindError, NorthwindResult};
use tokio::sync::OnceCell;
use tracing::{debug, info, trace, warn};

use super::stats::CacheStats;

/// Process-wide mirror of one entity kind.
///
/// Values are stored as `Arc<E>`. Every successful write installs a fresh
/// `Arc`, so pointer identity doubles as the version a writer observed.
///
/// ## Thread Safety
///
/// All operations are synchronous and safe to call from any number of
/// threads. `DashMap` locks at the shard level; iteration visits one shard
/// at a time and never blocks the whole map.
#[derive(Debug)]
pub struct EntityCache<E: Entity> {
    entries: DashMap<EntityKey, Arc<E>>,
    /// Set once, to the number of rows loaded by the snapshot population.
    init: OnceCell<usize>,
    stats: CacheStats,
}

impl<E: Entity> Default for EntityCache<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> EntityCache<E> {
    /// Create an empty, uninitialized cache.
    pub fn new() -> Self {
        Self::with_config(&CacheConfig::default())
    }

    /// Create an empty, uninitialized cache sized from `config`.
    pub fn with_config(config: &CacheConfig) -> Self {
        Self {
            entries: DashMap::with_capacity(config.initial_capacity),
            init: OnceCell::new(),
            stats: CacheStats::new(),
        }
    }

    /// Get cache statistics.
    #[inline]
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Whether the snapshot population has completed.
    pub fn is_initialized(&self) -> bool {
        self.init.initialized()
    }

    /// Number of rows the snapshot population loaded, once it has run.
    pub fn loaded_rows(&self) -> Option<usize> {
        self.init.get().copied()
    }

    // ========================================================================
    // INITIALIZATION
    // ========================================================================

    /// Populate the cache from a full snapshot.
    ///
    /// Runs at most once per cache. Returns `true` only for the call that
    /// performed the population; every other call, concurrent or later, is a
    /// no-op that returns `false` after the population has finished.
    pub async fn initialize(&self, snapshot: Vec<E>) -> bool {
        let mut performed = false;
        self.init
            .get_or_init(|| {
                performed = true;
                std::future::ready(self.populate(snapshot))
            })
            .await;
        performed
    }

    /// Populate the cache from `loader`, running it at most once.
    ///
    /// Concurrent callers wait for the in-flight load instead of starting
    /// their own. If the loader fails the cache stays uninitialized and the
    /// error is returned; a later call may try again.
    pub async fn initialize_with<F, Fut>(&self, loader: F) -> NorthwindResult<bool>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = NorthwindResult<Vec<E>>>,
    {
        let mut performed = false;
        self.init
            .get_or_try_init(|| async {
                let snapshot = loader().await?;
                performed = true;
                Ok::<_, NorthwindError>(self.populate(snapshot))
            })
            .await?;
        Ok(performed)
    }

    fn populate(&self, snapshot: Vec<E>) -> usize {
        let mut loaded = 0;
        for mut entity in snapshot {
            match entity.normalize() {
                Ok(key) => {
                    if self.entries.insert(key.clone(), Arc::new(entity)).is_some() {
                        warn!(kind = %E::KIND, id = %key, "snapshot rows collide after id normalization; keeping the later row");
                    } else {
                        loaded += 1;
                    }
                }
                Err(err) => {
                    warn!(kind = %E::KIND, error = %err, "skipping snapshot row with invalid id");
                }
            }
        }
        self.stats.record_snapshot_load();
        info!(kind = %E::KIND, rows = loaded, "entity cache populated from store snapshot");
        loaded
    }

    // ========================================================================
    // READS
    // ========================================================================

    /// Look up an entry, recording a hit or miss.
    pub fn get(&self, key: &EntityKey) -> Option<Arc<E>> {
        // Clone the Arc and drop the shard guard immediately.
        let result = self.peek(key);

        if result.is_some() {
            self.stats.record_hit();
            trace!(kind = %E::KIND, id = %key, "cache hit");
        } else {
            self.stats.record_miss();
            trace!(kind = %E::KIND, id = %key, "cache miss");
        }

        result
    }

    /// Look up an entry without touching statistics.
    pub fn peek(&self, key: &EntityKey) -> Option<Arc<E>> {
        self.entries.get(key).map(|r| Arc::clone(r.value()))
    }

    /// Check if an entry exists.
    pub fn contains(&self, key: &EntityKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Current values, ordered by identifier.
    ///
    /// Shards are read one at a time, so the result reflects each entry as
    /// of the moment its shard was visited.
    pub fn get_all(&self) -> Vec<Arc<E>> {
        let mut all: Vec<(EntityKey, Arc<E>)> = self
            .entries
            .iter()
            .map(|r| (r.key().clone(), Arc::clone(r.value())))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all.into_iter().map(|(_, value)| value).collect()
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // ========================================================================
    // WRITES
    // ========================================================================

    /// Insert `entity` if the key is vacant, otherwise replace the current
    /// entry by compare-and-swap against the value seen at the time of the
    /// call.
    pub fn upsert(&self, key: &EntityKey, entity: E) -> Result<Arc<E>, CacheError> {
        let observed = match self.entries.entry(key.clone()) {
            Entry::Vacant(slot) => {
                let value = Arc::new(entity);
                slot.insert(Arc::clone(&value));
                self.stats.record_write();
                debug!(kind = %E::KIND, id = %key, "cache insert");
                return Ok(value);
            }
            Entry::Occupied(slot) => Arc::clone(slot.get()),
        };
        self.compare_and_swap(key, Some(&observed), entity)
    }

    /// Replace the entry for `key` only if it is still `expected`.
    ///
    /// `expected == None` means the writer observed no entry, and the swap
    /// succeeds only if the key is still vacant. `Some(arc)` succeeds only if
    /// the current entry is that very `Arc`. The loser gets
    /// [`CacheError::RaceLost`] and the cache is left as the winner wrote it.
    pub fn compare_and_swap(
        &self,
        key: &EntityKey,
        expected: Option<&Arc<E>>,
        entity: E,
    ) -> Result<Arc<E>, CacheError> {
        let value = Arc::new(entity);
        match (self.entries.entry(key.clone()), expected) {
            (Entry::Vacant(slot), None) => {
                slot.insert(Arc::clone(&value));
            }
            (Entry::Occupied(mut slot), Some(expected)) if Arc::ptr_eq(slot.get(), expected) => {
                slot.insert(Arc::clone(&value));
            }
            _ => {
                self.stats.record_race_lost();
                warn!(kind = %E::KIND, id = %key, "cache compare-and-swap lost to a concurrent writer");
                return Err(CacheError::RaceLost {
                    kind: E::KIND,
                    id: key.to_string(),
                });
            }
        }
        self.stats.record_write();
        debug!(kind = %E::KIND, id = %key, "cache swap");
        Ok(value)
    }

    /// Remove the entry for `key`. Returns whether an entry was removed.
    pub fn remove(&self, key: &EntityKey) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.stats.record_removal();
            debug!(kind = %E::KIND, id = %key, "cache remove");
        }
        removed
    }

    /// Remove the entry for `key` only if it is still `expected`.
    ///
    /// Returns `false` and leaves the cache alone if the entry is gone or was
    /// replaced by another writer.
    pub fn remove_if_current(&self, key: &EntityKey, expected: &Arc<E>) -> bool {
        let removed = self
            .entries
            .remove_if(key, |_, current| Arc::ptr_eq(current, expected))
            .is_some();
        if removed {
            self.stats.record_removal();
            debug!(kind = %E::KIND, id = %key, "cache conditional remove");
        } else {
            self.stats.record_race_lost();
            warn!(kind = %E::KIND, id = %key, "cache conditional remove lost to a concurrent writer");
        }
        removed
    }
}
