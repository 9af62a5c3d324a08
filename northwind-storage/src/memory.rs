//! In-memory entity store.
//!
//! Behaves like a single relational table keyed by normalized identifier:
//! duplicate inserts fail, and updates or deletes of a missing row affect
//! zero rows. Fault injection switches let tests force the no-effect and
//! unavailable paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use northwind_core::{Entity, EntityKey, NorthwindResult, StorageError};

use crate::store::EntityStore;

/// In-memory store for one entity kind.
#[derive(Debug)]
pub struct InMemoryEntityStore<E: Entity> {
    rows: RwLock<HashMap<EntityKey, E>>,
    latency: Mutex<Duration>,
    zero_rows: AtomicBool,
    unavailable: AtomicBool,
    list_all_calls: AtomicU64,
    write_calls: AtomicU64,
}

impl<E: Entity> Default for InMemoryEntityStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> InMemoryEntityStore<E> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            latency: Mutex::new(Duration::ZERO),
            zero_rows: AtomicBool::new(false),
            unavailable: AtomicBool::new(false),
            list_all_calls: AtomicU64::new(0),
            write_calls: AtomicU64::new(0),
        }
    }

    /// Create a store pre-populated with `entities`.
    pub fn with_entities(entities: impl IntoIterator<Item = E>) -> NorthwindResult<Self> {
        let store = Self::new();
        store.seed(entities)?;
        Ok(store)
    }

    /// Insert rows directly, bypassing write accounting and fault injection.
    /// Existing rows with the same identifier are overwritten.
    pub fn seed(&self, entities: impl IntoIterator<Item = E>) -> NorthwindResult<()> {
        let mut rows = self.rows.write().map_err(|_| StorageError::LockPoisoned)?;
        for mut entity in entities {
            let key = entity.normalize()?;
            rows.insert(key, entity);
        }
        Ok(())
    }

    /// Make every subsequent write report zero rows affected.
    pub fn force_zero_rows(&self, enabled: bool) {
        self.zero_rows.store(enabled, Ordering::SeqCst);
    }

    /// Make every subsequent call fail with [`StorageError::Unavailable`].
    pub fn set_unavailable(&self, enabled: bool) {
        self.unavailable.store(enabled, Ordering::SeqCst);
    }

    /// Delay applied before every call.
    pub fn set_latency(&self, latency: Duration) {
        if let Ok(mut guard) = self.latency.lock() {
            *guard = latency;
        }
    }

    /// Number of `list_all` calls served so far.
    pub fn list_all_calls(&self) -> u64 {
        self.list_all_calls.load(Ordering::SeqCst)
    }

    /// Number of add/update/remove calls served so far.
    pub fn write_calls(&self) -> u64 {
        self.write_calls.load(Ordering::SeqCst)
    }

    /// Number of rows currently stored.
    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or(0)
    }

    /// Returns `true` if the store holds no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read a row without going through the async trait.
    pub fn row(&self, key: &EntityKey) -> Option<E> {
        self.rows.read().ok().and_then(|rows| rows.get(key).cloned())
    }

    async fn enter(&self) -> NorthwindResult<()> {
        let latency = self.latency.lock().map(|g| *g).unwrap_or(Duration::ZERO);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable {
                reason: "store marked unavailable".to_string(),
            }
            .into());
        }
        Ok(())
    }

    async fn enter_write(&self) -> NorthwindResult<bool> {
        self.enter().await?;
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.zero_rows.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl<E: Entity> EntityStore<E> for InMemoryEntityStore<E> {
    async fn add(&self, entity: &E) -> NorthwindResult<(E, u64)> {
        if self.enter_write().await? {
            return Ok((entity.clone(), 0));
        }
        let mut entity = entity.clone();
        let key = entity.normalize()?;
        let mut rows = self.rows.write().map_err(|_| StorageError::LockPoisoned)?;
        if rows.contains_key(&key) {
            return Err(StorageError::InsertFailed {
                kind: E::KIND,
                id: key.into_inner(),
                reason: "duplicate key".to_string(),
            }
            .into());
        }
        rows.insert(key, entity.clone());
        Ok((entity, 1))
    }

    async fn update(&self, entity: &E) -> NorthwindResult<u64> {
        if self.enter_write().await? {
            return Ok(0);
        }
        let mut entity = entity.clone();
        let key = entity.normalize()?;
        let mut rows = self.rows.write().map_err(|_| StorageError::LockPoisoned)?;
        match rows.get_mut(&key) {
            Some(row) => {
                *row = entity;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn remove(&self, key: &EntityKey) -> NorthwindResult<u64> {
        if self.enter_write().await? {
            return Ok(0);
        }
        let mut rows = self.rows.write().map_err(|_| StorageError::LockPoisoned)?;
        Ok(rows.remove(key).map_or(0, |_| 1))
    }

    async fn find(&self, key: &EntityKey) -> NorthwindResult<Option<E>> {
        self.enter().await?;
        let rows = self.rows.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(rows.get(key).cloned())
    }

    async fn list_all(&self) -> NorthwindResult<Vec<E>> {
        self.list_all_calls.fetch_add(1, Ordering::SeqCst);
        self.enter().await?;
        let rows = self.rows.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(rows.values().cloned().collect())
    }
}

// ============================================================================
// TESTS
// ============================================================================
