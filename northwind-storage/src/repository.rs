//! Repository facade over the entity store and the entity cache.
//!
//! The facade is the only component that talks to both. Reads come from the
//! cache alone. Writes go to the store first, and the cache is changed only
//! when the store reports exactly one affected row.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use northwind_core::{
    Customer, Employee, Entity, EntityKey, EntityKind, NorthwindError, NorthwindResult,
    RepositoryConfig, StorageError, ValidationError,
};
use thiserror::Error;
use tracing::{debug, warn};

use crate::cache::EntityCache;
use crate::store::EntityStore;

// ============================================================================
// ERRORS
// ============================================================================

/// Failures reported by the repository facade.
///
/// "Not found" on a read is not an error: `retrieve` returns `Ok(None)`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    /// Malformed input, detected before any store or cache access.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The identifier is not in the cache.
    #[error("{kind:?} with id {id} not found")]
    NotFound { kind: EntityKind, id: String },

    /// The store write did not affect exactly one row. The cache was not
    /// touched.
    #[error("Store write for {kind:?} with id {id} had no effect: {reason}")]
    PersistenceConflict {
        kind: EntityKind,
        id: String,
        /// `None` when the store call failed or timed out.
        rows_affected: Option<u64>,
        reason: String,
    },

    /// The store write succeeded but another writer changed the cache entry
    /// first. The entry has been re-read from the store.
    #[error("Cache update for {kind:?} with id {id} lost to a concurrent writer")]
    CacheRaceLoss { kind: EntityKind, id: String },

    /// The snapshot read that populates the cache failed.
    #[error("Failed to initialize {kind:?} cache: {source}")]
    Initialization {
        kind: EntityKind,
        #[source]
        source: NorthwindError,
    },
}

/// Result type alias for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

// ============================================================================
// REPOSITORY
// ============================================================================

/// Uniform CRUD facade for one entity kind.
///
/// A repository is cheap: it holds a shared handle to the process-wide cache
/// and a per-request store handle. Build one per unit of work.
pub struct Repository<E, S>
where
    E: Entity,
    S: EntityStore<E> + ?Sized,
{
    cache: Arc<EntityCache<E>>,
    store: Arc<S>,
    config: RepositoryConfig,
}

/// Repository over the customers table.
pub type CustomerRepository<S> = Repository<Customer, S>;

/// Repository over the employees table.
pub type EmployeeRepository<S> = Repository<Employee, S>;

impl<E, S> Repository<E, S>
where
    E: Entity,
    S: EntityStore<E> + ?Sized,
{
    /// Create a repository, populating `cache` from the store if this is the
    /// first repository built over it.
    ///
    /// Concurrent first constructions share one snapshot read.
    pub async fn new(
        cache: Arc<EntityCache<E>>,
        store: Arc<S>,
        config: RepositoryConfig,
    ) -> RepositoryResult<Self> {
        config
            .validate()
            .map_err(|source| RepositoryError::Initialization {
                kind: E::KIND,
                source,
            })?;

        if !cache.is_initialized() {
            let loader_store = Arc::clone(&store);
            let timeout = config.store_timeout;
            let performed = cache
                .initialize_with(move || async move {
                    bounded(timeout, loader_store.list_all()).await
                })
                .await
                .map_err(|source| {
                    warn!(kind = %E::KIND, error = %source, "entity cache initialization failed");
                    RepositoryError::Initialization {
                        kind: E::KIND,
                        source,
                    }
                })?;
            if performed {
                debug!(kind = %E::KIND, "repository performed cache initialization");
            }
        }

        Ok(Self {
            cache,
            store,
            config,
        })
    }

    /// Get a reference to the cache.
    pub fn cache(&self) -> &EntityCache<E> {
        &self.cache
    }

    /// Get the repository configuration.
    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    // ========================================================================
    // READS (cache only)
    // ========================================================================

    /// All records, ordered by identifier. Never touches the store.
    pub fn retrieve_all(&self) -> Vec<Arc<E>> {
        self.cache.get_all()
    }

    /// Records whose country matches exactly. A blank country returns all
    /// records.
    pub fn retrieve_by_country(&self, country: &str) -> Vec<Arc<E>> {
        if country.trim().is_empty() {
            return self.retrieve_all();
        }
        self.cache
            .get_all()
            .into_iter()
            .filter(|entity| entity.country() == Some(country))
            .collect()
    }

    /// One record by identifier, in any casing. Never touches the store.
    pub fn retrieve(&self, id: &str) -> RepositoryResult<Option<Arc<E>>> {
        let key = EntityKey::new(E::KIND, id)?;
        Ok(self.cache.get(&key))
    }

    // ========================================================================
    // WRITES (store first, then cache)
    // ========================================================================

    /// Persist a new record and add it to the cache.
    pub async fn create(&self, mut entity: E) -> RepositoryResult<Arc<E>> {
        let key = entity.normalize()?;

        let (mut persisted, affected) = self
            .store_call(&key, "create", self.store.add(&entity))
            .await?;
        self.expect_single_row(&key, "create", affected)?;

        persisted.assign_key(&key);
        match self.cache.upsert(&key, persisted) {
            Ok(cached) => Ok(cached),
            Err(_) => Err(self.reconcile(&key).await),
        }
    }

    /// Persist a changed record and swap it into the cache.
    ///
    /// `id` and the record's embedded identifier must name the same record
    /// after normalization. A record absent from the cache is
    /// [`RepositoryError::NotFound`] and the store is not called. The cache
    /// entry is replaced only if no other writer replaced it since this call
    /// observed it.
    pub async fn update(&self, id: &str, mut entity: E) -> RepositoryResult<Arc<E>> {
        let key = EntityKey::new(E::KIND, id)?;
        let body_key = entity.normalize()?;
        if key != body_key {
            return Err(ValidationError::IdMismatch {
                path_id: key.into_inner(),
                body_id: body_key.into_inner(),
            }
            .into());
        }

        let observed = self.cache.peek(&key).ok_or_else(|| RepositoryError::NotFound {
            kind: E::KIND,
            id: key.to_string(),
        })?;

        let affected = self
            .store_call(&key, "update", self.store.update(&entity))
            .await?;
        self.expect_single_row(&key, "update", affected)?;

        match self.cache.compare_and_swap(&key, Some(&observed), entity) {
            Ok(cached) => Ok(cached),
            Err(_) => Err(self.reconcile(&key).await),
        }
    }

    /// Delete a record from the store and then from the cache.
    ///
    /// Presence is checked in the cache first; an absent record is
    /// [`RepositoryError::NotFound`] and the store is not called. The cache
    /// entry is removed only if no other writer replaced it in the meantime.
    pub async fn delete(&self, id: &str) -> RepositoryResult<bool> {
        let key = EntityKey::new(E::KIND, id)?;
        let observed = self.cache.peek(&key).ok_or_else(|| RepositoryError::NotFound {
            kind: E::KIND,
            id: key.to_string(),
        })?;

        let affected = self
            .store_call(&key, "delete", self.store.remove(&key))
            .await?;
        self.expect_single_row(&key, "delete", affected)?;

        if self.cache.remove_if_current(&key, &observed) {
            Ok(true)
        } else {
            Err(self.reconcile(&key).await)
        }
    }

    // ========================================================================
    // HELPERS
    // ========================================================================

    /// Run a store call under the configured timeout. Any failure, including
    /// the timeout, is a write with no effect.
    async fn store_call<T>(
        &self,
        key: &EntityKey,
        operation: &'static str,
        call: impl Future<Output = NorthwindResult<T>>,
    ) -> RepositoryResult<T> {
        bounded(self.config.store_timeout, call)
            .await
            .map_err(|err| {
                warn!(kind = %E::KIND, id = %key, operation, error = %err, "store call failed");
                RepositoryError::PersistenceConflict {
                    kind: E::KIND,
                    id: key.to_string(),
                    rows_affected: None,
                    reason: err.to_string(),
                }
            })
    }

    fn expect_single_row(
        &self,
        key: &EntityKey,
        operation: &'static str,
        affected: u64,
    ) -> RepositoryResult<()> {
        if affected == 1 {
            return Ok(());
        }
        warn!(kind = %E::KIND, id = %key, operation, affected, "store write had no effect");
        Err(RepositoryError::PersistenceConflict {
            kind: E::KIND,
            id: key.to_string(),
            rows_affected: Some(affected),
            reason: format!("expected exactly one row affected, store reported {}", affected),
        })
    }

    /// After losing a cache swap, re-read the row from the store so the
    /// cache matches what was persisted last, then report the lost race.
    ///
    /// The re-read row is installed against the entry seen before the read.
    /// If a newer writer changed the entry during the read, its value stays.
    async fn reconcile(&self, key: &EntityKey) -> RepositoryError {
        let current = self.cache.peek(key);
        match bounded(self.config.store_timeout, self.store.find(key)).await {
            Ok(Some(mut row)) => {
                row.assign_key(key);
                if self.cache.compare_and_swap(key, current.as_ref(), row).is_err() {
                    debug!(kind = %E::KIND, id = %key, "newer writer reconciled the cache entry first");
                }
            }
            Ok(None) => {
                if let Some(current) = current {
                    self.cache.remove_if_current(key, &current);
                }
            }
            Err(err) => {
                warn!(kind = %E::KIND, id = %key, error = %err, "could not reconcile cache entry with store");
            }
        }
        RepositoryError::CacheRaceLoss {
            kind: E::KIND,
            id: key.to_string(),
        }
    }
}

impl<E, S> Clone for Repository<E, S>
where
    E: Entity,
    S: EntityStore<E> + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

/// Await `call`, turning an elapsed timeout into an unavailable store.
async fn bounded<T>(
    timeout: Duration,
    call: impl Future<Output = NorthwindResult<T>>,
) -> NorthwindResult<T> {
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(StorageError::Unavailable {
            reason: format!("store call timed out after {:?}", timeout),
        }
        .into()),
    }
}

// ============================================================================
// TESTS
// ============================================================================
