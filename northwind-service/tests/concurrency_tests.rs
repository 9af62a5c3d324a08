//! Concurrency tests for the entity cache and repository facade
//!
//! Races run on the multi-threaded runtime. Store latency keeps every
//! contender in flight at the same time. Fixed interleavings use a store
//! whose calls park at gates the test opens.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use northwind_test_utils::assertions::*;
use northwind_test_utils::fixtures::*;
use northwind_test_utils::*;
use tokio::sync::Notify;

const CONTENDERS: usize = 16;

fn key(raw: &str) -> EntityKey {
    EntityKey::new(EntityKind::Customer, raw).unwrap()
}

// ============================================================================
// INITIALIZATION
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_constructions_load_snapshot_once() {
    let store = scenario_customer_store();
    store.set_latency(Duration::from_millis(100));
    let cache = Arc::new(EntityCache::<Customer>::new());

    let handles: Vec<_> = (0..CONTENDERS)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                Repository::new(cache, store, RepositoryConfig::default())
                    .await
                    .map(|repo| repo.retrieve_all().len())
            })
        })
        .collect();

    for result in join_all(handles).await {
        assert_eq!(result.unwrap().unwrap(), 2);
    }

    assert_eq!(store.list_all_calls(), 1);
    assert_eq!(cache.stats().snapshot_loads(), 1);
    assert_eq!(cache.loaded_rows(), Some(2));
    assert_eq!(cache.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failed_initialization_is_shared_then_retried() {
    let store = scenario_customer_store();
    store.set_unavailable(true);
    let cache = Arc::new(EntityCache::<Customer>::new());

    let first = Repository::new(Arc::clone(&cache), Arc::clone(&store), RepositoryConfig::default()).await;
    assert!(matches!(first, Err(RepositoryError::Initialization { .. })));
    assert!(!cache.is_initialized());
    assert!(cache.is_empty());

    store.set_unavailable(false);
    let repos = join_all((0..4).map(|_| {
        Repository::new(Arc::clone(&cache), Arc::clone(&store), RepositoryConfig::default())
    }))
    .await;
    assert!(repos.iter().all(|r| r.is_ok()));
    assert_eq!(store.list_all_calls(), 2);
}

// ============================================================================
// CREATE
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_create_same_id_has_one_winner() {
    let store = scenario_customer_store();
    let repo = Repository::new(
        Arc::new(EntityCache::new()),
        Arc::clone(&store),
        RepositoryConfig::default(),
    )
    .await
    .unwrap();
    store.set_latency(Duration::from_millis(50));

    let handles: Vec<_> = (0..CONTENDERS)
        .map(|i| {
            let repo = repo.clone();
            tokio::spawn(async move {
                repo.create(Customer::new("bergs", format!("Contender {}", i)))
                    .await
            })
        })
        .collect();

    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    for result in results.iter().filter(|r| r.is_err()) {
        assert_persistence_conflict(result);
    }

    let cached = repo.retrieve("BERGS").unwrap().unwrap();
    assert_eq!(cached.company_name, winners[0].company_name);
    assert_eq!(store.row(&key("BERGS")).unwrap().company_name, cached.company_name);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_create_distinct_ids_all_succeed() {
    let store = Arc::new(InMemoryEntityStore::<Customer>::new());
    let repo = Repository::new(
        Arc::new(EntityCache::new()),
        Arc::clone(&store),
        RepositoryConfig::default(),
    )
    .await
    .unwrap();

    let handles: Vec<_> = (0..CONTENDERS)
        .map(|i| {
            let repo = repo.clone();
            tokio::spawn(async move {
                repo.create(Customer::new(format!("C{:04}", i), "Distinct")).await
            })
        })
        .collect();

    for result in join_all(handles).await {
        assert!(result.unwrap().is_ok());
    }
    assert_eq!(repo.retrieve_all().len(), CONTENDERS);
    assert_eq!(store.len(), CONTENDERS);
}

// ============================================================================
// UPDATE
// ============================================================================

/// Store that lets another writer land between its own write and the
/// caller's cache swap.
struct InterleavingStore {
    inner: InMemoryEntityStore<Customer>,
    cache: Arc<EntityCache<Customer>>,
    interloper: Customer,
}

#[async_trait]
impl EntityStore<Customer> for InterleavingStore {
    async fn add(&self, entity: &Customer) -> NorthwindResult<(Customer, u64)> {
        self.inner.add(entity).await
    }

    async fn update(&self, entity: &Customer) -> NorthwindResult<u64> {
        let affected = self.inner.update(entity).await?;
        // The other writer persists after us and wins the cache.
        self.inner.update(&self.interloper).await?;
        let key = EntityKey::new(EntityKind::Customer, &self.interloper.customer_id)?;
        self.cache.upsert(&key, self.interloper.clone())?;
        Ok(affected)
    }

    async fn remove(&self, key: &EntityKey) -> NorthwindResult<u64> {
        self.inner.remove(key).await
    }

    async fn find(&self, key: &EntityKey) -> NorthwindResult<Option<Customer>> {
        self.inner.find(key).await
    }

    async fn list_all(&self) -> NorthwindResult<Vec<Customer>> {
        self.inner.list_all().await
    }
}

#[tokio::test]
async fn test_update_race_loser_is_told_and_cache_matches_store() {
    let cache = Arc::new(EntityCache::new());
    let interloper = Customer::new("ALFKI", "Alfreds (other writer)");
    let store = Arc::new(InterleavingStore {
        inner: InMemoryEntityStore::with_entities(scenario_customers()).unwrap(),
        cache: Arc::clone(&cache),
        interloper: interloper.clone(),
    });
    let repo = Repository::new(Arc::clone(&cache), Arc::clone(&store), RepositoryConfig::default())
        .await
        .unwrap();

    let result = repo
        .update("ALFKI", Customer::new("ALFKI", "Alfreds (this writer)"))
        .await;
    assert_cache_race_loss(&result);

    let cached = repo.retrieve("ALFKI").unwrap().unwrap();
    assert_eq!(*cached, interloper);
    assert_eq!(store.inner.row(&key("ALFKI")).unwrap(), interloper);
    assert_eq!(cache.stats().races_lost(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_updates_leave_cache_equal_to_store() {
    let store = scenario_customer_store();
    let repo = Repository::new(
        Arc::new(EntityCache::new()),
        Arc::clone(&store),
        RepositoryConfig::default(),
    )
    .await
    .unwrap();
    store.set_latency(Duration::from_millis(100));

    let handles: Vec<_> = (0..CONTENDERS)
        .map(|i| {
            let repo = repo.clone();
            tokio::spawn(async move {
                repo.update("alfki", Customer::new("ALFKI", format!("Writer {}", i)))
                    .await
            })
        })
        .collect();

    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    // Every contender observed the same entry, so only one swap can win.
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    for result in results.iter().filter(|r| r.is_err()) {
        assert_cache_race_loss(result);
    }

    let cached = repo.retrieve("ALFKI").unwrap().unwrap();
    assert_eq!(Some((*cached).clone()), store.row(&key("ALFKI")));
}

// ============================================================================
// CROSS-OPERATION INTERLEAVINGS
// ============================================================================

/// Parks the first call that reaches it until the test releases it.
#[derive(Default)]
struct Gate {
    armed: AtomicBool,
    reached: Notify,
    release: Notify,
}

impl Gate {
    fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    async fn pass(&self) {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.reached.notify_one();
            self.release.notified().await;
        }
    }

    async fn wait_reached(&self) {
        self.reached.notified().await;
    }

    fn open(&self) {
        self.release.notify_one();
    }
}

/// Store whose calls can be parked at fixed points.
struct GatedStore {
    inner: InMemoryEntityStore<Customer>,
    /// Before the row is written.
    update_gate: Gate,
    /// After the row is removed.
    remove_gate: Gate,
    /// After the row is read.
    find_gate: Gate,
}

impl GatedStore {
    fn new(rows: Vec<Customer>) -> Self {
        Self {
            inner: InMemoryEntityStore::with_entities(rows).unwrap(),
            update_gate: Gate::default(),
            remove_gate: Gate::default(),
            find_gate: Gate::default(),
        }
    }
}

#[async_trait]
impl EntityStore<Customer> for GatedStore {
    async fn add(&self, entity: &Customer) -> NorthwindResult<(Customer, u64)> {
        self.inner.add(entity).await
    }

    async fn update(&self, entity: &Customer) -> NorthwindResult<u64> {
        self.update_gate.pass().await;
        self.inner.update(entity).await
    }

    async fn remove(&self, key: &EntityKey) -> NorthwindResult<u64> {
        let affected = self.inner.remove(key).await?;
        self.remove_gate.pass().await;
        Ok(affected)
    }

    async fn find(&self, key: &EntityKey) -> NorthwindResult<Option<Customer>> {
        let row = self.inner.find(key).await?;
        self.find_gate.pass().await;
        Ok(row)
    }

    async fn list_all(&self) -> NorthwindResult<Vec<Customer>> {
        self.inner.list_all().await
    }
}

async fn gated_repository() -> (CustomerRepository<GatedStore>, Arc<GatedStore>) {
    let store = Arc::new(GatedStore::new(scenario_customers()));
    let repo = Repository::new(
        Arc::new(EntityCache::new()),
        Arc::clone(&store),
        RepositoryConfig::default(),
    )
    .await
    .unwrap();
    (repo, store)
}

#[tokio::test]
async fn test_create_during_delete_keeps_recreated_row_cached() {
    let (repo, store) = gated_repository().await;
    store.remove_gate.arm();

    let deleting = tokio::spawn({
        let repo = repo.clone();
        async move { repo.delete("ALFKI").await }
    });
    store.remove_gate.wait_reached().await;

    // The row is gone from the store but still cached; recreate it.
    let created = repo
        .create(Customer::new("ALFKI", "Recreated"))
        .await
        .unwrap();
    assert_eq!(created.company_name, "Recreated");

    store.remove_gate.open();
    let deleted = deleting.await.unwrap();
    assert_cache_race_loss(&deleted);

    let stored = store.inner.row(&key("ALFKI")).unwrap();
    let cached = repo.retrieve("ALFKI").unwrap().unwrap();
    assert_eq!(stored.company_name, "Recreated");
    assert_eq!(*cached, stored);
}

#[tokio::test]
async fn test_stale_reconcile_does_not_overwrite_newer_update() {
    let (repo, store) = gated_repository().await;
    store.update_gate.arm();
    store.find_gate.arm();

    // A observes the original entry and parks before its store write.
    let writer_a = tokio::spawn({
        let repo = repo.clone();
        async move { repo.update("ALFKI", Customer::new("ALFKI", "A")).await }
    });
    store.update_gate.wait_reached().await;

    // B completes a full update while A is parked.
    let b = repo.update("ALFKI", Customer::new("ALFKI", "B")).await.unwrap();
    assert_eq!(b.company_name, "B");

    // A writes the store, loses its swap and parks after re-reading "A".
    store.update_gate.open();
    store.find_gate.wait_reached().await;

    // D completes a full update while A holds its stale re-read.
    let d = repo.update("ALFKI", Customer::new("ALFKI", "D")).await.unwrap();
    assert_eq!(d.company_name, "D");

    store.find_gate.open();
    let a = writer_a.await.unwrap();
    assert_cache_race_loss(&a);

    let stored = store.inner.row(&key("ALFKI")).unwrap();
    let cached = repo.retrieve("ALFKI").unwrap().unwrap();
    assert_eq!(stored.company_name, "D");
    assert_eq!(*cached, stored);
}

// ============================================================================
// TIMEOUTS AND NO-EFFECT WRITES
// ============================================================================

#[tokio::test]
async fn test_create_timeout_leaves_cache_and_store_untouched() {
    let store = scenario_customer_store();
    let repo = Repository::new(
        Arc::new(EntityCache::new()),
        Arc::clone(&store),
        fast_timeout_config(),
    )
    .await
    .unwrap();
    store.set_latency(Duration::from_millis(500));

    let result = repo.create(new_customer()).await;
    match result {
        Err(RepositoryError::PersistenceConflict {
            rows_affected: None,
            reason,
            ..
        }) => assert!(reason.contains("timed out"), "unexpected reason: {}", reason),
        other => panic!("expected timeout conflict, got {:?}", other),
    }
    assert!(repo.retrieve("BERGS").unwrap().is_none());

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(store.row(&key("BERGS")).is_none());
}

#[tokio::test]
async fn test_delete_absent_never_reaches_store() {
    let store = scenario_customer_store();
    let repo = Repository::new(
        Arc::new(EntityCache::new()),
        Arc::clone(&store),
        RepositoryConfig::default(),
    )
    .await
    .unwrap();

    assert_not_found(&repo.delete("bergs").await, EntityKind::Customer);
    assert_eq!(store.write_calls(), 0);
    assert_eq!(store.len(), 2);
}
