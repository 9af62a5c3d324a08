//! Async store trait for the persistent entity collection.
//!
//! The repository facade treats the store as an opaque CRUD collaborator.
//! Every write reports how many rows it affected; the facade only touches the
//! cache when that count is exactly one.

use async_trait::async_trait;
use northwind_core::{Entity, EntityKey, NorthwindResult};

/// Persistent collection of one entity kind, keyed by normalized identifier.
///
/// Implementations own their own session/connection handling. A store handle
/// is expected to be cheap to create per request and is never cached by the
/// repository layer.
#[async_trait]
pub trait EntityStore<E: Entity>: Send + Sync {
    /// Insert a new row.
    ///
    /// Returns the entity as persisted and the number of rows affected.
    /// A duplicate key is reported as an error.
    async fn add(&self, entity: &E) -> NorthwindResult<(E, u64)>;

    /// Replace an existing row. Returns the number of rows affected.
    async fn update(&self, entity: &E) -> NorthwindResult<u64>;

    /// Delete a row. Returns the number of rows affected.
    async fn remove(&self, key: &EntityKey) -> NorthwindResult<u64>;

    /// Find a row by identifier.
    async fn find(&self, key: &EntityKey) -> NorthwindResult<Option<E>>;

    /// Read every row. Used to populate the cache.
    async fn list_all(&self) -> NorthwindResult<Vec<E>>;
}
