//! Write-through entity cache.
//!
//! One [`EntityCache`] exists per entity kind for the lifetime of the
//! process. It is populated once from a full store snapshot and afterwards
//! only changes through the repository facade, after the store has confirmed
//! a write.
//!
//! # Concurrency
//!
//! - Entries live in a `DashMap`, so readers and writers of unrelated keys
//!   contend only on their own shard
//! - Per-key replacement is a compare-and-swap against the `Arc` the writer
//!   observed; a writer that loses is told, never silently overwritten
//! - Initialization runs behind a `tokio::sync::OnceCell`, so concurrent
//!   first constructions share a single snapshot load
//! - No `DashMap` guard is ever held across an `.await`

mod entity_cache;
mod stats;

pub use entity_cache::EntityCache;
pub use stats::CacheStats;
