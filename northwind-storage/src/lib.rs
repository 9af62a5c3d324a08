//! Northwind Storage - Entity Store Trait, Cache and Repository Facade
//!
//! - [`EntityStore`] is the contract the persistent store collaborator
//!   implements (add, update, remove, find, list-all with rows-affected).
//! - [`EntityCache`] is the process-wide in-memory mirror of one entity kind.
//! - [`Repository`] sequences store writes and cache mutations so a cache
//!   entry only changes after the store confirms exactly one affected row.
//! - [`InMemoryEntityStore`] is a seedable store with fault injection, used
//!   by tests and local wiring.

pub mod cache;
pub mod memory;
pub mod repository;
pub mod store;

pub use cache::{CacheStats, EntityCache};
pub use memory::InMemoryEntityStore;
pub use repository::{
    CustomerRepository, EmployeeRepository, Repository, RepositoryError, RepositoryResult,
};
pub use store::EntityStore;
