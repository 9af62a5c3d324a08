//! Northwind Core - Entity Types
//!
//! Pure data structures shared by every other crate in the workspace:
//! the customer and employee records, the normalized identifier type,
//! the error taxonomy and repository configuration.
//! This crate contains no I/O and no synchronization.

pub mod config;
pub mod entities;
pub mod error;
pub mod identity;

pub use config::{CacheConfig, RepositoryConfig};
pub use entities::{Customer, Employee};
pub use error::{
    CacheError, ConfigError, NorthwindError, NorthwindResult, StorageError, ValidationError,
};
pub use identity::{normalize_id, Entity, EntityKey, EntityKind, Timestamp};
