//! Error types for Northwind operations

use crate::EntityKind;
use thiserror::Error;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Insert failed for {kind:?} with id {id}: {reason}")]
    InsertFailed {
        kind: EntityKind,
        id: String,
        reason: String,
    },

    #[error("Update failed for {kind:?} with id {id}: {reason}")]
    UpdateFailed {
        kind: EntityKind,
        id: String,
        reason: String,
    },

    #[error("Delete failed for {kind:?} with id {id}: {reason}")]
    DeleteFailed {
        kind: EntityKind,
        id: String,
        reason: String,
    },

    #[error("Storage unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Validation errors, raised before any store or cache access.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Identifier mismatch: path id {path_id} does not match body id {body_id}")]
    IdMismatch { path_id: String, body_id: String },
}

/// Entity cache errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache update for {kind:?} with id {id} lost to a concurrent writer")]
    RaceLost { kind: EntityKind, id: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all Northwind errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NorthwindError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for Northwind operations.
pub type NorthwindResult<T> = Result<T, NorthwindError>;

// =============================================================================
// TESTS
// =============================================================================
