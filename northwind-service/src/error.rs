//! Error Types for the Northwind Service
//!
//! Maps repository failures onto a stable error code with an HTTP status
//! number, so the HTTP collaborator can render responses without knowing the
//! repository taxonomy.

use northwind_core::{NorthwindError, ValidationError};
use northwind_storage::RepositoryError;
use serde::{Deserialize, Serialize};

// ============================================================================
// ERROR CODES
// ============================================================================

/// Error codes exposed to API callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Validation Errors (400)
    // ========================================================================
    /// Request validation failed
    ValidationFailed,

    /// Required field is missing from request
    MissingField,

    /// Identifier in the path and in the body disagree
    IdMismatch,

    // ========================================================================
    // Not Found Errors (404)
    // ========================================================================
    /// Requested entity does not exist
    EntityNotFound,

    // ========================================================================
    // Conflict Errors (409)
    // ========================================================================
    /// Store write did not affect exactly one row
    PersistenceConflict,

    /// Another writer changed the record concurrently
    ConcurrentModification,

    // ========================================================================
    // Server Errors (500, 503)
    // ========================================================================
    /// Unexpected internal failure
    InternalError,

    /// The store could not be reached to populate the cache
    ServiceUnavailable,
}

impl ErrorCode {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorCode::ValidationFailed | ErrorCode::MissingField | ErrorCode::IdMismatch => 400,

            ErrorCode::EntityNotFound => 404,

            ErrorCode::PersistenceConflict | ErrorCode::ConcurrentModification => 409,

            ErrorCode::InternalError => 500,
            ErrorCode::ServiceUnavailable => 503,
        }
    }

    /// Default human-readable message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed => "Request validation failed",
            ErrorCode::MissingField => "Required field is missing",
            ErrorCode::IdMismatch => "Identifier in path does not match identifier in body",
            ErrorCode::EntityNotFound => "Entity not found",
            ErrorCode::PersistenceConflict => "Store write had no effect",
            ErrorCode::ConcurrentModification => "Entity was modified concurrently",
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::ServiceUnavailable => "Service temporarily unavailable",
        }
    }
}

// ============================================================================
// API ERROR
// ============================================================================

/// Error returned to API callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{code:?}: {message}")]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

impl ApiError {
    /// Create a new ApiError.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create an ApiError carrying the code's default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        self.code.status_code()
    }

    /// Create an InternalError error.
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Create an EntityNotFound error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::EntityNotFound, message)
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        let message = err.to_string();
        match err {
            RepositoryError::Validation(ValidationError::RequiredFieldMissing { .. }) => {
                ApiError::new(ErrorCode::MissingField, message)
            }
            RepositoryError::Validation(ValidationError::IdMismatch { .. }) => {
                ApiError::new(ErrorCode::IdMismatch, message)
            }
            RepositoryError::NotFound { .. } => ApiError::not_found(message),
            RepositoryError::PersistenceConflict { .. } => {
                ApiError::new(ErrorCode::PersistenceConflict, message)
            }
            RepositoryError::CacheRaceLoss { .. } => {
                ApiError::new(ErrorCode::ConcurrentModification, message)
            }
            RepositoryError::Initialization { .. } => {
                // Log the full error; callers only learn the store is down.
                tracing::error!(error = %message, "repository initialization failed");
                ApiError::from_code(ErrorCode::ServiceUnavailable)
            }
        }
    }
}

impl From<NorthwindError> for ApiError {
    fn from(err: NorthwindError) -> Self {
        match err {
            NorthwindError::Validation(e) => ApiError::new(ErrorCode::ValidationFailed, e.to_string()),
            NorthwindError::Config(e) => ApiError::internal_error(e.to_string()),
            other => {
                tracing::error!(error = %other, "unexpected service error");
                ApiError::from_code(ErrorCode::InternalError)
            }
        }
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for service operations.
pub type ApiResult<T> = Result<T, ApiError>;
