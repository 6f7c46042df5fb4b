//! Storage error types
//!
//! Error codes:
//! - SHELF_NOT_FOUND (terminal)
//! - SHELF_VALIDATION_FAILED (terminal)
//! - SHELF_CONFLICT (terminal)
//! - SHELF_STORAGE_UNAVAILABLE (retryable)
//! - SHELF_STORAGE_INTERNAL (terminal)
//!
//! Driver errors are classified exactly once, here. Raw driver text stays in
//! the `Transient` and `Internal` payloads for logging and is never rendered
//! to external callers.

use std::fmt;

use sqlx::error::ErrorKind as DbErrorKind;
use thiserror::Error;

use crate::model::{EntityId, EntityKind, FieldError};

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Failure taxonomy shared by the store, the mutator and the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    Transient,
    Internal,
}

impl ErrorKind {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "SHELF_NOT_FOUND",
            ErrorKind::Validation => "SHELF_VALIDATION_FAILED",
            ErrorKind::Conflict => "SHELF_CONFLICT",
            ErrorKind::Transient => "SHELF_STORAGE_UNAVAILABLE",
            ErrorKind::Internal => "SHELF_STORAGE_INTERNAL",
        }
    }

    /// Whether a caller may retry the same operation later
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Transient)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Storage errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Entity missing at check time
    #[error("{kind} {id} does not exist")]
    NotFound { kind: EntityKind, id: EntityId },

    /// Field mapping or input rejected before any write
    #[error("{0}")]
    Validation(#[from] FieldError),

    /// Write would violate a uniqueness, referential or deletion constraint
    #[error("{0}")]
    Conflict(String),

    /// Storage unreachable, busy or exhausted
    #[error("storage unavailable: {0}")]
    Transient(String),

    /// Anything the store cannot explain
    #[error("internal storage error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn not_found(kind: EntityKind, id: EntityId) -> Self {
        StoreError::NotFound { kind, id }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        StoreError::Conflict(msg.into())
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            StoreError::Validation(_) => ErrorKind::Validation,
            StoreError::Conflict(_) => ErrorKind::Conflict,
            StoreError::Transient(_) => ErrorKind::Transient,
            StoreError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

/// SQLITE_BUSY and SQLITE_LOCKED, including their extended codes
fn is_busy_code(code: &str) -> bool {
    code.parse::<i32>()
        .map(|code| matches!(code & 0xff, 5 | 6))
        .unwrap_or(false)
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db) => {
                if db.code().as_deref().map(is_busy_code).unwrap_or(false) {
                    return StoreError::Transient(db.message().to_string());
                }
                match db.kind() {
                    DbErrorKind::UniqueViolation => {
                        tracing::debug!(error = %db, "unique constraint violated");
                        StoreError::conflict("a record with the same unique value already exists")
                    }
                    DbErrorKind::ForeignKeyViolation => {
                        tracing::debug!(error = %db, "foreign key constraint violated");
                        StoreError::conflict("the record references, or is referenced by, another record")
                    }
                    DbErrorKind::NotNullViolation | DbErrorKind::CheckViolation => {
                        tracing::debug!(error = %db, "column constraint violated");
                        StoreError::conflict("the record violates a column constraint")
                    }
                    _ => StoreError::Internal(db.to_string()),
                }
            }
            sqlx::Error::PoolTimedOut => {
                StoreError::Transient("timed out acquiring a connection".to_string())
            }
            sqlx::Error::PoolClosed => StoreError::Transient("connection pool closed".to_string()),
            sqlx::Error::Io(e) => StoreError::Transient(e.to_string()),
            sqlx::Error::WorkerCrashed => {
                StoreError::Transient("database worker crashed".to_string())
            }
            other => StoreError::Internal(other.to_string()),
        }
    }
}
