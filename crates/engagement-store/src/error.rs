//! Error types for status stores

use engagement_core::CoreError;
use thiserror::Error;

/// Status store error
#[derive(Debug, Error)]
pub enum StoreError {
    /// Target does not exist (never created, or deleted)
    #[error("Target not found: {0}")]
    NotFound(String),

    /// Target id already taken
    #[error("Target already exists: {0}")]
    AlreadyExists(String),

    /// Transport or backend failure
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The user's committed status is not the one the write expected
    #[error("Status conflict for user {user} on {target}: expected {expected:?}, found {actual:?}")]
    Conflict {
        target: String,
        user: String,
        expected: Option<String>,
        actual: Option<String>,
    },

    /// Write would break a counter; nothing was applied
    #[error("Write rejected: {0}")]
    Rejected(#[from] CoreError),
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
