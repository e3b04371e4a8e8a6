//! Error types for the engagement SDK

use engagement_core::CoreError;
use engagement_store::StoreError;
use thiserror::Error;

/// Result type for SDK operations
pub type Result<T> = std::result::Result<T, EngagementError>;

/// SDK error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngagementError {
    /// No signed-in user for an operation that needs one
    #[error("Sign in to change your status")]
    Unauthenticated,

    /// Status label outside the target kind's status set
    #[error("Invalid status '{status}' for {kind}")]
    InvalidStatus { status: String, kind: String },

    /// Target was deleted or never existed
    #[error("This item no longer exists: {0}")]
    NotFound(String),

    /// Transient store failure
    #[error("Store unavailable, please retry: {0}")]
    StoreUnavailable(String),

    /// Target kind has no configured status set
    #[error("No status set configured for target kind: {0}")]
    UnknownKind(String),

    /// Target id already in use
    #[error("Target already exists: {0}")]
    AlreadyExists(String),

    /// Status kept changing underneath us
    #[error("Status changed concurrently: {0}")]
    Conflict(String),

    /// Store refused the write
    #[error("Write rejected: {0}")]
    Rejected(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl EngagementError {
    /// Whether a fresh user action may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_) | Self::Conflict(_))
    }

    /// Whether the UI holds stale data and should reload the target
    pub fn requires_refresh(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<CoreError> for EngagementError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidStatus { status, kind } => Self::InvalidStatus { status, kind },
            CoreError::EmptyStatusSet(kind) => Self::Config(format!("status set for '{}' has no labels", kind)),
            other => Self::Rejected(other.to_string()),
        }
    }
}

impl From<StoreError> for EngagementError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::AlreadyExists(id) => Self::AlreadyExists(id),
            StoreError::Unavailable(msg) => Self::StoreUnavailable(msg),
            conflict @ StoreError::Conflict { .. } => Self::Conflict(conflict.to_string()),
            StoreError::Rejected(core) => Self::from(core),
        }
    }
}

impl From<serde_yaml::Error> for EngagementError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Config(err.to_string())
    }
}
