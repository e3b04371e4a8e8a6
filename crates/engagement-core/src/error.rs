//! Error types for engagement core

use thiserror::Error;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Status label is not part of the target kind's status set
    #[error("Invalid status '{status}' for target kind '{kind}'")]
    InvalidStatus { status: String, kind: String },

    /// A status set must contain at least one label
    #[error("Status set for '{0}' has no labels")]
    EmptyStatusSet(String),

    /// Delta or write names a counter the target does not carry
    #[error("Target {target} has no counter for status '{status}'")]
    UnknownCounter { target: String, status: String },

    /// Applying the delta would take a counter below zero
    #[error("Counter '{status}' at {count} cannot take delta {delta}")]
    CounterUnderflow { status: String, count: u64, delta: i64 },

    /// Counter disagrees with the number of users holding the status
    #[error("Counter '{status}' is {count} but {holders} users hold it")]
    Inconsistent { status: String, count: u64, holders: u64 },
}
