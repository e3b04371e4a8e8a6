//! Engagement SDK - status toggles with optimistic UI support
//!
//! SDK for event attendance ("going" / "interested") and upvotes on posts
//! and comments, backed by any store that implements [`StatusStore`].
//!
//! # Architecture
//!
//! - **[`AttendanceEngine`]** (engagement-core): pure transition rules
//! - **[`StatusStore`]** (engagement-store): atomic commits and push updates
//! - **[`EngagementClient`]**: authentication, validation, commit with retry
//! - **[`OptimisticBinding`]**: predicted UI state, rollback and reconciliation
//!
//! Counters only ever change through a committed transition, so every
//! counter always equals the number of users holding its status.
//!
//! # Example
//!
//! ```rust,ignore
//! use engagement_sdk::{
//!     EngagementClient, EngagementConfig, MemoryStore, OptimisticBinding, SessionAuthenticator,
//! };
//! use std::sync::Arc;
//!
//! let auth = Arc::new(SessionAuthenticator::signed_in("ada"));
//! let client = Arc::new(EngagementClient::new(
//!     Arc::new(MemoryStore::new()),
//!     auth,
//!     EngagementConfig::default(),
//! )?);
//! client.create_target("spring-fair", "event").await?;
//!
//! let binding = Arc::new(OptimisticBinding::bind(client, "spring-fair").await?);
//! let _sync = binding.spawn_sync().await?;
//!
//! // View moves to going=1 immediately, then settles on the committed state
//! binding.toggle("going").await?;
//! assert_eq!(binding.view().count("going"), 1);
//! ```

// Authentication collaborator
pub mod auth;

// Optimistic view model
pub mod binding;

// Validating client
pub mod client;

// Configuration
pub mod config;

// Error types
pub mod error;

pub use auth::{Authenticator, SessionAuthenticator};
pub use binding::{BindingState, LocalView, OptimisticBinding, Phase};
pub use client::EngagementClient;
pub use config::EngagementConfig;
pub use error::{EngagementError, Result};

// Re-export from underlying crates
pub use engagement_core::{
    compute_transition, AttendanceEngine, EngagementTarget, Status, StatusSet, Transition, GOING,
    INTERESTED, UPVOTED,
};
pub use engagement_store::{MemoryStore, MemoryStoreConfig, SnapshotStream, StatusStore, StatusWrite};
