//! Status store contract for engagement counters
//!
//! [`StatusStore`] describes what the hosted document database must provide:
//! snapshot reads, push subscriptions, and one atomic write that sets a
//! user's status and applies counter increments together.
//!
//! [`MemoryStore`] implements the contract in-process.
//!
//! # Example
//!
//! ```rust,no_run
//! use engagement_core::{compute_transition, Status, StatusSet};
//! use engagement_store::{MemoryStore, StatusStore, StatusWrite};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::new();
//! store.create_target("spring-fair", &StatusSet::attendance()).await?;
//!
//! let going = Status::from("going");
//! let transition = compute_transition(None, &going);
//! let committed = store
//!     .apply_atomic(
//!         "spring-fair",
//!         "ada",
//!         StatusWrite::new(None, transition.new_status),
//!         transition.count_deltas,
//!     )
//!     .await?;
//!
//! assert_eq!(committed.count("going"), 1);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod memory;
pub mod store;
pub mod types;

pub use error::{Result, StoreError};
pub use memory::{MemoryStore, MemoryStoreConfig};
pub use store::StatusStore;
pub use types::{SnapshotStream, StatusWrite};
