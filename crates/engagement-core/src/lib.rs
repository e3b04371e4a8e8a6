//! Engagement Core - status selection and counter reconciliation
//!
//! Pure building blocks shared by the store and the client SDK:
//! - [`StatusSet`]: the closed, mutually exclusive labels a target kind accepts
//! - [`AttendanceEngine`]: computes the counter deltas for a status change
//! - [`EngagementTarget`]: the committed document (counters + per-user statuses)
//!
//! Nothing in this crate performs I/O.
//!
//! # Example
//!
//! ```rust
//! use engagement_core::{compute_transition, EngagementTarget, Status, StatusSet};
//!
//! let set = StatusSet::attendance();
//! let mut event = EngagementTarget::new("spring-fair", &set);
//!
//! let going = Status::from("going");
//! let transition = compute_transition(event.status_of("ada"), &going);
//! transition.apply(&mut event, "ada").unwrap();
//!
//! assert_eq!(event.count("going"), 1);
//! assert_eq!(event.status_of("ada"), Some(&going));
//! ```

pub mod engine;
pub mod error;
pub mod status;
pub mod target;

pub use engine::{compute_transition, AttendanceEngine, CounterDeltas, Transition};
pub use error::{CoreError, Result};
pub use status::{Status, StatusSet, GOING, INTERESTED, UPVOTED};
pub use target::EngagementTarget;
