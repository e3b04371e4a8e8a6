//! Attendance engine
//!
//! Computes the state transition for a status toggle. The rules:
//! - selecting the status already held clears it (toggle-off)
//! - selecting a different status moves the user, decrementing the old counter
//! - selecting with no prior status increments the chosen counter
//!
//! Deltas are always relative to the status passed in, so callers must pass
//! the latest committed status, never a cached one.

use crate::error::Result;
use crate::status::{Status, StatusSet};
use crate::target::EngagementTarget;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Signed counter changes keyed by status
pub type CounterDeltas = BTreeMap<Status, i64>;

/// Result of a status-change request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// Status the user holds afterwards (`None` = cleared)
    pub new_status: Option<Status>,
    /// Exactly the counters that change
    pub count_deltas: CounterDeltas,
}

impl Transition {
    /// Whether this transition clears the user's status
    pub fn is_toggle_off(&self) -> bool {
        self.new_status.is_none()
    }

    /// Delta for one status (0 if untouched)
    pub fn delta(&self, status: &str) -> i64 {
        self.count_deltas.get(status).copied().unwrap_or(0)
    }

    /// Apply to a target value, all-or-nothing
    pub fn apply(&self, target: &mut EngagementTarget, user_id: &str) -> Result<()> {
        target.apply_write(user_id, self.new_status.as_ref(), &self.count_deltas)
    }
}

/// Compute the transition from `current` when `requested` is selected.
///
/// Total over valid input; callers validate `requested` against the
/// kind's [`StatusSet`] first (see [`AttendanceEngine::request`]).
pub fn compute_transition(current: Option<&Status>, requested: &Status) -> Transition {
    let mut count_deltas = CounterDeltas::new();

    match current {
        Some(held) if held == requested => {
            count_deltas.insert(requested.clone(), -1);
            return Transition {
                new_status: None,
                count_deltas,
            };
        }
        Some(held) => {
            count_deltas.insert(held.clone(), -1);
        }
        None => {}
    }

    count_deltas.insert(requested.clone(), 1);
    Transition {
        new_status: Some(requested.clone()),
        count_deltas,
    }
}

/// Validating front for [`compute_transition`], bound to one status set.
#[derive(Debug, Clone)]
pub struct AttendanceEngine {
    status_set: StatusSet,
}

impl AttendanceEngine {
    pub fn new(status_set: StatusSet) -> Self {
        Self { status_set }
    }

    pub fn status_set(&self) -> &StatusSet {
        &self.status_set
    }

    /// Validate both statuses against the set, then compute the transition.
    ///
    /// Out-of-set input fails with `InvalidStatus` before any delta is computed.
    pub fn request(&self, current: Option<&Status>, requested: &Status) -> Result<Transition> {
        self.status_set.validate(requested)?;
        if let Some(held) = current {
            self.status_set.validate(held)?;
        }
        Ok(compute_transition(current, requested))
    }
}
