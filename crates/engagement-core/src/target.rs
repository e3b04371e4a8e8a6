//! Engagement target document
//!
//! An event, post or comment as it is committed in the store: one counter
//! per status plus the per-user status map that the counters summarize.

use crate::engine::CounterDeltas;
use crate::error::{CoreError, Result};
use crate::status::{Status, StatusSet};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Committed engagement state of one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementTarget {
    /// Opaque unique identifier
    pub id: String,
    /// Target kind, selects the status set
    pub kind: String,
    /// Aggregate count per status
    pub counts_by_status: BTreeMap<Status, u64>,
    /// Status held by each user (absent = no status)
    pub user_statuses: BTreeMap<String, Status>,
    /// Commit counter, 0 at creation
    pub version: u64,
    /// Time of the last commit
    pub updated_at: DateTime<Utc>,
}

impl EngagementTarget {
    /// New target with every counter of the set at zero
    pub fn new(id: impl Into<String>, status_set: &StatusSet) -> Self {
        Self {
            id: id.into(),
            kind: status_set.kind().to_string(),
            counts_by_status: status_set.labels().map(|s| (s.clone(), 0)).collect(),
            user_statuses: BTreeMap::new(),
            version: 0,
            updated_at: Utc::now(),
        }
    }

    pub fn count(&self, status: &str) -> u64 {
        self.counts_by_status.get(status).copied().unwrap_or(0)
    }

    pub fn status_of(&self, user_id: &str) -> Option<&Status> {
        self.user_statuses.get(user_id)
    }

    /// Users currently holding `status`, in id order
    pub fn holders(&self, status: &str) -> Vec<&str> {
        self.user_statuses
            .iter()
            .filter(|(_, held)| held.as_str() == status)
            .map(|(user, _)| user.as_str())
            .collect()
    }

    /// Write a user's status and apply counter deltas as one unit.
    ///
    /// Every delta is checked before anything changes; on error the
    /// target is untouched.
    pub fn apply_write(
        &mut self,
        user_id: &str,
        new_status: Option<&Status>,
        deltas: &CounterDeltas,
    ) -> Result<()> {
        if let Some(status) = new_status {
            if !self.counts_by_status.contains_key(status) {
                return Err(self.unknown_counter(status));
            }
        }

        let mut updated = Vec::with_capacity(deltas.len());
        for (status, delta) in deltas {
            let count = *self
                .counts_by_status
                .get(status)
                .ok_or_else(|| self.unknown_counter(status))?;
            let next = count.checked_add_signed(*delta).ok_or_else(|| CoreError::CounterUnderflow {
                status: status.to_string(),
                count,
                delta: *delta,
            })?;
            updated.push((status, next));
        }

        for (status, next) in updated {
            if let Some(count) = self.counts_by_status.get_mut(status) {
                *count = next;
            }
        }

        match new_status {
            Some(status) => {
                self.user_statuses.insert(user_id.to_string(), status.clone());
            }
            None => {
                self.user_statuses.remove(user_id);
            }
        }

        Ok(())
    }

    /// Stamp a successful commit
    pub fn mark_committed(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }

    /// Check that every counter equals the number of users holding its status
    pub fn verify_consistency(&self) -> Result<()> {
        for (status, count) in &self.counts_by_status {
            let holders = self
                .user_statuses
                .values()
                .filter(|held| *held == status)
                .count() as u64;
            if holders != *count {
                return Err(CoreError::Inconsistent {
                    status: status.to_string(),
                    count: *count,
                    holders,
                });
            }
        }

        if let Some(stray) = self
            .user_statuses
            .values()
            .find(|held| !self.counts_by_status.contains_key(*held))
        {
            return Err(self.unknown_counter(stray));
        }

        Ok(())
    }

    fn unknown_counter(&self, status: &Status) -> CoreError {
        CoreError::UnknownCounter {
            target: self.id.clone(),
            status: status.to_string(),
        }
    }
}
