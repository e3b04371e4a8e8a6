//! Configuration for the engagement client.

use crate::error::{EngagementError, Result};
use engagement_core::StatusSet;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementConfig {
    /// Status set per target kind
    pub status_sets: Vec<StatusSet>,
    /// Re-read and recompute this many times when the user's status moved
    pub max_conflict_retries: u32,
    /// Store calls slower than this fail as unavailable (milliseconds)
    pub store_timeout_ms: u64,
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            status_sets: vec![
                StatusSet::attendance(),
                StatusSet::upvote("post"),
                StatusSet::upvote("comment"),
            ],
            max_conflict_retries: 3,
            store_timeout_ms: 10_000,
        }
    }
}

impl EngagementConfig {
    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Store call timeout as a duration
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Reject empty or duplicate status sets and a zero timeout
    pub fn validate(&self) -> Result<()> {
        if self.status_sets.is_empty() {
            return Err(EngagementError::Config("no status sets configured".into()));
        }

        let mut kinds = HashSet::new();
        for set in &self.status_sets {
            if set.is_empty() {
                return Err(EngagementError::Config(format!(
                    "status set for '{}' has no labels",
                    set.kind()
                )));
            }
            if !kinds.insert(set.kind()) {
                return Err(EngagementError::Config(format!(
                    "duplicate status set for '{}'",
                    set.kind()
                )));
            }
        }

        if self.store_timeout_ms == 0 {
            return Err(EngagementError::Config("store_timeout_ms must be positive".into()));
        }

        Ok(())
    }
}
