//! Status labels and per-kind status sets
//!
//! Every target kind (event, post, comment) accepts a closed set of
//! mutually exclusive labels. A user holds at most one of them per target.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeSet;

/// Event attendance: attending
pub const GOING: &str = "going";
/// Event attendance: might attend
pub const INTERESTED: &str = "interested";
/// Binary like/upvote on posts and comments
pub const UPVOTED: &str = "upvoted";

/// A single status label.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Status(String);

impl Status {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Status {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Status {
    fn from(label: &str) -> Self {
        Self(label.to_string())
    }
}

impl From<String> for Status {
    fn from(label: String) -> Self {
        Self(label)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The closed set of labels valid for one target kind.
///
/// Configured per kind, never per instance:
///
/// ```rust
/// use engagement_core::StatusSet;
///
/// let events = StatusSet::attendance();
/// assert!(events.parse("going").is_ok());
/// assert!(events.parse("maybe").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSet {
    kind: String,
    labels: BTreeSet<Status>,
}

impl StatusSet {
    /// Create a status set, rejecting an empty label list
    pub fn new<I, L>(kind: impl Into<String>, labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = L>,
        L: Into<Status>,
    {
        let kind = kind.into();
        let labels: BTreeSet<Status> = labels.into_iter().map(Into::into).collect();
        if labels.is_empty() {
            return Err(CoreError::EmptyStatusSet(kind));
        }
        Ok(Self { kind, labels })
    }

    /// Event RSVP: `going` / `interested`
    pub fn attendance() -> Self {
        Self {
            kind: "event".to_string(),
            labels: [GOING, INTERESTED].into_iter().map(Status::from).collect(),
        }
    }

    /// Single-label upvote set for the given kind (e.g. "post", "comment")
    pub fn upvote(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            labels: BTreeSet::from([Status::from(UPVOTED)]),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn labels(&self) -> impl Iterator<Item = &Status> {
        self.labels.iter()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    /// Reject a status that is not part of this set
    pub fn validate(&self, status: &Status) -> Result<()> {
        if self.contains(status.as_str()) {
            Ok(())
        } else {
            Err(self.invalid(status.as_str()))
        }
    }

    /// Parse a raw label into a member of this set
    pub fn parse(&self, label: &str) -> Result<Status> {
        self.labels
            .get(label)
            .cloned()
            .ok_or_else(|| self.invalid(label))
    }

    fn invalid(&self, label: &str) -> CoreError {
        CoreError::InvalidStatus {
            status: label.to_string(),
            kind: self.kind.clone(),
        }
    }
}
