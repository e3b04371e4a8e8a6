//! Types exchanged with a status store

use engagement_core::{EngagementTarget, Status};
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// Stream of committed snapshots for one target.
///
/// Dropping the stream unsubscribes.
pub type SnapshotStream = BoxStream<'static, EngagementTarget>;

/// Per-user half of an atomic write: compare-and-swap on the status entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusWrite {
    /// Status the writer observed; the write fails if the store disagrees
    pub expected: Option<Status>,
    /// Status to store (`None` removes the entry)
    pub new: Option<Status>,
}

impl StatusWrite {
    pub fn new(expected: Option<Status>, new: Option<Status>) -> Self {
        Self { expected, new }
    }
}
