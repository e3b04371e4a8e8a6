//! Status store trait

use crate::error::Result;
use crate::types::{SnapshotStream, StatusWrite};
use async_trait::async_trait;
use engagement_core::{CounterDeltas, EngagementTarget, StatusSet};

/// Durable, atomic storage for engagement targets.
///
/// Implementations wrap a document database. The load-bearing requirement
/// is [`apply_atomic`](StatusStore::apply_atomic): concurrent writes from
/// different users to the same target must never lose an increment, so a
/// read-then-write of the counter from the client is not an acceptable
/// implementation. Use the backend's atomic increment or a transaction.
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Create a target with every counter of `status_set` at zero
    async fn create_target(&self, target_id: &str, status_set: &StatusSet) -> Result<EngagementTarget>;

    /// Latest committed snapshot
    async fn get_snapshot(&self, target_id: &str) -> Result<EngagementTarget>;

    /// Push stream of committed snapshots.
    ///
    /// Yields the current snapshot first, then every later commit. Ends when
    /// the target is deleted.
    async fn subscribe(&self, target_id: &str) -> Result<SnapshotStream>;

    /// Set the user's status and apply `deltas` as one all-or-nothing unit.
    ///
    /// Fails with `Conflict` when the user's committed status differs from
    /// `write.expected`, and with `Rejected` when a delta would take a
    /// counter below zero. Neither failure applies anything.
    async fn apply_atomic(
        &self,
        target_id: &str,
        user_id: &str,
        write: StatusWrite,
        deltas: CounterDeltas,
    ) -> Result<EngagementTarget>;

    /// Remove a target; open subscriptions end
    async fn delete_target(&self, target_id: &str) -> Result<()>;
}
