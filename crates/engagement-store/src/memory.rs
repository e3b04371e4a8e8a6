//! In-process status store
//!
//! Holds every target behind one async mutex, so each `apply_atomic` call is
//! a single critical section: the compare-and-swap on the user's entry, the
//! counter deltas and the version bump land together or not at all.
//! Committed snapshots fan out to subscribers over a broadcast channel per
//! target.
//!
//! Failure injection (`set_available`, `fail_next`) and an artificial commit
//! latency make transport failures and interleavings reproducible in tests.

use crate::error::{Result, StoreError};
use crate::store::StatusStore;
use crate::types::{SnapshotStream, StatusWrite};
use async_trait::async_trait;
use engagement_core::{CounterDeltas, EngagementTarget, StatusSet};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Configuration for the in-memory store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryStoreConfig {
    /// Snapshots buffered per target before slow subscribers skip ahead
    pub channel_capacity: usize,
    /// Delay before each commit takes the lock (0 = none)
    pub commit_latency_ms: u64,
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
            commit_latency_ms: 0,
        }
    }
}

impl MemoryStoreConfig {
    /// Configuration with a fixed commit delay, for interleaving tests
    pub fn with_latency(commit_latency_ms: u64) -> Self {
        Self {
            commit_latency_ms,
            ..Default::default()
        }
    }
}

struct Entry {
    target: EngagementTarget,
    updates: broadcast::Sender<EngagementTarget>,
}

/// Status store backed by process memory
pub struct MemoryStore {
    config: MemoryStoreConfig,
    targets: Mutex<HashMap<String, Entry>>,
    available: AtomicBool,
    /// Remaining injected failures
    fail_budget: AtomicU32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_config(MemoryStoreConfig::default())
    }

    pub fn with_config(config: MemoryStoreConfig) -> Self {
        Self {
            config,
            targets: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
            fail_budget: AtomicU32::new(0),
        }
    }

    /// Take the store offline (every call fails with `Unavailable`) or back online
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Fail the next `count` calls with `Unavailable`
    pub fn fail_next(&self, count: u32) {
        self.fail_budget.store(count, Ordering::SeqCst);
    }

    /// Number of targets currently stored
    pub async fn len(&self) -> usize {
        self.targets.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.targets.lock().await.is_empty()
    }

    fn check_available(&self) -> Result<()> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store offline".into()));
        }

        let injected = self
            .fail_budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(StoreError::Unavailable("injected failure".into()));
        }

        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StatusStore for MemoryStore {
    async fn create_target(&self, target_id: &str, status_set: &StatusSet) -> Result<EngagementTarget> {
        self.check_available()?;

        let mut targets = self.targets.lock().await;
        if targets.contains_key(target_id) {
            return Err(StoreError::AlreadyExists(target_id.to_string()));
        }

        let target = EngagementTarget::new(target_id, status_set);
        let (updates, _) = broadcast::channel(self.config.channel_capacity.max(1));
        targets.insert(
            target_id.to_string(),
            Entry {
                target: target.clone(),
                updates,
            },
        );

        tracing::debug!(target_id, kind = %target.kind, "created engagement target");
        Ok(target)
    }

    async fn get_snapshot(&self, target_id: &str) -> Result<EngagementTarget> {
        self.check_available()?;

        let targets = self.targets.lock().await;
        targets
            .get(target_id)
            .map(|entry| entry.target.clone())
            .ok_or_else(|| StoreError::NotFound(target_id.to_string()))
    }

    async fn subscribe(&self, target_id: &str) -> Result<SnapshotStream> {
        self.check_available()?;

        let targets = self.targets.lock().await;
        let entry = targets
            .get(target_id)
            .ok_or_else(|| StoreError::NotFound(target_id.to_string()))?;

        // Subscribe under the lock so no commit slips between the initial
        // snapshot and the live stream.
        let current = entry.target.clone();
        let live = BroadcastStream::new(entry.updates.subscribe());
        let id = target_id.to_string();

        let stream: SnapshotStream = Box::pin(tokio_stream::once(current).chain(live.filter_map(
            move |item| match item {
                Ok(snapshot) => Some(snapshot),
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    tracing::warn!(target_id = %id, skipped, "subscriber lagged, skipping to newer snapshot");
                    None
                }
            },
        )));

        Ok(stream)
    }

    async fn apply_atomic(
        &self,
        target_id: &str,
        user_id: &str,
        write: StatusWrite,
        deltas: CounterDeltas,
    ) -> Result<EngagementTarget> {
        self.check_available()?;

        if self.config.commit_latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.commit_latency_ms)).await;
        }

        let mut targets = self.targets.lock().await;
        let entry = targets
            .get_mut(target_id)
            .ok_or_else(|| StoreError::NotFound(target_id.to_string()))?;

        let actual = entry.target.status_of(user_id).cloned();
        if actual != write.expected {
            tracing::debug!(target_id, user_id, ?actual, expected = ?write.expected, "status compare-and-swap failed");
            return Err(StoreError::Conflict {
                target: target_id.to_string(),
                user: user_id.to_string(),
                expected: write.expected.map(|s| s.to_string()),
                actual: actual.map(|s| s.to_string()),
            });
        }

        entry.target.apply_write(user_id, write.new.as_ref(), &deltas)?;
        entry.target.mark_committed();

        let committed = entry.target.clone();
        // No receivers is fine; nobody is watching this target
        let _ = entry.updates.send(committed.clone());

        tracing::debug!(
            target_id,
            user_id,
            version = committed.version,
            new_status = ?write.new,
            "committed status write"
        );
        Ok(committed)
    }

    async fn delete_target(&self, target_id: &str) -> Result<()> {
        self.check_available()?;

        let mut targets = self.targets.lock().await;
        match targets.remove(target_id) {
            Some(_) => {
                tracing::debug!(target_id, "deleted engagement target");
                Ok(())
            }
            None => Err(StoreError::NotFound(target_id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engagement_core::{compute_transition, Status};

    async fn going(store: &MemoryStore, target: &str, user: &str) -> Result<EngagementTarget> {
        let current = store.get_snapshot(target).await?.status_of(user).cloned();
        let t = compute_transition(current.as_ref(), &Status::from("going"));
        store
            .apply_atomic(target, user, StatusWrite::new(current, t.new_status), t.count_deltas)
            .await
    }

    #[tokio::test]
    async fn test_create_and_read() {
        let store = MemoryStore::new();
        store.create_target("evt", &StatusSet::attendance()).await.unwrap();

        let snapshot = store.get_snapshot("evt").await.unwrap();
        assert_eq!(snapshot.count("going"), 0);
        assert_eq!(snapshot.version, 0);

        let err = store.create_target("evt", &StatusSet::attendance()).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_apply_bumps_version() {
        let store = MemoryStore::new();
        store.create_target("evt", &StatusSet::attendance()).await.unwrap();

        let committed = going(&store, "evt", "ada").await.unwrap();
        assert_eq!(committed.count("going"), 1);
        assert_eq!(committed.version, 1);

        let committed = going(&store, "evt", "ada").await.unwrap();
        assert_eq!(committed.count("going"), 0);
        assert_eq!(committed.version, 2);
    }

    #[tokio::test]
    async fn test_conflict_applies_nothing() {
        let store = MemoryStore::new();
        store.create_target("evt", &StatusSet::attendance()).await.unwrap();
        going(&store, "evt", "ada").await.unwrap();

        // Writer still believes ada has no status
        let t = compute_transition(None, &Status::from("going"));
        let err = store
            .apply_atomic("evt", "ada", StatusWrite::new(None, t.new_status), t.count_deltas)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { ref actual, .. } if actual.as_deref() == Some("going")));

        let snapshot = store.get_snapshot("evt").await.unwrap();
        assert_eq!(snapshot.count("going"), 1);
        assert_eq!(snapshot.version, 1);
    }

    #[tokio::test]
    async fn test_underflow_rejected() {
        let store = MemoryStore::new();
        store.create_target("evt", &StatusSet::attendance()).await.unwrap();

        let deltas = CounterDeltas::from([(Status::from("going"), -1)]);
        let err = store
            .apply_atomic("evt", "ada", StatusWrite::new(None, None), deltas)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));

        let snapshot = store.get_snapshot("evt").await.unwrap();
        assert_eq!(snapshot.count("going"), 0);
        assert_eq!(snapshot.version, 0);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = MemoryStore::new();
        store.create_target("evt", &StatusSet::attendance()).await.unwrap();

        store.fail_next(1);
        assert!(matches!(store.get_snapshot("evt").await, Err(StoreError::Unavailable(_))));
        assert!(store.get_snapshot("evt").await.is_ok());

        store.set_available(false);
        assert!(matches!(going(&store, "evt", "ada").await, Err(StoreError::Unavailable(_))));
        store.set_available(true);
        assert_eq!(store.get_snapshot("evt").await.unwrap().count("going"), 0);
    }

    #[tokio::test]
    async fn test_missing_target() {
        let store = MemoryStore::new();
        assert!(matches!(store.get_snapshot("nope").await, Err(StoreError::NotFound(_))));
        assert!(matches!(store.delete_target("nope").await, Err(StoreError::NotFound(_))));
        assert!(store.subscribe("nope").await.is_err());
        assert!(store.is_empty().await);
    }
}
