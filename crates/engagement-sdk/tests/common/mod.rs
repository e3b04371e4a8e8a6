//! Shared test fixtures

#![allow(dead_code)]

use async_trait::async_trait;
use engagement_core::CounterDeltas;
use engagement_sdk::{
    EngagementClient, EngagementConfig, EngagementTarget, MemoryStore, MemoryStoreConfig,
    SessionAuthenticator, SnapshotStream, StatusSet, StatusStore, StatusWrite,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

pub fn slow_store(latency_ms: u64) -> Arc<MemoryStore> {
    Arc::new(MemoryStore::with_config(MemoryStoreConfig::with_latency(latency_ms)))
}

/// Client for `user` on a shared store
pub fn client(store: &Arc<MemoryStore>, user: &str) -> Arc<EngagementClient<MemoryStore>> {
    client_with(store, user, EngagementConfig::default())
}

pub fn client_with<S: StatusStore>(
    store: &Arc<S>,
    user: &str,
    config: EngagementConfig,
) -> Arc<EngagementClient<S>> {
    Arc::new(
        EngagementClient::new(
            Arc::clone(store),
            Arc::new(SessionAuthenticator::signed_in(user)),
            config,
        )
        .expect("valid config"),
    )
}

/// Memory store whose first commit stalls before reaching the store, so
/// later commits can overtake it
pub struct StallFirstCommit {
    inner: MemoryStore,
    stall: Duration,
    stalled: AtomicBool,
}

impl StallFirstCommit {
    pub fn new(stall_ms: u64) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryStore::new(),
            stall: Duration::from_millis(stall_ms),
            stalled: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl StatusStore for StallFirstCommit {
    async fn create_target(
        &self,
        target_id: &str,
        status_set: &StatusSet,
    ) -> engagement_store::Result<EngagementTarget> {
        self.inner.create_target(target_id, status_set).await
    }

    async fn get_snapshot(&self, target_id: &str) -> engagement_store::Result<EngagementTarget> {
        self.inner.get_snapshot(target_id).await
    }

    async fn subscribe(&self, target_id: &str) -> engagement_store::Result<SnapshotStream> {
        self.inner.subscribe(target_id).await
    }

    async fn apply_atomic(
        &self,
        target_id: &str,
        user_id: &str,
        write: StatusWrite,
        deltas: CounterDeltas,
    ) -> engagement_store::Result<EngagementTarget> {
        if !self.stalled.swap(true, Ordering::SeqCst) {
            tokio::time::sleep(self.stall).await;
        }
        self.inner.apply_atomic(target_id, user_id, write, deltas).await
    }

    async fn delete_target(&self, target_id: &str) -> engagement_store::Result<()> {
        self.inner.delete_target(target_id).await
    }
}
