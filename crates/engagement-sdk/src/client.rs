//! Engagement client
//!
//! The single place where status changes are validated, computed and
//! committed. Every toggle:
//! 1. fails fast with `Unauthenticated` when nobody is signed in
//! 2. reads the latest committed snapshot (never a caller-held status)
//! 3. validates the requested label against the target kind's status set
//! 4. computes the transition and commits it with a compare-and-swap on
//!    the user's status entry, re-reading on conflict up to
//!    `max_conflict_retries` times

use crate::auth::Authenticator;
use crate::config::EngagementConfig;
use crate::error::{EngagementError, Result};
use dashmap::DashMap;
use engagement_core::{AttendanceEngine, EngagementTarget, Status, StatusSet};
use engagement_store::{SnapshotStream, StatusStore, StatusWrite, StoreError};
use std::future::Future;
use std::sync::Arc;

/// Authenticated, validating front door to a [`StatusStore`]
///
/// # Example
///
/// ```rust,ignore
/// use engagement_sdk::{EngagementClient, EngagementConfig, MemoryStore, SessionAuthenticator};
/// use std::sync::Arc;
///
/// let auth = Arc::new(SessionAuthenticator::signed_in("ada"));
/// let client = EngagementClient::new(Arc::new(MemoryStore::new()), auth, EngagementConfig::default())?;
///
/// client.create_target("spring-fair", "event").await?;
/// let committed = client.toggle("spring-fair", "going").await?;
/// assert_eq!(committed.count("going"), 1);
/// ```
pub struct EngagementClient<S> {
    store: Arc<S>,
    auth: Arc<dyn Authenticator>,
    /// Engine per target kind
    engines: DashMap<String, AttendanceEngine>,
    config: EngagementConfig,
}

impl<S: StatusStore> EngagementClient<S> {
    /// Create a client; fails on an invalid configuration
    pub fn new(store: Arc<S>, auth: Arc<dyn Authenticator>, config: EngagementConfig) -> Result<Self> {
        config.validate()?;

        let engines = DashMap::new();
        for set in &config.status_sets {
            engines.insert(set.kind().to_string(), AttendanceEngine::new(set.clone()));
        }

        Ok(Self {
            store,
            auth,
            engines,
            config,
        })
    }

    /// Add or replace the status set for a target kind
    pub fn register(&self, status_set: StatusSet) -> Result<()> {
        if status_set.is_empty() {
            return Err(EngagementError::Config(format!(
                "status set for '{}' has no labels",
                status_set.kind()
            )));
        }
        self.engines
            .insert(status_set.kind().to_string(), AttendanceEngine::new(status_set));
        Ok(())
    }

    pub fn auth(&self) -> &Arc<dyn Authenticator> {
        &self.auth
    }

    pub fn config(&self) -> &EngagementConfig {
        &self.config
    }

    /// Signed-in user id or `Unauthenticated`
    pub fn current_user(&self) -> Result<String> {
        self.auth.current_user_id().ok_or(EngagementError::Unauthenticated)
    }

    /// Status set configured for `kind`
    pub fn status_set(&self, kind: &str) -> Result<StatusSet> {
        Ok(self.engine_for(kind)?.status_set().clone())
    }

    /// Create a target of a configured kind with zeroed counters
    pub async fn create_target(&self, target_id: &str, kind: &str) -> Result<EngagementTarget> {
        let status_set = self.status_set(kind)?;
        self.guarded(self.store.create_target(target_id, &status_set)).await
    }

    /// Latest committed snapshot
    pub async fn snapshot(&self, target_id: &str) -> Result<EngagementTarget> {
        self.guarded(self.store.get_snapshot(target_id)).await
    }

    /// The signed-in user's committed status; `None` when signed out
    pub async fn status_of(&self, target_id: &str) -> Result<Option<Status>> {
        let Some(user_id) = self.auth.current_user_id() else {
            return Ok(None);
        };
        let snapshot = self.snapshot(target_id).await?;
        Ok(snapshot.status_of(&user_id).cloned())
    }

    /// Push stream of committed snapshots
    pub async fn subscribe(&self, target_id: &str) -> Result<SnapshotStream> {
        self.guarded(self.store.subscribe(target_id)).await
    }

    /// Remove a target (moderation)
    pub async fn delete_target(&self, target_id: &str) -> Result<()> {
        self.guarded(self.store.delete_target(target_id)).await
    }

    /// Toggle the signed-in user's status on a target.
    ///
    /// Selecting the held status clears it; selecting another moves the
    /// user. Returns the committed snapshot.
    pub async fn toggle(&self, target_id: &str, label: &str) -> Result<EngagementTarget> {
        let user_id = self.current_user()?;
        let mut attempt = 0;

        loop {
            let snapshot = self.snapshot(target_id).await?;
            let engine = self.engine_for(&snapshot.kind)?;
            let requested = engine.status_set().parse(label)?;

            let current = snapshot.status_of(&user_id).cloned();
            let transition = engine.request(current.as_ref(), &requested)?;
            let write = StatusWrite::new(current, transition.new_status.clone());

            match self
                .guarded(
                    self.store
                        .apply_atomic(target_id, &user_id, write, transition.count_deltas),
                )
                .await
            {
                Ok(committed) => {
                    tracing::debug!(
                        target_id,
                        user_id = %user_id,
                        new_status = ?transition.new_status,
                        version = committed.version,
                        "status toggled"
                    );
                    return Ok(committed);
                }
                Err(EngagementError::Conflict(detail)) if attempt < self.config.max_conflict_retries => {
                    attempt += 1;
                    tracing::warn!(target_id, user_id = %user_id, attempt, %detail, "status moved underneath toggle, re-reading");
                }
                Err(err) => {
                    tracing::error!(target_id, user_id = %user_id, error = %err, "status toggle failed");
                    return Err(err);
                }
            }
        }
    }

    fn engine_for(&self, kind: &str) -> Result<AttendanceEngine> {
        self.engines
            .get(kind)
            .map(|engine| engine.clone())
            .ok_or_else(|| EngagementError::UnknownKind(kind.to_string()))
    }

    /// Run a store call under the configured timeout
    async fn guarded<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = engagement_store::Result<T>>,
    {
        match tokio::time::timeout(self.config.store_timeout(), call).await {
            Ok(result) => result.map_err(EngagementError::from),
            Err(_) => Err(StoreError::Unavailable(format!(
                "no response within {}ms",
                self.config.store_timeout_ms
            ))
            .into()),
        }
    }
}
