//! Optimistic status binding
//!
//! Gives a UI immediate feedback for a status toggle, then reconciles with
//! the store:
//!
//! ```text
//! Idle --action--> Predicted --commit ok--> Confirmed --> Idle
//!                      |
//!                      +--commit failed--> RolledBack --> Idle
//! ```
//!
//! - The prediction applies the same transition rules as the store to the
//!   last known view, so the UI moves before the round trip completes.
//! - On success the committed snapshot replaces the view, whatever the
//!   prediction said.
//! - On failure the view is restored to exactly what it was before the
//!   prediction.
//! - One commit is in flight at a time; further toggles wait their turn and
//!   predict from the resolved view. The turn belongs to the commit, not the
//!   caller, so a dropped toggle still blocks the next one until it lands.
//! - Pushed snapshots replace the view while idle. While a toggle is in
//!   flight they are only recorded; the toggle's own result decides, and a
//!   rolled back view gives way to any newer recorded snapshot.

use crate::client::EngagementClient;
use crate::error::{EngagementError, Result};
use engagement_core::{compute_transition, EngagementTarget, Status, StatusSet, Transition};
use engagement_store::StatusStore;
use futures::StreamExt;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Where the binding is in the optimistic cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Showing authoritative state
    Idle,
    /// Showing a prediction while a commit is in flight
    Predicted,
    /// Commit succeeded, authoritative snapshot applied
    Confirmed,
    /// Commit failed, prediction undone
    RolledBack,
}

/// What the UI renders for one user on one target
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LocalView {
    /// The user's status
    pub status: Option<Status>,
    /// Counter per status
    pub counts: BTreeMap<Status, u64>,
    /// Version of the snapshot this view came from
    pub version: u64,
}

impl LocalView {
    /// Project a committed snapshot onto one user (`None` = signed out)
    pub fn from_snapshot(snapshot: &EngagementTarget, user_id: Option<&str>) -> Self {
        Self {
            status: user_id.and_then(|user| snapshot.status_of(user).cloned()),
            counts: snapshot.counts_by_status.clone(),
            version: snapshot.version,
        }
    }

    pub fn count(&self, status: &str) -> u64 {
        self.counts.get(status).copied().unwrap_or(0)
    }

    /// Apply a predicted transition. Counters saturate at zero: the view is
    /// a hint and the next snapshot overwrites it anyway.
    fn predict(&mut self, transition: &Transition) {
        for (status, delta) in &transition.count_deltas {
            let count = self.counts.entry(status.clone()).or_insert(0);
            *count = count.saturating_add_signed(*delta);
        }
        self.status = transition.new_status.clone();
    }
}

/// Observable binding state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingState {
    pub phase: Phase,
    /// What the UI shows (may be a prediction)
    pub view: LocalView,
    /// Newest authoritative view seen
    pub confirmed: LocalView,
    /// Target is gone or the view could not be refreshed
    pub stale: bool,
}

/// Undoes a prediction whose toggle future was dropped mid-flight.
///
/// The commit still runs on its own task; the view falls back to the last
/// authoritative state until the next snapshot arrives.
struct PredictionGuard<'a> {
    state: &'a watch::Sender<BindingState>,
    armed: bool,
}

impl PredictionGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PredictionGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state.send_modify(|state| {
                state.view = state.confirmed.clone();
                state.phase = Phase::Idle;
            });
        }
    }
}

/// Optimistic view of one target for the signed-in user
pub struct OptimisticBinding<S> {
    client: Arc<EngagementClient<S>>,
    target_id: String,
    status_set: StatusSet,
    /// Serializes commits (tokio's mutex is FIFO)
    turn: Arc<Mutex<()>>,
    state: watch::Sender<BindingState>,
}

impl<S: StatusStore + 'static> OptimisticBinding<S> {
    /// Load the target and start idle on its committed state
    pub async fn bind(client: Arc<EngagementClient<S>>, target_id: impl Into<String>) -> Result<Self> {
        let target_id = target_id.into();
        let snapshot = client.snapshot(&target_id).await?;
        let status_set = client.status_set(&snapshot.kind)?;
        let view = LocalView::from_snapshot(&snapshot, client.auth().current_user_id().as_deref());

        let (state, _) = watch::channel(BindingState {
            phase: Phase::Idle,
            view: view.clone(),
            confirmed: view,
            stale: false,
        });

        Ok(Self {
            client,
            target_id,
            status_set,
            turn: Arc::new(Mutex::new(())),
            state,
        })
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    pub fn phase(&self) -> Phase {
        self.state.borrow().phase
    }

    pub fn view(&self) -> LocalView {
        self.state.borrow().view.clone()
    }

    pub fn is_stale(&self) -> bool {
        self.state.borrow().stale
    }

    pub fn state(&self) -> BindingState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn watch(&self) -> watch::Receiver<BindingState> {
        self.state.subscribe()
    }

    /// Toggle the signed-in user's status with an optimistic prediction.
    ///
    /// Returns the committed snapshot, or the store error after rolling the
    /// view back.
    pub async fn toggle(&self, label: &str) -> Result<EngagementTarget> {
        self.client.current_user()?;
        let requested = self.status_set.parse(label)?;

        let turn = Arc::clone(&self.turn).lock_owned().await;
        let interaction = Uuid::new_v4();

        let before = self.state.borrow().view.clone();
        let transition = compute_transition(before.status.as_ref(), &requested);
        self.state.send_modify(|state| {
            state.view.predict(&transition);
            state.phase = Phase::Predicted;
        });
        tracing::debug!(
            %interaction,
            target_id = %self.target_id,
            predicted = ?transition.new_status,
            "predicted status change"
        );

        let guard = PredictionGuard {
            state: &self.state,
            armed: true,
        };

        // Own task, so the commit completes even if this future is dropped.
        // The task carries the turn and hands it back once the commit settles.
        let client = Arc::clone(&self.client);
        let target_id = self.target_id.clone();
        let label = requested.as_str().to_string();
        let call = tokio::spawn(async move {
            let result = client.toggle(&target_id, &label).await;
            (result, turn)
        });

        let (outcome, _turn) = match call.await {
            Ok((result, turn)) => (result, Some(turn)),
            Err(join_err) => (Err(EngagementError::StoreUnavailable(join_err.to_string())), None),
        };
        guard.disarm();

        match outcome {
            Ok(committed) => {
                self.confirm(&committed, &transition, interaction);
                Ok(committed)
            }
            Err(err) => {
                self.roll_back(before, &err, interaction);
                Err(err)
            }
        }
    }

    /// Feed an authoritative snapshot (typically from the store subscription)
    pub fn apply_snapshot(&self, snapshot: &EngagementTarget) {
        let incoming = LocalView::from_snapshot(snapshot, self.user_id().as_deref());

        self.state.send_if_modified(|state| {
            if incoming.version < state.confirmed.version {
                return false;
            }
            if state.phase == Phase::Idle {
                state.view = incoming.clone();
            }
            state.confirmed = incoming;
            true
        });
    }

    /// Re-read the target; marks the binding stale if it is gone
    pub async fn refresh(&self) -> Result<()> {
        match self.client.snapshot(&self.target_id).await {
            Ok(snapshot) => {
                self.apply_snapshot(&snapshot);
                self.state.send_if_modified(|state| std::mem::replace(&mut state.stale, false));
                Ok(())
            }
            Err(err) => {
                if err.requires_refresh() {
                    self.mark_stale();
                }
                Err(err)
            }
        }
    }

    /// Follow the store subscription in the background.
    ///
    /// The task holds only a weak reference: dropping the last `Arc` to the
    /// binding stops it at the next update. When the stream ends (target
    /// deleted) the binding is marked stale.
    pub async fn spawn_sync(self: &Arc<Self>) -> Result<JoinHandle<()>> {
        let mut updates = self.client.subscribe(&self.target_id).await?;
        let binding = Arc::downgrade(self);

        Ok(tokio::spawn(async move {
            while let Some(snapshot) = updates.next().await {
                let Some(binding) = binding.upgrade() else {
                    return;
                };
                binding.apply_snapshot(&snapshot);
            }

            if let Some(binding) = binding.upgrade() {
                tracing::debug!(target_id = %binding.target_id, "snapshot stream ended");
                binding.mark_stale();
            }
        }))
    }

    fn confirm(&self, committed: &EngagementTarget, transition: &Transition, interaction: Uuid) {
        let authoritative = LocalView::from_snapshot(committed, self.user_id().as_deref());

        self.state.send_modify(|state| {
            if authoritative.status != transition.new_status
                || authoritative.counts != state.view.counts
            {
                tracing::debug!(%interaction, target_id = %self.target_id, "authoritative state differs from prediction");
            }
            if authoritative.version >= state.confirmed.version {
                state.confirmed = authoritative;
            }
            state.view = state.confirmed.clone();
            state.phase = Phase::Confirmed;
            state.stale = false;
        });
        self.state.send_modify(|state| state.phase = Phase::Idle);
    }

    fn roll_back(&self, before: LocalView, err: &EngagementError, interaction: Uuid) {
        tracing::warn!(%interaction, target_id = %self.target_id, error = %err, "rolling back prediction");

        let before_version = before.version;
        self.state.send_modify(|state| {
            state.view = before;
            state.phase = Phase::RolledBack;
            if err.requires_refresh() {
                state.stale = true;
            }
        });
        self.state.send_modify(|state| {
            // A snapshot pushed while the commit was in flight wins over the restored view
            if state.confirmed.version > before_version {
                state.view = state.confirmed.clone();
            }
            state.phase = Phase::Idle;
        });
    }

    fn mark_stale(&self) {
        self.state.send_if_modified(|state| !std::mem::replace(&mut state.stale, true));
    }

    fn user_id(&self) -> Option<String> {
        self.client.auth().current_user_id()
    }
}
