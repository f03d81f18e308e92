//! Remote sync coordinator: one-shot reconciliation at sign-in and
//! scheduling of remote writes.
//!
//! All remote writes go through a single serialized writer lock, so a
//! today-only partial write can never interleave with a full write that is
//! still in flight.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, error, info, warn};
use serde_json::json;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use super::model::{
    AuthEvent, IdentityProvider, RemoteDocument, RemoteDocumentStore, RemoteTimestamp, SyncMeta,
};
use super::WRITE_DEBOUNCE_MS;
use crate::cache::HabitCache;
use crate::errors::Result;
use crate::habits::{CompletionMap, SharedState};
use crate::utils::today_local;

/// Owns the authenticated user reference and the pending-write timer, and
/// performs every remote read and write on behalf of the habit store.
#[derive(Clone)]
pub struct SyncCoordinator {
    inner: Arc<SyncInner>,
}

struct SyncInner {
    state: SharedState,
    cache: HabitCache,
    remote: Arc<dyn RemoteDocumentStore>,
    identity: Option<Arc<dyn IdentityProvider>>,
    user: Mutex<Option<String>>,
    pending: Mutex<Option<JoinHandle<()>>>,
    listener: Mutex<Option<JoinHandle<()>>>,
    writer: tokio::sync::Mutex<()>,
}

impl SyncCoordinator {
    pub fn new(
        state: SharedState,
        cache: HabitCache,
        remote: Arc<dyn RemoteDocumentStore>,
        identity: Option<Arc<dyn IdentityProvider>>,
    ) -> Self {
        Self {
            inner: Arc::new(SyncInner {
                state,
                cache,
                remote,
                identity,
                user: Mutex::new(None),
                pending: Mutex::new(None),
                listener: Mutex::new(None),
                writer: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Subscribe to identity change notifications. Replaces any previous
    /// subscription.
    pub fn start(&self, mut events: UnboundedReceiver<AuthEvent>) {
        let coordinator = self.clone();
        let handle = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                coordinator.handle_event(event).await;
            }
        });
        if let Some(previous) = self
            .inner
            .listener
            .lock()
            .expect("listener lock")
            .replace(handle)
        {
            previous.abort();
        }
    }

    /// End the identity subscription and cancel any pending write timer.
    pub fn stop(&self) {
        if let Some(handle) = self.inner.listener.lock().expect("listener lock").take() {
            handle.abort();
        }
        self.inner.cancel_pending();
    }

    /// Process a single identity event. Hosts that drive identity themselves
    /// can call this instead of [`start`](Self::start).
    pub async fn handle_event(&self, event: AuthEvent) {
        match event {
            AuthEvent::SignedIn(user_id) => self.reconcile(&user_id).await,
            AuthEvent::SignedOut => self.inner.signed_out(),
        }
    }

    /// Currently authenticated user, falling back to the identity provider's
    /// best-effort lookup.
    pub fn current_user(&self) -> Option<String> {
        self.inner.current_user()
    }

    /// Schedule a full write of current local state. Immediate writes cancel
    /// any pending debounce timer and run now (fire-and-forget); debounced
    /// writes re-arm the timer. No-op when signed out.
    pub fn schedule_write(&self, immediate: bool) {
        let Some(user) = self.inner.current_user() else {
            debug!("Skipping habits write: no authenticated user");
            return;
        };
        self.inner.cancel_pending();

        let inner = Arc::clone(&self.inner);
        if immediate {
            tokio::spawn(async move {
                if let Err(e) = inner.write_full(&user).await {
                    error!("Immediate habits write failed: {}", e);
                }
            });
            return;
        }

        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(WRITE_DEBOUNCE_MS)).await;
            if let Err(e) = inner.write_full(&user).await {
                error!("Debounced habits write failed: {}", e);
            }
        });
        *self.inner.pending.lock().expect("pending timer lock") = Some(handle);
    }

    /// Cancel any pending timer and perform the full write now, returning
    /// the outcome to the caller.
    pub async fn sync_now(&self) -> Result<()> {
        self.inner.cancel_pending();
        let Some(user) = self.inner.current_user() else {
            return Ok(());
        };
        self.inner.write_full(&user).await
    }

    /// Write only today's completion entries, deep-merged under
    /// `completions`. A no-op when nothing was recorded today or when no
    /// user is authenticated.
    pub async fn sync_today(&self) -> Result<()> {
        self.inner.sync_today().await
    }

    /// Fire-and-forget write of only the habits array.
    pub fn push_habits(&self) {
        let Some(user) = self.inner.current_user() else {
            debug!("Skipping habits array write: no authenticated user");
            return;
        };
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            if let Err(e) = inner.write_habits(&user).await {
                error!("Habits array write failed: {}", e);
            }
        });
    }

    /// Fire-and-forget targeted removal of a habit from the remote document,
    /// falling back to a plain habits overwrite when the targeted update
    /// fails (e.g. the document does not yet exist).
    pub fn push_remove(&self, habit_id: &str) {
        let Some(user) = self.inner.current_user() else {
            warn!(
                "No authenticated user; skipping remote cleanup for habit {}",
                habit_id
            );
            return;
        };
        let inner = Arc::clone(&self.inner);
        let habit_id = habit_id.to_string();
        tokio::spawn(async move {
            inner.remove_remote(&user, &habit_id).await;
        });
    }

    /// One-shot reconciliation: remote wins on `updatedAt >= local`,
    /// otherwise local state is pushed. Fetch errors degrade to local-only
    /// operation.
    async fn reconcile(&self, user_id: &str) {
        *self.inner.user.lock().expect("user lock") = Some(user_id.to_string());

        let document = match self.inner.remote.fetch(user_id).await {
            Ok(document) => document,
            Err(e) => {
                error!("Habits document fetch failed for user {}: {}", user_id, e);
                return;
            }
        };

        let Some(document) = document else {
            info!(
                "No remote habits document for user {}; pushing local state",
                user_id
            );
            self.schedule_write(true);
            return;
        };

        let remote_updated = document
            .updated_at
            .map(RemoteTimestamp::as_millis)
            .unwrap_or(0);
        let local_updated = self.inner.cache.load_meta().updated_at;

        if remote_updated >= local_updated {
            let RemoteDocument {
                habits,
                completions,
                ..
            } = document;
            {
                let mut state = self.inner.state.lock().expect("habit state lock");
                state.habits = habits.clone();
                state.completions = completions.clone();
            }
            self.inner.cache.save_habits(&habits);
            self.inner.cache.save_completions(&completions);
            self.inner.cache.save_meta(&SyncMeta {
                updated_at: remote_updated,
            });
            info!(
                "Adopted remote habits document for user {} (updatedAt {})",
                user_id, remote_updated
            );
        } else {
            info!(
                "Local habits state is newer for user {}; pushing to remote",
                user_id
            );
            self.schedule_write(true);
        }
    }
}

impl SyncInner {
    fn current_user(&self) -> Option<String> {
        if let Some(user) = self.user.lock().expect("user lock").clone() {
            return Some(user);
        }
        self.identity.as_ref().and_then(|p| p.current_user())
    }

    fn cancel_pending(&self) {
        if let Some(handle) = self.pending.lock().expect("pending timer lock").take() {
            handle.abort();
        }
    }

    fn signed_out(&self) {
        self.cancel_pending();
        *self.user.lock().expect("user lock") = None;
        debug!("Signed out; habit state remains available offline");
    }

    /// Full write: the entire habits array and completion map, merged at the
    /// top level. On success the adopted server timestamp is persisted.
    async fn write_full(&self, user_id: &str) -> Result<()> {
        let _writer = self.writer.lock().await;
        let (habits, completions) = {
            let state = self.state.lock().expect("habit state lock");
            (state.habits.clone(), state.completions.clone())
        };
        let fields = json!({ "habits": habits, "completions": completions });
        let updated_at = self.remote.merge_fields(user_id, fields).await?;
        self.cache.save_meta(&SyncMeta { updated_at });
        debug!("Wrote full habits document for user {}", user_id);
        Ok(())
    }

    async fn write_habits(&self, user_id: &str) -> Result<()> {
        let _writer = self.writer.lock().await;
        let habits = {
            let state = self.state.lock().expect("habit state lock");
            state.habits.clone()
        };
        let updated_at = self
            .remote
            .merge_fields(user_id, json!({ "habits": habits }))
            .await?;
        self.cache.save_meta(&SyncMeta { updated_at });
        Ok(())
    }

    async fn sync_today(&self) -> Result<()> {
        let Some(user) = self.current_user() else {
            warn!("sync_today called with no authenticated user");
            return Ok(());
        };
        let today = today_local();
        let partial: CompletionMap = {
            let state = self.state.lock().expect("habit state lock");
            state
                .completions
                .iter()
                .filter_map(|(habit_id, days)| {
                    days.get(&today)
                        .filter(|day| !day.is_empty())
                        .map(|day| (habit_id.clone(), BTreeMap::from([(today, *day)])))
                })
                .collect()
        };
        if partial.is_empty() {
            debug!("sync_today: nothing recorded for {}", today);
            return Ok(());
        }

        let _writer = self.writer.lock().await;
        let updated_at = self
            .remote
            .merge_completions(&user, serde_json::to_value(&partial)?)
            .await?;
        self.cache.save_meta(&SyncMeta { updated_at });
        info!("Wrote today's completions for user {}", user);
        Ok(())
    }

    /// Targeted remote removal: replace `habits` and delete the habit's
    /// completion sub-map in one atomic update, falling back to a plain
    /// habits overwrite when the targeted update fails.
    async fn remove_remote(&self, user_id: &str, habit_id: &str) {
        let _writer = self.writer.lock().await;
        let habits = {
            let state = self.state.lock().expect("habit state lock");
            state.habits.clone()
        };
        let set = json!({ "habits": habits });
        let delete_path = format!("completions.{}", habit_id);
        match self
            .remote
            .update_fields(user_id, set.clone(), &[delete_path])
            .await
        {
            Ok(updated_at) => self.cache.save_meta(&SyncMeta { updated_at }),
            Err(e) => {
                info!(
                    "Targeted removal of habit {} failed ({}); falling back to habits overwrite",
                    habit_id, e
                );
                match self.remote.merge_fields(user_id, set).await {
                    Ok(updated_at) => self.cache.save_meta(&SyncMeta { updated_at }),
                    Err(e) => error!(
                        "Failed to persist removal of habit {} remotely: {}",
                        habit_id, e
                    ),
                }
            }
        }
    }
}
