//! Mode selection and remote synchronization for [`TaskStore`].
//!
//! The store follows the identity resolver: signed in means a standing
//! remote subscription keyed on the user, signed out means local-only.
//! Every transition tears down the previous subscription first, so a
//! snapshot can never land in a stale context.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use later_model::{DayKey, RawTaskRecord, TaskBook, UserId};

use crate::alert::AlertKind;
use crate::identity::AuthState;
use crate::local::{LocalStore, TASKS_CACHE_KEY};
use crate::remote::RemoteStore;

use super::TaskStore;

impl<L, R> TaskStore<L, R>
where
    L: LocalStore + 'static,
    R: RemoteStore + 'static,
{
    /// Spawns the identity-watching task.
    ///
    /// The task applies the channel's current state, then every transition
    /// as it arrives. It holds the store alive until the identity channel
    /// closes or the returned handle is aborted.
    pub fn watch_identity(self: &Arc<Self>, mut auth: watch::Receiver<AuthState>) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                let state = auth.borrow_and_update().clone();
                store.apply_auth(state).await;
                if auth.changed().await.is_err() {
                    tracing::debug!("identity channel closed");
                    break;
                }
            }
        })
    }

    /// Forces a full reload, replacing the in-memory collection.
    ///
    /// Signed in: one-shot remote query, mirrored to the cache on success;
    /// on failure the user is alerted and the local cache is loaded instead
    /// of leaving the UI with stale-but-unknown state. Signed out: reload
    /// from the local cache.
    pub async fn refresh(&self) {
        let user = self.state.lock().user.clone();
        let Some(user) = user else {
            self.load_cache().await;
            return;
        };

        self.state.lock().loading = true;
        match self.remote.query(&user).await {
            Ok(records) => {
                // The user may have changed while the query was in flight.
                if self.state.lock().user.as_ref() == Some(&user) {
                    self.apply_snapshot(records);
                    self.write_cache().await;
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "task refresh failed, falling back to cache");
                self.state.lock().last_sync_error = Some(err.to_string());
                self.alerts
                    .emit(AlertKind::Refresh, "Could not load tasks. Please try again.");
                self.load_cache().await;
            }
        }
    }

    /// Reacts to one identity state. Idempotent: re-observing the current
    /// state changes nothing.
    async fn apply_auth(self: &Arc<Self>, auth: AuthState) {
        match auth {
            AuthState::Unresolved => {}
            AuthState::SignedIn(user) => {
                if self.state.lock().user.as_ref() == Some(&user) {
                    return;
                }
                tracing::info!(user = %user, "signed in, switching to remote-backed mode");
                self.stop_subscription();
                {
                    let mut state = self.state.lock();
                    state.user = Some(user.clone());
                    state.book.clear();
                    state.loading = true;
                    state.last_sync_error = None;
                }
                self.start_subscription(user).await;
            }
            AuthState::SignedOut => {
                let had_user = self.state.lock().user.is_some();
                if had_user {
                    tracing::info!("signed out, discarding the previous user's tasks");
                    self.stop_subscription();
                    {
                        let mut state = self.state.lock();
                        state.user = None;
                        state.book.clear();
                        state.loading = false;
                        state.last_sync_error = None;
                        state.cache_loaded = true;
                    }
                    // Purge the mirrored cache too: no cross-user leakage.
                    self.write_cache().await;
                } else if !self.state.lock().cache_loaded {
                    self.load_cache().await;
                }
            }
        }
    }

    /// Opens the standing subscription for `user` and spawns its consumer.
    async fn start_subscription(self: &Arc<Self>, user: UserId) {
        match self.remote.subscribe(&user).await {
            Ok(mut snapshots) => {
                let store = Arc::clone(self);
                let handle = tokio::spawn(async move {
                    while let Some(event) = snapshots.recv().await {
                        // The identity may have moved on while this event
                        // was in flight; a stale context gets nothing.
                        if store.state.lock().user.as_ref() != Some(&user) {
                            break;
                        }
                        match event {
                            Ok(records) => {
                                store.apply_snapshot(records);
                                store.write_cache().await;
                            }
                            Err(err) => {
                                tracing::warn!(error = %err, "task subscription error");
                                {
                                    let mut state = store.state.lock();
                                    state.last_sync_error = Some(err.to_string());
                                    state.loading = false;
                                }
                                store
                                    .alerts
                                    .emit(AlertKind::Sync, "Could not sync tasks. Please try again.");
                            }
                        }
                    }
                    tracing::debug!("task subscription closed");
                });
                *self.subscription.lock() = Some(handle);
            }
            Err(err) => {
                tracing::warn!(error = %err, "task subscription setup failed");
                {
                    let mut state = self.state.lock();
                    state.last_sync_error = Some(err.to_string());
                    state.loading = false;
                }
                self.alerts
                    .emit(AlertKind::Sync, "Could not sync tasks. Please try again.");
            }
        }
    }

    /// Aborts the standing subscription task, if any.
    fn stop_subscription(&self) {
        if let Some(handle) = self.subscription.lock().take() {
            handle.abort();
        }
    }

    /// Replaces the whole in-memory collection with a remote snapshot.
    ///
    /// Records are validated; malformed ones are skipped, and a record
    /// without a date lands on today's bucket. Clears `loading` and any
    /// recorded sync error.
    pub(crate) fn apply_snapshot(&self, records: Vec<RawTaskRecord>) {
        let today = DayKey::today();
        let total = records.len();
        let mut book = TaskBook::new();
        let mut skipped = 0usize;
        for record in records {
            match record.validate(today) {
                Some((day, task)) => book.entry(day).or_default().push(task),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            tracing::warn!(skipped, total, "snapshot contained malformed task records");
        }

        let mut state = self.state.lock();
        state.book = book;
        state.loading = false;
        state.last_sync_error = None;
        drop(state);
        tracing::debug!(tasks = total - skipped, "snapshot applied");
    }

    /// Replaces the in-memory collection from the local cache.
    ///
    /// A missing blob means an empty collection; an unreadable one is
    /// logged and treated as empty rather than failing the load.
    pub(crate) async fn load_cache(&self) {
        let blob = match self.local.get(TASKS_CACHE_KEY).await {
            Ok(blob) => blob,
            Err(err) => {
                tracing::warn!(error = %err, "task cache read failed");
                self.state.lock().loading = false;
                return;
            }
        };

        let book = match blob {
            Some(blob) => match later_model::decode_book(&blob) {
                Ok(decoded) => {
                    let (book, skipped) = decoded.into_tasks();
                    if skipped > 0 {
                        tracing::warn!(skipped, "cache contained malformed task records");
                    }
                    book
                }
                Err(err) => {
                    tracing::warn!(error = %err, "task cache decode failed, starting empty");
                    TaskBook::new()
                }
            },
            None => TaskBook::new(),
        };

        let mut state = self.state.lock();
        state.book = book;
        state.loading = false;
        state.cache_loaded = true;
    }
}
