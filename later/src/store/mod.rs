//! The task synchronization store.
//!
//! Owns the in-memory, date-bucketed task collection for the current user
//! and keeps it consistent with the remote document store when a user is
//! signed in, falling back to the local cache otherwise. All mutations are
//! optimistic: the in-memory collection is updated synchronously, the
//! cache write and the remote write run on spawned tasks, and the UI never
//! blocks on a network round-trip.
//!
//! Failed remote legs are NOT rolled back. The optimistic state stays (a
//! not-yet-inserted task keeps its provisional `local-` id), the user gets
//! one alert per failure, and the next snapshot or [`TaskStore::refresh`]
//! reconciles — a subscription snapshot always replaces the whole
//! collection.
//!
//! The store is an explicit object: construct it once at application start
//! and hand the `Arc` to whoever needs it.

mod sync;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use later_model::{DayKey, DayMarker, Task, TaskBook, TaskDraft, TaskId, TaskPatch, UserId};

use crate::alert::{AlertKind, AlertSink};
use crate::local::{LocalStore, TASKS_CACHE_KEY};
use crate::remote::RemoteStore;

/// A search result: a matching task annotated with its day bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    /// The bucket the task lives in.
    pub day: DayKey,
    /// The matching task.
    pub task: Task,
}

/// Mutable store state, guarded by one lock that is never held across an
/// await point — mutation application and snapshot application can never
/// interleave mid-operation.
pub(crate) struct StoreState {
    pub(crate) book: TaskBook,
    pub(crate) user: Option<UserId>,
    pub(crate) loading: bool,
    pub(crate) last_sync_error: Option<String>,
    pub(crate) cache_loaded: bool,
}

/// The task synchronization store.
///
/// `L` is the local durable cache, `R` the remote document store. Both are
/// subordinate replicas during a session: the in-memory collection is the
/// source of truth, written through to the cache after every change and
/// reconciled against remote snapshots.
pub struct TaskStore<L, R> {
    pub(crate) local: L,
    pub(crate) remote: R,
    pub(crate) alerts: AlertSink,
    pub(crate) state: Mutex<StoreState>,
    pub(crate) subscription: Mutex<Option<JoinHandle<()>>>,
}

impl<L, R> TaskStore<L, R> {
    /// Creates a store over the given collaborators.
    ///
    /// The store starts loading; call [`TaskStore::watch_identity`] to let
    /// it resolve into remote-backed or local-only mode, or
    /// [`TaskStore::refresh`] to drive a one-shot load.
    pub fn new(local: L, remote: R, alerts: AlertSink) -> Self {
        Self {
            local,
            remote,
            alerts,
            state: Mutex::new(StoreState {
                book: TaskBook::new(),
                user: None,
                loading: true,
                last_sync_error: None,
                cache_loaded: false,
            }),
            subscription: Mutex::new(None),
        }
    }

    /// Tasks in the given day's bucket, in insertion order.
    ///
    /// Returns owned copies; inspecting them cannot disturb store state.
    #[must_use]
    pub fn tasks_for_day(&self, day: DayKey) -> Vec<Task> {
        self.state.lock().book.get(&day).cloned().unwrap_or_default()
    }

    /// Calendar markers for every day with at least one task.
    ///
    /// A pure projection recomputed on every call.
    #[must_use]
    pub fn marked_days(&self) -> HashMap<DayKey, DayMarker> {
        self.state
            .lock()
            .book
            .iter()
            .filter(|(_, tasks)| !tasks.is_empty())
            .map(|(day, tasks)| {
                (
                    *day,
                    DayMarker {
                        task_count: tasks.len(),
                        completed_count: tasks.iter().filter(|t| t.completed).count(),
                    },
                )
            })
            .collect()
    }

    /// Case-insensitive substring search over titles and descriptions
    /// across all day buckets.
    ///
    /// A blank term matches nothing. Results are sorted most recent day
    /// first; within a day they keep bucket (insertion) order.
    #[must_use]
    pub fn search(&self, term: &str) -> Vec<SearchHit> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        let mut hits: Vec<SearchHit> = {
            let state = self.state.lock();
            state
                .book
                .iter()
                .flat_map(|(day, tasks)| {
                    tasks
                        .iter()
                        .filter(|t| {
                            t.title.to_lowercase().contains(&needle)
                                || t.description.to_lowercase().contains(&needle)
                        })
                        .map(|t| SearchHit {
                            day: *day,
                            task: t.clone(),
                        })
                })
                .collect()
        };
        hits.sort_by(|a, b| b.day.cmp(&a.day));
        hits
    }

    /// True while the initial load or subscription setup is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.lock().loading
    }

    /// The most recent synchronization failure, if any.
    #[must_use]
    pub fn last_sync_error(&self) -> Option<String> {
        self.state.lock().last_sync_error.clone()
    }

    /// The signed-in user the collection is keyed on, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<UserId> {
        self.state.lock().user.clone()
    }
}

impl<L, R> TaskStore<L, R>
where
    L: LocalStore + 'static,
    R: RemoteStore + 'static,
{
    /// Adds a task to the given day's bucket.
    ///
    /// The task appears immediately under a provisional id. When a user is
    /// signed in the remote insert runs in the background and swaps in the
    /// backend-assigned id on success; with nobody signed in the operation
    /// is purely local.
    ///
    /// Must be called within a Tokio runtime.
    pub fn add_task(self: &Arc<Self>, day: DayKey, draft: TaskDraft) {
        let (task, user) = {
            let mut state = self.state.lock();
            let user = state.user.clone();
            let task = Task::from_draft(TaskId::provisional(), draft.clone(), user.clone());
            state.book.entry(day).or_default().push(task.clone());
            (task, user)
        };
        tracing::debug!(day = %day, id = %task.id, "task added");

        let store = Arc::clone(self);
        tokio::spawn(async move {
            store.write_cache().await;
            let Some(user) = user else { return };
            match store.remote.insert(&user, day, &draft).await {
                Ok(record) => {
                    store.confirm_insert(day, &task.id, record);
                    store.write_cache().await;
                }
                Err(err) => {
                    tracing::warn!(day = %day, error = %err, "remote insert failed");
                    store
                        .alerts
                        .emit(AlertKind::Add, "Could not save task. Please try again.");
                }
            }
        });
    }

    /// Flips the completion flag of a task in the given day's bucket.
    ///
    /// Unknown ids are ignored. Calling twice restores the original value.
    pub fn toggle_task(self: &Arc<Self>, day: DayKey, id: &TaskId) {
        let remote_leg = {
            let mut state = self.state.lock();
            let user = state.user.clone();
            let Some(task) = state
                .book
                .get_mut(&day)
                .and_then(|bucket| bucket.iter_mut().find(|t| t.id == *id))
            else {
                tracing::debug!(day = %day, id = %id, "toggle on unknown task ignored");
                return;
            };
            task.completed = !task.completed;
            task.updated_at = Utc::now();
            user.map(|_| (task.id.clone(), task.completed))
        };

        let store = Arc::clone(self);
        tokio::spawn(async move {
            store.write_cache().await;
            let Some((id, completed)) = remote_leg else {
                return;
            };
            if id.is_provisional() {
                // No remote document yet; the insert confirmation or the
                // next snapshot reconciles.
                return;
            }
            if let Err(err) = store.remote.set_completion(&id, completed).await {
                tracing::warn!(id = %id, error = %err, "remote completion update failed");
                store
                    .alerts
                    .emit(AlertKind::Toggle, "Could not update task. Please try again.");
            }
        });
    }

    /// Replaces the description of a task in the given day's bucket.
    pub fn set_description(self: &Arc<Self>, day: DayKey, id: &TaskId, description: &str) {
        let patch = TaskPatch {
            description: Some(description.to_string()),
            ..TaskPatch::default()
        };
        self.patch_in_bucket(day, id, patch);
    }

    /// Merges partial fields into a task, located by id across ALL day
    /// buckets (for edits made outside the task's original day context).
    ///
    /// Unknown ids and empty patches are ignored.
    pub fn update_task(self: &Arc<Self>, id: &TaskId, patch: TaskPatch) {
        if patch.is_empty() {
            return;
        }
        let remote_leg = {
            let mut state = self.state.lock();
            let user = state.user.clone();
            let Some(task) = state
                .book
                .values_mut()
                .flat_map(|bucket| bucket.iter_mut())
                .find(|t| t.id == *id)
            else {
                tracing::debug!(id = %id, "update on unknown task ignored");
                return;
            };
            task.apply_patch(&patch);
            user.map(|_| task.id.clone())
        };
        self.spawn_patch_leg(remote_leg, patch);
    }

    /// Removes a task from the given day's bucket.
    ///
    /// An id not present in the bucket leaves it unchanged.
    pub fn delete_task(self: &Arc<Self>, day: DayKey, id: &TaskId) {
        let remote_leg = {
            let mut state = self.state.lock();
            let user = state.user.clone();
            let Some(bucket) = state.book.get_mut(&day) else {
                return;
            };
            let Some(pos) = bucket.iter().position(|t| t.id == *id) else {
                tracing::debug!(day = %day, id = %id, "delete on unknown task ignored");
                return;
            };
            let removed = bucket.remove(pos);
            if bucket.is_empty() {
                state.book.remove(&day);
            }
            user.map(|_| removed.id)
        };
        tracing::debug!(day = %day, id = %id, "task deleted");

        let store = Arc::clone(self);
        tokio::spawn(async move {
            store.write_cache().await;
            let Some(id) = remote_leg else { return };
            if id.is_provisional() {
                return;
            }
            if let Err(err) = store.remote.remove(&id).await {
                tracing::warn!(id = %id, error = %err, "remote delete failed");
                store
                    .alerts
                    .emit(AlertKind::Delete, "Could not delete task. Please try again.");
            }
        });
    }

    /// Writes the current collection through to the local cache.
    ///
    /// Failures are logged and swallowed — the in-memory state stays
    /// authoritative and the next write retries from scratch.
    pub async fn write_cache(&self) {
        let book = self.state.lock().book.clone();
        let blob = match later_model::encode_book(&book) {
            Ok(blob) => blob,
            Err(err) => {
                tracing::warn!(error = %err, "task cache encode failed");
                return;
            }
        };
        if let Err(err) = self.local.set(TASKS_CACHE_KEY, &blob).await {
            tracing::warn!(error = %err, "task cache write failed");
        }
    }

    /// Bucket-scoped patch: shared body of [`TaskStore::set_description`].
    fn patch_in_bucket(self: &Arc<Self>, day: DayKey, id: &TaskId, patch: TaskPatch) {
        let remote_leg = {
            let mut state = self.state.lock();
            let user = state.user.clone();
            let Some(task) = state
                .book
                .get_mut(&day)
                .and_then(|bucket| bucket.iter_mut().find(|t| t.id == *id))
            else {
                tracing::debug!(day = %day, id = %id, "patch on unknown task ignored");
                return;
            };
            task.apply_patch(&patch);
            user.map(|_| task.id.clone())
        };
        self.spawn_patch_leg(remote_leg, patch);
    }

    /// Cache write plus the remote `patch_fields` leg, if one is due.
    fn spawn_patch_leg(self: &Arc<Self>, remote_leg: Option<TaskId>, patch: TaskPatch) {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            store.write_cache().await;
            let Some(id) = remote_leg else { return };
            if id.is_provisional() {
                return;
            }
            if let Err(err) = store.remote.patch_fields(&id, &patch).await {
                tracing::warn!(id = %id, error = %err, "remote field update failed");
                store
                    .alerts
                    .emit(AlertKind::Update, "Could not save task. Please try again.");
            }
        });
    }

    /// Swaps a provisional task's id for the one the backend assigned.
    ///
    /// Optimistic field edits made while the insert was in flight survive;
    /// only the identity fields are taken from the stored record. A task
    /// that has disappeared in the meantime (deleted, or superseded by a
    /// snapshot) is left alone.
    fn confirm_insert(
        &self,
        day: DayKey,
        provisional: &TaskId,
        record: later_model::RawTaskRecord,
    ) {
        let Some((_, stored)) = record.validate(day) else {
            tracing::warn!(id = %provisional, "insert confirmation record failed validation");
            return;
        };
        let mut state = self.state.lock();
        if let Some(task) = state
            .book
            .get_mut(&day)
            .and_then(|bucket| bucket.iter_mut().find(|t| t.id == *provisional))
        {
            tracing::debug!(provisional = %provisional, confirmed = %stored.id, "task id confirmed");
            task.id = stored.id;
            task.user = stored.user;
            task.created_at = stored.created_at;
        }
    }
}

impl<L, R> Drop for TaskStore<L, R> {
    fn drop(&mut self) {
        if let Some(handle) = self.subscription.lock().take() {
            handle.abort();
        }
    }
}
