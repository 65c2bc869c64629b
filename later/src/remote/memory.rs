//! In-process implementation of [`RemoteStore`].
//!
//! Holds task documents in memory and pushes a fresh full snapshot to
//! every subscriber of the owning user after each mutation, the way a
//! real-time document backend does. Stands in for the cloud store in
//! tests and demos.

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use uuid::Uuid;

use later_model::{DayKey, RawTaskRecord, Task, TaskDraft, TaskId, TaskPatch, UserId};

use super::{RemoteError, RemoteStore, SnapshotResult};

/// Default buffer size for subscription channels.
const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// A stored task document: the owning user, the grouping day, and the task.
#[derive(Debug, Clone)]
struct Doc {
    user: UserId,
    day: DayKey,
    task: Task,
}

struct Subscriber {
    user: UserId,
    tx: mpsc::Sender<SnapshotResult>,
}

/// In-memory document store with per-user snapshot subscriptions.
///
/// Documents keep insertion order, so snapshots replay the order the
/// backend saw the inserts in.
pub struct MemoryRemoteStore {
    docs: Mutex<Vec<Doc>>,
    subscribers: Mutex<Vec<Subscriber>>,
    channel_capacity: usize,
}

impl Default for MemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemoteStore {
    /// Creates an empty store with the default subscription buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::with_channel_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates an empty store with a custom subscription buffer size.
    #[must_use]
    pub fn with_channel_capacity(channel_capacity: usize) -> Self {
        Self {
            docs: Mutex::new(Vec::new()),
            subscribers: Mutex::new(Vec::new()),
            channel_capacity,
        }
    }

    /// Number of documents currently stored for `user`.
    #[must_use]
    pub fn document_count(&self, user: &UserId) -> usize {
        self.docs.lock().iter().filter(|d| d.user == *user).count()
    }

    fn snapshot_for(&self, user: &UserId) -> Vec<RawTaskRecord> {
        self.docs
            .lock()
            .iter()
            .filter(|d| d.user == *user)
            .map(|d| RawTaskRecord::from_task(d.day, &d.task))
            .collect()
    }

    /// Pushes a fresh snapshot to every live subscriber of `user`.
    fn notify(&self, user: &UserId) {
        let snapshot = self.snapshot_for(user);
        self.subscribers.lock().retain(|sub| {
            if sub.user != *user {
                return true;
            }
            match sub.tx.try_send(Ok(snapshot.clone())) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Closed(_)) => false,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::debug!(user = %user, "subscriber lagging, snapshot dropped");
                    true
                }
            }
        });
    }
}

impl RemoteStore for MemoryRemoteStore {
    async fn query(&self, user: &UserId) -> Result<Vec<RawTaskRecord>, RemoteError> {
        Ok(self.snapshot_for(user))
    }

    async fn subscribe(
        &self,
        user: &UserId,
    ) -> Result<mpsc::Receiver<SnapshotResult>, RemoteError> {
        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let initial = self.snapshot_for(user);
        if tx.try_send(Ok(initial)).is_err() {
            return Err(RemoteError::Unavailable(
                "subscription channel rejected initial snapshot".to_string(),
            ));
        }
        self.subscribers.lock().push(Subscriber {
            user: user.clone(),
            tx,
        });
        Ok(rx)
    }

    async fn insert(
        &self,
        user: &UserId,
        day: DayKey,
        draft: &TaskDraft,
    ) -> Result<RawTaskRecord, RemoteError> {
        let id = TaskId::confirmed(Uuid::now_v7().to_string());
        let task = Task::from_draft(id, draft.clone(), Some(user.clone()));
        let record = RawTaskRecord::from_task(day, &task);
        self.docs.lock().push(Doc {
            user: user.clone(),
            day,
            task,
        });
        self.notify(user);
        Ok(record)
    }

    async fn patch_fields(&self, id: &TaskId, patch: &TaskPatch) -> Result<(), RemoteError> {
        let user = {
            let mut docs = self.docs.lock();
            let doc = docs
                .iter_mut()
                .find(|d| d.task.id == *id)
                .ok_or_else(|| RemoteError::NotFound(id.to_string()))?;
            doc.task.apply_patch(patch);
            doc.user.clone()
        };
        self.notify(&user);
        Ok(())
    }

    async fn set_completion(&self, id: &TaskId, completed: bool) -> Result<(), RemoteError> {
        let user = {
            let mut docs = self.docs.lock();
            let doc = docs
                .iter_mut()
                .find(|d| d.task.id == *id)
                .ok_or_else(|| RemoteError::NotFound(id.to_string()))?;
            doc.task.completed = completed;
            doc.task.updated_at = Utc::now();
            doc.user.clone()
        };
        self.notify(&user);
        Ok(())
    }

    async fn remove(&self, id: &TaskId) -> Result<(), RemoteError> {
        let user = {
            let mut docs = self.docs.lock();
            let pos = docs
                .iter()
                .position(|d| d.task.id == *id)
                .ok_or_else(|| RemoteError::NotFound(id.to_string()))?;
            docs.remove(pos).user
        };
        self.notify(&user);
        Ok(())
    }
}
