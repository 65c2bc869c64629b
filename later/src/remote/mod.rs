//! Remote real-time document store abstraction.
//!
//! Mirrors the vendor SDK surface the application syncs against: one-shot
//! queries, a standing per-user subscription delivering full snapshots,
//! and per-document writes. The store behind this trait is authoritative;
//! the client mirrors it optimistically and reconciles on snapshots.
//!
//! Implementations:
//! - [`memory::MemoryRemoteStore`] — in-process document store for tests
//!   and demos

pub mod memory;

use tokio::sync::mpsc;

use later_model::{DayKey, RawTaskRecord, TaskDraft, TaskId, TaskPatch, UserId};

/// Errors that can occur during remote store operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RemoteError {
    /// The backend could not be reached or refused the operation.
    #[error("remote store unavailable: {0}")]
    Unavailable(String),
    /// No document exists with the given id.
    #[error("task document not found: {0}")]
    NotFound(String),
}

/// One delivery on a standing subscription: a full snapshot of the user's
/// task documents, or a transport-reported failure.
pub type SnapshotResult = Result<Vec<RawTaskRecord>, RemoteError>;

/// Async interface to the remote document store.
///
/// All snapshot and query results are loose [`RawTaskRecord`]s; validation
/// happens on the client at the load boundary. Unsubscribing is dropping
/// the receiver returned by [`RemoteStore::subscribe`].
pub trait RemoteStore: Send + Sync {
    /// One-shot query of all task documents owned by `user`.
    fn query(
        &self,
        user: &UserId,
    ) -> impl std::future::Future<Output = Result<Vec<RawTaskRecord>, RemoteError>> + Send;

    /// Opens a standing subscription for `user`'s documents.
    ///
    /// The current snapshot is delivered immediately, then a fresh full
    /// snapshot after every change.
    fn subscribe(
        &self,
        user: &UserId,
    ) -> impl std::future::Future<Output = Result<mpsc::Receiver<SnapshotResult>, RemoteError>> + Send;

    /// Creates a document for a new task and returns the stored record
    /// (with the id the backend assigned).
    fn insert(
        &self,
        user: &UserId,
        day: DayKey,
        draft: &TaskDraft,
    ) -> impl std::future::Future<Output = Result<RawTaskRecord, RemoteError>> + Send;

    /// Merges partial fields into an existing document.
    fn patch_fields(
        &self,
        id: &TaskId,
        patch: &TaskPatch,
    ) -> impl std::future::Future<Output = Result<(), RemoteError>> + Send;

    /// Sets the completion flag of an existing document.
    fn set_completion(
        &self,
        id: &TaskId,
        completed: bool,
    ) -> impl std::future::Future<Output = Result<(), RemoteError>> + Send;

    /// Deletes a document.
    fn remove(
        &self,
        id: &TaskId,
    ) -> impl std::future::Future<Output = Result<(), RemoteError>> + Send;
}

/// Forwarding impl so one backend can be shared between the store and
/// whoever else drives it (tests, a second device in a demo).
impl<R: RemoteStore> RemoteStore for std::sync::Arc<R> {
    async fn query(&self, user: &UserId) -> Result<Vec<RawTaskRecord>, RemoteError> {
        (**self).query(user).await
    }

    async fn subscribe(&self, user: &UserId) -> Result<mpsc::Receiver<SnapshotResult>, RemoteError> {
        (**self).subscribe(user).await
    }

    async fn insert(
        &self,
        user: &UserId,
        day: DayKey,
        draft: &TaskDraft,
    ) -> Result<RawTaskRecord, RemoteError> {
        (**self).insert(user, day, draft).await
    }

    async fn patch_fields(&self, id: &TaskId, patch: &TaskPatch) -> Result<(), RemoteError> {
        (**self).patch_fields(id, patch).await
    }

    async fn set_completion(&self, id: &TaskId, completed: bool) -> Result<(), RemoteError> {
        (**self).set_completion(id, completed).await
    }

    async fn remove(&self, id: &TaskId) -> Result<(), RemoteError> {
        (**self).remove(id).await
    }
}
