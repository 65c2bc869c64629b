//! Local durable key-value persistence.
//!
//! The store writes the whole task collection as one JSON blob under a
//! single fixed key ([`TASKS_CACHE_KEY`]) — a cache for offline restart,
//! never an independent source of truth while the application is running.
//!
//! Implementations:
//! - [`MemoryLocalStore`] — in-memory store for testing
//! - [`file::JsonFileStore`] — one JSON file per key under a data directory

pub mod file;

use std::collections::HashMap;

use tokio::sync::Mutex;

/// The one key under which the task collection blob is persisted.
pub const TASKS_CACHE_KEY: &str = "tasks";

/// Errors that can occur during local persistence operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// A read operation failed.
    #[error("cache read failed: {0}")]
    ReadFailed(String),
    /// A write operation failed.
    #[error("cache write failed: {0}")]
    WriteFailed(String),
}

/// Trait for durable key-value persistence of serialized blobs.
pub trait LocalStore: Send + Sync {
    /// Reads the blob stored under `key`, or `None` if the key was never
    /// written.
    fn get(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>, CacheError>> + Send;

    /// Writes `blob` under `key`, replacing any previous value.
    fn set(
        &self,
        key: &str,
        blob: &str,
    ) -> impl std::future::Future<Output = Result<(), CacheError>> + Send;
}

/// Forwarding impl so a cache can be shared between the store and other
/// owners (tests, inspectors).
impl<S: LocalStore> LocalStore for std::sync::Arc<S> {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, blob: &str) -> Result<(), CacheError> {
        (**self).set(key, blob).await
    }
}

/// In-memory implementation of [`LocalStore`] for testing.
///
/// All data is lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryLocalStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryLocalStore {
    /// Creates a new, empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryLocalStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, blob: &str) -> Result<(), CacheError> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), blob.to_string());
        Ok(())
    }
}
