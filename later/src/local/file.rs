//! File-backed implementation of [`LocalStore`].

use std::path::{Path, PathBuf};

use super::{CacheError, LocalStore};

/// Stores each key as `<dir>/<key>.json`.
///
/// Writes go through a temporary file followed by a rename, so a crash
/// mid-write leaves the previous blob intact rather than a truncated one.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Creates a store rooted at the given directory.
    ///
    /// The directory is created lazily on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory this store writes into.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl LocalStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::ReadFailed(e.to_string())),
        }
    }

    async fn set(&self, key: &str, blob: &str) -> Result<(), CacheError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| CacheError::WriteFailed(e.to_string()))?;
        let path = self.path_for(key);
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        tokio::fs::write(&tmp, blob)
            .await
            .map_err(|e| CacheError::WriteFailed(e.to_string()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| CacheError::WriteFailed(e.to_string()))?;
        Ok(())
    }
}
