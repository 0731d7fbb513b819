//! Local filesystem storage implementation.
//!
//! Each key maps to one small JSON file under the root directory.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── course/
//! │   └── {course_id}/
//! │       └── position.json
//! └── quiz/
//!     └── {lecture_id}/
//!         └── {user_id}/
//!             ├── state.json
//!             └── result.json
//! ```

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::storage::{KeyValueStore, StorageKey};

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Get the full path for a key.
    fn path(&self, key: &StorageKey) -> PathBuf {
        let mut path = self.root_dir.clone();
        for segment in key.segments() {
            path.push(segment);
        }
        path.set_extension("json");
        path
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &StorageKey, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for LocalStorage {
    async fn get(&self, key: &StorageKey) -> Result<Option<String>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|e| AppError::storage(key.as_key(), e)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn set(&self, key: &StorageKey, value: String) -> Result<()> {
        log::debug!("Writing {}", key);
        self.write_bytes(key, value.as_bytes()).await
    }

    async fn clear(&self, key: &StorageKey) -> Result<()> {
        match tokio::fs::remove_file(self.path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_and_read() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let key = StorageKey::resume_position("c1");

        storage.set(&key, "hello".into()).await.unwrap();
        let data = storage.get(&key).await.unwrap();
        assert_eq!(data.as_deref(), Some("hello"));
        assert!(tmp.path().join("course/c1/position.json").exists());
    }

    #[tokio::test]
    async fn test_read_nonexistent() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let data = storage
            .get(&StorageKey::quiz_state("l1", "u1"))
            .await
            .unwrap();
        assert!(data.is_none());
    }

    #[tokio::test]
    async fn test_clear_removes_only_that_key() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let state = StorageKey::quiz_state("l1", "u1");
        let result = StorageKey::quiz_result("l1", "u1");

        storage.set(&state, "{}".into()).await.unwrap();
        storage.set(&result, "{}".into()).await.unwrap();
        storage.clear(&state).await.unwrap();
        storage.clear(&state).await.unwrap();

        assert!(storage.get(&state).await.unwrap().is_none());
        assert!(storage.get(&result).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_escaped_ids_stay_under_root() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let key = StorageKey::resume_position("../../escape");

        storage.set(&key, "1".into()).await.unwrap();
        assert!(storage.path(&key).starts_with(tmp.path()));
        assert_eq!(storage.get(&key).await.unwrap().as_deref(), Some("1"));
    }
}
