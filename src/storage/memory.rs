//! In-memory storage backend.
//!
//! Used for tests and for sessions that should not touch the disk.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::storage::{KeyValueStore, StorageKey};

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyValueStore for MemoryStorage {
    async fn get(&self, key: &StorageKey) -> Result<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|e| AppError::storage(key.as_key(), e))?;
        Ok(entries.get(&key.as_key()).cloned())
    }

    async fn set(&self, key: &StorageKey, value: String) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| AppError::storage(key.as_key(), e))?;
        entries.insert(key.as_key(), value);
        Ok(())
    }

    async fn clear(&self, key: &StorageKey) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| AppError::storage(key.as_key(), e))?;
        entries.remove(&key.as_key());
        Ok(())
    }
}
