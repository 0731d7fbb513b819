//! Client-local side-store.
//!
//! Holds UX state that survives a reload but is never synced: the resume
//! position per course and the in-progress quiz attempt and last result per
//! `(lecture, user)`. None of it is authoritative for completion or grading.
//!
//! ## Key Layout
//!
//! ```text
//! course/{course_id}/position           # Resume position
//! quiz/{lecture_id}/{user_id}/state     # In-progress attempt
//! quiz/{lecture_id}/{user_id}/result    # Last submitted result
//! ```

pub mod local;
pub mod memory;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::Result;

// Re-export for convenience
pub use local::LocalStorage;
pub use memory::MemoryStorage;

/// Namespaced side-store key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StorageKey {
    ResumePosition { course_id: String },
    QuizState { lecture_id: String, user_id: String },
    QuizResult { lecture_id: String, user_id: String },
}

impl StorageKey {
    pub fn resume_position(course_id: impl Into<String>) -> Self {
        Self::ResumePosition {
            course_id: course_id.into(),
        }
    }

    pub fn quiz_state(lecture_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self::QuizState {
            lecture_id: lecture_id.into(),
            user_id: user_id.into(),
        }
    }

    pub fn quiz_result(lecture_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self::QuizResult {
            lecture_id: lecture_id.into(),
            user_id: user_id.into(),
        }
    }

    /// Path-like segments of the key; each ID is escaped to a single segment.
    pub fn segments(&self) -> Vec<String> {
        match self {
            Self::ResumePosition { course_id } => {
                vec!["course".into(), escape(course_id), "position".into()]
            }
            Self::QuizState {
                lecture_id,
                user_id,
            } => vec![
                "quiz".into(),
                escape(lecture_id),
                escape(user_id),
                "state".into(),
            ],
            Self::QuizResult {
                lecture_id,
                user_id,
            } => vec![
                "quiz".into(),
                escape(lecture_id),
                escape(user_id),
                "result".into(),
            ],
        }
    }

    /// Flat string form, e.g. `course/c1/position`.
    pub fn as_key(&self) -> String {
        self.segments().join("/")
    }
}

impl std::fmt::Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_key())
    }
}

/// Keep IDs made of `[A-Za-z0-9_-]` readable; hex-encode anything else so a
/// segment can never contain a separator or `..`.
fn escape(id: &str) -> String {
    let plain = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if plain {
        id.to_string()
    } else {
        format!("~{}", hex::encode(id.as_bytes()))
    }
}

/// Trait for side-store backends.
///
/// Values are opaque strings, the way browser storage holds them.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &StorageKey) -> Result<Option<String>>;

    async fn set(&self, key: &StorageKey, value: String) -> Result<()>;

    /// Remove a key. Clearing a missing key is not an error.
    async fn clear(&self, key: &StorageKey) -> Result<()>;
}

/// Read and decode a JSON value.
///
/// Corrupt entries are logged and reported as absent.
pub async fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &StorageKey,
) -> Result<Option<T>> {
    match store.get(key).await? {
        Some(text) => match serde_json::from_str(&text) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                log::warn!("Discarding unreadable entry {}: {}", key, e);
                Ok(None)
            }
        },
        None => Ok(None),
    }
}

/// Encode and write a JSON value.
pub async fn save_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &StorageKey,
    value: &T,
) -> Result<()> {
    let text = serde_json::to_string(value)?;
    store.set(key, text).await
}
