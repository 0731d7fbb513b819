//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend endpoint and HTTP behavior
    #[serde(default)]
    pub api: ApiConfig,

    /// Local side-store settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Quiz grading defaults
    #[serde(default)]
    pub quiz: QuizConfig,

    /// Learner identity used for namespacing local state
    #[serde(default)]
    pub learner: LearnerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Apply `CLASSROOM_*` environment overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("CLASSROOM_API_URL") {
            self.api.base_url = url;
        }
        if let Ok(token) = std::env::var("CLASSROOM_API_TOKEN") {
            self.api.auth_token = Some(token);
        }
        if let Ok(user_id) = std::env::var("CLASSROOM_USER_ID") {
            self.learner.user_id = user_id;
        }
        self
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(AppError::validation("api.base_url is empty"));
        }
        url::Url::parse(&self.api.base_url)?;
        if self.api.user_agent.trim().is_empty() {
            return Err(AppError::validation("api.user_agent is empty"));
        }
        if self.api.timeout_secs == 0 {
            return Err(AppError::validation("api.timeout_secs must be > 0"));
        }
        if self.quiz.default_passing_score > 100 {
            return Err(AppError::validation(
                "quiz.default_passing_score must be <= 100",
            ));
        }
        if self.storage.root_dir.trim().is_empty() {
            return Err(AppError::validation("storage.root_dir is empty"));
        }
        if self.learner.user_id.trim().is_empty() {
            return Err(AppError::validation("learner.user_id is empty"));
        }
        Ok(())
    }
}

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL all endpoints are joined onto
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Bearer token; usually supplied through `CLASSROOM_API_TOKEN`
    #[serde(default)]
    pub auth_token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            auth_token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding resume positions and quiz attempts
    #[serde(default = "defaults::root_dir")]
    pub root_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root_dir: defaults::root_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizConfig {
    /// Passing threshold for graded quizzes that do not carry their own
    #[serde(default = "defaults::passing_score")]
    pub default_passing_score: u8,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            default_passing_score: defaults::passing_score(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnerConfig {
    #[serde(default = "defaults::user_id")]
    pub user_id: String,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            user_id: defaults::user_id(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    pub fn base_url() -> String {
        "http://localhost:5000/api/".into()
    }
    pub fn user_agent() -> String {
        "classroom/0.1".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn root_dir() -> String {
        "storage".into()
    }
    pub fn passing_score() -> u8 {
        crate::quiz::DEFAULT_PASSING_SCORE
    }
    pub fn user_id() -> String {
        "anonymous".into()
    }
    pub fn log_level() -> String {
        "info".into()
    }
}
