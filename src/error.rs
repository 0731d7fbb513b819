// src/error.rs

//! Unified error handling for the classroom workflow.

use std::fmt;

use thiserror::Error;

/// Result type alias for classroom operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed before a response arrived
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Backend answered with a non-success status
    #[error("Request to {context} failed with status {status}")]
    Status { context: String, status: u16 },

    /// Session credentials were rejected (401)
    #[error("Authentication expired")]
    AuthExpired,

    /// Certificate subsystem is disabled, forbidden or down
    #[error("Certificate service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Quiz has no questions
    #[error("Quiz has no questions")]
    EmptyQuiz,

    /// Malformed quiz, course or selection data
    #[error("Validation error: {0}")]
    Validation(String),

    /// A mutating call for the same control is still running
    #[error("Another update is still in progress")]
    Busy,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local side-store failure
    #[error("Storage error for {key}: {message}")]
    Storage { key: String, message: String },
}

/// Coarse classification used to decide how a failure reaches the learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Caller-side data problem (empty quiz, bad index)
    ValidationGap,
    /// Transient remote or local failure, safe to retry
    NetworkFailure,
    /// Session expired; the auth layer handles it
    AuthExpired,
    /// Certificate infrastructure is unavailable
    ServiceUnavailable,
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a status error with the endpoint it came from.
    pub fn status(context: impl Into<String>, status: u16) -> Self {
        Self::Status {
            context: context.into(),
            status,
        }
    }

    /// Create a storage error for a key.
    pub fn storage(key: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Storage {
            key: key.into(),
            message: message.to_string(),
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::EmptyQuiz | Self::Validation(_) | Self::Config(_) | Self::Busy => {
                ErrorClass::ValidationGap
            }
            Self::AuthExpired => ErrorClass::AuthExpired,
            Self::ServiceUnavailable(_) => ErrorClass::ServiceUnavailable,
            Self::Io(_)
            | Self::Http(_)
            | Self::Json(_)
            | Self::Toml(_)
            | Self::Url(_)
            | Self::Status { .. }
            | Self::Storage { .. } => ErrorClass::NetworkFailure,
        }
    }

    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::AuthExpired)
    }

    /// Message shown to the learner, or `None` when the failure must stay silent.
    pub fn user_notice(&self) -> Option<String> {
        match self.class() {
            ErrorClass::AuthExpired => None,
            ErrorClass::ValidationGap => Some(match self {
                Self::EmptyQuiz => "This quiz has no questions yet.".to_string(),
                Self::Busy => "Please wait for the current update to finish.".to_string(),
                other => other.to_string(),
            }),
            ErrorClass::NetworkFailure => {
                Some("Could not update your progress. Please try again.".to_string())
            }
            ErrorClass::ServiceUnavailable => {
                Some("Certificates are not available right now.".to_string())
            }
        }
    }
}
