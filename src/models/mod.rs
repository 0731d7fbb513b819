// src/models/mod.rs

//! Domain models for the classroom workflow.
//!
//! Wire-format structures fetched from the backend plus the configuration
//! types loaded from `config.toml`.

mod config;
mod course;
mod progress;
mod quiz;

// Re-export all public types
pub use config::{ApiConfig, Config, LearnerConfig, LoggingConfig, QuizConfig, StorageConfig};
pub use course::{CompletionRecord, Course, Lecture, LectureContent, Position, Section};
pub use progress::{Certificate, CertificateLookup, Enrollment, Progress};
pub use quiz::{OptionDetail, QuestionKind, RawOption, RawQuestion, RawQuestions, RawQuiz};
