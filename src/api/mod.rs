//! Remote persistence API consumed by the classroom workflow.
//!
//! The backend owns enrollments, progress and certificates. This module
//! defines the operations the workflow needs as a trait, plus the HTTP+JSON
//! implementation used in production.

mod http;
#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::models::{Certificate, CertificateLookup, Enrollment, Progress};

pub use self::http::HttpLearningApi;

/// Body of a mark/unmark completion call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonUpdate {
    #[serde(skip)]
    pub course_id: String,
    pub section_id: String,
    pub lecture_id: String,
    /// Lecture duration in seconds, added on mark and subtracted on unmark
    #[serde(rename = "timeSpent")]
    pub time_spent_delta: u64,
}

/// Operations offered by the learning backend.
#[async_trait]
pub trait LearningApi: Send + Sync {
    /// Enrollment with its embedded course, called on session start.
    async fn fetch_enrollment(&self, course_id: &str) -> Result<Enrollment>;

    /// Authoritative progress snapshot.
    async fn fetch_progress(&self, course_id: &str) -> Result<Progress>;

    async fn mark_lesson_complete(&self, update: &LessonUpdate) -> Result<()>;

    async fn unmark_lesson_complete(&self, update: &LessonUpdate) -> Result<()>;

    /// Existing certificate, if any. Never fails for 403/404/5xx; those
    /// come back as [`CertificateLookup::NotFound`] or
    /// [`CertificateLookup::Unavailable`].
    async fn get_certificate_by_course(&self, course_id: &str) -> Result<CertificateLookup>;

    async fn generate_certificate(&self, course_id: &str) -> Result<Certificate>;
}
