//! Enrollment, progress and certificate records owned by the backend.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::course::{CompletionRecord, Course, Position};

/// Per-enrollment progress snapshot.
///
/// Always the value most recently returned by the backend; the client never
/// edits the completion set in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    #[serde(default)]
    pub completed_lessons: BTreeSet<CompletionRecord>,

    /// Percentage computed by the backend
    #[serde(default)]
    pub overall_progress: Option<f64>,

    /// Explicit enrollment-completed flag, when the backend sends one
    #[serde(default)]
    pub is_completed: Option<bool>,

    #[serde(default)]
    pub current_section: Option<usize>,

    #[serde(default)]
    pub current_lecture: Option<usize>,

    /// Accumulated time in seconds
    #[serde(default)]
    pub total_time_spent: Option<u64>,
}

impl Progress {
    pub fn is_lecture_complete(&self, position: Position) -> bool {
        self.completed_lessons.contains(&position)
    }

    /// Last viewed position reported by the backend.
    pub fn current_position(&self) -> Option<Position> {
        Some(Position::new(self.current_section?, self.current_lecture?))
    }

    /// Number of completion records that point at a real lecture.
    pub fn completed_count(&self, course: &Course) -> usize {
        self.completed_lessons
            .iter()
            .filter(|record| course.contains(**record))
            .count()
    }

    /// Fill a missing `isCompleted` from a completed enrollment.
    ///
    /// An explicit flag in the snapshot is kept as sent.
    pub fn with_enrollment_completed(mut self, enrollment_completed: bool) -> Self {
        if enrollment_completed && self.is_completed.is_none() {
            self.is_completed = Some(true);
        }
        self
    }

    /// Whether the course counts as complete for certificate purposes.
    ///
    /// The backend flag wins, then `overallProgress`, and only when neither
    /// is present does the local completion count decide.
    pub fn is_course_complete(&self, course: &Course) -> bool {
        if let Some(flag) = self.is_completed {
            return flag;
        }
        if let Some(percent) = self.overall_progress {
            return percent >= 100.0;
        }
        let total = course.lecture_count();
        total > 0 && self.completed_count(course) >= total
    }
}

/// Learner-to-course binding returned on session start.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    #[serde(alias = "_id")]
    pub id: String,

    pub course: Course,

    #[serde(default, alias = "completed")]
    pub is_completed: bool,

    #[serde(default)]
    pub progress: Option<Progress>,
}

/// Issued course certificate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    #[serde(alias = "_id")]
    pub id: String,

    #[serde(default)]
    pub course_id: String,

    #[serde(default)]
    pub certificate_number: Option<String>,

    #[serde(default)]
    pub issued_at: Option<DateTime<Utc>>,
}

/// Result of asking the backend for an existing certificate.
#[derive(Debug, Clone, PartialEq)]
pub enum CertificateLookup {
    Found(Certificate),
    NotFound,
    /// Forbidden, disabled, server error or unreachable
    Unavailable(String),
}
