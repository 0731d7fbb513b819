//! In-memory backend used by service tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{
    Certificate, CertificateLookup, Course, Enrollment, Lecture, LectureContent, Position,
    Progress, RawQuiz, Section,
};

use super::{LearningApi, LessonUpdate};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    FetchEnrollment,
    FetchProgress,
    Mark(String),
    Unmark(String),
    GetCertificate,
    GenerateCertificate,
}

/// Failure injected into the next matching call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Network,
    AuthExpired,
    Unavailable,
}

impl Failure {
    fn into_error(self) -> AppError {
        match self {
            Self::Network => AppError::status("fake", 500),
            Self::AuthExpired => AppError::AuthExpired,
            Self::Unavailable => AppError::ServiceUnavailable("status 403".into()),
        }
    }
}

#[derive(Default)]
struct State {
    progress: Progress,
    total_time: i64,
    certificate: Option<Certificate>,
    embed_progress: bool,
    enrollment_completed: bool,
    lookup_unavailable: bool,
    mutation_failure: Option<Failure>,
    progress_failure: Option<Failure>,
    generate_failure: Option<Failure>,
    calls: Vec<ApiCall>,
}

pub struct FakeApi {
    course: Course,
    state: Mutex<State>,
}

impl FakeApi {
    pub fn new(course: Course) -> Self {
        Self {
            course,
            state: Mutex::new(State::default()),
        }
    }

    pub fn with_progress(self, progress: Progress) -> Self {
        self.state.lock().unwrap().progress = progress;
        self
    }

    /// Send the progress snapshot inside the enrollment.
    pub fn with_embedded_progress(self) -> Self {
        self.state.lock().unwrap().embed_progress = true;
        self
    }

    pub fn with_enrollment_completed(self) -> Self {
        self.state.lock().unwrap().enrollment_completed = true;
        self
    }

    pub fn with_certificate(self, certificate: Certificate) -> Self {
        self.state.lock().unwrap().certificate = Some(certificate);
        self
    }

    pub fn set_lookup_unavailable(&self) {
        self.state.lock().unwrap().lookup_unavailable = true;
    }

    pub fn fail_next_mutation(&self, failure: Failure) {
        self.state.lock().unwrap().mutation_failure = Some(failure);
    }

    pub fn fail_next_progress(&self, failure: Failure) {
        self.state.lock().unwrap().progress_failure = Some(failure);
    }

    pub fn fail_generate(&self, failure: Failure) {
        self.state.lock().unwrap().generate_failure = Some(failure);
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, call: &ApiCall) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn total_time(&self) -> i64 {
        self.state.lock().unwrap().total_time
    }

    pub fn progress(&self) -> Progress {
        self.state.lock().unwrap().progress.clone()
    }

    /// Backend-side edit, e.g. progress made on another device.
    pub fn complete_directly(&self, position: Position) {
        let mut state = self.state.lock().unwrap();
        state.progress.completed_lessons.insert(position);
        self.recompute(&mut state.progress);
    }

    fn position_of(&self, update: &LessonUpdate) -> Result<Position> {
        for (s, section) in self.course.sections.iter().enumerate() {
            if section.id != update.section_id {
                continue;
            }
            if let Some(l) = section
                .lectures
                .iter()
                .position(|lecture| lecture.id == update.lecture_id)
            {
                return Ok(Position::new(s, l));
            }
        }
        Err(AppError::status("fake/lesson", 404))
    }

    fn recompute(&self, progress: &mut Progress) {
        let total = self.course.lecture_count().max(1) as f64;
        let percent = (progress.completed_count(&self.course) as f64 / total * 100.0).round();
        progress.overall_progress = Some(percent);
        progress.is_completed = Some(percent >= 100.0);
    }

    fn mutate(&self, update: &LessonUpdate, complete: bool) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let call = if complete {
            ApiCall::Mark(update.lecture_id.clone())
        } else {
            ApiCall::Unmark(update.lecture_id.clone())
        };
        state.calls.push(call);
        if let Some(failure) = state.mutation_failure.take() {
            return Err(failure.into_error());
        }

        let position = self.position_of(update)?;
        let delta = update.time_spent_delta as i64;
        if complete {
            state.progress.completed_lessons.insert(position);
            state.total_time += delta;
        } else {
            state.progress.completed_lessons.remove(&position);
            state.total_time -= delta;
        }
        let mut progress = state.progress.clone();
        self.recompute(&mut progress);
        state.progress = progress;
        Ok(())
    }
}

#[async_trait]
impl LearningApi for FakeApi {
    async fn fetch_enrollment(&self, course_id: &str) -> Result<Enrollment> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(ApiCall::FetchEnrollment);
        Ok(Enrollment {
            id: format!("enr-{course_id}"),
            course: self.course.clone(),
            is_completed: state.enrollment_completed
                || state.progress.is_completed.unwrap_or(false),
            progress: state.embed_progress.then(|| state.progress.clone()),
        })
    }

    async fn fetch_progress(&self, _course_id: &str) -> Result<Progress> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(ApiCall::FetchProgress);
        if let Some(failure) = state.progress_failure.take() {
            return Err(failure.into_error());
        }
        Ok(state.progress.clone())
    }

    async fn mark_lesson_complete(&self, update: &LessonUpdate) -> Result<()> {
        self.mutate(update, true)
    }

    async fn unmark_lesson_complete(&self, update: &LessonUpdate) -> Result<()> {
        self.mutate(update, false)
    }

    async fn get_certificate_by_course(&self, _course_id: &str) -> Result<CertificateLookup> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(ApiCall::GetCertificate);
        if state.lookup_unavailable {
            return Ok(CertificateLookup::Unavailable("status 403".into()));
        }
        Ok(match &state.certificate {
            Some(certificate) => CertificateLookup::Found(certificate.clone()),
            None => CertificateLookup::NotFound,
        })
    }

    async fn generate_certificate(&self, course_id: &str) -> Result<Certificate> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(ApiCall::GenerateCertificate);
        if let Some(failure) = state.generate_failure {
            return Err(failure.into_error());
        }
        let certificate = Certificate {
            id: format!("cert-{course_id}"),
            course_id: course_id.to_string(),
            certificate_number: Some("CERT-0001".into()),
            issued_at: None,
        };
        state.certificate = Some(certificate.clone());
        Ok(certificate)
    }
}

/// Course with `sections` sections of `per_section` video lectures each.
/// Lecture `(s, l)` has ID `l{s}-{l}` and lasts `60 * (l + 1)` seconds.
pub fn sample_course(sections: usize, per_section: usize) -> Course {
    Course {
        id: "course-1".into(),
        title: "Sample".into(),
        sections: (0..sections)
            .map(|s| Section {
                id: format!("s{s}"),
                title: format!("Section {s}"),
                lectures: (0..per_section)
                    .map(|l| Lecture {
                        id: format!("l{s}-{l}"),
                        title: format!("Lecture {s}.{l}"),
                        duration_secs: 60 * (l as u64 + 1),
                        content: LectureContent::Video { video_url: None },
                    })
                    .collect(),
            })
            .collect(),
    }
}

/// Replace lecture `(s, l)` with a quiz lecture.
pub fn with_quiz(mut course: Course, position: Position, quiz: RawQuiz) -> Course {
    let lecture = &mut course.sections[position.section_index].lectures[position.lecture_index];
    lecture.content = LectureContent::Quiz { quiz };
    course
}

pub fn progress_with(completed: &[Position]) -> Progress {
    Progress {
        completed_lessons: completed.iter().copied().collect(),
        ..Progress::default()
    }
}
