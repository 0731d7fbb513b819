// src/services/session.rs

//! One learner's session in one course.
//!
//! Components publish [`LearnerEvent`]s on a channel; the session feeds them
//! to its [`ProgressTracker`] and [`CompletionOrchestrator`] and answers with
//! [`SessionNotice`]s. Errors never escape the event loop.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::api::LearningApi;
use crate::error::{AppError, Result};
use crate::models::{Certificate, Config, Position};
use crate::quiz::{QuizAttempt, QuizResult, normalize};
use crate::storage::KeyValueStore;

use super::completion::CompletionOrchestrator;
use super::progress::{LectureUpdate, ProgressTracker};

/// Message published by any learner-facing component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LearnerEvent {
    /// Current lecture finished (video ended, note read)
    LectureCompleted,
    QuizPassed { lecture_id: String },
    /// Flush the resume position
    SaveRequested,
    SelectLecture(Position),
    /// The complete/incomplete control was clicked
    ToggleComplete,
}

impl LearnerEvent {
    /// `QuizPassed` for a passing result, nothing otherwise.
    pub fn from_quiz_result(lecture_id: &str, result: &QuizResult) -> Option<Self> {
        result.passed.then(|| Self::QuizPassed {
            lecture_id: lecture_id.to_string(),
        })
    }
}

/// Message for the learner.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionNotice {
    Info(String),
    Error(String),
    Congratulations { certificate: Option<Certificate> },
}

pub struct LearningSession {
    store: Arc<dyn KeyValueStore>,
    api: Arc<dyn LearningApi>,
    user_id: String,
    default_passing_score: u8,
    tracker: ProgressTracker,
    orchestrator: CompletionOrchestrator,
}

impl LearningSession {
    /// Open a course: fetch the enrollment, take its embedded progress or
    /// fetch it, and resolve the starting lecture.
    pub async fn start(
        api: Arc<dyn LearningApi>,
        store: Arc<dyn KeyValueStore>,
        course_id: &str,
        config: &Config,
    ) -> Result<Self> {
        let enrollment = api.fetch_enrollment(course_id).await?;
        let progress = match enrollment.progress {
            Some(progress) => progress,
            None => api.fetch_progress(course_id).await?,
        };
        log::info!(
            "Started session for {} ({} lectures, {} complete)",
            course_id,
            enrollment.course.lecture_count(),
            progress.completed_count(&enrollment.course)
        );

        let tracker =
            ProgressTracker::new(Arc::clone(&api), Arc::clone(&store), enrollment.course, progress)
                .await
                .with_enrollment_completed(enrollment.is_completed);

        Ok(Self {
            store,
            api,
            user_id: config.learner.user_id.clone(),
            default_passing_score: config.quiz.default_passing_score,
            tracker,
            orchestrator: CompletionOrchestrator::new(course_id),
        })
    }

    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    pub fn orchestrator(&self) -> &CompletionOrchestrator {
        &self.orchestrator
    }

    /// Process one event and return the notices it produced.
    pub async fn handle(&mut self, event: LearnerEvent) -> Vec<SessionNotice> {
        log::debug!("Handling {:?}", event);
        let result = match event {
            LearnerEvent::LectureCompleted => self.tracker.mark_lecture_complete().await.map(Some),
            LearnerEvent::QuizPassed { lecture_id } => match self.tracker.position_of(&lecture_id) {
                Some(position) => self
                    .tracker
                    .mark_lecture_complete_at(position)
                    .await
                    .map(Some),
                None => Err(AppError::validation(format!(
                    "lecture {lecture_id} is not part of this course"
                ))),
            },
            LearnerEvent::SaveRequested => {
                self.tracker.save_position().await;
                Ok(None)
            }
            LearnerEvent::SelectLecture(position) => {
                self.tracker.select_lecture(position).await.map(|()| None)
            }
            LearnerEvent::ToggleComplete => self.tracker.toggle_lecture_complete().await.map(Some),
        };

        match result {
            Ok(Some(update)) => self.after_update(update).await,
            Ok(None) => Vec::new(),
            Err(e) => {
                if e.is_auth_expired() {
                    log::warn!("Session expired; dropping event");
                } else {
                    log::error!("Event failed: {}", e);
                }
                e.user_notice().map(SessionNotice::Error).into_iter().collect()
            }
        }
    }

    /// Consume events until every sender is gone.
    ///
    /// Notices are dropped silently once the receiving side has gone away.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<LearnerEvent>,
        notices: mpsc::Sender<SessionNotice>,
    ) -> Self {
        while let Some(event) = events.recv().await {
            for notice in self.handle(event).await {
                if notices.send(notice).await.is_err() {
                    log::debug!("Notice receiver closed");
                }
            }
        }
        self
    }

    /// Load the attempt for the current quiz lecture, restoring saved state.
    pub async fn open_quiz(&self) -> Result<QuizAttempt> {
        let (_, lecture) = self
            .tracker
            .current_lecture()
            .ok_or_else(|| AppError::validation("no lecture selected"))?;
        let raw = lecture
            .quiz()
            .ok_or_else(|| AppError::validation(format!("lecture {} is not a quiz", lecture.id)))?;
        let quiz = normalize(raw, self.default_passing_score)?;

        QuizAttempt::resume(
            Arc::clone(&self.store),
            lecture.id.clone(),
            self.user_id.clone(),
            quiz,
        )
        .await
    }

    async fn after_update(&mut self, update: LectureUpdate) -> Vec<SessionNotice> {
        if !update.changed {
            return Vec::new();
        }

        let mut notices = vec![SessionNotice::Info(
            if update.completed {
                "Lecture marked as complete"
            } else {
                "Lecture marked as incomplete"
            }
            .to_string(),
        )];

        let outcome = self
            .orchestrator
            .on_transition(self.api.as_ref(), update.transition)
            .await;
        if outcome.congratulates() {
            notices.push(SessionNotice::Congratulations {
                certificate: outcome.certificate().cloned(),
            });
        }
        notices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{ApiCall, FakeApi, Failure, progress_with, sample_course, with_quiz};
    use crate::models::{Course, RawQuiz};
    use crate::quiz::AttemptView;
    use crate::storage::MemoryStorage;

    fn graded_quiz() -> RawQuiz {
        serde_json::from_value(serde_json::json!({
            "isGraded": true,
            "questions": [
                { "question": "2 + 2?", "options": ["3", "4"], "correctAnswer": 1 },
                { "question": "Primes?", "options": ["2", "4", "5"], "correctAnswers": [0, 2] }
            ]
        }))
        .unwrap()
    }

    async fn session(api: &Arc<FakeApi>) -> LearningSession {
        LearningSession::start(
            api.clone(),
            Arc::new(MemoryStorage::new()),
            "course-1",
            &Config::default(),
        )
        .await
        .unwrap()
    }

    fn quiz_course() -> Course {
        with_quiz(sample_course(1, 2), Position::new(0, 1), graded_quiz())
    }

    #[tokio::test]
    async fn start_fetches_enrollment_then_progress() {
        let api = Arc::new(
            FakeApi::new(sample_course(2, 2)).with_progress(progress_with(&[Position::new(0, 0)])),
        );
        let session = session(&api).await;

        assert_eq!(
            api.calls(),
            vec![ApiCall::FetchEnrollment, ApiCall::FetchProgress]
        );
        assert_eq!(session.tracker().position(), Position::new(0, 1));
    }

    #[tokio::test]
    async fn embedded_progress_skips_the_progress_fetch() {
        let mut embedded = progress_with(&[Position::new(0, 0), Position::new(0, 1)]);
        embedded.current_section = Some(1);
        embedded.current_lecture = Some(1);
        let api = Arc::new(
            FakeApi::new(sample_course(2, 2))
                .with_progress(embedded)
                .with_embedded_progress(),
        );
        let session = session(&api).await;

        assert_eq!(api.calls(), vec![ApiCall::FetchEnrollment]);
        assert_eq!(session.tracker().position(), Position::new(1, 1));
        assert_eq!(session.tracker().progress().completed_lessons.len(), 2);
    }

    #[tokio::test]
    async fn completed_enrollment_does_not_congratulate_again() {
        // Course gained a lecture after the learner finished it.
        let api = Arc::new(
            FakeApi::new(sample_course(1, 2))
                .with_progress(progress_with(&[Position::new(0, 0)]))
                .with_enrollment_completed(),
        );
        let mut session = session(&api).await;
        assert!(session.tracker().is_course_complete());
        assert_eq!(session.tracker().position(), Position::new(0, 1));

        let notices = session.handle(LearnerEvent::LectureCompleted).await;
        assert_eq!(
            notices,
            vec![SessionNotice::Info("Lecture marked as complete".into())]
        );
        assert_eq!(api.count(&ApiCall::GetCertificate), 0);
        assert_eq!(api.count(&ApiCall::GenerateCertificate), 0);
        assert!(!session.orchestrator().has_attempted());
    }

    #[tokio::test]
    async fn toggle_reports_info() {
        let api = Arc::new(FakeApi::new(sample_course(2, 2)));
        let mut session = session(&api).await;

        let notices = session.handle(LearnerEvent::ToggleComplete).await;
        assert_eq!(
            notices,
            vec![SessionNotice::Info("Lecture marked as complete".into())]
        );
    }

    #[tokio::test]
    async fn completing_the_course_congratulates_once() {
        let api = Arc::new(
            FakeApi::new(sample_course(1, 2)).with_progress(progress_with(&[Position::new(0, 0)])),
        );
        let mut session = session(&api).await;

        let notices = session.handle(LearnerEvent::LectureCompleted).await;
        assert_eq!(notices.len(), 2);
        match &notices[1] {
            SessionNotice::Congratulations { certificate } => {
                assert_eq!(
                    certificate.as_ref().map(|c| c.id.as_str()),
                    Some("cert-course-1")
                );
            }
            other => panic!("unexpected notice {other:?}"),
        }

        // Repeat completion of the same lecture is a no-op.
        assert!(session.handle(LearnerEvent::LectureCompleted).await.is_empty());
        assert_eq!(api.count(&ApiCall::GenerateCertificate), 1);
    }

    #[tokio::test]
    async fn failures_become_error_notices() {
        let api = Arc::new(FakeApi::new(sample_course(1, 2)));
        let mut session = session(&api).await;
        api.fail_next_mutation(Failure::Network);

        let notices = session.handle(LearnerEvent::ToggleComplete).await;
        assert!(matches!(notices.as_slice(), [SessionNotice::Error(_)]));
        assert!(!session.tracker().is_current_complete());
    }

    #[tokio::test]
    async fn auth_expiry_is_silent() {
        let api = Arc::new(FakeApi::new(sample_course(1, 2)));
        let mut session = session(&api).await;
        api.fail_next_mutation(Failure::AuthExpired);

        assert!(session.handle(LearnerEvent::ToggleComplete).await.is_empty());
    }

    #[tokio::test]
    async fn bad_selection_is_reported() {
        let api = Arc::new(FakeApi::new(sample_course(1, 2)));
        let mut session = session(&api).await;

        let notices = session
            .handle(LearnerEvent::SelectLecture(Position::new(3, 0)))
            .await;
        assert!(matches!(notices.as_slice(), [SessionNotice::Error(_)]));
        assert!(
            session
                .handle(LearnerEvent::SelectLecture(Position::new(0, 1)))
                .await
                .is_empty()
        );
        assert_eq!(session.tracker().position(), Position::new(0, 1));
    }

    #[tokio::test]
    async fn passed_quiz_completes_its_lecture() {
        let api = Arc::new(FakeApi::new(quiz_course()));
        let mut session = session(&api).await;
        session
            .handle(LearnerEvent::SelectLecture(Position::new(0, 1)))
            .await;

        let mut attempt = session.open_quiz().await.unwrap();
        assert_eq!(attempt.view(), AttemptView::Details);
        attempt.start().await.unwrap();
        attempt.select_option(0, 1).await.unwrap();
        attempt.select_option(1, 0).await.unwrap();
        attempt.select_option(1, 2).await.unwrap();
        let result = attempt.submit().await.unwrap().clone();
        assert_eq!(result.percentage_score, 100);

        let event = LearnerEvent::from_quiz_result(attempt.lecture_id(), &result).unwrap();
        session.handle(event).await;
        assert!(session.tracker().progress().is_lecture_complete(Position::new(0, 1)));
        assert_eq!(api.count(&ApiCall::Mark("l0-1".into())), 1);
    }

    #[tokio::test]
    async fn failed_quiz_publishes_nothing() {
        let api = Arc::new(FakeApi::new(quiz_course()));
        let mut session = session(&api).await;
        session
            .handle(LearnerEvent::SelectLecture(Position::new(0, 1)))
            .await;

        let mut attempt = session.open_quiz().await.unwrap();
        attempt.start().await.unwrap();
        attempt.select_option(0, 0).await.unwrap();
        let result = attempt.submit().await.unwrap();
        assert!(!result.passed);
        assert!(LearnerEvent::from_quiz_result("l0-1", result).is_none());
    }

    #[tokio::test]
    async fn quiz_attempt_survives_reopening() {
        let api = Arc::new(FakeApi::new(quiz_course()));
        let mut session = session(&api).await;
        session
            .handle(LearnerEvent::SelectLecture(Position::new(0, 1)))
            .await;

        let mut attempt = session.open_quiz().await.unwrap();
        attempt.start().await.unwrap();
        attempt.select_option(0, 1).await.unwrap();
        attempt.next_question().await.unwrap();
        drop(attempt);

        let reopened = session.open_quiz().await.unwrap();
        assert_eq!(
            reopened.view(),
            AttemptView::Taking {
                current_question: 1
            }
        );
        assert_eq!(reopened.answers().len(), 1);
    }

    #[tokio::test]
    async fn empty_quiz_cannot_open() {
        let course = with_quiz(sample_course(1, 1), Position::new(0, 0), RawQuiz::default());
        let api = Arc::new(FakeApi::new(course));
        let session = session(&api).await;

        let err = session.open_quiz().await.err().unwrap();
        assert_eq!(
            err.user_notice().as_deref(),
            Some("This quiz has no questions yet.")
        );
    }

    #[tokio::test]
    async fn non_quiz_lecture_cannot_open() {
        let api = Arc::new(FakeApi::new(sample_course(1, 1)));
        let session = session(&api).await;
        assert!(matches!(
            session.open_quiz().await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn run_drains_the_channel() {
        let api = Arc::new(
            FakeApi::new(sample_course(1, 2)).with_progress(progress_with(&[Position::new(0, 0)])),
        );
        let session = session(&api).await;
        let (event_tx, event_rx) = mpsc::channel(8);
        let (notice_tx, mut notice_rx) = mpsc::channel(8);

        event_tx.send(LearnerEvent::LectureCompleted).await.unwrap();
        event_tx.send(LearnerEvent::SaveRequested).await.unwrap();
        drop(event_tx);

        let session = session.run(event_rx, notice_tx).await;
        assert!(session.tracker().is_course_complete());

        let mut received = Vec::new();
        while let Some(notice) = notice_rx.recv().await {
            received.push(notice);
        }
        assert_eq!(received.len(), 2);
        assert!(matches!(received[1], SessionNotice::Congratulations { .. }));
    }

    #[tokio::test]
    async fn run_survives_a_dropped_receiver() {
        let api = Arc::new(FakeApi::new(sample_course(1, 2)));
        let session = session(&api).await;
        let (event_tx, event_rx) = mpsc::channel(8);
        let (notice_tx, notice_rx) = mpsc::channel(8);
        drop(notice_rx);

        event_tx.send(LearnerEvent::ToggleComplete).await.unwrap();
        drop(event_tx);

        let session = session.run(event_rx, notice_tx).await;
        assert!(session.tracker().is_current_complete());
    }
}
