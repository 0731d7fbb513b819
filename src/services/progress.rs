// src/services/progress.rs

//! Progress tracker service.
//!
//! Holds the learner's position in one course and mediates lecture
//! completion against the backend. The completion set is never edited
//! locally: every mutation is followed by a fresh progress fetch.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::api::{LearningApi, LessonUpdate};
use crate::error::{AppError, Result};
use crate::models::{Course, Lecture, Position, Progress, Section};
use crate::storage::{KeyValueStore, StorageKey, load_json, save_json};

/// Enabled/disabled state of a control backed by a mutating call.
///
/// Handed out through [`ProgressTracker::control`] so a UI can grey out its
/// button while the tracker is mid-call. Calls on one tracker are already
/// serialized by `&mut self`; the tracker still claims the flag for every
/// mutation so handles see it set, and a second claim fails with
/// [`AppError::Busy`].
#[derive(Debug, Clone, Default)]
pub struct ControlState {
    in_flight: Arc<AtomicBool>,
}

impl ControlState {
    pub fn is_disabled(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn try_acquire(&self) -> Result<InFlight> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| InFlight {
                flag: Arc::clone(&self.in_flight),
            })
            .map_err(|_| AppError::Busy)
    }
}

/// Re-enables the control when dropped, including when the call is abandoned.
struct InFlight {
    flag: Arc<AtomicBool>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Course-level completion before and after one mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionTransition {
    /// From the snapshot captured before the mutation was sent
    pub was_complete: bool,
    /// From the snapshot fetched after the mutation succeeded
    pub is_complete: bool,
}

impl CompletionTransition {
    pub fn became_complete(&self) -> bool {
        !self.was_complete && self.is_complete
    }
}

/// Outcome of a completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LectureUpdate {
    pub position: Position,
    /// Membership of the lecture in the refreshed completion set
    pub completed: bool,
    /// False when the call was skipped because nothing would change
    pub changed: bool,
    pub transition: CompletionTransition,
}

pub struct ProgressTracker {
    api: Arc<dyn LearningApi>,
    store: Arc<dyn KeyValueStore>,
    course: Course,
    progress: Progress,
    position: Position,
    control: ControlState,
    enrollment_completed: bool,
}

impl ProgressTracker {
    /// Create a tracker positioned by [`resolve_initial_position`].
    pub async fn new(
        api: Arc<dyn LearningApi>,
        store: Arc<dyn KeyValueStore>,
        course: Course,
        progress: Progress,
    ) -> Self {
        let position = resolve_initial_position(store.as_ref(), &course, &progress).await;
        log::debug!(
            "Course {} opens at section {}, lecture {}",
            course.id,
            position.section_index,
            position.lecture_index
        );

        Self {
            api,
            store,
            course,
            progress,
            position,
            control: ControlState::default(),
            enrollment_completed: false,
        }
    }

    /// Carry the enrollment-completed flag into every snapshot that lacks
    /// its own `isCompleted`.
    pub fn with_enrollment_completed(mut self, completed: bool) -> Self {
        self.enrollment_completed = completed;
        let progress = std::mem::take(&mut self.progress);
        self.adopt(progress);
        self
    }

    pub fn course(&self) -> &Course {
        &self.course
    }

    /// Latest backend snapshot.
    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn current_lecture(&self) -> Option<(&Section, &Lecture)> {
        self.course.lecture_at(self.position)
    }

    pub fn is_current_complete(&self) -> bool {
        self.progress.is_lecture_complete(self.position)
    }

    pub fn is_course_complete(&self) -> bool {
        self.progress.is_course_complete(&self.course)
    }

    /// Handle for the complete/incomplete control.
    pub fn control(&self) -> ControlState {
        self.control.clone()
    }

    /// Find the position of a lecture by ID.
    pub fn position_of(&self, lecture_id: &str) -> Option<Position> {
        self.course.positions().find(|p| {
            self.course
                .lecture_at(*p)
                .is_some_and(|(_, lecture)| lecture.id == lecture_id)
        })
    }

    /// Move to a lecture. Viewing is not completing: no network call.
    pub async fn select_lecture(&mut self, position: Position) -> Result<()> {
        if !self.course.contains(position) {
            return Err(AppError::validation(format!(
                "no lecture at section {}, lecture {}",
                position.section_index, position.lecture_index
            )));
        }
        self.position = position;
        self.save_position().await;
        Ok(())
    }

    /// Write the current position to the resume cache.
    ///
    /// Failures are logged only; the cache is a convenience.
    pub async fn save_position(&self) {
        let key = StorageKey::resume_position(&self.course.id);
        if let Err(e) = save_json(self.store.as_ref(), &key, &self.position).await {
            log::warn!("Could not save resume position for {}: {}", self.course.id, e);
        }
    }

    /// Flip completion of the current lecture.
    pub async fn toggle_lecture_complete(&mut self) -> Result<LectureUpdate> {
        let position = self.position;
        let complete = !self.progress.is_lecture_complete(position);
        self.apply(position, complete).await
    }

    /// Mark the current lecture complete; no-op when it already is.
    pub async fn mark_lecture_complete(&mut self) -> Result<LectureUpdate> {
        self.mark_lecture_complete_at(self.position).await
    }

    /// Mark any lecture complete; no-op when it already is.
    pub async fn mark_lecture_complete_at(&mut self, position: Position) -> Result<LectureUpdate> {
        if self.progress.is_lecture_complete(position) {
            let complete = self.is_course_complete();
            return Ok(LectureUpdate {
                position,
                completed: true,
                changed: false,
                transition: CompletionTransition {
                    was_complete: complete,
                    is_complete: complete,
                },
            });
        }
        self.apply(position, true).await
    }

    /// Re-fetch the authoritative snapshot.
    pub async fn refresh(&mut self) -> Result<()> {
        let progress = self.api.fetch_progress(&self.course.id).await?;
        self.adopt(progress);
        Ok(())
    }

    fn adopt(&mut self, progress: Progress) {
        self.progress = progress.with_enrollment_completed(self.enrollment_completed);
    }

    async fn apply(&mut self, position: Position, complete: bool) -> Result<LectureUpdate> {
        let _in_flight = self.control.try_acquire()?;

        let (section, lecture) = self.course.lecture_at(position).ok_or_else(|| {
            AppError::validation(format!(
                "no lecture at section {}, lecture {}",
                position.section_index, position.lecture_index
            ))
        })?;
        let update = LessonUpdate {
            course_id: self.course.id.clone(),
            section_id: section.id.clone(),
            lecture_id: lecture.id.clone(),
            time_spent_delta: lecture.duration_secs,
        };

        // Captured before the mutation is sent.
        let was_complete = self.is_course_complete();

        if complete {
            self.api.mark_lesson_complete(&update).await?;
        } else {
            self.api.unmark_lesson_complete(&update).await?;
        }
        let progress = self.api.fetch_progress(&self.course.id).await?;

        log::info!(
            "Lecture {} marked {} ({:?}% overall)",
            update.lecture_id,
            if complete { "complete" } else { "incomplete" },
            progress.overall_progress
        );

        self.adopt(progress);
        Ok(LectureUpdate {
            position,
            completed: self.progress.is_lecture_complete(position),
            changed: true,
            transition: CompletionTransition {
                was_complete,
                is_complete: self.is_course_complete(),
            },
        })
    }
}

/// Pick where a course opens.
///
/// Priority: cached resume position, backend current position, first
/// incomplete lecture, then `(0, 0)`. Positions outside the course are
/// skipped.
pub async fn resolve_initial_position(
    store: &dyn KeyValueStore,
    course: &Course,
    progress: &Progress,
) -> Position {
    let key = StorageKey::resume_position(&course.id);
    match load_json::<Position>(store, &key).await {
        Ok(Some(cached)) if course.contains(cached) => return cached,
        Ok(Some(cached)) => log::debug!("Ignoring out-of-range resume position {:?}", cached),
        Ok(None) => {}
        Err(e) => log::warn!("Could not read resume position for {}: {}", course.id, e),
    }

    if let Some(current) = progress.current_position().filter(|p| course.contains(*p)) {
        return current;
    }

    course
        .positions()
        .find(|p| !progress.is_lecture_complete(*p))
        .unwrap_or(Position::new(0, 0))
}
