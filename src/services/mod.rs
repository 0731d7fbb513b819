//! Service layer for the classroom workflow.
//!
//! This module contains the business logic for:
//! - Position and completion tracking (`ProgressTracker`)
//! - Certificate issuance on course completion (`CompletionOrchestrator`)
//! - The per-course event loop tying both together (`LearningSession`)

mod completion;
mod progress;
mod session;

pub use completion::{CompletionOrchestrator, CompletionOutcome, Phase};
pub use progress::{
    CompletionTransition, ControlState, LectureUpdate, ProgressTracker, resolve_initial_position,
};
pub use session::{LearnerEvent, LearningSession, SessionNotice};
