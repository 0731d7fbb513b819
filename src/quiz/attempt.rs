//! One learner's attempt at a quiz lecture.
//!
//! The attempt moves through `Details -> Taking -> Results`; every change is
//! mirrored to the side-store so an attempt survives a reload.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::QuestionKind;
use crate::storage::{KeyValueStore, StorageKey, load_json, save_json};

use super::{Answers, Quiz, QuizResult, evaluate};

/// Which screen of the attempt is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "screen", rename_all = "lowercase")]
pub enum AttemptView {
    Details,
    Taking {
        #[serde(rename = "currentQuestion")]
        current_question: usize,
    },
    Results,
}

/// Persisted in-progress state.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SavedAttempt {
    view: AttemptView,
    #[serde(default)]
    answers: Answers,
}

pub struct QuizAttempt {
    lecture_id: String,
    user_id: String,
    quiz: Quiz,
    view: AttemptView,
    answers: Answers,
    result: Option<QuizResult>,
    store: Arc<dyn KeyValueStore>,
}

impl QuizAttempt {
    /// Start a fresh attempt on the details screen.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        lecture_id: impl Into<String>,
        user_id: impl Into<String>,
        quiz: Quiz,
    ) -> Self {
        Self {
            lecture_id: lecture_id.into(),
            user_id: user_id.into(),
            quiz,
            view: AttemptView::Details,
            answers: Answers::new(),
            result: None,
            store,
        }
    }

    /// Restore a saved attempt, or start fresh when nothing usable is stored.
    pub async fn resume(
        store: Arc<dyn KeyValueStore>,
        lecture_id: impl Into<String>,
        user_id: impl Into<String>,
        quiz: Quiz,
    ) -> Result<Self> {
        let mut attempt = Self::new(store, lecture_id, user_id, quiz);

        let saved: Option<SavedAttempt> =
            load_json(attempt.store.as_ref(), &attempt.state_key()).await?;
        let result: Option<QuizResult> =
            load_json(attempt.store.as_ref(), &attempt.result_key()).await?;

        if let Some(saved) = saved {
            if attempt.fits_quiz(&saved) {
                attempt.view = saved.view;
                attempt.answers = saved.answers;
            } else {
                log::warn!(
                    "Saved attempt for lecture {} no longer matches the quiz; starting over",
                    attempt.lecture_id
                );
            }
        }

        match (attempt.view, result) {
            (AttemptView::Results, None) => attempt.view = AttemptView::Details,
            (_, Some(result)) if result.total_questions == attempt.quiz.question_count() => {
                attempt.view = AttemptView::Results;
                attempt.result = Some(result);
            }
            _ => {}
        }

        Ok(attempt)
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn view(&self) -> AttemptView {
        self.view
    }

    pub fn answers(&self) -> &Answers {
        &self.answers
    }

    pub fn result(&self) -> Option<&QuizResult> {
        self.result.as_ref()
    }

    pub fn lecture_id(&self) -> &str {
        &self.lecture_id
    }

    /// `Details -> Taking` at the first question.
    pub async fn start(&mut self) -> Result<()> {
        if self.view != AttemptView::Details {
            return Err(AppError::validation("quiz attempt already started"));
        }
        self.view = AttemptView::Taking {
            current_question: 0,
        };
        self.persist_state().await;
        Ok(())
    }

    /// Select an option. Single-choice replaces, multiple-choice toggles.
    pub async fn select_option(&mut self, question: usize, option: usize) -> Result<()> {
        self.ensure_taking()?;
        let q = self
            .quiz
            .questions()
            .get(question)
            .ok_or_else(|| AppError::validation(format!("no question {question}")))?;
        if option >= q.options.len() {
            return Err(AppError::validation(format!(
                "question {question} has no option {option}"
            )));
        }

        let selected = self.answers.entry(question).or_default();
        match q.kind {
            QuestionKind::SingleChoice => {
                selected.clear();
                selected.insert(option);
            }
            QuestionKind::MultipleChoice => {
                if !selected.remove(&option) {
                    selected.insert(option);
                }
            }
        }

        self.persist_state().await;
        Ok(())
    }

    /// Jump to a question; the index is clamped to the quiz length.
    pub async fn go_to_question(&mut self, index: usize) -> Result<()> {
        self.ensure_taking()?;
        let last = self.quiz.question_count() - 1;
        self.view = AttemptView::Taking {
            current_question: index.min(last),
        };
        self.persist_state().await;
        Ok(())
    }

    pub async fn next_question(&mut self) -> Result<()> {
        let current = self.ensure_taking()?;
        self.go_to_question(current + 1).await
    }

    pub async fn previous_question(&mut self) -> Result<()> {
        let current = self.ensure_taking()?;
        self.go_to_question(current.saturating_sub(1)).await
    }

    /// `Taking -> Results`. Unanswered questions score zero.
    pub async fn submit(&mut self) -> Result<&QuizResult> {
        self.ensure_taking()?;

        let result = evaluate(&self.quiz, &self.answers);
        log::info!(
            "Quiz {} submitted: {}% ({})",
            self.lecture_id,
            result.percentage_score,
            if result.passed { "passed" } else { "not passed" }
        );

        self.view = AttemptView::Results;
        if let Err(e) = save_json(self.store.as_ref(), &self.result_key(), &result).await {
            log::warn!("Could not save quiz result for {}: {}", self.lecture_id, e);
        }
        self.persist_state().await;

        Ok(&*self.result.insert(result))
    }

    /// `Results -> Taking` with a clean slate.
    pub async fn retake(&mut self) -> Result<()> {
        if self.view != AttemptView::Results {
            return Err(AppError::validation("quiz has not been submitted"));
        }
        self.clear_saved().await;
        self.answers.clear();
        self.result = None;
        self.view = AttemptView::Taking {
            current_question: 0,
        };
        self.persist_state().await;
        Ok(())
    }

    /// Back to the details screen, discarding answers and result.
    pub async fn reset(&mut self) {
        self.clear_saved().await;
        self.answers.clear();
        self.result = None;
        self.view = AttemptView::Details;
    }

    fn ensure_taking(&self) -> Result<usize> {
        match self.view {
            AttemptView::Taking { current_question } => Ok(current_question),
            _ => Err(AppError::validation("quiz is not in progress")),
        }
    }

    fn fits_quiz(&self, saved: &SavedAttempt) -> bool {
        let questions = self.quiz.questions();
        let view_ok = match saved.view {
            AttemptView::Taking { current_question } => current_question < questions.len(),
            _ => true,
        };
        view_ok
            && saved.answers.iter().all(|(q, selected)| {
                questions
                    .get(*q)
                    .is_some_and(|question| selected.iter().all(|o| *o < question.options.len()))
            })
    }

    fn state_key(&self) -> StorageKey {
        StorageKey::quiz_state(&self.lecture_id, &self.user_id)
    }

    fn result_key(&self) -> StorageKey {
        StorageKey::quiz_result(&self.lecture_id, &self.user_id)
    }

    async fn persist_state(&self) {
        let saved = SavedAttempt {
            view: self.view,
            answers: self.answers.clone(),
        };
        if let Err(e) = save_json(self.store.as_ref(), &self.state_key(), &saved).await {
            log::warn!("Could not save quiz attempt for {}: {}", self.lecture_id, e);
        }
    }

    async fn clear_saved(&self) {
        for key in [self.state_key(), self.result_key()] {
            if let Err(e) = self.store.clear(&key).await {
                log::warn!("Could not clear {}: {}", key, e);
            }
        }
    }
}
