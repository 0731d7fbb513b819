//! Quiz scoring.
//!
//! Raw backend quizzes are normalized into [`Quiz`] once, at the boundary.
//! Scoring ([`evaluate`]) and the attempt state machine ([`QuizAttempt`])
//! only ever see the canonical form.

mod attempt;
mod evaluate;
mod normalize;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::QuestionKind;

pub use attempt::{AttemptView, QuizAttempt};
pub use evaluate::{QuestionResult, QuizResult, evaluate, score_question};
pub use normalize::{normalize, normalize_question};

/// Passing threshold applied to graded quizzes without their own.
pub const DEFAULT_PASSING_SCORE: u8 = 75;

/// Selected option indices per question index.
pub type Answers = BTreeMap<usize, BTreeSet<usize>>;

/// Canonical question: option texts plus the resolved correct index set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    pub kind: QuestionKind,
    pub options: Vec<String>,
    pub correct: BTreeSet<usize>,
}

/// Canonical quiz. Always holds at least one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    questions: Vec<Question>,
    is_graded: bool,
    passing_score: u8,
}

impl Quiz {
    pub fn new(questions: Vec<Question>, is_graded: bool, passing_score: u8) -> Result<Self> {
        if questions.is_empty() {
            return Err(AppError::EmptyQuiz);
        }
        if passing_score > 100 {
            return Err(AppError::validation(format!(
                "passing score {passing_score} is above 100"
            )));
        }
        Ok(Self {
            questions,
            is_graded,
            passing_score,
        })
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn is_graded(&self) -> bool {
        self.is_graded
    }

    pub fn passing_score(&self) -> u8 {
        self.passing_score
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn single(correct: usize, option_count: usize) -> Question {
        Question {
            text: format!("single {correct}"),
            kind: QuestionKind::SingleChoice,
            options: (0..option_count).map(|i| format!("option {i}")).collect(),
            correct: BTreeSet::from([correct]),
        }
    }

    pub fn multiple(correct: &[usize], option_count: usize) -> Question {
        Question {
            text: "multiple".to_string(),
            kind: QuestionKind::MultipleChoice,
            options: (0..option_count).map(|i| format!("option {i}")).collect(),
            correct: correct.iter().copied().collect(),
        }
    }

    pub fn pick(indices: &[usize]) -> BTreeSet<usize> {
        indices.iter().copied().collect()
    }
}
