//! Pure quiz scoring.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::QuestionKind;

use super::{Answers, Question, Quiz};

/// Score of one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResult {
    pub question_index: usize,
    pub selected: BTreeSet<usize>,
    pub correct: BTreeSet<usize>,
    /// In `[0, 1]`, two decimals for partial credit
    pub score: f64,
    pub max_score: f64,
    /// Full credit only; partial credit is never counted as correct
    pub is_correct: bool,
}

/// Aggregate result of one submitted attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub total_questions: usize,
    pub scored_marks: f64,
    pub total_marks: usize,
    /// Rounded percentage in `[0, 100]`
    pub percentage_score: u8,
    pub correct_answers: usize,
    pub passed: bool,
    pub is_graded: bool,
    pub passing_score: u8,
    pub question_results: Vec<QuestionResult>,
}

/// Score a submitted answer selection.
///
/// Questions missing from `answers` count as unanswered. Practice quizzes
/// always pass.
pub fn evaluate(quiz: &Quiz, answers: &Answers) -> QuizResult {
    let empty = BTreeSet::new();

    let question_results: Vec<QuestionResult> = quiz
        .questions()
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let selected = answers.get(&index).unwrap_or(&empty);
            let score = score_question(question, selected);
            QuestionResult {
                question_index: index,
                selected: selected.clone(),
                correct: question.correct.clone(),
                score,
                max_score: 1.0,
                is_correct: score >= 1.0,
            }
        })
        .collect();

    let total_questions = question_results.len();
    let scored_marks: f64 = question_results.iter().map(|r| r.score).sum();
    let correct_answers = question_results.iter().filter(|r| r.is_correct).count();

    // Quiz::new guarantees at least one question.
    let percentage = (scored_marks / total_questions as f64 * 100.0).round();
    let percentage_score = percentage.clamp(0.0, 100.0) as u8;

    let passed = !quiz.is_graded() || percentage_score >= quiz.passing_score();

    log::debug!(
        "Quiz evaluated: {}/{} marks, {}% ({})",
        scored_marks,
        total_questions,
        percentage_score,
        if passed { "passed" } else { "failed" }
    );

    QuizResult {
        total_questions,
        scored_marks,
        total_marks: total_questions,
        percentage_score,
        correct_answers,
        passed,
        is_graded: quiz.is_graded(),
        passing_score: quiz.passing_score(),
        question_results,
    }
}

/// Score one question against a selection.
pub fn score_question(question: &Question, selected: &BTreeSet<usize>) -> f64 {
    let correct = &question.correct;

    match question.kind {
        QuestionKind::SingleChoice => match selected.iter().next() {
            Some(choice) if selected.len() == 1 && correct.contains(choice) => 1.0,
            _ => 0.0,
        },
        QuestionKind::MultipleChoice => {
            if selected.is_empty() || !selected.is_subset(correct) {
                0.0
            } else if selected == correct {
                1.0
            } else {
                let ratio = selected.len() as f64 / correct.len() as f64;
                (ratio * 100.0).round() / 100.0
            }
        }
    }
}
