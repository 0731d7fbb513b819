//! Conversion of raw backend quiz shapes into the canonical [`Quiz`].

use std::collections::BTreeSet;

use crate::error::{AppError, Result};
use crate::models::{QuestionKind, RawQuestion, RawQuestions, RawQuiz};

use super::{Question, Quiz};

/// Normalize a raw quiz.
///
/// `default_passing_score` applies when the quiz does not carry its own
/// threshold.
pub fn normalize(raw: &RawQuiz, default_passing_score: u8) -> Result<Quiz> {
    let decoded;
    let questions: &[RawQuestion] = match &raw.questions {
        RawQuestions::List(list) => list,
        RawQuestions::Encoded(text) => {
            decoded = decode_legacy(text)?;
            &decoded
        }
    };

    if questions.is_empty() {
        return Err(AppError::EmptyQuiz);
    }

    let questions = questions
        .iter()
        .enumerate()
        .map(|(index, question)| normalize_question(index, question))
        .collect::<Result<Vec<_>>>()?;

    Quiz::new(
        questions,
        raw.is_graded,
        raw.passing_score.unwrap_or(default_passing_score),
    )
}

/// Normalize one question.
///
/// Correct answers are resolved with precedence `correctAnswers` array,
/// then the `correctAnswer` scalar, then per-option `isCorrect` flags.
pub fn normalize_question(index: usize, raw: &RawQuestion) -> Result<Question> {
    if raw.options.is_empty() {
        return Err(AppError::validation(format!(
            "question {} has no options",
            index + 1
        )));
    }

    let option_count = raw.options.len();
    let in_range = |i: &i64| usize::try_from(*i).ok().filter(|i| *i < option_count);

    // A source that resolves to nothing in range falls through to the next.
    let from_list = raw
        .correct_answers
        .iter()
        .map(|list| list.iter().filter_map(in_range).collect::<BTreeSet<_>>());
    let from_scalar = raw
        .correct_answer
        .iter()
        .map(|single| in_range(single).into_iter().collect::<BTreeSet<_>>());
    let from_flags = std::iter::once_with(|| {
        raw.options
            .iter()
            .enumerate()
            .filter(|(_, option)| option.is_flagged_correct())
            .map(|(i, _)| i)
            .collect::<BTreeSet<_>>()
    });

    let correct = from_list
        .chain(from_scalar)
        .chain(from_flags)
        .find(|set| !set.is_empty())
        .unwrap_or_default();

    if correct.is_empty() {
        return Err(AppError::validation(format!(
            "question {} has no correct answer",
            index + 1
        )));
    }

    let kind = raw.kind.unwrap_or(if correct.len() > 1 {
        QuestionKind::MultipleChoice
    } else {
        QuestionKind::SingleChoice
    });

    Ok(Question {
        text: raw.question.clone(),
        kind,
        options: raw.options.iter().map(|o| o.text().to_string()).collect(),
        correct,
    })
}

/// Decode questions stored as JSON text by older course builders.
fn decode_legacy(text: &str) -> Result<Vec<RawQuestion>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(text).map_err(|e| {
        log::warn!("Undecodable legacy quiz content: {}", e);
        AppError::validation(format!("legacy quiz content is not valid JSON: {e}"))
    })
}
