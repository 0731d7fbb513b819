//! Quiz payloads in the shapes the backend has produced over time.
//!
//! These types accept every historical representation. They are turned into
//! the canonical scoring form by [`crate::quiz::normalize`].

use serde::{Deserialize, Serialize};

/// Question answer mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionKind {
    #[serde(
        rename = "single-choice",
        alias = "single",
        alias = "single_choice",
        alias = "singleChoice"
    )]
    SingleChoice,
    #[serde(
        rename = "multiple-choice",
        alias = "multiple",
        alias = "multiple_choice",
        alias = "multipleChoice"
    )]
    MultipleChoice,
}

/// Quiz attached to a quiz lecture.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawQuiz {
    #[serde(default)]
    pub questions: RawQuestions,

    #[serde(default)]
    pub is_graded: bool,

    /// Percentage threshold; the configured default applies when absent
    #[serde(default)]
    pub passing_score: Option<u8>,
}

/// Question list, either inline or as legacy JSON-encoded text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RawQuestions {
    List(Vec<RawQuestion>),
    Encoded(String),
}

impl Default for RawQuestions {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawQuestion {
    #[serde(alias = "text", default)]
    pub question: String,

    #[serde(rename = "type", default)]
    pub kind: Option<QuestionKind>,

    #[serde(default)]
    pub options: Vec<RawOption>,

    #[serde(default)]
    pub correct_answers: Option<Vec<i64>>,

    #[serde(default)]
    pub correct_answer: Option<i64>,
}

/// An answer option, either bare text or text with a correctness flag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RawOption {
    Text(String),
    Detailed(OptionDetail),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OptionDetail {
    #[serde(alias = "option", default)]
    pub text: String,

    #[serde(default)]
    pub is_correct: Option<bool>,
}

impl RawOption {
    pub fn text(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Detailed(detail) => &detail.text,
        }
    }

    pub fn is_flagged_correct(&self) -> bool {
        match self {
            Self::Text(_) => false,
            Self::Detailed(detail) => detail.is_correct.unwrap_or(false),
        }
    }
}
