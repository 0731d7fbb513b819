//! Course structure as delivered by the backend.

use serde::{Deserialize, Deserializer, Serialize};

use super::quiz::RawQuiz;

/// A (section, lecture) coordinate inside a course.
///
/// Completion is recorded by position rather than by lecture ID, so this
/// type doubles as the completion record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub section_index: usize,
    pub lecture_index: usize,
}

impl Position {
    pub fn new(section_index: usize, lecture_index: usize) -> Self {
        Self {
            section_index,
            lecture_index,
        }
    }
}

/// Marks one lecture done for one enrollment.
pub type CompletionRecord = Position;

/// Read-only course tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(alias = "_id")]
    pub id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub sections: Vec<Section>,
}

/// Ordered group of lectures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    #[serde(alias = "_id")]
    pub id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub lectures: Vec<Lecture>,
}

/// One learning unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Lecture {
    #[serde(alias = "_id")]
    pub id: String,

    #[serde(default)]
    pub title: String,

    /// Duration in whole seconds; fractional values are rounded
    #[serde(rename = "duration", default, deserialize_with = "seconds")]
    pub duration_secs: u64,

    #[serde(flatten)]
    pub content: LectureContent,
}

/// Variant-specific lecture payload, tagged by `type`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LectureContent {
    Video {
        #[serde(default, rename = "videoUrl")]
        video_url: Option<String>,
    },
    Quiz {
        quiz: RawQuiz,
    },
    Note {
        #[serde(default)]
        content: Option<String>,
    },
}

/// Accept any JSON number (or null) as a duration in seconds.
fn seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0);
    Ok(if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    })
}

impl Lecture {
    pub fn quiz(&self) -> Option<&RawQuiz> {
        match &self.content {
            LectureContent::Quiz { quiz } => Some(quiz),
            _ => None,
        }
    }

    pub fn is_quiz(&self) -> bool {
        self.quiz().is_some()
    }
}

impl Course {
    /// Look up the section and lecture at a position.
    pub fn lecture_at(&self, position: Position) -> Option<(&Section, &Lecture)> {
        let section = self.sections.get(position.section_index)?;
        let lecture = section.lectures.get(position.lecture_index)?;
        Some((section, lecture))
    }

    pub fn contains(&self, position: Position) -> bool {
        self.lecture_at(position).is_some()
    }

    /// Total number of lectures across all sections.
    pub fn lecture_count(&self) -> usize {
        self.sections.iter().map(|s| s.lectures.len()).sum()
    }

    /// All lecture positions in reading order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.sections
            .iter()
            .enumerate()
            .flat_map(|(s, section)| {
                (0..section.lectures.len()).map(move |l| Position::new(s, l))
            })
    }
}
