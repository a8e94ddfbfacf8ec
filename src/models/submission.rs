use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A respondent's answer after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Single(String),
    Many(Vec<String>),
}

impl AnswerValue {
    pub fn empty_single() -> Self {
        AnswerValue::Single(String::new())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            AnswerValue::Single(value) => value.is_empty(),
            AnswerValue::Many(values) => values.is_empty(),
        }
    }
}

/// Per-question grading outcome. `is_correct` is `None` for ungraded
/// questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerDetail {
    pub index: usize,
    pub is_correct: Option<bool>,
    pub user_value: AnswerValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_value: Option<AnswerValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Respondent {
    pub name: String,
    pub registro: String,
    pub national_id: String,
}

/// One accepted, graded submission. Immutable once stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub id: String,
    pub exam_id: String,
    pub respondent: Respondent,
    pub answers: Vec<AnswerValue>,
    pub details: Vec<AnswerDetail>,
    pub score: u32,
    pub total: u32,
    pub percent: Option<f64>,
    pub submitted_at: OffsetDateTime,
}
