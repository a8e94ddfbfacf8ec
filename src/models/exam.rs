use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use validator::Validate;

use super::question::Question;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facilitator {
    pub name: String,
    pub national_id: String,
}

/// Free-form exam details carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ExamMetadata {
    #[serde(default)]
    #[validate(length(max = 100, message = "date is too long"))]
    pub date: Option<String>,
    #[serde(default)]
    #[validate(length(max = 100, message = "duration is too long"))]
    pub duration: Option<String>,
    #[serde(default, alias = "inviteCount")]
    pub invite_count: Option<u32>,
    #[serde(default, alias = "contactEmail")]
    #[validate(email(message = "contact_email must be a valid email"))]
    pub contact_email: Option<String>,
    #[serde(default)]
    #[validate(length(max = 2000, message = "description is too long"))]
    pub description: Option<String>,
}

/// A published exam with its assembled question list
/// (fixed questions first, then custom ones).
#[derive(Debug, Clone, PartialEq)]
pub struct Exam {
    pub id: String,
    pub facilitator: Facilitator,
    pub course: String,
    pub created_at: OffsetDateTime,
    pub updated_at: Option<OffsetDateTime>,
    pub questions: Vec<Question>,
    /// Number of leading fixed questions in `questions`.
    pub fixed_count: usize,
    /// Version of the fixed question set the exam was stored against.
    pub fixed_version: String,
    pub metadata: ExamMetadata,
}

impl Exam {
    pub fn custom_questions(&self) -> &[Question] {
        &self.questions[self.fixed_count.min(self.questions.len())..]
    }
}
