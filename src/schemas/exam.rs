use serde::{Deserialize, Serialize};
use validator::Validate;

use super::validate_national_id;
use crate::core::time::format_offset;
use crate::models::{Exam, ExamMetadata, Question};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExamCreate {
    #[validate(length(min = 1, max = 200, message = "facilitator must be 1 to 200 characters"))]
    pub(crate) facilitator: String,
    #[serde(alias = "facilitatorId", alias = "facilitator_cedula")]
    #[validate(custom(function = "validate_national_id"))]
    pub(crate) facilitator_id: String,
    #[validate(length(min = 1, max = 200, message = "course must be 1 to 200 characters"))]
    pub(crate) course: String,
    /// Custom questions, validated one by one so errors can name the index.
    #[serde(default)]
    pub(crate) questions: Vec<serde_json::Value>,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) metadata: ExamMetadata,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExamUpdate {
    pub(crate) questions: Vec<serde_json::Value>,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) metadata: Option<ExamMetadata>,
}

/// Facilitator view: includes answer keys.
#[derive(Debug, Serialize)]
pub(crate) struct ExamResponse {
    pub(crate) id: String,
    pub(crate) facilitator: String,
    pub(crate) facilitator_id: String,
    pub(crate) course: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: Option<String>,
    pub(crate) fixed_version: String,
    pub(crate) fixed_count: usize,
    pub(crate) questions: Vec<Question>,
    pub(crate) metadata: ExamMetadata,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamPublishedResponse {
    pub(crate) exam_url: String,
    pub(crate) exam: ExamResponse,
}

/// A question as shown to respondents.
#[derive(Debug, Serialize)]
pub(crate) struct PublicQuestion {
    pub(crate) index: usize,
    pub(crate) title: String,
    pub(crate) variant: &'static str,
    pub(crate) scored: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) options: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PublicExamResponse {
    pub(crate) id: String,
    pub(crate) facilitator: String,
    pub(crate) course: String,
    pub(crate) created_at: String,
    pub(crate) questions: Vec<PublicQuestion>,
    pub(crate) metadata: ExamMetadata,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamSummary {
    pub(crate) id: String,
    pub(crate) facilitator: String,
    pub(crate) course: String,
    pub(crate) created_at: String,
    pub(crate) question_count: usize,
}

impl From<Exam> for ExamResponse {
    fn from(exam: Exam) -> Self {
        Self {
            id: exam.id,
            facilitator: exam.facilitator.name,
            facilitator_id: exam.facilitator.national_id,
            course: exam.course,
            created_at: format_offset(exam.created_at),
            updated_at: exam.updated_at.map(format_offset),
            fixed_version: exam.fixed_version,
            fixed_count: exam.fixed_count,
            questions: exam.questions,
            metadata: exam.metadata,
        }
    }
}

impl From<Exam> for PublicExamResponse {
    fn from(exam: Exam) -> Self {
        let questions = exam
            .questions
            .iter()
            .enumerate()
            .map(|(index, question)| PublicQuestion {
                index,
                title: question.title.clone(),
                variant: question.variant().as_str(),
                scored: question.scored,
                options: question.options().into_iter().map(str::to_string).collect(),
            })
            .collect();

        Self {
            id: exam.id,
            facilitator: exam.facilitator.name,
            course: exam.course,
            created_at: format_offset(exam.created_at),
            questions,
            metadata: exam.metadata,
        }
    }
}

impl From<&Exam> for ExamSummary {
    fn from(exam: &Exam) -> Self {
        Self {
            id: exam.id.clone(),
            facilitator: exam.facilitator.name.clone(),
            course: exam.course.clone(),
            created_at: format_offset(exam.created_at),
            question_count: exam.questions.len(),
        }
    }
}
