use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{validate_national_id, validate_registro};
use crate::core::time::format_offset;
use crate::models::{AnswerDetail, AnswerValue, Submission};
use crate::services::submission_guard::DuplicateGroup;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SubmissionCreate {
    #[serde(alias = "nombre", alias = "name")]
    #[validate(length(min = 1, max = 200, message = "respondent_name must be 1 to 200 characters"))]
    pub(crate) respondent_name: String,
    #[validate(custom(function = "validate_registro"))]
    pub(crate) registro: String,
    #[serde(alias = "cedula", alias = "respondentId")]
    #[validate(custom(function = "validate_national_id"))]
    pub(crate) respondent_id: String,
    /// One raw answer per exam question, in question order.
    pub(crate) answers: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionResponse {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) respondent_name: String,
    pub(crate) registro: String,
    pub(crate) respondent_id: String,
    pub(crate) answers: Vec<AnswerValue>,
    pub(crate) details: Vec<AnswerDetail>,
    pub(crate) score: u32,
    pub(crate) total: u32,
    pub(crate) percent: Option<f64>,
    pub(crate) submitted_at: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct DuplicatesResponse {
    pub(crate) exam_id: String,
    pub(crate) duplicates: Vec<DuplicateGroup>,
}

impl From<Submission> for SubmissionResponse {
    fn from(submission: Submission) -> Self {
        Self {
            id: submission.id,
            exam_id: submission.exam_id,
            respondent_name: submission.respondent.name,
            registro: submission.respondent.registro,
            respondent_id: submission.respondent.national_id,
            answers: submission.answers,
            details: submission.details,
            score: submission.score,
            total: submission.total,
            percent: submission.percent,
            submitted_at: format_offset(submission.submitted_at),
        }
    }
}
