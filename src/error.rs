use thiserror::Error;
use validator::ValidationErrors;

use crate::services::question_schema::QuestionError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ExamError {
    #[error("question {index}: {source}")]
    InvalidQuestion {
        index: usize,
        #[source]
        source: QuestionError,
    },
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },
    #[error("respondent {respondent_id} already submitted exam {exam_id}")]
    DuplicateSubmission { exam_id: String, respondent_id: String },
    #[error("storage unavailable: {0}")]
    StoreUnavailable(String),
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),
}

impl ExamError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ExamError::Validation { field: field.into(), message: message.into() }
    }

    pub fn exam_not_found(id: &str) -> Self {
        ExamError::NotFound { entity: "exam", id: id.to_string() }
    }

    /// Name of the offending field for validation failures.
    pub fn field(&self) -> Option<String> {
        match self {
            ExamError::InvalidQuestion { index, source } => {
                Some(format!("questions[{index}].{}", source.field()))
            }
            ExamError::Validation { field, .. } => Some(field.clone()),
            _ => None,
        }
    }
}

impl From<StoreError> for ExamError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(message) => ExamError::StoreUnavailable(message),
            StoreError::RowOutOfRange { table, index } => {
                ExamError::NotFound { entity: "row", id: format!("{table}[{index}]") }
            }
            StoreError::Corrupt(message) => ExamError::SchemaMismatch(message),
        }
    }
}

impl From<ValidationErrors> for ExamError {
    /// Reports the first failing field, in name order so the choice is stable.
    fn from(errors: ValidationErrors) -> Self {
        let field_errors = errors.field_errors();
        let mut fields: Vec<_> = field_errors.iter().collect();
        fields.sort_by(|(a, _), (b, _)| a.cmp(b));

        let Some((field, details)) = fields.first() else {
            return ExamError::validation("payload", errors.to_string());
        };
        let message = details
            .first()
            .map(|detail| match &detail.message {
                Some(message) => message.to_string(),
                None => detail.code.to_string(),
            })
            .unwrap_or_else(|| "is invalid".to_string());
        ExamError::validation(field.to_string(), message)
    }
}
