//! Assembly of exam question lists from the fixed set and custom questions.
//!
//! Index order is the alignment key between an exam's questions and every
//! stored answer list, so the fixed prefix must never change underneath
//! existing submissions. The fixed set is loaded once at startup and shared
//! read-only.

use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use crate::models::Question;
use crate::services::question_schema::{validate_fixed_question, QuestionError};

/// The process-wide fixed question set, identified by a content hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedQuestionSet {
    version: String,
    questions: Vec<Question>,
}

#[derive(Debug, thiserror::Error)]
pub enum FixedSetError {
    #[error("failed to read fixed questions file {path}: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("fixed questions file must contain a JSON array: {0}")]
    Format(String),
    #[error("fixed question {index}: {source}")]
    Invalid { index: usize, source: QuestionError },
}

impl FixedQuestionSet {
    pub fn from_values(values: &[Value]) -> Result<Self, FixedSetError> {
        let questions = values
            .iter()
            .enumerate()
            .map(|(index, value)| {
                validate_fixed_question(value).map_err(|source| FixedSetError::Invalid { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(questions))
    }

    pub fn from_file(path: &Path) -> Result<Self, FixedSetError> {
        let raw = std::fs::read_to_string(path).map_err(|source| FixedSetError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let values: Vec<Value> =
            serde_json::from_str(&raw).map_err(|err| FixedSetError::Format(err.to_string()))?;
        Self::from_values(&values)
    }

    /// Course feedback questions shown at the top of every exam.
    pub fn builtin() -> Self {
        let values = [
            json!({
                "title": "¿Cómo califica el curso?",
                "variant": "multiple",
                "options": ["Excelente", "Bueno", "Regular", "Malo"]
            }),
            json!({
                "title": "¿El facilitador explicó claramente los temas?",
                "variant": "multiple",
                "options": ["Sí", "Parcialmente", "No"]
            }),
            json!({
                "title": "¿Recomendaría este curso?",
                "variant": "multiple",
                "options": ["Sí", "No"]
            }),
        ];
        let questions = values
            .iter()
            .filter_map(|value| validate_fixed_question(value).ok())
            .collect();
        Self::new(questions)
    }

    fn new(questions: Vec<Question>) -> Self {
        let questions: Vec<Question> = questions.into_iter().map(Question::unscored).collect();
        let canonical = serde_json::to_vec(&questions).unwrap_or_default();
        let digest = hex::encode(Sha256::digest(&canonical));
        Self { version: digest[..12].to_string(), questions }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ExamAssembler {
    fixed: Arc<FixedQuestionSet>,
}

impl ExamAssembler {
    pub fn new(fixed: Arc<FixedQuestionSet>) -> Self {
        Self { fixed }
    }

    pub fn fixed(&self) -> &FixedQuestionSet {
        &self.fixed
    }

    /// Fixed questions followed by `custom` in the given order.
    pub fn assemble(&self, custom: Vec<Question>) -> Vec<Question> {
        let mut questions = Vec::with_capacity(self.fixed.len() + custom.len());
        questions.extend(self.fixed.questions().iter().cloned());
        questions.extend(custom);
        questions
    }
}
