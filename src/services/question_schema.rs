//! Validation and normalization of untrusted question definitions.
//!
//! `validate_question` is pure: the same JSON always yields the same
//! `Question` or the same `QuestionError`, and feeding a normalized question
//! back in (after serialization) returns it unchanged.

use std::collections::BTreeSet;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::{Question, QuestionBody, Variant};

pub const MAX_TITLE_CHARS: usize = 500;
pub const MAX_OPTION_CHARS: usize = 200;
pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuestionError {
    #[error("question must be a JSON object")]
    NotAnObject,
    #[error("{field} is required")]
    MissingField { field: &'static str },
    #[error("{field} has an invalid value")]
    InvalidField { field: &'static str },
    #[error("unknown variant '{0}'")]
    InvalidVariant(String),
    #[error("correct must be 0 or 1")]
    InvalidCorrectAnswer,
    #[error("at least {MIN_OPTIONS} non-empty options are required, got {count}")]
    TooFewOptions { count: usize },
    #[error("at most {MAX_OPTIONS} options are allowed, got {count}")]
    TooManyOptions { count: usize },
    #[error("correct index is out of range for {len} options")]
    CorrectIndexOutOfRange { len: usize },
    #[error("correct must be a non-empty list of option indices")]
    InvalidCorrectSet,
}

impl QuestionError {
    /// Name of the offending input field.
    pub fn field(&self) -> &'static str {
        match self {
            QuestionError::NotAnObject => "question",
            QuestionError::MissingField { field } | QuestionError::InvalidField { field } => field,
            QuestionError::InvalidVariant(_) => "variant",
            QuestionError::TooFewOptions { .. } | QuestionError::TooManyOptions { .. } => {
                "options"
            }
            QuestionError::InvalidCorrectAnswer
            | QuestionError::CorrectIndexOutOfRange { .. }
            | QuestionError::InvalidCorrectSet => "correct",
        }
    }
}

/// Validates one custom question. Custom questions are scored unless the
/// payload says `"scored": false`; `text` questions are never scored.
pub fn validate_question(raw: &Value) -> Result<Question, QuestionError> {
    let object = raw.as_object().ok_or(QuestionError::NotAnObject)?;

    let title = object
        .get("title")
        .and_then(Value::as_str)
        .map(|title| clean_text(title, MAX_TITLE_CHARS))
        .filter(|title| !title.is_empty())
        .ok_or(QuestionError::MissingField { field: "title" })?;

    let tag = object
        .get("variant")
        .or_else(|| object.get("type"))
        .ok_or(QuestionError::MissingField { field: "variant" })?;
    let tag = tag.as_str().ok_or_else(|| QuestionError::InvalidVariant(tag.to_string()))?;
    let variant = Variant::parse(tag).ok_or_else(|| QuestionError::InvalidVariant(tag.to_string()))?;

    let scored = match object.get("scored") {
        None | Some(Value::Null) => variant != Variant::Text,
        Some(Value::Bool(flag)) => *flag && variant != Variant::Text,
        Some(_) => return Err(QuestionError::InvalidField { field: "scored" }),
    };

    let body = match variant {
        Variant::Text => QuestionBody::Text,
        Variant::TrueFalse => {
            let correct = if scored { Some(true_false_correct(object)?) } else { None };
            QuestionBody::TrueFalse { correct }
        }
        Variant::Multiple => {
            let options = clean_options(object)?;
            let correct = if scored { Some(single_correct(object, options.len())?) } else { None };
            QuestionBody::Multiple { options, correct }
        }
        Variant::Check => {
            let options = clean_options(object)?;
            let correct = if scored { Some(correct_set(object, options.len())?) } else { None };
            QuestionBody::Check { options, correct }
        }
    };

    Ok(Question { title, scored, body })
}

/// Validates a fixed question. Fixed questions are always unscored, whatever
/// the definition says.
pub fn validate_fixed_question(raw: &Value) -> Result<Question, QuestionError> {
    let mut raw = raw.clone();
    if let Some(object) = raw.as_object_mut() {
        object.insert("scored".to_string(), Value::Bool(false));
    }
    validate_question(&raw).map(Question::unscored)
}

/// Trims, caps at `max_chars` characters, and trims again so the result is
/// stable under repeated cleaning.
pub(crate) fn clean_text(value: &str, max_chars: usize) -> String {
    let trimmed = value.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    trimmed.chars().take(max_chars).collect::<String>().trim_end().to_string()
}

fn clean_options(object: &Map<String, Value>) -> Result<Vec<String>, QuestionError> {
    let raw = match object.get("options") {
        None | Some(Value::Null) => return Err(QuestionError::TooFewOptions { count: 0 }),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(QuestionError::InvalidField { field: "options" }),
    };

    let options: Vec<String> = raw
        .iter()
        .filter_map(Value::as_str)
        .map(|option| clean_text(option, MAX_OPTION_CHARS))
        .filter(|option| !option.is_empty())
        .collect();

    match options.len() {
        count if count < MIN_OPTIONS => Err(QuestionError::TooFewOptions { count }),
        count if count > MAX_OPTIONS => Err(QuestionError::TooManyOptions { count }),
        _ => Ok(options),
    }
}

fn true_false_correct(object: &Map<String, Value>) -> Result<usize, QuestionError> {
    match object.get("correct").and_then(Value::as_u64) {
        Some(index @ (0 | 1)) => Ok(index as usize),
        _ => Err(QuestionError::InvalidCorrectAnswer),
    }
}

/// Anything but an integer index into `options` is out of range, including a
/// missing, negative, fractional or string value.
fn single_correct(object: &Map<String, Value>, len: usize) -> Result<usize, QuestionError> {
    object
        .get("correct")
        .and_then(Value::as_u64)
        .and_then(|index| usize::try_from(index).ok())
        .filter(|index| *index < len)
        .ok_or(QuestionError::CorrectIndexOutOfRange { len })
}

fn correct_set(object: &Map<String, Value>, len: usize) -> Result<Vec<usize>, QuestionError> {
    let items = object
        .get("correct")
        .and_then(Value::as_array)
        .filter(|items| !items.is_empty())
        .ok_or(QuestionError::InvalidCorrectSet)?;

    let mut indices = BTreeSet::new();
    for item in items {
        let index = item
            .as_u64()
            .and_then(|index| usize::try_from(index).ok())
            .filter(|index| *index < len)
            .ok_or(QuestionError::InvalidCorrectSet)?;
        indices.insert(index);
    }

    Ok(indices.into_iter().collect())
}
