//! Turns untyped answer payloads into typed values aligned with their
//! question. Never fails: anything malformed becomes an empty answer so one
//! bad field cannot block the rest of a submission.

use serde_json::Value;

use crate::models::{AnswerValue, Question, Variant};
use crate::services::question_schema::clean_text as clean;

pub const MAX_ANSWER_CHARS: usize = 500;
pub const MAX_CHOICE_CHARS: usize = 200;
pub const MAX_CHOICES: usize = 50;

/// How a `check` answer sent as a bare string is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckScalarPolicy {
    /// Accept it as a one-element list (older clients send this).
    #[default]
    Singleton,
    /// Treat it as malformed and normalize to an empty list.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedAnswer {
    pub value: AnswerValue,
    /// Set when a `check` answer arrived as a bare string.
    pub scalar_fallback: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnswerNormalizer {
    check_scalar: CheckScalarPolicy,
}

impl AnswerNormalizer {
    pub fn new(check_scalar: CheckScalarPolicy) -> Self {
        Self { check_scalar }
    }

    pub fn normalize(&self, raw: &Value, question: &Question) -> NormalizedAnswer {
        match question.variant() {
            Variant::Text | Variant::Multiple | Variant::TrueFalse => NormalizedAnswer {
                value: AnswerValue::Single(single_value(raw)),
                scalar_fallback: false,
            },
            Variant::Check => self.check_value(raw),
        }
    }

    /// Normalizes an index-aligned answer list. `raw` and `questions` must
    /// have equal length; the caller enforces that.
    pub fn normalize_all(&self, raw: &[Value], questions: &[Question]) -> Vec<NormalizedAnswer> {
        questions
            .iter()
            .zip(raw)
            .map(|(question, value)| self.normalize(value, question))
            .collect()
    }

    fn check_value(&self, raw: &Value) -> NormalizedAnswer {
        match raw {
            Value::Array(items) => {
                let mut choices: Vec<String> = Vec::new();
                for choice in items.iter().filter_map(Value::as_str) {
                    let choice = clean(choice, MAX_CHOICE_CHARS);
                    if !choice.is_empty() && !choices.contains(&choice) {
                        choices.push(choice);
                    }
                    if choices.len() == MAX_CHOICES {
                        break;
                    }
                }
                NormalizedAnswer { value: AnswerValue::Many(choices), scalar_fallback: false }
            }
            Value::String(single) => {
                let choice = clean(single, MAX_CHOICE_CHARS);
                let value = match self.check_scalar {
                    CheckScalarPolicy::Singleton if !choice.is_empty() => vec![choice],
                    _ => Vec::new(),
                };
                NormalizedAnswer { value: AnswerValue::Many(value), scalar_fallback: true }
            }
            _ => NormalizedAnswer { value: AnswerValue::Many(Vec::new()), scalar_fallback: false },
        }
    }
}

fn single_value(raw: &Value) -> String {
    raw.as_str().map(|value| clean(value, MAX_ANSWER_CHARS)).unwrap_or_default()
}
