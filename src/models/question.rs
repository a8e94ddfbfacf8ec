use serde::{Deserialize, Serialize};

/// Options every `true_false` question carries, in index order.
pub const TRUE_FALSE_OPTIONS: [&str; 2] = ["TRUE", "FALSE"];

/// A normalized question. The variant payload lives in `body`; `scored`
/// decides whether the question contributes to the total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub title: String,
    #[serde(default)]
    pub scored: bool,
    #[serde(flatten)]
    pub body: QuestionBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum QuestionBody {
    Text,
    Multiple {
        options: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        correct: Option<usize>,
    },
    Check {
        options: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        correct: Option<Vec<usize>>,
    },
    TrueFalse {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        correct: Option<usize>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Text,
    Multiple,
    Check,
    TrueFalse,
}

impl Variant {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "text" => Some(Variant::Text),
            "multiple" => Some(Variant::Multiple),
            "check" => Some(Variant::Check),
            "true_false" => Some(Variant::TrueFalse),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Text => "text",
            Variant::Multiple => "multiple",
            Variant::Check => "check",
            Variant::TrueFalse => "true_false",
        }
    }
}

impl Question {
    pub fn variant(&self) -> Variant {
        match self.body {
            QuestionBody::Text => Variant::Text,
            QuestionBody::Multiple { .. } => Variant::Multiple,
            QuestionBody::Check { .. } => Variant::Check,
            QuestionBody::TrueFalse { .. } => Variant::TrueFalse,
        }
    }

    /// Option texts in display order; empty for `text`.
    pub fn options(&self) -> Vec<&str> {
        match &self.body {
            QuestionBody::Text => Vec::new(),
            QuestionBody::Multiple { options, .. } | QuestionBody::Check { options, .. } => {
                options.iter().map(String::as_str).collect()
            }
            QuestionBody::TrueFalse { .. } => TRUE_FALSE_OPTIONS.to_vec(),
        }
    }

    /// Same question with the answer key removed and scoring switched off.
    pub fn unscored(mut self) -> Self {
        self.scored = false;
        match &mut self.body {
            QuestionBody::Text => {}
            QuestionBody::Multiple { correct, .. } | QuestionBody::TrueFalse { correct } => {
                *correct = None;
            }
            QuestionBody::Check { correct, .. } => *correct = None,
        }
        self
    }
}
