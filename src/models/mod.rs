pub mod exam;
pub mod question;
pub mod submission;
pub mod support;

pub use exam::{Exam, ExamMetadata, Facilitator};
pub use question::{Question, QuestionBody, Variant, TRUE_FALSE_OPTIONS};
pub use submission::{AnswerDetail, AnswerValue, Respondent, Submission};
pub use support::SupportFile;
