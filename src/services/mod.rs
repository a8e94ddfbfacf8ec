pub mod answer_normalizer;
pub mod exam_assembler;
pub mod grading;
pub mod question_schema;
pub mod submission_guard;

pub(crate) mod exams;
pub(crate) mod storage;
pub(crate) mod submissions;
pub(crate) mod supports;
