use std::sync::Arc;

use serde_json::{json, Value};
use time::macros::datetime;

use examdesk::error::ExamError;
use examdesk::models::{AnswerValue, Question, Respondent, Submission};
use examdesk::services::answer_normalizer::{AnswerNormalizer, CheckScalarPolicy};
use examdesk::services::exam_assembler::{ExamAssembler, FixedQuestionSet};
use examdesk::services::grading::GradingEngine;
use examdesk::services::question_schema::validate_question;
use examdesk::services::submission_guard::SubmissionGuard;
use examdesk::store::memory::MemoryRowStore;
use examdesk::store::retry::RetryPolicy;
use examdesk::store::{RowStore, Table};

fn exam(custom: &[Value]) -> Vec<Question> {
    let assembler = ExamAssembler::new(Arc::new(FixedQuestionSet::builtin()));
    let custom = custom.iter().map(|raw| validate_question(raw).expect("valid question")).collect();
    assembler.assemble(custom)
}

fn answers_for(questions: &[Question], custom: &[Value]) -> Vec<AnswerValue> {
    let fixed = questions.len() - custom.len();
    let mut raw = vec![json!(""); fixed];
    raw.extend_from_slice(custom);
    AnswerNormalizer::new(CheckScalarPolicy::Singleton)
        .normalize_all(&raw, questions)
        .into_iter()
        .map(|answer| answer.value)
        .collect()
}

fn multiple_choice() -> Vec<Value> {
    vec![json!({"title": "Pick B", "variant": "multiple", "options": ["A", "B", "C"], "correct": 1})]
}

fn check_question() -> Vec<Value> {
    vec![json!({"title": "Pick X and Z", "variant": "check", "options": ["X", "Y", "Z"], "correct": [0, 2]})]
}

#[test]
fn scenario_a_correct_multiple_choice_earns_full_points() {
    let questions = exam(&multiple_choice());
    let answers = answers_for(&questions, &[json!("B")]);

    let report = GradingEngine::new(5, false).grade(&questions, &answers);
    assert_eq!((report.score, report.total), (5, 5));
    assert_eq!(report.percent, Some(100.0));
}

#[test]
fn scenario_b_wrong_multiple_choice_scores_zero() {
    let questions = exam(&multiple_choice());
    let answers = answers_for(&questions, &[json!("C")]);

    let report = GradingEngine::new(5, false).grade(&questions, &answers);
    assert_eq!((report.score, report.total), (0, 5));
    assert_eq!(report.percent, Some(0.0));
}

#[test]
fn scenario_c_check_answer_matches_as_a_set() {
    let questions = exam(&check_question());
    let answers = answers_for(&questions, &[json!(["Z", "X"])]);

    let report = GradingEngine::new(1, false).grade(&questions, &answers);
    assert_eq!(report.details.last().and_then(|detail| detail.is_correct), Some(true));
    assert_eq!((report.score, report.total), (1, 1));
}

#[test]
fn scenario_d_partial_check_answer_is_wrong() {
    let questions = exam(&check_question());
    let answers = answers_for(&questions, &[json!(["Z"])]);

    let report = GradingEngine::new(1, false).grade(&questions, &answers);
    assert_eq!(report.details.last().and_then(|detail| detail.is_correct), Some(false));
    assert_eq!((report.score, report.total), (0, 1));
}

#[test]
fn scenario_e_unscored_exam_has_no_percent() {
    let custom = vec![
        json!({"title": "Opinion", "variant": "text"}),
        json!({"title": "Mood", "variant": "multiple", "options": ["Good", "Bad"], "scored": false}),
    ];
    let questions = exam(&custom);
    let answers = answers_for(&questions, &[json!("fine"), json!("Good")]);

    let report = GradingEngine::new(5, false).grade(&questions, &answers);
    assert_eq!((report.score, report.total), (0, 0));
    assert_eq!(report.percent, None);
    assert!(report.details.iter().all(|detail| detail.is_correct.is_none()));
}

fn graded_submission(id: &str, respondent_id: &str) -> Submission {
    let questions = exam(&multiple_choice());
    let answers = answers_for(&questions, &[json!("B")]);
    let report = GradingEngine::new(5, false).grade(&questions, &answers);

    Submission {
        id: id.to_string(),
        exam_id: "0123456789abcdef0123456789abcdef".to_string(),
        respondent: Respondent {
            name: "Ana Gomez".to_string(),
            registro: "42".to_string(),
            national_id: respondent_id.to_string(),
        },
        answers,
        details: report.details,
        score: report.score,
        total: report.total,
        percent: report.percent,
        submitted_at: datetime!(2025-03-01 12:00:00 UTC),
    }
}

#[tokio::test]
async fn concurrent_submissions_store_one_row_per_respondent() {
    let store = Arc::new(MemoryRowStore::new());
    let guard = Arc::new(SubmissionGuard::new(store.clone(), RetryPolicy::no_delay(3)));

    let attempts = (0..8).map(|i| {
        let guard = guard.clone();
        tokio::spawn(async move { guard.admit(graded_submission(&format!("s{i}"), "12345678")).await })
    });
    let results = futures_results(attempts).await;

    let accepted = results.iter().filter(|result| result.is_ok()).count();
    let duplicates = results
        .iter()
        .filter(|result| matches!(result, Err(ExamError::DuplicateSubmission { .. })))
        .count();
    assert_eq!((accepted, duplicates), (1, 7));

    let rows = store.read_all(Table::Submissions).await.expect("rows");
    assert_eq!(rows.len(), 1);
    assert!(guard.find_duplicates("0123456789abcdef0123456789abcdef").await.expect("scan").is_empty());
}

async fn futures_results(
    handles: impl Iterator<Item = tokio::task::JoinHandle<Result<(), ExamError>>>,
) -> Vec<Result<(), ExamError>> {
    let mut results = Vec::new();
    for handle in handles.collect::<Vec<_>>() {
        results.push(handle.await.expect("task"));
    }
    results
}
