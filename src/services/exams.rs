use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use crate::core::config::Settings;
use crate::core::state::AppState;
use crate::core::time::now_utc;
use crate::error::ExamError;
use crate::models::{Exam, Facilitator, Question};
use crate::repositories::exams::{self, ExamRecord};
use crate::schemas::exam::{ExamCreate, ExamUpdate};
use crate::services::question_schema::validate_question;

/// Public view of the exam as served by this API.
pub(crate) fn exam_url(settings: &Settings, exam_id: &str) -> String {
    let api = settings.api();
    format!("{}{}/exams/{exam_id}", api.public_url, api.api_v1_str)
}

pub(crate) async fn create_exam(state: &AppState, mut payload: ExamCreate) -> Result<Exam, ExamError> {
    payload.facilitator = payload.facilitator.trim().to_string();
    payload.facilitator_id = payload.facilitator_id.trim().to_string();
    payload.course = payload.course.trim().to_string();
    payload.validate()?;

    let custom = validate_custom_questions(state, &payload.questions)?;
    let record = ExamRecord {
        row_index: 0,
        id: Uuid::new_v4().simple().to_string(),
        facilitator: Facilitator { name: payload.facilitator, national_id: payload.facilitator_id },
        course: payload.course,
        created_at: now_utc(),
        updated_at: None,
        custom_questions: custom,
        fixed_version: state.assembler().fixed().version().to_string(),
        metadata: payload.metadata,
    };

    exams::insert(state.rows(), state.retry(), &record).await?;
    tracing::info!(
        exam_id = %record.id,
        custom_questions = record.custom_questions.len(),
        "Exam created"
    );

    Ok(assemble(state, record))
}

pub(crate) async fn get_exam(state: &AppState, exam_id: &str) -> Result<Exam, ExamError> {
    let record = load_record(state, exam_id).await?;
    Ok(assemble(state, record))
}

pub(crate) async fn list_exams(state: &AppState) -> Result<Vec<Exam>, ExamError> {
    let records = exams::list(state.rows(), state.retry()).await?;
    Ok(records.into_iter().map(|record| assemble(state, record)).collect())
}

/// Replaces the custom questions, and the metadata when given. Id, creation
/// time and the fixed prefix are left as stored.
pub(crate) async fn update_exam(
    state: &AppState,
    exam_id: &str,
    payload: ExamUpdate,
) -> Result<Exam, ExamError> {
    payload.validate()?;
    let custom = validate_custom_questions(state, &payload.questions)?;

    let mut record = load_record(state, exam_id).await?;
    ensure_current_fixed_set(state, &record)?;

    record.custom_questions = custom;
    if let Some(metadata) = payload.metadata {
        record.metadata = metadata;
    }
    record.updated_at = Some(now_utc());

    exams::update(state.rows(), state.retry(), &record).await?;
    tracing::info!(
        exam_id,
        custom_questions = record.custom_questions.len(),
        "Exam questions replaced"
    );

    Ok(assemble(state, record))
}

pub(crate) async fn duplicate_exam(state: &AppState, exam_id: &str) -> Result<Exam, ExamError> {
    let source = load_record(state, exam_id).await?;
    ensure_current_fixed_set(state, &source)?;

    let copy = ExamRecord {
        row_index: 0,
        id: Uuid::new_v4().simple().to_string(),
        created_at: now_utc(),
        updated_at: None,
        ..source
    };

    exams::insert(state.rows(), state.retry(), &copy).await?;
    tracing::info!(source_id = exam_id, exam_id = %copy.id, "Exam duplicated");

    Ok(assemble(state, copy))
}

pub(crate) async fn load_record(state: &AppState, exam_id: &str) -> Result<ExamRecord, ExamError> {
    exams::find_by_id(state.rows(), state.retry(), exam_id.trim())
        .await?
        .ok_or_else(|| ExamError::exam_not_found(exam_id))
}

/// Stored answers are aligned to the fixed prefix the exam was written with;
/// a different running set would shift every index.
pub(crate) fn ensure_current_fixed_set(
    state: &AppState,
    record: &ExamRecord,
) -> Result<(), ExamError> {
    let current = state.assembler().fixed().version();
    if record.fixed_version == current {
        return Ok(());
    }
    Err(ExamError::SchemaMismatch(format!(
        "exam {} uses fixed question set {}, this server runs {current}",
        record.id, record.fixed_version
    )))
}

pub(crate) fn assemble(state: &AppState, record: ExamRecord) -> Exam {
    let assembler = state.assembler();
    Exam {
        id: record.id,
        facilitator: record.facilitator,
        course: record.course,
        created_at: record.created_at,
        updated_at: record.updated_at,
        questions: assembler.assemble(record.custom_questions),
        fixed_count: assembler.fixed().len(),
        fixed_version: record.fixed_version,
        metadata: record.metadata,
    }
}

fn validate_custom_questions(state: &AppState, raw: &[Value]) -> Result<Vec<Question>, ExamError> {
    let max = state.settings().exam().max_custom_questions;
    if raw.len() > max {
        return Err(ExamError::validation(
            "questions",
            format!("at most {max} custom questions are allowed, got {}", raw.len()),
        ));
    }

    raw.iter()
        .enumerate()
        .map(|(index, value)| {
            validate_question(value).map_err(|source| ExamError::InvalidQuestion { index, source })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuestionBody;
    use crate::test_support;
    use serde_json::json;

    fn create_payload(questions: Value) -> ExamCreate {
        serde_json::from_value(json!({
            "facilitator": "  Laura Diaz ",
            "facilitator_id": "1234567",
            "course": "Algebra I",
            "questions": questions,
            "metadata": {"date": "2025-03-01", "inviteCount": 25}
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn create_prepends_fixed_questions_and_stores_custom_only() {
        let ctx = test_support::setup_test_context().await;
        let payload = create_payload(json!([
            {"title": "2 + 2", "variant": "multiple", "options": ["3", "4"], "correct": 1}
        ]));

        let exam = create_exam(&ctx.state, payload).await.unwrap();
        let fixed = ctx.state.assembler().fixed().len();

        assert_eq!(exam.id.len(), 32);
        assert_eq!(exam.facilitator.name, "Laura Diaz");
        assert_eq!(exam.fixed_count, fixed);
        assert_eq!(exam.questions.len(), fixed + 1);
        assert!(exam.questions[..fixed].iter().all(|q| !q.scored));
        assert_eq!(exam.metadata.invite_count, Some(25));

        let stored = load_record(&ctx.state, &exam.id).await.unwrap();
        assert_eq!(stored.custom_questions.len(), 1);
    }

    #[tokio::test]
    async fn create_reports_the_failing_question_index() {
        let ctx = test_support::setup_test_context().await;
        let payload = create_payload(json!([
            {"title": "ok", "variant": "text"},
            {"title": "bad", "variant": "multiple", "options": ["A", "B"], "correct": 5}
        ]));

        let err = create_exam(&ctx.state, payload).await.unwrap_err();
        assert!(matches!(err, ExamError::InvalidQuestion { index: 1, .. }));
        assert_eq!(err.field().as_deref(), Some("questions[1].correct"));
        assert!(list_exams(&ctx.state).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_replaces_custom_questions_only() {
        let ctx = test_support::setup_test_context().await;
        let exam = create_exam(
            &ctx.state,
            create_payload(json!([{"title": "Old", "variant": "text"}])),
        )
        .await
        .unwrap();

        let update: ExamUpdate = serde_json::from_value(json!({
            "questions": [
                {"title": "New", "variant": "true_false", "correct": 0},
                {"title": "Why", "variant": "text"}
            ]
        }))
        .unwrap();
        let updated = update_exam(&ctx.state, &exam.id, update).await.unwrap();

        assert_eq!(updated.id, exam.id);
        assert_eq!(updated.created_at, exam.created_at);
        assert!(updated.updated_at.is_some());
        assert_eq!(updated.custom_questions().len(), 2);
        assert_eq!(updated.custom_questions()[0].body, QuestionBody::TrueFalse { correct: Some(0) });
        assert_eq!(updated.metadata, exam.metadata);
        assert_eq!(list_exams(&ctx.state).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_gets_new_id_and_same_questions() {
        let ctx = test_support::setup_test_context().await;
        let exam = create_exam(
            &ctx.state,
            create_payload(json!([{"title": "Q", "variant": "check", "options": ["A", "B"], "correct": [0]}])),
        )
        .await
        .unwrap();

        let copy = duplicate_exam(&ctx.state, &exam.id).await.unwrap();
        assert_ne!(copy.id, exam.id);
        assert_eq!(copy.questions, exam.questions);
        assert_eq!(copy.course, exam.course);
        assert!(copy.updated_at.is_none());
        assert_eq!(list_exams(&ctx.state).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn missing_exam_is_not_found() {
        let ctx = test_support::setup_test_context().await;
        assert!(matches!(
            get_exam(&ctx.state, "0123456789abcdef0123456789abcdef").await,
            Err(ExamError::NotFound { entity: "exam", .. })
        ));
        let update: ExamUpdate = serde_json::from_value(json!({"questions": []})).unwrap();
        assert!(matches!(
            update_exam(&ctx.state, "nope", update).await,
            Err(ExamError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn custom_question_cap_is_enforced() {
        let ctx = test_support::setup_test_context().await;
        let max = ctx.state.settings().exam().max_custom_questions;
        let questions: Vec<Value> =
            (0..=max).map(|i| json!({"title": format!("Q{i}"), "variant": "text"})).collect();

        let err = create_exam(&ctx.state, create_payload(Value::Array(questions))).await.unwrap_err();
        assert_eq!(err.field().as_deref(), Some("questions"));
    }

    #[tokio::test]
    async fn exam_url_joins_public_base() {
        let ctx = test_support::setup_test_context().await;
        assert_eq!(exam_url(ctx.state.settings(), "abc"), "http://exams.test/api/v1/exams/abc");
    }
}
