use uuid::Uuid;
use validator::Validate;

use crate::core::state::AppState;
use crate::core::time::now_utc;
use crate::error::ExamError;
use crate::models::{Respondent, Submission};
use crate::repositories;
use crate::schemas::submission::SubmissionCreate;
use crate::services::exams::{assemble, ensure_current_fixed_set, load_record};
use crate::services::submission_guard::DuplicateGroup;

/// Validates, grades and stores one submission. Nothing is written unless
/// every check passes and the respondent has no earlier row for the exam.
pub(crate) async fn submit(
    state: &AppState,
    exam_id: &str,
    mut payload: SubmissionCreate,
) -> Result<Submission, ExamError> {
    let result = submit_inner(state, exam_id, &mut payload).await;
    let outcome = match &result {
        Ok(_) => "accepted",
        Err(ExamError::DuplicateSubmission { .. }) => "duplicate",
        Err(ExamError::StoreUnavailable(_)) => "store_unavailable",
        Err(_) => "rejected",
    };
    metrics::counter!("submissions_total", "outcome" => outcome).increment(1);
    result
}

async fn submit_inner(
    state: &AppState,
    exam_id: &str,
    payload: &mut SubmissionCreate,
) -> Result<Submission, ExamError> {
    payload.respondent_name = payload.respondent_name.trim().to_string();
    payload.registro = payload.registro.trim().to_string();
    payload.respondent_id = payload.respondent_id.trim().to_string();
    payload.validate()?;

    let record = load_record(state, exam_id).await?;
    ensure_current_fixed_set(state, &record)?;
    let exam = assemble(state, record);

    if payload.answers.len() != exam.questions.len() {
        return Err(ExamError::SchemaMismatch(format!(
            "expected {} answers, got {}",
            exam.questions.len(),
            payload.answers.len()
        )));
    }

    let normalized = state.normalizer().normalize_all(&payload.answers, &exam.questions);
    let fallbacks: Vec<usize> = normalized
        .iter()
        .enumerate()
        .filter(|(_, answer)| answer.scalar_fallback)
        .map(|(index, _)| index)
        .collect();
    if !fallbacks.is_empty() {
        tracing::warn!(
            exam_id = %exam.id,
            indices = ?fallbacks,
            "Check answers sent as a bare string"
        );
        metrics::counter!("check_answer_scalar_fallback_total").increment(fallbacks.len() as u64);
    }

    let answers: Vec<_> = normalized.into_iter().map(|answer| answer.value).collect();
    let report = state.grading().grade(&exam.questions, &answers);

    let submission = Submission {
        id: Uuid::new_v4().simple().to_string(),
        exam_id: exam.id.clone(),
        respondent: Respondent {
            name: std::mem::take(&mut payload.respondent_name),
            registro: std::mem::take(&mut payload.registro),
            national_id: std::mem::take(&mut payload.respondent_id),
        },
        answers,
        details: report.details,
        score: report.score,
        total: report.total,
        percent: report.percent,
        submitted_at: now_utc(),
    };

    state.guard().admit(submission.clone()).await?;
    tracing::info!(
        exam_id = %submission.exam_id,
        submission_id = %submission.id,
        score = submission.score,
        total = submission.total,
        "Submission accepted"
    );

    Ok(submission)
}

pub(crate) async fn list_submissions(
    state: &AppState,
    exam_id: &str,
) -> Result<Vec<Submission>, ExamError> {
    let record = load_record(state, exam_id).await?;
    Ok(repositories::submissions::list_for_exam(state.rows(), state.retry(), &record.id).await?)
}

pub(crate) async fn find_duplicates(
    state: &AppState,
    exam_id: &str,
) -> Result<Vec<DuplicateGroup>, ExamError> {
    let record = load_record(state, exam_id).await?;
    state.guard().find_duplicates(&record.id).await
}
