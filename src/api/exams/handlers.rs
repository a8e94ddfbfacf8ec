use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::api::errors::ApiError;
use crate::api::validation::validate_exam_id;
use crate::core::state::AppState;
use crate::models::Exam;
use crate::schemas::exam::{
    ExamCreate, ExamPublishedResponse, ExamSummary, ExamUpdate, PublicExamResponse,
};
use crate::services::exams;

fn published(state: &AppState, exam: Exam) -> ExamPublishedResponse {
    ExamPublishedResponse {
        exam_url: exams::exam_url(state.settings(), &exam.id),
        exam: exam.into(),
    }
}

pub(super) async fn create_exam(
    State(state): State<AppState>,
    Json(payload): Json<ExamCreate>,
) -> Result<(StatusCode, Json<ExamPublishedResponse>), ApiError> {
    let exam = exams::create_exam(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(published(&state, exam))))
}

pub(super) async fn list_exams(
    State(state): State<AppState>,
) -> Result<Json<Vec<ExamSummary>>, ApiError> {
    let exams = exams::list_exams(&state).await?;
    Ok(Json(exams.iter().map(ExamSummary::from).collect()))
}

pub(super) async fn get_exam(
    Path(exam_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<PublicExamResponse>, ApiError> {
    validate_exam_id(&exam_id)?;
    let exam = exams::get_exam(&state, &exam_id).await?;
    Ok(Json(exam.into()))
}

pub(super) async fn update_exam(
    Path(exam_id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<ExamUpdate>,
) -> Result<Json<ExamPublishedResponse>, ApiError> {
    validate_exam_id(&exam_id)?;
    let exam = exams::update_exam(&state, &exam_id, payload).await?;
    Ok(Json(published(&state, exam)))
}

pub(super) async fn duplicate_exam(
    Path(exam_id): Path<String>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ExamPublishedResponse>), ApiError> {
    validate_exam_id(&exam_id)?;
    let exam = exams::duplicate_exam(&state, &exam_id).await?;
    Ok((StatusCode::CREATED, Json(published(&state, exam))))
}
