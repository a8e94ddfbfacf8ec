use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::api::errors::ApiError;
use crate::api::validation::validate_exam_id;
use crate::core::state::AppState;
use crate::schemas::submission::{DuplicatesResponse, SubmissionCreate, SubmissionResponse};
use crate::services::submissions;

pub(super) async fn submit(
    Path(exam_id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<SubmissionCreate>,
) -> Result<(StatusCode, Json<SubmissionResponse>), ApiError> {
    validate_exam_id(&exam_id)?;
    let submission = submissions::submit(&state, &exam_id, payload).await?;
    Ok((StatusCode::CREATED, Json(submission.into())))
}

pub(super) async fn list_submissions(
    Path(exam_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<SubmissionResponse>>, ApiError> {
    validate_exam_id(&exam_id)?;
    let rows = submissions::list_submissions(&state, &exam_id).await?;
    Ok(Json(rows.into_iter().map(SubmissionResponse::from).collect()))
}

pub(super) async fn find_duplicates(
    Path(exam_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<DuplicatesResponse>, ApiError> {
    validate_exam_id(&exam_id)?;
    let duplicates = submissions::find_duplicates(&state, &exam_id).await?;
    Ok(Json(DuplicatesResponse { exam_id, duplicates }))
}
