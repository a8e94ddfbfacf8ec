use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};

use crate::api::errors::ApiError;
use crate::api::validation::{sanitized_filename, validate_exam_id};
use crate::core::state::AppState;
use crate::schemas::support::{SupportFileResponse, SupportListResponse};
use crate::services::supports::{self, UploadedFile};

const FILES_FIELD: &str = "files";

pub(super) async fn upload_supports(
    Path(exam_id): Path<String>,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SupportListResponse>), ApiError> {
    validate_exam_id(&exam_id)?;

    let limits = state.settings().storage();
    let max_bytes = limits.max_upload_size_mb * 1024 * 1024;
    let mut files = Vec::new();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::bad_request("Invalid multipart data"))?
    {
        if field.name() != Some(FILES_FIELD) {
            continue;
        }
        if files.len() as u64 >= limits.max_files_per_upload {
            return Err(ApiError::PayloadTooLarge(format!(
                "At most {} files per upload",
                limits.max_files_per_upload
            )));
        }

        let file_name = sanitized_filename(field.file_name().unwrap_or(""));
        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|_| ApiError::bad_request("Failed to read file"))?
        {
            let next_size = bytes.len() as u64 + chunk.len() as u64;
            if next_size > max_bytes {
                return Err(ApiError::PayloadTooLarge(format!(
                    "{file_name} exceeds {}MB limit",
                    limits.max_upload_size_mb
                )));
            }
            bytes.extend_from_slice(&chunk);
        }
        files.push(UploadedFile { file_name, bytes });
    }

    let stored = supports::upload_supports(&state, &exam_id, files).await?;
    let response = SupportListResponse {
        exam_id,
        files: stored.into_iter().map(SupportFileResponse::from).collect(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

pub(super) async fn list_supports(
    Path(exam_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<SupportListResponse>, ApiError> {
    validate_exam_id(&exam_id)?;
    let files = supports::list_supports(&state, &exam_id).await?;
    Ok(Json(SupportListResponse {
        exam_id,
        files: files.into_iter().map(SupportFileResponse::from).collect(),
    }))
}
