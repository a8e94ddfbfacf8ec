use sha2::{Digest, Sha256};

use crate::core::state::AppState;
use crate::core::time::now_utc;
use crate::error::ExamError;
use crate::models::SupportFile;
use crate::repositories;
use crate::services::exams::load_record;

/// Hex digits of the content hash that prefix each stored blob name.
const BLOB_HASH_PREFIX: usize = 16;

/// One file taken from a multipart upload.
#[derive(Debug)]
pub(crate) struct UploadedFile {
    pub(crate) file_name: String,
    pub(crate) bytes: Vec<u8>,
}

/// Blob names carry a content hash prefix so two uploads sharing a file name
/// never land on the same object.
pub(crate) fn blob_name(sha256: &str, file_name: &str) -> String {
    let prefix = sha256.get(..BLOB_HASH_PREFIX).unwrap_or(sha256);
    format!("{prefix}-{file_name}")
}

pub(crate) async fn upload_supports(
    state: &AppState,
    exam_id: &str,
    files: Vec<UploadedFile>,
) -> Result<Vec<SupportFile>, ExamError> {
    let limits = state.settings().storage();
    if files.is_empty() {
        return Err(ExamError::validation("files", "at least one file is required"));
    }
    if files.len() as u64 > limits.max_files_per_upload {
        return Err(ExamError::validation(
            "files",
            format!("at most {} files per upload", limits.max_files_per_upload),
        ));
    }
    let max_bytes = limits.max_upload_size_mb * 1024 * 1024;
    if let Some(file) = files.iter().find(|file| file.bytes.len() as u64 > max_bytes) {
        return Err(ExamError::validation(
            "files",
            format!("{} exceeds {}MB", file.file_name, limits.max_upload_size_mb),
        ));
    }

    let record = load_record(state, exam_id).await?;
    let blobs = state
        .blobs()
        .ok_or_else(|| ExamError::StoreUnavailable("blob storage is not configured".to_string()))?;

    let mut stored = Vec::with_capacity(files.len());
    for file in files {
        let size_bytes = file.bytes.len() as u64;
        let sha256 = hex::encode(Sha256::digest(&file.bytes));
        let name = blob_name(&sha256, &file.file_name);
        let link = blobs.put_file(&record.id, &name, file.bytes).await?;

        let support = SupportFile {
            exam_id: record.id.clone(),
            file_name: file.file_name,
            link,
            uploaded_at: now_utc(),
            sha256,
            size_bytes,
        };
        repositories::supports::insert(state.rows(), state.retry(), &support).await?;
        metrics::counter!("support_files_uploaded_total").increment(1);
        tracing::info!(
            exam_id = %record.id,
            file_name = %support.file_name,
            size_bytes,
            "Support file stored"
        );
        stored.push(support);
    }

    Ok(stored)
}

pub(crate) async fn list_supports(
    state: &AppState,
    exam_id: &str,
) -> Result<Vec<SupportFile>, ExamError> {
    let record = load_record(state, exam_id).await?;
    Ok(repositories::supports::list_for_exam(state.rows(), state.retry(), &record.id).await?)
}
