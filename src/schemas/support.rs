use serde::Serialize;

use crate::core::time::format_offset;
use crate::models::SupportFile;

#[derive(Debug, Serialize)]
pub(crate) struct SupportFileResponse {
    pub(crate) file_name: String,
    pub(crate) link: String,
    pub(crate) uploaded_at: String,
    pub(crate) sha256: String,
    pub(crate) size_bytes: u64,
}

#[derive(Debug, Serialize)]
pub(crate) struct SupportListResponse {
    pub(crate) exam_id: String,
    pub(crate) files: Vec<SupportFileResponse>,
}

impl From<SupportFile> for SupportFileResponse {
    fn from(file: SupportFile) -> Self {
        Self {
            file_name: file.file_name,
            link: file.link,
            uploaded_at: format_offset(file.uploaded_at),
            sha256: file.sha256,
            size_bytes: file.size_bytes,
        }
    }
}
