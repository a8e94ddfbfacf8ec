use time::OffsetDateTime;

/// A supporting document attached to an exam. Only the link is kept; the
/// bytes live in the blob store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportFile {
    pub exam_id: String,
    pub file_name: String,
    pub link: String,
    pub uploaded_at: OffsetDateTime,
    pub sha256: String,
    pub size_bytes: u64,
}
