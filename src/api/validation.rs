use crate::api::errors::ApiError;

/// Exam ids are the 32-char lowercase hex form of a UUID v4.
pub(crate) const EXAM_ID_LEN: usize = 32;

pub(crate) fn validate_exam_id(exam_id: &str) -> Result<(), ApiError> {
    let valid = exam_id.len() == EXAM_ID_LEN
        && exam_id.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
    if valid {
        Ok(())
    } else {
        Err(ApiError::NotFound(format!("exam {exam_id} not found")))
    }
}

pub(crate) fn sanitized_filename(name: &str) -> String {
    let base = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(name);
    let sanitized: String = base
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '_' || *c == '-')
        .collect();
    let sanitized = sanitized.trim_start_matches('.');

    if sanitized.is_empty() {
        "upload".to_string()
    } else {
        sanitized.to_string()
    }
}
