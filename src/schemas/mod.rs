use std::collections::HashMap;

use serde::Serialize;
use validator::ValidationError;

pub(crate) mod exam;
pub(crate) mod submission;
pub(crate) mod support;

pub(crate) const NATIONAL_ID_DIGITS: std::ops::RangeInclusive<usize> = 5..=15;
pub(crate) const REGISTRO_DIGITS: std::ops::RangeInclusive<usize> = 1..=20;

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) service: String,
    pub(crate) status: String,
    pub(crate) components: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RootResponse {
    pub(crate) message: String,
    pub(crate) version: String,
    pub(crate) fixed_questions_version: String,
}

fn digits_in(value: &str, range: std::ops::RangeInclusive<usize>) -> bool {
    range.contains(&value.len()) && value.chars().all(|c| c.is_ascii_digit())
}

pub(crate) fn validate_national_id(value: &str) -> Result<(), ValidationError> {
    if digits_in(value, NATIONAL_ID_DIGITS) {
        Ok(())
    } else {
        Err(ValidationError::new("national_id").with_message("must be 5 to 15 digits".into()))
    }
}

pub(crate) fn validate_registro(value: &str) -> Result<(), ValidationError> {
    if digits_in(value, REGISTRO_DIGITS) {
        Ok(())
    } else {
        Err(ValidationError::new("registro").with_message("must be 1 to 20 digits".into()))
    }
}
