use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::core::time::{format_offset, parse_rfc3339};
use crate::models::{Respondent, Submission};
use crate::store::retry::RetryPolicy;
use crate::store::{Row, RowStore, StoreError, Table};

const EXAM_ID: usize = 0;
const RESPONDENT_NAME: usize = 1;
const REGISTRO: usize = 2;
const RESPONDENT_ID: usize = 3;
const ANSWERS: usize = 4;
const DETAILS: usize = 5;
const SUBMITTED_AT: usize = 6;
const SCORE: usize = 7;
const TOTAL: usize = 8;
const PERCENT: usize = 9;
const SUBMISSION_ID: usize = 10;

pub(crate) const COLUMNS: usize = 11;

pub(crate) fn encode(submission: &Submission) -> Result<Row, StoreError> {
    Ok(vec![
        submission.exam_id.clone(),
        submission.respondent.name.clone(),
        submission.respondent.registro.clone(),
        submission.respondent.national_id.clone(),
        to_json(&submission.answers)?,
        to_json(&submission.details)?,
        format_offset(submission.submitted_at),
        submission.score.to_string(),
        submission.total.to_string(),
        submission.percent.map(|value| format!("{value:.2}")).unwrap_or_default(),
        submission.id.clone(),
    ])
}

pub(crate) fn decode(row: &Row) -> Result<Submission, StoreError> {
    if row.len() < COLUMNS {
        return Err(StoreError::Corrupt(format!(
            "submission row has {} columns, expected {COLUMNS}",
            row.len()
        )));
    }

    let submitted_at = parse_rfc3339(&row[SUBMITTED_AT])
        .ok_or_else(|| StoreError::Corrupt(format!("bad submitted_at '{}'", row[SUBMITTED_AT])))?;
    let percent = match row[PERCENT].trim() {
        "" => None,
        raw => Some(parse_number::<f64>("percent", raw)?),
    };

    Ok(Submission {
        id: row[SUBMISSION_ID].clone(),
        exam_id: row[EXAM_ID].clone(),
        respondent: Respondent {
            name: row[RESPONDENT_NAME].clone(),
            registro: row[REGISTRO].clone(),
            national_id: row[RESPONDENT_ID].clone(),
        },
        answers: from_json("answers", &row[ANSWERS])?,
        details: from_json("details", &row[DETAILS])?,
        score: parse_number("score", &row[SCORE])?,
        total: parse_number("total", &row[TOTAL])?,
        percent,
        submitted_at,
    })
}

/// Whether `row` records a submission by `respondent_id` for `exam_id`.
/// Only the key columns are inspected so older rows still count.
pub(crate) fn is_respondent(row: &Row, exam_id: &str, respondent_id: &str) -> bool {
    column(row, EXAM_ID) == Some(exam_id) && column(row, RESPONDENT_ID) == Some(respondent_id)
}

pub(crate) fn belongs_to(row: &Row, exam_id: &str) -> bool {
    column(row, EXAM_ID) == Some(exam_id)
}

pub(crate) fn respondent_id(row: &Row) -> Option<&str> {
    column(row, RESPONDENT_ID)
}

pub(crate) fn submission_id(row: &Row) -> Option<&str> {
    column(row, SUBMISSION_ID).filter(|id| !id.is_empty())
}

pub(crate) async fn read_rows(
    store: &dyn RowStore,
    retry: &RetryPolicy,
) -> Result<Vec<Row>, StoreError> {
    retry.run("read_submissions", move || store.read_all(Table::Submissions)).await
}

/// Every decodable submission for `exam_id`, in submission order.
pub(crate) async fn list_for_exam(
    store: &dyn RowStore,
    retry: &RetryPolicy,
    exam_id: &str,
) -> Result<Vec<Submission>, StoreError> {
    let rows = read_rows(store, retry).await?;
    Ok(rows
        .iter()
        .enumerate()
        .filter(|(_, row)| belongs_to(row, exam_id))
        .filter_map(|(index, row)| match decode(row) {
            Ok(submission) => Some(submission),
            Err(err) => {
                tracing::warn!(index, exam_id, error = %err, "Skipping undecodable submission row");
                None
            }
        })
        .collect())
}

fn column(row: &Row, index: usize) -> Option<&str> {
    row.get(index).map(|value| value.trim())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|err| StoreError::Corrupt(err.to_string()))
}

fn from_json<T: DeserializeOwned>(field: &str, raw: &str) -> Result<T, StoreError> {
    serde_json::from_str(raw).map_err(|err| StoreError::Corrupt(format!("bad {field}: {err}")))
}

fn parse_number<T: std::str::FromStr>(field: &str, raw: &str) -> Result<T, StoreError> {
    raw.trim().parse().map_err(|_| StoreError::Corrupt(format!("bad {field} '{raw}'")))
}
