use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::core::time::{format_offset, parse_rfc3339};
use crate::models::{ExamMetadata, Facilitator, Question};
use crate::store::retry::RetryPolicy;
use crate::store::{Row, RowStore, StoreError, Table};

const EXAM_ID: usize = 0;
const FACILITATOR: usize = 1;
const FACILITATOR_ID: usize = 2;
const COURSE: usize = 3;
const CREATED_AT: usize = 4;
const QUESTIONS: usize = 5;
const EXAM_DATE: usize = 6;
const DURATION: usize = 7;
const INVITE_COUNT: usize = 8;
const CONTACT_EMAIL: usize = 9;
const DESCRIPTION: usize = 10;
const UPDATED_AT: usize = 11;

pub(crate) const COLUMNS: usize = 12;
pub(crate) const QUESTIONS_FORMAT_VERSION: u32 = 1;

/// An exam as stored: only the custom questions, plus the version of the
/// fixed set they were written against.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ExamRecord {
    pub(crate) row_index: usize,
    pub(crate) id: String,
    pub(crate) facilitator: Facilitator,
    pub(crate) course: String,
    pub(crate) created_at: OffsetDateTime,
    pub(crate) updated_at: Option<OffsetDateTime>,
    pub(crate) custom_questions: Vec<Question>,
    pub(crate) fixed_version: String,
    pub(crate) metadata: ExamMetadata,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredQuestions {
    version: u32,
    fixed_version: String,
    questions: Vec<Question>,
}

pub(crate) fn encode(record: &ExamRecord) -> Result<Row, StoreError> {
    let questions = serde_json::to_string(&StoredQuestions {
        version: QUESTIONS_FORMAT_VERSION,
        fixed_version: record.fixed_version.clone(),
        questions: record.custom_questions.clone(),
    })
    .map_err(|err| StoreError::Corrupt(err.to_string()))?;

    let metadata = &record.metadata;
    Ok(vec![
        record.id.clone(),
        record.facilitator.name.clone(),
        record.facilitator.national_id.clone(),
        record.course.clone(),
        format_offset(record.created_at),
        questions,
        metadata.date.clone().unwrap_or_default(),
        metadata.duration.clone().unwrap_or_default(),
        metadata.invite_count.map(|count| count.to_string()).unwrap_or_default(),
        metadata.contact_email.clone().unwrap_or_default(),
        metadata.description.clone().unwrap_or_default(),
        record.updated_at.map(format_offset).unwrap_or_default(),
    ])
}

pub(crate) fn decode(row_index: usize, row: &Row) -> Result<ExamRecord, StoreError> {
    // Rows written before `updated_at` existed have one column fewer.
    if row.len() < UPDATED_AT {
        return Err(StoreError::Corrupt(format!(
            "exam row has {} columns, expected {COLUMNS}",
            row.len()
        )));
    }

    let stored: StoredQuestions = serde_json::from_str(&row[QUESTIONS])
        .map_err(|err| StoreError::Corrupt(format!("bad questions: {err}")))?;
    if stored.version != QUESTIONS_FORMAT_VERSION {
        return Err(StoreError::Corrupt(format!(
            "unsupported questions format version {}",
            stored.version
        )));
    }

    let created_at = parse_rfc3339(&row[CREATED_AT])
        .ok_or_else(|| StoreError::Corrupt(format!("bad created_at '{}'", row[CREATED_AT])))?;
    let invite_count = match optional(row, INVITE_COUNT) {
        Some(raw) => Some(
            raw.parse::<u32>()
                .map_err(|_| StoreError::Corrupt(format!("bad invite_count '{raw}'")))?,
        ),
        None => None,
    };

    Ok(ExamRecord {
        row_index,
        id: row[EXAM_ID].trim().to_string(),
        facilitator: Facilitator {
            name: row[FACILITATOR].clone(),
            national_id: row[FACILITATOR_ID].clone(),
        },
        course: row[COURSE].clone(),
        created_at,
        updated_at: optional(row, UPDATED_AT).and_then(|raw| parse_rfc3339(&raw)),
        custom_questions: stored.questions,
        fixed_version: stored.fixed_version,
        metadata: ExamMetadata {
            date: optional(row, EXAM_DATE),
            duration: optional(row, DURATION),
            invite_count,
            contact_email: optional(row, CONTACT_EMAIL),
            description: optional(row, DESCRIPTION),
        },
    })
}

pub(crate) async fn list(
    store: &dyn RowStore,
    retry: &RetryPolicy,
) -> Result<Vec<ExamRecord>, StoreError> {
    let rows = retry.run("read_exams", move || store.read_all(Table::Exams)).await?;
    Ok(rows
        .iter()
        .enumerate()
        .filter_map(|(index, row)| match decode(index, row) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!(index, error = %err, "Skipping undecodable exam row");
                None
            }
        })
        .collect())
}

pub(crate) async fn find_by_id(
    store: &dyn RowStore,
    retry: &RetryPolicy,
    id: &str,
) -> Result<Option<ExamRecord>, StoreError> {
    let rows = retry.run("read_exams", move || store.read_all(Table::Exams)).await?;
    let Some((index, row)) =
        rows.iter().enumerate().find(|(_, row)| row.get(EXAM_ID).map(|v| v.trim()) == Some(id))
    else {
        return Ok(None);
    };
    decode(index, row).map(Some)
}

pub(crate) async fn insert(
    store: &dyn RowStore,
    retry: &RetryPolicy,
    record: &ExamRecord,
) -> Result<(), StoreError> {
    let row = encode(record)?;
    let id = record.id.as_str();
    retry
        .append_once(store, Table::Exams, row, |existing| {
            existing.get(EXAM_ID).map(|v| v.trim()) == Some(id)
        })
        .await
}

/// Overwrites the record's row in place. Rewriting the same row is
/// idempotent, so plain retries are safe here.
pub(crate) async fn update(
    store: &dyn RowStore,
    retry: &RetryPolicy,
    record: &ExamRecord,
) -> Result<(), StoreError> {
    let row = encode(record)?;
    let index = record.row_index;
    retry
        .run("update_exam", move || store.update_at(Table::Exams, index, row.clone()))
        .await
}

fn optional(row: &Row, index: usize) -> Option<String> {
    row.get(index).map(|value| value.trim()).filter(|value| !value.is_empty()).map(str::to_string)
}
