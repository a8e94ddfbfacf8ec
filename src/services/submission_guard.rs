//! At-most-one accepted submission per (exam, respondent).
//!
//! The row store has no uniqueness constraint, so the check-then-append is
//! serialized per exam inside this process. The lock is taken in the caller's
//! future; the critical section runs in a spawned task that owns the guard,
//! so a cancelled request cannot leave an append half done.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::ExamError;
use crate::models::Submission;
use crate::repositories::submissions;
use crate::store::retry::RetryPolicy;
use crate::store::{RowStore, Table};

/// Per-key async mutexes. Entries are dropped once nobody holds or waits on
/// them.
#[derive(Clone, Default)]
pub struct KeyedLocks {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

pub struct KeyGuard {
    guard: Option<OwnedMutexGuard<()>>,
    key: String,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, key: &str) -> KeyGuard {
        let mutex = self
            .locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = mutex.lock_owned().await;
        KeyGuard { guard: Some(guard), key: key.to_string(), locks: self.locks.clone() }
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        // Release first so the map entry is the last strong reference left
        // when nobody else is waiting.
        drop(self.guard.take());
        self.locks.remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

/// Respondent ids that appear more than once for one exam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub respondent_id: String,
    pub submission_ids: Vec<String>,
}

#[derive(Clone)]
pub struct SubmissionGuard {
    store: Arc<dyn RowStore>,
    locks: KeyedLocks,
    retry: RetryPolicy,
}

impl SubmissionGuard {
    pub fn new(store: Arc<dyn RowStore>, retry: RetryPolicy) -> Self {
        Self { store, locks: KeyedLocks::new(), retry }
    }

    pub fn locks(&self) -> &KeyedLocks {
        &self.locks
    }

    /// Stores `submission` unless the respondent already has a row for the
    /// exam, in which case nothing is written.
    pub async fn admit(&self, submission: Submission) -> Result<(), ExamError> {
        let row = submissions::encode(&submission)?;
        let guard = self.locks.lock(&submission.exam_id).await;

        let store = self.store.clone();
        let retry = self.retry;
        let task = tokio::spawn(async move {
            let _guard = guard;
            let store = store.as_ref();
            let exam_id = submission.exam_id.as_str();
            let respondent_id = submission.respondent.national_id.as_str();

            let rows = submissions::read_rows(store, &retry).await?;
            if rows.iter().any(|existing| submissions::is_respondent(existing, exam_id, respondent_id))
            {
                return Err(ExamError::DuplicateSubmission {
                    exam_id: exam_id.to_string(),
                    respondent_id: respondent_id.to_string(),
                });
            }

            let submission_id = submission.id.as_str();
            retry
                .append_once(store, Table::Submissions, row, |existing| {
                    submissions::submission_id(existing) == Some(submission_id)
                })
                .await?;
            Ok::<(), ExamError>(())
        });

        task.await.map_err(|err| {
            tracing::error!(error = %err, "Submission task did not complete");
            ExamError::StoreUnavailable(format!("submission task failed: {err}"))
        })?
    }

    /// Reconciliation pass over stored rows. The lock only covers this
    /// process, so another writer sharing the store can still produce
    /// duplicates; this reports them.
    pub async fn find_duplicates(&self, exam_id: &str) -> Result<Vec<DuplicateGroup>, ExamError> {
        let rows = submissions::read_rows(self.store.as_ref(), &self.retry).await?;

        let mut by_respondent: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for row in rows.iter().filter(|row| submissions::belongs_to(row, exam_id)) {
            let Some(respondent_id) = submissions::respondent_id(row) else {
                continue;
            };
            let submission_id = submissions::submission_id(row).unwrap_or_default().to_string();
            by_respondent.entry(respondent_id).or_default().push(submission_id);
        }

        let groups: Vec<DuplicateGroup> = by_respondent
            .into_iter()
            .filter(|(_, ids)| ids.len() > 1)
            .map(|(respondent_id, submission_ids)| DuplicateGroup {
                respondent_id: respondent_id.to_string(),
                submission_ids,
            })
            .collect();

        if !groups.is_empty() {
            tracing::warn!(exam_id, groups = groups.len(), "Duplicate submissions found");
        }
        Ok(groups)
    }
}
