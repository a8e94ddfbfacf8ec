use std::sync::Arc;

use crate::core::{config::Settings, redis::RedisHandle};
use crate::services::answer_normalizer::AnswerNormalizer;
use crate::services::exam_assembler::{ExamAssembler, FixedQuestionSet};
use crate::services::grading::GradingEngine;
use crate::services::submission_guard::SubmissionGuard;
use crate::store::retry::RetryPolicy;
use crate::store::{BlobStore, RowStore};

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    rows: Arc<dyn RowStore>,
    blobs: Option<Arc<dyn BlobStore>>,
    redis: Option<RedisHandle>,
    assembler: ExamAssembler,
    grading: GradingEngine,
    normalizer: AnswerNormalizer,
    guard: SubmissionGuard,
    retry: RetryPolicy,
}

impl AppState {
    pub(crate) fn new(
        settings: Settings,
        rows: Arc<dyn RowStore>,
        blobs: Option<Arc<dyn BlobStore>>,
        redis: Option<RedisHandle>,
        fixed: FixedQuestionSet,
    ) -> Self {
        let retry = settings.retry_policy();
        let grading = GradingEngine::new(
            settings.grading().points_per_question,
            settings.grading().disclose_correct_answers,
        );
        let normalizer = AnswerNormalizer::new(settings.check_scalar_policy());
        let guard = SubmissionGuard::new(rows.clone(), retry);
        let assembler = ExamAssembler::new(Arc::new(fixed));

        Self {
            inner: Arc::new(InnerState {
                settings,
                rows,
                blobs,
                redis,
                assembler,
                grading,
                normalizer,
                guard,
                retry,
            }),
        }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn rows(&self) -> &dyn RowStore {
        self.inner.rows.as_ref()
    }

    pub(crate) fn blobs(&self) -> Option<&dyn BlobStore> {
        self.inner.blobs.as_deref()
    }

    pub(crate) fn redis(&self) -> Option<&RedisHandle> {
        self.inner.redis.as_ref()
    }

    pub(crate) fn assembler(&self) -> &ExamAssembler {
        &self.inner.assembler
    }

    pub(crate) fn grading(&self) -> &GradingEngine {
        &self.inner.grading
    }

    pub(crate) fn normalizer(&self) -> &AnswerNormalizer {
        &self.inner.normalizer
    }

    pub(crate) fn guard(&self) -> &SubmissionGuard {
        &self.inner.guard
    }

    pub(crate) fn retry(&self) -> &RetryPolicy {
        &self.inner.retry
    }
}
