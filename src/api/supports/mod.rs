mod handlers;

use axum::{extract::DefaultBodyLimit, routing::get, Router};

use crate::core::state::AppState;

/// Routes under `/exams/:exam_id/supports`. `body_limit` caps the whole
/// multipart request; per-file limits are checked while streaming.
pub(crate) fn router(body_limit: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/:exam_id/supports",
            get(handlers::list_supports).post(handlers::upload_supports),
        )
        .layer(DefaultBodyLimit::max(body_limit))
}
