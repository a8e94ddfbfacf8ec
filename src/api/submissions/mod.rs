mod handlers;

use axum::{routing::get, Router};

use crate::core::state::AppState;

/// Routes under `/exams/:exam_id/submissions`.
pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/:exam_id/submissions",
            get(handlers::list_submissions).post(handlers::submit),
        )
        .route("/:exam_id/submissions/duplicates", get(handlers::find_duplicates))
}
