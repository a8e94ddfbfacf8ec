mod handlers;

use axum::{routing::get, routing::post, Router};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_exam).get(handlers::list_exams))
        .route("/:exam_id", get(handlers::get_exam).put(handlers::update_exam))
        .route("/:exam_id/duplicate", post(handlers::duplicate_exam))
}

#[cfg(test)]
mod tests;
