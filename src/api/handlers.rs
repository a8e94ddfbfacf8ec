use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::collections::HashMap;

use crate::core::metrics;
use crate::core::redis::RedisHealth;
use crate::core::state::AppState;
use crate::schemas::{HealthResponse, RootResponse};

pub(crate) async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    let response = RootResponse {
        message: state.settings().api().project_name.clone(),
        version: state.settings().api().version.clone(),
        fixed_questions_version: state.assembler().fixed().version().to_string(),
    };

    Json(response)
}

pub(crate) async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    let mut status = "healthy".to_string();
    let mut components = HashMap::new();

    components.insert("row_store".to_string(), state.rows().backend().to_string());

    match state.redis() {
        None => {
            components.insert("redis".to_string(), "not configured".to_string());
        }
        Some(redis) => match redis.health().await {
            RedisHealth::Healthy => {
                components.insert("redis".to_string(), "healthy".to_string());
            }
            RedisHealth::Disconnected => {
                components.insert("redis".to_string(), "disconnected".to_string());
                status = "unhealthy".to_string();
            }
            RedisHealth::Unhealthy(error) => {
                components.insert("redis".to_string(), format!("unhealthy: {error}"));
                status = "unhealthy".to_string();
            }
        },
    }

    let blob_store = if state.blobs().is_some() { "configured" } else { "disabled" };
    components.insert("blob_store".to_string(), blob_store.to_string());

    Json(HealthResponse { service: "examdesk-api".to_string(), status, components })
}

pub(crate) async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    if !state.settings().telemetry().prometheus_enabled {
        return StatusCode::NOT_FOUND.into_response();
    }

    match metrics::render() {
        Some(body) => ([(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")], body)
            .into_response(),
        None => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}
