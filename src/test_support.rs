use std::sync::{Arc, OnceLock};

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request},
    Router,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::api;
use crate::core::{config::Settings, state::AppState};
use crate::services::exam_assembler::FixedQuestionSet;
use crate::store::memory::{MemoryBlobStore, MemoryRowStore};

const TEST_PUBLIC_URL: &str = "http://exams.test";

pub(crate) struct TestContext {
    pub(crate) state: AppState,
    pub(crate) app: Router,
    pub(crate) blobs: Arc<MemoryBlobStore>,
    _guard: OwnedMutexGuard<()>,
}

pub(crate) async fn env_lock() -> OwnedMutexGuard<()> {
    static LOCK: OnceLock<Arc<Mutex<()>>> = OnceLock::new();
    let lock = LOCK.get_or_init(|| Arc::new(Mutex::new(()))).clone();
    lock.lock_owned().await
}

pub(crate) fn set_test_env() {
    std::env::set_var("EXAMDESK_ENV", "test");
    std::env::set_var("EXAMDESK_STRICT_CONFIG", "0");
    std::env::set_var("EXAMDESK_PUBLIC_URL", TEST_PUBLIC_URL);
    std::env::set_var("PROMETHEUS_ENABLED", "0");
    for key in [
        "PROJECT_NAME",
        "VERSION",
        "API_V1_STR",
        "ROW_STORE_BACKEND",
        "ROW_STORE_KEY_PREFIX",
        "STORE_RETRY_ATTEMPTS",
        "STORE_RETRY_BASE_MS",
        "STORE_RETRY_MAX_MS",
        "POINTS_PER_QUESTION",
        "STRICT_CHECK_ANSWERS",
        "DISCLOSE_CORRECT_ANSWERS",
        "FIXED_QUESTIONS_PATH",
        "MAX_CUSTOM_QUESTIONS",
        "MAX_UPLOAD_SIZE_MB",
        "MAX_FILES_PER_UPLOAD",
        "S3_ENDPOINT",
        "S3_ACCESS_KEY",
        "S3_SECRET_KEY",
        "S3_BUCKET",
        "S3_REGION",
    ] {
        std::env::remove_var(key);
    }
    std::env::set_var("AWS_EC2_METADATA_DISABLED", "true");
}

pub(crate) fn set_test_storage_env() {
    std::env::set_var("S3_ENDPOINT", "http://localhost:9000");
    std::env::set_var("S3_ACCESS_KEY", "test-access-key");
    std::env::set_var("S3_SECRET_KEY", "test-secret-key");
    std::env::set_var("S3_BUCKET", "examdesk-test");
    std::env::set_var("S3_REGION", "us-east-1");
}

/// App state over the in-memory row and blob stores with the built-in fixed
/// question set. Holds the env lock for the lifetime of the context.
pub(crate) async fn setup_test_context() -> TestContext {
    let guard = env_lock().await;
    set_test_env();

    let settings = Settings::load().expect("settings");
    let blobs = Arc::new(MemoryBlobStore::new());
    let state = AppState::new(
        settings,
        Arc::new(MemoryRowStore::new()),
        Some(blobs.clone()),
        None,
        FixedQuestionSet::builtin(),
    );
    let app = api::router::router(state.clone());

    TestContext { state, app, blobs, _guard: guard }
}

pub(crate) fn json_request(
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);

    if let Some(body) = body {
        let bytes = serde_json::to_vec(&body).expect("serialize body");
        builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(bytes))
            .expect("request body")
    } else {
        builder.body(Body::empty()).expect("request body")
    }
}

pub(crate) async fn read_json(response: axum::response::Response<Body>) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("response body");
    serde_json::from_slice(&body).unwrap_or_else(|err| {
        let body_text = String::from_utf8_lossy(&body);
        panic!("json parse: {err}; body: {body_text}");
    })
}
