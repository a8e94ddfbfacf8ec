pub(crate) mod api;
pub(crate) mod core;
pub mod error;
pub mod models;
pub(crate) mod repositories;
pub(crate) mod schemas;
pub mod services;
pub mod store;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use anyhow::Context;

use crate::core::config::{RowStoreBackend, Settings};
use crate::core::{redis::RedisHandle, state::AppState, telemetry};
use crate::services::exam_assembler::FixedQuestionSet;
use crate::services::storage::S3BlobStore;
use crate::store::memory::MemoryRowStore;
use crate::store::redis::RedisRowStore;
use crate::store::{BlobStore, RowStore};

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;

    let fixed = match &settings.exam().fixed_questions_path {
        Some(path) => FixedQuestionSet::from_file(path)?,
        None => FixedQuestionSet::builtin(),
    };
    tracing::info!(
        version = fixed.version(),
        questions = fixed.len(),
        "Fixed question set loaded"
    );

    let (rows, redis): (Arc<dyn RowStore>, Option<RedisHandle>) =
        match settings.row_store().backend {
            RowStoreBackend::Memory => {
                tracing::warn!("Using the in-memory row store; data is lost on restart");
                (Arc::new(MemoryRowStore::new()), None)
            }
            RowStoreBackend::Redis => {
                let redis = RedisHandle::new(settings.redis().redis_url());
                redis.connect().await.context("failed to connect to Redis row store")?;
                tracing::info!("Redis connected successfully");
                let store = RedisRowStore::new(redis.clone(), settings.row_store().key_prefix.clone());
                (Arc::new(store), Some(redis))
            }
        };

    let blobs = S3BlobStore::from_settings(&settings)
        .await?
        .map(|store| Arc::new(store) as Arc<dyn BlobStore>);
    if blobs.is_none() {
        tracing::warn!("S3 credentials not set; support uploads are disabled");
    }

    let state = AppState::new(settings, rows, blobs, redis.clone(), fixed);
    let app = api::router::router(state.clone());
    let listener = tokio::net::TcpListener::bind(state.settings().server_addr()).await?;

    tracing::info!(
        host = %state.settings().server_host(),
        port = state.settings().server_port(),
        environment = %state.settings().runtime().environment.as_str(),
        row_store = state.rows().backend(),
        "ExamDesk API listening"
    );

    let result =
        axum::serve(listener, app).with_graceful_shutdown(core::shutdown::shutdown_signal()).await;

    if let Some(redis) = redis {
        redis.disconnect().await;
        tracing::info!("Redis disconnected");
    }

    result?;

    Ok(())
}
