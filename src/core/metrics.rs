use std::sync::OnceLock;

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    describe();
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

fn describe() {
    describe_counter!("http_requests_total", "HTTP requests by method, route and status");
    describe_histogram!("http_request_duration_seconds", "HTTP request latency");
    describe_counter!("submissions_total", "Submission attempts by outcome");
    describe_counter!(
        "check_answer_scalar_fallback_total",
        "Check answers received as a bare string instead of a list"
    );
    describe_counter!("row_store_retries_total", "Retried row store calls by operation");
    describe_counter!("support_files_uploaded_total", "Support files stored in the blob store");
}
