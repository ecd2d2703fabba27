//! Prometheus metrics

use axum::http::StatusCode;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the global Prometheus recorder. Safe to call more than once.
pub fn init_metrics() -> Option<PrometheusHandle> {
    HANDLE
        .get_or_try_init(|| PrometheusBuilder::new().install_recorder())
        .map_err(|e| tracing::warn!(error = %e, "Failed to install Prometheus recorder"))
        .ok()
        .cloned()
}

/// GET /metrics
pub async fn metrics_handler() -> impl IntoResponse {
    match HANDLE.get() {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics recorder not installed".to_string(),
        ),
    }
}

/// Per-lead recompute and qualification counters are recorded by the scoring service
pub fn record_batch(processed: usize, errors: usize) {
    metrics::counter!("lead_scoring_batch_processed_total").increment(processed as u64);
    metrics::counter!("lead_scoring_batch_errors_total").increment(errors as u64);
}
