use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;

/// Register descriptions with the installed recorder.
pub fn describe() {
    metrics::describe_counter!("intake_documents_total", "Documents accepted for processing");
    metrics::describe_counter!("intake_jobs_completed", "Jobs that ran to completion");
    metrics::describe_counter!("intake_jobs_failed", "Jobs that ended in an error");
    metrics::describe_gauge!("intake_queue_depth", "Jobs waiting in the queue");
    metrics::describe_histogram!(
        "intake_job_processing_seconds",
        metrics::Unit::Seconds,
        "Time from admission to terminal outcome"
    );
    metrics::describe_counter!(
        "intake_notifications_total",
        "Outbound notifications by endpoint and outcome"
    );
}

/// Prometheus metrics scrape endpoint.
/// Returns metrics in Prometheus text exposition format.
pub async fn prometheus_metrics(State(handle): State<Arc<PrometheusHandle>>) -> impl IntoResponse {
    handle.render()
}
