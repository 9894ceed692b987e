use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics exporter
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    init_metric_descriptions();

    Ok(handle)
}

/// Initialize metric descriptions (can be called multiple times safely)
fn init_metric_descriptions() {
    describe_counter!(
        "studio_engine_requests_total",
        "Total number of engine requests sent to the AI provider"
    );
    describe_histogram!(
        "studio_engine_duration_seconds",
        "Engine request duration in seconds, including time queued for admission"
    );
    describe_counter!(
        "studio_engine_errors_total",
        "Total number of failed engine requests"
    );
    describe_gauge!(
        "studio_throttle_active",
        "Operations currently holding an admission slot"
    );
    describe_gauge!(
        "studio_throttle_queued",
        "Operations waiting for an admission slot"
    );
    describe_gauge!("studio_throttle_limit", "Configured admission capacity");
    describe_gauge!(
        "studio_gateway_info",
        "Gateway version and build information"
    );

    gauge!("studio_gateway_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
}

/// Record an engine request
pub fn record_request(engine: &str) {
    counter!("studio_engine_requests_total", "engine" => engine.to_string()).increment(1);
}

/// Record engine duration, labelled by final status
pub fn record_duration(engine: &str, status: &str, duration: Duration) {
    histogram!(
        "studio_engine_duration_seconds",
        "engine" => engine.to_string(),
        "status" => status.to_string(),
    )
    .record(duration.as_secs_f64());
}

/// Record an engine error
pub fn record_error(engine: &str, error_type: &str) {
    counter!(
        "studio_engine_errors_total",
        "engine" => engine.to_string(),
        "error_type" => error_type.to_string(),
    )
    .increment(1);
}

/// Publish admission gate occupancy
pub fn update_throttle(limit: usize, active: usize, queued: usize) {
    gauge!("studio_throttle_limit").set(limit as f64);
    gauge!("studio_throttle_active").set(active as f64);
    gauge!("studio_throttle_queued").set(queued as f64);
}
