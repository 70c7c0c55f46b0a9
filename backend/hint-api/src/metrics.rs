use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter_vec, Encoder, Histogram,
    HistogramVec, IntCounterVec, TextEncoder,
};

lazy_static! {
    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .unwrap();

    // Hint Metrics
    pub static ref HINTS_GENERATED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "hints_generated_total",
        "Total number of hint requests by type and outcome",
        &["hint_type", "outcome"]
    )
    .unwrap();

    // Upstream model provider
    pub static ref UPSTREAM_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "upstream_requests_total",
        "Total number of calls to the model provider (each attempt counted)",
        &["outcome"]
    )
    .unwrap();

    pub static ref UPSTREAM_REQUEST_DURATION_SECONDS: Histogram = register_histogram!(
        "upstream_request_duration_seconds",
        "Model provider call duration in seconds",
        vec![0.1, 0.25, 0.5, 1.0, 2.0, 4.0, 8.0, 15.0, 30.0]
    )
    .unwrap();
}

/// Renders all metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("Failed to convert metrics to UTF-8: {}", e)))
}

/// Helper: track one provider attempt with metrics
pub async fn track_upstream_call<F, T, E>(future: F) -> Result<T, E>
where
    F: std::future::Future<Output = Result<T, E>>,
{
    let timer = UPSTREAM_REQUEST_DURATION_SECONDS.start_timer();
    let result = future.await;
    timer.observe_duration();

    let outcome = if result.is_ok() { "success" } else { "error" };
    UPSTREAM_REQUESTS_TOTAL.with_label_values(&[outcome]).inc();

    result
}

pub fn record_hint(hint_type: &str, outcome: &str) {
    HINTS_GENERATED_TOTAL
        .with_label_values(&[hint_type, outcome])
        .inc();
}
