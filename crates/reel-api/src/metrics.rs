//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Install the Prometheus recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "promoreel_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "promoreel_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "promoreel_http_requests_in_flight";

    // Progress stream metrics
    pub const STREAM_CONNECTIONS_TOTAL: &str = "promoreel_stream_connections_total";
    pub const STREAM_CONNECTIONS_ACTIVE: &str = "promoreel_stream_connections_active";
    pub const STREAM_EVENTS_SENT: &str = "promoreel_stream_events_sent_total";

    // Job metrics
    pub const JOBS_STARTED_TOTAL: &str = "promoreel_jobs_started_total";
    pub const JOBS_REAPED_TOTAL: &str = "promoreel_jobs_reaped_total";
    pub const JOBS_TRACKED: &str = "promoreel_jobs_tracked";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "promoreel_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a new progress stream connection.
pub fn record_stream_opened(transport: &str) {
    let labels = [("transport", transport.to_string())];
    counter!(names::STREAM_CONNECTIONS_TOTAL, &labels).increment(1);
    gauge!(names::STREAM_CONNECTIONS_ACTIVE, &labels).increment(1.0);
}

/// Record a closed progress stream connection.
pub fn record_stream_closed(transport: &str) {
    let labels = [("transport", transport.to_string())];
    gauge!(names::STREAM_CONNECTIONS_ACTIVE, &labels).decrement(1.0);
}

/// Record a progress event pushed to a client.
pub fn record_stream_event(transport: &str, stage: &str) {
    let labels = [
        ("transport", transport.to_string()),
        ("stage", stage.to_string()),
    ];
    counter!(names::STREAM_EVENTS_SENT, &labels).increment(1);
}

/// Record a job started through the API.
pub fn record_job_started(mode: &str) {
    let labels = [("mode", mode.to_string())];
    counter!(names::JOBS_STARTED_TOTAL, &labels).increment(1);
}

/// Record jobs removed by the reaper.
pub fn record_jobs_reaped(count: usize, remaining: usize) {
    counter!(names::JOBS_REAPED_TOTAL).increment(count as u64);
    gauge!(names::JOBS_TRACKED).set(remaining as f64);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Collapse job ids so label cardinality stays bounded.
fn sanitize_path(path: &str) -> String {
    let mut out = Vec::new();
    let mut after_jobs = false;
    for segment in path.split('/') {
        if after_jobs && !segment.is_empty() {
            out.push(":job_id");
        } else {
            out.push(segment);
        }
        after_jobs = segment == "jobs";
    }
    out.join("/")
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
