//! Prometheus metrics for the API server.

use std::sync::LazyLock;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use regex_lite::Regex;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {}", e))
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "gig_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "gig_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "gig_http_requests_in_flight";

    // Workflow metrics
    pub const JOB_TRANSITIONS_TOTAL: &str = "gig_job_transitions_total";
    pub const FRAUD_REPORTS_TOTAL: &str = "gig_fraud_reports_total";
    pub const REGISTRATIONS_TOTAL: &str = "gig_registrations_total";

    // Oracle metrics
    pub const ORACLE_CALLS_TOTAL: &str = "gig_oracle_calls_total";
    pub const ORACLE_DURATION_SECONDS: &str = "gig_oracle_duration_seconds";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "gig_rate_limit_hits_total";
}

static NUMERIC_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/[0-9]+(/|$)").expect("valid regex"));

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

/// Record a job operation and how it ended (`ok`, `unauthorized`, `conflict`, ...).
pub fn record_job_transition(operation: &'static str, outcome: &'static str) {
    counter!(
        names::JOB_TRANSITIONS_TOTAL,
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_fraud_report(outcome: &'static str) {
    counter!(names::FRAUD_REPORTS_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_registration(role: &'static str) {
    counter!(names::REGISTRATIONS_TOTAL, "role" => role).increment(1);
}

/// Record an oracle call.
pub fn record_oracle_call(purpose: &'static str, outcome: &'static str, duration_secs: f64) {
    counter!(
        names::ORACLE_CALLS_TOTAL,
        "purpose" => purpose,
        "outcome" => outcome
    )
    .increment(1);
    histogram!(names::ORACLE_DURATION_SECONDS, "purpose" => purpose).record(duration_secs);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", sanitize_path(endpoint))];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Replace numeric ids in a path so label cardinality stays bounded.
fn sanitize_path(path: &str) -> String {
    // Run twice: adjacent ids share the slash between them.
    let once = NUMERIC_SEGMENT.replace_all(path, "/:id$1");
    NUMERIC_SEGMENT.replace_all(&once, "/:id$1").into_owned()
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
