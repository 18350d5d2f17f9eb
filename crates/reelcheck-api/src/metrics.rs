//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "reelcheck_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "reelcheck_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "reelcheck_http_requests_in_flight";

    // Upload pipeline metrics
    pub const UPLOADS_TOTAL: &str = "reelcheck_uploads_total";
    pub const UPLOAD_BYTES: &str = "reelcheck_upload_bytes";
    pub const PROBE_FAILURES_TOTAL: &str = "reelcheck_probe_failures_total";
    pub const LLM_REQUEST_DURATION_SECONDS: &str = "reelcheck_llm_request_duration_seconds";
    pub const VIRAL_SCORE: &str = "reelcheck_viral_score";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record the outcome of an upload (`analyzed`, `llm_error`, `unparseable`, `failed`).
pub fn record_upload(outcome: &'static str) {
    counter!(names::UPLOADS_TOTAL, "outcome" => outcome).increment(1);
}

/// Record the stored size of an upload.
pub fn record_upload_size(bytes: u64) {
    histogram!(names::UPLOAD_BYTES).record(bytes as f64);
}

/// Record a duration probe that fell back to zero.
pub fn record_probe_failure() {
    counter!(names::PROBE_FAILURES_TOTAL).increment(1);
}

/// Record LLM round-trip latency.
pub fn record_llm_duration(duration_secs: f64) {
    histogram!(names::LLM_REQUEST_DURATION_SECONDS).record(duration_secs);
}

/// Record the viral score of a schema-conforming analysis.
pub fn record_viral_score(score: i64) {
    histogram!(names::VIRAL_SCORE).record(score as f64);
}

/// Route template for labels, so raw URIs never become label values.
fn route_label(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string())
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = route_label(&request);
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_label_falls_back_when_unmatched() {
        let request = Request::builder()
            .uri("/upload-reel/../../etc")
            .body(Body::empty())
            .unwrap();
        assert_eq!(route_label(&request), "unmatched");
    }
}
