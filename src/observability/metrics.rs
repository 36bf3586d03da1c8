//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define balancer metrics (requests, latency, backend health, bytes)
//! - Expose Prometheus-compatible metrics endpoint
//! - Track per-backend and aggregate metrics
//!
//! # Metrics
//! - `lb_requests_total` (counter): requests by method, status, backend
//! - `lb_request_duration_seconds` (histogram): time to response headers
//! - `lb_backend_health` (gauge): 1=healthy, 0=unhealthy
//! - `lb_backend_bytes_total` (counter): response bytes relayed per backend
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so library users and
//!   tests pay nothing when the exporter is disabled

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed request (status known).
pub fn record_request(method: &str, status: u16, backend: &str, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("backend", backend.to_string()),
    ];
    metrics::counter!("lb_requests_total", &labels).increment(1);
    metrics::histogram!("lb_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

/// Record the latest probe result for a backend.
pub fn record_backend_health(backend: &str, healthy: bool) {
    metrics::gauge!("lb_backend_health", "backend" => backend.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}

/// Record response bytes relayed through a backend.
pub fn record_bytes(backend: &str, bytes: u64) {
    metrics::counter!("lb_backend_bytes_total", "backend" => backend.to_string())
        .increment(bytes);
}
