//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): inbound requests by final status
//! - `proxy_request_duration_seconds` (histogram): end-to-end latency
//! - `proxy_backend_attempts_total` (counter): attempts by backend and result
//! - `proxy_backend_health` (gauge): 1=healthy, 0=unhealthy
//! - `proxy_pool_exhausted_total` (counter): requests answered with 503
//!
//! Without an installed recorder every call here is a no-op, which keeps
//! tests free of global state.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::load_balancer::backend::Backend;

/// Result label for `proxy_backend_attempts_total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptResult {
    Success,
    Passthrough,
    ServerError,
    TransportError,
    Skipped,
}

impl AttemptResult {
    fn as_str(self) -> &'static str {
        match self {
            AttemptResult::Success => "success",
            AttemptResult::Passthrough => "passthrough",
            AttemptResult::ServerError => "server_error",
            AttemptResult::TransportError => "transport_error",
            AttemptResult::Skipped => "skipped",
        }
    }
}

/// Install the Prometheus exporter with an HTTP listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(status: u16, start: Instant) {
    metrics::counter!("proxy_requests_total", "status" => status.to_string()).increment(1);
    metrics::histogram!("proxy_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_attempt(backend: &Backend, result: AttemptResult) {
    metrics::counter!(
        "proxy_backend_attempts_total",
        "backend" => backend.to_string(),
        "result" => result.as_str()
    )
    .increment(1);
}

pub fn record_backend_health(backend: &Backend, healthy: bool) {
    metrics::gauge!("proxy_backend_health", "backend" => backend.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_pool_exhausted() {
    metrics::counter!("proxy_pool_exhausted_total").increment(1);
}
