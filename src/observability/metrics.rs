//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status, route
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//! - `gateway_auth_failures_total` (counter): rejected credentials by reason
//! - `gateway_route_table_reloads_total` (counter): reload outcomes
//! - `gateway_jwks_refreshes_total` (counter): key refresh outcomes
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so tests need no setup
//! - Labels for route and status code; backends are logged, not labelled

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a completed request.
pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("route", route.to_string()),
    ];
    counter!("gateway_requests_total", &labels).increment(1);
    histogram!("gateway_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

pub fn record_auth_failure(reason: &'static str) {
    counter!("gateway_auth_failures_total", "reason" => reason).increment(1);
}

pub fn record_route_reload(outcome: &'static str) {
    counter!("gateway_route_table_reloads_total", "outcome" => outcome).increment(1);
}

pub fn record_jwks_refresh(outcome: &'static str) {
    counter!("gateway_jwks_refreshes_total", "outcome" => outcome).increment(1);
}
