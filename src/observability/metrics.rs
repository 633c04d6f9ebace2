//! Metrics collection and exposition.
//!
//! # Metrics
//! - `cep_requests_total` (counter): requests by service, route, status
//! - `cep_request_duration_seconds` (histogram): handler latency
//! - `cep_upstream_attempts_total` (counter): hop-2 attempts by outcome
//! - `cep_resolver_calls_total` (counter): provider calls by resolver, outcome
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics exporter"),
    }
}

pub fn record_request(service: &'static str, route: &'static str, status: u16, start: Instant) {
    metrics::counter!(
        "cep_requests_total",
        "service" => service,
        "route" => route,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("cep_request_duration_seconds", "service" => service, "route" => route)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_attempt(outcome: &'static str) {
    metrics::counter!("cep_upstream_attempts_total", "outcome" => outcome).increment(1);
}

pub fn record_resolver_call(resolver: &'static str, outcome: &'static str) {
    metrics::counter!("cep_resolver_calls_total", "resolver" => resolver, "outcome" => outcome).increment(1);
}
