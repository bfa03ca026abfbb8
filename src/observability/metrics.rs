//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//! - `gateway_rate_limited_total` (counter): rejections by action
//! - `gateway_auth_failures_total` (counter): failed sign-ins
//! - `gateway_lockouts_total` (counter): accounts locked
//! - `gateway_host_rewrites_total` (counter): tenant rewrites
//! - `gateway_tracked_keys` (gauge): live gatekeeper entries by store
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let status = status.to_string();
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.clone()
    )
    .increment(1);
    histogram!(
        "gateway_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited(action: &'static str) {
    counter!("gateway_rate_limited_total", "action" => action).increment(1);
}

pub fn record_auth_failure() {
    counter!("gateway_auth_failures_total").increment(1);
}

pub fn record_lockout() {
    counter!("gateway_lockouts_total").increment(1);
}

pub fn record_host_rewrite() {
    counter!("gateway_host_rewrites_total").increment(1);
}

pub fn record_tracked_keys(store: &'static str, count: usize) {
    gauge!("gateway_tracked_keys", "store" => store).set(count as f64);
}

/// Middleware recording request count and latency.
pub async fn track_metrics(req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let response = next.run(req).await;
    record_request(&method, response.status().as_u16(), start);
    response
}
