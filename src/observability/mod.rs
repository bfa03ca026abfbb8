//! Logs and metrics.
//!
//! `logging` installs the tracing subscriber (full, compact or pretty text).
//! Security-relevant events (failed logins, lockouts, rejected admin calls)
//! go to the `security_audit` target so they can be filtered on their own.
//!
//! `metrics` exposes a Prometheus scrape endpoint when enabled:
//! ```text
//! gateway_requests_total{method,status}      gateway_rate_limited_total{action}
//! gateway_request_duration_seconds           gateway_auth_failures_total
//! gateway_host_rewrites_total                gateway_lockouts_total
//! gateway_tracked_keys{store}
//! ```

pub mod logging;
pub mod metrics;
