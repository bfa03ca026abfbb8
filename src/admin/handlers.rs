use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::BackendKind;
use crate::gatekeeper::{GatekeeperStats, RatePolicy};
use crate::http::AppState;
use crate::validation::normalize_email;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub backend: &'static str,
    pub apex_domain: String,
}

#[derive(Serialize)]
pub struct GatekeeperReport {
    pub stats: GatekeeperStats,
    pub policies: Value,
}

fn rate_policy(policy: RatePolicy) -> Value {
    json!({
        "window_secs": policy.window.as_secs(),
        "max_attempts": policy.max_attempts,
    })
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let config = state.config();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        backend: match config.backend.kind {
            BackendKind::Memory => "memory",
            BackendKind::Http => "http",
        },
        apex_domain: config.domain.apex_domain.clone(),
    })
}

pub async fn get_gatekeeper(State(state): State<AppState>) -> Json<GatekeeperReport> {
    let policies = state.gatekeeper.policies();
    Json(GatekeeperReport {
        stats: state.gatekeeper.stats(),
        policies: json!({
            "login": rate_policy(policies.login),
            "registration": rate_policy(policies.registration),
            "password_reset": rate_policy(policies.password_reset),
            "lockout": {
                "threshold": policies.lockout.threshold,
                "duration_secs": policies.lockout.duration.as_secs(),
            },
        }),
    })
}

/// Clear the lockout record for one account.
pub async fn delete_lockout(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Json<Value> {
    let email = normalize_email(&email);
    let unlocked = state.gatekeeper.unlock(&email);
    tracing::info!(target: "security_audit", email = %email, unlocked, "Lockout cleared by operator");
    Json(json!({ "email": email, "unlocked": unlocked }))
}
