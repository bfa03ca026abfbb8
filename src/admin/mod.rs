//! Operator API, served on its own listener.
//!
//! # Endpoints
//! - `GET /admin/status`: version and backend kind
//! - `GET /admin/gatekeeper`: tracked keys, locked accounts, active policies
//! - `DELETE /admin/lockouts/{email}`: unlock an account

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{delete, get},
    Router,
};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::AppState;

pub fn setup_admin_router(state: AppState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/gatekeeper", get(get_gatekeeper))
        .route("/admin/lockouts/{email}", delete(delete_lockout))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}
