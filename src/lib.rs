//! Multi-tenant idea validation gateway.
//!
//! Serves idea landing pages on per-idea subdomains, collects waitlist
//! signups and fronts the auth provider with rate limiting and account
//! lockout.

pub mod admin;
pub mod backend;
pub mod config;
pub mod gatekeeper;
pub mod handlers;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod validation;

pub use config::schema::GatewayConfig;
pub use http::{build_app, AppState, HttpServer};
pub use lifecycle::Shutdown;
