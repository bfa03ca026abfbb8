//! Request handlers for the public API and landing pages.
//!
//! # Data Flow
//! ```text
//! auth.rs      → Gatekeeper → validation → AuthProvider
//! profile.rs   → AuthUser → validation → AuthProvider
//! ideas.rs     → AuthUser → validation → DataStore
//! signups.rs   → validation → DataStore
//! dashboard.rs → AuthUser → DataStore → per-idea stats
//! pages.rs     → DataStore (live ideas only)
//! ```

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod ideas;
pub mod pages;
pub mod profile;
pub mod signups;

/// A submitted field that is present and not blank.
pub(crate) fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
