//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (Host header, path)
//!     → rewrite.rs (middleware, before route matching)
//!     → host.rs (classify root, extract subdomain, decide)
//!     → Rewrite: path becomes /idea/<label>[path]
//!     → PassThrough: request untouched
//!     → axum Router dispatches the (possibly rewritten) path
//! ```
//!
//! # Design Decisions
//! - Rules compiled once from config, immutable at runtime
//! - No regex: split, prefix and substring checks only
//! - Deterministic: same host and path always produce the same decision

pub mod host;
pub mod rewrite;

pub use host::{HostRoute, HostRouter, RootDomain, RouteDecision};
pub use rewrite::host_rewrite_middleware;
