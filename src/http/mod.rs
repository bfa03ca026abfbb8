//! HTTP surface.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum setup, middleware, host rewrite)
//!     → extract.rs (client address, bearer user)
//!     → crate::handlers (gatekeeper, validation, backends)
//!     → error.rs (ApiError → JSON body + status)
//!     → Send to client
//! ```

pub mod error;
pub mod extract;
pub mod server;

pub use error::ApiError;
pub use extract::{AuthUser, ClientIp};
pub use server::{build_app, AppState, HttpServer};
