//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → AppState::apply_config swaps the config and gatekeeper policies
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Domain layout and listener addresses need a restart; the rest reloads
//!   in place and gatekeeper counters are kept

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AdminConfig, BackendConfig, BackendKind, DomainConfig, GatewayConfig, IdeasConfig,
    ListenerConfig, LockoutConfig, LogFormat, ObservabilityConfig, RateLimitConfig,
    WindowPolicyConfig,
};
