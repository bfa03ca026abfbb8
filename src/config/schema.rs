//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Domain layout used by the host router.
    pub domain: DomainConfig,

    /// Per-action rate limiting policies.
    pub rate_limit: RateLimitConfig,

    /// Account lockout policy.
    pub lockout: LockoutConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request limits.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,

    /// Auth provider and data store connection.
    pub backend: BackendConfig,

    /// Idea ownership rules.
    pub ideas: IdeasConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Domain layout for subdomain routing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DomainConfig {
    /// Production apex domain (`<idea>.<apex>` is a tenant page).
    pub apex_domain: String,

    /// Root used in development (`<idea>.localhost:3000`).
    pub localhost_root: String,

    /// Path prefixes that are never rewritten.
    pub bypass_prefixes: Vec<String>,
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            apex_domain: "wouldyoupay.io".to_string(),
            localhost_root: "localhost:3000".to_string(),
            bypass_prefixes: vec!["/_next".to_string(), "/api".to_string()],
        }
    }
}

/// A single fixed-window policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct WindowPolicyConfig {
    /// Window length in seconds.
    pub window_secs: u64,

    /// Attempts admitted per window.
    pub max_attempts: u32,
}

impl WindowPolicyConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Login attempts per client IP.
    pub login: WindowPolicyConfig,

    /// Registration attempts per client IP.
    pub registration: WindowPolicyConfig,

    /// Password reset requests per target email.
    pub password_reset: WindowPolicyConfig,

    /// Interval of the expired-entry sweep. Zero disables the sweeper.
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            login: WindowPolicyConfig {
                window_secs: 3600,
                max_attempts: 10,
            },
            registration: WindowPolicyConfig {
                window_secs: 3600,
                max_attempts: 5,
            },
            password_reset: WindowPolicyConfig {
                window_secs: 3600,
                max_attempts: 3,
            },
            sweep_interval_secs: 300,
        }
    }
}

/// Account lockout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LockoutConfig {
    /// Consecutive failures before the account is locked.
    pub threshold: u32,

    /// Lock duration in seconds.
    pub duration_secs: u64,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            threshold: 5,
            duration_secs: 15 * 60,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 64 * 1024,
        }
    }
}

/// Log output style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
    Pretty,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Full,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

/// Which collaborator implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Process-local auth and storage, for development and tests.
    #[default]
    Memory,
    /// GoTrue auth + PostgREST storage over HTTP.
    Http,
}

/// Backend-as-a-service connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: BackendKind,

    /// Base URL of the backend project (e.g., "https://xyz.supabase.co").
    pub url: String,

    /// Public API key sent with every request.
    pub anon_key: String,

    /// Privileged key used for account deletion.
    pub service_key: Option<String>,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Memory,
            url: String::new(),
            anon_key: String::new(),
            service_key: None,
            timeout_secs: 10,
        }
    }
}

/// Idea ownership rules.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdeasConfig {
    /// Active (live or paused) ideas allowed on the free tier.
    pub max_active_free: usize,

    /// Public origin used in confirmation and reset links.
    pub public_origin: String,
}

impl Default for IdeasConfig {
    fn default() -> Self {
        Self {
            max_active_free: 2,
            public_origin: "https://wouldyoupay.io".to_string(),
        }
    }
}
