//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (windows and locks within (0, one year], thresholds > 0,
//!   addresses parse)
//! - Check backend settings are complete for the selected kind
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::{BackendKind, GatewayConfig, WindowPolicyConfig};
use crate::gatekeeper::MAX_SPAN;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_addr(&mut errors, "listener.bind_address", &config.listener.bind_address);

    if config.domain.apex_domain.split('.').count() < 2 {
        errors.push(ValidationError::new(
            "domain.apex_domain",
            "must have at least two labels (e.g. example.com)",
        ));
    }
    for prefix in &config.domain.bypass_prefixes {
        if !prefix.starts_with('/') {
            errors.push(ValidationError::new(
                "domain.bypass_prefixes",
                format!("'{}' must start with '/'", prefix),
            ));
        }
    }

    check_policy(&mut errors, "rate_limit.login", &config.rate_limit.login);
    check_policy(&mut errors, "rate_limit.registration", &config.rate_limit.registration);
    check_policy(&mut errors, "rate_limit.password_reset", &config.rate_limit.password_reset);

    if config.lockout.threshold == 0 {
        errors.push(ValidationError::new("lockout.threshold", "must be greater than 0"));
    }
    check_span(&mut errors, "lockout.duration_secs", config.lockout.duration_secs);

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be greater than 0"));
    }

    if config.observability.metrics_enabled {
        check_addr(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if config.admin.enabled {
        check_addr(&mut errors, "admin.bind_address", &config.admin.bind_address);
        if config.admin.api_key.len() < 16 {
            errors.push(ValidationError::new(
                "admin.api_key",
                "must be at least 16 characters when the admin API is enabled",
            ));
        }
    }

    if config.backend.kind == BackendKind::Http {
        if let Err(e) = url::Url::parse(&config.backend.url) {
            errors.push(ValidationError::new("backend.url", e.to_string()));
        }
        if config.backend.anon_key.is_empty() {
            errors.push(ValidationError::new("backend.anon_key", "required for the http backend"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_addr(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(field, format!("'{}' is not a socket address", value)));
    }
}

fn check_span(errors: &mut Vec<ValidationError>, field: &str, secs: u64) {
    if secs == 0 {
        errors.push(ValidationError::new(field, "must be greater than 0"));
    } else if secs > MAX_SPAN.as_secs() {
        errors.push(ValidationError::new(
            field,
            format!("must be at most {} seconds (one year)", MAX_SPAN.as_secs()),
        ));
    }
}

fn check_policy(errors: &mut Vec<ValidationError>, field: &str, policy: &WindowPolicyConfig) {
    check_span(errors, &format!("{}.window_secs", field), policy.window_secs);
    if policy.max_attempts == 0 {
        errors.push(ValidationError::new(
            format!("{}.max_attempts", field),
            "must be greater than 0",
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.rate_limit.login.max_attempts = 0;
        config.lockout.threshold = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["listener.bind_address", "rate_limit.login.max_attempts", "lockout.threshold"]
        );
    }

    #[test]
    fn test_spans_are_bounded() {
        let mut config = GatewayConfig::default();
        config.rate_limit.login.window_secs = u64::MAX;
        config.lockout.duration_secs = MAX_SPAN.as_secs() + 1;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["rate_limit.login.window_secs", "lockout.duration_secs"]);

        config.rate_limit.login.window_secs = MAX_SPAN.as_secs();
        config.lockout.duration_secs = MAX_SPAN.as_secs();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_http_backend_requires_url_and_key() {
        let mut config = GatewayConfig::default();
        config.backend.kind = BackendKind::Http;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "backend.url");
        assert_eq!(errors[1].field, "backend.anon_key");
    }
}
