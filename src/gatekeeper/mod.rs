//! Request gatekeeping subsystem.
//!
//! # Data Flow
//! ```text
//! Auth request (login / register / password reset):
//!     → Gatekeeper::admit (per-action fixed window, keyed by IP or email)
//!     → input validation (handler)
//!     → Gatekeeper::check_lockout (login only, before the auth provider)
//!     → auth provider
//!     → Gatekeeper::record_failure | Gatekeeper::clear_on_success
//! ```
//!
//! # Design Decisions
//! - Stores are owned by the `Gatekeeper` value held in application state,
//!   never module-level statics
//! - Time comes from an injected `Clock`
//! - Expiry is lazy (checked on access); `sweep.rs` only bounds memory
//! - State is process-local: it does not survive restarts and is not shared
//!   between instances. Move to a shared store before scaling out.

pub mod clock;
pub mod lockout;
pub mod rate_limit;
pub mod sweep;

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Serialize;

use crate::config::{LockoutConfig, RateLimitConfig};
use crate::observability::metrics;

pub use clock::{deadline, Clock, ManualClock, SystemClock, MAX_SPAN};
pub use lockout::{LockoutPolicy, LockoutRecord, LockoutStatus, LockoutTracker};
pub use rate_limit::{RateLimiter, RatePolicy, RateWindow};
pub use sweep::Sweeper;

/// Gated actions. Each has its own limiter map and policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Login,
    Registration,
    PasswordReset,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Login => "login",
            Action::Registration => "registration",
            Action::PasswordReset => "password_reset",
        }
    }
}

/// Every policy the gatekeeper enforces; swapped as a unit on reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatePolicies {
    pub login: RatePolicy,
    pub registration: RatePolicy,
    pub password_reset: RatePolicy,
    pub lockout: LockoutPolicy,
}

impl GatePolicies {
    pub fn from_config(rate_limit: &RateLimitConfig, lockout: &LockoutConfig) -> Self {
        Self {
            login: rate_limit.login.into(),
            registration: rate_limit.registration.into(),
            password_reset: rate_limit.password_reset.into(),
            lockout: lockout.into(),
        }
    }

    fn rate(&self, action: Action) -> RatePolicy {
        match action {
            Action::Login => self.login,
            Action::Registration => self.registration,
            Action::PasswordReset => self.password_reset,
        }
    }
}

impl Default for GatePolicies {
    fn default() -> Self {
        Self::from_config(&RateLimitConfig::default(), &LockoutConfig::default())
    }
}

/// Snapshot of gatekeeper state for the admin API.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GatekeeperStats {
    pub login_windows: usize,
    pub registration_windows: usize,
    pub password_reset_windows: usize,
    pub lockout_records: usize,
    pub locked_accounts: usize,
}

/// Counts removed by one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub windows: usize,
    pub lockouts: usize,
}

/// Rate limiting and account lockout in front of the auth provider.
pub struct Gatekeeper {
    clock: Arc<dyn Clock>,
    policies: ArcSwap<GatePolicies>,
    login: RateLimiter,
    registration: RateLimiter,
    password_reset: RateLimiter,
    lockouts: LockoutTracker,
}

impl Gatekeeper {
    pub fn new(policies: GatePolicies, clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            policies: ArcSwap::from_pointee(policies),
            login: RateLimiter::new(),
            registration: RateLimiter::new(),
            password_reset: RateLimiter::new(),
            lockouts: LockoutTracker::new(),
        }
    }

    /// Admit one attempt of `action` for `key`.
    pub fn admit(&self, action: Action, key: &str) -> bool {
        let policy = self.policies.load().rate(action);
        let allowed = self
            .limiter(action)
            .check_and_consume(key, self.clock.now(), policy);
        if !allowed {
            metrics::record_rate_limited(action.as_str());
        }
        allowed
    }

    pub fn check_lockout(&self, email: &str) -> LockoutStatus {
        self.lockouts.check_lockout(email, self.clock.now())
    }

    /// Record a failed sign-in reported by the auth provider.
    pub fn record_failure(&self, email: &str) -> LockoutRecord {
        let policy = self.policies.load().lockout;
        let record = self.lockouts.record_failure(email, self.clock.now(), policy);
        metrics::record_auth_failure();

        tracing::warn!(
            target: "security_audit",
            email = %email,
            failures = record.failure_count,
            threshold = policy.threshold,
            "Failed login attempt"
        );
        if record.failure_count == policy.threshold {
            metrics::record_lockout();
            tracing::warn!(
                target: "security_audit",
                email = %email,
                minutes = policy.duration.as_secs() / 60,
                "Account locked"
            );
        }
        record
    }

    pub fn clear_on_success(&self, email: &str) {
        self.lockouts.clear_on_success(email);
    }

    /// Drop a lock by operator request.
    pub fn unlock(&self, email: &str) -> bool {
        let existed = self.lockouts.record(email).is_some();
        self.lockouts.clear_on_success(email);
        existed
    }

    /// Replace the active policies. Existing counters are kept.
    pub fn update_policies(&self, policies: GatePolicies) {
        self.policies.store(Arc::new(policies));
    }

    pub fn policies(&self) -> GatePolicies {
        **self.policies.load()
    }

    /// Remove expired windows and lockout records.
    pub fn sweep(&self) -> SweepStats {
        let now = self.clock.now();
        let stats = SweepStats {
            windows: self.login.sweep(now)
                + self.registration.sweep(now)
                + self.password_reset.sweep(now),
            lockouts: self.lockouts.sweep(now),
        };
        let windows = self.login.len() + self.registration.len() + self.password_reset.len();
        metrics::record_tracked_keys("rate_windows", windows);
        metrics::record_tracked_keys("lockouts", self.lockouts.len());
        stats
    }

    pub fn stats(&self) -> GatekeeperStats {
        GatekeeperStats {
            login_windows: self.login.len(),
            registration_windows: self.registration.len(),
            password_reset_windows: self.password_reset.len(),
            lockout_records: self.lockouts.len(),
            locked_accounts: self.lockouts.locked_count(self.clock.now()),
        }
    }

    fn limiter(&self, action: Action) -> &RateLimiter {
        match action {
            Action::Login => &self.login,
            Action::Registration => &self.registration,
            Action::PasswordReset => &self.password_reset,
        }
    }
}
