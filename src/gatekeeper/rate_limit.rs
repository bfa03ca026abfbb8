//! Fixed-window attempt limiter.
//!
//! # Responsibilities
//! - Track one `RateWindow` per key (client IP or email)
//! - Admit or reject an attempt and consume it when admitted
//! - Drop expired windows on request (sweep)
//!
//! # Design Decisions
//! - Reset-on-expiry instead of a sliding log: O(1) memory and check cost
//!   per key. A burst straddling a boundary may admit up to
//!   `2 × max_attempts`; this limiter deters abuse, it is not a quota.
//! - Rejections never touch the stored count.
//! - Each key is updated under its DashMap shard lock, so two requests on
//!   the same key cannot both observe the same count.

use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::clock::deadline;
use crate::config::WindowPolicyConfig;

/// Window length and capacity for one caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatePolicy {
    pub window: Duration,
    pub max_attempts: u32,
}

impl RatePolicy {
    pub fn new(window: Duration, max_attempts: u32) -> Self {
        Self {
            window,
            max_attempts,
        }
    }
}

impl From<WindowPolicyConfig> for RatePolicy {
    fn from(config: WindowPolicyConfig) -> Self {
        Self::new(config.window(), config.max_attempts)
    }
}

/// Attempts observed for one key in the current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    pub count: u32,
    pub reset_at: Instant,
}

impl RateWindow {
    fn open(now: Instant, window: Duration) -> Self {
        Self {
            count: 1,
            reset_at: deadline(now, window),
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        now >= self.reset_at
    }
}

/// Per-key fixed-window limiter.
#[derive(Debug, Default)]
pub struct RateLimiter {
    windows: DashMap<String, RateWindow>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit one attempt for `key` at `now`, consuming it when admitted.
    pub fn check_and_consume(&self, key: &str, now: Instant, policy: RatePolicy) -> bool {
        match self.windows.entry(key.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(RateWindow::open(now, policy.window));
                true
            }
            Entry::Occupied(mut slot) => {
                let window = slot.get_mut();
                if window.is_expired(now) {
                    *window = RateWindow::open(now, policy.window);
                    true
                } else if window.count >= policy.max_attempts {
                    false
                } else {
                    window.count += 1;
                    true
                }
            }
        }
    }

    /// Current window for `key`, if one was ever opened and not swept.
    pub fn window(&self, key: &str) -> Option<RateWindow> {
        self.windows.get(key).map(|w| *w)
    }

    /// Remove windows that have closed by `now`. Returns how many were removed.
    pub fn sweep(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, window| !window.is_expired(now));
        before.saturating_sub(self.windows.len())
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn test_admits_up_to_max_then_rejects() {
        let limiter = RateLimiter::new();
        let policy = RatePolicy::new(HOUR, 10);
        let now = Instant::now();

        for _ in 0..10 {
            assert!(limiter.check_and_consume("10.0.0.1", now, policy));
        }
        assert!(!limiter.check_and_consume("10.0.0.1", now, policy));
        assert_eq!(limiter.window("10.0.0.1").unwrap().count, 10);
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimiter::new();
        let policy = RatePolicy::new(HOUR, 1);
        let now = Instant::now();

        assert!(limiter.check_and_consume("a@example.com", now, policy));
        assert!(!limiter.check_and_consume("a@example.com", now, policy));
        assert!(limiter.check_and_consume("b@example.com", now, policy));
    }

    #[test]
    fn test_rejection_does_not_change_state() {
        let limiter = RateLimiter::new();
        let policy = RatePolicy::new(HOUR, 3);
        let now = Instant::now();

        for _ in 0..3 {
            limiter.check_and_consume("k", now, policy);
        }
        let before = limiter.window("k").unwrap();
        for _ in 0..5 {
            assert!(!limiter.check_and_consume("k", now, policy));
        }
        assert_eq!(limiter.window("k").unwrap(), before);
    }

    #[test]
    fn test_window_expiry_resets_count() {
        let limiter = RateLimiter::new();
        let policy = RatePolicy::new(HOUR, 5);
        let start = Instant::now();

        for _ in 0..5 {
            assert!(limiter.check_and_consume("k", start, policy));
        }
        assert!(!limiter.check_and_consume("k", start + HOUR - Duration::from_millis(1), policy));

        let later = start + HOUR;
        assert!(limiter.check_and_consume("k", later, policy));
        let window = limiter.window("k").unwrap();
        assert_eq!(window.count, 1);
        assert_eq!(window.reset_at, later + HOUR);
    }

    #[test]
    fn test_boundary_burst_admits_two_windows() {
        let limiter = RateLimiter::new();
        let policy = RatePolicy::new(HOUR, 3);
        let start = Instant::now();
        let edge = start + HOUR;
        let just_before = edge - Duration::from_millis(1);

        assert!(limiter.check_and_consume("k", start, policy));

        // Two left in the first window, a full three in the next one.
        let burst = (0..4)
            .filter(|_| limiter.check_and_consume("k", just_before, policy))
            .count()
            + (0..4)
                .filter(|_| limiter.check_and_consume("k", edge, policy))
                .count();
        assert_eq!(burst, 5);
    }

    #[test]
    fn test_sweep_removes_only_closed_windows() {
        let limiter = RateLimiter::new();
        let start = Instant::now();
        limiter.check_and_consume("old", start, RatePolicy::new(Duration::from_secs(60), 5));
        limiter.check_and_consume("new", start, RatePolicy::new(HOUR, 5));

        assert_eq!(limiter.sweep(start + Duration::from_secs(61)), 1);
        assert!(limiter.window("old").is_none());
        assert!(limiter.window("new").is_some());
        assert_eq!(limiter.len(), 1);
    }

    #[test]
    fn test_oversized_window_is_capped() {
        let limiter = RateLimiter::new();
        let policy = RatePolicy::new(Duration::from_secs(u64::MAX), 1);
        let now = Instant::now();

        assert!(limiter.check_and_consume("k", now, policy));
        assert!(!limiter.check_and_consume("k", now, policy));
        assert_eq!(limiter.window("k").unwrap().reset_at, now + crate::gatekeeper::MAX_SPAN);
    }
}
