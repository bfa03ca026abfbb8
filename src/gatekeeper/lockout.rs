//! Consecutive-failure account lockout.
//!
//! A record exists per email from its first failed sign-in until a
//! successful one, or until its lock has expired and somebody looks at it.
//! There is no timer: expiry is applied lazily by whichever operation reads
//! the record next, and by the optional sweep.

use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::clock::deadline;
use crate::config::LockoutConfig;

const MINUTE_MILLIS: u128 = 60_000;

/// Failure threshold and lock length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    pub threshold: u32,
    pub duration: Duration,
}

impl LockoutPolicy {
    pub fn new(threshold: u32, duration: Duration) -> Self {
        Self {
            threshold,
            duration,
        }
    }
}

impl From<&LockoutConfig> for LockoutPolicy {
    fn from(config: &LockoutConfig) -> Self {
        Self::new(config.threshold, Duration::from_secs(config.duration_secs))
    }
}

/// Failure streak for one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutRecord {
    pub failure_count: u32,
    pub locked_until: Option<Instant>,
}

impl LockoutRecord {
    fn first_failure() -> Self {
        Self {
            failure_count: 1,
            locked_until: None,
        }
    }

    fn lock_expired(&self, now: Instant) -> bool {
        matches!(self.locked_until, Some(until) if now >= until)
    }
}

/// Result of a lockout check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockoutStatus {
    Unlocked,
    Locked { remaining_minutes: u64 },
}

impl LockoutStatus {
    pub fn is_locked(&self) -> bool {
        matches!(self, LockoutStatus::Locked { .. })
    }
}

/// Per-email failure tracker.
#[derive(Debug, Default)]
pub struct LockoutTracker {
    records: DashMap<String, LockoutRecord>,
}

impl LockoutTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `email` is locked at `now`. Drops the record when its lock has run out.
    pub fn check_lockout(&self, email: &str, now: Instant) -> LockoutStatus {
        match self.records.entry(email.to_string()) {
            Entry::Vacant(_) => LockoutStatus::Unlocked,
            Entry::Occupied(slot) => {
                let locked_until = slot.get().locked_until;
                match locked_until {
                    Some(until) if now < until => LockoutStatus::Locked {
                        remaining_minutes: ceil_minutes(until - now),
                    },
                    Some(_) => {
                        slot.remove();
                        LockoutStatus::Unlocked
                    }
                    None => LockoutStatus::Unlocked,
                }
            }
        }
    }

    /// Count one failed sign-in for `email` and return the updated record.
    ///
    /// The lock is set once, when the count reaches the threshold. Further
    /// failures during the lock keep counting but do not push `locked_until`.
    pub fn record_failure(&self, email: &str, now: Instant, policy: LockoutPolicy) -> LockoutRecord {
        let mut slot = self
            .records
            .entry(email.to_string())
            .or_insert_with(|| LockoutRecord {
                failure_count: 0,
                locked_until: None,
            });
        let record = slot.value_mut();

        if record.lock_expired(now) {
            *record = LockoutRecord::first_failure();
        } else {
            record.failure_count = record.failure_count.saturating_add(1);
        }

        if record.locked_until.is_none() && record.failure_count >= policy.threshold {
            record.locked_until = Some(deadline(now, policy.duration));
        }

        *record
    }

    /// Forget any failure streak for `email`.
    pub fn clear_on_success(&self, email: &str) {
        self.records.remove(email);
    }

    pub fn record(&self, email: &str) -> Option<LockoutRecord> {
        self.records.get(email).map(|r| *r)
    }

    /// Number of accounts locked at `now`.
    pub fn locked_count(&self, now: Instant) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r.locked_until, Some(until) if now < until))
            .count()
    }

    /// Remove records whose lock has expired by `now`.
    ///
    /// Unlocked streaks are kept: they carry no expiry of their own.
    pub fn sweep(&self, now: Instant) -> usize {
        let before = self.records.len();
        self.records.retain(|_, record| !record.lock_expired(now));
        before.saturating_sub(self.records.len())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn ceil_minutes(remaining: Duration) -> u64 {
    let millis = remaining.as_millis();
    u64::try_from(millis.div_ceil(MINUTE_MILLIS)).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> LockoutPolicy {
        LockoutPolicy::new(5, Duration::from_secs(15 * 60))
    }

    #[test]
    fn test_unknown_email_is_unlocked() {
        let tracker = LockoutTracker::new();
        assert_eq!(
            tracker.check_lockout("nobody@example.com", Instant::now()),
            LockoutStatus::Unlocked
        );
    }

    #[test]
    fn test_below_threshold_never_locks() {
        let tracker = LockoutTracker::new();
        let now = Instant::now();
        for n in 1..5 {
            let record = tracker.record_failure("a@example.com", now, policy());
            assert_eq!(record.failure_count, n);
            assert_eq!(record.locked_until, None);
        }
        assert!(!tracker.check_lockout("a@example.com", now).is_locked());
    }

    #[test]
    fn test_threshold_locks_for_duration() {
        let tracker = LockoutTracker::new();
        let now = Instant::now();
        for _ in 0..5 {
            tracker.record_failure("a@example.com", now, policy());
        }

        let record = tracker.record("a@example.com").unwrap();
        assert_eq!(record.locked_until, Some(now + Duration::from_secs(900)));
        assert_eq!(
            tracker.check_lockout("a@example.com", now),
            LockoutStatus::Locked {
                remaining_minutes: 15
            }
        );
    }

    #[test]
    fn test_remaining_minutes_round_up() {
        let tracker = LockoutTracker::new();
        let now = Instant::now();
        for _ in 0..5 {
            tracker.record_failure("a@example.com", now, policy());
        }

        let status = tracker.check_lockout("a@example.com", now + Duration::from_secs(14 * 60 + 1));
        assert_eq!(status, LockoutStatus::Locked { remaining_minutes: 1 });

        let status = tracker.check_lockout("a@example.com", now + Duration::from_secs(60));
        assert_eq!(status, LockoutStatus::Locked { remaining_minutes: 14 });
    }

    #[test]
    fn test_failures_while_locked_do_not_extend() {
        let tracker = LockoutTracker::new();
        let start = Instant::now();
        for _ in 0..5 {
            tracker.record_failure("a@example.com", start, policy());
        }

        let later = start + Duration::from_secs(600);
        let record = tracker.record_failure("a@example.com", later, policy());
        assert_eq!(record.failure_count, 6);
        assert_eq!(record.locked_until, Some(start + Duration::from_secs(900)));
    }

    #[test]
    fn test_success_clears_streak() {
        let tracker = LockoutTracker::new();
        let now = Instant::now();
        for _ in 0..3 {
            tracker.record_failure("a@example.com", now, policy());
        }
        tracker.clear_on_success("a@example.com");

        assert!(tracker.record("a@example.com").is_none());
        assert_eq!(tracker.record_failure("a@example.com", now, policy()).failure_count, 1);
    }

    #[test]
    fn test_expired_lock_restarts_count_from_one() {
        let tracker = LockoutTracker::new();
        let start = Instant::now();
        for _ in 0..7 {
            tracker.record_failure("a@example.com", start, policy());
        }

        let after = start + Duration::from_secs(900);
        assert_eq!(tracker.check_lockout("a@example.com", after), LockoutStatus::Unlocked);
        assert!(tracker.record("a@example.com").is_none());

        let record = tracker.record_failure("a@example.com", after, policy());
        assert_eq!(record.failure_count, 1);
        assert_eq!(record.locked_until, None);
    }

    #[test]
    fn test_expired_lock_without_check_still_restarts() {
        let tracker = LockoutTracker::new();
        let start = Instant::now();
        for _ in 0..5 {
            tracker.record_failure("a@example.com", start, policy());
        }

        let record =
            tracker.record_failure("a@example.com", start + Duration::from_secs(901), policy());
        assert_eq!(record.failure_count, 1);
    }

    #[test]
    fn test_sweep_keeps_active_streaks() {
        let tracker = LockoutTracker::new();
        let start = Instant::now();
        for _ in 0..5 {
            tracker.record_failure("locked@example.com", start, policy());
        }
        tracker.record_failure("streak@example.com", start, policy());

        assert_eq!(tracker.locked_count(start), 1);
        assert_eq!(tracker.sweep(start + Duration::from_secs(900)), 1);
        assert!(tracker.record("streak@example.com").is_some());
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_oversized_lock_is_capped() {
        let tracker = LockoutTracker::new();
        let policy = LockoutPolicy::new(1, Duration::from_secs(u64::MAX));
        let now = Instant::now();

        let record = tracker.record_failure("a@example.com", now, policy);
        assert_eq!(record.locked_until, Some(now + crate::gatekeeper::MAX_SPAN));
        assert!(tracker.check_lockout("a@example.com", now).is_locked());
    }
}
