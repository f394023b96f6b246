//! [`QuotaTracker`] — local view of the provider's remaining call budget.
//!
//! Initialized from the snapshot persisted on the job row and updated
//! during a run: successful calls decrement the local counter,
//! provider-reported rate limits overwrite it wholesale. The final
//! state is persisted back on completion so the next run resumes a
//! paused window instead of re-probing the provider.

use chrono::{DateTime, Utc};

use mentionloop_core::RateLimitSnapshot;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuotaTracker {
    remaining: Option<i32>,
    reset_at: Option<DateTime<Utc>>,
}

impl QuotaTracker {
    /// Start from a persisted snapshot. An absent value means the
    /// budget is unknown, which is treated as available.
    pub fn from_snapshot(snapshot: RateLimitSnapshot) -> Self {
        Self {
            remaining: snapshot.remaining,
            reset_at: snapshot.reset_at,
        }
    }

    /// Whether further calls are certain to be rejected at `now`.
    ///
    /// True only when the budget is known to be spent *and* the known
    /// reset time is still in the future. A spent budget with an
    /// unknown or elapsed reset is attempted — the provider's response
    /// is the authority either way.
    pub fn is_exhausted(&self, now: DateTime<Utc>) -> bool {
        match (self.remaining, self.reset_at) {
            (Some(remaining), Some(reset_at)) => remaining <= 0 && reset_at > now,
            _ => false,
        }
    }

    /// Account for one successful call.
    pub fn record_success(&mut self) {
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining = (*remaining - 1).max(0);
        }
    }

    /// Overwrite with provider-reported values. Provider state always
    /// wins over local bookkeeping.
    pub fn apply_provider(&mut self, remaining: i32, reset_at: DateTime<Utc>) {
        self.remaining = Some(remaining);
        self.reset_at = Some(reset_at);
    }

    /// The state to persist on the job row.
    pub fn snapshot(&self) -> RateLimitSnapshot {
        RateLimitSnapshot {
            remaining: self.remaining,
            reset_at: self.reset_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_unknown_budget_is_available() {
        let tracker = QuotaTracker::from_snapshot(RateLimitSnapshot::default());
        assert!(!tracker.is_exhausted(Utc::now()));
    }

    #[test]
    fn test_spent_budget_with_future_reset_is_exhausted() {
        let now = Utc::now();
        let tracker = QuotaTracker::from_snapshot(RateLimitSnapshot {
            remaining: Some(0),
            reset_at: Some(now + Duration::minutes(10)),
        });
        assert!(tracker.is_exhausted(now));
    }

    #[test]
    fn test_window_reopens_after_reset() {
        let now = Utc::now();
        let tracker = QuotaTracker::from_snapshot(RateLimitSnapshot {
            remaining: Some(0),
            reset_at: Some(now - Duration::seconds(1)),
        });
        assert!(!tracker.is_exhausted(now));
    }

    #[test]
    fn test_spent_budget_without_reset_is_attempted() {
        let tracker = QuotaTracker::from_snapshot(RateLimitSnapshot {
            remaining: Some(0),
            reset_at: None,
        });
        assert!(!tracker.is_exhausted(Utc::now()));
    }

    #[test]
    fn test_success_decrements_known_budget() {
        let now = Utc::now();
        let reset = now + Duration::minutes(5);
        let mut tracker = QuotaTracker::from_snapshot(RateLimitSnapshot {
            remaining: Some(1),
            reset_at: Some(reset),
        });

        assert!(!tracker.is_exhausted(now));
        tracker.record_success();
        assert!(tracker.is_exhausted(now));
        assert_eq!(tracker.snapshot().remaining, Some(0));

        // Clamped at zero.
        tracker.record_success();
        assert_eq!(tracker.snapshot().remaining, Some(0));
    }

    #[test]
    fn test_success_with_unknown_budget_stays_unknown() {
        let mut tracker = QuotaTracker::from_snapshot(RateLimitSnapshot::default());
        tracker.record_success();
        assert_eq!(tracker.snapshot().remaining, None);
    }

    #[test]
    fn test_provider_values_overwrite_local_state() {
        let now = Utc::now();
        let reset = now + Duration::minutes(15);
        let mut tracker = QuotaTracker::from_snapshot(RateLimitSnapshot {
            remaining: Some(50),
            reset_at: None,
        });

        tracker.apply_provider(0, reset);
        assert!(tracker.is_exhausted(now));
        assert_eq!(
            tracker.snapshot(),
            RateLimitSnapshot {
                remaining: Some(0),
                reset_at: Some(reset),
            }
        );
    }

    #[test]
    fn test_snapshot_round_trip() {
        let snapshot = RateLimitSnapshot {
            remaining: Some(7),
            reset_at: Some(Utc::now() + Duration::minutes(3)),
        };
        let tracker = QuotaTracker::from_snapshot(snapshot);
        assert_eq!(tracker.snapshot(), snapshot);
    }
}
