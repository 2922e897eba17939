//! Idle tracker.
//!
//! Records the time of the last accepted line and decides whether the active
//! log session has been silent long enough to close.

use chrono::{DateTime, Utc};

/// Tracks the last accepted-line timestamp. Conceptually empty while the
/// session is Closed; the caller resets it on close.
#[derive(Debug, Default)]
pub struct IdleTracker {
    last_activity: Option<DateTime<Utc>>,
}

impl IdleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an accepted line at `now`.
    pub fn record_activity(&mut self, now: DateTime<Utc>) {
        self.last_activity = Some(now);
    }

    /// Clears the recorded activity. Called when the session closes.
    pub fn reset(&mut self) {
        self.last_activity = None;
    }

    /// True iff activity has been recorded and at least `threshold_ms` have
    /// elapsed since. A zero or negative threshold disables idle-based
    /// closing entirely.
    pub fn is_expired(&self, now: DateTime<Utc>, threshold_ms: i64) -> bool {
        if threshold_ms <= 0 {
            return false;
        }
        match self.last_activity {
            Some(last) => now.signed_duration_since(last).num_milliseconds() >= threshold_ms,
            None => false,
        }
    }
}
