//! Vote admission policy and outcomes.
//!
//! Each entry accepts at most one vote per rolling window, shared by all
//! voters. The window is measured backwards from the moment of the vote and
//! is open at its far end: a vote cast exactly `window` ago no longer
//! blocks.

use chrono::Duration;

use crate::types::Timestamp;

/// Default rolling window: 60 minutes.
pub const DEFAULT_VOTE_WINDOW_SECS: i64 = 60 * 60;

/// Rolling-window configuration handed to the admission engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VotePolicy {
    window: Duration,
}

impl Default for VotePolicy {
    fn default() -> Self {
        Self::from_secs(DEFAULT_VOTE_WINDOW_SECS)
    }
}

impl VotePolicy {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    /// Window of `secs` seconds; non-positive values are raised to one second.
    pub fn from_secs(secs: i64) -> Self {
        Self::new(Duration::seconds(secs.max(1)))
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Votes cast strictly after this instant block a vote at `now`.
    pub fn cutoff(&self, now: Timestamp) -> Timestamp {
        now - self.window
    }

    /// Whether a vote cast at `last_cast` still blocks a vote at `now`.
    pub fn blocks(&self, last_cast: Timestamp, now: Timestamp) -> bool {
        last_cast > self.cutoff(now)
    }

    /// Time until `last_cast` leaves the window, never negative.
    pub fn retry_after(&self, last_cast: Timestamp, now: Timestamp) -> Duration {
        let remaining = last_cast + self.window - now;
        remaining.max(Duration::zero())
    }
}

/// Result of a vote attempt that reached a decision.
///
/// Storage failures are not outcomes; they travel on the error path so
/// callers can tell "the rule said no" apart from "the store failed".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The vote was recorded; `score` is the entry's new total.
    Accepted { score: i64 },
    /// A vote inside the window already exists.
    RateLimited { retry_after: Duration },
}

impl VoteOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, VoteOutcome::Accepted { .. })
    }
}

/// Whole seconds, rounded up so clients never retry too early.
pub fn ceil_secs(d: Duration) -> i64 {
    let secs = d.num_seconds();
    if d > Duration::seconds(secs) {
        secs + 1
    } else {
        secs
    }
}
