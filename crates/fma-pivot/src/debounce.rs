//! Reload coalescing
//!
//! A backend rewriting one item may raise one change event per key.
//! The first event arms a timer; when it expires the reload only runs
//! if no event arrived during the quiet window, otherwise the timer is
//! re-armed for another period.

use crate::clock::TimePoint;
use std::time::Duration;

/// Default timer period
pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

/// Default quiet window
pub const DEFAULT_QUIET_WINDOW: Duration = Duration::from_millis(500);

/// Coalesces bursts of change events into one reload
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    quiet: Duration,
    deadline: Option<TimePoint>,
    last_event: Option<TimePoint>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY, DEFAULT_QUIET_WINDOW)
    }
}

impl Debouncer {
    /// Create idle debouncer
    #[must_use]
    pub fn new(delay: Duration, quiet: Duration) -> Self {
        Self {
            delay,
            quiet,
            deadline: None,
            last_event: None,
        }
    }

    /// Record an event seen at `now`, arming the timer if idle
    pub fn event(&mut self, now: TimePoint) {
        self.last_event = Some(now);
        if self.deadline.is_none() {
            self.deadline = Some(now.saturating_add(self.delay));
            tracing::trace!(deadline = ?self.deadline, "reload timer armed");
        }
    }

    /// Whether the reload is due at `now`
    ///
    /// Returns `true` at most once per armed timer, and disarms it.
    pub fn poll(&mut self, now: TimePoint) -> bool {
        let Some(deadline) = self.deadline else {
            return false;
        };
        if now < deadline {
            return false;
        }
        let quiet_for = self
            .last_event
            .map_or(self.quiet, |last| now.saturating_duration_since(last));
        if quiet_for < self.quiet {
            self.deadline = Some(now.saturating_add(self.delay));
            tracing::trace!(?quiet_for, "events still arriving, reload timer re-armed");
            return false;
        }
        self.deadline = None;
        true
    }

    /// Expiry of the armed timer
    #[inline]
    #[must_use]
    pub fn deadline(&self) -> Option<TimePoint> {
        self.deadline
    }

    /// Whether a reload is pending
    #[inline]
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Drop the pending reload
    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}
