//! Monotonic time source
//!
//! The reload timer only compares time points, so tests drive it with
//! a [`ManualClock`] instead of sleeping.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic reading, as an offset from the clock's start
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimePoint(Duration);

impl TimePoint {
    /// Time point at `offset` from the start
    #[inline]
    #[must_use]
    pub const fn from_offset(offset: Duration) -> Self {
        Self(offset)
    }

    /// Offset from the start
    #[inline]
    #[must_use]
    pub const fn as_duration(&self) -> Duration {
        self.0
    }

    /// Time elapsed since `earlier`, zero if `earlier` is later
    #[inline]
    #[must_use]
    pub fn saturating_duration_since(&self, earlier: TimePoint) -> Duration {
        self.0.saturating_sub(earlier.0)
    }

    /// Time point `delta` later
    #[inline]
    #[must_use]
    pub fn saturating_add(&self, delta: Duration) -> TimePoint {
        TimePoint(self.0.saturating_add(delta))
    }
}

/// Source of monotonic time points
pub trait Clock {
    /// Current reading; never decreases
    fn now(&self) -> TimePoint;
}

/// Wall-independent clock backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    /// Clock starting now
    #[must_use]
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> TimePoint {
        TimePoint(self.start.elapsed())
    }
}

/// Clock that only moves when told to
///
/// Clones share the same reading.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<Duration>>,
}

impl ManualClock {
    /// Clock reading zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move forward by `delta`
    pub fn advance(&self, delta: Duration) {
        let mut now = self.now.lock();
        *now = now.saturating_add(delta);
    }

    /// Move forward to `point`; earlier points are ignored
    pub fn advance_to(&self, point: TimePoint) {
        let mut now = self.now.lock();
        *now = (*now).max(point.as_duration());
    }
}

impl Clock for ManualClock {
    fn now(&self) -> TimePoint {
        TimePoint(*self.now.lock())
    }
}
