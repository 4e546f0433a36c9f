//! Deadline conversion (spec.md §6: "the core treats the time structure as
//! `{seconds, nanoseconds}` of a UTC-aligned clock for deadlines").

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// An absolute point in time expressed against the real-time clock, in the
/// `{seconds, nanoseconds}` shape spec.md names explicitly so that callers
/// never need to hand this crate a platform-specific `timespec`/`FILETIME`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    secs: u64,
    nanos: u32,
}

impl Deadline {
    /// Builds a deadline `timeout` in the future of the real-time clock.
    pub fn after(timeout: Duration) -> Self {
        Self::from_system_time(SystemTime::now() + timeout)
    }

    /// Builds a deadline already in the past, for boundary tests (spec.md B1).
    pub fn already_expired() -> Self {
        Self { secs: 0, nanos: 0 }
    }

    pub fn from_system_time(t: SystemTime) -> Self {
        let since_epoch = t.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);
        Self {
            secs: since_epoch.as_secs(),
            nanos: since_epoch.subsec_nanos(),
        }
    }

    /// Converts to a `std::time::Instant`-relative duration remaining from
    /// `now`, rounding up to the next nanosecond so a deadline is never
    /// shortened by the conversion (spec.md §4.A). Returns `Duration::ZERO`
    /// if the deadline has already passed.
    pub fn remaining_from(self, now: SystemTime) -> Duration {
        let target = UNIX_EPOCH + Duration::new(self.secs, self.nanos);
        target.duration_since(now).unwrap_or(Duration::ZERO)
    }

    /// Convenience: the `Instant` equivalent of this deadline, computed by
    /// anchoring the remaining real-time duration to a monotonic `Instant`.
    /// Used to drive `parking_lot::Condvar::wait_until`, which takes
    /// `Instant`, not wall-clock time.
    pub fn as_instant(self) -> Instant {
        Instant::now() + self.remaining_from(SystemTime::now())
    }

    pub fn has_passed(self) -> bool {
        self.remaining_from(SystemTime::now()).is_zero()
    }
}
