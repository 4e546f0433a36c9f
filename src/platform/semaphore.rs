//! Counting semaphore capability of [MODULE A].
//!
//! Generalizes the teacher's `threading::Semaphore` (`acquire`/`try_acquire`/
//! `release`/`count` over `std::sync::{Mutex, Condvar}`) onto `parking_lot`,
//! and adds the absolute-deadline `timed_wait` component B needs to implement
//! `timed_wait`/`wait_ms` without its own time-conversion logic.

use super::Deadline;
use parking_lot::{Condvar, Mutex};

/// Outcome of a (possibly timed) semaphore wait. There is no `Interrupted`
/// variant: parking_lot's condition variable has no signal-delivery model to
/// interrupt, so the one failure mode spec.md §4.A lists for `wait`/
/// `timed_wait` never actually arises on this backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemWait {
    Acquired,
    TimedOut,
}

/// A counting, non-negative semaphore. `wait` blocks while the count is
/// zero; each successful wait decrements it, each `post` increments it.
pub struct Semaphore {
    count: Mutex<u32>,
    condvar: Condvar,
}

impl Semaphore {
    pub fn new(initial: u32) -> Self {
        Self {
            count: Mutex::new(initial),
            condvar: Condvar::new(),
        }
    }

    /// Blocks until a permit is available, then decrements the count.
    pub fn wait(&self) {
        let mut count = self.count.lock();
        self.condvar.wait_while(&mut count, |c| *c == 0);
        *count -= 1;
    }

    /// Blocks until a permit is available or `deadline` passes.
    ///
    /// An already-expired deadline is checked once and returns `TimedOut`
    /// without blocking (spec.md B1), rather than waiting at all.
    pub fn timed_wait(&self, deadline: Deadline) -> SemWait {
        let mut count = self.count.lock();
        if *count > 0 {
            *count -= 1;
            return SemWait::Acquired;
        }
        if deadline.has_passed() {
            return SemWait::TimedOut;
        }
        let timed_out = self
            .condvar
            .wait_while_until(&mut count, |c| *c == 0, deadline.as_instant())
            .timed_out();
        if *count > 0 {
            *count -= 1;
            SemWait::Acquired
        } else {
            debug_assert!(timed_out);
            SemWait::TimedOut
        }
    }

    /// Non-blocking acquire: `true` if a permit was taken, `false` otherwise.
    pub fn try_acquire(&self) -> bool {
        let mut count = self.count.lock();
        if *count > 0 {
            *count -= 1;
            true
        } else {
            false
        }
    }

    /// Increments the count, waking at most one blocked waiter.
    pub fn post(&self) {
        let mut count = self.count.lock();
        *count += 1;
        self.condvar.notify_one();
    }

    /// Posts `n` times, waking up to `n` waiters. Used by `broadcast` to
    /// issue exactly `unwoken` posts under the external mutex (spec.md §4.B).
    pub fn post_n(&self, n: u32) {
        if n == 0 {
            return;
        }
        let mut count = self.count.lock();
        *count += n;
        self.condvar.notify_all();
    }

    pub fn count(&self) -> u32 {
        *self.count.lock()
    }
}

impl Default for Semaphore {
    fn default() -> Self {
        Self::new(0)
    }
}
