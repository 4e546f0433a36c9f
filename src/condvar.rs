//! Strong condition variable ([MODULE B], spec.md §4.B — "the hard part").
//!
//! Generalizes the teacher's `threading::UqmCondVar`: same guard-passing
//! wait loop shape (`self.inner.wait(state)` style), but the wakeup algorithm
//! is the semaphore-plus-counters design from `examples/original_source/fastcond/fastcond.c`
//! rather than a generation counter, because this component is specified to
//! be built *on top of* [MODULE A]'s semaphore (see SPEC_FULL.md [MODULE B]).
//!
//! Every counter update here happens while the caller holds the external
//! `parking_lot::Mutex` passed into `wait`/`signal`/`broadcast` — there is no
//! atomic traffic in this module, by design (spec.md §9: "do not substitute
//! atomics without re-deriving the invariants").

use crate::config::Config;
use crate::platform::{self, Deadline, Semaphore};
use parking_lot::{Mutex, MutexGuard};
use std::time::Duration;

/// Outcome of `wait`/`timed_wait`. `Interrupted` is never returned to the
/// caller — spec.md §4.B: "never propagates 'interrupted' ... absorbed as
/// spurious wakeups".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// A real or spurious wakeup. The caller must re-test its predicate.
    Woken,
    /// The deadline passed before a wakeup.
    TimedOut,
}

struct Counters {
    /// "Weak layer": threads currently blocked on `sem`.
    w_waiting: u32,
    /// "Strong layer": threads in any phase of waiting, spurious or not.
    n_waiting: u32,
    /// Posts issued for currently-waiting threads, not yet consumed.
    n_wakeup: u32,
}

/// A strong condition variable: `signal` is guaranteed to wake an
/// already-waiting thread, never one that arrives afterward.
pub struct StrongCondVar {
    sem: Semaphore,
    counters: Mutex<Counters>,
    /// Whether the anti-steal branch of `wait_inner` should yield the
    /// scheduler before returning, per `Config::yield_on_steal` (spec.md §6).
    yield_on_steal: bool,
    #[cfg(feature = "test-observer")]
    observer: Option<std::sync::Arc<dyn Fn(&str) + Send + Sync>>,
}

impl StrongCondVar {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Builds a `StrongCondVar` whose tunables come from `config` rather
    /// than the compiled-in defaults (spec.md §6).
    pub fn with_config(config: Config) -> Self {
        Self {
            sem: Semaphore::new(0),
            counters: Mutex::new(Counters {
                w_waiting: 0,
                n_waiting: 0,
                n_wakeup: 0,
            }),
            yield_on_steal: config.yield_on_steal,
            #[cfg(feature = "test-observer")]
            observer: None,
        }
    }

    #[cfg(feature = "test-observer")]
    pub fn with_observer(observer: std::sync::Arc<dyn Fn(&str) + Send + Sync>) -> Self {
        Self {
            observer: Some(observer),
            ..Self::new()
        }
    }

    #[cfg(feature = "test-observer")]
    fn notify(&self, site: &str) {
        if let Some(observer) = &self.observer {
            observer(site);
        }
    }

    #[cfg(not(feature = "test-observer"))]
    fn notify(&self, _site: &str) {}

    /// Number of threads currently considered "waiting" (any phase). Exposed
    /// for invariant tests (spec.md I1) and for [`crate::gil::ExclusionLock`].
    pub fn waiting_count(&self) -> u32 {
        self.counters.lock().n_waiting
    }

    /// `true` once all counters have returned to zero (spec.md I2).
    pub fn is_quiescent(&self) -> bool {
        let c = self.counters.lock();
        c.w_waiting == 0 && c.n_waiting == 0 && c.n_wakeup == 0
    }

    /// Waits on `mutex`, which the caller must already hold. Unlocks it while
    /// blocked and re-locks it before returning. May return spuriously.
    pub fn wait<'a, T>(&self, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
        self.wait_inner(guard, None).0
    }

    /// As `wait`, but gives up at `deadline` (an absolute real-time point).
    /// An already-expired deadline is checked once and returns `TimedOut`
    /// without blocking (spec.md B1).
    pub fn timed_wait<'a, T>(
        &self,
        guard: MutexGuard<'a, T>,
        deadline: Deadline,
    ) -> (MutexGuard<'a, T>, WaitOutcome) {
        self.wait_inner(guard, Some(deadline))
    }

    /// Convenience for platforms whose native wait takes a relative
    /// millisecond timeout (spec.md §6), avoiding an absolute-deadline
    /// round trip when the caller only has a duration in hand.
    pub fn wait_ms<'a, T>(
        &self,
        guard: MutexGuard<'a, T>,
        timeout_ms: u32,
    ) -> (MutexGuard<'a, T>, WaitOutcome) {
        self.timed_wait(guard, Deadline::after(Duration::from_millis(timeout_ms as u64)))
    }

    fn wait_inner<'a, T>(
        &self,
        mut guard: MutexGuard<'a, T>,
        deadline: Option<Deadline>,
    ) -> (MutexGuard<'a, T>, WaitOutcome) {
        self.notify("wait");
        log::trace!("condvar wait: entering");
        let mut counters = self.counters.lock();
        debug_assert!(counters.n_wakeup <= counters.n_waiting);

        if counters.n_wakeup > 0 {
            // Anti-steal branch: a post is already in flight for some other
            // waiter. Entering the semaphore wait here risks consuming it.
            // Unlock, optionally yield so the signalled thread(s) get a
            // chance to run, and return as a legitimate spurious wakeup.
            log::debug!("condvar wait: anti-steal branch, returning spuriously");
            drop(counters);
            if self.yield_on_steal {
                MutexGuard::unlocked(&mut guard, || {
                    platform::yield_now();
                });
            }
            return (guard, WaitOutcome::Woken);
        }

        counters.n_waiting += 1;
        counters.w_waiting += 1;
        drop(counters);

        let (outcome, failed) = MutexGuard::unlocked(&mut guard, || match deadline {
            None => {
                self.sem.wait();
                (WaitOutcome::Woken, false)
            }
            Some(deadline) => match self.sem.timed_wait(deadline) {
                platform::SemWait::Acquired => (WaitOutcome::Woken, false),
                platform::SemWait::TimedOut => (WaitOutcome::TimedOut, true),
            },
        });

        let mut counters = self.counters.lock();
        counters.n_waiting -= 1;
        if failed {
            // No signal/broadcast accounted for this thread; we must
            // decrement the weak counter ourselves (spec.md §9).
            counters.w_waiting -= 1;
            log::debug!("condvar wait: timed out");
        }
        if counters.n_wakeup > 0 {
            counters.n_wakeup -= 1;
        }
        drop(counters);

        log::trace!("condvar wait: returning ({outcome:?})");
        (guard, outcome)
    }

    /// Wakes at most one already-waiting thread. The caller **must** hold
    /// the same mutex it holds across `wait`. No-op if nobody is waiting.
    pub fn signal<T>(&self, _guard: &MutexGuard<'_, T>) {
        self.notify("signal");
        log::trace!("condvar signal");
        let mut counters = self.counters.lock();
        let unwoken = counters.n_waiting as i64 - counters.n_wakeup as i64;
        if unwoken <= 0 {
            log::trace!("condvar signal: no waiter to wake");
            return;
        }
        // w_waiting >= 1 here is guaranteed by the caller holding the same
        // external mutex across both the increment in `wait_inner` and this
        // call — see SPEC_FULL.md [MODULE B] and DESIGN.md.
        debug_assert!(counters.w_waiting >= 1, "signal with no physically blocked waiter");
        self.sem.post();
        counters.n_wakeup += 1;
        counters.w_waiting = counters.w_waiting.saturating_sub(1);
    }

    /// Wakes every currently-waiting thread. The caller **must** hold the
    /// same mutex it holds across `wait`.
    pub fn broadcast<T>(&self, _guard: &MutexGuard<'_, T>) {
        self.notify("broadcast");
        log::trace!("condvar broadcast");
        let mut counters = self.counters.lock();
        let unwoken = counters.n_waiting as i64 - counters.n_wakeup as i64;
        if unwoken <= 0 {
            log::trace!("condvar broadcast: no waiters to wake");
            return;
        }
        let unwoken = unwoken as u32;
        debug_assert!(counters.w_waiting >= unwoken, "broadcast with fewer blocked waiters than unwoken");
        self.sem.post_n(unwoken);
        counters.n_wakeup += unwoken;
        counters.w_waiting = counters.w_waiting.saturating_sub(unwoken);
        log::debug!("condvar broadcast: woke {unwoken} waiter(s)");
    }
}

impl Default for StrongCondVar {
    fn default() -> Self {
        Self::new()
    }
}
