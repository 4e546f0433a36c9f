//! Fair exclusion lock ([MODULE C], spec.md §4.C — "GIL").
//!
//! Generalizes the teacher's `threading::UqmMutex<T>` (a thin RAII wrapper
//! around `std::sync::Mutex<T>`) in two directions: the lock is built on top
//! of [MODULE B] instead of the platform mutex directly, and acquisition can
//! be made fair — a thread already queued is served ahead of one that just
//! walked up — per `examples/original_source/fastcond/gil.c`.
//!
//! The condition-variable backend is a type parameter rather than a
//! preprocessor branch (`gil.h`'s `FASTCOND_GIL_USE_NATIVE_COND`), so the
//! strong-vs-native comparison spec.md §6 calls for is `ExclusionLock<T,
//! StrongCondVar>` vs. `ExclusionLock<T, NativeCondVar>` picked at the type
//! level, with no runtime dispatch cost.

use crate::condvar::{StrongCondVar, WaitOutcome};
use crate::identity::Owner;
use crate::platform::Deadline;
use parking_lot::{Condvar as RawCondvar, MutexGuard};
use std::ops::{Deref, DerefMut};

/// How `acquire` picks the next owner when the lock is free and other
/// threads are already queued (spec.md §4.C).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FairnessMode {
    /// No condition variable, no counters: plain mutex lock/unlock, exactly
    /// `#if FASTCOND_GIL_MODE_NAIVE` in the original — `acquire` is just the
    /// platform mutex's own lock, so this mode's fairness (if any) is
    /// whatever the OS mutex happens to provide.
    Naive,
    /// A freshly-released lock may be immediately reacquired by the thread
    /// that just released it, even if others are queued.
    Greedy,
    /// A thread that is not the queue's `last_owner` must not barge ahead of
    /// waiters already queued; prevents a fast-looping thread from starving
    /// the rest.
    Fair,
}

/// Compile-time default, overridable by the `mode-naive`/`mode-greedy`
/// Cargo features (SPEC_FULL.md [MODULE C]); built without either feature,
/// the default matches spec.md §4.C's stated default of `Fair`.
impl Default for FairnessMode {
    fn default() -> Self {
        #[cfg(feature = "mode-naive")]
        {
            FairnessMode::Naive
        }
        #[cfg(all(feature = "mode-greedy", not(feature = "mode-naive")))]
        {
            FairnessMode::Greedy
        }
        #[cfg(not(any(feature = "mode-naive", feature = "mode-greedy")))]
        {
            FairnessMode::Fair
        }
    }
}

/// The condition-variable capability [MODULE C] is built on. Lets the
/// caller pick the strong implementation in this crate, or a native
/// `parking_lot::Condvar` for an apples-to-apples fairness comparison
/// against weak wakeup semantics (spec.md §6).
pub trait CondVarBackend: Default {
    fn wait<'a, T>(&self, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T>;
    fn timed_wait<'a, T>(
        &self,
        guard: MutexGuard<'a, T>,
        deadline: Deadline,
    ) -> (MutexGuard<'a, T>, WaitOutcome);
    fn signal<T>(&self, guard: &MutexGuard<'_, T>);
}

impl CondVarBackend for StrongCondVar {
    fn wait<'a, T>(&self, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
        StrongCondVar::wait(self, guard)
    }

    fn timed_wait<'a, T>(
        &self,
        guard: MutexGuard<'a, T>,
        deadline: Deadline,
    ) -> (MutexGuard<'a, T>, WaitOutcome) {
        StrongCondVar::timed_wait(self, guard, deadline)
    }

    fn signal<T>(&self, guard: &MutexGuard<'_, T>) {
        StrongCondVar::signal(self, guard)
    }
}

/// Plain `parking_lot::Condvar`: weak semantics, subject to the
/// wakeup-stealing [MODULE B] exists to rule out. Kept only so
/// `ExclusionLock`'s fairness claims can be measured against a baseline
/// that doesn't hold them (spec.md §8 S5).
#[derive(Default)]
pub struct NativeCondVar {
    inner: RawCondvar,
}

impl CondVarBackend for NativeCondVar {
    fn wait<'a, T>(&self, mut guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
        self.inner.wait(&mut guard);
        guard
    }

    fn timed_wait<'a, T>(
        &self,
        mut guard: MutexGuard<'a, T>,
        deadline: Deadline,
    ) -> (MutexGuard<'a, T>, WaitOutcome) {
        let timed_out = self
            .inner
            .wait_until(&mut guard, deadline.as_instant())
            .timed_out();
        let outcome = if timed_out {
            WaitOutcome::TimedOut
        } else {
            WaitOutcome::Woken
        };
        (guard, outcome)
    }

    fn signal<T>(&self, _guard: &MutexGuard<'_, T>) {
        self.inner.notify_one();
    }
}

struct Inner<T> {
    held: bool,
    n_waiting: u32,
    last_owner: Option<Owner>,
    data: T,
}

/// A mutual-exclusion lock that can optionally guarantee fairness: no
/// thread is starved by others that keep reacquiring ahead of it (spec.md
/// I3, I4). Protects a value of type `T`, after the teacher's
/// `UqmMutex<T>` shape, parameterized over the condition-variable backend
/// `C` that implements the wait queue.
pub struct ExclusionLock<T, C: CondVarBackend = StrongCondVar> {
    state: crate::platform::Mutex<Inner<T>>,
    cond: C,
    mode: FairnessMode,
    #[cfg(feature = "test-observer")]
    observer: Option<std::sync::Arc<dyn Fn(&str) + Send + Sync>>,
}

/// RAII guard returned by [`ExclusionLock::acquire`]. Releasing happens on
/// drop, same as the teacher's `UqmMutexGuard`.
pub struct ExclusionGuard<'a, T, C: CondVarBackend = StrongCondVar> {
    lock: &'a ExclusionLock<T, C>,
    guard: Option<MutexGuard<'a, Inner<T>>>,
}

impl<T, C: CondVarBackend> ExclusionLock<T, C> {
    pub fn new(data: T) -> Self {
        Self::with_mode(data, FairnessMode::default())
    }

    pub fn with_mode(data: T, mode: FairnessMode) -> Self {
        Self {
            state: crate::platform::Mutex::new(Inner {
                held: false,
                n_waiting: 0,
                last_owner: None,
                data,
            }),
            cond: C::default(),
            mode,
            #[cfg(feature = "test-observer")]
            observer: None,
        }
    }

    /// As `with_mode`, additionally wiring up the test-instrumentation hook
    /// the `test-observer` feature expects of both [MODULE B] and
    /// [MODULE C] (SPEC_FULL.md's SUPPLEMENTED FEATURES).
    #[cfg(feature = "test-observer")]
    pub fn with_observer(
        data: T,
        mode: FairnessMode,
        observer: std::sync::Arc<dyn Fn(&str) + Send + Sync>,
    ) -> Self {
        Self {
            observer: Some(observer),
            ..Self::with_mode(data, mode)
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

    pub fn mode(&self) -> FairnessMode {
        self.mode
    }

    /// `true` if `state` must keep waiting under the configured fairness
    /// mode (spec.md §4.C "fairness predicate": `held || (n_waiting > 0 &&
    /// last_owner == self)`, negated here: a new caller may proceed only if
    /// the lock is free *and* it isn't barging ahead of a queued waiter).
    /// Never consulted in `Naive` mode — see `acquire`/`release`.
    fn must_wait(&self, state: &Inner<T>, caller: Owner) -> bool {
        if state.held {
            return true;
        }
        match self.mode {
            FairnessMode::Greedy => false,
            FairnessMode::Fair => state.n_waiting > 0 && state.last_owner != Some(caller),
            FairnessMode::Naive => {
                unreachable!("naive mode never calls must_wait")
            }
        }
    }

    /// Blocks until the lock is acquired.
    pub fn acquire(&self) -> ExclusionGuard<'_, T, C> {
        self.notify("acquire");
        log::trace!("gil acquire");
        if self.mode == FairnessMode::Naive {
            // `#if FASTCOND_GIL_MODE_NAIVE` in the original: no counters, no
            // condition variable, the platform mutex alone serializes
            // access.
            let state = self.state.lock();
            return ExclusionGuard {
                lock: self,
                guard: Some(state),
            };
        }

        let caller = Owner::current();
        let mut state = self.state.lock();
        while self.must_wait(&state, caller) {
            state.n_waiting += 1;
            state = self.cond.wait(state);
            state.n_waiting -= 1;
        }
        state.held = true;
        state.last_owner = Some(caller);
        log::trace!("gil acquire: acquired");
        ExclusionGuard {
            lock: self,
            guard: Some(state),
        }
    }

    /// As `acquire`, but gives up at `deadline`, returning `None` on
    /// timeout. Every thread still queued when this one gives up keeps its
    /// place (spec.md B2: a timed-out waiter must not perturb the fairness
    /// order of the others).
    pub fn acquire_timeout(&self, deadline: Deadline) -> Option<ExclusionGuard<'_, T, C>> {
        self.notify("acquire_timeout");
        log::trace!("gil acquire_timeout");
        if self.mode == FairnessMode::Naive {
            return self.state.try_lock_until(deadline.as_instant()).map(|state| {
                ExclusionGuard {
                    lock: self,
                    guard: Some(state),
                }
            });
        }

        let caller = Owner::current();
        let mut state = self.state.lock();
        while self.must_wait(&state, caller) {
            state.n_waiting += 1;
            let (next, outcome) = self.cond.timed_wait(state, deadline);
            state = next;
            state.n_waiting -= 1;
            if outcome == WaitOutcome::TimedOut && self.must_wait(&state, caller) {
                log::debug!("gil acquire_timeout: timed out");
                return None;
            }
        }
        state.held = true;
        state.last_owner = Some(caller);
        Some(ExclusionGuard {
            lock: self,
            guard: Some(state),
        })
    }

    fn release(&self, mut state: MutexGuard<'_, Inner<T>>) {
        self.notify("release");
        log::trace!("gil release");
        if self.mode == FairnessMode::Naive {
            // Dropping `state` at the end of this function unlocks the
            // mutex; there is no `held` flag or condvar to update.
            return;
        }
        state.held = false;
        self.cond.signal(&state);
    }

    /// Gives other queued threads a chance to run without fully releasing
    /// the caller's logical turn: releases, signals, and reacquires inside
    /// one call, after `fastcond_gil_yield` in the original. Unlike a bare
    /// release-then-acquire, a second thread's `acquire_timeout` cannot
    /// observe the lock held by nobody and time out in the gap. In `Naive`
    /// mode there is no queue to inspect, so this degrades to an unlock
    /// immediately followed by a relock.
    pub fn cooperative_yield<'a>(
        &'a self,
        guard: ExclusionGuard<'a, T, C>,
    ) -> ExclusionGuard<'a, T, C> {
        self.notify("yield");
        log::trace!("gil yield");
        let mut state = guard.into_inner();

        if self.mode == FairnessMode::Naive {
            drop(state);
            let state = self.state.lock();
            return ExclusionGuard {
                lock: self,
                guard: Some(state),
            };
        }

        let caller = Owner::current();
        if state.n_waiting == 0 {
            log::trace!("gil yield: no queued waiter, no-op");
            return ExclusionGuard {
                lock: self,
                guard: Some(state),
            };
        }
        state.held = false;
        self.cond.signal(&state);
        state.n_waiting += 1;
        state = self.cond.wait(state);
        state.n_waiting -= 1;
        while self.must_wait(&state, caller) {
            state.n_waiting += 1;
            state = self.cond.wait(state);
            state.n_waiting -= 1;
        }
        state.held = true;
        state.last_owner = Some(caller);
        ExclusionGuard {
            lock: self,
            guard: Some(state),
        }
    }
}

impl<'a, T, C: CondVarBackend> ExclusionGuard<'a, T, C> {
    fn into_inner(mut self) -> MutexGuard<'a, Inner<T>> {
        self.guard.take().expect("guard taken twice")
    }
}

impl<'a, T, C: CondVarBackend> Deref for ExclusionGuard<'a, T, C> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.guard.as_ref().expect("guard dropped").data
    }
}

impl<'a, T, C: CondVarBackend> DerefMut for ExclusionGuard<'a, T, C> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard.as_mut().expect("guard dropped").data
    }
}

impl<'a, T, C: CondVarBackend> Drop for ExclusionGuard<'a, T, C> {
    fn drop(&mut self) {
        if let Some(state) = self.guard.take() {
            self.lock.release(state);
        }
    }
}
