//! Platform primitives facade (spec.md §4.A / [MODULE A]).
//!
//! A uniform view of the five capabilities the rest of the crate consumes as
//! opaque building blocks: a counting semaphore, a mutex, thread identity, a
//! yield hint, and clocks for deadline conversion. The per-OS semaphore and
//! mutex backends spec.md calls out as "out of scope (external collaborators)"
//! — POSIX `sem_t`, Windows `CRITICAL_SECTION`, GCD dispatch semaphores — are
//! satisfied here by `parking_lot`, whose `Mutex`/`Condvar` already present a
//! single non-poisoning API across every target this crate builds for. No
//! `cfg(target_os = ...)` branching lives in this crate; parking_lot does it.

mod clock;
mod semaphore;

pub use clock::Deadline;
pub use semaphore::{SemWait, Semaphore};

/// The mutex capability of [MODULE A]. A plain alias: `parking_lot::Mutex`
/// already is the uniform, non-reentrant, non-poisoning mutex the facade
/// calls for, so there is nothing to add by wrapping it.
pub type Mutex<T> = parking_lot::Mutex<T>;

/// Thread-identity capability: `current()` and equality, nothing else.
pub type ThreadId = std::thread::ThreadId;

/// Returns the identity of the calling thread.
pub fn current_thread() -> ThreadId {
    std::thread::current().id()
}

/// Best-effort hint to the scheduler to run another runnable thread.
/// No ordering guarantees; used only by the anti-steal spurious-return path.
pub fn yield_now() {
    std::thread::yield_now();
}
