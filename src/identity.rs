//! Owner identity for [`crate::gil::ExclusionLock`] (spec.md §9, second open
//! question: "whether the fairness predicate should additionally compare a
//! generation counter ... to handle reused thread identities after thread
//! exit and rebirth").
//!
//! `std::thread::ThreadId` is only guaranteed unique among currently-live
//! threads; the OS can and does reuse native thread handles after a thread
//! exits. Pairing it with a per-thread incarnation number, assigned once
//! from a process-global counter and cached for the life of the thread,
//! makes `last_owner` comparisons correct even across thread exit/rebirth —
//! resolved here rather than left open, per DESIGN.md.

use crate::platform::ThreadId;
use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_INCARNATION: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static INCARNATION: Cell<u64> = Cell::new(0);
}

/// Identifies a thread across its lifetime, not just its current `ThreadId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner {
    thread: ThreadId,
    incarnation: u64,
}

impl Owner {
    /// The identity of the calling thread, assigning it a fresh incarnation
    /// number the first time this is called on a given OS thread.
    pub fn current() -> Self {
        let incarnation = INCARNATION.with(|cell| {
            let existing = cell.get();
            if existing != 0 {
                return existing;
            }
            let assigned = NEXT_INCARNATION.fetch_add(1, Ordering::Relaxed);
            cell.set(assigned);
            assigned
        });
        Self {
            thread: crate::platform::current_thread(),
            incarnation,
        }
    }
}
