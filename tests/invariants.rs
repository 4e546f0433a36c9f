//! Property tests for spec.md §8 invariants I1-I4.

use fastcond::gil::{ExclusionLock, FairnessMode};
use fastcond::StrongCondVar;
use parking_lot::Mutex;
use proptest::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;

proptest! {
    /// I1: signal never wakes more than one waiter, regardless of how many
    /// signals race with how many waiters.
    #[test]
    fn i1_signal_wakes_at_most_one(n_waiters in 1usize..8, n_signals in 1usize..8) {
        let mutex = Arc::new(Mutex::new(0u32));
        let cond = Arc::new(StrongCondVar::new());
        let woken = Arc::new(AtomicU32::new(0));

        let waiters: Vec<_> = (0..n_waiters)
            .map(|_| {
                let (m, c, w) = (Arc::clone(&mutex), Arc::clone(&cond), Arc::clone(&woken));
                thread::spawn(move || {
                    let mut guard = m.lock();
                    guard = c.wait(guard);
                    drop(guard);
                    w.fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect();

        // Give every waiter a chance to register before signalling.
        thread::sleep(std::time::Duration::from_millis(20));
        for _ in 0..n_signals {
            let guard = mutex.lock();
            cond.signal(&guard);
        }

        thread::sleep(std::time::Duration::from_millis(50));
        let expected = n_signals.min(n_waiters) as u32;
        prop_assert!(woken.load(Ordering::SeqCst) <= expected);

        // Let every thread finish so the next proptest case starts clean.
        let guard = mutex.lock();
        cond.broadcast(&guard);
        drop(guard);
        for w in waiters {
            let _ = w.join();
        }
    }

    /// I3/I4: a fair `ExclusionLock` never lets a thread acquire twice in a
    /// row while another thread is queued for it.
    #[test]
    fn i3_fair_mode_never_starves_a_queued_waiter(n_threads in 2usize..5) {
        let lock: Arc<ExclusionLock<()>> = Arc::new(ExclusionLock::with_mode((), FairnessMode::Fair));
        let progressed = Arc::new((0..n_threads).map(|_| AtomicU32::new(0)).collect::<Vec<_>>());

        let handles: Vec<_> = (0..n_threads)
            .map(|i| {
                let lock = Arc::clone(&lock);
                let progressed = Arc::clone(&progressed);
                thread::spawn(move || {
                    for _ in 0..50 {
                        let _guard = lock.acquire();
                        progressed[i].fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        for count in progressed.iter() {
            prop_assert_eq!(count.load(Ordering::SeqCst), 50);
        }
    }
}
