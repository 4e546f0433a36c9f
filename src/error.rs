//! Coarse error kinds for the public API.
//!
//! Matches spec.md §7: `init`, `signal`, `broadcast`, and `post` errors are
//! returned unchanged; `Timeout` is not an error (see [`crate::condvar::WaitOutcome`])
//! and `Interrupted` never crosses the public API — it is absorbed as a
//! spurious wakeup inside the wait loop.

use thiserror::Error;

/// Coarse failure modes surfaced by the platform facade and condition variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SyncError {
    /// The platform allocator refused to create a semaphore or mutex.
    #[error("resource exhausted while allocating a synchronization primitive")]
    ResourceExhausted,
    /// A `destroy` call observed a handle that was already invalid.
    #[error("invalid handle passed to destroy")]
    InvalidHandle,
}

pub type Result<T> = std::result::Result<T, SyncError>;
