//! A portable strong condition variable and a fair mutual-exclusion lock
//! built on top of it.
//!
//! - [`platform`] — the counting-semaphore/mutex/clock facade everything
//!   else is built from ([MODULE A]).
//! - [`condvar`] — [`condvar::StrongCondVar`], a condition variable that
//!   never lets a signal be stolen by a thread that wasn't already waiting
//!   ([MODULE B]).
//! - [`gil`] — [`gil::ExclusionLock`], a mutex whose acquisition order can be
//!   made fair across contending threads ([MODULE C]).

pub mod condvar;
pub mod config;
pub mod error;
pub mod gil;
pub mod identity;
pub mod platform;

pub use condvar::{StrongCondVar, WaitOutcome};
pub use config::Config;
pub use error::{Result, SyncError};
pub use gil::{CondVarBackend, ExclusionGuard, ExclusionLock, FairnessMode, NativeCondVar};
pub use platform::Deadline;
