//! Runtime configuration (AMBIENT STACK, SPEC_FULL.md).
//!
//! Environment-variable names follow the `FASTCOND_*` convention used by
//! `examples/original_source/fastcond/strongtest.c` for its own run-time
//! toggles, adapted to the knobs this crate actually exposes.

use crate::gil::FairnessMode;
use std::env;

/// Process-wide defaults for newly constructed [`crate::gil::ExclusionLock`]
/// values. A library crate has no business reading the environment on its
/// own initiative, so `Config` is opt-in: callers who want env-driven
/// defaults ask for them explicitly via [`Config::from_env`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub mode: FairnessMode,
    /// Whether the anti-steal branch in `StrongCondVar::wait` should yield
    /// the scheduler before returning a spurious wakeup (spec.md §4.B).
    /// Disabling this is only useful for measuring the cost of the yield
    /// itself; correctness does not depend on it.
    pub yield_on_steal: bool,
}

impl Config {
    /// Reads `FASTCOND_MODE` (`naive` | `greedy` | `fair`, case-insensitive)
    /// and `FASTCOND_YIELD_ON_STEAL` (`0` | `1`), falling back to the
    /// compiled-in defaults for anything unset or unrecognized.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = env::var("FASTCOND_MODE") {
            match raw.to_ascii_lowercase().as_str() {
                "naive" => config.mode = FairnessMode::Naive,
                "greedy" => config.mode = FairnessMode::Greedy,
                "fair" => config.mode = FairnessMode::Fair,
                other => log::warn!("ignoring unrecognized FASTCOND_MODE={other:?}"),
            }
        }
        if let Ok(raw) = env::var("FASTCOND_YIELD_ON_STEAL") {
            match raw.as_str() {
                "0" => config.yield_on_steal = false,
                "1" => config.yield_on_steal = true,
                other => log::warn!("ignoring unrecognized FASTCOND_YIELD_ON_STEAL={other:?}"),
            }
        }
        config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: FairnessMode::default(),
            yield_on_steal: true,
        }
    }
}
