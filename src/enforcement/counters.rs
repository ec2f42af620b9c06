//! Consumption counters tracked against `Limits`.

use serde::{Deserialize, Serialize};

/// Work consumed on one hypothesis so far.
///
/// Counters only change through [`LimitGuard`](super::LimitGuard).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub(crate) optimization_attempts: u32,
    pub(crate) backtests_in_optimization: u32,
    pub(crate) backtests_run: u32,
    pub(crate) context_tokens_used: u64,
}

impl Counters {
    /// Completed optimization evaluations.
    pub fn optimization_attempts(&self) -> u32 {
        self.optimization_attempts
    }

    /// Backtests consumed by the optimization currently in progress.
    pub fn backtests_in_optimization(&self) -> u32 {
        self.backtests_in_optimization
    }

    /// Backtests consumed over the hypothesis lifetime.
    pub fn backtests_run(&self) -> u32 {
        self.backtests_run
    }

    pub fn context_tokens_used(&self) -> u64 {
        self.context_tokens_used
    }
}
