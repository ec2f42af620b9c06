//! Limit violations and the terminal decision they force.

use crate::decision::Decision;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A budget bounding autonomous operation was exhausted.
#[derive(Debug, Clone, Error, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitViolation {
    #[error("iteration limit reached ({iteration} >= {max})")]
    IterationLimit { iteration: u32, max: u32 },

    #[error("optimization attempt limit reached ({attempts} >= {max})")]
    OptimizationAttempts { attempts: u32, max: u32 },

    #[error("backtest budget per optimization exceeded ({used} > {max})")]
    BacktestBudget { used: u32, max: u32 },

    #[error("context budget exhausted ({used} > {max} tokens)")]
    ContextBudget { used: u64, max: u64 },
}

/// Terminal decision imposed by the limit guard.
///
/// This is not an error: it is logged like any other decision and
/// overrides whatever verdict the engine or caller produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForcedDecision {
    pub decision: Decision,
    pub reason: String,
    pub violations: Vec<LimitViolation>,
}

impl ForcedDecision {
    /// Abandonment citing every violation, in check order.
    pub fn abandon(violations: Vec<LimitViolation>) -> Self {
        let reason = violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Self {
            decision: Decision::AbandonHypothesis,
            reason,
            violations,
        }
    }
}
