//! Phase transition history.
//!
//! Provides immutable tracking of the phases a hypothesis has moved
//! through. Pauses (an escalation that keeps the current phase) are not
//! transitions and never appear here.

use super::state::Phase;
use crate::decision::Decision;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of a single phase change and the decision that caused it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhaseTransition {
    /// The phase being left
    pub from: Phase,
    /// The phase being entered
    pub to: Phase,
    /// Verdict that drove the change (possibly forced by the limit guard)
    pub decision: Decision,
    /// Iteration number after the transition
    pub iteration: u32,
    /// When the transition occurred
    pub timestamp: DateTime<Utc>,
}

/// Ordered history of phase transitions.
///
/// `record` returns a new history with the transition appended; the
/// receiver is left untouched.
///
/// # Example
///
/// ```rust
/// use hypothesis_flow::core::{Phase, PhaseHistory, PhaseTransition};
/// use hypothesis_flow::decision::Decision;
/// use chrono::Utc;
///
/// let history = PhaseHistory::new().record(PhaseTransition {
///     from: Phase::Backtest,
///     to: Phase::Optimization,
///     decision: Decision::ProceedToOptimization,
///     iteration: 1,
///     timestamp: Utc::now(),
/// });
///
/// assert_eq!(history.get_path(), vec![&Phase::Backtest, &Phase::Optimization]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseHistory {
    transitions: Vec<PhaseTransition>,
}

impl PhaseHistory {
    /// Create a new empty history.
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
        }
    }

    /// Record a transition, returning a new history.
    pub fn record(&self, transition: PhaseTransition) -> Self {
        let mut transitions = self.transitions.clone();
        transitions.push(transition);
        Self { transitions }
    }

    /// Phases traversed in order: the first `from`, then every `to`.
    pub fn get_path(&self) -> Vec<&Phase> {
        let mut path = Vec::new();
        if let Some(first) = self.transitions.first() {
            path.push(&first.from);
        }
        for transition in &self.transitions {
            path.push(&transition.to);
        }
        path
    }

    /// Number of times `phase` was entered.
    pub fn entries_into(&self, phase: Phase) -> usize {
        self.transitions.iter().filter(|t| t.to == phase).count()
    }

    /// Time between the first and last transition, `None` when empty.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.transitions.first(), self.transitions.last()) {
            last.timestamp
                .signed_duration_since(first.timestamp)
                .to_std()
                .ok()
        } else {
            None
        }
    }

    /// Most recent transition.
    pub fn last(&self) -> Option<&PhaseTransition> {
        self.transitions.last()
    }

    /// All recorded transitions in order.
    pub fn transitions(&self) -> &[PhaseTransition] {
        &self.transitions
    }
}
