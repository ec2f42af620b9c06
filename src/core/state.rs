//! Workflow phases.
//!
//! A phase is a named pipeline stage. All methods here are pure: they
//! describe a position in the research workflow without side effects.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered stage of the research workflow.
///
/// `Complete` and `Abandoned` are terminal; no decision may leave them.
///
/// # Example
///
/// ```rust
/// use hypothesis_flow::core::Phase;
///
/// assert_eq!(Phase::Backtest.name(), "backtest");
/// assert!(Phase::Abandoned.is_final());
/// assert!(Phase::Abandoned.is_error());
/// assert!(!Phase::Complete.is_error());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Research,
    Implementation,
    Backtest,
    Optimization,
    Validation,
    Complete,
    Abandoned,
}

impl Phase {
    /// Every phase in pipeline order.
    pub const ALL: [Phase; 7] = [
        Phase::Research,
        Phase::Implementation,
        Phase::Backtest,
        Phase::Optimization,
        Phase::Validation,
        Phase::Complete,
        Phase::Abandoned,
    ];

    /// Whether the decision engine evaluates metrics in this phase.
    pub fn is_metric_phase(&self) -> bool {
        matches!(
            self,
            Phase::Backtest | Phase::Optimization | Phase::Validation
        )
    }

    /// Name used in logs and rationales.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Research => "research",
            Self::Implementation => "implementation",
            Self::Backtest => "backtest",
            Self::Optimization => "optimization",
            Self::Validation => "validation",
            Self::Complete => "complete",
            Self::Abandoned => "abandoned",
        }
    }

    /// Terminal phases accept no further decisions.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Complete | Self::Abandoned)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Abandoned)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_name_returns_correct_value() {
        assert_eq!(Phase::Research.name(), "research");
        assert_eq!(Phase::Implementation.name(), "implementation");
        assert_eq!(Phase::Optimization.name(), "optimization");
        assert_eq!(Phase::Validation.to_string(), "validation");
    }

    #[test]
    fn is_final_identifies_terminal_phases() {
        let terminal: Vec<Phase> = Phase::ALL.into_iter().filter(|p| p.is_final()).collect();
        assert_eq!(terminal, vec![Phase::Complete, Phase::Abandoned]);
    }

    #[test]
    fn only_abandoned_is_an_error() {
        assert!(Phase::Abandoned.is_error());
        assert!(Phase::ALL
            .iter()
            .filter(|p| **p != Phase::Abandoned)
            .all(|p| !p.is_error()));
    }

    #[test]
    fn metric_phases_are_backtest_optimization_validation() {
        assert!(!Phase::Research.is_metric_phase());
        assert!(!Phase::Implementation.is_metric_phase());
        assert!(Phase::Backtest.is_metric_phase());
        assert!(Phase::Optimization.is_metric_phase());
        assert!(Phase::Validation.is_metric_phase());
        assert!(!Phase::Complete.is_metric_phase());
    }

    #[test]
    fn phase_serializes_as_snake_case() {
        let json = serde_json::to_string(&Phase::Optimization).unwrap();
        assert_eq!(json, "\"optimization\"");
        let back: Phase = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Phase::Optimization);
    }
}
