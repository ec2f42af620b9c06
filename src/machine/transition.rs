//! Legal phase transitions.

use crate::core::Phase;
use crate::decision::Decision;
use thiserror::Error;

/// Errors that can occur when applying a decision to a phase
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Decision {decision} is not legal in phase '{from}'")]
    InvalidTransition { from: Phase, decision: Decision },

    #[error("Phase '{phase}' is terminal, cannot apply {decision}")]
    TerminalPhase { phase: Phase, decision: Decision },
}

/// Phase entered when `decision` is taken in `from`.
///
/// `ESCALATE_TO_HUMAN` keeps the current phase: the workflow pauses
/// instead of moving.
///
/// # Example
///
/// ```rust
/// use hypothesis_flow::core::Phase;
/// use hypothesis_flow::decision::Decision;
/// use hypothesis_flow::machine::next_phase;
///
/// assert_eq!(
///     next_phase(Phase::Backtest, Decision::ProceedToOptimization),
///     Ok(Phase::Optimization)
/// );
/// assert!(next_phase(Phase::Research, Decision::DeployStrategy).is_err());
/// ```
pub fn next_phase(from: Phase, decision: Decision) -> Result<Phase, TransitionError> {
    use Decision::*;

    if from.is_final() {
        return Err(TransitionError::TerminalPhase {
            phase: from,
            decision,
        });
    }

    let to = match (from, decision) {
        (_, AbandonHypothesis) => Phase::Abandoned,
        (_, EscalateToHuman) => from,
        (Phase::Research, ProceedToImplementation) => Phase::Implementation,
        (Phase::Implementation, ProceedToBacktest) => Phase::Backtest,
        (Phase::Backtest, ProceedToOptimization) => Phase::Optimization,
        (Phase::Backtest, ProceedToValidation) => Phase::Validation,
        (Phase::Optimization, ProceedToBacktest) => Phase::Backtest,
        (
            Phase::Optimization,
            UseBaselineParams | ProceedToValidationWithParams | UseRobustParams,
        ) => Phase::Validation,
        (Phase::Validation, DeployStrategy | ProceedWithCaution) => Phase::Complete,
        (Phase::Validation, RetryOptimization) => Phase::Optimization,
        _ => return Err(TransitionError::InvalidTransition { from, decision }),
    };
    Ok(to)
}

/// Decisions accepted in `phase`, in declaration order.
pub fn legal_decisions(phase: Phase) -> Vec<Decision> {
    ALL_DECISIONS
        .into_iter()
        .filter(|d| next_phase(phase, *d).is_ok())
        .collect()
}

const ALL_DECISIONS: [Decision; 12] = [
    Decision::ProceedToImplementation,
    Decision::ProceedToBacktest,
    Decision::AbandonHypothesis,
    Decision::ProceedToOptimization,
    Decision::ProceedToValidation,
    Decision::EscalateToHuman,
    Decision::UseBaselineParams,
    Decision::ProceedToValidationWithParams,
    Decision::UseRobustParams,
    Decision::DeployStrategy,
    Decision::ProceedWithCaution,
    Decision::RetryOptimization,
];
