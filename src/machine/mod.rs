//! Phase state machine.
//!
//! The machine is the only place a [`WorkflowState`] changes phase. Each
//! call runs the limit guard, applies the transition table, updates the
//! counters through the guard, records history and the audit entry, and
//! returns the next snapshot together with the [`NextAction`] for the
//! orchestrator.
//!
//! # Example
//!
//! ```rust
//! use hypothesis_flow::config::{Limits, ThresholdConfig};
//! use hypothesis_flow::core::{Hypothesis, MetricsSnapshot, Phase};
//! use hypothesis_flow::decision::{Decision, Reported};
//! use hypothesis_flow::machine::{advance, step};
//! use hypothesis_flow::store::WorkflowState;
//!
//! let state = WorkflowState::create(
//!     Hypothesis::new("RSI mean reversion", "buy oversold", "overreaction"),
//!     ThresholdConfig::default(),
//!     Limits::default(),
//! );
//! let state = advance(&state, Decision::ProceedToImplementation).unwrap().state;
//! let state = advance(&state, Decision::ProceedToBacktest).unwrap().state;
//!
//! let outcome = step(&state, MetricsSnapshot::new(0.85, 0.22, 67, 0.42), &Reported).unwrap();
//! assert_eq!(outcome.next_phase, Phase::Optimization);
//! assert_eq!(outcome.next_action.command.as_deref(), Some("/qc-optimize"));
//! ```

mod action;
mod transition;

pub use action::NextAction;
pub use transition::{legal_decisions, next_phase, TransitionError};

use crate::core::{HypothesisStatus, MetricsSnapshot, Phase, PhaseTransition};
use crate::decision::{
    evaluate_backtest, evaluate_optimization, evaluate_validation, AttemptBudget, Decision,
    DecisionInputs, DecisionPoint, Evaluation, SensitivityEstimator,
};
use crate::enforcement::{ForcedDecision, LimitGuard};
use crate::store::{DecisionLogEntry, WorkflowState};
use thiserror::Error;
use tracing::{info, warn};

/// Errors that can occur when driving the workflow
#[derive(Debug, Error, PartialEq)]
pub enum MachineError {
    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("No evaluator for phase '{phase}', supply a verdict instead")]
    NoEvaluator { phase: Phase },

    #[error("Workflow already finished in phase '{phase}'")]
    Finished { phase: Phase },

    #[error("Metrics field '{field}' is not a finite number")]
    InvalidMetrics { field: String },
}

/// Outcome of one machine call.
///
/// Every halt, forced or not, carries the audit entry that explains it.
#[derive(Clone, Debug, PartialEq)]
pub struct Advance {
    pub state: WorkflowState,
    pub next_phase: Phase,
    pub next_action: NextAction,
    pub entry: DecisionLogEntry,
    /// Set when the limit guard overrode the verdict
    pub forced: Option<ForcedDecision>,
}

/// Drives workflow states with a given limit guard.
#[derive(Default)]
pub struct Machine {
    guard: LimitGuard,
}

impl Machine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_guard(guard: LimitGuard) -> Self {
        Self { guard }
    }

    /// Apply a verdict supplied by the orchestrator or a human.
    ///
    /// An illegal verdict is rejected before the guard runs; a legal one
    /// may still be overridden by a forced abandonment.
    pub fn advance(&self, state: &WorkflowState, decision: Decision) -> Result<Advance, MachineError> {
        let phase = state.current_phase();
        next_phase(phase, decision)?;

        let forced = self.guard.check(state);
        let evaluation = match &forced {
            Some(f) => forced_evaluation(f, decision),
            None => Evaluation {
                decision_point: DecisionPoint::ManualVerdict,
                decision,
                rationale: format!("verdict {decision} supplied in {phase}"),
                confidence: 1.0,
                options_considered: legal_decisions(phase),
                inputs: DecisionInputs::Verdict { supplied: decision },
            },
        };
        self.apply(state.clone(), evaluation, forced)
    }

    /// Evaluate the metrics of the current phase and advance on the verdict.
    ///
    /// Resource usage is charged before the guard runs, so a step that
    /// exhausts a budget is itself the one that abandons. A snapshot with
    /// a NaN or infinite field is rejected before anything is charged.
    pub fn step<E>(
        &self,
        state: &WorkflowState,
        metrics: MetricsSnapshot,
        estimator: &E,
    ) -> Result<Advance, MachineError>
    where
        E: SensitivityEstimator + ?Sized,
    {
        let phase = state.current_phase();
        if phase.is_final() {
            return Err(MachineError::Finished { phase });
        }
        if let Some(field) = metrics.non_finite_field() {
            return Err(MachineError::InvalidMetrics { field });
        }

        let charged = WorkflowState {
            counters: self.guard.charge(state.counters(), metrics.usage, phase),
            ..state.clone()
        };
        let evaluation = evaluate(&charged, &metrics, estimator)?;
        let forced = self.guard.check(&charged);
        let evaluation = match &forced {
            Some(f) => forced_evaluation(f, evaluation.decision),
            None => evaluation,
        };

        let recorded =
            charged.record_phase_result(phase, metrics, evaluation.decision, evaluation.rationale.clone());
        let tallied = WorkflowState {
            counters: self.guard.tally_evaluation(recorded.counters(), phase),
            ..recorded
        };
        self.apply(tallied, evaluation, forced)
    }

    fn apply(
        &self,
        state: WorkflowState,
        evaluation: Evaluation,
        forced: Option<ForcedDecision>,
    ) -> Result<Advance, MachineError> {
        let from = state.current_phase();
        let decision = evaluation.decision;
        let to = next_phase(from, decision)?;
        let now = state.tick();

        let (iteration, counters) =
            self.guard
                .on_transition(state.iteration(), state.counters(), from, to);

        let history = if to != from {
            info!(%from, %to, %decision, iteration, "phase transition");
            state.history().record(PhaseTransition {
                from,
                to,
                decision,
                iteration,
                timestamp: now,
            })
        } else {
            warn!(phase = %from, rationale = %evaluation.rationale, "escalated to human");
            state.history().clone()
        };

        let hypothesis = match terminal_status(to, decision) {
            Some(status) => state.hypothesis().with_status(status),
            None => state.hypothesis().clone(),
        };

        let entry = DecisionLogEntry::from_evaluation(evaluation, from, state.iteration(), now);
        let next_action =
            NextAction::after(from, to, decision, &entry.rationale, state.autonomy_mode());

        let state = WorkflowState {
            current_phase: to,
            iteration,
            counters,
            history,
            hypothesis,
            ..state
        }
        .append_decision(entry.clone());

        Ok(Advance {
            state,
            next_phase: to,
            next_action,
            entry,
            forced,
        })
    }
}

/// Apply a verdict with the default limit guard.
pub fn advance(state: &WorkflowState, decision: Decision) -> Result<Advance, MachineError> {
    Machine::new().advance(state, decision)
}

/// Evaluate and advance with the default limit guard.
pub fn step<E>(state: &WorkflowState, metrics: MetricsSnapshot, estimator: &E) -> Result<Advance, MachineError>
where
    E: SensitivityEstimator + ?Sized,
{
    Machine::new().step(state, metrics, estimator)
}

fn evaluate<E>(
    state: &WorkflowState,
    metrics: &MetricsSnapshot,
    estimator: &E,
) -> Result<Evaluation, MachineError>
where
    E: SensitivityEstimator + ?Sized,
{
    let thresholds = state.thresholds();
    match state.current_phase() {
        Phase::Backtest => {
            let budget = AttemptBudget::new(
                state.counters().optimization_attempts(),
                state.limits().max_optimization_attempts(),
            );
            Ok(evaluate_backtest(metrics, thresholds, budget))
        }
        Phase::Optimization => {
            let sensitivity = metrics
                .optimization
                .as_ref()
                .and_then(|opt| estimator.estimate(opt));
            Ok(evaluate_optimization(metrics, thresholds, sensitivity))
        }
        Phase::Validation => Ok(evaluate_validation(metrics, thresholds)),
        phase => Err(MachineError::NoEvaluator { phase }),
    }
}

fn forced_evaluation(forced: &ForcedDecision, overridden: Decision) -> Evaluation {
    Evaluation {
        decision_point: DecisionPoint::LimitGuard,
        decision: forced.decision,
        rationale: forced.reason.clone(),
        confidence: 1.0,
        options_considered: vec![forced.decision],
        inputs: DecisionInputs::Limits {
            violations: forced.violations.iter().map(ToString::to_string).collect(),
            overridden,
        },
    }
}

fn terminal_status(to: Phase, decision: Decision) -> Option<HypothesisStatus> {
    match (to, decision) {
        (Phase::Abandoned, _) => Some(HypothesisStatus::Abandoned),
        (Phase::Complete, Decision::DeployStrategy) => Some(HypothesisStatus::Deployed),
        (Phase::Complete, _) => Some(HypothesisStatus::Validated),
        _ => None,
    }
}
