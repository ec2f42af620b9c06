//! Append-only audit log of decisions.

use super::WorkflowState;
use crate::core::Phase;
use crate::decision::{num, pct, Decision, DecisionInputs, DecisionPoint, Evaluation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// What eventually happened after a decision was taken.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionOutcome {
    #[default]
    Pending,
    Success,
    Failure,
}

impl fmt::Display for DecisionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failure => "failure",
        };
        f.write_str(s)
    }
}

/// One decision with everything it looked at.
///
/// Entries are never edited after they are appended, except for the
/// one-time backfill of `outcome`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecisionLogEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub iteration: u32,
    pub phase: Phase,
    pub decision_point: DecisionPoint,
    pub inputs: DecisionInputs,
    pub options_considered: Vec<Decision>,
    pub decision: Decision,
    pub rationale: String,
    pub confidence: f64,
    #[serde(default)]
    pub outcome: DecisionOutcome,
}

impl DecisionLogEntry {
    /// Log entry for an evaluation taken in `phase`.
    pub fn from_evaluation(
        evaluation: Evaluation,
        phase: Phase,
        iteration: u32,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            iteration,
            phase,
            decision_point: evaluation.decision_point,
            inputs: evaluation.inputs,
            options_considered: evaluation.options_considered,
            decision: evaluation.decision,
            rationale: evaluation.rationale,
            confidence: evaluation.confidence,
            outcome: DecisionOutcome::Pending,
        }
    }
}

fn key_metrics(inputs: &DecisionInputs) -> String {
    match inputs {
        DecisionInputs::Backtest {
            sharpe_ratio,
            max_drawdown,
            total_trades,
            ..
        } => format!(
            "sharpe {}, drawdown {}, trades {}",
            num(*sharpe_ratio),
            pct(*max_drawdown),
            total_trades
        ),
        DecisionInputs::Optimization {
            baseline_sharpe: Some(baseline),
            optimized_sharpe: Some(optimized),
            improvement,
            ..
        } => match improvement {
            Some(imp) => format!(
                "sharpe {} -> {}, improvement {}",
                num(*baseline),
                num(*optimized),
                pct(*imp)
            ),
            None => format!("sharpe {} -> {}", num(*baseline), num(*optimized)),
        },
        DecisionInputs::Validation {
            in_sample_sharpe: Some(is),
            out_of_sample_sharpe: Some(oos),
            degradation,
            ..
        } => match degradation {
            Some(d) => format!(
                "sharpe {} in-sample, {} out-of-sample, degradation {}",
                num(*is),
                num(*oos),
                pct(*d)
            ),
            None => format!("sharpe {} in-sample, {} out-of-sample", num(*is), num(*oos)),
        },
        DecisionInputs::Optimization { .. } | DecisionInputs::Validation { .. } => {
            "metrics missing".to_string()
        }
        DecisionInputs::Verdict { .. } => "manual verdict".to_string(),
        DecisionInputs::Limits { violations, .. } => violations.join("; "),
    }
}

/// Deterministic one-line summary, suitable as a commit message subject.
///
/// # Example
///
/// ```rust
/// use chrono::Utc;
/// use hypothesis_flow::config::ThresholdConfig;
/// use hypothesis_flow::core::{MetricsSnapshot, Phase};
/// use hypothesis_flow::decision::{evaluate_backtest, AttemptBudget};
/// use hypothesis_flow::store::{summary_line, DecisionLogEntry};
///
/// let metrics = MetricsSnapshot::new(0.85, 0.22, 67, 0.42);
/// let eval = evaluate_backtest(&metrics, &ThresholdConfig::default(), AttemptBudget::new(0, 2));
/// let entry = DecisionLogEntry::from_evaluation(eval, Phase::Backtest, 1, Utc::now());
///
/// assert_eq!(
///     summary_line(&entry),
///     "backtest: PROCEED_TO_OPTIMIZATION (sharpe 0.85, drawdown 22.0%, trades 67) iteration 1"
/// );
/// ```
pub fn summary_line(entry: &DecisionLogEntry) -> String {
    format!(
        "{}: {} ({}) iteration {}",
        entry.phase.name(),
        entry.decision,
        key_metrics(&entry.inputs),
        entry.iteration
    )
}

/// Render the decision log as a markdown document, one section per entry.
pub fn render_markdown(state: &WorkflowState) -> String {
    let hypothesis = state.hypothesis();
    let mut out = format!(
        "# Decisions: {}\n\n- hypothesis: `{}`\n- status: {}\n- phase: {}\n- iteration: {}\n",
        hypothesis.name(),
        hypothesis.id(),
        hypothesis.status(),
        state.current_phase(),
        state.iteration()
    );

    for (index, entry) in state.decision_log().iter().enumerate() {
        let options = entry
            .options_considered
            .iter()
            .map(Decision::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!(
            "\n## {}. {} at {} (iteration {})\n\n\
             - decision: **{}**\n\
             - recorded: {}\n\
             - confidence: {}\n\
             - inputs: {}\n\
             - options considered: {}\n\
             - outcome: {}\n\n\
             {}\n",
            index + 1,
            entry.phase.name(),
            display_point(entry.decision_point),
            entry.iteration,
            entry.decision,
            entry.timestamp.to_rfc3339(),
            num(entry.confidence),
            key_metrics(&entry.inputs),
            options,
            entry.outcome,
            entry.rationale
        ));
    }
    out
}

fn display_point(point: DecisionPoint) -> &'static str {
    match point {
        DecisionPoint::BacktestEvaluation => "backtest evaluation",
        DecisionPoint::OptimizationEvaluation => "optimization evaluation",
        DecisionPoint::ValidationEvaluation => "validation evaluation",
        DecisionPoint::ManualVerdict => "manual verdict",
        DecisionPoint::LimitGuard => "limit guard",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThresholdConfig;
    use crate::core::MetricsSnapshot;
    use crate::decision::{evaluate_optimization, evaluate_validation};

    fn entry(evaluation: Evaluation, phase: Phase) -> DecisionLogEntry {
        DecisionLogEntry::from_evaluation(evaluation, phase, 2, Utc::now())
    }

    #[test]
    fn new_entries_are_pending() {
        let eval = evaluate_validation(
            &MetricsSnapshot::for_validation(1.45, 1.28),
            &ThresholdConfig::default(),
        );
        let e = entry(eval, Phase::Validation);
        assert_eq!(e.outcome, DecisionOutcome::Pending);
        assert_eq!(e.decision, Decision::DeployStrategy);
    }

    #[test]
    fn summary_names_optimization_improvement() {
        let eval = evaluate_optimization(
            &MetricsSnapshot::for_optimization(0.85, 1.15),
            &ThresholdConfig::default(),
            None,
        );
        let line = summary_line(&entry(eval, Phase::Optimization));
        assert_eq!(
            line,
            "optimization: ESCALATE_TO_HUMAN (sharpe 0.85 -> 1.15, improvement 35.3%) iteration 2"
        );
    }

    #[test]
    fn summary_is_deterministic() {
        let eval = evaluate_validation(
            &MetricsSnapshot::for_validation(1.45, 1.28),
            &ThresholdConfig::default(),
        );
        let a = entry(eval.clone(), Phase::Validation);
        let b = entry(eval, Phase::Validation);
        assert_ne!(a.id, b.id);
        assert_eq!(summary_line(&a), summary_line(&b));
    }

    #[test]
    fn summary_lists_limit_violations() {
        let eval = Evaluation {
            decision_point: DecisionPoint::LimitGuard,
            decision: Decision::AbandonHypothesis,
            rationale: "iteration limit reached (3 >= 3)".to_string(),
            confidence: 1.0,
            options_considered: vec![Decision::AbandonHypothesis],
            inputs: DecisionInputs::Limits {
                violations: vec!["iteration limit reached (3 >= 3)".to_string()],
                overridden: Decision::ProceedToOptimization,
            },
        };
        let line = summary_line(&entry(eval, Phase::Backtest));
        assert!(line.contains("ABANDON_HYPOTHESIS (iteration limit reached"));
    }

    #[test]
    fn outcome_serializes_in_snake_case() {
        let json = serde_json::to_string(&DecisionOutcome::Success).unwrap();
        assert_eq!(json, "\"success\"");
    }
}
