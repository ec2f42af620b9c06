//! Optimization evaluation.

use super::sensitivity::robust_parameters;
use super::{num, pct, Decision, DecisionInputs, DecisionPoint, Evaluation, EvaluationError};
use crate::config::ThresholdConfig;
use crate::core::MetricsSnapshot;
use std::collections::BTreeMap;
use tracing::debug;

const OPTIONS: [Decision; 4] = [
    Decision::UseRobustParams,
    Decision::UseBaselineParams,
    Decision::EscalateToHuman,
    Decision::ProceedToValidationWithParams,
];

/// Relative sharpe improvement of the optimized parameters,
/// `(optimized - baseline) / baseline`.
///
/// The denominator keeps its sign, so any change from a losing baseline
/// reads as a negative improvement and keeps the baseline parameters.
pub fn improvement(baseline_sharpe: f64, optimized_sharpe: f64) -> Result<f64, EvaluationError> {
    if baseline_sharpe == 0.0 || !baseline_sharpe.is_finite() || !optimized_sharpe.is_finite() {
        return Err(EvaluationError::UndefinedImprovement {
            baseline: baseline_sharpe,
        });
    }
    Ok((optimized_sharpe - baseline_sharpe) / baseline_sharpe)
}

/// Evaluate an optimization job against its baseline.
///
/// A parameter sensitivity above the configured maximum overrides every
/// other rule: a fragile optimum is routed to robust (median top-quartile)
/// parameters. `sensitivity` is supplied by a
/// [`SensitivityEstimator`](super::SensitivityEstimator).
pub fn evaluate_optimization(
    metrics: &MetricsSnapshot,
    thresholds: &ThresholdConfig,
    sensitivity: Option<f64>,
) -> Evaluation {
    let bounds = thresholds.optimization();

    let Some(opt) = metrics.optimization.as_ref() else {
        return Evaluation {
            decision_point: DecisionPoint::OptimizationEvaluation,
            decision: Decision::EscalateToHuman,
            rationale: "missing optimization metrics".to_string(),
            confidence: 1.0,
            options_considered: OPTIONS.to_vec(),
            inputs: DecisionInputs::Optimization {
                baseline_sharpe: None,
                optimized_sharpe: None,
                improvement: None,
                parameter_sensitivity: sensitivity,
                robust_parameters: BTreeMap::new(),
            },
        };
    };

    let improvement = improvement(opt.baseline_sharpe, opt.optimized_sharpe);
    let fragile = sensitivity.filter(|s| *s > bounds.max_parameter_sensitivity);
    let robust = if fragile.is_some() {
        robust_parameters(&opt.runs)
    } else {
        BTreeMap::new()
    };

    let (decision, rationale, confidence) = match (fragile, &improvement) {
        (Some(s), _) => (
            Decision::UseRobustParams,
            format!(
                "parameter sensitivity {} > {}, using median of top-quartile parameters",
                num(s),
                num(bounds.max_parameter_sensitivity)
            ),
            0.8,
        ),
        (None, Err(err)) => (Decision::EscalateToHuman, err.to_string(), 1.0),
        (None, Ok(imp)) if *imp < 0.0 => (
            Decision::UseBaselineParams,
            format!(
                "optimization degraded performance ({}), keeping baseline parameters",
                pct(*imp)
            ),
            0.9,
        ),
        (None, Ok(imp)) if *imp < bounds.min_improvement => (
            Decision::UseBaselineParams,
            format!(
                "minimal improvement ({} < {}), keeping baseline parameters",
                pct(*imp),
                pct(bounds.min_improvement)
            ),
            0.85,
        ),
        (None, Ok(imp)) if *imp > bounds.max_improvement => (
            Decision::EscalateToHuman,
            format!(
                "excessive improvement ({} > {}), high overfitting risk",
                pct(*imp),
                pct(bounds.max_improvement)
            ),
            0.9,
        ),
        (None, Ok(imp)) => (
            Decision::ProceedToValidationWithParams,
            format!(
                "reasonable improvement ({}, sharpe {} -> {}), validating optimized parameters",
                pct(*imp),
                num(opt.baseline_sharpe),
                num(opt.optimized_sharpe)
            ),
            0.75,
        ),
    };

    debug!(%decision, improvement = ?improvement.as_ref().ok(), ?sensitivity, "evaluated optimization");

    Evaluation {
        decision_point: DecisionPoint::OptimizationEvaluation,
        decision,
        rationale,
        confidence,
        options_considered: OPTIONS.to_vec(),
        inputs: DecisionInputs::Optimization {
            baseline_sharpe: Some(opt.baseline_sharpe),
            optimized_sharpe: Some(opt.optimized_sharpe),
            improvement: improvement.ok(),
            parameter_sensitivity: sensitivity,
            robust_parameters: robust,
        },
    }
}
