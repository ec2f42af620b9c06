//! Out-of-sample validation evaluation.

use super::{num, pct, Decision, DecisionInputs, DecisionPoint, Evaluation, EvaluationError};
use crate::config::ThresholdConfig;
use crate::core::MetricsSnapshot;
use tracing::debug;

const OPTIONS: [Decision; 4] = [
    Decision::AbandonHypothesis,
    Decision::DeployStrategy,
    Decision::ProceedWithCaution,
    Decision::EscalateToHuman,
];

fn in_sample_base(in_sample_sharpe: f64) -> Result<f64, EvaluationError> {
    if in_sample_sharpe == 0.0 || !in_sample_sharpe.is_finite() {
        Err(EvaluationError::UndefinedDegradation {
            in_sample: in_sample_sharpe,
        })
    } else {
        Ok(in_sample_sharpe)
    }
}

/// Relative drop from in-sample to out-of-sample sharpe, `(is - oos) / is`.
///
/// A negative in-sample sharpe is divided as is, so a losing in-sample
/// run never reads as a small degradation.
pub fn degradation(in_sample_sharpe: f64, out_of_sample_sharpe: f64) -> Result<f64, EvaluationError> {
    let base = in_sample_base(in_sample_sharpe)?;
    Ok((in_sample_sharpe - out_of_sample_sharpe) / base)
}

/// Ratio of out-of-sample to in-sample sharpe.
pub fn robustness(in_sample_sharpe: f64, out_of_sample_sharpe: f64) -> Result<f64, EvaluationError> {
    let base = in_sample_base(in_sample_sharpe)?;
    Ok(out_of_sample_sharpe / base)
}

/// Evaluate walk-forward validation and decide on deployment.
///
/// The robustness score reported by the execution layer is used when
/// present; otherwise it is derived as oos / is.
pub fn evaluate_validation(metrics: &MetricsSnapshot, thresholds: &ThresholdConfig) -> Evaluation {
    let bands = thresholds.validation();

    let Some(val) = metrics.validation.as_ref() else {
        return Evaluation {
            decision_point: DecisionPoint::ValidationEvaluation,
            decision: Decision::EscalateToHuman,
            rationale: "missing validation metrics".to_string(),
            confidence: 1.0,
            options_considered: OPTIONS.to_vec(),
            inputs: DecisionInputs::Validation {
                in_sample_sharpe: None,
                out_of_sample_sharpe: None,
                degradation: None,
                robustness: None,
            },
        };
    };

    let ratios = degradation(val.in_sample_sharpe, val.out_of_sample_sharpe).and_then(|d| {
        let r = match val.robustness_score {
            Some(score) => score,
            None => robustness(val.in_sample_sharpe, val.out_of_sample_sharpe)?,
        };
        Ok((d, r))
    });

    let (decision, rationale, confidence) = match ratios {
        Err(err) => (Decision::EscalateToHuman, err.to_string(), 1.0),
        Ok((d, r)) if d > bands.abandon_degradation || r < bands.min_robustness => (
            Decision::AbandonHypothesis,
            format!(
                "strategy does not generalize: degradation {}, robustness {} (limits {} / {})",
                pct(d),
                num(r),
                pct(bands.abandon_degradation),
                num(bands.min_robustness)
            ),
            0.9,
        ),
        Ok((d, r)) if d < bands.deploy_degradation && r > bands.deploy_robustness => (
            Decision::DeployStrategy,
            format!(
                "minimal degradation {}, robustness {}, ready for deployment",
                pct(d),
                num(r)
            ),
            0.85,
        ),
        Ok((d, r)) if d < bands.caution_degradation && r > bands.caution_robustness => (
            Decision::ProceedWithCaution,
            format!(
                "moderate degradation {}, robustness {}, deploy with close monitoring",
                pct(d),
                num(r)
            ),
            0.7,
        ),
        Ok((d, r)) => (
            Decision::EscalateToHuman,
            format!(
                "borderline validation: degradation {}, robustness {}",
                pct(d),
                num(r)
            ),
            0.5,
        ),
    };

    debug!(%decision, is = val.in_sample_sharpe, oos = val.out_of_sample_sharpe, "evaluated validation");

    let (degradation, robustness) = match ratios {
        Ok((d, r)) => (Some(d), Some(r)),
        Err(_) => (None, None),
    };

    Evaluation {
        decision_point: DecisionPoint::ValidationEvaluation,
        decision,
        rationale,
        confidence,
        options_considered: OPTIONS.to_vec(),
        inputs: DecisionInputs::Validation {
            in_sample_sharpe: Some(val.in_sample_sharpe),
            out_of_sample_sharpe: Some(val.out_of_sample_sharpe),
            degradation,
            robustness,
        },
    }
}
