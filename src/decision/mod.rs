//! Decision engine: pure evaluation of phase metrics.
//!
//! Each metric phase has one evaluate function mapping
//! (metrics, thresholds, counters) to an [`Evaluation`]. The functions
//! read no clock, do no I/O, and return identical output for identical
//! input.
//!
//! # Example
//!
//! ```rust
//! use hypothesis_flow::config::ThresholdConfig;
//! use hypothesis_flow::core::MetricsSnapshot;
//! use hypothesis_flow::decision::{evaluate_backtest, AttemptBudget, Decision};
//!
//! let thresholds = ThresholdConfig::default();
//! let metrics = MetricsSnapshot::new(4.2, 0.05, 25, 0.88);
//! let eval = evaluate_backtest(&metrics, &thresholds, AttemptBudget::new(0, 2));
//!
//! assert_eq!(eval.decision, Decision::EscalateToHuman);
//! assert!(eval.rationale.contains("sharpe 4.2 > 3.0"));
//! assert_eq!(eval.confidence, 1.0);
//! ```

mod backtest;
mod optimization;
mod sensitivity;
mod validation;

pub use backtest::evaluate_backtest;
pub use optimization::{evaluate_optimization, improvement};
pub use sensitivity::{
    robust_parameters, top_quartile, Reported, ReportedOrDispersion, SensitivityEstimator,
    TopQuartileDispersion,
};
pub use validation::{degradation, evaluate_validation, robustness};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Closed set of routing verdicts.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    ProceedToImplementation,
    ProceedToBacktest,
    AbandonHypothesis,
    ProceedToOptimization,
    ProceedToValidation,
    EscalateToHuman,
    UseBaselineParams,
    ProceedToValidationWithParams,
    UseRobustParams,
    DeployStrategy,
    ProceedWithCaution,
    RetryOptimization,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProceedToImplementation => "PROCEED_TO_IMPLEMENTATION",
            Self::ProceedToBacktest => "PROCEED_TO_BACKTEST",
            Self::AbandonHypothesis => "ABANDON_HYPOTHESIS",
            Self::ProceedToOptimization => "PROCEED_TO_OPTIMIZATION",
            Self::ProceedToValidation => "PROCEED_TO_VALIDATION",
            Self::EscalateToHuman => "ESCALATE_TO_HUMAN",
            Self::UseBaselineParams => "USE_BASELINE_PARAMS",
            Self::ProceedToValidationWithParams => "PROCEED_TO_VALIDATION_WITH_PARAMS",
            Self::UseRobustParams => "USE_ROBUST_PARAMS",
            Self::DeployStrategy => "DEPLOY_STRATEGY",
            Self::ProceedWithCaution => "PROCEED_WITH_CAUTION",
            Self::RetryOptimization => "RETRY_OPTIMIZATION",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where in the workflow a decision was taken.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionPoint {
    BacktestEvaluation,
    OptimizationEvaluation,
    ValidationEvaluation,
    /// A verdict supplied directly by the orchestrator or a human
    ManualVerdict,
    /// A terminal decision forced by the limit guard
    LimitGuard,
}

/// Performance tier a backtest reached, ordered worst to best.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceTier {
    BelowMinimum,
    Marginal,
    OptimizationWorthy,
    ProductionReady,
    Exceptional,
}

/// Everything a decision looked at, kept verbatim in the audit log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionInputs {
    Backtest {
        sharpe_ratio: f64,
        max_drawdown: f64,
        total_trades: u32,
        win_rate: f64,
        largest_trade_impact: Option<f64>,
        optimization_attempts: u32,
        max_optimization_attempts: u32,
        tier: Option<PerformanceTier>,
    },
    Optimization {
        baseline_sharpe: Option<f64>,
        optimized_sharpe: Option<f64>,
        improvement: Option<f64>,
        parameter_sensitivity: Option<f64>,
        robust_parameters: BTreeMap<String, f64>,
    },
    Validation {
        in_sample_sharpe: Option<f64>,
        out_of_sample_sharpe: Option<f64>,
        degradation: Option<f64>,
        robustness: Option<f64>,
    },
    Verdict {
        supplied: Decision,
    },
    Limits {
        violations: Vec<String>,
        overridden: Decision,
    },
}

/// Outcome of one decision: verdict, rationale and confidence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub decision_point: DecisionPoint,
    pub decision: Decision,
    pub rationale: String,
    /// Within `[0, 1]`
    pub confidence: f64,
    pub options_considered: Vec<Decision>,
    pub inputs: DecisionInputs,
}

/// Ratios that cannot be computed from the reported metrics.
///
/// These never propagate out of the engine: they resolve to
/// `ESCALATE_TO_HUMAN` with the error text as rationale.
#[derive(Debug, Clone, Copy, Error, PartialEq)]
pub enum EvaluationError {
    #[error("improvement undefined: baseline sharpe is {baseline}")]
    UndefinedImprovement { baseline: f64 },

    #[error("degradation undefined: in-sample sharpe is {in_sample}")]
    UndefinedDegradation { in_sample: f64 },
}

/// Optimization attempts used so far against the configured maximum.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttemptBudget {
    pub used: u32,
    pub max: u32,
}

impl AttemptBudget {
    pub fn new(used: u32, max: u32) -> Self {
        Self { used, max }
    }

    pub fn remaining(&self) -> u32 {
        self.max.saturating_sub(self.used)
    }
}

/// Format a metric with two decimals, trimming zeros but keeping one.
pub(crate) fn num(value: f64) -> String {
    let s = format!("{value:.2}");
    match s.strip_suffix('0') {
        Some(trimmed) if !trimmed.ends_with('.') => trimmed.to_string(),
        _ => s,
    }
}

/// Format a fraction as a percentage with one decimal.
pub(crate) fn pct(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn num_keeps_one_decimal() {
        assert_eq!(num(4.2), "4.2");
        assert_eq!(num(3.0), "3.0");
        assert_eq!(num(0.85), "0.85");
        assert_eq!(num(1.453), "1.45");
        assert_eq!(num(-0.5), "-0.5");
    }

    #[test]
    fn pct_formats_fractions() {
        assert_eq!(pct(0.353), "35.3%");
        assert_eq!(pct(0.05), "5.0%");
    }

    #[test]
    fn decision_wire_names_match_display() {
        for decision in [
            Decision::AbandonHypothesis,
            Decision::ProceedToValidationWithParams,
            Decision::RetryOptimization,
        ] {
            let json = serde_json::to_string(&decision).unwrap();
            assert_eq!(json, format!("\"{decision}\""));
        }
    }

    #[test]
    fn attempt_budget_saturates() {
        assert_eq!(AttemptBudget::new(1, 2).remaining(), 1);
        assert_eq!(AttemptBudget::new(5, 2).remaining(), 0);
    }

    #[test]
    fn tiers_are_ordered() {
        assert!(PerformanceTier::BelowMinimum < PerformanceTier::Marginal);
        assert!(PerformanceTier::OptimizationWorthy < PerformanceTier::ProductionReady);
        assert!(PerformanceTier::ProductionReady < PerformanceTier::Exceptional);
    }
}
