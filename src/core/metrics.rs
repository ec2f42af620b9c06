//! Normalized, read-only view of a phase's quantitative results.
//!
//! Snapshots are produced by the external execution layer and consumed
//! by the decision engine. The core never computes these numbers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One run of a parameter optimization job.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRun {
    pub parameters: BTreeMap<String, f64>,
    pub sharpe_ratio: f64,
}

/// Optimization results relative to the baseline backtest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptimizationMetrics {
    pub baseline_sharpe: f64,
    pub optimized_sharpe: f64,
    /// Externally computed parameter sensitivity, if the job reported one
    #[serde(default)]
    pub parameter_sensitivity: Option<f64>,
    /// Individual runs, used to estimate sensitivity and robust parameters
    #[serde(default)]
    pub runs: Vec<OptimizationRun>,
}

/// In-sample versus out-of-sample results of walk-forward validation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationMetrics {
    pub in_sample_sharpe: f64,
    pub out_of_sample_sharpe: f64,
    /// Externally computed robustness; derived as oos/is when absent
    #[serde(default)]
    pub robustness_score: Option<f64>,
}

/// Resources consumed while producing a snapshot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceUsage {
    pub backtests_run: u32,
    pub context_tokens: u64,
}

/// Quantitative results of one phase attempt.
///
/// # Example
///
/// ```rust
/// use hypothesis_flow::core::MetricsSnapshot;
///
/// let snapshot = MetricsSnapshot::new(0.85, 0.22, 67, 0.42).with_total_return(0.156);
/// assert_eq!(snapshot.total_trades, 67);
/// assert!(snapshot.optimization.is_none());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub sharpe_ratio: f64,
    /// Fraction in `0..=1`
    pub max_drawdown: f64,
    pub total_trades: u32,
    /// Fraction in `0..=1`
    pub win_rate: f64,
    #[serde(default)]
    pub total_return: Option<f64>,
    /// Largest share of total return contributed by a single trade
    #[serde(default)]
    pub largest_trade_impact: Option<f64>,
    #[serde(default)]
    pub optimization: Option<OptimizationMetrics>,
    #[serde(default)]
    pub validation: Option<ValidationMetrics>,
    #[serde(default)]
    pub usage: ResourceUsage,
}

impl MetricsSnapshot {
    pub fn new(sharpe_ratio: f64, max_drawdown: f64, total_trades: u32, win_rate: f64) -> Self {
        Self {
            sharpe_ratio,
            max_drawdown,
            total_trades,
            win_rate,
            total_return: None,
            largest_trade_impact: None,
            optimization: None,
            validation: None,
            usage: ResourceUsage::default(),
        }
    }

    /// Snapshot carrying only optimization results.
    pub fn for_optimization(baseline_sharpe: f64, optimized_sharpe: f64) -> Self {
        Self::new(optimized_sharpe, 0.0, 0, 0.0).with_optimization(OptimizationMetrics {
            baseline_sharpe,
            optimized_sharpe,
            parameter_sensitivity: None,
            runs: Vec::new(),
        })
    }

    /// Snapshot carrying only validation results.
    pub fn for_validation(in_sample_sharpe: f64, out_of_sample_sharpe: f64) -> Self {
        Self::new(out_of_sample_sharpe, 0.0, 0, 0.0).with_validation(ValidationMetrics {
            in_sample_sharpe,
            out_of_sample_sharpe,
            robustness_score: None,
        })
    }

    pub fn with_total_return(mut self, total_return: f64) -> Self {
        self.total_return = Some(total_return);
        self
    }

    pub fn with_largest_trade_impact(mut self, impact: f64) -> Self {
        self.largest_trade_impact = Some(impact);
        self
    }

    pub fn with_optimization(mut self, optimization: OptimizationMetrics) -> Self {
        self.optimization = Some(optimization);
        self
    }

    pub fn with_validation(mut self, validation: ValidationMetrics) -> Self {
        self.validation = Some(validation);
        self
    }

    pub fn with_usage(mut self, usage: ResourceUsage) -> Self {
        self.usage = usage;
        self
    }

    /// Name of the first NaN or infinite field, if any.
    ///
    /// JSON has no encoding for these values, so a snapshot carrying one
    /// could not be persisted.
    pub fn non_finite_field(&self) -> Option<String> {
        let finite = |v: f64| v.is_finite();
        let scalars = [
            ("sharpe_ratio", Some(self.sharpe_ratio)),
            ("max_drawdown", Some(self.max_drawdown)),
            ("win_rate", Some(self.win_rate)),
            ("total_return", self.total_return),
            ("largest_trade_impact", self.largest_trade_impact),
        ];
        if let Some((name, _)) = scalars
            .iter()
            .find(|(_, v)| v.is_some_and(|v| !finite(v)))
        {
            return Some((*name).to_string());
        }

        if let Some(opt) = &self.optimization {
            let fields = [
                ("optimization.baseline_sharpe", Some(opt.baseline_sharpe)),
                ("optimization.optimized_sharpe", Some(opt.optimized_sharpe)),
                ("optimization.parameter_sensitivity", opt.parameter_sensitivity),
            ];
            if let Some((name, _)) = fields.iter().find(|(_, v)| v.is_some_and(|v| !finite(v))) {
                return Some((*name).to_string());
            }
            for (i, run) in opt.runs.iter().enumerate() {
                if !finite(run.sharpe_ratio) {
                    return Some(format!("optimization.runs[{i}].sharpe_ratio"));
                }
                if let Some((key, _)) = run.parameters.iter().find(|(_, v)| !finite(**v)) {
                    return Some(format!("optimization.runs[{i}].parameters.{key}"));
                }
            }
        }

        let val = self.validation.as_ref()?;
        let fields = [
            ("validation.in_sample_sharpe", Some(val.in_sample_sharpe)),
            ("validation.out_of_sample_sharpe", Some(val.out_of_sample_sharpe)),
            ("validation.robustness_score", val.robustness_score),
        ];
        fields
            .iter()
            .find(|(_, v)| v.is_some_and(|v| !finite(v)))
            .map(|(name, _)| (*name).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_sections_default_when_missing_from_json() {
        let json = r#"{
            "sharpe_ratio": 1.2,
            "max_drawdown": 0.18,
            "total_trades": 120,
            "win_rate": 0.55
        }"#;
        let snapshot: MetricsSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot, MetricsSnapshot::new(1.2, 0.18, 120, 0.55));
        assert_eq!(snapshot.usage, ResourceUsage::default());
    }

    #[test]
    fn for_optimization_fills_the_section() {
        let snapshot = MetricsSnapshot::for_optimization(0.85, 1.15);
        let opt = snapshot.optimization.unwrap();
        assert_eq!(opt.baseline_sharpe, 0.85);
        assert_eq!(opt.optimized_sharpe, 1.15);
        assert!(opt.runs.is_empty());
    }

    #[test]
    fn non_finite_fields_are_named() {
        assert_eq!(MetricsSnapshot::new(1.0, 0.1, 50, 0.5).non_finite_field(), None);
        assert_eq!(
            MetricsSnapshot::new(f64::NAN, 0.0, 0, 0.0).non_finite_field().as_deref(),
            Some("sharpe_ratio")
        );
        assert_eq!(
            MetricsSnapshot::for_validation(1.0, f64::INFINITY)
                .non_finite_field()
                .as_deref(),
            Some("sharpe_ratio")
        );
        let mut snapshot = MetricsSnapshot::for_optimization(0.85, 1.0);
        if let Some(opt) = snapshot.optimization.as_mut() {
            opt.runs.push(OptimizationRun {
                parameters: BTreeMap::from([("rsi_period".to_string(), f64::NEG_INFINITY)]),
                sharpe_ratio: 1.0,
            });
        }
        assert_eq!(
            snapshot.non_finite_field().as_deref(),
            Some("optimization.runs[0].parameters.rsi_period")
        );
    }

    #[test]
    fn for_validation_fills_the_section() {
        let snapshot = MetricsSnapshot::for_validation(1.45, 1.28);
        let val = snapshot.validation.unwrap();
        assert_eq!(val.in_sample_sharpe, 1.45);
        assert_eq!(val.out_of_sample_sharpe, 1.28);
        assert!(val.robustness_score.is_none());
    }
}
