//! Parameter sensitivity estimation.
//!
//! How fragile an optimum is has no single agreed formula, so the
//! estimate is a pluggable [`SensitivityEstimator`]. Any
//! `Fn(&OptimizationMetrics) -> Option<f64>` closure is an estimator.

use crate::core::{OptimizationMetrics, OptimizationRun};
use std::collections::BTreeMap;

/// Assigns a sensitivity score to an optimization result.
///
/// `None` means the score cannot be determined; the sensitivity
/// override is then skipped.
pub trait SensitivityEstimator: Send + Sync {
    fn estimate(&self, metrics: &OptimizationMetrics) -> Option<f64>;
}

impl<F> SensitivityEstimator for F
where
    F: Fn(&OptimizationMetrics) -> Option<f64> + Send + Sync,
{
    fn estimate(&self, metrics: &OptimizationMetrics) -> Option<f64> {
        self(metrics)
    }
}

/// Uses the value computed by the optimization job.
#[derive(Clone, Copy, Debug, Default)]
pub struct Reported;

impl SensitivityEstimator for Reported {
    fn estimate(&self, metrics: &OptimizationMetrics) -> Option<f64> {
        metrics.parameter_sensitivity
    }
}

/// Coefficient of variation of sharpe across the top-quartile runs.
#[derive(Clone, Copy, Debug, Default)]
pub struct TopQuartileDispersion;

impl SensitivityEstimator for TopQuartileDispersion {
    fn estimate(&self, metrics: &OptimizationMetrics) -> Option<f64> {
        let top = top_quartile(&metrics.runs);
        if top.len() < 2 {
            return None;
        }
        let n = top.len() as f64;
        let mean = top.iter().map(|r| r.sharpe_ratio).sum::<f64>() / n;
        if mean == 0.0 || !mean.is_finite() {
            return None;
        }
        let variance = top
            .iter()
            .map(|r| (r.sharpe_ratio - mean).powi(2))
            .sum::<f64>()
            / n;
        Some(variance.sqrt() / mean.abs())
    }
}

/// Reported value when present, top-quartile dispersion otherwise.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReportedOrDispersion;

impl SensitivityEstimator for ReportedOrDispersion {
    fn estimate(&self, metrics: &OptimizationMetrics) -> Option<f64> {
        Reported
            .estimate(metrics)
            .or_else(|| TopQuartileDispersion.estimate(metrics))
    }
}

/// Best quarter of the runs by sharpe (at least one run when any exist).
pub fn top_quartile(runs: &[OptimizationRun]) -> Vec<&OptimizationRun> {
    let mut sorted: Vec<&OptimizationRun> = runs.iter().collect();
    sorted.sort_by(|a, b| b.sharpe_ratio.total_cmp(&a.sharpe_ratio));
    let keep = runs.len().div_ceil(4);
    sorted.truncate(keep);
    sorted
}

fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Per-parameter median over the top-quartile runs.
///
/// A parameter missing from some runs is the median of the runs that
/// report it.
pub fn robust_parameters(runs: &[OptimizationRun]) -> BTreeMap<String, f64> {
    let top = top_quartile(runs);
    let mut samples: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for run in &top {
        for (name, value) in &run.parameters {
            samples.entry(name.as_str()).or_default().push(*value);
        }
    }
    samples
        .into_iter()
        .filter_map(|(name, values)| median(values).map(|m| (name.to_string(), m)))
        .collect()
}
