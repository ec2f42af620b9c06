//! Construction-time checks for thresholds and limits.
//!
//! Checks return stillwater `Validation` values so that a malformed
//! document reports every problem at once instead of the first one.

use crate::config::error::{ConfigError, ConfigIssue};
use crate::config::{Limits, ThresholdConfig, TierThresholds};
use stillwater::validation::Validation;

type Check = Validation<(), Vec<ConfigIssue>>;

fn ensure<F>(ok: bool, field: &str, message: F) -> Check
where
    F: FnOnce() -> String,
{
    if ok {
        Validation::Success(())
    } else {
        Validation::Failure(vec![ConfigIssue::new(field, message())])
    }
}

fn fraction(field: &str, value: f64) -> Check {
    ensure((0.0..=1.0).contains(&value), field, || {
        format!("must be within [0, 1], got {value}")
    })
}

fn positive(field: &str, value: f64) -> Check {
    ensure(value.is_finite() && value > 0.0, field, || {
        format!("must be finite and positive, got {value}")
    })
}

fn tier_checks(name: &str, tier: &TierThresholds) -> Vec<Check> {
    let mut checks = vec![
        ensure(
            tier.sharpe_ratio.is_finite(),
            &format!("{name}.sharpe_ratio"),
            || format!("must be finite, got {}", tier.sharpe_ratio),
        ),
        ensure(
            tier.max_drawdown > 0.0 && tier.max_drawdown <= 1.0,
            &format!("{name}.max_drawdown"),
            || format!("must be within (0, 1], got {}", tier.max_drawdown),
        ),
    ];
    if let Some(win_rate) = tier.win_rate {
        checks.push(fraction(&format!("{name}.win_rate"), win_rate));
    }
    checks
}

fn not_below(lower: (&str, &TierThresholds), upper: (&str, &TierThresholds)) -> Check {
    ensure(
        upper.1.sharpe_ratio >= lower.1.sharpe_ratio,
        &format!("{}.sharpe_ratio", upper.0),
        || {
            format!(
                "must be >= {}.sharpe_ratio ({} < {})",
                lower.0, upper.1.sharpe_ratio, lower.1.sharpe_ratio
            )
        },
    )
}

fn finish(checks: Vec<Check>) -> Result<(), ConfigError> {
    match Validation::all_vec(checks) {
        Validation::Success(_) => Ok(()),
        Validation::Failure(issues) => Err(ConfigError::Invalid { issues }),
    }
}

/// Validate a threshold configuration, accumulating ALL issues.
pub(crate) fn validate_thresholds(config: &ThresholdConfig) -> Result<(), ConfigError> {
    let tiers = [
        ("minimum_viable", &config.minimum_viable),
        ("optimization_worthy", &config.optimization_worthy),
        ("production_ready", &config.production_ready),
        ("exceptional", &config.exceptional),
    ];

    let mut checks: Vec<Check> = tiers
        .iter()
        .flat_map(|(name, tier)| tier_checks(name, tier))
        .collect();

    for pair in tiers.windows(2) {
        checks.push(not_below(pair[0], pair[1]));
    }

    let signals = &config.overfitting_signals;
    checks.push(positive(
        "overfitting_signals.too_perfect_sharpe",
        signals.too_perfect_sharpe,
    ));
    checks.push(fraction(
        "overfitting_signals.win_rate_too_high",
        signals.win_rate_too_high,
    ));
    checks.push(fraction(
        "overfitting_signals.max_single_trade_impact",
        signals.max_single_trade_impact,
    ));
    checks.push(ensure(
        signals.too_perfect_sharpe > config.minimum_viable.sharpe_ratio,
        "overfitting_signals.too_perfect_sharpe",
        || "must exceed minimum_viable.sharpe_ratio".to_string(),
    ));

    let opt = &config.optimization;
    checks.push(ensure(
        opt.min_improvement.is_finite() && opt.max_improvement.is_finite(),
        "optimization",
        || "improvement bounds must be finite".to_string(),
    ));
    checks.push(ensure(
        opt.min_improvement < opt.max_improvement,
        "optimization.min_improvement",
        || {
            format!(
                "must be below max_improvement ({} >= {})",
                opt.min_improvement, opt.max_improvement
            )
        },
    ));
    checks.push(positive(
        "optimization.max_parameter_sensitivity",
        opt.max_parameter_sensitivity,
    ));

    let val = &config.validation;
    for (field, value) in [
        ("validation.deploy_degradation", val.deploy_degradation),
        ("validation.caution_degradation", val.caution_degradation),
        ("validation.abandon_degradation", val.abandon_degradation),
        ("validation.min_robustness", val.min_robustness),
        ("validation.caution_robustness", val.caution_robustness),
        ("validation.deploy_robustness", val.deploy_robustness),
    ] {
        checks.push(fraction(field, value));
    }
    checks.push(ensure(
        val.deploy_degradation <= val.caution_degradation
            && val.caution_degradation <= val.abandon_degradation,
        "validation",
        || "degradation bounds must satisfy deploy <= caution <= abandon".to_string(),
    ));
    checks.push(ensure(
        val.min_robustness <= val.caution_robustness
            && val.caution_robustness <= val.deploy_robustness,
        "validation",
        || "robustness bounds must satisfy min <= caution <= deploy".to_string(),
    ));

    finish(checks)
}

/// Validate limits: every budget must allow at least one unit of work.
pub(crate) fn validate_limits(limits: &Limits) -> Result<(), ConfigError> {
    let checks = vec![
        ensure(
            limits.max_iterations_per_hypothesis > 0,
            "limits.max_iterations_per_hypothesis",
            || "must be greater than zero".to_string(),
        ),
        ensure(
            limits.max_optimization_attempts > 0,
            "limits.max_optimization_attempts",
            || "must be greater than zero".to_string(),
        ),
        ensure(
            limits.max_backtests_per_optimization > 0,
            "limits.max_backtests_per_optimization",
            || "must be greater than zero".to_string(),
        ),
        ensure(
            limits.max_context_tokens > 0,
            "limits.max_context_tokens",
            || "must be greater than zero".to_string(),
        ),
    ];
    finish(checks)
}
