//! Backtest evaluation.

use super::{num, AttemptBudget, Decision, DecisionInputs, DecisionPoint, Evaluation, PerformanceTier};
use crate::config::{ThresholdConfig, TierThresholds};
use crate::core::MetricsSnapshot;
use tracing::debug;

const OPTIONS: [Decision; 4] = [
    Decision::EscalateToHuman,
    Decision::AbandonHypothesis,
    Decision::ProceedToValidation,
    Decision::ProceedToOptimization,
];

fn meets(metrics: &MetricsSnapshot, tier: &TierThresholds) -> bool {
    metrics.sharpe_ratio >= tier.sharpe_ratio
        && metrics.max_drawdown <= tier.max_drawdown
        && metrics.total_trades >= tier.min_trades
        && tier.win_rate.is_none_or(|w| metrics.win_rate >= w)
}

fn overfitting_signal(metrics: &MetricsSnapshot, thresholds: &ThresholdConfig) -> Option<String> {
    let signals = thresholds.overfitting_signals();
    if metrics.sharpe_ratio > signals.too_perfect_sharpe {
        return Some(format!(
            "sharpe {} > {}",
            num(metrics.sharpe_ratio),
            num(signals.too_perfect_sharpe)
        ));
    }
    if metrics.total_trades > 0 && metrics.total_trades < signals.too_few_trades {
        return Some(format!(
            "trades {} < {}, unreliable statistics",
            metrics.total_trades, signals.too_few_trades
        ));
    }
    if metrics.win_rate > signals.win_rate_too_high {
        return Some(format!(
            "win rate {} > {}",
            num(metrics.win_rate),
            num(signals.win_rate_too_high)
        ));
    }
    match metrics.largest_trade_impact {
        Some(impact) if impact > signals.max_single_trade_impact => Some(format!(
            "single trade impact {} > {}",
            num(impact),
            num(signals.max_single_trade_impact)
        )),
        _ => None,
    }
}

fn minimum_viable_failures(metrics: &MetricsSnapshot, tier: &TierThresholds) -> Vec<String> {
    let mut failures = Vec::new();
    if metrics.total_trades == 0 {
        failures.push(format!("no trades generated (trades 0 < {})", tier.min_trades));
    }
    if metrics.sharpe_ratio < tier.sharpe_ratio {
        failures.push(format!(
            "sharpe {} < {}",
            num(metrics.sharpe_ratio),
            num(tier.sharpe_ratio)
        ));
    }
    if metrics.max_drawdown > tier.max_drawdown {
        failures.push(format!(
            "drawdown {} > {}",
            num(metrics.max_drawdown),
            num(tier.max_drawdown)
        ));
    }
    if metrics.total_trades > 0 && metrics.total_trades < tier.min_trades {
        failures.push(format!(
            "trades {} < {}",
            metrics.total_trades, tier.min_trades
        ));
    }
    if let Some(win_rate) = tier.win_rate.filter(|w| metrics.win_rate < *w) {
        failures.push(format!(
            "win rate {} < {}",
            num(metrics.win_rate),
            num(win_rate)
        ));
    }
    failures
}

fn profile(metrics: &MetricsSnapshot) -> String {
    format!(
        "sharpe {}, drawdown {}, {} trades, win rate {}",
        num(metrics.sharpe_ratio),
        num(metrics.max_drawdown),
        metrics.total_trades,
        num(metrics.win_rate)
    )
}

/// Evaluate a backtest and route it.
///
/// Rules are applied in strict priority order, first match wins:
///
/// 1. overfitting signal: escalate with confidence 1.0
/// 2. below minimum viable, including no trades at all: abandon
/// 3. production ready: validate directly
/// 4. optimization worthy with attempts remaining: optimize
/// 5. otherwise: validate as marginal
pub fn evaluate_backtest(
    metrics: &MetricsSnapshot,
    thresholds: &ThresholdConfig,
    budget: AttemptBudget,
) -> Evaluation {
    let tier = if meets(metrics, thresholds.exceptional()) {
        PerformanceTier::Exceptional
    } else if meets(metrics, thresholds.production_ready()) {
        PerformanceTier::ProductionReady
    } else if meets(metrics, thresholds.optimization_worthy()) {
        PerformanceTier::OptimizationWorthy
    } else if meets(metrics, thresholds.minimum_viable()) {
        PerformanceTier::Marginal
    } else {
        PerformanceTier::BelowMinimum
    };

    let min = thresholds.minimum_viable();
    let (decision, rationale, confidence) = if let Some(signal) = overfitting_signal(metrics, thresholds) {
        (
            Decision::EscalateToHuman,
            format!("possible overfitting: {signal}"),
            1.0,
        )
    } else if metrics.total_trades == 0 || tier == PerformanceTier::BelowMinimum {
        let failures = minimum_viable_failures(metrics, min);
        let confidence = if metrics.total_trades == 0 { 1.0 } else { 0.9 };
        (
            Decision::AbandonHypothesis,
            format!("below minimum viable: {}", failures.join("; ")),
            confidence,
        )
    } else if tier >= PerformanceTier::ProductionReady {
        let confidence = if tier == PerformanceTier::Exceptional {
            0.95
        } else {
            0.85
        };
        (
            Decision::ProceedToValidation,
            format!(
                "production ready ({}), skipping optimization",
                profile(metrics)
            ),
            confidence,
        )
    } else if tier == PerformanceTier::OptimizationWorthy && budget.remaining() > 0 {
        (
            Decision::ProceedToOptimization,
            format!(
                "optimization worthy ({}), {} of {} optimization attempts remaining",
                profile(metrics),
                budget.remaining(),
                budget.max
            ),
            0.75,
        )
    } else if tier == PerformanceTier::OptimizationWorthy {
        (
            Decision::ProceedToValidation,
            format!(
                "optimization worthy ({}) but no optimization attempts remaining, validating as-is",
                profile(metrics)
            ),
            0.6,
        )
    } else {
        (
            Decision::ProceedToValidation,
            format!("marginal performance ({}), validating as-is", profile(metrics)),
            0.6,
        )
    };

    debug!(%decision, ?tier, sharpe = metrics.sharpe_ratio, trades = metrics.total_trades, "evaluated backtest");

    Evaluation {
        decision_point: DecisionPoint::BacktestEvaluation,
        decision,
        rationale,
        confidence,
        options_considered: OPTIONS.to_vec(),
        inputs: DecisionInputs::Backtest {
            sharpe_ratio: metrics.sharpe_ratio,
            max_drawdown: metrics.max_drawdown,
            total_trades: metrics.total_trades,
            win_rate: metrics.win_rate,
            largest_trade_impact: metrics.largest_trade_impact,
            optimization_attempts: budget.used,
            max_optimization_attempts: budget.max,
            tier: Some(tier),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(metrics: MetricsSnapshot) -> Evaluation {
        evaluate_backtest(&metrics, &ThresholdConfig::default(), AttemptBudget::new(0, 2))
    }

    #[test]
    fn decent_backtest_proceeds_to_optimization() {
        let e = eval(MetricsSnapshot::new(0.85, 0.22, 67, 0.42));
        assert_eq!(e.decision, Decision::ProceedToOptimization);
        assert_eq!(e.decision_point, DecisionPoint::BacktestEvaluation);
    }

    #[test]
    fn too_perfect_sharpe_escalates() {
        let e = eval(MetricsSnapshot::new(4.2, 0.05, 25, 0.88));
        assert_eq!(e.decision, Decision::EscalateToHuman);
        assert!(e.rationale.contains("sharpe 4.2 > 3.0"));
        assert_eq!(e.confidence, 1.0);
    }

    #[test]
    fn zero_trades_abandons_with_no_trades_rationale() {
        let e = eval(MetricsSnapshot::new(0.0, 0.0, 0, 0.0));
        assert_eq!(e.decision, Decision::AbandonHypothesis);
        assert!(e.rationale.contains("no trades generated"));
        assert!(e.rationale.contains("trades 0 < 30"));
        assert_eq!(e.confidence, 1.0);
    }

    #[test]
    fn too_perfect_sharpe_escalates_without_trades() {
        let e = eval(MetricsSnapshot::new(4.2, 0.05, 0, 0.88));
        assert_eq!(e.decision, Decision::EscalateToHuman);
        assert!(e.rationale.contains("sharpe 4.2 > 3.0"));
    }

    #[test]
    fn high_win_rate_escalates_without_trades() {
        let e = eval(MetricsSnapshot::new(1.0, 0.05, 0, 0.9));
        assert_eq!(e.decision, Decision::EscalateToHuman);
        assert!(e.rationale.contains("win rate 0.9 > 0.75"));
    }

    #[test]
    fn few_trades_escalates() {
        let e = eval(MetricsSnapshot::new(1.8, 0.15, 12, 0.67));
        assert_eq!(e.decision, Decision::EscalateToHuman);
        assert!(e.rationale.contains("trades 12 < 20"));
    }

    #[test]
    fn high_win_rate_escalates() {
        let e = eval(MetricsSnapshot::new(1.2, 0.15, 150, 0.8));
        assert_eq!(e.decision, Decision::EscalateToHuman);
        assert!(e.rationale.contains("win rate 0.8 > 0.75"));
    }

    #[test]
    fn dominant_single_trade_escalates_when_reported() {
        let e = eval(MetricsSnapshot::new(1.2, 0.15, 150, 0.5).with_largest_trade_impact(0.4));
        assert_eq!(e.decision, Decision::EscalateToHuman);
        assert!(e.rationale.contains("single trade impact"));
    }

    #[test]
    fn below_minimum_lists_every_failure() {
        let e = eval(MetricsSnapshot::new(0.3, 0.45, 25, 0.45));
        assert_eq!(e.decision, Decision::AbandonHypothesis);
        assert!(e.rationale.contains("sharpe 0.3 < 0.5"));
        assert!(e.rationale.contains("drawdown 0.45 > 0.4"));
        assert!(e.rationale.contains("trades 25 < 30"));
        assert_eq!(e.confidence, 0.9);
    }

    #[test]
    fn production_ready_skips_optimization() {
        let e = eval(MetricsSnapshot::new(1.45, 0.18, 120, 0.55));
        assert_eq!(e.decision, Decision::ProceedToValidation);
        assert!(e.rationale.starts_with("production ready"));
        assert!(matches!(
            e.inputs,
            DecisionInputs::Backtest {
                tier: Some(PerformanceTier::ProductionReady),
                ..
            }
        ));
    }

    #[test]
    fn production_ready_requires_win_rate() {
        let e = eval(MetricsSnapshot::new(1.45, 0.18, 120, 0.35));
        assert_eq!(e.decision, Decision::ProceedToOptimization);
    }

    #[test]
    fn exceptional_has_higher_confidence() {
        let e = eval(MetricsSnapshot::new(2.5, 0.1, 250, 0.6));
        assert_eq!(e.decision, Decision::ProceedToValidation);
        assert_eq!(e.confidence, 0.95);
    }

    #[test]
    fn marginal_proceeds_to_validation() {
        let e = eval(MetricsSnapshot::new(0.6, 0.3, 40, 0.45));
        assert_eq!(e.decision, Decision::ProceedToValidation);
        assert!(e.rationale.starts_with("marginal performance"));
    }

    #[test]
    fn exhausted_attempts_skip_optimization() {
        let metrics = MetricsSnapshot::new(0.85, 0.22, 67, 0.42);
        let e = evaluate_backtest(&metrics, &ThresholdConfig::default(), AttemptBudget::new(2, 2));
        assert_eq!(e.decision, Decision::ProceedToValidation);
        assert!(e.rationale.contains("no optimization attempts remaining"));
    }

    #[test]
    fn identical_inputs_produce_identical_output() {
        let metrics = MetricsSnapshot::new(0.85, 0.22, 67, 0.42);
        assert_eq!(eval(metrics.clone()), eval(metrics));
    }
}
