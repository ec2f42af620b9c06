//! Property-based tests for the decision engine, limit guard and store.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated inputs.

use hypothesis_flow::config::{Limits, ThresholdConfig};
use hypothesis_flow::core::{Hypothesis, MetricsSnapshot, Phase};
use hypothesis_flow::decision::{
    evaluate_backtest, evaluate_optimization, evaluate_validation, AttemptBudget, Decision,
    DecisionInputs, PerformanceTier, Reported,
};
use hypothesis_flow::machine::{advance, step};
use hypothesis_flow::store::WorkflowState;
use proptest::prelude::*;

prop_compose! {
    fn arbitrary_snapshot()(
        sharpe in -2.0f64..5.0,
        drawdown in 0.0f64..1.0,
        trades in 0u32..400,
        win_rate in 0.0f64..1.0,
    ) -> MetricsSnapshot {
        MetricsSnapshot::new(sharpe, drawdown, trades, win_rate)
    }
}

prop_compose! {
    fn arbitrary_attempts()(max in 1u32..5)(used in 0..=max, max in Just(max)) -> AttemptBudget {
        AttemptBudget::new(used, max)
    }
}

fn tier_of(metrics: &MetricsSnapshot) -> Option<PerformanceTier> {
    let eval = evaluate_backtest(metrics, &ThresholdConfig::default(), AttemptBudget::new(0, 2));
    match eval.inputs {
        DecisionInputs::Backtest { tier, .. } => tier,
        _ => None,
    }
}

/// Orders backtest verdicts from worst to best outlook.
fn verdict_rank(metrics: &MetricsSnapshot) -> u8 {
    let eval = evaluate_backtest(metrics, &ThresholdConfig::default(), AttemptBudget::new(0, 2));
    let tier = match eval.inputs {
        DecisionInputs::Backtest { tier, .. } => tier,
        _ => None,
    };
    match (eval.decision, tier) {
        (Decision::AbandonHypothesis, _) => 0,
        (Decision::ProceedToValidation, Some(t)) if t < PerformanceTier::OptimizationWorthy => 1,
        (Decision::ProceedToOptimization, _) => 2,
        (Decision::ProceedToValidation, _) => 3,
        (other, _) => panic!("unexpected backtest verdict {other}"),
    }
}

fn backtest_state(iteration: u32) -> WorkflowState {
    let state = WorkflowState::create(
        Hypothesis::new("momentum", "12-1 momentum", "trend persistence"),
        ThresholdConfig::default(),
        Limits::default(),
    );
    let state = advance(&state, Decision::ProceedToImplementation).unwrap().state;
    let mut state = advance(&state, Decision::ProceedToBacktest).unwrap().state;
    // Walk the optimization loop until the requested iteration.
    while state.iteration() < iteration {
        let opt = advance(&state, Decision::ProceedToOptimization).unwrap().state;
        state = advance(&opt, Decision::ProceedToBacktest).unwrap().state;
    }
    state
}

proptest! {
    #[test]
    fn zero_trades_abandon_below_the_overfitting_ceiling(
        sharpe in -2.0f64..=3.0,
        drawdown in 0.0f64..1.0,
        win_rate in 0.0f64..=0.75,
        budget in arbitrary_attempts(),
    ) {
        let metrics = MetricsSnapshot::new(sharpe, drawdown, 0, win_rate);
        let eval = evaluate_backtest(&metrics, &ThresholdConfig::default(), budget);
        prop_assert_eq!(eval.decision, Decision::AbandonHypothesis);
        prop_assert!(!eval.rationale.contains("unreliable statistics"));
        prop_assert!(eval.rationale.contains("trades 0 < 30"));
    }

    #[test]
    fn too_perfect_sharpe_escalates(
        sharpe in 3.0001f64..50.0,
        drawdown in 0.0f64..1.0,
        trades in 0u32..1000,
        win_rate in 0.0f64..1.0,
        budget in arbitrary_attempts(),
    ) {
        let metrics = MetricsSnapshot::new(sharpe, drawdown, trades, win_rate);
        let eval = evaluate_backtest(&metrics, &ThresholdConfig::default(), budget);
        prop_assert_eq!(eval.decision, Decision::EscalateToHuman);
        prop_assert_eq!(eval.confidence, 1.0);
    }

    #[test]
    fn backtest_evaluation_is_idempotent(metrics in arbitrary_snapshot(), budget in arbitrary_attempts()) {
        let thresholds = ThresholdConfig::default();
        let first = evaluate_backtest(&metrics, &thresholds, budget);
        let second = evaluate_backtest(&metrics, &thresholds, budget);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn optimization_and_validation_are_idempotent(
        baseline in -2.0f64..3.0,
        optimized in -2.0f64..3.0,
        sensitivity in proptest::option::of(0.0f64..1.0),
    ) {
        let thresholds = ThresholdConfig::default();
        let opt = MetricsSnapshot::for_optimization(baseline, optimized);
        prop_assert_eq!(
            evaluate_optimization(&opt, &thresholds, sensitivity),
            evaluate_optimization(&opt, &thresholds, sensitivity)
        );
        let val = MetricsSnapshot::for_validation(baseline, optimized);
        prop_assert_eq!(evaluate_validation(&val, &thresholds), evaluate_validation(&val, &thresholds));
    }

    #[test]
    fn higher_sharpe_never_lowers_the_tier(
        low in -1.0f64..3.0,
        bump in 0.0f64..3.0,
        drawdown in 0.0f64..1.0,
        trades in 1u32..400,
        win_rate in 0.0f64..1.0,
    ) {
        let high = (low + bump).min(3.0);
        let worse = tier_of(&MetricsSnapshot::new(low, drawdown, trades, win_rate));
        let better = tier_of(&MetricsSnapshot::new(high, drawdown, trades, win_rate));
        prop_assert!(better >= worse);
    }

    #[test]
    fn higher_sharpe_never_worsens_the_verdict(
        low in -1.0f64..3.0,
        bump in 0.0f64..3.0,
        drawdown in 0.0f64..1.0,
        trades in 20u32..400,
        win_rate in 0.0f64..=0.75,
    ) {
        let high = (low + bump).min(3.0);
        let worse = verdict_rank(&MetricsSnapshot::new(low, drawdown, trades, win_rate));
        let better = verdict_rank(&MetricsSnapshot::new(high, drawdown, trades, win_rate));
        prop_assert!(better >= worse, "rank {} dropped to {}", worse, better);
    }

    #[test]
    fn iteration_limit_overrides_any_backtest_verdict(metrics in arbitrary_snapshot()) {
        let state = backtest_state(Limits::default().max_iterations_per_hypothesis());
        let outcome = step(&state, metrics, &Reported).unwrap();
        prop_assert_eq!(outcome.next_phase, Phase::Abandoned);
        prop_assert!(outcome.entry.rationale.contains("iteration limit reached"));
    }

    #[test]
    fn json_round_trip_preserves_the_log(
        snapshots in prop::collection::vec(arbitrary_snapshot(), 1..4)
    ) {
        let mut state = backtest_state(1);
        for metrics in snapshots {
            let recorded = state.record_phase_result(
                Phase::Backtest,
                metrics,
                Decision::EscalateToHuman,
                "under review",
            );
            state = advance(&recorded, Decision::EscalateToHuman).unwrap().state;
        }

        let restored = WorkflowState::from_json(&state.to_json().unwrap()).unwrap();
        let ids: Vec<_> = state.decision_log().iter().map(|e| e.id).collect();
        let restored_ids: Vec<_> = restored.decision_log().iter().map(|e| e.id).collect();
        prop_assert_eq!(ids, restored_ids);
        prop_assert_eq!(restored, state);
    }
}
