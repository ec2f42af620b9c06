//! Limit checks and counter bookkeeping, accumulated with `Validation`.

use crate::config::Limits;
use crate::core::{Phase, ResourceUsage};
use crate::enforcement::counters::Counters;
use crate::enforcement::violations::{ForcedDecision, LimitViolation};
use crate::store::WorkflowState;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use tracing::warn;

/// Everything a limit check may look at.
#[derive(Clone, Copy, Debug)]
pub struct GuardContext<'a> {
    pub phase: Phase,
    pub iteration: u32,
    pub counters: &'a Counters,
    pub limits: &'a Limits,
}

impl<'a> GuardContext<'a> {
    pub fn of(state: &'a WorkflowState) -> Self {
        Self {
            phase: state.current_phase(),
            iteration: state.iteration(),
            counters: state.counters(),
            limits: state.limits(),
        }
    }
}

/// Type alias for limit check functions
pub type LimitCheck =
    Box<dyn Fn(&GuardContext<'_>) -> Validation<(), NonEmptyVec<LimitViolation>> + Send + Sync>;

/// Sole authority over the workflow counters and the budgets they are
/// measured against.
pub struct LimitGuard {
    extra_checks: Vec<LimitCheck>,
}

impl Default for LimitGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl LimitGuard {
    pub fn new() -> Self {
        Self {
            extra_checks: Vec::new(),
        }
    }

    /// Add a check that runs after the built-in budgets.
    pub fn require<F>(mut self, check: F) -> Self
    where
        F: Fn(&GuardContext<'_>) -> Validation<(), NonEmptyVec<LimitViolation>>
            + Send
            + Sync
            + 'static,
    {
        self.extra_checks.push(Box::new(check));
        self
    }

    /// Run every budget check, accumulating all violations.
    pub fn enforce(&self, ctx: &GuardContext<'_>) -> Validation<(), NonEmptyVec<LimitViolation>> {
        let limits = ctx.limits;
        let counters = ctx.counters;
        let in_optimization = ctx.phase == Phase::Optimization;

        let mut checks = vec![
            violation_if(
                ctx.iteration >= limits.max_iterations_per_hypothesis(),
                LimitViolation::IterationLimit {
                    iteration: ctx.iteration,
                    max: limits.max_iterations_per_hypothesis(),
                },
            ),
            violation_if(
                in_optimization
                    && counters.optimization_attempts >= limits.max_optimization_attempts(),
                LimitViolation::OptimizationAttempts {
                    attempts: counters.optimization_attempts,
                    max: limits.max_optimization_attempts(),
                },
            ),
            violation_if(
                in_optimization
                    && counters.backtests_in_optimization
                        > limits.max_backtests_per_optimization(),
                LimitViolation::BacktestBudget {
                    used: counters.backtests_in_optimization,
                    max: limits.max_backtests_per_optimization(),
                },
            ),
            violation_if(
                counters.context_tokens_used > limits.max_context_tokens(),
                LimitViolation::ContextBudget {
                    used: counters.context_tokens_used,
                    max: limits.max_context_tokens(),
                },
            ),
        ];

        for check in &self.extra_checks {
            checks.push(check(ctx));
        }

        Validation::all_vec(checks).map(|_| ())
    }

    /// Terminal phases are never checked.
    pub fn check(&self, state: &WorkflowState) -> Option<ForcedDecision> {
        let ctx = GuardContext::of(state);
        if ctx.phase.is_final() {
            return None;
        }
        match self.enforce(&ctx) {
            Validation::Success(()) => None,
            Validation::Failure(errors) => {
                let forced = ForcedDecision::abandon(errors.iter().cloned().collect());
                warn!(phase = %ctx.phase, iteration = ctx.iteration, reason = %forced.reason, "limit guard forcing abandonment");
                Some(forced)
            }
        }
    }

    /// Add the resources reported with a phase's metrics.
    pub fn charge(&self, counters: &Counters, usage: ResourceUsage, phase: Phase) -> Counters {
        let in_optimization = phase == Phase::Optimization;
        Counters {
            backtests_run: counters.backtests_run.saturating_add(usage.backtests_run),
            backtests_in_optimization: if in_optimization {
                counters
                    .backtests_in_optimization
                    .saturating_add(usage.backtests_run)
            } else {
                counters.backtests_in_optimization
            },
            context_tokens_used: counters
                .context_tokens_used
                .saturating_add(usage.context_tokens),
            ..*counters
        }
    }

    /// Count a completed evaluation of `phase`.
    pub fn tally_evaluation(&self, counters: &Counters, phase: Phase) -> Counters {
        if phase == Phase::Optimization {
            Counters {
                optimization_attempts: counters.optimization_attempts.saturating_add(1),
                ..*counters
            }
        } else {
            *counters
        }
    }

    /// Iteration and counters after moving `from` -> `to`.
    ///
    /// Only the optimization -> backtest loop starts a new iteration.
    /// Entering optimization opens a fresh per-optimization backtest budget.
    pub fn on_transition(
        &self,
        iteration: u32,
        counters: &Counters,
        from: Phase,
        to: Phase,
    ) -> (u32, Counters) {
        let iteration = if from == Phase::Optimization && to == Phase::Backtest {
            iteration.saturating_add(1)
        } else {
            iteration
        };
        let counters = if to == Phase::Optimization && from != Phase::Optimization {
            Counters {
                backtests_in_optimization: 0,
                ..*counters
            }
        } else {
            *counters
        };
        (iteration, counters)
    }
}

fn violation_if(
    violated: bool,
    violation: LimitViolation,
) -> Validation<(), NonEmptyVec<LimitViolation>> {
    if violated {
        Validation::fail(violation)
    } else {
        Validation::success(())
    }
}
