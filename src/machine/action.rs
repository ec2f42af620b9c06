//! Next command for the orchestrator.

use crate::config::AutonomyMode;
use crate::core::Phase;
use crate::decision::Decision;
use serde::{Deserialize, Serialize};

/// What the orchestrator should run next, and whether to wait for a human first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextAction {
    /// `None` when nothing should run automatically
    pub command: Option<String>,
    pub reason: String,
    pub wait_for_user: bool,
}

fn command_for(to: Phase, decision: Decision) -> Option<&'static str> {
    match to {
        Phase::Research | Phase::Implementation | Phase::Abandoned => Some("/qc-init"),
        Phase::Backtest => Some("/qc-backtest"),
        Phase::Optimization => Some("/qc-optimize"),
        Phase::Validation => Some(match decision {
            Decision::UseBaselineParams => "/qc-validate --use-baseline",
            Decision::ProceedToValidationWithParams => "/qc-validate --use-optimized",
            Decision::UseRobustParams => "/qc-validate --use-robust",
            _ => "/qc-validate",
        }),
        Phase::Complete => None,
    }
}

fn pauses(mode: AutonomyMode, to: Phase) -> bool {
    match mode {
        AutonomyMode::Full => false,
        AutonomyMode::Medium => to == Phase::Validation || to.is_final(),
        AutonomyMode::Minimal => true,
    }
}

impl NextAction {
    /// Action after `decision` moved the workflow from `from` to `to`.
    ///
    /// Escalations always pause with no command, whatever the mode.
    pub fn after(
        from: Phase,
        to: Phase,
        decision: Decision,
        rationale: &str,
        mode: AutonomyMode,
    ) -> Self {
        if decision == Decision::EscalateToHuman {
            return Self {
                command: None,
                reason: format!("human review required in {from}: {rationale}"),
                wait_for_user: true,
            };
        }

        let reason = match to {
            Phase::Abandoned => format!("hypothesis abandoned: {rationale}; start the next hypothesis"),
            Phase::Complete => format!("{rationale}; document the strategy and prepare deployment"),
            _ => format!("{from} -> {to}: {rationale}"),
        };

        Self {
            command: command_for(to, decision).map(str::to_string),
            reason,
            wait_for_user: pauses(mode, to),
        }
    }
}
