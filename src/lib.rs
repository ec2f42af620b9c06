//! Hypothesis-flow: decision engine and state machine for trading research
//!
//! A hypothesis moves through research, implementation, backtest,
//! optimization and validation until it is deployed or abandoned. The
//! crate follows a "pure core, imperative shell" split: evaluating
//! metrics and choosing the next phase are pure functions, while running
//! backtests and persisting state are left to the caller.
//!
//! # Core Concepts
//!
//! - **Decision engine**: maps phase metrics and thresholds to a verdict
//!   with rationale and confidence
//! - **Limit guard**: accumulates every budget violation and forces
//!   abandonment when any budget is exhausted
//! - **State machine**: the single table of legal phase transitions
//! - **Store**: the workflow document with its append-only decision log
//!
//! # Example
//!
//! ```rust
//! use hypothesis_flow::config::{Limits, ThresholdConfig};
//! use hypothesis_flow::core::{Hypothesis, MetricsSnapshot, Phase};
//! use hypothesis_flow::decision::{Decision, Reported};
//! use hypothesis_flow::machine::{advance, step};
//! use hypothesis_flow::store::{summary_line, WorkflowState};
//!
//! let state = WorkflowState::create(
//!     Hypothesis::new("Low-vol anomaly", "long lowest-decile volatility", "leverage aversion"),
//!     ThresholdConfig::default(),
//!     Limits::default(),
//! );
//! let state = advance(&state, Decision::ProceedToImplementation).unwrap().state;
//! let state = advance(&state, Decision::ProceedToBacktest).unwrap().state;
//!
//! // Too few trades and a suspiciously high sharpe: pause for review.
//! let outcome = step(&state, MetricsSnapshot::new(4.2, 0.05, 25, 0.88), &Reported).unwrap();
//! assert_eq!(outcome.next_phase, Phase::Backtest);
//! assert!(outcome.next_action.wait_for_user);
//! assert!(summary_line(&outcome.entry).starts_with("backtest: ESCALATE_TO_HUMAN"));
//! ```

pub mod config;
pub mod core;
pub mod decision;
pub mod enforcement;
pub mod machine;
pub mod store;

// Re-export commonly used types
pub use crate::config::{AutonomyMode, Limits, ThresholdConfig, WorkflowConfig};
pub use crate::core::{Hypothesis, MetricsSnapshot, Phase};
pub use crate::decision::{Decision, Evaluation};
pub use crate::enforcement::LimitGuard;
pub use crate::machine::{advance, step, Advance, Machine, MachineError, NextAction};
pub use crate::store::{StoreError, WorkflowState};
