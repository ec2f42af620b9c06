//! Limit guard bounding autonomous operation.
//!
//! Every budget is checked on each step and all violations are
//! accumulated with Stillwater's `Validation` rather than stopping at the
//! first one. Any violation forces `ABANDON_HYPOTHESIS`.
//!
//! # Example
//!
//! ```rust
//! use hypothesis_flow::config::Limits;
//! use hypothesis_flow::core::Phase;
//! use hypothesis_flow::enforcement::{Counters, GuardContext, LimitGuard};
//!
//! let limits = Limits::default();
//! let counters = Counters::default();
//! let ctx = GuardContext {
//!     phase: Phase::Backtest,
//!     iteration: limits.max_iterations_per_hypothesis(),
//!     counters: &counters,
//!     limits: &limits,
//! };
//!
//! assert!(!LimitGuard::new().enforce(&ctx).is_success());
//! ```

mod counters;
pub mod rules;
pub mod violations;

pub use counters::Counters;
pub use rules::{GuardContext, LimitCheck, LimitGuard};
pub use violations::{ForcedDecision, LimitViolation};
