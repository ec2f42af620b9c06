//! Core workflow types.
//!
//! This module contains the plain data of the research workflow:
//! - Workflow phases
//! - Immutable phase history
//! - Hypothesis identity and archive records
//! - Metrics snapshots produced by the execution layer
//!
//! Nothing here performs I/O or reads the clock except where a
//! constructor documents it.

mod history;
mod hypothesis;
mod metrics;
mod state;

pub use history::{PhaseHistory, PhaseTransition};
pub use hypothesis::{Hypothesis, HypothesisHistoryEntry, HypothesisStatus};
pub use metrics::{
    MetricsSnapshot, OptimizationMetrics, OptimizationRun, ResourceUsage, ValidationMetrics,
};
pub use state::Phase;
