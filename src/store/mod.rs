//! Workflow state document and decision audit log.
//!
//! A [`WorkflowState`] is the single source of truth for one hypothesis.
//! Every operation returns a new snapshot and leaves the receiver
//! untouched; timestamps never move backwards across snapshots.

pub mod audit;
pub mod error;
mod persist;

pub use audit::{render_markdown, summary_line, DecisionLogEntry, DecisionOutcome};
pub use error::StoreError;

use crate::config::{AutonomyMode, Limits, ThresholdConfig};
use crate::core::{Hypothesis, HypothesisHistoryEntry, MetricsSnapshot, Phase, PhaseHistory};
use crate::decision::Decision;
use crate::enforcement::Counters;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Schema version written into every document
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Result of one attempt at a metric phase.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhaseResult {
    pub phase: Phase,
    /// 1-based; a retry of the same phase records `attempt + 1`
    pub attempt: u32,
    /// False when the phase paused for human review
    pub completed: bool,
    pub timestamp: DateTime<Utc>,
    pub metrics: MetricsSnapshot,
    pub decision: Decision,
    pub rationale: String,
}

/// Persisted state of a research workflow.
///
/// # Example
///
/// ```rust
/// use hypothesis_flow::config::{Limits, ThresholdConfig};
/// use hypothesis_flow::core::{Hypothesis, Phase};
/// use hypothesis_flow::store::WorkflowState;
///
/// let state = WorkflowState::create(
///     Hypothesis::new("RSI mean reversion", "buy oversold", "overreaction"),
///     ThresholdConfig::default(),
///     Limits::default(),
/// );
///
/// assert_eq!(state.current_phase(), Phase::Research);
/// assert_eq!(state.iteration(), 1);
/// assert!(state.decision_log().is_empty());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    // Must stay the first field: binary loading reads it as a prefix.
    pub(crate) schema_version: String,
    #[serde(default)]
    pub(crate) autonomy_mode: AutonomyMode,
    pub(crate) hypothesis: Hypothesis,
    pub(crate) current_phase: Phase,
    pub(crate) iteration: u32,
    pub(crate) thresholds: ThresholdConfig,
    pub(crate) limits: Limits,
    #[serde(default)]
    pub(crate) counters: Counters,
    #[serde(default)]
    pub(crate) phase_results: Vec<PhaseResult>,
    #[serde(default)]
    pub(crate) decision_log: Vec<DecisionLogEntry>,
    #[serde(default)]
    pub(crate) history: PhaseHistory,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl WorkflowState {
    /// Fresh state in the research phase, iteration 1.
    pub fn create(hypothesis: Hypothesis, thresholds: ThresholdConfig, limits: Limits) -> Self {
        let now = Utc::now();
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            autonomy_mode: AutonomyMode::default(),
            hypothesis,
            current_phase: Phase::Research,
            iteration: 1,
            thresholds,
            limits,
            counters: Counters::default(),
            phase_results: Vec::new(),
            decision_log: Vec::new(),
            history: PhaseHistory::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_autonomy_mode(&self, mode: AutonomyMode) -> Self {
        Self {
            autonomy_mode: mode,
            updated_at: self.tick(),
            ..self.clone()
        }
    }

    /// Append a phase result; the attempt number follows earlier results
    /// for the same phase.
    pub fn record_phase_result(
        &self,
        phase: Phase,
        metrics: MetricsSnapshot,
        decision: Decision,
        rationale: impl Into<String>,
    ) -> Self {
        let now = self.tick();
        let attempt = self.phase_results(phase).count() as u32 + 1;
        let mut phase_results = self.phase_results.clone();
        phase_results.push(PhaseResult {
            phase,
            attempt,
            completed: decision != Decision::EscalateToHuman,
            timestamp: now,
            metrics,
            decision,
            rationale: rationale.into(),
        });
        Self {
            phase_results,
            updated_at: now,
            ..self.clone()
        }
    }

    /// Append an audit entry. Its timestamp is clamped so the log stays
    /// ordered.
    pub fn append_decision(&self, entry: DecisionLogEntry) -> Self {
        let now = entry.timestamp.max(self.updated_at);
        let mut decision_log = self.decision_log.clone();
        decision_log.push(DecisionLogEntry {
            timestamp: now,
            ..entry
        });
        Self {
            decision_log,
            updated_at: now,
            ..self.clone()
        }
    }

    /// Resolve a pending entry as success or failure.
    pub fn backfill_outcome(&self, entry_id: Uuid, outcome: DecisionOutcome) -> Result<Self, StoreError> {
        let index = self
            .decision_log
            .iter()
            .position(|e| e.id == entry_id)
            .ok_or(StoreError::UnknownEntry(entry_id))?;

        let current = self.decision_log[index].outcome;
        if current != DecisionOutcome::Pending || outcome == DecisionOutcome::Pending {
            return Err(StoreError::OutcomeNotPending {
                id: entry_id,
                current,
                requested: outcome,
            });
        }

        let mut decision_log = self.decision_log.clone();
        decision_log[index].outcome = outcome;
        Ok(Self {
            decision_log,
            updated_at: self.tick(),
            ..self.clone()
        })
    }

    /// Terminal snapshot for the external hypothesis archive.
    pub fn archive(&self, reason: impl Into<String>) -> HypothesisHistoryEntry {
        HypothesisHistoryEntry {
            id: self.hypothesis.id().to_string(),
            name: self.hypothesis.name().to_string(),
            final_status: self.hypothesis.status(),
            reason: reason.into(),
            final_metrics: self.phase_results.last().map(|r| r.metrics.clone()),
            iterations_completed: self.iteration,
            timestamp: self.tick(),
        }
    }

    /// Check invariants of a loaded document.
    pub fn validate(&self) -> Result<(), StoreError> {
        self.thresholds.validate()?;
        self.limits.validate()?;
        if self.iteration < 1 {
            return Err(StoreError::ValidationFailed(
                "iteration must be at least 1".to_string(),
            ));
        }
        if self.updated_at < self.created_at {
            return Err(StoreError::ValidationFailed(
                "updated_at precedes created_at".to_string(),
            ));
        }
        if self
            .decision_log
            .windows(2)
            .any(|w| w[1].timestamp < w[0].timestamp)
        {
            return Err(StoreError::ValidationFailed(
                "decision log is out of order".to_string(),
            ));
        }
        Ok(())
    }

    /// Current time, never earlier than the last write.
    pub(crate) fn tick(&self) -> DateTime<Utc> {
        Utc::now().max(self.updated_at)
    }

    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    pub fn autonomy_mode(&self) -> AutonomyMode {
        self.autonomy_mode
    }

    pub fn hypothesis(&self) -> &Hypothesis {
        &self.hypothesis
    }

    pub fn current_phase(&self) -> Phase {
        self.current_phase
    }

    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    pub fn thresholds(&self) -> &ThresholdConfig {
        &self.thresholds
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn all_phase_results(&self) -> &[PhaseResult] {
        &self.phase_results
    }

    /// Results recorded for `phase`, oldest first.
    pub fn phase_results(&self, phase: Phase) -> impl Iterator<Item = &PhaseResult> {
        self.phase_results.iter().filter(move |r| r.phase == phase)
    }

    pub fn latest_result(&self, phase: Phase) -> Option<&PhaseResult> {
        self.phase_results(phase).last()
    }

    pub fn decision_log(&self) -> &[DecisionLogEntry] {
        &self.decision_log
    }

    pub fn history(&self) -> &PhaseHistory {
        &self.history
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
