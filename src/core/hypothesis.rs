//! Hypothesis identity and its terminal archive record.

use super::metrics::MetricsSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Lifecycle status of a hypothesis.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HypothesisStatus {
    Active,
    Abandoned,
    Validated,
    Deployed,
}

impl HypothesisStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }
}

impl fmt::Display for HypothesisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::Abandoned => "abandoned",
            Self::Validated => "validated",
            Self::Deployed => "deployed",
        };
        f.write_str(s)
    }
}

/// A single trading-strategy idea under test.
///
/// Identity fields are fixed at construction. The status is only changed
/// by the state machine when a terminal decision is taken.
///
/// # Example
///
/// ```rust
/// use hypothesis_flow::core::{Hypothesis, HypothesisStatus};
///
/// let h = Hypothesis::new(
///     "RSI mean reversion",
///     "Buy oversold large caps, exit at RSI 50",
///     "Short-term overreaction reverts within days",
/// );
/// assert_eq!(h.status(), HypothesisStatus::Active);
/// assert!(!h.id().is_empty());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    id: String,
    name: String,
    description: String,
    rationale: String,
    status: HypothesisStatus,
}

impl Hypothesis {
    /// Create an active hypothesis with a freshly generated id.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        rationale: impl Into<String>,
    ) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), name, description, rationale)
    }

    /// Create an active hypothesis with an externally assigned id.
    pub fn with_id(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            rationale: rationale.into(),
            status: HypothesisStatus::Active,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn rationale(&self) -> &str {
        &self.rationale
    }

    pub fn status(&self) -> HypothesisStatus {
        self.status
    }

    pub(crate) fn with_status(&self, status: HypothesisStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}

/// Write-once terminal snapshot handed to the external hypothesis archive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HypothesisHistoryEntry {
    pub id: String,
    pub name: String,
    pub final_status: HypothesisStatus,
    pub reason: String,
    /// Metrics of the most recent phase result, if any was recorded
    pub final_metrics: Option<MetricsSnapshot>,
    pub iterations_completed: u32,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_generates_distinct_ids() {
        let a = Hypothesis::new("a", "", "");
        let b = Hypothesis::new("a", "", "");
        assert_ne!(a.id(), b.id());
        assert!(Uuid::parse_str(a.id()).is_ok());
    }

    #[test]
    fn with_id_keeps_external_identity() {
        let h = Hypothesis::with_id("hypothesis_7", "stat arb", "pairs", "cointegration");
        assert_eq!(h.id(), "hypothesis_7");
        assert_eq!(h.name(), "stat arb");
        assert_eq!(h.description(), "pairs");
        assert_eq!(h.rationale(), "cointegration");
    }

    #[test]
    fn with_status_preserves_identity() {
        let h = Hypothesis::with_id("h1", "n", "d", "r");
        let done = h.with_status(HypothesisStatus::Deployed);
        assert_eq!(done.id(), h.id());
        assert_eq!(done.status(), HypothesisStatus::Deployed);
        assert_eq!(h.status(), HypothesisStatus::Active);
    }

    #[test]
    fn only_active_is_non_terminal() {
        assert!(!HypothesisStatus::Active.is_terminal());
        assert!(HypothesisStatus::Abandoned.is_terminal());
        assert!(HypothesisStatus::Validated.is_terminal());
        assert!(HypothesisStatus::Deployed.is_terminal());
    }
}
