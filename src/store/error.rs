//! Workflow store error types.

use super::audit::DecisionOutcome;
use crate::config::ConfigError;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur while updating, saving or loading a workflow state
#[derive(Debug, Error)]
pub enum StoreError {
    /// Serialization to JSON or binary format failed
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// Deserialization from JSON or binary format failed
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    /// Document was written by an incompatible schema major version
    #[error("Unsupported schema version {found}, supported: {supported}")]
    UnsupportedVersion { found: String, supported: String },

    /// Document loaded but its contents are inconsistent
    #[error("Workflow state validation failed: {0}")]
    ValidationFailed(String),

    /// Embedded thresholds or limits are invalid
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No decision log entry with id {0}")]
    UnknownEntry(Uuid),

    /// Outcomes are backfilled once, from pending only
    #[error("Decision {id} cannot be resolved as {requested}: outcome is already {current}")]
    OutcomeNotPending {
        id: Uuid,
        current: DecisionOutcome,
        requested: DecisionOutcome,
    },
}
