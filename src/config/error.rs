//! Configuration error types.

use std::fmt;
use thiserror::Error;

/// One failed configuration check.
#[derive(Clone, Debug, PartialEq)]
pub struct ConfigIssue {
    /// Dotted path of the offending field, e.g. `minimum_viable.max_drawdown`
    pub field: String,
    pub message: String,
}

impl ConfigIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn join(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors that can occur while building or loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One or more values failed validation. Every issue is reported.
    #[error("invalid configuration: {}", join(.issues))]
    Invalid { issues: Vec<ConfigIssue> },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read configuration from '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Issues behind an `Invalid` error; empty for the other kinds.
    pub fn issues(&self) -> &[ConfigIssue] {
        match self {
            Self::Invalid { issues } => issues,
            _ => &[],
        }
    }
}
