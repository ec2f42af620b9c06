//! Threshold and limit configuration.
//!
//! `ThresholdConfig` is the single home of every numeric cut-off the
//! decision engine uses. `Limits` bounds autonomous operation. Both are
//! validated once at construction and are read-only afterwards.
//!
//! # Example
//!
//! ```rust
//! use hypothesis_flow::config::{ThresholdConfig, TierThresholds};
//!
//! let config = ThresholdConfig::builder()
//!     .minimum_viable(TierThresholds::new(0.6, 0.35, 40))
//!     .build()
//!     .unwrap();
//! assert_eq!(config.minimum_viable().min_trades, 40);
//!
//! let err = ThresholdConfig::builder()
//!     .minimum_viable(TierThresholds::new(0.5, 1.5, 30))
//!     .production_ready(TierThresholds::new(0.2, 0.3, 100))
//!     .build()
//!     .unwrap_err();
//! assert_eq!(err.issues().len(), 2);
//! ```

pub mod error;
mod rules;

pub use error::{ConfigError, ConfigIssue};

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Cut-offs for one performance tier.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TierThresholds {
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub min_trades: u32,
    #[serde(default)]
    pub win_rate: Option<f64>,
}

impl TierThresholds {
    pub fn new(sharpe_ratio: f64, max_drawdown: f64, min_trades: u32) -> Self {
        Self {
            sharpe_ratio,
            max_drawdown,
            min_trades,
            win_rate: None,
        }
    }

    pub fn with_win_rate(mut self, win_rate: f64) -> Self {
        self.win_rate = Some(win_rate);
        self
    }
}

/// Metric patterns that override performance-based routing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OverfittingSignals {
    pub too_perfect_sharpe: f64,
    pub too_few_trades: u32,
    pub win_rate_too_high: f64,
    pub max_single_trade_impact: f64,
}

impl Default for OverfittingSignals {
    fn default() -> Self {
        Self {
            too_perfect_sharpe: 3.0,
            too_few_trades: 20,
            win_rate_too_high: 0.75,
            max_single_trade_impact: 0.25,
        }
    }
}

/// Improvement band and sensitivity cut-off for optimization results.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationThresholds {
    pub min_improvement: f64,
    pub max_improvement: f64,
    pub max_parameter_sensitivity: f64,
}

impl Default for OptimizationThresholds {
    fn default() -> Self {
        Self {
            min_improvement: 0.05,
            max_improvement: 0.30,
            max_parameter_sensitivity: 0.5,
        }
    }
}

/// Degradation and robustness bands for out-of-sample validation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationThresholds {
    pub abandon_degradation: f64,
    pub min_robustness: f64,
    pub deploy_degradation: f64,
    pub deploy_robustness: f64,
    pub caution_degradation: f64,
    pub caution_robustness: f64,
}

impl Default for ValidationThresholds {
    fn default() -> Self {
        Self {
            abandon_degradation: 0.40,
            min_robustness: 0.50,
            deploy_degradation: 0.15,
            deploy_robustness: 0.75,
            caution_degradation: 0.30,
            caution_robustness: 0.60,
        }
    }
}

/// Tiered thresholds consumed by the decision engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    minimum_viable: TierThresholds,
    optimization_worthy: TierThresholds,
    production_ready: TierThresholds,
    exceptional: TierThresholds,
    #[serde(default)]
    overfitting_signals: OverfittingSignals,
    #[serde(default)]
    optimization: OptimizationThresholds,
    #[serde(default)]
    validation: ValidationThresholds,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            minimum_viable: TierThresholds::new(0.5, 0.40, 30),
            optimization_worthy: TierThresholds::new(0.7, 0.35, 50),
            production_ready: TierThresholds::new(1.0, 0.30, 100).with_win_rate(0.40),
            exceptional: TierThresholds::new(2.0, 0.20, 200).with_win_rate(0.50),
            overfitting_signals: OverfittingSignals::default(),
            optimization: OptimizationThresholds::default(),
            validation: ValidationThresholds::default(),
        }
    }
}

impl ThresholdConfig {
    /// Start from the default thresholds.
    pub fn builder() -> ThresholdConfigBuilder {
        ThresholdConfigBuilder::new()
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Re-run construction checks, e.g. after loading a persisted document.
    pub fn validate(&self) -> Result<(), ConfigError> {
        rules::validate_thresholds(self)
    }

    pub fn minimum_viable(&self) -> &TierThresholds {
        &self.minimum_viable
    }

    pub fn optimization_worthy(&self) -> &TierThresholds {
        &self.optimization_worthy
    }

    pub fn production_ready(&self) -> &TierThresholds {
        &self.production_ready
    }

    pub fn exceptional(&self) -> &TierThresholds {
        &self.exceptional
    }

    pub fn overfitting_signals(&self) -> &OverfittingSignals {
        &self.overfitting_signals
    }

    pub fn optimization(&self) -> &OptimizationThresholds {
        &self.optimization
    }

    pub fn validation(&self) -> &ValidationThresholds {
        &self.validation
    }
}

/// Fluent builder for `ThresholdConfig`; `build` validates.
#[derive(Clone, Debug, Default)]
pub struct ThresholdConfigBuilder {
    config: ThresholdConfig,
}

impl ThresholdConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn minimum_viable(mut self, tier: TierThresholds) -> Self {
        self.config.minimum_viable = tier;
        self
    }

    pub fn optimization_worthy(mut self, tier: TierThresholds) -> Self {
        self.config.optimization_worthy = tier;
        self
    }

    pub fn production_ready(mut self, tier: TierThresholds) -> Self {
        self.config.production_ready = tier;
        self
    }

    pub fn exceptional(mut self, tier: TierThresholds) -> Self {
        self.config.exceptional = tier;
        self
    }

    pub fn overfitting_signals(mut self, signals: OverfittingSignals) -> Self {
        self.config.overfitting_signals = signals;
        self
    }

    pub fn optimization(mut self, thresholds: OptimizationThresholds) -> Self {
        self.config.optimization = thresholds;
        self
    }

    pub fn validation(mut self, thresholds: ValidationThresholds) -> Self {
        self.config.validation = thresholds;
        self
    }

    pub fn build(self) -> Result<ThresholdConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Budgets bounding autonomous operation on one hypothesis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    max_iterations_per_hypothesis: u32,
    max_optimization_attempts: u32,
    max_backtests_per_optimization: u32,
    max_context_tokens: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_iterations_per_hypothesis: 3,
            max_optimization_attempts: 2,
            max_backtests_per_optimization: 50,
            max_context_tokens: 200_000,
        }
    }
}

impl Limits {
    pub fn new(
        max_iterations_per_hypothesis: u32,
        max_optimization_attempts: u32,
        max_backtests_per_optimization: u32,
        max_context_tokens: u64,
    ) -> Result<Self, ConfigError> {
        let limits = Self {
            max_iterations_per_hypothesis,
            max_optimization_attempts,
            max_backtests_per_optimization,
            max_context_tokens,
        };
        limits.validate()?;
        Ok(limits)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let limits: Self = serde_json::from_str(json)?;
        limits.validate()?;
        Ok(limits)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        rules::validate_limits(self)
    }

    pub fn max_iterations_per_hypothesis(&self) -> u32 {
        self.max_iterations_per_hypothesis
    }

    pub fn max_optimization_attempts(&self) -> u32 {
        self.max_optimization_attempts
    }

    pub fn max_backtests_per_optimization(&self) -> u32 {
        self.max_backtests_per_optimization
    }

    pub fn max_context_tokens(&self) -> u64 {
        self.max_context_tokens
    }
}

/// Which transitions pause for human confirmation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutonomyMode {
    /// Pause after every step
    Minimal,
    /// Pause on escalation, before validation and at terminal phases
    #[default]
    Medium,
    /// Pause only on escalation
    Full,
}

/// Complete configuration document for a research run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub autonomy_mode: AutonomyMode,
}

impl WorkflowConfig {
    /// Parse and validate a JSON document; missing sections use defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.thresholds.validate()?;
        config.limits.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(ThresholdConfig::default().validate().is_ok());
        assert!(Limits::default().validate().is_ok());
    }

    #[test]
    fn drawdown_outside_unit_interval_is_rejected() {
        for drawdown in [0.0, -0.1, 1.01, f64::NAN] {
            let err = ThresholdConfig::builder()
                .minimum_viable(TierThresholds::new(0.5, drawdown, 30))
                .build()
                .unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { .. }));
            assert_eq!(err.issues()[0].field, "minimum_viable.max_drawdown");
        }
    }

    #[test]
    fn drawdown_of_exactly_one_is_accepted() {
        let config = ThresholdConfig::builder()
            .minimum_viable(TierThresholds::new(0.5, 1.0, 30))
            .build();
        assert!(config.is_ok());
    }

    #[test]
    fn non_finite_sharpe_is_rejected() {
        let err = ThresholdConfig::builder()
            .exceptional(TierThresholds::new(f64::INFINITY, 0.2, 200))
            .build()
            .unwrap_err();
        assert!(err
            .issues()
            .iter()
            .any(|i| i.field == "exceptional.sharpe_ratio"));
    }

    #[test]
    fn tiers_must_be_monotonic_on_sharpe() {
        let err = ThresholdConfig::builder()
            .optimization_worthy(TierThresholds::new(0.4, 0.35, 50))
            .build()
            .unwrap_err();
        let fields: Vec<&str> = err.issues().iter().map(|i| i.field.as_str()).collect();
        assert_eq!(fields, vec!["optimization_worthy.sharpe_ratio"]);
    }

    #[test]
    fn all_issues_are_accumulated() {
        let err = ThresholdConfig::builder()
            .minimum_viable(TierThresholds::new(0.5, 2.0, 30))
            .production_ready(TierThresholds::new(0.6, 0.0, 100).with_win_rate(1.5))
            .build()
            .unwrap_err();
        // drawdown x2, win rate, production < optimization_worthy
        assert_eq!(err.issues().len(), 4);
        assert!(err.to_string().starts_with("invalid configuration:"));
    }

    #[test]
    fn limits_must_be_positive() {
        let err = Limits::new(0, 2, 0, 1000).unwrap_err();
        assert_eq!(err.issues().len(), 2);
        assert!(Limits::new(3, 2, 50, 1000).is_ok());
    }

    #[test]
    fn threshold_json_uses_defaults_for_optional_sections() {
        let json = r#"{
            "minimum_viable": {"sharpe_ratio": 0.5, "max_drawdown": 0.4, "min_trades": 30},
            "optimization_worthy": {"sharpe_ratio": 0.7, "max_drawdown": 0.35, "min_trades": 50},
            "production_ready": {"sharpe_ratio": 1.0, "max_drawdown": 0.3, "min_trades": 100, "win_rate": 0.4},
            "exceptional": {"sharpe_ratio": 2.0, "max_drawdown": 0.2, "min_trades": 200, "win_rate": 0.5}
        }"#;
        let config = ThresholdConfig::from_json_str(json).unwrap();
        assert_eq!(config, ThresholdConfig::default());
    }

    #[test]
    fn invalid_json_document_is_rejected_after_parsing() {
        let json = r#"{
            "minimum_viable": {"sharpe_ratio": 0.5, "max_drawdown": 0.4, "min_trades": 30},
            "optimization_worthy": {"sharpe_ratio": 0.7, "max_drawdown": 0.35, "min_trades": 50},
            "production_ready": {"sharpe_ratio": 0.6, "max_drawdown": 0.3, "min_trades": 100},
            "exceptional": {"sharpe_ratio": 2.0, "max_drawdown": 0.2, "min_trades": 200}
        }"#;
        let err = ThresholdConfig::from_json_str(json).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = Limits::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn workflow_config_fills_missing_sections() {
        let config = WorkflowConfig::from_json_str(r#"{"autonomy_mode": "full"}"#).unwrap();
        assert_eq!(config.autonomy_mode, AutonomyMode::Full);
        assert_eq!(config.limits, Limits::default());
        assert_eq!(config.thresholds, ThresholdConfig::default());
    }

    #[test]
    fn workflow_config_from_missing_path_is_io_error() {
        let path = std::env::temp_dir().join(format!("missing-{}.json", uuid::Uuid::new_v4()));
        let err = WorkflowConfig::from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
