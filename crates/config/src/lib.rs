//! Configuration management for the lead scoring engine
//!
//! Supports loading configuration from:
//! - YAML/TOML files under `config/`
//! - Environment variables (LEAD_SCORING__ prefix)
//!
//! Scoring rules (weights, tiers, grade cutoffs, qualification threshold)
//! live in a separate YAML file, `config/scoring.yaml` by default.

pub mod scoring;
pub mod settings;

pub use scoring::{
    BudgetScoringConfig, BudgetTier, CategoryWeights, CompletenessScoringConfig,
    EngagementScoringConfig, GradeThresholds, IntentScoringConfig, PenaltyConfig,
    QualificationConfig, ScoringConfig, TimelineScoringConfig, TimelineTier,
};
pub use settings::{
    load_settings, EngineConfig, ObservabilityConfig, PersistenceConfig, RuntimeEnvironment,
    ServerConfig, Settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
