//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub persistence: PersistenceConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    /// Path to the scoring rules YAML
    #[serde(default = "default_scoring_config_path")]
    pub scoring_config_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environment: RuntimeEnvironment::default(),
            server: ServerConfig::default(),
            persistence: PersistenceConfig::default(),
            observability: ObservabilityConfig::default(),
            engine: EngineConfig::default(),
            scoring_config_path: default_scoring_config_path(),
        }
    }
}

fn default_scoring_config_path() -> String {
    "config/scoring.yaml".to_string()
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_engine()?;
        self.validate_persistence()?;

        if self.scoring_config_path.trim().is_empty() {
            return Err(ConfigError::MissingField("scoring_config_path".to_string()));
        }

        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        let server = &self.server;

        if server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if server.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.timeout_seconds".to_string(),
                message: "Timeout must be at least 1 second".to_string(),
            });
        }

        if self.environment.is_production() && server.cors_enabled && server.cors_origins.is_empty()
        {
            tracing::warn!(
                "CORS is enabled in production but no origins are configured. \
                 This may block legitimate requests."
            );
        }

        Ok(())
    }

    fn validate_engine(&self) -> Result<(), ConfigError> {
        let engine = &self.engine;

        if !(1..=365).contains(&engine.default_stale_days) {
            return Err(ConfigError::InvalidValue {
                field: "engine.default_stale_days".to_string(),
                message: format!("Must be between 1 and 365, got {}", engine.default_stale_days),
            });
        }

        if engine.max_batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "engine.max_batch_size".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if engine.batch_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "engine.batch_concurrency".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    fn validate_persistence(&self) -> Result<(), ConfigError> {
        let persistence = &self.persistence;

        if persistence.enabled && persistence.scylla_hosts.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "persistence.scylla_hosts".to_string(),
                message: "At least one host is required when persistence is enabled".to_string(),
            });
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_timeout() -> u64 {
    30
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_seconds: default_timeout(),
            cors_enabled: true,
            cors_origins: Vec::new(),
        }
    }
}

/// Persistence configuration for ScyllaDB
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Enable ScyllaDB persistence (false = in-memory only)
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_scylla_hosts")]
    pub scylla_hosts: Vec<String>,

    #[serde(default = "default_scylla_keyspace")]
    pub keyspace: String,

    #[serde(default = "default_replication_factor")]
    pub replication_factor: u8,
}

fn default_scylla_hosts() -> Vec<String> {
    std::env::var("SCYLLA_HOSTS")
        .map(|s| s.split(',').map(|h| h.trim().to_string()).collect())
        .unwrap_or_else(|_| vec!["127.0.0.1:9042".to_string()])
}

fn default_scylla_keyspace() -> String {
    std::env::var("SCYLLA_KEYSPACE").unwrap_or_else(|_| "lead_scoring".to_string())
}

fn default_replication_factor() -> u8 {
    1
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            scylla_hosts: default_scylla_hosts(),
            keyspace: default_scylla_keyspace(),
            replication_factor: default_replication_factor(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub log_json: bool,

    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

/// Scoring engine runtime knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Age after which a stored score is stale
    #[serde(default = "default_stale_days")]
    pub default_stale_days: u32,

    /// Upper bound on explicit lead ids in one batch request
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Leads recomputed concurrently inside one batch
    #[serde(default = "default_batch_concurrency")]
    pub batch_concurrency: usize,
}

fn default_stale_days() -> u32 {
    7
}
fn default_max_batch_size() -> usize {
    500
}
fn default_batch_concurrency() -> usize {
    4
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_stale_days: default_stale_days(),
            max_batch_size: default_max_batch_size(),
            batch_concurrency: default_batch_concurrency(),
        }
    }
}

/// Load settings from files and environment
///
/// Priority (highest to lowest):
/// 1. Environment variables (LEAD_SCORING__ prefix)
/// 2. config/{env}.yaml (if env specified)
/// 3. config/default.yaml
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("LEAD_SCORING")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}
