//! Configuration management for Clinica services.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (`CLINICA__` prefix, `__` separator,
//!    e.g. `CLINICA__NEO4J__URI`)
//! 2. Config file (`clinica.toml` by default)
//! 3. Defaults

use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClinicaConfig {
    #[serde(default)]
    pub neo4j: Neo4jSettings,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub log: LogSettings,
}

/// Connection settings for the graph store.
#[derive(Debug, Clone, Deserialize)]
pub struct Neo4jSettings {
    #[serde(default = "default_uri")]
    pub uri: String,

    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default = "default_password")]
    pub password: String,

    /// Upper bound on pooled bolt connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Rows pulled per round trip while draining a result.
    #[serde(default = "default_fetch_size")]
    pub fetch_size: usize,

    /// Per-statement deadline in seconds.
    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,
}

/// Bounded retry for connection-level failures.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySettings {
    /// Total attempts per statement, including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the n-th retry is `n * backoff_ms`.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogSettings {
    /// Emit JSON log lines instead of the human-readable format.
    #[serde(default)]
    pub json: bool,
}

fn default_uri() -> String {
    "bolt://localhost:7687".to_string()
}

fn default_user() -> String {
    "neo4j".to_string()
}

fn default_password() -> String {
    "clinica-dev".to_string()
}

fn default_max_connections() -> u32 {
    16
}

fn default_fetch_size() -> usize {
    256
}

fn default_query_timeout() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    200
}

impl Default for Neo4jSettings {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            user: default_user(),
            password: default_password(),
            max_connections: default_max_connections(),
            fetch_size: default_fetch_size(),
            query_timeout_secs: default_query_timeout(),
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl ClinicaConfig {
    /// Load configuration from `{file_prefix}.toml` (optional) and the
    /// `CLINICA__` environment.
    pub fn load(file_prefix: &str) -> Result<Self, config::ConfigError> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix("CLINICA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        cfg.try_deserialize()
    }
}
