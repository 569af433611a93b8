//! Neo4j connection management and the production session gateway.

use std::future::Future;
use std::time::{Duration, Instant};

use neo4rs::{ConfigBuilder, Graph};

use clinica_core::config::ClinicaConfig;
use clinica_core::ClinicaError;

use crate::statement::{CypherGateway, Record, Statement, Value};

/// Errors from graph operations.
///
/// Driver errors are classified and carried as messages only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("Neo4j connection error: {0}")]
    Connection(String),

    #[error("Neo4j query error: {0}")]
    Query(String),

    #[error("Neo4j constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Neo4j query timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl GraphError {
    /// Only connection-level failures are safe to retry, including for
    /// non-idempotent writes.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

impl From<neo4rs::Error> for GraphError {
    fn from(e: neo4rs::Error) -> Self {
        let message = e.to_string();
        match e {
            neo4rs::Error::IOError { .. } | neo4rs::Error::ConnectionError => {
                Self::Connection(message)
            }
            _ if message.contains("ConstraintValidationFailed") => {
                Self::ConstraintViolation(message)
            }
            _ => Self::Query(message),
        }
    }
}

impl From<GraphError> for ClinicaError {
    fn from(e: GraphError) -> Self {
        ClinicaError::Store(e.to_string())
    }
}

/// Bounded retry with linear backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// attempt budget is spent.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<T, GraphError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GraphError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                tracing::warn!(statement = label, attempt, error = %e, "Transient store failure, retrying");
                tokio::time::sleep(policy.backoff * attempt).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}

/// Configuration for connecting to Neo4j.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
    pub fetch_size: usize,
    pub query_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self::from(&ClinicaConfig::default())
    }
}

impl From<&ClinicaConfig> for GraphConfig {
    fn from(cfg: &ClinicaConfig) -> Self {
        Self {
            uri: cfg.neo4j.uri.clone(),
            user: cfg.neo4j.user.clone(),
            password: cfg.neo4j.password.clone(),
            max_connections: cfg.neo4j.max_connections,
            fetch_size: cfg.neo4j.fetch_size,
            query_timeout: Duration::from_secs(cfg.neo4j.query_timeout_secs),
            retry: RetryPolicy {
                max_attempts: cfg.retry.max_attempts,
                backoff: Duration::from_millis(cfg.retry.backoff_ms),
            },
        }
    }
}

/// Thread-safe Neo4j client with connection pooling.
///
/// Constructed once at startup and cloned into each manager.
/// Clone is cheap (inner Arc).
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
    query_timeout: Duration,
    retry: RetryPolicy,
}

impl GraphClient {
    /// Connect to Neo4j with the given configuration.
    pub async fn connect(config: &GraphConfig) -> Result<Self, GraphError> {
        let neo_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .max_connections(config.max_connections as usize)
            .fetch_size(config.fetch_size)
            .build()
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        let graph = Graph::connect(neo_config)
            .await
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        tracing::info!(uri = %config.uri, "Connected to Neo4j");
        Ok(Self {
            graph,
            query_timeout: config.query_timeout,
            retry: config.retry.clone(),
        })
    }

    /// Release the connection pool. Outstanding clones keep it alive until dropped.
    pub fn close(self) {
        tracing::info!("Neo4j client closed");
    }

    async fn execute_once(&self, statement: &Statement) -> Result<Vec<Record>, GraphError> {
        let drain = async {
            let mut stream = self.graph.execute(statement.to_query()).await?;
            let mut records = Vec::new();
            while let Some(row) = stream.next().await? {
                records.push(materialize(&row, statement.columns));
            }
            Ok::<_, GraphError>(records)
        };

        match tokio::time::timeout(self.query_timeout, drain).await {
            Ok(result) => result,
            Err(_) => Err(GraphError::Timeout {
                seconds: self.query_timeout.as_secs(),
            }),
        }
    }
}

impl CypherGateway for GraphClient {
    async fn execute(&self, statement: Statement) -> Result<Vec<Record>, GraphError> {
        let start = Instant::now();
        let records =
            match with_retry(&self.retry, statement.name, || self.execute_once(&statement)).await {
                Ok(records) => records,
                Err(e) => {
                    tracing::debug!(statement = statement.name, error = %e, "Statement failed");
                    return Err(e);
                }
            };

        tracing::debug!(
            statement = statement.name,
            rows = records.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Statement executed"
        );
        Ok(records)
    }
}

/// Copy the declared columns out of a driver row.
fn materialize(row: &neo4rs::Row, columns: &[&str]) -> Record {
    let mut record = Record::new();
    for &column in columns {
        let value = if let Ok(text) = row.get::<String>(column) {
            Value::Text(text)
        } else if let Ok(n) = row.get::<i64>(column) {
            Value::Int(n)
        } else {
            Value::Null
        };
        record.insert(column, value);
    }
    record
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            backoff: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn retries_connection_failures_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = with_retry(&fast_policy(3), "test", || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(GraphError::Connection("reset".into()))
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = with_retry(&fast_policy(2), "test", || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(GraphError::Connection("down".into()))
        })
        .await;

        assert_eq!(result, Err(GraphError::Connection("down".into())));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn never_retries_logical_failures() {
        for err in [
            GraphError::Query("syntax".into()),
            GraphError::ConstraintViolation("dup".into()),
            GraphError::Timeout { seconds: 1 },
        ] {
            let calls = AtomicU32::new(0);
            let result: Result<(), _> = with_retry(&fast_policy(5), "test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                let err = err.clone();
                async move { Err(err) }
            })
            .await;

            assert!(result.is_err());
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }
    }

    #[test]
    fn zero_attempts_still_runs_once() {
        assert_eq!(RetryPolicy::none().max_attempts, 1);
        assert!(GraphError::Connection("x".into()).is_retryable());
        assert!(!GraphError::Serialization("x".into()).is_retryable());
    }

    #[test]
    fn store_errors_carry_only_the_message() {
        let err: ClinicaError = GraphError::Query("bad cypher".into()).into();
        assert_eq!(err, ClinicaError::Store("Neo4j query error: bad cypher".into()));
    }

    #[test]
    fn graph_config_from_settings() {
        let mut settings = ClinicaConfig::default();
        settings.neo4j.password = "pw".into();
        settings.neo4j.query_timeout_secs = 5;
        settings.retry.backoff_ms = 50;

        let config = GraphConfig::from(&settings);
        assert_eq!(config.uri, "bolt://localhost:7687");
        assert_eq!(config.password, "pw");
        assert_eq!(config.query_timeout, Duration::from_secs(5));
        assert_eq!(config.retry.backoff, Duration::from_millis(50));
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn default_graph_config_matches_settings_defaults() {
        let config = GraphConfig::default();
        let settings = ClinicaConfig::default();
        assert_eq!(config.uri, settings.neo4j.uri);
        assert_eq!(config.user, settings.neo4j.user);
        assert_eq!(config.password, settings.neo4j.password);
        assert_eq!(config.password, "clinica-dev");
        assert_eq!(config.max_connections, 16);
        assert_eq!(config.query_timeout, Duration::from_secs(30));
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.backoff, Duration::from_millis(200));
    }
}
