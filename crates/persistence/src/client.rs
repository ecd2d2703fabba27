//! ScyllaDB session for the lead scoring keyspace

use crate::error::PersistenceError;
use crate::schema;
use scylla::serialize::row::SerializeRow;
use scylla::{QueryResult, Session, SessionBuilder};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ScyllaConfig {
    pub hosts: Vec<String>,
    pub keyspace: String,
    pub replication_factor: u8,
}

impl Default for ScyllaConfig {
    fn default() -> Self {
        Self {
            hosts: vec!["127.0.0.1:9042".to_string()],
            keyspace: "lead_scoring".to_string(),
            replication_factor: 1,
        }
    }
}

/// Shared session plus keyspace-qualified table names
#[derive(Clone)]
pub struct ScyllaClient {
    session: Arc<Session>,
    config: ScyllaConfig,
}

impl ScyllaClient {
    pub async fn connect(config: ScyllaConfig) -> Result<Self, PersistenceError> {
        if config.hosts.is_empty() {
            return Err(PersistenceError::Connection(
                "no ScyllaDB hosts configured".to_string(),
            ));
        }
        tracing::info!(hosts = ?config.hosts, keyspace = %config.keyspace, "Connecting to ScyllaDB");

        let session = SessionBuilder::new()
            .known_nodes(&config.hosts)
            .build()
            .await?;

        Ok(Self {
            session: Arc::new(session),
            config,
        })
    }

    /// Create the keyspace and the `leads` / `conversations` tables
    pub async fn ensure_schema(&self) -> Result<(), PersistenceError> {
        schema::create_keyspace(
            &self.session,
            &self.config.keyspace,
            self.config.replication_factor,
        )
        .await?;
        schema::create_tables(&self.session, &self.config.keyspace).await
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn keyspace(&self) -> &str {
        &self.config.keyspace
    }

    pub fn leads_table(&self) -> String {
        format!("{}.leads", self.config.keyspace)
    }

    pub fn conversations_table(&self) -> String {
        format!("{}.conversations", self.config.keyspace)
    }

    /// Run a lightweight transaction (`IF EXISTS` / `IF NOT EXISTS`) and
    /// report whether it applied
    pub async fn conditional(
        &self,
        query: String,
        values: impl SerializeRow,
    ) -> Result<bool, PersistenceError> {
        let result = self.session.query_unpaged(query, values).await?;
        Ok(applied(&result))
    }
}

/// First column of an LWT result is `[applied]`
fn applied(result: &QueryResult) -> bool {
    result
        .rows
        .as_ref()
        .and_then(|rows| rows.first())
        .and_then(|row| row.columns.first())
        .and_then(|col| col.as_ref())
        .and_then(|value| value.as_boolean())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ScyllaConfig::default();
        assert_eq!(config.keyspace, "lead_scoring");
        assert_eq!(config.replication_factor, 1);
        assert_eq!(config.hosts.len(), 1);
    }
}
